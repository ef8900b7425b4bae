use reqwest::StatusCode;
use thiserror::Error;

/// Failure taxonomy for the fetch flow.
///
/// All variants are caught at the fetcher boundary and converted into a
/// user-facing message; only `NoResults` surfaces distinctly.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-2xx response from either the geocoding or weather endpoint.
    #[error("{endpoint} request failed with status {status}: {body}")]
    Http { endpoint: &'static str, status: StatusCode, body: String },

    /// Forward geocoding returned an empty match set.
    #[error("no geocoding match for the requested city")]
    NoResults,

    /// Transport-level failure before a response could be read.
    #[error("failed to reach the {endpoint} endpoint")]
    Network {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The response body did not match the expected schema.
    #[error("failed to decode the {endpoint} response")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// The message shown to the user. Details stay in the log.
    pub fn user_message(&self) -> &'static str {
        match self {
            FetchError::NoResults => "No results for the given city.",
            _ => "Could not fetch weather data. Please try again.",
        }
    }
}
