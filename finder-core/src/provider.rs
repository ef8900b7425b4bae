use crate::{
    Config,
    error::FetchError,
    model::{GeocodedCity, OneCallReport, PlaceName},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// The seam between fetch orchestration and the upstream HTTP API.
///
/// Within one fetch chain the geocoding call always completes before the
/// weather call begins; implementations only perform single requests.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Forward geocoding: resolve a city name (optionally narrowed by an ISO
    /// country code) to candidate coordinates. An empty vec means no match.
    async fn geocode_city(
        &self,
        city: &str,
        country_code: Option<&str>,
    ) -> Result<Vec<GeocodedCity>, FetchError>;

    /// Reverse geocoding: resolve coordinates to a place name.
    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<Vec<PlaceName>, FetchError>;

    /// Current, hourly and daily weather for a coordinate pair.
    async fn one_call(&self, lat: f64, lon: f64) -> Result<OneCallReport, FetchError>;
}

/// Construct the production provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.require_api_key()?;
    Ok(Box::new(OpenWeatherProvider::new(api_key.to_owned())))
}
