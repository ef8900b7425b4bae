use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::{
    error::FetchError,
    model::{
        CurrentConditions, DailyEntry, GeocodedCity, HourlyEntry, OneCallReport, PlaceName,
        WeatherCondition,
    },
};

use super::WeatherProvider;

const GEO_BASE: &str = "https://api.openweathermap.org/geo/1.0";
const DATA_BASE: &str = "https://api.openweathermap.org/data/3.0";

/// OpenWeatherMap implementation of [`WeatherProvider`].
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    http: Client,
    geo_base: String,
    data_base: String,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_urls(api_key, GEO_BASE, DATA_BASE)
    }

    /// Point the provider at alternative endpoints (tests, proxies).
    pub fn with_base_urls(
        api_key: String,
        geo_base: impl Into<String>,
        data_base: impl Into<String>,
    ) -> Self {
        Self {
            api_key,
            http: Client::new(),
            geo_base: geo_base.into(),
            data_base: data_base.into(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: String,
        query: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let res = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| FetchError::Network { endpoint, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| FetchError::Network { endpoint, source })?;

        if !status.is_success() {
            return Err(FetchError::Http { endpoint, status, body: truncate_body(&body) });
        }

        serde_json::from_str(&body).map_err(|source| FetchError::Decode { endpoint, source })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn geocode_city(
        &self,
        city: &str,
        country_code: Option<&str>,
    ) -> Result<Vec<GeocodedCity>, FetchError> {
        let q = match country_code {
            Some(code) if !code.is_empty() => format!("{city},{code}"),
            _ => city.to_string(),
        };
        tracing::debug!(%q, "forward geocoding");

        let entries: Vec<OwGeoEntry> = self
            .get_json(
                "geocoding",
                format!("{}/direct", self.geo_base),
                &[("q", q.as_str()), ("limit", "1"), ("appid", self.api_key.as_str())],
            )
            .await?;

        Ok(entries
            .into_iter()
            .map(|e| GeocodedCity { name: e.name, country: e.country, lat: e.lat, lon: e.lon })
            .collect())
    }

    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<Vec<PlaceName>, FetchError> {
        let lat_s = lat.to_string();
        let lon_s = lon.to_string();
        tracing::debug!(lat, lon, "reverse geocoding");

        let entries: Vec<OwReverseEntry> = self
            .get_json(
                "reverse geocoding",
                format!("{}/reverse", self.geo_base),
                &[
                    ("lat", lat_s.as_str()),
                    ("lon", lon_s.as_str()),
                    ("limit", "1"),
                    ("appid", self.api_key.as_str()),
                ],
            )
            .await?;

        Ok(entries.into_iter().map(|e| PlaceName { name: e.name, country: e.country }).collect())
    }

    async fn one_call(&self, lat: f64, lon: f64) -> Result<OneCallReport, FetchError> {
        let lat_s = lat.to_string();
        let lon_s = lon.to_string();
        tracing::debug!(lat, lon, "fetching one-call weather data");

        let parsed: OwOneCall = self
            .get_json(
                "weather",
                format!("{}/onecall", self.data_base),
                &[
                    ("lat", lat_s.as_str()),
                    ("lon", lon_s.as_str()),
                    ("units", "metric"),
                    ("appid", self.api_key.as_str()),
                ],
            )
            .await?;

        Ok(parsed.into_report())
    }
}

#[derive(Debug, Deserialize)]
struct OwGeoEntry {
    name: String,
    country: Option<String>,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwReverseEntry {
    name: String,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: u16,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrent {
    temp: f64,
    feels_like: f64,
    pressure: u32,
    humidity: u8,
    #[serde(default)]
    uvi: f64,
    // Absent from some responses, e.g. above 10 km.
    #[serde(default)]
    visibility: u32,
    wind_speed: f64,
    sunrise: i64,
    sunset: i64,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwHourly {
    dt: i64,
    temp: f64,
    humidity: u8,
    wind_speed: f64,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwDailyTemp {
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct OwDaily {
    dt: i64,
    temp: OwDailyTemp,
    humidity: u8,
    wind_speed: f64,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwOneCall {
    timezone_offset: i32,
    current: OwCurrent,
    hourly: Vec<OwHourly>,
    daily: Vec<OwDaily>,
}

impl OwOneCall {
    fn into_report(self) -> OneCallReport {
        OneCallReport {
            current: CurrentConditions {
                temp: self.current.temp,
                feels_like: self.current.feels_like,
                pressure: self.current.pressure,
                humidity: self.current.humidity,
                uvi: self.current.uvi,
                visibility: self.current.visibility,
                wind_speed: self.current.wind_speed,
                sunrise: self.current.sunrise,
                sunset: self.current.sunset,
                condition: condition_from(self.current.weather),
            },
            hourly: self
                .hourly
                .into_iter()
                .map(|h| HourlyEntry {
                    dt: h.dt,
                    temp: h.temp,
                    humidity: h.humidity,
                    wind_speed: h.wind_speed,
                    condition: condition_from(h.weather),
                })
                .collect(),
            daily: self
                .daily
                .into_iter()
                .map(|d| DailyEntry {
                    dt: d.dt,
                    temp_min: d.temp.min,
                    temp_max: d.temp.max,
                    humidity: d.humidity,
                    wind_speed: d.wind_speed,
                    condition: condition_from(d.weather),
                })
                .collect(),
            timezone_offset: self.timezone_offset,
        }
    }
}

fn condition_from(weather: Vec<OwWeather>) -> WeatherCondition {
    weather
        .into_iter()
        .next()
        .map(|w| WeatherCondition { id: w.id, description: w.description, icon: w.icon })
        .unwrap_or_else(WeatherCondition::unknown)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX { format!("{}...", &body[..MAX]) } else { body.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> OpenWeatherProvider {
        OpenWeatherProvider::with_base_urls("KEY".to_string(), server.uri(), server.uri())
    }

    fn one_call_body() -> serde_json::Value {
        json!({
            "timezone_offset": 7200,
            "current": {
                "temp": 21.4,
                "feels_like": 20.1,
                "pressure": 1012,
                "humidity": 45,
                "uvi": 3.4,
                "visibility": 10000,
                "wind_speed": 4.6,
                "sunrise": 1_736_485_200,
                "sunset": 1_736_517_600,
                "weather": [{"id": 802, "main": "Clouds", "description": "scattered clouds", "icon": "03d"}]
            },
            "hourly": [
                {"dt": 1_736_488_800, "temp": 21.0, "humidity": 46, "wind_speed": 4.1,
                 "weather": [{"id": 802, "main": "Clouds", "description": "scattered clouds", "icon": "03d"}]},
                {"dt": 1_736_492_400, "temp": 20.2, "humidity": 48, "wind_speed": 3.9,
                 "weather": []}
            ],
            "daily": [
                {"dt": 1_736_503_200, "temp": {"min": 14.2, "max": 22.8, "day": 21.0},
                 "humidity": 52, "wind_speed": 5.0,
                 "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}]}
            ]
        })
    }

    #[tokio::test]
    async fn geocode_city_joins_country_code_into_the_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/direct"))
            .and(query_param("q", "Warsaw,PL"))
            .and(query_param("limit", "1"))
            .and(query_param("appid", "KEY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "Warsaw", "country": "PL", "lat": 52.23, "lon": 21.01}
            ])))
            .mount(&server)
            .await;

        let matches = provider_for(&server).geocode_city("Warsaw", Some("PL")).await.unwrap();

        assert_eq!(
            matches,
            vec![GeocodedCity {
                name: "Warsaw".to_string(),
                country: Some("PL".to_string()),
                lat: 52.23,
                lon: 21.01,
            }]
        );
    }

    #[tokio::test]
    async fn geocode_city_omits_missing_country_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/direct"))
            .and(query_param("q", "Warsaw"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let matches = provider_for(&server).geocode_city("Warsaw", None).await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn non_success_status_maps_to_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/direct"))
            .respond_with(ResponseTemplate::new(401).set_body_string("{\"cod\":401}"))
            .mount(&server)
            .await;

        let err = provider_for(&server).geocode_city("Warsaw", None).await.unwrap_err();
        match err {
            FetchError::Http { endpoint, status, .. } => {
                assert_eq!(endpoint, "geocoding");
                assert_eq!(status.as_u16(), 401);
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_body_maps_to_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/onecall"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = provider_for(&server).one_call(52.23, 21.01).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode { endpoint: "weather", .. }));
    }

    #[tokio::test]
    async fn one_call_decodes_and_normalizes_the_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/onecall"))
            .and(query_param("lat", "52.23"))
            .and(query_param("lon", "21.01"))
            .and(query_param("units", "metric"))
            .and(query_param("appid", "KEY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(one_call_body()))
            .mount(&server)
            .await;

        let report = provider_for(&server).one_call(52.23, 21.01).await.unwrap();

        assert_eq!(report.timezone_offset, 7200);
        assert_eq!(report.current.temp, 21.4);
        assert_eq!(report.current.condition.id, 802);
        assert_eq!(report.current.condition.icon, "03d");
        assert_eq!(report.hourly.len(), 2);
        // An empty weather array falls back to the Unknown condition.
        assert_eq!(report.hourly[1].condition, WeatherCondition::unknown());
        assert_eq!(report.daily[0].temp_min, 14.2);
        assert_eq!(report.daily[0].temp_max, 22.8);
        assert_eq!(report.daily[0].condition.description, "light rain");
    }

    #[tokio::test]
    async fn reverse_geocode_decodes_matches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .and(query_param("lat", "52.23"))
            .and(query_param("lon", "21.01"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "Warsaw", "country": "PL"}
            ])))
            .mount(&server)
            .await;

        let places = provider_for(&server).reverse_geocode(52.23, 21.01).await.unwrap();
        assert_eq!(
            places,
            vec![PlaceName { name: "Warsaw".to_string(), country: Some("PL".to_string()) }]
        );
    }
}
