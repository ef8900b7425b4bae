use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub(crate) const UNKNOWN: &str = "Unknown";

/// A coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

/// Resolved place metadata attached to a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityInfo {
    pub name: String,
    pub country: String,
}

impl CityInfo {
    /// Placeholder used when reverse geocoding fails or finds nothing.
    pub fn unknown() -> Self {
        Self { name: UNKNOWN.to_string(), country: UNKNOWN.to_string() }
    }
}

/// Weather condition as reported by the upstream `weather` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub id: u16,
    pub description: String,
    pub icon: String,
}

impl WeatherCondition {
    /// Stand-in for responses whose `weather` array is empty.
    pub fn unknown() -> Self {
        Self { id: 0, description: UNKNOWN.to_string(), icon: String::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temp: f64,
    pub feels_like: f64,
    /// Atmospheric pressure, hPa.
    pub pressure: u32,
    /// Relative humidity, percent.
    pub humidity: u8,
    /// UV index.
    pub uvi: f64,
    /// Visibility, metres.
    pub visibility: u32,
    /// Wind speed, m/s.
    pub wind_speed: f64,
    /// Sunrise, epoch seconds UTC.
    pub sunrise: i64,
    /// Sunset, epoch seconds UTC.
    pub sunset: i64,
    pub condition: WeatherCondition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyEntry {
    /// Forecast hour, epoch seconds UTC.
    pub dt: i64,
    pub temp: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    pub condition: WeatherCondition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    /// Forecast day, epoch seconds UTC.
    pub dt: i64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    pub condition: WeatherCondition,
}

/// Decoded one-call payload, before city enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct OneCallReport {
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyEntry>,
    pub daily: Vec<DailyEntry>,
    /// Offset from UTC of the requested location, seconds.
    pub timezone_offset: i32,
}

/// The normalized result of one successful fetch.
///
/// Created fresh on every fetch and replaced wholesale; never merged with a
/// previous snapshot. `coord` always carries the coordinates the weather
/// lookup actually ran against, regardless of what geocoding resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyEntry>,
    pub daily: Vec<DailyEntry>,
    /// Offset from UTC of the location, seconds.
    pub timezone_offset: i32,
    pub city: CityInfo,
    pub coord: Coord,
    pub fetched_at: DateTime<Utc>,
}

/// One forward-geocoding match.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedCity {
    pub name: String,
    pub country: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

/// One reverse-geocoding match.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceName {
    pub name: String,
    pub country: Option<String>,
}
