//! Human-friendly output formatting for weather snapshots.

use chrono::{DateTime, Utc};
use finder_core::WeatherSnapshot;
use finder_core::store::FavouriteEntry;

/// Full report: current conditions, 24-hour and 7-day forecasts.
pub fn snapshot(snapshot: &WeatherSnapshot) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{} ({})  [{}, {}]\n",
        snapshot.city.name, snapshot.city.country, snapshot.coord.lat, snapshot.coord.lon
    ));
    out.push_str(&current_block(snapshot));
    out.push('\n');

    out.push_str("24-Hour Forecast\n");
    for hour in snapshot.hourly.iter().take(24) {
        out.push_str(&format!(
            "  {}  {:>3}\u{b0}C  {:<20}  humidity {}%  wind {} m/s\n",
            clock(hour.dt, snapshot.timezone_offset),
            floor(hour.temp),
            hour.condition.description,
            hour.humidity,
            hour.wind_speed,
        ));
    }
    out.push('\n');

    out.push_str("7-Day Forecast\n");
    for day in snapshot.daily.iter().skip(1).take(7) {
        out.push_str(&format!(
            "  {}  {:>3}\u{b0}C / {:>3}\u{b0}C  {:<20}  humidity {}%  wind {} m/s\n",
            weekday(day.dt, snapshot.timezone_offset),
            floor(day.temp_max),
            floor(day.temp_min),
            day.condition.description,
            day.humidity,
            day.wind_speed,
        ));
    }

    out
}

/// Compact card for one favourite: current conditions only.
pub fn favourite_card(entry: &FavouriteEntry, snapshot: &WeatherSnapshot) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} ({})\n", entry, snapshot.city.country));
    out.push_str(&current_block(snapshot));
    out.push('\n');
    out
}

fn current_block(snapshot: &WeatherSnapshot) -> String {
    let current = &snapshot.current;
    let mut out = String::new();

    out.push_str(&format!(
        "  {}\u{b0}C, {} (feels like {}\u{b0}C)\n",
        floor(current.temp),
        current.condition.description,
        floor(current.feels_like),
    ));
    out.push_str(&format!(
        "  Humidity {}%  UV {}  Visibility {:.1} km  Wind {} m/s  Pressure {} hPa\n",
        current.humidity,
        current.uvi,
        f64::from(current.visibility) / 1000.0,
        current.wind_speed,
        current.pressure,
    ));
    out.push_str(&format!(
        "  Sunrise {}  Sunset {}\n",
        clock(current.sunrise, snapshot.timezone_offset),
        clock(current.sunset, snapshot.timezone_offset),
    ));

    out
}

fn floor(temp: f64) -> i64 {
    temp.floor() as i64
}

/// Shift an epoch timestamp by the location's UTC offset.
fn local_time(ts: i64, offset_secs: i32) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts + i64::from(offset_secs), 0)
}

fn clock(ts: i64, offset_secs: i32) -> String {
    local_time(ts, offset_secs)
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

fn weekday(ts: i64, offset_secs: i32) -> String {
    local_time(ts, offset_secs)
        .map(|t| t.format("%a").to_string())
        .unwrap_or_else(|| "---".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use finder_core::model::{
        CityInfo, Coord, CurrentConditions, DailyEntry, HourlyEntry, WeatherCondition,
    };

    fn sample_snapshot() -> WeatherSnapshot {
        let condition = WeatherCondition {
            id: 802,
            description: "scattered clouds".to_string(),
            icon: "03d".to_string(),
        };
        WeatherSnapshot {
            current: CurrentConditions {
                temp: 21.7,
                feels_like: 20.2,
                pressure: 1012,
                humidity: 45,
                uvi: 3.4,
                visibility: 10_000,
                wind_speed: 4.6,
                sunrise: 1_736_485_200,
                sunset: 1_736_517_600,
                condition: condition.clone(),
            },
            hourly: (0..30)
                .map(|i| HourlyEntry {
                    dt: 1_736_488_800 + i * 3600,
                    temp: 20.0,
                    humidity: 46,
                    wind_speed: 4.1,
                    condition: condition.clone(),
                })
                .collect(),
            daily: (0..8)
                .map(|i| DailyEntry {
                    dt: 1_736_503_200 + i * 86_400,
                    temp_min: 14.2,
                    temp_max: 22.9,
                    humidity: 52,
                    wind_speed: 5.0,
                    condition: condition.clone(),
                })
                .collect(),
            timezone_offset: 3600,
            city: CityInfo { name: "Warsaw".to_string(), country: "PL".to_string() },
            coord: Coord { lat: 52.23, lon: 21.01 },
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn report_carries_city_sections_and_floored_temperatures() {
        let text = snapshot(&sample_snapshot());

        assert!(text.starts_with("Warsaw (PL)"));
        assert!(text.contains("21\u{b0}C, scattered clouds (feels like 20\u{b0}C)"));
        assert!(text.contains("24-Hour Forecast"));
        assert!(text.contains("7-Day Forecast"));
        assert!(text.contains("Sunrise"));
    }

    #[test]
    fn hourly_section_is_capped_at_24_entries() {
        let text = snapshot(&sample_snapshot());
        let hourly_lines =
            text.lines().filter(|line| line.contains("humidity 46%")).count();
        assert_eq!(hourly_lines, 24);
    }

    #[test]
    fn daily_section_skips_today_and_shows_seven_days() {
        let text = snapshot(&sample_snapshot());
        let daily_lines =
            text.lines().filter(|line| line.contains("humidity 52%")).count();
        assert_eq!(daily_lines, 7);
    }

    #[test]
    fn favourite_card_shows_the_entry_label() {
        let card = favourite_card(&FavouriteEntry::city("Warsaw"), &sample_snapshot());
        assert!(card.starts_with("Warsaw (PL)"));
        assert!(card.contains("Humidity 45%"));
    }
}
