//! Orchestration of the geocoding and weather lookups.
//!
//! `WeatherFetcher` owns the observable `{data, loading, error}` triple the
//! UI layer reads. Concurrent invocations race last-writer-wins on that
//! shared state; callers hydrating several locations at once use
//! [`WeatherFetcher::hydrate`], which keys results per entry instead.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use crate::{
    error::FetchError,
    model::{CityInfo, Coord, UNKNOWN, WeatherSnapshot},
    provider::WeatherProvider,
    store::FavouriteEntry,
};

/// The tri-state observed by the presentation layer.
#[derive(Debug, Clone, Default)]
pub struct FetchState {
    /// Last successful snapshot, absent after a failed or reset fetch.
    pub data: Option<WeatherSnapshot>,
    /// True from fetch entry until the fetch resolves, on every exit path.
    pub loading: bool,
    /// User-facing message for the last failure, absent on success.
    pub error: Option<String>,
}

/// One favourite paired with its own fetch outcome.
#[derive(Debug)]
pub struct HydratedFavourite {
    pub entry: FavouriteEntry,
    pub result: Result<WeatherSnapshot, FetchError>,
}

#[derive(Debug)]
pub struct WeatherFetcher {
    provider: Box<dyn WeatherProvider>,
    state: Mutex<FetchState>,
}

impl WeatherFetcher {
    pub fn new(provider: Box<dyn WeatherProvider>) -> Self {
        Self { provider, state: Mutex::new(FetchState::default()) }
    }

    /// The observable tri-state as of this call.
    pub fn state(&self) -> FetchState {
        self.lock_state().clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, FetchState> {
        // Single logical writer; a poisoned lock still holds consistent data.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch weather for a coordinate pair.
    ///
    /// Reverse geocoding is best-effort enrichment: when it fails or finds
    /// nothing, the snapshot is still produced with `Unknown` city metadata.
    pub async fn fetch_by_coordinates(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<WeatherSnapshot, FetchError> {
        let _pending = PendingFetch::begin(&self.state);
        let outcome = self.coordinate_snapshot(lat, lon).await;
        self.record(outcome)
    }

    /// Resolve a city name to coordinates, then fetch weather for them.
    ///
    /// The forward-geocoding result drives the weather lookup and its
    /// name/country/coordinates win over whatever the inner coordinate
    /// fetch resolves. Zero matches fail with [`FetchError::NoResults`]
    /// before any weather call is made.
    pub async fn fetch_by_city(
        &self,
        city: &str,
        country_code: Option<&str>,
    ) -> Result<WeatherSnapshot, FetchError> {
        let _pending = PendingFetch::begin(&self.state);
        let outcome = self.city_snapshot(city, country_code).await;
        self.record(outcome)
    }

    /// Fetch weather for every favourite, each into its own result slot.
    ///
    /// Results come back in input order and the shared [`FetchState`] is
    /// left untouched, so hydrating N favourites cannot clobber a lookup
    /// the UI is observing.
    pub async fn hydrate(&self, entries: &[FavouriteEntry]) -> Vec<HydratedFavourite> {
        let mut hydrated = Vec::with_capacity(entries.len());
        for entry in entries {
            let result = match entry {
                FavouriteEntry::City { name } => self.city_snapshot(name, None).await,
                FavouriteEntry::Coordinates { lat, lon } => {
                    self.coordinate_snapshot(*lat, *lon).await
                }
            };
            hydrated.push(HydratedFavourite { entry: entry.clone(), result });
        }
        hydrated
    }

    fn record(
        &self,
        outcome: Result<WeatherSnapshot, FetchError>,
    ) -> Result<WeatherSnapshot, FetchError> {
        let mut state = self.lock_state();
        match &outcome {
            Ok(snapshot) => state.data = Some(snapshot.clone()),
            Err(err) => state.error = Some(err.user_message().to_string()),
        }
        outcome
    }

    async fn city_snapshot(
        &self,
        city: &str,
        country_code: Option<&str>,
    ) -> Result<WeatherSnapshot, FetchError> {
        let matches = self.provider.geocode_city(city, country_code).await?;
        let place = matches.into_iter().next().ok_or(FetchError::NoResults)?;

        let mut snapshot = self.coordinate_snapshot(place.lat, place.lon).await?;
        // The forward lookup already resolved the city; it wins over the
        // reverse lookup performed inside the coordinate fetch.
        snapshot.city = CityInfo {
            name: place.name,
            country: place.country.unwrap_or_else(|| UNKNOWN.to_string()),
        };
        Ok(snapshot)
    }

    async fn coordinate_snapshot(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, FetchError> {
        let report = self.provider.one_call(lat, lon).await?;
        let city = self.resolve_city(lat, lon).await;

        Ok(WeatherSnapshot {
            current: report.current,
            hourly: report.hourly,
            daily: report.daily,
            timezone_offset: report.timezone_offset,
            city,
            coord: Coord { lat, lon },
            fetched_at: Utc::now(),
        })
    }

    async fn resolve_city(&self, lat: f64, lon: f64) -> CityInfo {
        match self.provider.reverse_geocode(lat, lon).await {
            Ok(places) => match places.into_iter().next() {
                Some(place) => CityInfo {
                    name: place.name,
                    country: place.country.unwrap_or_else(|| UNKNOWN.to_string()),
                },
                None => {
                    tracing::warn!(lat, lon, "no reverse geocoding match for coordinates");
                    CityInfo::unknown()
                }
            },
            Err(err) => {
                tracing::warn!(lat, lon, error = %err, "reverse geocoding failed");
                CityInfo::unknown()
            }
        }
    }
}

/// Scoped acquisition of the loading flag.
///
/// `begin` resets `data`/`error` and raises `loading`; dropping the guard
/// lowers `loading` again, so every exit path of a fetch clears it.
struct PendingFetch<'a> {
    state: &'a Mutex<FetchState>,
}

impl<'a> PendingFetch<'a> {
    fn begin(state: &'a Mutex<FetchState>) -> Self {
        let mut s = state.lock().unwrap_or_else(PoisonError::into_inner);
        s.data = None;
        s.error = None;
        s.loading = true;
        drop(s);
        Self { state }
    }
}

impl Drop for PendingFetch<'_> {
    fn drop(&mut self) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).loading = false;
    }
}
