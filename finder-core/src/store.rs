//! The persisted favourites collection.
//!
//! A deduplicated, insertion-ordered list of favourite locations, written to
//! one JSON file on every mutation and read once at startup. Earlier
//! releases persisted a bare array (city names, or `{lat, lon}` objects with
//! string coordinates); those records migrate on load. Corrupt or missing
//! storage loads as an empty collection, never fatally.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

const STORE_VERSION: u32 = 2;

/// A favourite location, identified by city name or by coordinates.
///
/// Equality is string equality for names and structural equality for
/// coordinate pairs; the collection never holds two equal entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FavouriteEntry {
    City { name: String },
    Coordinates { lat: f64, lon: f64 },
}

impl FavouriteEntry {
    pub fn city(name: impl Into<String>) -> Self {
        FavouriteEntry::City { name: name.into() }
    }

    pub fn coordinates(lat: f64, lon: f64) -> Self {
        FavouriteEntry::Coordinates { lat, lon }
    }
}

impl fmt::Display for FavouriteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FavouriteEntry::City { name } => f.write_str(name),
            FavouriteEntry::Coordinates { lat, lon } => write!(f, "{lat}, {lon}"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedFavourites {
    version: u32,
    favourites: Vec<FavouriteEntry>,
}

/// Pre-versioning on-disk shapes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LegacyEntry {
    Name(String),
    Coords { lat: LegacyCoord, lon: LegacyCoord },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LegacyCoord {
    Number(f64),
    Text(String),
}

impl LegacyCoord {
    fn as_f64(&self) -> Option<f64> {
        match self {
            LegacyCoord::Number(n) => Some(*n),
            LegacyCoord::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug)]
pub struct FavouritesStore {
    path: PathBuf,
    entries: Vec<FavouriteEntry>,
}

impl FavouritesStore {
    /// Load the store from its platform location.
    pub fn load_default() -> Result<Self> {
        Ok(Self::load(Self::store_file_path()?))
    }

    /// Load the store from `path`, treating unreadable content as empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => parse_entries(&contents, &path),
            // First run: nothing persisted yet.
            Err(_) => Vec::new(),
        };
        Self { path, entries }
    }

    /// The current ordered collection.
    pub fn entries(&self) -> &[FavouriteEntry] {
        &self.entries
    }

    pub fn contains(&self, entry: &FavouriteEntry) -> bool {
        self.entries.contains(entry)
    }

    /// Append `entry` unless an equal one exists. Returns whether the
    /// collection changed. Idempotent; persists on actual insertion.
    pub fn add(&mut self, entry: FavouriteEntry) -> Result<bool> {
        if self.contains(&entry) {
            return Ok(false);
        }
        self.entries.push(entry);
        self.save()?;
        Ok(true)
    }

    /// Remove every entry equal to `entry`, preserving the order of the
    /// rest. Returns whether the collection changed. Idempotent.
    pub fn remove(&mut self, entry: &FavouriteEntry) -> Result<bool> {
        let before = self.entries.len();
        self.entries.retain(|e| e != entry);
        if self.entries.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create favourites directory: {}", parent.display())
            })?;
        }

        let record =
            PersistedFavourites { version: STORE_VERSION, favourites: self.entries.clone() };
        let json = serde_json::to_string_pretty(&record)
            .context("Failed to serialize favourites to JSON")?;

        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write favourites file: {}", self.path.display()))
    }

    /// Path to the favourites file.
    pub fn store_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-finder", "finder-cli")
            .ok_or_else(|| anyhow!("Could not determine platform data directory"))?;

        Ok(dirs.data_dir().join("favourites.json"))
    }
}

fn parse_entries(contents: &str, path: &Path) -> Vec<FavouriteEntry> {
    if let Ok(record) = serde_json::from_str::<PersistedFavourites>(contents) {
        return record.favourites;
    }

    if let Ok(legacy) = serde_json::from_str::<Vec<LegacyEntry>>(contents) {
        tracing::info!(path = %path.display(), "migrating favourites from unversioned format");
        let mut entries: Vec<FavouriteEntry> = Vec::with_capacity(legacy.len());
        for old in legacy {
            let Some(entry) = upgrade_entry(old) else {
                tracing::warn!("skipping favourite with unparseable coordinates");
                continue;
            };
            if !entries.contains(&entry) {
                entries.push(entry);
            }
        }
        return entries;
    }

    tracing::warn!(path = %path.display(), "favourites file is corrupt; starting empty");
    Vec::new()
}

fn upgrade_entry(old: LegacyEntry) -> Option<FavouriteEntry> {
    match old {
        LegacyEntry::Name(name) => Some(FavouriteEntry::City { name }),
        LegacyEntry::Coords { lat, lon } => {
            Some(FavouriteEntry::Coordinates { lat: lat.as_f64()?, lon: lon.as_f64()? })
        }
    }
}
