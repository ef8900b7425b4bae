use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use finder_core::{Config, FavouriteEntry, FavouritesStore, WeatherFetcher, provider_from_config};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "finder", version, about = "Weather Finder CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key used for all lookups.
    Configure,

    /// Show current, hourly and daily weather for a location.
    Show {
        #[command(flatten)]
        location: LocationArgs,
    },

    /// Manage favourite locations.
    Favourites {
        #[command(subcommand)]
        command: FavouritesCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum FavouritesCommand {
    /// Save a location to the favourites list.
    Add {
        #[command(flatten)]
        location: LocationArgs,
    },

    /// Remove a location from the favourites list.
    Remove {
        #[command(flatten)]
        location: LocationArgs,
    },

    /// List favourites with live weather for each.
    List,
}

/// A location given either as a city name or as a coordinate pair.
#[derive(Debug, Args)]
pub struct LocationArgs {
    /// City name, e.g. "Warsaw".
    #[arg(conflicts_with_all = ["lat", "lon"])]
    pub city: Option<String>,

    /// Optional ISO country code narrowing the city search, e.g. "PL".
    #[arg(long, requires = "city")]
    pub country: Option<String>,

    /// Latitude in decimal degrees; requires --lon.
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude in decimal degrees; requires --lat.
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,
}

#[derive(Debug)]
enum ResolvedLocation {
    City { name: String, country: Option<String> },
    Coordinates { lat: f64, lon: f64 },
}

impl LocationArgs {
    fn resolve(&self) -> Result<ResolvedLocation> {
        match (&self.city, self.lat, self.lon) {
            (Some(city), None, None) => {
                let name = city.trim();
                if name.is_empty() {
                    bail!("Please enter a valid city name.");
                }
                Ok(ResolvedLocation::City {
                    name: name.to_string(),
                    country: self.country.clone(),
                })
            }
            (None, Some(lat), Some(lon)) => Ok(ResolvedLocation::Coordinates { lat, lon }),
            _ => bail!("Give either a city name or both --lat and --lon."),
        }
    }

    fn favourite(&self) -> Result<FavouriteEntry> {
        Ok(match self.resolve()? {
            // Favourite identity is the bare name; the country code only
            // narrows searches and is not part of it.
            ResolvedLocation::City { name, .. } => FavouriteEntry::city(name),
            ResolvedLocation::Coordinates { lat, lon } => FavouriteEntry::coordinates(lat, lon),
        })
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { location } => show(location).await,
            Command::Favourites { command } => match command {
                FavouritesCommand::Add { location } => favourites_add(&location),
                FavouritesCommand::Remove { location } => favourites_remove(&location),
                FavouritesCommand::List => favourites_list().await,
            },
        }
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read the API key")?;

    config.set_api_key(api_key.trim().to_string());
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(location: LocationArgs) -> Result<()> {
    let resolved = location.resolve()?;

    let config = Config::load()?;
    let fetcher = WeatherFetcher::new(provider_from_config(&config)?);

    let result = match resolved {
        ResolvedLocation::City { name, country } => {
            fetcher.fetch_by_city(&name, country.as_deref()).await
        }
        ResolvedLocation::Coordinates { lat, lon } => {
            fetcher.fetch_by_coordinates(lat, lon).await
        }
    };

    match result {
        Ok(snapshot) => {
            print!("{}", render::snapshot(&snapshot));
            Ok(())
        }
        Err(err) => {
            tracing::debug!(error = %err, "fetch failed");
            bail!("{}", err.user_message())
        }
    }
}

fn favourites_add(location: &LocationArgs) -> Result<()> {
    let entry = location.favourite()?;
    let mut store = FavouritesStore::load_default()?;

    if store.add(entry.clone())? {
        println!("Added {entry} to favourites.");
    } else {
        println!("{entry} is already a favourite.");
    }
    Ok(())
}

fn favourites_remove(location: &LocationArgs) -> Result<()> {
    let entry = location.favourite()?;
    let mut store = FavouritesStore::load_default()?;

    if store.remove(&entry)? {
        println!("Removed {entry} from favourites.");
    } else {
        println!("{entry} is not in the favourites list.");
    }
    Ok(())
}

async fn favourites_list() -> Result<()> {
    let store = FavouritesStore::load_default()?;
    if store.entries().is_empty() {
        println!("No favourite locations. Add new ones with `finder favourites add`.");
        return Ok(());
    }

    let config = Config::load()?;
    let fetcher = WeatherFetcher::new(provider_from_config(&config)?);

    for hydrated in fetcher.hydrate(store.entries()).await {
        match hydrated.result {
            Ok(snapshot) => print!("{}", render::favourite_card(&hydrated.entry, &snapshot)),
            Err(err) => {
                tracing::debug!(error = %err, favourite = %hydrated.entry, "hydration failed");
                println!("{}: {}", hydrated.entry, err.user_message());
            }
        }
    }
    Ok(())
}
