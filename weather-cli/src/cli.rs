use anyhow::{Context, bail};
use clap::{ArgGroup, Parser, Subcommand};
use inquire::{Confirm, Password};
use weather_core::{
    Config, SaveOutcome, WeatherService,
    search::{HistoryQuery, search, unique_cities},
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather lookup and city comparison")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the Weatherstack API key in the config file.
    Configure {
        /// Key to store; prompted for when omitted.
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Show current weather for a city or a Brazilian postal code.
    Show {
        /// City name.
        #[arg(required_unless_present = "postal")]
        city: Option<String>,

        /// Postal code (CEP) to resolve to a city first.
        #[arg(long, conflicts_with = "city")]
        postal: Option<String>,

        /// Add the result to the search history.
        #[arg(long)]
        save: bool,
    },

    /// Resolve a postal code to its city.
    Postal { code: String },

    /// Compare the weather of two cities.
    Compare { first: String, second: String },

    /// List saved searches, one per city.
    #[command(group(ArgGroup::new("filter").args(["city", "postal", "date"])))]
    History {
        /// Filter by city name (accents and case are ignored).
        #[arg(long)]
        city: Option<String>,

        /// Filter by postal code digits.
        #[arg(long)]
        postal: Option<String>,

        /// Filter by date text, e.g. "19/10" or "2026".
        #[arg(long)]
        date: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { api_key } => configure(api_key),
            command => {
                let config = Config::load()?.with_env_overrides();
                let service = WeatherService::from_config(&config)?;
                execute(command, &service).await
            }
        }
    }
}

async fn execute(command: Command, service: &WeatherService) -> anyhow::Result<()> {
    tracing::debug!(?command, "running command");
    match command {
        Command::Configure { .. } => bail!("`configure` does not need a weather service"),
        Command::Show { city, postal, save } => {
            let (resolved, postal_code) = match (city, postal) {
                (_, Some(code)) => {
                    let (address, resolved) = service.lookup_by_postal_code(&code).await?;
                    println!("{}", render::postal(&address));
                    (resolved, Some(address.postal_code))
                }
                (Some(city), None) => (service.lookup(&city).await?, None),
                (None, None) => bail!("Please provide a city or --postal code."),
            };
            println!("{}", render::lookup(&resolved));

            if save {
                match service.save(&resolved, postal_code)? {
                    SaveOutcome::Saved(entry) => println!("Saved to history (#{}).", entry.id),
                    SaveOutcome::AlreadyInHistory => println!("Already in history; not saved again."),
                }
            }
        }
        Command::Postal { code } => {
            let address = service.resolve_postal_code(&code).await?;
            println!("{}", render::postal(&address));
        }
        Command::Compare { first, second } => {
            let result = service.compare(&first, &second).await?;
            println!("{}", render::comparison(&result));
        }
        Command::History { city, postal, date } => {
            let history = service.history_or_empty();
            let query = city
                .map(HistoryQuery::City)
                .or(postal.map(HistoryQuery::PostalCode))
                .or(date.map(HistoryQuery::Date));
            let entries = match &query {
                Some(query) => search(&history, query),
                None => unique_cities(&history),
            };
            println!("{}", render::history(&entries));
        }
    }

    Ok(())
}

fn configure(api_key: Option<String>) -> anyhow::Result<()> {
    let mut config = Config::load()?;

    if config.is_provider_configured()
        && api_key.is_none()
        && !Confirm::new("An API key is already configured. Replace it?")
            .with_default(false)
            .prompt()?
    {
        return Ok(());
    }

    let api_key = match api_key {
        Some(key) => key,
        None => Password::new("Weatherstack API key:")
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?,
    };
    let api_key = api_key.trim();
    if api_key.is_empty() {
        bail!("API key must not be empty.");
    }

    config.set_api_key(api_key.to_string());
    config.save()?;

    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}
