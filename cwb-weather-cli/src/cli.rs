use std::{fmt, path::PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use cwb_weather_core::{
    ConfigFile, CwbClient, Dashboard, Effect, LocationRef, Session, StaleResponses, SunriseTable,
    classify_moment, client_from_config, resolve, session::fetch_event, supported_cities,
};
use inquire::{
    CustomUserError, Password, PasswordDisplayMode, Select, Text, validator::Validation,
};
use tracing::warn;

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Taiwan weather dashboard backed by CWB open data")]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the CWB authorization token and optional sunrise/sunset table.
    Configure,

    /// List supported cities.
    Cities,

    /// Print the weather card once.
    Show {
        /// City to show without changing the saved selection.
        #[arg(long)]
        city: Option<String>,
    },

    /// Choose the city and print its weather card.
    Select {
        /// Display name, e.g. "高雄市". Prompts when omitted.
        city: Option<String>,
    },

    /// Interactive weather card with refresh and city setting.
    Dashboard,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let store = match self.config {
            Some(path) => ConfigFile::open(path)?,
            None => ConfigFile::open_default()?,
        };

        match self.command {
            Command::Configure => configure(store),
            Command::Cities => {
                for name in supported_cities() {
                    let marker = if store.current_city() == Some(name) { "*" } else { " " };
                    println!("{marker} {name}");
                }
                Ok(())
            }
            Command::Show { city } => show(store, city).await,
            Command::Select { city } => {
                let sunrise = load_sunrise_table(&store);
                let mut session = open_session(store).await?;

                let location = match city {
                    Some(name) => Some(resolve(&name)?),
                    None => city_setting(session.location())?,
                };
                if let Some(location) = location {
                    select_city(&mut session, location).await;
                }

                print_card(session.dashboard(), &sunrise);
                Ok(())
            }
            Command::Dashboard => dashboard(store).await,
        }
    }
}

fn configure(mut store: ConfigFile) -> Result<()> {
    let api_key = Password::new("CWB authorization token:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .with_validator(validate_token)
        .without_confirmation()
        .prompt()?;

    let sunrise = Text::new("Sunrise/sunset table (JSON path, empty to skip):")
        .prompt_skippable()?
        .filter(|path| !path.trim().is_empty());

    let config = store.config_mut();
    config.set_api_key(api_key.trim().to_string());
    if let Some(path) = sunrise {
        config.sunrise_table = Some(PathBuf::from(path.trim()));
    }
    store.save()?;

    println!("Saved configuration to {}", store.path().display());
    Ok(())
}

async fn show(store: ConfigFile, city: Option<String>) -> Result<()> {
    let sunrise = load_sunrise_table(&store);

    let Some(name) = city else {
        let session = open_session(store).await?;
        print_card(session.dashboard(), &sunrise);
        return Ok(());
    };

    // One-off city: run the fetch without touching the saved selection.
    let client = client_from_config(store.config())?;
    let (mut dashboard, effects) = Dashboard::start(resolve(&name)?, StaleResponses::Discard);
    for effect in effects {
        if let Effect::Fetch { generation, location } = effect {
            let event = fetch_event(&client, generation, &location).await;
            dashboard.reduce(event);
        }
    }

    print_card(&dashboard, &sunrise);
    Ok(())
}

fn validate_token(input: &str) -> Result<Validation, CustomUserError> {
    if input.trim().is_empty() {
        Ok(Validation::Invalid("The authorization token cannot be empty".into()))
    } else {
        Ok(Validation::Valid)
    }
}

#[derive(Debug, Clone, Copy)]
enum CardAction {
    Refresh,
    ChangeCity,
    Quit,
}

impl fmt::Display for CardAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CardAction::Refresh => "Refresh",
            CardAction::ChangeCity => "Change city",
            CardAction::Quit => "Quit",
        })
    }
}

async fn dashboard(store: ConfigFile) -> Result<()> {
    let sunrise = load_sunrise_table(&store);
    let mut session = open_session(store).await?;

    loop {
        print_card(session.dashboard(), &sunrise);

        let actions = vec![CardAction::Refresh, CardAction::ChangeCity, CardAction::Quit];
        let Some(action) = Select::new("", actions).prompt_skippable()? else {
            break;
        };

        match action {
            CardAction::Refresh => {
                eprintln!("Refreshing...");
                session.refresh().await?;
            }
            CardAction::ChangeCity => {
                if let Some(location) = city_setting(session.location())? {
                    select_city(&mut session, location).await;
                }
            }
            CardAction::Quit => break,
        }
    }

    Ok(())
}

/// City setting screen. `None` when the user backs out.
fn city_setting(current: &LocationRef) -> Result<Option<LocationRef>> {
    let cities: Vec<&str> = supported_cities().collect();
    let cursor = cities
        .iter()
        .position(|name| *name == current.display_name)
        .unwrap_or_default();

    let choice = Select::new("City:", cities)
        .with_starting_cursor(cursor)
        .with_page_size(12)
        .prompt_skippable()?;

    choice.map(resolve).transpose().map_err(Into::into)
}

/// Switch city; a failed save is reported but the card still updates.
async fn select_city(session: &mut Session<CwbClient>, location: LocationRef) {
    if let Err(err) = session.select_city(location).await {
        eprintln!("Could not save the selected city: {err:#}");
    }
}

async fn open_session(store: ConfigFile) -> Result<Session<CwbClient>> {
    let client = client_from_config(store.config())?;
    Session::open(client, store, StaleResponses::Discard)
        .await
        .context("Failed to start weather session")
}

/// A broken table only affects the theme, so it is logged rather than fatal.
fn load_sunrise_table(store: &ConfigFile) -> SunriseTable {
    let Some(path) = store.config().sunrise_table.as_deref() else {
        return SunriseTable::empty();
    };

    SunriseTable::load(path).unwrap_or_else(|err| {
        warn!(error = %format!("{err:#}"), "sunrise/sunset table unavailable; using light theme");
        SunriseTable::empty()
    })
}

fn print_card(dashboard: &Dashboard, sunrise: &SunriseTable) {
    let moment = classify_moment(sunrise, &dashboard.location().sunrise_table_key, &Local::now());
    println!("{}", render::card(dashboard, moment));
}
