//! Core library for the `weather` dashboard.
//!
//! This crate defines:
//! - Configuration & persistence of the selected city
//! - The Central Weather Bureau client and field extraction
//! - City resolution, day/night classification and themes
//! - The dashboard state machine and the session that drives it
//!
//! It is used by `cwb-weather-cli`, but can also be reused by other front ends.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod fetch;
pub mod location;
pub mod model;
pub mod moment;
pub mod provider;
pub mod session;
pub mod theme;

pub use config::{Config, ConfigFile};
pub use dashboard::{Dashboard, Effect, Event, FetchStatus, StaleResponses};
pub use error::WeatherError;
pub use fetch::fetch_weather;
pub use location::{DEFAULT_CITY, LocationRef, resolve, resolve_or_default, supported_cities};
pub use model::{Forecast, Observation, WeatherSnapshot, WeatherViewModel};
pub use moment::{Moment, SunriseTable, classify_moment};
pub use provider::{CwbClient, WeatherSource, client_from_config};
pub use session::Session;
pub use theme::{Palette, Theme};
