use crate::{
    Config,
    error::WeatherError,
    model::{Forecast, Observation},
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc, time::Duration};

pub mod cwb;

pub use cwb::CwbClient;

/// The two remote reads the dashboard needs.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    /// Current conditions at an observation station.
    async fn current_observation(&self, station: &str) -> Result<Observation, WeatherError>;

    /// First period of the 36-hour forecast for a county.
    async fn forecast(&self, city: &str) -> Result<Forecast, WeatherError>;
}

#[async_trait]
impl<T: WeatherSource + ?Sized> WeatherSource for Box<T> {
    async fn current_observation(&self, station: &str) -> Result<Observation, WeatherError> {
        (**self).current_observation(station).await
    }

    async fn forecast(&self, city: &str) -> Result<Forecast, WeatherError> {
        (**self).forecast(city).await
    }
}

#[async_trait]
impl<T: WeatherSource + ?Sized> WeatherSource for Arc<T> {
    async fn current_observation(&self, station: &str) -> Result<Observation, WeatherError> {
        (**self).current_observation(station).await
    }

    async fn forecast(&self, city: &str) -> Result<Forecast, WeatherError> {
        (**self).forecast(city).await
    }
}

/// Construct the CWB client from config.
pub fn client_from_config(config: &Config) -> anyhow::Result<CwbClient> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No CWB authorization token configured.\n\
             Hint: run `weather configure` or set CWB_API_KEY."
        )
    })?;

    let timeout = Duration::from_secs(config.timeout_secs());
    let client = CwbClient::with_base_url(api_key, config.base_url(), timeout)?;

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_from_config_errors_without_token() {
        let cfg = Config::default();
        if std::env::var(crate::config::API_KEY_ENV).is_ok() {
            return;
        }

        let err = client_from_config(&cfg).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("No CWB authorization token configured"));
        assert!(msg.contains("weather configure"));
    }

    #[test]
    fn client_from_config_uses_configured_base_url() {
        let cfg = Config {
            api_key: Some("CWB-TEST".into()),
            base_url: Some("http://127.0.0.1:9/datastore/".into()),
            ..Config::default()
        };

        let client = client_from_config(&cfg).expect("client must build");
        assert_eq!(client.base_url(), "http://127.0.0.1:9/datastore");
    }
}
