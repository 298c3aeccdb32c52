use anyhow::Result;
use std::collections::VecDeque;
use tracing::{info, warn};

use crate::{
    config::ConfigFile,
    dashboard::{Dashboard, Effect, Event, Generation, StaleResponses},
    fetch::fetch_weather,
    location::{self, LocationRef},
    provider::WeatherSource,
};

/// Runs a [`Dashboard`] against a weather source and a config file.
#[derive(Debug)]
pub struct Session<S> {
    source: S,
    store: ConfigFile,
    dashboard: Dashboard,
}

impl<S: WeatherSource> Session<S> {
    /// Restore the persisted city (or the default one) and perform the first fetch.
    pub async fn open(source: S, store: ConfigFile, policy: StaleResponses) -> Result<Self> {
        let location = match store.current_city() {
            Some(name) => location::resolve_or_default(name),
            None => location::default_location(),
        };
        info!(city = %location.display_name, "opening weather session");

        let (dashboard, effects) = Dashboard::start(location, policy);
        let mut session = Self { source, store, dashboard };
        session.run(effects).await?;

        Ok(session)
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn location(&self) -> &LocationRef {
        self.dashboard.location()
    }

    pub fn store(&self) -> &ConfigFile {
        &self.store
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.dispatch(Event::Refresh).await
    }

    pub async fn select_city(&mut self, location: LocationRef) -> Result<()> {
        self.dispatch(Event::SelectCity(location)).await
    }

    /// Feed `event` to the dashboard and carry out effects until none are left.
    ///
    /// A failure to persist the city does not stop the remaining effects; the
    /// fetch still runs and the persistence error is returned afterwards.
    pub async fn dispatch(&mut self, event: Event) -> Result<()> {
        let effects = self.dashboard.reduce(event);
        self.run(effects).await
    }

    async fn run(&mut self, effects: Vec<Effect>) -> Result<()> {
        let mut pending: VecDeque<Effect> = effects.into();
        let mut persist_error = None;

        while let Some(effect) = pending.pop_front() {
            match effect {
                Effect::PersistCity(name) => {
                    if let Err(err) = self.store.set_current_city(&name) {
                        warn!(error = %format!("{err:#}"), city = %name, "could not save city");
                        if persist_error.is_none() {
                            persist_error = Some(err);
                        }
                    }
                }
                Effect::Fetch { generation, location } => {
                    let event = fetch_event(&self.source, generation, &location).await;
                    pending.extend(self.dashboard.reduce(event));
                }
            }
        }

        persist_error.map_or(Ok(()), Err)
    }
}

/// Perform one fetch and turn its outcome into the matching event.
pub async fn fetch_event<S>(source: &S, generation: Generation, location: &LocationRef) -> Event
where
    S: WeatherSource + ?Sized,
{
    match fetch_weather(source, location).await {
        Ok(snapshot) => Event::FetchSucceeded { generation, snapshot },
        Err(err) => {
            warn!(%err, generation, city = %location.display_name, "fetch failed");
            Event::FetchFailed {
                generation,
                message: err.user_message(),
                retryable: err.is_retryable(),
            }
        }
    }
}
