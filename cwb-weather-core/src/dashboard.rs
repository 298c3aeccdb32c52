//! State machine behind the weather card.
//!
//! [`Dashboard::reduce`] performs no I/O. It updates the state and returns the
//! [`Effect`]s the caller has to carry out; the outcome of a fetch comes back
//! in as another [`Event`]. Every fetch is tagged with a generation number so
//! that a response for an outdated request can be recognised.

use tracing::{debug, warn};

use crate::{
    location::LocationRef,
    model::{WeatherSnapshot, WeatherViewModel},
};

pub type Generation = u64;

/// What to do with a response whose generation is not the latest requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StaleResponses {
    /// Drop it. The newest request always wins.
    #[default]
    Discard,
    /// Apply it anyway. Whichever response arrives last wins, so a slow
    /// response for a previous city can overwrite the current one.
    Apply,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchStatus {
    Idle,
    Loading { generation: Generation },
    Ready,
    Error { message: String, retryable: bool },
}

#[derive(Debug, Clone)]
pub enum Event {
    SelectCity(LocationRef),
    Refresh,
    FetchSucceeded { generation: Generation, snapshot: WeatherSnapshot },
    FetchFailed { generation: Generation, message: String, retryable: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Fetch { generation: Generation, location: LocationRef },
    PersistCity(String),
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    location: LocationRef,
    view: WeatherViewModel,
    status: FetchStatus,
    generation: Generation,
    policy: StaleResponses,
}

impl Dashboard {
    pub fn new(location: LocationRef, policy: StaleResponses) -> Self {
        Self {
            location,
            view: WeatherViewModel::default(),
            status: FetchStatus::Idle,
            generation: 0,
            policy,
        }
    }

    /// Create the dashboard and request its first fetch.
    pub fn start(location: LocationRef, policy: StaleResponses) -> (Self, Vec<Effect>) {
        let mut dashboard = Self::new(location, policy);
        let effects = vec![dashboard.begin_fetch()];
        (dashboard, effects)
    }

    pub fn location(&self) -> &LocationRef {
        &self.location
    }

    pub fn view(&self) -> &WeatherViewModel {
        &self.view
    }

    pub fn status(&self) -> &FetchStatus {
        &self.status
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.view.is_loading
    }

    pub fn reduce(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::SelectCity(location) => self.select_city(location),
            Event::Refresh => vec![self.begin_fetch()],
            Event::FetchSucceeded { generation, snapshot } => {
                if self.accepts(generation) {
                    self.view = WeatherViewModel::from(snapshot);
                    self.status = FetchStatus::Ready;
                }
                Vec::new()
            }
            Event::FetchFailed { generation, message, retryable } => {
                if generation == self.generation {
                    warn!(generation, %message, retryable, "weather fetch failed");
                    self.view.is_loading = false;
                    self.status = FetchStatus::Error { message, retryable };
                } else {
                    debug!(generation, latest = self.generation, "ignoring stale fetch failure");
                }
                Vec::new()
            }
        }
    }

    fn select_city(&mut self, location: LocationRef) -> Vec<Effect> {
        let mut effects = Vec::new();

        if location.display_name != self.location.display_name {
            effects.push(Effect::PersistCity(location.display_name.clone()));
        }

        let refetch = location.fetch_key() != self.location.fetch_key();
        self.location = location;

        if refetch {
            effects.push(self.begin_fetch());
        }
        effects
    }

    fn begin_fetch(&mut self) -> Effect {
        self.generation += 1;
        self.view.is_loading = true;
        self.status = FetchStatus::Loading { generation: self.generation };

        Effect::Fetch { generation: self.generation, location: self.location.clone() }
    }

    fn accepts(&self, generation: Generation) -> bool {
        if generation == self.generation {
            return true;
        }
        match self.policy {
            StaleResponses::Discard => {
                debug!(generation, latest = self.generation, "discarding stale weather response");
                false
            }
            StaleResponses::Apply => {
                warn!(generation, latest = self.generation, "applying stale weather response");
                true
            }
        }
    }
}
