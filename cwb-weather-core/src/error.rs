//! Error type shared by the resolver, the CWB client and the fetcher.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Unknown city '{0}'")]
    UnknownCity(String),

    #[error("{endpoint} request failed with status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to parse {endpoint} JSON: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{endpoint} response contained no location records for '{location}'")]
    NoRecords {
        endpoint: &'static str,
        location: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl WeatherError {
    /// Short message for the weather card.
    pub fn user_message(&self) -> String {
        match self {
            Self::UnknownCity(name) => format!("{name} is not a supported city"),
            Self::Status { status, .. } if status.as_u16() == 401 => {
                "The weather service rejected the authorization token".to_string()
            }
            Self::Status { status, .. } => format!("Weather service error ({status})"),
            Self::Decode { .. } => "Unexpected response from the weather service".to_string(),
            Self::NoRecords { location, .. } => format!("No weather data for {location}"),
            Self::Network(err) if err.is_timeout() => "The weather service timed out".to_string(),
            Self::Network(_) => "Network error. Check your connection.".to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status { status, .. } => status.is_server_error(),
            _ => false,
        }
    }
}
