use chrono::{DateTime, FixedOffset};

/// Fields extracted from the current-conditions endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observation {
    pub observation_time: Option<DateTime<FixedOffset>>,
    pub location_name: String,
    pub temperature: Option<f64>,
    pub wind_speed: Option<f64>,
    /// Relative humidity as a fraction, 0.0..=1.0.
    pub humidity: Option<f64>,
}

/// Fields extracted from the first period of the forecast endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    pub description: Option<String>,
    pub weather_code: Option<u32>,
    /// Probability of precipitation in percent.
    pub rain_possibility: Option<f64>,
    pub comfort_level: Option<String>,
}

/// Merged result of one successful fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherSnapshot {
    pub observation: Observation,
    pub forecast: Forecast,
}

impl WeatherSnapshot {
    pub fn merge(observation: Observation, forecast: Forecast) -> Self {
        Self { observation, forecast }
    }
}

/// What the weather card shows.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherViewModel {
    pub observation_time: Option<DateTime<FixedOffset>>,
    pub location_name: String,
    pub temperature: Option<f64>,
    pub wind_speed: Option<f64>,
    pub humidity: Option<f64>,
    pub description: Option<String>,
    pub weather_code: Option<u32>,
    pub rain_possibility: Option<f64>,
    pub comfort_level: Option<String>,
    pub is_loading: bool,
}

impl Default for WeatherViewModel {
    fn default() -> Self {
        Self {
            observation_time: None,
            location_name: String::new(),
            temperature: None,
            wind_speed: None,
            humidity: None,
            description: None,
            weather_code: None,
            rain_possibility: None,
            comfort_level: None,
            is_loading: true,
        }
    }
}

impl From<WeatherSnapshot> for WeatherViewModel {
    fn from(snapshot: WeatherSnapshot) -> Self {
        let WeatherSnapshot { observation, forecast } = snapshot;

        Self {
            observation_time: observation.observation_time,
            location_name: observation.location_name,
            temperature: observation.temperature,
            wind_speed: observation.wind_speed,
            humidity: observation.humidity,
            description: forecast.description,
            weather_code: forecast.weather_code,
            rain_possibility: forecast.rain_possibility,
            comfort_level: forecast.comfort_level,
            is_loading: false,
        }
    }
}
