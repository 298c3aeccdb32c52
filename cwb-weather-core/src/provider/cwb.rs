use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::{
    error::WeatherError,
    model::{Forecast, Observation},
};

use super::WeatherSource;

pub const DEFAULT_BASE_URL: &str = "https://opendata.cwb.gov.tw/api/v1/rest/datastore";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Automatic weather station observations.
pub const OBSERVATION_DATASET: &str = "O-A0003-001";
/// 36-hour county forecast.
pub const FORECAST_DATASET: &str = "F-C0032-001";

const TEMPERATURE: &str = "TEMP";
const HUMIDITY: &str = "HUMD";
const WIND_SPEED: &str = "WDSD";
const WEATHER: &str = "Wx";
const RAIN_PROBABILITY: &str = "PoP";
const COMFORT_INDEX: &str = "CI";

/// Client for the Central Weather Bureau open-data REST API.
#[derive(Debug, Clone)]
pub struct CwbClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl CwbClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, WeatherError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { api_key: api_key.into(), base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_dataset<T: DeserializeOwned>(
        &self,
        dataset: &'static str,
        location_name: &str,
    ) -> Result<T, WeatherError> {
        let url = format!("{}/{}", self.base_url, dataset);
        debug!(dataset, location_name, "requesting CWB dataset");

        let res = self
            .http
            .get(&url)
            .query(&[("Authorization", self.api_key.as_str()), ("locationName", location_name)])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(WeatherError::Status {
                endpoint: dataset,
                status,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body)
            .map_err(|source| WeatherError::Decode { endpoint: dataset, source })
    }
}

#[async_trait]
impl WeatherSource for CwbClient {
    async fn current_observation(&self, station: &str) -> Result<Observation, WeatherError> {
        let envelope: CwbEnvelope<ObservationRecord> =
            self.get_dataset(OBSERVATION_DATASET, station).await?;

        let record = envelope.first_location(OBSERVATION_DATASET, station)?;
        Ok(extract_observation(record))
    }

    async fn forecast(&self, city: &str) -> Result<Forecast, WeatherError> {
        let envelope: CwbEnvelope<ForecastRecord> =
            self.get_dataset(FORECAST_DATASET, city).await?;

        let record = envelope.first_location(FORECAST_DATASET, city)?;
        Ok(extract_forecast(record))
    }
}

/// Decode a raw `O-A0003-001` body.
pub fn observation_from_json(body: &str, station: &str) -> Result<Observation, WeatherError> {
    let envelope: CwbEnvelope<ObservationRecord> = serde_json::from_str(body)
        .map_err(|source| WeatherError::Decode { endpoint: OBSERVATION_DATASET, source })?;

    let record = envelope.first_location(OBSERVATION_DATASET, station)?;
    Ok(extract_observation(record))
}

/// Decode a raw `F-C0032-001` body.
pub fn forecast_from_json(body: &str, city: &str) -> Result<Forecast, WeatherError> {
    let envelope: CwbEnvelope<ForecastRecord> = serde_json::from_str(body)
        .map_err(|source| WeatherError::Decode { endpoint: FORECAST_DATASET, source })?;

    let record = envelope.first_location(FORECAST_DATASET, city)?;
    Ok(extract_forecast(record))
}

#[derive(Debug, Deserialize)]
struct CwbEnvelope<L> {
    records: CwbRecords<L>,
}

#[derive(Debug, Deserialize)]
struct CwbRecords<L> {
    #[serde(default = "Vec::new")]
    location: Vec<L>,
}

impl<L> CwbEnvelope<L> {
    fn first_location(self, endpoint: &'static str, requested: &str) -> Result<L, WeatherError> {
        self.records.location.into_iter().next().ok_or_else(|| WeatherError::NoRecords {
            endpoint,
            location: requested.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObservationRecord {
    location_name: String,
    time: Option<ObservationTime>,
    #[serde(default)]
    weather_element: Vec<ObservationElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObservationTime {
    obs_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObservationElement {
    element_name: String,
    element_value: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForecastRecord {
    #[serde(default)]
    weather_element: Vec<ForecastElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForecastElement {
    element_name: String,
    #[serde(default)]
    time: Vec<ForecastPeriod>,
}

#[derive(Debug, Deserialize)]
struct ForecastPeriod {
    parameter: ForecastParameter,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForecastParameter {
    parameter_name: Option<Value>,
    parameter_value: Option<Value>,
}

fn extract_observation(record: ObservationRecord) -> Observation {
    let mut observation = Observation {
        observation_time: record.time.as_ref().and_then(|t| parse_obs_time(&t.obs_time)),
        location_name: record.location_name,
        ..Observation::default()
    };

    for element in &record.weather_element {
        let slot = match element.element_name.as_str() {
            TEMPERATURE => &mut observation.temperature,
            HUMIDITY => &mut observation.humidity,
            WIND_SPEED => &mut observation.wind_speed,
            _ => continue,
        };
        *slot = element.element_value.as_ref().and_then(numeric);
    }

    observation
}

fn extract_forecast(record: ForecastRecord) -> Forecast {
    let mut forecast = Forecast::default();

    for element in &record.weather_element {
        let Some(parameter) = element.time.first().map(|period| &period.parameter) else {
            continue;
        };
        let name = parameter.parameter_name.as_ref();

        match element.element_name.as_str() {
            WEATHER => {
                forecast.description = name.and_then(text);
                forecast.weather_code = parameter.parameter_value.as_ref().and_then(weather_code);
            }
            RAIN_PROBABILITY => forecast.rain_possibility = name.and_then(numeric),
            COMFORT_INDEX => forecast.comfort_level = name.and_then(text),
            _ => {}
        }
    }

    forecast
}

/// CWB sends most numbers as strings.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Weather codes are small non-negative integers; anything else is dropped.
fn weather_code(value: &Value) -> Option<u32> {
    let code = numeric(value)?;
    if !code.is_finite() || code.fract() != 0.0 {
        return None;
    }
    u32::try_from(code as i64).ok()
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_obs_time(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed);
    }

    // Older payloads carry a bare Taiwan wall-clock time.
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").ok()?;
    FixedOffset::east_opt(8 * 3600)?.from_local_datetime(&naive).single()
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    const OBSERVATION: &str = include_str!("../../tests/fixtures/observation.json");
    const FORECAST: &str = include_str!("../../tests/fixtures/forecast.json");

    #[test]
    fn extracts_observation_fields() {
        let obs = observation_from_json(OBSERVATION, "臺北").unwrap();

        assert_eq!(obs.location_name, "臺北");
        assert_eq!(obs.temperature, Some(27.1));
        assert_eq!(obs.humidity, Some(0.73));
        assert_eq!(obs.wind_speed, Some(2.5));

        let time = obs.observation_time.expect("obsTime must parse");
        assert_eq!(time.hour(), 15);
        assert_eq!(time.offset().local_minus_utc(), 8 * 3600);
    }

    #[test]
    fn extracts_first_forecast_period() {
        let forecast = forecast_from_json(FORECAST, "臺北市").unwrap();

        assert_eq!(forecast.description.as_deref(), Some("多雲時晴"));
        assert_eq!(forecast.weather_code, Some(3));
        assert_eq!(forecast.rain_possibility, Some(10.0));
        assert_eq!(forecast.comfort_level.as_deref(), Some("舒適至悶熱"));
    }

    #[test]
    fn missing_elements_stay_absent_instead_of_zero() {
        let body = r#"{"records":{"location":[{
            "locationName":"高雄",
            "time":{"obsTime":"2019-10-02 09:00:00"},
            "weatherElement":[
                {"elementName":"TEMP","elementValue":"30.2"},
                {"elementName":"ELEV","elementValue":"2.3"}
            ]}]}}"#;

        let obs = observation_from_json(body, "高雄").unwrap();
        assert_eq!(obs.temperature, Some(30.2));
        assert_eq!(obs.humidity, None);
        assert_eq!(obs.wind_speed, None);
    }

    #[test]
    fn forecast_without_periods_is_absent() {
        let body = r#"{"records":{"location":[{
            "locationName":"澎湖縣",
            "weatherElement":[
                {"elementName":"Wx","time":[]},
                {"elementName":"PoP","time":[
                    {"parameter":{"parameterName":"40","parameterUnit":"百分比"}}
                ]}
            ]}]}}"#;

        let forecast = forecast_from_json(body, "澎湖縣").unwrap();
        assert_eq!(forecast.description, None);
        assert_eq!(forecast.weather_code, None);
        assert_eq!(forecast.rain_possibility, Some(40.0));
        assert_eq!(forecast.comfort_level, None);
    }

    #[test]
    fn numeric_values_are_accepted_as_numbers() {
        let body = r#"{"records":{"location":[{
            "locationName":"花蓮",
            "time":{"obsTime":"2024-03-01T08:00:00+08:00"},
            "weatherElement":[{"elementName":"WDSD","elementValue":4.2}]}]}}"#;

        let obs = observation_from_json(body, "花蓮").unwrap();
        assert_eq!(obs.wind_speed, Some(4.2));
        assert!(obs.observation_time.is_some());
    }

    #[test]
    fn out_of_range_weather_codes_are_dropped() {
        let body = |code: &str| {
            format!(
                r#"{{"records":{{"location":[{{"locationName":"臺東縣","weatherElement":[
                    {{"elementName":"Wx","time":[
                        {{"parameter":{{"parameterName":"晴","parameterValue":{code}}}}}
                    ]}}
                ]}}]}}}}"#
            )
        };

        for bad in [r#""-1""#, r#""3.5""#, "-7", r#""4294967296""#, r#""x""#] {
            let forecast = forecast_from_json(&body(bad), "臺東縣").unwrap();
            assert_eq!(forecast.weather_code, None, "code {bad}");
            assert_eq!(forecast.description.as_deref(), Some("晴"));
        }

        let forecast = forecast_from_json(&body(r#""07""#), "臺東縣").unwrap();
        assert_eq!(forecast.weather_code, Some(7));
    }

    #[test]
    fn empty_location_list_is_reported() {
        let body = r#"{"success":"true","records":{"location":[]}}"#;
        let err = observation_from_json(body, "不存在").unwrap_err();

        assert!(matches!(err, WeatherError::NoRecords { location, .. } if location == "不存在"));
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let err = forecast_from_json("<html>", "臺北市").unwrap_err();
        assert!(matches!(err, WeatherError::Decode { endpoint: FORECAST_DATASET, .. }));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "晴".repeat(300);
        let short = truncate_body(&long);
        assert!(short.ends_with("..."));
        assert_eq!(short.chars().count(), 203);
    }
}
