use tracing::{debug, instrument};

use crate::{
    error::WeatherError, location::LocationRef, model::WeatherSnapshot, provider::WeatherSource,
};

/// Fetch observation and forecast for `location` concurrently and merge them.
///
/// Both requests must succeed; if either fails the other result is dropped
/// and the error is returned.
#[instrument(skip(source), fields(city = %location.display_name))]
pub async fn fetch_weather<S>(
    source: &S,
    location: &LocationRef,
) -> Result<WeatherSnapshot, WeatherError>
where
    S: WeatherSource + ?Sized,
{
    let (observation, forecast) = tokio::try_join!(
        source.current_observation(&location.observation_station_name),
        source.forecast(&location.forecast_city_name),
    )?;

    debug!(station = %observation.location_name, "merged observation and forecast");
    Ok(WeatherSnapshot::merge(observation, forecast))
}
