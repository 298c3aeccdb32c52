use std::fmt::Write;

use cwb_weather_core::{Dashboard, FetchStatus, Moment, Theme, WeatherViewModel};

const MISSING: &str = "--";

/// Render the weather card as plain text.
pub fn card(dashboard: &Dashboard, moment: Moment) -> String {
    let view = dashboard.view();
    let theme = Theme::for_moment(moment);
    let mut out = String::new();

    let city = &dashboard.location().display_name;
    let _ = writeln!(out, "{city}  ({moment}, {} theme)", theme_name(theme));
    let _ = writeln!(out, "  {}", view.description.as_deref().unwrap_or(MISSING));
    let _ = writeln!(out, "  Temperature     {}", temperature(view));
    let _ = writeln!(out, "  Humidity        {}", percent(view.humidity.map(|h| h * 100.0)));
    let _ = writeln!(out, "  Wind            {}", wind(view));
    let _ = writeln!(out, "  Rain chance     {}", percent(view.rain_possibility));
    let _ = writeln!(out, "  Comfort         {}", view.comfort_level.as_deref().unwrap_or(MISSING));
    let _ = writeln!(out, "  Observed        {}", observed(view));

    match dashboard.status() {
        FetchStatus::Loading { .. } => out.push_str("  Refreshing...\n"),
        FetchStatus::Error { message, retryable: true } => {
            let _ = writeln!(out, "  ! {message} (choose Refresh to retry)");
        }
        FetchStatus::Error { message, retryable: false } => {
            let _ = writeln!(out, "  ! {message}");
        }
        FetchStatus::Idle | FetchStatus::Ready => {}
    }

    out
}

fn theme_name(theme: Theme) -> &'static str {
    match theme {
        Theme::Light => "light",
        Theme::Dark => "dark",
    }
}

fn temperature(view: &WeatherViewModel) -> String {
    view.temperature.map_or_else(|| MISSING.to_string(), |t| format!("{} °C", t.round()))
}

fn wind(view: &WeatherViewModel) -> String {
    view.wind_speed.map_or_else(|| MISSING.to_string(), |w| format!("{w:.1} m/s"))
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| format!("{} %", v.round()))
}

fn observed(view: &WeatherViewModel) -> String {
    let station = if view.location_name.is_empty() { MISSING } else { view.location_name.as_str() };
    match view.observation_time {
        Some(time) => format!("{} at {}", time.format("%Y-%m-%d %H:%M"), station),
        None => format!("{MISSING} at {station}"),
    }
}
