//! Day/night classification from a sunrise/sunset reference table.
//!
//! The table is external data published by CWB: one entry per location and
//! one row per calendar date. It is read once at start-up and never mutated.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone};
use serde::Deserialize;
use std::{fmt, fs, path::Path};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Moment {
    Day,
    Night,
    Unknown,
}

impl Moment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Moment::Day => "day",
            Moment::Night => "night",
            Moment::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Moment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SunriseSunsetRow {
    #[serde(alias = "dataTime")]
    pub date: String,
    pub sunrise: String,
    pub sunset: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SunriseSunsetEntry {
    pub location_name: String,
    #[serde(default)]
    pub time: Vec<SunriseSunsetRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SunriseTable {
    entries: Vec<SunriseSunsetEntry>,
}

impl SunriseTable {
    pub fn new(entries: Vec<SunriseSunsetEntry>) -> Self {
        Self { entries }
    }

    /// A table with no locations; every lookup is `Unknown`.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse sunrise/sunset table")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read sunrise/sunset table: {}", path.display()))?;

        let table = Self::from_json_str(&contents)
            .with_context(|| format!("Invalid sunrise/sunset table: {}", path.display()))?;

        debug!(
            locations = table.entries.len(),
            path = %path.display(),
            "loaded sunrise/sunset table"
        );
        Ok(table)
    }

    pub fn entry(&self, location_name: &str) -> Option<&SunriseSunsetEntry> {
        self.entries.iter().find(|entry| entry.location_name == location_name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Classify `now` as day or night for `sunrise_table_key`.
///
/// Both the sunrise and the sunset instant count as day. A missing location,
/// a missing row for today, or an unparsable time yields `Unknown`.
pub fn classify_moment<Tz: TimeZone>(
    table: &SunriseTable,
    sunrise_table_key: &str,
    now: &DateTime<Tz>,
) -> Moment {
    let Some(entry) = table.entry(sunrise_table_key) else {
        return Moment::Unknown;
    };

    let local_now = now.naive_local();
    let today = local_now.date().format("%Y-%m-%d").to_string();

    let Some(row) = entry.time.iter().find(|row| row.date == today) else {
        debug!(sunrise_table_key, %today, "no sunrise/sunset row for today");
        return Moment::Unknown;
    };

    let (Some(sunrise), Some(sunset)) = (
        local_instant(local_now.date(), &row.sunrise),
        local_instant(local_now.date(), &row.sunset),
    ) else {
        warn!(sunrise_table_key, ?row, "unparsable sunrise/sunset row");
        return Moment::Unknown;
    };

    if sunrise <= local_now && local_now <= sunset { Moment::Day } else { Moment::Night }
}

fn local_instant(date: NaiveDate, hhmm: &str) -> Option<chrono::NaiveDateTime> {
    NaiveTime::parse_from_str(hhmm.trim(), "%H:%M").ok().map(|time| date.and_time(time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Local};

    fn taipei() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    fn at(date: &str, hhmm: &str) -> DateTime<FixedOffset> {
        let raw = format!("{date} {hhmm}");
        let naive = chrono::NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M").unwrap();
        taipei().from_local_datetime(&naive).unwrap()
    }

    fn row(date: &str, sunrise: &str, sunset: &str) -> SunriseSunsetRow {
        SunriseSunsetRow { date: date.into(), sunrise: sunrise.into(), sunset: sunset.into() }
    }

    fn table() -> SunriseTable {
        SunriseTable::new(vec![SunriseSunsetEntry {
            location_name: "臺北".into(),
            time: vec![row("2019-10-01", "05:44", "17:39"), row("2019-10-02", "06:00", "18:00")],
        }])
    }

    #[test]
    fn daytime_and_nighttime() {
        let table = table();
        assert_eq!(classify_moment(&table, "臺北", &at("2019-10-02", "07:00")), Moment::Day);
        assert_eq!(classify_moment(&table, "臺北", &at("2019-10-02", "19:00")), Moment::Night);
        assert_eq!(classify_moment(&table, "臺北", &at("2019-10-02", "05:59")), Moment::Night);
    }

    #[test]
    fn boundaries_are_inclusive() {
        let table = table();
        assert_eq!(classify_moment(&table, "臺北", &at("2019-10-02", "06:00")), Moment::Day);
        assert_eq!(classify_moment(&table, "臺北", &at("2019-10-02", "18:00")), Moment::Day);
    }

    #[test]
    fn unknown_key_is_unknown_at_any_time() {
        let table = table();
        for hhmm in ["00:00", "06:00", "12:00", "23:59"] {
            assert_eq!(classify_moment(&table, "高雄", &at("2019-10-02", hhmm)), Moment::Unknown);
        }
        assert_eq!(classify_moment(&SunriseTable::empty(), "臺北", &Local::now()), Moment::Unknown);
    }

    #[test]
    fn missing_row_for_today_is_unknown() {
        let table = table();
        assert_eq!(classify_moment(&table, "臺北", &at("2019-10-03", "12:00")), Moment::Unknown);
    }

    #[test]
    fn classification_is_idempotent() {
        let table = table();
        let now = at("2019-10-01", "17:39");
        let first = classify_moment(&table, "臺北", &now);
        for _ in 0..3 {
            assert_eq!(classify_moment(&table, "臺北", &now), first);
        }
        assert_eq!(first, Moment::Day);
    }

    #[test]
    fn uses_the_local_calendar_date() {
        let table = table();
        // 2019-10-01 23:30 UTC is already 2019-10-02 07:30 in Taipei.
        let utc = chrono::Utc.with_ymd_and_hms(2019, 10, 1, 23, 30, 0).unwrap();
        assert_eq!(classify_moment(&table, "臺北", &utc.with_timezone(&taipei())), Moment::Day);
    }

    #[test]
    fn unparsable_times_are_unknown() {
        let table = SunriseTable::new(vec![SunriseSunsetEntry {
            location_name: "金門".into(),
            time: vec![row("2019-10-02", "dawn", "18:00")],
        }]);
        assert_eq!(classify_moment(&table, "金門", &at("2019-10-02", "12:00")), Moment::Unknown);
    }

    #[test]
    fn parses_cwb_dump_with_data_time_field() {
        let json = r#"[
            {"locationName":"花蓮","time":[
                {"dataTime":"2019-10-02","sunrise":"05:41","sunset":"17:38"}
            ]}
        ]"#;

        let table = SunriseTable::from_json_str(json).unwrap();
        assert_eq!(classify_moment(&table, "花蓮", &at("2019-10-02", "12:00")), Moment::Day);
        assert_eq!(classify_moment(&table, "花蓮", &at("2019-10-02", "17:39")), Moment::Night);
    }

    #[test]
    fn load_reports_the_path_on_failure() {
        let err = SunriseTable::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
