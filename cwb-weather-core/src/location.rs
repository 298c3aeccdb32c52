use tracing::warn;

use crate::error::WeatherError;

/// City used when nothing has been selected yet or the selection is unknown.
pub const DEFAULT_CITY: &str = "臺北市";

/// Identifiers a display city needs downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationRef {
    pub display_name: String,
    /// Station name for the current-conditions endpoint.
    pub observation_station_name: String,
    /// County name for the forecast endpoint.
    pub forecast_city_name: String,
    /// Key into the sunrise/sunset table.
    pub sunrise_table_key: String,
}

impl LocationRef {
    /// The pair of names a fetch depends on. Two locations with the same key
    /// produce the same request.
    pub fn fetch_key(&self) -> (&str, &str) {
        (&self.observation_station_name, &self.forecast_city_name)
    }
}

struct LocationRow {
    display_name: &'static str,
    station: &'static str,
    sunrise_key: &'static str,
}

// The forecast endpoint is keyed by county, which is also the display name.
const LOCATIONS: &[LocationRow] = &[
    LocationRow { display_name: "宜蘭縣", station: "宜蘭", sunrise_key: "宜蘭" },
    LocationRow { display_name: "嘉義市", station: "嘉義", sunrise_key: "嘉義" },
    LocationRow { display_name: "屏東縣", station: "恆春", sunrise_key: "屏東" },
    LocationRow { display_name: "苗栗縣", station: "國一N142K", sunrise_key: "苗栗" },
    LocationRow { display_name: "雲林縣", station: "斗六", sunrise_key: "雲林" },
    LocationRow { display_name: "臺東縣", station: "臺東", sunrise_key: "臺東" },
    LocationRow { display_name: "臺北市", station: "臺北", sunrise_key: "臺北" },
    LocationRow { display_name: "金門縣", station: "金門", sunrise_key: "金門" },
    LocationRow { display_name: "桃園市", station: "桃園", sunrise_key: "桃園" },
    LocationRow { display_name: "彰化縣", station: "彰師大", sunrise_key: "彰化" },
    LocationRow { display_name: "嘉義縣", station: "阿里山", sunrise_key: "嘉義" },
    LocationRow { display_name: "高雄市", station: "高雄", sunrise_key: "高雄" },
    LocationRow { display_name: "基隆市", station: "基隆", sunrise_key: "基隆" },
    LocationRow { display_name: "臺南市", station: "南區中心", sunrise_key: "臺南" },
    LocationRow { display_name: "南投縣", station: "日月潭", sunrise_key: "南投" },
    LocationRow { display_name: "臺中市", station: "臺中", sunrise_key: "臺中" },
    LocationRow { display_name: "新竹縣", station: "新竹", sunrise_key: "新竹" },
    LocationRow { display_name: "花蓮縣", station: "花蓮", sunrise_key: "花蓮" },
    LocationRow { display_name: "連江縣", station: "馬祖", sunrise_key: "馬祖" },
    LocationRow { display_name: "澎湖縣", station: "澎湖", sunrise_key: "澎湖" },
    LocationRow { display_name: "新北市", station: "板橋", sunrise_key: "新北" },
];

impl From<&LocationRow> for LocationRef {
    fn from(row: &LocationRow) -> Self {
        Self {
            display_name: row.display_name.to_string(),
            observation_station_name: row.station.to_string(),
            forecast_city_name: row.display_name.to_string(),
            sunrise_table_key: row.sunrise_key.to_string(),
        }
    }
}

/// Exact-match lookup of a display city name.
pub fn resolve(display_city_name: &str) -> Result<LocationRef, WeatherError> {
    LOCATIONS
        .iter()
        .find(|row| row.display_name == display_city_name)
        .map(LocationRef::from)
        .ok_or_else(|| WeatherError::UnknownCity(display_city_name.to_string()))
}

/// Like [`resolve`], falling back to [`DEFAULT_CITY`] on a miss.
pub fn resolve_or_default(display_city_name: &str) -> LocationRef {
    match resolve(display_city_name) {
        Ok(location) => location,
        Err(err) => {
            warn!(%err, fallback = DEFAULT_CITY, "falling back to default city");
            default_location()
        }
    }
}

pub fn default_location() -> LocationRef {
    LOCATIONS
        .iter()
        .find(|row| row.display_name == DEFAULT_CITY)
        .map(LocationRef::from)
        .unwrap_or_else(|| LocationRef::from(&LOCATIONS[0]))
}

/// Display names in table order.
pub fn supported_cities() -> impl Iterator<Item = &'static str> {
    LOCATIONS.iter().map(|row| row.display_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_supported_city_resolves_with_all_fields() {
        for name in supported_cities() {
            let loc = resolve(name).expect("supported city must resolve");
            assert_eq!(loc.display_name, name);
            assert!(!loc.observation_station_name.is_empty());
            assert!(!loc.forecast_city_name.is_empty());
            assert!(!loc.sunrise_table_key.is_empty());
        }
    }

    #[test]
    fn unknown_city_is_an_error_not_a_panic() {
        let err = resolve("東京都").unwrap_err();
        assert!(matches!(err, WeatherError::UnknownCity(ref name) if name == "東京都"));
    }

    #[test]
    fn lookup_is_exact() {
        assert!(resolve("臺北").is_err());
        assert!(resolve(" 臺北市").is_err());
    }

    #[test]
    fn miss_falls_back_to_default_city() {
        let loc = resolve_or_default("nowhere");
        assert_eq!(loc.display_name, DEFAULT_CITY);
        assert_eq!(loc.observation_station_name, "臺北");
    }

    #[test]
    fn chiayi_city_and_county_fetch_different_stations() {
        let city = resolve("嘉義市").unwrap();
        let county = resolve("嘉義縣").unwrap();
        assert_eq!(city.sunrise_table_key, county.sunrise_table_key);
        assert_ne!(city.fetch_key(), county.fetch_key());
    }

    #[test]
    fn display_names_are_unique() {
        let mut names: Vec<_> = supported_cities().collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }
}
