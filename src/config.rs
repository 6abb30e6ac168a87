use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveTime;

use crate::validate::parse_time;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}: invalid value {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Server settings, read from `ROOMBOOK_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub compact_threshold: u64,
    pub metrics_port: Option<u16>,
    /// Room numbers kept seeded over the coming business week. Empty
    /// disables seeding.
    pub seed_rooms: Vec<u32>,
    pub seed_times: Vec<NaiveTime>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 8000,
            data_dir: PathBuf::from("./data"),
            compact_threshold: 1000,
            metrics_port: None,
            seed_rooms: Vec::new(),
            seed_times: default_seed_times(),
        }
    }
}

/// On the hour, 08:00 through 16:00.
pub fn default_seed_times() -> Vec<NaiveTime> {
    (8..17)
        .filter_map(|h| NaiveTime::from_hms_opt(h, 0, 0))
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source. Unparseable numbers fall back to the
    /// default; malformed seed lists are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let seed_rooms = match lookup("ROOMBOOK_SEED_ROOMS") {
            Some(list) => parse_list("ROOMBOOK_SEED_ROOMS", &list, |s| {
                s.parse::<u32>().ok().filter(|room| *room > 0)
            })?,
            None => Vec::new(),
        };
        let seed_times = match lookup("ROOMBOOK_SEED_TIMES") {
            Some(list) => parse_list("ROOMBOOK_SEED_TIMES", &list, |s| parse_time(s).ok())?,
            None => defaults.seed_times,
        };

        Ok(Self {
            bind: lookup("ROOMBOOK_BIND").unwrap_or(defaults.bind),
            port: number(&lookup, "ROOMBOOK_PORT").unwrap_or(defaults.port),
            data_dir: lookup("ROOMBOOK_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            compact_threshold: number(&lookup, "ROOMBOOK_COMPACT_THRESHOLD")
                .unwrap_or(defaults.compact_threshold),
            metrics_port: number(&lookup, "ROOMBOOK_METRICS_PORT"),
            seed_rooms,
            seed_times,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join("bookings.wal")
    }
}

fn number<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, var: &str) -> Option<T> {
    lookup(var).and_then(|s| s.trim().parse().ok())
}

fn parse_list<T>(
    var: &'static str,
    list: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Vec<T>, ConfigError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            parse(s).ok_or_else(|| ConfigError::Invalid {
                var,
                value: s.to_string(),
            })
        })
        .collect()
}
