use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{configuration_error, Error};

pub const API_KEY_VAR: &str = "DISTANCEMATRIXAI_API_KEY";
pub const API_BASE_VAR: &str = "DISTANCEMATRIXAI_API_BASE";
pub const TIMEOUT_VAR: &str = "DISTANCEMATRIXAI_TIMEOUT_SECS";
pub const SURGE_VAR: &str = "SURGE_MULTIPLIER";
pub const BIND_ADDRESS_VAR: &str = "BIND_ADDRESS";

pub const DEFAULT_API_BASE: &str = "https://api.distancematrix.ai";

#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub api_base: String,
    pub request_timeout: Option<Duration>,
    pub surge_multiplier: f64,
    pub bind_address: SocketAddr,
}

// keeps the key out of logs
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_base", &self.api_base)
            .field("request_timeout", &self.request_timeout)
            .field("surge_multiplier", &self.surge_multiplier)
            .field("bind_address", &self.bind_address)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.into(),
            request_timeout: None,
            surge_multiplier: 1.0,
            bind_address: SocketAddr::from(([127, 0, 0, 1], 3000)),
        }
    }

    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| env::var(name))
    }

    /// Builds a config from `lookup`, which answers like `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let var = |name: &str| -> Result<Option<String>, Error> {
            match lookup(name) {
                Ok(value) => Ok(Some(value)),
                Err(env::VarError::NotPresent) => Ok(None),
                Err(err) => Err(err.into()),
            }
        };

        let api_key = var(API_KEY_VAR)?
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| configuration_error(format!("{} is not set", API_KEY_VAR)))?;

        let mut config = Self::new(api_key);

        if let Some(api_base) = var(API_BASE_VAR)? {
            config.api_base = api_base.trim_end_matches('/').to_string();
        }

        if let Some(raw) = var(TIMEOUT_VAR)? {
            let secs: u64 = parse(TIMEOUT_VAR, &raw)?;
            if secs == 0 {
                return Err(configuration_error(format!(
                    "{} must be a positive number of seconds",
                    TIMEOUT_VAR
                )));
            }
            config.request_timeout = Some(Duration::from_secs(secs));
        }

        if let Some(raw) = var(SURGE_VAR)? {
            let surge: f64 = parse(SURGE_VAR, &raw)?;
            if !surge.is_finite() || surge < 0.0 {
                return Err(configuration_error(format!(
                    "{} must be a non-negative number",
                    SURGE_VAR
                )));
            }
            config.surge_multiplier = surge;
        }

        if let Some(raw) = var(BIND_ADDRESS_VAR)? {
            config.bind_address = parse(BIND_ADDRESS_VAR, &raw)?;
        }

        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, Error> {
    raw.trim()
        .parse()
        .map_err(|_| configuration_error(format!("{} has an invalid value: {}", name, raw)))
}

#[cfg(test)]
fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, env::VarError> {
    let vars: std::collections::HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    move |name: &str| vars.get(name).cloned().ok_or(env::VarError::NotPresent)
}

#[test]
fn missing_api_key_is_a_configuration_error() {
    use crate::error::ErrorKind;

    let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Configuration);
    assert!(err.message.contains(API_KEY_VAR));

    let err = Config::from_lookup(lookup_from(&[(API_KEY_VAR, "  ")])).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Configuration);
}

#[test]
fn defaults_apply_when_only_the_key_is_set() {
    let config = Config::from_lookup(lookup_from(&[(API_KEY_VAR, "secret")])).unwrap();

    assert_eq!(config.api_key, "secret");
    assert_eq!(config.api_base, DEFAULT_API_BASE);
    assert_eq!(config.request_timeout, None);
    assert_eq!(config.surge_multiplier, 1.0);
    assert_eq!(config.bind_address.port(), 3000);
}

#[test]
fn optional_values_are_parsed() {
    let config = Config::from_lookup(lookup_from(&[
        (API_KEY_VAR, "secret"),
        (API_BASE_VAR, "http://127.0.0.1:9000/"),
        (TIMEOUT_VAR, "15"),
        (SURGE_VAR, "1.5"),
        (BIND_ADDRESS_VAR, "0.0.0.0:8080"),
    ]))
    .unwrap();

    assert_eq!(config.api_base, "http://127.0.0.1:9000");
    assert_eq!(config.request_timeout, Some(Duration::from_secs(15)));
    assert_eq!(config.surge_multiplier, 1.5);
    assert_eq!(config.bind_address, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
}

#[test]
fn invalid_optional_values_are_rejected() {
    for (name, value) in [
        (TIMEOUT_VAR, "soon"),
        (TIMEOUT_VAR, "0"),
        (SURGE_VAR, "-1"),
        (SURGE_VAR, "NaN"),
        (BIND_ADDRESS_VAR, "localhost"),
    ] {
        let result = Config::from_lookup(lookup_from(&[(API_KEY_VAR, "secret"), (name, value)]));
        assert!(result.is_err(), "{}={} should be rejected", name, value);
    }
}

#[test]
fn non_unicode_values_are_configuration_errors() {
    use crate::error::ErrorKind;
    use std::ffi::OsString;

    let err = Config::from_lookup(|name| match name {
        API_KEY_VAR => Err(env::VarError::NotUnicode(OsString::from("k\u{fffd}y"))),
        _ => Err(env::VarError::NotPresent),
    })
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Configuration);
    assert_eq!(err.code, 1);

    let err = Config::from_lookup(|name| match name {
        API_KEY_VAR => Ok("secret".to_string()),
        SURGE_VAR => Err(env::VarError::NotUnicode(OsString::from("1.\u{fffd}"))),
        _ => Err(env::VarError::NotPresent),
    })
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Configuration);
}

#[test]
fn debug_output_hides_the_key() {
    let config = Config::new("super-secret");

    assert!(!format!("{:?}", config).contains("super-secret"));
}
