//! Transport configuration, read from the environment.
//!
//! | Variable                      | Meaning                              | Default    |
//! |-------------------------------|--------------------------------------|------------|
//! | `TASKSTATS_RECV_BUFFER_SIZE`  | socket receive buffer size in bytes  | `32768`    |

use std::num::ParseIntError;

pub const RECV_BUFFER_SIZE_VAR: &str = "TASKSTATS_RECV_BUFFER_SIZE";

const DEFAULT_RECV_BUFFER_SIZE: usize = 32 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid value `{value}` for environment variable `{key}`: {source}")]
    InvalidValue {
        key: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("environment variable `{key}` must be greater than zero")]
    Zero { key: &'static str },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Settings for the netlink connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Size of the socket receive buffer (`SO_RCVBUF`).
    pub recv_buffer_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
        }
    }
}

impl Config {
    /// Builds a configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the variable is set but not a positive integer.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(size) = parse_positive(&lookup, RECV_BUFFER_SIZE_VAR)? {
            config.recv_buffer_size = usize::try_from(size).unwrap_or(usize::MAX);
        }

        log::debug!("Transport configuration: {config:?}");
        Ok(config)
    }
}

fn parse_positive(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<u64>> {
    let Some(value) = lookup(key) else {
        return Ok(None);
    };

    let parsed = value
        .trim()
        .parse::<u64>()
        .map_err(|source| Error::InvalidValue {
            key,
            value: value.clone(),
            source,
        })?;
    if parsed == 0 {
        return Err(Error::Zero { key });
    }

    Ok(Some(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_variables() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.recv_buffer_size, 32 * 1024);
    }

    #[test]
    fn test_reads_buffer_size() {
        let config = Config::from_lookup(lookup(&[(RECV_BUFFER_SIZE_VAR, " 65536 ")])).unwrap();
        assert_eq!(config.recv_buffer_size, 65536);
    }

    #[test]
    fn test_invalid_value() {
        let err = Config::from_lookup(lookup(&[(RECV_BUFFER_SIZE_VAR, "large")])).unwrap_err();
        match err {
            Error::InvalidValue { key, value, .. } => {
                assert_eq!(key, RECV_BUFFER_SIZE_VAR);
                assert_eq!(value, "large");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_is_rejected() {
        let err = Config::from_lookup(lookup(&[(RECV_BUFFER_SIZE_VAR, "0")])).unwrap_err();
        assert!(matches!(err, Error::Zero { key } if key == RECV_BUFFER_SIZE_VAR));
    }
}
