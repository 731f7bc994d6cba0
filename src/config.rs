use std::env;

use tracing::warn;

pub const REDIRECT_MODE_VAR: &str = "PIPESH_REDIRECT_MODE";
//Read directly by the logging setup in main, before any Config exists
pub const LOG_VAR: &str = "PIPESH_LOG";

//Owner read/write/execute
pub const DEFAULT_REDIRECT_MODE: u32 = 0o700;
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub redirect_mode: u32, //Permission bits for files created by '>'
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redirect_mode: DEFAULT_REDIRECT_MODE,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /*
    Builds a Config from an arbitrary key lookup.
    Unset keys keep their default, unparseable values are reported and ignored.
    */
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        if let Some(raw) = lookup(REDIRECT_MODE_VAR) {
            match parse_mode(&raw) {
                Some(mode) => config.redirect_mode = mode,
                None => warn!(
                    "ignoring {}={:?}, expected octal permission bits",
                    REDIRECT_MODE_VAR, raw
                ),
            }
        }
        config
    }
}

//Accepts "644", "0644" and "0o644"
fn parse_mode(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    let digits = raw.strip_prefix("0o").unwrap_or(raw);
    match u32::from_str_radix(digits, 8) {
        Ok(mode) if mode <= 0o7777 => Some(mode),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config, Config::default());
        assert_eq!(config.redirect_mode, 0o700);
    }

    #[test]
    fn octal_mode_forms() {
        assert_eq!(parse_mode("644"), Some(0o644));
        assert_eq!(parse_mode("0600"), Some(0o600));
        assert_eq!(parse_mode("0o755"), Some(0o755));
        assert_eq!(parse_mode("9"), None);
        assert_eq!(parse_mode("77777"), None);
    }

    #[test]
    fn bad_mode_falls_back_to_default() {
        let config = Config::from_lookup(lookup(&[(REDIRECT_MODE_VAR, "rwx")]));
        assert_eq!(config.redirect_mode, DEFAULT_REDIRECT_MODE);
    }

    #[test]
    fn mode_override() {
        let config = Config::from_lookup(lookup(&[(REDIRECT_MODE_VAR, "0644")]));
        assert_eq!(config.redirect_mode, 0o644);
    }
}
