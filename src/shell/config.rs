use std::env;

use log::warn;

/// Number of lines kept by `history` unless configured otherwise.
pub const DEFAULT_HISTORY_SIZE: usize = 5;

pub const HISTORY_SIZE_VAR: &str = "EGGSHELL_HISTSIZE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    history_size: usize,
    color: bool,
    clear_screen: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            history_size: DEFAULT_HISTORY_SIZE,
            color: true,
            clear_screen: true,
        }
    }
}

impl Config {
    /// Defaults overridden by `EGGSHELL_HISTSIZE` and `NO_COLOR`.
    pub fn from_env() -> Config {
        Config::from_vars(|name| env::var(name).ok())
    }

    fn from_vars<F>(var: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        if let Some(size) = var(HISTORY_SIZE_VAR) {
            match size.trim().parse() {
                Ok(size) => config.history_size = size,
                Err(_) => warn!("ignoring invalid {}={:?}", HISTORY_SIZE_VAR, size),
            }
        }
        if var("NO_COLOR").map_or(false, |value| !value.is_empty()) {
            config.color = false;
        }
        config
    }

    pub fn history_size(&self) -> usize {
        self.history_size
    }

    pub fn set_history_size(&mut self, size: usize) {
        self.history_size = size;
    }

    pub fn color(&self) -> bool {
        self.color
    }

    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    /// Whether the interactive shell clears the terminal when it starts.
    pub fn clear_screen(&self) -> bool {
        self.clear_screen
    }

    pub fn set_clear_screen(&mut self, clear_screen: bool) {
        self.clear_screen = clear_screen;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = config_with(&[]);
        assert_eq!(config, Config::default());
        assert_eq!(config.history_size(), DEFAULT_HISTORY_SIZE);
        assert!(config.color());
        assert!(config.clear_screen());
    }

    #[test]
    fn history_size_from_environment() {
        assert_eq!(config_with(&[(HISTORY_SIZE_VAR, " 42 ")]).history_size(), 42);
        assert_eq!(
            config_with(&[(HISTORY_SIZE_VAR, "lots")]).history_size(),
            DEFAULT_HISTORY_SIZE
        );
    }

    #[test]
    fn no_color_needs_a_value() {
        assert!(!config_with(&[("NO_COLOR", "1")]).color());
        assert!(config_with(&[("NO_COLOR", "")]).color());
    }
}
