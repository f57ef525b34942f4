//! Server configuration parsed from environment variables.

use std::path::PathBuf;

use crate::theme::Theme;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND: &str = "127.0.0.1";
const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsLocation {
    File(PathBuf),
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    pub settings: SettingsLocation,
    /// Forces the ambient color-scheme signal instead of asking the OS.
    pub color_scheme: Option<Theme>,
}

impl Config {
    /// Build config from environment variables. Bad values fall back to defaults.
    ///
    /// - `PORT`: default 8080
    /// - `YEAR_PROGRESS_BIND`: default `127.0.0.1`
    /// - `YEAR_PROGRESS_SETTINGS`: settings file path, or `memory`
    /// - `YEAR_PROGRESS_COLOR_SCHEME`: `dark` or `light` to override OS detection
    pub fn from_env() -> Self {
        let home = std::env::var_os("HOME").map(PathBuf::from);
        Self {
            bind: std::env::var("YEAR_PROGRESS_BIND")
                .ok()
                .filter(|b| !b.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            port: parse_port(std::env::var("PORT").ok().as_deref()),
            settings: parse_settings_location(
                std::env::var("YEAR_PROGRESS_SETTINGS").ok().as_deref(),
                home.as_deref(),
            ),
            color_scheme: parse_color_scheme(
                std::env::var("YEAR_PROGRESS_COLOR_SCHEME").ok().as_deref(),
            ),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            settings: SettingsLocation::Memory,
            color_scheme: None,
        }
    }
}

fn parse_port(raw: Option<&str>) -> u16 {
    raw.and_then(|v| v.trim().parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT)
}

fn parse_settings_location(raw: Option<&str>, home: Option<&std::path::Path>) -> SettingsLocation {
    match raw.map(str::trim) {
        Some(v) if v.eq_ignore_ascii_case("memory") => SettingsLocation::Memory,
        Some(v) if !v.is_empty() => SettingsLocation::File(PathBuf::from(v)),
        _ => SettingsLocation::File(match home {
            Some(home) => home
                .join(".config")
                .join("year-progress")
                .join(SETTINGS_FILE_NAME),
            None => PathBuf::from("year-progress-settings.json"),
        }),
    }
}

fn parse_color_scheme(raw: Option<&str>) -> Option<Theme> {
    raw.map(|v| v.trim().to_ascii_lowercase())
        .and_then(|v| Theme::parse(&v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn port_defaults_on_missing_or_bad_value() {
        assert_eq!(parse_port(None), DEFAULT_PORT);
        assert_eq!(parse_port(Some("not-a-port")), DEFAULT_PORT);
        assert_eq!(parse_port(Some("70000")), DEFAULT_PORT);
        assert_eq!(parse_port(Some(" 3000 ")), 3000);
    }

    #[test]
    fn settings_location_memory_and_explicit_path() {
        assert_eq!(
            parse_settings_location(Some("memory"), None),
            SettingsLocation::Memory
        );
        assert_eq!(
            parse_settings_location(Some("MEMORY"), None),
            SettingsLocation::Memory
        );
        assert_eq!(
            parse_settings_location(Some("/tmp/prefs.json"), None),
            SettingsLocation::File(PathBuf::from("/tmp/prefs.json"))
        );
    }

    #[test]
    fn settings_location_defaults_under_home() {
        assert_eq!(
            parse_settings_location(None, Some(Path::new("/home/pat"))),
            SettingsLocation::File(PathBuf::from(
                "/home/pat/.config/year-progress/settings.json"
            ))
        );
        assert_eq!(
            parse_settings_location(Some("  "), None),
            SettingsLocation::File(PathBuf::from("year-progress-settings.json"))
        );
    }

    #[test]
    fn color_scheme_override() {
        assert_eq!(parse_color_scheme(Some("dark")), Some(Theme::Dark));
        assert_eq!(parse_color_scheme(Some(" Light ")), Some(Theme::Light));
        assert_eq!(parse_color_scheme(Some("auto")), None);
        assert_eq!(parse_color_scheme(None), None);
    }

    #[test]
    fn addr_joins_bind_and_port() {
        let config = Config {
            port: 9000,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:9000");
    }
}
