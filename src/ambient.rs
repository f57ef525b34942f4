//! Ambient color-scheme signal.
//!
//! Consulted only when no theme preference is stored.

use std::sync::Arc;

use crate::config::Config;

/// Read-only host signal for the system-wide light/dark preference.
pub trait AmbientColorScheme: Send + Sync {
    fn prefers_dark(&self) -> bool;
}

/// Asks the operating system through `dark-light`.
pub struct SystemColorScheme;

impl AmbientColorScheme for SystemColorScheme {
    fn prefers_dark(&self) -> bool {
        match dark_light::detect() {
            dark_light::Mode::Dark => true,
            dark_light::Mode::Light => false,
            dark_light::Mode::Default => false,
        }
    }
}

/// A fixed answer, from configuration or tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedColorScheme {
    pub dark: bool,
}

impl AmbientColorScheme for FixedColorScheme {
    fn prefers_dark(&self) -> bool {
        self.dark
    }
}

/// The configured override when present, otherwise OS detection.
pub fn create_ambient(config: &Config) -> Arc<dyn AmbientColorScheme> {
    match config.color_scheme {
        Some(theme) => {
            tracing::info!("Ambient color scheme forced to {}", theme);
            Arc::new(FixedColorScheme {
                dark: theme.is_dark(),
            })
        }
        None => Arc::new(SystemColorScheme),
    }
}
