//! Light/dark display mode and its persisted preference.
//!
//! The preference lives in one settings slot, [`THEME_KEY`], holding the literal
//! `"dark"` or `"light"`. Anything else stored there counts as no preference,
//! and the ambient color-scheme signal decides instead.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::ambient::AmbientColorScheme;
use crate::settings::SettingsProvider;

pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn from_dark(is_dark: bool) -> Self {
        if is_dark {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    /// Exact match on the stored literals.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flip the display mode. Persisting the result is the caller's apply step.
pub fn toggle_theme(current: Theme) -> Theme {
    current.toggled()
}

pub struct ThemeManager {
    settings: Arc<dyn SettingsProvider>,
    ambient: Arc<dyn AmbientColorScheme>,
}

impl ThemeManager {
    pub fn new(settings: Arc<dyn SettingsProvider>, ambient: Arc<dyn AmbientColorScheme>) -> Self {
        Self { settings, ambient }
    }

    /// Stored preference first, then the ambient signal. Never fails.
    pub async fn load_initial_theme(&self) -> Theme {
        let stored = match self.settings.get(THEME_KEY).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Could not read theme preference, treating as unset: {}", e);
                None
            }
        };

        if let Some(theme) = stored.as_deref().and_then(Theme::parse) {
            tracing::debug!("Using stored theme preference: {}", theme);
            return theme;
        }

        let theme = Theme::from_dark(self.ambient_prefers_dark().await);
        tracing::debug!("No stored theme preference, ambient signal gives {}", theme);
        theme
    }

    // OS detection can block on a session-bus call.
    async fn ambient_prefers_dark(&self) -> bool {
        let ambient = self.ambient.clone();
        match tokio::task::spawn_blocking(move || ambient.prefers_dark()).await {
            Ok(dark) => dark,
            Err(e) => {
                tracing::warn!("Ambient color-scheme detection failed, using light: {}", e);
                false
            }
        }
    }

    /// Persist `theme` to the preference slot. Failures are logged and dropped.
    ///
    /// The dark marker itself is not applied here: renderers read the theme
    /// from view state.
    pub async fn apply_theme(&self, theme: Theme) {
        if let Err(e) = self.settings.set(THEME_KEY, theme.as_str()).await {
            tracing::warn!("Failed to persist theme preference {}: {}", theme, e);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::ambient::FixedColorScheme;
    use crate::settings::InMemorySettings;

    fn manager(settings: Arc<dyn SettingsProvider>, ambient_dark: bool) -> ThemeManager {
        ThemeManager::new(settings, Arc::new(FixedColorScheme { dark: ambient_dark }))
    }

    #[test]
    fn parse_accepts_only_exact_literals() {
        assert_eq!(Theme::parse("dark"), Some(Theme::Dark));
        assert_eq!(Theme::parse("light"), Some(Theme::Light));
        assert_eq!(Theme::parse("Dark"), None);
        assert_eq!(Theme::parse("undefined"), None);
        assert_eq!(Theme::parse(""), None);
    }

    #[test]
    fn toggle_flips() {
        assert_eq!(toggle_theme(Theme::Light), Theme::Dark);
        assert_eq!(toggle_theme(Theme::Dark), Theme::Light);
    }

    #[tokio::test]
    async fn stored_preference_wins_over_ambient() {
        let settings = Arc::new(InMemorySettings::new());
        settings.set(THEME_KEY, "light").await.unwrap();
        assert_eq!(manager(settings.clone(), true).load_initial_theme().await, Theme::Light);

        settings.set(THEME_KEY, "dark").await.unwrap();
        assert_eq!(manager(settings, false).load_initial_theme().await, Theme::Dark);
    }

    #[tokio::test]
    async fn absent_or_invalid_preference_uses_ambient() {
        let settings = Arc::new(InMemorySettings::new());
        assert_eq!(manager(settings.clone(), true).load_initial_theme().await, Theme::Dark);
        assert_eq!(manager(settings.clone(), false).load_initial_theme().await, Theme::Light);

        settings.set(THEME_KEY, "purple").await.unwrap();
        assert_eq!(manager(settings, true).load_initial_theme().await, Theme::Dark);
    }

    struct SlowColorScheme;

    impl AmbientColorScheme for SlowColorScheme {
        fn prefers_dark(&self) -> bool {
            std::thread::sleep(std::time::Duration::from_millis(200));
            true
        }
    }

    #[tokio::test]
    async fn slow_ambient_detection_does_not_stall_the_runtime() {
        let manager = ThemeManager::new(Arc::new(InMemorySettings::new()), Arc::new(SlowColorScheme));
        let load = tokio::spawn(async move { manager.load_initial_theme().await });

        // On the single-threaded test runtime this only runs if the detection
        // is off the async worker.
        let ticker = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            std::time::Instant::now()
        });

        let ticked_at = ticker.await.unwrap();
        assert_eq!(load.await.unwrap(), Theme::Dark);
        assert!(ticked_at.elapsed() >= std::time::Duration::from_millis(100));
    }

    #[tokio::test]
    async fn load_is_idempotent() {
        let settings = Arc::new(InMemorySettings::new());
        let manager = manager(settings, true);
        let first = manager.load_initial_theme().await;
        let second = manager.load_initial_theme().await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn apply_writes_literal() {
        let settings = Arc::new(InMemorySettings::new());
        let manager = manager(settings.clone(), false);

        manager.apply_theme(Theme::Dark).await;
        assert_eq!(settings.get(THEME_KEY).await.unwrap().as_deref(), Some("dark"));

        manager.apply_theme(Theme::Light).await;
        assert_eq!(settings.get(THEME_KEY).await.unwrap().as_deref(), Some("light"));
    }

    #[tokio::test]
    async fn broken_storage_falls_back_and_does_not_panic() {
        let manager = manager(Arc::new(test_helpers::BrokenSettings), true);
        assert_eq!(manager.load_initial_theme().await, Theme::Dark);
        manager.apply_theme(Theme::Light).await;
    }
}
