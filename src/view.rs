//! The year progress view: its state, lifecycle and the hourly refresh.
//!
//! A [`YearProgressView`] is mounted once. Mounting loads and applies the theme,
//! computes progress, then starts a repeating task that recomputes progress
//! every [`REFRESH_PERIOD`]. The task is aborted on [`YearProgressView::unmount`]
//! or when the view is dropped, so no tick can touch state after teardown.
//!
//! All mutations go through one `RwLock`, and every mutation is published on
//! a `watch` channel so renderers can re-derive their output.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::clock::Clock;
use crate::progress::{compute_progress, days_passed_whole, YearProgress};
use crate::theme::{toggle_theme, Theme, ThemeManager};

pub const REFRESH_PERIOD: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewState {
    pub progress_percent: f64,
    pub days_remaining: u32,
    pub current_year: i32,
    pub theme: Theme,
}

impl ViewState {
    fn new(progress: &YearProgress, theme: Theme) -> Self {
        Self {
            progress_percent: progress.progress_percent,
            days_remaining: progress.days_remaining,
            current_year: progress.year,
            theme,
        }
    }

    fn apply_progress(&mut self, progress: &YearProgress) {
        self.progress_percent = progress.progress_percent;
        self.days_remaining = progress.days_remaining;
        self.current_year = progress.year;
    }

    pub fn is_dark_mode(&self) -> bool {
        self.theme.is_dark()
    }
}

/// Point-in-time read of the view, with the whole-day counter taken from a
/// fresh clock read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewSnapshot {
    pub progress_percent: f64,
    pub days_passed: i64,
    pub days_remaining: u32,
    pub year: i32,
    pub theme: Theme,
    pub is_dark_mode: bool,
}

struct Shared {
    state: RwLock<ViewState>,
    changes: watch::Sender<ViewState>,
}

impl Shared {
    async fn recompute(&self, now: DateTime<Local>) -> YearProgress {
        let progress = compute_progress(&now);
        let mut state = self.state.write().await;
        state.apply_progress(&progress);
        self.changes.send_replace(*state);
        progress
    }
}

pub struct YearProgressView {
    shared: Arc<Shared>,
    themes: ThemeManager,
    clock: Arc<dyn Clock>,
    refresh: JoinHandle<()>,
}

impl YearProgressView {
    /// Mount with the standard hourly refresh. Must run inside a tokio runtime.
    pub async fn mount(themes: ThemeManager, clock: Arc<dyn Clock>) -> Self {
        Self::mount_with_period(themes, clock, REFRESH_PERIOD).await
    }

    pub async fn mount_with_period(
        themes: ThemeManager,
        clock: Arc<dyn Clock>,
        period: Duration,
    ) -> Self {
        let theme = themes.load_initial_theme().await;
        themes.apply_theme(theme).await;

        let progress = compute_progress(&clock.now());
        let state = ViewState::new(&progress, theme);
        let (changes, _) = watch::channel(state);
        let shared = Arc::new(Shared {
            state: RwLock::new(state),
            changes,
        });

        let refresh = tokio::spawn(run_refresh(shared.clone(), clock.clone(), period));

        tracing::info!(
            "Mounted year progress view: {} is {:.1}% complete, {} days remaining, {} mode",
            progress.year,
            progress.progress_percent,
            progress.days_remaining,
            theme
        );

        Self {
            shared,
            themes,
            clock,
            refresh,
        }
    }

    pub async fn state(&self) -> ViewState {
        *self.shared.state.read().await
    }

    /// Receiver notified after every state mutation.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.shared.changes.subscribe()
    }

    /// Flip the theme and return the new one.
    ///
    /// The new theme is persisted before this returns, so a reload right after
    /// a toggle sees it.
    pub async fn toggle_theme(&self) -> Theme {
        let mut state = self.shared.state.write().await;
        let next = toggle_theme(state.theme);
        state.theme = next;
        // The flip itself stays pure; the apply step is the effect of the theme
        // changing. It runs here, under the write lock, instead of in a `watch`
        // observer so it finishes before this returns and the stored value
        // never lags or reorders against state across concurrent toggles.
        self.themes.apply_theme(next).await;
        self.shared.changes.send_replace(*state);
        tracing::info!("Theme switched to {}", next);
        next
    }

    /// Recompute progress from the current time immediately.
    pub async fn refresh(&self) -> YearProgress {
        self.shared.recompute(self.clock.now()).await
    }

    /// Whole days elapsed this year, from a fresh clock read.
    pub fn days_passed(&self) -> i64 {
        days_passed_whole(&self.clock.now())
    }

    pub async fn snapshot(&self) -> ViewSnapshot {
        let state = self.state().await;
        ViewSnapshot {
            progress_percent: state.progress_percent,
            days_passed: self.days_passed(),
            days_remaining: state.days_remaining,
            year: state.current_year,
            theme: state.theme,
            is_dark_mode: state.is_dark_mode(),
        }
    }

    /// Stop the refresh task. State stays readable but no longer changes on
    /// its own.
    pub fn unmount(&self) {
        if !self.refresh.is_finished() {
            tracing::info!("Unmounting year progress view");
        }
        self.refresh.abort();
    }
}

impl Drop for YearProgressView {
    fn drop(&mut self) {
        self.refresh.abort();
    }
}

async fn run_refresh(shared: Arc<Shared>, clock: Arc<dyn Clock>, period: Duration) {
    // First tick one period after mount; mount already computed once.
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    // Missed ticks are not replayed; the next one recomputes from "now".
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let progress = shared.recompute(clock.now()).await;
        tracing::debug!(
            "Refreshed progress: {:.3}% of {}, {} days remaining",
            progress.progress_percent,
            progress.year,
            progress.days_remaining
        );
    }
}
