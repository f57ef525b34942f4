//! A year progress view: how far the current calendar year has come, drawn as
//! a gradient ring with day counters and a persisted light/dark toggle.
//!
//! [`view::YearProgressView`] owns the state and its hourly refresh,
//! [`render`] maps state to SVG and HTML, and [`routes`] serves both to a
//! browser over a loopback HTTP server.

pub mod ambient;
pub mod clock;
pub mod color_constants;
pub mod config;
pub mod progress;
pub mod render;
pub mod routes;
pub mod settings;
pub mod theme;
pub mod view;
