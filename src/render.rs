use askama::Template;
use std::f64::consts::PI;
use std::sync::{Arc, OnceLock};

use crate::color_constants::{Palette, GRADIENT_STOPS};
use crate::theme::Theme;
use crate::view::{ViewState, REFRESH_PERIOD};

/// Side of the square ring viewBox, in SVG user units.
pub const VIEW_BOX: f64 = 280.0;
pub const RING_RADIUS: f64 = 120.0;
pub const RING_STROKE_WIDTH: f64 = 8.0;
pub const DEFAULT_RING_SIZE: u32 = 320;
/// Largest PNG side `svg_to_png` will allocate (4096² RGBA is 64 MiB).
pub const MAX_RASTER_SIDE: u32 = 4096;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to parse SVG: {0}")]
    Parse(String),
    #[error("failed to create {width}x{height} pixmap")]
    Pixmap { width: u32, height: u32 },
    #[error("failed to encode PNG: {0}")]
    Encode(String),
}

/// Dash pattern that reveals `progress_percent` of the ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingGeometry {
    pub circumference: f64,
    pub arc_length: f64,
    pub dash_offset: f64,
}

pub fn ring_geometry(progress_percent: f64) -> RingGeometry {
    let circumference = 2.0 * PI * RING_RADIUS;
    let arc_length = progress_percent.clamp(0.0, 100.0) / 100.0 * circumference;
    RingGeometry {
        circumference,
        arc_length,
        dash_offset: circumference - arc_length,
    }
}

pub fn format_percent(progress_percent: f64) -> String {
    format!("{:.1}%", progress_percent)
}

#[derive(Debug, Clone)]
struct GradientStop {
    offset: u8,
    color: &'static str,
}

#[derive(Template)]
#[template(path = "ring.svg")]
struct RingTemplate {
    size: u32,
    view_box: String,
    center: String,
    radius: String,
    stroke_width: String,
    circumference: String,
    dash_offset: String,
    track_stroke: &'static str,
    gradient_stops: Vec<GradientStop>,
    percent_text: String,
    percent_y: String,
    percent_font_size: String,
    percent_color: &'static str,
    label_y: String,
    label_font_size: String,
    label_color: &'static str,
    theme_class: &'static str,
}

/// Render the progress ring as a standalone SVG document, `size` pixels square
pub fn generate_ring_svg(state: &ViewState, size: u32) -> String {
    let palette = Palette::for_theme(state.theme);
    let geometry = ring_geometry(state.progress_percent);
    let center = VIEW_BOX / 2.0;

    let template = RingTemplate {
        size,
        view_box: format!("{:.0}", VIEW_BOX),
        center: format!("{:.2}", center),
        radius: format!("{:.2}", RING_RADIUS),
        stroke_width: format!("{:.2}", RING_STROKE_WIDTH),
        circumference: format!("{:.3}", geometry.circumference),
        dash_offset: format!("{:.3}", geometry.dash_offset),
        track_stroke: palette.track_stroke,
        gradient_stops: GRADIENT_STOPS
            .iter()
            .map(|&(offset, color)| GradientStop { offset, color })
            .collect(),
        percent_text: format_percent(state.progress_percent),
        percent_y: format!("{:.2}", center + 6.0),
        percent_font_size: format!("{:.2}", VIEW_BOX * 0.18),
        percent_color: palette.number_text,
        label_y: format!("{:.2}", center + 34.0),
        label_font_size: format!("{:.2}", VIEW_BOX * 0.045),
        label_color: palette.label_text,
        theme_class: theme_class(state.theme),
    };

    template.render().unwrap_or_else(|e| {
        tracing::error!("Failed to render ring template: {}", e);
        String::from(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><text>Error rendering progress</text></svg>"#,
        )
    })
}

/// The full view. Served directly as an HTML response.
#[derive(Template)]
#[template(path = "year_progress.html")]
pub struct YearProgressPage {
    theme_class: &'static str,
    show_sun: bool,
    year: i32,
    ring_svg: String,
    days_passed: i64,
    days_remaining: u32,
    percent_text: String,
    refresh_secs: u64,
    background: &'static str,
    heading_color: &'static str,
    number_color: &'static str,
    label_color: &'static str,
    footer_color: &'static str,
    icon_color: &'static str,
}

/// Map view state to the page. `days_passed` comes from its own clock read.
pub fn render_page(state: &ViewState, days_passed: i64) -> YearProgressPage {
    let palette = Palette::for_theme(state.theme);
    YearProgressPage {
        theme_class: theme_class(state.theme),
        // The icon names the mode a click switches to.
        show_sun: state.is_dark_mode(),
        year: state.current_year,
        ring_svg: generate_ring_svg(state, DEFAULT_RING_SIZE),
        days_passed,
        days_remaining: state.days_remaining,
        percent_text: format_percent(state.progress_percent),
        refresh_secs: REFRESH_PERIOD.as_secs(),
        background: palette.background,
        heading_color: palette.heading_text,
        number_color: palette.number_text,
        label_color: palette.label_text,
        footer_color: palette.footer_text,
        icon_color: palette.icon,
    }
}

fn theme_class(theme: Theme) -> &'static str {
    match theme {
        Theme::Dark => "dark",
        Theme::Light => "",
    }
}

fn font_database() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut fontdb = usvg::fontdb::Database::new();
            fontdb.load_system_fonts();
            tracing::debug!("Loaded {} font faces", fontdb.len());
            Arc::new(fontdb)
        })
        .clone()
}

/// Convert SVG to PNG with the specified scale
pub fn svg_to_png(svg_data: &str, scale: f32) -> Result<Vec<u8>, RenderError> {
    use tiny_skia::Pixmap;

    let mut opts = usvg::Options::default();
    opts.fontdb = font_database();

    let tree =
        usvg::Tree::from_str(svg_data, &opts).map_err(|e| RenderError::Parse(e.to_string()))?;

    let size = tree.size();
    let width = (size.width() * scale) as u32;
    let height = (size.height() * scale) as u32;
    if width > MAX_RASTER_SIDE || height > MAX_RASTER_SIDE {
        return Err(RenderError::Pixmap { width, height });
    }

    let mut pixmap = Pixmap::new(width, height).ok_or(RenderError::Pixmap { width, height })?;

    let transform = if scale != 1.0 {
        tiny_skia::Transform::from_scale(scale, scale)
    } else {
        tiny_skia::Transform::identity()
    };

    resvg::render(&tree, transform, &mut pixmap.as_mut());

    pixmap
        .encode_png()
        .map_err(|e| RenderError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(progress_percent: f64, theme: Theme) -> ViewState {
        ViewState {
            progress_percent,
            days_remaining: 184,
            current_year: 2024,
            theme,
        }
    }

    #[test]
    fn geometry_reveals_share_of_circumference() {
        let empty = ring_geometry(0.0);
        assert!((empty.circumference - 2.0 * PI * 120.0).abs() < 1e-9);
        assert!((empty.dash_offset - empty.circumference).abs() < 1e-9);

        let half = ring_geometry(50.0);
        assert!((half.arc_length - half.circumference / 2.0).abs() < 1e-9);
        assert!((half.dash_offset - half.circumference / 2.0).abs() < 1e-9);

        let full = ring_geometry(100.0);
        assert!(full.dash_offset.abs() < 1e-9);
    }

    #[test]
    fn geometry_clamps_implausible_progress() {
        assert_eq!(ring_geometry(-5.0), ring_geometry(0.0));
        assert_eq!(ring_geometry(140.0), ring_geometry(100.0));
    }

    #[test]
    fn percent_has_one_decimal() {
        assert_eq!(format_percent(49.726_775), "49.7%");
        assert_eq!(format_percent(0.0), "0.0%");
        assert_eq!(format_percent(99.96), "100.0%");
    }

    #[test]
    fn ring_svg_uses_dash_pattern_and_gradient() {
        let svg = generate_ring_svg(&state(50.0, Theme::Light), 320);
        let geometry = ring_geometry(50.0);

        assert!(svg.contains(r#"width="320""#));
        assert!(svg.contains(r#"viewBox="0 0 280 280""#));
        assert!(svg.contains(&format!(r#"stroke-dasharray="{:.3}""#, geometry.circumference)));
        assert!(svg.contains(&format!(r#"stroke-dashoffset="{:.3}""#, geometry.dash_offset)));
        assert!(svg.contains("rotate(-90 140.00 140.00)"));
        assert!(svg.contains(r#"stroke="url(#purpleGradient)""#));
        assert_eq!(svg.matches("<stop ").count(), 5);
        assert!(svg.contains(r#"offset="75%""#));
        assert!(svg.contains("50.0%"));
        assert!(svg.contains("Complete"));
    }

    #[test]
    fn ring_track_follows_theme() {
        let light = generate_ring_svg(&state(10.0, Theme::Light), 320);
        let dark = generate_ring_svg(&state(10.0, Theme::Dark), 320);
        assert!(light.contains(crate::color_constants::light::TRACK_STROKE));
        assert!(dark.contains(crate::color_constants::dark::TRACK_STROKE));
        assert!(dark.contains(r#"class="dark""#));
    }

    #[test]
    fn page_marks_root_dark_and_offers_sun() {
        let html = render_page(&state(49.73, Theme::Dark), 182).render().unwrap();
        assert!(html.contains(r#"<html lang="en" class="dark">"#));
        assert!(html.contains(r#"data-icon="sun""#));
        assert!(!html.contains(r#"data-icon="moon""#));
        assert!(html.contains(crate::color_constants::dark::BACKGROUND));
    }

    #[test]
    fn page_in_light_mode_offers_moon() {
        let html = render_page(&state(49.73, Theme::Light), 182).render().unwrap();
        assert!(html.contains(r#"<html lang="en" class="">"#));
        assert!(html.contains(r#"data-icon="moon""#));
        assert!(!html.contains(r#"data-icon="sun""#));
    }

    #[test]
    fn page_shows_counts_and_labels() {
        let html = render_page(&state(49.73, Theme::Light), 182).render().unwrap();
        assert!(html.contains("Your journey through 2024"));
        assert!(html.contains("49.7%"));
        assert!(html.contains(">182<"));
        assert!(html.contains(">184<"));
        assert!(html.contains("Days Passed"));
        assert!(html.contains("Days Remaining"));
        assert!(html.contains(r#"action="/theme/toggle""#));
        assert!(html.contains(r#"aria-label="Toggle dark mode""#));
        assert!(html.contains(r#"content="3600""#));
    }

    #[test]
    fn ring_rasterises_to_png() {
        let svg = generate_ring_svg(&state(25.0, Theme::Light), 64);
        let png = svg_to_png(&svg, 2.0).unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
    }

    #[test]
    fn png_refuses_oversized_raster() {
        let svg = generate_ring_svg(&state(25.0, Theme::Light), 2048);
        assert!(matches!(
            svg_to_png(&svg, 8.0),
            Err(RenderError::Pixmap {
                width: 16384,
                height: 16384
            })
        ));
    }

    #[test]
    fn png_rejects_garbage() {
        assert!(matches!(svg_to_png("not svg", 1.0), Err(RenderError::Parse(_))));
    }
}
