//! Color constants for year progress rendering

use crate::theme::Theme;

// Progress stroke gradient, shared by both modes (0/25/50/75/100%)
pub const GRADIENT_STOPS: [(u8, &str); 5] = [
    (0, "rgb(192, 132, 252)"),  // Light lavender
    (25, "rgb(168, 85, 247)"),  // Medium purple
    (50, "rgb(139, 92, 246)"),  // Amethyst
    (75, "rgb(124, 58, 237)"),  // Darker purple
    (100, "rgb(109, 40, 217)"), // Deep violet
];

// Light mode colors
pub mod light {
    pub const BACKGROUND: &str = "#ffffff";

    pub const HEADING_TEXT: &str = "#334155";
    pub const NUMBER_TEXT: &str = "#1e293b";
    pub const LABEL_TEXT: &str = "#64748b";
    pub const FOOTER_TEXT: &str = "#94a3b8";

    // Ring track behind the progress stroke
    pub const TRACK_STROKE: &str = "rgb(226, 232, 240)";

    pub const ICON: &str = "#334155";
}

// Dark mode colors
pub mod dark {
    pub const BACKGROUND: &str = "#000000";

    pub const HEADING_TEXT: &str = "#cbd5e1";
    pub const NUMBER_TEXT: &str = "#e2e8f0";
    pub const LABEL_TEXT: &str = "#94a3b8";
    pub const FOOTER_TEXT: &str = "#64748b";

    pub const TRACK_STROKE: &str = "rgb(55, 65, 81)";

    pub const ICON: &str = "#cbd5e1";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub heading_text: &'static str,
    pub number_text: &'static str,
    pub label_text: &'static str,
    pub footer_text: &'static str,
    pub track_stroke: &'static str,
    pub icon: &'static str,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                background: light::BACKGROUND,
                heading_text: light::HEADING_TEXT,
                number_text: light::NUMBER_TEXT,
                label_text: light::LABEL_TEXT,
                footer_text: light::FOOTER_TEXT,
                track_stroke: light::TRACK_STROKE,
                icon: light::ICON,
            },
            Theme::Dark => Self {
                background: dark::BACKGROUND,
                heading_text: dark::HEADING_TEXT,
                number_text: dark::NUMBER_TEXT,
                label_text: dark::LABEL_TEXT,
                footer_text: dark::FOOTER_TEXT,
                track_stroke: dark::TRACK_STROKE,
                icon: dark::ICON,
            },
        }
    }
}
