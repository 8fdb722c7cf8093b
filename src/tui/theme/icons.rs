//! Nerd Font icons for TUI display
//! Requires a Nerd Font to be installed (https://www.nerdfonts.com)

/// Icon set using Nerd Font glyphs
#[derive(Debug, Clone)]
pub struct Icons {
    // Navigation
    pub search: &'static str,
    pub help: &'static str,

    // Status
    pub success: &'static str,
    pub error: &'static str,
    pub info: &'static str,

    // Result kinds
    pub video: &'static str,
    pub channel: &'static str,
    pub playlist: &'static str,
    pub verified: &'static str,

    // Selection
    pub selected: &'static str,

    // Separators
    pub bullet: &'static str,

    // Misc
    pub history: &'static str,
    pub cache: &'static str,
}

impl Icons {
    /// Nerd Font icon set
    pub const fn nerd() -> Self {
        Self {
            search: "\u{f002}",   // nf-fa-search
            help: "\u{f059}",     // nf-fa-question_circle
            success: "\u{f00c}",  // nf-fa-check
            error: "\u{f00d}",    // nf-fa-times
            info: "\u{f05a}",     // nf-fa-info_circle
            video: "\u{f03d}",    // nf-fa-video_camera
            channel: "\u{f007}",  // nf-fa-user
            playlist: "\u{f0cb}", // nf-fa-list_ol
            verified: "\u{f058}", // nf-fa-check_circle
            selected: "\u{f054}", // nf-fa-chevron_right
            bullet: "•",
            history: "\u{f1da}",  // nf-fa-history
            cache: "\u{f1c0}",    // nf-fa-database
        }
    }
}

impl Default for Icons {
    fn default() -> Self {
        Self::nerd()
    }
}

/// Loading spinner frames
pub struct LoadingSpinner;

impl LoadingSpinner {
    /// Braille-based smooth spinner
    pub const BRAILLE: [&'static str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

    pub fn frame(tick: u64) -> &'static str {
        let idx = (tick / 4) as usize % Self::BRAILLE.len();
        Self::BRAILLE[idx]
    }
}
