mod catppuccin;
mod colors;
mod gruvbox;
mod loader;
mod nord;
mod tokyo_night;

pub use catppuccin::CATPPUCCIN_MOCHA;
pub use colors::{hex_to_color, ColorPalette};
pub use gruvbox::GRUVBOX_DARK;
pub use loader::{ThemeConfig, ThemeLoader};
pub use nord::NORD;
pub use tokyo_night::TOKYO_NIGHT;

use mkpro_core::{HealthState, SessionState};
use ratatui::style::Color;

pub trait Theme: Send + Sync {
    fn name(&self) -> &'static str;

    fn background(&self) -> Color;
    fn foreground(&self) -> Color;
    fn foreground_dim(&self) -> Color;

    fn surface(&self) -> Color;
    fn border(&self) -> Color;
    fn selection(&self) -> Color;

    fn accent(&self) -> Color;
    fn accent_secondary(&self) -> Color;

    fn success(&self) -> Color;
    fn warning(&self) -> Color;
    fn error(&self) -> Color;
    fn info(&self) -> Color;

    fn health_color(&self, health: &HealthState) -> Color {
        match health {
            HealthState::Pending => self.warning(),
            HealthState::Ok => self.success(),
            HealthState::Fail(_) => self.error(),
        }
    }

    fn session_color(&self, state: &SessionState) -> Color {
        match state {
            SessionState::Idle => self.foreground_dim(),
            SessionState::Connecting | SessionState::WaitingForScan => self.warning(),
            SessionState::Connected => self.success(),
            SessionState::Error(_) => self.error(),
        }
    }
}

/// A named palette.
#[derive(Debug, Clone, Copy)]
pub struct PaletteTheme {
    name: &'static str,
    palette: ColorPalette,
}

impl PaletteTheme {
    pub const fn new(name: &'static str, palette: ColorPalette) -> Self {
        Self { name, palette }
    }

    pub fn palette(&self) -> &ColorPalette {
        &self.palette
    }
}

impl Theme for PaletteTheme {
    fn name(&self) -> &'static str {
        self.name
    }

    fn background(&self) -> Color {
        self.palette.background
    }

    fn foreground(&self) -> Color {
        self.palette.foreground
    }

    fn foreground_dim(&self) -> Color {
        self.palette.foreground_dim
    }

    fn surface(&self) -> Color {
        self.palette.surface
    }

    fn border(&self) -> Color {
        self.palette.border
    }

    fn selection(&self) -> Color {
        self.palette.selection
    }

    fn accent(&self) -> Color {
        self.palette.accent
    }

    fn accent_secondary(&self) -> Color {
        self.palette.accent_secondary
    }

    fn success(&self) -> Color {
        self.palette.success
    }

    fn warning(&self) -> Color {
        self.palette.warning
    }

    fn error(&self) -> Color {
        self.palette.error
    }

    fn info(&self) -> Color {
        self.palette.info
    }
}

pub const DEFAULT_THEME: &str = "Tokyo Night";

pub struct ThemeManager {
    themes: Vec<PaletteTheme>,
    current_index: usize,
}

impl ThemeManager {
    pub fn new() -> Self {
        Self {
            themes: vec![
                PaletteTheme::new(DEFAULT_THEME, TOKYO_NIGHT),
                PaletteTheme::new("Catppuccin Mocha", CATPPUCCIN_MOCHA),
                PaletteTheme::new("Nord", NORD),
                PaletteTheme::new("Gruvbox Dark", GRUVBOX_DARK),
            ],
            current_index: 0,
        }
    }

    pub fn current_theme(&self) -> &dyn Theme {
        &self.themes[self.current_index]
    }

    pub fn cycle_theme(&mut self) -> &'static str {
        self.current_index = (self.current_index + 1) % self.themes.len();
        self.current_theme_name()
    }

    /// Case-insensitive; `-` and `_` count as spaces.
    pub fn set_theme_by_name(&mut self, name: &str) -> bool {
        let wanted = normalize(name);
        match self.themes.iter().position(|t| normalize(t.name) == wanted) {
            Some(index) => {
                self.current_index = index;
                true
            }
            None => false,
        }
    }

    pub fn available_themes(&self) -> Vec<&'static str> {
        self.themes.iter().map(|t| t.name).collect()
    }

    pub fn current_theme_name(&self) -> &'static str {
        self.themes[self.current_index].name
    }
}

impl Default for ThemeManager {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase().replace(['-', '_'], " ")
}
