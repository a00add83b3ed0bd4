use super::colors::{hex_to_color, ColorPalette};

/// Catppuccin Mocha.
pub const CATPPUCCIN_MOCHA: ColorPalette = ColorPalette {
    background: hex_to_color(0x1e1e2e),
    foreground: hex_to_color(0xcdd6f4),
    foreground_dim: hex_to_color(0x6c7086),
    surface: hex_to_color(0x313244),
    border: hex_to_color(0x45475a),
    selection: hex_to_color(0x585b70),
    accent: hex_to_color(0x89b4fa),
    accent_secondary: hex_to_color(0xcba6f7),
    success: hex_to_color(0xa6e3a1),
    warning: hex_to_color(0xf9e2af),
    error: hex_to_color(0xf38ba8),
    info: hex_to_color(0x89dceb),
};
