use super::colors::{hex_to_color, ColorPalette};

/// Gruvbox dark, medium contrast.
pub const GRUVBOX_DARK: ColorPalette = ColorPalette {
    background: hex_to_color(0x282828),
    foreground: hex_to_color(0xebdbb2),
    foreground_dim: hex_to_color(0x928374),
    surface: hex_to_color(0x3c3836),
    border: hex_to_color(0x504945),
    selection: hex_to_color(0x665c54),
    accent: hex_to_color(0x83a598),
    accent_secondary: hex_to_color(0xd3869b),
    success: hex_to_color(0xb8bb26),
    warning: hex_to_color(0xfabd2f),
    error: hex_to_color(0xfb4934),
    info: hex_to_color(0x8ec07c),
};
