use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyModifiers};
use serde::{Deserialize, Serialize};

use super::handler::Action;

/// A key plus modifiers, written as `Ctrl+c`, `Tab`, `]` or `F5` in the
/// keybinds file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub const fn char(c: char) -> Self {
        Self::new(KeyCode::Char(c))
    }

    pub const fn ctrl(c: char) -> Self {
        Self {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let mut modifiers = KeyModifiers::NONE;
        let mut rest = raw;
        loop {
            if let Some(tail) = rest.strip_prefix("Ctrl+") {
                modifiers |= KeyModifiers::CONTROL;
                rest = tail;
            } else if let Some(tail) = rest.strip_prefix("Alt+") {
                modifiers |= KeyModifiers::ALT;
                rest = tail;
            } else {
                break;
            }
        }

        let code = match rest {
            "Tab" => KeyCode::Tab,
            "BackTab" => KeyCode::BackTab,
            "Enter" => KeyCode::Enter,
            "Esc" => KeyCode::Esc,
            "Up" => KeyCode::Up,
            "Down" => KeyCode::Down,
            "Left" => KeyCode::Left,
            "Right" => KeyCode::Right,
            "Space" => KeyCode::Char(' '),
            f if f.len() > 1 && f.starts_with('F') => KeyCode::F(f[1..].parse().ok()?),
            other => {
                let mut chars = other.chars();
                let c = chars.next()?;
                if chars.next().is_some() {
                    return None;
                }
                KeyCode::Char(c)
            }
        };

        Some(Self { code, modifiers })
    }

    pub fn matches(&self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        self.code == code && self.modifiers == modifiers
    }
}

impl fmt::Display for KeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            f.write_str("Ctrl+")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            f.write_str("Alt+")?;
        }
        match self.code {
            KeyCode::Char(' ') => f.write_str("Space"),
            KeyCode::Char(c) => write!(f, "{}", c),
            KeyCode::F(n) => write!(f, "F{}", n),
            other => write!(f, "{:?}", other),
        }
    }
}

impl TryFrom<String> for KeyBinding {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        KeyBinding::parse(&value).ok_or_else(|| format!("invalid key '{}'", value))
    }
}

impl From<KeyBinding> for String {
    fn from(binding: KeyBinding) -> Self {
        binding.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeybindConfig {
    pub quit: Vec<KeyBinding>,
    pub next_tab: Vec<KeyBinding>,
    pub prev_tab: Vec<KeyBinding>,
    pub next_brand: Vec<KeyBinding>,
    pub prev_brand: Vec<KeyBinding>,
    pub toggle_theme: Vec<KeyBinding>,
    pub refresh: Vec<KeyBinding>,
    pub focus_next: Vec<KeyBinding>,
    pub focus_prev: Vec<KeyBinding>,
    pub edit: Vec<KeyBinding>,
    pub back: Vec<KeyBinding>,
    /// One key per tab, in tab order.
    pub tabs: Vec<KeyBinding>,
}

impl Default for KeybindConfig {
    fn default() -> Self {
        Self {
            quit: vec![KeyBinding::char('q'), KeyBinding::ctrl('c')],
            next_tab: vec![KeyBinding::new(KeyCode::Tab)],
            prev_tab: vec![KeyBinding {
                code: KeyCode::BackTab,
                modifiers: KeyModifiers::SHIFT,
            }],
            next_brand: vec![KeyBinding::char(']')],
            prev_brand: vec![KeyBinding::char('[')],
            toggle_theme: vec![KeyBinding::char('t')],
            refresh: vec![KeyBinding::char('r')],
            focus_next: vec![KeyBinding::char('j'), KeyBinding::new(KeyCode::Down)],
            focus_prev: vec![KeyBinding::char('k'), KeyBinding::new(KeyCode::Up)],
            edit: vec![KeyBinding::new(KeyCode::Enter), KeyBinding::char('i')],
            back: vec![KeyBinding::new(KeyCode::Esc)],
            tabs: ('1'..='6').map(KeyBinding::char).collect(),
        }
    }
}

pub struct Keybinds {
    bindings: HashMap<(KeyCode, KeyModifiers), Action>,
}

impl Default for Keybinds {
    fn default() -> Self {
        Self::new()
    }
}

impl Keybinds {
    pub fn new() -> Self {
        Self::from_config(&KeybindConfig::default())
    }

    pub fn from_config(config: &KeybindConfig) -> Self {
        let mut bindings = HashMap::new();
        let groups: [(&[KeyBinding], Action); 11] = [
            (&config.quit, Action::Quit),
            (&config.next_tab, Action::NextTab),
            (&config.prev_tab, Action::PrevTab),
            (&config.next_brand, Action::NextBrand),
            (&config.prev_brand, Action::PrevBrand),
            (&config.toggle_theme, Action::ToggleTheme),
            (&config.refresh, Action::Refresh),
            (&config.focus_next, Action::FocusNext),
            (&config.focus_prev, Action::FocusPrev),
            (&config.edit, Action::Edit),
            (&config.back, Action::Back),
        ];

        for (keys, action) in groups {
            for key in keys {
                bindings.insert((key.code, key.modifiers), action);
            }
        }
        for (index, key) in config.tabs.iter().enumerate() {
            bindings.insert((key.code, key.modifiers), Action::GoToTab(index));
        }

        Self { bindings }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read keybinds from {:?}", path))?;
        let config: KeybindConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse keybinds from {:?}", path))?;
        Ok(Self::from_config(&config))
    }

    /// `<config_dir>/mkpro/keybinds.toml` when present, defaults otherwise.
    pub fn load_or_default() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::new();
        }
        Self::load_from_file(&path).unwrap_or_else(|e| {
            tracing::warn!("{:#}. Using default keybinds.", e);
            Self::new()
        })
    }

    fn config_path() -> PathBuf {
        mkpro_core::get_config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keybinds.toml")
    }

    pub fn get(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<Action> {
        self.bindings.get(&(code, modifiers)).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_bindings() {
        assert_eq!(KeyBinding::parse("q"), Some(KeyBinding::char('q')));
        assert_eq!(KeyBinding::parse("Ctrl+c"), Some(KeyBinding::ctrl('c')));
        assert_eq!(
            KeyBinding::parse("F5"),
            Some(KeyBinding::new(KeyCode::F(5)))
        );
        assert_eq!(
            KeyBinding::parse("Space"),
            Some(KeyBinding::char(' '))
        );
        assert_eq!(KeyBinding::parse("Ctrl+"), None);
        assert_eq!(KeyBinding::parse("abc"), None);
    }

    #[test]
    fn test_display_round_trips() {
        for raw in ["Ctrl+c", "]", "Tab", "F2", "Space", "Alt+x"] {
            let binding = KeyBinding::parse(raw).unwrap();
            assert_eq!(KeyBinding::parse(&binding.to_string()), Some(binding));
        }
    }

    #[test]
    fn test_defaults() {
        let keybinds = Keybinds::new();
        assert_eq!(
            keybinds.get(KeyCode::Char('['), KeyModifiers::NONE),
            Some(Action::PrevBrand)
        );
        assert_eq!(
            keybinds.get(KeyCode::Char('1'), KeyModifiers::NONE),
            Some(Action::GoToTab(0))
        );
        assert_eq!(keybinds.get(KeyCode::Char('w'), KeyModifiers::NONE), None);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keybinds.toml");
        std::fs::write(&path, "toggle_theme = [\"F9\"]\n").unwrap();

        let keybinds = Keybinds::load_from_file(&path).unwrap();
        assert_eq!(
            keybinds.get(KeyCode::F(9), KeyModifiers::NONE),
            Some(Action::ToggleTheme)
        );
        assert_eq!(keybinds.get(KeyCode::Char('t'), KeyModifiers::NONE), None);
        assert_eq!(
            keybinds.get(KeyCode::Char('q'), KeyModifiers::NONE),
            Some(Action::Quit)
        );
    }

    #[test]
    fn test_bad_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keybinds.toml");
        std::fs::write(&path, "quit = [\"NotAKey\"]\n").unwrap();
        assert!(Keybinds::load_from_file(&path).is_err());
    }
}
