use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::keybinds::Keybinds;

/// Keys that mean the same thing on every tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    NextTab,
    PrevTab,
    GoToTab(usize),
    NextBrand,
    PrevBrand,
    ToggleTheme,
    Refresh,
    FocusNext,
    FocusPrev,
    Edit,
    Back,
}

impl Action {
    pub fn describe(&self) -> &'static str {
        match self {
            Action::Quit => "Quit",
            Action::NextTab => "Next tab",
            Action::PrevTab => "Previous tab",
            Action::GoToTab(_) => "Go to tab",
            Action::NextBrand => "Next brand",
            Action::PrevBrand => "Previous brand",
            Action::ToggleTheme => "Theme",
            Action::Refresh => "Reload",
            Action::FocusNext => "Next field",
            Action::FocusPrev => "Previous field",
            Action::Edit => "Edit field",
            Action::Back => "Back",
        }
    }
}

/// How a key press is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRoute {
    Global(Action),
    /// Not bound globally; the active view decides.
    View(KeyCode),
    Ignore,
}

pub fn route_key(keybinds: &Keybinds, key: KeyEvent) -> KeyRoute {
    if key.kind != KeyEventKind::Press {
        return KeyRoute::Ignore;
    }

    if let Some(action) = keybinds.get(key.code, key.modifiers) {
        return KeyRoute::Global(action);
    }

    // Shifted letters arrive as uppercase chars; views match on the char alone.
    let plain = key.modifiers - KeyModifiers::SHIFT;
    if plain.is_empty() {
        KeyRoute::View(key.code)
    } else {
        KeyRoute::Ignore
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_global_keys() {
        let keybinds = Keybinds::new();
        assert_eq!(
            route_key(&keybinds, press(KeyCode::Char('q'), KeyModifiers::NONE)),
            KeyRoute::Global(Action::Quit)
        );
        assert_eq!(
            route_key(&keybinds, press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            KeyRoute::Global(Action::Quit)
        );
        assert_eq!(
            route_key(&keybinds, press(KeyCode::Char(']'), KeyModifiers::NONE)),
            KeyRoute::Global(Action::NextBrand)
        );
        assert_eq!(
            route_key(&keybinds, press(KeyCode::Char('4'), KeyModifiers::NONE)),
            KeyRoute::Global(Action::GoToTab(3))
        );
    }

    #[test]
    fn test_view_keys_pass_through() {
        let keybinds = Keybinds::new();
        assert_eq!(
            route_key(&keybinds, press(KeyCode::Char('w'), KeyModifiers::NONE)),
            KeyRoute::View(KeyCode::Char('w'))
        );
        assert_eq!(
            route_key(&keybinds, press(KeyCode::Char('R'), KeyModifiers::SHIFT)),
            KeyRoute::View(KeyCode::Char('R'))
        );
        assert_eq!(
            route_key(&keybinds, press(KeyCode::Char('x'), KeyModifiers::CONTROL)),
            KeyRoute::Ignore
        );
    }

    #[test]
    fn test_release_is_ignored() {
        let keybinds = Keybinds::new();
        let mut key = press(KeyCode::Char('q'), KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;
        assert_eq!(route_key(&keybinds, key), KeyRoute::Ignore);
    }
}
