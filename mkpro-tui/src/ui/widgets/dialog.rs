use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogButton {
    Confirm,
    Cancel,
}

impl DialogButton {
    pub fn other(&self) -> Self {
        match self {
            DialogButton::Confirm => DialogButton::Cancel,
            DialogButton::Cancel => DialogButton::Confirm,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    /// Yes/no question.
    Confirmation,
    /// Yes/no question about something that cannot be undone.
    Danger,
    /// A single OK button, for errors that block the current action.
    Alert,
}

impl DialogKind {
    pub fn icon(&self) -> &'static str {
        match self {
            DialogKind::Confirmation => "?",
            DialogKind::Danger => "⚠",
            DialogKind::Alert => "✗",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfirmDialog {
    title: String,
    message: String,
    kind: DialogKind,
    selected: DialogButton,
    confirm_label: String,
}

impl ConfirmDialog {
    pub fn confirmation(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind: DialogKind::Confirmation,
            selected: DialogButton::Cancel,
            confirm_label: "Confirm".to_string(),
        }
    }

    /// Starts on Cancel so Enter does not destroy anything.
    pub fn danger(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: DialogKind::Danger,
            confirm_label: "Delete".to_string(),
            ..Self::confirmation(title, message)
        }
    }

    pub fn alert(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: DialogKind::Alert,
            selected: DialogButton::Confirm,
            confirm_label: "OK".to_string(),
            ..Self::confirmation(title, message)
        }
    }

    pub fn with_confirm_label(mut self, label: impl Into<String>) -> Self {
        self.confirm_label = label.into();
        self
    }

    pub fn kind(&self) -> DialogKind {
        self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn selected(&self) -> DialogButton {
        self.selected
    }

    pub fn toggle_selection(&mut self) {
        if self.kind != DialogKind::Alert {
            self.selected = self.selected.other();
        }
    }

    pub fn calculate_area(&self, screen: Rect) -> Rect {
        let width = 56u16.min(screen.width.saturating_sub(4));
        let height = 9u16.min(screen.height.saturating_sub(2));
        Rect::new(
            screen.width.saturating_sub(width) / 2,
            screen.height.saturating_sub(height) / 2,
            width,
            height,
        )
    }

    pub fn render(&self, frame: &mut Frame, screen: Rect, theme: &dyn Theme) {
        let area = self.calculate_area(screen);
        frame.render_widget(Clear, area);

        let border = match self.kind {
            DialogKind::Confirmation => theme.accent(),
            DialogKind::Danger | DialogKind::Alert => theme.error(),
        };

        let block = Block::default()
            .title(format!(" {} {} ", self.kind.icon(), self.title))
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border).add_modifier(Modifier::BOLD))
            .style(Style::default().bg(theme.surface()));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(2), Constraint::Length(1)])
            .split(inner);

        frame.render_widget(
            Paragraph::new(self.message.as_str())
                .style(Style::default().fg(theme.foreground()))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            chunks[0],
        );

        let highlighted = |on: bool, color| {
            if on {
                Style::default()
                    .fg(theme.background())
                    .bg(color)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(color)
            }
        };

        let confirm = Span::styled(
            format!(" {} ", self.confirm_label),
            highlighted(self.selected == DialogButton::Confirm, border),
        );

        let buttons = if self.kind == DialogKind::Alert {
            Line::from(confirm)
        } else {
            Line::from(vec![
                Span::styled(
                    " Cancel ",
                    highlighted(
                        self.selected == DialogButton::Cancel,
                        theme.foreground_dim(),
                    ),
                ),
                Span::raw("    "),
                confirm,
            ])
        };
        frame.render_widget(
            Paragraph::new(buttons).alignment(Alignment::Center),
            chunks[1],
        );
    }
}

/// The open dialog plus the action to run if the user confirms it.
#[derive(Debug)]
pub struct DialogState<A> {
    dialog: Option<ConfirmDialog>,
    pending: Option<A>,
}

impl<A> Default for DialogState<A> {
    fn default() -> Self {
        Self {
            dialog: None,
            pending: None,
        }
    }
}

impl<A> DialogState<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ask(&mut self, dialog: ConfirmDialog, action: A) {
        self.dialog = Some(dialog);
        self.pending = Some(action);
    }

    /// An alert replaces whatever was open and carries no action.
    pub fn alert(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.dialog = Some(ConfirmDialog::alert(title, message));
        self.pending = None;
    }

    pub fn dialog(&self) -> Option<&ConfirmDialog> {
        self.dialog.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.dialog.is_some()
    }

    pub fn toggle_selection(&mut self) {
        if let Some(dialog) = self.dialog.as_mut() {
            dialog.toggle_selection();
        }
    }

    /// Close and hand back the action if it was confirmed.
    pub fn confirm(&mut self) -> Option<A> {
        self.dialog = None;
        self.pending.take()
    }

    pub fn cancel(&mut self) {
        self.dialog = None;
        self.pending = None;
    }

    /// Enter: act on whichever button is selected.
    pub fn submit(&mut self) -> Option<A> {
        match self.dialog.as_ref().map(|d| d.selected()) {
            Some(DialogButton::Confirm) => self.confirm(),
            _ => {
                self.cancel();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_danger_defaults_to_cancel() {
        let dialog = ConfirmDialog::danger("Delete datasource", "Delete 'Stock'?");
        assert_eq!(dialog.kind(), DialogKind::Danger);
        assert_eq!(dialog.selected(), DialogButton::Cancel);
    }

    #[test]
    fn test_alert_cannot_toggle() {
        let mut dialog = ConfirmDialog::alert("Error", "timeout");
        dialog.toggle_selection();
        assert_eq!(dialog.selected(), DialogButton::Confirm);
    }

    #[test]
    fn test_submit_follows_selection() {
        let mut state: DialogState<i64> = DialogState::new();
        state.ask(ConfirmDialog::danger("Delete", "sure?"), 7);
        assert_eq!(state.submit(), None);
        assert!(!state.is_open());

        state.ask(ConfirmDialog::danger("Delete", "sure?"), 7);
        state.toggle_selection();
        assert_eq!(state.submit(), Some(7));
    }

    #[test]
    fn test_alert_drops_pending_action() {
        let mut state: DialogState<i64> = DialogState::new();
        state.ask(ConfirmDialog::confirmation("Delete", "sure?"), 3);
        state.alert("Error", "HTTP 500");

        assert!(state.is_open());
        assert_eq!(state.confirm(), None);
    }

    #[test]
    fn test_area_fits_screen() {
        let dialog = ConfirmDialog::alert("Error", "x");
        let screen = Rect::new(0, 0, 100, 40);
        let area = dialog.calculate_area(screen);
        assert!(area.x + area.width <= screen.width);
        assert!(area.y + area.height <= screen.height);
    }
}
