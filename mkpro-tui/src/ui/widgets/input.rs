use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::theme::Theme;

/// What a key did to the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    Edited,
    Submit,
    Cancel,
    Ignored,
}

/// Single-field editor. The cursor counts characters, not bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    label: String,
    value: String,
    cursor: usize,
    multiline: bool,
    masked: bool,
}

impl TextInput {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        let cursor = value.chars().count();
        Self {
            label: label.into(),
            value,
            cursor,
            multiline: false,
            masked: false,
        }
    }

    /// Alt+Enter inserts a newline instead of submitting.
    pub fn multiline(mut self) -> Self {
        self.multiline = true;
        self
    }

    /// Render every character as a dot.
    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn into_value(self) -> String {
        self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn byte_index(&self, chars: usize) -> usize {
        self.value
            .char_indices()
            .nth(chars)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.value.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.value.chars().count() {
            let at = self.byte_index(self.cursor);
            self.value.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.value.chars().count());
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> InputOutcome {
        match code {
            KeyCode::Enter if self.multiline && modifiers.contains(KeyModifiers::ALT) => {
                self.insert('\n');
                InputOutcome::Edited
            }
            KeyCode::Enter => InputOutcome::Submit,
            KeyCode::Esc => InputOutcome::Cancel,
            KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.clear();
                InputOutcome::Edited
            }
            KeyCode::Char(c) => {
                self.insert(c);
                InputOutcome::Edited
            }
            KeyCode::Backspace => {
                self.backspace();
                InputOutcome::Edited
            }
            KeyCode::Delete => {
                self.delete();
                InputOutcome::Edited
            }
            KeyCode::Left => {
                self.move_left();
                InputOutcome::Edited
            }
            KeyCode::Right => {
                self.move_right();
                InputOutcome::Edited
            }
            KeyCode::Home => {
                self.cursor = 0;
                InputOutcome::Edited
            }
            KeyCode::End => {
                self.cursor = self.value.chars().count();
                InputOutcome::Edited
            }
            _ => InputOutcome::Ignored,
        }
    }

    /// Draw as a popup over the bottom of `screen`.
    pub fn render(&self, frame: &mut Frame, screen: Rect, theme: &dyn Theme) {
        let height = if self.multiline { 8 } else { 3 };
        let width = screen.width.saturating_sub(8).max(10);
        let area = Rect::new(
            (screen.width.saturating_sub(width)) / 2,
            screen.height.saturating_sub(height + 4),
            width,
            height.min(screen.height),
        );
        frame.render_widget(Clear, area);

        let hint = if self.multiline {
            " Enter save · Alt+Enter newline · Esc cancel "
        } else {
            " Enter save · Esc cancel "
        };
        let block = Block::default()
            .title(format!(" {} ", self.label))
            .title_bottom(Line::from(hint).right_aligned())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.accent()))
            .style(Style::default().bg(theme.surface()));

        let shown = if self.masked {
            "•".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        };
        let split = shown
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(shown.len());
        let (before, after) = shown.split_at(split);
        let mut after_chars = after.chars();
        let under_cursor = after_chars.next().map(String::from).unwrap_or_else(|| " ".into());
        let rest: String = after_chars.collect();

        let line = Line::from(vec![
            Span::styled(before.to_string(), Style::default().fg(theme.foreground())),
            Span::styled(
                under_cursor,
                Style::default()
                    .fg(theme.background())
                    .bg(theme.accent())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(rest, Style::default().fg(theme.foreground())),
        ]);

        frame.render_widget(
            Paragraph::new(line).block(block).wrap(Wrap { trim: false }),
            area,
        );
    }
}
