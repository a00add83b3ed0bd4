use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders},
};

use crate::app::App;
use crate::forms::{mask, Field};
use crate::theme::Theme;

/// Longest value shown inline before it is cut with `…`.
const PREVIEW_CHARS: usize = 60;

pub fn panel<'a>(title: impl Into<String>, theme: &dyn Theme) -> Block<'a> {
    Block::default()
        .title(format!(" {} ", title.into()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border()))
        .style(Style::default().bg(theme.background()))
}

/// First line of `value`, cut to `max` characters.
pub fn preview(value: &str, max: usize) -> String {
    let first = value.lines().next().unwrap_or("");
    let more = first.chars().count() > max || value.lines().nth(1).is_some();
    let mut shown: String = first.chars().take(max).collect();
    if more {
        shown.push('…');
    }
    shown
}

/// `label: value` with the focused field marked.
pub fn field_line(app: &App, field: Field) -> Line<'static> {
    let theme = app.current_theme();
    let focused = app.focused_field() == Some(field);
    let value = app.field_value(field);
    let shown = if field.is_secret() {
        mask(&value)
    } else {
        preview(&value, PREVIEW_CHARS)
    };

    let marker_style = Style::default().fg(theme.accent());
    let label_style = if focused {
        Style::default()
            .fg(theme.accent())
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.foreground_dim())
    };
    let value_style = if focused {
        Style::default().fg(theme.foreground()).bg(theme.selection())
    } else {
        Style::default().fg(theme.foreground())
    };

    Line::from(vec![
        Span::styled(if focused { "▸ " } else { "  " }, marker_style),
        Span::styled(format!("{}: ", field.label()), label_style),
        Span::styled(
            if shown.is_empty() { "—".to_string() } else { shown },
            value_style,
        ),
    ])
}

pub fn field_lines(app: &App, fields: &[Field]) -> Vec<Line<'static>> {
    fields.iter().map(|f| field_line(app, *f)).collect()
}

/// `label: value` for read-only facts.
pub fn fact_line(label: &str, value: impl Into<String>, theme: &dyn Theme) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("  {}: ", label),
            Style::default().fg(theme.foreground_dim()),
        ),
        Span::styled(value.into(), Style::default().fg(theme.foreground())),
    ])
}

pub fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_cuts_long_and_multiline_values() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("abcdef", 3), "abc…");
        assert_eq!(preview("one\ntwo", 10), "one…");
        assert_eq!(preview("", 10), "");
    }
}
