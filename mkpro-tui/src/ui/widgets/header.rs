use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use mkpro_core::Tab;

use crate::app::App;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct Header;

impl Header {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(26),
                Constraint::Min(20),
                Constraint::Length(36),
            ])
            .split(area);

        let logo = Paragraph::new(Line::from(vec![
            Span::styled("◆ ", Style::default().fg(theme.accent())),
            Span::styled(
                "Marketing PRO ",
                Style::default()
                    .fg(theme.foreground())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("v{}", VERSION),
                Style::default().fg(theme.foreground_dim()),
            ),
        ]))
        .block(Block::default().borders(Borders::NONE))
        .style(Style::default().bg(theme.background()));
        frame.render_widget(logo, chunks[0]);

        let active = app.active_tab();
        let tab_titles: Vec<Line> = Tab::all()
            .iter()
            .enumerate()
            .map(|(i, tab)| {
                let style = if *tab == active {
                    Style::default()
                        .fg(theme.accent())
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(theme.foreground_dim())
                };
                Line::from(Span::styled(format!("{} {}", i + 1, tab.title()), style))
            })
            .collect();

        let tabs = Tabs::new(tab_titles)
            .block(Block::default().borders(Borders::NONE))
            .style(Style::default().bg(theme.background()))
            .highlight_style(Style::default().fg(theme.accent()))
            .select(active.index())
            .divider(Span::raw(" │ "));
        frame.render_widget(tabs, chunks[1]);

        let health = &app.shell.health;
        let status = Paragraph::new(Line::from(vec![
            Span::styled(
                app.ctx.selected_label(),
                Style::default().fg(theme.accent_secondary()),
            ),
            Span::raw("  "),
            Span::styled("● ", Style::default().fg(theme.health_color(health))),
            Span::styled(
                health.label().to_string(),
                Style::default().fg(theme.foreground_dim()),
            ),
            Span::raw("  "),
            Span::styled(
                chrono::Local::now().format("%H:%M").to_string(),
                Style::default().fg(theme.foreground_dim()),
            ),
        ]))
        .alignment(Alignment::Right)
        .block(Block::default().borders(Borders::NONE))
        .style(Style::default().bg(theme.background()));
        frame.render_widget(status, chunks[2]);
    }
}
