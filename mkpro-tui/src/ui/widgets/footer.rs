use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use mkpro_core::Tab;

use crate::app::App;

const GLOBAL_KEYS: &[(&str, &str)] = &[
    ("q", "Quit"),
    ("Tab", "View"),
    ("[/]", "Brand"),
    ("j/k", "Field"),
    ("Enter", "Edit"),
    ("r", "Reload"),
    ("t", "Theme"),
];

pub struct Footer;

impl Footer {
    /// Keys for the active tab, shown before the global ones.
    pub fn view_keys(tab: Tab) -> &'static [(&'static str, &'static str)] {
        match tab {
            Tab::TeamChat => &[("a", "Agent"), ("s", "Send")],
            Tab::Brands => &[("c", "Create"), ("s", "Save context")],
            Tab::Channels => &[
                ("w", "Connect"),
                ("p", "Poll"),
                ("x", "Stop"),
                ("f", "Facebook"),
                ("g", "Instagram"),
            ],
            Tab::WaAdmin => &[
                ("s", "Save"),
                ("m", "Mode"),
                ("P", "Password"),
                ("w", "Connect"),
                ("T", "Test"),
                ("h", "Webhook"),
                ("y", "Sync"),
                ("R", "Rotate"),
                ("n/u/D/v", "Datasource"),
            ],
            Tab::Leads => &[("s", "Score"), ("l", "List"), ("n/p", "Page")],
            Tab::WaInbox => &[
                ("h/l J/K", "Move"),
                ("o", "Open"),
                ("</>", "Drop"),
                ("Space", "Mark"),
                ("B", "Bulk"),
                ("g", "Group"),
                ("s", "Save"),
                ("R", "Reply"),
            ],
        }
    }

    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(area);

        let keybind_spans: Vec<Span> = Self::view_keys(app.active_tab())
            .iter()
            .chain(GLOBAL_KEYS.iter())
            .flat_map(|(key, desc)| {
                vec![
                    Span::styled(
                        format!(" {key}"),
                        Style::default()
                            .fg(theme.accent())
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!(":{desc} "),
                        Style::default().fg(theme.foreground_dim()),
                    ),
                ]
            })
            .collect();

        let keybinds_widget = Paragraph::new(Line::from(keybind_spans))
            .block(Block::default().borders(Borders::NONE))
            .style(Style::default().bg(theme.surface()));
        frame.render_widget(keybinds_widget, chunks[0]);

        let status = match app.busy {
            Some(label) => Span::styled(
                format!("{}…", label),
                Style::default().fg(theme.warning()),
            ),
            None => Span::styled(
                app.status_message.as_deref().unwrap_or("Ready").to_string(),
                Style::default().fg(theme.foreground_dim()),
            ),
        };
        let status_widget = Paragraph::new(Line::from(status))
            .alignment(Alignment::Right)
            .block(Block::default().borders(Borders::NONE))
            .style(Style::default().bg(theme.surface()));
        frame.render_widget(status_widget, chunks[1]);
    }
}
