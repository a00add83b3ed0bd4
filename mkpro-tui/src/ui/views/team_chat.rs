use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use mkpro_core::ChatAgent;

use crate::app::App;
use crate::forms::Field;
use crate::ui::layout::MainLayout;
use crate::ui::utils::{fact_line, field_lines, panel, preview};

pub struct TeamChatView;

impl TeamChatView {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let columns = MainLayout::create_two_column_layout(area, 72);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(3)])
            .split(columns[0]);

        Self::render_thread(frame, left[0], app);

        let composer = Paragraph::new(field_lines(app, &[Field::ChatText]))
            .block(panel("Message", app.current_theme()));
        frame.render_widget(composer, left[1]);

        Self::render_agents(frame, columns[1], app);
    }

    fn render_thread(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();
        let chat = &app.chat;

        let mut lines: Vec<Line> = Vec::new();
        if app.ctx.selected.is_none() {
            lines.push(Line::from(Span::styled(
                "Select a brand with [ or ] to load its thread.",
                Style::default().fg(theme.foreground_dim()),
            )));
        } else if chat.messages.is_empty() {
            lines.push(Line::from(Span::styled(
                "No messages yet.",
                Style::default().fg(theme.foreground_dim()),
            )));
        }

        for message in &chat.messages {
            let author_style = if message.sender == "user" {
                Style::default().fg(theme.accent())
            } else {
                Style::default().fg(theme.accent_secondary())
            };
            lines.push(Line::from(Span::styled(
                message.author(),
                author_style.add_modifier(Modifier::BOLD),
            )));
            for text in message.text.lines() {
                lines.push(Line::from(Span::styled(
                    format!("  {}", text),
                    Style::default().fg(theme.foreground()),
                )));
            }
            lines.push(Line::default());
        }

        // Keep the newest messages in view.
        let visible = area.height.saturating_sub(2) as usize;
        let scroll = lines.len().saturating_sub(visible) as u16;

        let title = match chat.thread_id {
            Some(id) => format!("Thread #{}", id),
            None => "Thread".to_string(),
        };
        let thread = Paragraph::new(lines)
            .block(panel(title, theme))
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0));
        frame.render_widget(thread, area);
    }

    fn render_agents(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();

        let mut lines: Vec<Line> = ChatAgent::all()
            .iter()
            .map(|agent| {
                if *agent == app.chat.agent {
                    Line::from(Span::styled(
                        format!("● {}", agent.label()),
                        Style::default()
                            .fg(theme.accent())
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(Span::styled(
                        format!("○ {}", agent.label()),
                        Style::default().fg(theme.foreground_dim()),
                    ))
                }
            })
            .collect();

        lines.push(Line::default());
        lines.push(fact_line("Messages", app.chat.messages.len().to_string(), theme));
        if !app.chat.context.is_empty() {
            lines.push(fact_line("Context", preview(&app.chat.context, 40), theme));
        }

        let agents = Paragraph::new(lines)
            .block(panel("Agent (a)", theme))
            .wrap(Wrap { trim: true });
        frame.render_widget(agents, area);
    }
}
