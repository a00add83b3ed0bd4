use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use mkpro_core::{SessionState, WhatsAppSession};

use crate::app::App;
use crate::forms::Field;
use crate::theme::Theme;
use crate::ui::layout::MainLayout;
use crate::ui::utils::{fact_line, field_lines, panel};

pub struct ChannelsView;

impl ChannelsView {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(10), Constraint::Length(7)])
            .split(area);

        let lines = Self::session_lines(&app.channels, theme);
        let whatsapp = Paragraph::new(lines)
            .block(panel("WhatsApp (w connect · p poll again · x stop)", theme))
            .wrap(Wrap { trim: false });
        frame.render_widget(whatsapp, rows[0]);

        let social = MainLayout::create_two_column_layout(rows[1], 50);
        let facebook = Paragraph::new(field_lines(
            app,
            &[Field::FacebookMessage, Field::FacebookImage],
        ))
        .block(panel("Facebook (f)", theme));
        frame.render_widget(facebook, social[0]);

        let instagram = Paragraph::new(field_lines(
            app,
            &[Field::InstagramCaption, Field::InstagramImage],
        ))
        .block(panel("Instagram (g)", theme));
        frame.render_widget(instagram, social[1]);
    }

    /// Connection state, counters and the code to scan. Shared with the
    /// admin view.
    pub fn session_lines(session: &WhatsAppSession, theme: &dyn Theme) -> Vec<Line<'static>> {
        let mut lines = vec![Line::from(vec![
            Span::styled("  ● ", Style::default().fg(theme.session_color(&session.state))),
            Span::styled(
                session.state.to_string(),
                Style::default()
                    .fg(theme.foreground())
                    .add_modifier(Modifier::BOLD),
            ),
        ])];

        if session.state != SessionState::Idle {
            lines.push(fact_line("Status", session.status_text(), theme));
            lines.push(fact_line("Polls", session.polls.to_string(), theme));
        }
        if let Some(outcome) = session.last_outcome {
            lines.push(fact_line("Last run", outcome.describe(), theme));
        }
        if let Some(error) = &session.last_error {
            lines.push(Line::from(Span::styled(
                format!("  {}", error),
                Style::default().fg(theme.error()),
            )));
        }

        if session.status.connected {
            return lines;
        }
        if let Some(display) = session.code_display() {
            lines.push(Line::default());
            lines.push(fact_line("Source", display.source.label(), theme));
            if let Some(code) = &display.code {
                lines.push(Line::from(vec![
                    Span::styled("  Code: ", Style::default().fg(theme.foreground_dim())),
                    Span::styled(
                        code.clone(),
                        Style::default()
                            .fg(theme.accent())
                            .add_modifier(Modifier::BOLD),
                    ),
                ]));
            }
            if display.image.starts_with("data:") {
                lines.push(fact_line(
                    "QR",
                    "image received (open the web console to scan it)",
                    theme,
                ));
            } else {
                lines.push(fact_line("QR", display.image, theme));
            }
        }
        lines
    }
}
