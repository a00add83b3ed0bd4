use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::App;
use crate::forms::Field;
use crate::ui::utils::{field_lines, panel, preview};

pub struct LeadsView;

impl LeadsView {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(5)])
            .split(area);

        let intake = Paragraph::new(field_lines(app, &[Field::LeadText, Field::PageSize]))
            .block(panel("Incoming message (s score)", theme))
            .wrap(Wrap { trim: false });
        frame.render_widget(intake, rows[0]);

        let header = Row::new(vec!["ID", "Name", "Channel", "Status", "Score", "Notes"]).style(
            Style::default()
                .fg(theme.foreground_dim())
                .add_modifier(Modifier::BOLD),
        );

        let table_rows: Vec<Row> = app
            .leads
            .leads
            .iter()
            .map(|lead| {
                let score_style = match lead.score {
                    Some(s) if s >= 70.0 => Style::default().fg(theme.success()),
                    Some(s) if s >= 40.0 => Style::default().fg(theme.warning()),
                    Some(_) => Style::default().fg(theme.error()),
                    None => Style::default().fg(theme.foreground_dim()),
                };
                Row::new(vec![
                    Cell::from(lead.id.map(|id| id.to_string()).unwrap_or_default()),
                    Cell::from(lead.name.clone().unwrap_or_default()),
                    Cell::from(lead.channel.clone().unwrap_or_default()),
                    Cell::from(lead.status.clone().unwrap_or_default()),
                    Cell::from(
                        lead.score
                            .map(|s| format!("{:.0}", s))
                            .unwrap_or_else(|| "-".to_string()),
                    )
                    .style(score_style),
                    Cell::from(preview(&lead.notes_text(), 60)),
                ])
                .style(Style::default().fg(theme.foreground()))
            })
            .collect();

        let table = Table::new(
            table_rows,
            [
                Constraint::Length(6),
                Constraint::Percentage(18),
                Constraint::Length(10),
                Constraint::Length(10),
                Constraint::Length(6),
                Constraint::Min(20),
            ],
        )
        .header(header)
        .block(panel(
            format!(
                "Leads · page {} · {} per page (n/p · l reload)",
                app.leads.page, app.leads.page_size
            ),
            theme,
        ));
        frame.render_widget(table, rows[1]);
    }
}
