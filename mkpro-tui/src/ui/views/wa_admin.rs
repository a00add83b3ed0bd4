use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::App;
use crate::forms::Field;
use crate::ui::layout::MainLayout;
use crate::ui::utils::{fact_line, field_lines, on_off, panel};
use crate::ui::views::ChannelsView;

pub struct WaAdminView;

impl WaAdminView {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();

        if app.ctx.selected.is_none() {
            let hint = Paragraph::new("Select a brand with [ or ] first.")
                .style(Style::default().fg(theme.foreground_dim()))
                .block(panel("WhatsApp Admin", theme));
            frame.render_widget(hint, area);
            return;
        }

        let columns = MainLayout::create_three_column_layout(area);
        Self::render_config(frame, columns[0], app);
        Self::render_instance(frame, columns[1], app);
        Self::render_datasources(frame, columns[2], app);
    }

    fn render_config(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();
        let admin = &app.wa_admin;
        let draft = &admin.draft;

        let mut lines = vec![
            fact_line("Mode (m)", draft.agent_mode.to_string(), theme),
            fact_line("Admin (e)", on_off(draft.super_enabled), theme),
            fact_line(
                "Password",
                if admin.config.has_password {
                    "set"
                } else {
                    "not set"
                },
                theme,
            ),
        ];
        lines.extend(field_lines(
            app,
            &[
                Field::ModelName,
                Field::Temperature,
                Field::RulesMd,
                Field::RulesJson,
                Field::SuperKeyword,
                Field::SuperAllowList,
            ],
        ));
        lines.push(Line::default());
        lines.extend(field_lines(
            app,
            &[
                Field::PasswordCurrent,
                Field::PasswordNew,
                Field::PasswordConfirm,
            ],
        ));
        if !admin.loaded {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                "  Not loaded. Press r to reload.",
                Style::default().fg(theme.warning()),
            )));
        }

        let config = Paragraph::new(lines)
            .block(panel("Agent config (s save · P password)", theme))
            .wrap(Wrap { trim: false });
        frame.render_widget(config, area);
    }

    fn render_instance(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();
        let admin = &app.wa_admin;

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(10),
                Constraint::Length(4),
                Constraint::Min(4),
            ])
            .split(area);

        let mut lines = ChannelsView::session_lines(&admin.session, theme);
        if let Some(instance) = &admin.config.instance_name {
            lines.push(fact_line("Instance", instance.clone(), theme));
        }
        if let Some(webhook) = &admin.config.webhook_example {
            lines.push(fact_line("Webhook", webhook.clone(), theme));
        }
        let session = Paragraph::new(lines)
            .block(panel("Instance (w · x · h · y · R · S)", theme))
            .wrap(Wrap { trim: false });
        frame.render_widget(session, rows[0]);

        let test = Paragraph::new(field_lines(app, &[Field::TestTo, Field::TestText]))
            .block(panel("Test message (T)", theme));
        frame.render_widget(test, rows[1]);

        let log_lines: Vec<Line> = admin
            .log
            .entries()
            .map(|entry| {
                Line::from(Span::styled(
                    entry.clone(),
                    Style::default().fg(theme.foreground_dim()),
                ))
            })
            .collect();
        let log = Paragraph::new(log_lines)
            .block(panel(format!("Activity ({})", admin.log.len()), theme))
            .wrap(Wrap { trim: true });
        frame.render_widget(log, rows[2]);
    }

    fn render_datasources(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();
        let admin = &app.wa_admin;

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(9)])
            .split(area);

        let header = Row::new(vec!["Name", "Kind", "On", "RO"]).style(
            Style::default()
                .fg(theme.foreground_dim())
                .add_modifier(Modifier::BOLD),
        );
        let table_rows: Vec<Row> = admin
            .datasources
            .iter()
            .enumerate()
            .map(|(i, ds)| {
                let style = if i == app.ds_selected {
                    Style::default().fg(theme.accent()).bg(theme.selection())
                } else {
                    Style::default().fg(theme.foreground())
                };
                Row::new(vec![
                    Cell::from(ds.name.clone()),
                    Cell::from(ds.kind.to_string()),
                    Cell::from(on_off(ds.enabled)),
                    Cell::from(on_off(ds.read_only)),
                ])
                .style(style)
            })
            .collect();
        let table = Table::new(
            table_rows,
            [
                Constraint::Percentage(45),
                Constraint::Percentage(25),
                Constraint::Length(4),
                Constraint::Length(4),
            ],
        )
        .header(header)
        .block(panel("Datasources (< > select · E edit · D delete)", theme));
        frame.render_widget(table, rows[0]);

        let ds = &admin.ds_draft;
        let mut lines = vec![
            fact_line(
                "Editing",
                ds.id.map(|id| format!("#{}", id))
                    .unwrap_or_else(|| "new".to_string()),
                theme,
            ),
            fact_line("Kind (K)", ds.kind.to_string(), theme),
            fact_line(
                "Flags",
                format!(
                    "enabled {} (o) · read only {} (O)",
                    on_off(ds.enabled),
                    on_off(ds.read_only)
                ),
                theme,
            ),
        ];
        lines.extend(field_lines(
            app,
            &[Field::DsName, Field::DsUrl, Field::DsHeaders],
        ));
        let draft = Paragraph::new(lines)
            .block(panel("Draft (n new · u save · v test)", theme))
            .wrap(Wrap { trim: false });
        frame.render_widget(draft, rows[1]);
    }
}
