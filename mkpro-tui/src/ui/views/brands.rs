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
use crate::ui::utils::{field_lines, panel};

pub struct BrandsView;

impl BrandsView {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let columns = MainLayout::create_two_column_layout(area, 45);
        Self::render_list(frame, columns[0], app);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(5)])
            .split(columns[1]);
        let theme = app.current_theme();

        let new_brand = Paragraph::new(field_lines(app, &[Field::BrandName, Field::BrandTone]))
            .block(panel("New brand (c)", theme));
        frame.render_widget(new_brand, right[0]);

        let mut context = field_lines(app, &[Field::BrandContext]);
        context.push(Line::default());
        context.extend(app.brands.context.lines().map(|line| {
            Line::from(Span::styled(
                line.to_string(),
                Style::default().fg(theme.foreground()),
            ))
        }));
        let context = Paragraph::new(context)
            .block(panel(
                format!("Context of {} (s)", app.ctx.selected_label()),
                theme,
            ))
            .wrap(Wrap { trim: false });
        frame.render_widget(context, right[1]);
    }

    fn render_list(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();

        if let Some(error) = &app.shell.brands_error {
            let message = Paragraph::new(Line::from(Span::styled(
                format!("Could not load brands: {}", error),
                Style::default().fg(theme.error()),
            )))
            .block(panel("Brands", theme))
            .wrap(Wrap { trim: true });
            frame.render_widget(message, area);
            return;
        }

        let header = Row::new(vec!["", "ID", "Name", "Tone"]).style(
            Style::default()
                .fg(theme.foreground_dim())
                .add_modifier(Modifier::BOLD),
        );

        let rows: Vec<Row> = app
            .ctx
            .brands
            .iter()
            .map(|brand| {
                let selected = app.ctx.selected == Some(brand.id);
                let style = if selected {
                    Style::default()
                        .fg(theme.accent())
                        .bg(theme.selection())
                } else {
                    Style::default().fg(theme.foreground())
                };
                Row::new(vec![
                    Cell::from(if selected { "●" } else { " " }),
                    Cell::from(brand.id.to_string()),
                    Cell::from(brand.display_name()),
                    Cell::from(brand.tone.clone().unwrap_or_default()),
                ])
                .style(style)
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(2),
                Constraint::Length(6),
                Constraint::Percentage(45),
                Constraint::Percentage(45),
            ],
        )
        .header(header)
        .block(panel(
            format!("Brands ({})  [ ] to switch", app.ctx.brands.len()),
            theme,
        ));
        frame.render_widget(table, area);
    }
}
