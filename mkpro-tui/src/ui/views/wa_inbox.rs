use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use mkpro_core::{BoardColumn, ChatMetaForm};

use crate::app::App;
use crate::forms::Field;
use crate::ui::layout::MainLayout;
use crate::ui::utils::{fact_line, field_lines, on_off, panel, preview};

const PRIORITY_LABELS: [&str; 4] = ["P0", "P1", "P2", "P3"];
const INTEREST_LABELS: [&str; 4] = ["unknown", "cold", "warm", "hot"];

pub struct WaInboxView;

impl WaInboxView {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(8)])
            .split(area);

        let query = &app.inbox.query;
        let mut toolbar = field_lines(app, &[Field::Search]);
        if let Some(line) = toolbar.first_mut() {
            line.spans.push(Span::styled(
                format!(
                    "   group: {} (g) · archived: {} (a) · marked: {}",
                    query.group_by,
                    on_off(query.show_archived),
                    app.marked.len()
                ),
                Style::default().fg(theme.foreground_dim()),
            ));
        }
        frame.render_widget(
            Paragraph::new(toolbar).block(panel(
                format!("Board · {} chats", app.inbox.board.card_count()),
                theme,
            )),
            rows[0],
        );

        match &app.inbox.meta_form {
            Some(form) => {
                let columns = MainLayout::create_two_column_layout(rows[1], 58);
                Self::render_board(frame, columns[0], app);
                Self::render_chat(frame, columns[1], app, form);
            }
            None => Self::render_board(frame, rows[1], app),
        }
    }

    fn render_board(frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.current_theme();
        let columns = &app.inbox.board.columns;

        if columns.is_empty() {
            let hint = if app.ctx.selected.is_none() {
                "Select a brand with [ or ] first."
            } else {
                "No chats. Press r to reload."
            };
            frame.render_widget(
                Paragraph::new(hint)
                    .style(Style::default().fg(theme.foreground_dim()))
                    .block(panel("Columns", theme)),
                area,
            );
            return;
        }

        let constraints: Vec<Constraint> = columns
            .iter()
            .map(|_| Constraint::Ratio(1, columns.len() as u32))
            .collect();
        let areas = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(area);

        for (index, (column, column_area)) in columns.iter().zip(areas.iter()).enumerate() {
            Self::render_column(frame, *column_area, app, index, column);
        }
    }

    fn render_column(frame: &mut Frame, area: Rect, app: &App, index: usize, column: &BoardColumn) {
        let theme = app.current_theme();
        let active = index == app.board_cursor.column;
        let open_jid = app.inbox.meta_form.as_ref().map(|f| f.jid.as_str());

        let mut lines: Vec<Line> = Vec::new();
        for (card_index, card) in column.cards.iter().enumerate() {
            let selected = active && card_index == app.board_cursor.card;
            let marked = app.marked.contains(&card.jid);

            let mut title_style = Style::default().fg(theme.foreground());
            if selected {
                title_style = title_style.bg(theme.selection()).add_modifier(Modifier::BOLD);
            }
            if open_jid == Some(card.jid.as_str()) {
                title_style = title_style.fg(theme.accent());
            }

            let mut title = vec![
                Span::styled(
                    if marked { "■ " } else { "  " },
                    Style::default().fg(theme.accent_secondary()),
                ),
                Span::styled(card.label(), title_style),
            ];
            if card.pinned {
                title.push(Span::styled(" ★", Style::default().fg(theme.warning())));
            }
            if card.unread > 0 {
                title.push(Span::styled(
                    format!(" ({})", card.unread),
                    Style::default().fg(theme.info()),
                ));
            }
            lines.push(Line::from(title));

            if let Some(last) = &card.last_message {
                lines.push(Line::from(Span::styled(
                    format!("  {}", preview(last, 28)),
                    Style::default().fg(theme.foreground_dim()),
                )));
            }
            if !card.tags.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("  #{}", card.tags.join(" #")),
                    Style::default().fg(theme.accent_secondary()),
                )));
            }
        }

        // Keep the selected card on screen; each card takes up to three lines.
        let visible = area.height.saturating_sub(2) as usize;
        let scroll = if active {
            (app.board_cursor.card * 3).saturating_sub(visible.saturating_sub(3))
        } else {
            0
        };

        let border = if active { theme.accent() } else { theme.border() };
        let block = Block::default()
            .title(format!(" {} ", column.heading()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(theme.background()));
        frame.render_widget(
            Paragraph::new(lines)
                .block(block)
                .scroll((scroll as u16, 0)),
            area,
        );
    }

    fn render_chat(frame: &mut Frame, area: Rect, app: &App, form: &ChatMetaForm) {
        let theme = app.current_theme();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(6), Constraint::Length(14)])
            .split(area);

        let mut lines: Vec<Line> = Vec::new();
        for message in &app.inbox.messages {
            let (who, style) = if message.from_me {
                ("me", Style::default().fg(theme.accent()))
            } else {
                ("them", Style::default().fg(theme.accent_secondary()))
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{}: ", who), style.add_modifier(Modifier::BOLD)),
                Span::styled(message.text.clone(), Style::default().fg(theme.foreground())),
            ]));
        }
        let visible = rows[0].height.saturating_sub(2) as usize;
        let scroll = lines.len().saturating_sub(visible) as u16;
        frame.render_widget(
            Paragraph::new(lines)
                .block(panel(format!("{} (c close)", form.jid), theme))
                .wrap(Wrap { trim: false })
                .scroll((scroll, 0)),
            rows[0],
        );

        let mut meta = vec![
            fact_line(
                "Priority (P)",
                PRIORITY_LABELS[form.priority.min(3) as usize],
                theme,
            ),
            fact_line(
                "Interest (I)",
                INTEREST_LABELS[form.interest.min(3) as usize],
                theme,
            ),
            fact_line(
                "Flags",
                format!(
                    "pinned {} (p) · archived {} (A)",
                    on_off(form.pinned),
                    on_off(form.archived)
                ),
                theme,
            ),
        ];
        meta.extend(field_lines(
            app,
            &[
                Field::QuickReply,
                Field::MetaTitle,
                Field::MetaColor,
                Field::MetaColumn,
                Field::MetaNumber,
                Field::MetaTags,
                Field::MetaNotes,
            ],
        ));
        frame.render_widget(
            Paragraph::new(meta)
                .block(panel("Chat details (s save · R reply)", theme))
                .wrap(Wrap { trim: false }),
            rows[1],
        );
    }
}
