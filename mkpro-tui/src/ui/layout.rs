use ratatui::{
    layout::{Constraint, Direction, Layout, Margin, Rect},
    style::Style,
    widgets::Block,
    Frame,
};

use mkpro_core::Tab;

use crate::app::App;
use crate::ui::views::{
    BrandsView, ChannelsView, LeadsView, TeamChatView, WaAdminView, WaInboxView,
};
use crate::ui::widgets::{Footer, Header};

pub struct MainLayout;

impl MainLayout {
    pub fn render(frame: &mut Frame, app: &App) {
        let theme = app.current_theme();
        let size = frame.area();

        frame.render_widget(
            Block::default().style(
                Style::default()
                    .bg(theme.background())
                    .fg(theme.foreground()),
            ),
            size,
        );

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
            ])
            .split(size);

        Header::render(frame, chunks[0], app);

        let content_area = chunks[1].inner(Margin::new(1, 0));
        match app.active_tab() {
            Tab::TeamChat => TeamChatView::render(frame, content_area, app),
            Tab::Brands => BrandsView::render(frame, content_area, app),
            Tab::Channels => ChannelsView::render(frame, content_area, app),
            Tab::WaAdmin => WaAdminView::render(frame, content_area, app),
            Tab::Leads => LeadsView::render(frame, content_area, app),
            Tab::WaInbox => WaInboxView::render(frame, content_area, app),
        }

        Footer::render(frame, chunks[2], app);

        app.toasts.render(frame, size, theme);

        if let Some((_, input)) = &app.editor {
            input.render(frame, size, theme);
        }

        if let Some(dialog) = app.dialog.dialog() {
            dialog.render(frame, size, theme);
        }
    }

    pub fn create_two_column_layout(area: Rect, left_percent: u16) -> Vec<Rect> {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(left_percent),
                Constraint::Percentage(100 - left_percent),
            ])
            .split(area)
            .to_vec()
    }

    pub fn create_three_column_layout(area: Rect) -> Vec<Rect> {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(34),
                Constraint::Percentage(33),
                Constraint::Percentage(33),
            ])
            .split(area)
            .to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Keybinds;
    use crate::theme::ThemeLoader;
    use mkpro_core::{Board, BoardColumn, Brand, ChatCard, ChatMetaForm, MkproConfig};
    use ratatui::{backend::TestBackend, Terminal};
    use tempfile::TempDir;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_every_tab_renders() {
        let dir = TempDir::new().unwrap();
        let loader = ThemeLoader::with_path(dir.path().join("theme.toml"));
        let mut app =
            App::with_loaders(MkproConfig::default(), loader, Keybinds::new()).unwrap();
        app.ctx.replace_brands(vec![Brand {
            id: 3,
            name: "Acme".into(),
            tone: Some("formal".into()),
            context: None,
        }]);

        let card = ChatCard {
            jid: "34600111222@s.whatsapp.net".into(),
            name: Some("Ana".into()),
            unread: 2,
            tags: vec!["vip".into()],
            ..Default::default()
        };
        app.inbox.meta_form = Some(ChatMetaForm::from_card(&card));
        app.inbox.board = Board {
            group_by: None,
            columns: vec![BoardColumn {
                key: "nuevo".into(),
                title: "Nuevo".into(),
                cards: vec![card],
            }],
        };

        let mut terminal = Terminal::new(TestBackend::new(160, 40)).unwrap();
        for tab in Tab::all() {
            app.switch_tab(*tab);
            terminal
                .draw(|frame| MainLayout::render(frame, &app))
                .unwrap();
            let text = buffer_text(&terminal);
            assert!(text.contains("Marketing PRO"), "{:?}", tab);
            assert!(text.contains("Acme"), "{:?}", tab);
        }

        let text = buffer_text(&terminal);
        assert!(text.contains("Nuevo (1)"));
        assert!(text.contains("Ana"));
    }

    #[test]
    fn test_editor_overlay_masks_passwords() {
        let dir = TempDir::new().unwrap();
        let loader = ThemeLoader::with_path(dir.path().join("theme.toml"));
        let mut app =
            App::with_loaders(MkproConfig::default(), loader, Keybinds::new()).unwrap();
        app.wa_admin.draft.super_password_new = "hunter2".into();
        app.editor = Some((
            crate::forms::Field::PasswordNew,
            crate::ui::widgets::TextInput::new("New password", "hunter2").masked(),
        ));

        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal
            .draw(|frame| MainLayout::render(frame, &app))
            .unwrap();
        assert!(!buffer_text(&terminal).contains("hunter2"));
    }
}
