use std::collections::BTreeSet;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind};
use futures::StreamExt;
use mkpro_core::{
    ApiClient, BrandContext, BrandManager, ChatCard, ConnectorProfile, GroupBy, Inbox,
    LeadIntake, MkproConfig, MkproError, MkproResult, PollOutcome, SessionState, Shell,
    SocialPoster, Tab, TeamChat, WaAdmin, WhatsAppConnector, WhatsAppSession,
};
use ratatui::{backend::Backend, Terminal};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::events::{route_key, Action, Command, KeyRoute, Keybinds};
use crate::forms::{Field, Forms};
use crate::theme::{Theme, ThemeLoader, ThemeManager};
use crate::ui::layout::MainLayout;
use crate::ui::widgets::{ConfirmDialog, DialogState, InputOutcome, TextInput, ToastManager};

/// Selected column and card on the inbox board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardCursor {
    pub column: usize,
    pub card: usize,
}

pub struct App {
    pub should_quit: bool,
    pub config: MkproConfig,
    pub ctx: BrandContext,
    pub shell: Shell,
    pub brands: BrandManager,
    pub chat: TeamChat,
    pub channels: WhatsAppSession,
    pub social: SocialPoster,
    pub wa_admin: WaAdmin,
    pub inbox: Inbox,
    pub leads: LeadIntake,
    pub forms: Forms,
    pub focus: usize,
    pub editor: Option<(Field, TextInput)>,
    pub board_cursor: BoardCursor,
    pub marked: BTreeSet<String>,
    pub ds_selected: usize,
    pub theme_manager: ThemeManager,
    pub theme_loader: ThemeLoader,
    pub keybinds: Keybinds,
    pub toasts: ToastManager,
    pub dialog: DialogState<Command>,
    pub status_message: Option<String>,
    pub busy: Option<&'static str>,
    pub tick: u64,
}

impl App {
    pub fn new(config: MkproConfig) -> Result<Self> {
        Self::with_loaders(config, ThemeLoader::new(), Keybinds::load_or_default())
    }

    pub fn with_loaders(
        config: MkproConfig,
        theme_loader: ThemeLoader,
        keybinds: Keybinds,
    ) -> Result<Self> {
        let client = ApiClient::new(&config.api)?;
        let theme_manager = theme_loader.initialize_theme_manager(&config.tui.theme);
        let channels = WhatsAppSession::new(
            WhatsAppConnector::new(client.clone()),
            ConnectorProfile::channels().with_polling(&config.polling),
        );

        Ok(Self {
            should_quit: false,
            ctx: BrandContext::new(),
            shell: Shell::new(client.clone()),
            brands: BrandManager::new(client.clone()),
            chat: TeamChat::new(client.clone()),
            channels,
            social: SocialPoster::new(client.clone()),
            wa_admin: WaAdmin::new(client.clone()),
            inbox: Inbox::new(client.clone()),
            leads: LeadIntake::new(client),
            forms: Forms::default(),
            focus: 0,
            editor: None,
            board_cursor: BoardCursor::default(),
            marked: BTreeSet::new(),
            ds_selected: 0,
            status_message: Some(format!(
                "Backend: {}. Theme: {}.",
                config.api.base_url,
                theme_manager.current_theme_name()
            )),
            theme_manager,
            theme_loader,
            keybinds,
            toasts: ToastManager::new(),
            dialog: DialogState::new(),
            busy: None,
            tick: 0,
            config,
        })
    }

    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let mut events = EventStream::new();
        let mut ticker =
            tokio::time::interval(Duration::from_millis(self.config.tui.refresh_rate_ms.max(16)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.dispatch(terminal, Command::Bootstrap).await?;

        while !self.should_quit {
            terminal.draw(|frame| MainLayout::render(frame, self))?;

            let command = tokio::select! {
                _ = ticker.tick() => {
                    self.on_tick();
                    None
                }
                event = events.next() => match event {
                    Some(Ok(Event::Key(key))) => self.handle_key(key),
                    Some(Ok(_)) => None,
                    Some(Err(e)) => return Err(e.into()),
                    None => {
                        self.should_quit = true;
                        None
                    }
                },
            };

            if let Some(command) = command {
                self.dispatch(terminal, command).await?;
            }
        }

        self.channels.stop();
        self.wa_admin.session.stop();
        Ok(())
    }

    async fn dispatch<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        command: Command,
    ) -> Result<()> {
        self.busy = Some(command.label());
        terminal.draw(|frame| MainLayout::render(frame, self))?;
        self.execute(command).await;
        self.busy = None;
        Ok(())
    }

    pub fn current_theme(&self) -> &dyn Theme {
        self.theme_manager.current_theme()
    }

    pub fn active_tab(&self) -> Tab {
        self.shell.active_tab
    }

    pub fn focused_field(&self) -> Option<Field> {
        Field::for_tab(self.shell.active_tab).get(self.focus).copied()
    }

    // ---- keys -------------------------------------------------------------

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if self.dialog.is_open() {
            return self.handle_dialog_key(key.code);
        }
        if self.editor.is_some() {
            return self.handle_editor_key(key);
        }

        match route_key(&self.keybinds, key) {
            KeyRoute::Global(action) => self.handle_action(action),
            KeyRoute::View(code) => self.handle_view_key(code),
            KeyRoute::Ignore => None,
        }
    }

    fn handle_dialog_key(&mut self, code: KeyCode) -> Option<Command> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') => {
                self.dialog.cancel();
                None
            }
            KeyCode::Char('y') => self.dialog.confirm(),
            KeyCode::Enter => self.dialog.submit(),
            KeyCode::Tab
            | KeyCode::Left
            | KeyCode::Right
            | KeyCode::Char('h')
            | KeyCode::Char('l') => {
                self.dialog.toggle_selection();
                None
            }
            _ => None,
        }
    }

    fn handle_editor_key(&mut self, key: KeyEvent) -> Option<Command> {
        let outcome = match self.editor.as_mut() {
            Some((_, input)) => input.handle_key(key.code, key.modifiers),
            None => return None,
        };

        match outcome {
            InputOutcome::Submit => {
                let (field, input) = self.editor.take()?;
                if let Err(e) = self.set_field(field, input.into_value()) {
                    self.toasts.warning(e.to_string());
                    return None;
                }
                match field {
                    Field::ChatText => Some(Command::SendChat),
                    Field::Search => Some(Command::LoadBoard),
                    Field::QuickReply => Some(Command::QuickReply),
                    Field::PageSize => Some(Command::ListLeads),
                    _ => None,
                }
            }
            InputOutcome::Cancel => {
                self.editor = None;
                None
            }
            InputOutcome::Edited | InputOutcome::Ignored => None,
        }
    }

    fn handle_action(&mut self, action: Action) -> Option<Command> {
        match action {
            Action::Quit => {
                self.should_quit = true;
                None
            }
            Action::NextTab => self.switch_tab(self.shell.active_tab.next()),
            Action::PrevTab => self.switch_tab(self.shell.active_tab.prev()),
            Action::GoToTab(index) => Tab::from_index(index).and_then(|tab| self.switch_tab(tab)),
            Action::NextBrand => self.cycle_brand(1),
            Action::PrevBrand => self.cycle_brand(-1),
            Action::ToggleTheme => {
                self.toggle_theme();
                None
            }
            Action::Refresh => Some(Command::Refresh),
            Action::FocusNext => {
                self.move_focus(1);
                None
            }
            Action::FocusPrev => {
                self.move_focus(-1);
                None
            }
            Action::Edit => {
                self.open_editor();
                None
            }
            Action::Back => {
                if self.shell.active_tab == Tab::WaInbox && self.inbox.meta_form.is_some() {
                    self.inbox.close_chat();
                }
                None
            }
        }
    }

    pub fn switch_tab(&mut self, tab: Tab) -> Option<Command> {
        if !self.shell.select_tab(tab) {
            return None;
        }
        self.focus = 0;
        Some(Command::LoadView)
    }

    fn cycle_brand(&mut self, offset: isize) -> Option<Command> {
        if self.ctx.brands.is_empty() {
            self.toasts.warning("No brands yet. Create one in Brands & Context");
            return None;
        }
        self.ctx.cycle(offset).then_some(Command::BrandChanged)
    }

    fn toggle_theme(&mut self) {
        let name = self.theme_manager.cycle_theme();
        if let Err(e) = self.theme_loader.save_theme_name(name) {
            warn!("{:#}", e);
        }
        self.toasts.info(format!("Theme: {}", name));
    }

    fn move_focus(&mut self, delta: isize) {
        let count = Field::for_tab(self.shell.active_tab).len() as isize;
        if count > 0 {
            self.focus = (self.focus as isize + delta).rem_euclid(count) as usize;
        }
    }

    fn open_editor(&mut self) {
        let Some(field) = self.focused_field() else {
            return;
        };
        if field.needs_open_chat() && self.inbox.meta_form.is_none() {
            self.toasts.warning("Open a chat first (o)");
            return;
        }

        let mut input = TextInput::new(field.label(), self.field_value(field));
        if field.is_multiline() {
            input = input.multiline();
        }
        if field.is_secret() {
            input = input.masked();
        }
        self.editor = Some((field, input));
    }

    fn handle_view_key(&mut self, code: KeyCode) -> Option<Command> {
        match self.shell.active_tab {
            Tab::TeamChat => self.team_chat_key(code),
            Tab::Brands => match code {
                KeyCode::Char('c') => Some(Command::CreateBrand),
                KeyCode::Char('s') => Some(Command::SaveContext),
                _ => None,
            },
            Tab::Channels => self.channels_key(code),
            Tab::WaAdmin => self.wa_admin_key(code),
            Tab::Leads => self.leads_key(code),
            Tab::WaInbox => self.inbox_key(code),
        }
    }

    fn team_chat_key(&mut self, code: KeyCode) -> Option<Command> {
        match code {
            KeyCode::Char('a') => {
                self.chat.cycle_agent();
                self.status_message = Some(format!("Agent: {}", self.chat.agent.label()));
                None
            }
            KeyCode::Char('s') => Some(Command::SendChat),
            _ => None,
        }
    }

    fn channels_key(&mut self, code: KeyCode) -> Option<Command> {
        match code {
            KeyCode::Char('w') => Some(Command::ConnectWhatsApp),
            KeyCode::Char('p') => Some(Command::RetryPolling),
            KeyCode::Char('x') => {
                self.channels.stop();
                self.status_message = Some("Polling stopped".to_string());
                None
            }
            KeyCode::Char('f') => Some(Command::PostFacebook),
            KeyCode::Char('g') => Some(Command::PostInstagram),
            _ => None,
        }
    }

    fn wa_admin_key(&mut self, code: KeyCode) -> Option<Command> {
        let admin = &mut self.wa_admin;
        match code {
            KeyCode::Char('m') => {
                admin.draft.agent_mode = admin.draft.agent_mode.next();
                None
            }
            KeyCode::Char('e') => {
                admin.draft.super_enabled = !admin.draft.super_enabled;
                None
            }
            KeyCode::Char('s') => Some(Command::SaveConfig),
            KeyCode::Char('P') => Some(Command::SetPassword),

            KeyCode::Char('w') => Some(Command::AdminConnect),
            KeyCode::Char('x') => {
                admin.session.stop();
                None
            }
            KeyCode::Char('T') => Some(Command::SendTest),
            KeyCode::Char('h') => Some(Command::SetWebhook),
            KeyCode::Char('y') => Some(Command::SyncPull),
            KeyCode::Char('R') => {
                self.dialog.ask(
                    ConfirmDialog::confirmation(
                        "Rotate instance",
                        "Replace this brand's WhatsApp instance? The device must be linked again.",
                    )
                    .with_confirm_label("Rotate"),
                    Command::RotateInstance,
                );
                None
            }
            KeyCode::Char('S') => Some(Command::InstanceStatus),

            KeyCode::Char('n') => {
                admin.new_datasource_draft();
                None
            }
            KeyCode::Char('<') => {
                self.ds_selected = self.ds_selected.saturating_sub(1);
                None
            }
            KeyCode::Char('>') => {
                if self.ds_selected + 1 < admin.datasources.len() {
                    self.ds_selected += 1;
                }
                None
            }
            KeyCode::Char('E') => {
                if !admin.edit_datasource(self.ds_selected) {
                    self.toasts.warning("No datasource selected");
                }
                None
            }
            KeyCode::Char('K') => {
                admin.ds_draft.kind = admin.ds_draft.kind.next();
                None
            }
            KeyCode::Char('o') => {
                admin.ds_draft.enabled = !admin.ds_draft.enabled;
                None
            }
            KeyCode::Char('O') => {
                admin.ds_draft.read_only = !admin.ds_draft.read_only;
                None
            }
            KeyCode::Char('u') => Some(Command::SaveDatasource),
            KeyCode::Char('v') => Some(Command::TestDatasource),
            KeyCode::Char('D') => {
                self.ask_delete_datasource();
                None
            }
            _ => None,
        }
    }

    fn ask_delete_datasource(&mut self) {
        let Some(ds) = self.wa_admin.datasources.get(self.ds_selected) else {
            self.toasts.warning("No datasource selected");
            return;
        };
        let Some(id) = ds.id else {
            self.toasts.warning("This datasource has not been saved yet");
            return;
        };
        self.dialog.ask(
            ConfirmDialog::danger(
                "Delete datasource",
                format!("Delete '{}'? This cannot be undone.", ds.name),
            ),
            Command::DeleteDatasource(id),
        );
    }

    fn leads_key(&mut self, code: KeyCode) -> Option<Command> {
        match code {
            KeyCode::Char('s') => Some(Command::IngestLead),
            KeyCode::Char('l') => Some(Command::ListLeads),
            KeyCode::Char('n') => {
                self.leads.next_page();
                Some(Command::ListLeads)
            }
            KeyCode::Char('p') => {
                self.leads.prev_page();
                Some(Command::ListLeads)
            }
            _ => None,
        }
    }

    pub fn selected_card(&self) -> Option<&ChatCard> {
        self.inbox
            .board
            .columns
            .get(self.board_cursor.column)?
            .cards
            .get(self.board_cursor.card)
    }

    fn clamp_board_cursor(&mut self) {
        let columns = &self.inbox.board.columns;
        if columns.is_empty() {
            self.board_cursor = BoardCursor::default();
            return;
        }
        self.board_cursor.column = self.board_cursor.column.min(columns.len() - 1);
        let cards = columns[self.board_cursor.column].cards.len();
        self.board_cursor.card = self.board_cursor.card.min(cards.saturating_sub(1));
    }

    fn move_column(&mut self, delta: isize) {
        let count = self.inbox.board.columns.len() as isize;
        if count == 0 {
            return;
        }
        self.board_cursor.column =
            (self.board_cursor.column as isize + delta).clamp(0, count - 1) as usize;
        self.clamp_board_cursor();
    }

    fn inbox_key(&mut self, code: KeyCode) -> Option<Command> {
        match code {
            KeyCode::Char('h') | KeyCode::Left => {
                self.move_column(-1);
                None
            }
            KeyCode::Char('l') | KeyCode::Right => {
                self.move_column(1);
                None
            }
            KeyCode::Char('J') => {
                self.board_cursor.card += 1;
                self.clamp_board_cursor();
                None
            }
            KeyCode::Char('K') => {
                self.board_cursor.card = self.board_cursor.card.saturating_sub(1);
                None
            }
            KeyCode::Char('o') => self
                .selected_card()
                .map(|card| Command::OpenChat(card.jid.clone())),
            KeyCode::Char('c') => {
                self.inbox.close_chat();
                None
            }
            KeyCode::Char('g') => {
                self.inbox.query.group_by = self.inbox.query.group_by.next();
                self.board_cursor = BoardCursor::default();
                self.marked.clear();
                Some(Command::LoadBoard)
            }
            KeyCode::Char('a') => {
                self.inbox.query.show_archived = !self.inbox.query.show_archived;
                Some(Command::LoadBoard)
            }
            KeyCode::Char('<') => self.drop_selected(-1),
            KeyCode::Char('>') => self.drop_selected(1),
            KeyCode::Char(' ') => {
                if let Some(jid) = self.selected_card().map(|card| card.jid.clone()) {
                    if !self.marked.remove(&jid) {
                        self.marked.insert(jid);
                    }
                }
                None
            }
            KeyCode::Char('B') => self.bulk_move_marked(),
            KeyCode::Char('P') => {
                self.edit_meta(|form| form.priority = (form.priority + 1) % 4);
                None
            }
            KeyCode::Char('I') => {
                self.edit_meta(|form| form.interest = (form.interest + 1) % 4);
                None
            }
            KeyCode::Char('p') => {
                self.edit_meta(|form| form.pinned = !form.pinned);
                None
            }
            KeyCode::Char('A') => {
                self.edit_meta(|form| form.archived = !form.archived);
                None
            }
            KeyCode::Char('s') => Some(Command::SaveMeta),
            KeyCode::Char('R') => Some(Command::QuickReply),
            _ => None,
        }
    }

    fn edit_meta(&mut self, edit: impl FnOnce(&mut mkpro_core::ChatMetaForm)) {
        match self.inbox.meta_form.as_mut() {
            Some(form) => edit(form),
            None => self.toasts.warning("Open a chat first (o)"),
        }
    }

    /// Move the selected card into the neighbouring column.
    fn drop_selected(&mut self, delta: isize) -> Option<Command> {
        let jid = self.selected_card()?.jid.clone();
        let target = self.board_cursor.column as isize + delta;
        if target < 0 {
            return None;
        }
        let column = self.inbox.board.columns.get(target as usize)?;
        Some(Command::DropCard {
            jid,
            target: column.key.clone(),
        })
    }

    fn bulk_move_marked(&mut self) -> Option<Command> {
        if self.inbox.query.group_by != GroupBy::Column {
            self.toasts
                .warning("Bulk move works on the column grouping only (g to switch)");
            return None;
        }
        if self.marked.is_empty() {
            self.toasts.warning("Mark chats with Space first");
            return None;
        }
        let column = self
            .inbox
            .board
            .columns
            .get(self.board_cursor.column)?
            .key
            .clone();
        Some(Command::BulkMove {
            jids: self.marked.iter().cloned().collect(),
            column,
        })
    }

    // ---- fields -----------------------------------------------------------

    pub fn field_value(&self, field: Field) -> String {
        let draft = &self.wa_admin.draft;
        let ds = &self.wa_admin.ds_draft;
        let meta = self.inbox.meta_form.as_ref();
        match field {
            Field::ChatText => self.chat.text.clone(),
            Field::BrandName => self.brands.name.clone(),
            Field::BrandTone => self.brands.tone.clone(),
            Field::BrandContext => self.brands.context.clone(),
            Field::FacebookMessage => self.forms.facebook_message.clone(),
            Field::FacebookImage => self.forms.facebook_image.clone(),
            Field::InstagramCaption => self.forms.instagram_caption.clone(),
            Field::InstagramImage => self.forms.instagram_image.clone(),
            Field::ModelName => draft.model_name.clone(),
            Field::Temperature => draft.temperature.to_string(),
            Field::RulesMd => draft.rules_md.clone(),
            Field::RulesJson => draft.rules_json.clone(),
            Field::SuperKeyword => draft.super_keyword.clone(),
            Field::SuperAllowList => draft.super_allow_list.clone(),
            Field::PasswordCurrent => self.forms.password_current.clone(),
            Field::PasswordNew => draft.super_password_new.clone(),
            Field::PasswordConfirm => draft.super_password_new2.clone(),
            Field::TestTo => self.forms.test_to.clone(),
            Field::TestText => self.forms.test_text.clone(),
            Field::DsName => ds.name.clone(),
            Field::DsUrl => ds.url.clone(),
            Field::DsHeaders => ds.headers.clone(),
            Field::LeadText => self.leads.raw_text.clone(),
            Field::PageSize => self.leads.page_size.to_string(),
            Field::Search => self.forms.search.clone(),
            Field::QuickReply => self.forms.quick_reply.clone(),
            Field::MetaTitle => meta.map(|m| m.title.clone()).unwrap_or_default(),
            Field::MetaColor => meta.map(|m| m.color.clone()).unwrap_or_default(),
            Field::MetaColumn => meta.map(|m| m.column.clone()).unwrap_or_default(),
            Field::MetaNumber => meta.map(|m| m.number.clone()).unwrap_or_default(),
            Field::MetaTags => meta.map(|m| m.tags.clone()).unwrap_or_default(),
            Field::MetaNotes => meta.map(|m| m.notes.clone()).unwrap_or_default(),
        }
    }

    pub fn set_field(&mut self, field: Field, value: String) -> MkproResult<()> {
        let draft = &mut self.wa_admin.draft;
        let ds = &mut self.wa_admin.ds_draft;
        match field {
            Field::ChatText => self.chat.text = value,
            Field::BrandName => self.brands.name = value,
            Field::BrandTone => self.brands.tone = value,
            Field::BrandContext => self.brands.context = value,
            Field::FacebookMessage => self.forms.facebook_message = value,
            Field::FacebookImage => self.forms.facebook_image = value,
            Field::InstagramCaption => self.forms.instagram_caption = value,
            Field::InstagramImage => self.forms.instagram_image = value,
            Field::ModelName => draft.model_name = value,
            Field::Temperature => draft.temperature = parse_temperature(&value)?,
            Field::RulesMd => draft.rules_md = value,
            Field::RulesJson => draft.rules_json = value,
            Field::SuperKeyword => draft.super_keyword = value,
            Field::SuperAllowList => draft.super_allow_list = value,
            Field::PasswordCurrent => self.forms.password_current = value,
            Field::PasswordNew => draft.super_password_new = value,
            Field::PasswordConfirm => draft.super_password_new2 = value,
            Field::TestTo => self.forms.test_to = value,
            Field::TestText => self.forms.test_text = value,
            Field::DsName => ds.name = value,
            Field::DsUrl => ds.url = value,
            Field::DsHeaders => ds.headers = value,
            Field::LeadText => self.leads.raw_text = value,
            Field::PageSize => {
                let size = value
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| MkproError::validation("page size must be a whole number"))?;
                self.leads.set_page_size(size);
            }
            Field::Search => self.forms.search = value,
            Field::QuickReply => self.forms.quick_reply = value,
            Field::MetaTitle
            | Field::MetaColor
            | Field::MetaColumn
            | Field::MetaNumber
            | Field::MetaTags
            | Field::MetaNotes => {
                let form = self
                    .inbox
                    .meta_form
                    .as_mut()
                    .ok_or_else(|| MkproError::validation("open a chat first"))?;
                let slot = match field {
                    Field::MetaTitle => &mut form.title,
                    Field::MetaColor => &mut form.color,
                    Field::MetaColumn => &mut form.column,
                    Field::MetaNumber => &mut form.number,
                    Field::MetaTags => &mut form.tags,
                    _ => &mut form.notes,
                };
                *slot = value;
            }
        }
        Ok(())
    }

    // ---- commands ---------------------------------------------------------

    pub async fn execute(&mut self, command: Command) {
        debug!("Running {:?}", command);
        let result = self.run_command(command).await;
        self.report(result);
    }

    /// Successes become toasts, validation problems a warning toast, and
    /// anything else an alert dialog.
    pub fn report(&mut self, result: MkproResult<Option<String>>) {
        match result {
            Ok(Some(message)) => {
                self.toasts.success(message.clone());
                self.status_message = Some(message);
            }
            Ok(None) => {}
            Err(e) if e.is_validation() => {
                self.toasts.warning(e.to_string());
                self.status_message = Some(e.to_string());
            }
            Err(e) => {
                e.log();
                let message = match e.user_suggestion() {
                    Some(hint) => format!("{}\n\n{}", e, hint),
                    None => e.to_string(),
                };
                self.dialog
                    .alert(format!("Request failed ({})", e.error_code()), message);
                self.status_message = Some(e.to_string());
            }
        }
    }

    async fn run_command(&mut self, command: Command) -> MkproResult<Option<String>> {
        match command {
            Command::Bootstrap => {
                self.shell.bootstrap(&mut self.ctx).await;
                self.brands.on_brand_selected(&self.ctx);
                if let Some(error) = &self.shell.brands_error {
                    self.toasts.error(format!("Could not load brands: {}", error));
                }
                self.status_message = Some(format!(
                    "{} · {}",
                    self.shell.health.label(),
                    self.ctx.selected_label()
                ));
                self.load_view().await
            }
            Command::Refresh => {
                self.shell.check_health().await;
                let before = self.ctx.selected;
                self.shell.reload_brands(&mut self.ctx).await?;
                if self.ctx.selected != before {
                    self.on_brand_changed();
                }
                self.wa_admin.loaded = false;
                self.load_view().await?;
                self.status_message = Some(format!("Reloaded · {}", self.shell.health.label()));
                Ok(None)
            }
            Command::LoadView => self.load_view().await,
            Command::BrandChanged => {
                self.on_brand_changed();
                self.status_message = Some(format!("Brand: {}", self.ctx.selected_label()));
                self.load_view().await
            }

            Command::CreateBrand => {
                let before = self.ctx.selected;
                let staged = self.brands.context.clone();
                let result = self.brands.create(&mut self.ctx).await;
                // The new brand may already be selected when storing its
                // context fails; keep the typed text so it can be saved again.
                if self.ctx.selected != before {
                    self.on_brand_changed();
                    if result.is_err() {
                        self.brands.context = staged;
                    }
                }
                match result? {
                    Some(id) => Ok(Some(format!("Brand #{} created", id))),
                    None => Ok(Some("Brand created".to_string())),
                }
            }
            Command::SaveContext => {
                self.brands.save_context(&mut self.ctx).await?;
                Ok(Some("Context saved".to_string()))
            }

            Command::SendChat => {
                self.chat.send(&self.ctx).await?;
                Ok(None)
            }

            Command::ConnectWhatsApp => {
                let brand_id = self.ctx.require_selected()?;
                self.channels.start(brand_id).await?;
                self.status_message = Some(self.channels.status_text().to_string());
                Ok(None)
            }
            Command::RetryPolling => {
                let brand_id = self.ctx.require_selected()?;
                self.channels.retry_polling(brand_id);
                self.status_message = Some("Polling again".to_string());
                Ok(None)
            }
            Command::PostFacebook => {
                let image = self.forms.facebook_image.clone();
                let id = self
                    .social
                    .post_facebook(&self.forms.facebook_message, Some(image.as_str()))
                    .await?;
                Ok(Some(format!("Facebook post published: {}", id)))
            }
            Command::PostInstagram => {
                let id = self
                    .social
                    .post_instagram(&self.forms.instagram_caption, &self.forms.instagram_image)
                    .await?;
                Ok(Some(format!("Instagram post published: {}", id)))
            }

            Command::SaveConfig => {
                self.wa_admin.save(&self.ctx).await?;
                Ok(Some("Config saved".to_string()))
            }
            Command::SetPassword => {
                let new = self.wa_admin.draft.super_password_new.clone();
                let confirm = self.wa_admin.draft.super_password_new2.clone();
                self.wa_admin
                    .set_password(&self.ctx, &self.forms.password_current, &new, &confirm)
                    .await?;
                self.forms.password_current.clear();
                Ok(Some("Admin password updated".to_string()))
            }
            Command::SendTest => {
                self.wa_admin
                    .send_test(&self.ctx, &self.forms.test_to, &self.forms.test_text)
                    .await?;
                Ok(Some("Test message sent".to_string()))
            }
            Command::SetWebhook => {
                self.wa_admin.set_webhook(&self.ctx).await?;
                Ok(Some("Webhook set".to_string()))
            }
            Command::SyncPull => {
                let saved = self.wa_admin.sync_pull(&self.ctx).await?;
                Ok(Some(format!("Sync saved {} messages", saved)))
            }
            Command::RotateInstance => {
                let rotation = self.wa_admin.rotate_instance(&self.ctx).await?;
                Ok(Some(format!(
                    "Instance rotated: {}",
                    rotation.instance.as_deref().unwrap_or("-")
                )))
            }
            Command::InstanceStatus => {
                let state = self.wa_admin.instance_status(&self.ctx).await?;
                self.status_message = Some(format!("Instance: {}", state));
                Ok(None)
            }
            Command::AdminConnect => {
                let brand_id = self.ctx.require_selected()?;
                self.wa_admin.session.start(brand_id).await?;
                self.wa_admin
                    .log
                    .push(format!("Connect: {}", self.wa_admin.session.status_text()));
                Ok(None)
            }
            Command::SaveDatasource => {
                self.wa_admin.save_datasource(&self.ctx).await?;
                self.clamp_ds_selected();
                Ok(Some("Datasource saved".to_string()))
            }
            Command::TestDatasource => {
                self.wa_admin.test_datasource(&self.ctx).await?;
                Ok(None)
            }
            Command::DeleteDatasource(id) => {
                self.wa_admin.delete_datasource(&self.ctx, id, true).await?;
                self.clamp_ds_selected();
                Ok(Some("Datasource deleted".to_string()))
            }

            Command::IngestLead => {
                let lead = self.leads.ingest(&self.ctx).await?;
                let name = lead.name.clone().unwrap_or_else(|| "lead".to_string());
                Ok(Some(match lead.score {
                    Some(score) => format!("{} scored {:.0}", name, score),
                    None => format!("{} saved", name),
                }))
            }
            Command::ListLeads => {
                self.leads.list(&self.ctx).await?;
                Ok(None)
            }

            Command::LoadBoard => {
                let q = self.forms.search.trim();
                self.inbox.query.q = (!q.is_empty()).then(|| q.to_string());
                self.inbox.load_board(&self.ctx).await?;
                self.clamp_board_cursor();
                Ok(None)
            }
            Command::OpenChat(jid) => {
                self.inbox.open_chat(&self.ctx, &jid).await?;
                Ok(None)
            }
            Command::DropCard { jid, target } => {
                self.inbox.drop_card(&self.ctx, &jid, &target).await?;
                self.clamp_board_cursor();
                Ok(Some(format!("Moved to {}", target)))
            }
            Command::BulkMove { jids, column } => {
                let count = jids.len();
                self.inbox.bulk_move(&self.ctx, jids, &column).await?;
                self.marked.clear();
                self.clamp_board_cursor();
                Ok(Some(format!("{} chats moved to {}", count, column)))
            }
            Command::SaveMeta => {
                self.inbox.save_meta(&self.ctx).await?;
                self.clamp_board_cursor();
                Ok(Some("Chat saved".to_string()))
            }
            Command::QuickReply => {
                let text = self.forms.quick_reply.clone();
                self.inbox.quick_reply(&self.ctx, &text).await?;
                self.forms.quick_reply.clear();
                Ok(Some("Reply sent".to_string()))
            }
        }
    }

    fn clamp_ds_selected(&mut self) {
        self.ds_selected = self
            .ds_selected
            .min(self.wa_admin.datasources.len().saturating_sub(1));
    }

    /// Fetch the brand-scoped data the active tab shows. Nothing is fetched
    /// without a brand.
    async fn load_view(&mut self) -> MkproResult<Option<String>> {
        if self.ctx.selected.is_none() {
            return Ok(None);
        }

        match self.shell.active_tab {
            Tab::TeamChat => self.chat.load_thread(&self.ctx).await?,
            Tab::WaAdmin => {
                if !self.wa_admin.loaded {
                    self.wa_admin.load(&self.ctx).await;
                }
            }
            Tab::Leads => self.leads.list(&self.ctx).await?,
            Tab::WaInbox => {
                self.inbox.load_board(&self.ctx).await?;
                self.clamp_board_cursor();
            }
            Tab::Brands | Tab::Channels => {}
        }
        Ok(None)
    }

    /// Drop everything that belonged to the previous brand.
    pub fn on_brand_changed(&mut self) {
        self.channels.reset();
        self.wa_admin.reset();
        self.chat.reset();
        self.inbox.reset();
        self.leads.reset();
        self.brands.on_brand_selected(&self.ctx);
        self.board_cursor = BoardCursor::default();
        self.marked.clear();
        self.ds_selected = 0;
        info!("Brand changed to {}", self.ctx.selected_label());
    }

    // ---- ticks ------------------------------------------------------------

    pub fn on_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
        self.toasts.cleanup();

        drain_session(&mut self.channels, &mut self.toasts);
        if drain_session(&mut self.wa_admin.session, &mut self.toasts) {
            self.wa_admin.log.push("Instance connected");
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_some()
    }
}

/// Apply poll results and announce the interesting transitions. Returns
/// `true` when the session has just connected.
fn drain_session(session: &mut WhatsAppSession, toasts: &mut ToastManager) -> bool {
    let was_connected = session.state == SessionState::Connected;
    let previous_outcome = session.last_outcome;
    if session.drain_events() == 0 {
        return false;
    }

    if !was_connected && session.state == SessionState::Connected {
        toasts.success(session.status_text());
        return true;
    }

    if let Some(outcome) = session.last_outcome {
        let fresh = previous_outcome != Some(outcome);
        if fresh && !outcome.is_satisfied() && outcome != PollOutcome::Cancelled {
            toasts.warning(format!(
                "Still not connected: {}. Press p to poll again",
                outcome.describe()
            ));
        }
    }
    false
}

fn parse_temperature(raw: &str) -> MkproResult<f64> {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|t| t.is_finite())
        .ok_or_else(|| MkproError::validation("temperature must be a number, e.g. 0.2"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use mkpro_core::{Brand, BoardColumn, Board, ChatMessage, Datasource};
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app() -> (App, TempDir) {
        let dir = TempDir::new().unwrap();
        let loader = ThemeLoader::with_path(dir.path().join("theme.toml"));
        let app = App::with_loaders(MkproConfig::default(), loader, Keybinds::new()).unwrap();
        (app, dir)
    }

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    fn code(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn brand(id: i64, name: &str) -> Brand {
        Brand {
            id,
            name: name.to_string(),
            tone: None,
            context: Some(format!("context of {}", name)),
        }
    }

    fn card(jid: &str) -> ChatCard {
        ChatCard {
            jid: jid.to_string(),
            ..Default::default()
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            assert_eq!(app.handle_key(key(c)), None);
        }
    }

    #[test]
    fn test_quit() {
        let (mut app, _dir) = app();
        app.handle_key(key('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_tab_switch_loads_view() {
        let (mut app, _dir) = app();
        assert_eq!(app.handle_key(code(KeyCode::Tab)), Some(Command::LoadView));
        assert_eq!(app.active_tab(), Tab::Brands);
        assert_eq!(app.handle_key(key('6')), Some(Command::LoadView));
        assert_eq!(app.active_tab(), Tab::WaInbox);
        assert_eq!(app.handle_key(key('6')), None);
    }

    #[test]
    fn test_brand_cycle() {
        let (mut app, _dir) = app();
        assert_eq!(app.handle_key(key(']')), None);
        assert_eq!(app.toasts.len(), 1);

        app.ctx.replace_brands(vec![brand(1, "Uno"), brand(2, "Dos")]);
        assert_eq!(app.handle_key(key(']')), Some(Command::BrandChanged));
        assert_eq!(app.ctx.selected, Some(2));
    }

    #[test]
    fn test_brand_change_resets_scoped_state() {
        let (mut app, _dir) = app();
        app.ctx.replace_brands(vec![brand(1, "Uno"), brand(2, "Dos")]);
        app.chat.thread_id = Some(9);
        app.leads.page = 4;
        app.marked.insert("x".to_string());
        app.ctx.select(Some(2));

        app.on_brand_changed();
        assert_eq!(app.chat.thread_id, None);
        assert_eq!(app.leads.page, 1);
        assert!(app.marked.is_empty());
        assert_eq!(app.brands.context, "context of Dos");
        assert_eq!(app.channels.state, SessionState::Idle);
    }

    #[test]
    fn test_editor_commits_on_enter() {
        let (mut app, _dir) = app();
        app.switch_tab(Tab::Brands);
        app.handle_key(code(KeyCode::Enter));
        assert!(app.editor.is_some());

        app.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        type_text(&mut app, "Acme qx");
        assert_eq!(app.handle_key(code(KeyCode::Enter)), None);
        assert!(app.editor.is_none());
        assert_eq!(app.brands.name, "Acme qx");
        assert!(!app.should_quit);
    }

    #[test]
    fn test_editor_escape_discards() {
        let (mut app, _dir) = app();
        app.switch_tab(Tab::Brands);
        app.handle_key(code(KeyCode::Enter));
        type_text(&mut app, "zzz");
        app.handle_key(code(KeyCode::Esc));
        assert_eq!(app.brands.name, mkpro_core::services::DEFAULT_BRAND_NAME);
    }

    #[test]
    fn test_chat_submit_sends() {
        let (mut app, _dir) = app();
        app.handle_key(code(KeyCode::Enter));
        type_text(&mut app, "hola");
        assert_eq!(app.handle_key(code(KeyCode::Enter)), Some(Command::SendChat));
        assert_eq!(app.chat.text, "hola");
    }

    #[test]
    fn test_temperature_must_be_numeric() {
        let (mut app, _dir) = app();
        assert!(app.set_field(Field::Temperature, "0,7".into()).is_ok());
        assert_eq!(app.wa_admin.draft.temperature, 0.7);

        let err = app.set_field(Field::Temperature, "warm".into()).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(app.wa_admin.draft.temperature, 0.7);
    }

    #[test]
    fn test_page_size_is_clamped() {
        let (mut app, _dir) = app();
        app.set_field(Field::PageSize, "2".into()).unwrap();
        assert_eq!(app.leads.page_size, 5);
        assert!(app.set_field(Field::PageSize, "-1".into()).is_err());
    }

    #[test]
    fn test_meta_fields_need_open_chat() {
        let (mut app, _dir) = app();
        assert!(app.set_field(Field::MetaTags, "vip".into()).is_err());

        app.switch_tab(Tab::WaInbox);
        app.focus = 2;
        app.handle_key(code(KeyCode::Enter));
        assert!(app.editor.is_none());
        assert_eq!(app.toasts.len(), 1);
    }

    #[test]
    fn test_datasource_delete_asks_first() {
        let (mut app, _dir) = app();
        app.switch_tab(Tab::WaAdmin);
        app.wa_admin.datasources = vec![Datasource {
            id: Some(7),
            name: "Stock".into(),
            ..Default::default()
        }];

        assert_eq!(app.handle_key(key('D')), None);
        assert!(app.dialog.is_open());
        // Starts on Cancel.
        assert_eq!(app.handle_key(code(KeyCode::Enter)), None);
        assert!(!app.dialog.is_open());

        app.handle_key(key('D'));
        app.handle_key(code(KeyCode::Tab));
        assert_eq!(
            app.handle_key(code(KeyCode::Enter)),
            Some(Command::DeleteDatasource(7))
        );
    }

    #[test]
    fn test_unsaved_datasource_cannot_be_deleted() {
        let (mut app, _dir) = app();
        app.switch_tab(Tab::WaAdmin);
        app.wa_admin.datasources = vec![Datasource::default()];
        app.handle_key(key('D'));
        assert!(!app.dialog.is_open());
    }

    #[test]
    fn test_board_navigation_and_drop() {
        let (mut app, _dir) = app();
        app.switch_tab(Tab::WaInbox);
        app.inbox.board = Board {
            group_by: Some(GroupBy::Priority),
            columns: vec![
                BoardColumn {
                    key: "p0".into(),
                    title: "P0".into(),
                    cards: vec![card("a@s.whatsapp.net"), card("b@s.whatsapp.net")],
                },
                BoardColumn {
                    key: "p1".into(),
                    title: "P1".into(),
                    cards: vec![],
                },
            ],
        };

        app.handle_key(key('J'));
        assert_eq!(app.selected_card().unwrap().jid, "b@s.whatsapp.net");
        assert_eq!(app.handle_key(key('<')), None);
        assert_eq!(
            app.handle_key(key('>')),
            Some(Command::DropCard {
                jid: "b@s.whatsapp.net".into(),
                target: "p1".into()
            })
        );

        app.handle_key(key('l'));
        assert_eq!(app.board_cursor, BoardCursor { column: 1, card: 0 });
        assert!(app.selected_card().is_none());
        assert_eq!(app.handle_key(key('o')), None);
    }

    #[test]
    fn test_bulk_move_needs_column_grouping() {
        let (mut app, _dir) = app();
        app.switch_tab(Tab::WaInbox);
        app.inbox.board = Board {
            group_by: Some(GroupBy::Column),
            columns: vec![BoardColumn {
                key: "nuevo".into(),
                title: "Nuevo".into(),
                cards: vec![card("a@s.whatsapp.net")],
            }],
        };

        assert_eq!(app.handle_key(key('B')), None);
        app.handle_key(key(' '));
        assert_eq!(
            app.handle_key(key('B')),
            Some(Command::BulkMove {
                jids: vec!["a@s.whatsapp.net".into()],
                column: "nuevo".into()
            })
        );

        app.inbox.query.group_by = GroupBy::Tag;
        assert_eq!(app.handle_key(key('B')), None);
    }

    #[test]
    fn test_report_routes_errors() {
        let (mut app, _dir) = app();
        app.report(Err(MkproError::validation("select a brand first")));
        assert_eq!(app.toasts.len(), 1);
        assert!(!app.dialog.is_open());

        app.report(Err(MkproError::Timeout));
        assert!(app.dialog.is_open());
        assert_eq!(app.status_message.as_deref(), Some("timeout"));

        app.dialog.cancel();
        app.report(Ok(Some("Context saved".into())));
        assert_eq!(app.toasts.len(), 2);
    }

    #[test]
    fn test_theme_toggle_persists() {
        let (mut app, dir) = app();
        let before = app.theme_manager.current_theme_name();
        app.handle_key(key('t'));
        assert_ne!(app.theme_manager.current_theme_name(), before);
        assert!(dir.path().join("theme.toml").exists());
    }

    #[test]
    fn test_focus_wraps() {
        let (mut app, _dir) = app();
        app.switch_tab(Tab::Leads);
        app.handle_key(key('k'));
        assert_eq!(app.focused_field(), Some(Field::PageSize));
        app.handle_key(key('j'));
        assert_eq!(app.focused_field(), Some(Field::LeadText));
    }

    #[tokio::test]
    async fn test_create_brand_context_failure_still_switches_views() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/brands"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/brands"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 2, "name": "Vieja"},
                {"id": 5, "name": "Nueva"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/context/set"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "db down"})))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let mut config = MkproConfig::default();
        config.api.base_url = server.uri();
        let loader = ThemeLoader::with_path(dir.path().join("theme.toml"));
        let mut app = App::with_loaders(config, loader, Keybinds::new()).unwrap();
        app.ctx.replace_brands(vec![brand(2, "Vieja")]);
        app.chat.messages.push(ChatMessage {
            id: Some(1),
            sender: "user".to_string(),
            agent: None,
            text: "hola".to_string(),
        });
        app.brands.name = "Nueva".to_string();
        app.brands.context = "Ofertas de otoño".to_string();

        app.execute(Command::CreateBrand).await;

        assert_eq!(app.ctx.selected, Some(5));
        assert!(app.chat.messages.is_empty());
        assert_eq!(app.brands.context, "Ofertas de otoño");
        assert!(app.dialog.is_open());
    }

    #[tokio::test]
    async fn test_commands_without_brand_are_warnings() {
        let (mut app, _dir) = app();
        app.execute(Command::SaveContext).await;
        app.execute(Command::ConnectWhatsApp).await;
        assert_eq!(app.toasts.len(), 2);
        assert!(!app.dialog.is_open());
        assert_eq!(app.channels.state, SessionState::Idle);
    }
}
