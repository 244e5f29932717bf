use std::cell::Cell;
use std::io::stdout;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::runtime::Runtime;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;
use tui_widgets::popup::PopupState;

use crate::config::{Config, UiColors};
use crate::events::{Notice, SubscriptionId};
use crate::logging;
use crate::model::{Record, RecordId};
use crate::remote::RecordService;
use crate::store::{RecordStore, StoreState};

use super::draw;
use super::edit::DialogForm;
use super::panes::Column;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Search,
    ConfirmDelete(RecordId),
}

/// Set by store subscribers, consumed by the event loop.
#[derive(Default)]
struct Dirty {
    table: Cell<bool>,
    pagination: Cell<bool>,
    dialog: Cell<bool>,
}

impl Dirty {
    fn any(&self) -> bool {
        self.table.get() || self.pagination.get() || self.dialog.get()
    }
}

pub struct App<'a, S: RecordService> {
    pub(super) store: RecordStore<S>,
    runtime: &'a Runtime,
    config: &'a Config,
    pub(super) mode: Mode,
    pub(super) search_input: Input,
    pub(super) selected: usize,
    pub(super) form: DialogForm,
    pub(super) confirm_popup: PopupState,
    pub(super) status: Option<String>,
    dirty: Rc<Dirty>,
    subscriptions: Vec<SubscriptionId>,
}

impl<'a, S: RecordService> App<'a, S> {
    pub fn new(mut store: RecordStore<S>, runtime: &'a Runtime, config: &'a Config) -> Self {
        let dirty = Rc::new(Dirty::default());

        let mut subscriptions = Vec::new();

        // table renderer
        let table = Rc::clone(&dirty);
        subscriptions.push(store.subscribe(
            Notice::DataChanged,
            Rc::new(move |_: &StoreState| -> Result<()> {
                table.table.set(true);
                Ok(())
            }),
        ));

        // pagination renderer
        let pagination = Rc::clone(&dirty);
        subscriptions.push(store.subscribe(
            Notice::DataChanged,
            Rc::new(move |_: &StoreState| -> Result<()> {
                pagination.pagination.set(true);
                Ok(())
            }),
        ));

        // dialog renderer
        let dialog = Rc::clone(&dirty);
        subscriptions.push(store.subscribe(
            Notice::DialogChanged,
            Rc::new(move |_: &StoreState| -> Result<()> {
                dialog.dialog.set(true);
                Ok(())
            }),
        ));

        Self {
            store,
            runtime,
            config,
            mode: Mode::Browse,
            search_input: Input::default(),
            selected: 0,
            form: DialogForm::default(),
            confirm_popup: PopupState::default(),
            status: None,
            dirty,
            subscriptions,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        let _panics = logging::PanicLogGuard::install();
        enable_raw_mode()?;
        let mut stdout = stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop<B>(&mut self, terminal: &mut Terminal<B>) -> Result<()>
    where
        B: ratatui::backend::Backend,
    {
        self.set_status("Loading records...");
        draw::render(terminal, self)?;
        self.reload();

        let mut needs_draw = true;
        loop {
            if self.dirty.any() {
                self.apply_notifications();
                needs_draw = true;
            }
            if needs_draw {
                draw::render(terminal, self)?;
                needs_draw = false;
            }

            if event::poll(Duration::from_millis(250))? {
                match event::read()? {
                    Event::Key(key) => {
                        if self.handle_key(key)? {
                            break;
                        }
                        needs_draw = true;
                    }
                    Event::Resize(_, _) => needs_draw = true,
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// React to what the store announced since the last frame.
    fn apply_notifications(&mut self) {
        if self.dirty.table.replace(false) {
            let rows = self.store.state().page_slice().len();
            self.selected = self.selected.min(rows.saturating_sub(1));
        }
        self.dirty.pagination.set(false);

        if self.dirty.dialog.replace(false) {
            let dialog = self.store.state().dialog();
            if dialog.open {
                if let Some(draft) = &dialog.draft {
                    self.form = DialogForm::from_record(draft);
                }
            } else {
                self.form = DialogForm::default();
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        // Ctrl+C always quits
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return Ok(true);
        }

        if self.store.state().dialog().open {
            self.handle_dialog_key(key);
            return Ok(false);
        }

        match self.mode {
            Mode::ConfirmDelete(id) => {
                self.handle_confirm_key(key, id);
                Ok(false)
            }
            Mode::Search => {
                self.handle_search_key(key);
                Ok(false)
            }
            Mode::Browse => Ok(self.handle_browse_key(key)),
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('/') => self.mode = Mode::Search,
            KeyCode::Esc => {
                if !self.store.state().search_query().is_empty() {
                    self.search_input.reset();
                    self.store.set_search_query("");
                }
            }
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char('l') | KeyCode::Right | KeyCode::PageDown => {
                let page = self.store.state().current_page();
                self.goto_page(page.saturating_add(1));
            }
            KeyCode::Char('h') | KeyCode::Left | KeyCode::PageUp => {
                let page = self.store.state().current_page();
                self.goto_page(page.saturating_sub(1));
            }
            KeyCode::Char('g') | KeyCode::Home => self.goto_page(1),
            KeyCode::Char('G') | KeyCode::End => {
                let last = self.store.state().page_count();
                self.goto_page(last);
            }
            KeyCode::Char('a') => self.store.open_create_dialog(),
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(record) = self.selected_record() {
                    self.store.open_edit_dialog(&record);
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(record) = self.selected_record() {
                    self.mode = Mode::ConfirmDelete(record.id);
                }
            }
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char(c) => {
                if let Some(column) = Column::from_digit(c) {
                    self.store.set_sort_key(column.sort_key());
                    self.selected = 0;
                }
            }
            _ => {}
        }
        false
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                self.mode = Mode::Browse;
            }
            _ => {
                let before = self.search_input.value().to_string();
                self.search_input.handle_event(&Event::Key(key));
                if self.search_input.value() != before {
                    self.store.set_search_query(self.search_input.value());
                    self.selected = 0;
                }
            }
        }
    }

    fn handle_dialog_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.store.close_dialog(),
            KeyCode::Tab | KeyCode::Down => self.form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.form.focus_prev(),
            KeyCode::Enter => self.submit_dialog(),
            _ => {
                self.form.handle_key_event(key);
            }
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent, id: RecordId) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                self.mode = Mode::Browse;
                match self.runtime.block_on(self.store.delete_record(id)) {
                    Ok(_) => self.set_status(format!("Deleted record #{id}")),
                    Err(err) => self.set_status(format!("Delete failed: {err}")),
                }
            }
            KeyCode::Char('n') | KeyCode::Char('q') | KeyCode::Esc => {
                self.mode = Mode::Browse;
            }
            _ => {}
        }
    }

    fn submit_dialog(&mut self) {
        let missing = self.form.missing();
        if !missing.is_empty() {
            let labels: Vec<&str> = missing.iter().map(|field| field.label()).collect();
            self.set_status(format!("Required: {}", labels.join(", ")));
            return;
        }

        let dialog = self.store.state().dialog();
        let Some(draft) = dialog.draft.as_ref() else {
            return;
        };
        let record = self.form.apply_to(draft);
        let edit_mode = dialog.edit_mode;

        if edit_mode {
            let id = record.id;
            match self.runtime.block_on(self.store.update_record(record)) {
                Ok(_) => self.set_status(format!("Saved record #{id}")),
                Err(err) => self.set_status(format!("Save failed: {err}")),
            }
        } else {
            match self.runtime.block_on(self.store.create_record(record.into_new())) {
                Ok(id) => self.set_status(format!("Created record #{id}")),
                Err(err) => self.set_status(format!("Create failed: {err}")),
            }
        }
    }

    fn reload(&mut self) {
        self.selected = 0;
        let outcome = self.runtime.block_on(self.store.load_all());
        // the store keeps its query when the load fails
        self.search_input = Input::new(self.store.state().search_query().to_string());
        match outcome {
            Ok(count) => self.set_status(format!("Loaded {count} records")),
            Err(err) => self.set_status(format!("Load failed: {err}")),
        }
    }

    /// Page moves are clamped here; the store takes pages as given.
    fn goto_page(&mut self, page: usize) {
        let last = self.store.state().page_count();
        if last == 0 {
            return;
        }
        let page = page.clamp(1, last);
        if page != self.store.state().current_page() {
            self.store.set_current_page(page);
            self.selected = 0;
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let rows = self.store.state().page_slice().len();
        if rows == 0 {
            self.selected = 0;
            return;
        }
        let next = self.selected as isize + delta;
        self.selected = next.clamp(0, rows as isize - 1) as usize;
    }

    fn selected_record(&self) -> Option<Record> {
        self.store
            .state()
            .page_slice()
            .get(self.selected)
            .map(|record| (*record).clone())
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub(super) fn ui_colors(&self) -> &UiColors {
        &self.config.ui.colors
    }
}

impl<S: RecordService> Drop for App<'_, S> {
    fn drop(&mut self) {
        for id in self.subscriptions.drain(..) {
            self.store.unsubscribe(id);
        }
    }
}
