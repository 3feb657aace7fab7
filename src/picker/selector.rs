use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::model::{
    CatalogModel, InstalledModel, ManageAction, RunningModel, Selection, Tab,
};

use super::list::{FilterList, FilterState};

/// Below this terminal width the detail pane is hidden entirely.
pub const DETAIL_PANE_MIN_WIDTH: u16 = 90;

/// Terminal states of the selector. Nothing is processed after either.
#[derive(Debug)]
pub enum Outcome {
    Cancelled,
    Committed(Selection),
}

/// The tabbed, filterable, single-select state machine behind the picker.
/// Processes one event at a time on the foreground loop.
pub struct Selector {
    pub(super) tabs: Vec<Tab>,
    pub(super) active: usize,
    pub(super) approved: Vec<ManageAction>,
    pub(super) installable: FilterList<CatalogModel>,
    pub(super) installed: FilterList<InstalledModel>,
    pub(super) running: FilterList<RunningModel>,
    pub(super) help_visible: bool,
    pub(super) width: u16,
    pub(super) height: u16,
}

impl Selector {
    pub fn new(
        tabs: Vec<Tab>,
        approved: Vec<ManageAction>,
        installable: Vec<CatalogModel>,
        installed: Vec<InstalledModel>,
        running: Vec<RunningModel>,
    ) -> Self {
        Self {
            tabs,
            active: 0,
            approved,
            installable: FilterList::new(Tab::Install.list_title(), installable),
            installed: FilterList::new(Tab::Manage.list_title(), installed),
            running: FilterList::new(Tab::Monitor.list_title(), running),
            help_visible: false,
            width: 0,
            height: 0,
        }
    }

    pub fn active_tab(&self) -> Tab {
        self.tabs[self.active]
    }

    pub fn has_tab_row(&self) -> bool {
        self.tabs.len() > 1
    }

    pub fn detail_visible(&self) -> bool {
        self.width > DETAIL_PANE_MIN_WIDTH
    }

    /// Width of the list pane after reserving detail-pane space.
    pub fn list_width(&self) -> u16 {
        if self.detail_visible() {
            self.width * 3 / 5
        } else {
            self.width
        }
    }

    pub fn handle_resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    fn active_is_filtering(&self) -> bool {
        match self.active_tab() {
            Tab::Install => self.installable.is_filtering(),
            Tab::Manage => self.installed.is_filtering(),
            Tab::Monitor => self.running.is_filtering(),
        }
    }

    fn active_filter_applied(&self) -> bool {
        let state = match self.active_tab() {
            Tab::Install => self.installable.filter_state(),
            Tab::Manage => self.installed.filter_state(),
            Tab::Monitor => self.running.filter_state(),
        };
        state == FilterState::Applied
    }

    fn forward_filter_key(&mut self, code: KeyCode) {
        match self.active_tab() {
            Tab::Install => self.installable.handle_filter_key(code),
            Tab::Manage => self.installed.handle_filter_key(code),
            Tab::Monitor => self.running.handle_filter_key(code),
        }
    }

    fn active_move_up(&mut self) {
        match self.active_tab() {
            Tab::Install => self.installable.move_up(),
            Tab::Manage => self.installed.move_up(),
            Tab::Monitor => self.running.move_up(),
        }
    }

    fn active_move_down(&mut self) {
        match self.active_tab() {
            Tab::Install => self.installable.move_down(),
            Tab::Manage => self.installed.move_down(),
            Tab::Monitor => self.running.move_down(),
        }
    }

    fn start_filter(&mut self) {
        match self.active_tab() {
            Tab::Install => self.installable.start_filter(),
            Tab::Manage => self.installed.start_filter(),
            Tab::Monitor => self.running.start_filter(),
        }
    }

    fn clear_filter(&mut self) {
        match self.active_tab() {
            Tab::Install => self.installable.clear_filter(),
            Tab::Manage => self.installed.clear_filter(),
            Tab::Monitor => self.running.clear_filter(),
        }
    }

    /// Read the active list's highlighted entry into the matching selection
    /// slot. An empty backing list yields a selection with no model; the
    /// picker treats that as a failed pick.
    fn commit(&mut self, manage_action: Option<ManageAction>) -> Outcome {
        let mut selection = Selection {
            action: Some(self.active_tab()),
            manage_action,
            approved_actions: self.approved.clone(),
            ..Default::default()
        };
        match self.active_tab() {
            Tab::Install => selection.installable = self.installable.selected().cloned(),
            Tab::Manage => selection.installed = self.installed.selected().cloned(),
            Tab::Monitor => selection.running = self.running.selected().cloned(),
        }
        Outcome::Committed(selection)
    }

    /// Process one key event. `Some` outcome terminates the state machine.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Outcome> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            return Some(Outcome::Cancelled);
        }

        // While filtering, the active list owns every keystroke.
        if self.active_is_filtering() {
            self.forward_filter_key(key.code);
            return None;
        }

        // While the help overlay is up, only quit and help-close work.
        if self.help_visible {
            match key.code {
                KeyCode::Char('q') => return Some(Outcome::Cancelled),
                KeyCode::Char('?') | KeyCode::Esc => self.help_visible = false,
                _ => {}
            }
            return None;
        }

        match key.code {
            KeyCode::Char('q') => return Some(Outcome::Cancelled),
            KeyCode::Esc => {
                if self.active_filter_applied() {
                    self.clear_filter();
                } else {
                    return Some(Outcome::Cancelled);
                }
            }
            KeyCode::Char('?') => self.help_visible = true,

            KeyCode::Tab | KeyCode::Right | KeyCode::Char('n') | KeyCode::Char('l') => {
                self.active = (self.active + 1).min(self.tabs.len() - 1);
            }
            KeyCode::BackTab | KeyCode::Left | KeyCode::Char('p') | KeyCode::Char('h') => {
                self.active = self.active.saturating_sub(1);
            }

            KeyCode::Enter => return Some(self.commit(None)),

            KeyCode::Up | KeyCode::Char('k') => self.active_move_up(),
            KeyCode::Down | KeyCode::Char('j') => self.active_move_down(),
            KeyCode::Char('/') => self.start_filter(),

            // Manage-action shortcuts bypass the generic commit path; they
            // only fire on the manage tab for approved actions.
            KeyCode::Char(c) => {
                if self.active_tab() == Tab::Manage {
                    let action = self.approved.iter().copied().find(|a| a.shortcut() == c);
                    if let Some(action) = action {
                        return Some(self.commit(Some(action)));
                    }
                }
            }

            _ => {}
        }
        None
    }
}
