//! Application state for the terminal address book.
//!
//! This module holds the active screen, the navigation routes, transient
//! notifications and the plumbing for postal lookups that run off the UI
//! thread.

use super::form::{EditTarget, FormController, LookupTicket};
use super::table::{FilterColumn, TableController};
use crate::domain::AddressFields;
use crate::infrastructure::{LookupError, PostalLookup, RecordStore, SlotBackend, StoreError};
use log::{debug, info, warn};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

/// A navigable view.
///
/// # Examples
///
/// ```
/// use cepbook::application::Route;
///
/// assert_eq!(Route::parse("/formUser/7"), Some(Route::Edit(7)));
/// assert_eq!(Route::Edit(7).path(), "/formUser/7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `/`
    Listing,
    /// `/formUser`
    Create,
    /// `/formUser/{id}`
    Edit(u64),
}

impl Route {
    pub fn parse(path: &str) -> Option<Route> {
        let trimmed = path.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Some(Route::Listing);
        }
        let rest = trimmed.strip_prefix("/formUser")?;
        if rest.is_empty() {
            return Some(Route::Create);
        }
        // Ids start at 1; 0 marks records that were stored without one.
        let id = rest
            .strip_prefix('/')?
            .parse::<u64>()
            .ok()
            .filter(|id| *id != 0)?;
        Some(Route::Edit(id))
    }

    /// Like [`Route::parse`], falling back to the listing.
    pub fn parse_or_listing(path: &str) -> Route {
        Route::parse(path).unwrap_or_else(|| {
            warn!("unknown route {path:?}, showing the listing");
            Route::Listing
        })
    }

    pub fn path(&self) -> String {
        match self {
            Route::Listing => "/".to_string(),
            Route::Create => "/formUser".to_string(),
            Route::Edit(id) => format!("/formUser/{id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A transient message shown in the status bar until the next key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// How key presses are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Moving through the listing
    Browse,
    /// Typing into one of the listing filters
    Filter(FilterColumn),
    /// Waiting for a yes/no on a delete
    ConfirmDelete,
    /// Filling in the address form
    Form,
}

#[derive(Debug)]
pub enum Screen {
    Listing(TableController),
    Form(FormController),
}

/// A lookup that finished on a worker thread.
#[derive(Debug)]
pub struct LookupCompletion {
    pub ticket: LookupTicket,
    pub result: Result<AddressFields, LookupError>,
}

/// Main application state.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use cepbook::application::{App, AppMode, Route};
/// use cepbook::domain::AddressFields;
/// use cepbook::infrastructure::{LookupError, MemorySlot, PostalLookup, RecordStore};
///
/// struct Offline;
///
/// impl PostalLookup for Offline {
///     fn lookup(&self, cep: &str) -> Result<AddressFields, LookupError> {
///         Err(LookupError::NotFound(cep.to_string()))
///     }
/// }
///
/// let app = App::new(RecordStore::new(MemorySlot::new()), Arc::new(Offline), Route::Listing);
/// assert_eq!(app.mode, AppMode::Browse);
/// ```
pub struct App<B: SlotBackend> {
    pub store: RecordStore<B>,
    pub route: Route,
    pub screen: Screen,
    pub mode: AppMode,
    pub notification: Option<Notification>,
    pub should_quit: bool,
    lookup: Arc<dyn PostalLookup>,
    sessions: u64,
    completions_tx: Sender<LookupCompletion>,
    completions_rx: Receiver<LookupCompletion>,
}

impl<B: SlotBackend> App<B> {
    pub fn new(store: RecordStore<B>, lookup: Arc<dyn PostalLookup>, initial: Route) -> Self {
        let (completions_tx, completions_rx) = mpsc::channel();
        let mut app = Self {
            store,
            route: Route::Listing,
            screen: Screen::Listing(TableController::default()),
            mode: AppMode::Browse,
            notification: None,
            should_quit: false,
            lookup,
            sessions: 0,
            completions_tx,
            completions_rx,
        };
        app.navigate(initial);
        app
    }

    /// Switches to `route`, tearing down the current screen.
    pub fn navigate(&mut self, route: Route) {
        info!("navigating to {}", route.path());
        self.route = route;
        match route {
            Route::Listing => {
                let (table, problem) = TableController::load(&self.store);
                if problem.is_some() {
                    self.notification = Some(Notification::error("Could not load saved addresses"));
                }
                self.screen = Screen::Listing(table);
                self.mode = AppMode::Browse;
            }
            Route::Create => {
                self.screen = Screen::Form(FormController::create(self.next_session()));
                self.mode = AppMode::Form;
            }
            Route::Edit(id) => {
                let session = self.next_session();
                let listing = self.store.list();
                let (form, target) = FormController::edit(session, id, &listing.records);
                if listing.problem.is_some() {
                    self.notification = Some(Notification::error("Could not load the address for editing"));
                } else if target == EditTarget::Missing {
                    warn!("no address with id {id} to edit");
                    self.notification = Some(Notification::error(format!(
                        "Address {id} not found; saving will create a new one"
                    )));
                }
                self.screen = Screen::Form(form);
                self.mode = AppMode::Form;
            }
        }
    }

    fn next_session(&mut self) -> u64 {
        self.sessions += 1;
        self.sessions
    }

    pub fn table(&self) -> Option<&TableController> {
        match &self.screen {
            Screen::Listing(table) => Some(table),
            Screen::Form(_) => None,
        }
    }

    pub fn table_mut(&mut self) -> Option<&mut TableController> {
        match &mut self.screen {
            Screen::Listing(table) => Some(table),
            Screen::Form(_) => None,
        }
    }

    pub fn form(&self) -> Option<&FormController> {
        match &self.screen {
            Screen::Form(form) => Some(form),
            Screen::Listing(_) => None,
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut FormController> {
        match &mut self.screen {
            Screen::Form(form) => Some(form),
            Screen::Listing(_) => None,
        }
    }

    pub fn add_address(&mut self) {
        self.navigate(Route::Create);
    }

    pub fn edit_selected(&mut self) {
        let route = self
            .table()
            .and_then(|table| table.edit_route(table.selected));
        if let Some(route) = route {
            self.navigate(route);
        }
    }

    pub fn request_delete_selected(&mut self) {
        let Some(table) = self.table_mut() else {
            return;
        };
        let selected = table.selected;
        if table.request_delete(selected) {
            self.mode = AppMode::ConfirmDelete;
        }
    }

    pub fn confirm_delete(&mut self) {
        self.mode = AppMode::Browse;
        let Screen::Listing(table) = &mut self.screen else {
            return;
        };
        match table.confirm_delete(&self.store) {
            Ok(Some(_)) => {
                self.notification = Some(Notification::success("Address removed"));
            }
            Ok(None) => {}
            Err(StoreError::Changed(index)) => {
                warn!("delete refused, position {index} changed since the listing was loaded");
                self.navigate(Route::Listing);
                self.notification = Some(Notification::error(
                    "Saved addresses changed; nothing was removed. The list has been reloaded",
                ));
            }
            Err(e) => {
                warn!("delete failed: {e}");
                self.notification = Some(Notification::error(format!("Could not remove the address: {e}")));
            }
        }
    }

    pub fn cancel_delete(&mut self) {
        if let Some(table) = self.table_mut() {
            table.cancel_delete();
        }
        self.mode = AppMode::Browse;
    }

    /// Starts a postal lookup for the form's CEP on a worker thread.
    pub fn search_postal_code(&mut self) {
        let Some(form) = self.form_mut() else {
            return;
        };
        match form.search_postal_code() {
            Ok(ticket) => self.spawn_lookup(ticket),
            Err(e) => self.notification = Some(Notification::error(e.to_string())),
        }
    }

    fn spawn_lookup(&self, ticket: LookupTicket) {
        let lookup = Arc::clone(&self.lookup);
        let tx = self.completions_tx.clone();
        thread::spawn(move || {
            let result = lookup.lookup(&ticket.cep);
            // The receiver only goes away when the app shuts down.
            let _ = tx.send(LookupCompletion { ticket, result });
        });
    }

    /// Applies every lookup that has finished since the last call.
    pub fn poll_lookups(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.complete_lookup(completion);
            handled += 1;
        }
        handled
    }

    /// Hands a finished lookup to the form that asked for it, if it is
    /// still open.
    pub fn complete_lookup(&mut self, completion: LookupCompletion) {
        let LookupCompletion { ticket, result } = completion;
        let note = match &mut self.screen {
            Screen::Form(form) if form.session() == ticket.session => {
                form.apply_lookup(ticket.request, result)
            }
            _ => {
                debug!("dropping lookup for closed form session {}", ticket.session);
                None
            }
        };
        if note.is_some() {
            self.notification = note;
        }
    }

    /// Saves the form and returns to the listing on success.
    pub fn submit_form(&mut self) {
        let Some(form) = self.form() else {
            return;
        };
        match form.submit(&self.store) {
            Ok(_) => {
                self.notification = Some(Notification::success("Address saved"));
                self.navigate(Route::Listing);
            }
            Err(e) => {
                self.notification = Some(Notification::error(e.to_string()));
            }
        }
    }

    /// Leaves the form without saving.
    pub fn close_form(&mut self) {
        self.navigate(Route::Listing);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AddressRecord, Field};
    use crate::infrastructure::MemorySlot;
    use std::time::{Duration, Instant};

    struct StubLookup {
        found: bool,
    }

    impl PostalLookup for StubLookup {
        fn lookup(&self, cep: &str) -> Result<AddressFields, LookupError> {
            if self.found {
                Ok(AddressFields {
                    logradouro: "Praça da Sé".to_string(),
                    bairro: "Sé".to_string(),
                    localidade: "São Paulo".to_string(),
                    uf: "SP".to_string(),
                })
            } else {
                Err(LookupError::NotFound(cep.to_string()))
            }
        }
    }

    fn app_with(slot: MemorySlot, found: bool) -> App<MemorySlot> {
        App::new(RecordStore::new(slot), Arc::new(StubLookup { found }), Route::Listing)
    }

    fn record(id: u64, name: &str) -> AddressRecord {
        AddressRecord {
            id,
            name: name.to_string(),
            address_name: "Casa".to_string(),
            cep: "01001-000".to_string(),
            logradouro: "Rua".to_string(),
            bairro: "Centro".to_string(),
            localidade: "Recife".to_string(),
            uf: "PE".to_string(),
        }
    }

    fn slot_with(records: &[AddressRecord]) -> MemorySlot {
        MemorySlot::with_contents(serde_json::to_string(records).unwrap())
    }

    fn fill_user_fields(app: &mut App<MemorySlot>) {
        let form = app.form_mut().unwrap();
        form.update_field(Field::Name, "Ana");
        form.update_field(Field::AddressName, "Casa");
        form.update_field(Field::Cep, "01001000");
    }

    fn wait_for_lookup(app: &mut App<MemorySlot>) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while app.poll_lookups() == 0 {
            assert!(Instant::now() < deadline, "lookup never completed");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_route_parse() {
        assert_eq!(Route::parse("/"), Some(Route::Listing));
        assert_eq!(Route::parse(""), Some(Route::Listing));
        assert_eq!(Route::parse("/formUser"), Some(Route::Create));
        assert_eq!(Route::parse("/formUser/"), Some(Route::Create));
        assert_eq!(Route::parse("/formUser/12"), Some(Route::Edit(12)));
        assert_eq!(Route::parse("/formUser/abc"), None);
        assert_eq!(Route::parse("/elsewhere"), None);
        assert_eq!(Route::parse("/formUserX"), None);
        assert_eq!(Route::parse("/formUser/0"), None);
    }

    #[test]
    fn test_route_path() {
        assert_eq!(Route::Listing.path(), "/");
        assert_eq!(Route::Create.path(), "/formUser");
        assert_eq!(Route::Edit(3).path(), "/formUser/3");
    }

    #[test]
    fn test_unknown_path_falls_back_to_listing() {
        assert_eq!(Route::parse_or_listing("/nowhere"), Route::Listing);
        assert_eq!(Route::parse_or_listing("/formUser/4"), Route::Edit(4));
        assert_eq!(Route::parse_or_listing("/formUser/0"), Route::Listing);
    }

    #[test]
    fn test_listing_with_malformed_slot_notifies() {
        let app = app_with(MemorySlot::with_contents("not json"), true);
        assert!(app.table().unwrap().visible().is_empty());
        let note = app.notification.unwrap();
        assert_eq!(note.level, NotificationLevel::Error);
    }

    #[test]
    fn test_create_flow_saves_and_returns_to_listing() {
        let mut app = app_with(MemorySlot::new(), true);
        app.add_address();
        assert_eq!(app.mode, AppMode::Form);
        fill_user_fields(&mut app);

        app.search_postal_code();
        wait_for_lookup(&mut app);
        assert_eq!(app.form().unwrap().draft.localidade, "São Paulo");
        assert_eq!(app.notification.as_ref().unwrap().level, NotificationLevel::Success);

        app.submit_form();
        assert_eq!(app.route, Route::Listing);
        assert_eq!(app.notification, Some(Notification::success("Address saved")));
        let table = app.table().unwrap();
        assert_eq!(table.visible().len(), 1);
        assert_eq!(table.visible()[0].1.id, 1);
    }

    #[test]
    fn test_two_creates_get_distinct_increasing_ids() {
        let mut app = app_with(MemorySlot::new(), true);
        for _ in 0..2 {
            app.add_address();
            fill_user_fields(&mut app);
            app.form_mut().unwrap().draft.fill_address(AddressFields {
                logradouro: "Rua".to_string(),
                bairro: "Centro".to_string(),
                localidade: "Olinda".to_string(),
                uf: "PE".to_string(),
            });
            app.submit_form();
        }
        let ids: Vec<u64> = app.store.load().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_incomplete_submit_stays_on_form() {
        let mut app = app_with(MemorySlot::new(), true);
        app.add_address();
        fill_user_fields(&mut app);
        app.submit_form();

        assert_eq!(app.route, Route::Create);
        assert_eq!(app.notification.as_ref().unwrap().level, NotificationLevel::Error);
        assert_eq!(app.store.backend().writes(), 0);
    }

    #[test]
    fn test_invalid_cep_notifies_without_lookup() {
        let mut app = app_with(MemorySlot::new(), true);
        app.add_address();
        app.form_mut().unwrap().update_field(Field::Cep, "123");
        app.search_postal_code();

        assert!(!app.form().unwrap().is_lookup_pending());
        assert_eq!(app.notification.as_ref().unwrap().level, NotificationLevel::Error);
    }

    #[test]
    fn test_failed_lookup_notifies_and_keeps_draft() {
        let mut app = app_with(MemorySlot::new(), false);
        app.add_address();
        fill_user_fields(&mut app);
        app.search_postal_code();
        wait_for_lookup(&mut app);

        let form = app.form().unwrap();
        assert!(form.draft.localidade.is_empty());
        assert_eq!(form.draft.name, "Ana");
        assert_eq!(app.notification, Some(Notification::error("Could not look up the CEP")));
    }

    #[test]
    fn test_lookup_after_leaving_form_is_ignored() {
        let mut app = app_with(MemorySlot::new(), true);
        app.add_address();
        fill_user_fields(&mut app);
        let ticket = app.form_mut().unwrap().search_postal_code().unwrap();

        app.close_form();
        app.add_address();
        app.complete_lookup(LookupCompletion {
            ticket,
            result: Ok(AddressFields::default()),
        });

        assert!(app.notification.is_none());
        assert!(!app.form().unwrap().is_lookup_pending());
    }

    #[test]
    fn test_edit_missing_id_notifies() {
        let mut app = app_with(slot_with(&[record(1, "Ana")]), true);
        app.navigate(Route::Edit(9));
        assert_eq!(app.mode, AppMode::Form);
        assert!(app.notification.as_ref().unwrap().message.contains('9'));
        assert!(app.form().unwrap().draft.name.is_empty());
    }

    #[test]
    fn test_edit_selected_and_submit_replaces_in_place() {
        let mut app = app_with(slot_with(&[record(1, "Ana"), record(2, "Bia")]), true);
        app.table_mut().unwrap().select_next();
        app.edit_selected();
        assert_eq!(app.route, Route::Edit(2));
        assert_eq!(app.form().unwrap().draft.name, "Bia");

        app.form_mut().unwrap().update_field(Field::Name, "Beatriz");
        app.submit_form();

        let records = app.store.load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id, 2);
        assert_eq!(records[1].name, "Beatriz");
    }

    #[test]
    fn test_delete_confirm_and_cancel() {
        let mut app = app_with(slot_with(&[record(1, "Ana"), record(2, "Bia")]), true);

        app.request_delete_selected();
        assert_eq!(app.mode, AppMode::ConfirmDelete);
        app.cancel_delete();
        assert_eq!(app.mode, AppMode::Browse);
        assert_eq!(app.store.load().unwrap().len(), 2);

        app.request_delete_selected();
        app.confirm_delete();
        assert_eq!(app.mode, AppMode::Browse);
        assert_eq!(app.notification, Some(Notification::success("Address removed")));
        let names: Vec<String> = app.store.load().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Bia"]);
    }

    #[test]
    fn test_edit_id_zero_never_binds_to_unidentified_record() {
        let mut legacy = record(0, "Velho");
        legacy.address_name = "Antigo".to_string();
        let mut app = app_with(slot_with(&[legacy.clone(), record(1, "Ana")]), true);

        app.navigate(Route::Edit(0));
        assert!(app.form().unwrap().draft.name.is_empty());
        fill_user_fields(&mut app);
        app.form_mut().unwrap().draft.fill_address(AddressFields {
            logradouro: "Rua".to_string(),
            bairro: "Centro".to_string(),
            localidade: "Olinda".to_string(),
            uf: "PE".to_string(),
        });
        app.submit_form();

        let records = app.store.load().unwrap();
        assert_eq!(records[0], legacy);
        assert_eq!(records[2].id, 2);
        assert_eq!(app.table().unwrap().visible().len(), 2);
    }

    #[test]
    fn test_delete_after_external_change_is_refused_and_reloads() {
        let mut app = app_with(slot_with(&[record(1, "Ana"), record(2, "Bia")]), true);
        let current = vec![record(2, "Bia")];
        app.store.save(&current).unwrap();

        app.request_delete_selected();
        assert_eq!(app.table().unwrap().pending_delete().map(|r| r.id), Some(1));
        app.confirm_delete();

        assert_eq!(app.mode, AppMode::Browse);
        assert_eq!(app.store.load().unwrap(), current);
        assert_eq!(app.notification.as_ref().unwrap().level, NotificationLevel::Error);
        let ids: Vec<u64> = app.table().unwrap().visible().iter().map(|(_, r)| r.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_delete_on_empty_listing_does_not_prompt() {
        let mut app = app_with(MemorySlot::new(), true);
        app.request_delete_selected();
        assert_eq!(app.mode, AppMode::Browse);
    }
}
