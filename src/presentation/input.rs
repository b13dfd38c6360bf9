use crate::application::{App, AppMode, FilterColumn};
use crate::infrastructure::SlotBackend;
use crossterm::event::{KeyCode, KeyModifiers};

pub struct InputHandler;

impl InputHandler {
    pub fn handle_key_event<B: SlotBackend>(app: &mut App<B>, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) && key == KeyCode::Char('c') {
            app.should_quit = true;
            return;
        }

        app.notification = None;

        match app.mode {
            AppMode::Browse => Self::handle_browse_mode(app, key),
            AppMode::Filter(_) => Self::handle_filter_mode(app, key),
            AppMode::ConfirmDelete => Self::handle_confirm_mode(app, key),
            AppMode::Form => Self::handle_form_mode(app, key, modifiers),
        }
    }

    fn handle_browse_mode<B: SlotBackend>(app: &mut App<B>, key: KeyCode) {
        match key {
            KeyCode::Char('q') => {
                app.should_quit = true;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(table) = app.table_mut() {
                    table.select_previous();
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(table) = app.table_mut() {
                    table.select_next();
                }
            }
            KeyCode::Char('a') | KeyCode::Char('+') => {
                app.add_address();
            }
            KeyCode::Enter | KeyCode::Char('e') => {
                app.edit_selected();
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                app.request_delete_selected();
            }
            KeyCode::Char('/') | KeyCode::Char('f') => {
                app.mode = AppMode::Filter(FilterColumn::Name);
            }
            _ => {}
        }
    }

    fn handle_filter_mode<B: SlotBackend>(app: &mut App<B>, key: KeyCode) {
        let AppMode::Filter(column) = app.mode else {
            return;
        };
        match key {
            KeyCode::Esc | KeyCode::Enter => {
                app.mode = AppMode::Browse;
            }
            KeyCode::Tab => {
                app.mode = AppMode::Filter(column.next());
            }
            KeyCode::Backspace => {
                if let Some(table) = app.table_mut() {
                    table.pop_filter_char(column);
                }
            }
            KeyCode::Char(c) => {
                if let Some(table) = app.table_mut() {
                    table.push_filter_char(column, c);
                }
            }
            _ => {}
        }
    }

    fn handle_confirm_mode<B: SlotBackend>(app: &mut App<B>, key: KeyCode) {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.confirm_delete();
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.cancel_delete();
            }
            _ => {}
        }
    }

    fn handle_form_mode<B: SlotBackend>(app: &mut App<B>, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) {
            if key == KeyCode::Char('l') {
                app.search_postal_code();
            }
            return;
        }

        match key {
            KeyCode::Esc => {
                app.close_form();
            }
            KeyCode::Enter => {
                app.submit_form();
            }
            KeyCode::F(3) => {
                app.search_postal_code();
            }
            KeyCode::Tab | KeyCode::Down => {
                if let Some(form) = app.form_mut() {
                    form.focus_next();
                }
            }
            KeyCode::BackTab | KeyCode::Up => {
                if let Some(form) = app.form_mut() {
                    form.focus_previous();
                }
            }
            KeyCode::Backspace => {
                if let Some(form) = app.form_mut() {
                    form.backspace();
                }
            }
            KeyCode::Char(c) => {
                if let Some(form) = app.form_mut() {
                    form.type_char(c);
                }
            }
            _ => {}
        }
    }
}
