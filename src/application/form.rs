//! The address form: a draft bound to either a new record or an existing one.

use super::state::Notification;
use crate::domain::{
    AddressDraft, AddressFields, AddressRecord, DomainError, DomainResult, Field, format_cep,
    is_valid_cep,
};
use crate::infrastructure::{LookupError, RecordStore, SlotBackend, StoreError};
use log::{info, warn};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Whether the form creates a record or edits the one with the given id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Create,
    Edit(u64),
}

/// Outcome of binding the form to an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Found,
    Missing,
}

/// A postal lookup the form is waiting for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    /// Form instance that asked; a completion for another session is stale.
    pub session: u64,
    /// Request number within the session; only the latest one is applied.
    pub request: u64,
    pub cep: String,
}

#[derive(Debug)]
pub struct FormController {
    pub phase: FormPhase,
    pub draft: AddressDraft,
    pub focus: Field,
    session: u64,
    requests: u64,
    pending_lookup: Option<u64>,
}

impl FormController {
    pub fn create(session: u64) -> Self {
        Self {
            phase: FormPhase::Create,
            draft: AddressDraft::default(),
            focus: Field::Name,
            session,
            requests: 0,
            pending_lookup: None,
        }
    }

    /// Binds the form to `id`, pre-filling the draft from `records`.
    ///
    /// When no record has that id the draft stays empty.
    pub fn edit(session: u64, id: u64, records: &[AddressRecord]) -> (Self, EditTarget) {
        let mut form = Self::create(session);
        form.phase = FormPhase::Edit(id);
        match records.iter().find(|record| record.has_id() && record.id == id) {
            Some(record) => {
                form.draft = AddressDraft::from(record);
                (form, EditTarget::Found)
            }
            None => (form, EditTarget::Missing),
        }
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn bound_id(&self) -> Option<u64> {
        match self.phase {
            FormPhase::Create => None,
            FormPhase::Edit(id) => Some(id),
        }
    }

    pub fn is_lookup_pending(&self) -> bool {
        self.pending_lookup.is_some()
    }

    pub fn update_field(&mut self, field: Field, raw: &str) {
        let value = match field {
            Field::Cep => format_cep(raw),
            _ => raw.to_string(),
        };
        self.draft.set(field, value);
    }

    pub fn focus_next(&mut self) {
        self.move_focus(1);
    }

    pub fn focus_previous(&mut self) {
        self.move_focus(Field::EDITABLE.len() - 1);
    }

    fn move_focus(&mut self, step: usize) {
        let fields = Field::EDITABLE;
        let current = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(current + step) % fields.len()];
    }

    /// Appends a typed character to the focused field.
    pub fn type_char(&mut self, c: char) {
        if !self.focus.is_editable() {
            return;
        }
        let mut value = self.draft.get(self.focus).to_string();
        value.push(c);
        self.update_field(self.focus, &value);
    }

    /// Removes the last character of the focused field.
    pub fn backspace(&mut self) {
        if !self.focus.is_editable() {
            return;
        }
        let mut value = self.draft.get(self.focus).to_string();
        value.pop();
        self.update_field(self.focus, &value);
    }

    /// Validates the CEP and opens a new lookup request for it.
    pub fn search_postal_code(&mut self) -> DomainResult<LookupTicket> {
        if !is_valid_cep(&self.draft.cep) {
            return Err(DomainError::InvalidCep(self.draft.cep.clone()));
        }
        self.requests += 1;
        self.pending_lookup = Some(self.requests);
        Ok(LookupTicket {
            session: self.session,
            request: self.requests,
            cep: self.draft.cep.clone(),
        })
    }

    /// Applies a finished lookup.
    ///
    /// Returns `None` if `request` was superseded by a later search.
    pub fn apply_lookup(
        &mut self,
        request: u64,
        result: Result<AddressFields, LookupError>,
    ) -> Option<Notification> {
        if self.pending_lookup != Some(request) {
            return None;
        }
        self.pending_lookup = None;
        match result {
            Ok(fields) => {
                self.draft.fill_address(fields);
                Some(Notification::success("Address filled in from the CEP"))
            }
            Err(e) => {
                warn!("CEP lookup failed: {e}");
                Some(Notification::error("Could not look up the CEP"))
            }
        }
    }

    /// Validates the draft and saves it, replacing the bound record if any.
    pub fn submit<B: SlotBackend>(&self, store: &RecordStore<B>) -> Result<AddressRecord, SubmitError> {
        let blank = self.draft.blank_fields();
        if !blank.is_empty() {
            return Err(DomainError::IncompleteDraft(blank).into());
        }
        let saved = store.upsert(self.draft.to_record(0), self.bound_id())?;
        info!("saved address {} ({})", saved.id, saved.address_name);
        Ok(saved)
    }
}
