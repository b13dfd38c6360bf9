//! The saved-address listing with per-column filters.

use super::state::Route;
use crate::domain::AddressRecord;
use crate::infrastructure::{RecordStore, SlotBackend, StoreError, StoreResult};

/// A filterable column of the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterColumn {
    Name,
    AddressName,
    Localidade,
    Uf,
}

impl FilterColumn {
    pub const ALL: [FilterColumn; 4] = [
        FilterColumn::Name,
        FilterColumn::AddressName,
        FilterColumn::Localidade,
        FilterColumn::Uf,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FilterColumn::Name => "Name",
            FilterColumn::AddressName => "Address",
            FilterColumn::Localidade => "City",
            FilterColumn::Uf => "State",
        }
    }

    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    fn value(self, record: &AddressRecord) -> &str {
        match self {
            FilterColumn::Name => &record.name,
            FilterColumn::AddressName => &record.address_name,
            FilterColumn::Localidade => &record.localidade,
            FilterColumn::Uf => &record.uf,
        }
    }
}

/// Case-insensitive substring filters; an empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnFilters {
    pub name: String,
    pub address_name: String,
    pub localidade: String,
    pub uf: String,
}

impl ColumnFilters {
    pub fn get(&self, column: FilterColumn) -> &str {
        match column {
            FilterColumn::Name => &self.name,
            FilterColumn::AddressName => &self.address_name,
            FilterColumn::Localidade => &self.localidade,
            FilterColumn::Uf => &self.uf,
        }
    }

    pub fn get_mut(&mut self, column: FilterColumn) -> &mut String {
        match column {
            FilterColumn::Name => &mut self.name,
            FilterColumn::AddressName => &mut self.address_name,
            FilterColumn::Localidade => &mut self.localidade,
            FilterColumn::Uf => &mut self.uf,
        }
    }

    pub fn matches(&self, record: &AddressRecord) -> bool {
        FilterColumn::ALL.into_iter().all(|column| {
            column
                .value(record)
                .to_lowercase()
                .contains(&self.get(column).to_lowercase())
        })
    }
}

#[derive(Debug, Default)]
pub struct TableController {
    records: Vec<AddressRecord>,
    pub filters: ColumnFilters,
    /// Selected row, as an index into [`TableController::visible`].
    pub selected: usize,
    pending_delete: Option<usize>,
}

impl TableController {
    /// Reads the collection once; later changes to the slot are not tracked.
    pub fn load<B: SlotBackend>(store: &RecordStore<B>) -> (Self, Option<StoreError>) {
        let listing = store.list();
        let table = Self {
            records: listing.records,
            ..Self::default()
        };
        (table, listing.problem)
    }

    pub fn records(&self) -> &[AddressRecord] {
        &self.records
    }

    /// Displayed rows paired with their position in the full collection.
    pub fn visible(&self) -> Vec<(usize, &AddressRecord)> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.has_id() && self.filters.matches(record))
            .collect()
    }

    pub fn set_filter(&mut self, column: FilterColumn, value: impl Into<String>) {
        *self.filters.get_mut(column) = value.into();
        self.clamp_selection();
    }

    pub fn push_filter_char(&mut self, column: FilterColumn, c: char) {
        self.filters.get_mut(column).push(c);
        self.clamp_selection();
    }

    pub fn pop_filter_char(&mut self, column: FilterColumn) {
        self.filters.get_mut(column).pop();
        self.clamp_selection();
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.visible().len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        let rows = self.visible().len();
        self.selected = self.selected.min(rows.saturating_sub(1));
    }

    /// Route to the edit form for a displayed row.
    pub fn edit_route(&self, display_index: usize) -> Option<Route> {
        self.visible()
            .get(display_index)
            .map(|(_, record)| Route::Edit(record.id))
    }

    /// Asks for confirmation before deleting a displayed row.
    ///
    /// Returns `false` when there is no such row.
    pub fn request_delete(&mut self, display_index: usize) -> bool {
        if display_index < self.visible().len() {
            self.pending_delete = Some(display_index);
            true
        } else {
            false
        }
    }

    /// The record awaiting delete confirmation, if any.
    pub fn pending_delete(&self) -> Option<&AddressRecord> {
        let index = self.pending_delete?;
        self.visible().get(index).map(|(_, record)| *record)
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Deletes the row awaiting confirmation and persists the result.
    ///
    /// The displayed row is resolved to its position in the full collection,
    /// so an active filter never removes a different record. The store
    /// refuses with [`StoreError::Changed`] when that position no longer
    /// holds the listed record.
    pub fn confirm_delete<B: SlotBackend>(
        &mut self,
        store: &RecordStore<B>,
    ) -> StoreResult<Option<AddressRecord>> {
        let Some(display_index) = self.pending_delete.take() else {
            return Ok(None);
        };
        let Some((index, record)) = self
            .visible()
            .get(display_index)
            .map(|(index, record)| (*index, (*record).clone()))
        else {
            return Ok(None);
        };
        self.records = store.delete_at(index, &record)?;
        self.clamp_selection();
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MemorySlot;

    fn record(id: u64, name: &str, city: &str, uf: &str) -> AddressRecord {
        AddressRecord {
            id,
            name: name.to_string(),
            address_name: "Casa".to_string(),
            cep: "01001-000".to_string(),
            logradouro: "Rua".to_string(),
            bairro: "Centro".to_string(),
            localidade: city.to_string(),
            uf: uf.to_string(),
        }
    }

    fn sample() -> Vec<AddressRecord> {
        vec![
            record(1, "Ana", "São Paulo", "SP"),
            record(2, "Bruno", "Recife", "PE"),
            record(3, "Carla", "Santos", "SP"),
        ]
    }

    fn loaded(records: &[AddressRecord]) -> (TableController, RecordStore<MemorySlot>) {
        let json = serde_json::to_string(records).unwrap();
        let store = RecordStore::new(MemorySlot::with_contents(json));
        let (table, problem) = TableController::load(&store);
        assert!(problem.is_none());
        (table, store)
    }

    fn visible_ids(table: &TableController) -> Vec<u64> {
        table.visible().iter().map(|(_, r)| r.id).collect()
    }

    #[test]
    fn test_load_malformed_slot_yields_empty_and_problem() {
        let store = RecordStore::new(MemorySlot::with_contents("[{"));
        let (table, problem) = TableController::load(&store);
        assert!(table.visible().is_empty());
        assert!(matches!(problem, Some(StoreError::Parse(_))));
    }

    #[test]
    fn test_filters_are_case_insensitive_substrings() {
        let (mut table, _) = loaded(&sample());
        assert_eq!(visible_ids(&table), vec![1, 2, 3]);

        table.set_filter(FilterColumn::Uf, "sp");
        assert_eq!(visible_ids(&table), vec![1, 3]);

        table.set_filter(FilterColumn::Localidade, "SANT");
        assert_eq!(visible_ids(&table), vec![3]);

        table.set_filter(FilterColumn::Localidade, "");
        table.set_filter(FilterColumn::Uf, "");
        assert_eq!(visible_ids(&table), vec![1, 2, 3]);
    }

    #[test]
    fn test_unmatched_name_filter_hides_everything() {
        let (mut table, _) = loaded(&sample());
        table.set_filter(FilterColumn::Name, "zzz");
        assert!(table.visible().is_empty());
        assert_eq!(table.records().len(), 3);
    }

    #[test]
    fn test_records_without_id_are_hidden() {
        let mut records = sample();
        records[1].id = 0;
        let (table, _) = loaded(&records);
        assert_eq!(visible_ids(&table), vec![1, 3]);
    }

    #[test]
    fn test_filter_typing_clamps_selection() {
        let (mut table, _) = loaded(&sample());
        table.select_next();
        table.select_next();
        table.select_next();
        assert_eq!(table.selected, 2);

        for c in "recife".chars() {
            table.push_filter_char(FilterColumn::Localidade, c);
        }
        assert_eq!(table.selected, 0);
        table.pop_filter_char(FilterColumn::Localidade);
        assert_eq!(table.filters.localidade, "recif");
    }

    #[test]
    fn test_confirm_delete_removes_exactly_one() {
        let (mut table, store) = loaded(&sample());
        assert!(table.request_delete(1));
        assert_eq!(table.pending_delete().map(|r| r.id), Some(2));

        let removed = table.confirm_delete(&store).unwrap();
        assert_eq!(removed.map(|r| r.id), Some(2));
        assert_eq!(visible_ids(&table), vec![1, 3]);
        let stored: Vec<u64> = store.load().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(stored, vec![1, 3]);
        assert!(table.pending_delete().is_none());
    }

    #[test]
    fn test_cancel_delete_changes_nothing() {
        let (mut table, store) = loaded(&sample());
        assert!(table.request_delete(0));
        table.cancel_delete();

        assert_eq!(table.confirm_delete(&store).unwrap(), None);
        assert_eq!(table.records().len(), 3);
        assert_eq!(store.backend().writes(), 0);
    }

    #[test]
    fn test_delete_under_filter_removes_displayed_record() {
        let (mut table, store) = loaded(&sample());
        table.set_filter(FilterColumn::Uf, "sp");
        // Row 1 of the filtered view is Carla, while position 1 of the full
        // collection is Bruno.
        assert!(table.request_delete(1));
        let removed = table.confirm_delete(&store).unwrap().unwrap();

        assert_eq!(removed.name, "Carla");
        let names: Vec<String> = store.load().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Ana", "Bruno"]);
    }

    #[test]
    fn test_confirm_delete_refuses_after_slot_changed() {
        let (mut table, store) = loaded(&sample());
        // Another writer replaced the collection after the listing was loaded.
        let current = vec![record(2, "Bruno", "Recife", "PE"), record(3, "Carla", "Santos", "SP")];
        store.save(&current).unwrap();
        let writes = store.backend().writes();

        assert!(table.request_delete(0));
        assert_eq!(table.pending_delete().map(|r| r.id), Some(1));
        assert!(matches!(table.confirm_delete(&store), Err(StoreError::Changed(0))));

        assert_eq!(store.load().unwrap(), current);
        assert_eq!(store.backend().writes(), writes);
        assert!(table.pending_delete().is_none());
    }

    #[test]
    fn test_request_delete_out_of_range() {
        let (mut table, _) = loaded(&sample());
        table.set_filter(FilterColumn::Name, "ana");
        assert!(!table.request_delete(1));
        assert!(table.pending_delete().is_none());
    }

    #[test]
    fn test_edit_route_uses_record_id() {
        let (mut table, _) = loaded(&sample());
        table.set_filter(FilterColumn::Uf, "pe");
        assert_eq!(table.edit_route(0), Some(Route::Edit(2)));
        assert_eq!(table.edit_route(1), None);
    }

    #[test]
    fn test_filter_column_cycle() {
        assert_eq!(FilterColumn::Name.next(), FilterColumn::AddressName);
        assert_eq!(FilterColumn::Uf.next(), FilterColumn::Name);
    }
}
