//! The record store: canonical record set, view state and dialog state.
//!
//! Renderers never touch the data directly. They call the mutation methods
//! below, and on every [`Notice`] they re-read the accessors of
//! [`StoreState`]. State is always committed before a notice is published.

use std::collections::HashSet;

use thiserror::Error;

use crate::events::{EventBus, Handler, Notice, SubscriptionId};
use crate::model::{NewRecord, Record, RecordId, SortDirection, SortKey};
use crate::remote::{RecordService, ServiceError};
use crate::view::{self, Sort};

pub const DEFAULT_PAGE_SIZE: usize = 5;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Remote(#[from] ServiceError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogState {
    pub open: bool,
    /// false means the dialog creates a new record
    pub edit_mode: bool,
    pub draft: Option<Record>,
}

/// Everything the store owns, with read-only accessors for renderers.
#[derive(Debug)]
pub struct StoreState {
    records: Vec<Record>,
    query: String,
    sort: Option<Sort>,
    page: usize,
    page_size: usize,
    dialog: DialogState,
    load_error: Option<String>,
    next_local_id: RecordId,
}

impl StoreState {
    fn new(page_size: usize) -> Self {
        Self {
            records: Vec::new(),
            query: String::new(),
            sort: None,
            page: 1,
            page_size: page_size.max(1),
            dialog: DialogState::default(),
            load_error: None,
            next_local_id: 1,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn find(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Record set after search, then sort.
    pub fn filtered(&self) -> Vec<&Record> {
        view::filter_and_sort(&self.records, &self.query, self.sort)
    }

    /// The page-size window of [`Self::filtered`] at the current page.
    pub fn page_slice(&self) -> Vec<&Record> {
        let filtered = self.filtered();
        let bounds = view::page_bounds(filtered.len(), self.page, self.page_size);
        filtered[bounds].to_vec()
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered().len()
    }

    pub fn page_count(&self) -> usize {
        view::page_count(self.filtered_len(), self.page_size)
    }

    pub fn current_page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn search_query(&self) -> &str {
        &self.query
    }

    pub fn sort(&self) -> Option<Sort> {
        self.sort
    }

    pub fn dialog(&self) -> &DialogState {
        &self.dialog
    }

    /// Message of the last failed full load, cleared by a successful one.
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    fn note_ids(&mut self) {
        if let Some(max) = self.records.iter().map(|record| record.id).max() {
            self.next_local_id = self.next_local_id.max(max.saturating_add(1));
        }
    }

    fn allocate_local_id(&mut self) -> RecordId {
        self.note_ids();
        let id = self.next_local_id;
        self.next_local_id = id.saturating_add(1);
        id
    }

    /// Keep the page inside `[1, page_count]` after the record set changed.
    fn clamp_page(&mut self) {
        let last = self.page_count().max(1);
        self.page = self.page.clamp(1, last);
    }
}

pub struct RecordStore<S> {
    service: S,
    state: StoreState,
    bus: EventBus<StoreState>,
}

impl<S: RecordService> RecordStore<S> {
    pub fn new(service: S, page_size: usize) -> Self {
        Self {
            service,
            state: StoreState::new(page_size),
            bus: EventBus::new(),
        }
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    #[cfg(test)]
    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn subscribe(&mut self, notice: Notice, handler: Handler<StoreState>) -> SubscriptionId {
        self.bus.subscribe(notice, handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    fn emit(&self, notice: Notice) {
        let report = self.bus.publish(notice, &self.state);
        for failure in &report.failures {
            tracing::warn!(
                %notice,
                subscription = ?failure.subscription,
                error = %failure.error,
                "notification handler failed"
            );
        }
        if report.is_clean() {
            tracing::trace!(%notice, delivered = report.delivered, "published");
        }
    }

    /// Replace the record set with a full fetch and reset the view state.
    ///
    /// On failure the previous records are kept and the error is readable
    /// through [`StoreState::load_error`]. A data notice fires either way.
    pub async fn load_all(&mut self) -> Result<usize, StoreError> {
        let result = self.service.list().await;
        let outcome = match result {
            Ok(records) => {
                let mut seen = HashSet::new();
                let total = records.len();
                let records: Vec<Record> = records
                    .into_iter()
                    .filter(|record| seen.insert(record.id))
                    .collect();
                if records.len() != total {
                    tracing::warn!(dropped = total - records.len(), "service returned duplicate ids");
                }

                let count = records.len();
                self.state.records = records;
                self.state.query.clear();
                self.state.sort = None;
                self.state.page = 1;
                self.state.load_error = None;
                self.state.note_ids();
                tracing::info!(count, "loaded records");
                Ok(count)
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to load records");
                self.state.load_error = Some(err.to_string());
                Err(err.into())
            }
        };

        self.emit(Notice::DataChanged);
        outcome
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.state.query = query.into();
        self.state.page = 1;
        tracing::debug!(query = %self.state.query, matches = self.state.filtered_len(), "search changed");
        self.emit(Notice::DataChanged);
    }

    /// Sort by `key`; the same key again flips the direction.
    pub fn set_sort_key(&mut self, key: SortKey) {
        let direction = match self.state.sort {
            Some(current) if current.key == key => current.direction.toggled(),
            _ => SortDirection::Ascending,
        };
        self.state.sort = Some(Sort { key, direction });
        self.state.page = 1;
        tracing::debug!(%key, ?direction, "sort changed");
        self.emit(Notice::DataChanged);
    }

    /// Jump to `page` as given. Callers keep it within `[1, page_count]`;
    /// a page outside that range shows an empty slice.
    pub fn set_current_page(&mut self, page: usize) {
        self.state.page = page;
        self.emit(Notice::DataChanged);
    }

    pub fn open_create_dialog(&mut self) {
        let id = self.state.allocate_local_id();
        self.state.dialog = DialogState {
            open: true,
            edit_mode: false,
            draft: Some(Record::blank(id)),
        };
        self.emit(Notice::DialogChanged);
    }

    pub fn open_edit_dialog(&mut self, record: &Record) {
        self.state.dialog = DialogState {
            open: true,
            edit_mode: true,
            draft: Some(record.clone()),
        };
        self.emit(Notice::DialogChanged);
    }

    pub fn close_dialog(&mut self) {
        self.state.dialog = DialogState::default();
        self.emit(Notice::DialogChanged);
    }

    /// Create a record remotely and append the service's copy.
    ///
    /// Returns the id the record ended up with. If the service hands back
    /// an id that is already taken, a fresh local id is used instead.
    pub async fn create_record(&mut self, payload: NewRecord) -> Result<RecordId, StoreError> {
        let mut created = match self.service.create(&payload).await {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(error = %err, "failed to create record");
                return Err(err.into());
            }
        };

        if self.state.find(created.id).is_some() {
            let local = self.state.allocate_local_id();
            tracing::warn!(remote_id = created.id, local_id = local, "service assigned a taken id");
            created.id = local;
        }

        let id = created.id;
        self.state.records.push(created);
        self.state.note_ids();
        self.state.clamp_page();
        tracing::info!(id, "created record");
        self.emit(Notice::DataChanged);
        self.close_dialog();
        Ok(id)
    }

    /// Update a record remotely and replace the local entry with the same id.
    ///
    /// Returns whether a local entry was replaced; an unknown id is a no-op.
    pub async fn update_record(&mut self, record: Record) -> Result<bool, StoreError> {
        if let Err(err) = self.service.update(&record).await {
            tracing::warn!(id = record.id, error = %err, "failed to update record");
            return Err(err.into());
        }

        let id = record.id;
        let replaced = match self.state.records.iter_mut().find(|r| r.id == id) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        };
        if replaced {
            tracing::info!(id, "updated record");
        } else {
            tracing::debug!(id, "updated record is not in the local set");
        }

        self.state.clamp_page();
        self.emit(Notice::DataChanged);
        self.close_dialog();
        Ok(replaced)
    }

    /// Delete a record remotely and drop it locally.
    ///
    /// Returns whether a local entry was removed. On failure nothing is
    /// published.
    pub async fn delete_record(&mut self, id: RecordId) -> Result<bool, StoreError> {
        if let Err(err) = self.service.delete(id).await {
            tracing::warn!(id, error = %err, "failed to delete record");
            return Err(err.into());
        }

        let before = self.state.records.len();
        self.state.records.retain(|record| record.id != id);
        let removed = self.state.records.len() != before;
        if removed {
            tracing::info!(id, "deleted record");
        } else {
            tracing::debug!(id, "deleted record is not in the local set");
        }

        self.state.clamp_page();
        self.emit(Notice::DataChanged);
        Ok(removed)
    }
}
