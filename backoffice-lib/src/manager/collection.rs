//! The tabular collection manager.

use std::collections::HashMap;
use std::collections::HashSet;
use std::future::Future;

use tokio_util::sync::CancellationToken;

use super::state::CellEdit;
use super::state::CellKey;
use super::state::Notice;
use super::state::PendingMutation;
use crate::api::CollectionApi;
use crate::error::Error;
use crate::error::FieldError;
use crate::model::CollectionSchema;
use crate::model::FieldKind;
use crate::model::Record;
use crate::model::RecordId;
use crate::model::UpdatePolicy;
use crate::model::Value;
use crate::query::FilterTerm;
use crate::query::SearchScope;
use crate::query::SortDirective;
use crate::query::derive_filtered;
use crate::query::derive_sorted;

const LOAD_FAILED: &str = "Could not load records. Please try again.";
const SAVE_FAILED: &str = "Could not save changes. Please try again.";
const DELETE_FAILED: &str = "Could not delete the record. Please try again.";

/// In-memory view over one backend collection.
///
/// Holds the last fetched records in backend order together with the
/// filter term, the active sort, the pending mutation and per-cell edit
/// state. Mutating operations take `&mut self`, so at most one handler runs
/// at a time.
///
/// Every backend call races the manager's [`CancellationToken`]. Once the
/// token is cancelled (by [`shutdown`](Self::shutdown), by dropping the
/// manager, or through a parent token) calls return [`Error::Cancelled`] and
/// their responses are discarded without touching local state.
///
/// # Example
///
/// ```ignore
/// let schema = catalog::prices();
/// let mut prices = CollectionManager::new(client.collection(&schema), schema);
///
/// prices.load().await?;
/// prices.set_filter_term("a4");
/// prices.request_sort("price_value")?;
/// for record in prices.view()? {
///     println!("{}", record.display("price_name"));
/// }
/// ```
pub struct CollectionManager<A: CollectionApi> {
    api: A,
    schema: CollectionSchema,
    records: Vec<Record>,
    filter: FilterTerm,
    sort: SortDirective,
    scope: SearchScope,
    pending: PendingMutation,
    create_open: bool,
    cells: HashMap<CellKey, CellEdit>,
    notices: Vec<Notice>,
    cancel: CancellationToken,
}

impl<A: CollectionApi> CollectionManager<A> {
    /// Creates an empty manager using the schema's default sort and scope.
    pub fn new(api: A, schema: CollectionSchema) -> Self {
        Self::with_token(api, schema, CancellationToken::new())
    }

    /// Creates a manager whose calls are also cancelled by `parent`.
    pub fn with_parent(api: A, schema: CollectionSchema, parent: &CancellationToken) -> Self {
        Self::with_token(api, schema, parent.child_token())
    }

    fn with_token(api: A, schema: CollectionSchema, cancel: CancellationToken) -> Self {
        Self {
            api,
            sort: schema.default_sort.clone(),
            scope: schema.search_scope,
            schema,
            records: Vec::new(),
            filter: FilterTerm::default(),
            pending: PendingMutation::None,
            create_open: false,
            cells: HashMap::new(),
            notices: Vec::new(),
            cancel,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn schema(&self) -> &CollectionSchema {
        &self.schema
    }

    /// Records in the order of the last successful fetch.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|r| r.id() == Some(id))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn filter_term(&self) -> &FilterTerm {
        &self.filter
    }

    pub fn sort(&self) -> &SortDirective {
        &self.sort
    }

    pub fn search_scope(&self) -> SearchScope {
        self.scope
    }

    pub fn set_search_scope(&mut self, scope: SearchScope) {
        self.scope = scope;
    }

    pub fn pending(&self) -> &PendingMutation {
        &self.pending
    }

    pub fn is_create_open(&self) -> bool {
        self.create_open
    }

    /// Returns the inline edit state of a cell.
    pub fn cell(&self, id: RecordId, field: &str) -> CellEdit {
        self.cells
            .get(&CellKey::new(id, field))
            .cloned()
            .unwrap_or_default()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drains the notices raised since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Returns a handle that cancels this manager's backend calls.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancels in-flight and future backend calls.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    // =========================================================================
    // Fetch, filter, sort
    // =========================================================================

    /// Replaces the collection with a full fetch.
    ///
    /// On failure the previous records are kept and one notice is raised.
    pub async fn load(&mut self) -> Result<(), Error> {
        match self.guarded(self.api.list()).await {
            Ok(records) => {
                self.records = unique_records(records, &self.schema.path);
                let live: HashSet<RecordId> = self.records.iter().filter_map(Record::id).collect();
                self.cells.retain(|key, _| live.contains(&key.id));
                log::debug!("Loaded {} {} records", self.records.len(), self.schema.path);
                Ok(())
            }
            Err(err) => Err(self.fail("load", LOAD_FAILED, err)),
        }
    }

    /// Sets the free-text filter; an empty term matches everything.
    pub fn set_filter_term(&mut self, term: impl Into<String>) {
        self.filter = FilterTerm::new(term);
    }

    /// Toggles the sort on `field`.
    ///
    /// The active field flips direction; any other field starts ascending.
    pub fn request_sort(&mut self, field: &str) -> Result<(), Error> {
        self.schema.require_kind(field)?;
        self.sort = self.sort.toggled(field);
        Ok(())
    }

    /// Filtered and sorted snapshot for rendering.
    pub fn view(&self) -> Result<Vec<&Record>, Error> {
        let filtered = derive_filtered(&self.records, &self.schema, &self.filter, self.scope);
        Ok(derive_sorted(filtered, &self.schema, &self.sort)?)
    }

    // =========================================================================
    // Create
    // =========================================================================

    pub fn open_create(&mut self) {
        self.create_open = true;
    }

    pub fn close_create(&mut self) {
        self.create_open = false;
    }

    /// Creates a record and refetches the collection.
    ///
    /// Validation runs first; an invalid payload never reaches the backend.
    /// On success the create dialog closes. A failed refetch after a
    /// successful create is reported through the load notice only.
    pub async fn create(&mut self, payload: Record) -> Result<Option<Record>, Error> {
        self.schema.validate(&payload)?;

        match self.guarded(self.api.create(payload)).await {
            Ok(created) => {
                self.create_open = false;
                self.notices.push(Notice::info("Record created."));
                if let Err(err) = self.load().await {
                    log::warn!("Refetch after create failed: {}", err);
                }
                Ok(created)
            }
            Err(err) => Err(self.fail("create", SAVE_FAILED, err)),
        }
    }

    /// Parses raw form input by field kind, then [`create`](Self::create)s it.
    pub async fn create_from_input<'a>(
        &mut self,
        input: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Option<Record>, Error> {
        let payload = self.schema.payload_from_input(input)?;
        self.create(payload).await
    }

    // =========================================================================
    // Edit
    // =========================================================================

    /// Opens the edit form for `id`, replacing any other pending mutation.
    pub fn begin_edit(&mut self, id: RecordId) -> Result<(), Error> {
        self.require_changes("editing")?;
        let record = self.require_record(id)?.clone();
        self.pending = PendingMutation::Edit(record);
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        if matches!(self.pending, PendingMutation::Edit(_)) {
            self.pending = PendingMutation::None;
        }
    }

    /// Submits the pending edit.
    ///
    /// `payload` is overlaid on the edit target and the full record is sent.
    /// On failure the edit stays pending.
    pub async fn update(&mut self, payload: Record) -> Result<(), Error> {
        self.require_changes("editing")?;
        let target = match &self.pending {
            PendingMutation::Edit(record) => record.clone(),
            _ => return Err(Error::InvalidOperation("no record is being edited".to_string())),
        };
        let id = target
            .id()
            .ok_or_else(|| Error::InvalidOperation("edit target has no id".to_string()))?;

        let mut full = target;
        full.merge(&payload);
        self.schema.validate(&full)?;

        match self.guarded(self.api.update(id, full.clone())).await {
            Ok(echoed) => {
                self.pending = PendingMutation::None;
                self.notices.push(Notice::info("Changes saved."));
                self.reconcile_update(id, full, echoed).await;
                Ok(())
            }
            Err(err) => Err(self.fail("update", SAVE_FAILED, err)),
        }
    }

    /// Parses raw form input by field kind, then [`update`](Self::update)s.
    pub async fn update_from_input<'a>(
        &mut self,
        input: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<(), Error> {
        let payload = self.schema.payload_from_input(input)?;
        self.update(payload).await
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Marks `id` for deletion; nothing is sent until confirmed.
    pub fn request_delete(&mut self, id: RecordId) -> Result<(), Error> {
        self.require_changes("deleting")?;
        let record = self.require_record(id)?.clone();
        self.pending = PendingMutation::Delete(record);
        Ok(())
    }

    pub fn cancel_delete(&mut self) {
        if matches!(self.pending, PendingMutation::Delete(_)) {
            self.pending = PendingMutation::None;
        }
    }

    /// Deletes the record awaiting confirmation.
    ///
    /// On failure the records and the pending delete are left as they were.
    pub async fn confirm_delete(&mut self) -> Result<(), Error> {
        self.require_changes("deleting")?;
        let id = match &self.pending {
            PendingMutation::Delete(record) => record.id(),
            _ => return Err(Error::InvalidOperation("no delete is pending".to_string())),
        }
        .ok_or_else(|| Error::InvalidOperation("delete target has no id".to_string()))?;

        match self.guarded(self.api.delete(id)).await {
            Ok(()) => {
                self.records.retain(|r| r.id() != Some(id));
                self.cells.retain(|key, _| key.id != id);
                self.pending = PendingMutation::None;
                self.notices.push(Notice::info("Record deleted."));
                Ok(())
            }
            Err(err) => Err(self.fail("delete", DELETE_FAILED, err)),
        }
    }

    // =========================================================================
    // Inline cell edit
    // =========================================================================

    /// Starts editing one cell, seeding the draft with its current text.
    ///
    /// A cell in the error state can be edited again.
    pub fn begin_cell_edit(&mut self, id: RecordId, field: &str) -> Result<(), Error> {
        self.require_editable(field)?;
        let draft = self.require_record(id)?.display(field);
        let key = CellKey::new(id, field);
        if matches!(self.cells.get(&key), Some(CellEdit::Submitting { .. })) {
            return Err(Error::InvalidOperation(format!("{} is being saved", field)));
        }
        self.cells.insert(key, CellEdit::Editing { draft });
        Ok(())
    }

    /// Replaces the draft text of a cell being edited.
    pub fn set_cell_draft(
        &mut self,
        id: RecordId,
        field: &str,
        text: impl Into<String>,
    ) -> Result<(), Error> {
        match self.cells.get_mut(&CellKey::new(id, field)) {
            Some(CellEdit::Editing { draft }) => {
                *draft = text.into();
                Ok(())
            }
            _ => Err(Error::InvalidOperation(format!("{} is not being edited", field))),
        }
    }

    /// Abandons an edit or dismisses a cell error.
    pub fn cancel_cell_edit(&mut self, id: RecordId, field: &str) {
        let key = CellKey::new(id, field);
        if matches!(
            self.cells.get(&key),
            Some(CellEdit::Editing { .. } | CellEdit::Error { .. })
        ) {
            self.cells.remove(&key);
        }
    }

    /// Sends the record with this one cell replaced.
    ///
    /// The new value is shown while the call is in flight. If the backend
    /// rejects it, the previous value is restored and the cell keeps the
    /// error. Invalid input stays in the editing state and is not sent.
    pub async fn commit_cell_edit(&mut self, id: RecordId, field: &str) -> Result<(), Error> {
        let key = CellKey::new(id, field);
        let draft = match self.cells.get(&key) {
            Some(CellEdit::Editing { draft }) => draft.clone(),
            _ => return Err(Error::InvalidOperation(format!("{} is not being edited", field))),
        };
        let kind = self.require_editable(field)?;
        let index = self.require_index(id)?;

        let value = kind.parse_input(&draft);
        let payload = self.records[index].with_field(field, value.clone());
        self.schema.validate(&payload)?;

        let previous = self.records[index].get(field).cloned();
        self.records[index].insert(field, value);
        self.cells.insert(
            key.clone(),
            CellEdit::Submitting {
                draft,
                previous: previous.clone(),
            },
        );

        match self.guarded(self.api.update(id, payload.clone())).await {
            Ok(echoed) => {
                self.cells.remove(&key);
                self.reconcile_update(id, payload, echoed).await;
                Ok(())
            }
            Err(err) => {
                self.restore_cell(id, field, previous.clone());
                if err.is_cancelled() {
                    self.cells.remove(&key);
                } else {
                    self.cells.insert(
                        key,
                        CellEdit::Error {
                            message: SAVE_FAILED.to_string(),
                            previous,
                        },
                    );
                }
                Err(self.fail("cell update", SAVE_FAILED, err))
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Races a backend call against the cancellation token.
    async fn guarded<T>(&self, call: impl Future<Output = Result<T, Error>>) -> Result<T, Error> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            result = call => result,
        }
    }

    /// Logs a failed call and raises its generic notice.
    fn fail(&mut self, action: &str, message: &str, err: Error) -> Error {
        if err.is_cancelled() {
            log::debug!("{} {} cancelled", self.schema.path, action);
        } else {
            log::error!("{} {} failed: {}", self.schema.path, action, err);
            self.notices.push(Notice::error(message));
        }
        err
    }

    /// Applies a successful update according to the collection's policy.
    async fn reconcile_update(&mut self, id: RecordId, sent: Record, echoed: Option<Record>) {
        match self.schema.update_policy {
            UpdatePolicy::Refetch => {
                if let Err(err) = self.load().await {
                    log::warn!("Refetch after update failed: {}", err);
                }
            }
            UpdatePolicy::PatchLocal => {
                let mut replacement = echoed.unwrap_or(sent);
                replacement.set_id(id);
                if let Some(slot) = self.records.iter_mut().find(|r| r.id() == Some(id)) {
                    *slot = replacement;
                }
            }
        }
    }

    fn restore_cell(&mut self, id: RecordId, field: &str, previous: Option<Value>) {
        if let Some(record) = self.records.iter_mut().find(|r| r.id() == Some(id)) {
            match previous {
                Some(value) => record.insert(field, value),
                None => {
                    record.remove(field);
                }
            }
        }
    }

    fn require_record(&self, id: RecordId) -> Result<&Record, Error> {
        self.record(id).ok_or(Error::NotFound { id })
    }

    fn require_index(&self, id: RecordId) -> Result<usize, Error> {
        self.records
            .iter()
            .position(|r| r.id() == Some(id))
            .ok_or(Error::NotFound { id })
    }

    fn require_changes(&self, action: &str) -> Result<(), Error> {
        if self.schema.allows_changes() {
            return Ok(());
        }
        Err(Error::InvalidOperation(format!(
            "{} does not support {}",
            self.schema.label, action
        )))
    }

    fn require_editable(&self, field: &str) -> Result<FieldKind, Error> {
        self.require_changes("editing")?;
        let spec = self
            .schema
            .spec(field)
            .ok_or_else(|| FieldError::undeclared(field, &self.schema.path))?;
        if !spec.editable {
            return Err(Error::InvalidOperation(format!("{} is read-only", field)));
        }
        Ok(spec.kind)
    }
}

impl<A: CollectionApi> Drop for CollectionManager<A> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl<A: CollectionApi> std::fmt::Debug for CollectionManager<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionManager")
            .field("collection", &self.schema.path)
            .field("records", &self.records.len())
            .field("filter", &self.filter.as_str())
            .field("sort", &self.sort)
            .field("pending", &self.pending)
            .finish()
    }
}

/// Keeps the first record per identifier, preserving arrival order.
fn unique_records(records: Vec<Record>, collection: &str) -> Vec<Record> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| match record.id() {
            Some(id) if seen.insert(id) => true,
            Some(id) => {
                log::warn!("{} returned duplicate id {}; keeping the first", collection, id);
                false
            }
            None => {
                log::warn!("{} returned a record without an id; skipping it", collection);
                false
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_records_keeps_first() {
        let records = vec![
            Record::with_id(RecordId(1)).set("name", "first"),
            Record::with_id(RecordId(2)),
            Record::with_id(RecordId(1)).set("name", "second"),
            Record::new(),
        ];
        let unique = unique_records(records, "prices");

        let ids: Vec<_> = unique.iter().filter_map(Record::id).collect();
        assert_eq!(ids, vec![RecordId(1), RecordId(2)]);
        assert_eq!(unique[0].get_string("name").unwrap(), Some("first"));
    }
}
