//! Per-collection endpoint and the collaborator seam used by the manager.

use async_trait::async_trait;

use crate::BackofficeClient;
use crate::error::Error;
use crate::model::CollectionSchema;
use crate::model::ID_FIELD;
use crate::model::Record;
use crate::model::RecordId;

/// The backend calls a [`CollectionManager`](crate::manager::CollectionManager)
/// depends on.
///
/// [`CollectionEndpoint`] is the HTTP implementation; tests substitute an
/// in-memory one.
#[async_trait]
pub trait CollectionApi: Send + Sync {
    /// Fetches the full collection in backend order.
    async fn list(&self) -> Result<Vec<Record>, Error>;

    /// Creates a record from a payload without an `id`.
    async fn create(&self, payload: Record) -> Result<Option<Record>, Error>;

    /// Replaces the record `id` with a full payload.
    async fn update(&self, id: RecordId, payload: Record) -> Result<Option<Record>, Error>;

    /// Deletes the record `id`.
    async fn delete(&self, id: RecordId) -> Result<(), Error>;
}

/// A client bound to one collection's routes.
#[derive(Debug, Clone)]
pub struct CollectionEndpoint {
    client: BackofficeClient,
    path: String,
    record_path: String,
    id_field: String,
    read_create_only: bool,
}

impl CollectionEndpoint {
    /// Returns the collection path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the path segment used for single-record calls.
    pub fn record_path(&self) -> &str {
        &self.record_path
    }

    fn require_changes(&self, action: &str) -> Result<(), Error> {
        if self.read_create_only {
            return Err(Error::InvalidOperation(format!(
                "{} does not support {}",
                self.path, action
            )));
        }
        Ok(())
    }

    /// Lifts a non-standard identifier key into the record id.
    fn adopt(&self, mut record: Record) -> Record {
        if self.id_field != ID_FIELD && record.id().is_none() && !record.adopt_id(&self.id_field) {
            log::warn!("{} record without {}", self.path, self.id_field);
        }
        record
    }
}

impl BackofficeClient {
    /// Returns an endpoint for the collection described by `schema`.
    pub fn collection(&self, schema: &CollectionSchema) -> CollectionEndpoint {
        CollectionEndpoint {
            client: self.clone(),
            path: schema.path.clone(),
            record_path: schema.record_path().to_string(),
            id_field: schema.id_field.clone(),
            read_create_only: !schema.allows_changes(),
        }
    }
}

#[async_trait]
impl CollectionApi for CollectionEndpoint {
    async fn list(&self) -> Result<Vec<Record>, Error> {
        let records = self.client.list_records(&self.path).await?;
        Ok(records.into_iter().map(|r| self.adopt(r)).collect())
    }

    async fn create(&self, payload: Record) -> Result<Option<Record>, Error> {
        let created = self.client.create_record(&self.path, payload).await?;
        Ok(created.map(|r| self.adopt(r)))
    }

    async fn update(&self, id: RecordId, payload: Record) -> Result<Option<Record>, Error> {
        self.require_changes("update")?;
        let updated = self
            .client
            .update_record(&self.record_path, id, payload)
            .await?;
        Ok(updated.map(|r| self.adopt(r)))
    }

    async fn delete(&self, id: RecordId) -> Result<(), Error> {
        self.require_changes("delete")?;
        self.client.delete_record(&self.record_path, id).await
    }
}
