// Collection entry endpoints, scoped under `/collections/{id}/entries/`.

use crate::client::{Operation, ShelfClient};
use crate::error::Error;
use crate::types::{CollectionEntry, CreateEntryRequest, UpdateEntryRequest};

const LIST: Operation = Operation::new("fetch", "collection entries");
const GET: Operation = Operation::new("fetch", "collection entry");
const CREATE: Operation = Operation::new("create", "collection entry");
const UPDATE: Operation = Operation::new("update", "collection entry");
const DELETE: Operation = Operation::new("delete", "collection entry");

impl ShelfClient {
    pub async fn list_entries(&self, collection_id: i64) -> Result<Vec<CollectionEntry>, Error> {
        self.get(&format!("collections/{collection_id}/entries/"), LIST)
            .await
    }

    pub async fn get_entry(
        &self,
        collection_id: i64,
        entry_id: i64,
    ) -> Result<CollectionEntry, Error> {
        self.get(
            &format!("collections/{collection_id}/entries/{entry_id}"),
            GET,
        )
        .await
    }

    pub async fn create_entry(
        &self,
        collection_id: i64,
        request: &CreateEntryRequest,
    ) -> Result<CollectionEntry, Error> {
        self.post(
            &format!("collections/{collection_id}/entries/"),
            request,
            CREATE,
        )
        .await
    }

    pub async fn update_entry(
        &self,
        collection_id: i64,
        entry_id: i64,
        request: &UpdateEntryRequest,
    ) -> Result<CollectionEntry, Error> {
        self.put(
            &format!("collections/{collection_id}/entries/{entry_id}"),
            request,
            UPDATE,
        )
        .await
    }

    pub async fn delete_entry(&self, collection_id: i64, entry_id: i64) -> Result<(), Error> {
        self.delete(
            &format!("collections/{collection_id}/entries/{entry_id}"),
            DELETE,
        )
        .await
    }
}
