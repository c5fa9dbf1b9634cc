// Collections endpoints
//
// `/collections/` (list, create) and `/collections/{id}` (get, update,
// delete). Create maps a 422 rejection to `Error::Validation`.

use crate::client::{Operation, ShelfClient};
use crate::error::Error;
use crate::types::{Collection, CreateCollectionRequest, UpdateCollectionRequest};

const LIST: Operation = Operation::new("fetch", "collections");
const GET: Operation = Operation::new("fetch", "collection");
const CREATE: Operation = Operation::new("create", "collection");
const UPDATE: Operation = Operation::new("update", "collection");
const DELETE: Operation = Operation::new("delete", "collection");

impl ShelfClient {
    pub async fn list_collections(&self) -> Result<Vec<Collection>, Error> {
        self.get("collections/", LIST).await
    }

    pub async fn get_collection(&self, id: i64) -> Result<Collection, Error> {
        self.get(&format!("collections/{id}"), GET).await
    }

    /// Create a collection. The server assigns `id` and `user_id`.
    pub async fn create_collection(
        &self,
        request: &CreateCollectionRequest,
    ) -> Result<Collection, Error> {
        self.post("collections/", request, CREATE)
            .await
            .map_err(|e| match e {
                Error::RequestFailed {
                    status: 422,
                    detail,
                    ..
                } => Error::collection_validation(detail),
                other => other,
            })
    }

    pub async fn update_collection(
        &self,
        id: i64,
        request: &UpdateCollectionRequest,
    ) -> Result<Collection, Error> {
        self.put(&format!("collections/{id}"), request, UPDATE)
            .await
    }

    /// Delete a collection. Entries are removed server-side.
    pub async fn delete_collection(&self, id: i64) -> Result<(), Error> {
        self.delete(&format!("collections/{id}"), DELETE).await
    }
}
