//! Document store contract.
//!
//! Collections hold JSON-object documents keyed by a string id. Queries
//! support equality filters, a single ordering (ties broken by document id in
//! the same direction), start-after cursors and a limit. This is the subset
//! of the hosted document database the storefront relies on.

use std::fmt;

use async_trait::async_trait;
use ruya_core::SortDirection;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

/// A stored document: a JSON object.
pub type Document = Map<String, Value>;

/// Sentinel value replaced with the store's clock when the document is written.
pub const SERVER_TIMESTAMP: &str = "__server_timestamp__";

/// Field value asking the store to stamp the write time.
#[must_use]
pub fn server_timestamp() -> Value {
    Value::String(SERVER_TIMESTAMP.to_owned())
}

/// Whether a value is the server timestamp sentinel.
#[must_use]
pub fn is_server_timestamp(value: &Value) -> bool {
    value.as_str() == Some(SERVER_TIMESTAMP)
}

/// Errors returned by a [`DocumentStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The service could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// Security rules rejected the call.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The addressed document or collection does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A document could not be converted to or from its typed form.
    #[error("invalid document {path}: {reason}")]
    InvalidDocument {
        /// Document path.
        path: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The service answered with an error.
    #[error("service error: {0}")]
    Service(String),

    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Slash-separated collection path, e.g. `products` or `users/u1/favorites`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// Create a collection path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The path as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Address a document inside this collection.
    #[must_use]
    pub fn doc(&self, id: impl Into<String>) -> DocumentPath {
        DocumentPath {
            collection: self.clone(),
            id: id.into(),
        }
    }

    /// Split into the parent document path (if nested) and the collection id.
    #[must_use]
    pub fn split_parent(&self) -> (Option<&str>, &str) {
        match self.0.rsplit_once('/') {
            Some((parent, id)) => (Some(parent), id),
            None => (None, &self.0),
        }
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document address: collection plus id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    collection: CollectionPath,
    id: String,
}

impl DocumentPath {
    /// The owning collection.
    #[must_use]
    pub const fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    /// The document id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// A collection nested under this document.
    #[must_use]
    pub fn subcollection(&self, name: &str) -> CollectionPath {
        CollectionPath(format!("{self}/{name}"))
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Equality filter on a document field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

impl FieldFilter {
    /// `field == value`.
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Ordering on a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

impl OrderBy {
    /// Order by `field` in `direction`.
    #[must_use]
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Same field, opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            field: self.field.clone(),
            direction: self.direction.reversed(),
        }
    }
}

/// Position of a document within an ordering, used for "start after".
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    /// Value of the ordered field (`Null` when the query is unordered).
    pub value: Value,
    /// Document id, the tie-breaker.
    pub document_id: String,
}

impl Cursor {
    /// Cursor positioned at `snapshot` under `order`.
    #[must_use]
    pub fn at(snapshot: &Snapshot, order: Option<&OrderBy>) -> Self {
        let value = order
            .and_then(|o| field_value(&snapshot.data, &o.field))
            .cloned()
            .unwrap_or(Value::Null);
        Self {
            value,
            document_id: snapshot.id.clone(),
        }
    }
}

/// A collection query.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: CollectionPath,
    pub filters: Vec<FieldFilter>,
    pub order_by: Option<OrderBy>,
    pub start_after: Option<Cursor>,
    pub limit: Option<usize>,
}

impl Query {
    /// Query every document of `collection`.
    #[must_use]
    pub const fn new(collection: CollectionPath) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order_by: None,
            start_after: None,
            limit: None,
        }
    }

    /// Add an equality filter.
    #[must_use]
    pub fn filter(mut self, filter: FieldFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Set the ordering.
    #[must_use]
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }

    /// Start strictly after `cursor`.
    #[must_use]
    pub fn start_after(mut self, cursor: Option<Cursor>) -> Self {
        self.start_after = cursor;
        self
    }

    /// Return at most `limit` documents.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A document read from a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub id: String,
    pub data: Document,
}

impl Snapshot {
    /// Decode the document into `T`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidDocument` if the fields don't match `T`.
    pub fn decode<T: DeserializeOwned>(&self, collection: &CollectionPath) -> Result<T, StoreError> {
        from_document(&collection.doc(self.id.clone()), self.data.clone())
    }
}

/// Look up a possibly dotted field path (`address.city`) in a document.
#[must_use]
pub fn field_value<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let first = doc.get(parts.next()?)?;
    parts.try_fold(first, |value, part| value.as_object()?.get(part))
}

/// Serialize a typed value into a document.
///
/// # Errors
///
/// Returns `StoreError::InvalidDocument` if `value` does not serialize to a JSON object.
pub fn to_document<T: Serialize>(path: &str, value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::InvalidDocument {
            path: path.to_owned(),
            reason: format!("expected an object, got {other}"),
        }),
        Err(e) => Err(StoreError::InvalidDocument {
            path: path.to_owned(),
            reason: e.to_string(),
        }),
    }
}

/// Deserialize a document into a typed value.
///
/// # Errors
///
/// Returns `StoreError::InvalidDocument` if the fields don't match `T`.
pub fn from_document<T: DeserializeOwned>(
    path: &DocumentPath,
    doc: Document,
) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(doc)).map_err(|e| StoreError::InvalidDocument {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

/// Remote document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document; `None` if it does not exist.
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError>;

    /// Create or replace a document.
    async fn set(&self, path: &DocumentPath, data: Document) -> Result<(), StoreError>;

    /// Delete a document. Deleting a missing document succeeds.
    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError>;

    /// Create a document with a store-generated id and return the id.
    async fn add(&self, collection: &CollectionPath, data: Document) -> Result<String, StoreError>;

    /// Run a query.
    async fn query(&self, query: &Query) -> Result<Vec<Snapshot>, StoreError>;

    /// Count documents matching `filters`.
    async fn count(
        &self,
        collection: &CollectionPath,
        filters: &[FieldFilter],
    ) -> Result<u64, StoreError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_paths() {
        let users = CollectionPath::new("users");
        let user = users.doc("u1");
        assert_eq!(user.to_string(), "users/u1");

        let favorites = user.subcollection("favorites");
        assert_eq!(favorites.as_str(), "users/u1/favorites");
        assert_eq!(favorites.split_parent(), (Some("users/u1"), "favorites"));
        assert_eq!(users.split_parent(), (None, "users"));
    }

    #[test]
    fn test_field_value_follows_dots() {
        let doc = json!({"address": {"city": "Beirut"}, "name": "x"});
        let doc = doc.as_object().unwrap();
        assert_eq!(field_value(doc, "address.city"), Some(&json!("Beirut")));
        assert_eq!(field_value(doc, "name"), Some(&json!("x")));
        assert_eq!(field_value(doc, "address.street"), None);
        assert_eq!(field_value(doc, "name.first"), None);
    }

    #[test]
    fn test_cursor_takes_ordered_field() {
        let snapshot = Snapshot {
            id: "p1".to_owned(),
            data: json!({"price": 12.5}).as_object().unwrap().clone(),
        };
        let order = OrderBy::new("price", SortDirection::Ascending);
        let cursor = Cursor::at(&snapshot, Some(&order));
        assert_eq!(cursor.value, json!(12.5));
        assert_eq!(cursor.document_id, "p1");

        let unordered = Cursor::at(&snapshot, None);
        assert_eq!(unordered.value, Value::Null);
    }

    #[test]
    fn test_to_document_rejects_non_objects() {
        assert!(to_document("x/y", &42).is_err());
        assert!(to_document("x/y", &json!({"a": 1})).is_ok());
    }
}
