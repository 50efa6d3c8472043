//! Firestore REST implementation of [`DocumentStore`].

use std::sync::Arc;

use async_trait::async_trait;
use ruya_core::SortDirection;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use super::values::{decode_fields, document_id, encode_fields, encode_value};
use crate::backend::{
    CollectionPath, Document, DocumentPath, DocumentStore, FieldFilter, Query, SessionSubscription,
    Snapshot, StoreError,
};
use crate::backend::document::is_server_timestamp;
use crate::config::FirebaseConfig;

/// Alias of the count aggregation.
const COUNT_ALIAS: &str = "total";

// =============================================================================
// FirestoreStore
// =============================================================================

/// Firestore client over the v1 REST API.
///
/// Calls carry the project API key and, when a session is attached, the
/// signed-in user's ID token so security rules see the user.
#[derive(Clone)]
pub struct FirestoreStore {
    inner: Arc<FirestoreStoreInner>,
}

struct FirestoreStoreInner {
    client: reqwest::Client,
    /// `https://.../v1/projects/{p}/databases/(default)/documents`
    documents_url: String,
    /// `projects/{p}/databases/(default)/documents`
    documents_name: String,
    api_key: SecretString,
    session: Option<SessionSubscription>,
}

impl FirestoreStore {
    /// Create a client for the configured project.
    #[must_use]
    pub fn new(config: &FirebaseConfig, session: Option<SessionSubscription>) -> Self {
        let documents_name = format!(
            "projects/{}/databases/(default)/documents",
            config.project_id
        );
        let base = config.firestore_url.as_str().trim_end_matches('/');
        Self {
            inner: Arc::new(FirestoreStoreInner {
                client: reqwest::Client::new(),
                documents_url: format!("{base}/{documents_name}"),
                documents_name,
                api_key: config.api_key.clone(),
                session,
            }),
        }
    }

    fn url(&self, suffix: &str) -> Result<Url, StoreError> {
        let mut url = Url::parse(&format!("{}{suffix}", self.inner.documents_url))
            .map_err(|e| StoreError::Service(format!("invalid Firestore URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("key", self.inner.api_key.expose_secret());
        Ok(url)
    }

    fn document_name(&self, path: &DocumentPath) -> String {
        format!("{}/{path}", self.inner.documents_name)
    }

    /// URL suffix of the document owning `collection`, empty for top-level.
    fn parent_suffix(collection: &CollectionPath) -> String {
        collection
            .split_parent()
            .0
            .map_or_else(String::new, |parent| format!("/{parent}"))
    }

    /// Send a request and decode the JSON body, mapping error statuses.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Option<Value>, StoreError> {
        let token = self
            .inner
            .session
            .as_ref()
            .and_then(SessionSubscription::current)
            .and_then(|user| user.id_token);
        let request = match token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.pointer("/error/message")?.as_str().map(str::to_owned))
                .unwrap_or_else(|| body.chars().take(200).collect());
            tracing::error!(status = %status, message = %message, "Firestore returned non-success status");
            return Err(match status {
                reqwest::StatusCode::FORBIDDEN | reqwest::StatusCode::UNAUTHORIZED => {
                    StoreError::PermissionDenied(message)
                }
                _ => StoreError::Service(format!("HTTP {status}: {message}")),
            });
        }

        if body.trim().is_empty() {
            return Ok(Some(Value::Null));
        }
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| StoreError::Service(format!("unreadable Firestore response: {e}")))
    }

    async fn commit(&self, write: Value) -> Result<(), StoreError> {
        let url = self.url(":commit")?;
        let request = self
            .inner
            .client
            .post(url)
            .json(&json!({ "writes": [write] }));
        self.send(request)
            .await?
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound("commit endpoint".to_owned()))
    }

    fn update_write(&self, path: &DocumentPath, data: &Document) -> Map<String, Value> {
        let mut data = data.clone();
        let stamped = take_server_timestamps(&mut data, "");

        let mut write = Map::new();
        write.insert(
            "update".to_owned(),
            json!({ "name": self.document_name(path), "fields": encode_fields(&data) }),
        );
        if !stamped.is_empty() {
            let transforms: Vec<Value> = stamped
                .into_iter()
                .map(|field| json!({ "fieldPath": field, "setToServerValue": "REQUEST_TIME" }))
                .collect();
            write.insert("updateTransforms".to_owned(), Value::Array(transforms));
        }
        write
    }

    fn reference(&self, collection: &CollectionPath, id: &str) -> Value {
        json!({ "referenceValue": self.document_name(&collection.doc(id)) })
    }

    fn structured_query(&self, query: &Query) -> Value {
        let (_, collection_id) = query.collection.split_parent();
        let mut structured = Map::new();
        structured.insert("from".to_owned(), json!([{ "collectionId": collection_id }]));
        if let Some(filter) = where_clause(&query.filters) {
            structured.insert("where".to_owned(), filter);
        }

        let mut order_by = Vec::new();
        let name_direction = query
            .order_by
            .as_ref()
            .map_or(SortDirection::Ascending, |o| o.direction);
        if let Some(order) = &query.order_by {
            order_by.push(json!({
                "field": { "fieldPath": order.field },
                "direction": direction(order.direction),
            }));
        }
        order_by.push(json!({
            "field": { "fieldPath": "__name__" },
            "direction": direction(name_direction),
        }));
        structured.insert("orderBy".to_owned(), Value::Array(order_by));

        if let Some(cursor) = &query.start_after {
            let mut values = Vec::new();
            if query.order_by.is_some() {
                values.push(encode_value(&cursor.value));
            }
            values.push(self.reference(&query.collection, &cursor.document_id));
            structured.insert(
                "startAt".to_owned(),
                json!({ "values": values, "before": false }),
            );
        }
        if let Some(limit) = query.limit {
            structured.insert("limit".to_owned(), json!(limit));
        }
        Value::Object(structured)
    }
}

impl std::fmt::Debug for FirestoreStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreStore")
            .field("documents_url", &self.inner.documents_url)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    #[instrument(skip(self), fields(path = %path))]
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        let url = self.url(&format!("/{path}"))?;
        let Some(body) = self.send(self.inner.client.get(url)).await? else {
            debug!("Document not found");
            return Ok(None);
        };
        Ok(Some(
            body.get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .unwrap_or_default(),
        ))
    }

    #[instrument(skip(self, data), fields(path = %path))]
    async fn set(&self, path: &DocumentPath, data: Document) -> Result<(), StoreError> {
        let write = self.update_write(path, &data);
        self.commit(Value::Object(write)).await
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError> {
        let url = self.url(&format!("/{path}"))?;
        self.send(self.inner.client.delete(url)).await?;
        Ok(())
    }

    #[instrument(skip(self, data), fields(collection = %collection))]
    async fn add(&self, collection: &CollectionPath, data: Document) -> Result<String, StoreError> {
        let id = Uuid::new_v4().simple().to_string();
        let mut write = self.update_write(&collection.doc(id.clone()), &data);
        write.insert("currentDocument".to_owned(), json!({ "exists": false }));
        self.commit(Value::Object(write)).await?;
        debug!(id = %id, "Document created");
        Ok(id)
    }

    #[instrument(skip(self, query), fields(collection = %query.collection))]
    async fn query(&self, query: &Query) -> Result<Vec<Snapshot>, StoreError> {
        let url = self.url(&format!(
            "{}:runQuery",
            Self::parent_suffix(&query.collection)
        ))?;
        let request = self
            .inner
            .client
            .post(url)
            .json(&json!({ "structuredQuery": self.structured_query(query) }));
        let body = self
            .send(request)
            .await?
            .ok_or_else(|| StoreError::NotFound(query.collection.to_string()))?;

        let snapshots: Vec<Snapshot> = body
            .as_array()
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| row.get("document"))
                    .filter_map(|doc| {
                        let name = doc.get("name")?.as_str()?;
                        Some(Snapshot {
                            id: document_id(name).to_owned(),
                            data: doc
                                .get("fields")
                                .and_then(Value::as_object)
                                .map(decode_fields)
                                .unwrap_or_default(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        debug!(results = snapshots.len(), "Query complete");
        Ok(snapshots)
    }

    #[instrument(skip(self, filters), fields(collection = %collection))]
    async fn count(
        &self,
        collection: &CollectionPath,
        filters: &[FieldFilter],
    ) -> Result<u64, StoreError> {
        let url = self.url(&format!(
            "{}:runAggregationQuery",
            Self::parent_suffix(collection)
        ))?;
        let (_, collection_id) = collection.split_parent();
        let mut structured = Map::new();
        structured.insert("from".to_owned(), json!([{ "collectionId": collection_id }]));
        if let Some(filter) = where_clause(filters) {
            structured.insert("where".to_owned(), filter);
        }
        let request = self.inner.client.post(url).json(&json!({
            "structuredAggregationQuery": {
                "structuredQuery": structured,
                "aggregations": [{ "alias": COUNT_ALIAS, "count": {} }],
            }
        }));
        let body = self
            .send(request)
            .await?
            .ok_or_else(|| StoreError::NotFound(collection.to_string()))?;

        let total = body
            .as_array()
            .and_then(|rows| rows.first())
            .and_then(|row| row.pointer(&format!("/result/aggregateFields/{COUNT_ALIAS}")))
            .map(super::values::decode_value)
            .and_then(|v| v.as_u64())
            .ok_or_else(|| StoreError::Service("count response missing total".to_owned()))?;
        Ok(total)
    }
}

const fn direction(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Ascending => "ASCENDING",
        SortDirection::Descending => "DESCENDING",
    }
}

fn where_clause(filters: &[FieldFilter]) -> Option<Value> {
    let mut encoded: Vec<Value> = filters
        .iter()
        .map(|f| {
            json!({ "fieldFilter": {
                "field": { "fieldPath": f.field },
                "op": "EQUAL",
                "value": encode_value(&f.value),
            }})
        })
        .collect();
    match encoded.len() {
        0 => None,
        1 => encoded.pop(),
        _ => Some(json!({ "compositeFilter": { "op": "AND", "filters": encoded } })),
    }
}

/// Remove server timestamp sentinels from `doc`, returning their dotted field paths.
fn take_server_timestamps(doc: &mut Document, prefix: &str) -> Vec<String> {
    let mut stamped = Vec::new();
    let keys: Vec<String> = doc.keys().cloned().collect();
    for key in keys {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        if doc.get(&key).is_some_and(is_server_timestamp) {
            doc.remove(&key);
            stamped.push(path);
        } else if let Some(Value::Object(nested)) = doc.get_mut(&key) {
            stamped.extend(take_server_timestamps(nested, &path));
        }
    }
    stamped
}
