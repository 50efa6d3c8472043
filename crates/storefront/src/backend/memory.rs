//! In-memory backends.
//!
//! [`MemoryStore`] and [`MemoryAuth`] implement the backend contracts without
//! a network. They back the test suites and local demos, and can be told to
//! fail specific operations to exercise error paths.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use ruya_core::{Email, SortDirection, UserId};
use serde_json::Value;
use uuid::Uuid;

use super::auth::{AuthError, AuthProvider};
use super::document::{
    CollectionPath, Cursor, Document, DocumentPath, DocumentStore, FieldFilter, OrderBy, Query,
    Snapshot, StoreError, field_value, is_server_timestamp,
};
use super::session::{AuthUser, SessionFeed, SessionSubscription};

// =============================================================================
// Document store
// =============================================================================

/// Document store operations, for call accounting and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Get,
    Set,
    Delete,
    Add,
    Query,
    Count,
}

#[derive(Debug, Default)]
struct StoreState {
    collections: BTreeMap<String, BTreeMap<String, Document>>,
    failing: HashSet<StoreOperation>,
    calls: Vec<StoreOperation>,
    clock: Option<DateTime<Utc>>,
}

impl StoreState {
    /// Record a call and fail it if requested.
    fn begin(&mut self, operation: StoreOperation) -> Result<(), StoreError> {
        self.calls.push(operation);
        if self.failing.contains(&operation) {
            return Err(StoreError::Network(format!(
                "simulated {operation:?} failure"
            )));
        }
        Ok(())
    }

    /// Strictly increasing write clock so server timestamps never tie.
    fn tick(&mut self) -> String {
        let now = Utc::now();
        let next = match self.clock {
            Some(last) if now <= last => last + Duration::milliseconds(1),
            _ => now,
        };
        self.clock = Some(next);
        next.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn resolve_timestamps(&mut self, value: &mut Value) {
        if is_server_timestamp(value) {
            *value = Value::String(self.tick());
            return;
        }
        match value {
            Value::Object(map) => {
                for field in map.values_mut() {
                    self.resolve_timestamps(field);
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.resolve_timestamps(item);
                }
            }
            _ => {}
        }
    }

    fn write(&mut self, collection: &CollectionPath, id: String, data: Document) {
        let mut value = Value::Object(data);
        self.resolve_timestamps(&mut value);
        if let Value::Object(data) = value {
            self.collections
                .entry(collection.as_str().to_owned())
                .or_default()
                .insert(id, data);
        }
    }

    fn matching(&self, collection: &CollectionPath, filters: &[FieldFilter]) -> Vec<Snapshot> {
        self.collections
            .get(collection.as_str())
            .map(|docs| {
                docs.iter()
                    .filter(|(_, data)| {
                        filters
                            .iter()
                            .all(|f| field_value(data, &f.field) == Some(&f.value))
                    })
                    .map(|(id, data)| Snapshot {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Document store held in process memory.
///
/// Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a document directly, bypassing call accounting.
    pub fn insert(&self, collection: &CollectionPath, id: impl Into<String>, data: Document) {
        self.lock().write(collection, id.into(), data);
    }

    /// Make every subsequent `operation` fail with a network error.
    pub fn fail(&self, operation: StoreOperation) {
        self.lock().failing.insert(operation);
    }

    /// Stop failing every operation.
    pub fn heal(&self) {
        self.lock().failing.clear();
    }

    /// Operations performed so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<StoreOperation> {
        self.lock().calls.clone()
    }

    /// Forget recorded calls.
    pub fn reset_calls(&self) {
        self.lock().calls.clear();
    }

    /// Every document of a collection, keyed by id.
    #[must_use]
    pub fn documents(&self, collection: &CollectionPath) -> BTreeMap<String, Document> {
        self.lock()
            .collections
            .get(collection.as_str())
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        let mut state = self.lock();
        state.begin(StoreOperation::Get)?;
        Ok(state
            .collections
            .get(path.collection().as_str())
            .and_then(|docs| docs.get(path.id()))
            .cloned())
    }

    async fn set(&self, path: &DocumentPath, data: Document) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.begin(StoreOperation::Set)?;
        state.write(path.collection(), path.id().to_owned(), data);
        Ok(())
    }

    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.begin(StoreOperation::Delete)?;
        if let Some(docs) = state.collections.get_mut(path.collection().as_str()) {
            docs.remove(path.id());
        }
        Ok(())
    }

    async fn add(&self, collection: &CollectionPath, data: Document) -> Result<String, StoreError> {
        let mut state = self.lock();
        state.begin(StoreOperation::Add)?;
        let id = Uuid::new_v4().simple().to_string();
        state.write(collection, id.clone(), data);
        Ok(id)
    }

    async fn query(&self, query: &Query) -> Result<Vec<Snapshot>, StoreError> {
        let mut state = self.lock();
        state.begin(StoreOperation::Query)?;
        let mut results = state.matching(&query.collection, &query.filters);

        if let Some(order) = &query.order_by {
            results.retain(|s| field_value(&s.data, &order.field).is_some());
        }
        results.sort_by(|a, b| compare_snapshots(a, b, query.order_by.as_ref()));

        if let Some(cursor) = &query.start_after {
            results.retain(|s| is_after(s, cursor, query.order_by.as_ref()));
        }
        if let Some(limit) = query.limit {
            results.truncate(limit);
        }
        Ok(results)
    }

    async fn count(
        &self,
        collection: &CollectionPath,
        filters: &[FieldFilter],
    ) -> Result<u64, StoreError> {
        let mut state = self.lock();
        state.begin(StoreOperation::Count)?;
        Ok(state.matching(collection, filters).len() as u64)
    }
}

/// Cross-type ordering: null < bool < number < string < array < object.
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y)
            .map(|(a, b)| compare_values(a, b))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Position order of `(value, id)`, with the id breaking ties in the same direction.
fn compare_positions(
    a: (&Value, &str),
    b: (&Value, &str),
    direction: SortDirection,
) -> Ordering {
    let ordering = compare_values(a.0, b.0).then_with(|| a.1.cmp(b.1));
    match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}

fn compare_snapshots(a: &Snapshot, b: &Snapshot, order: Option<&OrderBy>) -> Ordering {
    match order {
        Some(order) => {
            let va = field_value(&a.data, &order.field).unwrap_or(&Value::Null);
            let vb = field_value(&b.data, &order.field).unwrap_or(&Value::Null);
            compare_positions((va, &a.id), (vb, &b.id), order.direction)
        }
        None => a.id.cmp(&b.id),
    }
}

fn is_after(snapshot: &Snapshot, cursor: &Cursor, order: Option<&OrderBy>) -> bool {
    match order {
        Some(order) => {
            let value = field_value(&snapshot.data, &order.field).unwrap_or(&Value::Null);
            compare_positions(
                (value, &snapshot.id),
                (&cursor.value, &cursor.document_id),
                order.direction,
            )
            .is_gt()
        }
        None => snapshot.id.as_str() > cursor.document_id.as_str(),
    }
}

// =============================================================================
// Auth provider
// =============================================================================

const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug)]
struct Account {
    uid: UserId,
    email: Email,
    password: String,
}

#[derive(Debug, Default)]
struct AuthState {
    accounts: HashMap<String, Account>,
    password_resets: Vec<Email>,
    calls: usize,
}

/// Auth provider held in process memory.
///
/// Emails are matched case-insensitively. Signed-in users carry no bearer
/// token.
#[derive(Debug, Default)]
pub struct MemoryAuth {
    state: Mutex<AuthState>,
    feed: SessionFeed,
}

impl MemoryAuth {
    /// A provider with no accounts and nobody signed in.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AuthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an account without signing it in. Returns its uid.
    pub fn register(&self, email: &Email, password: &str) -> UserId {
        let uid = UserId::new(Uuid::new_v4().simple().to_string());
        self.lock().accounts.insert(
            email.as_str().to_lowercase(),
            Account {
                uid: uid.clone(),
                email: email.clone(),
                password: password.to_owned(),
            },
        );
        uid
    }

    /// Number of provider calls made (excluding `subscribe`).
    #[must_use]
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    /// Emails a reset link was sent to.
    #[must_use]
    pub fn password_resets(&self) -> Vec<Email> {
        self.lock().password_resets.clone()
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    async fn create_account(&self, email: &Email, password: &str) -> Result<AuthUser, AuthError> {
        let user = {
            let mut state = self.lock();
            state.calls += 1;
            let key = email.as_str().to_lowercase();
            if state.accounts.contains_key(&key) {
                return Err(AuthError::EmailAlreadyInUse);
            }
            if password.chars().count() < MIN_PASSWORD_LENGTH {
                return Err(AuthError::WeakPassword(format!(
                    "Password should be at least {MIN_PASSWORD_LENGTH} characters"
                )));
            }
            let uid = UserId::new(Uuid::new_v4().simple().to_string());
            state.accounts.insert(
                key,
                Account {
                    uid: uid.clone(),
                    email: email.clone(),
                    password: password.to_owned(),
                },
            );
            AuthUser::new(uid, email.clone())
        };
        self.feed.publish(Some(user.clone()));
        Ok(user)
    }

    async fn sign_in(&self, email: &Email, password: &str) -> Result<AuthUser, AuthError> {
        let user = {
            let mut state = self.lock();
            state.calls += 1;
            match state.accounts.get(&email.as_str().to_lowercase()) {
                Some(account) if account.password == password => {
                    AuthUser::new(account.uid.clone(), account.email.clone())
                }
                _ => return Err(AuthError::InvalidCredentials),
            }
        };
        self.feed.publish(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.lock().calls += 1;
        self.feed.publish(None);
        Ok(())
    }

    async fn send_password_reset(&self, email: &Email) -> Result<(), AuthError> {
        let mut state = self.lock();
        state.calls += 1;
        if !state.accounts.contains_key(&email.as_str().to_lowercase()) {
            return Err(AuthError::InvalidCredentials);
        }
        state.password_resets.push(email.clone());
        Ok(())
    }

    fn subscribe(&self) -> SessionSubscription {
        self.feed.subscribe()
    }
}
