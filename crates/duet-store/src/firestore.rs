//! [`DocumentStore`] backed by the hosted Firestore service, accessed
//! through its public REST API.
//!
//! Writes go through `:commit` so that server-timestamp sentinels become
//! `REQUEST_TIME` field transforms and existence preconditions make
//! `create`/`update` atomic. The REST surface has no streaming listen, so
//! `watch` is a poll-based subscription: the query is re-run on an interval
//! and a snapshot is emitted whenever the result changes.

use anyhow::{Context as _, anyhow};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Value as Json, json};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, MissedTickBehavior};
use tracing::warn;

use duet_core::config::Config;

use crate::document::Document;
use crate::error::StoreError;
use crate::query::{Direction, Query};
use crate::store::{DocumentStore, Subscription};
use crate::value::{Fields, Value, resolve_server_timestamps};

/// Connection settings, loaded from `FIRESTORE_*` env vars.
#[derive(Debug, Clone, Deserialize)]
pub struct FirestoreConfig {
    /// Google Cloud project id.
    pub project_id: String,
    /// Database id within the project (default `(default)`).
    #[serde(default = "default_database")]
    pub database: String,
    /// API key appended to every request; optional when a bearer token is
    /// attached instead.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Poll interval for `watch` subscriptions, in seconds.
    #[serde(default = "default_watch_poll_secs")]
    pub watch_poll_secs: u64,
}

fn default_database() -> String {
    "(default)".to_owned()
}

fn default_watch_poll_secs() -> u64 {
    2
}

impl Config for FirestoreConfig {}

impl FirestoreConfig {
    pub fn load() -> Self {
        Self::from_env_prefixed("FIRESTORE_")
    }
}

#[derive(Clone)]
pub struct FirestoreStore {
    http: reqwest::Client,
    config: FirestoreConfig,
    /// Identity-provider id token; Firestore enforces security rules
    /// against it.
    bearer: Option<String>,
}

impl FirestoreStore {
    pub fn new(config: FirestoreConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            bearer: None,
        }
    }

    /// Attach the signed-in user's id token to every request.
    pub fn with_bearer(mut self, id_token: impl Into<String>) -> Self {
        self.bearer = Some(id_token.into());
        self
    }

    fn root(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.config.project_id, self.config.database
        )
    }

    fn doc_name(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.root(), collection, id)
    }

    fn url(&self, resource: &str) -> String {
        format!("https://firestore.googleapis.com/v1/{resource}")
    }

    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let req = match &self.bearer {
            Some(token) => req.bearer_auth(token),
            None => req,
        };
        match &self.config.api_key {
            Some(key) => req.query(&[("key", key)]),
            None => req,
        }
    }

    /// One `:commit` round-trip with a single write. Returns the commit
    /// time, which is what `REQUEST_TIME` transforms resolved to.
    async fn commit(&self, write: Json) -> Result<DateTime<Utc>, StoreError> {
        let url = self.url(&format!("{}:commit", self.root()));
        let resp = self
            .apply_auth(self.http.post(&url))
            .json(&json!({ "writes": [write] }))
            .send()
            .await
            .context("firestore commit request")?;
        if !resp.status().is_success() {
            return Err(rest_error(resp).await);
        }
        let body: Json = resp.json().await.context("firestore commit response")?;
        Ok(body["commitTime"]
            .as_str()
            .and_then(parse_timestamp)
            .unwrap_or_else(Utc::now))
    }

    /// Build the update-write JSON: plain fields in `update.fields`,
    /// server-timestamp sentinels as `REQUEST_TIME` transforms.
    fn update_write(
        &self,
        collection: &str,
        id: &str,
        fields: &Fields,
        masked: bool,
        must_exist: Option<bool>,
    ) -> Json {
        let mut rest_fields = serde_json::Map::new();
        let mut transforms = Vec::new();
        let mut mask_paths = Vec::new();
        for (name, value) in fields {
            match value {
                Value::ServerTimestamp => transforms.push(json!({
                    "fieldPath": name,
                    "setToServerValue": "REQUEST_TIME",
                })),
                other => {
                    rest_fields.insert(name.clone(), value_to_rest(other));
                    mask_paths.push(name.clone());
                }
            }
        }
        let mut write = json!({
            "update": {
                "name": self.doc_name(collection, id),
                "fields": rest_fields,
            }
        });
        if !transforms.is_empty() {
            write["updateTransforms"] = json!(transforms);
        }
        if masked {
            write["updateMask"] = json!({ "fieldPaths": mask_paths });
        }
        if let Some(exists) = must_exist {
            write["currentDocument"] = json!({ "exists": exists });
        }
        write
    }
}

impl DocumentStore for FirestoreStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let url = self.url(&self.doc_name(collection, id));
        let resp = self
            .apply_auth(self.http.get(&url))
            .send()
            .await
            .context("firestore get request")?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(rest_error(resp).await);
        }
        let body: Json = resp.json().await.context("firestore get response")?;
        document_from_rest(&body).map(Some)
    }

    async fn create(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<Document, StoreError> {
        let write = self.update_write(collection, id, &fields, false, Some(false));
        let commit_time = self.commit(write).await?;
        Ok(Document::new(
            id,
            resolve_server_timestamps(fields, commit_time),
        ))
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let write = self.update_write(collection, id, &fields, false, None);
        self.commit(write).await?;
        Ok(())
    }

    async fn set_merge(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        let write = self.update_write(collection, id, &fields, true, None);
        self.commit(write).await?;
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let write = self.update_write(collection, id, &fields, true, Some(true));
        self.commit(write).await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        // No precondition, so deleting a missing document commits cleanly.
        let write = json!({ "delete": self.doc_name(collection, id) });
        self.commit(write).await?;
        Ok(())
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        let (parent, collection_id) = split_collection_path(&self.root(), &query.collection);
        let url = self.url(&format!("{parent}:runQuery"));
        let resp = self
            .apply_auth(self.http.post(&url))
            .json(&json!({ "structuredQuery": structured_query(collection_id, query) }))
            .send()
            .await
            .context("firestore runQuery request")?;
        if !resp.status().is_success() {
            return Err(rest_error(resp).await);
        }
        let body: Json = resp.json().await.context("firestore runQuery response")?;
        let mut docs = Vec::new();
        for entry in body.as_array().map(Vec::as_slice).unwrap_or_default() {
            // Trailing entries carry only readTime.
            if entry["document"].is_object() {
                docs.push(document_from_rest(&entry["document"])?);
            }
        }
        Ok(docs)
    }

    async fn watch(&self, query: &Query) -> Result<Subscription, StoreError> {
        let (tx, rx) = mpsc::channel(16);
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let store = self.clone();
        let query = query.clone();

        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(Duration::from_secs(store.config.watch_poll_secs.max(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut last: Option<Vec<Document>> = None;
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        match store.query(&query).await {
                            Ok(snapshot) => {
                                if last.as_ref() != Some(&snapshot) {
                                    last = Some(snapshot.clone());
                                    if tx.send(snapshot).await.is_err() {
                                        break;
                                    }
                                }
                            }
                            // Transient poll failure; keep the last snapshot
                            // and retry on the next tick.
                            Err(err) => warn!(
                                collection = %query.collection,
                                error = %err,
                                "firestore watch poll failed"
                            ),
                        }
                    }
                }
            }
        });

        Ok(Subscription::new(rx, stop_tx))
    }
}

/// Map a non-success REST response onto the store taxonomy using the RPC
/// status carried in the error body.
async fn rest_error(resp: reqwest::Response) -> StoreError {
    let status = resp.status();
    let body: Json = resp.json().await.unwrap_or(Json::Null);
    let rpc = body["error"]["status"].as_str().unwrap_or("").to_owned();
    let message = body["error"]["message"].as_str().unwrap_or("").to_owned();
    match (status.as_u16(), rpc.as_str()) {
        (404, _) | (_, "NOT_FOUND") => StoreError::NotFound,
        (409, _) | (_, "ALREADY_EXISTS") => StoreError::AlreadyExists,
        _ => StoreError::Unavailable(anyhow!("firestore {status}: {rpc} {message}")),
    }
}

/// Split a (possibly nested) collection path into the `:runQuery` parent
/// resource and the leaf collection id.
fn split_collection_path<'a>(root: &str, collection: &'a str) -> (String, &'a str) {
    match collection.rsplit_once('/') {
        Some((parent_docs, leaf)) => (format!("{root}/{parent_docs}"), leaf),
        None => (root.to_owned(), collection),
    }
}

fn structured_query(collection_id: &str, query: &Query) -> Json {
    let mut structured = json!({ "from": [{ "collectionId": collection_id }] });
    let filters: Vec<Json> = query
        .filters
        .iter()
        .map(|f| {
            json!({
                "fieldFilter": {
                    "field": { "fieldPath": f.field },
                    "op": "EQUAL",
                    "value": value_to_rest(&f.equals),
                }
            })
        })
        .collect();
    match filters.len() {
        0 => {}
        1 => structured["where"] = filters.into_iter().next().unwrap_or(Json::Null),
        _ => {
            structured["where"] = json!({
                "compositeFilter": { "op": "AND", "filters": filters }
            })
        }
    }
    if let Some((field, direction)) = &query.order_by {
        let direction = match direction {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        };
        structured["orderBy"] = json!([{
            "field": { "fieldPath": field },
            "direction": direction,
        }]);
    }
    if let Some(limit) = query.limit {
        structured["limit"] = json!(limit);
    }
    structured
}

fn value_to_rest(value: &Value) -> Json {
    match value {
        Value::Null | Value::ServerTimestamp => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        // Firestore encodes 64-bit integers as JSON strings.
        Value::Integer(n) => json!({ "integerValue": n.to_string() }),
        Value::Double(n) => json!({ "doubleValue": n }),
        Value::Text(s) => json!({ "stringValue": s }),
        Value::Timestamp(t) => {
            json!({ "timestampValue": t.to_rfc3339_opts(SecondsFormat::Micros, true) })
        }
    }
}

fn value_from_rest(json: &Json) -> Result<Value, StoreError> {
    let Some(object) = json.as_object() else {
        return Err(StoreError::Corrupt("field value is not an object".into()));
    };
    let Some((kind, raw)) = object.iter().next() else {
        return Err(StoreError::Corrupt("empty field value".into()));
    };
    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => Ok(Value::Bool(raw.as_bool().unwrap_or_default())),
        "integerValue" => raw
            .as_str()
            .and_then(|s| s.parse().ok())
            .or_else(|| raw.as_i64())
            .map(Value::Integer)
            .ok_or_else(|| StoreError::Corrupt("bad integerValue".into())),
        "doubleValue" => raw
            .as_f64()
            .map(Value::Double)
            .ok_or_else(|| StoreError::Corrupt("bad doubleValue".into())),
        "stringValue" => Ok(Value::text(raw.as_str().unwrap_or_default())),
        "timestampValue" => raw
            .as_str()
            .and_then(parse_timestamp)
            .map(Value::Timestamp)
            .ok_or_else(|| StoreError::Corrupt("bad timestampValue".into())),
        other => Err(StoreError::Corrupt(format!("unsupported value kind {other}"))),
    }
}

fn document_from_rest(doc: &Json) -> Result<Document, StoreError> {
    let name = doc["name"]
        .as_str()
        .ok_or_else(|| StoreError::Corrupt("document without name".into()))?;
    let id = name.rsplit('/').next().unwrap_or(name).to_owned();
    let mut fields = Fields::new();
    if let Some(map) = doc["fields"].as_object() {
        for (field, raw) in map {
            fields.insert(field.clone(), value_from_rest(raw)?);
        }
    }
    Ok(Document::new(id, fields))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
