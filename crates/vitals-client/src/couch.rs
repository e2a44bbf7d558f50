//! CouchDB-flavored change source
//!
//! Historical batches come from the `medic-client/reports_by_form` view;
//! live changes come from the `_changes` feed in long-poll mode. Deleted
//! changes and unknown form categories are filtered here, before anything
//! reaches the pipeline.

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, trace};

use vitals_core::{
    Category, ChangeFeed, ChangeSource, DocumentChange, Geolocation, Position, SourceDocument,
    SourceError,
};

/// Long-poll timeout handed to the changes feed, in milliseconds.
const CHANGES_TIMEOUT_MS: u64 = 30_000;

/// View used for historical batch queries.
const REPORTS_VIEW: &str = "_design/medic-client/_view/reports_by_form";

/// Connection settings for a CouchDB-style database.
#[derive(Debug, Clone, Deserialize)]
pub struct CouchConfig {
    /// Server base URL, e.g. `https://couch.example.org:5984`
    pub url: String,
    /// Database name
    pub database: String,
    pub username: String,
    pub password: String,
    /// Accept self-signed certificates (common on field deployments)
    #[serde(default)]
    pub danger_accept_invalid_certs: bool,
}

/// CouchDB-flavored implementation of [`ChangeSource`].
pub struct CouchSource {
    config: CouchConfig,
    client: reqwest::Client,
}

impl CouchSource {
    /// Build a source from connection settings.
    pub fn new(config: CouchConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.danger_accept_invalid_certs)
            .build()
            .map_err(|e| SourceError::Connection(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn db_url(&self, path: &str) -> String {
        let base = self.config.url.trim_end_matches('/');
        if path.is_empty() {
            format!("{}/{}", base, self.config.database)
        } else {
            format!("{}/{}/{}", base, self.config.database, path)
        }
    }

    fn get(&self, url: String) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .basic_auth(&self.config.username, Some(&self.config.password))
    }
}

#[async_trait]
impl ChangeSource for CouchSource {
    async fn check_connection(&self) -> Result<(), SourceError> {
        let response = self
            .get(self.db_url(""))
            .send()
            .await
            .map_err(|e| SourceError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SourceError::Connection(format!(
                "database info returned status {}",
                response.status()
            )));
        }

        let info: DbInfo = response
            .json()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))?;
        info!(db = %info.db_name, docs = info.doc_count, "connected to source database");
        Ok(())
    }

    async fn fetch_batch(
        &self,
        category: Category,
        limit: usize,
    ) -> Result<Vec<SourceDocument>, SourceError> {
        let key = serde_json::to_string(&[category.form_name()])
            .map_err(|e| SourceError::Request(e.to_string()))?;

        let response = self
            .get(self.db_url(REPORTS_VIEW))
            .query(&[
                ("key", key.as_str()),
                ("include_docs", "true"),
                ("reduce", "false"),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await
            .map_err(|e| SourceError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SourceError::Request(format!(
                "view query returned status {}",
                response.status()
            )));
        }

        let body: ViewResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        let docs: Vec<SourceDocument> = body
            .rows
            .into_iter()
            .filter_map(|row| row.doc)
            .filter_map(RawDocument::into_source_document)
            .collect();

        debug!(category = %category, count = docs.len(), "fetched historical batch");
        Ok(docs)
    }

    async fn subscribe(&self, from: Position) -> Result<Box<dyn ChangeFeed>, SourceError> {
        info!(since = %from, "subscribing to changes feed");
        Ok(Box::new(CouchFeed {
            client: self.client.clone(),
            config: self.config.clone(),
            url: self.db_url("_changes"),
            since: from,
            buffer: VecDeque::new(),
        }))
    }
}

/// Live changes feed in long-poll mode.
///
/// Each poll returns a (possibly empty) page of changes; matching changes
/// are buffered and handed out one at a time, and the next poll resumes
/// from the page's final sequence.
struct CouchFeed {
    client: reqwest::Client,
    config: CouchConfig,
    url: String,
    since: Position,
    buffer: VecDeque<DocumentChange>,
}

#[async_trait]
impl ChangeFeed for CouchFeed {
    async fn next_change(&mut self) -> Result<Option<DocumentChange>, SourceError> {
        loop {
            if let Some(change) = self.buffer.pop_front() {
                return Ok(Some(change));
            }

            let response = self
                .client
                .get(&self.url)
                .basic_auth(&self.config.username, Some(&self.config.password))
                .query(&[
                    ("feed", "longpoll"),
                    ("include_docs", "true"),
                    ("timeout", &CHANGES_TIMEOUT_MS.to_string()),
                    ("since", self.since.as_str()),
                ])
                .send()
                .await
                .map_err(|e| SourceError::Request(e.to_string()))?;

            if !response.status().is_success() {
                return Err(SourceError::Request(format!(
                    "changes feed returned status {}",
                    response.status()
                )));
            }

            let page: ChangesResponse = response
                .json()
                .await
                .map_err(|e| SourceError::Malformed(e.to_string()))?;

            self.since = Position::new(seq_to_string(&page.last_seq));

            for row in page.results {
                if row.deleted {
                    trace!(id = %row.id, "skipping deleted change");
                    continue;
                }
                let Some(raw) = row.doc else { continue };
                let position = Position::new(seq_to_string(&row.seq));
                let Some(doc) = raw.into_source_document() else {
                    continue;
                };
                debug!(id = %doc.id, form = %doc.form, position = %position, "observed change");
                self.buffer.push_back(DocumentChange { doc, position });
            }
        }
    }
}

/// Render a CouchDB sequence token as a string.
///
/// Older servers report numeric sequences, newer ones opaque strings.
fn seq_to_string(seq: &Value) -> String {
    match seq {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct DbInfo {
    db_name: String,
    #[serde(default)]
    doc_count: u64,
}

#[derive(Debug, Deserialize)]
struct ViewResponse {
    #[serde(default)]
    rows: Vec<ViewRow>,
}

#[derive(Debug, Deserialize)]
struct ViewRow {
    doc: Option<RawDocument>,
}

#[derive(Debug, Deserialize)]
struct ChangesResponse {
    #[serde(default)]
    results: Vec<ChangeRow>,
    last_seq: Value,
}

#[derive(Debug, Deserialize)]
struct ChangeRow {
    id: String,
    seq: Value,
    #[serde(default)]
    deleted: bool,
    doc: Option<RawDocument>,
}

/// A report document as stored in the database.
#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    form: Option<String>,
    #[serde(default)]
    fields: Map<String, Value>,
    #[serde(default)]
    geolocation: Option<RawGeolocation>,
    /// Submission time as epoch milliseconds
    #[serde(default)]
    reported_date: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawGeolocation {
    latitude: f64,
    longitude: f64,
}

impl RawDocument {
    /// Convert into the pipeline document model.
    ///
    /// Documents without a known form category are dropped here.
    fn into_source_document(self) -> Option<SourceDocument> {
        let form = self.form?;
        Category::from_form(&form)?;

        let reported_at = self
            .reported_date
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single());

        Some(SourceDocument {
            id: self.id,
            form,
            fields: self.fields,
            geolocation: self.geolocation.map(|g| Geolocation {
                latitude: g.latitude,
                longitude: g.longitude,
            }),
            reported_at,
        })
    }
}
