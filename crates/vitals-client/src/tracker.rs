//! Tracker-flavored delivery sink
//!
//! Posts one event per request to the tracker import endpoint and
//! translates import summaries into structured outcomes. Field-level
//! conflicts are surfaced verbatim; interpreting them is not this crate's
//! job.

use std::net::SocketAddr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use vitals_core::{Conflict, DeliveryReceipt, DeliverySink, SinkError, TargetEvent};

/// Import strategy requested from the tracker.
const IMPORT_STRATEGY: &str = "CREATE_AND_UPDATE";

/// Connection settings for a tracker API.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// Server base URL, e.g. `https://tracker.example.org`
    pub url: String,
    pub username: String,
    pub password: String,
    /// Pin the server hostname to a fixed address, bypassing DNS.
    ///
    /// Some national deployments sit behind hostnames that do not resolve
    /// from the field network; this pins the connection without touching
    /// system resolver configuration.
    #[serde(default)]
    pub pin_address: Option<SocketAddr>,
    /// Accept self-signed certificates
    #[serde(default)]
    pub danger_accept_invalid_certs: bool,
}

/// Tracker-flavored implementation of [`DeliverySink`].
pub struct TrackerSink {
    config: TrackerConfig,
    client: reqwest::Client,
}

impl TrackerSink {
    /// Build a sink from connection settings.
    pub fn new(config: TrackerConfig) -> Result<Self, SinkError> {
        let mut builder = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.danger_accept_invalid_certs);

        if let Some(addr) = config.pin_address {
            let url = reqwest::Url::parse(&config.url)
                .map_err(|e| SinkError::Connection(format!("invalid tracker url: {e}")))?;
            let host = url
                .host_str()
                .ok_or_else(|| SinkError::Connection("tracker url has no host".to_string()))?;
            info!(host, %addr, "pinning tracker host to fixed address");
            builder = builder.resolve(host, addr);
        }

        let client = builder
            .build()
            .map_err(|e| SinkError::Connection(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl DeliverySink for TrackerSink {
    async fn check_connection(&self) -> Result<(), SinkError> {
        let response = self
            .client
            .get(self.api_url("api/system/info"))
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await
            .map_err(|e| SinkError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SinkError::Connection(format!(
                "system info returned status {}",
                response.status()
            )));
        }

        let info: SystemInfo = response
            .json()
            .await
            .map_err(|e| SinkError::Malformed(e.to_string()))?;
        info!(version = %info.version, "connected to tracker");
        Ok(())
    }

    async fn deliver(&self, event: &TargetEvent) -> Result<DeliveryReceipt, SinkError> {
        let payload = EventPayload {
            events: std::slice::from_ref(event),
        };
        debug!(
            destination = %event.destination,
            values = event.data_values.len(),
            "posting event to tracker"
        );

        let response = self
            .client
            .post(self.api_url("api/tracker"))
            .basic_auth(&self.config.username, Some(&self.config.password))
            .query(&[("async", "false"), ("importStrategy", IMPORT_STRATEGY)])
            .json(&payload)
            .send()
            .await
            .map_err(|e| SinkError::Request(e.to_string()))?;

        let http_status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SinkError::Request(e.to_string()))?;

        match serde_json::from_str::<ImportResponse>(&text) {
            Ok(body) if http_status.is_success() && body.is_ok() => Ok(DeliveryReceipt::new(
                body.status.unwrap_or_else(|| "OK".to_string()),
            )),
            Ok(body) => Err(SinkError::Rejected {
                status: body.http_status_code.unwrap_or(http_status.as_u16()),
                conflicts: body.conflicts(),
            }),
            // Proxies in front of the tracker answer errors with HTML;
            // keep the status, drop the body.
            Err(_) if !http_status.is_success() => Err(SinkError::Rejected {
                status: http_status.as_u16(),
                conflicts: Vec::new(),
            }),
            Err(e) => Err(SinkError::Malformed(e.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct EventPayload<'a> {
    events: &'a [TargetEvent],
}

#[derive(Debug, Deserialize)]
struct SystemInfo {
    #[serde(default)]
    version: String,
}

#[derive(Debug, Deserialize)]
struct ImportResponse {
    status: Option<String>,
    #[serde(rename = "httpStatusCode")]
    http_status_code: Option<u16>,
    response: Option<ImportDetails>,
}

#[derive(Debug, Default, Deserialize)]
struct ImportDetails {
    #[serde(rename = "importSummaries", default)]
    import_summaries: Vec<ImportSummary>,
}

#[derive(Debug, Deserialize)]
struct ImportSummary {
    #[serde(default)]
    conflicts: Vec<RawConflict>,
}

#[derive(Debug, Deserialize)]
struct RawConflict {
    #[serde(default)]
    object: String,
    #[serde(default)]
    value: String,
}

impl ImportResponse {
    fn is_ok(&self) -> bool {
        self.status.as_deref() == Some("OK")
    }

    fn conflicts(&self) -> Vec<Conflict> {
        self.response
            .as_ref()
            .map(|details| {
                details
                    .import_summaries
                    .iter()
                    .flat_map(|summary| &summary.conflicts)
                    .map(|c| Conflict {
                        object: c.object.clone(),
                        message: c.value.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ok_response() {
        let body: ImportResponse = serde_json::from_value(json!({
            "status": "OK",
            "httpStatusCode": 200
        }))
        .unwrap();
        assert!(body.is_ok());
        assert!(body.conflicts().is_empty());
    }

    #[test]
    fn test_conflicts_are_collected() {
        let body: ImportResponse = serde_json::from_value(json!({
            "status": "ERROR",
            "httpStatusCode": 409,
            "response": {
                "importSummaries": [
                    {"conflicts": [
                        {"object": "SjKctl9bPGk", "value": "value_not_numeric"},
                        {"object": "nOBOcP6XxzQ", "value": "value_not_valid_date"}
                    ]},
                    {"conflicts": []}
                ]
            }
        }))
        .unwrap();

        assert!(!body.is_ok());
        let conflicts = body.conflicts();
        assert_eq!(conflicts.len(), 2);
        assert_eq!(conflicts[0].object, "SjKctl9bPGk");
        assert_eq!(conflicts[1].message, "value_not_valid_date");
    }

    #[test]
    fn test_conflictless_failure_parses() {
        let body: ImportResponse = serde_json::from_value(json!({
            "status": "ERROR"
        }))
        .unwrap();
        assert!(!body.is_ok());
        assert!(body.conflicts().is_empty());
    }
}
