//! Configuration for the bridge service
//!
//! One TOML file describes the whole deployment: where the ledger lives,
//! how to reach the source database and the tracker, and the routing
//! identifiers (programs, stages, fallback org unit) the transformation
//! needs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use vitals_client::{CouchConfig, TrackerConfig};
use vitals_core::Destination;
use vitals_routing::RouterContext;

use crate::error::{NodeError, NodeResult};

/// Full service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    /// Path of the ledger snapshot file
    pub ledger_path: PathBuf,
    /// Backfill bounds and pacing
    #[serde(default)]
    pub backfill: BackfillConfig,
    /// Source database connection
    pub source: CouchConfig,
    /// Tracker connection
    pub sink: TrackerConfig,
    /// Routing identifiers
    pub routing: RoutingConfig,
}

impl BridgeConfig {
    /// Load and parse a configuration file.
    pub fn load(path: &Path) -> NodeResult<Self> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("cannot read {}: {e}", path.display())))?;
        toml::from_str(&data).map_err(|e| NodeError::Config(e.to_string()))
    }
}

/// Backfill bounds and pacing.
#[derive(Debug, Clone, Deserialize)]
pub struct BackfillConfig {
    /// Maximum historical documents fetched per category
    #[serde(default = "default_backfill_limit")]
    pub limit: usize,
    /// Delay between delivery attempts, bounding the outbound request rate
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            limit: default_backfill_limit(),
            pacing_ms: default_pacing_ms(),
        }
    }
}

impl BackfillConfig {
    /// The pacing delay as a [`Duration`].
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

fn default_backfill_limit() -> usize {
    100
}

fn default_pacing_ms() -> u64 {
    500
}

/// Deployment identifiers the router needs.
#[derive(Debug, Clone, Deserialize)]
pub struct RoutingConfig {
    /// Org unit used when a document carries no tracker-assigned unit
    pub default_org_unit: String,
    /// Reporter recorded when a form names none
    #[serde(default = "default_reporter")]
    pub default_reporter: String,
    pub death_review_program: String,
    pub death_review_stage: String,
    pub va_program: String,
    pub va_maternal_stage: String,
    pub va_perinatal_stage: String,
}

fn default_reporter() -> String {
    "vitals-bridge".to_string()
}

impl RoutingConfig {
    /// Build the router context from these identifiers.
    pub fn router_context(&self) -> RouterContext {
        RouterContext {
            default_org_unit: self.default_org_unit.clone(),
            default_reporter: self.default_reporter.clone(),
            death_review: Destination::new(&self.death_review_program, &self.death_review_stage),
            va_maternal: Destination::new(&self.va_program, &self.va_maternal_stage),
            va_perinatal: Destination::new(&self.va_program, &self.va_perinatal_stage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        ledger_path = "/var/lib/vitals/ledger.json"

        [backfill]
        limit = 50

        [source]
        url = "https://couch.example.org:5984"
        database = "medic"
        username = "admin"
        password = "secret"

        [sink]
        url = "https://tracker.example.org"
        username = "bridge"
        password = "secret"

        [routing]
        default_org_unit = "OU12345"
        death_review_program = "PrMDNxxxxxx"
        death_review_stage = "StMDNxxxxxx"
        va_program = "ahx6MVXyFZZ"
        va_maternal_stage = "StVaMxxxxxx"
        va_perinatal_stage = "StVaPxxxxxx"
    "#;

    #[test]
    fn test_parse_sample_config() {
        let config: BridgeConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.ledger_path, PathBuf::from("/var/lib/vitals/ledger.json"));
        assert_eq!(config.backfill.limit, 50);
        // pacing_ms falls back to the default when omitted
        assert_eq!(config.backfill.pacing(), Duration::from_millis(500));
        assert_eq!(config.source.database, "medic");
        assert!(config.sink.pin_address.is_none());
        assert_eq!(config.routing.default_reporter, "vitals-bridge");
    }

    #[test]
    fn test_router_context_wiring() {
        let config: BridgeConfig = toml::from_str(SAMPLE).unwrap();
        let ctx = config.routing.router_context();
        assert_eq!(ctx.death_review.program, "PrMDNxxxxxx");
        assert_eq!(ctx.va_maternal.program, "ahx6MVXyFZZ");
        assert_eq!(ctx.va_perinatal.program_stage, "StVaPxxxxxx");
        assert_eq!(ctx.default_org_unit, "OU12345");
    }

    #[test]
    fn test_missing_section_is_config_error() {
        let result: Result<BridgeConfig, _> = toml::from_str("ledger_path = \"x.json\"");
        assert!(result.is_err());
    }
}
