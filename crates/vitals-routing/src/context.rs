//! Routing context supplied by the orchestrator

use vitals_core::Destination;

/// Deployment-specific identifiers the router cannot derive from a
/// document: fallback organisation unit, reporter fallback, and the
/// destination program/stage for each routed branch.
#[derive(Debug, Clone)]
pub struct RouterContext {
    /// Organisation unit used when the document carries no tracker-assigned
    /// unit of its own
    pub default_org_unit: String,
    /// Reporter identity recorded when the document names no reporter
    pub default_reporter: String,
    /// Destination for death review notifications
    pub death_review: Destination,
    /// Destination for the maternal verbal autopsy branch
    pub va_maternal: Destination,
    /// Destination for the perinatal verbal autopsy branch
    pub va_perinatal: Destination,
}

impl RouterContext {
    /// Context with placeholder destinations, for tests.
    #[doc(hidden)]
    pub fn for_tests() -> Self {
        Self {
            default_org_unit: "OU_FALLBACK".to_string(),
            default_reporter: "vitals-bridge".to_string(),
            death_review: Destination::new("DR_PROGRAM", "DR_STAGE"),
            va_maternal: Destination::new("VA_PROGRAM", "VA_MATERNAL_STAGE"),
            va_perinatal: Destination::new("VA_PROGRAM", "VA_PERINATAL_STAGE"),
        }
    }
}
