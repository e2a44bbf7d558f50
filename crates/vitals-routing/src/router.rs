//! Category dispatch and event construction
//!
//! `route` is the single entry point: it dispatches on the document's
//! category, applies that category's mapping table, and for verbal
//! autopsies evaluates the eligibility branches. Documents that produce
//! no event are skipped with a structured log line, never an error.

use chrono::SecondsFormat;
use tracing::{debug, trace};

use vitals_core::{Category, Coordinate, EventStatus, SourceDocument, TargetEvent};

use crate::context::RouterContext;
use crate::normalize::{normalize_datetime, value_i64, value_text};
use crate::normalize::{capitalize, vocabulary, vocabulary_or};
use crate::tables::{
    DEATH_REVIEW_CADRE, DEATH_REVIEW_MAPPINGS, DEATH_REVIEW_REPORT_DATE, DEFAULT_REPORTER_CADRE,
    FieldGroup, FieldMapping, Normalizer, VA_MATERNAL_CADRE, VA_MATERNAL_MAPPINGS,
    VA_PERINATAL_CADRE, VA_PERINATAL_MAPPINGS,
};

/// Reproductive age range for the maternal verbal autopsy branch, in years.
const MATERNAL_AGE_YEARS: std::ops::RangeInclusive<i64> = 10..=49;

/// Upper age bound for the perinatal verbal autopsy branch, in days.
const PERINATAL_MAX_AGE_DAYS: i64 = 28;

/// Nested group holding the review section of a report form.
const REVIEW_GROUP: &str = "group_review";

/// Transform one source document into zero or more target events.
///
/// Pure and deterministic: identical `(doc, ctx)` inputs produce identical
/// events, including field order. Unknown categories and ineligible
/// documents yield an empty vector.
pub fn route(doc: &SourceDocument, ctx: &RouterContext) -> Vec<TargetEvent> {
    match doc.category() {
        Some(Category::DeathReview) => route_death_review(doc, ctx).into_iter().collect(),
        Some(Category::VerbalAutopsy) => route_verbal_autopsy(doc, ctx),
        None => {
            trace!(doc_id = %doc.id, form = %doc.form, "unknown form category, ignoring");
            Vec::new()
        }
    }
}

fn route_death_review(doc: &SourceDocument, ctx: &RouterContext) -> Option<TargetEvent> {
    let occurred_at = occurred_at(doc)?;

    let mut event = new_event(doc, ctx, occurred_at, ctx.death_review.clone(), None);
    apply_mappings(&mut event, doc, DEATH_REVIEW_MAPPINGS);
    event.push_value(DEATH_REVIEW_CADRE, DEFAULT_REPORTER_CADRE);

    if let Some(reported_at) = doc.reported_at {
        event.push_value(DEATH_REVIEW_REPORT_DATE, reported_at.format("%Y-%m-%d").to_string());
    }

    Some(event)
}

fn route_verbal_autopsy(doc: &SourceDocument, ctx: &RouterContext) -> Vec<TargetEvent> {
    let eligibility = Eligibility::of(doc);
    if !eligibility.maternal && !eligibility.perinatal {
        debug!(
            doc_id = %doc.id,
            age_years = eligibility.age_years,
            age_days = eligibility.age_days,
            female = eligibility.female,
            "verbal autopsy matched no eligibility branch, skipping"
        );
        return Vec::new();
    }

    let Some(occurred_at) = occurred_at(doc) else {
        return Vec::new();
    };

    let mut events = Vec::new();

    if eligibility.maternal {
        let mut event = new_event(
            doc,
            ctx,
            occurred_at.clone(),
            ctx.va_maternal.clone(),
            Some("maternal"),
        );
        apply_mappings(&mut event, doc, VA_MATERNAL_MAPPINGS);
        event.push_value(VA_MATERNAL_CADRE, DEFAULT_REPORTER_CADRE);
        events.push(event);
    }

    if eligibility.perinatal {
        let mut event = new_event(
            doc,
            ctx,
            occurred_at,
            ctx.va_perinatal.clone(),
            Some("perinatal"),
        );
        apply_mappings(&mut event, doc, VA_PERINATAL_MAPPINGS);
        event.push_value(VA_PERINATAL_CADRE, DEFAULT_REPORTER_CADRE);
        events.push(event);
    }

    events
}

/// Verbal autopsy branch eligibility.
///
/// The two predicates are independent and non-exclusive: inconsistent age
/// fields can legitimately satisfy both, and the document then fans out to
/// both destinations.
struct Eligibility {
    maternal: bool,
    perinatal: bool,
    age_years: i64,
    age_days: i64,
    female: bool,
}

impl Eligibility {
    fn of(doc: &SourceDocument) -> Self {
        let age_years = doc
            .field("patient_age_in_years")
            .and_then(value_i64)
            .unwrap_or(0);

        let female = doc
            .field("patient_sex")
            .and_then(value_text)
            .map(|s| matches!(s.to_lowercase().as_str(), "female" | "f"))
            .unwrap_or(false);

        // Instrument age triplet. The 365/30-day approximation is the
        // formula the eligibility thresholds were tuned against; do not
        // replace it with calendar arithmetic.
        let years = doc.field("age_in_years").and_then(value_i64);
        let months = doc.field("age_in_months").and_then(value_i64);
        let days = doc.field("age_in_days").and_then(value_i64);
        let any_age_recorded = years.is_some() || months.is_some() || days.is_some();
        let age_days =
            years.unwrap_or(0) * 365 + months.unwrap_or(0) * 30 + days.unwrap_or(0);

        Self {
            maternal: female && MATERNAL_AGE_YEARS.contains(&age_years),
            perinatal: any_age_recorded && age_days <= PERINATAL_MAX_AGE_DAYS,
            age_years,
            age_days,
            female,
        }
    }
}

/// The full date-time the event occurred at.
///
/// Prefers the form's date-of-death field (coerced to a full date-time),
/// falling back to the document's reported-at timestamp. Documents with
/// neither cannot be routed.
fn occurred_at(doc: &SourceDocument) -> Option<String> {
    if let Some(date) = doc.field("date_of_death").and_then(value_text) {
        return Some(normalize_datetime(&date));
    }
    if let Some(reported_at) = doc.reported_at {
        return Some(reported_at.to_rfc3339_opts(SecondsFormat::Millis, true));
    }
    debug!(doc_id = %doc.id, "document carries no usable occurrence date, skipping");
    None
}

fn new_event(
    doc: &SourceDocument,
    ctx: &RouterContext,
    occurred_at: String,
    destination: vitals_core::Destination,
    branch: Option<&str>,
) -> TargetEvent {
    // Prefer the tracker-assigned unit stamped on the document; first wins.
    let org_unit = doc
        .field("chu_tracker_id")
        .and_then(value_text)
        .unwrap_or_else(|| ctx.default_org_unit.clone());

    let reported_by = doc
        .field("chv_name")
        .and_then(value_text)
        .unwrap_or_else(|| ctx.default_reporter.clone());

    let client_key = match branch {
        Some(branch) => format!("vitals-{}-{}", doc.id, branch),
        None => format!("vitals-{}", doc.id),
    };

    TargetEvent {
        client_key: Some(client_key),
        destination,
        org_unit,
        occurred_at,
        status: EventStatus::Completed,
        reported_by,
        data_values: Vec::new(),
        coordinate: doc.geolocation.map(|g| Coordinate {
            latitude: g.latitude,
            longitude: g.longitude,
        }),
    }
}

fn apply_mappings(event: &mut TargetEvent, doc: &SourceDocument, mappings: &[FieldMapping]) {
    for mapping in mappings {
        let value = match mapping.group {
            FieldGroup::Top => doc.field(mapping.source),
            FieldGroup::Review => doc.group_field(REVIEW_GROUP, mapping.source),
        };

        let Some(text) = value.and_then(value_text) else {
            continue;
        };

        let normalized = match mapping.normalizer {
            Normalizer::Verbatim => text,
            Normalizer::Capitalize => capitalize(&text),
            Normalizer::DateTime => normalize_datetime(&text),
            Normalizer::Vocabulary(table) => vocabulary(table, &text),
            Normalizer::VocabularyOr(table, default) => vocabulary_or(table, default, &text),
        };

        if !normalized.is_empty() {
            event.push_value(mapping.target, normalized);
        }
    }
}
