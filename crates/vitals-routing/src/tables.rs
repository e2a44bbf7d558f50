//! Per-category field-mapping tables
//!
//! Each table maps source form field names to tracker data element ids.
//! The ids are deployment constants taken from the tracker's metadata
//! catalog; they are data, not behavior, and changing a deployment means
//! editing these tables only.

/// Where a source field lives on the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldGroup {
    /// Directly under `fields`
    Top,
    /// Inside the nested `fields.group_review` map
    Review,
}

/// How a field value is normalized before emission.
#[derive(Debug, Clone, Copy)]
pub enum Normalizer {
    /// Emit the textual value as-is
    Verbatim,
    /// First letter upper, rest lower
    Capitalize,
    /// Date-only values get a midnight UTC time component appended
    DateTime,
    /// Controlled vocabulary; unmapped values fall back to `Capitalize`
    Vocabulary(&'static [(&'static str, &'static str)]),
    /// Controlled vocabulary; unmapped values become the given default
    VocabularyOr(&'static [(&'static str, &'static str)], &'static str),
}

/// One row of a category's mapping table.
#[derive(Debug, Clone, Copy)]
pub struct FieldMapping {
    /// Source form field name
    pub source: &'static str,
    /// Target data element id
    pub target: &'static str,
    /// Where the source field lives
    pub group: FieldGroup,
    /// Normalization applied before emission
    pub normalizer: Normalizer,
}

const fn top(source: &'static str, target: &'static str, normalizer: Normalizer) -> FieldMapping {
    FieldMapping { source, target, group: FieldGroup::Top, normalizer }
}

const fn review(source: &'static str, target: &'static str, normalizer: Normalizer) -> FieldMapping {
    FieldMapping { source, target, group: FieldGroup::Review, normalizer }
}

/// Education level display forms.
pub const EDUCATION: &[(&str, &str)] = &[
    ("post-secondary", "Higher than secondary"),
    ("none", "None"),
    ("primary", "Primary"),
    ("secondary", "Secondary"),
];

/// Occupation display forms.
pub const OCCUPATION: &[(&str, &str)] = &[
    ("employed", "Employed"),
    ("self-employed", "Self-employed"),
    ("not employed", "Not employed"),
    ("unemployed", "Not employed"),
];

/// Nationality display forms. Unmapped values default to Kenyan.
pub const NATIONALITY: &[(&str, &str)] = &[
    ("kenyan", "Kenyan"),
    ("other", "Other"),
];

/// Reporter role recorded when the form does not carry one.
pub const DEFAULT_REPORTER_CADRE: &str = "CHA";

/// Community maternal death notification (C-MDN) mappings.
pub const DEATH_REVIEW_MAPPINGS: &[FieldMapping] = &[
    // Patient demographics
    top("patient_age_in_years", "SjKctl9bPGk", Normalizer::Verbatim), // C-MDN_Age(Yrs)
    top("date_of_death", "nOBOcP6XxzQ", Normalizer::DateTime),        // C-MDN_Date and time of Death
    // Maternal death specifics (review group)
    review("pregnant_at_death", "J6aK3hgLN2q", Normalizer::Capitalize), // C-MDN_Was the woman pregnant at the time of death?
    review("gavida_pregnancy", "rSPuQwsFMN1", Normalizer::Verbatim),    // C-MDN_Gravida
    review("parity_pregnancy", "kzoFlZlVU18", Normalizer::Verbatim),    // C-MDN_Parity
    review("weeks_pregnant", "PTSRgVFkCDa", Normalizer::Verbatim),      // C-MDN_How many weeks pregnant?
    review("days_since_childbirth", "S8z0bxQaNqx", Normalizer::Verbatim), // C-MDN_Days since childbirth
    review("hours_days_since", "MvLTyFSCPgN", Normalizer::Verbatim),    // C-MDN_Hours/days since childbirth/abortion
    review("marriage_status_maternal", "vr9N7az7jCT", Normalizer::Capitalize), // C-MDN_Marital status?
    review("educational_level_maternal", "kdpNkAdLGwE", Normalizer::Vocabulary(EDUCATION)), // C-MDN_Education level
    review("mother_occupation_maternal", "hqP4OGUgLxu", Normalizer::Vocabulary(OCCUPATION)), // C-MDN_Occupation?
    review("nationality", "QtP5E8twVr3", Normalizer::VocabularyOr(NATIONALITY, "Kenyan")), // C-MDN_Nationality
    // Location
    top("chu_name", "ZZ0TDz8rqes", Normalizer::Verbatim),     // C-MDN_CHU Name
    top("chu_code_disp", "yXRsh8aPlbs", Normalizer::Verbatim), // C-MDN_MCUL Code
    top("household_name", "zwYtA5MEuoS", Normalizer::Verbatim), // C-MDN_Household No
    // Reporter
    top("chv_name", "XuUjeqMdP1z", Normalizer::Verbatim),  // C-MDN_Form Completed by (Name)
    top("chv_phone", "wNIB1Wfqzvy", Normalizer::Verbatim), // C-MDN_Form Completed by (Telephone)
];

/// C-MDN_Form Completed by (Cadre); injected with the default cadre when
/// the form carries no reporter role.
pub const DEATH_REVIEW_CADRE: &str = "AjxNcaMDxdW";

/// C-MDN_Form Completed by (Date); filled from the document's reported-at
/// timestamp as a plain date.
pub const DEATH_REVIEW_REPORT_DATE: &str = "QGS1ZOw97zV";

/// Maternal verbal autopsy (VA-M) mappings.
pub const VA_MATERNAL_MAPPINGS: &[FieldMapping] = &[
    top("patient_age_in_years", "WkXxkKEJLsg", Normalizer::Verbatim), // VA-M_Age(Yrs)
    top("date_of_death", "Hl5zkipMHrI", Normalizer::DateTime),        // VA-M_Date of Death
    review("pregnant_at_death", "zBMaEsMxhXi", Normalizer::Capitalize), // VA-M_Pregnant at time of death?
    review("marriage_status_maternal", "fJzjahPOcKY", Normalizer::Capitalize), // VA-M_Marital status
    review("place_of_death", "tQhzJgiQzGd", Normalizer::Capitalize),  // VA-M_Place of death
    review("probable_cause_of_death", "rVYoZvMb2wA", Normalizer::Verbatim), // VA-M_Probable cause
    top("chv_name", "cnLScmGGRBW", Normalizer::Verbatim),  // VA-M_Form Completed by (Name)
    top("chv_phone", "vSjErrLZlpL", Normalizer::Verbatim), // VA-M_Form Completed by (Telephone)
];

/// VA-M_Form Completed by (Cadre)
pub const VA_MATERNAL_CADRE: &str = "XvTpRqWbNcD";

/// Perinatal verbal autopsy (VA-P) mappings.
pub const VA_PERINATAL_MAPPINGS: &[FieldMapping] = &[
    top("age_in_days", "bTmLdnXdYuP", Normalizer::Verbatim),   // VA-P_Age(Days)
    top("date_of_death", "KyZhHbtoOAh", Normalizer::DateTime), // VA-P_Date of Death
    top("patient_sex", "eZrfOVvngJQ", Normalizer::Capitalize), // VA-P_Sex
    review("place_of_death", "QxkZzRcdVuN", Normalizer::Capitalize), // VA-P_Place of death
    review("probable_cause_of_death", "mWgNVzPuYbF", Normalizer::Verbatim), // VA-P_Probable cause
    top("chv_name", "sJpTvNdWqKe", Normalizer::Verbatim),  // VA-P_Form Completed by (Name)
    top("chv_phone", "uFbGcLdMnPq", Normalizer::Verbatim), // VA-P_Form Completed by (Telephone)
];

/// VA-P_Form Completed by (Cadre)
pub const VA_PERINATAL_CADRE: &str = "ZcWqXrVbMdF";
