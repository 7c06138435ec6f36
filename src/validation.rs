use crate::lead::{FieldKind, LeadField, LeadRecord, ProjectsPerMonth};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address.";
pub const INVALID_PHONE_MESSAGE: &str = "Please enter a valid phone number.";
pub const INVALID_CHOICE_MESSAGE: &str = "Please select a valid option.";

lazy_static! {
    static ref EMAIL_PATTERN: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    // ASCII digits only; `\d` would also accept other scripts' digits.
    static ref PHONE_PATTERN: Regex = Regex::new(r"^[0-9\s\-\+\(\)]+$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub message: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

/// Check a single input value. First failing rule wins.
pub fn validate(kind: FieldKind, raw: &str, required: bool) -> ValidationResult {
    let value = raw.trim();

    if value.is_empty() {
        return if required {
            ValidationResult::invalid(REQUIRED_MESSAGE)
        } else {
            ValidationResult::ok()
        };
    }

    match kind {
        FieldKind::Email if !EMAIL_PATTERN.is_match(value) => {
            ValidationResult::invalid(INVALID_EMAIL_MESSAGE)
        }
        FieldKind::Phone if !PHONE_PATTERN.is_match(value) => {
            ValidationResult::invalid(INVALID_PHONE_MESSAGE)
        }
        FieldKind::Choice if ProjectsPerMonth::parse(value).is_none() => {
            ValidationResult::invalid(INVALID_CHOICE_MESSAGE)
        }
        _ => ValidationResult::ok(),
    }
}

/// Which fields must be filled in before a lead can be submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSchema {
    optional: BTreeSet<LeadField>,
}

impl FormSchema {
    pub fn with_optional(fields: impl IntoIterator<Item = LeadField>) -> Self {
        Self {
            optional: fields.into_iter().collect(),
        }
    }

    pub fn is_required(&self, field: LeadField) -> bool {
        !self.optional.contains(&field)
    }

    pub fn validate_field(&self, field: LeadField, raw: &str) -> ValidationResult {
        validate(field.kind(), raw, self.is_required(field))
    }

    pub fn validate_record(&self, lead: &LeadRecord) -> ValidationReport {
        let results = LeadField::ALL
            .iter()
            .map(|field| (*field, self.validate_field(*field, lead.get(*field))))
            .collect();
        ValidationReport { results }
    }
}

/// Outcome of validating every field of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    results: BTreeMap<LeadField, ValidationResult>,
}

impl ValidationReport {
    pub fn is_submittable(&self) -> bool {
        self.results.values().all(|r| r.valid)
    }

    pub fn results(&self) -> &BTreeMap<LeadField, ValidationResult> {
        &self.results
    }

    pub fn into_results(self) -> BTreeMap<LeadField, ValidationResult> {
        self.results
    }

    /// Failing fields and their messages.
    pub fn errors(&self) -> BTreeMap<LeadField, String> {
        self.results
            .iter()
            .filter(|(_, r)| !r.valid)
            .map(|(field, r)| (*field, r.message.clone().unwrap_or_default()))
            .collect()
    }
}
