use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of input a field is, which decides the validation rules applied to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Text,
    Email,
    Phone,
    Choice,
}

/// Fields captured by the signup form, in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LeadField {
    FirstName,
    LastName,
    Email,
    Phone,
    Company,
    ProjectsPerMonth,
}

impl LeadField {
    pub const ALL: [LeadField; 6] = [
        LeadField::FirstName,
        LeadField::LastName,
        LeadField::Email,
        LeadField::Phone,
        LeadField::Company,
        LeadField::ProjectsPerMonth,
    ];

    /// Name used by the form markup and the stored JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadField::FirstName => "firstName",
            LeadField::LastName => "lastName",
            LeadField::Email => "email",
            LeadField::Phone => "phone",
            LeadField::Company => "company",
            LeadField::ProjectsPerMonth => "projectsPerMonth",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LeadField::FirstName => "First Name",
            LeadField::LastName => "Last Name",
            LeadField::Email => "Work Email",
            LeadField::Phone => "Phone Number",
            LeadField::Company => "Company Name",
            LeadField::ProjectsPerMonth => "Projects Per Month",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            LeadField::Email => FieldKind::Email,
            LeadField::Phone => FieldKind::Phone,
            LeadField::ProjectsPerMonth => FieldKind::Choice,
            _ => FieldKind::Text,
        }
    }
}

impl fmt::Display for LeadField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown form field: {0}")]
pub struct ParseFieldError(pub String);

impl FromStr for LeadField {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeadField::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| ParseFieldError(s.to_string()))
    }
}

/// Bucket labels offered by the "projects per month" select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectsPerMonth {
    #[serde(rename = "1-5")]
    UpToFive,
    #[serde(rename = "6-15")]
    SixToFifteen,
    #[serde(rename = "16-30")]
    SixteenToThirty,
    #[serde(rename = "30+")]
    OverThirty,
}

impl ProjectsPerMonth {
    pub const ALL: [ProjectsPerMonth; 4] = [
        ProjectsPerMonth::UpToFive,
        ProjectsPerMonth::SixToFifteen,
        ProjectsPerMonth::SixteenToThirty,
        ProjectsPerMonth::OverThirty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectsPerMonth::UpToFive => "1-5",
            ProjectsPerMonth::SixToFifteen => "6-15",
            ProjectsPerMonth::SixteenToThirty => "16-30",
            ProjectsPerMonth::OverThirty => "30+",
        }
    }

    pub fn display_label(&self) -> String {
        format!("{} Projects", self.as_str())
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL.iter().copied().find(|b| b.as_str() == value)
    }
}

/// A prospective customer's details as typed into the form.
///
/// Values are kept raw; nothing here guarantees they pass validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeadRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub projects_per_month: String,
}

impl LeadRecord {
    pub fn get(&self, field: LeadField) -> &str {
        match field {
            LeadField::FirstName => &self.first_name,
            LeadField::LastName => &self.last_name,
            LeadField::Email => &self.email,
            LeadField::Phone => &self.phone,
            LeadField::Company => &self.company,
            LeadField::ProjectsPerMonth => &self.projects_per_month,
        }
    }

    pub fn set(&mut self, field: LeadField, value: impl Into<String>) {
        let slot = match field {
            LeadField::FirstName => &mut self.first_name,
            LeadField::LastName => &mut self.last_name,
            LeadField::Email => &mut self.email,
            LeadField::Phone => &mut self.phone,
            LeadField::Company => &mut self.company,
            LeadField::ProjectsPerMonth => &mut self.projects_per_month,
        };
        *slot = value.into();
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    pub fn is_empty(&self) -> bool {
        LeadField::ALL.iter().all(|f| self.get(*f).is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_round_trip() {
        for field in LeadField::ALL {
            assert_eq!(field.as_str().parse::<LeadField>(), Ok(field));
        }
        assert_eq!(
            "fullName".parse::<LeadField>(),
            Err(ParseFieldError("fullName".to_string()))
        );
    }

    #[test]
    fn test_field_kinds() {
        assert_eq!(LeadField::Email.kind(), FieldKind::Email);
        assert_eq!(LeadField::Phone.kind(), FieldKind::Phone);
        assert_eq!(LeadField::ProjectsPerMonth.kind(), FieldKind::Choice);
        assert_eq!(LeadField::Company.kind(), FieldKind::Text);
    }

    #[test]
    fn test_projects_per_month_buckets() {
        assert_eq!(ProjectsPerMonth::parse("30+"), Some(ProjectsPerMonth::OverThirty));
        assert_eq!(ProjectsPerMonth::parse(" 6-15 "), Some(ProjectsPerMonth::SixToFifteen));
        assert_eq!(ProjectsPerMonth::parse("100"), None);
        assert_eq!(ProjectsPerMonth::UpToFive.display_label(), "1-5 Projects");
    }

    #[test]
    fn test_record_uses_camel_case_json() {
        let mut lead = LeadRecord::default();
        lead.set(LeadField::FirstName, "Dana");
        lead.set(LeadField::ProjectsPerMonth, "16-30");

        let json = serde_json::to_value(&lead).unwrap();
        assert_eq!(json["firstName"], "Dana");
        assert_eq!(json["projectsPerMonth"], "16-30");

        let parsed: LeadRecord = serde_json::from_str(r#"{"email":"dana@roofco.com"}"#).unwrap();
        assert_eq!(parsed.email, "dana@roofco.com");
        assert!(parsed.first_name.is_empty());
    }

    #[test]
    fn test_full_name_trims_missing_parts() {
        let mut lead = LeadRecord::default();
        assert_eq!(lead.full_name(), "");
        assert!(lead.is_empty());

        lead.set(LeadField::LastName, " Ortiz ");
        assert_eq!(lead.full_name(), "Ortiz");
        assert!(!lead.is_empty());
    }
}
