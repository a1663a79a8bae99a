//! Complaint deployment - student complaint tracking
//!
//! Categorical fields are closed enumerations for callers, but rows store
//! their labels as plain text: the table accepts whatever a writer puts there.

use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::record::{require, ColumnName, RecordShape};
use crate::storage::schema::{ColumnSpec, SqlType, TableSchema, EPOCH_DEFAULT};
use crate::{Error, Result};

const CREATE_COMPLAINTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS complaints (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    full_name TEXT NOT NULL,
    gender TEXT NOT NULL,
    complain TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
)
"#;

const COMPLAINT_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::required("full_name", SqlType::Text),
    ColumnSpec::required("gender", SqlType::Text),
    ColumnSpec::required("complaint_type", SqlType::Text).with_default("'Other'"),
    ColumnSpec::required("priority", SqlType::Text).with_default("'Medium'"),
    ColumnSpec::required("status", SqlType::Text).with_default("'Pending'"),
    ColumnSpec::required("complain", SqlType::Text),
    ColumnSpec::required("created_at", SqlType::Text).with_default(EPOCH_DEFAULT),
];

static COMPLAINT_SCHEMA: TableSchema = TableSchema {
    table: "complaints",
    create_sql: CREATE_COMPLAINTS_TABLE,
    columns: COMPLAINT_COLUMNS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }

    pub fn all() -> &'static [Gender] {
        &[Gender::Male, Gender::Female, Gender::Other]
    }
}

impl FromStr for Gender {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            "other" | "o" => Ok(Gender::Other),
            _ => Err(Error::Validation(format!("Unknown gender: {}", s))),
        }
    }
}

/// Category a complaint is filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComplaintType {
    Hostel,
    Mess,
    Academic,
    Transport,
    FeeAccounts,
    FacultyBehaviour,
    TechnicalIt,
    Other,
}

impl ComplaintType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintType::Hostel => "Hostel Issue",
            ComplaintType::Mess => "Mess Issue",
            ComplaintType::Academic => "Academic Issue",
            ComplaintType::Transport => "Transport",
            ComplaintType::FeeAccounts => "Fee / Accounts",
            ComplaintType::FacultyBehaviour => "Faculty Behaviour",
            ComplaintType::TechnicalIt => "Technical / IT Issue",
            ComplaintType::Other => "Other",
        }
    }

    pub fn all() -> &'static [ComplaintType] {
        &[
            ComplaintType::Hostel,
            ComplaintType::Mess,
            ComplaintType::Academic,
            ComplaintType::Transport,
            ComplaintType::FeeAccounts,
            ComplaintType::FacultyBehaviour,
            ComplaintType::TechnicalIt,
            ComplaintType::Other,
        ]
    }
}

impl FromStr for ComplaintType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        if let Some(kind) = Self::all()
            .iter()
            .find(|k| k.as_str().to_lowercase() == wanted)
        {
            return Ok(*kind);
        }
        match wanted.as_str() {
            "hostel" => Ok(ComplaintType::Hostel),
            "mess" => Ok(ComplaintType::Mess),
            "academic" => Ok(ComplaintType::Academic),
            "fee" | "fees" | "accounts" => Ok(ComplaintType::FeeAccounts),
            "faculty" => Ok(ComplaintType::FacultyBehaviour),
            "it" | "technical" => Ok(ComplaintType::TechnicalIt),
            _ => Err(Error::Validation(format!("Unknown complaint type: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Urgent => "Urgent",
        }
    }

    pub fn all() -> &'static [Priority] {
        &[Priority::Low, Priority::Medium, Priority::High, Priority::Urgent]
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" | "med" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            _ => Err(Error::Validation(format!("Unknown priority: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ComplaintStatus {
    #[default]
    Pending,
    InProgress,
    Resolved,
    Rejected,
}

impl ComplaintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "Pending",
            ComplaintStatus::InProgress => "In Progress",
            ComplaintStatus::Resolved => "Resolved",
            ComplaintStatus::Rejected => "Rejected",
        }
    }

    pub fn all() -> &'static [ComplaintStatus] {
        &[
            ComplaintStatus::Pending,
            ComplaintStatus::InProgress,
            ComplaintStatus::Resolved,
            ComplaintStatus::Rejected,
        ]
    }
}

impl FromStr for ComplaintStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "pending" => Ok(ComplaintStatus::Pending),
            "in progress" | "progress" => Ok(ComplaintStatus::InProgress),
            "resolved" | "done" => Ok(ComplaintStatus::Resolved),
            "rejected" => Ok(ComplaintStatus::Rejected),
            _ => Err(Error::Validation(format!("Unknown status: {}", s))),
        }
    }
}

macro_rules! impl_display {
    ($($ty:ty),*) => {
        $(impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        })*
    };
}

impl_display!(Gender, ComplaintType, Priority, ComplaintStatus);

/// Searchable complaint columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComplaintColumn {
    FullName,
    Gender,
    ComplaintType,
    Priority,
    Status,
    Complain,
}

impl ColumnName for ComplaintColumn {
    fn as_str(&self) -> &'static str {
        match self {
            ComplaintColumn::FullName => "full_name",
            ComplaintColumn::Gender => "gender",
            ComplaintColumn::ComplaintType => "complaint_type",
            ComplaintColumn::Priority => "priority",
            ComplaintColumn::Status => "status",
            ComplaintColumn::Complain => "complain",
        }
    }
}

impl FromStr for ComplaintColumn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "name" | "full_name" => Ok(ComplaintColumn::FullName),
            "gender" => Ok(ComplaintColumn::Gender),
            "type" | "complaint_type" => Ok(ComplaintColumn::ComplaintType),
            "priority" => Ok(ComplaintColumn::Priority),
            "status" => Ok(ComplaintColumn::Status),
            "text" | "complain" | "complaint" => Ok(ComplaintColumn::Complain),
            _ => Err(Error::Validation(format!("Unknown complaint column: {}", s))),
        }
    }
}

/// A student complaint.
///
/// Fields hold the stored labels. Use [`Complaint::new`] to build one from
/// the closed enumerations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Complaint {
    pub full_name: String,
    pub gender: String,
    pub complaint_type: String,
    pub priority: String,
    pub status: String,
    /// Complaint text
    pub complain: String,
}

impl Complaint {
    /// Create a new pending complaint
    pub fn new(
        full_name: impl Into<String>,
        gender: Gender,
        complaint_type: ComplaintType,
        priority: Priority,
        complain: impl Into<String>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            gender: gender.as_str().to_string(),
            complaint_type: complaint_type.as_str().to_string(),
            priority: priority.as_str().to_string(),
            status: ComplaintStatus::default().as_str().to_string(),
            complain: complain.into(),
        }
    }

    pub fn with_status(mut self, status: ComplaintStatus) -> Self {
        self.status = status.as_str().to_string();
        self
    }
}

impl RecordShape for Complaint {
    type Column = ComplaintColumn;

    fn schema() -> &'static TableSchema {
        &COMPLAINT_SCHEMA
    }

    fn validate(&self) -> Result<()> {
        require("Full name", &self.full_name)?;
        require("Complaint type", &self.complaint_type)?;
        require("Complain", &self.complain)
    }

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("full_name", Value::Text(self.full_name.clone())),
            ("gender", Value::Text(self.gender.clone())),
            ("complaint_type", Value::Text(self.complaint_type.clone())),
            ("priority", Value::Text(self.priority.clone())),
            ("status", Value::Text(self.status.clone())),
            ("complain", Value::Text(self.complain.clone())),
        ]
    }

    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            full_name: row.get("full_name")?,
            gender: row.get("gender")?,
            complaint_type: row.get("complaint_type")?,
            priority: row.get("priority")?,
            status: row.get("status")?,
            complain: row.get("complain")?,
        })
    }

    fn fixtures() -> Vec<Self> {
        use ComplaintType::*;
        use Gender::*;
        use Priority::*;

        [
            ("Aman Sharma", Male, Hostel, Medium, "Bathroom not cleaned from two days."),
            ("Priya Verma", Female, Academic, High, "Faculty not covering syllabus properly."),
            ("Rohit Mehta", Male, Mess, Low, "Food quality is average, need improvement."),
            ("Simran Kaur", Female, FacultyBehaviour, High, "Faculty humiliates students during class."),
            ("Kunal Bansal", Male, Transport, Medium, "Bus arrived 45 minutes late."),
            ("Sneha Patel", Female, TechnicalIt, High, "LMS not working, cannot submit assignment."),
            ("Harsh Raj", Male, FeeAccounts, Medium, "Wrong amount shown in fee portal."),
            ("Jaspreet Singh", Male, Mess, High, "Found insects in food."),
            ("Ritika Sharma", Female, Hostel, High, "AC not working from last week."),
            ("Rohit Saini", Male, Academic, Low, "Need extra lab session."),
            ("Aditya Jain", Male, FacultyBehaviour, Medium, "Faculty ignores doubts in class."),
            ("Megha Tiwari", Female, TechnicalIt, Medium, "WiFi disconnecting frequently."),
            ("Yash Gupta", Male, Transport, Low, "Route change request."),
            ("Divya Agarwal", Female, FeeAccounts, High, "Refund not received yet."),
            ("Mohit Kumar", Male, Hostel, Low, "Water cooler not functioning."),
            ("Tanisha Kaur", Female, Mess, Medium, "Rice served was stale."),
            ("Saurabh Singh", Male, Academic, Medium, "Requesting notes of previous lecture."),
            ("Nisha Sharma", Female, ComplaintType::Other, Urgent, "Lost ID card inside campus."),
        ]
        .into_iter()
        .map(|(name, gender, kind, priority, text)| Complaint::new(name, gender, kind, priority, text))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_parsing() {
        assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("Fee / Accounts".parse::<ComplaintType>().unwrap(), ComplaintType::FeeAccounts);
        assert_eq!("hostel".parse::<ComplaintType>().unwrap(), ComplaintType::Hostel);
        assert_eq!("in-progress".parse::<ComplaintStatus>().unwrap(), ComplaintStatus::InProgress);
        assert_eq!("F".parse::<Gender>().unwrap(), Gender::Female);
        assert!(matches!("critical".parse::<Priority>(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_labels_round_trip_through_from_str() {
        for kind in ComplaintType::all() {
            assert_eq!(kind.as_str().parse::<ComplaintType>().unwrap(), *kind);
        }
        for status in ComplaintStatus::all() {
            assert_eq!(status.as_str().parse::<ComplaintStatus>().unwrap(), *status);
        }
    }

    #[test]
    fn test_validate_required_fields() {
        let ok = Complaint::new("Aman Sharma", Gender::Male, ComplaintType::Hostel, Priority::Medium, "Bathroom not cleaned");
        assert!(ok.validate().is_ok());

        let mut blank_name = ok.clone();
        blank_name.full_name = "  ".to_string();
        assert!(matches!(blank_name.validate(), Err(Error::Validation(_))));

        let mut blank_text = ok;
        blank_text.complain = String::new();
        assert!(matches!(blank_text.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_values_follow_descriptor() {
        let complaint = Complaint::new("Aman", Gender::Male, ComplaintType::Hostel, Priority::Low, "text");
        for (column, _) in complaint.values() {
            assert!(Complaint::schema().column(column).is_some(), "{} missing from descriptor", column);
        }
        assert_eq!(complaint.status, "Pending");
    }

    #[test]
    fn test_fixtures() {
        let fixtures = Complaint::fixtures();
        assert_eq!(fixtures.len(), 18);
        assert!(fixtures.iter().all(|c| c.validate().is_ok()));
        assert_eq!(fixtures[17].priority, "Urgent");
    }
}
