//! Moderation data models.

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Report fields holding user-written text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreeTextField {
    CompensationComments,
    AssignmentComments,
    StaffingComments,
    EnteredUnit,
    EnteredArea,
    EnteredRole,
}

impl FreeTextField {
    pub const ALL: [FreeTextField; 6] = [
        FreeTextField::CompensationComments,
        FreeTextField::AssignmentComments,
        FreeTextField::StaffingComments,
        FreeTextField::EnteredUnit,
        FreeTextField::EnteredArea,
        FreeTextField::EnteredRole,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            FreeTextField::CompensationComments => "compensation_comments",
            FreeTextField::AssignmentComments => "assignment_comments",
            FreeTextField::StaffingComments => "staffing_comments",
            FreeTextField::EnteredUnit => "entered_unit",
            FreeTextField::EnteredArea => "entered_area",
            FreeTextField::EnteredRole => "entered_role",
        }
    }

    pub fn flag_column(&self) -> &'static str {
        match self {
            FreeTextField::CompensationComments => "compensation_comments_flag",
            FreeTextField::AssignmentComments => "assignment_comments_flag",
            FreeTextField::StaffingComments => "staffing_comments_flag",
            FreeTextField::EnteredUnit => "entered_unit_flag",
            FreeTextField::EnteredArea => "entered_area_flag",
            FreeTextField::EnteredRole => "entered_role_flag",
        }
    }

    pub fn from_column(column: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.column() == column)
    }

    pub fn from_flag_column(column: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.flag_column() == column)
    }
}

impl fmt::Display for FreeTextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// A freshly persisted report's free text, queued for classification
#[derive(Clone)]
pub struct ModerationJob {
    pub report_id: Uuid,
    pub user_id: String,
    pub hospital_id: String,
    /// The submitter's token; the flag patch runs on their behalf
    pub access_token: String,
    pub entries: Vec<(FreeTextField, String)>,
}

impl fmt::Debug for ModerationJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModerationJob")
            .field("report_id", &self.report_id)
            .field("user_id", &self.user_id)
            .field("hospital_id", &self.hospital_id)
            .field("access_token", &"<redacted>")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl ModerationJob {
    pub fn entered_name(&self, field: FreeTextField) -> Option<&str> {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, text)| text.as_str())
    }
}

/// The classifier's answer for one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldVerdict {
    pub field: FreeTextField,
    pub flagged: bool,
    pub reason: Option<String>,
}

/// Flag reasons keyed by field; absent means not flagged.
///
/// Stored on the report as `<field>_flag` columns. Serializes every column,
/// unflagged ones as null, so writing a result also clears stale flags.
/// Deserializes by picking those columns out of the row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModerationResult(BTreeMap<FreeTextField, String>);

impl ModerationResult {
    pub fn from_verdicts(verdicts: &[FieldVerdict]) -> Self {
        let flags = verdicts
            .iter()
            .filter(|v| v.flagged)
            .map(|v| {
                let reason = v
                    .reason
                    .clone()
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| "Flagged by moderation".to_string());
                (v.field, reason)
            })
            .collect();
        Self(flags)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn reason(&self, field: FreeTextField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn flag(&mut self, field: FreeTextField, reason: impl Into<String>) {
        self.0.insert(field, reason.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FreeTextField, &String)> {
        self.0.iter()
    }
}

impl Serialize for ModerationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FreeTextField::ALL.len()))?;
        for field in FreeTextField::ALL {
            map.serialize_entry(field.flag_column(), &self.0.get(&field))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ModerationResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let columns = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        let flags = columns
            .into_iter()
            .filter_map(|(column, value)| {
                let field = FreeTextField::from_flag_column(&column)?;
                match value {
                    serde_json::Value::String(reason) => Some((field, reason)),
                    _ => None,
                }
            })
            .collect();
        Ok(Self(flags))
    }
}
