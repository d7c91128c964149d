//! Report and hospital data models.

use super::assignment::Assignment;
use super::compensation::Compensation;
use super::section::ReportSection;
use super::staffing::Staffing;
use crate::moderation::{FreeTextField, ModerationResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Hospital ID type (CMS certification number, e.g. `"010001"`)
pub type HospitalId = String;

/// Units, areas and roles known for a hospital, shown as pick lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Departments {
    #[serde(default, deserialize_with = "null_as_default")]
    pub units: BTreeSet<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub areas: BTreeSet<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub roles: BTreeSet<String>,
}

impl Departments {
    /// Add typed-in names. Returns whether anything new was added.
    pub fn merge(&mut self, unit: Option<&str>, area: Option<&str>, role: Option<&str>) -> bool {
        let mut changed = false;
        for (list, name) in [(&mut self.units, unit), (&mut self.areas, area), (&mut self.roles, role)] {
            if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
                changed |= list.insert(name.to_uppercase());
            }
        }
        changed
    }
}

/// Row of the hospitals table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    #[serde(rename = "hosp_id")]
    pub id: HospitalId,
    #[serde(rename = "hosp_name")]
    pub name: String,
    #[serde(rename = "hosp_addr", default)]
    pub address: String,
    #[serde(rename = "hosp_city", default)]
    pub city: String,
    #[serde(rename = "hosp_state", default)]
    pub state: String,
    #[serde(rename = "hosp_zip", default)]
    pub zip: String,
    #[serde(rename = "hosp_county", default)]
    pub county: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub departments: Departments,
}

/// Hospital details copied into the report at creation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HospitalSnapshot {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub county: String,
}

impl From<&Hospital> for HospitalSnapshot {
    fn from(hospital: &Hospital) -> Self {
        Self {
            name: hospital.name.clone(),
            address: hospital.address.clone(),
            city: hospital.city.clone(),
            state: hospital.state.clone(),
            zip: hospital.zip.clone(),
            county: hospital.county.clone(),
        }
    }
}

/// The persisted report document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub report_id: Uuid,
    pub user_id: String,
    pub hospital_id: HospitalId,
    pub hospital: HospitalSnapshot,
    /// Upper-cased unit, area or role name; duplicate lookups match on it
    pub placement_key: String,
    pub compensation: Compensation,
    pub assignment: Assignment,
    pub staffing: Staffing,
    #[serde(flatten)]
    pub moderation: ModerationResult,
    pub created_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
}

impl Report {
    /// Non-empty free text across all three sections
    pub fn free_text(&self) -> Vec<(FreeTextField, String)> {
        let mut entries = self.compensation.free_text();
        entries.extend(self.assignment.free_text());
        entries.extend(self.staffing.free_text());
        entries
    }
}

/// Treat an explicit `null` column like a missing one
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
