//! Staffing section: ratios, workload, charge nurse and resources.

use super::fields::{ChargeAssignment, Grade, Rating, Workload};
use super::section::{FieldError, ReportSection, SectionKind, comment_error, non_empty};
use crate::moderation::FreeTextField;
use serde::{Deserialize, Serialize};

/// Highest patient count a ratio may have (1:15)
pub const MAX_RATIO: u8 = 15;

const RATIO_MESSAGE: &str =
    "Ratio can't be higher than 1:15. Please contact site admin if a higher ratio applies to you.";

/// Ratio answers. Patient counts of zero mean "not entered".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratio {
    pub has_ratio: Option<bool>,
    pub actual: u8,
    pub appropriate: Option<bool>,
    pub ideal: u8,
}

impl Ratio {
    fn progress(&self) -> u8 {
        match self.has_ratio {
            None => 0,
            Some(false) => 30,
            Some(true) => {
                let mut progress = 10;
                if ratio_in_range(self.actual) {
                    progress += 10;
                }
                progress += match self.appropriate {
                    Some(true) => 10,
                    Some(false) if ratio_in_range(self.ideal) => 10,
                    Some(false) => 5,
                    None => 0,
                };
                progress
            }
        }
    }
}

fn ratio_in_range(patients: u8) -> bool {
    (1..=MAX_RATIO).contains(&patients)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeNurse {
    pub present: Option<bool>,
    pub assignment: Option<ChargeAssignment>,
}

/// Resources the nurse can rely on during a shift
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    pub rapid_response: bool,
    pub behavioral_response: bool,
    pub transport: bool,
    pub phlebotomy: bool,
    pub cvad: bool,
    pub iv_team: bool,
    /// Wound, ostomy and continence nursing
    pub wocn: bool,
    pub chaplain: bool,
    pub educator: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Staffing {
    ratio: Ratio,
    workload: Option<Workload>,
    workload_rating: Option<Rating>,
    charge: ChargeNurse,
    resources: Resources,
    overall: Option<Grade>,
    comments: String,
}

impl Staffing {
    pub fn ratio(&self) -> Ratio {
        self.ratio
    }

    /// Changing the answer discards the ratio details
    pub fn set_has_ratio(&mut self, has_ratio: bool) {
        if self.ratio.has_ratio != Some(has_ratio) {
            self.ratio = Ratio {
                has_ratio: Some(has_ratio),
                ..Ratio::default()
            };
        }
    }

    pub fn set_actual_ratio(&mut self, patients: u8) {
        self.ratio.actual = patients;
    }

    /// An appropriate ratio has no ideal ratio
    pub fn set_ratio_appropriate(&mut self, appropriate: bool) {
        self.ratio.appropriate = Some(appropriate);
        if appropriate {
            self.ratio.ideal = 0;
        }
    }

    pub fn set_ideal_ratio(&mut self, patients: u8) {
        self.ratio.ideal = patients;
    }

    pub fn workload(&self) -> Option<Workload> {
        self.workload
    }

    pub fn set_workload(&mut self, workload: Workload) {
        self.workload = Some(workload);
    }

    pub fn workload_rating(&self) -> Option<Rating> {
        self.workload_rating
    }

    pub fn set_workload_rating(&mut self, rating: Rating) {
        self.workload_rating = Some(rating);
    }

    pub fn charge(&self) -> ChargeNurse {
        self.charge
    }

    /// Changing the answer clears the charge nurse's assignment frequency
    pub fn set_charge_present(&mut self, present: bool) {
        if self.charge.present != Some(present) {
            self.charge = ChargeNurse {
                present: Some(present),
                assignment: None,
            };
        }
    }

    pub fn set_charge_assignment(&mut self, assignment: ChargeAssignment) -> Result<(), FieldError> {
        if self.charge.present != Some(true) {
            return Err(FieldError::new(
                "charge_assignment",
                "Only applies when a charge nurse is present.",
            ));
        }
        self.charge.assignment = Some(assignment);
        Ok(())
    }

    pub fn resources(&self) -> Resources {
        self.resources
    }

    pub fn resources_mut(&mut self) -> &mut Resources {
        &mut self.resources
    }

    pub fn overall(&self) -> Option<Grade> {
        self.overall
    }

    pub fn set_overall(&mut self, grade: Grade) {
        self.overall = Some(grade);
    }

    pub fn comments(&self) -> &str {
        &self.comments
    }

    pub fn set_comments(&mut self, comments: impl Into<String>) {
        self.comments = comments.into();
    }
}

impl ReportSection for Staffing {
    fn kind(&self) -> SectionKind {
        SectionKind::Staffing
    }

    fn progress(&self) -> u8 {
        let mut progress = self.ratio.progress();
        if self.workload.is_some() {
            progress += 10;
        }
        if self.workload_rating.is_some() {
            progress += 10;
        }
        progress += match (self.charge.present, self.charge.assignment) {
            (Some(false), _) => 15,
            (Some(true), Some(_)) => 15,
            (Some(true), None) => 5,
            (None, _) => 0,
        };
        if self.overall.is_some() {
            progress += 30;
        }
        if comment_error("comments", &self.comments).is_none() {
            progress += 5;
        }
        progress
    }

    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.ratio.actual > MAX_RATIO {
            errors.push(FieldError::new("actual_ratio", RATIO_MESSAGE));
        }
        if self.ratio.ideal > MAX_RATIO {
            errors.push(FieldError::new("ideal_ratio", RATIO_MESSAGE));
        }
        errors.extend(comment_error("comments", &self.comments));
        errors
    }

    fn free_text(&self) -> Vec<(FreeTextField, String)> {
        non_empty(&self.comments)
            .map(|text| (FreeTextField::StaffingComments, text))
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answered() -> Staffing {
        let mut staffing = Staffing::default();
        staffing.set_workload(Workload::Heavy);
        staffing.set_workload_rating(Rating::new(2).unwrap());
        staffing.set_charge_present(false);
        staffing.set_overall(Grade::C);
        staffing
    }

    #[test]
    fn test_no_ratio_path_is_complete() {
        let mut staffing = answered();
        staffing.set_has_ratio(false);
        assert_eq!(staffing.progress(), 100);
        assert!(staffing.can_advance());
    }

    #[test]
    fn test_ratio_path_scoring() {
        let mut staffing = answered();
        staffing.set_has_ratio(true);
        assert_eq!(staffing.progress(), 80);

        staffing.set_actual_ratio(5);
        assert_eq!(staffing.progress(), 90);

        staffing.set_ratio_appropriate(false);
        assert_eq!(staffing.progress(), 95);

        staffing.set_ideal_ratio(4);
        assert_eq!(staffing.progress(), 100);
    }

    #[test]
    fn test_ratio_above_limit() {
        let mut staffing = answered();
        staffing.set_has_ratio(true);
        staffing.set_actual_ratio(16);
        staffing.set_ratio_appropriate(true);
        assert_eq!(staffing.validate().len(), 1);
        assert!(!staffing.can_advance());
    }

    #[test]
    fn test_toggling_has_ratio_clears_details() {
        let mut staffing = answered();
        staffing.set_has_ratio(true);
        staffing.set_actual_ratio(5);
        staffing.set_has_ratio(false);
        staffing.set_has_ratio(true);
        assert_eq!(staffing.ratio().actual, 0);
    }

    #[test]
    fn test_charge_assignment_requires_charge_nurse() {
        let mut staffing = answered();
        assert!(staffing.set_charge_assignment(ChargeAssignment::Often).is_err());

        staffing.set_charge_present(true);
        staffing.set_charge_assignment(ChargeAssignment::Often).unwrap();
        staffing.set_charge_present(false);
        assert!(staffing.charge().assignment.is_none());
    }

    #[test]
    fn test_resources_wire_format() {
        let mut staffing = answered();
        staffing.resources_mut().phlebotomy = true;
        staffing.resources_mut().wocn = true;

        let resources = serde_json::to_value(staffing.resources()).unwrap();
        assert_eq!(
            resources,
            serde_json::json!({
                "rapid_response": false,
                "behavioral_response": false,
                "transport": false,
                "phlebotomy": true,
                "cvad": false,
                "iv_team": false,
                "wocn": true,
                "chaplain": false,
                "educator": false,
            })
        );

        let restored: Staffing = serde_json::from_value(serde_json::to_value(&staffing).unwrap()).unwrap();
        assert_eq!(restored, staffing);
    }
}
