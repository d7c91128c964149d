//! Assignment section: where the nurse works, specialties and peer ratings.

use super::fields::{Acuity, Grade, MAX_SPECIALTIES, Rating, Selection, is_specialty};
use super::section::{FieldError, ReportSection, SectionKind, comment_error, non_empty};
use crate::moderation::FreeTextField;
use serde::{Deserialize, Serialize};

/// Who is being rated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Peer {
    Nurses,
    NurseAides,
    Physicians,
    Management,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRatings {
    pub nurses: Option<Rating>,
    pub nurse_aides: Option<Rating>,
    pub physicians: Option<Rating>,
    pub management: Option<Rating>,
}

impl PeerRatings {
    fn answered(&self) -> usize {
        [self.nurses, self.nurse_aides, self.physicians, self.management]
            .iter()
            .filter(|r| r.is_some())
            .count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// "Are you reporting for a specific unit?" Unanswered until set.
    specific_unit: Option<bool>,
    unit: Option<Selection>,
    acuity: Option<Acuity>,
    /// Area or role, used when not reporting for a specific unit. At most
    /// one of the two is set.
    area: Option<Selection>,
    role: Option<Selection>,
    specialties: Vec<String>,
    ratings: PeerRatings,
    recommend: Option<bool>,
    overall: Option<Grade>,
    comments: String,
}

impl Assignment {
    pub fn specific_unit(&self) -> Option<bool> {
        self.specific_unit
    }

    /// Answering (or re-answering) resets every placement field
    pub fn set_specific_unit(&mut self, specific: bool) {
        self.specific_unit = Some(specific);
        self.unit = None;
        self.acuity = None;
        self.area = None;
        self.role = None;
    }

    pub fn unit(&self) -> Option<&Selection> {
        self.unit.as_ref()
    }

    /// Pick a unit. Changing the unit clears acuity.
    ///
    /// # Errors
    ///
    /// Returns a `FieldError` unless the user said they're reporting for a
    /// specific unit.
    pub fn select_unit(&mut self, unit: Selection) -> Result<(), FieldError> {
        if self.specific_unit != Some(true) {
            return Err(FieldError::new(
                "unit",
                "Answer whether you're reporting for a specific unit first.",
            ));
        }
        if self.unit.as_ref() != Some(&unit) {
            self.acuity = None;
        }
        self.unit = Some(unit);
        Ok(())
    }

    pub fn acuity(&self) -> Option<Acuity> {
        self.acuity
    }

    pub fn set_acuity(&mut self, acuity: Acuity) -> Result<(), FieldError> {
        if self.unit.is_none() {
            return Err(FieldError::new("acuity", "Select a unit first."));
        }
        self.acuity = Some(acuity);
        Ok(())
    }

    pub fn area(&self) -> Option<&Selection> {
        self.area.as_ref()
    }

    /// Pick an area, replacing any role.
    ///
    /// # Errors
    ///
    /// Returns a `FieldError` unless the user said they're not reporting for a
    /// specific unit.
    pub fn select_area(&mut self, area: Selection) -> Result<(), FieldError> {
        self.require_no_unit("area")?;
        self.role = None;
        self.area = Some(area);
        Ok(())
    }

    pub fn role(&self) -> Option<&Selection> {
        self.role.as_ref()
    }

    /// Pick a role, replacing any area.
    ///
    /// # Errors
    ///
    /// Same as [`Assignment::select_area`].
    pub fn select_role(&mut self, role: Selection) -> Result<(), FieldError> {
        self.require_no_unit("role")?;
        self.area = None;
        self.role = Some(role);
        Ok(())
    }

    fn require_no_unit(&self, field: &'static str) -> Result<(), FieldError> {
        if self.specific_unit != Some(false) {
            return Err(FieldError::new(
                field,
                "Areas and roles apply when you're not reporting for a specific unit.",
            ));
        }
        Ok(())
    }

    /// The area or role, whichever was picked
    fn non_unit_placement(&self) -> Option<&Selection> {
        self.area.as_ref().or(self.role.as_ref())
    }

    pub fn specialties(&self) -> &[String] {
        &self.specialties
    }

    pub fn set_specialties(&mut self, specialties: Vec<String>) {
        self.specialties = specialties;
    }

    pub fn ratings(&self) -> PeerRatings {
        self.ratings
    }

    pub fn set_rating(&mut self, peer: Peer, rating: Rating) {
        let slot = match peer {
            Peer::Nurses => &mut self.ratings.nurses,
            Peer::NurseAides => &mut self.ratings.nurse_aides,
            Peer::Physicians => &mut self.ratings.physicians,
            Peer::Management => &mut self.ratings.management,
        };
        *slot = Some(rating);
    }

    pub fn recommend(&self) -> Option<bool> {
        self.recommend
    }

    pub fn set_recommend(&mut self, recommend: bool) {
        self.recommend = Some(recommend);
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

    /// Upper-cased unit, area or role name, once the placement is answered.
    /// Two reports for the same hospital and placement are duplicates.
    pub fn placement_key(&self) -> Option<String> {
        let selection = match self.specific_unit? {
            true => self.unit.as_ref()?,
            false => self.non_unit_placement()?,
        };
        let name = selection.name().trim();
        (!name.is_empty()).then(|| name.to_uppercase())
    }

    fn placement_valid(&self) -> bool {
        match self.specific_unit {
            Some(true) => {
                self.unit.as_ref().is_some_and(Selection::is_complete) && self.acuity.is_some()
            }
            Some(false) => self.non_unit_placement().is_some_and(Selection::is_complete),
            None => false,
        }
    }

    fn specialty_errors(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.specialties.len() > MAX_SPECIALTIES {
            errors.push(FieldError::new(
                "specialties",
                "Select at most 3 specialties.",
            ));
        }
        for (i, specialty) in self.specialties.iter().enumerate() {
            if !is_specialty(specialty) {
                errors.push(FieldError::new(
                    "specialties",
                    format!("'{specialty}' is not a listed specialty."),
                ));
            } else if self.specialties[..i].contains(specialty) {
                errors.push(FieldError::new(
                    "specialties",
                    format!("'{specialty}' was selected more than once."),
                ));
            }
        }
        errors
    }
}

impl ReportSection for Assignment {
    fn kind(&self) -> SectionKind {
        SectionKind::Assignment
    }

    fn progress(&self) -> u8 {
        let mut progress = 0;
        if self.specific_unit.is_some() {
            progress += 10;
        }
        if self.placement_valid() {
            progress += 25;
        }
        if self.specialty_errors().is_empty() {
            progress += 5;
        }
        progress += 5 * self.ratings.answered() as u8;
        if self.recommend.is_some() {
            progress += 10;
        }
        if self.overall.is_some() {
            progress += 25;
        }
        if comment_error("comments", &self.comments).is_none() {
            progress += 5;
        }
        progress
    }

    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        for (field, selection) in [("unit", &self.unit), ("area", &self.area), ("role", &self.role)] {
            if let Some(name) = selection.as_ref().and_then(Selection::entered)
                && name.chars().count() > super::fields::ENTERED_NAME_MAX_CHARS
            {
                errors.push(FieldError::new(field, "Name must be 50 characters or less."));
            }
        }
        errors.extend(self.specialty_errors());
        errors.extend(comment_error("comments", &self.comments));
        errors
    }

    fn free_text(&self) -> Vec<(FreeTextField, String)> {
        let mut entries = Vec::new();
        if let Some(text) = non_empty(&self.comments) {
            entries.push((FreeTextField::AssignmentComments, text));
        }
        match self.specific_unit {
            Some(true) => {
                if let Some(name) = self.unit.as_ref().and_then(Selection::entered).and_then(non_empty) {
                    entries.push((FreeTextField::EnteredUnit, name));
                }
            }
            Some(false) => {
                if let Some(name) = self.area.as_ref().and_then(Selection::entered).and_then(non_empty) {
                    entries.push((FreeTextField::EnteredArea, name));
                }
                if let Some(name) = self.role.as_ref().and_then(Selection::entered).and_then(non_empty) {
                    entries.push((FreeTextField::EnteredRole, name));
                }
            }
            None => {}
        }
        entries
    }
}
