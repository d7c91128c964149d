//! Report wizard state machine.
//!
//! ```text
//! Compensation -> Assignment -> Staffing -> Submitted
//! ```
//!
//! Forward moves require the current section to be complete and valid.
//! Backward moves are always allowed. Jumps may land on any section up to
//! the first incomplete one.

use super::assignment::Assignment;
use super::compensation::Compensation;
use super::errors::{ReportError, ReportResult};
use super::models::{Hospital, HospitalSnapshot, Report};
use super::section::{ReportSection, SectionKind};
use super::staffing::Staffing;
use crate::moderation::{FreeTextField, ModerationResult};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Section(SectionKind),
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardMode {
    /// New report; gets a fresh id and goes through duplicate checks
    New,
    /// Rewriting a report already stored
    Edit,
}

/// In-progress report for one user and hospital
#[derive(Debug, Clone)]
pub struct ReportWizard {
    mode: WizardMode,
    step: WizardStep,
    report_id: Uuid,
    user_id: String,
    hospital_id: String,
    hospital: HospitalSnapshot,
    compensation: Compensation,
    assignment: Assignment,
    staffing: Staffing,
    moderation: ModerationResult,
    created_at: DateTime<Utc>,
    submitted_at: Option<DateTime<Utc>>,
}

impl ReportWizard {
    /// Start a new report
    pub fn new(user_id: impl Into<String>, hospital: &Hospital, now: DateTime<Utc>) -> Self {
        Self {
            mode: WizardMode::New,
            step: WizardStep::Section(SectionKind::Compensation),
            report_id: Uuid::new_v4(),
            user_id: user_id.into(),
            hospital_id: hospital.id.clone(),
            hospital: HospitalSnapshot::from(hospital),
            compensation: Compensation::default(),
            assignment: Assignment::default(),
            staffing: Staffing::default(),
            moderation: ModerationResult::default(),
            created_at: now,
            submitted_at: None,
        }
    }

    /// Reopen a stored report for editing
    ///
    /// # Errors
    ///
    /// `ReportError::NotOwner` if `user_id` didn't write the report.
    pub fn edit(report: Report, user_id: &str) -> ReportResult<Self> {
        if report.user_id != user_id {
            return Err(ReportError::NotOwner);
        }
        Ok(Self {
            mode: WizardMode::Edit,
            step: WizardStep::Section(SectionKind::Compensation),
            report_id: report.report_id,
            user_id: report.user_id,
            hospital_id: report.hospital_id,
            hospital: report.hospital,
            compensation: report.compensation,
            assignment: report.assignment,
            staffing: report.staffing,
            moderation: report.moderation,
            created_at: report.created_at,
            submitted_at: Some(report.submitted_at),
        })
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn mode(&self) -> WizardMode {
        self.mode
    }

    pub fn report_id(&self) -> Uuid {
        self.report_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn hospital_id(&self) -> &str {
        &self.hospital_id
    }

    pub fn compensation(&self) -> &Compensation {
        &self.compensation
    }

    pub fn compensation_mut(&mut self) -> &mut Compensation {
        &mut self.compensation
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    pub fn assignment_mut(&mut self) -> &mut Assignment {
        &mut self.assignment
    }

    pub fn staffing(&self) -> &Staffing {
        &self.staffing
    }

    pub fn staffing_mut(&mut self) -> &mut Staffing {
        &mut self.staffing
    }

    pub fn section(&self, kind: SectionKind) -> &dyn ReportSection {
        match kind {
            SectionKind::Compensation => &self.compensation,
            SectionKind::Assignment => &self.assignment,
            SectionKind::Staffing => &self.staffing,
        }
    }

    /// Move to the next section
    ///
    /// # Errors
    ///
    /// * `ReportError::SectionIncomplete` - current section can't advance
    /// * `ReportError::AtFinalSection` - already on staffing; submit instead
    /// * `ReportError::AlreadySubmitted` - wizard is done
    pub fn advance(&mut self) -> ReportResult<WizardStep> {
        let current = self.current_section()?;
        let section = self.section(current);
        if !section.can_advance() {
            return Err(ReportError::SectionIncomplete {
                section: current,
                progress: section.progress(),
                errors: section.validate(),
            });
        }
        let next = current.next().ok_or(ReportError::AtFinalSection)?;
        self.step = WizardStep::Section(next);
        Ok(self.step)
    }

    /// Move to the previous section; stays put on the first one
    pub fn back(&mut self) -> ReportResult<WizardStep> {
        let current = self.current_section()?;
        if let Some(previous) = current.previous() {
            self.step = WizardStep::Section(previous);
        }
        Ok(self.step)
    }

    /// Jump to a section at or before the first incomplete one
    pub fn go_to(&mut self, target: SectionKind) -> ReportResult<WizardStep> {
        self.current_section()?;
        if let Some(first_incomplete) = self.first_incomplete()
            && target > first_incomplete
        {
            return Err(ReportError::SectionLocked {
                requested: target,
                first_incomplete,
            });
        }
        self.step = WizardStep::Section(target);
        Ok(self.step)
    }

    pub fn first_incomplete(&self) -> Option<SectionKind> {
        SectionKind::ALL
            .into_iter()
            .find(|kind| !self.section(*kind).can_advance())
    }

    pub fn is_complete(&self) -> bool {
        self.first_incomplete().is_none()
    }

    /// Mean of the three section percentages
    pub fn overall_progress(&self) -> u8 {
        let total: u32 = SectionKind::ALL
            .iter()
            .map(|kind| u32::from(self.section(*kind).progress()))
            .sum();
        (total / SectionKind::ALL.len() as u32) as u8
    }

    pub fn placement_key(&self) -> Option<String> {
        self.assignment.placement_key()
    }

    /// Non-empty free text across all sections
    pub fn free_text(&self) -> Vec<(FreeTextField, String)> {
        let mut entries = self.compensation.free_text();
        entries.extend(self.assignment.free_text());
        entries.extend(self.staffing.free_text());
        entries
    }

    /// Build the document to store.
    ///
    /// New reports are stamped `submitted_at = now`; edits keep the original
    /// submission time and set `modified_at`. Moderation flags are reset,
    /// since the text is moderated again after every write.
    pub fn assemble(&self, now: DateTime<Utc>) -> Report {
        let (submitted_at, modified_at) = match (self.mode, self.submitted_at) {
            (WizardMode::Edit, Some(submitted_at)) => (submitted_at, Some(now)),
            (WizardMode::Edit, None) => (now, Some(now)),
            (WizardMode::New, _) => (now, None),
        };
        Report {
            report_id: self.report_id,
            user_id: self.user_id.clone(),
            hospital_id: self.hospital_id.clone(),
            hospital: self.hospital.clone(),
            placement_key: self.placement_key().unwrap_or_default(),
            compensation: self.compensation.clone(),
            assignment: self.assignment.clone(),
            staffing: self.staffing.clone(),
            moderation: ModerationResult::default(),
            created_at: self.created_at,
            submitted_at,
            modified_at,
        }
    }

    /// Turn this wizard into an edit of `existing`, keeping the answers
    /// entered so far. Used when a submit finds a recent report for the
    /// same placement.
    pub fn adopt_existing(&mut self, existing: &Report) {
        self.mode = WizardMode::Edit;
        self.step = WizardStep::Section(SectionKind::Compensation);
        self.report_id = existing.report_id;
        self.created_at = existing.created_at;
        self.submitted_at = Some(existing.submitted_at);
        self.moderation = existing.moderation.clone();
    }

    /// Flags from the last moderation pass, when editing
    pub fn moderation(&self) -> &ModerationResult {
        &self.moderation
    }

    pub(crate) fn regenerate_id(&mut self) -> Uuid {
        self.report_id = Uuid::new_v4();
        self.report_id
    }

    pub(crate) fn move_to(&mut self, section: SectionKind) {
        self.step = WizardStep::Section(section);
    }

    pub(crate) fn mark_submitted(&mut self) {
        self.step = WizardStep::Submitted;
    }

    fn current_section(&self) -> ReportResult<SectionKind> {
        match self.step {
            WizardStep::Section(kind) => Ok(kind),
            WizardStep::Submitted => Err(ReportError::AlreadySubmitted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fields::*;
    use crate::report::models::Departments;

    fn hospital() -> Hospital {
        Hospital {
            id: "010001".to_string(),
            name: "Southeast Health Medical Center".to_string(),
            address: "1108 Ross Clark Circle".to_string(),
            city: "Dothan".to_string(),
            state: "AL".to_string(),
            zip: "36301".to_string(),
            county: "Houston".to_string(),
            departments: Departments::default(),
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn fill_compensation(wizard: &mut ReportWizard) {
        let comp = wizard.compensation_mut();
        comp.set_employment_type(EmploymentType::Contract);
        comp.set_pay_type(PayType::Weekly);
        comp.set_weekly_pay(2600);
        comp.set_shift(Shift::Day);
        comp.set_weekly_shifts(WeeklyShifts::Three);
        comp.set_hospital_experience(Experience::years(1).unwrap());
        comp.set_total_experience(Experience::years(6).unwrap());
        comp.set_overall(Grade::B);
    }

    #[test]
    fn test_advance_requires_complete_section() {
        let mut wizard = ReportWizard::new("user-1", &hospital(), now());
        let err = wizard.advance().unwrap_err();
        assert!(matches!(
            err,
            ReportError::SectionIncomplete {
                section: SectionKind::Compensation,
                ..
            }
        ));
        assert_eq!(wizard.step(), WizardStep::Section(SectionKind::Compensation));

        fill_compensation(&mut wizard);
        assert_eq!(
            wizard.advance().unwrap(),
            WizardStep::Section(SectionKind::Assignment)
        );
    }

    #[test]
    fn test_back_is_always_allowed() {
        let mut wizard = ReportWizard::new("user-1", &hospital(), now());
        fill_compensation(&mut wizard);
        wizard.advance().unwrap();
        wizard.compensation_mut().set_pay_type(PayType::Hourly);

        assert_eq!(
            wizard.back().unwrap(),
            WizardStep::Section(SectionKind::Compensation)
        );
        assert_eq!(
            wizard.back().unwrap(),
            WizardStep::Section(SectionKind::Compensation)
        );
    }

    #[test]
    fn test_go_to_stops_at_first_incomplete() {
        let mut wizard = ReportWizard::new("user-1", &hospital(), now());
        assert!(matches!(
            wizard.go_to(SectionKind::Staffing),
            Err(ReportError::SectionLocked {
                first_incomplete: SectionKind::Compensation,
                ..
            })
        ));

        fill_compensation(&mut wizard);
        assert!(wizard.go_to(SectionKind::Assignment).is_ok());
        assert!(wizard.go_to(SectionKind::Staffing).is_err());
    }

    #[test]
    fn test_overall_progress_is_mean() {
        let mut wizard = ReportWizard::new("user-1", &hospital(), now());
        fill_compensation(&mut wizard);
        let expected = (100 + wizard.assignment().progress() as u32 + wizard.staffing().progress() as u32) / 3;
        assert_eq!(wizard.overall_progress() as u32, expected);
    }

    #[test]
    fn test_edit_rejects_other_users() {
        let wizard = ReportWizard::new("user-1", &hospital(), now());
        let report = wizard.assemble(now());
        assert!(matches!(
            ReportWizard::edit(report.clone(), "user-2"),
            Err(ReportError::NotOwner)
        ));

        let edit = ReportWizard::edit(report, "user-1").unwrap();
        assert_eq!(edit.mode(), WizardMode::Edit);
        let later = now() + chrono::Duration::days(2);
        let reassembled = edit.assemble(later);
        assert_eq!(reassembled.submitted_at, now());
        assert_eq!(reassembled.modified_at, Some(later));
    }

    #[test]
    fn test_adopt_existing_keeps_answers() {
        let mut wizard = ReportWizard::new("user-1", &hospital(), now());
        fill_compensation(&mut wizard);
        let mut existing = ReportWizard::new("user-1", &hospital(), now()).assemble(now());
        existing.moderation.flag(FreeTextField::StaffingComments, "Name of a coworker");

        wizard.adopt_existing(&existing);

        assert_eq!(wizard.mode(), WizardMode::Edit);
        assert_eq!(wizard.report_id(), existing.report_id);
        assert_eq!(wizard.compensation().weekly_shifts(), Some(WeeklyShifts::Three));
        assert_eq!(wizard.moderation().len(), 1);
    }
}
