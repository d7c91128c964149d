//! Compensation section: pay, differentials, schedule and experience.

use super::fields::{EmploymentType, Experience, Grade, PayType, Shift, WeeklyShifts};
use super::section::{FieldError, ReportSection, SectionKind, comment_error, non_empty};
use crate::moderation::FreeTextField;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const HOURLY_RANGE: RangeInclusive<u32> = 15..=250;
pub const WEEKLY_RANGE: RangeInclusive<u32> = 800..=15000;
pub const DIFFERENTIAL_MAX: u32 = 50;

/// Dollar amounts; zero means "not entered"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pay {
    pub hourly: u32,
    pub weekly: u32,
}

/// Hourly differentials; zero means none
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Differentials {
    pub night: u32,
    pub weekend: u32,
    pub weekend_night: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Benefits {
    pub pto: bool,
    pub parental_leave: bool,
    pub insurance: bool,
    pub retirement: bool,
    pub reimbursement: bool,
    pub tuition: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Compensation {
    employment_type: Option<EmploymentType>,
    pay_type: Option<PayType>,
    pay: Pay,
    differentials: Differentials,
    shift: Option<Shift>,
    weekly_shifts: Option<WeeklyShifts>,
    hospital_experience: Option<Experience>,
    total_experience: Option<Experience>,
    benefits: Benefits,
    overall: Option<Grade>,
    comments: String,
}

impl Compensation {
    pub fn employment_type(&self) -> Option<EmploymentType> {
        self.employment_type
    }

    pub fn set_employment_type(&mut self, employment_type: EmploymentType) {
        self.employment_type = Some(employment_type);
    }

    pub fn pay_type(&self) -> Option<PayType> {
        self.pay_type
    }

    /// Switching pay type discards both amounts
    pub fn set_pay_type(&mut self, pay_type: PayType) {
        self.pay_type = Some(pay_type);
        self.pay = Pay::default();
    }

    pub fn pay(&self) -> Pay {
        self.pay
    }

    pub fn set_hourly_pay(&mut self, amount: u32) {
        self.pay.hourly = amount;
    }

    pub fn set_weekly_pay(&mut self, amount: u32) {
        self.pay.weekly = amount;
    }

    pub fn differentials(&self) -> Differentials {
        self.differentials
    }

    pub fn set_differentials(&mut self, differentials: Differentials) {
        self.differentials = differentials;
    }

    pub fn shift(&self) -> Option<Shift> {
        self.shift
    }

    pub fn set_shift(&mut self, shift: Shift) {
        self.shift = Some(shift);
    }

    pub fn weekly_shifts(&self) -> Option<WeeklyShifts> {
        self.weekly_shifts
    }

    pub fn set_weekly_shifts(&mut self, weekly_shifts: WeeklyShifts) {
        self.weekly_shifts = Some(weekly_shifts);
    }

    pub fn hospital_experience(&self) -> Option<Experience> {
        self.hospital_experience
    }

    pub fn set_hospital_experience(&mut self, years: Experience) {
        self.hospital_experience = Some(years);
    }

    pub fn total_experience(&self) -> Option<Experience> {
        self.total_experience
    }

    pub fn set_total_experience(&mut self, years: Experience) {
        self.total_experience = Some(years);
    }

    pub fn benefits(&self) -> Benefits {
        self.benefits
    }

    pub fn benefits_mut(&mut self) -> &mut Benefits {
        &mut self.benefits
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

    /// The amount matching the chosen pay type is in range and the other is unset
    fn pay_amount_valid(&self) -> bool {
        match self.pay_type {
            Some(PayType::Hourly) => HOURLY_RANGE.contains(&self.pay.hourly) && self.pay.weekly == 0,
            Some(PayType::Weekly) => WEEKLY_RANGE.contains(&self.pay.weekly) && self.pay.hourly == 0,
            None => false,
        }
    }

    fn differentials_valid(&self) -> bool {
        let d = self.differentials;
        [d.night, d.weekend, d.weekend_night]
            .iter()
            .all(|amount| *amount <= DIFFERENTIAL_MAX)
    }

    fn experience_valid(&self) -> bool {
        matches!(
            (self.hospital_experience, self.total_experience),
            (Some(hospital), Some(total)) if total >= hospital
        )
    }
}

impl ReportSection for Compensation {
    fn kind(&self) -> SectionKind {
        SectionKind::Compensation
    }

    fn progress(&self) -> u8 {
        let mut progress = 0;
        if self.employment_type.is_some() {
            progress += 5;
        }
        if self.pay_type.is_some() {
            progress += 5;
        }
        if self.pay_amount_valid() {
            progress += 20;
        }
        if self.differentials_valid() {
            progress += 5;
        }
        if self.shift.is_some() {
            progress += 10;
        }
        if self.weekly_shifts.is_some() {
            progress += 10;
        }
        if self.experience_valid() {
            progress += 25;
        }
        if self.overall.is_some() {
            progress += 15;
        }
        if comment_error("comments", &self.comments).is_none() {
            progress += 5;
        }
        progress
    }

    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.pay.hourly != 0 && self.pay.weekly != 0 {
            errors.push(FieldError::new(
                "pay",
                "Enter either an hourly or a weekly rate, not both.",
            ));
        }
        if self.pay_type == Some(PayType::Hourly)
            && self.pay.hourly != 0
            && !HOURLY_RANGE.contains(&self.pay.hourly)
        {
            errors.push(FieldError::new(
                "hourly",
                "Hourly rate entered exceeds normal ranges ($15-$250/hr).",
            ));
        }
        if self.pay_type == Some(PayType::Weekly)
            && self.pay.weekly != 0
            && !WEEKLY_RANGE.contains(&self.pay.weekly)
        {
            errors.push(FieldError::new(
                "weekly",
                "Weekly rate entered exceeds normal ranges ($800-$15000/wk).",
            ));
        }

        let d = self.differentials;
        for (field, amount, label) in [
            ("night_differential", d.night, "Night"),
            ("weekend_differential", d.weekend, "Weekend"),
            ("weekend_night_differential", d.weekend_night, "Weekend night"),
        ] {
            if amount > DIFFERENTIAL_MAX {
                errors.push(FieldError::new(
                    field,
                    format!("{label} differential entered exceeds normal ranges ($1-$50/hr)."),
                ));
            }
        }

        if let (Some(hospital), Some(total)) = (self.hospital_experience, self.total_experience)
            && total < hospital
        {
            errors.push(FieldError::new(
                "total_experience",
                "Total experience can't be less than experience at this hospital.",
            ));
        }

        errors.extend(comment_error("comments", &self.comments));
        errors
    }

    fn free_text(&self) -> Vec<(FreeTextField, String)> {
        non_empty(&self.comments)
            .map(|text| (FreeTextField::CompensationComments, text))
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> Compensation {
        let mut comp = Compensation::default();
        comp.set_employment_type(EmploymentType::FullTime);
        comp.set_pay_type(PayType::Hourly);
        comp.set_hourly_pay(48);
        comp.set_shift(Shift::Night);
        comp.set_weekly_shifts(WeeklyShifts::Three);
        comp.set_hospital_experience(Experience::years(3).unwrap());
        comp.set_total_experience(Experience::years(8).unwrap());
        comp.set_overall(Grade::B);
        comp
    }

    #[test]
    fn test_complete_section_can_advance() {
        let comp = complete();
        assert_eq!(comp.progress(), 100);
        assert!(comp.validate().is_empty());
        assert!(comp.can_advance());
    }

    #[test]
    fn test_empty_section_progress() {
        // Differentials and comments are satisfied by default.
        assert_eq!(Compensation::default().progress(), 10);
    }

    #[test]
    fn test_pay_type_change_resets_amounts() {
        let mut comp = complete();
        comp.set_pay_type(PayType::Weekly);
        assert_eq!(comp.pay(), Pay::default());
        assert_eq!(comp.progress(), 80);

        comp.set_weekly_pay(2400);
        assert_eq!(comp.progress(), 100);
    }

    #[test]
    fn test_hourly_out_of_range() {
        let mut comp = complete();
        comp.set_hourly_pay(400);
        assert!(!comp.can_advance());
        assert_eq!(comp.validate()[0].field, "hourly");
    }

    #[test]
    fn test_total_below_hospital_is_reported() {
        let mut comp = complete();
        comp.set_hospital_experience(Experience::years(10).unwrap());
        // Input is kept, not blocked
        assert_eq!(comp.total_experience(), Experience::years(8));
        assert!(!comp.can_advance());
        assert!(comp.validate().iter().any(|e| e.field == "total_experience"));
    }

    #[test]
    fn test_differential_limit() {
        let mut comp = complete();
        comp.set_differentials(Differentials {
            night: 5,
            weekend: 51,
            weekend_night: 0,
        });
        let errors = comp.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "weekend_differential");
        assert_eq!(comp.progress(), 95);
    }

    #[test]
    fn test_free_text_skips_blank_comments() {
        let mut comp = complete();
        comp.set_comments("   ");
        assert!(comp.free_text().is_empty());
        comp.set_comments("Great differentials");
        assert_eq!(
            comp.free_text(),
            vec![(FreeTextField::CompensationComments, "Great differentials".to_string())]
        );
    }

    #[test]
    fn test_benefits_wire_format() {
        let mut comp = complete();
        comp.benefits_mut().insurance = true;
        comp.benefits_mut().parental_leave = true;

        let benefits = serde_json::to_value(comp.benefits()).unwrap();
        assert_eq!(
            benefits,
            serde_json::json!({
                "pto": false,
                "parental_leave": true,
                "insurance": true,
                "retirement": false,
                "reimbursement": false,
                "tuition": false,
            })
        );

        let restored: Compensation = serde_json::from_value(serde_json::to_value(&comp).unwrap()).unwrap();
        assert_eq!(restored, comp);
    }
}
