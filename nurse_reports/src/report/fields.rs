//! Typed answers for report fields.
//!
//! Every closed choice on the form is an enum so an out-of-range value can't
//! reach a section. Serialized spellings match the labels the form shows.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a unit, area or role name typed in by the user
pub const ENTERED_NAME_MAX_CHARS: usize = 50;

/// Maximum length of a free-text comment
pub const COMMENT_MAX_CHARS: usize = 1000;

/// Maximum number of specialties on an assignment
pub const MAX_SPECIALTIES: usize = 3;

/// The fixed specialty list
pub const SPECIALTIES: [&str; 37] = [
    "Allergy",
    "Burn",
    "Cardiac",
    "Cardiothoracic",
    "Cardiovascular",
    "Dermatology",
    "Diabetes",
    "Education",
    "Emergency",
    "Endocrine",
    "Gastroenterology",
    "Hematology",
    "Infusion",
    "Labor & Delivery",
    "Medicine",
    "Neonatal",
    "Nephrology",
    "Neurology",
    "Neuroscience",
    "Obstetrics",
    "Occupational Health",
    "Oncology",
    "Orthopedic",
    "Pain",
    "Perinatal",
    "Perioperative",
    "Psychiatric",
    "Pulmonary",
    "Research",
    "Rheumatology",
    "Substance Abuse",
    "Surgical",
    "Toxicology",
    "Transplant",
    "Trauma",
    "Urology",
    "Wound, Ostomy, and Continence",
];

/// Letter grade for a section's overall question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn description(&self) -> &'static str {
        match self {
            Grade::A => "Great",
            Grade::B => "Good",
            Grade::C => "So-so",
            Grade::D => "Bad",
            Grade::F => "Terrible",
        }
    }
}

/// A 1 to 5 rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: u8) -> Option<Self> {
        (1..=5).contains(&value).then_some(Rating(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::new(value).ok_or_else(|| format!("rating must be 1-5, got {value}"))
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> u8 {
        rating.0
    }
}

/// Years of experience; the top bucket means "more than 25 years"
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Experience(u8);

impl Experience {
    pub const MORE_THAN_25: Experience = Experience(26);

    pub fn years(years: u8) -> Option<Self> {
        (years <= 26).then_some(Experience(years))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn label(&self) -> String {
        if *self == Experience::MORE_THAN_25 {
            "More than 25 years".to_string()
        } else {
            self.0.to_string()
        }
    }
}

impl TryFrom<u8> for Experience {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Experience::years(value).ok_or_else(|| format!("experience must be 0-26, got {value}"))
    }
}

impl From<Experience> for u8 {
    fn from(experience: Experience) -> u8 {
        experience.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmploymentType {
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    Contract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayType {
    Hourly,
    Weekly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shift {
    Day,
    Night,
    Rotating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeeklyShifts {
    #[serde(rename = "Less than 1")]
    LessThanOne,
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Acuity {
    Intensive,
    Intermediate,
    Floor,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Workload {
    Light,
    Moderate,
    Heavy,
    Overwhelming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargeAssignment {
    Never,
    Rarely,
    Sometimes,
    Often,
    Always,
}

/// A unit, area or role: picked from the hospital's list, or typed in
/// because it wasn't listed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Selection {
    Listed(String),
    Unlisted(EnteredName),
}

/// A typed-in name. Always trimmed and upper-cased, including when read back
/// from storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct EnteredName(String);

impl EnteredName {
    pub fn new(name: &str) -> Self {
        EnteredName(name.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for EnteredName {
    fn from(name: String) -> Self {
        EnteredName::new(&name)
    }
}

impl From<EnteredName> for String {
    fn from(name: EnteredName) -> Self {
        name.0
    }
}

impl Selection {
    pub fn listed(name: impl Into<String>) -> Self {
        Selection::Listed(name.into())
    }

    /// Typed-in names are stored upper-cased
    pub fn unlisted(name: &str) -> Self {
        Selection::Unlisted(EnteredName::new(name))
    }

    pub fn name(&self) -> &str {
        match self {
            Selection::Listed(name) => name,
            Selection::Unlisted(name) => name.as_str(),
        }
    }

    /// The typed-in name, if any
    pub fn entered(&self) -> Option<&str> {
        match self {
            Selection::Unlisted(name) => Some(name.as_str()),
            Selection::Listed(_) => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        match self {
            Selection::Listed(name) => !name.trim().is_empty(),
            Selection::Unlisted(name) => {
                !name.as_str().is_empty() && name.as_str().chars().count() <= ENTERED_NAME_MAX_CHARS
            }
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Characters left before a comment hits the limit (negative when over)
pub fn comment_chars_left(comment: &str) -> i64 {
    COMMENT_MAX_CHARS as i64 - comment.chars().count() as i64
}

pub fn is_specialty(name: &str) -> bool {
    SPECIALTIES.contains(&name)
}
