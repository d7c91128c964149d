//! The three-section hospital report: field types, sections, the wizard that
//! walks a user through them, and submission.

pub mod assignment;
pub mod compensation;
pub mod errors;
pub mod fields;
pub mod models;
pub mod section;
pub mod staffing;
pub mod submit;
pub mod wizard;

pub use assignment::{Assignment, Peer, PeerRatings};
pub use compensation::{Benefits, Compensation, Differentials, Pay};
pub use errors::{ReportError, ReportResult, SubmitError, SubmitOutcome, SubmitResult};
pub use fields::{
    Acuity, ChargeAssignment, EmploymentType, EnteredName, Experience, Grade, PayType, Rating, Selection, Shift,
    WeeklyShifts, Workload,
};
pub use models::{Departments, Hospital, HospitalId, HospitalSnapshot, Report};
pub use section::{FieldError, ReportSection, SectionKind};
pub use staffing::{ChargeNurse, Ratio, Resources, Staffing};
pub use submit::{ReportSubmitter, SubmissionPolicy};
pub use wizard::{ReportWizard, WizardMode, WizardStep};
