//! In-memory backends shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use nurse_reports::auth::Session;
use nurse_reports::baas::{
    AuthApi, BaasError, BaasResult, HospitalRepository, ReportRepository, UserRepository,
};
use nurse_reports::clock::ManualClock;
use nurse_reports::moderation::{ModerationJob, ModerationQueue, ModerationResult};
use nurse_reports::profile::{Membership, ProfileUpdate, UserProfile};
use nurse_reports::report::{
    Acuity, ChargeAssignment, Departments, EmploymentType, Experience, Grade, Hospital, PayType,
    Peer, Rating, Report, ReportWizard, Selection, Shift, WeeklyShifts, Workload,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const SECRET: &str = "test-jwt-secret-that-is-at-least-32-chars";
pub const AUDIENCE: &str = "authenticated";
pub const NOW: i64 = 1_700_000_000;
pub const USER_ID: &str = "8d0c1a7e-5b0e-4d7c-9b0c-3f1f3c2b9a11";
pub const HOSPITAL_ID: &str = "010001";

pub fn at(unix: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(unix, 0).unwrap()
}

/// HS256 access token for `sub` expiring at `exp`
pub fn access_token(sub: &str, exp: i64) -> String {
    let claims = serde_json::json!({
        "sub": sub,
        "aud": AUDIENCE,
        "exp": exp,
        "iat": exp - 3600,
        "email": "nurse@example.com",
        "role": "authenticated",
    });
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn session_expiring_at(exp: i64) -> Session {
    Session::new(access_token(USER_ID, exp), "refresh-token-1")
}

pub fn profile(user_id: &str, needs_onboarding: bool) -> UserProfile {
    UserProfile {
        user_id: user_id.to_string(),
        license_type: Some("RN".to_string()),
        license_state: Some("AL".to_string()),
        membership: Membership::Free,
        needs_onboarding,
        trust_level: 0,
        saved_hospital_ids: Default::default(),
        report_ids: Default::default(),
        created_at: at(NOW - 86_400),
        modified_at: at(NOW - 86_400),
    }
}

pub fn hospital() -> Hospital {
    let mut departments = Departments::default();
    departments.units.insert("4 WEST".to_string());
    departments.areas.insert("FLOAT POOL".to_string());
    Hospital {
        id: HOSPITAL_ID.to_string(),
        name: "Southeast Health Medical Center".to_string(),
        address: "1108 Ross Clark Circle".to_string(),
        city: "Dothan".to_string(),
        state: "AL".to_string(),
        zip: "36301".to_string(),
        county: "Houston".to_string(),
        departments,
    }
}

/// Answer every required question in all three sections, with comments
pub fn fill_report(wizard: &mut ReportWizard, unit: Selection) {
    let comp = wizard.compensation_mut();
    comp.set_employment_type(EmploymentType::FullTime);
    comp.set_pay_type(PayType::Hourly);
    comp.set_hourly_pay(48);
    comp.set_shift(Shift::Night);
    comp.set_weekly_shifts(WeeklyShifts::Three);
    comp.set_hospital_experience(Experience::years(3).unwrap());
    comp.set_total_experience(Experience::years(8).unwrap());
    comp.set_overall(Grade::B);
    comp.set_comments("Night differential is paid on time.");

    let assign = wizard.assignment_mut();
    assign.set_specific_unit(true);
    assign.select_unit(unit).unwrap();
    assign.set_acuity(Acuity::Intermediate).unwrap();
    assign.set_specialties(vec!["Cardiac".to_string()]);
    for peer in [Peer::Nurses, Peer::NurseAides, Peer::Physicians, Peer::Management] {
        assign.set_rating(peer, Rating::new(4).unwrap());
    }
    assign.set_recommend(true);
    assign.set_overall(Grade::A);
    assign.set_comments("Supportive charge nurses.");

    let staffing = wizard.staffing_mut();
    staffing.set_has_ratio(true);
    staffing.set_actual_ratio(4);
    staffing.set_ratio_appropriate(true);
    staffing.set_workload(Workload::Moderate);
    staffing.set_workload_rating(Rating::new(3).unwrap());
    staffing.set_charge_present(true);
    staffing.set_charge_assignment(ChargeAssignment::Rarely).unwrap();
    staffing.set_overall(Grade::B);
    staffing.set_comments("Ratios hold most nights.");
}

/// Auth provider fake; counts refresh calls and can run a hook inside them
pub struct FakeAuth {
    pub refresh_calls: AtomicUsize,
    pub refresh_result: Mutex<Option<BaasResult<Session>>>,
    pub during_refresh: Option<Box<dyn Fn() + Send + Sync>>,
}

impl FakeAuth {
    pub fn refreshing_to(session: Session) -> Self {
        Self {
            refresh_calls: AtomicUsize::new(0),
            refresh_result: Mutex::new(Some(Ok(session))),
            during_refresh: None,
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            refresh_calls: AtomicUsize::new(0),
            refresh_result: Mutex::new(Some(Err(BaasError::Status {
                status,
                message: "refresh failed".to_string(),
            }))),
            during_refresh: None,
        }
    }

    /// Advance `clock` by `secs` while the refresh call is in flight
    pub fn advancing(mut self, clock: ManualClock, secs: i64) -> Self {
        self.during_refresh = Some(Box::new(move || clock.advance(Duration::seconds(secs))));
        self
    }

    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthApi for FakeAuth {
    async fn password_grant(&self, _email: &str, _password: &str) -> BaasResult<Session> {
        Ok(session_expiring_at(NOW + 3600))
    }

    async fn signup(&self, _email: &str, _password: &str) -> BaasResult<()> {
        Ok(())
    }

    async fn refresh(&self, _access_token: &str, _refresh_token: &str) -> BaasResult<Session> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = &self.during_refresh {
            hook();
        }
        match self.refresh_result.lock().unwrap().take() {
            Some(result) => result,
            None => Err(BaasError::Decode("refresh called twice".to_string())),
        }
    }

    fn authorize_url(&self, provider: &str, _redirect_to: Option<&str>) -> String {
        format!("https://auth.example.com/authorize?provider={}", provider)
    }

    async fn logout(&self, _access_token: &str) -> BaasResult<()> {
        Ok(())
    }
}

/// Users table fake
#[derive(Default)]
pub struct MemoryUsers {
    pub rows: Mutex<HashMap<String, UserProfile>>,
    pub updates: Mutex<Vec<ProfileUpdate>>,
    pub fail_updates: bool,
}

impl MemoryUsers {
    pub fn with(profile: UserProfile) -> Self {
        let users = Self::default();
        users.rows.lock().unwrap().insert(profile.user_id.clone(), profile);
        users
    }

    pub fn get(&self, user_id: &str) -> Option<UserProfile> {
        self.rows.lock().unwrap().get(user_id).cloned()
    }
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn get_profile(&self, _token: &str, user_id: &str) -> BaasResult<Option<UserProfile>> {
        Ok(self.get(user_id))
    }

    async fn create_profile(&self, _token: &str, user_id: &str) -> BaasResult<()> {
        self.rows
            .lock()
            .unwrap()
            .entry(user_id.to_string())
            .or_insert_with(|| profile(user_id, true));
        Ok(())
    }

    async fn get_modified_at(&self, _token: &str, user_id: &str) -> BaasResult<Option<DateTime<Utc>>> {
        Ok(self.get(user_id).map(|p| p.modified_at))
    }

    async fn update_profile(&self, _token: &str, user_id: &str, update: &ProfileUpdate) -> BaasResult<()> {
        if self.fail_updates {
            return Err(BaasError::Status {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        self.updates.lock().unwrap().push(update.clone());
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.get(user_id) {
            let updated = update.apply_to(row);
            rows.insert(user_id.to_string(), updated);
        }
        Ok(())
    }
}

/// Reports table fake
#[derive(Default)]
pub struct MemoryReports {
    pub rows: Mutex<HashMap<Uuid, Report>>,
    /// Every id reported as taken regardless of contents
    pub all_ids_taken: bool,
    /// Ids reported as taken on top of stored rows
    pub taken: Mutex<HashSet<Uuid>>,
    pub exists_checks: AtomicUsize,
    pub inserts: AtomicUsize,
    pub replaces: AtomicUsize,
    pub fail_writes: bool,
}

impl MemoryReports {
    pub fn with(report: Report) -> Self {
        let reports = Self::default();
        reports.rows.lock().unwrap().insert(report.report_id, report);
        reports
    }

    pub fn checks(&self) -> usize {
        self.exists_checks.load(Ordering::SeqCst)
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn get(&self, report_id: Uuid) -> Option<Report> {
        self.rows.lock().unwrap().get(&report_id).cloned()
    }
}

#[async_trait]
impl ReportRepository for MemoryReports {
    async fn report_exists(&self, _token: &str, report_id: Uuid) -> BaasResult<bool> {
        self.exists_checks.fetch_add(1, Ordering::SeqCst);
        Ok(self.all_ids_taken
            || self.taken.lock().unwrap().contains(&report_id)
            || self.rows.lock().unwrap().contains_key(&report_id))
    }

    async fn get_report(&self, _token: &str, report_id: Uuid) -> BaasResult<Option<Report>> {
        Ok(self.get(report_id))
    }

    async fn find_recent_report(
        &self,
        _token: &str,
        user_id: &str,
        hospital_id: &str,
        placement_key: &str,
        since: DateTime<Utc>,
    ) -> BaasResult<Option<Report>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|r| {
                r.user_id == user_id
                    && r.hospital_id == hospital_id
                    && r.placement_key == placement_key
                    && r.submitted_at >= since
            })
            .cloned())
    }

    async fn insert_report(&self, _token: &str, report: &Report) -> BaasResult<()> {
        if self.fail_writes {
            return Err(BaasError::Status {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.rows.lock().unwrap().insert(report.report_id, report.clone());
        Ok(())
    }

    async fn replace_report(&self, _token: &str, report: &Report) -> BaasResult<()> {
        if self.fail_writes {
            return Err(BaasError::Status {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        self.replaces.fetch_add(1, Ordering::SeqCst);
        self.rows.lock().unwrap().insert(report.report_id, report.clone());
        Ok(())
    }

    async fn patch_flags(&self, _token: &str, report_id: Uuid, flags: &ModerationResult) -> BaasResult<()> {
        if let Some(row) = self.rows.lock().unwrap().get_mut(&report_id) {
            row.moderation = flags.clone();
        }
        Ok(())
    }
}

/// Hospitals table fake
pub struct MemoryHospitals {
    pub rows: Mutex<HashMap<String, Hospital>>,
}

impl MemoryHospitals {
    pub fn with(hospital: Hospital) -> Self {
        let mut rows = HashMap::new();
        rows.insert(hospital.id.clone(), hospital);
        Self {
            rows: Mutex::new(rows),
        }
    }

    pub fn departments(&self, hospital_id: &str) -> Departments {
        self.rows.lock().unwrap()[hospital_id].departments.clone()
    }
}

#[async_trait]
impl HospitalRepository for MemoryHospitals {
    async fn get_hospital(&self, _token: &str, hospital_id: &str) -> BaasResult<Option<Hospital>> {
        Ok(self.rows.lock().unwrap().get(hospital_id).cloned())
    }

    async fn update_departments(
        &self,
        _token: &str,
        hospital_id: &str,
        departments: &Departments,
    ) -> BaasResult<()> {
        if let Some(hospital) = self.rows.lock().unwrap().get_mut(hospital_id) {
            hospital.departments = departments.clone();
        }
        Ok(())
    }
}

/// Collects queued moderation jobs instead of running them
#[derive(Default)]
pub struct RecordingQueue {
    pub jobs: Mutex<Vec<ModerationJob>>,
}

impl RecordingQueue {
    pub fn jobs(&self) -> Vec<ModerationJob> {
        self.jobs.lock().unwrap().clone()
    }
}

impl ModerationQueue for RecordingQueue {
    fn enqueue(&self, job: ModerationJob) {
        self.jobs.lock().unwrap().push(job);
    }
}
