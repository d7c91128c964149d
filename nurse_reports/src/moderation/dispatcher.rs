//! Background moderation actor.
//!
//! Submission hands a [`ModerationJob`] to a [`ModerationQueue`] and moves
//! on. The [`ModerationDispatcher`] drains the queue, classifies the text,
//! and writes flags back with the submitter's token. Failures are logged and
//! the report stays unflagged.

use super::classifier::TextClassifier;
use super::errors::{ClassifyResult, ModerationError};
use super::models::{FieldVerdict, FreeTextField, ModerationJob, ModerationResult};
use crate::baas::{HospitalRepository, ReportRepository};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// How often a failed classification is attempted
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Pause between attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::from_millis(500),
        }
    }
}

/// Accepts jobs without waiting for them to run
pub trait ModerationQueue: Send + Sync {
    fn enqueue(&self, job: ModerationJob);
}

/// Sending side of the dispatcher's inbox
#[derive(Clone)]
pub struct ModerationHandle {
    sender: mpsc::Sender<ModerationJob>,
}

impl ModerationHandle {
    pub fn new(sender: mpsc::Sender<ModerationJob>) -> Self {
        Self { sender }
    }
}

impl ModerationQueue for ModerationHandle {
    fn enqueue(&self, job: ModerationJob) {
        let report_id = job.report_id;
        match self.sender.try_send(job) {
            Ok(()) => tracing::debug!(report_id = %report_id, "Moderation job queued"),
            Err(TrySendError::Full(_)) => {
                tracing::warn!(report_id = %report_id, "Moderation queue full, report left unmoderated");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::error!(report_id = %report_id, "Moderation dispatcher stopped, report left unmoderated");
            }
        }
    }
}

/// What processing one job did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No free text
    Skipped,
    /// Nothing flagged; entered unit, area or role names were added to the hospital
    /// when `departments_updated`
    Cleared { departments_updated: bool },
    /// This many fields were flagged and patched
    Flagged(usize),
    /// Classification or the flag write failed
    Failed,
}

/// Moderation actor
pub struct ModerationDispatcher {
    inbox: mpsc::Receiver<ModerationJob>,
    classifier: Arc<dyn TextClassifier>,
    reports: Arc<dyn ReportRepository>,
    hospitals: Arc<dyn HospitalRepository>,
    retry: RetryPolicy,
}

impl ModerationDispatcher {
    /// Create the actor and its handle
    ///
    /// # Arguments
    ///
    /// * `capacity` - Jobs the inbox holds before `enqueue` starts dropping
    /// * `classifier` - Text classifier
    /// * `reports` - Where flags are written
    /// * `hospitals` - Where accepted unit, area and role names are added
    /// * `retry` - Classification retry policy
    pub fn new(
        capacity: usize,
        classifier: Arc<dyn TextClassifier>,
        reports: Arc<dyn ReportRepository>,
        hospitals: Arc<dyn HospitalRepository>,
        retry: RetryPolicy,
    ) -> (Self, ModerationHandle) {
        let (sender, inbox) = mpsc::channel(capacity.max(1));
        let dispatcher = Self {
            inbox,
            classifier,
            reports,
            hospitals,
            retry,
        };
        (dispatcher, ModerationHandle::new(sender))
    }

    /// Process jobs until every handle is dropped
    pub async fn run(mut self) {
        tracing::info!("Moderation dispatcher starting");
        while let Some(job) = self.inbox.recv().await {
            let outcome = self.process(&job).await;
            tracing::debug!(report_id = %job.report_id, outcome = ?outcome, "Moderation job finished");
        }
        tracing::info!("Moderation dispatcher stopped");
    }

    /// Moderate one job
    pub async fn process(&self, job: &ModerationJob) -> DispatchOutcome {
        if job.entries.is_empty() {
            tracing::debug!(report_id = %job.report_id, user_id = %job.user_id, "No free text to moderate");
            return DispatchOutcome::Skipped;
        }

        let verdicts = match self.classify_with_retry(job).await {
            Ok(verdicts) => verdicts,
            Err(e) => {
                tracing::warn!(
                    report_id = %job.report_id,
                    user_id = %job.user_id,
                    error = %e,
                    "Moderation failed, report left unflagged"
                );
                return DispatchOutcome::Failed;
            }
        };

        // Only fields that were actually submitted can carry a flag
        let verdicts: Vec<FieldVerdict> = verdicts
            .into_iter()
            .filter(|v| job.entries.iter().any(|(field, _)| *field == v.field))
            .collect();
        let flags = ModerationResult::from_verdicts(&verdicts);

        if !flags.is_empty() {
            if let Err(e) = self
                .reports
                .patch_flags(&job.access_token, job.report_id, &flags)
                .await
            {
                tracing::error!(report_id = %job.report_id, error = %e, "Failed to write moderation flags");
                return DispatchOutcome::Failed;
            }
            tracing::info!(report_id = %job.report_id, flagged = flags.len(), "Report text flagged");
            return DispatchOutcome::Flagged(flags.len());
        }

        tracing::debug!(report_id = %job.report_id, "Report text cleared");
        let departments_updated = match self.add_departments(job).await {
            Ok(updated) => updated,
            Err(e) => {
                tracing::warn!(hospital_id = %job.hospital_id, error = %e, "Failed to add entered departments");
                false
            }
        };
        DispatchOutcome::Cleared { departments_updated }
    }

    async fn classify_with_retry(&self, job: &ModerationJob) -> ClassifyResult<Vec<FieldVerdict>> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.classifier.classify(&job.entries).await {
                Ok(verdicts) => return Ok(verdicts),
                Err(e) if attempt < max_attempts && e.is_retryable() => {
                    tracing::debug!(report_id = %job.report_id, attempt = attempt, error = %e, "Retrying moderation");
                    tokio::time::sleep(self.retry.backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Add cleared unit, area and role names to the hospital's lists
    async fn add_departments(&self, job: &ModerationJob) -> Result<bool, ModerationError> {
        let unit = job.entered_name(FreeTextField::EnteredUnit);
        let area = job.entered_name(FreeTextField::EnteredArea);
        let role = job.entered_name(FreeTextField::EnteredRole);
        if unit.is_none() && area.is_none() && role.is_none() {
            return Ok(false);
        }

        let Some(hospital) = self
            .hospitals
            .get_hospital(&job.access_token, &job.hospital_id)
            .await?
        else {
            tracing::warn!(hospital_id = %job.hospital_id, "Hospital not found for department update");
            return Ok(false);
        };

        let mut departments = hospital.departments;
        if !departments.merge(unit, area, role) {
            return Ok(false);
        }
        self.hospitals
            .update_departments(&job.access_token, &job.hospital_id, &departments)
            .await?;
        tracing::info!(hospital_id = %job.hospital_id, "Hospital departments updated");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baas::BaasResult;
    use crate::report::{Departments, Hospital, Report};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use uuid::Uuid;

    struct ScriptedClassifier {
        calls: AtomicU32,
        failures_before_success: u32,
        verdicts: Vec<FieldVerdict>,
    }

    #[async_trait]
    impl TextClassifier for ScriptedClassifier {
        async fn classify(&self, _entries: &[(FreeTextField, String)]) -> ClassifyResult<Vec<FieldVerdict>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                return Err(ModerationError::Timeout(Duration::from_secs(30)));
            }
            Ok(self.verdicts.clone())
        }
    }

    #[derive(Default)]
    struct Store {
        flags: Mutex<Vec<(Uuid, ModerationResult)>>,
        departments: Mutex<Vec<Departments>>,
    }

    #[async_trait]
    impl ReportRepository for Store {
        async fn report_exists(&self, _token: &str, _report_id: Uuid) -> BaasResult<bool> {
            Ok(false)
        }
        async fn get_report(&self, _token: &str, _report_id: Uuid) -> BaasResult<Option<Report>> {
            Ok(None)
        }
        async fn find_recent_report(
            &self,
            _token: &str,
            _user_id: &str,
            _hospital_id: &str,
            _placement_key: &str,
            _since: DateTime<Utc>,
        ) -> BaasResult<Option<Report>> {
            Ok(None)
        }
        async fn insert_report(&self, _token: &str, _report: &Report) -> BaasResult<()> {
            Ok(())
        }
        async fn replace_report(&self, _token: &str, _report: &Report) -> BaasResult<()> {
            Ok(())
        }
        async fn patch_flags(&self, _token: &str, report_id: Uuid, flags: &ModerationResult) -> BaasResult<()> {
            self.flags.lock().unwrap().push((report_id, flags.clone()));
            Ok(())
        }
    }

    #[async_trait]
    impl HospitalRepository for Store {
        async fn get_hospital(&self, _token: &str, hospital_id: &str) -> BaasResult<Option<Hospital>> {
            Ok(Some(Hospital {
                id: hospital_id.to_string(),
                name: "Mercy General".to_string(),
                address: String::new(),
                city: String::new(),
                state: String::new(),
                zip: String::new(),
                county: String::new(),
                departments: Departments::default(),
            }))
        }
        async fn update_departments(
            &self,
            _token: &str,
            _hospital_id: &str,
            departments: &Departments,
        ) -> BaasResult<()> {
            self.departments.lock().unwrap().push(departments.clone());
            Ok(())
        }
    }

    fn job(entries: Vec<(FreeTextField, String)>) -> ModerationJob {
        ModerationJob {
            report_id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            hospital_id: "hosp-1".to_string(),
            access_token: "token".to_string(),
            entries,
        }
    }

    fn dispatcher(
        classifier: ScriptedClassifier,
        store: Arc<Store>,
        retry: RetryPolicy,
    ) -> (ModerationDispatcher, ModerationHandle) {
        ModerationDispatcher::new(4, Arc::new(classifier), store.clone(), store, retry)
    }

    fn classifier(failures: u32, verdicts: Vec<FieldVerdict>) -> ScriptedClassifier {
        ScriptedClassifier {
            calls: AtomicU32::new(0),
            failures_before_success: failures,
            verdicts,
        }
    }

    #[tokio::test]
    async fn test_no_text_skips_classifier() {
        let store = Arc::new(Store::default());
        let (dispatcher, _handle) = dispatcher(classifier(0, vec![]), store, RetryPolicy::default());
        assert_eq!(dispatcher.process(&job(vec![])).await, DispatchOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_flagged_fields_are_patched() {
        let store = Arc::new(Store::default());
        let verdicts = vec![
            FieldVerdict {
                field: FreeTextField::StaffingComments,
                flagged: true,
                reason: Some("Names a patient".to_string()),
            },
            // Not in the job, must be ignored
            FieldVerdict {
                field: FreeTextField::EnteredArea,
                flagged: true,
                reason: None,
            },
        ];
        let (dispatcher, _handle) = dispatcher(classifier(0, verdicts), store.clone(), RetryPolicy::default());
        let job = job(vec![(FreeTextField::StaffingComments, "Room 12 Mr Smith".to_string())]);

        assert_eq!(dispatcher.process(&job).await, DispatchOutcome::Flagged(1));
        let flags = store.flags.lock().unwrap();
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].0, job.report_id);
        assert_eq!(flags[0].1.reason(FreeTextField::StaffingComments), Some("Names a patient"));
        assert!(store.departments.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cleared_unit_is_added_to_hospital() {
        let store = Arc::new(Store::default());
        let (dispatcher, _handle) = dispatcher(classifier(0, vec![]), store.clone(), RetryPolicy::default());
        let job = job(vec![(FreeTextField::EnteredUnit, "4 west".to_string())]);

        assert_eq!(
            dispatcher.process(&job).await,
            DispatchOutcome::Cleared { departments_updated: true }
        );
        let departments = store.departments.lock().unwrap();
        assert!(departments[0].units.contains("4 WEST"));
        assert!(store.flags.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_dropped_without_retry_by_default() {
        let store = Arc::new(Store::default());
        let scripted = classifier(1, vec![]);
        let (dispatcher, _handle) = dispatcher(scripted, store.clone(), RetryPolicy::default());
        let job = job(vec![(FreeTextField::CompensationComments, "Fine".to_string())]);

        assert_eq!(dispatcher.process(&job).await, DispatchOutcome::Failed);
        assert!(store.flags.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retry_policy_allows_recovery() {
        let store = Arc::new(Store::default());
        let retry = RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(1),
        };
        let (dispatcher, _handle) = dispatcher(classifier(2, vec![]), store, retry);
        let job = job(vec![(FreeTextField::CompensationComments, "Fine".to_string())]);

        assert_eq!(
            dispatcher.process(&job).await,
            DispatchOutcome::Cleared { departments_updated: false }
        );
    }

    #[tokio::test]
    async fn test_full_queue_drops_job() {
        let (sender, mut inbox) = mpsc::channel(1);
        let handle = ModerationHandle::new(sender);
        handle.enqueue(job(vec![]));
        handle.enqueue(job(vec![]));

        assert!(inbox.try_recv().is_ok());
        assert!(inbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_run_stops_when_handles_dropped() {
        let store = Arc::new(Store::default());
        let (dispatcher, handle) = dispatcher(classifier(0, vec![]), store.clone(), RetryPolicy::default());
        let task = tokio::spawn(dispatcher.run());

        handle.enqueue(job(vec![(FreeTextField::EnteredArea, "float pool".to_string())]));
        drop(handle);
        task.await.unwrap();

        assert!(store.departments.lock().unwrap()[0].areas.contains("FLOAT POOL"));
    }

    #[tokio::test]
    async fn test_entered_role_joins_role_list() {
        let store = Arc::new(Store::default());
        let (dispatcher, _handle) = dispatcher(classifier(0, vec![]), store.clone(), RetryPolicy::default());
        let job = job(vec![(FreeTextField::EnteredRole, "CHARGE NURSE".to_string())]);

        assert!(matches!(dispatcher.process(&job).await, DispatchOutcome::Cleared { .. }));
        let departments = store.departments.lock().unwrap();
        assert!(departments[0].roles.contains("CHARGE NURSE"));
        assert!(departments[0].areas.is_empty());
    }
}
