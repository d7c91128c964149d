//! Report submission: id reservation, duplicate check, write, profile update
//! and moderation hand-off.

use super::errors::{SubmitError, SubmitOutcome, SubmitResult};
use super::section::ReportSection;
use super::wizard::{ReportWizard, WizardMode, WizardStep};
use crate::auth::Session;
use crate::baas::ReportRepository;
use crate::clock::Clock;
use crate::moderation::{ModerationJob, ModerationQueue};
use crate::profile::{ProfileService, UserProfile};
use chrono::Duration;
use std::sync::Arc;

/// Submission limits
#[derive(Debug, Clone)]
pub struct SubmissionPolicy {
    /// Fresh ids to try after the first one collides
    pub id_retry_limit: u32,
    /// A report for the same hospital and placement within this window is a
    /// duplicate
    pub duplicate_window: Duration,
}

impl Default for SubmissionPolicy {
    fn default() -> Self {
        Self {
            id_retry_limit: 4,
            duplicate_window: Duration::days(30),
        }
    }
}

/// Stores finished reports
#[derive(Clone)]
pub struct ReportSubmitter {
    reports: Arc<dyn ReportRepository>,
    profiles: ProfileService,
    moderation: Arc<dyn ModerationQueue>,
    clock: Arc<dyn Clock>,
    policy: SubmissionPolicy,
}

impl ReportSubmitter {
    pub fn new(
        reports: Arc<dyn ReportRepository>,
        profiles: ProfileService,
        moderation: Arc<dyn ModerationQueue>,
        clock: Arc<dyn Clock>,
        policy: SubmissionPolicy,
    ) -> Self {
        Self {
            reports,
            profiles,
            moderation,
            clock,
            policy,
        }
    }

    /// Submit the wizard's report.
    ///
    /// New reports: reserve an unused id, check for a recent duplicate,
    /// insert, update the profile, queue moderation. Edits skip the id and
    /// duplicate steps and overwrite the stored document.
    ///
    /// # Errors
    ///
    /// * `SubmitError::Incomplete` - a section isn't finished; the wizard moved to it
    /// * `SubmitError::IdSpaceExhausted` - every generated id was taken
    /// * `SubmitError::Storage` - backend failure; the wizard is untouched
    /// * `SubmitError::AlreadySubmitted` - wizard is done
    /// * `SubmitError::WindowOutOfRange` - the duplicate window reaches before the earliest representable time
    pub async fn submit(
        &self,
        wizard: &mut ReportWizard,
        session: &Session,
        profile: &UserProfile,
    ) -> SubmitResult<SubmitOutcome> {
        if wizard.step() == WizardStep::Submitted {
            return Err(SubmitError::AlreadySubmitted);
        }

        if let Some(section) = wizard.first_incomplete() {
            let errors = wizard.section(section).validate();
            let message = errors
                .first()
                .map(|e| e.message.clone())
                .unwrap_or_else(|| format!("Please complete the {} section.", section));
            tracing::info!(report_id = %wizard.report_id(), section = %section, "Submit blocked by incomplete section");
            wizard.move_to(section);
            return Err(SubmitError::Incomplete { section, message });
        }

        let token = session.access_token.as_str();

        if wizard.mode() == WizardMode::Edit {
            let report = wizard.assemble(self.clock.now());
            self.reports.replace_report(token, &report).await?;
            tracing::info!(report_id = %report.report_id, "Report edited");
            self.dispatch_moderation(wizard, token);
            wizard.mark_submitted();
            return Ok(SubmitOutcome::Edited {
                report_id: report.report_id,
            });
        }

        self.reserve_unique_id(wizard, token).await?;

        let placement_key = wizard.placement_key().unwrap_or_default();
        let since = self
            .clock
            .now()
            .checked_sub_signed(self.policy.duplicate_window)
            .ok_or(SubmitError::WindowOutOfRange(self.policy.duplicate_window))?;
        if let Some(existing) = self
            .reports
            .find_recent_report(token, wizard.user_id(), wizard.hospital_id(), &placement_key, since)
            .await?
        {
            tracing::info!(
                existing_report_id = %existing.report_id,
                hospital_id = wizard.hospital_id(),
                "Recent report for this placement exists, switching to edit"
            );
            wizard.adopt_existing(&existing);
            return Ok(SubmitOutcome::RedirectToEdit {
                existing_report_id: existing.report_id,
            });
        }

        let report = wizard.assemble(self.clock.now());
        self.reports.insert_report(token, &report).await?;
        tracing::info!(
            report_id = %report.report_id,
            hospital_id = %report.hospital_id,
            user_id = %report.user_id,
            "Report submitted"
        );

        let updated = match self
            .profiles
            .record_report(token, profile, report.report_id, &report.hospital_id)
            .await
        {
            Ok(updated) => Some(updated),
            Err(e) => {
                tracing::error!(
                    report_id = %report.report_id,
                    error = %e,
                    "Report stored but profile update failed"
                );
                None
            }
        };

        self.dispatch_moderation(wizard, token);
        wizard.mark_submitted();

        Ok(SubmitOutcome::Submitted {
            report_id: report.report_id,
            profile_synced: updated.is_some(),
            profile: updated,
        })
    }

    /// Make sure the wizard's id is unused, regenerating it on collision
    async fn reserve_unique_id(&self, wizard: &mut ReportWizard, token: &str) -> SubmitResult<()> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            if !self.reports.report_exists(token, wizard.report_id()).await? {
                return Ok(());
            }
            tracing::warn!(report_id = %wizard.report_id(), attempt = attempts, "Report id collision");
            if attempts > self.policy.id_retry_limit {
                tracing::error!(attempts = attempts, "No unused report id found");
                return Err(SubmitError::IdSpaceExhausted { attempts });
            }
            wizard.regenerate_id();
        }
    }

    fn dispatch_moderation(&self, wizard: &ReportWizard, token: &str) {
        let job = ModerationJob {
            report_id: wizard.report_id(),
            user_id: wizard.user_id().to_string(),
            hospital_id: wizard.hospital_id().to_string(),
            access_token: token.to_string(),
            entries: wizard.free_text(),
        };
        self.moderation.enqueue(job);
    }
}
