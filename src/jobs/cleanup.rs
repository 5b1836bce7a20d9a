//! Scheduled cleanup of expired anonymous links and sessions.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::application::services::{AuthService, LinkService};
use crate::error::AppError;

/// Rows removed by one cleanup run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub links_deleted: u64,
    pub sessions_purged: u64,
}

/// Runs the cleanup on a cron schedule evaluated in a fixed timezone.
///
/// Runs never overlap: the next tick is computed only after the current run
/// has finished, so a slow run skips the ticks it overlapped.
pub struct CleanupJob {
    link_service: Arc<LinkService>,
    auth_service: Arc<AuthService>,
    schedule: Schedule,
    timezone: Tz,
}

impl CleanupJob {
    pub fn new(
        link_service: Arc<LinkService>,
        auth_service: Arc<AuthService>,
        schedule: Schedule,
        timezone: Tz,
    ) -> Self {
        Self {
            link_service,
            auth_service,
            schedule,
            timezone,
        }
    }

    /// Deletes expired anonymous links, then purges expired sessions.
    ///
    /// Both steps always run; each failure is logged on its own and the first
    /// one is returned.
    pub async fn run_once(&self) -> Result<CleanupReport, AppError> {
        let links = self
            .link_service
            .delete_expired_anonymous_links()
            .await
            .inspect_err(|e| error!(error = %e, "Expired link cleanup failed"));
        let sessions = self
            .auth_service
            .purge_expired_sessions()
            .await
            .inspect_err(|e| error!(error = %e, "Expired session purge failed"));

        let report = CleanupReport {
            links_deleted: links?,
            sessions_purged: sessions?,
        };
        info!(
            links_deleted = report.links_deleted,
            sessions_purged = report.sessions_purged,
            "Cleanup finished"
        );

        Ok(report)
    }

    /// First scheduled instant strictly after `now`, in UTC.
    pub fn next_run(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule
            .after(&now.with_timezone(&self.timezone))
            .next()
            .map(|at| at.with_timezone(&Utc))
    }

    /// Sleeps until each scheduled instant and runs the cleanup.
    ///
    /// Returns only when the schedule has no further instants. Failed runs
    /// are logged and retried at the next tick.
    pub async fn run(self) {
        info!(timezone = %self.timezone, "Cleanup job started");

        loop {
            let now = Utc::now();
            let Some(next) = self.next_run(now) else {
                warn!("Cleanup schedule has no upcoming runs, stopping");
                return;
            };

            let wait = (next - now).to_std().unwrap_or_default();
            info!(next_run = %next, "Next cleanup scheduled");
            tokio::time::sleep(wait).await;

            if self.run_once().await.is_err() {
                warn!("Cleanup run incomplete, retrying at next tick");
            }
        }
    }
}
