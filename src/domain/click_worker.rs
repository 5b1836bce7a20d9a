//! Background worker persisting click events.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, info};

use crate::domain::click_event::ClickEvent;
use crate::domain::entities::NewClick;
use crate::domain::repositories::StatsRepository;

/// Retries after the first failed insert.
const MAX_RETRIES: usize = 3;

/// Consumes click events until every sender is dropped.
///
/// Each event is inserted in its own task, with at most `concurrency` inserts
/// in flight. Failed inserts are retried with exponential backoff; the final
/// failure is logged and counted, never propagated.
pub async fn run_click_worker(
    mut rx: mpsc::Receiver<ClickEvent>,
    repository: Arc<dyn StatsRepository>,
    concurrency: usize,
) {
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));

    while let Some(event) = rx.recv().await {
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        let repository = repository.clone();

        tokio::spawn(async move {
            persist_click(repository.as_ref(), event).await;
            drop(permit);
        });
    }

    // Wait for in-flight inserts before returning.
    let _ = permits.acquire_many(concurrency.max(1) as u32).await;
    info!("Click worker stopped");
}

/// Inserts a single click with retry.
pub async fn persist_click(repository: &dyn StatsRepository, event: ClickEvent) {
    let link_id = event.link_id;
    let new_click: NewClick = event.into();

    let strategy = ExponentialBackoff::from_millis(10)
        .max_delay(Duration::from_secs(1))
        .map(jitter)
        .take(MAX_RETRIES);

    let result = Retry::spawn(strategy, || repository.record_click(new_click.clone())).await;

    match result {
        Ok(click) => {
            metrics::counter!("clicks_recorded_total").increment(1);
            debug!(link_id, click_id = click.id, "Click recorded");
        }
        Err(e) => {
            metrics::counter!("clicks_failed_total").increment(1);
            error!(link_id, error = %e, "Failed to record click");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::click_event::ClientInfo;
    use crate::domain::entities::Click;
    use crate::domain::repositories::MockStatsRepository;
    use crate::error::AppError;
    use chrono::Utc;
    use serde_json::json;

    fn click_from(new_click: &NewClick) -> Click {
        Click {
            id: 1,
            link_id: new_click.link_id,
            ip: new_click.ip.clone(),
            user_agent: new_click.user_agent.clone(),
            referrer: new_click.referrer.clone(),
            country: None,
            city: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_worker_persists_all_events() {
        let mut repo = MockStatsRepository::new();
        repo.expect_record_click()
            .times(3)
            .returning(|c| Ok(click_from(&c)));

        let (tx, rx) = mpsc::channel(10);
        for id in 1..=3 {
            tx.send(ClickEvent::new(id, ClientInfo::default()))
                .await
                .unwrap();
        }
        drop(tx);

        run_click_worker(rx, Arc::new(repo), 2).await;
    }

    #[tokio::test]
    async fn test_persist_retries_then_succeeds() {
        let mut repo = MockStatsRepository::new();
        let mut seq = mockall::Sequence::new();
        repo.expect_record_click()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(AppError::internal("Database error", json!({}))));
        repo.expect_record_click()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|c| Ok(click_from(&c)));

        persist_click(&repo, ClickEvent::new(5, ClientInfo::default())).await;
    }

    #[tokio::test]
    async fn test_persist_gives_up_after_retries() {
        let mut repo = MockStatsRepository::new();
        repo.expect_record_click()
            .times(MAX_RETRIES + 1)
            .returning(|_| Err(AppError::internal("Database error", json!({}))));

        persist_click(&repo, ClickEvent::new(5, ClientInfo::default())).await;
    }
}
