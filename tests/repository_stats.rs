//! PostgreSQL click repository tests. Run with `DATABASE_URL` set and
//! `cargo test -- --ignored`.

mod common;

use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use shortlink::domain::entities::NewClick;
use shortlink::domain::repositories::StatsRepository;
use shortlink::infrastructure::persistence::PgStatsRepository;

fn click(link_id: i64, referrer: Option<&str>, user_agent: Option<&str>) -> NewClick {
    NewClick {
        link_id,
        ip: Some("192.168.1.1".to_string()),
        user_agent: user_agent.map(str::to_string),
        referrer: referrer.map(str::to_string),
        country: Some("DE".to_string()),
        city: None,
    }
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_record_click(pool: PgPool) {
    let link_id = common::insert_link(&pool, "click123", None, Utc::now() + Duration::days(1)).await;
    let repo = PgStatsRepository::new(Arc::new(pool));

    let recorded = repo
        .record_click(click(link_id, None, Some("Mozilla/5.0")))
        .await
        .unwrap();

    assert_eq!(recorded.link_id, link_id);
    assert_eq!(recorded.user_agent.as_deref(), Some("Mozilla/5.0"));
    assert_eq!(recorded.country.as_deref(), Some("DE"));
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_record_click_for_missing_link_fails(pool: PgPool) {
    let repo = PgStatsRepository::new(Arc::new(pool));

    assert!(repo.record_click(click(999_999, None, None)).await.is_err());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_aggregates(pool: PgPool) {
    let link_id = common::insert_link(&pool, "agg1", None, Utc::now() + Duration::days(1)).await;
    let repo = PgStatsRepository::new(Arc::new(pool.clone()));

    for (referrer, agent) in [
        (Some("https://a.example"), Some("curl/8")),
        (Some("https://a.example"), Some("curl/8")),
        (None, None),
    ] {
        repo.record_click(click(link_id, referrer, agent))
            .await
            .unwrap();
    }

    sqlx::query("UPDATE clicks SET created_at = NOW() - INTERVAL '10 days' WHERE referrer IS NULL")
        .execute(&pool)
        .await
        .unwrap();

    assert_eq!(repo.count_clicks(link_id).await.unwrap(), 3);

    let daily = repo
        .daily_clicks(link_id, Utc::now() - Duration::days(6))
        .await
        .unwrap();
    assert_eq!(daily.iter().map(|d| d.clicks).sum::<i64>(), 2);

    let referrers = repo.top_referrers(link_id, 10).await.unwrap();
    assert_eq!(referrers[0].value, "https://a.example");
    assert_eq!(referrers[0].count, 2);
    assert!(referrers.iter().any(|r| r.value == "direct" && r.count == 1));

    let agents = repo.top_user_agents(link_id, 1).await.unwrap();
    assert_eq!(agents.len(), 1);
    assert_eq!(agents[0].value, "curl/8");
}
