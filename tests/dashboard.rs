mod common;

use chrono::{Duration, Utc};
use sunoaid::entity::issue::IssueStatus;
use sunoaid::model::dashboard::StatusHistogram;
use sunoaid::model::taxonomy::CategoryCreateRequest;
use sunoaid::service::dashboard::dashboard_stats;
use sunoaid::service::tree::create_category;

use common::{admin, citizen, insert_issue_at, setup_db};

async fn category(db: &sea_orm::DatabaseConnection, name: &str) -> i32 {
    create_category(db, CategoryCreateRequest { name: name.to_string(), ..Default::default() })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn rollups_cover_histogram_window_and_top_categories() {
    let db = setup_db().await;
    let reporter = citizen(&db, "Reporter").await;
    admin(&db, "Admin").await;

    let roads = category(&db, "Roads").await;
    let water = category(&db, "Water").await;
    let waste = category(&db, "Waste").await;

    let now = Utc::now();
    let old = now - Duration::days(30);

    // roads: 2, water: 2, waste: 1 -> tie between roads and water goes to the lower id
    insert_issue_at(&db, reporter.id, Some(water), IssueStatus::Open, now).await;
    insert_issue_at(&db, reporter.id, Some(water), IssueStatus::Resolved, old).await;
    insert_issue_at(&db, reporter.id, Some(roads), IssueStatus::Open, now - Duration::days(2)).await;
    insert_issue_at(&db, reporter.id, Some(roads), IssueStatus::Closed, old).await;
    insert_issue_at(&db, reporter.id, Some(waste), IssueStatus::InProgress, now).await;
    insert_issue_at(&db, reporter.id, None, IssueStatus::Open, old).await;

    let stats = dashboard_stats(&db, 2).await.unwrap();
    assert_eq!(stats.total_issues, 6);
    assert_eq!(stats.total_users, 2);
    assert_eq!(
        stats.status_counts,
        StatusHistogram { open: 3, in_progress: 1, resolved: 1, closed: 1 }
    );
    assert_eq!(stats.status_counts.total(), stats.total_issues);
    assert_eq!(stats.issues_last_7_days, 3);

    let top: Vec<(i32, &str, u64)> = stats
        .top_categories
        .iter()
        .map(|c| (c.category_id, c.name.as_str(), c.issue_count))
        .collect();
    assert_eq!(top, vec![(roads, "Roads", 2), (water, "Water", 2)]);
}

#[tokio::test]
async fn empty_store_yields_zeroes() {
    let db = setup_db().await;
    let stats = dashboard_stats(&db, 5).await.unwrap();
    assert_eq!(stats.total_issues, 0);
    assert_eq!(stats.status_counts, StatusHistogram::default());
    assert!(stats.top_categories.is_empty());

    assert!(dashboard_stats(&db, 0).await.unwrap().top_categories.is_empty());
}
