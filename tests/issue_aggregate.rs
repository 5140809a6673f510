mod common;

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};
use sunoaid::entity::comment;
use sunoaid::entity::issue::{self, IssuePriority, IssueStatus};
use sunoaid::entity::location::Entity as LocationEntity;
use sunoaid::entity::vote::{self, VoteType};
use sunoaid::model::auth::Actor;
use sunoaid::model::global_error::{ErrorCode, ErrorKind};
use sunoaid::model::issue::{IssueCounters, IssueQuery};
use sunoaid::model::taxonomy::LocationCreateRequest;
use sunoaid::service::comment::add_comment;
use sunoaid::service::issue::{
    create_issue, delete_issue, get_issue, list_issues, reconcile_all, reconcile_counters, record_view,
    update_status,
};
use sunoaid::service::tree::{create_location, deactivate};
use sunoaid::service::vote::cast_vote;

use common::{admin, citizen, issue_request, setup_db};

async fn corrupt_upvotes(db: &sea_orm::DatabaseConnection, issue_id: i32, value: i32) {
    issue::Entity::update_many()
        .col_expr(issue::Column::Upvotes, Expr::value(value))
        .filter(issue::Column::Id.eq(issue_id))
        .exec(db)
        .await
        .unwrap();
}

#[tokio::test]
async fn reconcile_repairs_corrupted_counters() {
    let db = setup_db().await;
    let reporter = citizen(&db, "Reporter").await;
    let issue = common::create_issue(&db, reporter.id, "Collapsed drainage cover").await;

    for i in 0..3 {
        let voter = citizen(&db, &format!("Voter {i}")).await;
        cast_vote(&db, voter.id, issue.id, VoteType::Up).await.unwrap();
    }
    corrupt_upvotes(&db, issue.id, 50).await;

    let counters = reconcile_counters(&db, issue.id).await.unwrap();
    assert_eq!(counters, IssueCounters { upvotes: 3, downvotes: 0, comments_count: 0 });
    assert_eq!(get_issue(&db, issue.id).await.unwrap().upvotes, 3);

    // already consistent: nothing to correct
    assert_eq!(reconcile_counters(&db, issue.id).await.unwrap().upvotes, 3);
    assert_eq!(reconcile_all(&db).await.unwrap(), 0);

    corrupt_upvotes(&db, issue.id, -4).await;
    assert_eq!(reconcile_all(&db).await.unwrap(), 1);
    assert_eq!(get_issue(&db, issue.id).await.unwrap().upvotes, 3);
}

#[tokio::test]
async fn create_validates_and_defaults() {
    let db = setup_db().await;
    let reporter = citizen(&db, "Reporter").await;

    let created = create_issue(&db, reporter.id, issue_request("Fallen tree")).await.unwrap();
    assert_eq!(created.status, IssueStatus::Open);
    assert_eq!(created.priority, IssuePriority::Medium);
    assert_eq!((created.upvotes, created.downvotes, created.views, created.comments_count), (0, 0, 0, 0));
    assert!(created.is_public);

    let mut blank = issue_request("");
    blank.description = String::new();
    let err = create_issue(&db, reporter.id, blank).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);

    let mut missing_location = issue_request("Flood");
    missing_location.location_id = Some(321);
    let err = create_issue(&db, reporter.id, missing_location).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn inactive_location_is_rejected() {
    let db = setup_db().await;
    let reporter = citizen(&db, "Reporter").await;
    let town = create_location(
        &db,
        LocationCreateRequest { name: "Taytay".into(), location_type: "city".into(), ..Default::default() },
    )
    .await
    .unwrap();
    deactivate::<LocationEntity>(&db, town.id).await.unwrap();

    let mut request = issue_request("Broken signage");
    request.location_id = Some(town.id);
    let err = create_issue(&db, reporter.id, request).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.code(), ErrorCode::InactiveNode);
}

#[tokio::test]
async fn status_changes_stamp_and_reopen_clears() {
    let db = setup_db().await;
    let reporter = citizen(&db, "Reporter").await;
    let issue = common::create_issue(&db, reporter.id, "Blocked sidewalk").await;

    let progressing = update_status(&db, issue.id, IssueStatus::InProgress).await.unwrap();
    assert!(progressing.resolved_at.is_none());

    let resolved = update_status(&db, issue.id, IssueStatus::Resolved).await.unwrap();
    let resolved_at = resolved.resolved_at.expect("resolved_at stamped");

    let closed = update_status(&db, issue.id, IssueStatus::Closed).await.unwrap();
    assert_eq!(closed.resolved_at, Some(resolved_at));
    assert!(closed.closed_at.is_some());

    let reopened = update_status(&db, issue.id, IssueStatus::Open).await.unwrap();
    assert!(reopened.resolved_at.is_none());
    assert!(reopened.closed_at.is_none());

    let err = update_status(&db, 9_999, IssueStatus::Closed).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn delete_cascades_and_checks_actor() {
    let db = setup_db().await;
    let reporter = citizen(&db, "Reporter").await;
    let neighbour = citizen(&db, "Neighbour").await;
    let moderator = admin(&db, "Moderator").await;

    let issue = common::create_issue(&db, reporter.id, "Abandoned vehicle").await;
    cast_vote(&db, neighbour.id, issue.id, VoteType::Up).await.unwrap();
    add_comment(&db, Actor::citizen(neighbour.id), issue.id, "Three weeks now", None)
        .await
        .unwrap();

    let err = delete_issue(&db, issue.id, Actor::citizen(neighbour.id)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    delete_issue(&db, issue.id, Actor::citizen(reporter.id)).await.unwrap();
    assert_eq!(get_issue(&db, issue.id).await.unwrap_err().code(), ErrorCode::IssueNotFound);
    assert_eq!(vote::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(comment::Entity::find().count(&db).await.unwrap(), 0);

    let other = common::create_issue(&db, reporter.id, "Stray dogs").await;
    delete_issue(&db, other.id, Actor::admin(moderator.id)).await.unwrap();
}

#[tokio::test]
async fn views_are_counted_and_failures_swallowed() {
    let db = setup_db().await;
    let reporter = citizen(&db, "Reporter").await;
    let issue = common::create_issue(&db, reporter.id, "Graffiti").await;

    record_view(&db, issue.id).await;
    record_view(&db, issue.id).await;
    record_view(&db, 12_345).await;
    assert_eq!(get_issue(&db, issue.id).await.unwrap().views, 2);

    // with the table gone the write fails and the error is only logged
    db.execute_unprepared("ALTER TABLE issues RENAME TO issues_offline").await.unwrap();
    record_view(&db, issue.id).await;
    db.execute_unprepared("ALTER TABLE issues_offline RENAME TO issues").await.unwrap();

    assert_eq!(get_issue(&db, issue.id).await.unwrap().views, 2);
}

#[tokio::test]
async fn huge_page_numbers_yield_an_empty_page() {
    let db = setup_db().await;
    let reporter = citizen(&db, "Reporter").await;
    common::create_issue(&db, reporter.id, "Loose manhole").await;

    let query = IssueQuery { page: Some(u64::MAX), per_page: Some(u64::MAX), ..Default::default() };
    let page = list_issues(&db, &query).await.unwrap();
    assert!(page.content.is_empty());
    assert_eq!(page.total_elements, 1);
    assert!(page.is_last);
}

#[tokio::test]
async fn listing_filters_and_paginates() {
    let db = setup_db().await;
    let reporter = citizen(&db, "Reporter").await;
    let region = create_location(
        &db,
        LocationCreateRequest { name: "NCR".into(), location_type: "province".into(), ..Default::default() },
    )
    .await
    .unwrap();
    let city = create_location(
        &db,
        LocationCreateRequest {
            name: "Pasig".into(),
            location_type: "city".into(),
            parent_id: Some(region.id),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    for i in 0..12 {
        let mut request = issue_request(&format!("Streetlight out #{i}"));
        request.location_id = Some(city.id);
        create_issue(&db, reporter.id, request).await.unwrap();
    }
    let mut hidden = issue_request("Private matter");
    hidden.is_public = Some(false);
    create_issue(&db, reporter.id, hidden).await.unwrap();

    let first = list_issues(&db, &IssueQuery::default()).await.unwrap();
    assert_eq!(first.total_elements, 12);
    assert_eq!(first.content.len(), 10);
    assert_eq!(first.content[0].title, "Streetlight out #11");
    assert!(first.is_first && !first.is_last);

    let second = list_issues(&db, &IssueQuery { page: Some(2), ..Default::default() }).await.unwrap();
    assert_eq!(second.content.len(), 2);
    assert!(second.is_last);

    let direct = IssueQuery { location_id: Some(region.id), ..Default::default() };
    assert_eq!(list_issues(&db, &direct).await.unwrap().total_elements, 0);
    let subtree = IssueQuery {
        location_id: Some(region.id),
        include_sublocations: Some(true),
        ..Default::default()
    };
    assert_eq!(list_issues(&db, &subtree).await.unwrap().total_elements, 12);

    let search = IssueQuery { search: Some("#1".into()), per_page: Some(50), ..Default::default() };
    assert_eq!(list_issues(&db, &search).await.unwrap().total_elements, 3);

    let closed = IssueQuery { status: Some(IssueStatus::Closed), ..Default::default() };
    assert_eq!(list_issues(&db, &closed).await.unwrap().total_elements, 0);
}
