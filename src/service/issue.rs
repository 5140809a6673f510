use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use sea_query::{Condition, Expr};
use tracing::{info, instrument, warn};

use crate::db::run_in_transaction;
use crate::entity::category::Entity as CategoryEntity;
use crate::entity::comment::{self, Entity as CommentEntity};
use crate::entity::issue::{self, Entity as IssueEntity, IssueStatus};
use crate::entity::location::Entity as LocationEntity;
use crate::model::auth::Actor;
use crate::model::common::{normalize_page, PaginationResponse};
use crate::model::global_error::{AppError, ErrorCode, ValidationFieldError};
use crate::model::issue::{IssueCounters, IssueCreateRequest, IssueQuery};
use crate::service::tree::{find_node, subtree_ids, TreeEntity};
use crate::service::vote::count_votes;

const MAX_TITLE_LEN: usize = 500;

pub async fn find_issue<C: ConnectionTrait>(conn: &C, issue_id: i32) -> Result<issue::Model, AppError> {
    IssueEntity::find_by_id(issue_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::with_detail(ErrorCode::IssueNotFound, format!("id {issue_id}")))
}

/// `SELECT ... FOR UPDATE` on the issue row; every counter mutation goes through this first.
pub(crate) async fn lock_issue<C: ConnectionTrait>(
    conn: &C,
    issue_id: i32,
) -> Result<issue::Model, AppError> {
    IssueEntity::find_by_id(issue_id)
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(|| AppError::with_detail(ErrorCode::IssueNotFound, format!("id {issue_id}")))
}

pub(crate) async fn count_comments<C: ConnectionTrait>(conn: &C, issue_id: i32) -> Result<i32, AppError> {
    let count = CommentEntity::find()
        .filter(comment::Column::IssueId.eq(issue_id))
        .count(conn)
        .await?;
    Ok(i32::try_from(count).unwrap_or(i32::MAX))
}

fn validate_issue_request(request: &IssueCreateRequest) -> Result<(), AppError> {
    let mut errors = Vec::new();

    let title = request.title.trim();
    if title.is_empty() {
        errors.push(ValidationFieldError::new("title", "title is required"));
    } else if title.chars().count() > MAX_TITLE_LEN {
        errors.push(ValidationFieldError::new("title", "title must be at most 500 characters"));
    }
    if request.description.trim().is_empty() {
        errors.push(ValidationFieldError::new("description", "description is required"));
    }
    if let Some(latitude) = request.latitude {
        if !(-90.0..=90.0).contains(&latitude) {
            errors.push(ValidationFieldError::new("latitude", "latitude must be within [-90, 90]"));
        }
    }
    if let Some(longitude) = request.longitude {
        if !(-180.0..=180.0).contains(&longitude) {
            errors.push(ValidationFieldError::new("longitude", "longitude must be within [-180, 180]"));
        }
    }

    AppError::check(errors)
}

async fn ensure_active_node<E: TreeEntity, C: ConnectionTrait>(conn: &C, id: i32) -> Result<(), AppError> {
    let node = E::link(&find_node::<E, C>(conn, id).await?);
    if !node.is_active {
        return Err(AppError::with_detail(ErrorCode::InactiveNode, format!("id {id}")));
    }
    Ok(())
}

#[instrument(skip(db, request))]
pub async fn create_issue(
    db: &DatabaseConnection,
    reporter_id: i32,
    request: IssueCreateRequest,
) -> Result<issue::Model, AppError> {
    validate_issue_request(&request)?;

    let created = run_in_transaction(db, |txn| {
        let request = request.clone();
        Box::pin(async move {
            if let Some(category_id) = request.category_id {
                ensure_active_node::<CategoryEntity, _>(txn, category_id).await?;
            }
            if let Some(location_id) = request.location_id {
                ensure_active_node::<LocationEntity, _>(txn, location_id).await?;
            }
            Ok(issue::ActiveModel::from_request(&request, reporter_id).insert(txn).await?)
        })
    })
    .await?;

    info!(issue_id = created.id, "issue created");
    Ok(created)
}

pub async fn get_issue(db: &DatabaseConnection, issue_id: i32) -> Result<issue::Model, AppError> {
    find_issue(db, issue_id).await
}

/// Public issues, newest first.
pub async fn list_issues(
    db: &DatabaseConnection,
    query: &IssueQuery,
) -> Result<PaginationResponse<issue::Model>, AppError> {
    let (page, per_page) = normalize_page(query.page, query.per_page);

    let mut condition = Condition::all().add(issue::Column::IsPublic.eq(true));
    if let Some(status) = query.status {
        condition = condition.add(issue::Column::Status.eq(status));
    }
    if let Some(category_id) = query.category_id {
        condition = condition.add(issue::Column::CategoryId.eq(category_id));
    }
    if let Some(location_id) = query.location_id {
        if query.include_sublocations.unwrap_or(false) {
            let ids = subtree_ids::<LocationEntity, _>(db, location_id, true).await?;
            condition = condition.add(issue::Column::LocationId.is_in(ids));
        } else {
            condition = condition.add(issue::Column::LocationId.eq(location_id));
        }
    }
    if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = format!("%{term}%");
        condition = condition.add(
            Condition::any()
                .add(issue::Column::Title.like(pattern.as_str()))
                .add(issue::Column::Description.like(pattern.as_str())),
        );
    }

    let select = IssueEntity::find().filter(condition);
    let total_elements = select.clone().count(db).await?;

    let issues = select
        .order_by_desc(issue::Column::CreatedAt)
        .order_by_desc(issue::Column::Id)
        .offset(Some((page - 1).saturating_mul(per_page)))
        .limit(Some(per_page))
        .all(db)
        .await?;

    Ok(PaginationResponse::new(issues, page, per_page, total_elements))
}

/// Best-effort view counter bump; a failed write is logged and swallowed.
pub async fn record_view(db: &DatabaseConnection, issue_id: i32) {
    let result = IssueEntity::update_many()
        .col_expr(issue::Column::Views, Expr::col(issue::Column::Views).add(1))
        .filter(issue::Column::Id.eq(issue_id))
        .exec(db)
        .await;

    if let Err(err) = result {
        warn!(issue_id, error = %err, "failed to record issue view");
    }
}

/// New `(resolved_at, closed_at)` for a move into `next`.
///
/// Each timestamp is stamped once, on the first entry into its state, and both
/// are cleared when the issue is reopened.
pub fn stamp_transition(
    resolved_at: Option<DateTime<Utc>>,
    closed_at: Option<DateTime<Utc>>,
    next: IssueStatus,
    now: DateTime<Utc>,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    match next {
        IssueStatus::Open => (None, None),
        IssueStatus::InProgress => (resolved_at, closed_at),
        IssueStatus::Resolved => (resolved_at.or(Some(now)), closed_at),
        IssueStatus::Closed => (resolved_at, closed_at.or(Some(now))),
    }
}

#[instrument(skip(db))]
pub async fn update_status(
    db: &DatabaseConnection,
    issue_id: i32,
    status: IssueStatus,
) -> Result<issue::Model, AppError> {
    run_in_transaction(db, |txn| {
        Box::pin(async move {
            let current = lock_issue(txn, issue_id).await?;
            let (resolved_at, closed_at) =
                stamp_transition(current.resolved_at, current.closed_at, status, Utc::now());

            let mut active: issue::ActiveModel = current.into();
            active.status = Set(status);
            active.resolved_at = Set(resolved_at);
            active.closed_at = Set(closed_at);
            Ok(active.update(txn).await?)
        })
    })
    .await
}

/// Hard delete by the reporter or an administrator; votes and comments cascade.
#[instrument(skip(db))]
pub async fn delete_issue(db: &DatabaseConnection, issue_id: i32, actor: Actor) -> Result<(), AppError> {
    run_in_transaction(db, |txn| {
        Box::pin(async move {
            let issue = lock_issue(txn, issue_id).await?;
            if issue.reporter_id != actor.user_id && !actor.is_admin() {
                return Err(AppError::new(ErrorCode::NotEnoughPermission));
            }
            IssueEntity::delete_by_id(issue_id).exec(txn).await?;
            Ok(())
        })
    })
    .await
}

/// Recomputes every counter from its source rows and overwrites drifted values.
#[instrument(skip(db))]
pub async fn reconcile_counters(db: &DatabaseConnection, issue_id: i32) -> Result<IssueCounters, AppError> {
    run_in_transaction(db, |txn| Box::pin(reconcile_in(txn, issue_id))).await
}

pub(crate) async fn reconcile_in<C: ConnectionTrait>(
    conn: &C,
    issue_id: i32,
) -> Result<IssueCounters, AppError> {
    let stored = lock_issue(conn, issue_id).await?;
    let (upvotes, downvotes) = count_votes(conn, issue_id).await?;
    let comments_count = count_comments(conn, issue_id).await?;

    let actual = IssueCounters { upvotes, downvotes, comments_count };
    let recorded = IssueCounters {
        upvotes: stored.upvotes,
        downvotes: stored.downvotes,
        comments_count: stored.comments_count,
    };

    if actual != recorded {
        warn!(issue_id, ?recorded, ?actual, "counter drift corrected");
        IssueEntity::update_many()
            .col_expr(issue::Column::Upvotes, Expr::value(upvotes))
            .col_expr(issue::Column::Downvotes, Expr::value(downvotes))
            .col_expr(issue::Column::CommentsCount, Expr::value(comments_count))
            .filter(issue::Column::Id.eq(issue_id))
            .exec(conn)
            .await?;
    }

    Ok(actual)
}

/// Maintenance sweep; returns how many issues needed correcting.
#[instrument(skip(db))]
pub async fn reconcile_all(db: &DatabaseConnection) -> Result<u64, AppError> {
    let issue_ids: Vec<i32> = IssueEntity::find()
        .select_only()
        .column(issue::Column::Id)
        .order_by_asc(issue::Column::Id)
        .into_tuple()
        .all(db)
        .await?;

    let mut corrected = 0;
    for issue_id in issue_ids {
        let before = match find_issue(db, issue_id).await {
            Ok(issue) => issue,
            // deleted since the id scan
            Err(err) if err.code() == ErrorCode::IssueNotFound => continue,
            Err(err) => return Err(err),
        };
        let after = reconcile_counters(db, issue_id).await?;
        if (before.upvotes, before.downvotes, before.comments_count)
            != (after.upvotes, after.downvotes, after.comments_count)
        {
            corrected += 1;
        }
    }

    info!(corrected, "counter reconciliation sweep finished");
    Ok(corrected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn resolving_stamps_once() {
        let first = Utc::now() - Duration::hours(3);
        let now = Utc::now();

        let (resolved, closed) = stamp_transition(None, None, IssueStatus::Resolved, now);
        assert_eq!(resolved, Some(now));
        assert_eq!(closed, None);

        let (resolved, _) = stamp_transition(Some(first), None, IssueStatus::Resolved, now);
        assert_eq!(resolved, Some(first));
    }

    #[test]
    fn direct_close_leaves_resolved_empty() {
        let now = Utc::now();
        let (resolved, closed) = stamp_transition(None, None, IssueStatus::Closed, now);
        assert_eq!(resolved, None);
        assert_eq!(closed, Some(now));
    }

    #[test]
    fn reopening_clears_both() {
        let earlier = Utc::now() - Duration::days(1);
        let (resolved, closed) =
            stamp_transition(Some(earlier), Some(earlier), IssueStatus::Open, Utc::now());
        assert_eq!((resolved, closed), (None, None));
    }

    #[test]
    fn in_progress_keeps_existing_stamps() {
        let earlier = Utc::now() - Duration::days(1);
        let (resolved, closed) =
            stamp_transition(Some(earlier), None, IssueStatus::InProgress, Utc::now());
        assert_eq!((resolved, closed), (Some(earlier), None));
    }

    #[test]
    fn blank_fields_fail_validation() {
        let request = IssueCreateRequest {
            title: "  ".to_string(),
            description: String::new(),
            latitude: Some(120.0),
            ..Default::default()
        };
        match validate_issue_request(&request).unwrap_err() {
            AppError::ValidationError(errors) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["title", "description", "latitude"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
