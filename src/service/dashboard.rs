//! Read-only rollups. Nothing here locks or writes; each figure is its own
//! query, so a dashboard taken during concurrent writes is a loose snapshot.

use chrono::{Duration, Utc};
use sea_orm::sea_query::{Expr, Order};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, Iterable, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use std::collections::HashMap;
use tracing::instrument;

use crate::entity::category::{self, Entity as CategoryEntity};
use crate::entity::issue::{self, Entity as IssueEntity, IssueStatus};
use crate::entity::user::Entity as UserEntity;
use crate::model::dashboard::{CategoryCount, DashboardStats, StatusHistogram};
use crate::model::global_error::AppError;

pub const RECENT_WINDOW_DAYS: i64 = 7;
pub const DEFAULT_TOP_CATEGORIES: u64 = 5;

#[instrument(skip(db))]
pub async fn dashboard_stats(db: &DatabaseConnection, top_n: u64) -> Result<DashboardStats, AppError> {
    let total_issues = IssueEntity::find().count(db).await?;
    let total_users = UserEntity::find().count(db).await?;

    Ok(DashboardStats {
        total_issues,
        total_users,
        status_counts: status_histogram(db).await?,
        issues_last_7_days: issues_since(db, Duration::days(RECENT_WINDOW_DAYS)).await?,
        top_categories: top_categories(db, top_n).await?,
    })
}

pub async fn status_histogram(db: &DatabaseConnection) -> Result<StatusHistogram, AppError> {
    let mut histogram = StatusHistogram::default();
    for status in IssueStatus::iter() {
        let count = IssueEntity::find()
            .filter(issue::Column::Status.eq(status))
            .count(db)
            .await?;
        histogram.add(status, count);
    }
    Ok(histogram)
}

/// Issues created within the trailing `window`, measured from now.
pub async fn issues_since(db: &DatabaseConnection, window: Duration) -> Result<u64, AppError> {
    let since = Utc::now() - window;
    Ok(IssueEntity::find()
        .filter(issue::Column::CreatedAt.gte(since))
        .count(db)
        .await?)
}

/// Categories with the most issues; ties go to the lower category id.
pub async fn top_categories(db: &DatabaseConnection, top_n: u64) -> Result<Vec<CategoryCount>, AppError> {
    if top_n == 0 {
        return Ok(Vec::new());
    }

    let rows: Vec<(i32, i64)> = IssueEntity::find()
        .select_only()
        .column(issue::Column::CategoryId)
        .column_as(issue::Column::Id.count(), "issue_count")
        .filter(issue::Column::CategoryId.is_not_null())
        .group_by(issue::Column::CategoryId)
        .order_by(Expr::col(issue::Column::Id).count(), Order::Desc)
        .order_by_asc(issue::Column::CategoryId)
        .limit(top_n)
        .into_tuple()
        .all(db)
        .await?;

    let ids: Vec<i32> = rows.iter().map(|(id, _)| *id).collect();
    let names: HashMap<i32, String> = CategoryEntity::find()
        .filter(category::Column::Id.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    Ok(rows
        .into_iter()
        .map(|(category_id, count)| CategoryCount {
            category_id,
            name: names.get(&category_id).cloned().unwrap_or_default(),
            issue_count: u64::try_from(count).unwrap_or_default(),
        })
        .collect())
}
