//! At most one vote per (user, issue), with the issue's up/down counters kept
//! equal to the number of vote rows of each type.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use tracing::{instrument, warn};

use crate::db::run_in_transaction;
use crate::entity::issue::{self, Entity as IssueEntity};
use crate::entity::vote::{self, Entity as VoteEntity, VoteType};
use crate::model::global_error::AppError;
use crate::model::vote::VoteTally;
use crate::service::issue::{find_issue, lock_issue};

/// What a repeated vote does to the existing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteTransition {
    Insert(VoteType),
    Remove(VoteType),
    Flip { from: VoteType, to: VoteType },
}

impl VoteTransition {
    pub fn plan(existing: Option<VoteType>, requested: VoteType) -> Self {
        match existing {
            None => VoteTransition::Insert(requested),
            Some(current) if current == requested => VoteTransition::Remove(current),
            Some(current) => VoteTransition::Flip { from: current, to: requested },
        }
    }

    /// Counter deltas this transition applies, in one statement.
    pub fn deltas(self) -> Vec<(VoteType, i32)> {
        match self {
            VoteTransition::Insert(kind) => vec![(kind, 1)],
            VoteTransition::Remove(kind) => vec![(kind, -1)],
            VoteTransition::Flip { from, to } => vec![(from, -1), (to, 1)],
        }
    }

    pub fn resulting_vote(self) -> Option<VoteType> {
        match self {
            VoteTransition::Insert(kind) => Some(kind),
            VoteTransition::Remove(_) => None,
            VoteTransition::Flip { to, .. } => Some(to),
        }
    }
}

/// Casts, toggles off, or flips `user_id`'s vote on `issue_id`.
///
/// Runs in one transaction holding the issue row lock, so concurrent votes on
/// the same issue serialize and a flip is never observed half-applied.
#[instrument(skip(db))]
pub async fn cast_vote(
    db: &DatabaseConnection,
    user_id: i32,
    issue_id: i32,
    vote_type: VoteType,
) -> Result<VoteTally, AppError> {
    run_in_transaction(db, |txn| Box::pin(cast_vote_in(txn, user_id, issue_id, vote_type))).await
}

async fn cast_vote_in<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    issue_id: i32,
    vote_type: VoteType,
) -> Result<VoteTally, AppError> {
    lock_issue(conn, issue_id).await?;

    let existing = find_vote(conn, user_id, issue_id).await?;
    let transition = VoteTransition::plan(existing.as_ref().map(|v| v.vote_type), vote_type);

    match existing {
        None => {
            vote::ActiveModel {
                user_id: Set(user_id),
                issue_id: Set(issue_id),
                vote_type: Set(vote_type),
                updated_at: Set(None),
                ..Default::default()
            }
            .insert(conn)
            .await?;
        }
        Some(current) if current.vote_type == vote_type => {
            VoteEntity::delete_by_id(current.id).exec(conn).await?;
        }
        Some(current) => {
            let mut active: vote::ActiveModel = current.into();
            active.vote_type = Set(vote_type);
            active.update(conn).await?;
        }
    }

    apply_deltas(conn, issue_id, &transition.deltas()).await?;
    let (upvotes, downvotes) = verify_tally(conn, issue_id).await?;

    Ok(VoteTally {
        upvotes,
        downvotes,
        user_vote: transition.resulting_vote(),
    })
}

async fn find_vote<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    issue_id: i32,
) -> Result<Option<vote::Model>, AppError> {
    Ok(VoteEntity::find()
        .filter(vote::Column::UserId.eq(user_id))
        .filter(vote::Column::IssueId.eq(issue_id))
        .one(conn)
        .await?)
}

async fn apply_deltas<C: ConnectionTrait>(
    conn: &C,
    issue_id: i32,
    deltas: &[(VoteType, i32)],
) -> Result<(), AppError> {
    let mut update = IssueEntity::update_many().filter(issue::Column::Id.eq(issue_id));
    for &(kind, delta) in deltas {
        let column = kind.counter_column();
        update = update.col_expr(column, Expr::col(column).add(delta));
    }
    update.exec(conn).await?;
    Ok(())
}

/// Vote rows per type for an issue: `(up, down)`.
pub(crate) async fn count_votes<C: ConnectionTrait>(conn: &C, issue_id: i32) -> Result<(i32, i32), AppError> {
    let count_of = |kind: VoteType| {
        VoteEntity::find()
            .filter(vote::Column::IssueId.eq(issue_id))
            .filter(vote::Column::VoteType.eq(kind))
            .count(conn)
    };

    let up = count_of(VoteType::Up).await?;
    let down = count_of(VoteType::Down).await?;
    Ok((
        i32::try_from(up).unwrap_or(i32::MAX),
        i32::try_from(down).unwrap_or(i32::MAX),
    ))
}

/// Checks the stored counters against the vote rows and repairs them on mismatch.
async fn verify_tally<C: ConnectionTrait>(conn: &C, issue_id: i32) -> Result<(i32, i32), AppError> {
    let stored = find_issue(conn, issue_id).await?;
    let (upvotes, downvotes) = count_votes(conn, issue_id).await?;

    if (stored.upvotes, stored.downvotes) != (upvotes, downvotes) {
        warn!(
            issue_id,
            stored_up = stored.upvotes,
            stored_down = stored.downvotes,
            upvotes,
            downvotes,
            "vote counters drifted; correcting"
        );
        IssueEntity::update_many()
            .col_expr(issue::Column::Upvotes, Expr::value(upvotes))
            .col_expr(issue::Column::Downvotes, Expr::value(downvotes))
            .filter(issue::Column::Id.eq(issue_id))
            .exec(conn)
            .await?;
    }

    Ok((upvotes, downvotes))
}

/// The caller's current vote on an issue, if any.
pub async fn user_vote(
    db: &DatabaseConnection,
    user_id: i32,
    issue_id: i32,
) -> Result<Option<VoteType>, AppError> {
    find_issue(db, issue_id).await?;
    Ok(find_vote(db, user_id, issue_id).await?.map(|v| v.vote_type))
}
