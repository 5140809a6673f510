use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use std::collections::HashMap;
use tracing::{info, instrument};

use crate::db::run_in_transaction;
use crate::entity::comment::{self, Entity as CommentEntity};
use crate::entity::issue::{self, Entity as IssueEntity};
use crate::model::auth::Actor;
use crate::model::comment::{CommentNode, CommentResponse};
use crate::model::global_error::{AppError, ErrorCode, ValidationFieldError};
use crate::service::issue::{find_issue, lock_issue};

const MAX_CONTENT_LEN: usize = 10_000;

fn validate_content(content: &str) -> Result<String, AppError> {
    let trimmed = content.trim();
    let mut errors = Vec::new();
    if trimmed.is_empty() {
        errors.push(ValidationFieldError::new("content", "content is required"));
    } else if trimmed.chars().count() > MAX_CONTENT_LEN {
        errors.push(ValidationFieldError::new("content", "content must be at most 10000 characters"));
    }
    AppError::check(errors)?;
    Ok(trimmed.to_string())
}

async fn find_comment<C: ConnectionTrait>(conn: &C, comment_id: i32) -> Result<comment::Model, AppError> {
    CommentEntity::find_by_id(comment_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::with_detail(ErrorCode::CommentNotFound, format!("id {comment_id}")))
}

/// A reply target must exist, hang off the same issue and still be active.
async fn validate_parent<C: ConnectionTrait>(conn: &C, issue_id: i32, parent_id: i32) -> Result<(), AppError> {
    let parent = CommentEntity::find_by_id(parent_id).one(conn).await?;
    match parent {
        Some(parent) if parent.issue_id != issue_id => Err(AppError::with_detail(
            ErrorCode::CrossThreadReply,
            format!("comment {parent_id} belongs to issue {}", parent.issue_id),
        )),
        Some(parent) if parent.is_deleted() => Err(AppError::with_detail(
            ErrorCode::ReplyToDeletedComment,
            format!("comment {parent_id}"),
        )),
        Some(_) => Ok(()),
        None => Err(AppError::with_detail(
            ErrorCode::CrossThreadReply,
            format!("comment {parent_id} does not exist"),
        )),
    }
}

/// Posts a comment or reply and bumps the issue's `comments_count` in the same transaction.
///
/// Comments by administrators are flagged official.
#[instrument(skip(db, content))]
pub async fn add_comment(
    db: &DatabaseConnection,
    actor: Actor,
    issue_id: i32,
    content: &str,
    parent_id: Option<i32>,
) -> Result<comment::Model, AppError> {
    let content = validate_content(content)?;

    let created = run_in_transaction(db, |txn| {
        let content = content.clone();
        Box::pin(async move {
            lock_issue(txn, issue_id).await?;
            if let Some(parent_id) = parent_id {
                validate_parent(txn, issue_id, parent_id).await?;
            }

            let created = comment::ActiveModel::new_reply(
                issue_id,
                actor.user_id,
                parent_id,
                content,
                actor.is_admin(),
            )
            .insert(txn)
            .await?;

            IssueEntity::update_many()
                .col_expr(
                    issue::Column::CommentsCount,
                    Expr::col(issue::Column::CommentsCount).add(1),
                )
                .filter(issue::Column::Id.eq(issue_id))
                .exec(txn)
                .await?;

            Ok(created)
        })
    })
    .await?;

    info!(comment_id = created.id, "comment added");
    Ok(created)
}

/// Redacts a comment in place. Replies stay attached and `comments_count` is untouched.
#[instrument(skip(db))]
pub async fn soft_delete(db: &DatabaseConnection, comment_id: i32, actor: Actor) -> Result<comment::Model, AppError> {
    run_in_transaction(db, |txn| {
        Box::pin(async move {
            let current = find_comment(txn, comment_id).await?;
            if current.user_id != actor.user_id && !actor.is_admin() {
                return Err(AppError::new(ErrorCode::NotCommentAuthor));
            }
            if current.is_deleted() {
                return Ok(current);
            }

            let mut active: comment::ActiveModel = current.into();
            active.soft_delete(actor.user_id);
            Ok(active.update(txn).await?)
        })
    })
    .await
}

#[instrument(skip(db, content))]
pub async fn edit_comment(
    db: &DatabaseConnection,
    comment_id: i32,
    actor: Actor,
    content: &str,
) -> Result<comment::Model, AppError> {
    let content = validate_content(content)?;

    run_in_transaction(db, |txn| {
        let content = content.clone();
        Box::pin(async move {
            let current = find_comment(txn, comment_id).await?;
            if current.user_id != actor.user_id {
                return Err(AppError::new(ErrorCode::NotCommentAuthor));
            }
            if current.is_deleted() {
                return Err(AppError::with_detail(ErrorCode::CommentDeleted, format!("id {comment_id}")));
            }

            let mut active: comment::ActiveModel = current.into();
            active.content = Set(content);
            active.edited_at = Set(Some(Utc::now()));
            Ok(active.update(txn).await?)
        })
    })
    .await
}

/// Top-level comments of an issue, newest first, deleted ones included.
pub async fn list_top_level(db: &DatabaseConnection, issue_id: i32) -> Result<Vec<comment::Model>, AppError> {
    find_issue(db, issue_id).await?;
    Ok(CommentEntity::find()
        .filter(comment::Column::IssueId.eq(issue_id))
        .filter(comment::Column::ParentId.is_null())
        .order_by_desc(comment::Column::CreatedAt)
        .order_by_desc(comment::Column::Id)
        .all(db)
        .await?)
}

/// Direct replies to a comment, oldest first.
pub async fn list_replies(db: &DatabaseConnection, comment_id: i32) -> Result<Vec<comment::Model>, AppError> {
    find_comment(db, comment_id).await?;
    Ok(CommentEntity::find()
        .filter(comment::Column::ParentId.eq(comment_id))
        .order_by_asc(comment::Column::CreatedAt)
        .order_by_asc(comment::Column::Id)
        .all(db)
        .await?)
}

/// The full thread of an issue as a forest.
pub async fn load_thread(db: &DatabaseConnection, issue_id: i32) -> Result<Vec<CommentNode>, AppError> {
    find_issue(db, issue_id).await?;
    let comments = CommentEntity::find()
        .filter(comment::Column::IssueId.eq(issue_id))
        .all(db)
        .await?;
    Ok(assemble_thread(comments))
}

/// Builds the reply forest from a flat list: roots newest first, replies oldest first.
///
/// Comments whose parent is missing from the list are dropped.
pub fn assemble_thread(comments: Vec<comment::Model>) -> Vec<CommentNode> {
    let mut roots = Vec::new();
    let mut children: HashMap<i32, Vec<comment::Model>> = HashMap::new();
    for comment in comments {
        match comment.parent_id {
            Some(parent_id) => children.entry(parent_id).or_default().push(comment),
            None => roots.push(comment),
        }
    }

    roots.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    for replies in children.values_mut() {
        replies.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    }

    roots.into_iter().map(|root| build_node(root, &mut children)).collect()
}

fn build_node(comment: comment::Model, children: &mut HashMap<i32, Vec<comment::Model>>) -> CommentNode {
    let replies = children
        .remove(&comment.id)
        .unwrap_or_default()
        .into_iter()
        .map(|reply| build_node(reply, children))
        .collect();

    CommentNode {
        comment: CommentResponse::from(comment),
        replies,
    }
}
