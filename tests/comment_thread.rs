mod common;

use sea_orm::{EntityTrait, PaginatorTrait};
use sunoaid::entity::comment::{self, CommentState};
use sunoaid::entity::user;
use sunoaid::model::auth::Actor;
use sunoaid::model::global_error::{ErrorCode, ErrorKind};
use sunoaid::service::comment::{
    add_comment, edit_comment, list_replies, list_top_level, load_thread, soft_delete,
};
use sunoaid::service::issue::{get_issue, reconcile_counters};

use common::{admin, citizen, create_issue, setup_db};

#[tokio::test]
async fn replies_must_stay_in_their_issue() {
    let db = setup_db().await;
    let user = citizen(&db, "Ana").await;
    let actor = Actor::citizen(user.id);
    let first = create_issue(&db, user.id, "Pothole on EDSA").await;
    let second = create_issue(&db, user.id, "Uncollected garbage").await;

    let root = add_comment(&db, actor, first.id, "Still there today", None).await.unwrap();

    let err = add_comment(&db, actor, second.id, "Wrong thread", Some(root.id)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(err.code(), ErrorCode::CrossThreadReply);

    let err = add_comment(&db, actor, first.id, "Ghost parent", Some(9_999)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    // nothing persisted by the rejected replies
    assert_eq!(comment::Entity::find().count(&db).await.unwrap(), 1);
    assert_eq!(get_issue(&db, second.id).await.unwrap().comments_count, 0);
    assert_eq!(get_issue(&db, first.id).await.unwrap().comments_count, 1);
}

#[tokio::test]
async fn soft_delete_keeps_replies_and_count() {
    let db = setup_db().await;
    let author = citizen(&db, "Ben").await;
    let other = citizen(&db, "Carla").await;
    let issue = create_issue(&db, author.id, "Leaking water main").await;

    let root = add_comment(&db, Actor::citizen(author.id), issue.id, "Reported to the LGU", None)
        .await
        .unwrap();
    for text in ["Same here", "Got worse overnight", "Crew arrived"] {
        add_comment(&db, Actor::citizen(other.id), issue.id, text, Some(root.id))
            .await
            .unwrap();
    }
    assert_eq!(get_issue(&db, issue.id).await.unwrap().comments_count, 4);

    let deleted = soft_delete(&db, root.id, Actor::citizen(author.id)).await.unwrap();
    assert_eq!(deleted.state, CommentState::Deleted);
    assert!(deleted.content.is_empty());
    assert_eq!(deleted.deleted_by, Some(author.id));

    let replies = list_replies(&db, root.id).await.unwrap();
    assert_eq!(replies.len(), 3);
    assert!(replies.iter().all(|r| r.parent_id == Some(root.id)));
    let texts: Vec<&str> = replies.iter().map(|r| r.content.as_str()).collect();
    assert_eq!(texts, vec!["Same here", "Got worse overnight", "Crew arrived"]);

    assert_eq!(get_issue(&db, issue.id).await.unwrap().comments_count, 4);
    // reconciliation agrees with the maintained counter
    assert_eq!(reconcile_counters(&db, issue.id).await.unwrap().comments_count, 4);

    // second delete is a no-op
    let again = soft_delete(&db, root.id, Actor::citizen(author.id)).await.unwrap();
    assert_eq!(again.deleted_at, deleted.deleted_at);
}

#[tokio::test]
async fn only_author_or_admin_may_delete() {
    let db = setup_db().await;
    let author = citizen(&db, "Dina").await;
    let stranger = citizen(&db, "Eli").await;
    let moderator = admin(&db, "Moderator").await;
    let issue = create_issue(&db, author.id, "Illegal parking").await;
    let posted = add_comment(&db, Actor::citizen(author.id), issue.id, "Every night", None)
        .await
        .unwrap();

    let err = soft_delete(&db, posted.id, Actor::citizen(stranger.id)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    let err = edit_comment(&db, posted.id, Actor::citizen(stranger.id), "edited").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    let deleted = soft_delete(&db, posted.id, Actor::admin(moderator.id)).await.unwrap();
    assert_eq!(deleted.deleted_by, Some(moderator.id));

    let err = add_comment(&db, Actor::citizen(stranger.id), issue.id, "Reply", Some(posted.id))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ReplyToDeletedComment);

    let err = edit_comment(&db, posted.id, Actor::citizen(author.id), "Back").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::CommentDeleted);
}

#[tokio::test]
async fn edit_stamps_and_admin_comments_are_official() {
    let db = setup_db().await;
    let author = citizen(&db, "Fe").await;
    let official = admin(&db, "City Engineer").await;
    let issue = create_issue(&db, author.id, "Damaged footbridge").await;

    let posted = add_comment(&db, Actor::citizen(author.id), issue.id, "Railing missing", None)
        .await
        .unwrap();
    assert!(!posted.is_official);
    assert!(posted.edited_at.is_none());

    let edited = edit_comment(&db, posted.id, Actor::citizen(author.id), "  Railing and steps missing ")
        .await
        .unwrap();
    assert_eq!(edited.content, "Railing and steps missing");
    assert!(edited.edited_at.is_some());

    let answer = add_comment(&db, Actor::admin(official.id), issue.id, "Repair scheduled", Some(posted.id))
        .await
        .unwrap();
    assert!(answer.is_official);
}

#[tokio::test]
async fn thread_lists_roots_newest_first() {
    let db = setup_db().await;
    let user = citizen(&db, "Gil").await;
    let actor = Actor::citizen(user.id);
    let issue = create_issue(&db, user.id, "Noise complaint").await;

    let older = add_comment(&db, actor, issue.id, "First", None).await.unwrap();
    let newer = add_comment(&db, actor, issue.id, "Second", None).await.unwrap();
    let reply = add_comment(&db, actor, issue.id, "Reply", Some(older.id)).await.unwrap();

    let top: Vec<i32> = list_top_level(&db, issue.id).await.unwrap().iter().map(|c| c.id).collect();
    assert_eq!(top, vec![newer.id, older.id]);

    let thread = load_thread(&db, issue.id).await.unwrap();
    assert_eq!(thread.len(), 2);
    assert_eq!(thread[1].comment.id, older.id);
    assert_eq!(thread[1].replies[0].comment.id, reply.id);

    let err = list_top_level(&db, 404).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn blank_comment_is_rejected() {
    let db = setup_db().await;
    let user = citizen(&db, "Hana").await;
    let issue = create_issue(&db, user.id, "Open manhole").await;

    let err = add_comment(&db, Actor::citizen(user.id), issue.id, "   ", None).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
    assert_eq!(get_issue(&db, issue.id).await.unwrap().comments_count, 0);
}

#[tokio::test]
async fn removing_a_user_keeps_other_users_replies() {
    let db = setup_db().await;
    let reporter = citizen(&db, "Reporter").await;
    let leaving = citizen(&db, "Leaving").await;
    let staying = citizen(&db, "Staying").await;
    let issue = create_issue(&db, reporter.id, "Open canal").await;

    let root = add_comment(&db, Actor::citizen(leaving.id), issue.id, "Smells awful", None)
        .await
        .unwrap();
    let reply = add_comment(&db, Actor::citizen(staying.id), issue.id, "Agreed", Some(root.id))
        .await
        .unwrap();

    user::Entity::delete_by_id(leaving.id).exec(&db).await.unwrap();

    assert!(comment::Entity::find_by_id(root.id).one(&db).await.unwrap().is_none());
    let orphan = comment::Entity::find_by_id(reply.id).one(&db).await.unwrap().unwrap();
    assert_eq!(orphan.parent_id, None);
    assert_eq!(orphan.content, "Agreed");

    let counters = reconcile_counters(&db, issue.id).await.unwrap();
    assert_eq!(counters.comments_count, 1);
}
