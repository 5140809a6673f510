mod category;
mod comment;
mod dashboard;
mod health;
mod issue;
mod location;
mod vote;

use actix_web::web::{self, scope};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::auth::{AuthMiddleware, JwtUtils};
use crate::model::comment::{CommentCreateRequest, CommentNode, CommentResponse, CommentUpdateRequest};
use crate::model::dashboard::{CategoryCount, DashboardStats, StatusHistogram};
use crate::model::issue::{IssueCounters, IssueCreateRequest, IssueResponse, IssueStatusUpdateRequest, ReconcileSummary};
use crate::model::taxonomy::{
    CategoryCreateRequest, CategoryResponse, LocationCreateRequest, LocationResponse, ReparentRequest,
};
use crate::model::vote::{UserVoteResponse, VoteRequest, VoteTally};

pub use crate::api::category::{activate_category, create_category, deactivate_category, list_categories, reparent_category};
pub use crate::api::comment::{add_comment, delete_comment, edit_comment, get_thread, list_comments, list_replies};
pub use crate::api::dashboard::get_stats;
pub use crate::api::health::health_check;
pub use crate::api::issue::{create_issue, delete_issue, get_issue, list_issues, reconcile_all, reconcile_issue, update_status};
pub use crate::api::location::{activate_location, create_location, deactivate_location, list_locations, reparent_location};
pub use crate::api::vote::{cast_vote, get_user_vote};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        issue::list_issues,
        issue::get_issue,
        issue::create_issue,
        issue::delete_issue,
        issue::update_status,
        issue::reconcile_issue,
        issue::reconcile_all,
        vote::cast_vote,
        vote::get_user_vote,
        comment::list_comments,
        comment::get_thread,
        comment::list_replies,
        comment::add_comment,
        comment::edit_comment,
        comment::delete_comment,
        location::list_locations,
        location::create_location,
        location::deactivate_location,
        location::activate_location,
        location::reparent_location,
        category::list_categories,
        category::create_category,
        category::deactivate_category,
        category::activate_category,
        category::reparent_category,
        dashboard::get_stats,
    ),
    components(schemas(
        IssueCreateRequest, IssueStatusUpdateRequest, IssueResponse, IssueCounters, ReconcileSummary,
        VoteRequest, VoteTally, UserVoteResponse,
        CommentCreateRequest, CommentUpdateRequest, CommentResponse, CommentNode,
        LocationCreateRequest, LocationResponse, CategoryCreateRequest, CategoryResponse, ReparentRequest,
        DashboardStats, StatusHistogram, CategoryCount,
    )),
    modifiers(&BearerAuth),
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
        );
    }
}

/// Mounts every route: public reads at the root, mutations under `/api` behind the JWT check.
pub fn configure(jwt: JwtUtils) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.service(health_check)
            .service(list_issues)
            .service(get_issue)
            .service(list_comments)
            .service(get_thread)
            .service(list_replies)
            .service(list_locations)
            .service(list_categories)
            .service(
                scope("/api")
                    .wrap(AuthMiddleware::new(jwt))
                    .service(create_issue)
                    .service(delete_issue)
                    .service(update_status)
                    .service(reconcile_issue)
                    .service(reconcile_all)
                    .service(cast_vote)
                    .service(get_user_vote)
                    .service(add_comment)
                    .service(edit_comment)
                    .service(delete_comment)
                    .service(create_location)
                    .service(deactivate_location)
                    .service(activate_location)
                    .service(reparent_location)
                    .service(create_category)
                    .service(deactivate_category)
                    .service(activate_category)
                    .service(reparent_category)
                    .service(get_stats),
            );
    }
}
