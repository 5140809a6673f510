mod common;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use sunoaid::api;
use sunoaid::auth::JwtUtils;
use sunoaid::entity::user::UserRole;

use common::{citizen, create_issue, setup_db};

const SECRET: &str = "integration-secret";

#[actix_web::test]
async fn mutations_require_a_token() {
    let db = setup_db().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db))
            .configure(api::configure(JwtUtils::new(SECRET))),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/issues/1/vote")
        .set_json(json!({ "voteType": "up" }))
        .to_request();
    let err = test::try_call_service(&app, req).await.unwrap_err();
    assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/issues/1/vote")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .set_json(json!({ "voteType": "up" }))
        .to_request();
    let err = test::try_call_service(&app, req).await.unwrap_err();
    assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn vote_round_trip_over_http() {
    let db = setup_db().await;
    let reporter = citizen(&db, "Reporter").await;
    let voter = citizen(&db, "Voter").await;
    let issue = create_issue(&db, reporter.id, "Busted hydrant").await;

    let jwt = JwtUtils::new(SECRET);
    let token = jwt.generate_token(voter.id, UserRole::Citizen).unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db))
            .configure(api::configure(jwt)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/issues/{}/vote", issue.id))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "voteType": "up" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["upvotes"], 1);
    assert_eq!(body["userVote"], "up");

    let req = test::TestRequest::post()
        .uri(&format!("/api/issues/{}/vote", issue.id))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "voteType": "sideways" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get().uri(&format!("/issues/{}", issue.id)).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["upvotes"], 1);
    assert_eq!(body["reporterId"], reporter.id);
    assert_eq!(body["views"], 1);

    let req = test::TestRequest::get().uri(&format!("/issues/{}", issue.id)).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["views"], 2);

    // citizens cannot read the dashboard
    let req = test::TestRequest::get()
        .uri("/api/dashboard/stats")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn missing_issue_maps_to_404() {
    let db = setup_db().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db))
            .configure(api::configure(JwtUtils::new(SECRET))),
    )
    .await;

    let req = test::TestRequest::get().uri("/issues/404").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "IssueNotFound");
}
