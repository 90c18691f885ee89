#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::{json, Value};

use blog_service::models::CommentForm;
use common::*;

#[actix_web::test]
async fn test_admin_requires_staff() {
    let ctx = default_context();
    let app = spawn_app!(ctx);
    let body = json!({ "title": "Cats", "slug": "cats" });

    let req = test::TestRequest::post()
        .uri("/admin/groups")
        .set_json(&body)
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::post()
        .uri("/admin/groups")
        .insert_header(bearer(new_user()))
        .set_json(&body)
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );
}

#[actix_web::test]
async fn test_group_lifecycle() {
    let ctx = default_context();
    let staff = new_user();
    let app = spawn_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/admin/groups")
        .insert_header(staff_bearer(staff))
        .set_json(json!({ "title": "Cats", "slug": "cats", "description": "Meow" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let group: Value = test::read_body_json(resp).await;
    let group_id = group["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri("/admin/groups")
        .insert_header(staff_bearer(staff))
        .set_json(json!({ "title": "More cats", "slug": "cats" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    let mut form = post_form("filed");
    form.group = Some(group_id);
    let post = ctx.state.posts.create(new_user(), form).await.unwrap();

    let req = test::TestRequest::patch()
        .uri(&format!("/admin/groups/{}", group_id))
        .insert_header(staff_bearer(staff))
        .set_json(json!({ "slug": "felines" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    let req = test::TestRequest::patch()
        .uri(&format!("/admin/groups/{}", group_id))
        .insert_header(staff_bearer(staff))
        .set_json(json!({ "description": "All cats" }))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["description"], json!("All cats"));

    let req = test::TestRequest::delete()
        .uri(&format!("/admin/groups/{}", group_id))
        .insert_header(staff_bearer(staff))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );

    let survivor = ctx.state.posts.get(post.id).await.unwrap();
    assert_eq!(survivor.group, None);
}

#[actix_web::test]
async fn test_purge_user_removes_content() {
    let ctx = default_context();
    let (departed, other) = (new_user(), new_user());
    let own = ctx.state.posts.create(departed, post_form("mine")).await.unwrap();
    let theirs = ctx.state.posts.create(other, post_form("theirs")).await.unwrap();
    ctx.state
        .comments
        .add(
            theirs.id,
            departed,
            CommentForm {
                text: "bye".to_string(),
            },
        )
        .await
        .unwrap();
    ctx.state.follows.follow(other, departed).await.unwrap();
    let app = spawn_app!(ctx);

    let req = test::TestRequest::delete()
        .uri(&format!("/admin/users/{}", departed))
        .insert_header(staff_bearer(new_user()))
        .to_request();
    let report: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(report, json!({ "posts": 1, "comments": 1, "follows": 1 }));
    assert!(ctx.state.posts.get(own.id).await.is_err());
    assert!(ctx.state.posts.get(theirs.id).await.is_ok());
    assert_eq!(ctx.state.comments.count(theirs.id).await.unwrap(), 0);
    assert!(ctx.state.follows.followees_of(other).await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_operational_endpoints() {
    let ctx = default_context();
    let app = spawn_app!(ctx);

    for uri in ["/health", "/health/live", "/health/ready"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
    }

    let req = test::TestRequest::get().uri("/health/ready").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["ready"], json!(true));
    assert_eq!(body["status"], json!("healthy"));

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
