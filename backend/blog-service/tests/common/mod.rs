#![allow(dead_code)]

use actix_web::web;
use jsonwebtoken::{encode, EncodingKey, Header};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use blog_service::cache::{HomePageCache, MemoryPageCache};
use blog_service::db::Repositories;
use blog_service::middleware::{Claims, TokenVerifier};
use blog_service::models::{PostForm, UserId};
use blog_service::AppState;

pub const SECRET: &str = "integration-test-secret";

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub verifier: web::Data<TokenVerifier>,
}

pub fn context(page_size: i64, cache_ttl: Duration) -> TestContext {
    let home_cache = HomePageCache::new(Arc::new(MemoryPageCache::new()), cache_ttl);
    TestContext {
        state: web::Data::new(AppState::new(Repositories::memory(), home_cache, page_size)),
        verifier: web::Data::new(TokenVerifier::new(SECRET)),
    }
}

pub fn default_context() -> TestContext {
    context(10, Duration::from_secs(20))
}

/// Build the service with every route wired, against `$ctx`.
macro_rules! spawn_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($ctx.state.clone())
                .app_data($ctx.verifier.clone())
                .configure(blog_service::configure),
        )
        .await
    };
}

pub fn new_user() -> UserId {
    UserId(Uuid::new_v4())
}

pub fn token_for(user: UserId, is_staff: bool) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user.to_string(),
        exp: now + 3600,
        iat: now,
        is_staff,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("token encoding")
}

pub fn bearer(user: UserId) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token_for(user, false)))
}

pub fn staff_bearer(user: UserId) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token_for(user, true)))
}

pub fn post_form(text: &str) -> PostForm {
    PostForm {
        text: text.to_string(),
        group: None,
        image: None,
    }
}
