/// HTTP handlers for the blog service
///
/// - `pages`: site surface, page contexts as JSON with redirects after writes
/// - `posts`, `comments`, `groups`, `follows`: REST API under `/api/v1`
/// - `admin`: staff-only group management, cache clearing and user purge
/// - `health`: liveness/readiness probes
pub mod admin;
pub mod comments;
pub mod follows;
pub mod groups;
pub mod health;
pub mod pages;
pub mod posts;

use actix_web::http::{header, Method};
use actix_web::{web, HttpRequest, HttpResponse};
use std::sync::Arc;

use crate::cache::HomePageCache;
use crate::db::{MaintenanceRepository, Repositories};
use crate::error::{AppError, Result};
use crate::metrics::serve_metrics;
use crate::middleware::{Action, Identity, ResourceKind, ResourceTable};
use crate::services::{CommentService, FeedComposer, FollowGraph, GroupService, PostService};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub posts: PostService,
    pub comments: CommentService,
    pub groups: GroupService,
    pub follows: FollowGraph,
    pub feed: FeedComposer,
    pub home_cache: HomePageCache,
    pub permissions: ResourceTable,
    pub maintenance: Arc<dyn MaintenanceRepository>,
}

impl AppState {
    pub fn new(repos: Repositories, home_cache: HomePageCache, items_per_page: i64) -> Self {
        Self {
            posts: PostService::new(repos.posts.clone(), repos.groups.clone()),
            comments: CommentService::new(repos.comments.clone(), repos.posts.clone()),
            groups: GroupService::new(repos.groups.clone()),
            follows: FollowGraph::new(repos.follows.clone()),
            feed: FeedComposer::new(repos.posts.clone(), repos.follows.clone(), items_per_page),
            home_cache,
            permissions: ResourceTable::default(),
            maintenance: repos.maintenance,
        }
    }
}

pub(crate) fn redirect_found(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

pub(crate) fn redirect_see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Fallback for methods a resource does not route; the dispatch table
/// decides between 405 and an authorization failure.
async fn unsupported(
    kind: ResourceKind,
    state: web::Data<AppState>,
    identity: Identity,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let method = req.method();
    let action = if method == Method::GET {
        Action::Retrieve
    } else if method == Method::POST {
        Action::Create
    } else if method == Method::DELETE {
        Action::Delete
    } else {
        Action::Update
    };
    state.permissions.authorize(kind, action, &identity, None)?;
    Err(AppError::MethodNotAllowed(format!(
        "{} {}",
        req.method(),
        req.path()
    )))
}

/// Wire every route of the service.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(serve_metrics))
        .route("/health", web::get().to(health::health_summary))
        .route("/health/ready", web::get().to(health::readiness))
        .route("/health/live", web::get().to(health::liveness))
        .service(
            web::scope("/api/v1")
                .service(
                    web::resource("/posts")
                        .route(web::get().to(posts::list_posts))
                        .route(web::post().to(posts::create_post)),
                )
                .service(
                    web::resource("/posts/{post_id}")
                        .route(web::get().to(posts::get_post))
                        .route(web::put().to(posts::replace_post))
                        .route(web::patch().to(posts::patch_post))
                        .route(web::delete().to(posts::delete_post)),
                )
                .service(
                    web::resource("/posts/{post_id}/comments")
                        .route(web::get().to(comments::list_comments))
                        .route(web::post().to(comments::create_comment)),
                )
                .service(
                    web::resource("/posts/{post_id}/comments/{comment_id}")
                        .route(web::get().to(comments::get_comment))
                        .route(web::put().to(comments::replace_comment))
                        .route(web::patch().to(comments::patch_comment))
                        .route(web::delete().to(comments::delete_comment)),
                )
                .service(
                    web::resource("/groups")
                        .route(web::get().to(groups::list_groups))
                        .default_service(web::to(
                            |state: web::Data<AppState>, identity: Identity, req: HttpRequest| {
                                unsupported(ResourceKind::Groups, state, identity, req)
                            },
                        )),
                )
                .service(
                    web::resource("/groups/{group_id}")
                        .route(web::get().to(groups::get_group))
                        .default_service(web::to(
                            |state: web::Data<AppState>, identity: Identity, req: HttpRequest| {
                                unsupported(ResourceKind::Groups, state, identity, req)
                            },
                        )),
                )
                .service(
                    web::resource("/follow")
                        .route(web::get().to(follows::list_follows))
                        .route(web::post().to(follows::create_follow))
                        .default_service(web::to(
                            |state: web::Data<AppState>, identity: Identity, req: HttpRequest| {
                                unsupported(ResourceKind::Follows, state, identity, req)
                            },
                        )),
                ),
        )
        .service(
            web::scope("/admin")
                .route("/groups", web::post().to(admin::create_group))
                .route("/groups/{group_id}", web::patch().to(admin::update_group))
                .route("/groups/{group_id}", web::delete().to(admin::delete_group))
                .route("/cache/clear", web::post().to(admin::clear_cache))
                .route("/users/{user_id}", web::delete().to(admin::purge_user)),
        )
        .route("/", web::get().to(pages::index))
        .route("/group/{slug}", web::get().to(pages::group_posts))
        .route("/profile/{user_id}", web::get().to(pages::profile))
        .route("/profile/{user_id}/follow", web::post().to(pages::profile_follow))
        .route(
            "/profile/{user_id}/unfollow",
            web::post().to(pages::profile_unfollow),
        )
        .route("/posts/{post_id}", web::get().to(pages::post_detail))
        .route("/posts/{post_id}/edit", web::post().to(pages::post_edit))
        .route("/posts/{post_id}/comment", web::post().to(pages::add_comment))
        .route("/new", web::post().to(pages::post_create))
        .route("/follow", web::get().to(pages::follow_index))
        .route("/about/author", web::get().to(pages::about_author))
        .route("/about/tech", web::get().to(pages::about_tech));
}
