//! LinkMy backend - link-in-bio REST API.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod mail;
pub mod routes;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

use config::{CONFIG, DEFAULT_JWT_SECRET};

/// Request bodies above this size are rejected with 413.
pub const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// CORS for the configured front-end origins. Unparseable entries are skipped.
pub fn configure_cors(origins: &[String]) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

fn public_routes() -> Router {
    use routes::{auth, public};

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/send-otp", post(auth::send_otp))
        .route("/auth/verify-otp", post(auth::verify_otp))
        .route(
            "/auth/complete-registration",
            post(auth::complete_registration),
        )
        .route("/p/{slug}", get(public::get_public_profile))
        .route("/click/{id}", post(public::track_click))
}

fn protected_routes() -> Router {
    use routes::{analytics, categories, links, profiles, themes, users};

    Router::new()
        .route("/me", get(users::get_me).put(users::update_me))
        .route("/me/password", put(users::change_password))
        .route(
            "/profiles",
            get(profiles::list_profiles).post(profiles::create_profile),
        )
        .route(
            "/profiles/{id}",
            get(profiles::get_profile)
                .put(profiles::update_profile)
                .delete(profiles::delete_profile),
        )
        .route(
            "/profiles/{profile_id}/links",
            get(links::list_links).post(links::create_link),
        )
        .route("/links/reorder", put(links::reorder_links))
        .route(
            "/links/{id}",
            put(links::update_link).delete(links::delete_link),
        )
        .route(
            "/profiles/{profile_id}/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route("/categories/reorder", put(categories::reorder_categories))
        .route(
            "/categories/{id}",
            put(categories::update_category).delete(categories::delete_category),
        )
        .route(
            "/profiles/{profile_id}/theme",
            get(themes::get_theme).put(themes::update_theme),
        )
        .route(
            "/profiles/{profile_id}/analytics",
            get(analytics::get_analytics),
        )
        .nest("/admin", admin_routes())
        .route_layer(middleware::from_fn(auth::require_auth))
}

/// Mounted inside [`protected_routes`], so the token is checked first.
fn admin_routes() -> Router {
    use routes::admin;

    Router::new()
        .route("/stats", get(admin::get_stats))
        .route("/users", get(admin::list_users))
        .route(
            "/users/{id}",
            get(admin::get_user).put(admin::update_user),
        )
        .route("/profiles", get(admin::list_profiles))
        .route("/profiles/{id}", put(admin::update_profile))
        .route_layer(middleware::from_fn(auth::require_admin))
}

/// Create and configure the application router.
pub fn create_app() -> Router {
    let cors = configure_cors(&CONFIG.cors_origins);

    let api = Router::new()
        .merge(public_routes())
        .merge(protected_routes());

    Router::new()
        .nest("/api/v1", api)
        .route("/health", get(routes::health::health_ping))
        .route("/health/database", get(routes::health::health_database))
        .route("/health/ready", get(routes::health::health_ready))
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(cors)
}

/// Run the server (used by main).
pub async fn run() {
    dotenvy::dotenv().ok();

    let _log_guards = logging::init();

    routes::health::init_start_time();

    if CONFIG.is_production() && CONFIG.jwt.secret == DEFAULT_JWT_SECRET {
        tracing::error!("JWT_SECRET must be set to a unique value in production");
        std::process::exit(1);
    }

    match db::init_pool(&CONFIG.database).await {
        Ok(pool) => {
            if let Err(e) = db::run_migrations(&pool).await {
                tracing::error!("Failed to run database migrations: {}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            tracing::warn!(
                "Failed to initialize database pool: {}. API routes will answer 503.",
                e
            );
        }
    }

    if !CONFIG.mail.is_configured() {
        tracing::warn!("SMTP is not configured; OTP emails cannot be delivered");
    }

    let app = create_app();

    let addr: SocketAddr = match format!("{}:{}", CONFIG.host, CONFIG.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("Invalid HOST/PORT configuration: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("Starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!("Server error: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{bearer, send};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_is_outside_api_prefix() {
        let (status, body) = send(create_app(), "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_public_routes_need_no_token() {
        let (status, _) = send(create_app(), "GET", "/api/v1/p/someone", None, None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, _) = send(
            create_app(),
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "a@example.com", "password": "password123"})),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_protected_routes_need_token() {
        for (method, uri) in [
            ("GET", "/api/v1/me"),
            ("GET", "/api/v1/profiles"),
            ("PUT", "/api/v1/links/reorder"),
            ("DELETE", "/api/v1/categories/1"),
            ("GET", "/api/v1/profiles/1/analytics"),
            ("GET", "/api/v1/admin/stats"),
        ] {
            let (status, _) = send(create_app(), method, uri, None, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn test_admin_routes_forbid_regular_users() {
        let (status, _) = send(
            create_app(),
            "GET",
            "/api/v1/admin/users",
            Some(bearer(2, false)),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_authenticated_request_without_database_is_unavailable() {
        let (status, _) = send(
            create_app(),
            "GET",
            "/api/v1/profiles",
            Some(bearer(2, false)),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let body = vec![b'a'; BODY_LIMIT_BYTES + 1];
        let res = create_app()
            .oneshot(
                Request::post("/api/v1/auth/login")
                    .header("content-type", "application/json")
                    .header("content-length", body.len())
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let (status, _) = send(create_app(), "GET", "/api/v1/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
