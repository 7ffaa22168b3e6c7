use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    Json, Router,
    extract::{FromRef, State},
    http::{self, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use chrono::Utc;
use entity::{sessions, users};
use platform_api::ApiError;
use platform_db::{self, DbPool};
use products_hr::{AuthContext, HrError, identity};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use time::Duration as TimeDuration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{config::AppConfig, graphql::SchemaType};

const SESSION_COOKIE: &str = "dayflow_session";

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub schema: SchemaType,
    pub config: Arc<AppConfig>,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.config.cookie_key.clone()
    }
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "hrms server listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    CorsLayer::new()
        .allow_credentials(true)
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_methods([Method::POST, Method::GET])
        .allow_origin(AllowOrigin::list(allowed))
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/health", get(health_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/graphql", post(graphql_handler))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    user_id: Uuid,
    employee_code: String,
    email: String,
    role: &'static str,
}

async fn login_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Json(body): Json<LoginRequest>,
) -> HttpResult<(PrivateCookieJar, Json<LoginResponse>)> {
    let user = identity::authenticate(&state.pool, &body.email, &body.password)
        .await?
        .ok_or_else(|| HttpError::new(StatusCode::UNAUTHORIZED, "invalid email or password"))?;

    let now = Utc::now();
    let session = sessions::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        created_at: Set(now.into()),
        expires_at: Set((now + state.config.session_ttl).into()),
    }
    .insert(&state.pool)
    .await
    .map_err(HrError::from)?;

    let cookie = Cookie::build((SESSION_COOKIE, session.id.to_string()))
        .path("/")
        .http_only(true)
        .secure(state.config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::seconds(state.config.session_ttl.num_seconds()))
        .build();
    info!(user_id = %user.id, "session opened");
    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            user_id: user.id,
            employee_code: user.employee_code,
            email: user.email,
            role: user.role.as_str(),
        }),
    ))
}

async fn logout_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> HttpResult<(PrivateCookieJar, StatusCode)> {
    if let Some(session_id) = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
    {
        sessions::Entity::delete_by_id(session_id)
            .exec(&state.pool)
            .await
            .map_err(HrError::from)?;
    }
    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    Ok((jar, StatusCode::NO_CONTENT))
}

async fn graphql_handler(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    request: GraphQLRequest,
) -> HttpResult<GraphQLResponse> {
    let mut req = request.into_inner();
    if let Some(viewer) = load_session(&state, &jar).await? {
        req = req.data(viewer);
    }
    let response = state.schema.execute(req).await;
    Ok(GraphQLResponse::from(response))
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = platform_db::ping(&state.pool).await;
    Json(HealthResponse {
        ok: db_ok,
        db_ok,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    db_ok: bool,
    version: &'static str,
}

type HttpResult<T> = Result<T, HttpError>;

/// Anonymous when the cookie is absent, unreadable, expired or orphaned.
async fn load_session(state: &AppState, jar: &PrivateCookieJar) -> HttpResult<Option<AuthContext>> {
    let Some(session_id) = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
    else {
        return Ok(None);
    };
    let Some((session, user)) = sessions::Entity::find_by_id(session_id)
        .find_also_related(users::Entity)
        .one(&state.pool)
        .await
        .map_err(HrError::from)?
        .and_then(|(session, user)| user.map(|user| (session, user)))
    else {
        return Ok(None);
    };
    if session.expires_at.with_timezone(&Utc) < Utc::now() {
        sessions::Entity::delete_by_id(session.id)
            .exec(&state.pool)
            .await
            .map_err(HrError::from)?;
        warn!(user_id = %user.id, session_id = %session.id, "expired session rejected");
        return Ok(None);
    }
    Ok(Some(AuthContext::new(user.id, user.role)))
}

#[derive(Debug)]
struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    fn new(status: StatusCode, msg: &str) -> Self {
        Self {
            status,
            message: msg.to_string(),
        }
    }
}

impl From<HrError> for HttpError {
    fn from(err: HrError) -> Self {
        let api = ApiError::from(err);
        if let ApiError::Internal(inner) = &api {
            tracing::error!(error = ?inner, "request failed");
        }
        Self {
            status: StatusCode::from_u16(api.status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message: api.to_string(),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for CTRL+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    ctrl_c.await;

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, header};
    use chrono::Duration;
    use http_body_util::BodyExt;
    use migration::{Migrator, MigratorTrait};
    use platform_db::{DatabaseSettings, connect};
    use products_hr::seed::{DEMO_ADMIN_EMAIL, DEMO_ADMIN_PASSWORD, seed_demo};
    use sea_orm::{ColumnTrait, PaginatorTrait, QueryFilter};
    use sea_orm::prelude::DateTimeWithTimeZone;
    use sea_orm::sea_query::Expr;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::graphql::{Clock, build_schema};

    async fn test_router() -> Router {
        test_app().await.0
    }

    async fn test_app() -> (Router, DbPool) {
        let pool = connect(&DatabaseSettings::with_url("sqlite::memory:"))
            .await
            .expect("connect sqlite");
        Migrator::up(&pool, None).await.expect("migrate");
        seed_demo(&pool, Utc::now().date_naive()).await.expect("seed");
        let config = AppConfig {
            cookie_key: Key::generate(),
            cookie_secure: false,
            session_ttl: Duration::days(30),
            utc_offset: chrono::FixedOffset::east_opt(0).unwrap(),
            cors_allowed_origins: vec!["http://localhost:5173".into()],
        };
        let schema = build_schema(pool.clone(), Clock::default());
        let router = build_router(AppState {
            pool: pool.clone(),
            schema,
            config: Arc::new(config),
        });
        (router, pool)
    }

    async fn login_cookie(router: &Router) -> String {
        let login = router
            .clone()
            .oneshot(json_post(
                "/auth/login",
                json!({"email": DEMO_ADMIN_EMAIL, "password": DEMO_ADMIN_PASSWORD}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(login.status(), StatusCode::OK);
        let set_cookie = login
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .expect("session cookie");
        set_cookie.split(';').next().unwrap().to_string()
    }

    fn json_post(uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_database() {
        let router = test_router().await;
        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let body = body_json(response).await;
        assert_eq!(body["db_ok"], json!(true));
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let router = test_router().await;
        let response = router
            .oneshot(json_post(
                "/auth/login",
                json!({"email": DEMO_ADMIN_EMAIL, "password": "nope"}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_cookie_authenticates_graphql() {
        let router = test_router().await;
        let login = router
            .clone()
            .oneshot(json_post(
                "/auth/login",
                json!({"email": DEMO_ADMIN_EMAIL, "password": DEMO_ADMIN_PASSWORD}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(login.status(), StatusCode::OK);
        let set_cookie = login
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .expect("session cookie")
            .to_string();
        let cookie = set_cookie.split(';').next().unwrap().to_string();
        assert!(cookie.starts_with(SESSION_COOKIE));
        let body = body_json(login).await;
        assert_eq!(body["role"], json!("admin"));

        let query = json!({"query": "{ me { email role } }"});
        let response = router
            .clone()
            .oneshot(json_post("/graphql", query.clone(), Some(&cookie)))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(
            body["data"]["me"],
            json!({"email": DEMO_ADMIN_EMAIL, "role": "ADMIN"})
        );

        let logout = router
            .clone()
            .oneshot(json_post("/auth/logout", json!({}), Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(logout.status(), StatusCode::NO_CONTENT);

        let response = router
            .oneshot(json_post("/graphql", query, Some(&cookie)))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["errors"][0]["extensions"]["code"], json!("UNAUTHORIZED"));
    }

    #[tokio::test]
    async fn expired_session_is_rejected_and_removed() {
        let (router, pool) = test_app().await;
        let cookie = login_cookie(&router).await;
        let admin = users::Entity::find()
            .filter(users::Column::Email.eq(DEMO_ADMIN_EMAIL))
            .one(&pool)
            .await
            .unwrap()
            .expect("admin seeded");
        let expired = sessions::Entity::update_many()
            .col_expr(
                sessions::Column::ExpiresAt,
                Expr::value(DateTimeWithTimeZone::from(Utc::now() - Duration::hours(1))),
            )
            .filter(sessions::Column::UserId.eq(admin.id))
            .exec(&pool)
            .await
            .unwrap();
        assert_eq!(expired.rows_affected, 1);

        let response = router
            .oneshot(json_post("/graphql", json!({"query": "{ me { email } }"}), Some(&cookie)))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["errors"][0]["extensions"]["code"], json!("UNAUTHORIZED"));

        let remaining = sessions::Entity::find()
            .filter(sessions::Column::UserId.eq(admin.id))
            .count(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
