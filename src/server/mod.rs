//! HTTP server: JSON API plus static assets

mod error;
mod handlers;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::JwtSessions;
use crate::config::{AuthConfig, BlogConfig};
use crate::content::PostRepository;
use crate::Blog;

/// Public site metadata
#[derive(Debug, Clone)]
pub struct SiteInfo {
    pub title: String,
    pub description: String,
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    repo: Arc<PostRepository>,
    sessions: Arc<JwtSessions>,
    auth: Arc<AuthConfig>,
    site: Arc<SiteInfo>,
}

impl AppState {
    pub fn new(repo: PostRepository, sessions: JwtSessions, config: &BlogConfig) -> Self {
        Self {
            repo: Arc::new(repo),
            sessions: Arc::new(sessions),
            auth: Arc::new(config.auth.clone()),
            site: Arc::new(SiteInfo {
                title: config.title.clone(),
                description: config.description.clone(),
            }),
        }
    }
}

/// Build the application router. Unknown paths fall through to `public_dir`.
pub fn router(state: AppState, public_dir: &Path) -> Router {
    let assets = ServeDir::new(public_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/api/site", get(handlers::site_info))
        .route(
            "/api/posts",
            get(handlers::list_posts).post(handlers::create_post),
        )
        .route("/api/posts/:slug", get(handlers::get_post))
        .route(
            "/api/posts/:slug/views",
            get(handlers::get_views).post(handlers::increment_views),
        )
        .route("/api/archive", get(handlers::archive))
        .route("/api/tags", get(handlers::tags))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/auth/verify", get(handlers::verify))
        .fallback_service(assets)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the blog server
pub async fn start(blog: &Blog, ip: &str, port: u16) -> Result<()> {
    if blog.config.auth.admin_password.is_none() {
        tracing::warn!("No admin password configured, login is disabled");
    }
    if blog.config.auth.secret == AuthConfig::default().secret {
        tracing::warn!("Using the fallback session secret, set SESSION_SECRET");
    }

    let state = AppState::new(blog.repository(), blog.sessions(), &blog.config);
    let app = router(state, &blog.public_dir);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatsStore;
    use crate::storage::{MemoryStorage, PublicDir, Storage};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct TestApp {
        _public: TempDir,
        posts: Arc<MemoryStorage>,
        app: Router,
    }

    fn test_app() -> TestApp {
        let public = TempDir::new().unwrap();
        fs::write(public.path().join("index.html"), "<h1>home</h1>").unwrap();

        let mut config = BlogConfig::default();
        config.title = "Test Blog".to_string();
        config.auth.secret = "test-secret".to_string();
        config.auth.admin_password = Some("hunter2".to_string());

        let posts = Arc::new(MemoryStorage::new());
        let repo = PostRepository::new(
            posts.clone(),
            Arc::new(StatsStore::new(Arc::new(MemoryStorage::new()))),
            Arc::new(PublicDir::new(public.path())),
        );
        let sessions = JwtSessions::new(&config.auth.secret, config.auth.session_hours);
        let app = router(AppState::new(repo, sessions, &config), public.path());

        TestApp {
            _public: public,
            posts,
            app,
        }
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn login(app: &Router) -> String {
        let response = send(
            app,
            json_request("POST", "/api/auth/login", json!({"password": "hunter2"}), None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(set_cookie.starts_with("admin-token="));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Strict"));

        set_cookie.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_site_info() {
        let t = test_app();
        let response = send(&t.app, get_request("/api/site")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["title"], "Test Blog");
    }

    #[tokio::test]
    async fn test_login_create_and_read() {
        let t = test_app();
        let cookie = login(&t.app).await;

        let response = send(
            &t.app,
            json_request(
                "POST",
                "/api/posts",
                json!({"title": "T", "slug": "s", "content": "# H\n\nBody text", "tags": ["rust"]}),
                Some(&cookie),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await["slug"], "s");
        assert!(t.posts.get("s").unwrap().is_some());

        let response = send(&t.app, get_request("/api/posts/s")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let post = json_body(response).await;
        assert_eq!(post["title"], "T");
        assert_eq!(post["tableOfContents"][0]["text"], "H");
        assert!(post["contentHtml"].as_str().unwrap().contains("<p>Body text</p>"));

        let response = send(&t.app, get_request("/api/posts")).await;
        let posts = json_body(response).await;
        assert_eq!(posts.as_array().unwrap().len(), 1);
        assert!(posts[0].get("contentHtml").is_none());

        let tags = json_body(send(&t.app, get_request("/api/tags")).await).await;
        assert_eq!(tags, json!([{"name": "rust", "count": 1}]));
    }

    #[tokio::test]
    async fn test_create_requires_session() {
        let t = test_app();
        let body = json!({"title": "T", "slug": "s", "content": "x"});

        let response = send(&t.app, json_request("POST", "/api/posts", body.clone(), None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(
            &t.app,
            json_request("POST", "/api/posts", body, Some("admin-token=forged")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(t.posts.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_error_statuses() {
        let t = test_app();
        let cookie = login(&t.app).await;

        let bad_slug = json!({"title": "T", "slug": "Bad Slug", "content": "x"});
        let response = send(
            &t.app,
            json_request("POST", "/api/posts", bad_slug, Some(&cookie)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["message"]
            .as_str()
            .unwrap()
            .contains("lowercase"));

        let post = json!({"title": "T", "slug": "dup", "content": "x"});
        let response = send(
            &t.app,
            json_request("POST", "/api/posts", post.clone(), Some(&cookie)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let response = send(
            &t.app,
            json_request("POST", "/api/posts", post, Some(&cookie)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let t = test_app();
        let response = send(
            &t.app,
            json_request("POST", "/api/auth/login", json!({"password": "nope"}), None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_verify_and_logout() {
        let t = test_app();

        let response = send(&t.app, get_request("/api/auth/verify")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["authenticated"], false);

        let cookie = login(&t.app).await;
        let request = Request::builder()
            .uri("/api/auth/verify")
            .header(header::COOKIE, &cookie)
            .body(Body::empty())
            .unwrap();
        let response = send(&t.app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["authenticated"], true);

        let response = send(
            &t.app,
            json_request("POST", "/api/auth/logout", json!({}), Some(&cookie)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let cleared = response.headers().get(header::SET_COOKIE).unwrap();
        assert!(cleared.to_str().unwrap().contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_views() {
        let t = test_app();

        let response = send(&t.app, get_request("/api/posts/hello/views")).await;
        let body = json_body(response).await;
        assert_eq!(body["views"], 0);
        assert!(body["lastViewed"].is_null());

        for expected in 1..=3 {
            let response = send(
                &t.app,
                Request::builder()
                    .method("POST")
                    .uri("/api/posts/hello/views")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(json_body(response).await["views"], expected);
        }

        let response = send(&t.app, get_request("/api/posts/hello/views")).await;
        let body = json_body(response).await;
        assert_eq!(body["views"], 3);
        assert!(body["lastViewed"].is_string());

        let response = send(&t.app, get_request("/api/posts/Not_Valid/views")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_view_requests_are_all_counted() {
        let t = test_app();

        let requests: Vec<_> = (0..20)
            .map(|_| {
                let app = t.app.clone();
                tokio::spawn(async move {
                    let request = Request::builder()
                        .method("POST")
                        .uri("/api/posts/busy/views")
                        .body(Body::empty())
                        .unwrap();
                    send(&app, request).await.status()
                })
            })
            .collect();
        for request in requests {
            assert_eq!(request.await.unwrap(), StatusCode::OK);
        }

        let response = send(&t.app, get_request("/api/posts/busy/views")).await;
        assert_eq!(json_body(response).await["views"], 20);
    }

    #[tokio::test]
    async fn test_missing_post_and_archive() {
        let t = test_app();
        t.posts
            .put("old", "---\ntitle: Old\ndate: 2022-06-01\n---\nold")
            .unwrap();

        let response = send(&t.app, get_request("/api/posts/missing")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(json_body(response).await["message"].is_string());

        let archive = json_body(send(&t.app, get_request("/api/archive")).await).await;
        assert_eq!(archive[0]["year"], 2022);
        assert_eq!(archive[0]["posts"][0]["slug"], "old");
    }

    #[tokio::test]
    async fn test_static_fallback() {
        let t = test_app();
        let response = send(&t.app, get_request("/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<h1>home</h1>");

        let response = send(&t.app, get_request("/nope.css")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
