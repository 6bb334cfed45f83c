//! Development server rendering pages on request

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use crate::content::{BodyRenderer, ContentClass, ContentSet, LoadState, Resolved};
use crate::generator::page;
use crate::Site;

/// Server state
struct ServerState {
    site: Site,
    content: watch::Receiver<LoadState>,
    renderer: BodyRenderer,
}

impl ServerState {
    /// The loaded content set, or the page to show instead
    fn ready(&self) -> Result<Arc<ContentSet>, Response> {
        match &*self.content.borrow() {
            LoadState::Ready(set) => Ok(set.clone()),
            LoadState::Loading => Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Html(page::loading_page(&self.site.config)),
            )
                .into_response()),
            LoadState::Failed(_) => Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(page::load_failed_page(&self.site.config)),
            )
                .into_response()),
        }
    }

    fn class_for_route(&self, route: &str) -> Option<ContentClass> {
        self.site.config.class_for_route(route)
    }
}

/// Build the router over a content load in progress
pub fn router(site: &Site, content: watch::Receiver<LoadState>) -> Router {
    let state = Arc::new(ServerState {
        site: site.clone(),
        content,
        renderer: BodyRenderer::new(&site.config),
    });

    Router::new()
        .route("/", get(index_handler))
        .route("/:route", get(listing_handler))
        .route("/:route/", get(listing_handler))
        .route("/:route/:slug", get(detail_handler))
        .route("/:route/:slug/", get(detail_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the development server
pub async fn start(site: &Site, ip: &str, port: u16) -> Result<()> {
    // Pages answer "Loading..." until the bulk load settles
    let content = site.spawn_load();
    let app = router(site, content);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index_handler(State(state): State<Arc<ServerState>>) -> Response {
    let content = match state.ready() {
        Ok(content) => content,
        Err(response) => return response,
    };

    let sections: Vec<_> = ContentClass::ALL
        .into_iter()
        .map(|class| (class, content.catalog(class)))
        .collect();
    Html(page::index_page(&state.site.config, &sections)).into_response()
}

async fn listing_handler(
    State(state): State<Arc<ServerState>>,
    Path(route): Path<String>,
) -> Response {
    let Some(class) = state.class_for_route(&route) else {
        return not_found(&state);
    };
    let content = match state.ready() {
        Ok(content) => content,
        Err(response) => return response,
    };

    let catalog = content.catalog(class);
    Html(page::listing_page(&state.site.config, class, &catalog)).into_response()
}

async fn detail_handler(
    State(state): State<Arc<ServerState>>,
    Path((route, slug)): Path<(String, String)>,
) -> Response {
    let Some(class) = state.class_for_route(&route) else {
        return not_found(&state);
    };
    let content = match state.ready() {
        Ok(content) => content,
        Err(response) => return response,
    };

    match content.resolve(class, &slug) {
        Resolved::Found(doc) => {
            let rendered = state.renderer.render(&doc).await;
            Html(page::detail_page(
                &state.site.config,
                class,
                &slug,
                &doc.metadata,
                &rendered,
            ))
            .into_response()
        }
        Resolved::NotFound => {
            tracing::debug!("No {} for slug {:?}", class.noun().to_lowercase(), slug);
            (
                StatusCode::NOT_FOUND,
                Html(page::not_found_page(&state.site.config, class)),
            )
                .into_response()
        }
    }
}

async fn not_found_handler(State(state): State<Arc<ServerState>>) -> Response {
    not_found(&state)
}

fn not_found(state: &ServerState) -> Response {
    let html = page::layout(
        &state.site.config,
        "Not found",
        "",
        "<div class=\"state-message\">Page not found</div>",
    );
    (StatusCode::NOT_FOUND, Html(html)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use tempfile::TempDir;

    use crate::content::{ContentSource, Format, HtmlOptions, MemorySource};

    fn loaded() -> LoadState {
        let source = MemorySource::new("mem")
            .with_file(
                ContentClass::Posts,
                "hello.md",
                "---\ntitle: Hello\ndate: 2024-01-01\n---\n# Hi",
            )
            .with_file(
                ContentClass::Projects,
                "tool.html",
                "<html><body><article><p>Tool</p></article></body></html>",
            );
        let sources: Vec<Arc<dyn ContentSource>> = vec![Arc::new(source)];
        let set = ContentSet::load(
            &sources,
            &[
                (ContentClass::Posts, Format::Markdown),
                (ContentClass::Projects, Format::Html),
            ],
            HtmlOptions::default(),
        )
        .unwrap();
        LoadState::Ready(Arc::new(set))
    }

    fn state(load: LoadState) -> (Arc<ServerState>, watch::Sender<LoadState>, TempDir) {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();
        let (tx, rx) = watch::channel(load);
        let state = Arc::new(ServerState {
            renderer: BodyRenderer::new(&site.config),
            site,
            content: rx,
        });
        (state, tx, dir)
    }

    async fn read(response: Response) -> (StatusCode, String) {
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn detail(route: &str, slug: &str) -> Path<(String, String)> {
        Path((route.to_string(), slug.to_string()))
    }

    #[tokio::test]
    async fn test_pages() {
        let (state, _tx, _dir) = state(loaded());

        let (status, body) = read(index_handler(State(state.clone())).await).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("/blog/hello/"));

        let (status, body) =
            read(listing_handler(State(state.clone()), Path("blog".to_string())).await).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("January 1, 2024"));

        let (status, body) =
            read(detail_handler(State(state.clone()), detail("blog", "hello")).await).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"<h1 class="blog-post-h1">Hi</h1>"#));

        let (status, body) =
            read(detail_handler(State(state.clone()), detail("projects", "tool")).await).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<p>Tool</p>"));
    }

    #[tokio::test]
    async fn test_not_found() {
        let (state, _tx, _dir) = state(loaded());

        let (status, body) =
            read(detail_handler(State(state.clone()), detail("blog", "missing")).await).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Post not found"));

        let (status, _) =
            read(listing_handler(State(state), Path("about".to_string())).await).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_loading_then_ready() {
        let (state, tx, _dir) = state(LoadState::Loading);

        let (status, body) =
            read(detail_handler(State(state.clone()), detail("blog", "hello")).await).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.contains("Loading..."));

        tx.send(loaded()).unwrap();
        let (status, _) = read(detail_handler(State(state), detail("blog", "hello")).await).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_failed_load() {
        let (state, _tx, _dir) = state(LoadState::Failed("boom".to_string()));
        let (status, body) = read(index_handler(State(state)).await).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("Content could not be loaded."));
    }

    #[test]
    fn test_router_builds() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();
        let (_tx, rx) = watch::channel(LoadState::Loading);
        let _app = router(&site, rx);
    }
}
