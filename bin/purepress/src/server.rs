//! Preview server with live reload support

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, Uri, header, uri::Authority},
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use purepress_generator::{Response, Site};
use tokio::sync::broadcast;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};
use tower_http::{services::ServeDir, trace::TraceLayer};

/// Live reload message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadMessage {
    /// Full page reload.
    Reload,
    /// Stylesheet-only reload.
    CssReload,
}

/// Distinct `Host` values that get their own site before falling back to
/// the bind address.
const MAX_HOSTS: usize = 8;

/// Shared state of the preview server.
pub struct ServerState {
    site: Arc<Site>,
    /// Sites keyed by the `Host` they were requested through.
    hosts: Mutex<HashMap<String, Arc<Site>>>,
    /// Broadcast channel for live reload events.
    reload_tx: broadcast::Sender<ReloadMessage>,
    /// Inject the live reload script into HTML responses.
    live_reload: bool,
}

impl ServerState {
    pub fn new(site: Arc<Site>, live_reload: bool) -> Self {
        let (reload_tx, _) = broadcast::channel(16);
        Self {
            site,
            hosts: Mutex::new(HashMap::new()),
            reload_tx,
            live_reload,
        }
    }

    pub fn site(&self) -> &Arc<Site> {
        &self.site
    }

    /// The site with absolute URLs pointing at `host`, so feed links follow
    /// whatever address the browser used.
    pub fn site_for(&self, host: Option<&str>) -> Arc<Site> {
        let Some(host) = host.filter(|host| host.parse::<Authority>().is_ok()) else {
            return Arc::clone(&self.site);
        };
        if host == self.site.urls().host() {
            return Arc::clone(&self.site);
        }

        let Ok(mut hosts) = self.hosts.lock() else {
            return Arc::clone(&self.site);
        };
        if let Some(site) = hosts.get(host) {
            return Arc::clone(site);
        }
        if hosts.len() >= MAX_HOSTS {
            tracing::debug!(host, "too many hosts, using the bind address");
            return Arc::clone(&self.site);
        }

        let site = Arc::new(self.site.with_urls(self.site.urls().with_host(host)));
        hosts.insert(host.to_string(), Arc::clone(&site));
        site
    }

    /// Send a reload notification to all connected clients.
    pub fn notify(&self, message: ReloadMessage) {
        let _ = self.reload_tx.send(message);
    }
}

/// Create the preview router.
///
/// `/static/theme/` and `/static/` are served from disk; every other path
/// goes through [`Site::handle`].
pub fn create_router(state: Arc<ServerState>) -> Router {
    let instance = state.site.instance();
    let static_files = Router::new()
        .nest_service("/theme", ServeDir::new(instance.theme_static_dir()))
        .fallback_service(ServeDir::new(instance.static_dir()));

    Router::new()
        .route("/__livereload", get(livereload_handler))
        .nest("/static", static_files)
        .fallback(site_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Render a path with the site on the blocking pool.
async fn site_handler(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    uri: Uri,
) -> axum::response::Response {
    let path = match urlencoding::decode(uri.path()) {
        Ok(path) => path.into_owned(),
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };

    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok());
    let site = state.site_for(host);
    let rendered = tokio::task::spawn_blocking(move || site.handle(&path)).await;
    match rendered {
        Ok(Ok(response)) => into_http(response, state.live_reload),
        Ok(Err(e)) => {
            tracing::error!(error = %e, path = uri.path(), "failed to render");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{e}\n")).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, path = uri.path(), "render task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn into_http(response: Response, live_reload: bool) -> axum::response::Response {
    let is_html = response.content_type.starts_with("text/html");
    let body = if live_reload && is_html {
        inject_livereload(response.body)
    } else {
        response.body
    };

    let mut http_response = (
        response.status,
        [(header::CONTENT_TYPE, response.content_type)],
        Body::from(body),
    )
        .into_response();
    if let Some(location) = response.location.as_deref() {
        if let Ok(value) = HeaderValue::from_str(location) {
            http_response.headers_mut().insert(header::LOCATION, value);
        }
    }
    http_response
}

/// Insert [`LIVERELOAD_SCRIPT`] before `</body>`, or append it.
fn inject_livereload(body: Vec<u8>) -> Vec<u8> {
    let mut html = match String::from_utf8(body) {
        Ok(html) => html,
        Err(e) => return e.into_bytes(),
    };
    match html.rfind("</body>") {
        Some(pos) => html.insert_str(pos, LIVERELOAD_SCRIPT),
        None => html.push_str(LIVERELOAD_SCRIPT),
    }
    html.into_bytes()
}

/// Server-Sent Events handler for live reload.
async fn livereload_handler(
    State(state): State<Arc<ServerState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let rx = state.reload_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| {
        match msg {
            Ok(ReloadMessage::Reload) => Some(Ok(Event::default().data("reload"))),
            Ok(ReloadMessage::CssReload) => Some(Ok(Event::default().data("css-reload"))),
            Err(_) => None, // lagged
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("ping"),
    )
}

/// JavaScript snippet injected into HTML responses for live reload.
pub const LIVERELOAD_SCRIPT: &str = r#"
<script>
(function() {
    const source = new EventSource('/__livereload');
    source.onmessage = function(event) {
        if (event.data === 'reload') {
            window.location.reload();
        } else if (event.data === 'css-reload') {
            document.querySelectorAll('link[rel="stylesheet"]').forEach(function(link) {
                const href = link.href.split('?')[0];
                link.href = href + '?v=' + Date.now();
            });
        }
    };
    source.onerror = function() {
        console.log('[livereload] Connection lost, retrying...');
    };
})();
</script>
"#;
