//! Preview server with rebuild on change

use anyhow::Result;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode, DebounceEventResult};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::generator::STAGING_PREFIX;
use crate::Site;

/// Server state
struct ServerState {
    dest_dir: PathBuf,
}

/// Serve the destination directory until interrupted
pub async fn start(site: &Site, host: &str, port: u16, watch: bool) -> Result<()> {
    let state = Arc::new(ServerState {
        dest_dir: site.dest_dir.clone(),
    });

    let app = Router::new()
        .fallback(fallback_handler)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    // Parse address - handle "localhost" specially
    let bind_host = if host == "localhost" { "127.0.0.1" } else { host };
    let addr: SocketAddr = format!("{}:{}", bind_host, port).parse()?;

    println!("Server running at http://{}:{}", host, port);
    if watch {
        println!("Watching for changes...");
    }
    println!("Press Ctrl+C to stop.");

    if watch {
        let base_dir = site.base_dir.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = watch_and_rebuild(&base_dir) {
                tracing::error!("File watcher error: {:#}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Rebuild whenever something under the site directory changes
///
/// The configuration is re-read on every rebuild so edits to
/// `_config.yml` take effect without a restart.
fn watch_and_rebuild(base_dir: &Path) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel::<DebounceEventResult>();
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;
    debouncer
        .watcher()
        .watch(base_dir, RecursiveMode::Recursive)?;
    tracing::debug!("Watching: {}", base_dir.display());

    for result in rx {
        let events = match result {
            Ok(events) => events,
            Err(e) => {
                tracing::error!("Watch error: {:?}", e);
                continue;
            }
        };

        // The destination may have moved with a config edit
        let site = Site::new(base_dir);
        let dest_dir = match &site {
            Ok(site) => site.dest_dir.clone(),
            Err(_) => base_dir.join(crate::config::SiteConfig::default().destination),
        };
        let changed: Vec<_> = events
            .iter()
            .filter(|e| is_source_change(&e.path, base_dir, &dest_dir))
            .collect();
        if changed.is_empty() {
            continue;
        }

        for event in &changed {
            tracing::info!("File changed: {}", event.path.display());
        }

        match site.and_then(|site| site.build()) {
            Ok(()) => tracing::info!("Rebuilt successfully"),
            Err(e) => tracing::error!("Build failed: {:#}", e),
        }
    }

    Ok(())
}

/// Whether a changed path is site input rather than build output or noise
fn is_source_change(path: &Path, base_dir: &Path, dest_dir: &Path) -> bool {
    if path.starts_with(dest_dir) {
        return false;
    }
    let relative = path.strip_prefix(base_dir).unwrap_or(path);
    !relative.components().any(|c| {
        let name = c.as_os_str().to_string_lossy();
        name.starts_with(STAGING_PREFIX)
            || name == ".git"
            || name == ".DS_Store"
            || name == "node_modules"
            || name.ends_with('~')
    })
}

/// Serve files from the destination, trying `<path>.html` for extensionless
/// URLs the way permalinks without a trailing slash are written
async fn fallback_handler(State(state): State<Arc<ServerState>>, request: Request<Body>) -> Response {
    let request = match html_fallback(&state.dest_dir, request.uri().path()) {
        Some(path) => {
            let (mut parts, body) = request.into_parts();
            match path.parse::<Uri>() {
                Ok(uri) => parts.uri = uri,
                Err(_) => return (StatusCode::BAD_REQUEST, "Bad request").into_response(),
            }
            Request::from_parts(parts, body)
        }
        None => request,
    };

    let mut service = ServeDir::new(&state.dest_dir).append_index_html_on_directories(true);
    match service.try_call(request).await {
        Ok(response) => response.into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}

/// `/about` -> `/about.html` when only the latter exists
fn html_fallback(dest_dir: &Path, uri_path: &str) -> Option<String> {
    let clean = uri_path.trim_start_matches('/');
    if clean.is_empty() || clean.ends_with('/') || clean.split('/').any(|s| s == "..") {
        return None;
    }
    let candidate = dest_dir.join(clean);
    if candidate.exists() {
        return None;
    }
    let with_html = dest_dir.join(format!("{}.html", clean));
    with_html.is_file().then(|| format!("/{}.html", clean))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_html_fallback() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("2024/09")).unwrap();
        fs::write(dir.path().join("2024/09/hello.html"), "hi").unwrap();
        fs::write(dir.path().join("feed.xml"), "<feed/>").unwrap();

        assert_eq!(
            html_fallback(dir.path(), "/2024/09/hello"),
            Some("/2024/09/hello.html".to_string())
        );
        assert_eq!(html_fallback(dir.path(), "/2024/09/hello.html"), None);
        assert_eq!(html_fallback(dir.path(), "/feed.xml"), None);
        assert_eq!(html_fallback(dir.path(), "/"), None);
        assert_eq!(html_fallback(dir.path(), "/missing"), None);
        assert_eq!(html_fallback(dir.path(), "/../secret"), None);
    }

    #[test]
    fn test_is_source_change() {
        let base = Path::new("/site");
        let dest = Path::new("/site/_site");
        assert!(is_source_change(Path::new("/site/_posts/a.md"), base, dest));
        assert!(is_source_change(Path::new("/site/_config.yml"), base, dest));
        assert!(!is_source_change(Path::new("/site/_site/index.html"), base, dest));
        assert!(!is_source_change(
            Path::new("/site/.blogsmith-staging123/site/index.html"),
            base,
            dest
        ));
        assert!(!is_source_change(Path::new("/site/.git/HEAD"), base, dest));
        assert!(!is_source_change(Path::new("/site/about.md~"), base, dest));
    }
}
