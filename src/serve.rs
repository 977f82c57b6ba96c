//! Development server with live reload support.
//!
//! A lightweight HTTP server for previewing the build output, built on
//! `tiny_http`:
//!
//! - Static file serving from the output directory
//! - Automatic `index.html` resolution for directories
//! - An `ETag` per file, polled by the injected reload script
//! - File watching and incremental rebuilds (via the `watch` module)
//! - Graceful shutdown on Ctrl+C
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │   Main Thread   │     │  Watcher Thread  │
//! │  (HTTP Server)  │     │ (owns the Site)  │
//! └────────┬────────┘     └────────┬─────────┘
//!          │                       │
//!          ▼                       ▼
//!    Read output dir         Re-render pages
//!          └───────────┬───────────┘
//!                      ▼
//!               output directory
//! ```

use crate::{log, reactor::ChangeReactor, site::Site, watch::watch_for_changes_blocking};
use anyhow::{Context, Result, anyhow};
use std::{
    fs,
    io::Cursor,
    net::{IpAddr, SocketAddr},
    path::{Component, Path, PathBuf},
    sync::Arc,
    time::UNIX_EPOCH,
};
use tiny_http::{Header, Request, Response, Server, StatusCode};

// ============================================================================
// Constants
// ============================================================================

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

// ============================================================================
// Server Entry Point
// ============================================================================

/// Serve the output directory of a built site.
///
/// When `[serve] watch` is enabled, the site moves to a watcher thread that
/// re-renders pages as sources change. Blocks until Ctrl+C is received.
pub fn serve_site(site: Site) -> Result<()> {
    let serve = site.config().serve.clone();
    let serve_root = site.paths().output.clone();

    let interface: IpAddr = serve
        .interface
        .parse()
        .with_context(|| format!("Invalid interface: {}", serve.interface))?;
    let (server, addr) = try_bind_port(interface, serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    // Set up Ctrl+C handler for graceful shutdown
    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{}", addr);

    if serve.watch {
        let reactor = ChangeReactor::new(site);
        std::thread::spawn(move || {
            if let Err(err) = watch_for_changes_blocking(reactor) {
                log!("watch"; "{err:#}");
            }
        });
    }

    // Handle requests in main thread (blocks until Ctrl+C)
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &serve_root) {
            log!("serve"; "request error: {e}");
        }
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        max_retries,
        base_port,
        base_port.saturating_add(max_retries.saturating_sub(1)),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

// ============================================================================
// Request Handling
// ============================================================================

/// Handle a single HTTP request.
fn handle_request(request: Request, serve_root: &Path) -> Result<()> {
    match resolve_request(serve_root, request.url()) {
        Some(path) => serve_file(request, &path),
        None => serve_not_found(request),
    }
}

/// Map a request URL to a file below `serve_root`.
///
/// Resolution order:
/// 1. Exact file match
/// 2. Directory with index.html
///
/// URLs that climb out of the root resolve to nothing.
fn resolve_request(serve_root: &Path, url: &str) -> Option<PathBuf> {
    // Decode URL-encoded characters (e.g., %20 → space)
    let url_path = urlencoding::decode(url)
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    // Strip query string (e.g., ?t=123456) before resolving path
    let path_without_query = url_path.split('?').next().unwrap_or(&url_path);
    let request_path = Path::new(path_without_query.trim_matches('/'));
    if request_path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return None;
    }

    let local_path = serve_root.join(request_path);
    if local_path.is_file() {
        return Some(local_path);
    }

    let index_path = local_path.join("index.html");
    index_path.is_file().then_some(index_path)
}

// ============================================================================
// Response Helpers
// ============================================================================

fn header(name: &str, value: &str) -> Result<Header> {
    Header::from_bytes(name, value).map_err(|()| anyhow!("invalid header {name}: {value}"))
}

/// Serve a file with appropriate content type and an `ETag`.
fn serve_file(request: Request, path: &Path) -> Result<()> {
    let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let content_type = guess_content_type(path);

    let mut response = Response::from_data(content)
        .with_header(header("Content-Type", content_type)?)
        .with_header(header("Cache-Control", "no-cache")?);
    if let Some(etag) = etag(path) {
        response = response.with_header(header("ETag", &etag)?);
    }

    request.respond(response)?;
    Ok(())
}

/// Serve 404 Not Found response.
fn serve_not_found(request: Request) -> Result<()> {
    let response = Response::new(
        StatusCode(404),
        vec![header("Content-Type", "text/plain")?],
        Cursor::new("404 Not Found"),
        Some(13),
        None,
    );
    request.respond(response)?;
    Ok(())
}

/// Entity tag derived from modification time and size.
fn etag(path: &Path) -> Option<String> {
    let meta = fs::metadata(path).ok()?;
    let modified = meta.modified().ok()?.duration_since(UNIX_EPOCH).ok()?;
    Some(format!("\"{:x}-{:x}\"", modified.as_nanos(), meta.len()))
}

// ============================================================================
// Content Type Detection
// ============================================================================

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        // Web content
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",

        // Images
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",

        // Documents
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",

        // Default binary
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn output() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "home").unwrap();
        fs::create_dir_all(dir.path().join("articles/hello world")).unwrap();
        fs::write(dir.path().join("articles/hello world/index.html"), "hi").unwrap();
        fs::write(dir.path().join("site.css"), "body {}").unwrap();
        dir
    }

    #[test]
    fn test_resolve_request() {
        let dir = output();
        let root = dir.path();

        assert_eq!(resolve_request(root, "/"), Some(root.join("index.html")));
        assert_eq!(resolve_request(root, "/site.css?t=1"), Some(root.join("site.css")));
        assert_eq!(
            resolve_request(root, "/articles/hello%20world/"),
            Some(root.join("articles/hello world/index.html"))
        );
        assert_eq!(resolve_request(root, "/articles/"), None);
        assert_eq!(resolve_request(root, "/missing.html"), None);
    }

    #[test]
    fn test_resolve_request_rejects_parent_dirs() {
        let dir = output();
        let inner = dir.path().join("articles");
        assert_eq!(resolve_request(&inner, "/../index.html"), None);
    }

    #[test]
    fn test_etag_changes_with_content() {
        let dir = output();
        let path = dir.path().join("site.css");
        let before = etag(&path).unwrap();
        fs::write(&path, "body { color: red }").unwrap();
        let after = etag(&path).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("a.html")), "text/html; charset=utf-8");
        assert_eq!(guess_content_type(Path::new("feed.xml")), "application/xml; charset=utf-8");
        assert_eq!(guess_content_type(Path::new("blob")), "application/octet-stream");
    }
}
