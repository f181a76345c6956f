//! Preview command - serves the site straight from the instance

use std::{path::Path, sync::Arc, time::Duration};

use color_eyre::eyre::{Result, WrapErr};
use colored::Colorize;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher, event::ModifyKind};
use purepress_core::SiteUrls;
use purepress_generator::Site;
use tokio::{net::TcpListener, sync::mpsc};

use super::load_instance;
use crate::server::{ReloadMessage, ServerState, create_router};

/// Debounce interval for file changes.
const DEBOUNCE_MS: u64 = 200;

/// Options of the preview command.
#[derive(Debug, Clone)]
pub struct PreviewOptions {
    pub host: String,
    pub port: u16,
    /// Watch the instance and push live reloads.
    pub debug: bool,
    /// Open the site in a browser once listening.
    pub open: bool,
}

/// Run the preview command.
///
/// Every request is rendered from disk, so edits show up on the next
/// reload; in debug mode the browser is told to reload on its own.
pub async fn run(root: &Path, options: PreviewOptions) -> Result<()> {
    tracing::info!(root = %root.display(), ?options, "Starting preview");

    let (instance, config) = load_instance(root)?;
    let addr = format!("{}:{}", options.host, options.port);
    let urls = SiteUrls::new("http", addr.clone(), "/");
    let site = Arc::new(Site::new(config, instance, urls, false));
    let state = Arc::new(ServerState::new(Arc::clone(&site), options.debug));

    let watcher = if options.debug {
        Some(spawn_watcher(site.instance().watched_dirs(), Arc::clone(&state))?)
    } else {
        None
    };

    let app = create_router(state);
    let listener = TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("Failed to bind to {addr}"))?;

    println!();
    println!("  Preview server running at {}", format!("http://{addr}/").green());
    if options.debug {
        println!("  Live reload enabled");
    }
    println!("  Press Ctrl+C to stop");
    println!();

    if options.open {
        if let Err(e) = open::that(format!("http://{addr}/")) {
            tracing::warn!(error = %e, "failed to open browser");
        }
    }

    // Keep watcher alive
    let _watcher = watcher;

    axum::serve(listener, app).await.wrap_err("Server error")?;

    Ok(())
}

/// Watch content directories and broadcast reloads, debounced.
fn spawn_watcher(
    dirs: Vec<std::path::PathBuf>,
    state: Arc<ServerState>,
) -> Result<RecommendedWatcher> {
    let (tx, mut rx) = mpsc::channel::<ReloadMessage>(16);

    let mut watcher = RecommendedWatcher::new(
        move |res: std::result::Result<notify::Event, notify::Error>| {
            if let Ok(event) = res {
                if let Some(message) = reload_message(&event) {
                    let _ = tx.blocking_send(message);
                }
            }
        },
        notify::Config::default(),
    )
    .wrap_err("Failed to create file watcher")?;

    for dir in dirs.iter().filter(|dir| dir.exists()) {
        watcher
            .watch(dir, RecursiveMode::Recursive)
            .wrap_err_with(|| format!("Failed to watch {}", dir.display()))?;
        tracing::debug!(dir = %dir.display(), "watching");
    }

    tokio::spawn(async move {
        let quiet = Duration::from_millis(DEBOUNCE_MS);
        while let Some(message) = next_batch(&mut rx, quiet).await {
            tracing::info!(?message, "change detected");
            state.notify(message);
        }
    });

    Ok(watcher)
}

/// Wait for a change, then keep collecting until none arrives for `quiet`.
///
/// A full reload anywhere in the burst wins over CSS reloads. `None` once
/// the watcher is gone.
async fn next_batch(
    rx: &mut mpsc::Receiver<ReloadMessage>,
    quiet: Duration,
) -> Option<ReloadMessage> {
    let mut message = rx.recv().await?;
    while let Ok(Some(next)) = tokio::time::timeout(quiet, rx.recv()).await {
        if next == ReloadMessage::Reload {
            message = ReloadMessage::Reload;
        }
    }
    Some(message)
}

/// What a file system event means for open pages.
fn reload_message(event: &notify::Event) -> Option<ReloadMessage> {
    if !matches!(
        event.kind,
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Name(_) | ModifyKind::Any)
            | EventKind::Create(_)
            | EventKind::Remove(_)
    ) {
        return None;
    }

    let css_only = !event.paths.is_empty()
        && event
            .paths
            .iter()
            .all(|path| path.extension().is_some_and(|ext| ext == "css"));
    Some(if css_only {
        ReloadMessage::CssReload
    } else {
        ReloadMessage::Reload
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use notify::event::{CreateKind, DataChange};

    use super::*;

    fn event(kind: EventKind, path: &str) -> notify::Event {
        notify::Event::new(kind).add_path(PathBuf::from(path))
    }

    #[tokio::test]
    async fn test_burst_collapses_into_one_reload() {
        let (tx, mut rx) = mpsc::channel(16);
        let quiet = Duration::from_millis(20);

        tx.send(ReloadMessage::CssReload).await.unwrap();
        tx.send(ReloadMessage::Reload).await.unwrap();
        tx.send(ReloadMessage::CssReload).await.unwrap();
        assert_eq!(next_batch(&mut rx, quiet).await, Some(ReloadMessage::Reload));

        // A change right after a reload is delivered, not dropped.
        tx.send(ReloadMessage::CssReload).await.unwrap();
        assert_eq!(next_batch(&mut rx, quiet).await, Some(ReloadMessage::CssReload));

        drop(tx);
        assert_eq!(next_batch(&mut rx, quiet).await, None);
    }

    #[test]
    fn test_reload_message() {
        let modify = EventKind::Modify(ModifyKind::Data(DataChange::Content));
        assert_eq!(
            reload_message(&event(modify, "/blog/posts/2021-01-01-x.md")),
            Some(ReloadMessage::Reload)
        );
        assert_eq!(
            reload_message(&event(modify, "/blog/static/site.css")),
            Some(ReloadMessage::CssReload)
        );
        assert_eq!(
            reload_message(&event(EventKind::Create(CreateKind::File), "/blog/pages/a.md")),
            Some(ReloadMessage::Reload)
        );
        assert_eq!(
            reload_message(&event(EventKind::Access(notify::event::AccessKind::Any), "/x.md")),
            None
        );
    }
}
