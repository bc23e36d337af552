//! Holds the current dashboard and reloads it when its source changes.

use framedash_core::config::DocumentSource;
use framedash_core::constants::{MAX_DOCUMENT_SIZE, REMOTE_DOCUMENT_TIMEOUT};
use framedash_core::Dashboard;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::{WebError, WebResult};

/// Debounce window for bursts of file events from one save.
const RELOAD_DEBOUNCE: Duration = Duration::from_millis(200);

/// Shared, reloadable dashboard.
#[derive(Debug)]
pub struct DocumentStore {
    source: DocumentSource,
    current: RwLock<Arc<Dashboard>>,
    client: reqwest::Client,
}

impl DocumentStore {
    /// Load the document from `source`. Fails when the first load fails.
    pub async fn open(source: DocumentSource) -> WebResult<Self> {
        let client = http_client()?;
        let dashboard = fetch_dashboard(&client, &source).await?;
        info!(
            "Loaded dashboard '{}' from {}",
            dashboard.document().title,
            source
        );
        Ok(Self {
            source,
            current: RwLock::new(Arc::new(dashboard)),
            client,
        })
    }

    /// Wrap an already loaded dashboard.
    pub fn with_dashboard(source: DocumentSource, dashboard: Dashboard) -> WebResult<Self> {
        Ok(Self {
            source,
            current: RwLock::new(Arc::new(dashboard)),
            client: http_client()?,
        })
    }

    pub fn source(&self) -> &DocumentSource {
        &self.source
    }

    /// Snapshot of the current dashboard.
    pub async fn current(&self) -> Arc<Dashboard> {
        self.current.read().await.clone()
    }

    /// Reload from the source. On failure the previous dashboard stays.
    pub async fn reload(&self) -> WebResult<()> {
        match fetch_dashboard(&self.client, &self.source).await {
            Ok(dashboard) => {
                let issues = dashboard.document().validate();
                for issue in &issues {
                    warn!("{}", issue);
                }
                *self.current.write().await = Arc::new(dashboard);
                info!("Reloaded dashboard from {}", self.source);
                Ok(())
            }
            Err(e) => {
                error!("Keeping previous dashboard, reload of {} failed: {}", self.source, e);
                Err(e)
            }
        }
    }
}

/// Client used for remote documents, with the fetch timeout applied.
pub fn http_client() -> WebResult<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(REMOTE_DOCUMENT_TIMEOUT))
        .build()?)
}

/// Read and parse the document behind `source`.
pub async fn fetch_dashboard(
    client: &reqwest::Client,
    source: &DocumentSource,
) -> WebResult<Dashboard> {
    let content = fetch_document_text(client, source).await?;
    Ok(Dashboard::from_json(&content)?)
}

/// Raw document text behind `source`, size-checked for remote sources.
pub async fn fetch_document_text(
    client: &reqwest::Client,
    source: &DocumentSource,
) -> WebResult<String> {
    Ok(match source {
        DocumentSource::File(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
            WebError::Document(format!("Failed to read {}: {}", path.display(), e))
        })?,
        DocumentSource::Remote(url) => {
            debug!("Fetching dashboard document from {}", url);
            let response = client.get(url.clone()).send().await?.error_for_status()?;
            if response
                .content_length()
                .is_some_and(|len| len > MAX_DOCUMENT_SIZE as u64)
            {
                return Err(WebError::Document(format!(
                    "{} is larger than {} bytes",
                    url, MAX_DOCUMENT_SIZE
                )));
            }
            response.text().await?
        }
    })
}

/// Keeps the file watcher and its reload task alive.
pub struct DocumentWatcher {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl Drop for DocumentWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Watch a file-backed store and reload on change. Remote sources are not
/// watched and yield `None`.
pub fn spawn_watcher(store: Arc<DocumentStore>) -> WebResult<Option<DocumentWatcher>> {
    let DocumentSource::File(path) = store.source().clone() else {
        return Ok(None);
    };
    let path = std::path::absolute(&path).unwrap_or(path);
    let file_name = path.file_name().map(|n| n.to_os_string());
    let dir = path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<()>();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            let relevant = matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) && event
                .paths
                .iter()
                .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
            if relevant {
                let _ = event_tx.send(());
            }
        }
        Err(e) => warn!("Document watcher error: {}", e),
    })?;
    // editors often replace the file, so watch the directory
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    info!("Watching {} for changes", path.display());

    let task = tokio::spawn(async move {
        while event_rx.recv().await.is_some() {
            tokio::time::sleep(RELOAD_DEBOUNCE).await;
            while event_rx.try_recv().is_ok() {}
            let _ = store.reload().await;
        }
    });

    Ok(Some(DocumentWatcher {
        _watcher: watcher,
        task,
    }))
}
