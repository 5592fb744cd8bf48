//! Content-addressed local store for downloaded payloads.
//!
//! Payloads are streamed into a partial file while being hashed with
//! BLAKE3, then moved to `<root>/<hash>/<base_name><extension>`. Identical
//! content downloaded under two records lands in the same directory.
//!
//! Every resource created or touched during a run is marked live;
//! [`LocalStore::sweep`] removes whatever was not.

use std::error::Error as StdError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use compact_str::CompactString;
use dashmap::DashSet;
use futures::{Stream, StreamExt};
use tokio::io::AsyncWriteExt;

use dropsource_core::{PayloadRef, RemoteFileRequest, ResourceStore, StoreError};

/// Directory under the store root holding in-flight downloads.
const PARTIAL_DIR: &str = ".partial";

/// Timeout for establishing a download connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest pause between two reads of a download before it is abandoned.
/// Total transfer time is not capped.
pub const STALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Resources removed by a sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Number of resource directories removed.
    pub removed: usize,
}

/// Filesystem-backed [`ResourceStore`].
#[derive(Debug)]
pub struct LocalStore {
    root: PathBuf,
    client: reqwest::Client,
    live: DashSet<CompactString>,
    partial_counter: AtomicU64,
}

impl LocalStore {
    /// Create a store rooted at a directory, with a default HTTP client.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let client = client_builder(CONNECT_TIMEOUT, STALL_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self::with_client(root, client)
    }

    /// Create a store using an existing HTTP client.
    pub fn with_client(root: impl Into<PathBuf>, client: reqwest::Client) -> Self {
        Self {
            root: root.into(),
            client,
            live: DashSet::new(),
            partial_counter: AtomicU64::new(0),
        }
    }

    /// Store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check if a resource was created or touched this run.
    pub fn is_live(&self, payload: &PayloadRef) -> bool {
        self.live.contains(&payload.id)
    }

    /// Persist the byte stream of a remote file as a resource.
    pub async fn persist<St, B, E>(
        &self,
        request: &RemoteFileRequest,
        stream: St,
    ) -> Result<PayloadRef, StoreError>
    where
        St: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: StdError,
    {
        let partial_dir = self.root.join(PARTIAL_DIR);
        tokio::fs::create_dir_all(&partial_dir)
            .await
            .map_err(|e| StoreError::io(&partial_dir, e))?;

        let partial = partial_dir.join(format!(
            "{}-{}.part",
            std::process::id(),
            self.partial_counter.fetch_add(1, Ordering::Relaxed)
        ));

        let written = self.write_partial(&request.url, stream, &partial).await;
        let (hash, size) = match written {
            Ok(done) => done,
            Err(err) => {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(err);
            }
        };

        let dir = self.root.join(hash.as_str());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::io(&dir, e))?;
        let target = dir.join(format!(
            "{}{}",
            sanitize_base_name(&request.base_name),
            request.extension
        ));

        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            let _ = tokio::fs::remove_file(&partial).await;
        } else {
            tokio::fs::rename(&partial, &target)
                .await
                .map_err(|e| StoreError::io(&target, e))?;
        }

        self.live.insert(hash.clone());
        Ok(PayloadRef::new(hash, target, size))
    }

    /// Stream into a partial file, returning the hex digest and size.
    async fn write_partial<St, B, E>(
        &self,
        url: &str,
        stream: St,
        partial: &Path,
    ) -> Result<(CompactString, u64), StoreError>
    where
        St: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: StdError,
    {
        let mut file = tokio::fs::File::create(partial)
            .await
            .map_err(|e| StoreError::io(partial, e))?;
        let mut hasher = blake3::Hasher::new();
        let mut size: u64 = 0;

        let mut stream = std::pin::pin!(stream);
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| StoreError::Download {
                url: url.to_string(),
                message: error_chain(&e),
            })?;
            let bytes = chunk.as_ref();
            hasher.update(bytes);
            size += bytes.len() as u64;
            file.write_all(bytes)
                .await
                .map_err(|e| StoreError::io(partial, e))?;
        }
        file.flush().await.map_err(|e| StoreError::io(partial, e))?;

        let hash = hasher.finalize().to_hex();
        Ok((CompactString::new(hash.as_str()), size))
    }

    /// Remove every resource not created or touched since this store was
    /// opened, along with leftover partial downloads.
    pub fn sweep(&self) -> Result<SweepReport, StoreError> {
        let mut report = SweepReport::default();
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(report),
            Err(err) => return Err(StoreError::io(&self.root, err)),
        };

        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.root, e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name == PARTIAL_DIR {
                fs::remove_dir_all(&path).map_err(|e| StoreError::io(&path, e))?;
                continue;
            }
            if self.live.contains(name.as_str()) {
                continue;
            }
            fs::remove_dir_all(&path).map_err(|e| StoreError::io(&path, e))?;
            report.removed += 1;
        }

        tracing::info!(target: "store", removed = report.removed, "swept unused payloads");
        Ok(report)
    }
}

#[async_trait]
impl ResourceStore for LocalStore {
    async fn create_from_remote(
        &self,
        request: RemoteFileRequest,
    ) -> Result<PayloadRef, StoreError> {
        let download_err = |e: reqwest::Error| StoreError::Download {
            url: request.url.clone(),
            message: error_chain(&e),
        };

        let response = self
            .client
            .get(&request.url)
            .send()
            .await
            .map_err(download_err)?
            .error_for_status()
            .map_err(download_err)?;

        self.persist(&request, response.bytes_stream()).await
    }

    fn touch(&self, payload: &PayloadRef) {
        self.live.insert(payload.id.clone());
    }

    async fn is_present(&self, payload: &PayloadRef) -> bool {
        tokio::fs::metadata(&payload.path)
            .await
            .is_ok_and(|meta| meta.is_file())
    }
}

/// HTTP client for downloads: bounded connect and per-read waits, no cap on
/// the whole transfer.
fn client_builder(connect: Duration, stall: Duration) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .connect_timeout(connect)
        .read_timeout(stall)
}

/// Render an error with its source chain, e.g.
/// `error decoding response body: operation timed out`.
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.ends_with(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

/// Keep a base name usable as a single path component.
fn sanitize_base_name(base_name: &str) -> String {
    let cleaned: String = base_name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "file".to_string(),
        _ => cleaned,
    }
}
