//! Output writer
//!
//! Names a finished document, persists it under
//! `{storage_root}/uploads/{category}/` and builds the URL it is served from.
//! All filesystem access goes through a [`DocumentSink`] and the timestamp in
//! the file name comes from a [`Clock`], so both can be swapped in tests.

use crate::config::EngineConfig;
use crate::types::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Top-level directory every category lives under
pub const UPLOADS_DIR: &str = "uploads";

// =============================================================================
// Ports
// =============================================================================

/// Where finished documents are stored
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Make sure a directory exists. Failures are logged, never returned.
    async fn prepare(&self, relative_dir: &Path);

    /// Store `bytes` at `relative`. Nothing is left at the final path when
    /// this fails.
    async fn persist(&self, relative: &Path, bytes: Vec<u8>) -> Result<PathBuf>;
}

/// Source of the timestamp in generated file names
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// =============================================================================
// Filesystem Sink
// =============================================================================

/// Writes under a storage root on the local filesystem
#[derive(Debug, Clone)]
pub struct FileSystemSink {
    root: PathBuf,
}

impl FileSystemSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root picked from the deployment type
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.resolved_storage_root())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl DocumentSink for FileSystemSink {
    async fn prepare(&self, relative_dir: &Path) {
        let dir = self.root.join(relative_dir);
        match tokio::fs::create_dir_all(&dir).await {
            Ok(()) => log::debug!("Output directory ready: {}", dir.display()),
            Err(e) => log::warn!("Could not create {}: {}", dir.display(), e),
        }
    }

    async fn persist(&self, relative: &Path, bytes: Vec<u8>) -> Result<PathBuf> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                log::warn!("Could not create {}: {}", parent.display(), e);
            }
        }

        let partial = partial_path(&path);
        let written = match tokio::fs::write(&partial, &bytes).await {
            Ok(()) => tokio::fs::rename(&partial, &path).await,
            Err(e) => Err(e),
        };

        if let Err(source) = written {
            if let Err(e) = tokio::fs::remove_file(&partial).await {
                log::debug!("No partial file to clean up at {}: {}", partial.display(), e);
            }
            return Err(RenderError::Output { path, source });
        }

        log::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

/// Sibling path the bytes are staged at before the rename
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

// =============================================================================
// Memory Sink
// =============================================================================

/// Keeps documents in memory
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    files: Arc<Mutex<BTreeMap<PathBuf, Vec<u8>>>>,
    directories: Arc<Mutex<Vec<PathBuf>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, relative: &Path) -> Option<Vec<u8>> {
        self.files.lock().await.get(relative).cloned()
    }

    pub async fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().await.keys().cloned().collect()
    }

    pub async fn prepared_directories(&self) -> Vec<PathBuf> {
        self.directories.lock().await.clone()
    }
}

#[async_trait]
impl DocumentSink for MemorySink {
    async fn prepare(&self, relative_dir: &Path) {
        let mut directories = self.directories.lock().await;
        if !directories.iter().any(|d| d == relative_dir) {
            directories.push(relative_dir.to_path_buf());
        }
    }

    async fn persist(&self, relative: &Path, bytes: Vec<u8>) -> Result<PathBuf> {
        self.files.lock().await.insert(relative.to_path_buf(), bytes);
        Ok(relative.to_path_buf())
    }
}

// =============================================================================
// Naming
// =============================================================================

/// What the file name is built from
#[derive(Debug, Clone, Copy)]
pub struct FileNameHint<'a> {
    pub kind: DocumentKind,
    pub number: &'a str,
    pub format: PaperFormat,
    pub copy_label: &'a str,
}

/// `{type}_{number}_{FORMAT}_{COPY}_{millis}.pdf`
pub fn file_name(hint: &FileNameHint<'_>, at: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}_{}_{}.pdf",
        hint.kind.file_prefix(),
        sanitize_segment(hint.number),
        hint.format.label(),
        sanitize_segment(&hint.copy_label.to_ascii_uppercase()),
        at.timestamp_millis()
    )
}

/// Make a document number safe for use in a file name
pub fn sanitize_segment(value: &str) -> String {
    let options = sanitize_filename::Options {
        replacement: "-",
        ..Default::default()
    };
    let cleaned = sanitize_filename::sanitize_with_options(value.trim(), options)
        .replace(char::is_whitespace, "-");
    if cleaned.is_empty() {
        "unnumbered".to_string()
    } else {
        cleaned
    }
}

/// Where a stored document can be fetched from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLocator {
    /// `{base_url}/uploads/{category}/{file_name}`
    pub url: String,
    /// Path relative to the storage root
    pub relative_path: PathBuf,
    pub file_name: String,
    /// Where the sink actually put the bytes
    pub stored_at: PathBuf,
}

// =============================================================================
// Writer
// =============================================================================

#[derive(Clone)]
pub struct OutputWriter {
    sink: Arc<dyn DocumentSink>,
    clock: Arc<dyn Clock>,
    base_url: String,
}

impl std::fmt::Debug for OutputWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputWriter")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OutputWriter {
    pub fn new(base_url: impl Into<String>, sink: Arc<dyn DocumentSink>) -> Self {
        Self {
            sink,
            clock: Arc::new(SystemClock),
            base_url: base_url.into(),
        }
    }

    /// Filesystem sink at the configured root, system clock
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.base_url.clone(), Arc::new(FileSystemSink::from_config(config)))
    }

    pub fn with_sink(mut self, sink: Arc<dyn DocumentSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Create every category directory. Safe to call more than once.
    pub async fn prepare(&self) {
        for kind in [DocumentKind::JobSheet, DocumentKind::Invoice, DocumentKind::Estimate] {
            self.sink.prepare(&category_dir(kind)).await;
        }
    }

    /// Persist a finished document and return its locator
    pub async fn write(&self, hint: &FileNameHint<'_>, bytes: Vec<u8>) -> Result<DocumentLocator> {
        let file_name = file_name(hint, self.clock.now());
        let relative_path = category_dir(hint.kind).join(&file_name);
        let stored_at = self.sink.persist(&relative_path, bytes).await?;

        let url = format!(
            "{}/{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            UPLOADS_DIR,
            hint.kind.category(),
            file_name
        );

        Ok(DocumentLocator {
            url,
            relative_path,
            file_name,
            stored_at,
        })
    }
}

fn category_dir(kind: DocumentKind) -> PathBuf {
    Path::new(UPLOADS_DIR).join(kind.category())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn instant() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_123).unwrap()
    }

    #[test]
    fn test_file_name_pattern() {
        let hint = FileNameHint {
            kind: DocumentKind::Invoice,
            number: "INV/2024/07",
            format: PaperFormat::Thermal2,
            copy_label: "duplicate",
        };
        assert_eq!(
            file_name(&hint, instant()),
            "invoice_INV-2024-07_THERMAL-2_DUPLICATE_1700000000123.pdf"
        );
    }

    #[test]
    fn test_empty_number_gets_placeholder() {
        assert_eq!(sanitize_segment("  "), "unnumbered");
        assert_eq!(sanitize_segment("JS 12"), "JS-12");
    }

    #[test]
    fn test_partial_path_is_sibling() {
        let path = Path::new("/tmp/uploads/invoices/a.pdf");
        assert_eq!(partial_path(path), Path::new("/tmp/uploads/invoices/a.pdf.part"));
    }

    #[tokio::test]
    async fn test_locator_joins_base_url() {
        let sink = MemorySink::new();
        let writer = OutputWriter::new("https://shop.example/", Arc::new(sink.clone()))
            .with_clock(Arc::new(FixedClock(instant())));
        let hint = FileNameHint {
            kind: DocumentKind::JobSheet,
            number: "JS-1",
            format: PaperFormat::A4,
            copy_label: "BOTH",
        };

        let locator = writer.write(&hint, b"%PDF".to_vec()).await.unwrap();
        assert_eq!(
            locator.url,
            "https://shop.example/uploads/jobsheets/jobsheet_JS-1_A4_BOTH_1700000000123.pdf"
        );
        assert_eq!(sink.get(&locator.relative_path).await.unwrap(), b"%PDF");
    }

    #[tokio::test]
    async fn test_prepare_creates_every_category() {
        let sink = MemorySink::new();
        let writer = OutputWriter::new("http://localhost", Arc::new(sink.clone()));
        writer.prepare().await;
        writer.prepare().await;
        assert_eq!(sink.prepared_directories().await.len(), 3);
    }
}
