//! Logo resolution
//!
//! A logo reference may be an absolute path, a web path, a URL, or absent.
//! Candidates are probed in a fixed order and each one must pass file and
//! byte-signature validation before it is accepted. Remote URLs are never
//! fetched; only their file name is looked up locally.

use crate::config::EngineConfig;
use crate::constants::{JPEG_SIGNATURE, MAX_LOGO_BYTES, PNG_SIGNATURE};
use regex::Regex;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

static DRIVE_LETTER_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]:[\\/]").expect("static regex"));

// =============================================================================
// Observation
// =============================================================================

/// Why a candidate path was accepted or rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateOutcome {
    Accepted,
    Missing,
    NotAFile,
    Empty,
    TooLarge(u64),
    BadSignature,
    Unreadable(String),
}

/// One decision made while walking the fallback chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionEvent {
    Candidate {
        path: PathBuf,
        outcome: CandidateOutcome,
    },
    /// A URL reference whose remote copy was deliberately not fetched
    RemoteNotFetched { url: String },
    /// Every candidate failed; the logo region will be left out
    Unresolved { reference: Option<String> },
}

/// Receives resolution decisions as they happen
pub trait ResolutionObserver: Send + Sync {
    fn observe(&self, event: &ResolutionEvent);
}

/// Forwards decisions to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ResolutionObserver for LogObserver {
    fn observe(&self, event: &ResolutionEvent) {
        match event {
            ResolutionEvent::Candidate { path, outcome } => {
                log::debug!("Logo candidate {}: {:?}", path.display(), outcome);
            }
            ResolutionEvent::RemoteNotFetched { url } => {
                log::debug!("Logo URL {url} not fetched, searching local copies");
            }
            ResolutionEvent::Unresolved { reference } => {
                log::debug!("No usable logo for {:?}", reference);
            }
        }
    }
}

/// Keeps every decision in memory, for tests and tracing
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<ResolutionEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ResolutionEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Candidate paths in the order they were probed
    pub fn probed_paths(&self) -> Vec<PathBuf> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ResolutionEvent::Candidate { path, .. } => Some(path),
                _ => None,
            })
            .collect()
    }
}

impl ResolutionObserver for RecordingObserver {
    fn observe(&self, event: &ResolutionEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

// =============================================================================
// Search Roots
// =============================================================================

/// Directories consulted by the fallback chain
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRoots {
    pub logos_directory: PathBuf,
    /// Web root that relative web paths are served from
    pub public_directory: PathBuf,
    pub uploads_directory: PathBuf,
    pub app_root: PathBuf,
    pub default_logo: PathBuf,
}

impl SearchRoots {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            logos_directory: config.logos_directory.clone(),
            public_directory: config.public_directory.clone(),
            uploads_directory: config.resolved_storage_root().join("uploads"),
            app_root: config.app_root.clone(),
            default_logo: config.default_logo_path(),
        }
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Turns a logo reference into a validated local image path
#[derive(Clone)]
pub struct AssetResolver {
    roots: SearchRoots,
    observer: Arc<dyn ResolutionObserver>,
}

impl std::fmt::Debug for AssetResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetResolver")
            .field("roots", &self.roots)
            .finish_non_exhaustive()
    }
}

impl AssetResolver {
    pub fn new(roots: SearchRoots) -> Self {
        Self {
            roots,
            observer: Arc::new(LogObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ResolutionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn roots(&self) -> &SearchRoots {
        &self.roots
    }

    /// Resolve a logo reference. Returns `None` when no candidate validates;
    /// callers leave the logo region empty in that case.
    pub fn resolve(&self, logo_ref: Option<&str>) -> Option<PathBuf> {
        let reference = logo_ref.map(str::trim).filter(|r| !r.is_empty());

        if let Some(url) = reference.filter(|r| is_remote(r)) {
            self.observer.observe(&ResolutionEvent::RemoteNotFetched {
                url: url.to_string(),
            });
        }

        for candidate in self.candidates(reference) {
            let outcome = validate_image_file(&candidate);
            let accepted = outcome == CandidateOutcome::Accepted;
            self.observer.observe(&ResolutionEvent::Candidate {
                path: candidate.clone(),
                outcome,
            });
            if accepted {
                return Some(candidate);
            }
        }

        self.observer.observe(&ResolutionEvent::Unresolved {
            reference: reference.map(str::to_string),
        });
        None
    }

    /// The ordered list of paths that `resolve` probes for a reference
    pub fn candidates(&self, logo_ref: Option<&str>) -> Vec<PathBuf> {
        let roots = &self.roots;
        let reference = match logo_ref.map(str::trim).filter(|r| !r.is_empty()) {
            Some(reference) => reference,
            None => return vec![roots.default_logo.clone()],
        };

        let mut candidates = Vec::new();

        if is_remote(reference) {
            if let Some(file_name) = url_file_name(reference) {
                candidates.push(roots.logos_directory.join(file_name));
            }
        } else if DRIVE_LETTER_PATH.is_match(reference) {
            candidates.push(PathBuf::from(reference));
        } else {
            let cleaned = reference
                .replace('\\', "/")
                .trim_start_matches('/')
                .to_string();
            let escapes_root = Path::new(&cleaned)
                .components()
                .any(|component| matches!(component, Component::ParentDir));

            if escapes_root {
                log::warn!("Ignoring logo path outside its root: {reference}");
            } else {
                if let Some(file_name) = Path::new(&cleaned).file_name() {
                    candidates.push(roots.logos_directory.join(file_name));
                }
                candidates.push(roots.public_directory.join(&cleaned));
                let under_uploads = cleaned.strip_prefix("uploads/").unwrap_or(&cleaned);
                candidates.push(roots.uploads_directory.join(under_uploads));
                candidates.push(roots.app_root.join(&cleaned));
            }
        }

        candidates.push(roots.default_logo.clone());
        dedup_in_order(candidates)
    }
}

fn is_remote(reference: &str) -> bool {
    let lower = reference.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Last non-empty path segment of a URL
fn url_file_name(reference: &str) -> Option<String> {
    let parsed = url::Url::parse(reference).ok()?;
    parsed
        .path_segments()?
        .rev()
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

fn dedup_in_order(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut unique: Vec<PathBuf> = Vec::with_capacity(paths.len());
    for path in paths {
        if !unique.contains(&path) {
            unique.push(path);
        }
    }
    unique
}

/// Check that a path is a non-empty regular file no larger than 10MB whose
/// first bytes carry a PNG or JPEG signature
pub fn validate_image_file(path: &Path) -> CandidateOutcome {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return CandidateOutcome::Missing,
        Err(e) => return CandidateOutcome::Unreadable(e.to_string()),
    };

    if !metadata.is_file() {
        return CandidateOutcome::NotAFile;
    }

    let size = metadata.len();
    if size == 0 {
        return CandidateOutcome::Empty;
    }
    if size > MAX_LOGO_BYTES {
        return CandidateOutcome::TooLarge(size);
    }

    let mut header = Vec::with_capacity(PNG_SIGNATURE.len());
    let read = File::open(path).and_then(|file| {
        file.take(PNG_SIGNATURE.len() as u64)
            .read_to_end(&mut header)
    });
    if let Err(e) = read {
        return CandidateOutcome::Unreadable(e.to_string());
    }

    if header.starts_with(&PNG_SIGNATURE) || header.starts_with(&JPEG_SIGNATURE) {
        CandidateOutcome::Accepted
    } else {
        CandidateOutcome::BadSignature
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn roots() -> SearchRoots {
        SearchRoots {
            logos_directory: PathBuf::from("/srv/logos"),
            public_directory: PathBuf::from("/srv/public"),
            uploads_directory: PathBuf::from("/srv/storage/uploads"),
            app_root: PathBuf::from("/srv/app"),
            default_logo: PathBuf::from("/srv/logos/default-logo.png"),
        }
    }

    #[test]
    fn test_absent_reference_uses_default() {
        let resolver = AssetResolver::new(roots());
        assert_eq!(
            resolver.candidates(None),
            vec![PathBuf::from("/srv/logos/default-logo.png")]
        );
        assert_eq!(resolver.candidates(Some("  ")), resolver.candidates(None));
    }

    #[test]
    fn test_url_reference_probes_local_logo_dir() {
        let resolver = AssetResolver::new(roots());
        let candidates = resolver.candidates(Some("https://cdn.example.com/img/acme.png?v=3"));
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/srv/logos/acme.png"),
                PathBuf::from("/srv/logos/default-logo.png"),
            ]
        );
    }

    #[test]
    fn test_drive_letter_reference_probed_directly() {
        let resolver = AssetResolver::new(roots());
        let candidates = resolver.candidates(Some(r"C:\shop\logo.jpg"));
        assert_eq!(candidates[0], PathBuf::from(r"C:\shop\logo.jpg"));
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn test_relative_reference_chain_order() {
        let resolver = AssetResolver::new(roots());
        let candidates = resolver.candidates(Some("/uploads/logos/acme.png"));
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/srv/logos/acme.png"),
                PathBuf::from("/srv/public/uploads/logos/acme.png"),
                PathBuf::from("/srv/storage/uploads/logos/acme.png"),
                PathBuf::from("/srv/app/uploads/logos/acme.png"),
                PathBuf::from("/srv/logos/default-logo.png"),
            ]
        );
    }

    #[test]
    fn test_backslash_web_path_is_normalized() {
        let resolver = AssetResolver::new(roots());
        let candidates = resolver.candidates(Some(r"\uploads\logos\acme.png"));
        assert_eq!(candidates[0], PathBuf::from("/srv/logos/acme.png"));
    }

    #[test]
    fn test_parent_dir_reference_only_probes_default() {
        let resolver = AssetResolver::new(roots());
        let default = vec![PathBuf::from("/srv/logos/default-logo.png")];
        assert_eq!(resolver.candidates(Some("/uploads/../../etc/passwd.png")), default);
        assert_eq!(resolver.candidates(Some(r"logos\..\secret.png")), default);
    }
}
