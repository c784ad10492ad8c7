//! Sequential batch processing of NF-e files.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{NfeError, Result};
use crate::invoice::{ItemExtractor, NfeExtractor};
use crate::models::item::{FileError, InvoiceItem};

/// A named document that can be loaded into memory.
pub trait DocumentSource {
    /// Name reported in progress and errors.
    fn name(&self) -> String;

    /// Load the raw document bytes.
    fn read(&self) -> std::io::Result<Vec<u8>>;
}

impl DocumentSource for Path {
    fn name(&self) -> String {
        self.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.display().to_string())
    }

    fn read(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(self)
    }
}

impl DocumentSource for PathBuf {
    fn name(&self) -> String {
        self.as_path().name()
    }

    fn read(&self) -> std::io::Result<Vec<u8>> {
        self.as_path().read()
    }
}

/// A document already held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryDocument {
    pub name: String,
    pub content: Vec<u8>,
}

impl InMemoryDocument {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

impl DocumentSource for InMemoryDocument {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn read(&self) -> std::io::Result<Vec<u8>> {
        Ok(self.content.clone())
    }
}

/// Position of the batch when a file starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    /// 1-based index of the current file.
    pub index: usize,
    pub total: usize,
    pub file_name: String,
}

impl std::fmt::Display for BatchProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Processing {} of {}: {}", self.index, self.total, self.file_name)
    }
}

/// Cooperative cancellation flag, checked between files.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Items and errors accumulated over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Items of every successfully parsed file, in input order.
    pub items: Vec<InvoiceItem>,
    /// One entry per failed file, in input order.
    pub errors: Vec<FileError>,
    /// Number of files attempted.
    pub files_processed: usize,
    /// The run stopped early because cancellation was requested.
    pub cancelled: bool,
}

impl BatchOutcome {
    /// Human-readable summary of the run.
    pub fn status_message(&self) -> String {
        if self.cancelled {
            format!(
                "Processing cancelled after {} files. {} items found.",
                self.files_processed,
                self.items.len()
            )
        } else {
            format!("Processing finished. {} items found.", self.items.len())
        }
    }
}

/// Runs an extractor over documents one at a time.
pub struct BatchProcessor<E = NfeExtractor> {
    extractor: E,
    cancellation: Option<CancellationToken>,
}

impl BatchProcessor<NfeExtractor> {
    /// Create a processor with the default NF-e extractor.
    pub fn new() -> Self {
        Self::with_extractor(NfeExtractor::new())
    }
}

impl Default for BatchProcessor<NfeExtractor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ItemExtractor> BatchProcessor<E> {
    pub fn with_extractor(extractor: E) -> Self {
        Self {
            extractor,
            cancellation: None,
        }
    }

    /// Stop between files once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Process every source in order. A failing file is recorded and skipped.
    pub fn run<S, F>(&self, sources: &[S], mut on_progress: F) -> BatchOutcome
    where
        S: DocumentSource,
        F: FnMut(&BatchProgress),
    {
        let total = sources.len();
        let mut outcome = BatchOutcome::default();
        info!("Processing {} files", total);

        for (i, source) in sources.iter().enumerate() {
            if self.cancellation.as_ref().is_some_and(|t| t.is_cancelled()) {
                info!("Batch cancelled after {} of {} files", i, total);
                outcome.cancelled = true;
                break;
            }

            let file_name = source.name();
            on_progress(&BatchProgress {
                index: i + 1,
                total,
                file_name: file_name.clone(),
            });

            match self.process_one(source) {
                Ok(items) => outcome.items.extend(items),
                Err(e) => {
                    warn!("Failed to process {}: {}", file_name, e);
                    outcome.errors.push(FileError::new(file_name, e.to_string()));
                }
            }
            outcome.files_processed += 1;
        }

        info!(
            "Batch complete: {} items, {} failed files",
            outcome.items.len(),
            outcome.errors.len()
        );
        outcome
    }

    fn process_one<S: DocumentSource>(&self, source: &S) -> Result<Vec<InvoiceItem>> {
        let bytes = source.read().map_err(NfeError::Read)?;
        self.extractor.extract_bytes(&bytes)
    }
}
