//! Chat session state.
//!
//! A [`Session`] is the whole mutable state of one conversation with one
//! document. It moves through three phases:
//!
//! ```text
//!  NoDocument ──upload──▶ Indexing ──ok──▶ Ready ──ask──▶ Ready
//!      ▲                     │                │
//!      └───────error─────────┘                │
//!      └──────────────────reset───────────────┘
//! ```
//!
//! Only one document is indexed per session; uploading again requires a
//! [`reset`](Session::reset). The history is append-only until reset.
//!
//! The session is a plain value: the CLI owns one directly and the chat
//! server keeps one behind a mutex.

use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{DocqaError, Result};
use crate::loader::{load_pdf_blocking, looks_like_pdf};
use crate::models::{Answer, DocumentInfo, Turn};
use crate::qa::{Providers, QaSettings, RetrievalQa};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NoDocument,
    Indexing,
    Ready,
}

/// Serializable view of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: String,
    pub phase: Phase,
    pub document: Option<DocumentInfo>,
    pub turns: usize,
}

pub struct Session {
    id: String,
    phase: Phase,
    qa: Option<RetrievalQa>,
    document: Option<DocumentInfo>,
    messages: Vec<Turn>,
    providers: Providers,
    settings: QaSettings,
    temp_dir: Option<PathBuf>,
}

impl Session {
    pub fn new(providers: Providers, settings: QaSettings) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            phase: Phase::NoDocument,
            qa: None,
            document: None,
            messages: Vec::new(),
            providers,
            settings,
            temp_dir: None,
        }
    }

    /// Write upload temp files under `dir` instead of the system temp
    /// directory.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn document(&self) -> Option<&DocumentInfo> {
        self.document.as_ref()
    }

    pub fn messages(&self) -> &[Turn] {
        &self.messages
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id.clone(),
            phase: self.phase,
            document: self.document.clone(),
            turns: self.messages.len(),
        }
    }

    /// Index an uploaded PDF.
    ///
    /// The bytes are written to a temporary `.pdf` file that is removed when
    /// this call returns, whatever the outcome. On failure the session is
    /// back in [`Phase::NoDocument`] with nothing indexed. The same holds
    /// when the returned future is dropped before it completes.
    pub async fn upload(&mut self, filename: &str, bytes: &[u8]) -> Result<DocumentInfo> {
        if self.phase == Phase::Ready {
            return Err(DocqaError::AlreadyIndexed);
        }
        if !filename.to_ascii_lowercase().ends_with(".pdf") || !looks_like_pdf(bytes) {
            return Err(DocqaError::Ingestion(format!(
                "{}: only PDF files are accepted",
                filename
            )));
        }

        tracing::info!(session = %self.id, filename, bytes = bytes.len(), "processing upload");
        let guard = IndexingGuard::enter(&mut self.phase);

        let job = UploadJob {
            providers: &self.providers,
            settings: &self.settings,
            temp_dir: self.temp_dir.as_deref(),
        };
        match job.run(filename, bytes).await {
            Ok((qa, info)) => {
                self.qa = Some(qa);
                self.document = Some(info.clone());
                guard.finish();
                tracing::info!(session = %self.id, pages = info.pages, chunks = info.chunks, "document ready");
                Ok(info)
            }
            Err(e) => {
                drop(guard);
                tracing::warn!(session = %self.id, error = %e, "indexing failed");
                Err(e)
            }
        }
    }

    /// Read a PDF from disk and [`upload`](Session::upload) it.
    pub async fn upload_path(&mut self, path: &Path) -> Result<DocumentInfo> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| DocqaError::Ingestion(format!("cannot read {}: {}", path.display(), e)))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.upload(&filename, &bytes).await
    }

    /// Ask a question about the indexed document.
    ///
    /// The question is recorded before the providers are called, so it stays
    /// in the history even when the call fails; the answer is recorded only
    /// on success.
    pub async fn ask(&mut self, question: &str) -> Result<Answer> {
        let qa = self.qa.as_ref().ok_or(DocqaError::NotReady)?;
        let question = question.trim();
        if question.is_empty() {
            return Err(DocqaError::InvalidInput(
                "question must not be empty".to_string(),
            ));
        }

        self.messages.push(Turn::user(question));
        let answer = qa.ask(question).await?;
        self.messages.push(Turn::assistant(answer.answer.clone()));
        Ok(answer)
    }

    /// Drop the index, the document and the history.
    pub fn reset(&mut self) {
        self.qa = None;
        self.document = None;
        self.messages.clear();
        self.phase = Phase::NoDocument;
        tracing::info!(session = %self.id, "session reset");
    }
}

/// Holds the session in [`Phase::Indexing`]. Unless [`finish`] is called,
/// dropping it puts the session back in [`Phase::NoDocument`], which covers
/// both failed uploads and upload futures dropped mid-flight.
///
/// [`finish`]: IndexingGuard::finish
struct IndexingGuard<'a> {
    phase: &'a mut Phase,
    done: bool,
}

impl<'a> IndexingGuard<'a> {
    fn enter(phase: &'a mut Phase) -> Self {
        *phase = Phase::Indexing;
        Self { phase, done: false }
    }

    fn finish(mut self) {
        *self.phase = Phase::Ready;
        self.done = true;
    }
}

impl Drop for IndexingGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            *self.phase = Phase::NoDocument;
        }
    }
}

/// Borrowed inputs of one indexing run, split from the session so the
/// phase can be guarded while they are in use.
struct UploadJob<'a> {
    providers: &'a Providers,
    settings: &'a QaSettings,
    temp_dir: Option<&'a Path>,
}

impl UploadJob<'_> {
    async fn run(&self, filename: &str, bytes: &[u8]) -> Result<(RetrievalQa, DocumentInfo)> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("docqa-").suffix(".pdf");
        let created = match self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        };
        let mut tmp =
            created.map_err(|e| DocqaError::Ingestion(format!("cannot create temp file: {}", e)))?;
        tmp.write_all(bytes)
            .and_then(|_| tmp.flush())
            .map_err(|e| DocqaError::Ingestion(format!("cannot write temp file: {}", e)))?;

        let mut pages = load_pdf_blocking(tmp.path().to_path_buf()).await?;
        for page in &mut pages {
            page.source = filename.to_string();
        }

        let qa = RetrievalQa::build(&pages, self.providers.clone(), self.settings).await?;
        let info = DocumentInfo {
            filename: filename.to_string(),
            pages: pages.len(),
            chunks: qa.index().len(),
        };
        Ok((qa, info))
    }
}
