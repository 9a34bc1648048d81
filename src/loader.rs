//! PDF page loader.
//!
//! Turns a PDF into one [`Page`] per PDF page, in page order. Extraction is
//! done by `pdf-extract`; this module only adds the framing checks and maps
//! every failure to [`DocqaError::Ingestion`].
//!
//! The extractor can panic on some malformed inputs; the panic is caught
//! and reported as an ingestion error, without the panic message reaching
//! stderr. It is also CPU-bound, so async callers go through
//! [`load_pdf_blocking`], which runs it on tokio's blocking pool.

use std::cell::Cell;
use std::panic::UnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Once;

use crate::error::{DocqaError, Result};
use crate::models::Page;

pub const MIME_PDF: &str = "application/pdf";

/// The PDF header may be preceded by junk; readers scan this far for it.
const HEADER_SCAN_BYTES: usize = 1024;
const PDF_MAGIC: &[u8] = b"%PDF-";

thread_local! {
    static QUIET_PANICS: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// Run `f`, mapping a panic to `None`. The panic hook stays silent for
/// panics raised inside `f`; other threads keep the previous hook.
fn catch_quietly<T>(f: impl FnOnce() -> T + UnwindSafe) -> Option<T> {
    QUIET_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if !QUIET_PANICS.with(Cell::get) {
                previous(info);
            }
        }));
    });

    QUIET_PANICS.with(|q| q.set(true));
    let result = std::panic::catch_unwind(f);
    QUIET_PANICS.with(|q| q.set(false));
    result.ok()
}

/// Returns true if `bytes` carries a PDF header near the start.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(HEADER_SCAN_BYTES)];
    head.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
}

/// Load a PDF from disk.
pub fn load_pdf(path: &Path) -> Result<Vec<Page>> {
    let bytes = std::fs::read(path)
        .map_err(|e| DocqaError::Ingestion(format!("cannot read {}: {}", path.display(), e)))?;
    load_pdf_bytes(&bytes, &path.display().to_string())
}

/// Load a PDF from an in-memory buffer. `source` is recorded on every page.
pub fn load_pdf_bytes(bytes: &[u8], source: &str) -> Result<Vec<Page>> {
    if !looks_like_pdf(bytes) {
        return Err(DocqaError::Ingestion(format!("{}: not a PDF file", source)));
    }

    let texts = catch_quietly(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .ok_or_else(|| DocqaError::Ingestion(format!("{}: PDF extraction panicked", source)))?
        .map_err(|e| DocqaError::Ingestion(format!("{}: {}", source, e)))?;

    if texts.is_empty() {
        return Err(DocqaError::Ingestion(format!("{}: PDF has no pages", source)));
    }

    let pages = texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| Page {
            number: i as u32 + 1,
            text,
            source: source.to_string(),
        })
        .collect::<Vec<_>>();

    tracing::debug!(source, pages = pages.len(), "loaded pdf");
    Ok(pages)
}

/// [`load_pdf`] on the blocking pool.
pub async fn load_pdf_blocking(path: PathBuf) -> Result<Vec<Page>> {
    tokio::task::spawn_blocking(move || load_pdf(&path))
        .await
        .map_err(|e| DocqaError::Ingestion(format!("PDF extraction aborted: {}", e)))?
}
