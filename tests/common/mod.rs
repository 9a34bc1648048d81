//! Shared fixtures for integration tests: a hand-built multi-page PDF, stub
//! chat models and a helper that serves a router on an ephemeral port.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use docqa::embedding::{EmbeddingProvider, HashProvider};
use docqa::error::Result;
use docqa::llm::{ChatMessage, ChatModel};
use docqa::qa::{Providers, QaSettings};
use docqa::session::Session;

/// The three pages of the "Apollo" fixture. The budget phrase is on page 2.
pub const APOLLO_PAGES: [&str; 3] = [
    "Introduction to the space program and its history.",
    "Project Apollo budget is $50M",
    "Appendix listing crew rosters and launch windows.",
];

/// Minimal valid PDF with one text line per page.
///
/// Builds the body then the xref table with correct byte offsets so
/// pdf-extract can parse it.
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let n = pages.len();
    let mut objects: Vec<String> = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            (0..n)
                .map(|i| format!("{} 0 R", 4 + 2 * i))
                .collect::<Vec<_>>()
                .join(" "),
            n
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    for (i, text) in pages.iter().enumerate() {
        let escaped = text
            .replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)");
        let stream = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", escaped);
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents {} 0 R /Resources << /Font << /F1 3 0 R >> >> >>",
            5 + 2 * i
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            stream.len(),
            stream
        ));
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for off in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", off).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer << /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_start
        )
        .as_bytes(),
    );
    out
}

pub fn apollo_pdf() -> Vec<u8> {
    pdf_with_pages(&APOLLO_PAGES)
}

/// Answers with a fixed string; optionally sleeps first.
pub struct StubChat {
    pub reply: String,
    pub delay: Duration,
}

impl StubChat {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            delay: Duration::ZERO,
        }
    }
}

#[async_trait]
impl ChatModel for StubChat {
    fn model_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, _messages: &[ChatMessage], _temperature: f32) -> Result<String> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.reply.clone())
    }
}

/// Hash embedder that sleeps before every batch.
pub struct SlowEmbedder {
    pub inner: HashProvider,
    pub delay: Duration,
}

impl SlowEmbedder {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: HashProvider::new(256),
            delay,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for SlowEmbedder {
    fn model_name(&self) -> &str {
        "slow-hash"
    }

    fn dims(&self) -> usize {
        self.inner.dims()
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        tokio::time::sleep(self.delay).await;
        self.inner.embed(texts).await
    }
}

/// A session whose indexing takes at least `delay`.
pub fn slow_session(delay: Duration) -> Session {
    let providers = Providers {
        embedder: Arc::new(SlowEmbedder::new(delay)),
        chat: Arc::new(StubChat::new("slow")),
    };
    Session::new(providers, QaSettings::default())
}

/// A session with the offline hash embedder and the given chat model.
pub fn offline_session(chat: StubChat) -> Session {
    let providers = Providers {
        embedder: Arc::new(HashProvider::new(256)),
        chat: Arc::new(chat),
    };
    Session::new(providers, QaSettings::default())
}

/// Serve `app` on 127.0.0.1 with an OS-assigned port; returns the base URL.
pub async fn spawn_app(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
