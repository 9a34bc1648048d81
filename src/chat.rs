//! Terminal front end for a [`Session`]: the `chat` REPL and one-shot `ask`.
//!
//! Progress and errors go to stderr, answers to stdout. A failed question
//! is reported and the loop carries on with the history intact.
//!
//! REPL commands: `/sources` toggles source display, `/history` prints the
//! conversation, `/quit` (or EOF) exits.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::config::Config;
use crate::models::{Answer, Role};
use crate::qa::{Providers, QaSettings};
use crate::session::Session;

/// Build a session from config and index `pdf` into it.
pub async fn open_session(config: &Config, api_key: &str, pdf: &Path) -> Result<Session> {
    let providers = Providers::from_config(config, api_key)?;
    let mut session = Session::new(providers, QaSettings::from(config));

    eprintln!("Processing PDF and creating knowledge base...");
    let info = session.upload_path(pdf).await?;
    eprintln!(
        "PDF indexed ({} pages, {} chunks). You can start chatting now.",
        info.pages, info.chunks
    );
    Ok(session)
}

/// `docqa chat <pdf>`
pub async fn run_chat(config: &Config, api_key: &str, pdf: &Path, show_sources: bool) -> Result<()> {
    let mut session = open_session(config, api_key, pdf).await?;
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    run_repl(&mut session, stdin, &mut stdout, show_sources).await
}

/// `docqa ask <pdf> <question>`
pub async fn run_ask(
    config: &Config,
    api_key: &str,
    pdf: &Path,
    question: &str,
    json: bool,
) -> Result<()> {
    let mut session = open_session(config, api_key, pdf).await?;
    let answer = session.ask(question).await?;

    let mut stdout = std::io::stdout();
    if json {
        writeln!(stdout, "{}", serde_json::to_string_pretty(&answer)?)?;
    } else {
        print_answer(&mut stdout, &answer, true)?;
    }
    Ok(())
}

/// Read questions line by line from `input` until EOF or `/quit`.
pub async fn run_repl<R, W>(
    session: &mut Session,
    input: R,
    out: &mut W,
    mut show_sources: bool,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };
        let line = line.trim();

        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/sources" => {
                show_sources = !show_sources;
                writeln!(out, "sources {}", if show_sources { "on" } else { "off" })?;
                continue;
            }
            "/history" => {
                for turn in session.messages() {
                    let who = match turn.role {
                        Role::User => "you",
                        Role::Assistant => "assistant",
                    };
                    writeln!(out, "[{}] {}: {}", turn.at.format("%H:%M:%S"), who, turn.content)?;
                }
                continue;
            }
            _ => {}
        }

        eprintln!("Thinking...");
        match session.ask(line).await {
            Ok(answer) => print_answer(out, &answer, show_sources)?,
            Err(e) => {
                tracing::warn!(error = %e, "question failed");
                eprintln!("Error: {}", e);
            }
        }
    }

    Ok(())
}

fn print_answer<W: Write>(out: &mut W, answer: &Answer, show_sources: bool) -> Result<()> {
    writeln!(out, "{}", answer.answer.trim())?;
    if show_sources {
        writeln!(out)?;
        for (i, src) in answer.sources.iter().enumerate() {
            let preview: String = src.text.chars().take(160).collect();
            writeln!(
                out,
                "  [{}] page {} (score {:.3}): {}",
                i + 1,
                src.page,
                src.score,
                preview.replace('\n', " ")
            )?;
        }
    }
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashProvider;
    use crate::error::DocqaError;
    use crate::llm::{ChatMessage, ChatModel};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct EchoChat;

    #[async_trait]
    impl ChatModel for EchoChat {
        fn model_name(&self) -> &str {
            "echo"
        }
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _: f32,
        ) -> crate::error::Result<String> {
            Ok(format!("you asked: {}", messages[1].content))
        }
    }

    #[tokio::test]
    async fn test_repl_before_upload_reports_error_and_continues() {
        let providers = Providers {
            embedder: Arc::new(HashProvider::new(32)),
            chat: Arc::new(EchoChat),
        };
        let mut session = Session::new(providers, QaSettings::default());
        let input: &[u8] = b"first?\n/history\n/quit\nnever read\n";
        let mut out = Vec::new();

        run_repl(&mut session, input, &mut out, false).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("you asked"));
        assert!(session.messages().is_empty());
        assert!(matches!(session.ask("x").await, Err(DocqaError::NotReady)));
    }

    #[test]
    fn test_print_answer_with_sources() {
        let answer = Answer {
            answer: "42\n".to_string(),
            sources: vec![crate::models::SourceChunk {
                index: 0,
                page: 3,
                source: "a.pdf".to_string(),
                text: "line one\nline two".to_string(),
                score: 0.5,
            }],
        };
        let mut out = Vec::new();
        print_answer(&mut out, &answer, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("42\n"));
        assert!(text.contains("[1] page 3 (score 0.500): line one line two"));
    }
}
