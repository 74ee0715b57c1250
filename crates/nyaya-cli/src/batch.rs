//! Batch answering: newline-delimited questions in, JSON lines out.
//!
//! Each question runs on the blocking pool against a shared [`Engine`];
//! results are written in input order.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use futures::{StreamExt, stream};
use nyaya_engine::Engine;
use serde_json::json;
use tokio::io::AsyncReadExt;
use tracing::warn;

pub struct BatchStats {
    pub answered: usize,
    pub rejected: usize,
    pub elapsed: Duration,
}

pub async fn run(engine: Arc<Engine>, path: &Path, concurrency: usize) -> anyhow::Result<BatchStats> {
    let start = Instant::now();
    let input = read_input(path).await?;

    // Line numbers are 1-based and count blank lines, which are skipped.
    let questions: Vec<(usize, String)> = input
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim().to_string()))
        .filter(|(_, line)| !line.is_empty())
        .collect();

    let mut answers = stream::iter(questions)
        .map(|(line, question)| {
            let engine = Arc::clone(&engine);
            tokio::task::spawn_blocking(move || {
                let outcome = engine.classify_and_retrieve(&question, None, None);
                (line, question, outcome)
            })
        })
        .buffered(concurrency.max(1));

    let mut out = BufWriter::new(std::io::stdout());
    let mut stats = BatchStats {
        answered: 0,
        rejected: 0,
        elapsed: Duration::ZERO,
    };

    while let Some(joined) = answers.next().await {
        let (line, question, outcome) = joined.context("query task failed")?;
        let record = match outcome {
            Ok(result) => {
                stats.answered += 1;
                json!({ "line": line, "query": question, "result": result })
            }
            Err(err) => {
                stats.rejected += 1;
                warn!(line, error = %err, "question rejected");
                json!({
                    "line": line,
                    "query": question,
                    "error": { "kind": err.kind(), "message": err.to_string() },
                })
            }
        };
        serde_json::to_writer(&mut out, &record)?;
        writeln!(out)?;
    }
    out.flush()?;

    stats.elapsed = start.elapsed();
    Ok(stats)
}

async fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut input = String::new();
        tokio::io::stdin()
            .read_to_string(&mut input)
            .await
            .context("reading questions from stdin")?;
        return Ok(input);
    }
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))
}
