//! `texspeak batch`: convert a file of expressions, one per line.
//!
//! Blank lines and lines starting with `%` are skipped. Each item's outcome
//! is printed as one JSON line; successful items are written to
//! `<out-dir>/<index>.svg` when an output directory is given.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use texspeak_core::ConversionRequest;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::runtime::Runtime;

#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ItemReport {
    Ok {
        index: usize,
        source: String,
        description: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        file: Option<PathBuf>,
    },
    Error {
        index: usize,
        source: String,
        stage: &'static str,
        error: String,
    },
}

pub async fn run(
    runtime: &Runtime,
    input: &Path,
    out_dir: Option<&Path>,
    inline: bool,
) -> Result<()> {
    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; pending items will be cancelled");
            watcher.cancel();
        }
    });

    let reports = convert_file(runtime, input, out_dir, inline, cancel).await?;
    let failed = reports
        .iter()
        .filter(|r| matches!(r, ItemReport::Error { .. }))
        .count();
    for report in &reports {
        println!("{}", serde_json::to_string(report)?);
    }
    info!(total = reports.len(), failed, "Batch finished");
    if failed > 0 {
        anyhow::bail!("{failed} of {} items failed", reports.len());
    }
    Ok(())
}

pub async fn convert_file(
    runtime: &Runtime,
    input: &Path,
    out_dir: Option<&Path>,
    inline: bool,
    cancel: CancellationToken,
) -> Result<Vec<ItemReport>> {
    let text = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let sources = read_sources(&text);
    if let Some(dir) = out_dir {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let requests: Vec<ConversionRequest> = sources
        .iter()
        .map(|s| crate::convert_cmd::request(s, inline))
        .collect();
    let results = runtime
        .pipeline()
        .convert_batch_with_cancel(requests, cancel)
        .await;

    let mut reports = Vec::with_capacity(results.len());
    for (index, (source, result)) in sources.into_iter().zip(results).enumerate() {
        let report = match result {
            Ok(artifact) => {
                let file = match out_dir {
                    Some(dir) => {
                        let path = dir.join(format!("{index:04}.svg"));
                        tokio::fs::write(&path, artifact.svg())
                            .await
                            .with_context(|| format!("Failed to write {}", path.display()))?;
                        Some(path)
                    }
                    None => None,
                };
                ItemReport::Ok {
                    index,
                    source,
                    description: artifact.description().as_str().to_string(),
                    file,
                }
            }
            Err(e) => ItemReport::Error {
                index,
                source,
                stage: e.stage().as_str(),
                error: e.to_string(),
            },
        };
        reports.push(report);
    }
    Ok(reports)
}

fn read_sources(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('%'))
        .map(ToString::to_string)
        .collect()
}
