//! `texspeak convert`: one expression to an accessible SVG.

use std::path::Path;

use anyhow::{Context, Result};
use texspeak_core::ConversionRequest;
use tracing::info;

use crate::runtime::Runtime;

pub async fn run(runtime: &Runtime, tex: &str, inline: bool, output: Option<&Path>) -> Result<()> {
    let request = request(tex, inline);
    let artifact = runtime
        .pipeline()
        .convert(&request)
        .await
        .with_context(|| format!("Failed to convert '{tex}'"))?;

    match output {
        Some(path) => {
            tokio::fs::write(path, artifact.svg())
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Wrote SVG");
            eprintln!("{}", artifact.description());
        }
        None => println!("{}", artifact.svg()),
    }
    Ok(())
}

pub fn request(tex: &str, inline: bool) -> ConversionRequest {
    if inline {
        ConversionRequest::inline(tex)
    } else {
        ConversionRequest::display(tex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::tests::runtime;

    #[tokio::test]
    async fn writes_enriched_svg_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("eq.svg");
        run(&runtime(), "E = mc^2", false, Some(&out)).await.unwrap();
        let svg = std::fs::read_to_string(&out).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"role="img""#));
        assert!(svg.contains("<desc>upper E equals m c squared</desc>"));
    }

    #[tokio::test]
    async fn parse_errors_are_reported() {
        let err = run(&runtime(), r"\frac{1}{2", false, None).await.unwrap_err();
        assert!(format!("{err:#}").contains("unbalanced"));
    }
}
