//! `texspeak describe`: print the spoken description only.

use anyhow::{Context, Result};

use crate::runtime::Runtime;

pub async fn run(runtime: &Runtime, tex: &str, inline: bool) -> Result<()> {
    println!("{}", describe(runtime, tex, inline).await?);
    Ok(())
}

pub async fn describe(runtime: &Runtime, tex: &str, inline: bool) -> Result<String> {
    let engine = runtime
        .engine
        .ensure_ready(&runtime.engine_config)
        .await
        .context("Speech engine failed to initialize")?;
    let structure = runtime
        .converter()
        .parse(tex, !inline)
        .with_context(|| format!("Failed to parse '{tex}'"))?;
    let description = engine.describe(&structure)?;
    Ok(description.into_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::tests::runtime;

    #[tokio::test]
    async fn describes_without_rendering() {
        let text = describe(&runtime(), r"\frac{1}{2}", true).await.unwrap();
        assert_eq!(text, "one half");
    }
}
