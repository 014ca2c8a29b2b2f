use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod batch_cmd;
mod convert_cmd;
mod describe_cmd;
mod runtime;

#[derive(Parser)]
#[command(name = "texspeak", about = "TeX math to accessible SVG", version)]
struct Cli {
    /// Config file (defaults to $TEXSPEAK_CONFIG_DIR/config.yaml or ~/.texspeak/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one expression to an annotated SVG
    Convert {
        tex: String,
        /// Typeset in inline (text) style instead of display style
        #[arg(long)]
        inline: bool,
        /// Write the SVG here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Print the spoken description of an expression
    Describe {
        tex: String,
        #[arg(long)]
        inline: bool,
    },
    /// Convert every expression in a file, one per line
    Batch {
        file: PathBuf,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long)]
        inline: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let runtime = runtime::Runtime::load(cli.config.as_deref()).await?;
    runtime.init_logging()?;

    match cli.command {
        Commands::Convert {
            tex,
            inline,
            output,
        } => convert_cmd::run(&runtime, &tex, inline, output.as_deref()).await,
        Commands::Describe { tex, inline } => describe_cmd::run(&runtime, &tex, inline).await,
        Commands::Batch {
            file,
            out_dir,
            inline,
        } => batch_cmd::run(&runtime, &file, out_dir.as_deref(), inline).await,
    }
}
