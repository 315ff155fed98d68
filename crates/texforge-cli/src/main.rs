//! texforge CLI - compile TeX documents to PDF or DOCX.

mod check;
mod compile;
mod serve;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "texforge")]
#[command(about = "TeX compilation service with diagnostic extraction")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP compile service
    Serve {
        /// Host address to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },

    /// Compile a single document and write the artifact
    Compile {
        /// Path to the source file, or `-` for stdin
        input: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "pdf")]
        format: Format,

        /// Output path (defaults to output.pdf / output.docx)
        #[arg(short, long)]
        output: Option<String>,

        /// Entry filename the engine is pointed at
        #[arg(long, default_value = "main.tex")]
        entry: String,
    },

    /// Verify the external toolchain is reachable
    Check,
}

/// Output format for one-shot compilation.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Pdf,
    Docx,
}

impl From<Format> for texforge_core::OutputKind {
    fn from(format: Format) -> Self {
        match format {
            Format::Pdf => Self::Pdf,
            Format::Docx => Self::Docx,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { host, port } => serve::execute(host, port).await?,

        Commands::Compile {
            input,
            format,
            output,
            entry,
        } => compile::execute(&input, format.into(), output.as_deref(), entry).await?,

        Commands::Check => check::execute()?,
    }

    Ok(())
}
