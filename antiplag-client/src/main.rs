use antiplag_client::{
    ClientConfig, DEFAULT_ENDPOINT, HttpAnalysisApi, Phase, SelectedFile, UploadState,
};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(
    name = "antiplag-check",
    version,
    about = "Ask the AntiPlag service how likely a PDF is AI generated"
)]
struct Cli {
    /// PDF document to analyze
    file: PathBuf,

    #[arg(
        long,
        env = "ANTIPLAG_ENDPOINT",
        default_value = DEFAULT_ENDPOINT,
        help = "AntiPlag server base URL"
    )]
    endpoint: String,

    #[arg(long, help = "Declared media type (default: guessed from the file extension)")]
    media_type: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::WARN.into()))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let file = SelectedFile::from_path(&cli.file, cli.media_type.as_deref())
        .await
        .with_context(|| format!("failed to read {}", cli.file.display()))?;

    let mut state = UploadState::new();
    state.select_file(file)?;
    if !state.can_submit() {
        eprintln!("{}", state.error().unwrap_or_default());
        std::process::exit(1);
    }

    let api = HttpAnalysisApi::new(&ClientConfig::new(cli.endpoint));
    eprintln!("{}", antiplag_client::state::SUBMITTING_LABEL);

    match state.submit(&api).await? {
        Phase::VerdictReady => {
            println!("Final Verdict\n");
            println!("{}", state.verdict().unwrap_or_default());
            Ok(())
        }
        _ => {
            eprintln!("{}", state.error().unwrap_or_default());
            std::process::exit(1);
        }
    }
}
