use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ytsum",
    about = "HTTP service that summarizes YouTube videos via Gemini",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Address to bind (overrides the config file)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to the config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log debug output for this crate
    #[arg(short, long)]
    pub verbose: bool,
}
