//! rack - terminal demo of the Bernoulli gate driving the envelope generator
//!
//! Run with: cargo run --bin rack -- --patch rack.json

mod app;
mod ui;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use app::Rack;

#[derive(Debug, Parser)]
#[command(name = "rack", about = "Bernoulli gate into a buffered envelope generator")]
struct Args {
    /// Patch file loaded at start and saved on quit
    #[arg(long)]
    patch: Option<PathBuf>,

    /// Render the generator through the wavetable bank
    #[arg(long)]
    wavetable: bool,

    /// Tempo of the internal clock feeding the gate
    #[arg(long, default_value_t = 120.0)]
    clock_bpm: f32,

    /// Seed for the coin tosses (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Initial threshold of both gate channels
    #[arg(long, default_value_t = 0.5)]
    threshold: f32,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    // The TUI owns stdout.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    Rack::new()
        .patch(args.patch)
        .wavetable(args.wavetable)
        .clock_bpm(args.clock_bpm)
        .seed(args.seed)
        .threshold(args.threshold)
        .run()
}
