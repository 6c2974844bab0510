use std::path::PathBuf;

use clap::Parser;
use mpegps_inspector::inspector::{Options, run};
use mpegps_inspector::report::Reporter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(about = "Demux an MPEG program stream and report per-track statistics")]
struct Opt {
    /// Program stream file to inspect
    path: PathBuf,

    /// Stop each track after this many frames
    #[clap(long)]
    frames: Option<u64>,

    /// Leading bytes fed to the format probe
    #[clap(long, default_value_t = 65536)]
    probe_bytes: u64,

    /// Start demuxing at this byte offset
    #[clap(long)]
    seek: Option<u64>,

    /// Stream id to skip (hex like 0xC0 or decimal), repeatable
    #[clap(long, value_parser = parse_stream_id)]
    ignore: Vec<u8>,
}

fn parse_stream_id(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid stream id {s:?}: {e}"))
}

fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let report = run(Options {
        path: opt.path,
        max_frames: opt.frames,
        probe_bytes: opt.probe_bytes,
        seek: opt.seek,
        ignore: opt.ignore,
    })?;
    println!("{}", Reporter::generate_json_report(&report));
    Ok(())
}
