//! multisrc-launch - multi-source pipeline launcher
//!
//! Decodes any number of source URIs into one muxed sink and supervises the
//! resulting pipeline until end-of-stream, error, or interrupt.
//!
//! # Usage
//!
//! ```bash
//! # Mux two RTSP cameras into the default discard sink
//! multisrc-launch -s rtsp://cam1/stream -s rtsp://cam2/stream
//!
//! # Audio tracks only, into a matroska file
//! multisrc-launch -s file:///tmp/in.mp4 -A -m matroskamux -S "filesink location=out.mkv"
//!
//! # Hold at READY and drive playback from the console
//! multisrc-launch -s rtsp://cam1/stream -i
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use gstreamer as gst;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use multisrc_launch::graph::{self, GraphBuilder, DEFAULT_MUXER, DEFAULT_SINK};
use multisrc_launch::selection::{self, TrackFilter};
use multisrc_launch::supervisor::Supervisor;

/// Decode multiple source URIs into one muxed sink and supervise the pipeline
#[derive(Parser)]
#[command(name = "multisrc-launch")]
#[command(about = "Decode multiple source URIs into one muxed sink and supervise the pipeline")]
struct Args {
    /// Add a source URI (repeatable)
    #[arg(short = 's', long = "source", value_name = "URI")]
    source: Vec<String>,

    /// Muxer element type
    #[arg(short = 'm', long, default_value = DEFAULT_MUXER)]
    muxer: String,

    /// Sink element type
    #[arg(short = 'S', long, default_value = DEFAULT_SINK)]
    sink: String,

    /// Output status information and property notifications
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Select only audio tracks
    #[arg(short = 'A', long)]
    audio_only: bool,

    /// Select only video tracks
    #[arg(short = 'V', long)]
    video_only: bool,

    /// Start the pipeline in READY and drive it from console commands
    #[arg(short = 'i', long)]
    interactive: bool,

    /// Append each source branch this many times
    #[arg(short = 'r', long, default_value_t = 1)]
    repeat: usize,

    /// Property name to suppress from verbose reporting (repeatable)
    #[arg(long = "exclude-prop", value_name = "NAME")]
    exclude_prop: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if args.source.is_empty() {
        // No work to do; print guidance and leave without an error status.
        eprintln!("usage: multisrc-launch --source <URI> [--source <URI> ...]");
        return Ok(());
    }

    gst::init().context("failed to initialize GStreamer")?;

    let mut builder = GraphBuilder::new(args.muxer, args.sink);
    for uri in &args.source {
        for _ in 0..args.repeat {
            builder.add_branch(uri.as_str());
        }
    }
    let description = builder.build()?;
    tracing::debug!("assembled pipeline description: {description}");

    let pipeline = graph::instantiate(&description)?;
    selection::connect_stream_selection(
        &pipeline,
        TrackFilter::new(args.audio_only, args.video_only),
    );

    Supervisor::new(pipeline, args.interactive)
        .with_verbose(args.verbose)
        .with_excluded_properties(args.exclude_prop)
        .run()
        .await?;

    Ok(())
}
