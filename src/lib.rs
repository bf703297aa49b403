//! Supervisory layer for multi-source GStreamer pipelines
//!
//! Builds one pipeline from a list of source URIs, each decoded on its own
//! branch and muxed into a single sink, and manages its lifecycle until
//! end-of-stream, fatal error, or interrupt. All media heavy lifting
//! (demuxing, decoding, clocking, buffering) stays inside GStreamer; this
//! crate only assembles the graph and reacts to what the bus reports.

pub mod buffering;
pub mod console;
pub mod graph;
pub mod selection;
pub mod state;
pub mod supervisor;

pub use graph::{GraphBuilder, GraphError};
pub use selection::TrackFilter;
pub use supervisor::{Supervisor, SupervisorError};
