//! Pipeline description assembly
//!
//! Builds the textual launch description that GStreamer parses into the
//! running pipeline. Every source URI becomes one branch; all branches feed
//! the single named muxer, which feeds the sink.
//!
//! # Format
//!
//! ```text
//! urisourcebin uri=<U0> ! decodebin3 ! <muxer> name=muxer ! <sink>
//! urisourcebin uri=<U1> ! decodebin3 ! muxer.
//! ...
//! ```
//!
//! Fragments are joined by a single space. Only the first branch carries the
//! muxer/sink tail; every later branch routes into the muxer's next free
//! request pad by name. The assembled string is handed to the parser exactly
//! once, after all branches have been added.

use gstreamer as gst;
use gstreamer::prelude::*;

/// Muxer element used when `--muxer` is not given
pub const DEFAULT_MUXER: &str = "multipartmux";

/// Sink element used when `--sink` is not given
pub const DEFAULT_SINK: &str = "fakesink";

/// Source element bound to each URI
pub const SOURCE_ELEMENT: &str = "urisourcebin";

/// Per-branch decode stage
pub const DECODE_ELEMENT: &str = "decodebin3";

/// Name the muxer is registered under inside the description
const MUXER_NAME: &str = "muxer";

/// Builder for the aggregate pipeline description
///
/// Collects source URIs in order and renders them into one launch string.
/// Building is non-destructive; the builder can be rendered again, but the
/// supervisor only ever instantiates the result once.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    muxer: String,
    sink: String,
    uris: Vec<String>,
}

impl GraphBuilder {
    /// Create a builder targeting the given muxer and sink element types
    pub fn new(muxer: impl Into<String>, sink: impl Into<String>) -> Self {
        Self {
            muxer: muxer.into(),
            sink: sink.into(),
            uris: Vec::new(),
        }
    }

    /// Append one source branch for `uri`
    pub fn add_branch(&mut self, uri: impl Into<String>) -> &mut Self {
        self.uris.push(uri.into());
        self
    }

    /// Number of branches added so far
    pub fn branch_count(&self) -> usize {
        self.uris.len()
    }

    /// Render the full description
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NoSources`] when no branch has been added.
    pub fn build(&self) -> Result<String, GraphError> {
        let (first, rest) = self.uris.split_first().ok_or(GraphError::NoSources)?;

        let mut description = format!(
            "{SOURCE_ELEMENT} uri={first} ! {DECODE_ELEMENT} ! {muxer} name={MUXER_NAME} ! {sink}",
            muxer = self.muxer,
            sink = self.sink,
        );
        for uri in rest {
            description.push_str(&format!(
                " {SOURCE_ELEMENT} uri={uri} ! {DECODE_ELEMENT} ! {MUXER_NAME}."
            ));
        }

        Ok(description)
    }
}

/// Parse a description into a live pipeline
///
/// Delegates entirely to GStreamer's launch parser. On failure the error
/// carries the offending description so it can be reported verbatim.
pub fn instantiate(description: &str) -> Result<gst::Pipeline, GraphError> {
    let element = gst::parse::launch_full(description, None, gst::ParseFlags::empty()).map_err(
        |source| GraphError::Parse {
            description: description.to_string(),
            message: source.to_string(),
        },
    )?;

    element
        .downcast::<gst::Pipeline>()
        .map_err(|_| GraphError::NotAPipeline {
            description: description.to_string(),
        })
}

/// Errors raised while assembling or instantiating the pipeline graph
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GraphError {
    #[error("no source branches were added")]
    NoSources,

    #[error("unable to instantiate the pipeline `{description}`: {message}")]
    Parse {
        description: String,
        message: String,
    },

    #[error("description `{description}` did not produce a top-level pipeline")]
    NotAPipeline { description: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_single_branch() {
        let mut builder = GraphBuilder::new(DEFAULT_MUXER, DEFAULT_SINK);
        builder.add_branch("rtsp://host/a");

        assert_eq!(
            builder.build().unwrap(),
            "urisourcebin uri=rtsp://host/a ! decodebin3 ! multipartmux name=muxer ! fakesink"
        );
    }

    #[test]
    fn test_build_two_branches() {
        let mut builder = GraphBuilder::new(DEFAULT_MUXER, DEFAULT_SINK);
        builder.add_branch("A");
        builder.add_branch("B");

        assert_eq!(
            builder.build().unwrap(),
            "urisourcebin uri=A ! decodebin3 ! multipartmux name=muxer ! fakesink \
             urisourcebin uri=B ! decodebin3 ! muxer."
        );
    }

    #[test]
    fn test_build_custom_muxer_and_sink() {
        let mut builder = GraphBuilder::new("matroskamux", "filesink location=out.mkv");
        builder.add_branch("file:///tmp/in.mp4");

        assert_eq!(
            builder.build().unwrap(),
            "urisourcebin uri=file:///tmp/in.mp4 ! decodebin3 ! matroskamux name=muxer \
             ! filesink location=out.mkv"
        );
    }

    #[test]
    fn test_build_empty_is_an_error() {
        let builder = GraphBuilder::new(DEFAULT_MUXER, DEFAULT_SINK);
        assert_eq!(builder.build().unwrap_err(), GraphError::NoSources);
    }

    #[test]
    fn test_branch_counts() {
        let mut builder = GraphBuilder::new(DEFAULT_MUXER, DEFAULT_SINK);
        assert_eq!(builder.branch_count(), 0);

        for n in 1..=4 {
            builder.add_branch(format!("rtsp://host/{n}"));
        }
        assert_eq!(builder.branch_count(), 4);

        let description = builder.build().unwrap();
        assert_eq!(description.matches(SOURCE_ELEMENT).count(), 4);
        assert_eq!(description.matches("name=muxer").count(), 1);
        assert_eq!(description.matches("muxer.").count(), 3);
    }
}
