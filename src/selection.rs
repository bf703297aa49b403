//! Elementary stream selection
//!
//! Each `decodebin3` in the pipeline asks, once per discovered stream,
//! whether to instantiate a decoder for it. With no filter requested every
//! stream is accepted; with a filter, every stream of a requested type is
//! selected (not merely the first match) and the rest are deselected so
//! their decoders are never built.

use gstreamer as gst;
use gstreamer::prelude::*;

use crate::graph::DECODE_ELEMENT;

/// Answer to a `select-stream` query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionDecision {
    /// Let the element apply its own default (accept)
    Default,

    /// Activate the stream
    Select,

    /// Skip the stream; no decoder is instantiated for it
    Deselect,
}

impl SelectionDecision {
    /// The integer convention the `select-stream` signal expects
    pub fn signal_result(self) -> i32 {
        match self {
            SelectionDecision::Default => -1,
            SelectionDecision::Select => 1,
            SelectionDecision::Deselect => 0,
        }
    }
}

/// User-requested restriction on which stream types get decoded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackFilter {
    audio: bool,
    video: bool,
}

impl TrackFilter {
    pub fn new(audio_only: bool, video_only: bool) -> Self {
        Self {
            audio: audio_only,
            video: video_only,
        }
    }

    /// True when no restriction was requested (pass-through)
    pub fn is_unrestricted(&self) -> bool {
        !self.audio && !self.video
    }

    /// Decide one stream's fate from its type tag
    pub fn decide(&self, stream_type: gst::StreamType) -> SelectionDecision {
        if self.is_unrestricted() {
            return SelectionDecision::Default;
        }
        if self.video && stream_type == gst::StreamType::VIDEO {
            SelectionDecision::Select
        } else if self.audio && stream_type == gst::StreamType::AUDIO {
            SelectionDecision::Select
        } else {
            SelectionDecision::Deselect
        }
    }
}

/// Wire `filter` to every decode stage in the instantiated pipeline
///
/// Recurses through the bin and connects the `select-stream` signal on each
/// element built from the decode factory. Must run before the pipeline
/// leaves Null, i.e. before any stream is discovered.
pub fn connect_stream_selection(pipeline: &gst::Pipeline, filter: TrackFilter) {
    let mut elements = pipeline.iterate_recurse();
    loop {
        match elements.next() {
            Ok(Some(element)) => {
                let is_decoder = element
                    .factory()
                    .is_some_and(|factory| factory.name() == DECODE_ELEMENT);
                if !is_decoder {
                    continue;
                }
                element.connect("select-stream", false, move |values| {
                    // (element, collection, stream) -> gint
                    let stream = values.get(2).and_then(|v| v.get::<gst::Stream>().ok());
                    let decision = match stream {
                        Some(ref stream) => {
                            let decision = filter.decide(stream.stream_type());
                            tracing::debug!(
                                "select-stream: {:?} stream -> {:?}",
                                stream.stream_type(),
                                decision
                            );
                            decision
                        }
                        None => SelectionDecision::Default,
                    };
                    Some(decision.signal_result().to_value())
                });
            }
            Ok(None) => break,
            Err(gst::IteratorError::Resync) => elements.resync(),
            Err(gst::IteratorError::Error) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_filter_accepts_everything() {
        let filter = TrackFilter::new(false, false);

        assert_eq!(
            filter.decide(gst::StreamType::AUDIO),
            SelectionDecision::Default
        );
        assert_eq!(
            filter.decide(gst::StreamType::VIDEO),
            SelectionDecision::Default
        );
        assert_eq!(
            filter.decide(gst::StreamType::TEXT),
            SelectionDecision::Default
        );
    }

    #[test]
    fn test_audio_only_selects_every_audio_stream() {
        let filter = TrackFilter::new(true, false);

        assert_eq!(
            filter.decide(gst::StreamType::AUDIO),
            SelectionDecision::Select
        );
        // Still Select on a second audio stream; the filter is stateless
        // and never restricts to first-only.
        assert_eq!(
            filter.decide(gst::StreamType::AUDIO),
            SelectionDecision::Select
        );
        assert_eq!(
            filter.decide(gst::StreamType::VIDEO),
            SelectionDecision::Deselect
        );
    }

    #[test]
    fn test_video_only_rejects_audio() {
        let filter = TrackFilter::new(false, true);

        assert_eq!(
            filter.decide(gst::StreamType::VIDEO),
            SelectionDecision::Select
        );
        assert_eq!(
            filter.decide(gst::StreamType::AUDIO),
            SelectionDecision::Deselect
        );
    }

    #[test]
    fn test_both_flags_select_both_types() {
        let filter = TrackFilter::new(true, true);

        assert_eq!(
            filter.decide(gst::StreamType::AUDIO),
            SelectionDecision::Select
        );
        assert_eq!(
            filter.decide(gst::StreamType::VIDEO),
            SelectionDecision::Select
        );
        assert_eq!(
            filter.decide(gst::StreamType::TEXT),
            SelectionDecision::Deselect
        );
    }

    #[test]
    fn test_signal_result_convention() {
        assert_eq!(SelectionDecision::Default.signal_result(), -1);
        assert_eq!(SelectionDecision::Select.signal_result(), 1);
        assert_eq!(SelectionDecision::Deselect.signal_result(), 0);
    }
}
