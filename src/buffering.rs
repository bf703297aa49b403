//! Buffering backpressure policy
//!
//! Two-state policy over the bus's buffering progress reports: while the
//! buffer is filling and the pipeline wants to play, hold it in Paused; once
//! the buffer reports full, resume. Live pipelines never buffer-manage;
//! pausing a live source would lose data, so their progress reports are
//! ignored outright.

use gstreamer as gst;

/// What the supervisor should do in response to a buffering report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferingAction {
    /// No state request needed
    None,

    /// Buffer is starved while playback is wanted; request Paused
    Pause,

    /// Buffer is full again and playback is wanted; request Playing
    Resume,
}

/// Tracks the buffering and liveness flags across progress reports
#[derive(Debug, Clone, Default)]
pub struct BufferingMonitor {
    live: bool,
    buffering: bool,
}

impl BufferingMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the pipeline live (set once, on a no-preroll state change result)
    pub fn mark_live(&mut self) {
        self.live = true;
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn is_buffering(&self) -> bool {
        self.buffering
    }

    /// Fold one buffering report (0–100) into the policy
    ///
    /// `desired` is the recorded lifecycle state, i.e. where the pipeline
    /// wants to be; the pause/resume pair only fires around Playing.
    pub fn on_progress(&mut self, percent: i32, desired: gst::State) -> BufferingAction {
        if self.live {
            return BufferingAction::None;
        }

        if percent == 100 {
            self.buffering = false;
            if desired == gst::State::Playing {
                BufferingAction::Resume
            } else {
                BufferingAction::None
            }
        } else {
            let action = if !self.buffering && desired == gst::State::Playing {
                BufferingAction::Pause
            } else {
                BufferingAction::None
            };
            self.buffering = true;
            action
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starved_buffer_pauses_exactly_once() {
        let mut monitor = BufferingMonitor::new();

        assert_eq!(
            monitor.on_progress(37, gst::State::Playing),
            BufferingAction::Pause
        );
        assert!(monitor.is_buffering());

        // Further progress reports while already buffering stay quiet.
        assert_eq!(
            monitor.on_progress(62, gst::State::Playing),
            BufferingAction::None
        );
        assert_eq!(
            monitor.on_progress(99, gst::State::Playing),
            BufferingAction::None
        );
    }

    #[test]
    fn test_full_buffer_resumes_and_clears_flag() {
        let mut monitor = BufferingMonitor::new();

        monitor.on_progress(40, gst::State::Playing);
        assert_eq!(
            monitor.on_progress(100, gst::State::Playing),
            BufferingAction::Resume
        );
        assert!(!monitor.is_buffering());
    }

    #[test]
    fn test_no_action_when_not_playing() {
        let mut monitor = BufferingMonitor::new();

        assert_eq!(
            monitor.on_progress(10, gst::State::Paused),
            BufferingAction::None
        );
        // The flag is still tracked so a later 100% stays quiet too.
        assert!(monitor.is_buffering());
        assert_eq!(
            monitor.on_progress(100, gst::State::Paused),
            BufferingAction::None
        );
        assert!(!monitor.is_buffering());
    }

    #[test]
    fn test_live_pipelines_ignore_buffering_entirely() {
        let mut monitor = BufferingMonitor::new();
        monitor.mark_live();

        assert_eq!(
            monitor.on_progress(5, gst::State::Playing),
            BufferingAction::None
        );
        assert_eq!(
            monitor.on_progress(100, gst::State::Playing),
            BufferingAction::None
        );
        assert!(!monitor.is_buffering());
    }

    #[test]
    fn test_stall_resume_stall_cycle() {
        let mut monitor = BufferingMonitor::new();

        assert_eq!(
            monitor.on_progress(20, gst::State::Playing),
            BufferingAction::Pause
        );
        assert_eq!(
            monitor.on_progress(100, gst::State::Playing),
            BufferingAction::Resume
        );
        assert_eq!(
            monitor.on_progress(55, gst::State::Playing),
            BufferingAction::Pause
        );
    }
}
