//! Pipeline lifecycle supervision
//!
//! Owns the instantiated pipeline and runs the single-threaded reactor that
//! drives it: bus messages, console input, and the interrupt signal are the
//! only wake-ups, and every handler runs to completion before the next one.
//! Whatever ends the run (end-of-stream, a fatal element error, a `q`
//! command, SIGINT) funnels into one teardown path that walks the pipeline
//! back down to Null.

use futures::StreamExt;
use gstreamer as gst;
use gstreamer::glib;
use gstreamer::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::buffering::{BufferingAction, BufferingMonitor};
use crate::console::{self, Command};
use crate::state::{state_name, Confirmation, StateTracker};

/// Prefix for diagnostic dot-graph dumps
const DUMP_PREFIX: &str = "multisrc-launch";

/// Errors that end supervision before the reactor can run its course
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("pipeline has no message bus")]
    NoBus,

    #[error("pipeline refused the state change to {0}")]
    StateChangeRejected(&'static str),
}

/// Whether the reactor keeps going after a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// The process-wide supervisor context
///
/// Exactly one exists per run. All mutation happens from reactor handlers
/// on the current-thread runtime, so no synchronization is needed.
pub struct Supervisor {
    pipeline: gst::Pipeline,
    tracker: StateTracker,
    buffering: BufferingMonitor,
    interactive: bool,
    verbose: bool,
    excluded_props: Vec<String>,
    notify_watch: Option<gst::NotifyWatchId>,
}

impl Supervisor {
    /// Take ownership of an instantiated pipeline
    ///
    /// Interactive mode disables auto-play: the pipeline is driven to Ready
    /// and then waits for console commands.
    pub fn new(pipeline: gst::Pipeline, interactive: bool) -> Self {
        Self {
            pipeline,
            tracker: StateTracker::new(!interactive),
            buffering: BufferingMonitor::new(),
            interactive,
            verbose: false,
            excluded_props: Vec::new(),
            notify_watch: None,
        }
    }

    /// Enable property-change reporting
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Property names suppressed from verbose reporting
    pub fn with_excluded_properties(mut self, props: Vec<String>) -> Self {
        self.excluded_props = props;
        self
    }

    /// Ask the pipeline to move toward `target`
    ///
    /// Completion of an async transition is observed later on the bus; a
    /// no-preroll result marks the pipeline live, which switches off the
    /// buffering policy for the rest of the run.
    pub fn request_state(&mut self, target: gst::State) -> Result<(), SupervisorError> {
        match self.pipeline.set_state(target) {
            Err(_) => Err(SupervisorError::StateChangeRejected(state_name(target))),
            Ok(gst::StateChangeSuccess::NoPreroll) => {
                tracing::info!("pipeline is live and does not need preroll");
                self.buffering.mark_live();
                Ok(())
            }
            Ok(gst::StateChangeSuccess::Async) => {
                tracing::info!("pipeline is prerolling");
                Ok(())
            }
            Ok(gst::StateChangeSuccess::Success) => {
                if self.tracker.current() == gst::State::Paused {
                    tracing::info!("pipeline is prerolled");
                }
                Ok(())
            }
        }
    }

    /// Run the reactor until shutdown, then tear the pipeline down
    ///
    /// Returns an error only for startup failures (no bus, initial Ready
    /// rejected); everything after the loop starts ends the run normally.
    pub async fn run(mut self) -> Result<(), SupervisorError> {
        let bus = self.pipeline.bus().ok_or(SupervisorError::NoBus)?;
        let mut messages = bus.stream();
        let mut console = BufReader::new(tokio::io::stdin()).lines();

        if self.verbose {
            self.notify_watch = Some(self.pipeline.add_property_deep_notify_watch(None, true));
        }
        if self.interactive {
            console::print_usage();
        }

        let result = self.supervise(&mut messages, &mut console).await;
        self.teardown();
        result
    }

    async fn supervise<S>(
        &mut self,
        messages: &mut S,
        console: &mut Lines<BufReader<Stdin>>,
    ) -> Result<(), SupervisorError>
    where
        S: futures::Stream<Item = gst::Message> + Unpin,
    {
        self.request_state(gst::State::Ready)?;

        loop {
            tokio::select! {
                message = messages.next() => {
                    match message {
                        Some(message) => {
                            if self.handle_message(&message) == Flow::Quit {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                line = console.next_line(), if self.interactive => {
                    match line {
                        Ok(Some(line)) => {
                            if self.handle_command(&line) == Flow::Quit {
                                break;
                            }
                        }
                        Ok(None) => {
                            // stdin closed; stop watching it
                            self.interactive = false;
                        }
                        Err(e) => {
                            tracing::warn!("console read failed: {e}");
                            self.interactive = false;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("handling interrupt");
                    break;
                }
            }
        }

        Ok(())
    }

    fn handle_message(&mut self, message: &gst::Message) -> Flow {
        tracing::debug!(
            "received {:?} message from {}",
            message.type_(),
            message
                .src()
                .map(|src| src.name().to_string())
                .unwrap_or_else(|| "<unknown>".into()),
        );

        match message.view() {
            gst::MessageView::Error(err) => {
                tracing::error!(
                    "error from element {}: {}",
                    source_path(message),
                    err.error()
                );
                if let Some(debug_info) = err.debug() {
                    tracing::error!("additional debug info: {}", debug_info);
                }
                Flow::Quit
            }
            gst::MessageView::Warning(warning) => {
                tracing::warn!(
                    "warning from element {}: {}",
                    source_path(message),
                    warning.error()
                );
                if let Some(debug_info) = warning.debug() {
                    tracing::warn!("additional debug info: {}", debug_info);
                }
                Flow::Continue
            }
            gst::MessageView::Eos(..) => {
                tracing::info!("end of stream");
                Flow::Quit
            }
            gst::MessageView::StateChanged(change) => {
                // Inner elements change state constantly; only the pipeline's
                // own transitions are confirmations.
                let from_pipeline = message
                    .src()
                    .map(|src| src == self.pipeline.upcast_ref::<gst::Object>())
                    .unwrap_or(false);
                if !from_pipeline {
                    return Flow::Continue;
                }

                let (old, new) = (change.old(), change.current());
                self.pipeline.debug_to_dot_file_with_ts(
                    gst::DebugGraphDetails::all(),
                    format!("{DUMP_PREFIX}.{}_{}", state_name(old), state_name(new)),
                );
                self.confirm_state(new)
            }
            gst::MessageView::Buffering(buffering) => {
                let percent = buffering.percent();
                tracing::info!("buffering {percent}%");

                match self.buffering.on_progress(percent, self.tracker.current()) {
                    BufferingAction::Pause => {
                        tracing::info!("buffering, setting pipeline to PAUSED");
                        self.request_state_or_quit(gst::State::Paused)
                    }
                    BufferingAction::Resume => {
                        tracing::info!("done buffering, setting pipeline to PLAYING");
                        self.request_state_or_quit(gst::State::Playing)
                    }
                    BufferingAction::None => Flow::Continue,
                }
            }
            gst::MessageView::PropertyNotify(notify) => {
                if self.verbose {
                    self.report_property(&notify);
                }
                Flow::Continue
            }
            _ => Flow::Continue,
        }
    }

    /// Record a bus-confirmed state and issue whatever auto-play owes
    fn confirm_state(&mut self, new: gst::State) -> Flow {
        match self.tracker.confirm(new) {
            Confirmation::Unchanged => Flow::Continue,
            Confirmation::Settled => {
                tracing::info!("player is {}", state_name(new));
                Flow::Continue
            }
            Confirmation::FollowUp(next) => {
                tracing::info!("player is {}", state_name(new));
                self.request_state_or_quit(next)
            }
        }
    }

    fn handle_command(&mut self, line: &str) -> Flow {
        match Command::parse(line) {
            Some(Command::Quit) => {
                tracing::info!("quit requested");
                Flow::Quit
            }
            Some(Command::TogglePause) => {
                let target = if self.tracker.current() == gst::State::Paused {
                    gst::State::Playing
                } else {
                    gst::State::Paused
                };
                self.request_state_or_quit(target)
            }
            Some(Command::Snapshot) => {
                self.pipeline.debug_to_dot_file_with_ts(
                    gst::DebugGraphDetails::all(),
                    format!("{DUMP_PREFIX}.snap"),
                );
                Flow::Continue
            }
            None => Flow::Continue,
        }
    }

    /// In-loop state requests: a rejection is fatal for the run but exits
    /// through the ordinary shutdown path.
    fn request_state_or_quit(&mut self, target: gst::State) -> Flow {
        match self.request_state(target) {
            Ok(()) => Flow::Continue,
            Err(e) => {
                tracing::error!("{e}");
                Flow::Quit
            }
        }
    }

    fn report_property(&self, notify: &gst::message::PropertyNotify) {
        let (object, property_name, value) = notify.get();
        if self.excluded_props.iter().any(|p| p == property_name) {
            return;
        }
        tracing::info!(
            "{}: {} = {}",
            object.path_string(),
            property_name,
            render_value(value)
        );
    }

    /// Walk the pipeline back to Null and drop the watch; runs exactly once
    fn teardown(&mut self) {
        if let Some(watch) = self.notify_watch.take() {
            self.pipeline.remove_property_notify_watch(watch);
        }
        let _ = self.pipeline.set_state(gst::State::Ready);
        let _ = self.pipeline.set_state(gst::State::Null);
    }
}

fn source_path(message: &gst::Message) -> String {
    message
        .src()
        .map(|src| src.path_string().to_string())
        .unwrap_or_else(|| "<unknown>".into())
}

/// Render a notified property value the way each payload type prints best
fn render_value(value: Option<&glib::Value>) -> String {
    let Some(value) = value else {
        return "(no value)".to_string();
    };

    if let Ok(s) = value.get::<&str>() {
        return s.to_string();
    }
    if let Ok(caps) = value.get::<gst::Caps>() {
        return caps.to_string();
    }
    if let Ok(tags) = value.get::<gst::TagList>() {
        return tags.to_string();
    }
    if let Ok(structure) = value.get::<gst::Structure>() {
        return structure.to_string();
    }
    value
        .serialize()
        .map(|s| s.to_string())
        .unwrap_or_else(|_| format!("<unserializable {}>", value.type_()))
}
