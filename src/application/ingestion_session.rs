// Ingestion session - Background read loop feeding a series store
use crate::application::line_source::LineSource;
use crate::application::sample_codec::SampleCodec;
use crate::application::series_store::SeriesStore;
use crate::domain::error::IngestError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default delay between samples when replaying a recording.
pub const DEFAULT_PACING: Duration = Duration::from_millis(40);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

/// Counters collected by the read loop, returned once the session is stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    pub lines_read: u64,
    pub samples_applied: u64,
    pub lines_skipped: u64,
    /// The source failed mid-read rather than ending cleanly.
    pub interrupted: bool,
}

/// One run of ingestion from a single source into a single store.
///
/// `Idle -> Running -> Stopping -> Stopped`. The read loop runs on its own
/// task; `stop()` only signals it, and `wait_stopped()` awaits the exit.
/// The source is dropped exactly once, when the loop exits.
pub struct IngestionSession {
    source: Option<Box<dyn LineSource>>,
    codec: Arc<dyn SampleCodec>,
    target: SeriesStore,
    pacing: Option<Duration>,
    cancel: CancellationToken,
    state: Arc<watch::Sender<SessionState>>,
    task: Option<JoinHandle<SessionReport>>,
    report: Option<SessionReport>,
}

impl IngestionSession {
    pub fn new(target: SeriesStore, codec: Arc<dyn SampleCodec>) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            source: None,
            codec,
            target,
            pacing: None,
            cancel: CancellationToken::new(),
            state: Arc::new(state),
            task: None,
            report: None,
        }
    }

    pub fn with_source(mut self, source: Box<dyn LineSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Delay applied after each line; `None` reads as fast as the source delivers.
    pub fn with_pacing(mut self, pacing: Option<Duration>) -> Self {
        self.pacing = pacing;
        self
    }

    /// Use `token` for cancellation, typically a child of a wider scope.
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.state() == SessionState::Running
    }

    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn target(&self) -> &SeriesStore {
        &self.target
    }

    /// Start the read loop. A no-op unless the session is idle.
    ///
    /// With no source bound the session goes straight to `Stopped` and the
    /// call fails with `SourceUnavailable`.
    pub fn play(&mut self) -> Result<(), IngestError> {
        match self.state() {
            SessionState::Idle => {}
            other => {
                tracing::debug!("play() ignored, session is {:?}", other);
                return Ok(());
            }
        }

        let Some(source) = self.source.take() else {
            self.state.send_replace(SessionState::Stopped);
            return Err(IngestError::SourceUnavailable(
                "no source bound to session".to_string(),
            ));
        };

        tracing::info!("Starting ingestion from {}", source.describe());
        self.state.send_replace(SessionState::Running);

        let task = tokio::spawn(read_loop(
            source,
            self.codec.clone(),
            self.target.clone(),
            self.pacing,
            self.cancel.clone(),
            self.state.clone(),
        ));
        self.task = Some(task);
        Ok(())
    }

    /// Request the read loop to exit and return without waiting for it.
    pub fn stop(&mut self) {
        match self.state() {
            SessionState::Idle => {
                // Never started: release the bound source right away.
                self.source = None;
                self.state.send_replace(SessionState::Stopped);
            }
            SessionState::Running | SessionState::Stopping | SessionState::Stopped => {
                // The loop may reach Stopped between the read above and this
                // write, so only a session still Running moves to Stopping.
                self.state.send_if_modified(|state| {
                    if *state == SessionState::Running {
                        *state = SessionState::Stopping;
                        true
                    } else {
                        false
                    }
                });
                self.cancel.cancel();
            }
        }
    }

    /// Wait until the read loop has exited and released its source.
    ///
    /// Does not itself stop the session. Returns at once, with an empty
    /// report, for a session that never started.
    pub async fn wait_stopped(&mut self) -> SessionReport {
        if let Some(task) = self.task.as_mut() {
            let report = match task.await {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!("Ingestion task failed: {}", e);
                    SessionReport::default()
                }
            };
            self.state.send_replace(SessionState::Stopped);
            self.task = None;
            self.report = Some(report);
        }

        self.report.clone().unwrap_or_default()
    }

    pub async fn stop_and_wait(&mut self) -> SessionReport {
        self.stop();
        self.wait_stopped().await
    }
}

impl Drop for IngestionSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn read_loop(
    mut source: Box<dyn LineSource>,
    codec: Arc<dyn SampleCodec>,
    target: SeriesStore,
    pacing: Option<Duration>,
    cancel: CancellationToken,
    state: Arc<watch::Sender<SessionState>>,
) -> SessionReport {
    let origin = source.describe();
    let manifest = target.manifest();
    let mut report = SessionReport::default();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = source.next_line() => next,
        };

        let line = match next {
            Ok(Some(line)) => Ok(line),
            Ok(None) => {
                tracing::debug!("End of stream from {}", origin);
                break;
            }
            Err(e) if e.is_recoverable() => Err(e),
            Err(e) => {
                tracing::warn!("Ending session on {}: {}", origin, e);
                report.interrupted = true;
                break;
            }
        };

        let sequence = report.lines_read;
        report.lines_read += 1;

        let applied = line
            .and_then(|line| codec.decode_sample(&line, &manifest))
            .and_then(|sample| target.append_sample(&sample.with_sequence(sequence)));
        match applied {
            Ok(()) => report.samples_applied += 1,
            Err(e) => {
                report.lines_skipped += 1;
                tracing::warn!("Skipping line {} from {}: {}", sequence + 1, origin, e);
            }
        }

        if let Some(delay) = pacing {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    state.send_replace(SessionState::Stopping);
    drop(source);
    state.send_replace(SessionState::Stopped);

    tracing::info!(
        "Ingestion from {} stopped: {} lines, {} applied, {} skipped",
        origin,
        report.lines_read,
        report.samples_applied,
        report.lines_skipped
    );
    report
}
