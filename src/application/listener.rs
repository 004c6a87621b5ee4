// Connection listener - Serves accepted connections one session at a time
use crate::application::ingestion_session::IngestionSession;
use crate::application::line_source::ConnectionAcceptor;
use crate::application::sample_codec::SampleCodec;
use crate::application::series_store::SeriesStore;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Totals for a listener that has shut down.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenerReport {
    pub connections: u64,
    pub samples_applied: u64,
    pub lines_skipped: u64,
}

/// Running acceptor loop. Cancelling it also stops the active connection.
pub struct ListenerHandle {
    cancel: CancellationToken,
    streaming: watch::Receiver<bool>,
    task: Option<JoinHandle<ListenerReport>>,
    report: Option<ListenerReport>,
}

impl ListenerHandle {
    /// Whether a connection is currently being ingested.
    pub fn is_streaming(&self) -> bool {
        *self.streaming.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|task| task.is_finished())
    }

    pub fn watch_streaming(&self) -> watch::Receiver<bool> {
        self.streaming.clone()
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub async fn wait_stopped(&mut self) -> ListenerReport {
        if let Some(task) = self.task.as_mut() {
            let report = match task.await {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!("Listener task failed: {}", e);
                    ListenerReport::default()
                }
            };
            self.task = None;
            self.report = Some(report);
        }
        self.report.clone().unwrap_or_default()
    }

    pub async fn stop_and_wait(&mut self) -> ListenerReport {
        self.stop();
        self.wait_stopped().await
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawn the accept loop. Each accepted connection becomes an unpaced
/// session writing into `target`; the next connection is only accepted
/// after the previous one has fully stopped.
pub fn spawn_listener(
    acceptor: Box<dyn ConnectionAcceptor>,
    target: SeriesStore,
    codec: Arc<dyn SampleCodec>,
) -> ListenerHandle {
    let cancel = CancellationToken::new();
    let (streaming_tx, streaming) = watch::channel(false);

    let task = tokio::spawn(accept_loop(acceptor, target, codec, cancel.clone(), streaming_tx));

    ListenerHandle {
        cancel,
        streaming,
        task: Some(task),
        report: None,
    }
}

async fn accept_loop(
    mut acceptor: Box<dyn ConnectionAcceptor>,
    target: SeriesStore,
    codec: Arc<dyn SampleCodec>,
    cancel: CancellationToken,
    streaming: watch::Sender<bool>,
) -> ListenerReport {
    let endpoint = acceptor.describe();
    let mut report = ListenerReport::default();
    tracing::info!("Listening for connections on {}", endpoint);

    loop {
        let accepted = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            accepted = acceptor.accept() => accepted,
        };

        let source = match accepted {
            Some(Ok(source)) => source,
            Some(Err(e)) => {
                tracing::warn!("Failed to accept connection on {}: {}", endpoint, e);
                continue;
            }
            None => break,
        };

        let mut session = IngestionSession::new(target.clone(), codec.clone())
            .with_source(source)
            .with_cancel_token(cancel.child_token());
        if let Err(e) = session.play() {
            tracing::warn!("Could not start session on {}: {}", endpoint, e);
            continue;
        }

        streaming.send_replace(true);
        let session_report = session.wait_stopped().await;
        streaming.send_replace(false);

        report.connections += 1;
        report.samples_applied += session_report.samples_applied;
        report.lines_skipped += session_report.lines_skipped;
    }

    drop(acceptor);
    tracing::info!(
        "Stopped listening on {} after {} connections",
        endpoint,
        report.connections
    );
    report
}
