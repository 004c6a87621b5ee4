// Chart controller - Owns the series store and the active ingestion
use crate::application::ingestion_session::{IngestionSession, SessionReport, DEFAULT_PACING};
use crate::application::listener::{spawn_listener, ListenerHandle};
use crate::application::sample_codec::SampleCodec;
use crate::application::series_store::SeriesStore;
use crate::domain::axis::{AxisManifest, AxisRange};
use crate::domain::error::IngestError;
use crate::domain::series_set::{ChartSnapshot, SeriesSet};
use crate::infrastructure::file_source::FileLineSource;
use crate::infrastructure::socket_source::SocketAcceptor;
use futures::stream::Stream;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSettings {
    pub capacity: usize,
    pub y_range: AxisRange,
    /// Delay between replayed samples; `None` replays as fast as possible.
    pub pacing: Option<Duration>,
    pub bind_addr: String,
    pub socket_axes: Vec<String>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            capacity: 200,
            y_range: AxisRange::default(),
            pacing: Some(DEFAULT_PACING),
            bind_addr: "127.0.0.1:1337".to_string(),
            socket_axes: vec!["X".to_string(), "Y".to_string(), "Z".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerStatus {
    pub recording_loaded: bool,
    pub file_playing: bool,
    pub socket_listening: bool,
    pub socket_streaming: bool,
}

/// Single owner of the chart data and whichever source is feeding it.
///
/// At most one file session or one socket listener is active at a time.
/// Loading a recording or starting to listen stops the previous source and
/// waits for it before the new series set is built.
pub struct ChartController {
    settings: ControllerSettings,
    codec: Arc<dyn SampleCodec>,
    store: Option<SeriesStore>,
    recording: Option<PathBuf>,
    // Cleared by stop; the path stays so play can re-open it.
    recording_loaded: bool,
    session: Option<IngestionSession>,
    listener: Option<ListenerHandle>,
}

impl ChartController {
    pub fn new(settings: ControllerSettings, codec: Arc<dyn SampleCodec>) -> Self {
        Self {
            settings,
            codec,
            store: None,
            recording: None,
            recording_loaded: false,
            session: None,
            listener: None,
        }
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn store(&self) -> Option<&SeriesStore> {
        self.store.as_ref()
    }

    pub fn recording(&self) -> Option<&Path> {
        self.recording.as_deref()
    }

    pub fn status(&self) -> ControllerStatus {
        let listening = self.listener.as_ref().is_some_and(|l| !l.is_finished());
        ControllerStatus {
            recording_loaded: self.recording_loaded && self.recording.is_some(),
            file_playing: self.session.as_ref().is_some_and(|s| s.is_running()),
            socket_listening: listening,
            socket_streaming: listening && self.listener.as_ref().is_some_and(|l| l.is_streaming()),
        }
    }

    fn new_store(&self, manifest: AxisManifest) -> Result<SeriesStore, IngestError> {
        let set = SeriesSet::from_manifest(manifest, self.settings.capacity)?;
        Ok(SeriesStore::new(set, self.settings.y_range))
    }

    /// Read the manifest of a recording and build a fresh, empty series set.
    ///
    /// Whatever was running is stopped and fully drained first, so nothing
    /// from the previous source can land in the new set. On error the
    /// current state is left as it was.
    pub async fn load_manifest(&mut self, path: impl AsRef<Path>) -> Result<SeriesStore, IngestError> {
        let path = path.as_ref();
        let header = FileLineSource::open(path).await?;
        let manifest = self.codec.decode_manifest(header.manifest_line())?;
        drop(header);
        let store = self.new_store(manifest)?;

        self.stop_and_wait().await;
        self.session = None;

        tracing::info!(
            "Loaded recording {} with axes {:?}",
            path.display(),
            store.manifest().names()
        );
        self.store = Some(store.clone());
        self.recording = Some(path.to_path_buf());
        self.recording_loaded = true;
        Ok(store)
    }

    /// Replay the loaded recording from its first data line.
    ///
    /// A no-op while a replay is already running.
    pub async fn play(&mut self) -> Result<(), IngestError> {
        if self.session.as_ref().is_some_and(|s| s.is_running()) {
            tracing::debug!("play() ignored, recording already playing");
            return Ok(());
        }

        let (Some(path), Some(store)) = (self.recording.clone(), self.store.clone()) else {
            return Err(IngestError::SourceUnavailable(
                "no recording loaded".to_string(),
            ));
        };

        if let Some(mut previous) = self.session.take() {
            previous.wait_stopped().await;
        }

        let source = FileLineSource::open(&path).await?;
        let mut session = IngestionSession::new(store, self.codec.clone())
            .with_source(Box::new(source))
            .with_pacing(self.settings.pacing);
        session.play()?;
        self.session = Some(session);
        self.recording_loaded = true;
        Ok(())
    }

    /// Ask the active source to stop without waiting for it.
    ///
    /// The recording counts as unloaded afterwards; its buffer contents stay
    /// and `play` re-opens it from the beginning.
    pub fn stop(&mut self) {
        self.recording_loaded = false;
        if let Some(session) = self.session.as_mut() {
            session.stop();
        }
        if let Some(listener) = self.listener.as_ref() {
            listener.stop();
        }
    }

    /// Stop the active source and wait until its handles are released.
    ///
    /// Returns the replay report when a file session was active.
    pub async fn stop_and_wait(&mut self) -> Option<SessionReport> {
        self.recording_loaded = false;
        let report = match self.session.as_mut() {
            Some(session) => Some(session.stop_and_wait().await),
            None => None,
        };
        if let Some(mut listener) = self.listener.take() {
            listener.stop_and_wait().await;
        }
        report
    }

    /// Wait for the current replay to finish on its own.
    pub async fn wait_playback(&mut self) -> Option<SessionReport> {
        match self.session.as_mut() {
            Some(session) => Some(session.wait_stopped().await),
            None => None,
        }
    }

    /// Bind the socket endpoint and ingest connections into a fresh set built
    /// from the socket axes. Replaces any loaded recording.
    pub async fn listen(&mut self) -> Result<SocketAddr, IngestError> {
        let manifest = AxisManifest::new(self.settings.socket_axes.clone())?;
        let store = self.new_store(manifest)?;

        self.stop_and_wait().await;
        self.session = None;

        let acceptor = SocketAcceptor::bind(&self.settings.bind_addr).await?;
        let local_addr = acceptor.local_addr();

        self.recording = None;
        self.store = Some(store.clone());
        self.listener = Some(spawn_listener(Box::new(acceptor), store, self.codec.clone()));
        Ok(local_addr)
    }

    /// Returns false when nothing is loaded or the axis is unknown.
    pub fn set_axis_visibility(&self, axis_name: &str, visible: bool) -> bool {
        self.store
            .as_ref()
            .is_some_and(|store| store.set_visibility(axis_name, visible))
    }

    /// Restore the configured value-axis range.
    pub fn reset_window(&self) {
        if let Some(store) = self.store.as_ref() {
            store.set_y_range(self.settings.y_range);
        }
    }

    /// Clear every series; any running source keeps feeding the emptied set.
    pub fn reset_buffer(&self) {
        if let Some(store) = self.store.as_ref() {
            store.reset_all();
        }
    }

    pub fn current_snapshot(&self) -> Option<ChartSnapshot> {
        self.store.as_ref().map(|store| store.snapshot())
    }

    /// Snapshots of the current series set as it changes.
    ///
    /// The stream follows the set that is current when it is created and ends
    /// once that set is replaced and released.
    pub fn subscribe(&self) -> Option<impl Stream<Item = ChartSnapshot> + Send + 'static> {
        self.store.as_ref().map(|store| store.updates())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::json_codec::JsonLineCodec;
    use std::io::Write;

    fn controller(pacing: Option<Duration>) -> ChartController {
        let settings = ControllerSettings {
            capacity: 5,
            pacing,
            bind_addr: "127.0.0.1:0".to_string(),
            ..ControllerSettings::default()
        };
        ChartController::new(settings, Arc::new(JsonLineCodec::new()))
    }

    fn recording(names: &[&str], rows: usize) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let names: Vec<String> = names.iter().map(|n| format!("\"{}\"", n)).collect();
        writeln!(file, "{{\"names\":[{}]}}", names.join(",")).unwrap();
        for i in 0..rows {
            let values: Vec<String> = (0..names.len()).map(|_| i.to_string()).collect();
            writeln!(
                file,
                "{{\"value\":{{\"axes\":[{}],\"timestamp\":{}}}}}",
                values.join(","),
                i
            )
            .unwrap();
        }
        file
    }

    #[tokio::test]
    async fn test_commands_before_load_are_harmless() {
        let mut controller = controller(None);
        assert_eq!(controller.status(), ControllerStatus::default());
        assert!(controller.current_snapshot().is_none());
        assert!(!controller.set_axis_visibility("x", false));
        controller.reset_window();
        controller.reset_buffer();
        controller.stop();

        let err = controller.play().await.unwrap_err();
        assert!(matches!(err, IngestError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_load_then_play_to_end() {
        let file = recording(&["x", "y"], 8);
        let mut controller = controller(None);

        controller.load_manifest(file.path()).await.unwrap();
        assert!(controller.status().recording_loaded);

        controller.play().await.unwrap();
        let report = controller.wait_playback().await.unwrap();
        assert_eq!(report.samples_applied, 8);

        let snapshot = controller.current_snapshot().unwrap();
        assert_eq!(snapshot.axis("x").unwrap().values(), vec![3.0, 4.0, 5.0, 6.0, 7.0]);
        assert!(!controller.status().file_playing);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_recording() {
        let good = recording(&["x"], 2);
        let bad = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(bad.path(), "not a manifest\n").unwrap();

        let mut controller = controller(None);
        controller.load_manifest(good.path()).await.unwrap();
        let err = controller.load_manifest(bad.path()).await.unwrap_err();

        assert!(matches!(err, IngestError::MalformedManifest(_)));
        assert_eq!(controller.recording(), Some(good.path()));
    }

    #[tokio::test]
    async fn test_reload_replaces_store_after_stopping() {
        let first = recording(&["x", "y", "z"], 1000);
        let second = recording(&["a"], 0);
        let mut controller = controller(Some(Duration::from_millis(1)));

        let old_store = controller.load_manifest(first.path()).await.unwrap();
        controller.play().await.unwrap();
        let new_store = controller.load_manifest(second.path()).await.unwrap();

        assert!(!old_store.same_store(&new_store));
        assert!(!controller.status().file_playing);
        let frozen = old_store.snapshot();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(old_store.snapshot(), frozen);
        assert_eq!(new_store.snapshot().axes.len(), 1);
    }

    #[tokio::test]
    async fn test_play_after_stop_reopens_recording() {
        let file = recording(&["x"], 500);
        let mut controller = controller(Some(Duration::from_millis(5)));
        controller.load_manifest(file.path()).await.unwrap();

        controller.play().await.unwrap();
        controller.stop();
        let status = controller.status();
        assert!(!status.recording_loaded);
        assert_eq!(controller.recording(), Some(file.path()));

        controller.stop_and_wait().await;
        assert!(!controller.status().file_playing);

        controller.play().await.unwrap();
        let status = controller.status();
        assert!(status.file_playing);
        assert!(status.recording_loaded);
        controller.stop_and_wait().await;
    }

    #[tokio::test]
    async fn test_reset_window_restores_range() {
        let file = recording(&["x"], 0);
        let mut controller = controller(None);
        let store = controller.load_manifest(file.path()).await.unwrap();

        store.set_y_range(AxisRange::new(-1.0, 1.0));
        controller.reset_window();
        assert_eq!(
            controller.current_snapshot().unwrap().y_range,
            AxisRange::default()
        );
    }

    #[tokio::test]
    async fn test_listen_uses_socket_axes() {
        let file = recording(&["x"], 0);
        let mut controller = controller(None);
        controller.load_manifest(file.path()).await.unwrap();

        let addr = controller.listen().await.unwrap();
        assert_ne!(addr.port(), 0);

        let status = controller.status();
        assert!(status.socket_listening);
        assert!(!status.recording_loaded);

        let names: Vec<String> = controller
            .current_snapshot()
            .unwrap()
            .axes
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["X", "Y", "Z"]);

        controller.stop_and_wait().await;
        assert!(!controller.status().socket_listening);
    }
}
