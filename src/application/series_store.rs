// Shared series set guarded for one writer and many readers
use crate::domain::axis::{AxisManifest, AxisRange};
use crate::domain::error::IngestError;
use crate::domain::sample::Sample;
use crate::domain::series_set::{ChartSnapshot, SeriesSet};
use futures::stream::Stream;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::watch;

/// Handle to the series set a session writes into and renderers read from.
///
/// The lock is held for a single append, reset or snapshot at a time. Every
/// change bumps a revision counter that subscribers can wait on.
#[derive(Clone)]
pub struct SeriesStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    model: RwLock<ChartModel>,
    revision: watch::Sender<u64>,
}

struct ChartModel {
    set: SeriesSet,
    y_range: AxisRange,
}

impl std::fmt::Debug for SeriesStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeriesStore")
            .field("axes", &self.read().set.manifest().names())
            .field("revision", &self.revision())
            .finish()
    }
}

impl SeriesStore {
    pub fn new(set: SeriesSet, y_range: AxisRange) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(StoreInner {
                model: RwLock::new(ChartModel { set, y_range }),
                revision,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ChartModel> {
        // A panicking writer cannot leave a half-applied sample behind, so the
        // data is still consistent after poisoning.
        self.inner
            .model
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ChartModel> {
        self.inner
            .model
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn bump(&self) {
        self.inner.revision.send_modify(|rev| *rev += 1);
    }

    pub fn manifest(&self) -> AxisManifest {
        self.read().set.manifest().clone()
    }

    pub fn revision(&self) -> u64 {
        *self.inner.revision.borrow()
    }

    pub fn same_store(&self, other: &SeriesStore) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn append_sample(&self, sample: &Sample) -> Result<(), IngestError> {
        self.write().set.append_sample(sample)?;
        self.bump();
        Ok(())
    }

    pub fn reset_all(&self) {
        self.write().set.reset_all();
        self.bump();
    }

    pub fn set_visibility(&self, axis_name: &str, visible: bool) -> bool {
        let changed = self.write().set.set_visibility(axis_name, visible);
        if changed {
            self.bump();
        }
        changed
    }

    pub fn y_range(&self) -> AxisRange {
        self.read().y_range
    }

    pub fn set_y_range(&self, y_range: AxisRange) {
        self.write().y_range = y_range;
        self.bump();
    }

    pub fn snapshot(&self) -> ChartSnapshot {
        let model = self.read();
        ChartSnapshot {
            revision: self.revision(),
            y_range: model.y_range,
            axes: model.set.snapshot(),
        }
    }

    /// Stream of snapshots: the current one, then one per observed change.
    ///
    /// Bursts of changes between polls are coalesced into one snapshot. The
    /// stream ends once every other handle to this store has been dropped.
    pub fn updates(&self) -> impl Stream<Item = ChartSnapshot> + Send + 'static {
        let weak = Arc::downgrade(&self.inner);
        let mut rx = self.inner.revision.subscribe();

        async_stream::stream! {
            loop {
                rx.borrow_and_update();
                let snapshot = match weak.upgrade() {
                    Some(inner) => SeriesStore { inner }.snapshot(),
                    None => break,
                };
                yield snapshot;

                if rx.changed().await.is_err() {
                    break;
                }
            }
        }
    }
}
