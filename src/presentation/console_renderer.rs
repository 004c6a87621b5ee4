// Console renderer - Logs chart snapshots in place of a drawing surface
use crate::domain::series_set::ChartSnapshot;
use futures::stream::Stream;
use futures::StreamExt;
use std::time::Duration;
use tokio::time::Instant;

/// One line per frame: `x=1.250 (200) y=-0.500 (200) z=hidden`.
pub fn summarize(snapshot: &ChartSnapshot) -> String {
    snapshot
        .axes
        .iter()
        .map(|axis| {
            if !axis.visible {
                return format!("{}=hidden", axis.name);
            }
            match axis.latest() {
                Some(point) => format!("{}={:.3} ({})", axis.name, point.value, axis.points.len()),
                None => format!("{}=- (0)", axis.name),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Log snapshots from `updates`, at most one per `min_interval`, until the
/// stream ends. Returns the number of frames logged.
///
/// A snapshot held back by the throttle is logged once the interval has
/// passed, so the last change is never left unrendered.
pub async fn run<S>(updates: S, min_interval: Duration) -> u64
where
    S: Stream<Item = ChartSnapshot> + Send,
{
    futures::pin_mut!(updates);
    let mut frames = 0;
    let mut last_frame: Option<Instant> = None;
    let mut held: Option<ChartSnapshot> = None;

    loop {
        let flush_at = match (&held, last_frame) {
            (Some(_), Some(at)) => Some(at + min_interval),
            _ => None,
        };

        let next = match flush_at {
            Some(deadline) => tokio::select! {
                next = updates.next() => next,
                _ = tokio::time::sleep_until(deadline) => {
                    if let Some(snapshot) = held.take() {
                        log_frame(&snapshot);
                        last_frame = Some(Instant::now());
                        frames += 1;
                    }
                    continue;
                }
            },
            None => updates.next().await,
        };

        let Some(snapshot) = next else { break };
        if last_frame.is_some_and(|at| at.elapsed() < min_interval) {
            held = Some(snapshot);
            continue;
        }

        held = None;
        log_frame(&snapshot);
        last_frame = Some(Instant::now());
        frames += 1;
    }

    if let Some(snapshot) = held {
        log_frame(&snapshot);
        frames += 1;
    }
    frames
}

fn log_frame(snapshot: &ChartSnapshot) {
    tracing::info!(
        revision = snapshot.revision,
        "[{:.1}, {:.1}] {}",
        snapshot.y_range.min,
        snapshot.y_range.max,
        summarize(snapshot)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::axis::{AxisRange, TimeSeriesPoint};
    use crate::domain::series::SeriesSnapshot;

    fn snapshot(revision: u64) -> ChartSnapshot {
        ChartSnapshot {
            revision,
            y_range: AxisRange::default(),
            axes: vec![
                SeriesSnapshot {
                    name: "x".to_string(),
                    visible: true,
                    points: vec![TimeSeriesPoint::new(0, 0.5), TimeSeriesPoint::new(1, 1.25)],
                },
                SeriesSnapshot {
                    name: "y".to_string(),
                    visible: true,
                    points: Vec::new(),
                },
                SeriesSnapshot {
                    name: "z".to_string(),
                    visible: false,
                    points: vec![TimeSeriesPoint::new(0, 3.0)],
                },
            ],
        }
    }

    #[test]
    fn test_summarize() {
        assert_eq!(summarize(&snapshot(1)), "x=1.250 (2) y=- (0) z=hidden");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_throttles_frames() {
        // First snapshot, then the last of the burst once the stream ends.
        let updates = futures::stream::iter((0..10).map(snapshot));
        let frames = run(updates, Duration::from_secs(1)).await;
        assert_eq!(frames, 2);

        let updates = futures::stream::iter((0..3).map(snapshot));
        assert_eq!(run(updates, Duration::ZERO).await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_held_snapshot_is_flushed_after_interval() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let updates = tokio_stream::wrappers::UnboundedReceiverStream::new(rx);
        let renderer = tokio::spawn(run(updates, Duration::from_millis(100)));

        // Frame at 0ms; snapshot 2 is held and flushed at 100ms.
        tx.send(snapshot(1)).unwrap();
        tx.send(snapshot(2)).unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        // Within the interval of the flush, so held until 200ms.
        tx.send(snapshot(3)).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!renderer.is_finished());

        drop(tx);
        assert_eq!(renderer.await.unwrap(), 3);
    }
}
