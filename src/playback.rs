use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::constants::TICK_MS;
use crate::engine::SimulationEngine;
use crate::types::{Seat, Snapshot};

struct DriverState {
    engine: SimulationEngine,
    ticker: Option<JoinHandle<()>>,
}

impl DriverState {
    /// Cancels the periodic tick. Called with the lock held, so a tick that
    /// already woke up sees the new epoch and exits without touching state.
    fn stop_ticker(&mut self, epoch: &AtomicU64) {
        epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

/// Drives a `SimulationEngine` from a one-second tokio timer.
pub struct PlaybackDriver {
    state: Arc<Mutex<DriverState>>,
    // outside the lock so drop can always retire the running ticker
    epoch: Arc<AtomicU64>,
    snapshots: watch::Sender<Snapshot>,
}

impl PlaybackDriver {
    pub fn new(engine: SimulationEngine) -> Self {
        let (snapshots, _) = watch::channel(engine.display_snapshot());
        Self {
            state: Arc::new(Mutex::new(DriverState {
                engine,
                ticker: None,
            })),
            epoch: Arc::new(AtomicU64::new(0)),
            snapshots,
        }
    }

    /// Receives the display snapshot after every transition and tick.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    pub async fn start(&self) -> bool {
        let mut guard = self.state.lock().await;
        if !guard.engine.start() {
            return false;
        }
        guard.stop_ticker(&self.epoch);
        let epoch = self.epoch.load(Ordering::SeqCst);
        guard.ticker = Some(spawn_ticker(
            self.state.clone(),
            self.epoch.clone(),
            self.snapshots.clone(),
            epoch,
        ));
        self.publish(&guard);
        true
    }

    pub async fn pause(&self) -> bool {
        let mut guard = self.state.lock().await;
        guard.stop_ticker(&self.epoch);
        let changed = guard.engine.pause();
        self.publish(&guard);
        changed
    }

    pub async fn reset(&self) {
        let mut guard = self.state.lock().await;
        guard.stop_ticker(&self.epoch);
        guard.engine.reset();
        self.publish(&guard);
    }

    /// Swaps in a new session (e.g. another classroom); the old one stops.
    pub async fn replace(&self, engine: SimulationEngine) {
        let mut guard = self.state.lock().await;
        guard.stop_ticker(&self.epoch);
        guard.engine = engine;
        self.publish(&guard);
    }

    pub async fn snapshot(&self, alert_limit: usize, timeline_limit: usize) -> Snapshot {
        let guard = self.state.lock().await;
        guard.engine.snapshot(alert_limit, timeline_limit)
    }

    pub async fn seat(&self, seat_id: &str) -> Option<Seat> {
        let guard = self.state.lock().await;
        guard.engine.seat_detail(seat_id).cloned()
    }

    fn publish(&self, guard: &DriverState) {
        self.snapshots.send_replace(guard.engine.display_snapshot());
    }
}

impl Drop for PlaybackDriver {
    fn drop(&mut self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.state.try_lock() {
            if let Some(handle) = guard.ticker.take() {
                handle.abort();
            }
        }
    }
}

fn spawn_ticker(
    state: Arc<Mutex<DriverState>>,
    current_epoch: Arc<AtomicU64>,
    snapshots: watch::Sender<Snapshot>,
    epoch: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = Duration::from_millis(TICK_MS);
        // first tick one full period after start; resuming never catches up
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            if current_epoch.load(Ordering::SeqCst) != epoch || !guard.engine.is_running() {
                return;
            }
            let report = guard.engine.tick();
            if !report.fired.is_empty() {
                println!(
                    "[playback] t={}s fired events {:?} (integrity {})",
                    report.elapsed_secs,
                    report.fired,
                    guard.engine.integrity_score()
                );
            }
            snapshots.send_replace(guard.engine.display_snapshot());
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlaybackState;
    use tokio::time::sleep;

    fn driver() -> PlaybackDriver {
        PlaybackDriver::new(SimulationEngine::demo(12))
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_second_while_running() {
        let driver = driver();
        assert!(driver.start().await);
        sleep(Duration::from_millis(8_500)).await;
        let snapshot = driver.snapshot(10, 8).await;
        assert_eq!(snapshot.elapsed_secs, 8);
        assert_eq!(snapshot.alert_count, 1);
        assert_eq!(snapshot.state, PlaybackState::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_freezes_and_resume_starts_fresh_period() {
        let driver = driver();
        driver.start().await;
        sleep(Duration::from_millis(3_500)).await;
        assert!(driver.pause().await);
        sleep(Duration::from_secs(10)).await;
        let paused = driver.snapshot(10, 8).await;
        assert_eq!(paused.elapsed_secs, 3);
        assert_eq!(paused.state, PlaybackState::Paused);

        driver.start().await;
        sleep(Duration::from_millis(2_500)).await;
        assert_eq!(driver.snapshot(10, 8).await.elapsed_secs, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_while_running_stops_the_timer() {
        let driver = driver();
        driver.start().await;
        sleep(Duration::from_millis(9_500)).await;
        driver.reset().await;
        sleep(Duration::from_secs(20)).await;
        let snapshot = driver.snapshot(10, 8).await;
        assert_eq!(snapshot.elapsed_secs, 0);
        assert_eq!(snapshot.state, PlaybackState::Idle);
        assert!(snapshot.alerts.is_empty());
        assert_eq!(snapshot.timeline.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_start_does_not_double_tick() {
        let driver = driver();
        assert!(driver.start().await);
        assert!(!driver.start().await);
        sleep(Duration::from_millis(4_500)).await;
        assert_eq!(driver.snapshot(10, 8).await.elapsed_secs, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_each_tick() {
        let driver = driver();
        let rx = driver.subscribe();
        driver.start().await;
        sleep(Duration::from_millis(2_500)).await;
        assert_eq!(rx.borrow().elapsed_secs, 2);
        assert!(rx.borrow().running);
    }

    #[tokio::test(start_paused = true)]
    async fn replace_swaps_session_and_stops_playback() {
        let driver = driver();
        driver.start().await;
        sleep(Duration::from_millis(1_500)).await;
        driver.replace(SimulationEngine::demo(13)).await;
        sleep(Duration::from_secs(3)).await;
        let snapshot = driver.snapshot(10, 8).await;
        assert_eq!(snapshot.elapsed_secs, 0);
        assert!(!snapshot.running);
        assert!(driver.seat("0-0").await.is_some());
        assert!(driver.seat("9-9").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_driver_retires_ticker_even_while_locked() {
        let driver = driver();
        let rx = driver.subscribe();
        driver.start().await;
        sleep(Duration::from_millis(1_500)).await;

        let state = driver.state.clone();
        let guard = state.lock().await;
        drop(driver);
        drop(guard);

        sleep(Duration::from_secs(5)).await;
        assert_eq!(rx.borrow().elapsed_secs, 1);
        assert_eq!(Arc::strong_count(&state), 1);
    }
}
