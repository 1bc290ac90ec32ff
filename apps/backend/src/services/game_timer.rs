//! Clock-driven countdown around the pure [`GameTimer`].
//!
//! The controller owns at most one repeating tick task. Every state change
//! publishes a fresh [`GameFrame`] on a `watch` channel, so a page (WebSocket
//! session or terminal) can simply follow the latest frame.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::domain::{GameFrame, GameTimer, SessionState};

struct Inner {
    timer: GameTimer,
    /// Bumped whenever the current tick source is replaced or cancelled.
    generation: u64,
}

struct Shared {
    inner: Mutex<Inner>,
    frames: watch::Sender<GameFrame>,
}

impl Shared {
    fn publish(&self, inner: &Inner) {
        self.frames.send_replace(inner.timer.frame());
    }

    /// Apply one tick on behalf of tick source `generation`.
    ///
    /// Returns whether that source should keep running.
    fn tick(&self, generation: u64) -> bool {
        let mut inner = self.inner.lock();
        if inner.generation != generation || !inner.timer.tick() {
            return false;
        }
        self.publish(&inner);
        trace!(time_left = inner.timer.time_left(), "game timer tick");
        inner.timer.state() == SessionState::Playing
    }
}

/// Handle to a spawned periodic tick. Dropping it cancels and aborts the task.
struct RepeatingTick {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RepeatingTick {
    fn spawn(shared: Arc<Shared>, generation: u64, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let child = cancel.clone();
        // Measured from the caller's `start`, not from the task's first poll.
        let first = Instant::now() + period;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(first, period);
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = interval.tick() => {
                        if !shared.tick(generation) {
                            break;
                        }
                    }
                }
            }
            debug!(generation, "game timer tick source ended");
        });

        Self { cancel, handle }
    }
}

impl Drop for RepeatingTick {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

/// One page's countdown: a [`GameTimer`] plus the clock that drives it.
pub struct GameTimerController {
    shared: Arc<Shared>,
    ticker: Mutex<Option<RepeatingTick>>,
    tick_interval: Duration,
}

impl GameTimerController {
    pub fn new(tick_interval: Duration) -> Self {
        let timer = GameTimer::new();
        let (frames, _) = watch::channel(timer.frame());
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    timer,
                    generation: 0,
                }),
                frames,
            }),
            ticker: Mutex::new(None),
            tick_interval,
        }
    }

    /// Fix the play duration from the caller's local team total.
    pub fn initialize(&self, points_total: i64) -> u32 {
        let play_seconds = {
            let mut inner = self.shared.inner.lock();
            inner.generation += 1;
            let play_seconds = inner.timer.initialize(points_total);
            self.shared.publish(&inner);
            play_seconds
        };
        self.ticker.lock().take();
        debug!(points_total, play_seconds, "game timer initialized");
        play_seconds
    }

    /// Start (or restart) the countdown. No-op while idle or already playing.
    ///
    /// The first frame is published before this returns; ticks follow every
    /// `tick_interval`.
    pub fn start(&self) -> bool {
        let generation = {
            let mut inner = self.shared.inner.lock();
            if !inner.timer.start() {
                return false;
            }
            inner.generation += 1;
            self.shared.publish(&inner);
            inner.generation
        };

        let tick = RepeatingTick::spawn(self.shared.clone(), generation, self.tick_interval);
        // Replacing drops (and cancels) a leftover source from a finished run.
        *self.ticker.lock() = Some(tick);
        debug!(generation, "game timer started");
        true
    }

    /// Stop an active countdown. Returns `false` when nothing was playing.
    pub fn stop(&self) -> bool {
        let stopped = {
            let mut inner = self.shared.inner.lock();
            inner.generation += 1;
            let stopped = inner.timer.stop();
            if stopped {
                self.shared.publish(&inner);
            }
            stopped
        };
        self.ticker.lock().take();
        if stopped {
            debug!("game timer stopped");
        }
        stopped
    }

    pub fn frame(&self) -> GameFrame {
        self.shared.inner.lock().timer.frame()
    }

    pub fn state(&self) -> SessionState {
        self.shared.inner.lock().timer.state()
    }

    /// Follow frames as they are published. The receiver starts at the latest one.
    pub fn subscribe(&self) -> watch::Receiver<GameFrame> {
        self.shared.frames.subscribe()
    }

    /// Whether a tick task is still alive.
    pub fn has_active_tick(&self) -> bool {
        self.ticker
            .lock()
            .as_ref()
            .is_some_and(|t| !t.handle.is_finished())
    }
}

impl std::fmt::Debug for GameTimerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.shared.inner.lock();
        f.debug_struct("GameTimerController")
            .field("state", &inner.timer.state())
            .field("time_left", &inner.timer.time_left())
            .field("play_seconds", &inner.timer.play_seconds())
            .field("tick_interval", &self.tick_interval)
            .finish()
    }
}
