//! Game timer: point total to play duration, and the countdown state machine.
//!
//! Everything here is clock-free. The async driver that ticks once per second
//! lives in `services::game_timer`; this module only knows how a single
//! `start`, `tick` or `stop` changes the session.

use serde::{Deserialize, Serialize};

/// Play duration granted with zero points.
pub const MIN_PLAY_SECONDS: u32 = 20;
/// Upper bound on the play duration regardless of points.
pub const MAX_PLAY_SECONDS: u32 = 180;
/// Seconds granted per point.
pub const SECONDS_PER_POINT: u32 = 2;
/// Width of the rendered progress bar in characters.
pub const BAR_WIDTH: usize = 40;

pub const BAR_FILLED: char = '█';
pub const BAR_EMPTY: char = '░';

pub const GAME_OVER_MESSAGE: &str = "Game over!";

/// Points at or above this value already grant `MAX_PLAY_SECONDS`.
const SATURATING_POINTS: i64 = ((MAX_PLAY_SECONDS - MIN_PLAY_SECONDS) / SECONDS_PER_POINT) as i64;

/// Map a local-team point total to a play duration in seconds.
///
/// `min(180, 20 + 2 * points)`. Negative totals are treated as zero.
pub fn play_seconds(points_total: i64) -> u32 {
    let points = points_total.clamp(0, SATURATING_POINTS) as u32;
    (MIN_PLAY_SECONDS + SECONDS_PER_POINT * points).min(MAX_PLAY_SECONDS)
}

/// Number of filled cells for the given remaining time.
///
/// A zero duration renders an empty bar rather than dividing by zero.
pub fn filled_cells(time_left: u32, play_seconds: u32) -> usize {
    if play_seconds == 0 {
        return 0;
    }
    let time_left = time_left.min(play_seconds) as u64;
    ((BAR_WIDTH as u64 * time_left) / play_seconds as u64) as usize
}

/// Render the fixed-width progress bar.
pub fn render_frame(time_left: u32, play_seconds: u32) -> String {
    let filled = filled_cells(time_left, play_seconds);
    let mut bar = String::with_capacity(BAR_WIDTH * BAR_FILLED.len_utf8());
    bar.extend(std::iter::repeat(BAR_FILLED).take(filled));
    bar.extend(std::iter::repeat(BAR_EMPTY).take(BAR_WIDTH - filled));
    bar
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Ready,
    Playing,
    Finished,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Ready => "ready",
            SessionState::Playing => "playing",
            SessionState::Finished => "finished",
        }
    }
}

/// Enable/disable state of the two page controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    pub start_enabled: bool,
    pub stop_enabled: bool,
}

impl ControlState {
    pub fn for_state(state: SessionState) -> Self {
        match state {
            SessionState::Idle => Self {
                start_enabled: false,
                stop_enabled: false,
            },
            SessionState::Ready | SessionState::Finished => Self {
                start_enabled: true,
                stop_enabled: false,
            },
            SessionState::Playing => Self {
                start_enabled: false,
                stop_enabled: true,
            },
        }
    }
}

/// Everything a page needs to draw one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameFrame {
    pub status: SessionState,
    pub time_left: u32,
    pub play_seconds: u32,
    pub bar: String,
    pub caption: String,
    pub game_over: bool,
    pub controls: ControlState,
}

impl GameFrame {
    /// Bar and caption on one line, followed by the game-over line when finished
    /// by running out of time.
    pub fn text(&self) -> String {
        let mut out = format!("{} {}", self.bar, self.caption);
        if self.game_over {
            out.push('\n');
            out.push_str(GAME_OVER_MESSAGE);
        }
        out
    }

    pub fn filled_cells(&self) -> usize {
        filled_cells(self.time_left, self.play_seconds)
    }
}

/// Countdown state machine for one game page.
///
/// `idle --initialize--> ready --start--> playing --tick(0)--> finished`,
/// `playing --stop--> finished`, `finished --start--> playing`.
#[derive(Debug, Clone)]
pub struct GameTimer {
    state: SessionState,
    play_seconds: u32,
    time_left: u32,
    ran_out: bool,
}

impl Default for GameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl GameTimer {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            play_seconds: 0,
            time_left: 0,
            ran_out: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn play_seconds(&self) -> u32 {
        self.play_seconds
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    /// Fix the play duration for this page and become `ready`.
    pub fn initialize(&mut self, points_total: i64) -> u32 {
        self.play_seconds = play_seconds(points_total);
        self.time_left = self.play_seconds;
        self.ran_out = false;
        self.state = SessionState::Ready;
        self.play_seconds
    }

    /// Begin a countdown from the full duration.
    ///
    /// Returns `false` without touching anything when the timer is idle or
    /// already playing.
    pub fn start(&mut self) -> bool {
        match self.state {
            SessionState::Ready | SessionState::Finished => {
                self.time_left = self.play_seconds;
                self.ran_out = false;
                self.state = SessionState::Playing;
                true
            }
            SessionState::Idle | SessionState::Playing => false,
        }
    }

    /// One elapsed second. Returns `false` when not playing.
    pub fn tick(&mut self) -> bool {
        if self.state != SessionState::Playing {
            return false;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            self.state = SessionState::Finished;
            self.ran_out = true;
        }
        true
    }

    /// Stop an active countdown. Returns `false` when nothing was playing.
    pub fn stop(&mut self) -> bool {
        if self.state != SessionState::Playing {
            return false;
        }
        self.state = SessionState::Finished;
        true
    }

    pub fn frame(&self) -> GameFrame {
        GameFrame {
            status: self.state,
            time_left: self.time_left,
            play_seconds: self.play_seconds,
            bar: render_frame(self.time_left, self.play_seconds),
            caption: format!("{}s / {}s", self.time_left, self.play_seconds),
            game_over: self.ran_out,
            controls: ControlState::for_state(self.state),
        }
    }
}
