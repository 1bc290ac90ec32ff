//! Property tests for play-duration mapping and bar rendering (pure domain).

use proptest::prelude::*;

use crate::domain::game_timer::{
    filled_cells, play_seconds, render_frame, ControlState, GameTimer, SessionState, BAR_FILLED,
    BAR_WIDTH, MAX_PLAY_SECONDS, MIN_PLAY_SECONDS,
};

#[derive(Debug, Clone, Copy)]
enum Op {
    Start,
    Tick,
    Stop,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![1 => Just(Op::Start), 6 => Just(Op::Tick), 1 => Just(Op::Stop)]
}

fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(64);

    ProptestConfig {
        cases,
        ..ProptestConfig::default()
    }
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn prop_play_seconds_matches_formula(points in 0i64..10_000) {
        let expected = std::cmp::min(180, 20 + 2 * points) as u32;
        prop_assert_eq!(play_seconds(points), expected);
    }

    #[test]
    fn prop_play_seconds_is_monotonic_and_bounded(a in 0i64..1_000, b in 0i64..1_000) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(play_seconds(lo) <= play_seconds(hi));
        prop_assert!(play_seconds(a) >= MIN_PLAY_SECONDS);
        prop_assert!(play_seconds(a) <= MAX_PLAY_SECONDS);
    }

    #[test]
    fn prop_filled_cells_is_floor_of_ratio(
        (play, left) in (1u32..=MAX_PLAY_SECONDS).prop_flat_map(|p| (Just(p), 0u32..=p))
    ) {
        let filled = filled_cells(left, play);
        prop_assert_eq!(filled, (40 * left / play) as usize);
        prop_assert!(filled <= BAR_WIDTH);

        let bar = render_frame(left, play);
        prop_assert_eq!(bar.chars().count(), BAR_WIDTH);
        prop_assert_eq!(bar.chars().filter(|c| *c == BAR_FILLED).count(), filled);
    }

    #[test]
    fn prop_countdown_length_equals_play_seconds(points in 0i64..200) {
        let mut timer = GameTimer::new();
        let seconds = timer.initialize(points);
        timer.start();

        let mut ticks = 0u32;
        while timer.tick() {
            ticks += 1;
        }

        prop_assert_eq!(ticks, seconds);
        prop_assert_eq!(timer.state(), SessionState::Finished);
        prop_assert_eq!(timer.time_left(), 0);
    }

    #[test]
    fn prop_random_sessions_keep_frames_consistent(
        points in -50i64..200,
        ops in prop::collection::vec(op(), 0..300),
    ) {
        let mut timer = GameTimer::new();
        let seconds = timer.initialize(points);

        for op in ops {
            let before = timer.state();
            let changed = match op {
                Op::Start => timer.start(),
                Op::Tick => timer.tick(),
                Op::Stop => timer.stop(),
            };
            if !changed {
                prop_assert_eq!(timer.state(), before);
            }

            let frame = timer.frame();
            prop_assert!(frame.time_left <= seconds);
            prop_assert_eq!(frame.play_seconds, seconds);
            prop_assert_eq!(frame.controls, ControlState::for_state(frame.status));
            prop_assert!(frame.filled_cells() <= BAR_WIDTH);
            let ran_out = frame.status == SessionState::Finished && frame.time_left == 0;
            prop_assert_eq!(frame.game_over, ran_out);
            prop_assert!(frame.status != SessionState::Playing || frame.time_left > 0);
        }
    }
}
