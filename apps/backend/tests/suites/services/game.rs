use std::time::Duration;

use points_backend::domain::{AccessToken, SessionState};
use points_backend::errors::domain::{DomainError, NotFoundKind};

use crate::support::{Classroom, STUDENT_TOKEN};

#[tokio::test]
async fn load_sizes_timer_from_local_total() {
    let room = Classroom::new();
    room.backend.set_local_total(room.student, 15);
    let state = room.state();
    let token = AccessToken::new(STUDENT_TOKEN);
    let me = state.points.whoami(&token).await.unwrap();

    let game = state.game.load(&token, &me.user).await.unwrap();
    assert_eq!(game.points_total, 15);
    assert_eq!(game.controller.state(), SessionState::Ready);

    let snapshot = game.snapshot();
    assert_eq!(snapshot.play_seconds, 50);
    assert_eq!(snapshot.frame.time_left, 50);
    assert!(snapshot.frame.controls.start_enabled);
    assert!(!snapshot.frame.controls.stop_enabled);
}

#[tokio::test]
async fn large_totals_are_capped() {
    let room = Classroom::new();
    room.backend.set_local_total(room.student, 1000);
    let state = room.state();
    let token = AccessToken::new(STUDENT_TOKEN);
    let me = state.points.whoami(&token).await.unwrap();

    let game = state.game.load(&token, &me.user).await.unwrap();
    assert_eq!(game.snapshot().play_seconds, 180);
}

#[tokio::test]
async fn no_team_means_no_controller() {
    let room = Classroom::new();
    let state = room.state();
    let token = AccessToken::new(STUDENT_TOKEN);
    let me = state.points.whoami(&token).await.unwrap();

    let err = state.game.load(&token, &me.user).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(NotFoundKind::LocalTeam, _)));
}

#[tokio::test(start_paused = true)]
async fn loaded_game_plays_to_completion() {
    let room = Classroom::new();
    room.backend.set_local_total(room.student, 0);
    let state = room.state_with_tick(Duration::from_secs(1));
    let token = AccessToken::new(STUDENT_TOKEN);
    let me = state.points.whoami(&token).await.unwrap();
    let game = state.game.load(&token, &me.user).await.unwrap();

    let mut frames = game.controller.subscribe();
    assert!(game.controller.start());

    loop {
        frames.changed().await.unwrap();
        if frames.borrow_and_update().status == SessionState::Finished {
            break;
        }
    }
    let last = game.controller.frame();
    assert_eq!(last.time_left, 0);
    assert!(last.game_over);
    assert_eq!(last.filled_cells(), 0);
}
