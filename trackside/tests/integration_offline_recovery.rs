use tokio::time::Instant;

use trackside::{
    app::App,
    behavior::UserContext,
    config::Config,
    engine::MatchEngine,
    store::{self, OfflineGame},
};
use trackside_core::{event::EventKind, sport::Sport, team::TeamSide};

fn saved_match(dir: &std::path::Path) {
    let mut engine = MatchEngine::new(Sport::Hockey);
    let now = Instant::now();
    engine.set_opponent_name("Rockets".to_string());
    engine.begin_match(now).unwrap();
    engine.start_clock(now).unwrap();
    engine
        .record_event(EventKind::Goal, TeamSide::Us, Some(7), now)
        .unwrap();

    let game = OfflineGame::capture(&engine, now).unwrap();
    store::save(&game, &store::offline_game_path(dir)).unwrap();
}

#[test]
fn unfinished_match_restores_the_setup() {
    let dir = tempfile::tempdir().unwrap();
    saved_match(dir.path());

    let app = App::new(
        Config::default(),
        UserContext::default(),
        dir.path().to_path_buf(),
        Instant::now(),
    );

    assert_eq!(app.sport(), Sport::Hockey);
    assert_eq!(app.opponent_name(), "Rockets");
    assert!(app.status_line().unwrap().contains("Rockets"));
}

#[test]
fn finished_match_is_left_alone() {
    let dir = tempfile::tempdir().unwrap();

    let mut engine = MatchEngine::new(Sport::Handball);
    let now = Instant::now();
    engine.set_opponent_name("Vipers".to_string());
    engine.begin_match(now).unwrap();
    engine.end_match_now(now).unwrap();
    let game = OfflineGame::capture(&engine, now).unwrap();
    store::save(&game, &store::offline_game_path(dir.path())).unwrap();

    let app = App::new(
        Config::default(),
        UserContext::default(),
        dir.path().to_path_buf(),
        Instant::now(),
    );

    // A completed save never overrides the configured defaults
    assert_eq!(app.sport(), Sport::Soccer);
    assert_eq!(app.opponent_name(), "Opponent");
    assert_eq!(app.status_line(), None);
}
