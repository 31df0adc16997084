use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind,
};
use log::*;
use ratatui::{Terminal, backend::Backend};
use std::{
    error::Error,
    io::Write,
    path::PathBuf,
    sync::mpsc,
    thread,
};
use tokio::{
    sync::watch,
    time::{Duration, Instant},
};
use trackside_core::{
    event::{EventKind, EventLog},
    snapshot::{MatchPhase, MatchSnapshot},
    sport::{PeriodStructure, Sport},
    team::{SideBundle, TeamSide},
    validate::{validate_event_label, validate_game_time, validate_opponent_name},
};

use crate::{
    behavior::{GameContext, GestureAction, InteractionProfile, UiState, UserContext},
    config::Config,
    engine::MatchEngine,
    export::{ExportFormat, MatchSummary},
    feedback::{Cue, Feedback},
    gesture::{Classified, PointerSample, PointerTracker},
    health::HealthStatus,
    store::{self, OfflineGame},
    ui,
};

// Terminal cells are coarse; scale them to nominal pixels so the gesture
// thresholds keep their meaning.
const CELL_WIDTH_PX: f32 = 8.0;
const CELL_HEIGHT_PX: f32 = 16.0;

const EXPORT_BASE_NAME: &str = "match-summary";

// A destructive key or gesture must repeat within this window to confirm
const CONFIRM_WINDOW: Duration = Duration::from_secs(3);

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16),
    Tick,
    Health(HealthStatus),
}

/// Spawns the tick and input threads, returning the merged event stream.
/// Health results arrive on the same stream via a bridge thread.
pub fn spawn_event_threads(
    tick_ms: u64,
    health_rx: mpsc::Receiver<HealthStatus>,
) -> mpsc::Receiver<AppEvent> {
    let (tx, rx) = mpsc::channel();

    let tick_tx = tx.clone();
    thread::spawn(move || {
        loop {
            if tick_tx.send(AppEvent::Tick).is_err() {
                break;
            }
            thread::sleep(std::time::Duration::from_millis(tick_ms));
        }
    });

    let health_tx = tx.clone();
    thread::spawn(move || {
        while let Ok(status) = health_rx.recv() {
            if health_tx.send(AppEvent::Health(status)).is_err() {
                break;
            }
        }
    });

    thread::spawn(move || {
        loop {
            let evt = match event::read() {
                Ok(Event::Key(key)) => Some(AppEvent::Key(key)),
                Ok(Event::Mouse(mouse)) => Some(AppEvent::Mouse(mouse)),
                Ok(Event::Resize(cols, _)) => Some(AppEvent::Resize(cols)),
                Ok(_) => None,
                Err(e) => {
                    error!("Failed to read a terminal event: {e}");
                    break;
                }
            };

            if let Some(evt) = evt {
                if tx.send(evt).is_err() {
                    break;
                }
            }
        }
    });

    rx
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextTarget {
    OpponentName,
    EventNote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Destructive {
    Undo,
    EndMatch,
}

pub struct App {
    config: Config,
    engine: MatchEngine,
    user: UserContext,
    pub ui_state: UiState,
    snapshot: Option<MatchSnapshot>,
    tracker: PointerTracker,
    feedback: Feedback,
    health: HealthStatus,
    clock_rx: watch::Receiver<bool>,
    status_line: Option<String>,
    text_entry: Option<(TextTarget, String)>,
    pending_confirm: Option<(Destructive, Instant)>,
    analysis_scroll: usize,
    data_dir: PathBuf,
    last_scores: SideBundle<u16>,
    last_phase: MatchPhase,
}

impl App {
    pub fn new(config: Config, user: UserContext, data_dir: PathBuf, now: Instant) -> Self {
        let mut engine = MatchEngine::new(config.game.sport);
        engine.set_opponent_name(config.game.opponent_name.clone());

        let mut status_line = None;
        match store::load(&store::offline_game_path(&data_dir)) {
            Ok(Some(saved)) => {
                info!(
                    "Found saved match data from {} ({} events)",
                    saved.saved_at,
                    saved.events.len()
                );
                if saved.phase != MatchPhase::Finished {
                    let _ = engine.set_sport(saved.sport);
                    engine.set_opponent_name(saved.opponent_name.clone());
                    status_line = Some(format!(
                        "Recovered setup from an unfinished match vs {}",
                        saved.opponent_name
                    ));
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Could not read the saved match: {e}"),
        }

        let clock_rx = engine.get_start_stop_rx();
        let game = Self::game_context_for(&engine, now);
        let ui_state = UiState::derive(&game, &user);
        let force_touch = user.force_touch;

        Self {
            config,
            engine,
            user,
            ui_state,
            snapshot: None,
            tracker: PointerTracker::new(force_touch),
            feedback: Feedback::new(),
            health: HealthStatus::Unknown,
            clock_rx,
            status_line,
            text_entry: None,
            pending_confirm: None,
            analysis_scroll: 0,
            data_dir,
            last_scores: Default::default(),
            last_phase: MatchPhase::Setup,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sport(&self) -> Sport {
        self.engine.sport()
    }

    pub fn rules(&self) -> &PeriodStructure {
        self.engine.rules()
    }

    pub fn opponent_name(&self) -> &str {
        self.engine.opponent_name()
    }

    pub fn editing_name(&self) -> Option<&str> {
        match &self.text_entry {
            Some((TextTarget::OpponentName, partial)) => Some(partial),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> Option<&MatchSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn events(&self) -> &EventLog {
        self.engine.events()
    }

    pub fn scores(&self) -> SideBundle<u16> {
        self.engine.scores()
    }

    pub fn analysis_scroll(&self) -> usize {
        self.analysis_scroll
    }

    pub fn status_line(&self) -> Option<&str> {
        self.status_line.as_deref()
    }

    pub fn health_status(&self) -> HealthStatus {
        self.health
    }

    pub fn set_health(&mut self, status: HealthStatus) {
        if status != self.health {
            info!("Remote status changed to {status}");
        }
        self.health = status;
    }

    pub fn flashing(&self) -> bool {
        self.feedback.flashing(Instant::now())
    }

    pub fn take_announcement(&mut self) -> Option<String> {
        self.feedback
            .announcement(Instant::now())
            .map(|text| text.to_string())
    }

    pub fn take_bell(&mut self) -> bool {
        self.feedback.take_bell()
    }

    pub fn on_resize(&mut self, cols: u16) {
        let detected = UserContext::detect(
            cols,
            self.user.one_handed,
            self.user.haptics,
            self.user.audio,
        );
        self.user.device = detected.device;
    }

    fn game_context_for(engine: &MatchEngine, now: Instant) -> GameContext {
        let in_progress = matches!(
            engine.phase(),
            MatchPhase::Period(_) | MatchPhase::Interval(_) | MatchPhase::Overtime
        );
        GameContext {
            is_running: in_progress,
            event_count: engine.events().len(),
            score_difference: engine.score_difference(),
            time_in_game: engine
                .play_time_elapsed(now)
                .unwrap_or(tokio::time::Duration::ZERO),
            finished: engine.finished(),
        }
    }

    /// Advances the engine, drains the gesture and clock channels, and
    /// rebuilds the derived UI state.
    pub fn on_tick(&mut self, now: Instant) {
        if let Err(e) = self.engine.update(now) {
            error!("Engine update failed: {e}");
            self.status_line = Some(e.to_string());
        }

        if self.clock_rx.has_changed().unwrap_or(false) {
            let running = *self.clock_rx.borrow_and_update();
            let cue = if running {
                Cue::ClockStarted
            } else {
                Cue::ClockStopped
            };
            self.feedback.trigger(cue, &self.ui_state.feedback, now);
        }

        if let Some(classified) = self.tracker.poll(now) {
            self.apply_gesture(classified, now);
        }

        let phase = self.engine.phase();
        if phase != self.last_phase {
            if self.last_phase.is_play() {
                self.feedback
                    .trigger(Cue::PhaseEnded, &self.ui_state.feedback, now);
            }
            self.last_phase = phase;
            self.save_offline(now);
        }

        let scores = self.engine.scores();
        if scores != self.last_scores {
            for (side, score) in scores.iter() {
                if *score > self.last_scores[side] {
                    self.feedback
                        .trigger(Cue::Score(side), &self.ui_state.feedback, now);
                }
            }
            self.last_scores = scores;
        }

        self.snapshot = self.engine.generate_snapshot(now);
        let game = Self::game_context_for(&self.engine, now);
        self.ui_state = UiState::derive(&game, &self.user);
        self.tracker.set_timing(
            self.ui_state.interaction.long_press_ms,
            self.ui_state.interaction.double_tap_ms,
        );
        // The settings file can force announcements on in every mode
        if self.config.feedback.announce_events {
            self.ui_state.feedback.announce_events = true;
        }
    }

    /// Returns `true` when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }

        if self.text_entry.is_some() {
            self.handle_text_entry(key);
            return false;
        }

        self.status_line = None;

        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char(' ') => self.toggle_clock(now),
            KeyCode::Char('o') => {
                self.user.one_handed = !self.user.one_handed;
                info!("One-handed mode: {}", self.user.one_handed);
            }
            KeyCode::Char('s') if self.engine.phase() == MatchPhase::Setup => {
                let next = enum_iterator::next(&self.engine.sport())
                    .or_else(enum_iterator::first)
                    .unwrap_or_default();
                if let Err(e) = self.engine.set_sport(next) {
                    self.status_line = Some(e.to_string());
                }
            }
            KeyCode::Char('n') if self.engine.phase() == MatchPhase::Setup => {
                self.text_entry = Some((
                    TextTarget::OpponentName,
                    self.engine.opponent_name().to_string(),
                ));
            }
            KeyCode::Char('n') if self.engine.finished() => {
                self.engine.reset_match(now);
                self.analysis_scroll = 0;
                if let Err(e) = store::clear(&store::offline_game_path(&self.data_dir)) {
                    warn!("Could not clear the saved match: {e}");
                }
            }
            KeyCode::Char('b') if self.engine.phase() == MatchPhase::Setup => {
                if let Err(e) = self.engine.begin_match(now) {
                    self.status_line = Some(e.to_string());
                }
            }
            KeyCode::Char('a') if self.engine.finished() => {
                self.text_entry = Some((TextTarget::EventNote, String::new()));
            }
            KeyCode::Char('g') => self.record(EventKind::Goal, TeamSide::Us, now),
            KeyCode::Char('h') => self.record(EventKind::Goal, TeamSide::Them, now),
            KeyCode::Char('p') => self.record(EventKind::Penalty, TeamSide::Us, now),
            KeyCode::Char('P') => self.record(EventKind::Penalty, TeamSide::Them, now),
            KeyCode::Char('f') => self.record(EventKind::Foul, TeamSide::Us, now),
            KeyCode::Char('F') => self.record(EventKind::Foul, TeamSide::Them, now),
            KeyCode::Char('y') => self.record(EventKind::YellowCard, TeamSide::Us, now),
            KeyCode::Char('Y') => self.record(EventKind::YellowCard, TeamSide::Them, now),
            KeyCode::Char('r') => self.record(EventKind::RedCard, TeamSide::Us, now),
            KeyCode::Char('R') => self.record(EventKind::RedCard, TeamSide::Them, now),
            KeyCode::Char('c') => self.record(EventKind::Corner, TeamSide::Us, now),
            KeyCode::Char('t') => self.record(EventKind::Timeout, TeamSide::Us, now),
            KeyCode::Char('T') => self.record(EventKind::Timeout, TeamSide::Them, now),
            KeyCode::Char('u') => self.confirm_then(Destructive::Undo, now),
            KeyCode::Char('+') | KeyCode::Char('=') => self.adjust_clock(60, now),
            KeyCode::Char('-') => self.adjust_clock(-60, now),
            KeyCode::Char('m') => self.confirm_then(Destructive::EndMatch, now),
            KeyCode::Char('x') => self.export_all(),
            KeyCode::Up => {
                self.analysis_scroll = self.analysis_scroll.saturating_sub(1);
            }
            KeyCode::Down => {
                let max = self.engine.events().len().saturating_sub(1);
                self.analysis_scroll = (self.analysis_scroll + 1).min(max);
            }
            _ => {}
        }

        false
    }

    fn handle_text_entry(&mut self, key: KeyEvent) {
        let Some((target, mut partial)) = self.text_entry.take() else {
            return;
        };
        match key.code {
            KeyCode::Esc => {}
            KeyCode::Enter => self.commit_text_entry(target, &partial),
            KeyCode::Backspace => {
                partial.pop();
                self.text_entry = Some((target, partial));
            }
            KeyCode::Char(c) => {
                partial.push(c);
                self.text_entry = Some((target, partial));
            }
            _ => self.text_entry = Some((target, partial)),
        }
    }

    fn commit_text_entry(&mut self, target: TextTarget, partial: &str) {
        match target {
            TextTarget::OpponentName => match validate_opponent_name(partial) {
                Ok(name) => {
                    self.config.game.opponent_name = name.clone();
                    self.engine.set_opponent_name(name);
                }
                Err(e) => self.status_line = Some(e.to_string()),
            },
            TextTarget::EventNote => match validate_event_label(partial) {
                Ok(note) => match self.engine.amend_last(None, Some(note), None) {
                    Ok(id) => self.status_line = Some(format!("Added a note to event {id}")),
                    Err(e) => self.status_line = Some(e.to_string()),
                },
                Err(e) => self.status_line = Some(e.to_string()),
            },
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        let sample = PointerSample::new(
            mouse.column as f32 * CELL_WIDTH_PX,
            mouse.row as f32 * CELL_HEIGHT_PX,
            now,
        );
        match mouse.kind {
            MouseEventKind::Down(_) => self.tracker.press(sample),
            MouseEventKind::Drag(_) => self.tracker.moved(0, sample),
            MouseEventKind::Up(_) => {
                if let Some(classified) = self.tracker.release(now) {
                    self.apply_gesture(classified, now);
                }
            }
            _ => {}
        }
    }

    fn apply_gesture(&mut self, classified: Classified, now: Instant) {
        let action = InteractionProfile::binding(self.ui_state.mode, classified.gesture);
        debug!(
            "Gesture {:?} (confidence {:.2}) -> {action:?}",
            classified.gesture, classified.confidence
        );
        match action {
            GestureAction::RecordGoalUs => self.record(EventKind::Goal, TeamSide::Us, now),
            GestureAction::RecordGoalThem => self.record(EventKind::Goal, TeamSide::Them, now),
            GestureAction::UndoLast => self.confirm_then(Destructive::Undo, now),
            GestureAction::ToggleClock => self.toggle_clock(now),
            GestureAction::OpenEventMenu => {
                self.status_line =
                    Some("p: penalty  f: foul  y/r: cards  c: corner  t: timeout".to_string());
            }
            GestureAction::NextView => {
                self.analysis_scroll = self.analysis_scroll.saturating_add(5);
            }
            GestureAction::PrevView => {
                self.analysis_scroll = self.analysis_scroll.saturating_sub(5);
            }
            GestureAction::None => {}
        }
    }

    /// Nudges a stopped clock by whole minutes, capped at the period length.
    fn adjust_clock(&mut self, delta_secs: i64, now: Instant) {
        let Some(current) = self.engine.game_clock_time(now) else {
            return;
        };
        let target = if delta_secs >= 0 {
            current + Duration::from_secs(delta_secs as u64)
        } else {
            current.saturating_sub(Duration::from_secs(delta_secs.unsigned_abs()))
        };
        let result = validate_game_time(target, self.engine.rules())
            .map_err(|e| e.to_string())
            .and_then(|time| self.engine.set_clock_time(time).map_err(|e| e.to_string()));
        if let Err(msg) = result {
            self.status_line = Some(msg);
        }
    }

    fn toggle_clock(&mut self, now: Instant) {
        let result = if self.engine.clock_is_running() {
            self.engine.stop_clock(now)
        } else {
            self.engine.start_clock(now)
        };
        if let Err(e) = result {
            self.status_line = Some(e.to_string());
        }
    }

    fn record(&mut self, kind: EventKind, side: TeamSide, now: Instant) {
        match self.engine.record_event(kind, side, None, now) {
            Ok(_) => {
                self.feedback
                    .trigger(Cue::Event(side, kind), &self.ui_state.feedback, now);
                self.save_offline(now);
            }
            Err(e) => {
                self.status_line = Some(e.to_string());
            }
        }
    }

    /// Runs a destructive action, or arms it for a confirming repeat when the
    /// active mode asks for one. A repeat outside the window re-arms.
    fn confirm_then(&mut self, action: Destructive, now: Instant) {
        if !self.ui_state.interaction.confirm_destructive {
            self.run_destructive(action, now);
            return;
        }
        match self.pending_confirm.take() {
            Some((armed, at))
                if armed == action && now.saturating_duration_since(at) <= CONFIRM_WINDOW =>
            {
                self.run_destructive(action, now);
            }
            _ => {
                self.pending_confirm = Some((action, now));
                self.status_line = Some(match action {
                    Destructive::Undo => "Repeat to confirm removing the last event".to_string(),
                    Destructive::EndMatch => "Repeat to confirm ending the match".to_string(),
                });
            }
        }
    }

    fn run_destructive(&mut self, action: Destructive, now: Instant) {
        match action {
            Destructive::Undo => self.undo(now),
            Destructive::EndMatch => self.end_match(now),
        }
    }

    fn end_match(&mut self, now: Instant) {
        if let Err(e) = self.engine.end_match_now(now) {
            self.status_line = Some(e.to_string());
        } else {
            self.save_offline(now);
        }
    }

    fn undo(&mut self, now: Instant) {
        match self.engine.undo_last(now) {
            Ok(event) => {
                self.status_line = Some(format!("Removed {} by {}", event.label, event.side));
                self.feedback
                    .trigger(Cue::Undo, &self.ui_state.feedback, now);
                self.save_offline(now);
            }
            Err(e) => {
                self.status_line = Some(e.to_string());
            }
        }
    }

    fn save_offline(&self, now: Instant) {
        if self.engine.phase() == MatchPhase::Setup {
            return;
        }
        let Some(game) = OfflineGame::capture(&self.engine, now) else {
            return;
        };
        if let Err(e) = store::save(&game, &store::offline_game_path(&self.data_dir)) {
            warn!("Could not save the match state: {e}");
        }
    }

    fn export_all(&mut self) {
        let summary = MatchSummary::from_engine(&self.engine);
        let mut failed = false;
        for format in [ExportFormat::Csv, ExportFormat::Json, ExportFormat::Html] {
            let path = self
                .data_dir
                .join(format!("{EXPORT_BASE_NAME}.{}", format.extension()));
            if let Err(e) = summary.write_to(format, &path) {
                error!("Export failed: {e}");
                self.status_line = Some(e.to_string());
                failed = true;
            }
        }
        if !failed {
            self.status_line = Some(format!(
                "Exported {EXPORT_BASE_NAME}.{{csv,json,html}} to {}",
                self.data_dir.display()
            ));
        }
    }

    /// Final save before the terminal is torn down.
    pub fn shutdown(&self, now: Instant) {
        self.save_offline(now);
        if let Err(e) = confy::store(crate::APP_NAME, None, &self.config) {
            warn!("Could not store the settings: {e}");
        }
    }
}

pub fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    events: &mpsc::Receiver<AppEvent>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        match events.recv()? {
            AppEvent::Tick => {
                app.on_tick(Instant::now());
                if app.ui_state.performance.redraw_on_tick || app.flashing() {
                    terminal.draw(|f| ui::draw(app, f))?;
                }
            }
            AppEvent::Key(key) => {
                if app.handle_key(key, Instant::now()) {
                    break;
                }
                terminal.draw(|f| ui::draw(app, f))?;
            }
            AppEvent::Mouse(mouse) => {
                app.handle_mouse(mouse, Instant::now());
            }
            AppEvent::Resize(cols) => {
                app.on_resize(cols);
                terminal.draw(|f| ui::draw(app, f))?;
            }
            AppEvent::Health(status) => {
                app.set_health(status);
            }
        }

        if app.take_bell() {
            let mut stdout = std::io::stdout();
            let _ = stdout.write_all(b"\x07");
            let _ = stdout.flush();
        }
    }

    Ok(())
}
