use log::*;
use std::cmp::Ordering;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::{
    sync::watch,
    time::{Duration, Instant},
};
use trackside_core::{
    event::{EventId, EventKind, EventLog, GameEvent},
    penalty::{Penalty, PenaltyError, PenaltyKind},
    snapshot::{MatchPhase, MatchSnapshot},
    sport::{PeriodStructure, Sport, score_for},
    team::{SideBundle, TeamSide},
};

const RECENT_EVENT_TIME: Duration = Duration::from_secs(10);

/// Owns all state of one match: the clock, the phase machine, the event log,
/// scores, and active penalties. All time queries take an explicit `now` so
/// the engine never reads the wall clock on its own.
#[derive(Debug)]
pub struct MatchEngine {
    sport: Sport,
    rules: PeriodStructure,
    opponent_name: String,
    phase: MatchPhase,
    clock_state: ClockState,
    events: EventLog,
    scores: SideBundle<u16>,
    penalties: SideBundle<Vec<Penalty>>,
    start_stop_tx: watch::Sender<bool>,
    start_stop_rx: watch::Receiver<bool>,
    recent_event: Option<(TeamSide, EventKind, MatchPhase, Duration)>,
    started_at: Option<OffsetDateTime>,
    ended_at: Option<OffsetDateTime>,
}

impl MatchEngine {
    pub fn new(sport: Sport) -> Self {
        let rules = sport.period_structure();
        let (start_stop_tx, start_stop_rx) = watch::channel(false);
        Self {
            sport,
            rules,
            opponent_name: "Opponent".to_string(),
            phase: MatchPhase::Setup,
            clock_state: ClockState::Stopped {
                clock_time: rules.period_duration,
            },
            events: EventLog::new(),
            scores: Default::default(),
            penalties: Default::default(),
            start_stop_tx,
            start_stop_rx,
            recent_event: None,
            started_at: None,
            ended_at: None,
        }
    }

    pub fn sport(&self) -> Sport {
        self.sport
    }

    pub fn rules(&self) -> &PeriodStructure {
        &self.rules
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn finished(&self) -> bool {
        self.phase == MatchPhase::Finished
    }

    pub fn scores(&self) -> SideBundle<u16> {
        self.scores
    }

    pub fn score_difference(&self) -> i32 {
        self.scores.us as i32 - self.scores.them as i32
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn opponent_name(&self) -> &str {
        &self.opponent_name
    }

    pub fn set_opponent_name(&mut self, name: String) {
        info!("Opponent name set to {name:?}");
        self.opponent_name = name;
    }

    pub fn started_at(&self) -> Option<OffsetDateTime> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<OffsetDateTime> {
        self.ended_at
    }

    /// The sport can only be changed before the match starts.
    pub fn set_sport(&mut self, sport: Sport) -> Result<()> {
        if self.phase != MatchPhase::Setup {
            return Err(EngineError::MatchInProgress);
        }
        info!("Sport set to {sport}");
        self.sport = sport;
        self.rules = sport.period_structure();
        self.clock_state = ClockState::Stopped {
            clock_time: self.rules.period_duration,
        };
        Ok(())
    }

    pub fn clock_is_running(&self) -> bool {
        self.clock_state.is_running()
    }

    pub fn get_start_stop_rx(&self) -> watch::Receiver<bool> {
        self.start_stop_rx.clone()
    }

    fn send_clock_running(&self, running: bool) {
        self.start_stop_tx.send(running).unwrap();
    }

    /// Moves from `Setup` into the first period with the clock stopped.
    pub fn begin_match(&mut self, now: Instant) -> Result<()> {
        if self.phase != MatchPhase::Setup {
            return Err(EngineError::WrongPhase(self.phase));
        }
        info!("{} Starting match vs {}", self.status_string(now), self.opponent_name);
        self.phase = MatchPhase::Period(1);
        self.clock_state = ClockState::Stopped {
            clock_time: self.rules.period_duration,
        };
        self.started_at = Some(calculate_timestamp(now));
        Ok(())
    }

    pub fn start_clock(&mut self, now: Instant) -> Result<()> {
        match self.phase {
            MatchPhase::Setup | MatchPhase::Finished => {
                return Err(EngineError::WrongPhase(self.phase));
            }
            MatchPhase::Period(_) | MatchPhase::Interval(_) | MatchPhase::Overtime => {}
        }
        if let ClockState::Stopped { clock_time } = self.clock_state {
            info!("{} Starting the clock", self.status_string(now));
            self.clock_state = ClockState::CountingDown {
                start_time: now,
                time_remaining_at_start: clock_time,
            };
            self.send_clock_running(true);
        }
        Ok(())
    }

    pub fn stop_clock(&mut self, now: Instant) -> Result<()> {
        if let ClockState::CountingDown { .. } = self.clock_state {
            info!("{} Stopping the clock", self.status_string(now));
            self.clock_state = ClockState::Stopped {
                clock_time: self
                    .clock_state
                    .clock_time(now)
                    .ok_or(EngineError::NeedsUpdate)?,
            };
            self.send_clock_running(false);
        }
        Ok(())
    }

    pub fn set_clock_time(&mut self, clock_time: Duration) -> Result<()> {
        if self.clock_is_running() {
            return Err(EngineError::ClockIsRunning);
        }
        let time = clock_time.as_secs_f64();
        info!(
            "Setting clock to {:02.0}:{:06.3}",
            (time / 60.0).floor(),
            time % 60.0
        );
        self.clock_state = ClockState::Stopped { clock_time };
        Ok(())
    }

    /// Returns `None` if the clock time would be negative, or if `now` is
    /// before the start of the current phase
    pub fn game_clock_time(&self, now: Instant) -> Option<Duration> {
        trace!(
            "Getting clock time with clock state {:?} and now time {now:?}",
            self.clock_state
        );
        self.clock_state.clock_time(now)
    }

    /// Total play time elapsed since the first period began: completed play
    /// phases plus the elapsed portion of the current one.
    pub fn play_time_elapsed(&self, now: Instant) -> Option<Duration> {
        let mut elapsed = Duration::ZERO;
        let mut phase = MatchPhase::Period(1);
        while phase.compare(self.phase, &self.rules) == Ordering::Less {
            if phase.is_play() {
                elapsed += phase.duration(&self.rules).unwrap();
            }
            phase = phase.next(&self.rules)?;
        }
        if self.phase.is_play() {
            let remaining = self.game_clock_time(now)?;
            elapsed += self.phase.time_elapsed_at(remaining, &self.rules)?;
        }
        Some(elapsed)
    }

    /// Rolls the phase forward when the clock has expired. Must be called
    /// periodically while the clock runs.
    pub fn update(&mut self, now: Instant) -> Result<()> {
        let ClockState::CountingDown {
            start_time,
            time_remaining_at_start,
        } = self.clock_state
        else {
            return Ok(());
        };

        let time = now
            .checked_duration_since(start_time)
            .ok_or(EngineError::InvalidNowValue)?;
        if time < time_remaining_at_start {
            return Ok(());
        }

        let boundary = start_time + time_remaining_at_start;
        let mut need_cull = false;
        let next = match self.phase {
            MatchPhase::Period(n) if n < self.rules.regulation_periods => {
                info!("{} Entering interval {n}", self.status_string(now));
                MatchPhase::Interval(n)
            }
            MatchPhase::Period(_) => self.end_regulation(now),
            MatchPhase::Interval(n) => {
                info!("{} Entering period {}", self.status_string(now), n + 1);
                need_cull = true;
                MatchPhase::Period(n + 1)
            }
            MatchPhase::Overtime => {
                info!(
                    "{} Overtime complete. Score is {}",
                    self.status_string(now),
                    self.scores
                );
                MatchPhase::Finished
            }
            MatchPhase::Setup | MatchPhase::Finished => {
                error!(
                    "{} Impossible state: clock counting down in {}",
                    self.status_string(now),
                    self.phase
                );
                return Err(EngineError::InvalidState);
            }
        };

        self.phase = next;
        if self.phase == MatchPhase::Finished {
            self.end_match(now);
        } else {
            self.clock_state = ClockState::CountingDown {
                start_time: boundary,
                time_remaining_at_start: self.phase.duration(&self.rules).unwrap(),
            };
            if need_cull {
                self.cull_penalties(now)?;
            }
        }

        Ok(())
    }

    fn end_regulation(&mut self, now: Instant) -> MatchPhase {
        if self.scores.are_not_equal() || self.rules.overtime.is_none() {
            info!(
                "{} Regulation complete. Score is {}",
                self.status_string(now),
                self.scores
            );
            MatchPhase::Finished
        } else {
            info!(
                "{} Entering overtime. Score is {}",
                self.status_string(now),
                self.scores
            );
            MatchPhase::Overtime
        }
    }

    fn end_match(&mut self, now: Instant) {
        info!(
            "{} Match over. Final score is {}",
            self.status_string(now),
            self.scores
        );
        self.clock_state = ClockState::Stopped {
            clock_time: Duration::ZERO,
        };
        self.ended_at = Some(calculate_timestamp(now));
        self.send_clock_running(false);
    }

    /// Ends the match immediately from any play phase (referee's final whistle).
    pub fn end_match_now(&mut self, now: Instant) -> Result<()> {
        match self.phase {
            MatchPhase::Setup | MatchPhase::Finished => Err(EngineError::WrongPhase(self.phase)),
            MatchPhase::Period(_) | MatchPhase::Interval(_) | MatchPhase::Overtime => {
                self.phase = MatchPhase::Finished;
                self.end_match(now);
                Ok(())
            }
        }
    }

    /// Records an event for `side`. Scoring kinds adjust the score; penalty
    /// and card kinds also open a timed penalty where the sport sits players.
    pub fn record_event(
        &mut self,
        kind: EventKind,
        side: TeamSide,
        player_number: Option<u8>,
        now: Instant,
    ) -> Result<EventId> {
        match self.phase {
            MatchPhase::Setup => return Err(EngineError::WrongPhase(self.phase)),
            MatchPhase::Finished => return Err(EngineError::MatchOver),
            MatchPhase::Period(_) | MatchPhase::Interval(_) | MatchPhase::Overtime => {}
        }
        let Some(profile) = self.sport.profile(kind) else {
            warn!("{} does not use {kind} events, dropping", self.sport);
            return Err(EngineError::EventNotInSport(kind, self.sport));
        };

        let game_time = self.play_time_elapsed(now).ok_or(EngineError::NeedsUpdate)?;
        let id = self.events.append(
            kind,
            side,
            profile.name.to_string(),
            self.phase,
            game_time,
            calculate_timestamp(now),
            player_number,
        );
        info!(
            "{} {} by {side}{}",
            self.status_string(now),
            profile.name,
            player_number.map(|n| format!(" player #{n}")).unwrap_or_default()
        );

        if profile.points > 0 {
            self.refresh_scores(now);
        }

        if let Some(penalty_kind) = self.sport.penalty_kind(kind) {
            let start_time = self
                .game_clock_time(now)
                .ok_or(EngineError::NeedsUpdate)?;
            self.penalties[side].push(Penalty {
                kind: penalty_kind,
                event_id: id,
                player_number,
                start_phase: self.phase,
                start_time,
            });
            info!(
                "{} Started a {penalty_kind:?} penalty for {side}",
                self.status_string(now)
            );
        }

        self.recent_event = self
            .game_clock_time(now)
            .map(|time| (side, kind, self.phase, time));

        Ok(id)
    }

    /// Removes the newest event and symmetrically reverses its score and
    /// penalty effects.
    pub fn undo_last(&mut self, now: Instant) -> Result<GameEvent> {
        let event = self.events.undo_last().ok_or(EngineError::NothingToUndo)?;
        info!(
            "{} Undoing {} by {}",
            self.status_string(now),
            event.kind,
            event.side
        );
        self.penalties[event.side].retain(|pen| pen.event_id != event.id);
        self.refresh_scores(now);
        self.recent_event = None;
        Ok(event)
    }

    /// Replaces the newest event's label, note, or player number.
    pub fn amend_last(
        &mut self,
        label: Option<String>,
        note: Option<String>,
        player_number: Option<u8>,
    ) -> Result<EventId> {
        self.events
            .amend_last(label, note, player_number)
            .ok_or(EngineError::NothingToUndo)
    }

    fn refresh_scores(&mut self, now: Instant) {
        let scores = SideBundle {
            us: score_for(self.events.events(), self.sport, TeamSide::Us),
            them: score_for(self.events.events(), self.sport, TeamSide::Them),
        };
        if scores != self.scores {
            self.scores = scores;
            info!("{} Score is now {scores}", self.status_string(now));
        }
    }

    fn cull_penalties(&mut self, now: Instant) -> Result<()> {
        let cur_time = self.game_clock_time(now).ok_or(EngineError::NeedsUpdate)?;
        info!("{} Culling penalties", self.status_string(now));

        for (_, pens) in self.penalties.iter_mut() {
            let keep = pens
                .iter()
                .map(|pen| pen.is_complete(self.phase, cur_time, &self.rules).map(|c| !c))
                .collect::<std::result::Result<Vec<_>, PenaltyError>>()?;
            let mut keep = keep.into_iter();
            pens.retain(|_| keep.next().unwrap());
        }

        Ok(())
    }

    pub fn generate_snapshot(&mut self, now: Instant) -> Option<MatchSnapshot> {
        trace!("Generating snapshot");
        let cur_time = self.game_clock_time(now)?;
        let secs_in_phase = cur_time.as_secs().try_into().ok()?;

        let mut penalties: SideBundle<Vec<_>> = Default::default();
        for (side, pens) in self.penalties.iter() {
            penalties[side] = pens
                .iter()
                .map(|pen| pen.as_snapshot(self.phase, cur_time, &self.rules))
                .collect::<std::result::Result<Vec<_>, _>>()
                .ok()?;
            penalties[side].sort_by(|a, b| a.time.cmp(&b.time));
        }

        if let Some((_, _, event_phase, event_time)) = self.recent_event {
            if (event_phase != self.phase)
                || (event_time.saturating_sub(cur_time) > RECENT_EVENT_TIME)
            {
                self.recent_event = None;
            }
        }

        Some(MatchSnapshot {
            phase: self.phase,
            secs_in_phase,
            clock_running: self.clock_is_running(),
            scores: self.scores,
            penalties: SideBundle {
                us: penalties.us.into_iter().take(3).collect(),
                them: penalties.them.into_iter().take(3).collect(),
            },
            event_count: self.events.len(),
            recent_event: self.recent_event.map(|(side, kind, _, _)| (side, kind)),
        })
    }

    /// Clears everything back to `Setup`, keeping the sport and opponent.
    pub fn reset_match(&mut self, now: Instant) {
        info!("{} Resetting match", self.status_string(now));
        self.phase = MatchPhase::Setup;
        self.clock_state = ClockState::Stopped {
            clock_time: self.rules.period_duration,
        };
        self.events = EventLog::new();
        self.scores = Default::default();
        self.penalties.iter_mut().for_each(|(_, p)| p.clear());
        self.recent_event = None;
        self.started_at = None;
        self.ended_at = None;
        self.send_clock_running(false);
    }

    fn status_string(&self, now: Instant) -> String {
        use std::fmt::Write;

        let mut string = String::new();

        if let Some(time) = self.game_clock_time(now).map(|dur| dur.as_secs_f64()) {
            if let Err(e) = write!(
                &mut string,
                "[{:02.0}:{:06.3} ",
                (time / 60.0).floor(),
                time % 60.0
            ) {
                error!("Error with time string: {}", e);
            }
        } else {
            string.push_str("[XX:XX.XXX ");
        }

        match self.phase {
            MatchPhase::Setup => string.push_str("SETUP]"),
            MatchPhase::Period(n) => {
                let _ = write!(&mut string, "PERD{n}]");
            }
            MatchPhase::Interval(n) => {
                let _ = write!(&mut string, "INTV{n}]");
            }
            MatchPhase::Overtime => string.push_str("OVRTM]"),
            MatchPhase::Finished => string.push_str("FINSH]"),
        }

        string
    }

    #[cfg(test)]
    pub(crate) fn set_phase_and_clock_time(&mut self, phase: MatchPhase, clock_time: Duration) {
        if let ClockState::Stopped { .. } = self.clock_state {
            self.phase = phase;
            self.clock_state = ClockState::Stopped { clock_time }
        } else {
            panic!("Can't edit phase and remaining time while clock is running");
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ClockState {
    Stopped {
        clock_time: Duration,
    },
    CountingDown {
        start_time: Instant,
        time_remaining_at_start: Duration,
    },
}

impl ClockState {
    fn is_running(&self) -> bool {
        match self {
            ClockState::CountingDown { .. } => true,
            ClockState::Stopped { .. } => false,
        }
    }

    /// Returns `None` if the clock time would be negative, or if `now` is
    /// before the start of the clock
    fn clock_time(&self, now: Instant) -> Option<Duration> {
        match self {
            ClockState::CountingDown {
                start_time,
                time_remaining_at_start,
            } => now
                .checked_duration_since(*start_time)
                .and_then(|s| time_remaining_at_start.checked_sub(s)),
            ClockState::Stopped { clock_time } => Some(*clock_time),
        }
    }
}

fn calculate_timestamp(instant: Instant) -> OffsetDateTime {
    let now = Instant::now();
    let mut timestamp = OffsetDateTime::now_utc();

    match instant.cmp(&now) {
        Ordering::Equal => {}
        Ordering::Less => {
            timestamp -= now - instant;
        }
        Ordering::Greater => {
            timestamp += instant - now;
        }
    }
    timestamp
}

#[derive(Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Can't edit clock time while clock is running")]
    ClockIsRunning,
    #[error("Action not possible during {0}")]
    WrongPhase(MatchPhase),
    #[error("{1} does not use {0} events")]
    EventNotInSport(EventKind, Sport),
    #[error("There are no events to undo")]
    NothingToUndo,
    #[error("The match is over")]
    MatchOver,
    #[error("The sport can only be changed before the match starts")]
    MatchInProgress,
    #[error("`update()` needs to be called before this action can be performed")]
    NeedsUpdate,
    #[error("The `now` value passed is not valid")]
    InvalidNowValue,
    #[error("The engine reached an impossible state")]
    InvalidState,
    #[error("Penalty error: {0}")]
    PenaltyError(#[from] PenaltyError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
