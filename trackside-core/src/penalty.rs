use crate::{
    event::EventId,
    snapshot::{MatchPhase, PenaltySnapshot, PenaltyTime},
    sport::PeriodStructure,
};
use core::time::Duration;
use derivative::Derivative;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::convert::TryInto;
use thiserror::Error;
use time::Duration as SignedDuration;

#[derive(Derivative, Serialize, Deserialize)]
#[derivative(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyKind {
    OneMinute,
    #[derivative(Default)]
    TwoMinute,
    FiveMinute,
    Dismissal,
}

impl PenaltyKind {
    pub fn as_duration(self) -> Option<Duration> {
        match self {
            Self::OneMinute => Some(Duration::from_secs(60)),
            Self::TwoMinute => Some(Duration::from_secs(120)),
            Self::FiveMinute => Some(Duration::from_secs(300)),
            Self::Dismissal => None,
        }
    }
}

/// A timed sit-out created by a penalty or card event. Penalty time runs only
/// during play phases; the clock position is tracked as (phase, time remaining
/// in that phase) pairs, matching the match clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Penalty {
    pub kind: PenaltyKind,
    pub event_id: EventId,
    pub player_number: Option<u8>,
    pub start_phase: MatchPhase,
    pub start_time: Duration,
}

impl Penalty {
    pub fn time_elapsed(
        &self,
        cur_phase: MatchPhase,
        cur_time: Duration,
        rules: &PeriodStructure,
    ) -> PenaltyResult<SignedDuration> {
        let calc_time_between = |earlier_phase: MatchPhase,
                                 earlier_time: Duration,
                                 later_phase: MatchPhase,
                                 later_time: Duration| {
            let mut elapsed = if earlier_phase.penalties_run() {
                earlier_time.try_into()?
            } else {
                SignedDuration::ZERO
            };
            let mut phase = earlier_phase.next(rules).unwrap();
            while phase.compare(later_phase, rules) == Ordering::Less {
                if phase.penalties_run() {
                    elapsed += phase.duration(rules).unwrap();
                }
                phase = phase.next(rules).unwrap();
            }
            if later_phase.penalties_run() {
                elapsed += later_phase
                    .time_elapsed_at(later_time, rules)
                    .ok_or(time::error::ConversionRange)?; // Play phases always have a duration
            }
            Ok(elapsed)
        };

        match cur_phase.compare(self.start_phase, rules) {
            Ordering::Equal => {
                if cur_phase.penalties_run() {
                    // Both clocks count down, so elapsed is start minus current
                    let start: SignedDuration = self.start_time.try_into()?;
                    let cur: SignedDuration = cur_time.try_into()?;
                    Ok(start - cur)
                } else {
                    Ok(SignedDuration::ZERO)
                }
            }
            Ordering::Greater => {
                calc_time_between(self.start_phase, self.start_time, cur_phase, cur_time)
            }
            Ordering::Less => {
                calc_time_between(cur_phase, cur_time, self.start_phase, self.start_time)
                    .map(|d| -d)
            }
        }
    }

    pub fn time_remaining(
        &self,
        cur_phase: MatchPhase,
        cur_time: Duration,
        rules: &PeriodStructure,
    ) -> PenaltyResult<SignedDuration> {
        let elapsed = self.time_elapsed(cur_phase, cur_time, rules);

        if cur_phase == MatchPhase::Finished {
            // The match is over; by definition all timed penalties are served.
            Ok(SignedDuration::ZERO)
        } else {
            let duration: SignedDuration = self
                .kind
                .as_duration()
                .ok_or(PenaltyError::NoDuration)?
                .try_into()?;

            duration
                .checked_sub(elapsed?)
                .ok_or(PenaltyError::DurationOverflow)
        }
    }

    pub fn is_complete(
        &self,
        cur_phase: MatchPhase,
        cur_time: Duration,
        rules: &PeriodStructure,
    ) -> PenaltyResult<bool> {
        match self.kind {
            PenaltyKind::Dismissal => Ok(false),
            PenaltyKind::OneMinute | PenaltyKind::TwoMinute | PenaltyKind::FiveMinute => self
                .time_remaining(cur_phase, cur_time, rules)
                .map(|rem| rem <= SignedDuration::ZERO),
        }
    }

    pub fn as_snapshot(
        &self,
        cur_phase: MatchPhase,
        cur_time: Duration,
        rules: &PeriodStructure,
    ) -> PenaltyResult<PenaltySnapshot> {
        let time = match self.time_remaining(cur_phase, cur_time, rules) {
            Ok(dur) => {
                if dur.is_negative() {
                    PenaltyTime::Seconds(0)
                } else {
                    PenaltyTime::Seconds(dur.whole_seconds().try_into()?)
                }
            }
            Err(PenaltyError::NoDuration) => PenaltyTime::Dismissal,
            Err(e) => return Err(e),
        };

        Ok(PenaltySnapshot {
            player_number: self.player_number,
            time,
        })
    }
}

#[derive(Debug, PartialEq, Eq, Error)]
pub enum PenaltyError {
    #[error("A std::time::Duration could not be converted to a time::Duration")]
    ConversionFailed(#[from] time::error::ConversionRange),
    #[error("Duration Overflow")]
    DurationOverflow,
    #[error("A penalty snapshot overflowed the maximum value of a u16")]
    SnapshotOverflow(#[from] core::num::TryFromIntError),
    #[error("A Dismissal penalty does not have a duration")]
    NoDuration,
}

pub type PenaltyResult<T> = std::result::Result<T, PenaltyError>;

#[cfg(test)]
mod test {
    use super::*;

    fn rules() -> PeriodStructure {
        PeriodStructure {
            regulation_periods: 3,
            period_duration: Duration::from_secs(300),
            interval_duration: Duration::from_secs(60),
            overtime: Some(Duration::from_secs(120)),
        }
    }

    fn penalty(kind: PenaltyKind, start_phase: MatchPhase, start_time: Duration) -> Penalty {
        Penalty {
            kind,
            event_id: EventId(0),
            player_number: Some(7),
            start_phase,
            start_time,
        }
    }

    #[test]
    fn test_time_elapsed_same_phase() {
        let rules = rules();
        let pen = penalty(
            PenaltyKind::TwoMinute,
            MatchPhase::Period(1),
            Duration::from_secs(200),
        );
        assert_eq!(
            pen.time_elapsed(MatchPhase::Period(1), Duration::from_secs(150), &rules),
            Ok(SignedDuration::seconds(50))
        );
    }

    #[test]
    fn test_time_elapsed_skips_intervals() {
        let rules = rules();
        // 40s left in period 1, then the full interval, then 250s into period 2:
        // 40 + (300 - 250) = 90s of penalty time.
        let pen = penalty(
            PenaltyKind::TwoMinute,
            MatchPhase::Period(1),
            Duration::from_secs(40),
        );
        assert_eq!(
            pen.time_elapsed(MatchPhase::Period(2), Duration::from_secs(250), &rules),
            Ok(SignedDuration::seconds(90))
        );
        assert_eq!(
            pen.time_elapsed(MatchPhase::Interval(1), Duration::from_secs(30), &rules),
            Ok(SignedDuration::seconds(40))
        );
    }

    #[test]
    fn test_time_elapsed_across_many_phases() {
        let rules = rules();
        // Entire periods 1-3 plus 20s of overtime, intervals skipped.
        let pen = penalty(
            PenaltyKind::FiveMinute,
            MatchPhase::Period(1),
            Duration::from_secs(300),
        );
        assert_eq!(
            pen.time_elapsed(MatchPhase::Overtime, Duration::from_secs(100), &rules),
            Ok(SignedDuration::seconds(920))
        );
    }

    #[test]
    fn test_time_elapsed_backwards_is_negative() {
        let rules = rules();
        let pen = penalty(
            PenaltyKind::TwoMinute,
            MatchPhase::Period(2),
            Duration::from_secs(100),
        );
        assert_eq!(
            pen.time_elapsed(MatchPhase::Period(1), Duration::from_secs(50), &rules),
            Ok(SignedDuration::seconds(-150))
        );
    }

    #[test]
    fn test_time_remaining() {
        let rules = rules();
        let pen = penalty(
            PenaltyKind::TwoMinute,
            MatchPhase::Period(1),
            Duration::from_secs(200),
        );
        assert_eq!(
            pen.time_remaining(MatchPhase::Period(1), Duration::from_secs(150), &rules),
            Ok(SignedDuration::seconds(70))
        );
        assert_eq!(
            pen.time_remaining(MatchPhase::Period(1), Duration::from_secs(50), &rules),
            Ok(SignedDuration::seconds(-30))
        );
        assert_eq!(
            pen.time_remaining(MatchPhase::Finished, Duration::ZERO, &rules),
            Ok(SignedDuration::ZERO)
        );

        let dismissal = penalty(
            PenaltyKind::Dismissal,
            MatchPhase::Period(1),
            Duration::from_secs(200),
        );
        assert_eq!(
            dismissal.time_remaining(MatchPhase::Period(1), Duration::from_secs(100), &rules),
            Err(PenaltyError::NoDuration)
        );
    }

    #[test]
    fn test_is_complete() {
        let rules = rules();
        let pen = penalty(
            PenaltyKind::OneMinute,
            MatchPhase::Period(1),
            Duration::from_secs(200),
        );
        assert_eq!(
            pen.is_complete(MatchPhase::Period(1), Duration::from_secs(160), &rules),
            Ok(false)
        );
        assert_eq!(
            pen.is_complete(MatchPhase::Period(1), Duration::from_secs(140), &rules),
            Ok(true)
        );

        let dismissal = penalty(
            PenaltyKind::Dismissal,
            MatchPhase::Period(1),
            Duration::from_secs(200),
        );
        assert_eq!(
            dismissal.is_complete(MatchPhase::Overtime, Duration::from_secs(1), &rules),
            Ok(false)
        );
    }

    #[test]
    fn test_as_snapshot() {
        let rules = rules();
        let pen = penalty(
            PenaltyKind::TwoMinute,
            MatchPhase::Period(1),
            Duration::from_secs(200),
        );
        assert_eq!(
            pen.as_snapshot(MatchPhase::Period(1), Duration::from_secs(150), &rules),
            Ok(PenaltySnapshot {
                player_number: Some(7),
                time: PenaltyTime::Seconds(70),
            })
        );

        let dismissal = penalty(
            PenaltyKind::Dismissal,
            MatchPhase::Period(1),
            Duration::from_secs(200),
        );
        assert_eq!(
            dismissal.as_snapshot(MatchPhase::Period(1), Duration::from_secs(150), &rules),
            Ok(PenaltySnapshot {
                player_number: Some(7),
                time: PenaltyTime::Dismissal,
            })
        );
    }
}
