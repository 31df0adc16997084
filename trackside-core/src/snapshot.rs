use crate::{
    event::EventKind,
    sport::PeriodStructure,
    team::{SideBundle, TeamSide},
};
use arrayvec::ArrayVec;
use core::{
    cmp::{Ordering, PartialOrd},
    time::Duration,
};
use serde::{Deserialize, Serialize};

/// The phase machine for a single match. Phases advance linearly through the
/// sport's `PeriodStructure` and terminate at `Finished`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    Setup,
    /// A regulation play period, numbered from 1.
    Period(u8),
    /// The break following the period of the same number.
    Interval(u8),
    Overtime,
    Finished,
}

impl MatchPhase {
    pub fn is_play(self) -> bool {
        match self {
            Self::Period(_) | Self::Overtime => true,
            Self::Setup | Self::Interval(_) | Self::Finished => false,
        }
    }

    pub fn penalties_run(self) -> bool {
        self.is_play()
    }

    pub fn duration(self, rules: &PeriodStructure) -> Option<Duration> {
        match self {
            Self::Setup | Self::Finished => None,
            Self::Period(_) => Some(rules.period_duration),
            Self::Interval(_) => Some(rules.interval_duration),
            Self::Overtime => rules.overtime,
        }
    }

    /// The structural successor. The engine may divert `Period(last)` straight
    /// to `Finished` when the score is not tied or overtime is not played.
    pub fn next(self, rules: &PeriodStructure) -> Option<MatchPhase> {
        match self {
            Self::Setup => Some(Self::Period(1)),
            Self::Period(n) if n < rules.regulation_periods => Some(Self::Interval(n)),
            Self::Period(_) => {
                if rules.overtime.is_some() {
                    Some(Self::Overtime)
                } else {
                    Some(Self::Finished)
                }
            }
            Self::Interval(n) => Some(Self::Period(n + 1)),
            Self::Overtime => Some(Self::Finished),
            Self::Finished => None,
        }
    }

    /// Play time elapsed within this phase when `time` remains on the clock.
    /// Returns `None` for phases without a duration, or if `time` exceeds it.
    pub fn time_elapsed_at(self, time: Duration, rules: &PeriodStructure) -> Option<Duration> {
        self.duration(rules).and_then(|d| d.checked_sub(time))
    }

    /// Position in the phase sequence, used to order phases of one match.
    /// `Overtime` slots in where `Interval(last)` would have been.
    fn ordinal(self, rules: &PeriodStructure) -> u8 {
        match self {
            Self::Setup => 0,
            Self::Period(n) => 2 * n - 1,
            Self::Interval(n) => 2 * n,
            Self::Overtime => 2 * rules.regulation_periods,
            Self::Finished => 2 * rules.regulation_periods + 1,
        }
    }

    pub fn compare(self, other: MatchPhase, rules: &PeriodStructure) -> Ordering {
        self.ordinal(rules).cmp(&other.ordinal(rules))
    }
}

impl core::fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            MatchPhase::Setup => write!(f, "Setup"),
            MatchPhase::Period(n) => write!(f, "Period {n}"),
            MatchPhase::Interval(n) => write!(f, "Interval {n}"),
            MatchPhase::Overtime => write!(f, "Overtime"),
            MatchPhase::Finished => write!(f, "Finished"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum PenaltyTime {
    Seconds(u16),
    Dismissal,
}

impl Ord for PenaltyTime {
    fn cmp(&self, other: &Self) -> Ordering {
        match self {
            PenaltyTime::Dismissal => match other {
                PenaltyTime::Dismissal => Ordering::Equal,
                PenaltyTime::Seconds(_) => Ordering::Greater,
            },
            PenaltyTime::Seconds(mine) => match other {
                PenaltyTime::Seconds(theirs) => mine.cmp(theirs),
                PenaltyTime::Dismissal => Ordering::Less,
            },
        }
    }
}

impl PartialOrd for PenaltyTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct PenaltySnapshot {
    pub player_number: Option<u8>,
    pub time: PenaltyTime,
}

/// Display-facing view of the match engine, regenerated each tick. Penalty
/// lists are bounded and sorted soonest-to-expire first.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct MatchSnapshot {
    pub phase: MatchPhase,
    pub secs_in_phase: u16,
    pub clock_running: bool,
    pub scores: SideBundle<u16>,
    pub penalties: SideBundle<ArrayVec<PenaltySnapshot, 3>>,
    pub event_count: usize,
    pub recent_event: Option<(TeamSide, EventKind)>,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sport::Sport;

    #[test]
    fn test_penalty_time_ord() {
        assert!(PenaltyTime::Seconds(5) > PenaltyTime::Seconds(0));
        assert!(PenaltyTime::Seconds(5) < PenaltyTime::Seconds(9));
        assert!(PenaltyTime::Dismissal > PenaltyTime::Seconds(13));
        assert!(PenaltyTime::Seconds(10_000) < PenaltyTime::Dismissal);
        assert_eq!(PenaltyTime::Seconds(10), PenaltyTime::Seconds(10));
        assert_eq!(PenaltyTime::Dismissal, PenaltyTime::Dismissal);
    }

    #[test]
    fn test_phase_sequence_soccer() {
        let rules = Sport::Soccer.period_structure();
        assert_eq!(rules.regulation_periods, 2);

        let mut phase = MatchPhase::Setup;
        let mut seen = vec![phase];
        while let Some(next) = phase.next(&rules) {
            phase = next;
            seen.push(phase);
        }
        assert_eq!(
            seen,
            vec![
                MatchPhase::Setup,
                MatchPhase::Period(1),
                MatchPhase::Interval(1),
                MatchPhase::Period(2),
                MatchPhase::Overtime,
                MatchPhase::Finished,
            ]
        );
    }

    #[test]
    fn test_phase_sequence_basketball() {
        let rules = Sport::Basketball.period_structure();
        assert_eq!(rules.regulation_periods, 4);

        assert_eq!(
            MatchPhase::Period(2).next(&rules),
            Some(MatchPhase::Interval(2))
        );
        assert_eq!(
            MatchPhase::Interval(3).next(&rules),
            Some(MatchPhase::Period(4))
        );
        assert_eq!(MatchPhase::Period(4).next(&rules), Some(MatchPhase::Overtime));
        assert_eq!(MatchPhase::Overtime.next(&rules), Some(MatchPhase::Finished));
        assert_eq!(MatchPhase::Finished.next(&rules), None);
    }

    #[test]
    fn test_phase_duration() {
        let rules = PeriodStructure {
            regulation_periods: 2,
            period_duration: Duration::from_secs(5),
            interval_duration: Duration::from_secs(7),
            overtime: Some(Duration::from_secs(9)),
        };

        assert_eq!(MatchPhase::Setup.duration(&rules), None);
        assert_eq!(
            MatchPhase::Period(1).duration(&rules),
            Some(Duration::from_secs(5))
        );
        assert_eq!(
            MatchPhase::Interval(1).duration(&rules),
            Some(Duration::from_secs(7))
        );
        assert_eq!(
            MatchPhase::Overtime.duration(&rules),
            Some(Duration::from_secs(9))
        );
        assert_eq!(MatchPhase::Finished.duration(&rules), None);
    }

    #[test]
    fn test_phase_time_elapsed_at() {
        let rules = PeriodStructure {
            regulation_periods: 2,
            period_duration: Duration::from_secs(5),
            interval_duration: Duration::from_secs(7),
            overtime: None,
        };

        assert_eq!(
            MatchPhase::Period(1).time_elapsed_at(Duration::from_secs(3), &rules),
            Some(Duration::from_secs(2))
        );
        assert_eq!(
            MatchPhase::Interval(1).time_elapsed_at(Duration::from_secs(4), &rules),
            Some(Duration::from_secs(3))
        );
        assert_eq!(
            MatchPhase::Period(1).time_elapsed_at(Duration::from_secs(9), &rules),
            None
        );
        assert_eq!(
            MatchPhase::Setup.time_elapsed_at(Duration::from_secs(1), &rules),
            None
        );
    }

    #[test]
    fn test_phase_ordering() {
        let rules = Sport::Hockey.period_structure();

        assert_eq!(
            MatchPhase::Period(1).compare(MatchPhase::Interval(1), &rules),
            Ordering::Less
        );
        assert_eq!(
            MatchPhase::Interval(1).compare(MatchPhase::Period(2), &rules),
            Ordering::Less
        );
        assert_eq!(
            MatchPhase::Overtime.compare(MatchPhase::Period(3), &rules),
            Ordering::Greater
        );
        assert_eq!(
            MatchPhase::Finished.compare(MatchPhase::Overtime, &rules),
            Ordering::Greater
        );
        assert_eq!(
            MatchPhase::Period(2).compare(MatchPhase::Period(2), &rules),
            Ordering::Equal
        );
    }
}
