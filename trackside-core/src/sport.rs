use crate::{
    event::{EventKind, GameEvent},
    penalty::PenaltyKind,
    team::TeamSide,
};
use core::time::Duration;
use derivative::Derivative;
use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};

#[derive(Derivative, Serialize, Deserialize, Sequence)]
#[derivative(Debug, Default, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Sport {
    #[derivative(Default)]
    Soccer,
    Hockey,
    Basketball,
    Handball,
    Lacrosse,
}

impl core::fmt::Display for Sport {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            Self::Soccer => write!(f, "Soccer"),
            Self::Hockey => write!(f, "Hockey"),
            Self::Basketball => write!(f, "Basketball"),
            Self::Handball => write!(f, "Handball"),
            Self::Lacrosse => write!(f, "Lacrosse"),
        }
    }
}

/// Display metadata and score value of one event kind within one sport.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct EventProfile {
    pub name: &'static str,
    pub icon: &'static str,
    pub points: u16,
}

/// Period layout of a sport's regulation play.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct PeriodStructure {
    pub regulation_periods: u8,
    pub period_duration: Duration,
    pub interval_duration: Duration,
    /// `None` when the sport ends regulation-tied matches as draws.
    pub overtime: Option<Duration>,
}

const fn mins(m: u64) -> Duration {
    Duration::from_secs(m * 60)
}

impl Sport {
    pub fn period_structure(self) -> PeriodStructure {
        match self {
            Self::Soccer => PeriodStructure {
                regulation_periods: 2,
                period_duration: mins(45),
                interval_duration: mins(15),
                overtime: Some(mins(30)),
            },
            Self::Hockey => PeriodStructure {
                regulation_periods: 3,
                period_duration: mins(20),
                interval_duration: mins(15),
                overtime: Some(mins(5)),
            },
            Self::Basketball => PeriodStructure {
                regulation_periods: 4,
                period_duration: mins(10),
                interval_duration: mins(2),
                overtime: Some(mins(5)),
            },
            Self::Handball => PeriodStructure {
                regulation_periods: 2,
                period_duration: mins(30),
                interval_duration: mins(10),
                overtime: Some(mins(10)),
            },
            Self::Lacrosse => PeriodStructure {
                regulation_periods: 4,
                period_duration: mins(12),
                interval_duration: mins(2),
                overtime: None,
            },
        }
    }

    /// Returns `None` when this sport does not use the given event kind.
    pub fn profile(self, kind: EventKind) -> Option<EventProfile> {
        let goal_points = match self {
            Self::Basketball => 2,
            _ => 1,
        };
        match (self, kind) {
            (_, EventKind::Goal) => Some(EventProfile {
                name: match self {
                    Self::Basketball => "Basket",
                    _ => "Goal",
                },
                icon: "\u{26bd}",
                points: goal_points,
            }),
            // An own goal is recorded against the side that committed it and
            // credits the opposing side's score.
            (Self::Soccer | Self::Hockey | Self::Handball, EventKind::OwnGoal) => {
                Some(EventProfile {
                    name: "Own Goal",
                    icon: "\u{1f501}",
                    points: goal_points,
                })
            }
            (_, EventKind::Shot) => Some(EventProfile {
                name: "Shot",
                icon: "\u{1f3af}",
                points: 0,
            }),
            (Self::Soccer | Self::Hockey | Self::Handball | Self::Lacrosse, EventKind::Save) => {
                Some(EventProfile {
                    name: "Save",
                    icon: "\u{1f9e4}",
                    points: 0,
                })
            }
            (_, EventKind::Penalty) => Some(EventProfile {
                name: "Penalty",
                icon: "\u{26a0}",
                points: 0,
            }),
            (_, EventKind::Foul) => Some(EventProfile {
                name: "Foul",
                icon: "\u{1f6a9}",
                points: 0,
            }),
            (
                Self::Soccer | Self::Handball | Self::Hockey | Self::Lacrosse,
                EventKind::YellowCard,
            ) => Some(EventProfile {
                name: "Yellow Card",
                icon: "\u{1f7e8}",
                points: 0,
            }),
            (Self::Soccer | Self::Handball | Self::Hockey | Self::Lacrosse, EventKind::RedCard) => {
                Some(EventProfile {
                    name: "Red Card",
                    icon: "\u{1f7e5}",
                    points: 0,
                })
            }
            (_, EventKind::Substitution) => Some(EventProfile {
                name: "Substitution",
                icon: "\u{1f504}",
                points: 0,
            }),
            (Self::Basketball | Self::Handball | Self::Lacrosse, EventKind::Timeout) => {
                Some(EventProfile {
                    name: "Timeout",
                    icon: "\u{23f8}",
                    points: 0,
                })
            }
            (Self::Soccer, EventKind::Corner) => Some(EventProfile {
                name: "Corner",
                icon: "\u{1f6a9}",
                points: 0,
            }),
            (Self::Soccer | Self::Hockey, EventKind::Offside) => Some(EventProfile {
                name: "Offside",
                icon: "\u{1f6ab}",
                points: 0,
            }),
            _ => None,
        }
    }

    /// The kinds that change the score in this sport.
    pub fn scoring_kinds(self) -> impl Iterator<Item = EventKind> {
        enum_iterator::all::<EventKind>()
            .filter(move |kind| self.profile(*kind).is_some_and(|p| p.points > 0))
    }

    /// The timed penalty served for recording `kind`, if this sport sits
    /// players for it.
    pub fn penalty_kind(self, kind: EventKind) -> Option<PenaltyKind> {
        match (self, kind) {
            (Self::Hockey, EventKind::Penalty) => Some(PenaltyKind::TwoMinute),
            (Self::Lacrosse, EventKind::Penalty) => Some(PenaltyKind::OneMinute),
            (Self::Handball, EventKind::Penalty) => Some(PenaltyKind::TwoMinute),
            (Self::Hockey | Self::Handball | Self::Lacrosse, EventKind::YellowCard) => {
                Some(PenaltyKind::TwoMinute)
            }
            (Self::Soccer | Self::Hockey | Self::Handball | Self::Lacrosse, EventKind::RedCard) => {
                Some(PenaltyKind::Dismissal)
            }
            _ => None,
        }
    }
}

/// Score for one side: a fold over the event log, counting only that side's
/// scoring events, except that an own goal recorded against side S credits
/// S's opponent.
pub fn score_for(events: &[GameEvent], sport: Sport, side: TeamSide) -> u16 {
    events
        .iter()
        .filter_map(|event| {
            let profile = sport.profile(event.kind)?;
            if profile.points == 0 {
                return None;
            }
            let credited = match event.kind {
                EventKind::OwnGoal => event.side.other(),
                _ => event.side,
            };
            (credited == side).then_some(profile.points)
        })
        .sum()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{event::EventLog, snapshot::MatchPhase};
    use time::OffsetDateTime;

    fn log_of(entries: &[(EventKind, TeamSide)]) -> EventLog {
        let mut log = EventLog::new();
        for (kind, side) in entries {
            log.append(
                *kind,
                *side,
                kind.to_string(),
                MatchPhase::Period(1),
                Duration::from_secs(10),
                OffsetDateTime::UNIX_EPOCH,
                None,
            );
        }
        log
    }

    #[test]
    fn test_score_is_team_filtered() {
        let log = log_of(&[
            (EventKind::Goal, TeamSide::Us),
            (EventKind::Goal, TeamSide::Them),
            (EventKind::Penalty, TeamSide::Us),
        ]);

        assert_eq!(score_for(log.events(), Sport::Soccer, TeamSide::Us), 1);
        assert_eq!(score_for(log.events(), Sport::Soccer, TeamSide::Them), 1);
    }

    #[test]
    fn test_own_goal_credits_other_side() {
        let log = log_of(&[
            (EventKind::Goal, TeamSide::Us),
            (EventKind::OwnGoal, TeamSide::Us),
        ]);

        assert_eq!(score_for(log.events(), Sport::Soccer, TeamSide::Us), 1);
        assert_eq!(score_for(log.events(), Sport::Soccer, TeamSide::Them), 1);
    }

    #[test]
    fn test_basketball_goals_worth_two() {
        let log = log_of(&[
            (EventKind::Goal, TeamSide::Us),
            (EventKind::Goal, TeamSide::Us),
            (EventKind::Goal, TeamSide::Them),
        ]);

        assert_eq!(score_for(log.events(), Sport::Basketball, TeamSide::Us), 4);
        assert_eq!(
            score_for(log.events(), Sport::Basketball, TeamSide::Them),
            2
        );
    }

    #[test]
    fn test_unused_kinds_have_no_profile() {
        assert_eq!(Sport::Basketball.profile(EventKind::OwnGoal), None);
        assert_eq!(Sport::Basketball.profile(EventKind::Corner), None);
        assert_eq!(Sport::Hockey.profile(EventKind::Corner), None);
        assert!(Sport::Soccer.profile(EventKind::Corner).is_some());
    }

    #[test]
    fn test_scoring_kinds() {
        let soccer: Vec<_> = Sport::Soccer.scoring_kinds().collect();
        assert_eq!(soccer, vec![EventKind::Goal, EventKind::OwnGoal]);

        let basketball: Vec<_> = Sport::Basketball.scoring_kinds().collect();
        assert_eq!(basketball, vec![EventKind::Goal]);
    }

    #[test]
    fn test_penalty_kinds() {
        assert_eq!(
            Sport::Hockey.penalty_kind(EventKind::Penalty),
            Some(PenaltyKind::TwoMinute)
        );
        assert_eq!(Sport::Soccer.penalty_kind(EventKind::Penalty), None);
        assert_eq!(
            Sport::Soccer.penalty_kind(EventKind::RedCard),
            Some(PenaltyKind::Dismissal)
        );
        assert_eq!(Sport::Basketball.penalty_kind(EventKind::YellowCard), None);
    }

    #[test]
    fn test_every_sport_has_goal() {
        for sport in enum_iterator::all::<Sport>() {
            let profile = sport.profile(EventKind::Goal).unwrap();
            assert!(profile.points >= 1, "{sport}");
        }
    }
}
