use crate::{snapshot::MatchPhase, team::TeamSide};
use core::time::Duration;
use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use time::OffsetDateTime;
use time::format_description::well_known::{Iso8601, iso8601};

const CONFIG: iso8601::EncodedConfig = iso8601::Config::DEFAULT
    .set_year_is_six_digits(false)
    .encode();
const FORMAT: Iso8601<CONFIG> = Iso8601::<CONFIG>;
time::serde::format_description!(iso8601_short_year, OffsetDateTime, FORMAT);

mod duration_secs {
    use core::time::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dur: &Duration, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_f32(dur.as_secs_f32())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
        let secs = f32::deserialize(de)?;
        Ok(Duration::from_secs_f32(secs.max(0.0)))
    }
}

/// Every action a user can record, across all supported sports. Each sport
/// uses a subset of these (see [`Sport::profile`](crate::sport::Sport::profile)).
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize, Sequence)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Goal,
    OwnGoal,
    Shot,
    Save,
    Penalty,
    Foul,
    YellowCard,
    RedCard,
    Substitution,
    Timeout,
    Corner,
    Offside,
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Goal => write!(f, "Goal"),
            Self::OwnGoal => write!(f, "Own Goal"),
            Self::Shot => write!(f, "Shot"),
            Self::Save => write!(f, "Save"),
            Self::Penalty => write!(f, "Penalty"),
            Self::Foul => write!(f, "Foul"),
            Self::YellowCard => write!(f, "Yellow Card"),
            Self::RedCard => write!(f, "Red Card"),
            Self::Substitution => write!(f, "Substitution"),
            Self::Timeout => write!(f, "Timeout"),
            Self::Corner => write!(f, "Corner"),
            Self::Offside => write!(f, "Offside"),
        }
    }
}

/// Identifier of an event within one match. Monotonic, never reused, even
/// after an undo.
#[derive(
    Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Serialize, Deserialize,
)]
pub struct EventId(pub u32);

impl Display for EventId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEvent {
    pub id: EventId,
    pub kind: EventKind,
    pub side: TeamSide,
    pub label: String,
    pub phase: MatchPhase,
    /// Play time elapsed when the event was recorded.
    #[serde(with = "duration_secs")]
    pub game_time: Duration,
    #[serde(with = "iso8601_short_year")]
    pub wall_time: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub player_number: Option<u8>,
}

/// Ordered, insertion-order-significant record of a match. Append-only except
/// for [`undo_last`](EventLog::undo_last) and [`amend_last`](EventLog::amend_last),
/// which only ever touch the newest entry.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<GameEvent>,
    next_id: u32,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, GameEvent> {
        self.events.iter()
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn last(&self) -> Option<&GameEvent> {
        self.events.last()
    }

    /// Appends an event, assigning it the next id.
    pub fn append(
        &mut self,
        kind: EventKind,
        side: TeamSide,
        label: String,
        phase: MatchPhase,
        game_time: Duration,
        wall_time: OffsetDateTime,
        player_number: Option<u8>,
    ) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;
        self.events.push(GameEvent {
            id,
            kind,
            side,
            label,
            phase,
            game_time,
            wall_time,
            note: None,
            player_number,
        });
        id
    }

    /// Removes and returns the newest entry. Ids are not reused afterwards.
    pub fn undo_last(&mut self) -> Option<GameEvent> {
        self.events.pop()
    }

    /// Replaces the newest entry's label, note, and player number in place.
    /// Returns the amended event's id, or `None` when the log is empty.
    pub fn amend_last(
        &mut self,
        label: Option<String>,
        note: Option<String>,
        player_number: Option<u8>,
    ) -> Option<EventId> {
        let event = self.events.last_mut()?;
        if let Some(label) = label {
            event.label = label;
        }
        if note.is_some() {
            event.note = note;
        }
        if player_number.is_some() {
            event.player_number = player_number;
        }
        Some(event.id)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn append_simple(log: &mut EventLog, kind: EventKind, side: TeamSide) -> EventId {
        log.append(
            kind,
            side,
            kind.to_string(),
            MatchPhase::Period(1),
            Duration::from_secs(30),
            OffsetDateTime::UNIX_EPOCH,
            None,
        )
    }

    #[test]
    fn test_ids_monotonic_and_not_reused() {
        let mut log = EventLog::new();
        let first = append_simple(&mut log, EventKind::Goal, TeamSide::Us);
        let second = append_simple(&mut log, EventKind::Foul, TeamSide::Them);
        assert_eq!(first, EventId(0));
        assert_eq!(second, EventId(1));

        let undone = log.undo_last().unwrap();
        assert_eq!(undone.id, second);

        let third = append_simple(&mut log, EventKind::Shot, TeamSide::Us);
        assert_eq!(third, EventId(2));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_undo_empty() {
        let mut log = EventLog::new();
        assert_eq!(log.undo_last(), None);
    }

    #[test]
    fn test_amend_last() {
        let mut log = EventLog::new();
        assert_eq!(log.amend_last(Some("x".to_string()), None, None), None);

        let id = append_simple(&mut log, EventKind::Goal, TeamSide::Us);
        let amended = log.amend_last(Some("Header".to_string()), Some("far post".to_string()), Some(9));
        assert_eq!(amended, Some(id));

        let event = log.last().unwrap();
        assert_eq!(event.label, "Header");
        assert_eq!(event.note.as_deref(), Some("far post"));
        assert_eq!(event.player_number, Some(9));

        // Fields not supplied are left alone
        log.amend_last(None, None, None);
        assert_eq!(log.last().unwrap().label, "Header");
        assert_eq!(log.last().unwrap().player_number, Some(9));
    }

    #[test]
    fn test_event_serde_shape() {
        let mut log = EventLog::new();
        append_simple(&mut log, EventKind::YellowCard, TeamSide::Them);

        let json = serde_json::to_value(log.last().unwrap()).unwrap();
        assert_eq!(json["kind"], "yellow_card");
        assert_eq!(json["side"], "them");
        assert_eq!(json["gameTime"], 30.0);
        assert!(json["wallTime"].is_string());
        assert!(json.get("note").is_none());
    }

    #[test]
    fn test_event_serde_round_trip() {
        let mut log = EventLog::new();
        append_simple(&mut log, EventKind::Goal, TeamSide::Us);
        log.amend_last(None, Some("note".to_string()), Some(4));

        let json = serde_json::to_string(&log).unwrap();
        let parsed: EventLog = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, log);
    }
}
