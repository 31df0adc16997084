use log::*;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error;
use time::OffsetDateTime;
use trackside_core::{
    event::GameEvent,
    snapshot::MatchPhase,
    sport::Sport,
    team::SideBundle,
};

use crate::engine::MatchEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Html,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Html => "html",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    pub sport: Sport,
    pub opponent_name: String,
    pub final_score: SideBundle<u16>,
    pub phase: MatchPhase,
    #[serde(with = "time::serde::iso8601::option")]
    pub started_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::iso8601::option")]
    pub ended_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::iso8601")]
    pub exported_at: OffsetDateTime,
}

/// The export envelope. All three output formats render from this one shape,
/// and the JSON format is its direct serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub game_info: GameInfo,
    pub events: Vec<GameEvent>,
}

impl MatchSummary {
    pub fn from_engine(engine: &MatchEngine) -> Self {
        Self {
            game_info: GameInfo {
                sport: engine.sport(),
                opponent_name: engine.opponent_name().to_string(),
                final_score: engine.scores(),
                phase: engine.phase(),
                started_at: engine.started_at(),
                ended_at: engine.ended_at(),
                exported_at: OffsetDateTime::now_utc(),
            },
            events: engine.events().events().to_vec(),
        }
    }

    pub fn render(&self, format: ExportFormat) -> ExportResult<String> {
        match format {
            ExportFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            ExportFormat::Csv => self.to_csv(),
            ExportFormat::Html => Ok(self.to_html()),
        }
    }

    pub fn write_to(&self, format: ExportFormat, path: &Path) -> ExportResult<()> {
        let rendered = self.render(format)?;
        fs::write(path, rendered)?;
        info!(
            "Exported {} match summary to {}",
            format.extension(),
            path.display()
        );
        Ok(())
    }

    fn to_csv(&self) -> ExportResult<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            "id",
            "kind",
            "side",
            "label",
            "phase",
            "game_time_secs",
            "wall_time",
            "player_number",
            "note",
        ])?;
        for event in &self.events {
            writer.write_record([
                event.id.0.to_string(),
                event.kind.to_string(),
                event.side.to_string(),
                event.label.clone(),
                event.phase.to_string(),
                format!("{:.1}", event.game_time.as_secs_f32()),
                event
                    .wall_time
                    .format(&time::format_description::well_known::Iso8601::DEFAULT)
                    .unwrap_or_default(),
                event
                    .player_number
                    .map(|n| n.to_string())
                    .unwrap_or_default(),
                event.note.clone().unwrap_or_default(),
            ])?;
        }
        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8(bytes)?)
    }

    fn to_html(&self) -> String {
        use std::fmt::Write;

        let info = &self.game_info;
        let mut html = String::new();
        let _ = write!(
            &mut html,
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
             <title>Track Side - {sport} vs {opp}</title>\n</head>\n<body>\n\
             <h1>{sport} vs {opp}</h1>\n\
             <p>Final score: Us {us} - {them} {opp}</p>\n\
             <table border=\"1\">\n\
             <tr><th>Time</th><th>Phase</th><th>Side</th><th>Event</th><th>Player</th><th>Note</th></tr>\n",
            sport = info.sport,
            opp = escape_html(&info.opponent_name),
            us = info.final_score.us,
            them = info.final_score.them,
        );
        for event in &self.events {
            let secs = event.game_time.as_secs();
            let _ = write!(
                &mut html,
                "<tr><td>{:02}:{:02}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                secs / 60,
                secs % 60,
                event.phase,
                event.side,
                escape_html(&event.label),
                event
                    .player_number
                    .map(|n| format!("#{n}"))
                    .unwrap_or_default(),
                escape_html(event.note.as_deref().unwrap_or("")),
            );
        }
        html.push_str("</table>\n</body>\n</html>\n");
        html
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write the export file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize the match summary: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to build the CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("The CSV output was not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type ExportResult<T> = std::result::Result<T, ExportError>;

#[cfg(test)]
mod test {
    use super::*;
    use core::time::Duration;
    use trackside_core::event::{EventId, EventKind};
    use trackside_core::team::TeamSide;

    fn sample_summary() -> MatchSummary {
        let event = |id, kind: EventKind, side, secs| GameEvent {
            id: EventId(id),
            kind,
            side,
            label: kind.to_string(),
            phase: MatchPhase::Period(1),
            game_time: Duration::from_secs(secs),
            wall_time: OffsetDateTime::UNIX_EPOCH,
            note: None,
            player_number: None,
        };
        MatchSummary {
            game_info: GameInfo {
                sport: Sport::Soccer,
                opponent_name: "River <Plate>".to_string(),
                final_score: SideBundle { us: 2, them: 1 },
                phase: MatchPhase::Finished,
                started_at: Some(OffsetDateTime::UNIX_EPOCH),
                ended_at: None,
                exported_at: OffsetDateTime::UNIX_EPOCH,
            },
            events: vec![
                event(0, EventKind::Goal, TeamSide::Us, 63),
                event(1, EventKind::Goal, TeamSide::Them, 410),
                event(2, EventKind::Goal, TeamSide::Us, 1802),
            ],
        }
    }

    #[test]
    fn test_json_round_trip() {
        let summary = sample_summary();
        let json = summary.render(ExportFormat::Json).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["gameInfo"]["finalScore"]["us"], 2);
        assert_eq!(value["gameInfo"]["finalScore"]["them"], 1);
        assert_eq!(value["gameInfo"]["opponentName"], "River <Plate>");
        assert_eq!(value["events"].as_array().unwrap().len(), 3);

        let parsed: MatchSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, summary);
    }

    #[test]
    fn test_csv_has_header_and_rows() {
        let summary = sample_summary();
        let csv = summary.render(ExportFormat::Csv).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("id,kind,side,label,phase"));
        assert!(lines[1].contains("Goal"));
        assert!(lines[1].contains("Us"));
    }

    #[test]
    fn test_html_escapes_names() {
        let summary = sample_summary();
        let html = summary.render(ExportFormat::Html).unwrap();
        assert!(html.contains("River &lt;Plate&gt;"));
        assert!(!html.contains("River <Plate>"));
        assert!(html.contains("<table"));
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("match.json");
        sample_summary()
            .write_to(ExportFormat::Json, &path)
            .unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("gameInfo"));
    }
}
