use serde::{Deserialize, Serialize};
use trackside_core::{color::TeamColor, sport::Sport};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct MatchSettings {
    pub sport: Sport,
    pub opponent_name: String,
    pub opponent_color: TeamColor,
    pub our_color: TeamColor,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            sport: Sport::default(),
            opponent_name: "Opponent".to_string(),
            opponent_color: TeamColor::Red,
            our_color: TeamColor::Blue,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DisplaySettings {
    pub one_handed: bool,
    pub reduced_motion: bool,
    pub fullscreen: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            one_handed: false,
            reduced_motion: false,
            fullscreen: false,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct FeedbackSettings {
    pub sound_enabled: bool,
    pub haptics_enabled: bool,
    pub announce_events: bool,
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            haptics_enabled: false,
            announce_events: false,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct RemoteSettings {
    pub base_url: String,
    pub poll_secs: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            poll_secs: 30,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub game: MatchSettings,
    pub display: DisplaySettings,
    pub feedback: FeedbackSettings,
    pub remote: RemoteSettings,
}
