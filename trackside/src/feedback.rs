use log::*;
use tokio::time::{Duration, Instant};
use trackside_core::{event::EventKind, team::TeamSide};

use crate::behavior::FeedbackProfile;

const FLASH_LENGTH: Duration = Duration::from_millis(300);
const ANNOUNCEMENT_HOLD: Duration = Duration::from_secs(5);

/// Things worth telling the user about without making them look away from
/// the field.
#[derive(Debug, Clone, PartialEq)]
pub enum Cue {
    Score(TeamSide),
    Event(TeamSide, EventKind),
    ClockStarted,
    ClockStopped,
    PhaseEnded,
    Undo,
}

/// Turns cues into the terminal's available feedback channels: the bell for
/// audio, a frame flash for the haptic analog, and an announcement line for
/// the screen-reader analog. Every channel is capability-gated by the active
/// profile and drops to a silent no-op when off.
#[derive(Debug, Default)]
pub struct Feedback {
    bell_pending: bool,
    flash_until: Option<Instant>,
    announcement: Option<(String, Instant)>,
}

impl Feedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&mut self, cue: Cue, profile: &FeedbackProfile, now: Instant) {
        trace!("Feedback cue: {cue:?}");

        if profile.sound_cues {
            self.bell_pending = match cue {
                Cue::Score(_) | Cue::PhaseEnded => true,
                Cue::ClockStarted | Cue::ClockStopped => true,
                Cue::Event(_, _) | Cue::Undo => self.bell_pending,
            };
        }

        if profile.flash_on_score {
            if let Cue::Score(_) | Cue::PhaseEnded = cue {
                self.flash_until = Some(now + FLASH_LENGTH);
            }
        }

        if profile.announce_events {
            let text = match &cue {
                Cue::Score(side) => Some(format!("Score: {side}")),
                Cue::Event(side, kind) => Some(format!("{kind}: {side}")),
                Cue::PhaseEnded => Some("Period over".to_string()),
                Cue::ClockStarted => Some("Clock running".to_string()),
                Cue::ClockStopped => Some("Clock stopped".to_string()),
                Cue::Undo => Some("Last event removed".to_string()),
            };
            if let Some(text) = text {
                self.announcement = Some((text, now + ANNOUNCEMENT_HOLD));
            }
        }
    }

    /// Whether a bell should be emitted this frame. Clears the pending flag.
    pub fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.bell_pending)
    }

    pub fn flashing(&self, now: Instant) -> bool {
        self.flash_until.is_some_and(|until| now < until)
    }

    pub fn announcement(&mut self, now: Instant) -> Option<&str> {
        if let Some((_, until)) = self.announcement {
            if now >= until {
                self.announcement = None;
            }
        }
        self.announcement.as_ref().map(|(text, _)| text.as_str())
    }
}
