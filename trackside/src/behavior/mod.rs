use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};
use tokio::time::Duration;

use crate::gesture::GestureKind;

/// What the match looks like right now, derived from the engine each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GameContext {
    pub is_running: bool,
    pub event_count: usize,
    pub score_difference: i32,
    pub time_in_game: Duration,
    pub finished: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Sequence)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Handheld,
    Tablet,
    Desktop,
}

/// Who is holding the device, detected once at startup. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserContext {
    pub device: DeviceClass,
    pub one_handed: bool,
    pub haptics: bool,
    pub audio: bool,
    pub reduced_motion: bool,
    pub touch_points: u8,
    pub force_touch: bool,
}

impl Default for UserContext {
    fn default() -> Self {
        Self {
            device: DeviceClass::Desktop,
            one_handed: false,
            haptics: false,
            audio: true,
            reduced_motion: false,
            touch_points: 1,
            force_touch: false,
        }
    }
}

impl UserContext {
    /// Classifies the terminal by width the way the original classified
    /// viewports: narrow panes get the handheld treatment.
    pub fn detect(cols: u16, one_handed: bool, haptics: bool, audio: bool) -> Self {
        let device = match cols {
            0..=59 => DeviceClass::Handheld,
            60..=119 => DeviceClass::Tablet,
            _ => DeviceClass::Desktop,
        };
        Self {
            device,
            one_handed,
            haptics,
            audio,
            ..Default::default()
        }
    }
}

const INTENSIVE_EVENT_THRESHOLD: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Sequence)]
pub enum UiMode {
    Setup,
    Standard,
    Intensive,
    OneHand,
    Analysis,
}

impl UiMode {
    /// The fixed priority cascade. Pure and total: every context resolves to
    /// exactly one mode, falling through to `Standard`.
    pub fn resolve(game: &GameContext, user: &UserContext) -> Self {
        if !game.is_running && !game.finished {
            UiMode::Setup
        } else if game.event_count > INTENSIVE_EVENT_THRESHOLD && game.is_running {
            UiMode::Intensive
        } else if user.one_handed {
            UiMode::OneHand
        } else if game.finished {
            UiMode::Analysis
        } else {
            UiMode::Standard
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            UiMode::Setup => "Setup",
            UiMode::Standard => "Standard",
            UiMode::Intensive => "Intensive",
            UiMode::OneHand => "One Hand",
            UiMode::Analysis => "Analysis",
        }
    }
}

impl core::fmt::Display for UiMode {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{}", self.title())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Density {
    Compact,
    Comfortable,
    Spacious,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutProfile {
    pub density: Density,
    pub button_scale: f32,
    pub event_feed_rows: u16,
    pub show_clock_large: bool,
    pub single_column: bool,
}

impl LayoutProfile {
    pub fn for_mode(mode: UiMode) -> Self {
        match mode {
            UiMode::Setup => Self {
                density: Density::Spacious,
                button_scale: 1.0,
                event_feed_rows: 0,
                show_clock_large: false,
                single_column: true,
            },
            UiMode::Standard => Self {
                density: Density::Comfortable,
                button_scale: 1.0,
                event_feed_rows: 6,
                show_clock_large: true,
                single_column: false,
            },
            UiMode::Intensive => Self {
                density: Density::Compact,
                button_scale: 1.4,
                event_feed_rows: 3,
                show_clock_large: true,
                single_column: false,
            },
            UiMode::OneHand => Self {
                density: Density::Compact,
                button_scale: 1.2,
                event_feed_rows: 4,
                show_clock_large: true,
                single_column: true,
            },
            UiMode::Analysis => Self {
                density: Density::Comfortable,
                button_scale: 0.9,
                event_feed_rows: 12,
                show_clock_large: false,
                single_column: false,
            },
        }
    }

    /// Handheld panes collapse to one column regardless of mode.
    pub fn adjusted_for(mut self, user: &UserContext) -> Self {
        if user.device == DeviceClass::Handheld {
            self.single_column = true;
            self.event_feed_rows = self.event_feed_rows.min(4);
        }
        self
    }
}

/// What the recognized gestures do in the current mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureAction {
    RecordGoalUs,
    RecordGoalThem,
    UndoLast,
    ToggleClock,
    OpenEventMenu,
    NextView,
    PrevView,
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionProfile {
    pub confirm_destructive: bool,
    pub long_press_ms: u64,
    pub double_tap_ms: u64,
}

impl InteractionProfile {
    pub fn for_mode(mode: UiMode) -> Self {
        match mode {
            UiMode::Setup | UiMode::Analysis => Self {
                confirm_destructive: true,
                long_press_ms: 500,
                double_tap_ms: 300,
            },
            UiMode::Standard | UiMode::OneHand => Self {
                confirm_destructive: true,
                long_press_ms: 500,
                double_tap_ms: 300,
            },
            // Mid-scramble nobody has time for confirmation dialogs
            UiMode::Intensive => Self {
                confirm_destructive: false,
                long_press_ms: 400,
                double_tap_ms: 250,
            },
        }
    }

    pub fn binding(mode: UiMode, gesture: GestureKind) -> GestureAction {
        use crate::gesture::{Direction, Rotation};

        match (mode, gesture) {
            (UiMode::Setup, _) => GestureAction::None,
            (_, GestureKind::Swipe(Direction::Up)) => GestureAction::RecordGoalUs,
            (_, GestureKind::Swipe(Direction::Down)) => GestureAction::RecordGoalThem,
            (_, GestureKind::Swipe(Direction::Left)) => GestureAction::PrevView,
            (_, GestureKind::Swipe(Direction::Right)) => GestureAction::NextView,
            (_, GestureKind::Circle(Rotation::CounterClockwise)) => GestureAction::UndoLast,
            (_, GestureKind::Circle(Rotation::Clockwise)) => GestureAction::OpenEventMenu,
            (_, GestureKind::DoubleTap) => GestureAction::ToggleClock,
            (UiMode::Intensive, GestureKind::Tap) => GestureAction::RecordGoalUs,
            (_, GestureKind::LongPress) => GestureAction::OpenEventMenu,
            (_, GestureKind::Zigzag) => GestureAction::UndoLast,
            _ => GestureAction::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedbackProfile {
    pub haptic_strength: f32,
    pub sound_cues: bool,
    pub announce_events: bool,
    pub flash_on_score: bool,
}

impl FeedbackProfile {
    pub fn for_mode(mode: UiMode) -> Self {
        match mode {
            UiMode::Setup => Self {
                haptic_strength: 0.0,
                sound_cues: false,
                announce_events: false,
                flash_on_score: false,
            },
            UiMode::Standard => Self {
                haptic_strength: 0.5,
                sound_cues: true,
                announce_events: false,
                flash_on_score: true,
            },
            UiMode::Intensive => Self {
                haptic_strength: 1.0,
                sound_cues: true,
                announce_events: true,
                flash_on_score: true,
            },
            UiMode::OneHand => Self {
                haptic_strength: 0.8,
                sound_cues: true,
                announce_events: false,
                flash_on_score: true,
            },
            UiMode::Analysis => Self {
                haptic_strength: 0.0,
                sound_cues: false,
                announce_events: false,
                flash_on_score: false,
            },
        }
    }

    pub fn adjusted_for(mut self, user: &UserContext) -> Self {
        if !user.haptics {
            self.haptic_strength = 0.0;
        }
        if !user.audio {
            self.sound_cues = false;
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceProfile {
    pub tick_ms: u64,
    pub animations: bool,
    pub redraw_on_tick: bool,
}

impl PerformanceProfile {
    pub fn for_mode(mode: UiMode) -> Self {
        match mode {
            UiMode::Setup | UiMode::Analysis => Self {
                tick_ms: 250,
                animations: true,
                redraw_on_tick: false,
            },
            UiMode::Standard | UiMode::OneHand => Self {
                tick_ms: 100,
                animations: true,
                redraw_on_tick: true,
            },
            UiMode::Intensive => Self {
                tick_ms: 50,
                animations: false,
                redraw_on_tick: true,
            },
        }
    }

    pub fn adjusted_for(mut self, user: &UserContext) -> Self {
        if user.reduced_motion {
            self.animations = false;
        }
        self
    }
}

/// Everything the view layer needs, recomputed from the contexts on every
/// tick. Carries no state of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub mode: UiMode,
    pub layout: LayoutProfile,
    pub interaction: InteractionProfile,
    pub feedback: FeedbackProfile,
    pub performance: PerformanceProfile,
}

impl UiState {
    pub fn derive(game: &GameContext, user: &UserContext) -> Self {
        let mode = UiMode::resolve(game, user);
        Self {
            mode,
            layout: LayoutProfile::for_mode(mode).adjusted_for(user),
            interaction: InteractionProfile::for_mode(mode),
            feedback: FeedbackProfile::for_mode(mode).adjusted_for(user),
            performance: PerformanceProfile::for_mode(mode).adjusted_for(user),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn running(event_count: usize) -> GameContext {
        GameContext {
            is_running: true,
            event_count,
            ..Default::default()
        }
    }

    #[test]
    fn test_not_running_is_always_setup() {
        let user = UserContext {
            one_handed: true,
            ..Default::default()
        };
        for event_count in [0, 5, 11, 500] {
            let game = GameContext {
                is_running: false,
                event_count,
                score_difference: -3,
                ..Default::default()
            };
            assert_eq!(UiMode::resolve(&game, &user), UiMode::Setup);
        }
    }

    #[test]
    fn test_intensive_beats_one_handed() {
        let user = UserContext {
            one_handed: true,
            ..Default::default()
        };
        assert_eq!(UiMode::resolve(&running(11), &user), UiMode::Intensive);
        assert_eq!(UiMode::resolve(&running(10), &user), UiMode::OneHand);
    }

    #[test]
    fn test_finished_match_is_analysis() {
        let game = GameContext {
            is_running: false,
            finished: true,
            event_count: 24,
            ..Default::default()
        };
        assert_eq!(
            UiMode::resolve(&game, &UserContext::default()),
            UiMode::Analysis
        );
    }

    #[test]
    fn test_default_falls_through_to_standard() {
        assert_eq!(
            UiMode::resolve(&running(3), &UserContext::default()),
            UiMode::Standard
        );
    }

    #[test]
    fn test_every_mode_has_profiles() {
        for mode in enum_iterator::all::<UiMode>() {
            let layout = LayoutProfile::for_mode(mode);
            assert!(layout.button_scale > 0.0);
            let perf = PerformanceProfile::for_mode(mode);
            assert!(perf.tick_ms > 0);
        }
    }

    #[test]
    fn test_capability_gating() {
        let user = UserContext {
            haptics: false,
            audio: false,
            reduced_motion: true,
            ..Default::default()
        };
        let feedback = FeedbackProfile::for_mode(UiMode::Intensive).adjusted_for(&user);
        assert_eq!(feedback.haptic_strength, 0.0);
        assert!(!feedback.sound_cues);
        let perf = PerformanceProfile::for_mode(UiMode::Standard).adjusted_for(&user);
        assert!(!perf.animations);
    }

    #[test]
    fn test_handheld_forces_single_column() {
        let user = UserContext::detect(48, false, false, true);
        assert_eq!(user.device, DeviceClass::Handheld);
        let layout = LayoutProfile::for_mode(UiMode::Standard).adjusted_for(&user);
        assert!(layout.single_column);
    }

    #[test]
    fn test_intensive_skips_confirmation() {
        assert!(!InteractionProfile::for_mode(UiMode::Intensive).confirm_destructive);
        assert!(InteractionProfile::for_mode(UiMode::Standard).confirm_destructive);
    }

    #[test]
    fn test_setup_ignores_gestures() {
        use crate::gesture::{Direction, GestureKind};
        assert_eq!(
            InteractionProfile::binding(UiMode::Setup, GestureKind::Swipe(Direction::Up)),
            GestureAction::None
        );
        assert_eq!(
            InteractionProfile::binding(UiMode::Standard, GestureKind::Swipe(Direction::Up)),
            GestureAction::RecordGoalUs
        );
    }
}
