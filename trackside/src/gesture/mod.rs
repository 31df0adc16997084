use log::*;
use tokio::time::{Duration, Instant};

const SWIPE_MIN_DISPLACEMENT: f32 = 50.0;
const TAP_MAX_PATH: f32 = 10.0;
const LONG_PRESS_HOLD: Duration = Duration::from_millis(500);
const DOUBLE_TAP_WINDOW: Duration = Duration::from_millis(300);
const DOUBLE_TAP_RADIUS: f32 = 30.0;
const ZIGZAG_NOISE_FLOOR: f32 = 10.0;
const ZIGZAG_MIN_REVERSALS: usize = 2;
const CIRCLE_MIN_TURN: f32 = 0.9 * core::f32::consts::TAU;
const PINCH_IN_RATIO: f32 = 0.8;
const PINCH_OUT_RATIO: f32 = 1.25;
const FORCE_THRESHOLD: f32 = 0.5;
const MIN_MOTION_SAMPLES: usize = 3;
const CONFIDENCE_PATH_NORM: f32 = 200.0;
const CONFIDENCE_SAMPLE_NORM: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinchDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Tap,
    DoubleTap,
    LongPress,
    Swipe(Direction),
    Pinch(PinchDirection),
    Circle(Rotation),
    Zigzag,
    ForcePress,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classified {
    pub gesture: GestureKind,
    pub confidence: f32,
}

/// One point on a pointer path. `force` is reported only by force-capable
/// input devices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub x: f32,
    pub y: f32,
    pub at: Instant,
    pub force: Option<f32>,
}

impl PointerSample {
    pub fn new(x: f32, y: f32, at: Instant) -> Self {
        Self {
            x,
            y,
            at,
            force: None,
        }
    }

    fn distance_to(&self, other: &PointerSample) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TrackerState {
    Idle,
    Tracking {
        paths: Vec<Vec<PointerSample>>,
        consumed: bool,
    },
}

/// Buffers pointer paths and classifies them on release. A held first tap is
/// kept pending until the double-tap window lapses, so `poll(now)` must be
/// called on ticks to flush it (and to fire long presses before release).
#[derive(Debug)]
pub struct PointerTracker {
    state: TrackerState,
    pending_tap: Option<PointerSample>,
    force_touch: bool,
    long_press_hold: Duration,
    double_tap_window: Duration,
}

impl PointerTracker {
    pub fn new(force_touch: bool) -> Self {
        Self {
            state: TrackerState::Idle,
            pending_tap: None,
            force_touch,
            long_press_hold: LONG_PRESS_HOLD,
            double_tap_window: DOUBLE_TAP_WINDOW,
        }
    }

    /// Retunes the hold and double-tap windows. The interaction profile of
    /// the active mode calls this whenever the mode changes.
    pub fn set_timing(&mut self, long_press_ms: u64, double_tap_ms: u64) {
        self.long_press_hold = Duration::from_millis(long_press_ms);
        self.double_tap_window = Duration::from_millis(double_tap_ms);
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.state, TrackerState::Tracking { .. })
    }

    /// A pointer went down. A second press while tracking starts the second
    /// path of a pinch.
    pub fn press(&mut self, sample: PointerSample) {
        match &mut self.state {
            TrackerState::Idle => {
                self.state = TrackerState::Tracking {
                    paths: vec![vec![sample]],
                    consumed: false,
                };
            }
            TrackerState::Tracking { paths, .. } if paths.len() < 2 => {
                paths.push(vec![sample]);
            }
            TrackerState::Tracking { .. } => {
                trace!("Ignoring third concurrent pointer");
            }
        }
    }

    /// A pointer moved while down. `pointer` is 0 for the first finger,
    /// 1 for the second.
    pub fn moved(&mut self, pointer: usize, sample: PointerSample) {
        if let TrackerState::Tracking { paths, .. } = &mut self.state {
            if let Some(path) = paths.get_mut(pointer) {
                path.push(sample);
            }
        }
    }

    /// The last pointer lifted. Classifies the buffered path(s).
    pub fn release(&mut self, now: Instant) -> Option<Classified> {
        let state = std::mem::replace(&mut self.state, TrackerState::Idle);
        let TrackerState::Tracking { paths, consumed } = state else {
            return None;
        };
        if consumed {
            return None;
        }

        let result = match paths.len() {
            2 => classify_pinch(&paths[0], &paths[1]),
            1 => self.classify_single(&paths[0], now),
            _ => None,
        };
        if let Some(classified) = result {
            debug!(
                "Classified {:?} with confidence {:.2}",
                classified.gesture, classified.confidence
            );
        }
        result
    }

    /// Time-driven outputs: fires a long press on a held pointer and flushes
    /// a pending single tap once the double-tap window lapses.
    pub fn poll(&mut self, now: Instant) -> Option<Classified> {
        if let Some(first) = self.pending_tap {
            if now.saturating_duration_since(first.at) > self.double_tap_window {
                self.pending_tap = None;
                return Some(Classified {
                    gesture: GestureKind::Tap,
                    confidence: tap_confidence(1),
                });
            }
        }

        if let TrackerState::Tracking { paths, consumed } = &mut self.state {
            if !*consumed && paths.len() == 1 {
                let path = &paths[0];
                let start = path.first()?;
                let held = now.saturating_duration_since(start.at);
                if held >= self.long_press_hold && path_length(path) < TAP_MAX_PATH {
                    *consumed = true;
                    return Some(Classified {
                        gesture: GestureKind::LongPress,
                        confidence: tap_confidence(path.len()),
                    });
                }
            }
        }

        None
    }

    fn classify_single(&mut self, path: &[PointerSample], now: Instant) -> Option<Classified> {
        let start = path.first()?;
        let end = path.last()?;
        let length = path_length(path);

        if self.force_touch
            && length < TAP_MAX_PATH
            && path.iter().any(|s| s.force.is_some_and(|f| f >= FORCE_THRESHOLD))
        {
            return Some(Classified {
                gesture: GestureKind::ForcePress,
                confidence: tap_confidence(path.len()),
            });
        }

        if length < TAP_MAX_PATH {
            let held = end.at.saturating_duration_since(start.at);
            if held >= self.long_press_hold {
                return Some(Classified {
                    gesture: GestureKind::LongPress,
                    confidence: tap_confidence(path.len()),
                });
            }
            return self.classify_tap(*end, now);
        }

        if path.len() < MIN_MOTION_SAMPLES {
            return None;
        }

        let confidence = motion_confidence(length, path.len());

        if let Some(rotation) = detect_circle(path) {
            return Some(Classified {
                gesture: GestureKind::Circle(rotation),
                confidence,
            });
        }

        if count_reversals(path) >= ZIGZAG_MIN_REVERSALS {
            return Some(Classified {
                gesture: GestureKind::Zigzag,
                confidence,
            });
        }

        let dx = end.x - start.x;
        let dy = end.y - start.y;
        if (dx * dx + dy * dy).sqrt() >= SWIPE_MIN_DISPLACEMENT {
            // 90 degree bins: the dominant component picks the cardinal
            let direction = if dx.abs() >= dy.abs() {
                if dx > 0.0 { Direction::Right } else { Direction::Left }
            } else if dy > 0.0 {
                Direction::Down
            } else {
                Direction::Up
            };
            return Some(Classified {
                gesture: GestureKind::Swipe(direction),
                confidence,
            });
        }

        None
    }

    fn classify_tap(&mut self, tap: PointerSample, now: Instant) -> Option<Classified> {
        if let Some(first) = self.pending_tap.take() {
            let in_window = now.saturating_duration_since(first.at) <= self.double_tap_window;
            if in_window && first.distance_to(&tap) <= DOUBLE_TAP_RADIUS {
                return Some(Classified {
                    gesture: GestureKind::DoubleTap,
                    confidence: tap_confidence(2),
                });
            }
            // The first tap lapsed, report it and hold the new one
            self.pending_tap = Some(tap);
            return Some(Classified {
                gesture: GestureKind::Tap,
                confidence: tap_confidence(1),
            });
        }
        self.pending_tap = Some(tap);
        None
    }
}

fn path_length(path: &[PointerSample]) -> f32 {
    path.windows(2).map(|w| w[0].distance_to(&w[1])).sum()
}

fn motion_confidence(path_len: f32, samples: usize) -> f32 {
    let len_term = (path_len / CONFIDENCE_PATH_NORM).min(1.0);
    let sample_term = (samples as f32 / CONFIDENCE_SAMPLE_NORM).min(1.0);
    (0.5 * len_term + 0.5 * sample_term).clamp(0.0, 1.0)
}

fn tap_confidence(samples: usize) -> f32 {
    (samples as f32 / CONFIDENCE_SAMPLE_NORM).min(1.0).max(0.1)
}

/// Signed cumulative turn angle across consecutive segment pairs. In screen
/// coordinates (+y down) a positive sum is a clockwise loop.
fn detect_circle(path: &[PointerSample]) -> Option<Rotation> {
    let start = path.first()?;
    let end = path.last()?;
    let net = start.distance_to(end);
    if net >= SWIPE_MIN_DISPLACEMENT {
        return None;
    }

    let mut total_turn = 0.0_f32;
    for w in path.windows(3) {
        let v1 = (w[1].x - w[0].x, w[1].y - w[0].y);
        let v2 = (w[2].x - w[1].x, w[2].y - w[1].y);
        let cross = v1.0 * v2.1 - v1.1 * v2.0;
        let dot = v1.0 * v2.0 + v1.1 * v2.1;
        // Collinear pairs carry no rotation sign, straight reversals included
        if cross == 0.0 {
            continue;
        }
        total_turn += cross.atan2(dot);
    }

    if total_turn.abs() >= CIRCLE_MIN_TURN {
        Some(if total_turn > 0.0 {
            Rotation::Clockwise
        } else {
            Rotation::CounterClockwise
        })
    } else {
        None
    }
}

/// Counts direction reversals along the dominant axis, ignoring legs shorter
/// than the noise floor.
fn count_reversals(path: &[PointerSample]) -> usize {
    if path.len() < 2 {
        return 0;
    }
    let horizontal = {
        let var_x: f32 = path.windows(2).map(|w| (w[1].x - w[0].x).abs()).sum();
        let var_y: f32 = path.windows(2).map(|w| (w[1].y - w[0].y).abs()).sum();
        var_x >= var_y
    };

    let project = |s: &PointerSample| if horizontal { s.x } else { s.y };

    let mut reversals = 0;
    let mut leg_start = project(&path[0]);
    let mut direction: Option<bool> = None;
    for sample in &path[1..] {
        let pos = project(sample);
        let delta = pos - leg_start;
        if delta.abs() < ZIGZAG_NOISE_FLOOR {
            continue;
        }
        let positive = delta > 0.0;
        if let Some(prev) = direction {
            if prev != positive {
                reversals += 1;
            }
        }
        direction = Some(positive);
        leg_start = pos;
    }
    reversals
}

fn classify_pinch(a: &[PointerSample], b: &[PointerSample]) -> Option<Classified> {
    if a.len() < 2 || b.len() < 2 {
        return None;
    }
    let start_sep = a.first()?.distance_to(b.first()?);
    let end_sep = a.last()?.distance_to(b.last()?);
    if start_sep <= 0.0 {
        return None;
    }
    let ratio = end_sep / start_sep;
    let direction = if ratio < PINCH_IN_RATIO {
        PinchDirection::In
    } else if ratio > PINCH_OUT_RATIO {
        PinchDirection::Out
    } else {
        return None;
    };
    let confidence = motion_confidence(
        path_length(a).max(path_length(b)),
        a.len().max(b.len()),
    );
    Some(Classified {
        gesture: GestureKind::Pinch(direction),
        confidence,
    })
}
