//! Pointer-drag tracking and the two commit predicates used on job cards.

use std::time::{Duration, Instant};

use shared::domain::Verdict;

pub const DEFAULT_COMMIT_THRESHOLD_PX: f32 = 75.0;
pub const DEFAULT_ROTATION_DIVISOR: f32 = 20.0;
/// Offset (px) times velocity (px/s) a fling must exceed to commit.
pub const DEFAULT_SWIPE_CONFIDENCE: f32 = 10_000.0;
/// A pointer that has not moved for longer than this is treated as stationary.
pub const VELOCITY_WINDOW: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Auxiliary,
}

/// Ephemeral state of one captured pointer gesture.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DragState {
    pub origin: f32,
    pub offset: f32,
    pub active: bool,
    velocity: f32,
    last_sample: Option<(f32, Instant)>,
}

impl DragState {
    pub fn begin(&mut self, x: f32) {
        self.begin_at(x, Instant::now());
    }

    pub fn begin_at(&mut self, x: f32, now: Instant) {
        *self = Self {
            origin: x,
            offset: 0.0,
            active: true,
            velocity: 0.0,
            last_sample: Some((x, now)),
        };
    }

    /// Updates the offset from a pointer position. Returns false when no gesture is captured.
    pub fn track(&mut self, x: f32) -> bool {
        self.track_at(x, Instant::now())
    }

    pub fn track_at(&mut self, x: f32, now: Instant) -> bool {
        if !self.active {
            return false;
        }
        if let Some((last_x, last_at)) = self.last_sample {
            let elapsed = now.saturating_duration_since(last_at).as_secs_f32();
            if elapsed > 0.0 {
                self.velocity = (x - last_x) / elapsed;
            }
        }
        self.last_sample = Some((x, now));
        self.offset = x - self.origin;
        true
    }

    /// Horizontal velocity in px/s estimated from the last two samples.
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Ends the gesture and returns `(offset, velocity)` at release.
    pub fn release(&mut self) -> (f32, f32) {
        self.release_at(Instant::now())
    }

    /// Velocity is zero when the last sample is older than [`VELOCITY_WINDOW`].
    pub fn release_at(&mut self, now: Instant) -> (f32, f32) {
        let velocity = match self.last_sample {
            Some((_, last_at)) if now.saturating_duration_since(last_at) <= VELOCITY_WINDOW => {
                self.velocity
            }
            _ => 0.0,
        };
        let released = (self.offset, velocity);
        *self = Self::default();
        released
    }
}

/// Visual transform of the current card; a pure function of the drag offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardTransform {
    pub translate_x: f32,
    pub rotate_deg: f32,
}

impl CardTransform {
    pub const AT_REST: CardTransform = CardTransform {
        translate_x: 0.0,
        rotate_deg: 0.0,
    };

    pub fn for_offset(offset: f32, rotation_divisor: f32) -> Self {
        if rotation_divisor == 0.0 {
            return Self {
                translate_x: offset,
                rotate_deg: 0.0,
            };
        }
        Self {
            translate_x: offset,
            rotate_deg: offset / rotation_divisor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommitPolicy {
    /// Commit when `|offset|` strictly exceeds `threshold` at release.
    Distance { threshold: f32 },
    /// Commit when `|offset| * |velocity|` strictly exceeds `confidence`.
    SwipePower { confidence: f32 },
}

impl Default for CommitPolicy {
    fn default() -> Self {
        CommitPolicy::Distance {
            threshold: DEFAULT_COMMIT_THRESHOLD_PX,
        }
    }
}

impl CommitPolicy {
    pub fn swipe_power() -> Self {
        CommitPolicy::SwipePower {
            confidence: DEFAULT_SWIPE_CONFIDENCE,
        }
    }

    pub fn evaluate(&self, offset: f32, velocity: f32) -> Option<Verdict> {
        match *self {
            CommitPolicy::Distance { threshold } => {
                if offset > threshold {
                    Some(Verdict::Accept)
                } else if offset < -threshold {
                    Some(Verdict::Reject)
                } else {
                    None
                }
            }
            CommitPolicy::SwipePower { confidence } => {
                if swipe_power(offset, velocity) > confidence {
                    direction(offset, velocity)
                } else {
                    None
                }
            }
        }
    }
}

pub fn swipe_power(offset: f32, velocity: f32) -> f32 {
    offset.abs() * velocity.abs()
}

fn direction(offset: f32, velocity: f32) -> Option<Verdict> {
    let signed = if offset != 0.0 { offset } else { velocity };
    if signed > 0.0 {
        Some(Verdict::Accept)
    } else if signed < 0.0 {
        Some(Verdict::Reject)
    } else {
        None
    }
}

#[cfg(test)]
#[path = "tests/gesture_tests.rs"]
mod tests;
