//! Easing curves shared by the tween engine and the curtain.

use serde::{Deserialize, Serialize};

const BACK_OVERSHOOT: f32 = 1.701_58;

/// Maps normalised time `t` in `[0, 1]` to eased progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Easing {
    /// No easing.
    Linear,
    /// Cubic acceleration from rest.
    CubicIn,
    /// Cubic deceleration to rest: `1 - (1 - t)^3`.
    CubicOut,
    /// Decelerates past the target and settles back.
    BackOut,
}

impl Easing {
    /// Applies the curve. Input is clamped to `[0, 1]`; both ends map
    /// exactly to 0 and 1.
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::CubicIn => t * t * t,
            Self::CubicOut => 1.0 - (1.0 - t).powi(3),
            Self::BackOut => {
                let u = t - 1.0;
                1.0 + (BACK_OVERSHOOT + 1.0) * u.powi(3) + BACK_OVERSHOOT * u.powi(2)
            }
        }
    }
}
