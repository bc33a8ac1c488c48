//! Transition presets as declarative tweens.
//!
//! Exits start from the container's current transform and ease in; entries
//! start from the preset's offset state and ease out to the identity
//! transform, so an entered scene always rests at alpha 1, offset 0,
//! scale 1.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use stagehand_core::container::Transform;
use stagehand_core::easing::Easing;
use stagehand_core::error::StageError;
use stagehand_core::scene::Viewport;

/// A tween from one transform to another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenSpec {
    pub from: Transform,
    pub to: Transform,
    pub duration: Duration,
    pub easing: Easing,
}

impl TweenSpec {
    /// Transform at normalised time `t`.
    #[must_use]
    pub fn sample(&self, t: f32) -> Transform {
        self.from.lerp(self.to, self.easing.apply(t))
    }
}

/// The built-in presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Transition {
    Fade,
    SlideLeft,
    SlideRight,
    Scale,
    Zoom,
}

impl Transition {
    pub const ALL: [Self; 5] = [
        Self::Fade,
        Self::SlideLeft,
        Self::SlideRight,
        Self::Scale,
        Self::Zoom,
    ];

    /// The preset's name as used in `ChangeOptions`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fade => "fade",
            Self::SlideLeft => "slideLeft",
            Self::SlideRight => "slideRight",
            Self::Scale => "scale",
            Self::Zoom => "zoom",
        }
    }

    /// Tween that takes an outgoing container from `start` off stage.
    #[must_use]
    pub fn exit_tween(self, start: Transform, viewport: Viewport, duration: Duration) -> TweenSpec {
        let mut to = start;
        match self {
            Self::Fade => to.alpha = 0.0,
            Self::SlideLeft => to.position.x = -viewport.width,
            Self::SlideRight => to.position.x = viewport.width,
            Self::Scale => {
                to.alpha = 0.0;
                to.scale = 0.8;
            }
            Self::Zoom => {
                to.alpha = 0.0;
                to.scale = 1.5;
            }
        }
        TweenSpec {
            from: start,
            to,
            duration,
            easing: Easing::CubicIn,
        }
    }

    /// Tween that brings an incoming container to rest.
    #[must_use]
    pub fn enter_tween(self, viewport: Viewport, duration: Duration) -> TweenSpec {
        let rest = Transform::default();
        let (from, easing) = match self {
            Self::Fade => (Transform { alpha: 0.0, ..rest }, Easing::CubicOut),
            Self::SlideLeft => (
                Transform {
                    position: Vec2::new(viewport.width, 0.0),
                    ..rest
                },
                Easing::CubicOut,
            ),
            Self::SlideRight => (
                Transform {
                    position: Vec2::new(-viewport.width, 0.0),
                    ..rest
                },
                Easing::CubicOut,
            ),
            Self::Scale => (
                Transform {
                    alpha: 0.0,
                    scale: 1.2,
                    ..rest
                },
                Easing::CubicOut,
            ),
            Self::Zoom => (
                Transform {
                    alpha: 0.0,
                    scale: 0.5,
                    ..rest
                },
                Easing::BackOut,
            ),
        };
        TweenSpec {
            from,
            to: rest,
            duration,
            easing,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transition {
    type Err = StageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.as_str() == s)
            .ok_or_else(|| StageError::Validation(format!("unknown transition preset: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HALF: Duration = Duration::from_millis(500);

    #[test]
    fn test_names_round_trip() {
        for preset in Transition::ALL {
            assert_eq!(preset.as_str().parse::<Transition>().unwrap(), preset);
        }
        assert!(matches!(
            "wipe".parse::<Transition>(),
            Err(StageError::Validation(_))
        ));
    }

    #[test]
    fn test_every_enter_tween_rests_at_identity() {
        for preset in Transition::ALL {
            let spec = preset.enter_tween(Viewport::default(), HALF);

            assert_eq!(spec.sample(1.0), Transform::default(), "{preset}");
            assert_eq!(spec.duration, HALF);
        }
    }

    #[test]
    fn test_slide_left_moves_out_left_and_in_from_right() {
        // Arrange
        let viewport = Viewport::default();

        // Act
        let exit = Transition::SlideLeft.exit_tween(Transform::default(), viewport, HALF);
        let enter = Transition::SlideLeft.enter_tween(viewport, HALF);

        // Assert
        assert!((exit.to.position.x + viewport.width).abs() < f32::EPSILON);
        assert!((enter.from.position.x - viewport.width).abs() < f32::EPSILON);
        assert_eq!(exit.easing, Easing::CubicIn);
        assert_eq!(enter.easing, Easing::CubicOut);
    }

    #[test]
    fn test_exit_starts_from_current_transform() {
        let start = Transform {
            alpha: 0.6,
            position: Vec2::new(10.0, 0.0),
            scale: 1.0,
        };

        let exit = Transition::Fade.exit_tween(start, Viewport::default(), HALF);

        assert_eq!(exit.sample(0.0), start);
        assert!(exit.sample(1.0).alpha.abs() < f32::EPSILON);
        assert!((exit.sample(1.0).position.x - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_zoom_enters_from_half_scale_with_overshoot() {
        let enter = Transition::Zoom.enter_tween(Viewport::default(), HALF);

        assert!((enter.from.scale - 0.5).abs() < f32::EPSILON);
        assert_eq!(enter.easing, Easing::BackOut);
        assert!(enter.sample(0.7).scale > 1.0);
    }
}
