//! Host configuration, read from `STAGE_*` environment variables.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;
use stagehand_core::scene::{SceneId, Viewport};
use stagehand_curtain::application::gate::GateConfig;

use crate::error::AppError;
use crate::rooms::RoomCatalog;

/// Tour used when `STAGE_TOUR` is unset.
pub const DEFAULT_TOUR: &str = "INTERIOR,LIVING:slideLeft,back,back";

/// One scripted navigation after the curtain opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TourStep {
    /// Navigate to `target`, optionally with a named preset.
    Go {
        target: SceneId,
        transition: Option<String>,
    },
    /// Return to the previous room.
    Back,
}

impl FromStr for TourStep {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let step = s.trim();
        if step.eq_ignore_ascii_case("back") {
            return Ok(Self::Back);
        }
        let (target, transition) = match step.split_once(':') {
            Some((target, transition)) => (target.trim(), Some(transition.trim())),
            None => (step, None),
        };
        if target.is_empty() || transition.is_some_and(str::is_empty) {
            return Err(AppError::Config(format!("invalid tour step: {s:?}")));
        }
        Ok(Self::Go {
            target: target.into(),
            transition: transition.map(str::to_owned),
        })
    }
}

/// Parses a comma-separated tour such as `"LIVING:slideLeft,back"`.
///
/// # Errors
///
/// Returns `AppError::Config` for an empty or malformed step.
pub fn parse_tour(tour: &str) -> Result<Vec<TourStep>, AppError> {
    if tour.trim().is_empty() {
        return Ok(Vec::new());
    }
    tour.split(',').map(str::parse).collect()
}

/// Runtime settings for the host binary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostConfig {
    /// Frames per second of the render loop.
    pub frame_rate: u32,
    /// Drawable area.
    pub viewport: Viewport,
    /// Downward pull, in pixels, that opens the curtain.
    pub pull_threshold: f32,
    /// Scripted navigation after the curtain opens.
    pub tour: Vec<TourStep>,
    /// Optional YAML room catalogue replacing the built-in rooms.
    pub rooms_file: Option<PathBuf>,
    /// Pace the loop against the wall clock; otherwise frames run back to back.
    pub realtime: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60,
            viewport: Viewport::default(),
            pull_threshold: 100.0,
            tour: parse_tour(DEFAULT_TOUR).unwrap_or_default(),
            rooms_file: None,
            realtime: true,
        }
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid ({raw:?}): {e}"))),
        None => Ok(default),
    }
}

impl HostConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, falling back to defaults
    /// for absent keys.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a value is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();

        let frame_rate: u32 = parse_var(&lookup, "STAGE_FRAME_RATE", defaults.frame_rate)?;
        if !(1..=240).contains(&frame_rate) {
            return Err(AppError::Config(format!(
                "STAGE_FRAME_RATE must be between 1 and 240, got {frame_rate}"
            )));
        }

        let width: f32 = parse_var(&lookup, "STAGE_VIEWPORT_WIDTH", defaults.viewport.width)?;
        let height: f32 = parse_var(&lookup, "STAGE_VIEWPORT_HEIGHT", defaults.viewport.height)?;
        if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
            return Err(AppError::Config(format!(
                "viewport must be positive, got {width}x{height}"
            )));
        }

        let pull_threshold: f32 =
            parse_var(&lookup, "STAGE_PULL_THRESHOLD", defaults.pull_threshold)?;
        if !(pull_threshold > 0.0 && pull_threshold.is_finite()) {
            return Err(AppError::Config(format!(
                "STAGE_PULL_THRESHOLD must be positive, got {pull_threshold}"
            )));
        }

        let tour = match lookup("STAGE_TOUR") {
            Some(raw) => parse_tour(&raw)?,
            None => defaults.tour,
        };

        Ok(Self {
            frame_rate,
            viewport: Viewport { width, height },
            pull_threshold,
            tour,
            rooms_file: lookup("STAGE_ROOMS_FILE").map(PathBuf::from),
            realtime: parse_var(&lookup, "STAGE_REALTIME", defaults.realtime)?,
        })
    }

    /// Length of one frame.
    #[must_use]
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.frame_rate.max(1)))
    }

    /// Curtain gate tuning for this viewport and threshold.
    #[must_use]
    pub fn gate_config(&self) -> GateConfig {
        let mut gate = GateConfig::default().fitted_to(self.viewport);
        gate.gesture.pull_threshold = self.pull_threshold;
        gate
    }

    /// The room catalogue: `rooms_file` if set, the built-in rooms otherwise.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` or `AppError::Yaml` if the file cannot be
    /// loaded.
    pub fn catalog(&self) -> Result<RoomCatalog, AppError> {
        match &self.rooms_file {
            Some(path) => RoomCatalog::load(path),
            None => Ok(RoomCatalog::builtin()),
        }
    }
}
