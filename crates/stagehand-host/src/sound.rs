//! A sound service without an audio backend.
//!
//! Keeps the registry, mute flag, master volume and ambient track, and logs
//! each playback instead of producing audio.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use stagehand_core::sound::{PlaybackId, SoundService};
use tracing::{debug, info, warn};

#[derive(Debug)]
struct SoundState {
    registry: BTreeMap<String, String>,
    ambient: Option<String>,
    muted: bool,
    volume: f32,
    next_playback: u64,
}

/// Sound service that reports playback through `tracing`.
#[derive(Debug)]
pub struct TracingSoundService {
    state: Mutex<SoundState>,
}

impl Default for TracingSoundService {
    fn default() -> Self {
        Self {
            state: Mutex::new(SoundState {
                registry: BTreeMap::new(),
                ambient: None,
                muted: false,
                volume: 1.0,
                next_playback: 1,
            }),
        }
    }
}

impl TracingSoundService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current master volume.
    #[must_use]
    pub fn volume(&self) -> f32 {
        self.lock().volume
    }

    /// Current ambient source, if one is playing.
    #[must_use]
    pub fn ambient(&self) -> Option<String> {
        self.lock().ambient.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SoundState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SoundService for TracingSoundService {
    fn register(&self, name: &str, source: &str) {
        self.lock()
            .registry
            .insert(name.to_owned(), source.to_owned());
        debug!(name, source, "sound registered");
    }

    fn play(&self, name: &str) -> Option<PlaybackId> {
        let mut state = self.lock();
        if state.muted {
            debug!(name, "sound suppressed while muted");
            return None;
        }
        let Some(source) = state.registry.get(name).cloned() else {
            warn!(name, "sound not found");
            return None;
        };
        let id = PlaybackId(state.next_playback);
        state.next_playback += 1;
        info!(name, %source, volume = state.volume, playback = id.0, "sound played");
        Some(id)
    }

    fn stop(&self, name: &str) {
        debug!(name, "sound stopped");
    }

    fn set_ambient(&self, source: Option<&str>) {
        let mut state = self.lock();
        if state.ambient.as_deref() == source {
            return;
        }
        match source {
            Some(source) => info!(source, muted = state.muted, "ambient started"),
            None => debug!("ambient stopped"),
        }
        state.ambient = source.map(str::to_owned);
    }

    fn toggle_mute(&self) -> bool {
        let mut state = self.lock();
        state.muted = !state.muted;
        info!(muted = state.muted, "mute toggled");
        state.muted
    }

    fn is_muted(&self) -> bool {
        self.lock().muted
    }

    fn set_volume(&self, volume: f32) {
        let volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            1.0
        };
        self.lock().volume = volume;
    }
}
