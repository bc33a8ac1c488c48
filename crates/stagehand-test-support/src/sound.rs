//! Recording sound service: a silent `SoundService` that remembers calls.

use std::sync::Mutex;

use stagehand_core::sound::{PlaybackId, SoundService};

#[derive(Debug, Default)]
struct Recorded {
    registered: Vec<(String, String)>,
    played: Vec<String>,
    stopped: Vec<String>,
    ambient: Option<String>,
    muted: bool,
    volume: f32,
}

/// A sound service that plays nothing and records everything.
///
/// `play` follows the production contract: it returns `None` (and records
/// nothing) while muted or for names that were never registered.
#[derive(Debug, Default)]
pub struct RecordingSoundService {
    inner: Mutex<Recorded>,
}

impl RecordingSoundService {
    /// Returns `(name, source)` pairs in registration order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn registered(&self) -> Vec<(String, String)> {
        self.inner.lock().unwrap().registered.clone()
    }

    /// Returns the names of sounds that actually played.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn played(&self) -> Vec<String> {
        self.inner.lock().unwrap().played.clone()
    }

    /// Returns the names passed to `stop`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn stopped(&self) -> Vec<String> {
        self.inner.lock().unwrap().stopped.clone()
    }

    /// Returns the current ambient source.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn ambient(&self) -> Option<String> {
        self.inner.lock().unwrap().ambient.clone()
    }

    /// Returns the last volume set.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn volume(&self) -> f32 {
        self.inner.lock().unwrap().volume
    }
}

impl SoundService for RecordingSoundService {
    fn register(&self, name: &str, source: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.registered.retain(|(existing, _)| existing != name);
        inner.registered.push((name.to_owned(), source.to_owned()));
    }

    fn play(&self, name: &str) -> Option<PlaybackId> {
        let mut inner = self.inner.lock().unwrap();
        if inner.muted || !inner.registered.iter().any(|(n, _)| n == name) {
            return None;
        }
        inner.played.push(name.to_owned());
        Some(PlaybackId(inner.played.len() as u64))
    }

    fn stop(&self, name: &str) {
        self.inner.lock().unwrap().stopped.push(name.to_owned());
    }

    fn set_ambient(&self, source: Option<&str>) {
        self.inner.lock().unwrap().ambient = source.map(str::to_owned);
    }

    fn toggle_mute(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        inner.muted = !inner.muted;
        inner.muted
    }

    fn is_muted(&self) -> bool {
        self.inner.lock().unwrap().muted
    }

    fn set_volume(&self, volume: f32) {
        self.inner.lock().unwrap().volume = volume.clamp(0.0, 1.0);
    }
}
