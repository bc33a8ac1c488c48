//! Sound service abstraction.
//!
//! Scenes and the curtain gate receive an `Arc<dyn SoundService>` instead of
//! reaching for a global audio manager, so the core runs without an audio
//! backend.

/// Handle to one playback of a registered sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaybackId(pub u64);

/// Registration and playback of named sounds.
pub trait SoundService: Send + Sync {
    /// Registers `source` under `name`, replacing any previous registration.
    fn register(&self, name: &str, source: &str);

    /// Plays a registered sound. Returns `None` while muted or when `name`
    /// is not registered.
    fn play(&self, name: &str) -> Option<PlaybackId>;

    /// Stops every playback of `name`.
    fn stop(&self, name: &str);

    /// Replaces the looping ambient track; `None` stops it.
    fn set_ambient(&self, source: Option<&str>);

    /// Flips the mute flag and returns the new value.
    fn toggle_mute(&self) -> bool;

    /// Returns the mute flag.
    fn is_muted(&self) -> bool;

    /// Sets the master volume, clamped to `[0, 1]`.
    fn set_volume(&self, volume: f32);
}
