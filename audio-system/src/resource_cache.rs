use std::collections::HashMap;

use audio_backend::{AudioBackend, SoundHandle, SoundMode};

use crate::descriptor::{SoundDescriptor, SoundId};
use crate::error::{BackendFailure, BackendResultExt, LoadError};

/// A sound resource resident in the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedSound {
    pub handle: SoundHandle,
    pub length_ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    AlreadyLoaded,
}

/// Load-once map from sound id to backend resource.
///
/// Entries live until `release_all` at teardown; there is no eviction, so
/// memory grows with the number of distinct ids loaded.
#[derive(Debug, Default)]
pub struct ResourceCache {
    sounds: HashMap<SoundId, CachedSound>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the backend resource for `descriptor` unless its id is already cached.
    ///
    /// `distance_bounds` is applied to 3D sounds (backend units). On failure
    /// nothing is cached and any partially created resource is released.
    pub fn load<B: AudioBackend>(
        &mut self,
        backend: &mut B,
        descriptor: &mut SoundDescriptor,
        distance_bounds: (f32, f32),
    ) -> Result<LoadOutcome, LoadError> {
        if self.sounds.contains_key(descriptor.id()) {
            tracing::info!(sound = descriptor.id(), "sound was already loaded");
            descriptor.mark_loaded();
            return Ok(LoadOutcome::AlreadyLoaded);
        }

        let mode = SoundMode { looping: descriptor.is_loop(), positional: descriptor.is_3d() };
        let handle = backend
            .create_sound(descriptor.path(), mode)
            .during("create_sound")?;

        let finish = |backend: &mut B| -> Result<u32, BackendFailure> {
            if descriptor.is_3d() {
                let (min, max) = distance_bounds;
                backend
                    .set_sound_min_max_distance(handle, min, max)
                    .during("set_sound_min_max_distance")?;
            }
            backend.sound_length_ms(handle).during("sound_length_ms")
        };
        let length_ms = match finish(backend) {
            Ok(length) => length,
            Err(err) => {
                if let Err(release) = backend.release_sound(handle) {
                    tracing::warn!(sound = descriptor.id(), error = %release, "could not release half-loaded sound");
                }
                return Err(err.into());
            }
        };

        self.sounds
            .insert(descriptor.id().to_string(), CachedSound { handle, length_ms });
        descriptor.mark_loaded();
        tracing::info!(sound = descriptor.id(), path = descriptor.path(), length_ms, looping = mode.looping, positional = mode.positional, "loaded sound");
        Ok(LoadOutcome::Loaded)
    }

    /// Length in milliseconds, 0 for an unknown id.
    pub fn length_ms(&self, id: &str) -> u32 {
        self.sounds.get(id).map(|s| s.length_ms).unwrap_or(0)
    }

    pub fn handle(&self, id: &str) -> Option<SoundHandle> {
        self.sounds.get(id).map(|s| s.handle)
    }

    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }

    /// Release every cached resource. Keeps going past failures and reports the first.
    pub fn release_all<B: AudioBackend>(&mut self, backend: &mut B) -> Result<(), BackendFailure> {
        let mut first_err = None;
        for (id, sound) in self.sounds.drain() {
            if let Err(err) = backend.release_sound(sound.handle).during("release_sound") {
                tracing::warn!(sound = %id, error = %err, "release failed");
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audio_backend::{BackendCall, BackendConfig, MockAudioBackend};

    const BOUNDS: (f32, f32) = (0.5, 5000.0);

    fn backend() -> MockAudioBackend {
        let mut b = MockAudioBackend::new()
            .with_sound_length("ambient.ogg", 12_500)
            .fail_on_path("broken.wav");
        b.initialize(&BackendConfig::default()).unwrap();
        b
    }

    #[test]
    fn load_marks_descriptor_and_records_length() {
        let mut b = backend();
        let mut cache = ResourceCache::new();
        let mut d = SoundDescriptor::new("ambient.ogg").looping(true);
        assert_eq!(cache.load(&mut b, &mut d, BOUNDS).unwrap(), LoadOutcome::Loaded);
        assert!(d.is_loaded());
        assert_eq!(cache.length_ms("ambient.ogg"), 12_500);
        assert!(b.calls().iter().any(|c| matches!(
            c,
            BackendCall::CreateSound { mode: SoundMode { looping: true, positional: false }, .. }
        )));
    }

    #[test]
    fn second_load_of_same_id_is_a_no_op() {
        let mut b = backend();
        let mut cache = ResourceCache::new();
        let mut d = SoundDescriptor::new("ambient.ogg");
        cache.load(&mut b, &mut d, BOUNDS).unwrap();
        let mut again = SoundDescriptor::new("ambient.ogg");
        assert_eq!(cache.load(&mut b, &mut again, BOUNDS).unwrap(), LoadOutcome::AlreadyLoaded);
        assert!(again.is_loaded());
        assert_eq!(cache.len(), 1);
        assert_eq!(b.live_sound_count(), 1);
    }

    #[test]
    fn positional_sounds_get_distance_bounds() {
        let mut b = backend();
        let mut cache = ResourceCache::new();
        let mut d = SoundDescriptor::new("explosion.wav").spatial(true);
        cache.load(&mut b, &mut d, (1.0, 100.0)).unwrap();
        let handle = cache.handle("explosion.wav").unwrap();
        assert_eq!(b.sound_min_max_distance(handle), Some((1.0, 100.0)));
    }

    #[test]
    fn failed_creation_leaves_cache_unchanged() {
        let mut b = backend();
        let mut cache = ResourceCache::new();
        let mut d = SoundDescriptor::new("broken.wav");
        let err = cache.load(&mut b, &mut d, BOUNDS).unwrap_err();
        assert!(matches!(err, LoadError::Backend(ref f) if f.op == "create_sound"));
        assert!(!d.is_loaded());
        assert!(cache.is_empty());
        assert_eq!(cache.length_ms("broken.wav"), 0);
    }

    #[test]
    fn unknown_id_has_zero_length() {
        assert_eq!(ResourceCache::new().length_ms("nope.wav"), 0);
    }

    #[test]
    fn release_all_empties_backend_and_cache() {
        let mut b = backend();
        let mut cache = ResourceCache::new();
        for path in ["a.wav", "b.wav", "c.wav"] {
            cache.load(&mut b, &mut SoundDescriptor::new(path), BOUNDS).unwrap();
        }
        cache.release_all(&mut b).unwrap();
        assert!(cache.is_empty());
        assert_eq!(b.live_sound_count(), 0);
    }
}
