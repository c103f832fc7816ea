use glam::Vec3;

/// Cache key of a sound.
pub type SoundId = String;

/// Identity and playback policy of a loadable sound.
///
/// Loop and 3D policy are fixed once built. Position and volume change over
/// the sound's life; `volume` is the last requested target and is the source
/// level for the next fade.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundDescriptor {
    id: SoundId,
    path: String,
    looping: bool,
    is_3d: bool,
    position: Vec3,
    volume: f32,
    reverb_amount: f32,
    loaded: bool,
}

impl SoundDescriptor {
    /// Descriptor keyed by its file path.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            id: path.clone(),
            path,
            looping: false,
            is_3d: false,
            position: Vec3::ZERO,
            volume: 1.0,
            reverb_amount: 0.0,
            loaded: false,
        }
    }

    /// Use an explicit key instead of the path, e.g. to load one file under two policies.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.id = key.into();
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn spatial(mut self, is_3d: bool) -> Self {
        self.is_3d = is_3d;
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_reverb(mut self, amount: f32) -> Self {
        self.reverb_amount = amount.clamp(0.0, 1.0);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_loop(&self) -> bool {
        self.looping
    }

    pub fn is_3d(&self) -> bool {
        self.is_3d
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn reverb_amount(&self) -> f32 {
        self.reverb_amount
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn set_3d_coords(&mut self, x: f32, y: f32, z: f32) {
        self.position = Vec3::new(x, y, z);
    }

    pub(crate) fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub(crate) fn mark_loaded(&mut self) {
        self.loaded = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_defaults_to_path() {
        let d = SoundDescriptor::new("sfx/explosion.wav");
        assert_eq!(d.id(), "sfx/explosion.wav");
        assert_eq!(d.path(), "sfx/explosion.wav");
        assert!(!d.is_loaded());
        assert_eq!(d.volume(), 1.0);
    }

    #[test]
    fn explicit_key_overrides_identity_only() {
        let d = SoundDescriptor::new("music/theme.ogg").with_key("theme-loop").looping(true);
        assert_eq!(d.id(), "theme-loop");
        assert_eq!(d.path(), "music/theme.ogg");
        assert!(d.is_loop());
    }

    #[test]
    fn volume_and_reverb_are_clamped() {
        let d = SoundDescriptor::new("a.wav").with_volume(1.7).with_reverb(-0.2);
        assert_eq!(d.volume(), 1.0);
        assert_eq!(d.reverb_amount(), 0.0);
    }

    #[test]
    fn coords_update_position() {
        let mut d = SoundDescriptor::new("a.wav").spatial(true);
        d.set_3d_coords(1.0, 2.0, 3.0);
        assert_eq!(d.position(), Vec3::new(1.0, 2.0, 3.0));
    }
}
