use audio_backend::AudioBackend;

use crate::error::{BackendFailure, BackendResultExt};

/// Master output gate. The flag only changes once the backend accepted it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MuteController {
    muted: bool,
}

impl MuteController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mute<B: AudioBackend>(&mut self, backend: &mut B) -> Result<(), BackendFailure> {
        self.set(backend, true)
    }

    pub fn unmute<B: AudioBackend>(&mut self, backend: &mut B) -> Result<(), BackendFailure> {
        self.set(backend, false)
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    fn set<B: AudioBackend>(&mut self, backend: &mut B, muted: bool) -> Result<(), BackendFailure> {
        backend.set_master_mute(muted).during("set_master_mute")?;
        self.muted = muted;
        tracing::info!(muted, "master mute");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audio_backend::MockAudioBackend;

    #[test]
    fn toggles_backend_and_flag() {
        let mut b = MockAudioBackend::new();
        let mut m = MuteController::new();
        assert!(!m.is_muted());
        m.mute(&mut b).unwrap();
        assert!(m.is_muted());
        assert!(b.is_master_muted());
        m.unmute(&mut b).unwrap();
        assert!(!m.is_muted());
        assert!(!b.is_master_muted());
    }
}
