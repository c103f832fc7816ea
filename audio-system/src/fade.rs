//! Volume ramps expressed as fade points on the backend's sample clock.
//!
//! A fade is a two-point envelope: `(t0, start)` and `(t0 + length, end)`,
//! where `t0` is read from the channel's DSP clock at the moment the fade is
//! issued. The backend interpolates between the two points as it mixes; the
//! ramp only becomes audible as `update()` pumps the backend.

use audio_backend::{AudioBackend, ChannelHandle};

use crate::error::{BackendFailure, BackendResultExt};

/// The audio sampling rate of the audio engine.
pub const AUDIO_SAMPLE_RATE: u32 = 44_100;

/// Fades this short or shorter are applied as an immediate step.
pub const DEFAULT_FADE_FLOOR_SAMPLES: u64 = 64;

/// Convert a duration in milliseconds to a sample count at `sample_rate`.
pub fn ms_to_samples(ms: u32, sample_rate: u32) -> u64 {
    u64::from(ms) * u64::from(sample_rate) / 1_000
}

/// A ramp handed to the backend. Not retained once issued.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeJob {
    pub channel: ChannelHandle,
    pub start_clock: u64,
    pub start_volume: f32,
    pub end_clock: u64,
    pub end_volume: f32,
}

impl FadeJob {
    pub fn length(&self) -> u64 {
        self.end_clock - self.start_clock
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FadeOutcome {
    /// Volume was set directly; no envelope was issued.
    Immediate { volume: f32 },
    Envelope(FadeJob),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeScheduler {
    floor_samples: u64,
}

impl FadeScheduler {
    pub fn new(floor_samples: u64) -> Self {
        Self { floor_samples }
    }

    /// Envelope for a ramp starting at `t0`.
    ///
    /// Ramping up targets full loudness: the caller snaps the channel volume to
    /// `new_volume` first and the envelope lifts perceived level from the prior
    /// volume. Ramping down targets `new_volume` directly.
    pub fn plan(
        &self,
        channel: ChannelHandle,
        t0: u64,
        current_volume: f32,
        new_volume: f32,
        fade_samples: u64,
    ) -> FadeJob {
        let end_volume = if new_volume > current_volume { 1.0 } else { new_volume };
        FadeJob {
            channel,
            start_clock: t0,
            start_volume: current_volume,
            end_clock: t0.saturating_add(fade_samples),
            end_volume,
        }
    }

    pub fn ramp<B: AudioBackend>(
        &self,
        backend: &mut B,
        channel: ChannelHandle,
        current_volume: f32,
        new_volume: f32,
        fade_samples: u64,
    ) -> Result<FadeOutcome, BackendFailure> {
        let new_volume = new_volume.clamp(0.0, 1.0);
        if fade_samples <= self.floor_samples {
            backend
                .set_channel_volume(channel, new_volume)
                .during("set_channel_volume")?;
            return Ok(FadeOutcome::Immediate { volume: new_volume });
        }

        let t0 = backend.channel_dsp_clock(channel).during("channel_dsp_clock")?;
        let job = self.plan(channel, t0, current_volume, new_volume, fade_samples);
        if new_volume > current_volume {
            backend
                .set_channel_volume(channel, new_volume)
                .during("set_channel_volume")?;
        }
        backend
            .add_fade_point(channel, job.start_clock, job.start_volume)
            .during("add_fade_point")?;
        backend
            .add_fade_point(channel, job.end_clock, job.end_volume)
            .during("add_fade_point")?;
        tracing::debug!(%channel, from = current_volume, to = new_volume, samples = fade_samples, "fade scheduled");
        Ok(FadeOutcome::Envelope(job))
    }
}

impl Default for FadeScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_FADE_FLOOR_SAMPLES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audio_backend::{BackendCall, BackendConfig, MockAudioBackend, SoundMode};

    fn playing_channel() -> (MockAudioBackend, ChannelHandle) {
        let mut b = MockAudioBackend::new();
        b.initialize(&BackendConfig::default()).unwrap();
        let s = b.create_sound("loop.ogg", SoundMode { looping: true, positional: false }).unwrap();
        let ch = b.play_sound(s, false).unwrap();
        for _ in 0..3 {
            b.update().unwrap();
        }
        b.clear_calls();
        (b, ch)
    }

    fn fade_points(b: &MockAudioBackend) -> Vec<(u64, f32)> {
        b.calls()
            .iter()
            .filter_map(|c| match c {
                BackendCall::AddFadePoint { clock, volume, .. } => Some((*clock, *volume)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn short_fades_step_the_volume() {
        let (mut b, ch) = playing_channel();
        let out = FadeScheduler::default().ramp(&mut b, ch, 1.0, 0.3, 64).unwrap();
        assert_eq!(out, FadeOutcome::Immediate { volume: 0.3 });
        assert!(fade_points(&b).is_empty());
        assert_eq!(b.channel(ch).unwrap().volume, 0.3);
    }

    #[test]
    fn fade_down_spans_clock_window_and_ends_at_target() {
        let (mut b, ch) = playing_channel();
        let t0 = b.clock();
        let out = FadeScheduler::default().ramp(&mut b, ch, 0.8, 0.0, 128).unwrap();
        assert_eq!(fade_points(&b), vec![(t0, 0.8), (t0 + 128, 0.0)]);
        match out {
            FadeOutcome::Envelope(job) => assert_eq!(job.length(), 128),
            other => panic!("expected envelope, got {other:?}"),
        }
        // logical volume untouched on the way down
        assert!(!b.calls().iter().any(|c| matches!(c, BackendCall::SetChannelVolume { .. })));
    }

    #[test]
    fn fade_up_snaps_volume_then_envelopes_to_full() {
        let (mut b, ch) = playing_channel();
        let t0 = b.clock();
        FadeScheduler::default().ramp(&mut b, ch, 0.2, 0.9, 4410).unwrap();
        assert_eq!(b.calls()[0], BackendCall::SetChannelVolume { channel: ch, volume: 0.9 });
        assert_eq!(fade_points(&b), vec![(t0, 0.2), (t0 + 4410, 1.0)]);
    }

    #[test]
    fn requested_volume_is_clamped() {
        let (mut b, ch) = playing_channel();
        let out = FadeScheduler::default().ramp(&mut b, ch, 0.5, 3.0, 0).unwrap();
        assert_eq!(out, FadeOutcome::Immediate { volume: 1.0 });
    }

    #[test]
    fn expired_channel_reports_backend_failure() {
        let (mut b, ch) = playing_channel();
        b.finish_channel(ch);
        let err = FadeScheduler::default().ramp(&mut b, ch, 1.0, 0.0, 1000).unwrap_err();
        assert!(err.is_invalid_handle());
        assert_eq!(err.op, "channel_dsp_clock");
    }

    #[test]
    fn ms_conversion_uses_sample_rate() {
        assert_eq!(ms_to_samples(1000, AUDIO_SAMPLE_RATE), 44_100);
        assert_eq!(ms_to_samples(10, 48_000), 480);
    }
}
