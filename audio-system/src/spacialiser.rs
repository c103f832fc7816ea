use audio_backend::{AudioBackend, ChannelHandle};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{BackendFailure, BackendResultExt};

/// Listener index used for the single-listener setup.
const PRIMARY_LISTENER: usize = 0;

/// Listener orientation in a right-handed frame.
///
/// `forward` and `up` are expected to be orthogonal; they are passed to the
/// backend as given.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ListenerPose {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
}

impl Default for ListenerPose {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, -1.0),
            forward: Vec3::Z,
            up: Vec3::Y,
        }
    }
}

/// Converts caller-space coordinates to backend units and pushes listener and
/// source attributes.
///
/// The distance factor is backend units per caller unit (feet would be 3.28
/// when the backend works in meters) and applies to positions and to the
/// min/max audible distance of 3D sounds. Velocities are always zero: Doppler
/// is not modelled.
#[derive(Debug, Clone, PartialEq)]
pub struct Spatialiser {
    distance_factor: f32,
    min_distance: f32,
    max_distance: f32,
    // stored in backend units
    listener: ListenerPose,
}

impl Spatialiser {
    pub fn new(distance_factor: f32, min_distance: f32, max_distance: f32) -> Self {
        let mut listener = ListenerPose::default();
        listener.position *= distance_factor;
        Self { distance_factor, min_distance, max_distance, listener }
    }

    pub fn distance_factor(&self) -> f32 {
        self.distance_factor
    }

    pub fn to_engine_space(&self, position: Vec3) -> Vec3 {
        position * self.distance_factor
    }

    /// Min/max audible distance for 3D sounds, in backend units.
    pub fn min_max_distance(&self) -> (f32, f32) {
        (self.min_distance * self.distance_factor, self.max_distance * self.distance_factor)
    }

    /// Position and velocity pushed to a channel for a source at `position`.
    pub fn source_attributes(&self, position: Vec3) -> (Vec3, Vec3) {
        (self.to_engine_space(position), Vec3::ZERO)
    }

    /// Last listener pose pushed to the backend, in backend units.
    pub fn listener_pose(&self) -> ListenerPose {
        self.listener
    }

    pub fn set_listener_pose<B: AudioBackend>(
        &mut self,
        backend: &mut B,
        pose: ListenerPose,
    ) -> Result<(), BackendFailure> {
        let scaled = ListenerPose {
            position: self.to_engine_space(pose.position),
            ..pose
        };
        backend
            .set_listener_attributes(PRIMARY_LISTENER, scaled.position, Vec3::ZERO, scaled.forward, scaled.up)
            .during("set_listener_attributes")?;
        self.listener = scaled;
        tracing::trace!(position = ?scaled.position, forward = ?scaled.forward, "listener pose updated");
        Ok(())
    }

    pub fn push_source<B: AudioBackend>(
        &self,
        backend: &mut B,
        channel: ChannelHandle,
        position: Vec3,
    ) -> Result<(), BackendFailure> {
        let (pos, vel) = self.source_attributes(position);
        backend
            .set_channel_3d_attributes(channel, pos, vel)
            .during("set_channel_3d_attributes")
    }
}

impl Default for Spatialiser {
    fn default() -> Self {
        Self::new(1.0, 0.5, 5000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audio_backend::{BackendConfig, MockAudioBackend};

    fn backend() -> MockAudioBackend {
        let mut b = MockAudioBackend::new();
        b.initialize(&BackendConfig::default()).unwrap();
        b
    }

    #[test]
    fn listener_pose_round_trips_scaled_by_distance_factor() {
        let mut b = backend();
        let mut sp = Spatialiser::new(3.28, 0.5, 5000.0);
        let pose = ListenerPose {
            position: Vec3::new(1.0, 2.0, 3.0),
            forward: Vec3::new(0.0, 0.0, -1.0),
            up: Vec3::Y,
        };
        sp.set_listener_pose(&mut b, pose).unwrap();

        let stored = sp.listener_pose();
        assert_eq!(stored.position, Vec3::new(1.0, 2.0, 3.0) * 3.28);
        assert_eq!(stored.forward, pose.forward);
        assert_eq!(stored.up, pose.up);
        assert_eq!(b.listener(), Some((stored.position, stored.forward, stored.up)));
    }

    #[test]
    fn failed_listener_push_keeps_previous_pose() {
        // not initialized: the mock refuses listener updates
        let mut b = MockAudioBackend::new();
        let mut sp = Spatialiser::default();
        let before = sp.listener_pose();
        let pose = ListenerPose { position: Vec3::splat(9.0), ..ListenerPose::default() };
        assert!(sp.set_listener_pose(&mut b, pose).is_err());
        assert_eq!(sp.listener_pose(), before);
    }

    #[test]
    fn all_three_axes_of_a_source_are_scaled_and_velocity_is_zero() {
        let sp = Spatialiser::new(100.0, 0.5, 5000.0);
        let (pos, vel) = sp.source_attributes(Vec3::new(1.0, -2.0, 0.5));
        assert_eq!(pos, Vec3::new(100.0, -200.0, 50.0));
        assert_eq!(vel, Vec3::ZERO);
    }

    #[test]
    fn distance_bounds_follow_the_factor() {
        let sp = Spatialiser::new(2.0, 0.5, 5000.0);
        assert_eq!(sp.min_max_distance(), (1.0, 10000.0));
    }

    #[test]
    fn default_listener_sits_one_unit_behind_origin() {
        let sp = Spatialiser::new(2.0, 0.5, 5000.0);
        assert_eq!(sp.listener_pose().position, Vec3::new(0.0, 0.0, -2.0));
    }
}
