//! Bank-driven events, addressed by name and instance index.
//!
//! Each `load_event` call appends a fresh instance to the event's list and
//! returns its index; index 0 is the instance used when none is given.

use std::collections::HashMap;

use audio_backend::{
    AudioBackend, BankHandle, EventDescriptionHandle, EventDescriptionInfo, EventInstanceHandle,
    EventPlaybackState, StopMode,
};

use crate::error::{BackendFailure, BackendResultExt, LoadError, LookupError};

/// Instance index used when a caller does not name one.
pub const DEFAULT_INSTANCE: usize = 0;

/// Volume applied by callers that have no mix level of their own for an event.
pub const DEFAULT_EVENT_VOLUME: f32 = 0.75;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBinding {
    pub description: EventDescriptionHandle,
    pub instances: Vec<EventInstanceHandle>,
}

#[derive(Debug, Default)]
pub struct EventRegistry {
    banks: HashMap<String, BankHandle>,
    bindings: HashMap<String, EventBinding>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a bank file. Loading the same path again returns the existing bank.
    pub fn load_bank<B: AudioBackend>(&mut self, backend: &mut B, path: &str) -> Result<BankHandle, LoadError> {
        if let Some(bank) = self.banks.get(path) {
            tracing::info!(path, %bank, "bank was already loaded");
            return Ok(*bank);
        }
        let bank = backend.load_bank(path).during("load_bank")?;
        self.banks.insert(path.to_string(), bank);
        tracing::info!(path, %bank, "loaded bank");
        Ok(bank)
    }

    /// Resolve `name`, create a new instance and apply `params` to it.
    ///
    /// Returns the new instance's index. If a parameter cannot be applied the
    /// instance is released and nothing is recorded.
    pub fn load_event<B: AudioBackend>(
        &mut self,
        backend: &mut B,
        name: &str,
        params: &[(&str, f32)],
    ) -> Result<usize, LoadError> {
        let description = match self.bindings.get(name) {
            Some(binding) => binding.description,
            None => backend.event_description(name).during("event_description")?,
        };
        let instance = backend
            .create_event_instance(description)
            .during("create_event_instance")?;

        for (param, value) in params {
            if let Err(err) = backend
                .set_event_parameter(instance, param, *value)
                .during("set_event_parameter")
            {
                if let Err(release) = backend.release_event_instance(instance) {
                    tracing::warn!(event = name, %instance, error = %release, "could not release instance");
                }
                return Err(err.into());
            }
            tracing::debug!(event = name, param, value, "event parameter set");
        }

        // a missing summary is logged by `during` and does not fail the load
        if let Ok(info) = backend
            .event_description_info(description)
            .during("event_description_info")
        {
            tracing::debug!(
                event = name,
                parameters = info.parameter_count,
                is_3d = info.is_3d,
                oneshot = info.is_oneshot,
                valid = info.is_valid,
                "event description"
            );
        }

        let binding = self
            .bindings
            .entry(name.to_string())
            .or_insert_with(|| EventBinding { description, instances: Vec::new() });
        binding.instances.push(instance);
        let index = binding.instances.len() - 1;
        tracing::info!(event = name, index, %instance, "loaded event");
        Ok(index)
    }

    /// Handle of instance `index` of `name`.
    pub fn instance(&self, name: &str, index: usize) -> Result<EventInstanceHandle, LookupError> {
        let Some(binding) = self.bindings.get(name) else {
            tracing::warn!(event = name, "event is not loaded");
            return Err(LookupError::UnknownEvent(name.to_string()));
        };
        binding.instances.get(index).copied().ok_or_else(|| {
            tracing::warn!(event = name, index, "event has no such instance");
            LookupError::UnknownInstance { name: name.to_string(), index }
        })
    }

    pub fn set_param<B: AudioBackend>(
        &mut self,
        backend: &mut B,
        name: &str,
        index: usize,
        param: &str,
        value: f32,
    ) -> Result<(), LookupError> {
        let instance = self.instance(name, index)?;
        backend
            .set_event_parameter(instance, param, value)
            .during("set_event_parameter")?;
        Ok(())
    }

    pub fn set_volume<B: AudioBackend>(
        &mut self,
        backend: &mut B,
        name: &str,
        index: usize,
        volume: f32,
    ) -> Result<(), LookupError> {
        let instance = self.instance(name, index)?;
        backend
            .set_event_volume(instance, volume.clamp(0.0, 1.0))
            .during("set_event_volume")?;
        Ok(())
    }

    pub fn play<B: AudioBackend>(&mut self, backend: &mut B, name: &str, index: usize) -> Result<(), LookupError> {
        let instance = self.instance(name, index)?;
        backend.start_event(instance).during("start_event")?;
        tracing::info!(event = name, index, "playing event");
        Ok(())
    }

    /// Stop with fade-out; the backend finishes the tail over later updates.
    pub fn stop<B: AudioBackend>(&mut self, backend: &mut B, name: &str, index: usize) -> Result<(), LookupError> {
        let instance = self.instance(name, index)?;
        backend
            .stop_event(instance, StopMode::AllowFadeOut)
            .during("stop_event")?;
        tracing::info!(event = name, index, "stopping event");
        Ok(())
    }

    pub fn playback_state<B: AudioBackend>(
        &self,
        backend: &B,
        name: &str,
        index: usize,
    ) -> Result<EventPlaybackState, LookupError> {
        let instance = self.instance(name, index)?;
        Ok(backend
            .event_playback_state(instance)
            .during("event_playback_state")?)
    }

    /// True while the instance is anywhere between starting and fully stopped.
    pub fn is_playing<B: AudioBackend>(&self, backend: &B, name: &str, index: usize) -> bool {
        self.playback_state(backend, name, index)
            .map(EventPlaybackState::is_active)
            .unwrap_or(false)
    }

    pub fn info<B: AudioBackend>(&self, backend: &B, name: &str) -> Result<EventDescriptionInfo, LookupError> {
        let Some(binding) = self.bindings.get(name) else {
            tracing::warn!(event = name, "event is not loaded");
            return Err(LookupError::UnknownEvent(name.to_string()));
        };
        Ok(backend
            .event_description_info(binding.description)
            .during("event_description_info")?)
    }

    pub fn instance_count(&self, name: &str) -> usize {
        self.bindings.get(name).map_or(0, |b| b.instances.len())
    }

    pub fn event_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn bank_count(&self) -> usize {
        self.banks.len()
    }

    /// Release every instance and unload every bank. Reports the first failure.
    pub fn release_all<B: AudioBackend>(&mut self, backend: &mut B) -> Result<(), BackendFailure> {
        let mut first_err = None;
        for (name, binding) in self.bindings.drain() {
            for instance in binding.instances {
                if let Err(err) = backend
                    .release_event_instance(instance)
                    .during("release_event_instance")
                {
                    tracing::warn!(event = %name, %instance, error = %err, "release failed");
                    first_err.get_or_insert(err);
                }
            }
        }
        for (path, bank) in self.banks.drain() {
            if let Err(err) = backend.unload_bank(bank).during("unload_bank") {
                tracing::warn!(path = %path, error = %err, "unload failed");
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}
