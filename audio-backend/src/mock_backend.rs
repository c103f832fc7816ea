use std::collections::{HashMap, HashSet};

use glam::Vec3;

use crate::{
    AudioBackend, BackendConfig, BackendError, BankHandle, ChannelHandle, EventDescriptionHandle,
    EventDescriptionInfo, EventInstanceHandle, EventPlaybackState, ReverbHandle, ReverbPreset,
    SoundHandle, SoundMode, StopMode,
};

/// Length reported for sounds without an explicit `with_sound_length`.
const DEFAULT_SOUND_LENGTH_MS: u32 = 1_000;

/// Frames the mock mix advances per `update()`.
const DEFAULT_BLOCK_FRAMES: u64 = 1_024;

/// One recorded call into the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Initialize(BackendConfig),
    Shutdown,
    Update,
    SetMasterMute(bool),
    CreateSound { path: String, mode: SoundMode, sound: SoundHandle },
    SetSoundMinMaxDistance { sound: SoundHandle, min: f32, max: f32 },
    ReleaseSound(SoundHandle),
    PlaySound { sound: SoundHandle, paused: bool, channel: ChannelHandle },
    SetChannelPaused { channel: ChannelHandle, paused: bool },
    SetChannelVolume { channel: ChannelHandle, volume: f32 },
    SetChannel3dAttributes { channel: ChannelHandle, position: Vec3, velocity: Vec3 },
    SetChannelReverbWet { channel: ChannelHandle, wet: f32 },
    AddFadePoint { channel: ChannelHandle, clock: u64, volume: f32 },
    StopChannel(ChannelHandle),
    SetListenerAttributes { listener: usize, position: Vec3, velocity: Vec3, forward: Vec3, up: Vec3 },
    CreateReverbZone { position: Vec3, min_distance: f32, max_distance: f32, preset: ReverbPreset },
    ReleaseReverbZone(ReverbHandle),
    LoadBank { path: String, bank: BankHandle },
    UnloadBank(BankHandle),
    CreateEventInstance { description: EventDescriptionHandle, instance: EventInstanceHandle },
    ReleaseEventInstance(EventInstanceHandle),
    SetEventParameter { instance: EventInstanceHandle, name: String, value: f32 },
    SetEventVolume { instance: EventInstanceHandle, volume: f32 },
    StartEvent(EventInstanceHandle),
    StopEvent { instance: EventInstanceHandle, mode: StopMode },
}

struct MockSound {
    length_ms: u32,
    mode: SoundMode,
    min_max_distance: Option<(f32, f32)>,
}

/// Observable state of a simulated channel.
#[derive(Debug, Clone, PartialEq)]
pub struct MockChannel {
    pub sound: SoundHandle,
    pub paused: bool,
    pub volume: f32,
    pub position: Vec3,
    pub velocity: Vec3,
    pub reverb_wet: f32,
    pub fade_points: Vec<(u64, f32)>,
    pub looping: bool,
    /// Frames this channel has been audible for.
    pub frames_played: u64,
    pub length_frames: u64,
}

/// Observable state of a simulated event instance.
#[derive(Debug, Clone, PartialEq)]
pub struct MockEventInstance {
    pub description: EventDescriptionHandle,
    pub state: EventPlaybackState,
    pub volume: f32,
    pub parameters: HashMap<String, f32>,
}

struct MockBank {
    path: String,
}

/// A journaling, deterministic stand-in for the native engine.
///
/// Every call is recorded as a [`BackendCall`], the DSP clock advances by a
/// fixed block on each `update()`, one-shot channels end once their length has
/// elapsed, and events stopped with fade-out settle to `Stopped` one update later.
pub struct MockAudioBackend {
    config: Option<BackendConfig>,
    next_handle: u64,
    calls: Vec<BackendCall>,
    clock: u64,
    block_frames: u64,
    master_muted: bool,
    listener: Option<(Vec3, Vec3, Vec3)>,
    sounds: HashMap<SoundHandle, MockSound>,
    channels: HashMap<ChannelHandle, MockChannel>,
    reverbs: HashSet<ReverbHandle>,
    // bank path -> event names it provides
    catalog: HashMap<String, Vec<String>>,
    banks: HashMap<BankHandle, MockBank>,
    event_ids: HashMap<String, EventDescriptionHandle>,
    descriptions: HashMap<EventDescriptionHandle, String>,
    instances: HashMap<EventInstanceHandle, MockEventInstance>,
    event_info: HashMap<String, EventDescriptionInfo>,
    sound_lengths: HashMap<String, u32>,
    failing_paths: HashSet<String>,
    failing_ops: HashSet<&'static str>,
}

impl MockAudioBackend {
    pub fn new() -> Self {
        Self {
            config: None,
            next_handle: 1,
            calls: Vec::new(),
            clock: 0,
            block_frames: DEFAULT_BLOCK_FRAMES,
            master_muted: false,
            listener: None,
            sounds: HashMap::new(),
            channels: HashMap::new(),
            reverbs: HashSet::new(),
            catalog: HashMap::new(),
            banks: HashMap::new(),
            event_ids: HashMap::new(),
            descriptions: HashMap::new(),
            instances: HashMap::new(),
            event_info: HashMap::new(),
            sound_lengths: HashMap::new(),
            failing_paths: HashSet::new(),
            failing_ops: HashSet::new(),
        }
    }

    /// Declare a bank file and the event names it provides once loaded.
    pub fn with_bank(mut self, path: &str, events: &[&str]) -> Self {
        for name in events {
            if !self.event_ids.contains_key(*name) {
                let description = EventDescriptionHandle(1_000_000 + self.event_ids.len() as u64);
                self.event_ids.insert(name.to_string(), description);
                self.descriptions.insert(description, name.to_string());
            }
        }
        self.catalog
            .insert(path.to_string(), events.iter().map(|e| e.to_string()).collect());
        self
    }

    /// Override the description summary reported for an event.
    pub fn with_event_info(mut self, name: &str, info: EventDescriptionInfo) -> Self {
        self.event_info.insert(name.to_string(), info);
        self
    }

    pub fn with_sound_length(mut self, path: &str, length_ms: u32) -> Self {
        self.sound_lengths.insert(path.to_string(), length_ms);
        self
    }

    /// Make `create_sound` and `load_bank` fail for `path`.
    pub fn fail_on_path(mut self, path: &str) -> Self {
        self.failing_paths.insert(path.to_string());
        self
    }

    /// Make the named call (e.g. `"set_channel_volume"`) fail from now on.
    /// Covers the channel setters, `stop_channel` and `event_description_info`.
    pub fn fail_op(&mut self, op: &'static str) {
        self.failing_ops.insert(op);
    }

    pub fn with_block_frames(mut self, frames: u64) -> Self {
        self.block_frames = frames;
        self
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn config(&self) -> Option<&BackendConfig> {
        self.config.as_ref()
    }

    pub fn is_master_muted(&self) -> bool {
        self.master_muted
    }

    /// Last listener attributes as (position, forward, up).
    pub fn listener(&self) -> Option<(Vec3, Vec3, Vec3)> {
        self.listener
    }

    pub fn live_sound_count(&self) -> usize {
        self.sounds.len()
    }

    pub fn live_channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn live_instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn loaded_bank_count(&self) -> usize {
        self.banks.len()
    }

    pub fn reverb_zone_count(&self) -> usize {
        self.reverbs.len()
    }

    pub fn channel(&self, channel: ChannelHandle) -> Option<&MockChannel> {
        self.channels.get(&channel)
    }

    pub fn instance(&self, instance: EventInstanceHandle) -> Option<&MockEventInstance> {
        self.instances.get(&instance)
    }

    pub fn sound_min_max_distance(&self, sound: SoundHandle) -> Option<(f32, f32)> {
        self.sounds.get(&sound).and_then(|s| s.min_max_distance)
    }

    /// Reclaim a channel as if it ended on its own or was stolen.
    pub fn finish_channel(&mut self, channel: ChannelHandle) {
        self.channels.remove(&channel);
    }

    /// Force an event instance to the stopped state.
    pub fn finish_event(&mut self, instance: EventInstanceHandle) {
        if let Some(inst) = self.instances.get_mut(&instance) {
            inst.state = EventPlaybackState::Stopped;
        }
    }

    fn record(&mut self, call: BackendCall) {
        tracing::trace!(?call, "mock backend call");
        self.calls.push(call);
    }

    fn alloc(&mut self) -> u64 {
        let id = self.next_handle;
        self.next_handle += 1;
        id
    }

    fn ensure_initialized(&self) -> Result<(), BackendError> {
        if self.config.is_some() {
            Ok(())
        } else {
            Err(BackendError::NotInitialized)
        }
    }

    fn sample_rate(&self) -> u32 {
        self.config.as_ref().map(|c| c.sample_rate).unwrap_or(44_100)
    }

    fn check_op(&self, op: &str) -> Result<(), BackendError> {
        if self.failing_ops.contains(op) {
            return Err(BackendError::Native { code: -1, message: format!("{op} rejected") });
        }
        Ok(())
    }

    fn channel_mut(&mut self, channel: ChannelHandle) -> Result<&mut MockChannel, BackendError> {
        self.channels
            .get_mut(&channel)
            .ok_or_else(|| BackendError::InvalidHandle(channel.to_string()))
    }

    fn instance_mut(&mut self, instance: EventInstanceHandle) -> Result<&mut MockEventInstance, BackendError> {
        self.instances
            .get_mut(&instance)
            .ok_or_else(|| BackendError::InvalidHandle(instance.to_string()))
    }

    fn event_is_loaded(&self, name: &str) -> bool {
        self.banks.values().any(|bank| {
            self.catalog
                .get(&bank.path)
                .is_some_and(|events| events.iter().any(|e| e == name))
        })
    }
}

impl Default for MockAudioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for MockAudioBackend {
    fn initialize(&mut self, config: &BackendConfig) -> Result<(), BackendError> {
        self.record(BackendCall::Initialize(config.clone()));
        self.config = Some(config.clone());
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), BackendError> {
        self.record(BackendCall::Shutdown);
        self.channels.clear();
        self.instances.clear();
        self.sounds.clear();
        self.banks.clear();
        self.reverbs.clear();
        self.listener = None;
        self.master_muted = false;
        self.config = None;
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.config.is_some()
    }

    fn update(&mut self) -> Result<(), BackendError> {
        self.ensure_initialized()?;
        self.record(BackendCall::Update);
        let block = self.block_frames;
        self.clock += block;

        for ch in self.channels.values_mut().filter(|c| !c.paused) {
            ch.frames_played += block;
        }
        self.channels
            .retain(|_, ch| ch.looping || ch.frames_played < ch.length_frames);

        for inst in self.instances.values_mut() {
            inst.state = match inst.state {
                EventPlaybackState::Starting => EventPlaybackState::Playing,
                EventPlaybackState::Stopping => EventPlaybackState::Stopped,
                other => other,
            };
        }
        Ok(())
    }

    fn set_master_mute(&mut self, muted: bool) -> Result<(), BackendError> {
        self.record(BackendCall::SetMasterMute(muted));
        self.master_muted = muted;
        Ok(())
    }

    fn create_sound(&mut self, path: &str, mode: SoundMode) -> Result<SoundHandle, BackendError> {
        self.ensure_initialized()?;
        if self.failing_paths.contains(path) {
            return Err(BackendError::FileNotFound(path.to_string()));
        }
        let sound = SoundHandle(self.alloc());
        let length_ms = self
            .sound_lengths
            .get(path)
            .copied()
            .unwrap_or(DEFAULT_SOUND_LENGTH_MS);
        self.sounds.insert(sound, MockSound { length_ms, mode, min_max_distance: None });
        self.record(BackendCall::CreateSound { path: path.to_string(), mode, sound });
        Ok(sound)
    }

    fn set_sound_min_max_distance(&mut self, sound: SoundHandle, min: f32, max: f32) -> Result<(), BackendError> {
        let entry = self
            .sounds
            .get_mut(&sound)
            .ok_or_else(|| BackendError::InvalidHandle(sound.to_string()))?;
        entry.min_max_distance = Some((min, max));
        self.record(BackendCall::SetSoundMinMaxDistance { sound, min, max });
        Ok(())
    }

    fn sound_length_ms(&self, sound: SoundHandle) -> Result<u32, BackendError> {
        self.sounds
            .get(&sound)
            .map(|s| s.length_ms)
            .ok_or_else(|| BackendError::InvalidHandle(sound.to_string()))
    }

    fn release_sound(&mut self, sound: SoundHandle) -> Result<(), BackendError> {
        self.sounds
            .remove(&sound)
            .ok_or_else(|| BackendError::InvalidHandle(sound.to_string()))?;
        self.channels.retain(|_, ch| ch.sound != sound);
        self.record(BackendCall::ReleaseSound(sound));
        Ok(())
    }

    fn play_sound(&mut self, sound: SoundHandle, paused: bool) -> Result<ChannelHandle, BackendError> {
        self.ensure_initialized()?;
        let sample_rate = u64::from(self.sample_rate());
        let (length_ms, mode) = self
            .sounds
            .get(&sound)
            .map(|s| (s.length_ms, s.mode))
            .ok_or_else(|| BackendError::InvalidHandle(sound.to_string()))?;
        let channel = ChannelHandle(self.alloc());
        self.channels.insert(
            channel,
            MockChannel {
                sound,
                paused,
                volume: 1.0,
                position: Vec3::ZERO,
                velocity: Vec3::ZERO,
                reverb_wet: 0.0,
                fade_points: Vec::new(),
                looping: mode.looping,
                frames_played: 0,
                length_frames: u64::from(length_ms) * sample_rate / 1_000,
            },
        );
        self.record(BackendCall::PlaySound { sound, paused, channel });
        Ok(channel)
    }

    fn set_channel_paused(&mut self, channel: ChannelHandle, paused: bool) -> Result<(), BackendError> {
        self.check_op("set_channel_paused")?;
        self.channel_mut(channel)?.paused = paused;
        self.record(BackendCall::SetChannelPaused { channel, paused });
        Ok(())
    }

    fn set_channel_volume(&mut self, channel: ChannelHandle, volume: f32) -> Result<(), BackendError> {
        self.check_op("set_channel_volume")?;
        self.channel_mut(channel)?.volume = volume;
        self.record(BackendCall::SetChannelVolume { channel, volume });
        Ok(())
    }

    fn set_channel_3d_attributes(&mut self, channel: ChannelHandle, position: Vec3, velocity: Vec3) -> Result<(), BackendError> {
        self.check_op("set_channel_3d_attributes")?;
        let ch = self.channel_mut(channel)?;
        ch.position = position;
        ch.velocity = velocity;
        self.record(BackendCall::SetChannel3dAttributes { channel, position, velocity });
        Ok(())
    }

    fn set_channel_reverb_wet(&mut self, channel: ChannelHandle, wet: f32) -> Result<(), BackendError> {
        self.check_op("set_channel_reverb_wet")?;
        self.channel_mut(channel)?.reverb_wet = wet;
        self.record(BackendCall::SetChannelReverbWet { channel, wet });
        Ok(())
    }

    fn channel_dsp_clock(&self, channel: ChannelHandle) -> Result<u64, BackendError> {
        if self.channels.contains_key(&channel) {
            Ok(self.clock)
        } else {
            Err(BackendError::InvalidHandle(channel.to_string()))
        }
    }

    fn add_fade_point(&mut self, channel: ChannelHandle, clock: u64, volume: f32) -> Result<(), BackendError> {
        self.check_op("add_fade_point")?;
        self.channel_mut(channel)?.fade_points.push((clock, volume));
        self.record(BackendCall::AddFadePoint { channel, clock, volume });
        Ok(())
    }

    fn stop_channel(&mut self, channel: ChannelHandle) -> Result<(), BackendError> {
        self.check_op("stop_channel")?;
        self.channels
            .remove(&channel)
            .ok_or_else(|| BackendError::InvalidHandle(channel.to_string()))?;
        self.record(BackendCall::StopChannel(channel));
        Ok(())
    }

    fn is_channel_playing(&self, channel: ChannelHandle) -> Result<bool, BackendError> {
        self.channels
            .get(&channel)
            .map(|_| true)
            .ok_or_else(|| BackendError::InvalidHandle(channel.to_string()))
    }

    fn set_listener_attributes(
        &mut self,
        listener: usize,
        position: Vec3,
        velocity: Vec3,
        forward: Vec3,
        up: Vec3,
    ) -> Result<(), BackendError> {
        self.ensure_initialized()?;
        self.listener = Some((position, forward, up));
        self.record(BackendCall::SetListenerAttributes { listener, position, velocity, forward, up });
        Ok(())
    }

    fn create_reverb_zone(
        &mut self,
        position: Vec3,
        min_distance: f32,
        max_distance: f32,
        preset: ReverbPreset,
    ) -> Result<ReverbHandle, BackendError> {
        self.ensure_initialized()?;
        let reverb = ReverbHandle(self.alloc());
        self.reverbs.insert(reverb);
        self.record(BackendCall::CreateReverbZone { position, min_distance, max_distance, preset });
        Ok(reverb)
    }

    fn release_reverb_zone(&mut self, reverb: ReverbHandle) -> Result<(), BackendError> {
        if !self.reverbs.remove(&reverb) {
            return Err(BackendError::InvalidHandle(reverb.to_string()));
        }
        self.record(BackendCall::ReleaseReverbZone(reverb));
        Ok(())
    }

    fn load_bank(&mut self, path: &str) -> Result<BankHandle, BackendError> {
        self.ensure_initialized()?;
        if self.failing_paths.contains(path) || !self.catalog.contains_key(path) {
            return Err(BackendError::FileNotFound(path.to_string()));
        }
        let bank = BankHandle(self.alloc());
        self.banks.insert(bank, MockBank { path: path.to_string() });
        self.record(BackendCall::LoadBank { path: path.to_string(), bank });
        Ok(bank)
    }

    fn unload_bank(&mut self, bank: BankHandle) -> Result<(), BackendError> {
        self.banks
            .remove(&bank)
            .ok_or_else(|| BackendError::InvalidHandle(bank.to_string()))?;
        self.record(BackendCall::UnloadBank(bank));
        Ok(())
    }

    fn event_description(&self, name: &str) -> Result<EventDescriptionHandle, BackendError> {
        if !self.event_is_loaded(name) {
            return Err(BackendError::EventNotFound(name.to_string()));
        }
        self.event_ids
            .get(name)
            .copied()
            .ok_or_else(|| BackendError::EventNotFound(name.to_string()))
    }

    fn event_description_info(&self, description: EventDescriptionHandle) -> Result<EventDescriptionInfo, BackendError> {
        self.check_op("event_description_info")?;
        let name = self
            .descriptions
            .get(&description)
            .ok_or_else(|| BackendError::InvalidHandle(description.to_string()))?;
        Ok(self.event_info.get(name).copied().unwrap_or(EventDescriptionInfo {
            parameter_count: 0,
            is_3d: false,
            is_oneshot: true,
            is_valid: true,
        }))
    }

    fn create_event_instance(&mut self, description: EventDescriptionHandle) -> Result<EventInstanceHandle, BackendError> {
        let name = self
            .descriptions
            .get(&description)
            .ok_or_else(|| BackendError::InvalidHandle(description.to_string()))?;
        if !self.event_is_loaded(name) {
            return Err(BackendError::InvalidHandle(description.to_string()));
        }
        let instance = EventInstanceHandle(self.alloc());
        self.instances.insert(
            instance,
            MockEventInstance {
                description,
                state: EventPlaybackState::Stopped,
                volume: 1.0,
                parameters: HashMap::new(),
            },
        );
        self.record(BackendCall::CreateEventInstance { description, instance });
        Ok(instance)
    }

    fn release_event_instance(&mut self, instance: EventInstanceHandle) -> Result<(), BackendError> {
        self.instances
            .remove(&instance)
            .ok_or_else(|| BackendError::InvalidHandle(instance.to_string()))?;
        self.record(BackendCall::ReleaseEventInstance(instance));
        Ok(())
    }

    fn set_event_parameter(&mut self, instance: EventInstanceHandle, name: &str, value: f32) -> Result<(), BackendError> {
        self.instance_mut(instance)?
            .parameters
            .insert(name.to_string(), value);
        self.record(BackendCall::SetEventParameter {
            instance,
            name: name.to_string(),
            value,
        });
        Ok(())
    }

    fn set_event_volume(&mut self, instance: EventInstanceHandle, volume: f32) -> Result<(), BackendError> {
        self.instance_mut(instance)?.volume = volume;
        self.record(BackendCall::SetEventVolume { instance, volume });
        Ok(())
    }

    fn start_event(&mut self, instance: EventInstanceHandle) -> Result<(), BackendError> {
        self.instance_mut(instance)?.state = EventPlaybackState::Starting;
        self.record(BackendCall::StartEvent(instance));
        Ok(())
    }

    fn stop_event(&mut self, instance: EventInstanceHandle, mode: StopMode) -> Result<(), BackendError> {
        let inst = self.instance_mut(instance)?;
        if inst.state.is_active() {
            inst.state = match mode {
                StopMode::AllowFadeOut => EventPlaybackState::Stopping,
                StopMode::Immediate => EventPlaybackState::Stopped,
            };
        }
        self.record(BackendCall::StopEvent { instance, mode });
        Ok(())
    }

    fn event_playback_state(&self, instance: EventInstanceHandle) -> Result<EventPlaybackState, BackendError> {
        self.instances
            .get(&instance)
            .map(|i| i.state)
            .ok_or_else(|| BackendError::InvalidHandle(instance.to_string()))
    }
}
