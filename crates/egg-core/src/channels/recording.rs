//! In-memory channel implementations.
//!
//! Each recorder is a cheap clonable handle over shared state: hand one clone
//! to the egg and keep another to inspect what the engine wrote.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use fnv::{FnvHashMap, FnvHashSet};

use super::{
    AudioChannel, Capability, Grabbable, HapticOutput, Outputs, ParticleEmitter, Scope,
    ShaderParam, ShaderParameterSink, Target,
};

/// Scene object with a fixed set of own capabilities and a mutable set of
/// descendant capabilities.
pub struct SceneTarget {
    name: String,
    own: FnvHashSet<Capability>,
    descendants: RefCell<FnvHashSet<Capability>>,
}

impl SceneTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            own: FnvHashSet::default(),
            descendants: RefCell::new(FnvHashSet::default()),
        }
    }

    pub fn with_own(mut self, capability: Capability) -> Self {
        let _ = self.own.insert(capability);
        self
    }

    pub fn with_descendant(self, capability: Capability) -> Self {
        self.add_descendant(capability);
        self
    }

    pub fn add_descendant(&self, capability: Capability) {
        let _ = self.descendants.borrow_mut().insert(capability);
    }

    pub fn remove_descendant(&self, capability: Capability) {
        let _ = self.descendants.borrow_mut().remove(&capability);
    }
}

impl Target for SceneTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn find_capability(&self, capability: Capability, scope: Scope) -> bool {
        let own = self.own.contains(&capability);
        match scope {
            Scope::Target => own,
            Scope::Descendants => own || self.descendants.borrow().contains(&capability),
        }
    }
}

#[derive(Clone, Default)]
pub struct GrabState(Rc<Cell<bool>>);

impl GrabState {
    pub fn set_held(&self, held: bool) {
        self.0.set(held);
    }
}

impl Grabbable for GrabState {
    fn is_held(&self) -> bool {
        self.0.get()
    }
}

#[derive(Debug, Default)]
pub struct HapticLog {
    pub pulses: Vec<f32>,
    pub cancels: usize,
    pub pulsing: bool,
}

#[derive(Clone, Default)]
pub struct RecordingHaptics(Rc<RefCell<HapticLog>>);

impl RecordingHaptics {
    pub fn log(&self) -> std::cell::Ref<'_, HapticLog> {
        self.0.borrow()
    }
}

impl HapticOutput for RecordingHaptics {
    fn pulse(&mut self, intensity: f32, _update_interval_sec: f32, _pulse_interval_sec: f32) {
        let mut log = self.0.borrow_mut();
        log.pulses.push(intensity);
        log.pulsing = true;
    }

    fn cancel(&mut self) {
        let mut log = self.0.borrow_mut();
        log.cancels += 1;
        log.pulsing = false;
    }
}

#[derive(Debug, Default)]
pub struct ShaderLog {
    pub installed: bool,
    pub restores: usize,
    pub params: FnvHashMap<ShaderParam, f32>,
    pub blend_history: Vec<f32>,
}

#[derive(Clone, Default)]
pub struct RecordingShader(Rc<RefCell<ShaderLog>>);

impl RecordingShader {
    pub fn log(&self) -> std::cell::Ref<'_, ShaderLog> {
        self.0.borrow()
    }

    pub fn get(&self, param: ShaderParam) -> Option<f32> {
        self.0.borrow().params.get(&param).copied()
    }
}

impl ShaderParameterSink for RecordingShader {
    fn install_effect(&mut self) {
        self.0.borrow_mut().installed = true;
    }

    fn restore_original(&mut self) {
        let mut log = self.0.borrow_mut();
        log.installed = false;
        log.restores += 1;
    }

    fn set_float(&mut self, param: ShaderParam, value: f32) {
        let mut log = self.0.borrow_mut();
        let _ = log.params.insert(param, value);
        if param == ShaderParam::EffectBlend {
            log.blend_history.push(value);
        }
    }
}

#[derive(Debug, Default)]
pub struct AudioLog {
    pub playing: bool,
    pub volume: f32,
    pub history: Vec<f32>,
}

#[derive(Clone, Default)]
pub struct RecordingAudio(Rc<RefCell<AudioLog>>);

impl RecordingAudio {
    pub fn log(&self) -> std::cell::Ref<'_, AudioLog> {
        self.0.borrow()
    }
}

impl AudioChannel for RecordingAudio {
    fn play(&mut self) {
        self.0.borrow_mut().playing = true;
    }

    fn stop(&mut self) {
        self.0.borrow_mut().playing = false;
    }

    fn set_volume(&mut self, volume: f32) {
        let mut log = self.0.borrow_mut();
        log.volume = volume;
        log.history.push(volume);
    }
}

#[derive(Debug, Default)]
pub struct ParticleLog {
    pub playing: bool,
    pub plays: usize,
    pub speed_multiplier: f32,
}

#[derive(Clone, Default)]
pub struct RecordingParticles(Rc<RefCell<ParticleLog>>);

impl RecordingParticles {
    pub fn log(&self) -> std::cell::Ref<'_, ParticleLog> {
        self.0.borrow()
    }
}

impl ParticleEmitter for RecordingParticles {
    fn play(&mut self) {
        let mut log = self.0.borrow_mut();
        log.playing = true;
        log.plays += 1;
    }

    fn stop(&mut self) {
        self.0.borrow_mut().playing = false;
    }

    fn set_speed_multiplier(&mut self, multiplier: f32) {
        self.0.borrow_mut().speed_multiplier = multiplier;
    }
}

/// One recorder per output, plus a native emitter, wired as [`Outputs`].
#[derive(Clone, Default)]
pub struct RecordingRig {
    pub haptics: RecordingHaptics,
    pub shader: RecordingShader,
    pub hum: RecordingAudio,
    pub rush: RecordingAudio,
    pub confetti: RecordingParticles,
    pub native: RecordingParticles,
}

impl RecordingRig {
    pub fn outputs(&self) -> Outputs {
        Outputs {
            haptics: Box::new(self.haptics.clone()),
            shader: Box::new(self.shader.clone()),
            hum: Box::new(self.hum.clone()),
            rush: Box::new(self.rush.clone()),
            confetti: Box::new(self.confetti.clone()),
            native_emitters: vec![Box::new(self.native.clone())],
        }
    }
}
