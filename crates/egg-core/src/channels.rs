//! Narrow interfaces to the engine, the VR SDK and the output devices.
//!
//! The core never discovers objects or talks to hardware itself: hosts bind
//! these traits to whatever scene graph and device layer they run on.
//! [`recording`] provides in-memory implementations for headless hosts and tests.

pub mod recording;

/// Kinds of component an egg can require on its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    MeshRenderer,
    ParticleEmitter,
    Grabbable,
    AudioSource,
}

/// Where a capability is looked up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    Target,
    /// The target or anything below it in the hierarchy.
    Descendants,
}

/// The object an egg augments. Not owned by the egg.
pub trait Target {
    fn name(&self) -> &str;
    fn find_capability(&self, capability: Capability, scope: Scope) -> bool;
}

pub trait Grabbable {
    fn is_held(&self) -> bool;
}

/// Haptic actuator of the controller holding the target.
pub trait HapticOutput {
    fn pulse(&mut self, intensity: f32, update_interval_sec: f32, pulse_interval_sec: f32);
    fn cancel(&mut self);
}

/// Float parameters of the effect shader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderParam {
    EffectBlend,
    Emission,
}

impl ShaderParam {
    pub fn name(self) -> &'static str {
        match self {
            ShaderParam::EffectBlend => "_EffectBlend",
            ShaderParam::Emission => "_Emission",
        }
    }
}

/// All renderable surfaces of the target, addressed as one.
pub trait ShaderParameterSink {
    /// Swap the surfaces' materials to the effect shader.
    fn install_effect(&mut self);
    /// Put back whatever shaders the surfaces had before `install_effect`.
    fn restore_original(&mut self);
    fn set_float(&mut self, param: ShaderParam, value: f32);
}

/// A looping clip source.
pub trait AudioChannel {
    fn play(&mut self);
    fn stop(&mut self);
    fn set_volume(&mut self, volume: f32);
}

pub trait ParticleEmitter {
    fn play(&mut self);
    fn stop(&mut self);
    fn set_speed_multiplier(&mut self, multiplier: f32);
}

/// Output devices driven by the effect engine.
pub struct Outputs {
    pub haptics: Box<dyn HapticOutput>,
    pub shader: Box<dyn ShaderParameterSink>,
    pub hum: Box<dyn AudioChannel>,
    pub rush: Box<dyn AudioChannel>,
    pub confetti: Box<dyn ParticleEmitter>,
    /// The target's own emitters, kept quiet while the egg is set up.
    pub native_emitters: Vec<Box<dyn ParticleEmitter>>,
}
