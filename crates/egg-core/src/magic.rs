//! The magic egg: hold any object with a particle system under it, turn the
//! controller upside down and triple-click the trigger. The object starts to
//! shimmer, hum and throw confetti while the trigger is squeezed.

use std::rc::Rc;

use crate::channels::{Capability, Grabbable, Outputs};
use crate::config::{EffectConfig, GestureConfig};
use crate::effect::EffectEngine;
use crate::error::ConfigError;
use crate::events::{InputEvent, TriggerPress};
use crate::gesture::{GestureCheck, GestureDetector};
use crate::lifecycle::{Completion, EggBehaviour, HookContext, Prerequisites};

pub struct MagicEgg {
    gesture: GestureDetector,
    grabbable: Rc<dyn Grabbable>,
    engine: EffectEngine,
}

impl MagicEgg {
    pub fn new(
        effect: EffectConfig,
        gesture: GestureConfig,
        outputs: Outputs,
        grabbable: Rc<dyn Grabbable>,
    ) -> Result<Self, ConfigError> {
        effect.validate()?;
        gesture.validate()?;
        Ok(Self {
            gesture: GestureDetector::new(gesture),
            engine: EffectEngine::new(effect, outputs, Rc::clone(&grabbable)),
            grabbable,
        })
    }

    pub fn gesture(&self) -> &GestureDetector {
        &self.gesture
    }

    pub fn engine(&self) -> &EffectEngine {
        &self.engine
    }

    fn check(&mut self, press: &TriggerPress, check: GestureCheck) -> bool {
        let held = self.grabbable.is_held();
        self.gesture.register(press, held, check)
    }
}

impl EggBehaviour for MagicEgg {
    fn prerequisites(&self) -> Prerequisites {
        Prerequisites::descendants(&[Capability::ParticleEmitter])
    }

    fn do_setup(&mut self, cx: &HookContext<'_>, done: Completion) {
        if let Some(target) = cx.target {
            log::info!("[magic] setting up on {}", target.name());
        }
        self.engine.prepare();
        self.gesture.reset();
        done.complete();
    }

    fn do_check_activation_trigger(&mut self, press: &TriggerPress) -> bool {
        self.check(press, GestureCheck::Activation)
    }

    fn do_check_deactivation_trigger(&mut self, press: &TriggerPress) -> bool {
        self.check(press, GestureCheck::Deactivation)
    }

    fn do_activate(&mut self, cx: &HookContext<'_>, done: Completion) {
        self.engine.fade_in(cx.now, done);
    }

    fn do_deactivate(&mut self, cx: &HookContext<'_>, done: Completion) {
        self.engine.fade_out(cx.now, done);
    }

    fn do_teardown(&mut self, _cx: &HookContext<'_>, done: Completion) {
        self.engine.release();
        self.gesture.reset();
        done.complete();
    }

    fn on_input(&mut self, event: &InputEvent, _now: f64) {
        self.engine.on_input(event);
    }

    fn tick(&mut self, now: f64) {
        self.engine.tick(now);
    }
}
