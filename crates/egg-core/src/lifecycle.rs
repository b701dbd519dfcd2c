//! The egg lifecycle state machine.
//!
//! [`Egg`] enforces the graph documented in [`crate::state`] and dispatches to
//! an [`EggBehaviour`], which supplies the prerequisites, the gesture checks
//! and the asynchronous setup/activate/deactivate/teardown hooks. A hook may
//! span any number of frames: the egg stays in the matching transitional
//! state until the hook fires its [`Completion`].
//!
//! Requests made from a state that does not allow them are ignored and
//! reported as `false`, so redundant triggers from the host are harmless.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use smallvec::{smallvec, SmallVec};

use crate::channels::{Capability, Scope, Target};
use crate::error::PrerequisiteError;
use crate::events::{EventQueue, InputEvent, TriggerPress};
use crate::state::{EggState, Stage};

type CompletionSlot = Rc<RefCell<SmallVec<[(Stage, u64); 2]>>>;

/// One-shot signal that a lifecycle hook has finished.
///
/// Consumed by [`Completion::complete`], so it can fire at most once. Dropping
/// it unfired leaves the egg parked in the transitional state and logs a
/// warning.
pub struct Completion {
    stage: Stage,
    epoch: u64,
    slot: CompletionSlot,
    fired: bool,
}

impl Completion {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn complete(mut self) {
        self.fired = true;
        self.slot.borrow_mut().push((self.stage, self.epoch));
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if !self.fired {
            log::warn!("[egg] {:?} completion dropped without firing", self.stage);
        }
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("stage", &self.stage)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

/// Capabilities a behaviour needs before it can be set up.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Prerequisites {
    pub on_target: SmallVec<[Capability; 4]>,
    pub on_descendants: SmallVec<[Capability; 4]>,
}

impl Prerequisites {
    pub fn descendants(caps: &[Capability]) -> Self {
        Self {
            on_target: smallvec![],
            on_descendants: SmallVec::from_slice(caps),
        }
    }

    fn first_missing(&self, target: &dyn Target) -> Option<(Capability, Scope)> {
        let own = self
            .on_target
            .iter()
            .map(|c| (*c, Scope::Target));
        let below = self
            .on_descendants
            .iter()
            .map(|c| (*c, Scope::Descendants));
        own.chain(below)
            .find(|(cap, scope)| !target.find_capability(*cap, *scope))
    }
}

/// What a hook may look at while it runs.
pub struct HookContext<'a> {
    pub now: f64,
    /// `None` if the target has been dropped by its owner.
    pub target: Option<&'a Rc<dyn Target>>,
}

/// Per-effect behaviour plugged into the lifecycle.
pub trait EggBehaviour {
    fn prerequisites(&self) -> Prerequisites;

    fn do_setup(&mut self, cx: &HookContext<'_>, done: Completion);
    fn do_check_activation_trigger(&mut self, press: &TriggerPress) -> bool;
    fn do_check_deactivation_trigger(&mut self, press: &TriggerPress) -> bool;
    fn do_activate(&mut self, cx: &HookContext<'_>, done: Completion);
    fn do_deactivate(&mut self, cx: &HookContext<'_>, done: Completion);
    fn do_teardown(&mut self, cx: &HookContext<'_>, done: Completion);

    /// Side effects of raw input that are not lifecycle transitions.
    fn on_input(&mut self, _event: &InputEvent, _now: f64) {}

    /// Advance any multi-frame work.
    fn tick(&mut self, _now: f64) {}
}

type StateObserver = Box<dyn FnMut(EggState, EggState)>;

pub struct Egg<B: EggBehaviour> {
    name: String,
    state: EggState,
    target: Option<Weak<dyn Target>>,
    behaviour: B,
    events: EventQueue,
    slot: CompletionSlot,
    running: Option<(Stage, u64)>,
    epoch: u64,
    teardown_requested: bool,
    observer: Option<StateObserver>,
}

impl<B: EggBehaviour> Egg<B> {
    pub fn new(name: impl Into<String>, behaviour: B) -> Self {
        Self {
            name: name.into(),
            state: EggState::default(),
            target: None,
            behaviour,
            events: EventQueue::default(),
            slot: Rc::new(RefCell::new(SmallVec::new())),
            running: None,
            epoch: 0,
            teardown_requested: false,
            observer: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> EggState {
        self.state
    }

    pub fn behaviour(&self) -> &B {
        &self.behaviour
    }

    pub fn behaviour_mut(&mut self) -> &mut B {
        &mut self.behaviour
    }

    pub fn target(&self) -> Option<Rc<dyn Target>> {
        self.target.as_ref().and_then(Weak::upgrade)
    }

    pub fn is_teardown_requested(&self) -> bool {
        self.teardown_requested
    }

    /// Called with `(from, to)` on every state change. Re-entering the
    /// current state, e.g. a repeated failed prerequisite check, is not a
    /// change.
    pub fn set_observer(&mut self, observer: impl FnMut(EggState, EggState) + 'static) {
        self.observer = Some(Box::new(observer));
    }

    fn set_state(&mut self, next: EggState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal edge {:?} -> {:?}",
            self.state,
            next
        );
        let prev = self.state;
        self.state = next;
        if prev == next {
            return;
        }
        log::info!("[egg] {}: {prev} -> {next}", self.name);
        if let Some(observer) = self.observer.as_mut() {
            observer(prev, next);
        }
    }

    fn ignored(&self, op: &str) -> bool {
        log::debug!("[egg] {}: {op} ignored in {}", self.name, self.state);
        false
    }

    /// Check the behaviour's prerequisites against the current target
    /// without touching the state.
    pub fn evaluate_prerequisites(&self) -> Result<(), PrerequisiteError> {
        let target = self.target().ok_or_else(|| PrerequisiteError::TargetDropped {
            egg: self.name.clone(),
        })?;
        match self.behaviour.prerequisites().first_missing(target.as_ref()) {
            None => Ok(()),
            Some((capability, scope)) => Err(PrerequisiteError::Missing {
                egg: self.name.clone(),
                capability,
                scope,
            }),
        }
    }

    fn check_prerequisites(&mut self) -> Result<(), PrerequisiteError> {
        let verdict = self.evaluate_prerequisites();
        match &verdict {
            Ok(()) => self.set_state(EggState::PrerequisitesMet),
            Err(err) => {
                log::warn!("[egg] prerequisites not met: {err}");
                self.set_state(EggState::PrerequisitesNotMet);
            }
        }
        verdict
    }

    /// Attach to `target` and run the setup hook if its prerequisites hold.
    ///
    /// Returns `Ok(false)` if the egg is not at rest. A prerequisite failure
    /// leaves the egg in `PrerequisitesNotMet`; calling again is allowed.
    pub fn setup(&mut self, target: &Rc<dyn Target>, now: f64) -> Result<bool, PrerequisiteError> {
        if !self.state.is_at_rest() {
            return Ok(self.ignored("setup"));
        }
        self.target = Some(Rc::downgrade(target));
        self.check_prerequisites()?;
        self.begin(Stage::Setup, now);
        Ok(true)
    }

    pub fn activate(&mut self, now: f64) -> bool {
        if self.state != EggState::SetUp {
            return self.ignored("activate");
        }
        self.begin(Stage::Activate, now);
        true
    }

    pub fn deactivate(&mut self, now: f64) -> bool {
        if self.state != EggState::Active {
            return self.ignored("deactivate");
        }
        self.begin(Stage::Deactivate, now);
        true
    }

    pub fn teardown(&mut self, now: f64) -> bool {
        if self.state != EggState::SetUp {
            return self.ignored("teardown");
        }
        self.teardown_requested = false;
        self.begin(Stage::Teardown, now);
        true
    }

    /// Tear down as soon as the lifecycle allows it, deactivating first if
    /// needed.
    pub fn request_teardown(&mut self, now: f64) -> bool {
        match self.state {
            EggState::SetUp => self.teardown(now),
            EggState::Active => {
                self.teardown_requested = true;
                self.deactivate(now)
            }
            state if state.is_transitional() => {
                log::debug!("[egg] {}: teardown parked until {state} settles", self.name);
                self.teardown_requested = true;
                true
            }
            _ => self.ignored("teardown request"),
        }
    }

    pub fn check_activation_trigger(&mut self, press: &TriggerPress, now: f64) -> bool {
        if self.state != EggState::SetUp {
            return false;
        }
        if !self.behaviour.do_check_activation_trigger(press) {
            return false;
        }
        self.activate(now)
    }

    pub fn check_deactivation_trigger(&mut self, press: &TriggerPress, now: f64) -> bool {
        if self.state != EggState::Active {
            return false;
        }
        if !self.behaviour.do_check_deactivation_trigger(press) {
            return false;
        }
        self.deactivate(now)
    }

    /// Queue an input event; it is handled on the next `tick`.
    pub fn push_event(&mut self, event: InputEvent, at: f64) {
        self.events.push(event, at);
    }

    /// One frame: handle queued input in arrival order, advance the
    /// behaviour, then apply any hook completions.
    pub fn tick(&mut self, now: f64) {
        for (at, event) in self.events.take() {
            self.behaviour.on_input(&event, at);
            match event {
                InputEvent::TriggerPressed { controller_up } => {
                    let press = TriggerPress {
                        time: at,
                        controller_up,
                    };
                    // one press drives at most one transition, even when the
                    // activation hook completes synchronously
                    if !self.check_activation_trigger(&press, at) {
                        let _ = self.check_deactivation_trigger(&press, at);
                    }
                }
                InputEvent::ControllerLost => {
                    let _ = self.request_teardown(at);
                }
                _ => {}
            }
        }
        self.behaviour.tick(now);
        self.settle(now);
    }

    fn begin(&mut self, stage: Stage, now: f64) {
        self.epoch += 1;
        self.running = Some((stage, self.epoch));
        self.set_state(stage.running_state());

        let done = Completion {
            stage,
            epoch: self.epoch,
            slot: Rc::clone(&self.slot),
            fired: false,
        };
        let target = self.target();
        let cx = HookContext {
            now,
            target: target.as_ref(),
        };
        match stage {
            Stage::Setup => self.behaviour.do_setup(&cx, done),
            Stage::Activate => self.behaviour.do_activate(&cx, done),
            Stage::Deactivate => self.behaviour.do_deactivate(&cx, done),
            Stage::Teardown => self.behaviour.do_teardown(&cx, done),
        }
        self.settle(now);
    }

    fn settle(&mut self, now: f64) {
        let fired: SmallVec<[(Stage, u64); 2]> = std::mem::take(&mut *self.slot.borrow_mut());
        for completion in fired {
            if self.running != Some(completion) {
                log::debug!("[egg] {}: stale {:?} completion ignored", self.name, completion.0);
                continue;
            }
            self.running = None;
            match completion.0 {
                Stage::Setup | Stage::Deactivate => self.set_state(EggState::SetUp),
                Stage::Activate => self.set_state(EggState::Active),
                Stage::Teardown => {
                    let _ = self.check_prerequisites();
                }
            }
        }

        if self.teardown_requested && self.running.is_none() {
            match self.state {
                EggState::SetUp => {
                    let _ = self.teardown(now);
                }
                EggState::Active => {
                    let _ = self.deactivate(now);
                }
                _ => {}
            }
        }
    }
}
