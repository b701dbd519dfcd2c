//! Secret-gesture recognition: hold the target, turn the controller past
//! vertical, click the trigger three times in quick succession.

use glam::Vec3;

use crate::config::{GestureConfig, OrientationGate};
use crate::events::TriggerPress;

/// Which lifecycle check a press is being evaluated for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureCheck {
    Activation,
    Deactivation,
}

/// Angle in degrees between the controller's up axis and world up, or `None`
/// if the axis is degenerate.
#[inline]
pub fn tilt_from_world_up(controller_up: Vec3) -> Option<f32> {
    controller_up
        .try_normalize()
        .map(|up| up.angle_between(Vec3::Y).to_degrees())
}

#[derive(Clone, Debug)]
pub struct GestureDetector {
    config: GestureConfig,
    last_click: Option<f64>,
    click_count: u32,
}

impl GestureDetector {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            last_click: None,
            click_count: 0,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn click_count(&self) -> u32 {
        self.click_count
    }

    pub fn last_click(&self) -> Option<f64> {
        self.last_click
    }

    pub fn reset(&mut self) {
        self.last_click = None;
        self.click_count = 0;
    }

    fn orientation_applies(&self, check: GestureCheck) -> bool {
        match self.config.orientation_gate {
            OrientationGate::Always => true,
            OrientationGate::ActivationOnly => check == GestureCheck::Activation,
        }
    }

    /// Feed one trigger press. Returns `true` on the press that completes the
    /// gesture; the detector is then cleared, so the next gesture needs a full
    /// sequence of presses.
    pub fn register(&mut self, press: &TriggerPress, held: bool, check: GestureCheck) -> bool {
        if !held {
            log::debug!("[gesture] press ignored: target not held");
            return false;
        }

        if self.orientation_applies(check) {
            match tilt_from_world_up(press.controller_up) {
                Some(tilt) if tilt >= self.config.upside_down_threshold_deg => {}
                tilt => {
                    log::debug!("[gesture] press ignored: tilt {tilt:?} not upside down");
                    return false;
                }
            }
        }

        match self.last_click {
            Some(last) if press.time < last + self.config.click_max_duration_sec => {
                self.click_count += 1;
                log::debug!("[gesture] click within limit: {}", self.click_count);
                if self.click_count >= self.config.click_threshold - 1 {
                    log::info!("[gesture] {check:?} gesture recognized");
                    // the completing press must not open the next sequence
                    self.reset();
                    return true;
                }
            }
            Some(last) => {
                log::debug!(
                    "[gesture] clicked too late: {:.3} > {:.3} + {:.3}",
                    press.time,
                    last,
                    self.config.click_max_duration_sec
                );
                self.click_count = 0;
            }
            None => self.click_count = 0,
        }
        self.last_click = Some(press.time);
        false
    }
}
