//! Tunable parameters for the effect engine and the activation gesture.
//!
//! Defaults come from [`crate::constants`]. Hosts that expose these values to
//! designers should call `validate` before handing them to an egg.

use crate::constants::*;
use crate::error::ConfigError;

/// Which trigger checks require the controller to be held upside down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OrientationGate {
    /// Both activation and deactivation need the inverted grip.
    #[default]
    Always,
    /// Only activation needs it; deactivation accepts any orientation.
    ActivationOnly,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GestureConfig {
    pub click_threshold: u32,
    pub click_max_duration_sec: f64,
    pub upside_down_threshold_deg: f32,
    pub orientation_gate: OrientationGate,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            click_threshold: CLICK_THRESHOLD,
            click_max_duration_sec: CLICK_MAX_DURATION_SEC,
            upside_down_threshold_deg: UPSIDE_DOWN_THRESHOLD_DEG,
            orientation_gate: OrientationGate::default(),
        }
    }
}

impl GestureConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.click_threshold < 2 {
            return Err(ConfigError::ClickThreshold(self.click_threshold));
        }
        positive("click_max_duration_sec", self.click_max_duration_sec)?;
        let angle = self.upside_down_threshold_deg;
        if !(angle > 0.0 && angle <= 180.0) {
            return Err(ConfigError::ThresholdAngle(angle));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EffectConfig {
    pub fade_duration_sec: f32,
    pub oscillate_period_sec: f32,
    pub oscillate_min_strength: f32,
    pub oscillate_max_strength: f32,
    pub update_interval_sec: f32,
    pub pulse_interval_sec: f32,
    pub hum_min_volume: f32,
    pub hum_max_volume: f32,
    pub rush_smooth_time_sec: f32,
    pub trigger_tolerance: f32,
    pub particle_speed_per_pressure: f32,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            fade_duration_sec: FADE_DURATION_SEC,
            oscillate_period_sec: OSCILLATE_PERIOD_SEC,
            oscillate_min_strength: OSCILLATE_MIN_STRENGTH,
            oscillate_max_strength: OSCILLATE_MAX_STRENGTH,
            update_interval_sec: UPDATE_INTERVAL_SEC,
            pulse_interval_sec: PULSE_INTERVAL_SEC,
            hum_min_volume: HUM_MIN_VOLUME,
            hum_max_volume: HUM_MAX_VOLUME,
            rush_smooth_time_sec: RUSH_SMOOTH_TIME_SEC,
            trigger_tolerance: TRIGGER_TOLERANCE,
            particle_speed_per_pressure: PARTICLE_SPEED_PER_PRESSURE,
        }
    }
}

impl EffectConfig {
    /// Seconds between two oscillation ticks.
    #[inline]
    pub fn tick_interval_sec(&self) -> f64 {
        (self.update_interval_sec + self.pulse_interval_sec) as f64
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("fade_duration_sec", self.fade_duration_sec as f64)?;
        positive("oscillate_period_sec", self.oscillate_period_sec as f64)?;
        positive("update_interval_sec", self.update_interval_sec as f64)?;
        positive("pulse_interval_sec", self.pulse_interval_sec as f64)?;
        positive("rush_smooth_time_sec", self.rush_smooth_time_sec as f64)?;
        ordered(
            "oscillate_strength",
            self.oscillate_min_strength,
            self.oscillate_max_strength,
        )?;
        ordered("hum_volume", self.hum_min_volume, self.hum_max_volume)?;
        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

fn ordered(name: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    if min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvertedRange { name, min, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(EffectConfig::default().validate().is_ok());
        assert!(GestureConfig::default().validate().is_ok());
    }

    #[test]
    fn default_tick_interval_is_sixty_ms() {
        let t = EffectConfig::default().tick_interval_sec();
        assert!((t - 0.06).abs() < 1e-6);
    }

    #[test]
    fn rejects_inverted_hum_bounds() {
        let cfg = EffectConfig {
            hum_min_volume: 0.5,
            hum_max_volume: 0.1,
            ..EffectConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvertedRange {
                name: "hum_volume",
                ..
            })
        ));
    }

    #[test]
    fn rejects_zero_fade_and_nan_period() {
        let cfg = EffectConfig {
            fade_duration_sec: 0.0,
            ..EffectConfig::default()
        };
        assert!(cfg.validate().is_err());
        let cfg = EffectConfig {
            oscillate_period_sec: f32::NAN,
            ..EffectConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_degenerate_gesture() {
        let cfg = GestureConfig {
            click_threshold: 1,
            ..GestureConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ClickThreshold(1)));
        let cfg = GestureConfig {
            upside_down_threshold_deg: 0.0,
            ..GestureConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ThresholdAngle(0.0)));
    }
}
