// Shared effect and gesture tuning constants.

// Fade
pub const FADE_DURATION_SEC: f32 = 2.0; // time to ramp the effect fully in or out

// Oscillation
pub const OSCILLATE_PERIOD_SEC: f32 = 0.5;
pub const OSCILLATE_MIN_STRENGTH: f32 = 0.07;
pub const OSCILLATE_MAX_STRENGTH: f32 = 0.25;

// Haptic pulse cadence; their sum is the effect tick interval
pub const UPDATE_INTERVAL_SEC: f32 = 0.05;
pub const PULSE_INTERVAL_SEC: f32 = 0.01;

// Visual mapping
pub const VISUAL_BLEND_FLOOR: f32 = 0.25; // blend at zero strength while fully faded in
pub const EMISSION_PER_PRESSURE: f32 = 0.5;

// Audio layers
pub const HUM_MIN_VOLUME: f32 = 0.05;
pub const HUM_MAX_VOLUME: f32 = 0.15;
pub const RUSH_SMOOTH_TIME_SEC: f32 = 0.35; // decay lag of the rush layer
pub const TRIGGER_TOLERANCE: f32 = 0.1; // idle trigger never reads exactly zero

// Particles
pub const PARTICLE_SPEED_PER_PRESSURE: f32 = 3.0;

// Gesture
pub const CLICK_THRESHOLD: u32 = 3;
pub const CLICK_MAX_DURATION_SEC: f64 = 0.5;
pub const UPSIDE_DOWN_THRESHOLD_DEG: f32 = 90.0;
