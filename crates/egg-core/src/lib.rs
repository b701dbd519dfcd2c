pub mod channels;
pub mod clock;
pub mod config;
pub mod constants;
pub mod effect;
pub mod error;
pub mod events;
pub mod gesture;
pub mod lifecycle;
pub mod magic;
pub mod scheduler;
pub mod smoothing;
pub mod state;

pub use channels::*;
pub use clock::*;
pub use config::*;
pub use effect::{ChannelFrame, EffectChannelState, EffectEngine, EnginePhase};
pub use error::*;
pub use events::*;
pub use gesture::*;
pub use lifecycle::*;
pub use magic::*;
pub use state::*;
