//! Domain types for nifty-renko

pub mod bar;
pub mod brick;
pub mod signal;

pub use bar::Bar;
pub use brick::Brick;
pub use signal::{Signal, SignalType, UnknownSignalType};
