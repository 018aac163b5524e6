//! Pacing between items, driven by an injectable clock.

mod clock;
mod pacer;

pub use clock::{Clock, TokioClock};
pub use pacer::Pacer;
