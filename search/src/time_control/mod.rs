mod clock;
mod timer;

pub use clock::Clock;
pub use timer::{ClockMode, Timer};
