use std::time::Duration;

/// Source of blocking pauses. The controller never calls `thread::sleep`
/// directly so tests can drive it with an instantaneous clock.
pub trait Clock {
    fn sleep(&self, duration: Duration);
}

/// Real wall-clock pauses on the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
