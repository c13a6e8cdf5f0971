use std::time::Instant;

/// Injected time source. Cache TTLs and guard windows read the clock through
/// this trait so tests can drive expiry deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[cfg(test)]
pub struct ManualClock {
    now: std::sync::Mutex<Instant>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Self {
        Self { now: std::sync::Mutex::new(Instant::now()) }
    }

    pub fn advance(&self, delta: std::time::Duration) {
        *self.now.lock().unwrap() += delta;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }
}
