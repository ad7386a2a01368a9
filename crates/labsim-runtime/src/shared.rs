//! Shared session handle
//!
//! Hosts that issue commands from callbacks while a background loop ticks
//! wrap the session in [`SharedLab`]. Each command takes the lock once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use tracing::debug;

use crate::LabSession;

/// Cloneable handle to one lab session
#[derive(Clone, Debug)]
pub struct SharedLab {
    inner: Arc<Mutex<LabSession>>,
}

impl SharedLab {
    pub fn new(session: LabSession) -> Self {
        SharedLab {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Run `f` under the session lock
    pub fn with<R>(&self, f: impl FnOnce(&mut LabSession) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn lock(&self) -> MutexGuard<'_, LabSession> {
        self.inner.lock()
    }

    /// Start a thread that polls the session every `poll` interval. The
    /// session's own tick driver decides whether a tick is due.
    pub fn spawn_driver(&self, poll: Duration) -> DriverHandle {
        let lab = self.clone();
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();

        let join = thread::spawn(move || {
            debug!(?poll, "lab driver started");
            while !flag.load(Ordering::Relaxed) {
                lab.with(|session| session.tick());
                thread::sleep(poll);
            }
            debug!("lab driver stopped");
        });

        DriverHandle {
            stop,
            join: Some(join),
        }
    }
}

/// Stops the driver thread on [`DriverHandle::stop`] or drop
#[derive(Debug)]
pub struct DriverHandle {
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl DriverHandle {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for DriverHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labsim_core::EquipmentClass;
    use labsim_time::ManualClock;

    #[test]
    fn test_commands_through_handle() {
        let clock = ManualClock::new();
        let lab = SharedLab::new(LabSession::with_clock(clock.clone()));

        let vessel = lab.with(|s| s.add_vessel());
        let id = lab
            .with(|s| s.attach_equipment(EquipmentClass::HotPlate, vessel))
            .unwrap();

        let other = lab.clone();
        let stored = thread::spawn(move || other.with(|s| s.set_setpoint(id, 500.0)))
            .join()
            .unwrap()
            .unwrap();
        assert_eq!(stored, 400.0);
        assert_eq!(lab.lock().attachment(id).unwrap().settings.setpoint(), Some(400.0));
    }

    #[test]
    fn test_driver_ticks_and_stops() {
        let clock = ManualClock::new();
        let lab = SharedLab::new(LabSession::with_clock(clock.clone()));
        let driver = lab.spawn_driver(Duration::from_millis(1));

        // The driver only ticks once the clock moves past the interval
        for _ in 0..50 {
            clock.advance_millis(100);
            thread::sleep(Duration::from_millis(2));
            if lab.lock().tick_stats().delivered >= 2 {
                break;
            }
        }
        driver.stop();
        assert!(lab.lock().tick_stats().delivered >= 1);
    }
}
