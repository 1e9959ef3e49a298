//! Optional host device capabilities.

use std::time::Duration;

/// Short vibration feedback. Hosts without a vibration motor have no instance.
pub trait HapticFeedback: Send + Sync {
    fn vibrate(&self, duration: Duration);
}

/// Capabilities detected at startup.
#[derive(Default, Clone)]
pub struct DeviceCapabilities {
    pub haptics: Option<std::sync::Arc<dyn HapticFeedback>>,
}

impl DeviceCapabilities {
    /// Desktop terminals expose no haptic device.
    pub fn detect() -> Self {
        Self::default()
    }

    /// Pulses the haptic device when present. Returns whether a pulse was sent.
    pub fn pulse(&self, duration: Duration) -> bool {
        match &self.haptics {
            Some(haptics) => {
                haptics.vibrate(duration);
                true
            }
            None => false,
        }
    }
}
