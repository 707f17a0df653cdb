//! Device arrival/departure notifications, delivered on the delivery context.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::delivery::Marshaler;
use crate::device::RendererDevice;

pub trait RegistryListener: Send + Sync {
    fn on_device_added(&self, device: &RendererDevice);

    fn on_device_removed(&self, device: &RendererDevice);
}

/// Fan-out of registry changes to the registered listeners.
///
/// Discovery calls [`device_added`](Self::device_added) and
/// [`device_removed`](Self::device_removed) from its own threads.
#[derive(Clone)]
pub struct RegistryEvents {
    listeners: Arc<Mutex<Vec<Arc<dyn RegistryListener>>>>,
    marshaler: Marshaler,
}

impl RegistryEvents {
    pub fn new(marshaler: Marshaler) -> Self {
        Self {
            listeners: Arc::new(Mutex::new(Vec::new())),
            marshaler,
        }
    }

    /// Registers `listener` unless that very listener is already present.
    pub fn add_listener(&self, listener: Arc<dyn RegistryListener>) {
        let mut listeners = self.listeners.lock();
        if !listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            listeners.push(listener);
        }
    }

    pub fn remove_listener(&self, listener: &Arc<dyn RegistryListener>) {
        self.listeners.lock().retain(|l| !Arc::ptr_eq(l, listener));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Discovery began fetching the description of `udn`. Log only.
    pub fn discovery_started(&self, udn: &str) {
        info!(udn, "Device discovery started");
    }

    /// The description of `udn` could not be retrieved. Log only; listeners
    /// hear about a device once it is added.
    pub fn discovery_failed(&self, udn: &str, reason: &dyn std::fmt::Display) {
        error!(udn, "Device discovery failed: {}", reason);
    }

    pub fn device_added(&self, device: RendererDevice) {
        info!(udn = device.udn.as_str(), name = device.friendly_name.as_str(), "++ device added");
        self.dispatch(device, |listener, device| listener.on_device_added(device));
    }

    pub fn device_removed(&self, device: RendererDevice) {
        warn!(udn = device.udn.as_str(), name = device.friendly_name.as_str(), "-- device removed");
        self.dispatch(device, |listener, device| listener.on_device_removed(device));
    }

    fn dispatch(
        &self,
        device: RendererDevice,
        call: fn(&dyn RegistryListener, &RendererDevice),
    ) {
        // snapshot so listeners may (un)register from their callback
        let listeners: Vec<_> = self.listeners.lock().clone();
        if listeners.is_empty() {
            return;
        }
        self.marshaler.deliver(move || {
            for listener in &listeners {
                call(listener.as_ref(), &device);
            }
        });
    }
}
