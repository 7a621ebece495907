//! Device/adapter provider.

use std::sync::Arc;

use parking_lot::Mutex;

use wgpu::{
    Adapter, Backends, Device, DeviceDescriptor, Features, Instance, InstanceDescriptor, Limits,
    PowerPreference, Queue, RequestAdapterOptions, Surface,
};

use crate::error::{RenderError, RenderResult};

/// Set by the device-lost callback, polled by the frame driver.
#[derive(Clone, Debug, Default)]
pub struct DeviceLostSignal(Arc<Mutex<Option<String>>>);

impl DeviceLostSignal {
    pub fn raise(&self, reason: impl Into<String>) {
        self.0.lock().get_or_insert_with(|| reason.into());
    }

    /// Reason the device was lost, if it was.
    pub fn reason(&self) -> Option<String> {
        self.0.lock().clone()
    }
}

pub struct GpuContext {
    pub adapter: Adapter,
    pub device: Device,
    pub queue: Queue,
    lost: DeviceLostSignal,
}

impl GpuContext {
    /// Request an adapter (compatible with `surface` when given) and a device.
    /// No retry: a missing adapter or device is a startup failure.
    pub async fn request(instance: &Instance, surface: Option<&Surface<'_>>) -> RenderResult<Self> {
        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: surface,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| RenderError::AdapterUnavailable(e.to_string()))?;

        let info = adapter.get_info();
        log::info!(
            "Using adapter: {} ({:?}, driver: {})",
            info.name,
            info.backend,
            info.driver
        );

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("Objlit Device"),
                required_features: Features::empty(),
                required_limits: Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await
            .map_err(|e| RenderError::AdapterUnavailable(e.to_string()))?;

        let lost = DeviceLostSignal::default();
        let signal = lost.clone();
        device.set_device_lost_callback(move |reason, message| {
            if matches!(reason, wgpu::DeviceLostReason::Destroyed) {
                log::debug!("Device destroyed: {message}");
                return;
            }
            log::error!("Device lost ({reason:?}): {message}");
            signal.raise(format!("{reason:?}: {message}"));
        });

        Ok(Self {
            adapter,
            device,
            queue,
            lost,
        })
    }

    /// Adapter and device without any presentation surface.
    pub async fn headless(backends: Backends) -> RenderResult<Self> {
        let instance = Instance::new(&InstanceDescriptor {
            backends,
            ..Default::default()
        });
        Self::request(&instance, None).await
    }

    #[inline]
    pub fn lost_signal(&self) -> DeviceLostSignal {
        self.lost.clone()
    }

    /// `Err(DeviceLost)` once the device-lost callback has fired.
    pub fn ensure_alive(&self) -> RenderResult<()> {
        match self.lost.reason() {
            Some(reason) => Err(RenderError::DeviceLost(reason)),
            None => Ok(()),
        }
    }
}
