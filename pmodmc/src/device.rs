use std::sync::Arc;

use crate::avtransport::AvTransportExecutor;
use crate::channel::ControlChannel;
use crate::config::ControlSettings;
use crate::delivery::Marshaler;
use crate::rendering_control::RenderingControlExecutor;
use crate::service::{ServiceHandle, ServiceKind};

/// A discovered media renderer and the services it exposes.
#[derive(Clone, Debug)]
pub struct RendererDevice {
    pub udn: String,
    pub friendly_name: String,
    pub avtransport: Option<ServiceHandle>,
    pub rendering_control: Option<ServiceHandle>,
}

impl RendererDevice {
    pub fn new(udn: impl Into<String>, friendly_name: impl Into<String>) -> Self {
        Self {
            udn: udn.into(),
            friendly_name: friendly_name.into(),
            avtransport: None,
            rendering_control: None,
        }
    }

    /// Attaches `service` to the slot matching its service type.
    ///
    /// Services of other kinds are ignored.
    pub fn with_service(mut self, service: ServiceHandle) -> Self {
        match ServiceKind::from_service_type(service.service_type()) {
            ServiceKind::AvTransport => self.avtransport = Some(service),
            ServiceKind::RenderingControl => self.rendering_control = Some(service),
            ServiceKind::Other => {}
        }
        self
    }

    pub fn has_avtransport(&self) -> bool {
        self.avtransport.is_some()
    }

    pub fn has_rendering_control(&self) -> bool {
        self.rendering_control.is_some()
    }

    /// Executor for the AVTransport service (absent service included).
    pub fn av_transport(
        &self,
        channel: &Arc<dyn ControlChannel>,
        marshaler: &Marshaler,
        settings: &ControlSettings,
    ) -> AvTransportExecutor {
        AvTransportExecutor::new(
            Arc::clone(channel),
            self.avtransport.clone(),
            marshaler.clone(),
            settings.clone(),
        )
    }

    /// Executor for the RenderingControl service (absent service included).
    pub fn rendering_control(
        &self,
        channel: &Arc<dyn ControlChannel>,
        marshaler: &Marshaler,
        settings: &ControlSettings,
    ) -> RenderingControlExecutor {
        RenderingControlExecutor::new(
            Arc::clone(channel),
            self.rendering_control.clone(),
            marshaler.clone(),
            settings.clone(),
        )
    }
}

impl PartialEq for RendererDevice {
    fn eq(&self, other: &Self) -> bool {
        self.udn == other.udn
    }
}

impl Eq for RendererDevice {}
