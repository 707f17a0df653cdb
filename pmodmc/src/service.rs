use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

pub const AVTRANSPORT_SERVICE_TYPE: &str = "urn:schemas-upnp-org:service:AVTransport:1";
pub const RENDERING_CONTROL_SERVICE_TYPE: &str =
    "urn:schemas-upnp-org:service:RenderingControl:1";

/// Handle to a discovered remote service and its action metadata.
///
/// Implemented by whatever performed discovery; this crate only reads it.
pub trait ServiceDescriptor: Send + Sync {
    /// True if the service exposes the named action.
    fn has_action(&self, name: &str) -> bool;

    /// Service URN, e.g. `urn:schemas-upnp-org:service:AVTransport:1`.
    fn service_type(&self) -> &str;

    fn control_url(&self) -> Option<&str> {
        None
    }

    fn event_sub_url(&self) -> Option<&str> {
        None
    }
}

pub type ServiceHandle = Arc<dyn ServiceDescriptor>;

/// Service category, derived from the service URN.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    AvTransport,
    RenderingControl,
    Other,
}

impl ServiceKind {
    pub fn from_service_type(service_type: &str) -> Self {
        let lower = service_type.to_ascii_lowercase();
        if lower.contains(":service:avtransport:") {
            ServiceKind::AvTransport
        } else if lower.contains(":service:renderingcontrol:") {
            ServiceKind::RenderingControl
        } else {
            ServiceKind::Other
        }
    }
}

/// Service descriptor built from already known metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StaticService {
    service_type: String,
    control_url: Option<String>,
    event_sub_url: Option<String>,
    actions: BTreeSet<String>,
}

impl StaticService {
    pub fn new(service_type: impl Into<String>) -> Self {
        Self {
            service_type: service_type.into(),
            ..Self::default()
        }
    }

    /// AVTransport:1 service exposing `actions`.
    pub fn avtransport<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(AVTRANSPORT_SERVICE_TYPE).with_actions(actions)
    }

    /// RenderingControl:1 service exposing `actions`.
    pub fn rendering_control<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(RENDERING_CONTROL_SERVICE_TYPE).with_actions(actions)
    }

    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions.extend(actions.into_iter().map(Into::into));
        self
    }

    pub fn with_control_url(mut self, url: impl Into<String>) -> Self {
        self.control_url = Some(url.into());
        self
    }

    pub fn with_event_sub_url(mut self, url: impl Into<String>) -> Self {
        self.event_sub_url = Some(url.into());
        self
    }

    pub fn kind(&self) -> ServiceKind {
        ServiceKind::from_service_type(&self.service_type)
    }

    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(String::as_str)
    }

    pub fn into_handle(self) -> ServiceHandle {
        Arc::new(self)
    }
}

impl ServiceDescriptor for StaticService {
    fn has_action(&self, name: &str) -> bool {
        self.actions.contains(name)
    }

    fn service_type(&self) -> &str {
        &self.service_type
    }

    fn control_url(&self) -> Option<&str> {
        self.control_url.as_deref()
    }

    fn event_sub_url(&self) -> Option<&str> {
        self.event_sub_url.as_deref()
    }
}

impl fmt::Debug for dyn ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("service_type", &self.service_type())
            .field("control_url", &self.control_url())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_service_reports_declared_actions() {
        let service = StaticService::avtransport(["Play", "Stop"])
            .with_control_url("http://192.168.1.20:49152/upnp/control/AVTransport1");

        assert!(service.has_action("Play"));
        assert!(!service.has_action("Seek"));
        assert_eq!(service.kind(), ServiceKind::AvTransport);
        assert_eq!(
            service.control_url(),
            Some("http://192.168.1.20:49152/upnp/control/AVTransport1")
        );
        assert_eq!(service.event_sub_url(), None);
    }

    #[test]
    fn service_kind_ignores_case_and_version() {
        assert_eq!(
            ServiceKind::from_service_type("urn:schemas-upnp-org:service:RenderingControl:3"),
            ServiceKind::RenderingControl
        );
        assert_eq!(
            ServiceKind::from_service_type("urn:schemas-upnp-org:service:avtransport:2"),
            ServiceKind::AvTransport
        );
        assert_eq!(
            ServiceKind::from_service_type("urn:schemas-upnp-org:service:ConnectionManager:1"),
            ServiceKind::Other
        );
    }
}
