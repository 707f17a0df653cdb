//! Subscription adapter: binds a service, an event parser and a listener
//! into one request handed to the control channel.
//!
//! The channel owns the request for the lifetime of the subscription and
//! drives it (`established`, `event_received`, `ended`, `failed`). Events are
//! delivered on the channel's thread.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};
use xmltree::{Element, XMLNode};

use crate::errors::ControlError;
use crate::model::TransportState;
use crate::service::ServiceHandle;

/// State variables changed in one event, per instance id.
///
/// Variables carrying a `channel` attribute are keyed as `Name@Channel`
/// (e.g. `Volume@Master`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LastChange {
    instances: BTreeMap<u32, BTreeMap<String, String>>,
}

impl LastChange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, instance_id: u32, name: impl Into<String>, value: impl Into<String>) {
        self.instances
            .entry(instance_id)
            .or_default()
            .insert(name.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.instances.values().all(BTreeMap::is_empty)
    }

    pub fn instance_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.instances.keys().copied()
    }

    pub fn instance(&self, instance_id: u32) -> Option<&BTreeMap<String, String>> {
        self.instances.get(&instance_id)
    }

    pub fn value(&self, instance_id: u32, name: &str) -> Option<&str> {
        self.instances
            .get(&instance_id)
            .and_then(|vars| vars.get(name))
            .map(String::as_str)
    }

    pub fn transport_state(&self, instance_id: u32) -> Option<TransportState> {
        self.value(instance_id, "TransportState")
            .map(TransportState::from_upnp)
    }

    pub fn volume(&self, instance_id: u32, channel: &str) -> Option<u16> {
        self.value(instance_id, &format!("Volume@{}", channel))
            .and_then(|v| v.trim().parse().ok())
    }

    pub fn mute(&self, instance_id: u32, channel: &str) -> Option<bool> {
        match self.value(instance_id, &format!("Mute@{}", channel))?.trim() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        }
    }
}

/// Turns an event payload into a [`LastChange`].
pub trait EventParser: Send + Sync {
    fn parse(&self, payload: &str) -> Result<LastChange, ControlError>;
}

/// Parser for UPnP `LastChange` documents.
///
/// Accepts either the bare `<Event>` document or the GENA
/// `<propertyset>` wrapping it.
#[derive(Clone, Copy, Debug, Default)]
pub struct LastChangeParser;

impl EventParser for LastChangeParser {
    fn parse(&self, payload: &str) -> Result<LastChange, ControlError> {
        let root = Element::parse(payload.trim().as_bytes())
            .map_err(|e| ControlError::event_payload(e.to_string()))?;

        if root.name == "propertyset" {
            let inner = xml_children(&root)
                .flat_map(xml_children)
                .find(|child| child.name == "LastChange")
                .and_then(|child| child.get_text())
                .ok_or_else(|| ControlError::event_payload("no LastChange property"))?;
            return self.parse(&inner);
        }

        if root.name != "Event" {
            return Err(ControlError::event_payload(format!(
                "unexpected root element <{}>",
                root.name
            )));
        }

        let mut change = LastChange::new();
        for instance in xml_children(&root).filter(|e| e.name == "InstanceID") {
            let Some(id) = instance
                .attributes
                .get("val")
                .and_then(|v| v.trim().parse::<u32>().ok())
            else {
                warn!("Skipping InstanceID without a numeric val attribute");
                continue;
            };

            for variable in xml_children(instance) {
                let value = variable.attributes.get("val").cloned().unwrap_or_default();
                let key = match variable.attributes.get("channel") {
                    Some(channel) => format!("{}@{}", variable.name, channel),
                    None => variable.name.clone(),
                };
                change.insert(id, key, value);
            }
        }

        Ok(change)
    }
}

fn xml_children(element: &Element) -> impl Iterator<Item = &Element> {
    element.children.iter().filter_map(|node| match node {
        XMLNode::Element(elem) => Some(elem),
        _ => None,
    })
}

/// Receives the notifications of one subscription.
pub trait SubscriptionListener: Send + Sync {
    fn on_established(&self) {}

    fn on_event(&self, change: &LastChange);

    fn on_ended(&self, _reason: Option<&str>) {}

    fn on_failed(&self, _message: &str) {}
}

/// Subscription handed to [`ControlChannel::subscribe`](crate::channel::ControlChannel::subscribe).
pub struct SubscriptionRequest {
    service: ServiceHandle,
    parser: Arc<dyn EventParser>,
    listener: Arc<dyn SubscriptionListener>,
}

impl SubscriptionRequest {
    pub fn new(
        service: ServiceHandle,
        parser: Arc<dyn EventParser>,
        listener: Arc<dyn SubscriptionListener>,
    ) -> Self {
        Self {
            service,
            parser,
            listener,
        }
    }

    pub fn service(&self) -> &ServiceHandle {
        &self.service
    }

    pub fn established(&self) {
        debug!(service = self.service.service_type(), "Subscription established");
        self.listener.on_established();
    }

    /// Parses `payload` and forwards it. Unparsable payloads are dropped.
    pub fn event_received(&self, payload: &str) {
        match self.parser.parse(payload) {
            Ok(change) => self.listener.on_event(&change),
            Err(err) => warn!(
                service = self.service.service_type(),
                "Dropping event: {}", err
            ),
        }
    }

    pub fn ended(&self, reason: Option<&str>) {
        debug!(
            service = self.service.service_type(),
            reason = reason.unwrap_or(""),
            "Subscription ended"
        );
        self.listener.on_ended(reason);
    }

    pub fn failed(&self, message: &str) {
        warn!(
            service = self.service.service_type(),
            "Subscription failed: {}", message
        );
        self.listener.on_failed(message);
    }
}

impl fmt::Debug for SubscriptionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionRequest")
            .field("service", &self.service.service_type())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::StaticService;
    use parking_lot::Mutex;

    const AVT_EVENT: &str = r#"<Event xmlns="urn:schemas-upnp-org:metadata-1-0/AVT/">
  <InstanceID val="0">
    <TransportState val="PLAYING"/>
    <CurrentTrackURI val="http://x/video.mp4"/>
  </InstanceID>
</Event>"#;

    #[test]
    fn parses_bare_event_document() {
        let change = LastChangeParser.parse(AVT_EVENT).unwrap();
        assert_eq!(change.transport_state(0), Some(TransportState::Playing));
        assert_eq!(change.value(0, "CurrentTrackURI"), Some("http://x/video.mp4"));
        assert_eq!(change.instance_ids().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn parses_propertyset_with_channels() {
        let payload = r#"<?xml version="1.0"?>
<e:propertyset xmlns:e="urn:schemas-upnp-org:event-1-0">
  <e:property>
    <LastChange>&lt;Event xmlns="urn:schemas-upnp-org:metadata-1-0/RCS/"&gt;&lt;InstanceID val="0"&gt;&lt;Volume channel="Master" val="40"/&gt;&lt;Mute channel="Master" val="0"/&gt;&lt;/InstanceID&gt;&lt;/Event&gt;</LastChange>
  </e:property>
</e:propertyset>"#;

        let change = LastChangeParser.parse(payload).unwrap();
        assert_eq!(change.volume(0, "Master"), Some(40));
        assert_eq!(change.mute(0, "Master"), Some(false));
        assert_eq!(change.volume(0, "LF"), None);
    }

    #[test]
    fn rejects_foreign_documents() {
        assert!(LastChangeParser.parse("<root/>").is_err());
        assert!(LastChangeParser.parse("not xml").is_err());
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<LastChange>>,
        ended: Mutex<Vec<Option<String>>>,
    }

    impl SubscriptionListener for Recorder {
        fn on_event(&self, change: &LastChange) {
            self.events.lock().push(change.clone());
        }

        fn on_ended(&self, reason: Option<&str>) {
            self.ended.lock().push(reason.map(str::to_string));
        }
    }

    #[test]
    fn request_parses_and_forwards_events() {
        let recorder = Arc::new(Recorder::default());
        let request = SubscriptionRequest::new(
            StaticService::avtransport(["Play"]).into_handle(),
            Arc::new(LastChangeParser),
            recorder.clone(),
        );

        request.established();
        request.event_received(AVT_EVENT);
        request.event_received("<garbage");
        request.ended(Some("renewal failed"));

        assert_eq!(recorder.events.lock().len(), 1);
        assert_eq!(
            *recorder.ended.lock(),
            vec![Some("renewal failed".to_string())]
        );
    }
}
