#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, unbounded};
use parking_lot::Mutex;
use pmodmc::{
    ActionRequest, AvTransportExecutor, ControlChannel, ControlSettings, Listener, Marshaler,
    RenderingControlExecutor, Response, StaticService, SubscriptionRequest, listener,
};

/// Channel that keeps every request so tests can complete them by hand.
#[derive(Default)]
pub struct MockChannel {
    requests: Mutex<Vec<ActionRequest>>,
    subscriptions: Mutex<Vec<SubscriptionRequest>>,
}

impl MockChannel {
    pub fn submitted(&self) -> usize {
        self.requests.lock().len()
    }

    /// Removes the only pending request.
    pub fn take(&self) -> ActionRequest {
        let mut requests = self.requests.lock();
        assert_eq!(requests.len(), 1, "expected exactly one submitted request");
        requests.remove(0)
    }

    pub fn take_subscription(&self) -> SubscriptionRequest {
        let mut subscriptions = self.subscriptions.lock();
        assert_eq!(subscriptions.len(), 1, "expected exactly one subscription");
        subscriptions.remove(0)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().len()
    }
}

impl ControlChannel for MockChannel {
    fn execute(&self, request: ActionRequest) {
        self.requests.lock().push(request);
    }

    fn subscribe(&self, request: SubscriptionRequest) {
        self.subscriptions.lock().push(request);
    }
}

pub const AVT_ACTIONS: [&str; 8] = [
    "SetAVTransportURI",
    "Play",
    "Pause",
    "Stop",
    "Seek",
    "GetPositionInfo",
    "GetMediaInfo",
    "GetTransportInfo",
];

pub const RC_ACTIONS: [&str; 6] = [
    "SetVolume",
    "GetVolume",
    "SetMute",
    "GetMute",
    "SetBrightness",
    "GetBrightness",
];

pub fn avtransport(
    actions: &[&str],
    marshaler: Marshaler,
) -> (Arc<MockChannel>, AvTransportExecutor) {
    let channel = Arc::new(MockChannel::default());
    let service = StaticService::avtransport(actions.iter().copied()).into_handle();
    let executor = AvTransportExecutor::new(
        channel.clone(),
        Some(service),
        marshaler,
        ControlSettings::default(),
    );
    (channel, executor)
}

pub fn rendering_control(
    actions: &[&str],
    marshaler: Marshaler,
) -> (Arc<MockChannel>, RenderingControlExecutor) {
    let channel = Arc::new(MockChannel::default());
    let service = StaticService::rendering_control(actions.iter().copied()).into_handle();
    let executor = RenderingControlExecutor::new(
        channel.clone(),
        Some(service),
        marshaler,
        ControlSettings::default(),
    );
    (channel, executor)
}

/// Listener forwarding every response to the returned receiver.
pub fn capture<T: Send + 'static>() -> (Option<Listener<T>>, Receiver<Response<T>>) {
    let (tx, rx) = unbounded();
    let l = listener(move |response| {
        let _ = tx.send(response);
    });
    (l, rx)
}

/// The single response received so far.
pub fn single<T>(rx: &Receiver<Response<T>>) -> Response<T> {
    let response = rx
        .recv_timeout(Duration::from_secs(2))
        .expect("no response delivered");
    assert!(rx.try_recv().is_err(), "more than one response delivered");
    response
}
