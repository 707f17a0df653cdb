//! Primitives shared by the concrete service executors.
//!
//! Every operation follows the same template:
//! 1. check that the service exposes the action, otherwise answer
//!    [`UNSUPPORTED_ACTION`] synchronously and stop;
//! 2. build a one-shot [`ActionRequest`] whose hooks wrap the outcome into a
//!    [`Response`];
//! 3. submit it to the [`ControlChannel`];
//! 4. deliver the response on the designated context through the
//!    [`Marshaler`].

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::channel::{ActionArguments, ActionOutput, ActionRequest, ControlChannel};
use crate::config::ControlSettings;
use crate::delivery::Marshaler;
use crate::errors::{ControlError, UNSUPPORTED_ACTION};
use crate::response::{Listener, Response};
use crate::service::ServiceHandle;
use crate::subscription::{EventParser, SubscriptionListener, SubscriptionRequest};

/// How a successful completion is turned into response data.
pub(crate) enum Completion<T> {
    /// Void action; the listener receives this value.
    Echo(T),
    /// Output arguments are decoded into `T`.
    Decode(fn(&ActionOutput) -> Result<T, ControlError>),
}

/// Base executor bound to one (possibly absent) service.
#[derive(Clone)]
pub struct ServiceExecutor {
    channel: Arc<dyn ControlChannel>,
    service: Option<ServiceHandle>,
    marshaler: Marshaler,
    settings: ControlSettings,
}

impl ServiceExecutor {
    pub fn new(
        channel: Arc<dyn ControlChannel>,
        service: Option<ServiceHandle>,
        marshaler: Marshaler,
        settings: ControlSettings,
    ) -> Self {
        Self {
            channel,
            service,
            marshaler,
            settings,
        }
    }

    pub fn service(&self) -> Option<&ServiceHandle> {
        self.service.as_ref()
    }

    pub fn instance_id(&self) -> u32 {
        self.settings.instance_id
    }

    pub fn channel_name(&self) -> &str {
        &self.settings.channel
    }

    /// True iff a service is present and exposes `name`.
    pub fn action_supported(&self, name: &str) -> bool {
        self.service
            .as_ref()
            .is_some_and(|service| service.has_action(name))
    }

    pub fn submit(&self, request: ActionRequest) {
        debug!(
            action = request.action(),
            service = request.service().service_type(),
            "Submitting action"
        );
        self.channel.execute(request);
    }

    /// Delivers `response` to `listener` on the delivery context.
    ///
    /// Without a listener nothing happens, not even a context switch.
    pub fn notify<T: Send + 'static>(&self, listener: Option<Listener<T>>, response: Response<T>) {
        notify_with(&self.marshaler, listener, response);
    }

    pub fn notify_data<T: Send + 'static>(&self, listener: Option<Listener<T>>, data: T) {
        self.notify(listener, Response::data(data));
    }

    pub fn notify_error<T: Send + 'static>(&self, listener: Option<Listener<T>>, message: &str) {
        self.notify(listener, Response::error(message));
    }

    /// Registers `listener` for state-change events of the service.
    ///
    /// Without a service the listener is told immediately through
    /// `on_failed` and nothing is submitted.
    pub fn subscribe(
        &self,
        listener: Arc<dyn SubscriptionListener>,
        parser: Arc<dyn EventParser>,
    ) {
        match &self.service {
            Some(service) => {
                debug!(service = service.service_type(), "Submitting subscription");
                self.channel.subscribe(SubscriptionRequest::new(
                    Arc::clone(service),
                    parser,
                    listener,
                ));
            }
            None => {
                warn!("Cannot subscribe: no service available");
                listener.on_failed(UNSUPPORTED_ACTION);
            }
        }
    }

    /// Runs the shared operation template.
    pub(crate) fn invoke<T: Send + 'static>(
        &self,
        listener: Option<Listener<T>>,
        action: &'static str,
        arguments: ActionArguments,
        completion: Completion<T>,
        fallback: &'static str,
    ) {
        let service = match &self.service {
            Some(service) if service.has_action(action) => Arc::clone(service),
            _ => {
                warn!(action, "Action not supported by service");
                self.notify_error(listener, UNSUPPORTED_ACTION);
                return;
            }
        };

        let reply = Reply::new(self.marshaler.clone(), listener);
        let request = ActionRequest::new(service, action).with_arguments(arguments);

        let on_failure = {
            let reply = reply.clone();
            move |message: Option<String>| {
                let message = message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| fallback.to_string());
                warn!(action, "Action failed: {}", message);
                reply.send(Response::error(message));
            }
        };

        let request = match completion {
            Completion::Echo(value) => {
                request.on_success(move || reply.send(Response::data(value)))
            }
            Completion::Decode(decode) => request.on_result(move |output| {
                let response = match decode(&output) {
                    Ok(value) => Response::data(value),
                    Err(err) => {
                        warn!(action, "Cannot decode action output: {}", err);
                        Response::error(err.to_string())
                    }
                };
                reply.send(response);
            }),
        };

        self.submit(request.on_failure(on_failure));
    }
}

/// Listener of one request, shared by its success and failure hooks.
///
/// The request runs at most one hook, so `send` delivers at most once.
struct Reply<T> {
    marshaler: Marshaler,
    listener: Arc<Mutex<Option<Listener<T>>>>,
}

impl<T: Send + 'static> Reply<T> {
    fn new(marshaler: Marshaler, listener: Option<Listener<T>>) -> Self {
        Self {
            marshaler,
            listener: Arc::new(Mutex::new(listener)),
        }
    }

    fn send(&self, response: Response<T>) {
        let listener = self.listener.lock().take();
        notify_with(&self.marshaler, listener, response);
    }
}

impl<T> Clone for Reply<T> {
    fn clone(&self) -> Self {
        Self {
            marshaler: self.marshaler.clone(),
            listener: Arc::clone(&self.listener),
        }
    }
}

fn notify_with<T: Send + 'static>(
    marshaler: &Marshaler,
    listener: Option<Listener<T>>,
    response: Response<T>,
) {
    if let Some(listener) = listener {
        marshaler.deliver(move || listener(response));
    }
}

impl std::fmt::Debug for ServiceExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceExecutor")
            .field("service", &self.service)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
