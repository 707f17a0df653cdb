//! Boundary with the control channel that performs the remote invocations.
//!
//! The channel receives one-shot [`ActionRequest`]s and completes each of
//! them exactly once, from any thread. Completion methods take the request
//! by value, so a request cannot be completed twice.

use std::fmt;

use crate::errors::ControlError;
use crate::service::ServiceHandle;
use crate::subscription::SubscriptionRequest;

/// Executes action and subscription requests asynchronously.
pub trait ControlChannel: Send + Sync {
    /// Runs `request` and later calls exactly one of its completion methods.
    fn execute(&self, request: ActionRequest);

    /// Registers a subscription; its lifetime is managed by the channel.
    fn subscribe(&self, request: SubscriptionRequest);
}

/// Ordered input arguments of an action.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionArguments {
    values: Vec<(String, String)>,
}

impl ActionArguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.push((name.into(), value.into()));
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Output arguments returned by a remote action, in response order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionOutput {
    values: Vec<(String, String)>,
}

impl ActionOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets `name`, replacing a previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value of a mandatory output argument.
    pub fn require(&self, name: &str) -> Result<&str, ControlError> {
        self.get(name)
            .ok_or_else(|| ControlError::missing_output_argument(name))
    }

    /// Optional argument, `None` when absent or blank.
    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }

    pub fn parse_u16(&self, name: &str) -> Result<u16, ControlError> {
        let text = self.require(name)?.trim();
        text.parse::<u16>()
            .map_err(|_| ControlError::invalid_output_argument(name, text))
    }

    pub fn parse_u32(&self, name: &str) -> Result<u32, ControlError> {
        let text = self.require(name)?.trim();
        text.parse::<u32>()
            .map_err(|_| ControlError::invalid_output_argument(name, text))
    }

    /// UPnP boolean: `1`/`0`, `true`/`false`, `yes`/`no`.
    pub fn parse_bool(&self, name: &str) -> Result<bool, ControlError> {
        let text = self.require(name)?.trim();
        match text.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(ControlError::invalid_output_argument(name, text)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for ActionOutput {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut output = ActionOutput::new();
        for (name, value) in iter {
            output.insert(name, value);
        }
        output
    }
}

type SuccessHook = Box<dyn FnOnce() + Send + 'static>;
type ResultHook = Box<dyn FnOnce(ActionOutput) + Send + 'static>;
type FailureHook = Box<dyn FnOnce(Option<String>) + Send + 'static>;

/// One-shot invocation of a named action on a service.
///
/// Built per call with its arguments and up to three hooks. The channel
/// finishes it with [`succeed`](Self::succeed), [`receive`](Self::receive)
/// or [`fail`](Self::fail).
pub struct ActionRequest {
    service: ServiceHandle,
    action: String,
    arguments: ActionArguments,
    on_success: Option<SuccessHook>,
    on_result: Option<ResultHook>,
    on_failure: Option<FailureHook>,
}

impl ActionRequest {
    pub fn new(service: ServiceHandle, action: impl Into<String>) -> Self {
        Self {
            service,
            action: action.into(),
            arguments: ActionArguments::new(),
            on_success: None,
            on_result: None,
            on_failure: None,
        }
    }

    pub fn argument(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.push(name, value);
        self
    }

    pub fn with_arguments(mut self, arguments: ActionArguments) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn on_success<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_success = Some(Box::new(hook));
        self
    }

    pub fn on_result<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(ActionOutput) + Send + 'static,
    {
        self.on_result = Some(Box::new(hook));
        self
    }

    pub fn on_failure<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(Option<String>) + Send + 'static,
    {
        self.on_failure = Some(Box::new(hook));
        self
    }

    pub fn service(&self) -> &ServiceHandle {
        &self.service
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn arguments(&self) -> &ActionArguments {
        &self.arguments
    }

    /// True if the caller waits for output arguments.
    pub fn expects_result(&self) -> bool {
        self.on_result.is_some()
    }

    /// The action completed without output.
    ///
    /// A request waiting for a result receives an empty output instead.
    pub fn succeed(self) {
        if let Some(hook) = self.on_success {
            hook();
        } else if let Some(hook) = self.on_result {
            hook(ActionOutput::new());
        }
    }

    /// The action completed with output arguments.
    ///
    /// A request without a result hook treats this as plain success.
    pub fn receive(self, output: ActionOutput) {
        if let Some(hook) = self.on_result {
            hook(output);
        } else if let Some(hook) = self.on_success {
            hook();
        }
    }

    /// The action failed, with an optional protocol message.
    pub fn fail(self, message: Option<String>) {
        if let Some(hook) = self.on_failure {
            hook(message);
        }
    }
}

impl fmt::Debug for ActionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRequest")
            .field("service", &self.service.service_type())
            .field("action", &self.action)
            .field("arguments", &self.arguments)
            .field("expects_result", &self.expects_result())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::StaticService;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn service() -> ServiceHandle {
        StaticService::avtransport(["Play"]).into_handle()
    }

    #[test]
    fn arguments_keep_insertion_order() {
        let request = ActionRequest::new(service(), "Play")
            .argument("InstanceID", "0")
            .argument("Speed", "1");

        let args: Vec<_> = request.arguments().iter().collect();
        assert_eq!(args, vec![("InstanceID", "0"), ("Speed", "1")]);
        assert_eq!(request.arguments().get("Speed"), Some("1"));
        assert_eq!(request.action(), "Play");
    }

    #[test]
    fn receive_without_result_hook_is_a_success() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        ActionRequest::new(service(), "Play")
            .on_success(move || {
                h.fetch_add(1, Ordering::SeqCst);
            })
            .receive(ActionOutput::new().with("Ignored", "x"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn succeed_with_result_hook_passes_empty_output() {
        let seen = Arc::new(parking_lot::Mutex::new(None));
        let s = seen.clone();
        let request = ActionRequest::new(service(), "GetVolume")
            .on_result(move |out| *s.lock() = Some(out));
        assert!(request.expects_result());
        request.succeed();
        assert_eq!(*seen.lock(), Some(ActionOutput::new()));
    }

    #[test]
    fn fail_passes_the_message() {
        let seen = Arc::new(parking_lot::Mutex::new(None));
        let s = seen.clone();
        ActionRequest::new(service(), "Play")
            .on_failure(move |msg| *s.lock() = Some(msg))
            .fail(Some("701 Transition not available".into()));
        assert_eq!(
            *seen.lock(),
            Some(Some("701 Transition not available".to_string()))
        );
    }

    #[test]
    fn output_parsers_report_field_and_value() {
        let output: ActionOutput = [("CurrentVolume", " 42 "), ("CurrentMute", "true")]
            .into_iter()
            .collect();

        assert_eq!(output.parse_u16("CurrentVolume"), Ok(42));
        assert_eq!(output.parse_bool("CurrentMute"), Ok(true));
        assert_eq!(
            output.parse_u16("Missing"),
            Err(ControlError::missing_output_argument("Missing"))
        );
        assert_eq!(
            output.clone().with("CurrentVolume", "-1").parse_u16("CurrentVolume"),
            Err(ControlError::invalid_output_argument("CurrentVolume", "-1"))
        );
        assert!(output.with("CurrentMute", "maybe").parse_bool("CurrentMute").is_err());
    }
}
