//! Uniform response envelope handed to every caller listener.

use std::fmt;

/// Callback receiving exactly one [`Response`].
///
/// Operations take `Option<Listener<T>>`; `None` means fire-and-forget.
pub type Listener<T> = Box<dyn FnOnce(Response<T>) + Send + 'static>;

/// Boxes a closure as a [`Listener`].
pub fn listener<T, F>(f: F) -> Option<Listener<T>>
where
    F: FnOnce(Response<T>) + Send + 'static,
{
    Some(Box::new(f))
}

#[derive(Clone, PartialEq, Eq)]
enum Outcome<T> {
    Data(Option<T>),
    Error(String),
}

/// Result of one remote action: either data (possibly absent for
/// void-result actions) or an error message, never both.
#[derive(Clone, PartialEq, Eq)]
pub struct Response<T> {
    outcome: Outcome<T>,
}

impl<T> Response<T> {
    pub fn data(value: T) -> Self {
        Self {
            outcome: Outcome::Data(Some(value)),
        }
    }

    /// Successful response carrying no value.
    pub fn empty() -> Self {
        Self {
            outcome: Outcome::Data(None),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Error(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Data(_))
    }

    /// Returns the data slot. `None` for errors and for empty successes.
    pub fn get(&self) -> Option<&T> {
        match &self.outcome {
            Outcome::Data(data) => data.as_ref(),
            Outcome::Error(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Data(_) => None,
            Outcome::Error(message) => Some(message),
        }
    }

    pub fn into_result(self) -> Result<Option<T>, String> {
        match self.outcome {
            Outcome::Data(data) => Ok(data),
            Outcome::Error(message) => Err(message),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Response<U> {
        match self.outcome {
            Outcome::Data(data) => Response {
                outcome: Outcome::Data(data.map(f)),
            },
            Outcome::Error(message) => Response::error(message),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Response<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (data, error) = match &self.outcome {
            Outcome::Data(data) => (data.as_ref(), None),
            Outcome::Error(message) => (None, Some(message)),
        };
        f.debug_struct("Response")
            .field("data", &data)
            .field("error", &error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_and_error_are_exclusive() {
        let ok = Response::data(40u16);
        assert!(ok.is_success());
        assert_eq!(ok.get(), Some(&40));
        assert_eq!(ok.error_message(), None);

        let err: Response<u16> = Response::error("setVolume failed.");
        assert!(!err.is_success());
        assert_eq!(err.get(), None);
        assert_eq!(err.error_message(), Some("setVolume failed."));
    }

    #[test]
    fn empty_success_has_neither_slot() {
        let empty: Response<String> = Response::empty();
        assert!(empty.is_success());
        assert_eq!(empty.get(), None);
        assert_eq!(empty.into_result(), Ok(None));
    }

    #[test]
    fn map_keeps_errors() {
        let err: Response<u16> = Response::error("boom");
        assert_eq!(err.map(u32::from).into_result(), Err("boom".to_string()));
        assert_eq!(
            Response::data(3u16).map(u32::from).into_result(),
            Ok(Some(3u32))
        );
    }

    #[test]
    fn debug_shows_both_slots() {
        let text = format!("{:?}", Response::data("Play"));
        assert_eq!(text, r#"Response { data: Some("Play"), error: None }"#);
    }
}
