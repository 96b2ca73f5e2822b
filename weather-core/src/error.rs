//! Errors surfaced across the weather client boundary.

use thiserror::Error;

/// Status reported for a missing credential, mirroring an HTTP "bad request".
pub const MISSING_CREDENTIAL_STATUS: u16 = 400;

/// Status reported when the request never produced an HTTP response.
pub const TRANSPORT_STATUS: u16 = 0;

pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error. Please check your connection and try again.";

/// Outcome of a single fetch operation.
pub type FetchResult<T> = Result<T, WeatherError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WeatherError {
    /// No API key could be resolved; no request was attempted.
    #[error(
        "Missing API key. Set WEATHER_API_KEY or OPENWEATHER_API_KEY, \
         or run `weather configure`."
    )]
    MissingCredential,

    /// The provider answered with a non-success status.
    #[error("{message}")]
    Provider { status: u16, message: String },

    /// The request could not be completed (DNS, timeout, offline).
    #[error("Network error. Please check your connection and try again.")]
    Transport(String),

    /// The provider answered successfully but the body did not have the expected shape.
    #[error("Unexpected response from weather provider: {0}")]
    Decode(String),
}

impl WeatherError {
    /// Numeric status carried with the failure; `0` marks a transport-level failure.
    pub fn status(&self) -> u16 {
        match self {
            Self::MissingCredential => MISSING_CREDENTIAL_STATUS,
            Self::Provider { status, .. } => *status,
            Self::Transport(_) | Self::Decode(_) => TRANSPORT_STATUS,
        }
    }

    /// Text suitable for showing to the user as-is.
    pub fn user_message(&self) -> String {
        match self {
            Self::Decode(_) => NETWORK_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingCredential)
    }

    pub fn is_transport(&self) -> bool {
        self.status() == TRANSPORT_STATUS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_is_400() {
        let err = WeatherError::MissingCredential;
        assert_eq!(err.status(), 400);
        assert!(err.is_configuration());
        assert!(err.user_message().contains("Missing API key"));
    }

    #[test]
    fn provider_error_keeps_status_and_message() {
        let err = WeatherError::Provider {
            status: 404,
            message: "Error: city not found".into(),
        };
        assert_eq!(err.status(), 404);
        assert_eq!(err.user_message(), "Error: city not found");
        assert!(!err.is_transport());
    }

    #[test]
    fn transport_and_decode_report_status_zero() {
        let transport = WeatherError::Transport("dns failure".into());
        let decode = WeatherError::Decode("missing field `list`".into());

        assert_eq!(transport.status(), 0);
        assert_eq!(decode.status(), 0);
        assert!(transport.is_transport());
        assert_eq!(transport.user_message(), NETWORK_ERROR_MESSAGE);
        assert_eq!(decode.user_message(), NETWORK_ERROR_MESSAGE);
    }
}
