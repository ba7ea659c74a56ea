//! Request extractors that report failures as [`TrackerError`].

use std::str::FromStr;

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use crate::error::TrackerError;

/// JSON body extractor whose rejection is [`TrackerError::InvalidInput`]
/// rendered in the standard error envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = TrackerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(TrackerError::InvalidInput(rejection.body_text())),
        }
    }
}

/// Parses a raw identifier, naming `what` in the error message.
///
/// # Errors
///
/// Returns [`TrackerError::InvalidInput`] if `raw` does not parse.
pub fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, TrackerError> {
    if raw.trim().is_empty() {
        return Err(TrackerError::InvalidInput(format!("{what} required")));
    }
    raw.parse()
        .map_err(|_| TrackerError::InvalidInput(format!("invalid {what}: {raw}")))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::ExecutionId;

    #[test]
    fn parse_id_reports_field() {
        let result = parse_id::<ExecutionId>("xyz", "execution ID");
        let Err(TrackerError::InvalidInput(message)) = result else {
            panic!("expected invalid input");
        };
        assert_eq!(message, "invalid execution ID: xyz");
    }

    #[test]
    fn parse_id_requires_value() {
        let result = parse_id::<ExecutionId>("", "tourId");
        assert!(matches!(result, Err(TrackerError::InvalidInput(m)) if m == "tourId required"));
    }
}
