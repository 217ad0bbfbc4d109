use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::sdk::pairs::PairId;

// ORS reports these codes for snapping failures and unreachable destinations.
pub const ORS_CODE_NO_ROUTE: u32 = 2009;
pub const ORS_CODE_UNROUTABLE_POINT: u32 = 2010;

// Helper structs to parse the JSON error response from ORS
#[derive(Deserialize, Debug)]
pub struct OrsErrorDetail {
    pub code: u32,
    pub message: String,
}
#[derive(Deserialize, Debug)]
pub struct OrsErrorPayload {
    pub error: OrsErrorDetail,
}

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("Routing service rejected the credential: {0}")]
    Unauthorized(String),

    #[error("Routing service quota exceeded: {0}")]
    RateLimited(String),

    #[error("No route found: {0}")]
    NoRoute(String),

    #[error("A point was not routable on the road network: {0}")]
    UnroutablePoint(String),

    #[error("Request timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    #[error("API Error (Code {code}): {message}")]
    ApiError { code: u32, message: String },

    // A fallback for when we get an error that isn't in the expected JSON format
    #[error("Unstructured API Error (HTTP {status}): {body}")]
    RawApiError { status: u16, body: String },

    #[error("Underlying request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Malformed route response: {0}")]
    MalformedResponse(String),
}

impl RoutingError {
    /// Maps a non-success directions response onto a routing error.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let structured = serde_json::from_str::<OrsErrorPayload>(body).ok();
        let message = structured
            .as_ref()
            .map_or_else(|| body.trim().to_string(), |p| p.error.message.clone());

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized(message),
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited(message),
            _ => match structured {
                Some(p) if p.error.code == ORS_CODE_UNROUTABLE_POINT => {
                    Self::UnroutablePoint(p.error.message)
                }
                Some(p) if p.error.code == ORS_CODE_NO_ROUTE => Self::NoRoute(p.error.message),
                Some(p) => Self::ApiError {
                    code: p.error.code,
                    message: p.error.message,
                },
                None => Self::RawApiError {
                    status: status.as_u16(),
                    body: message,
                },
            },
        }
    }

    pub fn from_transport(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout { timeout_secs }
        } else {
            Self::RequestError(err)
        }
    }
}

/// A routing failure attributed to one pair. Never aborts a batch.
#[derive(Error, Debug)]
#[error("Routing failed for {pair}: {cause}")]
pub struct RouteError {
    pub pair: PairId,
    #[source]
    pub cause: RoutingError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_unroutable_point() {
        let body = r#"{"error":{"code":2010,"message":"Could not find routable point within a radius of 350.0 meters"},"info":{}}"#;
        let err = RoutingError::from_response(StatusCode::NOT_FOUND, body);
        assert!(matches!(err, RoutingError::UnroutablePoint(ref m) if m.contains("350.0")));
    }

    #[test]
    fn test_structured_no_route() {
        let body = r#"{"error":{"code":2009,"message":"Route could not be found"}}"#;
        let err = RoutingError::from_response(StatusCode::NOT_FOUND, body);
        assert!(matches!(err, RoutingError::NoRoute(_)));
    }

    #[test]
    fn test_other_structured_error_keeps_code() {
        let body = r#"{"error":{"code":2004,"message":"Request parameters exceed the server configuration limits."}}"#;
        let err = RoutingError::from_response(StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, RoutingError::ApiError { code: 2004, .. }));
        assert!(err.to_string().contains("2004"));
    }

    #[test]
    fn test_auth_and_quota_statuses() {
        let body = r#"{"error": "Access to this API has been disallowed"}"#;
        let err = RoutingError::from_response(StatusCode::FORBIDDEN, body);
        assert!(matches!(err, RoutingError::Unauthorized(ref m) if m.contains("disallowed")));

        let err = RoutingError::from_response(StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded");
        assert!(matches!(err, RoutingError::RateLimited(_)));
    }

    #[test]
    fn test_unparseable_body_falls_back_to_raw() {
        let err = RoutingError::from_response(StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert!(matches!(err, RoutingError::RawApiError { status: 502, .. }));
    }

    #[test]
    fn test_route_error_names_pair() {
        let err = RouteError {
            pair: PairId {
                index: 1,
                label: "Pair 2".to_string(),
            },
            cause: RoutingError::NoRoute("Route could not be found".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Routing failed for Pair 2: No route found: Route could not be found"
        );
    }
}
