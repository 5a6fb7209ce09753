use actix_web::dev::ServiceRequest;
use actix_web::web;
use log::warn;

use crate::error::ApiError;
use crate::state::AppState;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Plain equality against the shared secret. Missing and wrong keys are
/// indistinguishable to the caller, and no key configured means no access.
pub fn check_api_key(expected: Option<&str>, presented: Option<&str>) -> Result<(), ApiError> {
    match (expected, presented) {
        (Some(expected), Some(presented)) if presented == expected => Ok(()),
        _ => Err(ApiError::Unauthorized),
    }
}

/// Gate for the protected scope; runs before path and body extraction.
pub fn authorize(req: &ServiceRequest) -> Result<(), ApiError> {
    let expected = req
        .app_data::<web::Data<AppState>>()
        .and_then(|state| state.api_key.as_deref());
    let presented = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    check_api_key(expected, presented).inspect_err(|_| {
        warn!(
            "Rejected {} {}: invalid or missing API key",
            req.method(),
            req.path()
        );
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_passes() {
        assert!(check_api_key(Some("mysecureapikey123"), Some("mysecureapikey123")).is_ok());
    }

    #[test]
    fn missing_wrong_and_unset_are_rejected() {
        assert!(matches!(
            check_api_key(Some("secret"), None),
            Err(ApiError::Unauthorized)
        ));
        assert!(matches!(
            check_api_key(Some("secret"), Some("Secret")),
            Err(ApiError::Unauthorized)
        ));
        assert!(matches!(check_api_key(None, None), Err(ApiError::Unauthorized)));
        assert!(matches!(
            check_api_key(None, Some("anything")),
            Err(ApiError::Unauthorized)
        ));
    }
}
