//! Classification of ParseHub HTTP status codes.
//!
//! ParseHub answers 400 for malformed requests and 401/403 for a bad API
//! key. Those three get distinct, descriptive error kinds; every other
//! non-2xx code is a generic failure.

/// Coarse outcome of an HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    BadRequest,
    Unauthorized,
    Forbidden,
    Failure,
}

pub const BAD_REQUEST_MESSAGE: &str = "Bad request. Not able to get data from ParseHub.";

pub const UNAUTHORIZED_MESSAGE: &str =
    "Unauthorized access. Not able to get data from ParseHub. Please check api key.";

pub const FORBIDDEN_MESSAGE: &str =
    "Forbidden. Not able to get data from ParseHub. Please check api key.";

/// Classify a raw HTTP status code.
pub fn classify(status: u16) -> StatusClass {
    match status {
        200..=299 => StatusClass::Success,
        400 => StatusClass::BadRequest,
        401 => StatusClass::Unauthorized,
        403 => StatusClass::Forbidden,
        _ => StatusClass::Failure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range() {
        assert_eq!(classify(200), StatusClass::Success);
        assert_eq!(classify(204), StatusClass::Success);
        assert_eq!(classify(299), StatusClass::Success);
    }

    #[test]
    fn auth_and_request_codes_are_distinct() {
        assert_eq!(classify(400), StatusClass::BadRequest);
        assert_eq!(classify(401), StatusClass::Unauthorized);
        assert_eq!(classify(403), StatusClass::Forbidden);
    }

    #[test]
    fn everything_else_is_generic_failure() {
        for code in [301, 404, 409, 429, 500, 502, 503] {
            assert_eq!(classify(code), StatusClass::Failure, "code {code}");
        }
    }
}
