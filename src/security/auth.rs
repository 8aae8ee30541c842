use poem::Request;
use crate::error::AppError;

pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

/// Check the admin token header against the configured token.
///
/// With no token configured every admin request is refused.
pub fn require_admin(req: &Request, expected: Option<&str>) -> Result<(), AppError> {
    let expected = expected.ok_or(AppError::Unauthorized)?;
    let supplied = req.header(ADMIN_TOKEN_HEADER).ok_or(AppError::Unauthorized)?;

    if constant_time_eq(supplied.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use poem::Request;

    #[test]
    fn test_require_admin_success() {
        let req = Request::builder()
            .header(ADMIN_TOKEN_HEADER, "s3cret")
            .finish();

        assert!(require_admin(&req, Some("s3cret")).is_ok());
    }

    #[test]
    fn test_require_admin_missing_header() {
        let req = Request::builder().finish();

        match require_admin(&req, Some("s3cret")).unwrap_err() {
            AppError::Unauthorized => {}
            _ => panic!("Expected Unauthorized error"),
        }
    }

    #[test]
    fn test_require_admin_wrong_token() {
        let req = Request::builder()
            .header(ADMIN_TOKEN_HEADER, "guess")
            .finish();

        assert!(require_admin(&req, Some("s3cret")).is_err());
    }

    #[test]
    fn test_require_admin_without_configured_token() {
        let req = Request::builder()
            .header(ADMIN_TOKEN_HEADER, "anything")
            .finish();

        assert!(require_admin(&req, None).is_err());
    }
}
