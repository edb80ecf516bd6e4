//! Acting-user extractor.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use dynafield_core::types::{DbId, SYSTEM_USER_ID};

/// Header carrying the id of the user performing a change.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The user recorded in `created_by` / `updated_by` audit columns.
///
/// Read from the `x-user-id` header; a missing or non-numeric header falls
/// back to the system user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActingUser {
    pub user_id: DbId,
}

impl ActingUser {
    fn from_parts(parts: &Parts) -> Self {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<DbId>().ok())
            .filter(|id| *id > 0)
            .unwrap_or(SYSTEM_USER_ID);
        Self { user_id }
    }
}

impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn reads_numeric_header() {
        assert_eq!(ActingUser::from_parts(&parts(Some("42"))).user_id, 42);
    }

    #[test]
    fn missing_or_invalid_header_is_system_user() {
        assert_eq!(ActingUser::from_parts(&parts(None)).user_id, SYSTEM_USER_ID);
        assert_eq!(ActingUser::from_parts(&parts(Some("abc"))).user_id, SYSTEM_USER_ID);
        assert_eq!(ActingUser::from_parts(&parts(Some("-3"))).user_id, SYSTEM_USER_ID);
    }
}
