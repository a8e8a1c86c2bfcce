use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};

pub const EMAIL_HEADER: &str = "email";

/// Caller identity taken from the `EMAIL` header, normalized the same way
/// registration stores it (trimmed, lowercase).
pub struct CallerEmail(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for CallerEmail
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let email = parts
            .headers
            .get(EMAIL_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or((StatusCode::BAD_REQUEST, "missing EMAIL header".into()))?;

        Ok(CallerEmail(email.to_lowercase()))
    }
}
