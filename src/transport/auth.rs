use http::header::AUTHORIZATION;
use http::header::InvalidHeaderValue;
use http::HeaderMap;
use http::HeaderValue;
#[cfg(test)]
use mockall::automock;

/// Supplies the header set merged into every outgoing request.
#[cfg_attr(test, automock)]
pub trait AuthProvider: Send + Sync + 'static {
    fn auth_headers(&self) -> HeaderMap;
}

/// Default provider: contributes no headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl AuthProvider for NoAuth {
    fn auth_headers(&self) -> HeaderMap {
        HeaderMap::new()
    }
}

/// A fixed header set sent with every request.
#[derive(Debug, Clone, Default)]
pub struct StaticHeaders(pub HeaderMap);

impl AuthProvider for StaticHeaders {
    fn auth_headers(&self) -> HeaderMap {
        self.0.clone()
    }
}

/// `Authorization: Bearer <token>`
#[derive(Debug, Clone)]
pub struct BearerToken {
    value: HeaderValue,
}

impl BearerToken {
    pub fn new(token: &str) -> std::result::Result<Self, InvalidHeaderValue> {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
        value.set_sensitive(true);
        Ok(Self { value })
    }
}

impl AuthProvider for BearerToken {
    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, self.value.clone());
        headers
    }
}

impl<F> AuthProvider for F
where
    F: Fn() -> HeaderMap + Send + Sync + 'static,
{
    fn auth_headers(&self) -> HeaderMap {
        self()
    }
}
