/// HTTP middleware utilities for the blog service
///
/// - Identity extraction from HS256 bearer tokens (`Identity`,
///   `AuthenticatedUser`, `StaffUser` extractors)
/// - Ownership / authentication policies (`permissions`)
/// - Request metrics logging
pub mod permissions;

pub use permissions::*;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::rc::Rc;
use std::time::Instant;
use uuid::Uuid;

use crate::error::AppError;
use crate::metrics::HTTP_REQUESTS_TOTAL;
use crate::models::UserId;

// =====================================================================
// Identity
// =====================================================================

/// The acting identity of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    User { id: UserId, is_staff: bool },
}

impl Identity {
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Identity::Anonymous => None,
            Identity::User { id, .. } => Some(*id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::User { .. })
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Identity::User { is_staff: true, .. })
    }
}

/// Claims accepted in bearer tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id (UUID)
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
    #[serde(default)]
    pub is_staff: bool,
}

/// Validates bearer tokens issued by the authentication service.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Identity, AppError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::warn!("JWT validation failed: {}", e);
            AppError::Unauthenticated("Invalid or expired token".to_string())
        })?;

        let id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| AppError::Unauthenticated("Invalid token: malformed user id".to_string()))?;

        Ok(Identity::User {
            id: UserId(id),
            is_staff: data.claims.is_staff,
        })
    }

    /// No header means anonymous; a header that fails validation is rejected.
    fn identify(&self, req: &HttpRequest) -> Result<Identity, AppError> {
        let Some(header) = req.headers().get("Authorization") else {
            return Ok(Identity::Anonymous);
        };

        let header = header
            .to_str()
            .map_err(|_| AppError::Unauthenticated("Invalid Authorization header".to_string()))?;
        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Unauthenticated("Invalid Authorization scheme".to_string())
        })?;

        self.verify(token.trim())
    }
}

fn identity_of(req: &HttpRequest) -> Result<Identity, Error> {
    match req.app_data::<web::Data<TokenVerifier>>() {
        Some(verifier) => verifier.identify(req).map_err(Error::from),
        None => Err(AppError::Config("token verifier not configured".to_string()).into()),
    }
}

impl FromRequest for Identity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(identity_of(req))
    }
}

/// A signed-in identity; anonymous requests are rejected with 401.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub UserId);

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let result = identity_of(req).and_then(|identity| match identity.user_id() {
            Some(id) => Ok(AuthenticatedUser(id)),
            None => Err(AppError::Unauthenticated("Login required".to_string()).into()),
        });
        ready(result)
    }
}

/// A signed-in staff identity, for administrative operations.
#[derive(Debug, Clone, Copy)]
pub struct StaffUser(pub UserId);

impl FromRequest for StaffUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let result = identity_of(req).and_then(|identity| match identity {
            Identity::User { id, is_staff: true } => Ok(StaffUser(id)),
            Identity::User { .. } => {
                Err(AppError::Forbidden("Staff access required".to_string()).into())
            }
            Identity::Anonymous => {
                Err(AppError::Unauthenticated("Login required".to_string()).into())
            }
        });
        ready(result)
    }
}

// =====================================================================
// Metrics middleware
// =====================================================================

pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let path = req
            .match_pattern()
            .unwrap_or_else(|| "unmatched".to_string());
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let res = service.call(req).await;
            let elapsed = start.elapsed().as_millis();
            let status = match &res {
                Ok(response) => response.status().as_u16().to_string(),
                Err(err) => err.as_response_error().status_code().as_u16().to_string(),
            };
            HTTP_REQUESTS_TOTAL
                .with_label_values(&[method.as_str(), path.as_str(), status.as_str()])
                .inc();
            tracing::debug!(%method, %path, %status, %elapsed, "request completed");
            res
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn token(sub: &str, is_staff: bool, exp_offset: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: sub.to_string(),
            exp: now + exp_offset,
            iat: now,
            is_staff,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn missing_header_is_anonymous() {
        let verifier = TokenVerifier::new(SECRET);
        let req = TestRequest::default().to_http_request();
        assert_eq!(verifier.identify(&req).unwrap(), Identity::Anonymous);
    }

    #[test]
    fn valid_token_yields_user() {
        let verifier = TokenVerifier::new(SECRET);
        let id = Uuid::new_v4();
        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {}", token(&id.to_string(), true, 600))))
            .to_http_request();

        assert_eq!(
            verifier.identify(&req).unwrap(),
            Identity::User {
                id: UserId(id),
                is_staff: true
            }
        );
    }

    #[test]
    fn expired_token_is_rejected() {
        let verifier = TokenVerifier::new(SECRET);
        let id = Uuid::new_v4().to_string();
        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {}", token(&id, false, -3600))))
            .to_http_request();

        assert!(matches!(
            verifier.identify(&req),
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[test]
    fn wrong_scheme_is_rejected() {
        let verifier = TokenVerifier::new(SECRET);
        let req = TestRequest::default()
            .insert_header(("Authorization", "Basic dXNlcjpwYXNz"))
            .to_http_request();

        assert!(verifier.identify(&req).is_err());
    }
}
