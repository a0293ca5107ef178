/// HTTP middleware for forum-service
///
/// Bearer-token authentication: the middleware validates the Authorization
/// header when one is present and stores the caller identity in request
/// extensions. Requests without a header pass through anonymously — read
/// endpoints are public — and each handler states its own requirement
/// through the [`AuthenticatedUser`] / [`MaybeUser`] extractors.
use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use uuid::Uuid;

use crate::error::AppError;
use crate::security::jwt;

/// Caller identity extracted from a validated JWT.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub display_name: String,
}

/// Caller identity when authentication is optional.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthenticatedUser>);

impl MaybeUser {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|u| u.id)
    }
}

/// JWT authentication middleware factory
pub struct JwtAuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
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

        Box::pin(async move {
            // Extract the header to an owned value before any mutable
            // access to the request extensions.
            let auth_header = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .map(|h| h.to_string());

            if let Some(auth_header) = auth_header {
                let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
                    Error::from(AppError::Unauthorized(
                        "invalid Authorization scheme, expected Bearer".into(),
                    ))
                })?;

                let token_data = jwt::validate_token(token)?;
                let user_id = Uuid::parse_str(&token_data.claims.sub).map_err(|_| {
                    Error::from(AppError::Unauthorized("invalid user id in token".into()))
                })?;
                // Display name is presentation data; fall back to the
                // subject when the identity provider omits it.
                let display_name = token_data
                    .claims
                    .name
                    .unwrap_or_else(|| token_data.claims.sub.clone());

                req.extensions_mut().insert(AuthenticatedUser {
                    id: user_id,
                    display_name,
                });
            }

            service.call(req).await
        })
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>().cloned() {
            Some(user) => ready(Ok(user)),
            None => ready(Err(Error::from(AppError::Unauthorized(
                "authentication required".into(),
            )))),
        }
    }
}

impl FromRequest for MaybeUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(MaybeUser(
            req.extensions().get::<AuthenticatedUser>().cloned(),
        )))
    }
}
