use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use std::future::{ready, Future, Ready};
use std::pin::Pin;
use std::rc::Rc;

use super::jwt::{JwtUtils, TokenVerifyResult};
use crate::model::auth::Actor;
use crate::model::global_error::{AppError, ErrorCode};

/// Resolves the bearer token into an [`Actor`] request extension; anonymous
/// requests never reach the wrapped handlers.
pub struct AuthMiddleware {
    jwt: Rc<JwtUtils>,
}

impl AuthMiddleware {
    pub fn new(jwt: JwtUtils) -> Self {
        Self { jwt: Rc::new(jwt) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service, jwt: Rc::clone(&self.jwt) }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt: Rc<JwtUtils>,
}

impl<S> AuthMiddlewareService<S> {
    fn resolve_actor(&self, req: &ServiceRequest) -> Result<Actor, AppError> {
        let header = req
            .headers()
            .get("Authorization")
            .ok_or_else(|| AppError::new(ErrorCode::AuthenticationRequired))?;
        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::new(ErrorCode::InvalidAuthToken))?;

        match self.jwt.verify_token(token) {
            TokenVerifyResult::Valid(claims) => Actor::try_from(&claims),
            TokenVerifyResult::Expired => Err(AppError::new(ErrorCode::ExpiredAuthToken)),
            TokenVerifyResult::Invalid => Err(AppError::new(ErrorCode::InvalidAuthToken)),
        }
    }
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match self.resolve_actor(&req) {
            Ok(actor) => {
                req.extensions_mut().insert(actor);
                let fut = self.service.call(req);
                Box::pin(fut)
            }
            Err(err) => Box::pin(async move { Err(err.into()) }),
        }
    }
}
