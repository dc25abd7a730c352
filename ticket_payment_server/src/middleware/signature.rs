//! Webhook signature middleware for Actix Web.
//!
//! The payment provider signs the raw body of every webhook with HMAC-SHA256, using the secret shared with us
//! (`TPP_WEBHOOK_SECRET`), and sends the lowercase hex digest in the `x-signature` header.
//!
//! Wrap the webhook routes with this middleware. Requests without a valid signature are rejected with
//! `401 Unauthorized` before the handler sees them. If no secret has been configured at all, every request is refused
//! with `500 Internal Server Error`, since that is a misconfiguration of this server and not the caller's fault.
//!
//! The signature is checked against the exact bytes received. Once verified, the body is put back into the request so
//! that the handler can read it again.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorBadRequest, ErrorInternalServerError, ErrorUnauthorized},
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use log::{error, trace, warn};
use ticket_payment_engine::helpers::verify_signature;
use tpp_common::Secret;

pub const SIGNATURE_HEADER: &str = "x-signature";

pub struct SignatureMiddlewareFactory {
    secret: Secret<String>,
}

impl SignatureMiddlewareFactory {
    pub fn new(secret: Secret<String>) -> Self {
        SignatureMiddlewareFactory { secret }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SignatureMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = SignatureMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SignatureMiddlewareService { secret: self.secret.clone(), service: Rc::new(service) }))
    }
}

pub struct SignatureMiddlewareService<S> {
    secret: Secret<String>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SignatureMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let secret = self.secret.clone();
        Box::pin(async move {
            trace!("🔐️ Checking webhook signature");
            if secret.is_empty() {
                error!("🔐️ TPP_WEBHOOK_SECRET is not configured. Refusing webhook.");
                return Err(ErrorInternalServerError("Webhook secret is not configured."));
            }
            let signature = req
                .headers()
                .get(SIGNATURE_HEADER)
                .ok_or_else(|| {
                    warn!("🔐️ No signature found in webhook request. Denying access.");
                    ErrorUnauthorized("Missing signature.")
                })?
                .to_str()
                .map_err(|_| {
                    warn!("🔐️ Signature header is not readable. Denying access.");
                    ErrorUnauthorized("Invalid signature.")
                })?
                .to_string();
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {e:?}");
                ErrorBadRequest("Failed to extract request data.")
            })?;
            if verify_signature(data.as_ref(), &signature, secret.reveal().as_bytes()) {
                trace!("🔐️ Webhook signature check ✅️");
                req.set_payload(bytes_to_payload(data));
                service.call(req).await
            } else {
                warn!("🔐️ Invalid signature found in webhook request. Denying access.");
                Err(ErrorUnauthorized("Invalid signature."))
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
