//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers must never block the worker thread. Database and broker calls are all async, so a handler that is
//! waiting on the publisher does not stop the worker from serving other requests.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use payment_queue::WebhookPublisher;
use ticket_payment_engine::{webhook_objects::WebhookMessage, PaymentFlowApi, PaymentGatewayDatabase, WebhookDisposition};

use crate::{data_objects::JsonResponse, errors::ServerError};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Payment webhook  ----------------------------------------------------
route!(payment_webhook => Post "/payment" impl PaymentGatewayDatabase);
/// Route handler for payment provider webhooks.
///
/// The signature has already been checked by the time this handler runs (see
/// [`SignatureMiddlewareFactory`](crate::middleware::SignatureMiddlewareFactory)). The body must be a JSON object
/// with `order_id`, `payment_id` and a `status` of `PAID` or `FAILED`.
///
/// The webhook is checked against our records and then handed to the queue. A `200` response means that the webhook
/// has been accepted for processing, not that it has been processed. Webhooks for payments that already reached a
/// terminal state are acknowledged with `200` without being enqueued again.
///
/// Errors:
/// * `400` if the body cannot be read, or the order does not match the one on record for the payment.
/// * `404` if the payment is unknown.
/// * `500` if the webhook could not be enqueued. The provider is expected to retry.
pub async fn payment_webhook<B>(
    body: web::Bytes,
    api: web::Data<PaymentFlowApi<B>>,
    publisher: web::Data<WebhookPublisher<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
{
    let message = WebhookMessage::from_bytes(body.as_ref()).map_err(|e| {
        debug!("💻️ Could not read webhook body. {e}");
        ServerError::InvalidRequestBody(e.to_string())
    })?;
    trace!("💻️ Received payment webhook {message}");
    match api.check_webhook(&message).await? {
        WebhookDisposition::AlreadyProcessed(status) => {
            info!("💻️ Payment {} is already {status}. Not enqueueing {message}", message.payment_id());
            Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Payment already processed ({status})."))))
        },
        WebhookDisposition::Enqueue => {
            publisher.publish(&message).await.map_err(|e| {
                error!("💻️ Could not enqueue webhook {message}. {e}");
                ServerError::from(e)
            })?;
            info!("💻️ Webhook {message} accepted");
            Ok(HttpResponse::Ok().json(JsonResponse::success("Webhook accepted.")))
        },
    }
}
