use actix_web::http::header::{self, HeaderMap};
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};

use serde::{Deserialize, Serialize};

use crate::domain::SubscriptionToken;
use crate::error::{RestError, RestResult};
use crate::repo::{NewSubscription, SubscriptionStore};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Normalized subscription request, whichever body encoding the client used
#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SubscribeRequest {
    email: String,
    city: String,
    frequency: String,
}

impl SubscribeRequest {
    /// Read the request from form fields when the body is a form carrying an email, otherwise from JSON
    pub fn negotiate(headers: &HeaderMap, body: &[u8]) -> Result<Self, String> {
        if is_form(headers) {
            let form = Self::from_form(body);
            if !form.email.is_empty() {
                return Ok(form);
            }
        }

        serde_json::from_slice(body).map_err(|e| e.to_string())
    }

    fn from_form(body: &[u8]) -> Self {
        let (mut email, mut city, mut frequency) = (None, None, None);
        for (key, value) in url::form_urlencoded::parse(body) {
            let field = match &*key {
                "email" => &mut email,
                "city" => &mut city,
                "frequency" => &mut frequency,
                _ => continue,
            };
            // First occurrence wins for repeated keys, even when empty
            if field.is_none() {
                *field = Some(value.into_owned());
            }
        }

        Self {
            email: email.unwrap_or_default(),
            city: city.unwrap_or_default(),
            frequency: frequency.unwrap_or_default(),
        }
    }
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
        .unwrap_or(false)
}

impl TryInto<NewSubscription> for SubscribeRequest {
    type Error = String;

    fn try_into(self) -> Result<NewSubscription, Self::Error> {
        if self.email.is_empty() || self.city.is_empty() || self.frequency.is_empty() {
            return Err("Invalid input".into());
        }
        let frequency = self.frequency.parse()?;

        Ok(NewSubscription {
            email: self.email,
            city: self.city,
            frequency,
        })
    }
}

#[derive(Debug, Serialize)]
struct SubscribeResponse {
    message: &'static str,
    token: String,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: &'static str,
}

/// Create endpoint for new subscriptions
#[tracing::instrument(name = "Create a new subscription", skip(req, body, store))]
#[post("/subscribe")]
async fn subscribe(
    req: HttpRequest,
    body: web::Bytes,
    store: web::Data<dyn SubscriptionStore>,
) -> RestResult<impl Responder> {
    let new_subscription: NewSubscription = SubscribeRequest::negotiate(req.headers(), &body)
        .map_err(|e| {
            tracing::warn!("Failed to decode subscription request: {}", e);
            RestError::InvalidInput("Invalid input".into())
        })?
        .try_into()
        .map_err(RestError::InvalidInput)?;

    // Check and insert are separate statements, concurrent duplicates can both pass
    let exists = store
        .exists(&new_subscription.email, &new_subscription.city)
        .await
        .map_err(|e| {
            tracing::error!("Failed to check existing subscription: {:?}", e);
            RestError::InternalError("failed to check existing subscription".into())
        })?;
    if exists {
        return Err(RestError::Conflict("Email already subscribed".into()));
    }

    let token = store.insert(&new_subscription).await.map_err(|e| {
        tracing::error!("Failed to save subscription: {:?}", e);
        RestError::InternalError("failed to save subscription".into())
    })?;

    Ok(HttpResponse::Ok().json(SubscribeResponse {
        message: "Subscription successful. Confirmation email sent.",
        token: token.to_string(),
    }))
}

/// Subscription confirmation endpoint
#[tracing::instrument(name = "Confirm a subscription by token", skip(store))]
#[get("/confirm/{token}")]
async fn confirm(
    store: web::Data<dyn SubscriptionStore>,
    path: web::Path<(String,)>,
) -> RestResult<impl Responder> {
    let token = parse_token(path)?;

    let affected = store.confirm(&token).await.map_err(|e| {
        tracing::error!("Failed to confirm subscription: {:?}", e);
        RestError::InternalError("failed to confirm subscription".into())
    })?;
    if affected == 0 {
        return Err(RestError::NotFound("Token not found".into()));
    }

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Subscription confirmed successfully",
    }))
}

/// Unsubscribe endpoint
#[tracing::instrument(name = "Unsubscribe by token", skip(store))]
#[get("/unsubscribe/{token}")]
async fn unsubscribe(
    store: web::Data<dyn SubscriptionStore>,
    path: web::Path<(String,)>,
) -> RestResult<impl Responder> {
    let token = parse_token(path)?;

    let affected = store.delete(&token).await.map_err(|e| {
        tracing::error!("Failed to unsubscribe: {:?}", e);
        RestError::InternalError("failed to unsubscribe".into())
    })?;
    if affected == 0 {
        return Err(RestError::NotFound("Token not found".into()));
    }

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Unsubscribed successfully",
    }))
}

fn parse_token(path: web::Path<(String,)>) -> RestResult<SubscriptionToken> {
    let (token_str,) = path.into_inner();

    token_str
        .parse()
        .map_err(|_| RestError::InvalidInput("Invalid token".into()))
}

/// Register subscription API endpoints
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(subscribe)
        .service(confirm)
        .service(unsubscribe);
}
