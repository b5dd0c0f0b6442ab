//! Opens the per-request context scope.
//!
//! Runs inside [`super::trace_id`] and [`super::optional_user_auth`] so the
//! request id and the actor are known. Everything the handler awaits reads
//! them through [`domain::context`].

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

use domain::context::{self, RequestContext};

use crate::app::AppState;
use crate::middleware::trace_id::get_request_id;
use crate::middleware::user_auth::UserAuth;

/// Builds the [`RequestContext`] for this request and runs the rest of the
/// stack inside it. The negotiated locale is echoed as `Content-Language`.
pub async fn request_context(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ctx = build_context(&req, &state.config.context.default_locale);
    let locale = ctx.locale.clone();

    let mut response = context::scope(ctx, next.run(req)).await;

    if let Ok(value) = HeaderValue::from_str(&locale) {
        response
            .headers_mut()
            .entry(header::CONTENT_LANGUAGE)
            .or_insert(value);
    }
    response
}

fn build_context(req: &Request<Body>, default_locale: &str) -> RequestContext {
    let ctx = match get_request_id(req.extensions()) {
        Some(request_id) => RequestContext::new(request_id),
        None => RequestContext::default(),
    };

    let actor_id = req.extensions().get::<UserAuth>().map(|auth| auth.user_id);
    let locale = req
        .headers()
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .and_then(preferred_language)
        .unwrap_or_else(|| default_locale.to_string());

    ctx.with_actor(actor_id).with_locale(locale)
}

/// First language tag of an `Accept-Language` value, ignoring weights.
fn preferred_language(value: &str) -> Option<String> {
    let tag = value.split(',').next()?.split(';').next()?.trim();
    if tag.is_empty() || tag == "*" {
        return None;
    }
    Some(tag.to_string())
}
