//! Per-request ambient context.
//!
//! The inbound layer opens a scope with [`scope`] at the start of request
//! handling; anything awaited inside that scope (repositories, the audit trail
//! store) reads the acting user, request id and locale with [`current`] and
//! friends instead of taking them as parameters. The value lives in tokio
//! task-local storage, so two requests running concurrently never see each
//! other's context, and nothing outlives the scope.
//!
//! Reads outside any scope return a system context: no actor, a freshly
//! generated request id and [`DEFAULT_LOCALE`]. Background jobs therefore still
//! produce valid (actor-less) audit rows.
//!
//! Tasks started with `tokio::spawn` do not inherit the scope; wrap the spawned
//! future with [`propagate`] when they should.

use std::cell::RefCell;
use std::future::Future;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Locale used when none was negotiated.
pub const DEFAULT_LOCALE: &str = "en";

tokio::task_local! {
    static CURRENT: RefCell<RequestContext>;
}

/// Errors from context mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("No request context is active on this task")]
    NoScope,
}

/// Ambient state of one logical request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestContext {
    /// Acting user, `None` for system-initiated work.
    pub actor_id: Option<Uuid>,
    /// Correlates audit rows and logs with the inbound call.
    pub request_id: String,
    pub locale: String,
}

impl RequestContext {
    /// Context for a request with the given id, no actor and the default locale.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            actor_id: None,
            request_id: request_id.into(),
            locale: DEFAULT_LOCALE.to_string(),
        }
    }

    pub fn with_actor(mut self, actor_id: Option<Uuid>) -> Self {
        self.actor_id = actor_id;
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }
}

/// Runs `fut` with `ctx` as the active request context.
pub async fn scope<F: Future>(ctx: RequestContext, fut: F) -> F::Output {
    CURRENT.scope(RefCell::new(ctx), fut).await
}

/// Runs `fut` under a copy of the caller's context (for spawned tasks).
pub fn propagate<F: Future>(fut: F) -> impl Future<Output = F::Output> {
    scope(current(), fut)
}

/// True when called inside a [`scope`].
pub fn is_active() -> bool {
    CURRENT.try_with(|_| ()).is_ok()
}

/// Snapshot of the active context, or a fresh system context.
pub fn current() -> RequestContext {
    CURRENT
        .try_with(|ctx| ctx.borrow().clone())
        .unwrap_or_default()
}

pub fn actor_id() -> Option<Uuid> {
    CURRENT.try_with(|ctx| ctx.borrow().actor_id).unwrap_or(None)
}

pub fn request_id() -> String {
    CURRENT
        .try_with(|ctx| ctx.borrow().request_id.clone())
        .unwrap_or_else(|_| Uuid::new_v4().to_string())
}

pub fn locale() -> String {
    CURRENT
        .try_with(|ctx| ctx.borrow().locale.clone())
        .unwrap_or_else(|_| DEFAULT_LOCALE.to_string())
}

pub fn set_actor_id(actor_id: Option<Uuid>) -> Result<(), ContextError> {
    modify(|ctx| ctx.actor_id = actor_id)
}

pub fn set_request_id(request_id: impl Into<String>) -> Result<(), ContextError> {
    let request_id = request_id.into();
    modify(|ctx| ctx.request_id = request_id)
}

pub fn set_locale(locale: impl Into<String>) -> Result<(), ContextError> {
    let locale = locale.into();
    modify(|ctx| ctx.locale = locale)
}

fn modify(f: impl FnOnce(&mut RequestContext)) -> Result<(), ContextError> {
    CURRENT
        .try_with(|ctx| f(&mut ctx.borrow_mut()))
        .map_err(|_| ContextError::NoScope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_outside_scope() {
        assert!(!is_active());
        assert_eq!(actor_id(), None);
        assert_eq!(locale(), DEFAULT_LOCALE);

        let first = request_id();
        let second = request_id();
        assert!(Uuid::parse_str(&first).is_ok());
        assert_ne!(first, second, "each unscoped read gets a fresh request id");
    }

    #[test]
    fn test_set_outside_scope_fails() {
        assert_eq!(set_actor_id(Some(Uuid::new_v4())), Err(ContextError::NoScope));
        assert_eq!(set_locale("de"), Err(ContextError::NoScope));
        assert_eq!(actor_id(), None);
    }

    #[tokio::test]
    async fn test_scope_exposes_values() {
        let actor = Uuid::new_v4();
        let ctx = RequestContext::new("req-1")
            .with_actor(Some(actor))
            .with_locale("nl");

        scope(ctx.clone(), async move {
            assert!(is_active());
            assert_eq!(actor_id(), Some(actor));
            assert_eq!(request_id(), "req-1");
            assert_eq!(locale(), "nl");
            assert_eq!(current(), ctx);
        })
        .await;

        assert!(!is_active());
    }

    #[tokio::test]
    async fn test_setters_inside_scope() {
        scope(RequestContext::new("req-2"), async {
            let actor = Uuid::new_v4();
            set_actor_id(Some(actor)).unwrap();
            set_request_id("req-2b").unwrap();
            set_locale("fr").unwrap();

            assert_eq!(actor_id(), Some(actor));
            assert_eq!(request_id(), "req-2b");
            assert_eq!(locale(), "fr");
        })
        .await;
    }

    #[tokio::test]
    async fn test_concurrent_scopes_are_isolated() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let task = |actor: Uuid, req: &'static str| {
            scope(
                RequestContext::new(req).with_actor(Some(actor)),
                async move {
                    let mut seen = Vec::new();
                    for _ in 0..10 {
                        tokio::task::yield_now().await;
                        seen.push((actor_id(), request_id()));
                    }
                    seen
                },
            )
        };

        let (seen_a, seen_b) = tokio::join!(task(a, "req-a"), task(b, "req-b"));

        assert!(seen_a.iter().all(|(actor, req)| *actor == Some(a) && req == "req-a"));
        assert!(seen_b.iter().all(|(actor, req)| *actor == Some(b) && req == "req-b"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_spawned_task_needs_propagation() {
        let actor = Uuid::new_v4();

        let (plain, propagated) = scope(
            RequestContext::new("req-3").with_actor(Some(actor)),
            async {
                let plain = tokio::spawn(async { actor_id() }).await.unwrap();
                let propagated = tokio::spawn(propagate(async { actor_id() }))
                    .await
                    .unwrap();
                (plain, propagated)
            },
        )
        .await;

        assert_eq!(plain, None);
        assert_eq!(propagated, Some(actor));
    }
}
