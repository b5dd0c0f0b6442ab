//! HTTP middleware components.

pub mod logging;
pub mod metrics;
pub mod request_context;
pub mod trace_id;
pub mod user_auth;

pub use metrics::{init_metrics, metrics_handler, metrics_middleware};
pub use request_context::request_context;
pub use trace_id::{trace_id, RequestId, REQUEST_ID_HEADER};
pub use user_auth::{optional_user_auth, UserAuth};
