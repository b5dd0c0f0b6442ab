//! Circuit request shapes.
//!
//! A circuit is terminated on an interface; the device and site it lands on
//! are derived from that interface when the circuit is created, so clients do
//! not send them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use shared::pagination::PageRequest;

use super::query::{split_list, Filter, Filters, QueryShape};

/// Provisioning state of a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CircuitStatus {
    Planned,
    Provisioning,
    #[default]
    Active,
    Offline,
    Decommissioned,
}

/// Request payload for creating a circuit.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCircuit {
    /// Provider-assigned circuit id.
    #[validate(length(min = 1, max = 100, message = "Circuit ID must be 1-100 characters"))]
    pub cid: String,

    #[validate(length(min = 1, max = 100, message = "Provider must be 1-100 characters"))]
    pub provider: String,

    #[validate(length(min = 1, max = 50, message = "Kind must be 1-50 characters"))]
    pub kind: String,

    #[serde(default)]
    pub status: CircuitStatus,

    #[validate(range(min = 0, message = "Commit rate must be non-negative"))]
    pub commit_rate_kbps: Option<i64>,

    /// Terminating interface; device and site are resolved from it.
    pub interface_id: Uuid,

    #[serde(default)]
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: String,
}

/// Derived termination columns written after the interface is resolved.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitTermination {
    pub device_id: Uuid,
    pub site_id: Uuid,
}

/// Request payload for a partial circuit update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateCircuit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100, message = "Provider must be 1-100 characters"))]
    pub provider: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 50, message = "Kind must be 1-50 characters"))]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CircuitStatus>,

    #[serde(
        default,
        deserialize_with = "shared::patch::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub commit_rate_kbps: Option<Option<i64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

/// Query parameters for listing circuits.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CircuitQuery {
    pub q: Option<String>,
    pub provider: Option<String>,
    /// Comma-separated list of statuses.
    pub status: Option<String>,
    pub site_id: Option<Uuid>,
    pub device_id: Option<Uuid>,
    pub interface_id: Option<Uuid>,
    pub commit_rate_min: Option<i64>,
    pub commit_rate_max: Option<i64>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl QueryShape for CircuitQuery {
    fn filters(&self) -> Vec<Filter> {
        Filters::new()
            .search(&["cid", "provider", "description"], self.q.as_deref())
            .eq("provider", self.provider.clone())
            .any_of("status", split_list(self.status.as_deref()))
            .eq("site_id", self.site_id)
            .eq("device_id", self.device_id)
            .eq("interface_id", self.interface_id)
            .range("commit_rate_kbps", self.commit_rate_min, self.commit_rate_max)
            .build()
    }

    fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.per_page)
    }
}
