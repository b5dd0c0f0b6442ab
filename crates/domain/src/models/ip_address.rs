//! IP address request shapes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use shared::pagination::PageRequest;

use super::query::{split_list, Filter, Filters, QueryShape};

/// Allocation state of an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpAddressStatus {
    #[default]
    Active,
    Reserved,
    Deprecated,
}

/// Request payload for creating an IP address.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateIpAddress {
    /// Address with prefix length, e.g. `192.0.2.10/24`.
    #[validate(custom(function = "shared::validation::validate_ip_interface"))]
    pub address: String,

    pub interface_id: Option<Uuid>,

    #[serde(default)]
    pub status: IpAddressStatus,

    #[validate(length(max = 255, message = "DNS name must be at most 255 characters"))]
    pub dns_name: Option<String>,

    #[serde(default)]
    #[validate(length(max = 200, message = "Description must be at most 200 characters"))]
    pub description: String,
}

/// Request payload for a partial IP address update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateIpAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "shared::validation::validate_ip_interface"))]
    pub address: Option<String>,

    #[serde(
        default,
        deserialize_with = "shared::patch::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub interface_id: Option<Option<Uuid>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<IpAddressStatus>,

    #[serde(
        default,
        deserialize_with = "shared::patch::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub dns_name: Option<Option<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 200, message = "Description must be at most 200 characters"))]
    pub description: Option<String>,
}

/// Query parameters for listing IP addresses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IpAddressQuery {
    pub q: Option<String>,
    pub interface_id: Option<Uuid>,
    /// Comma-separated list of statuses.
    pub status: Option<String>,
    pub dns_name: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl QueryShape for IpAddressQuery {
    fn filters(&self) -> Vec<Filter> {
        Filters::new()
            .search(&["dns_name", "description"], self.q.as_deref())
            .eq("interface_id", self.interface_id)
            .any_of("status", split_list(self.status.as_deref()))
            .eq("dns_name", self.dns_name.clone())
            .build()
    }

    fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.per_page)
    }
}
