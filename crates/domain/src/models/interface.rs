//! Interface request shapes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use shared::pagination::PageRequest;

use super::query::{split_list, Filter, Filters, QueryShape};

fn default_enabled() -> bool {
    true
}

/// Request payload for creating an interface.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateInterface {
    pub device_id: Uuid,

    #[validate(length(min = 1, max = 64, message = "Name must be 1-64 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 50, message = "Kind must be 1-50 characters"))]
    pub kind: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[validate(custom(function = "shared::validation::validate_mac_address"))]
    pub mac_address: Option<String>,

    #[validate(range(min = 68, max = 65536, message = "MTU must be between 68 and 65536"))]
    pub mtu: Option<i32>,

    #[serde(default)]
    #[validate(length(max = 200, message = "Description must be at most 200 characters"))]
    pub description: String,
}

/// Request payload for a partial interface update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_update_interface"))]
pub struct UpdateInterface {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 64, message = "Name must be 1-64 characters"))]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 50, message = "Kind must be 1-50 characters"))]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(
        default,
        deserialize_with = "shared::patch::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub mac_address: Option<Option<String>>,

    #[serde(
        default,
        deserialize_with = "shared::patch::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub mtu: Option<Option<i32>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 200, message = "Description must be at most 200 characters"))]
    pub description: Option<String>,
}

fn validate_update_interface(update: &UpdateInterface) -> Result<(), ValidationError> {
    if let Some(Some(mac)) = &update.mac_address {
        shared::validation::validate_mac_address(mac)?;
    }
    if let Some(Some(mtu)) = update.mtu {
        if !(68..=65536).contains(&mtu) {
            let mut err = ValidationError::new("range");
            err.message = Some("MTU must be between 68 and 65536".into());
            return Err(err);
        }
    }
    Ok(())
}

/// Query parameters for listing interfaces.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InterfaceQuery {
    pub q: Option<String>,
    pub device_id: Option<Uuid>,
    /// Comma-separated list of kinds.
    pub kind: Option<String>,
    pub enabled: Option<bool>,
    pub mtu_min: Option<i32>,
    pub mtu_max: Option<i32>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl QueryShape for InterfaceQuery {
    fn filters(&self) -> Vec<Filter> {
        Filters::new()
            .search(&["name", "description"], self.q.as_deref())
            .eq("device_id", self.device_id)
            .any_of("kind", split_list(self.kind.as_deref()))
            .eq("enabled", self.enabled)
            .range("mtu", self.mtu_min, self.mtu_max)
            .build()
    }

    fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.per_page)
    }
}
