//! Device request shapes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use shared::pagination::PageRequest;

use super::query::{split_list, Filter, Filters, QueryShape};

/// Operational state of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Planned,
    #[default]
    Active,
    Offline,
    Decommissioning,
}

/// Request payload for creating a device.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateDevice {
    #[validate(length(min = 1, max = 64, message = "Name must be 1-64 characters"))]
    pub name: String,

    pub site_id: Uuid,

    #[validate(length(min = 1, max = 50, message = "Role must be 1-50 characters"))]
    pub role: String,

    #[validate(length(max = 50, message = "Platform must be at most 50 characters"))]
    pub platform: Option<String>,

    #[validate(length(max = 100, message = "Serial must be at most 100 characters"))]
    pub serial: Option<String>,

    #[serde(default)]
    pub status: DeviceStatus,

    #[validate(custom(function = "shared::validation::validate_ip_interface"))]
    pub management_ip: Option<String>,
}

/// Request payload for a partial device update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_update_device"))]
pub struct UpdateDevice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 64, message = "Name must be 1-64 characters"))]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<Uuid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 50, message = "Role must be 1-50 characters"))]
    pub role: Option<String>,

    #[serde(
        default,
        deserialize_with = "shared::patch::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub platform: Option<Option<String>>,

    #[serde(
        default,
        deserialize_with = "shared::patch::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub serial: Option<Option<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DeviceStatus>,

    #[serde(
        default,
        deserialize_with = "shared::patch::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub management_ip: Option<Option<String>>,
}

fn validate_update_device(update: &UpdateDevice) -> Result<(), ValidationError> {
    if let Some(Some(ip)) = &update.management_ip {
        shared::validation::validate_ip_interface(ip)?;
    }
    Ok(())
}

/// Query parameters for listing devices.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceQuery {
    pub q: Option<String>,
    pub site_id: Option<Uuid>,
    pub role: Option<String>,
    pub platform: Option<String>,
    /// Comma-separated list of statuses.
    pub status: Option<String>,
    pub serial: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl QueryShape for DeviceQuery {
    fn filters(&self) -> Vec<Filter> {
        Filters::new()
            .search(&["name", "serial"], self.q.as_deref())
            .eq("site_id", self.site_id)
            .eq("role", self.role.clone())
            .eq("platform", self.platform.clone())
            .eq("serial", self.serial.clone())
            .any_of("status", split_list(self.status.as_deref()))
            .build()
    }

    fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.per_page)
    }
}
