//! User request shapes.
//!
//! Users are the actors recorded on audit rows. Credentials live with the
//! identity provider; this service only keeps the profile.

use serde::{Deserialize, Serialize};
use validator::Validate;

use shared::pagination::PageRequest;

use super::query::{Filter, Filters, QueryShape};

fn default_active() -> bool {
    true
}

/// Request payload for creating a user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(max = 100, message = "Display name must be at most 100 characters"))]
    pub display_name: String,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Request payload for a partial user update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100, message = "Display name must be at most 100 characters"))]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Query parameters for listing users.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserQuery {
    pub q: Option<String>,
    pub is_active: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl QueryShape for UserQuery {
    fn filters(&self) -> Vec<Filter> {
        Filters::new()
            .search(&["username", "email", "display_name"], self.q.as_deref())
            .eq("is_active", self.is_active)
            .build()
    }

    fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.per_page)
    }
}
