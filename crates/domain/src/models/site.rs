//! Site request shapes.

use serde::{Deserialize, Serialize};
use validator::Validate;

use shared::pagination::PageRequest;

use super::query::{split_list, Filter, Filters, QueryShape};

/// Lifecycle state of a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteStatus {
    Planned,
    #[default]
    Active,
    Retired,
}

/// Request payload for creating a site.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSite {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(
        length(min = 2, max = 100, message = "Slug must be 2-100 characters"),
        custom(function = "shared::validation::validate_slug")
    )]
    pub slug: String,

    #[serde(default)]
    pub status: SiteStatus,

    #[validate(length(max = 100, message = "Region must be at most 100 characters"))]
    pub region: Option<String>,

    #[validate(length(max = 100, message = "Facility must be at most 100 characters"))]
    pub facility: Option<String>,

    #[serde(default)]
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: String,
}

/// Request payload for a partial site update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateSite {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "shared::validation::validate_slug"))]
    pub slug: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SiteStatus>,

    #[serde(
        default,
        deserialize_with = "shared::patch::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub region: Option<Option<String>>,

    #[serde(
        default,
        deserialize_with = "shared::patch::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub facility: Option<Option<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

/// Query parameters for listing sites.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteQuery {
    pub q: Option<String>,
    pub slug: Option<String>,
    pub region: Option<String>,
    /// Comma-separated list of statuses.
    pub status: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl QueryShape for SiteQuery {
    fn filters(&self) -> Vec<Filter> {
        Filters::new()
            .search(&["name", "slug", "facility"], self.q.as_deref())
            .eq("slug", self.slug.clone())
            .eq("region", self.region.clone())
            .any_of("status", split_list(self.status.as_deref()))
            .build()
    }

    fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.per_page)
    }
}
