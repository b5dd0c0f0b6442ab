//! HTTP route handlers.

pub mod circuits;
pub mod health;
pub mod resource;

use axum::Router;

use domain::models::{
    CreateDevice, CreateInterface, CreateIpAddress, CreateSite, CreateUser, DeviceQuery,
    InterfaceQuery, IpAddressQuery, SiteQuery, UpdateDevice, UpdateInterface, UpdateIpAddress,
    UpdateSite, UpdateUser, UserQuery,
};
use persistence::entities::{
    DeviceEntity, InterfaceEntity, IpAddressEntity, SiteEntity, UserEntity,
};

use crate::app::AppState;

/// Inventory collections, mounted under `/api/v1`.
pub fn inventory() -> Router<AppState> {
    Router::new()
        .nest(
            "/users",
            resource::routes::<UserEntity, CreateUser, UpdateUser, UserQuery>(),
        )
        .nest(
            "/sites",
            resource::routes::<SiteEntity, CreateSite, UpdateSite, SiteQuery>(),
        )
        .nest(
            "/devices",
            resource::routes::<DeviceEntity, CreateDevice, UpdateDevice, DeviceQuery>(),
        )
        .nest(
            "/interfaces",
            resource::routes::<InterfaceEntity, CreateInterface, UpdateInterface, InterfaceQuery>(),
        )
        .nest(
            "/ip-addresses",
            resource::routes::<IpAddressEntity, CreateIpAddress, UpdateIpAddress, IpAddressQuery>(),
        )
        .nest("/circuits", circuits::router())
}
