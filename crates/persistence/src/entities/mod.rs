//! Database entity definitions.
//!
//! Entities are direct mappings to database rows. Inventory entities also
//! implement [`crate::entity::Entity`] so the generic repository can manage them.

pub mod audit_log;
pub mod circuit;
pub mod device;
pub mod interface;
pub mod ip_address;
pub mod site;
pub mod user;

pub use audit_log::AuditLogEntity;
pub use circuit::CircuitEntity;
pub use device::DeviceEntity;
pub use interface::InterfaceEntity;
pub use ip_address::IpAddressEntity;
pub use site::SiteEntity;
pub use user::UserEntity;
