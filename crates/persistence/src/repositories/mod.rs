//! Repository implementations.
//!
//! Every inventory entity is served by the same [`Repository`]; the aliases
//! below only fix its type parameters.

pub mod audit_log;
pub(crate) mod filter;
pub mod generic;

pub use audit_log::AuditLogRepository;
pub use generic::{PendingCreate, Repository};

use domain::models::{
    CircuitQuery, CreateCircuit, CreateDevice, CreateInterface, CreateIpAddress, CreateSite,
    CreateUser, DeviceQuery, InterfaceQuery, IpAddressQuery, SiteQuery, UpdateCircuit,
    UpdateDevice, UpdateInterface, UpdateIpAddress, UpdateSite, UpdateUser, UserQuery,
};

use crate::entities::{
    CircuitEntity, DeviceEntity, InterfaceEntity, IpAddressEntity, SiteEntity, UserEntity,
};

pub type UserRepository = Repository<UserEntity, CreateUser, UpdateUser, UserQuery>;
pub type SiteRepository = Repository<SiteEntity, CreateSite, UpdateSite, SiteQuery>;
pub type DeviceRepository = Repository<DeviceEntity, CreateDevice, UpdateDevice, DeviceQuery>;
pub type InterfaceRepository =
    Repository<InterfaceEntity, CreateInterface, UpdateInterface, InterfaceQuery>;
pub type CircuitRepository = Repository<CircuitEntity, CreateCircuit, UpdateCircuit, CircuitQuery>;
pub type IpAddressRepository =
    Repository<IpAddressEntity, CreateIpAddress, UpdateIpAddress, IpAddressQuery>;
