//! Domain models for the network inventory.

pub mod audit_log;
pub mod circuit;
pub mod device;
pub mod interface;
pub mod ip_address;
pub mod query;
pub mod site;
pub mod user;

pub use audit_log::{AuditAction, AuditRecord, Diff, FieldChange, ListAuditLogQuery, Snapshot};
pub use circuit::{CircuitQuery, CircuitStatus, CircuitTermination, CreateCircuit, UpdateCircuit};
pub use device::{CreateDevice, DeviceQuery, DeviceStatus, UpdateDevice};
pub use interface::{CreateInterface, InterfaceQuery, UpdateInterface};
pub use ip_address::{CreateIpAddress, IpAddressQuery, IpAddressStatus, UpdateIpAddress};
pub use query::{Filter, FilterValue, Filters, QueryShape};
pub use site::{CreateSite, SiteQuery, SiteStatus, UpdateSite};
pub use user::{CreateUser, UpdateUser, UserQuery};
