//! DIGI THR core library
//!
//! Domain model of the mining-site supervision dashboard:
//! - Users, roles and the ADMIN-override allow-lists that gate routes
//! - The four resource collections (production, maintenance, alerts,
//!   notifications) with their create/patch validation
//! - The dashboard statistics read model
//!
//! Nothing here performs I/O; storage and HTTP live in `digithr-server`.

pub mod alert;
pub mod error;
pub mod maintenance;
pub mod notification;
pub mod page;
pub mod production;
pub mod record;
pub mod role;
pub mod stats;
pub mod time;
pub mod user;

pub use alert::{SecurityAlert, Severity};
pub use error::{ParseEnumError, ValidationErrors};
pub use maintenance::{MaintenanceSchedule, MaintenanceStatus, MaintenanceType};
pub use notification::{Notification, NotificationType};
pub use page::{Page, PageInfo, PageRequest};
pub use production::{ProductionActivity, ProductionStatus};
pub use record::{Record, RecordId};
pub use role::{Role, RoleSet};
pub use stats::{DashboardStats, SimulatedTelemetry, TelemetryFeed};
pub use user::{User, UserFilter, UserId};
