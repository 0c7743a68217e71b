//! Roster, attendance and shuttle-stop stores for the eunhad sidecar.

pub mod admin;
pub mod attendance;
pub mod classes;
pub mod config;
pub mod db;
pub mod error;
pub mod records;
pub mod registry;
pub mod roster;
pub mod search;
pub mod text;

pub use admin::{AdminGate, Capability, Confirmation, Outcome};
pub use classes::ClassId;
pub use error::StoreError;
pub use records::Records;
pub use registry::LocationRegistry;
