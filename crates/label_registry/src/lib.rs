//! Label Registry
//!
//! Maps name labels (Keccak-256 of a human-readable name) to a holder
//! address. Registration costs a registry-wide fee and lasts for a fixed
//! period; holders may transfer live labels, and expired labels become
//! available to anyone.

pub mod compat;
pub mod directory;
pub mod errors;
pub mod registry;
pub mod types;

pub use compat::{
    dispatch, dispatch_json, interface_description, CallOutput, HolderNaming, RegistryCall,
};
pub use directory::{
    publish_interface, DirectoryError, DirectoryService, InMemoryDirectory, DIRECTORY_ADDRESS,
};
pub use errors::*;
pub use registry::{LabelRegistry, MAX_EVENT_LOG};
pub use types::*;
