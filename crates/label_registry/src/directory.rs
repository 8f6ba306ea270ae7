//! Interface publication to the platform directory.
//!
//! After deployment the registry's interface description is stored with the
//! directory contract at a well-known address. This is a one-time step run
//! by whoever deploys the registry; the registry itself knows nothing about it.

use crate::compat::{interface_description, HolderNaming};
use async_trait::async_trait;
use ebakus_types::Address;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Address of the directory contract.
pub const DIRECTORY_ADDRESS: Address = Address::new([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x01, 0x01,
]);

/// Errors that can occur while talking to the directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory rejected interface for {address}: {reason}")]
    Rejected { address: String, reason: String },

    #[error("interface serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("directory backend error: {0}")]
    Backend(String),
}

impl From<anyhow::Error> for DirectoryError {
    fn from(value: anyhow::Error) -> Self {
        Self::Backend(value.to_string())
    }
}

#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// `storeAbiForAddress(address, abi)`
    async fn store_abi_for_address(
        &self,
        address: Address,
        abi: String,
    ) -> Result<(), DirectoryError>;

    async fn abi_for_address(&self, address: Address) -> Result<Option<String>, DirectoryError>;
}

/// Directory kept in process memory, for development runs and tests.
#[derive(Clone, Default)]
pub struct InMemoryDirectory {
    entries: Arc<RwLock<HashMap<Address, String>>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl DirectoryService for InMemoryDirectory {
    async fn store_abi_for_address(
        &self,
        address: Address,
        abi: String,
    ) -> Result<(), DirectoryError> {
        if abi.trim().is_empty() {
            return Err(DirectoryError::Rejected {
                address: address.to_string(),
                reason: "empty interface description".into(),
            });
        }
        self.entries.write().insert(address, abi);
        Ok(())
    }

    async fn abi_for_address(&self, address: Address) -> Result<Option<String>, DirectoryError> {
        Ok(self.entries.read().get(&address).cloned())
    }
}

/// Store the registry's interface description for `contract`.
///
/// Returns the published description.
pub async fn publish_interface(
    directory: &dyn DirectoryService,
    contract: Address,
    naming: HolderNaming,
) -> Result<String, DirectoryError> {
    let abi = serde_json::to_string(&interface_description(naming))?;
    directory
        .store_abi_for_address(contract, abi.clone())
        .await?;
    info!(%contract, %naming, directory = %DIRECTORY_ADDRESS, "interface published");
    Ok(abi)
}
