use crate::adapter::AdapterMethod;
use crate::backend::TransactionError;
use tidegrid_types::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("Method not available for this data structure: {0}")]
    MethodNotAvailable(AdapterMethod),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),
}

impl AdapterError {
    pub fn is_method_not_available(&self) -> bool {
        matches!(self, AdapterError::MethodNotAvailable(_))
    }
}
