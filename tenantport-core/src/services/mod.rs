pub mod account_service;
pub mod export_service;
pub mod import_service;

pub use account_service::{AccountService, NewAccount};
pub use export_service::ExportService;
pub use import_service::ImportService;

use strum::{Display, EnumString};

/// Lifecycle shared by imports and exports. Exactly one terminal transition is allowed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TransferStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TransferStatus::Completed | TransferStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings() {
        assert_eq!(TransferStatus::Processing.to_string(), "processing");
        assert_eq!("failed".parse::<TransferStatus>().unwrap(), TransferStatus::Failed);
        assert!(TransferStatus::Completed.is_terminal());
        assert!(!TransferStatus::Pending.is_terminal());
    }
}
