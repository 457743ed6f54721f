use lexaudit_core::UpdateId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("update {0} is not pending in this session")]
    NotFound(UpdateId),
}
