pub mod reports;
pub mod storage;
