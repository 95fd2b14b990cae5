pub mod cleanup;
pub mod records;
pub mod remote_source;
pub mod resumable;
pub mod scanner;
pub mod storage;
pub mod workflows;
