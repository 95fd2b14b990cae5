pub mod cli;
pub mod format;
pub mod keys;
pub mod validation;
