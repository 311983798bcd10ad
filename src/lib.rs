pub mod cli;
pub mod error;
pub mod install;
pub mod policy;
pub mod runtime;
pub mod sbpl;
