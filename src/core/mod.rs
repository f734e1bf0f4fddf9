//! Building blocks shared by the services

pub mod cache;
pub mod system;
