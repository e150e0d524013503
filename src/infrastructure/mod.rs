//! Infrastructure layer - Storage, services and the scope routing runtime

pub mod logging;
pub mod observability;
pub mod scope;
pub mod services;
pub mod storage;
