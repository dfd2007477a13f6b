pub mod file_store;
pub mod lifecycle_service;
pub mod notification_service;
pub mod transitions;
