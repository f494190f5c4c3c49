mod service;

pub use service::RetentionService;
pub(crate) use service::delete_backup;
