pub mod classifier;
pub mod notify_service;
pub mod outcome;

pub use notify_service::NotifyService;
pub use outcome::Outcome;
