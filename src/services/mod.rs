pub mod auth_service;
pub mod clock;
pub mod defaulter_service;
pub mod discount;
pub mod file_service;
pub mod notifier;
pub mod occupancy_service;
pub mod revenue_service;
pub mod target_service;
pub mod utility_status_service;

pub use auth_service::AuthService;
pub use clock::{Clock, FixedClock, SystemClock};
pub use file_service::FileService;
pub use notifier::{HttpMailSink, MailSink, Notifier};
pub use occupancy_service::OccupancyService;
pub use revenue_service::RevenueService;
pub use target_service::TargetService;
