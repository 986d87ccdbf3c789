pub mod audit;
pub mod bed;
pub mod customer;
pub mod finance;
pub mod hostel;
pub mod pagination;
pub mod revenue;
pub mod user;
pub mod utility;

pub use audit::*;
pub use bed::*;
pub use customer::*;
pub use finance::*;
pub use hostel::*;
pub use pagination::*;
pub use revenue::*;
pub use user::*;
pub use utility::*;
