pub mod period;
pub mod validators;
