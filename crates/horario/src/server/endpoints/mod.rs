pub mod schedule;
pub mod selection;
pub mod status;
pub mod transfer;
