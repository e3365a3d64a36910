pub mod attendance;
pub mod core;
pub mod grades;
pub mod payments;
pub mod snapshot;
pub mod students;
