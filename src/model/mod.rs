pub mod attendance;
pub mod result;
pub mod student;
