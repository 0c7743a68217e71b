pub mod admin;
pub mod attendance;
pub mod classes;
pub mod core;
pub mod stops;
pub mod students;
