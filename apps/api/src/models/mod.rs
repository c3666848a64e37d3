pub mod employee;
pub mod task;
