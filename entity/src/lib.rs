//! SeaORM entities for the HRMS schema.

pub mod attendance;
pub mod employee_profiles;
pub mod leave_requests;
pub mod payroll;
pub mod sessions;
pub mod users;
