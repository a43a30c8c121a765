pub mod appointment;
pub mod document;
pub mod employee;
pub mod leave_request;
pub mod payslip;
pub mod role;
pub mod todo;
pub mod user;
