pub mod appointment;
pub mod document;
pub mod hr_admin;
pub mod leave_request;
pub mod payslip;
pub mod todo;
