pub mod leave_days;
pub mod payslip_poll;
