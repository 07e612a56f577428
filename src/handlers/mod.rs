pub mod appointments;
pub mod audit_records;
pub mod health;
pub mod login;
pub mod patients;
pub mod register;
