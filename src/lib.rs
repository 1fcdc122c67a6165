//! Gross-to-Net Payroll Calculation Engine
//!
//! This crate turns an employee's pay inputs and a country rule set into gross
//! pay, progressive income tax, pre- and post-tax deductions, net pay and the
//! employer cost breakdown.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
