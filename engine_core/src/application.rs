//! Use cases, application services, and small utility helpers that sit
//! between the domain ports and the infrastructure adapters.

pub mod commands;
pub mod services;
pub mod use_cases;
pub mod utilities;
