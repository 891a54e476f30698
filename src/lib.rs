pub mod adapters;
pub mod auth;
pub mod cli;
pub mod error;
pub mod startup;
pub mod traits;
