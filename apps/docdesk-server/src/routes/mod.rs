//! Route modules for the DocDesk server

pub mod documents;
pub mod health;
