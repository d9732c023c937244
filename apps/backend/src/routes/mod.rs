//! HTTP route handlers

pub mod auth;
pub mod cards;
pub mod dictionaries;
pub mod lessons;
pub mod users;
