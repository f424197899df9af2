//! Copies cards, with their tags, checklists, comments and attachments,
//! from one Kaiten space to another.

pub mod api;
pub mod config;
pub mod domain;
pub mod kaiten;
pub mod services;
