//! Wire types shared by the quill persistence, API and server crates.

pub mod api;
pub mod models;
pub mod validation;
