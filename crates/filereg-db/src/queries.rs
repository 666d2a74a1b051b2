//! Database query functions organized by table.

pub mod addons;
pub mod hashes;
pub mod users;
