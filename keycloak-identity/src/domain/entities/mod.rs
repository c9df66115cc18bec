pub mod client;
pub mod user;

pub use client::*;
pub use user::*;
