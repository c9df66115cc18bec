pub mod admin;
pub mod config;
pub mod oidc;
pub mod provider;

pub use admin::*;
pub use config::*;
pub use oidc::*;
pub use provider::*;
