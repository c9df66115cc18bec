pub mod bootstrap;
pub mod keycloak_user;

pub use bootstrap::*;
pub use keycloak_user::*;
