/*!
# Keycloak Identity

User identity lifecycle on top of a Keycloak realm, split along hexagonal
architecture lines.

This crate provides:
- Domain models for the remote user record and its creation/update payloads
- Port definitions for the two capability groups of the identity provider
- Application services (`KeycloakUser`, `ClientBootstrapService`)
- Infrastructure adapters talking to a real Keycloak server

## Architecture

```text
┌─────────────────────────────────────────────────────────────┐
│                    Primary Adapters                         │
├─────────────────────────────────────────────────────────────┤
│   keycloak-portal (axum pages, forms, session gate)         │
└─────────────────────────────────────────────────────────────┘
                              │
┌─────────────────────────────────────────────────────────────┐
│                Application Layer                            │
├─────────────────────────────────────────────────────────────┤
│  • KeycloakUser             • ClientBootstrapService        │
└─────────────────────────────────────────────────────────────┘
                              │
┌─────────────────────────────────────────────────────────────┐
│                 Ports                                       │
├─────────────────────────────────────────────────────────────┤
│  • IdentityAdminPort        • OidcPort                      │
└─────────────────────────────────────────────────────────────┘
                              │
┌─────────────────────────────────────────────────────────────┐
│              Infrastructure Layer (Adapters)                │
├─────────────────────────────────────────────────────────────┤
│  • KeycloakAdminAdapter     • KeycloakOidcClient            │
└─────────────────────────────────────────────────────────────┘
```

## Features

- `testing`: Enable the in-memory identity provider used by tests

## Usage

```rust,ignore
use keycloak_identity::{IdentityProvider, KeycloakUser};

let identity = IdentityProvider::new(admin_adapter, oidc_client);

let user = KeycloakUser::from_username(&identity, "alice123").await?;
let token = user.get_token(Some("p@ss")).await?;
```
*/

pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(feature = "testing")]
pub mod testing;

// Re-export commonly used types
pub use application::ports::*;
pub use application::services::*;
pub use domain::entities::*;
pub use domain::errors::*;
