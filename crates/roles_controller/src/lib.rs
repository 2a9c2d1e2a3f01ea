//! # roles_controller
//!
//! Custom roles: named bundles of abilities granted to one player at a time.
//!
//! This crate provides:
//!
//! - [`RoleDefinition`] — a base game role plus an ordered ability list.
//! - [`RoleStore`] / [`SessionRoleStore`] — which role each player holds.
//! - [`RoleHost`] — the game-side hook that switches a player's base role.
//! - [`RoleController`] — transactional attach/detach under the single-role rule.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use roles_ability::{AbilityRegistry, PlayerId};
//! use roles_controller::{BaseRoleId, RoleController, RoleDefinition, RoleHost, SessionRoleStore};
//!
//! # fn host() -> Arc<dyn RoleHost> { unimplemented!() }
//! let registry = AbilityRegistry::new();
//! let controller = RoleController::new(&registry, Arc::new(SessionRoleStore::new()), host());
//! let scout = RoleDefinition::builder("Scout", BaseRoleId(1)).build();
//! controller.attach(PlayerId(1), &scout).unwrap();
//! ```

pub mod controller;
pub mod error;
pub mod host;
pub mod role;
pub mod store;

pub use controller::RoleController;
pub use error::RoleError;
pub use host::{BaseRoleId, RoleHost};
pub use role::{AttachHook, RoleBuilder, RoleDefinition};
pub use store::{ROLE_SESSION_KEY, RoleStore, SessionRoleStore, StoreError};
