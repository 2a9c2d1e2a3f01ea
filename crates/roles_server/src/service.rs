//! Role service — the single writer for role grants and game events.
//!
//! All requests are funnelled through one `mpsc` channel and handled one at a
//! time by [`RoleService::run`], so attach, detach and event delivery never
//! interleave. Callers talk to the service through a cloneable
//! [`RoleServiceHandle`]; every request carries a `oneshot` for the reply.

use std::sync::Arc;

use glam::Vec3;
use roles_ability::{AbilityHandle, AbilityRegistry, PlayerAllocator, PlayerId};
use roles_controller::{RoleController, RoleError, SessionRoleStore};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::abilities::{AbilitySet, AbilityStats, GameEvents, PlayerHurt, PlayerMoved};
use crate::catalog::{CatalogConfig, CatalogError, RoleCatalog};
use crate::config::ServerConfig;
use crate::roster::PlayerRoster;

/// Errors returned to service callers.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The requested role is not in the catalog.
    #[error("unknown role `{0}`")]
    UnknownRole(String),

    /// The player is not connected.
    #[error("{0} is not connected")]
    UnknownPlayer(PlayerId),

    /// The controller rejected the request.
    #[error(transparent)]
    Role(#[from] RoleError),

    /// The service has shut down.
    #[error("role service is not running")]
    Closed,
}

/// Result of a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReloadReport {
    /// Abilities that were enabled before the bulk disable.
    pub disabled: usize,
    /// Abilities enabled again afterwards.
    pub reenabled: usize,
}

/// Snapshot of the service state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ServiceStats {
    pub players: usize,
    pub assigned: usize,
    pub abilities: AbilityStats,
}

/// Requests handled by the service loop.
#[derive(Debug)]
enum Command {
    Join {
        nickname: String,
        reply: oneshot::Sender<PlayerId>,
    },
    Leave {
        player: PlayerId,
        reply: oneshot::Sender<Result<(), ServiceError>>,
    },
    Attach {
        player: PlayerId,
        role: String,
        reply: oneshot::Sender<Result<(), ServiceError>>,
    },
    Detach {
        player: PlayerId,
        reply: oneshot::Sender<Result<String, ServiceError>>,
    },
    Moved {
        event: PlayerMoved,
        reply: oneshot::Sender<usize>,
    },
    Hurt {
        event: PlayerHurt,
        reply: oneshot::Sender<usize>,
    },
    Reload {
        reply: oneshot::Sender<ReloadReport>,
    },
    Stats {
        reply: oneshot::Sender<ServiceStats>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Owns the abilities, the catalog and the controller.
pub struct RoleService {
    allocator: PlayerAllocator,
    roster: Arc<PlayerRoster>,
    registry: AbilityRegistry,
    events: GameEvents,
    abilities: AbilitySet,
    catalog: RoleCatalog,
    controller: RoleController,
    rx: mpsc::Receiver<Command>,
}

impl RoleService {
    /// Build the service for `catalog` and return it with its handle.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the catalog references unknown abilities
    /// or defines a role twice.
    pub fn new(
        config: &ServerConfig,
        catalog: &CatalogConfig,
    ) -> Result<(Self, RoleServiceHandle), CatalogError> {
        let registry = AbilityRegistry::new();
        let events = GameEvents::default();
        let abilities = AbilitySet::new(&registry, &events);
        let roster = Arc::new(PlayerRoster::new());

        let catalog = {
            let roster = Arc::clone(&roster);
            RoleCatalog::build(
                catalog,
                |name| abilities.by_name(name),
                move |role, player| {
                    info!(%player, nickname = %roster.nickname(player), role, "custom role granted");
                },
            )?
        };

        let controller = RoleController::new(
            &registry,
            Arc::new(SessionRoleStore::new()),
            roster.clone(),
        );

        let (tx, rx) = mpsc::channel(config.command_buffer);
        let service = Self {
            allocator: PlayerAllocator::new(),
            roster,
            registry,
            events,
            abilities,
            catalog,
            controller,
            rx,
        };
        Ok((service, RoleServiceHandle { tx }))
    }

    /// Run the service on its own task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Handle requests until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        info!(roles = ?self.catalog.names(), "role service started");
        while let Some(command) = self.rx.recv().await {
            if let Command::Shutdown { reply } = command {
                let _ = reply.send(());
                break;
            }
            self.handle(command);
        }
        self.registry.disable_all();
        info!("role service stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Join { nickname, reply } => {
                let player = self.allocator.allocate();
                self.roster.join(player, nickname);
                let _ = reply.send(player);
            }
            Command::Leave { player, reply } => {
                let _ = reply.send(self.leave(player));
            }
            Command::Attach {
                player,
                role,
                reply,
            } => {
                let _ = reply.send(self.attach(player, &role));
            }
            Command::Detach { player, reply } => {
                let result = self
                    .controller
                    .detach(player)
                    .map(|role| role.name().to_string())
                    .map_err(ServiceError::from);
                let _ = reply.send(result);
            }
            Command::Moved { event, reply } => {
                let _ = reply.send(self.events.moved.publish(&event));
            }
            Command::Hurt { event, reply } => {
                let _ = reply.send(self.events.hurt.publish(&event));
            }
            Command::Reload { reply } => {
                let disabled = self.registry.disable_all();
                let reenabled = self.catalog.reenable();
                info!(disabled, reenabled, "abilities reloaded");
                let _ = reply.send(ReloadReport {
                    disabled,
                    reenabled,
                });
            }
            Command::Stats { reply } => {
                let _ = reply.send(ServiceStats {
                    players: self.roster.len(),
                    assigned: self.controller.assigned_count(),
                    abilities: self.abilities.stats(),
                });
            }
            // Handled by `run`.
            Command::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    fn attach(&self, player: PlayerId, role: &str) -> Result<(), ServiceError> {
        if !self.roster.contains(player) {
            return Err(ServiceError::UnknownPlayer(player));
        }
        let definition = self
            .catalog
            .get(role)
            .ok_or_else(|| ServiceError::UnknownRole(role.to_string()))?;
        self.controller.attach(player, definition)?;
        Ok(())
    }

    /// Revoke the player's role, then forget them.
    ///
    /// Role abilities that are disabled at this point are enabled just for
    /// the detach and disabled again right after, so a departed player keeps
    /// no grant. Only this task publishes, so nothing is delivered meanwhile.
    fn leave(&self, player: PlayerId) -> Result<(), ServiceError> {
        if !self.roster.contains(player) {
            return Err(ServiceError::UnknownPlayer(player));
        }
        if let Some(role) = self.controller.role_of(player) {
            let dormant: Vec<&Arc<dyn AbilityHandle>> = role
                .abilities()
                .iter()
                .filter(|ability| !ability.is_enabled())
                .collect();
            for ability in &dormant {
                ability.enable();
            }
            let detached = self.controller.detach(player);
            for ability in &dormant {
                ability.disable();
            }
            detached?;
        }
        self.roster.leave(player);
        debug!(%player, "player left");
        Ok(())
    }
}

/// Cloneable client for a running [`RoleService`].
#[derive(Debug, Clone)]
pub struct RoleServiceHandle {
    tx: mpsc::Sender<Command>,
}

impl RoleServiceHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| ServiceError::Closed)?;
        rx.await.map_err(|_| ServiceError::Closed)
    }

    /// Register a newly connected player.
    pub async fn join(&self, nickname: impl Into<String>) -> Result<PlayerId, ServiceError> {
        let nickname = nickname.into();
        self.request(|reply| Command::Join { nickname, reply }).await
    }

    /// Disconnect a player, revoking their role first.
    pub async fn leave(&self, player: PlayerId) -> Result<(), ServiceError> {
        self.request(|reply| Command::Leave { player, reply })
            .await?
    }

    /// Grant the catalog role `role` to `player`.
    pub async fn attach(&self, player: PlayerId, role: &str) -> Result<(), ServiceError> {
        let role = role.to_string();
        self.request(|reply| Command::Attach {
            player,
            role,
            reply,
        })
        .await?
    }

    /// Revoke the player's role; returns its name.
    pub async fn detach(&self, player: PlayerId) -> Result<String, ServiceError> {
        self.request(|reply| Command::Detach { player, reply })
            .await?
    }

    /// Publish a move; returns the number of subscribers reached.
    pub async fn moved(&self, player: PlayerId, position: Vec3) -> Result<usize, ServiceError> {
        let event = PlayerMoved { player, position };
        self.request(|reply| Command::Moved { event, reply }).await
    }

    /// Publish a hit; returns the number of subscribers reached.
    pub async fn hurt(&self, player: PlayerId, damage: f32) -> Result<usize, ServiceError> {
        let event = PlayerHurt { player, damage };
        self.request(|reply| Command::Hurt { event, reply }).await
    }

    /// Disable every ability, then enable the always-on ones again.
    pub async fn reload(&self) -> Result<ReloadReport, ServiceError> {
        self.request(|reply| Command::Reload { reply }).await
    }

    /// Current counters.
    pub async fn stats(&self) -> Result<ServiceStats, ServiceError> {
        self.request(|reply| Command::Stats { reply }).await
    }

    /// Stop the service loop.
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        self.request(|reply| Command::Shutdown { reply }).await
    }
}
