//! Allow-list of user ids permitted to talk to the bot.

use std::collections::BTreeSet;

use log::info;

use crate::config::GatewayConfig;
use crate::engine::UserId;
use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessList {
    admin: UserId,
    users: BTreeSet<UserId>,
}

impl AccessList {
    /// The admin is always on the list at start.
    pub fn new(config: &GatewayConfig) -> Self {
        let mut users = config.allowed_users.clone();
        users.insert(config.admin_id);
        Self {
            admin: config.admin_id,
            users,
        }
    }

    pub fn admin(&self) -> UserId {
        self.admin
    }

    pub fn is_admin(&self, user: UserId) -> bool {
        user == self.admin
    }

    pub fn is_allowed(&self, user: UserId) -> bool {
        self.users.contains(&user)
    }

    pub fn authorize(&self, user: UserId) -> Result<(), EngineError> {
        if self.is_allowed(user) {
            Ok(())
        } else {
            Err(EngineError::Unauthorized(user))
        }
    }

    pub fn require_admin(&self, user: UserId) -> Result<(), EngineError> {
        if self.is_admin(user) {
            Ok(())
        } else {
            Err(EngineError::NotAdmin(user))
        }
    }

    /// Allow `user`. Returns false if it was already allowed.
    pub fn add(&mut self, caller: UserId, user: UserId) -> Result<bool, EngineError> {
        self.require_admin(caller)?;
        let added = self.users.insert(user);
        if added {
            info!("admin {caller} allowed user {user}");
        }
        Ok(added)
    }

    /// Revoke `user`. The admin may remove itself from the list but keeps
    /// admin rights.
    pub fn remove(&mut self, caller: UserId, user: UserId) -> Result<bool, EngineError> {
        self.require_admin(caller)?;
        let removed = self.users.remove(&user);
        if removed {
            info!("admin {caller} revoked user {user}");
        }
        Ok(removed)
    }

    pub fn list(&self, caller: UserId) -> Result<Vec<UserId>, EngineError> {
        self.require_admin(caller)?;
        Ok(self.users.iter().copied().collect())
    }
}
