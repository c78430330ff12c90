use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Passenger,
    Staff,
    Crew,
    Admin,
}

impl Role {
    /// Parses a token role claim. The legacy `user` role is a passenger.
    pub fn parse(raw: &str) -> Option<Role> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "passenger" | "user" => Some(Role::Passenger),
            "staff" => Some(Role::Staff),
            "crew" => Some(Role::Crew),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Passenger => "passenger",
            Role::Staff => "staff",
            Role::Crew => "crew",
            Role::Admin => "admin",
        }
    }

    /// Crew, staff and admins may approve, assign and complete bookings.
    pub fn is_elevated(&self) -> bool {
        !matches!(self, Role::Passenger)
    }

    /// Creating, editing and removing ferries.
    pub fn can_manage_fleet(&self) -> bool {
        matches!(self, Role::Staff | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated caller of a service operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn passenger(id: Uuid) -> Self {
        Self::new(id, Role::Passenger)
    }

    pub fn staff(id: Uuid) -> Self {
        Self::new(id, Role::Staff)
    }

    /// True when this actor is the passenger who owns `owner_id`'s records.
    pub fn owns(&self, owner_id: Uuid) -> bool {
        self.role == Role::Passenger && self.id == owner_id
    }

    pub fn require_elevated(&self, action: &str) -> CoreResult<()> {
        if self.role.is_elevated() {
            Ok(())
        } else {
            Err(CoreError::forbidden(format!("{} may not {}", self.role, action)))
        }
    }

    pub fn require_passenger(&self, action: &str) -> CoreResult<()> {
        if self.role == Role::Passenger {
            Ok(())
        } else {
            Err(CoreError::forbidden(format!("only passengers may {}", action)))
        }
    }

    /// Owner passengers and elevated roles may read a passenger's records.
    pub fn require_owner_or_elevated(&self, owner_id: Uuid, action: &str) -> CoreResult<()> {
        if self.owns(owner_id) || self.role.is_elevated() {
            Ok(())
        } else {
            Err(CoreError::forbidden(format!("{} may not {}", self.role, action)))
        }
    }
}
