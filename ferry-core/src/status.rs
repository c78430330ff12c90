//! Booking status lifecycle.
//!
//! ```text
//! pending  -> approved | assigned | cancelled
//! approved -> assigned | cancelled
//! assigned -> completed | cancelled
//! ```
//!
//! Every status change goes through [`check_transition`]. Requesting the
//! current status is a no-op success.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identity::Role;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Approved,
    Assigned,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::Approved,
        BookingStatus::Assigned,
        BookingStatus::Cancelled,
        BookingStatus::Completed,
    ];

    pub fn parse(raw: &str) -> Option<BookingStatus> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(BookingStatus::Pending),
            "approved" => Some(BookingStatus::Approved),
            "assigned" => Some(BookingStatus::Assigned),
            "cancelled" => Some(BookingStatus::Cancelled),
            "completed" => Some(BookingStatus::Completed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Assigned => "assigned",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    /// Statuses in which a booking may reference a ferry.
    pub fn holds_ferry(&self) -> bool {
        matches!(self, BookingStatus::Assigned | BookingStatus::Completed)
    }

    /// Statuses reachable in one step, ignoring who asks.
    pub fn successors(self) -> impl Iterator<Item = BookingStatus> {
        EDGES
            .iter()
            .filter(move |(from, _)| *from == self)
            .map(|(_, to)| *to)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// pending -> assigned is the one-step assignment path for elevated roles.
const EDGES: &[(BookingStatus, BookingStatus)] = &[
    (BookingStatus::Pending, BookingStatus::Approved),
    (BookingStatus::Pending, BookingStatus::Assigned),
    (BookingStatus::Pending, BookingStatus::Cancelled),
    (BookingStatus::Approved, BookingStatus::Assigned),
    (BookingStatus::Approved, BookingStatus::Cancelled),
    (BookingStatus::Assigned, BookingStatus::Completed),
    (BookingStatus::Assigned, BookingStatus::Cancelled),
];

/// Who may request a given target status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    Owner,
    Elevated,
    Anyone,
}

fn gate_for(requested: BookingStatus) -> Gate {
    match requested {
        BookingStatus::Cancelled => Gate::Owner,
        BookingStatus::Approved | BookingStatus::Assigned | BookingStatus::Completed => {
            Gate::Elevated
        }
        // nothing leads back to pending; only the identical-state no-op can pass
        BookingStatus::Pending => Gate::Anyone,
    }
}

fn role_may_request(role: Role, requested: BookingStatus) -> bool {
    match gate_for(requested) {
        Gate::Owner => role == Role::Passenger,
        Gate::Elevated => role.is_elevated(),
        Gate::Anyone => true,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The edge exists and should be written.
    Apply,
    /// Requested status equals the current one.
    NoOp,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("role {role} may not move a booking to {requested}")]
    Forbidden {
        role: Role,
        requested: BookingStatus,
    },
    #[error("cannot move a booking from {from} to {to}")]
    Invalid {
        from: BookingStatus,
        to: BookingStatus,
    },
}

/// Role gating is checked before the edge table, so a passenger asking for
/// `approved` is told `Forbidden` even when the booking is already approved.
pub fn check_transition(
    current: BookingStatus,
    requested: BookingStatus,
    role: Role,
) -> Result<Transition, TransitionError> {
    if !role_may_request(role, requested) {
        return Err(TransitionError::Forbidden { role, requested });
    }
    if current == requested {
        return Ok(Transition::NoOp);
    }
    if EDGES.contains(&(current, requested)) {
        Ok(Transition::Apply)
    } else {
        Err(TransitionError::Invalid {
            from: current,
            to: requested,
        })
    }
}

pub fn can_transition(current: BookingStatus, requested: BookingStatus, role: Role) -> bool {
    check_transition(current, requested, role).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_path() {
        use BookingStatus::*;
        assert_eq!(check_transition(Pending, Approved, Role::Staff), Ok(Transition::Apply));
        assert_eq!(check_transition(Approved, Assigned, Role::Crew), Ok(Transition::Apply));
        assert_eq!(check_transition(Assigned, Completed, Role::Admin), Ok(Transition::Apply));
    }

    #[test]
    fn test_direct_assignment_requires_elevated_role() {
        use BookingStatus::*;
        assert!(can_transition(Pending, Assigned, Role::Crew));
        assert_eq!(
            check_transition(Pending, Assigned, Role::Passenger),
            Err(TransitionError::Forbidden { role: Role::Passenger, requested: Assigned })
        );
    }

    #[test]
    fn test_only_passengers_cancel() {
        use BookingStatus::*;
        for from in [Pending, Approved, Assigned] {
            assert!(can_transition(from, Cancelled, Role::Passenger));
            assert!(!can_transition(from, Cancelled, Role::Staff));
            assert!(!can_transition(from, Cancelled, Role::Admin));
        }
    }

    #[test]
    fn test_terminal_states() {
        use BookingStatus::*;
        assert_eq!(check_transition(Cancelled, Cancelled, Role::Passenger), Ok(Transition::NoOp));
        assert_eq!(
            check_transition(Cancelled, Approved, Role::Staff),
            Err(TransitionError::Invalid { from: Cancelled, to: Approved })
        );
        assert_eq!(
            check_transition(Completed, Cancelled, Role::Passenger),
            Err(TransitionError::Invalid { from: Completed, to: Cancelled })
        );
        assert_eq!(Cancelled.successors().count(), 0);
        assert_eq!(Completed.successors().count(), 0);
    }

    #[test]
    fn test_no_skipping() {
        use BookingStatus::*;
        assert!(!can_transition(Pending, Completed, Role::Admin));
        assert!(!can_transition(Approved, Pending, Role::Admin));
        assert!(!can_transition(Assigned, Approved, Role::Staff));
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(BookingStatus::parse("Assigned"), Some(BookingStatus::Assigned));
        assert_eq!(BookingStatus::parse("rejected"), None);
        for status in BookingStatus::ALL {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
    }
}
