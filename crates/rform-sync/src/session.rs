#![forbid(unsafe_code)]

//! Session state and active subscription bookkeeping.

use crate::surface::SubscriptionHandle;

/// Lifecycle of one form.
///
/// ```text
/// Idle ──show──▶ Shown ──close──▶ Closed
///                  ▲                 │
///                  └──────show───────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// Built but never shown.
    #[default]
    Idle,
    Shown,
    Closed,
}

impl SessionState {
    #[must_use]
    pub const fn is_shown(self) -> bool {
        matches!(self, Self::Shown)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Shown => "shown",
            Self::Closed => "closed",
        })
    }
}

/// One live surface subscription and the path it watches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ActiveSubscription {
    pub handle: SubscriptionHandle,
    pub path: String,
}

/// Live subscriptions of the current session.
///
/// Release always goes through [`take_all`](Self::take_all): the set is
/// emptied before any handle is released, so a re-entrant close sees
/// nothing left to do.
#[derive(Debug, Default)]
pub(crate) struct ActiveSubscriptions {
    entries: Vec<ActiveSubscription>,
}

impl ActiveSubscriptions {
    pub fn insert(&mut self, handle: SubscriptionHandle, path: String) {
        self.entries.push(ActiveSubscription { handle, path });
    }

    pub fn take_all(&mut self) -> Vec<ActiveSubscription> {
        std::mem::take(&mut self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_all_empties_the_set() {
        let mut subs = ActiveSubscriptions::default();
        subs.insert(SubscriptionHandle::new(1), "title".into());
        subs.insert(SubscriptionHandle::new(2), "layout[0].value".into());
        assert_eq!(subs.len(), 2);

        let taken = subs.take_all();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[1].path, "layout[0].value");
        assert_eq!(subs.len(), 0);
        assert!(subs.take_all().is_empty());
    }

    #[test]
    fn state_display() {
        assert_eq!(SessionState::default(), SessionState::Idle);
        assert_eq!(SessionState::Shown.to_string(), "shown");
        assert!(SessionState::Shown.is_shown());
        assert!(!SessionState::Closed.is_shown());
    }
}
