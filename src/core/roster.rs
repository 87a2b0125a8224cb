use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

use crate::{core::name, error::Error};

/// A single entry on the current round's list.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct Participant {
    /// Canonical display name, unique within a round
    pub name: String,

    /// Opaque transport identity of the sender (user id, phone number).
    /// Used for post-win muting only, never displayed.
    #[serde(skip)]
    pub identity: String,
}

/// Lifecycle state of the current round.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize)]
pub enum Phase {
    /// Accepting names
    Open,
    /// At capacity, ready to draw
    Full,
    /// Winner selected, awaiting reset
    Drawn,
}

/// A (1-based rank, display name) pair from a list snapshot.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct RosterEntry {
    pub rank: usize,
    pub name: String,
}

/// Result of a successful add. The list snapshot and phase are captured
/// in the same critical section as the append, so callers render a
/// confirmation that matches the state the add actually produced, even
/// when another mutation lands right after.
#[derive(PartialEq, Debug, Clone)]
pub struct Added {
    pub position: usize,
    pub name: String,
    pub phase: Phase,
    pub entries: Vec<RosterEntry>,
}

/// Result of a successful remove, snapshotted like [`Added`].
#[derive(PartialEq, Debug, Clone)]
pub struct Removed {
    pub name: String,
    pub entries: Vec<RosterEntry>,
}

/// The mutable state of one round. Only ever touched under the store's
/// mutex; the draw engine locks it through [`RosterStore::lock`] so that
/// winner selection and the FULL -> DRAWN flip share one critical section.
#[derive(Debug)]
pub(crate) struct Round {
    pub(crate) capacity: usize,
    pub(crate) entries: Vec<Participant>,
    pub(crate) phase: Phase,
    pub(crate) last_winner: Option<String>,
}

/// The capped, deduplicated, insertion-ordered participant list for the
/// current round.
///
/// Every operation runs under a single mutex, so no caller can observe a
/// partially updated list and the OPEN -> FULL transition is atomic with
/// the append that causes it. The lock is only ever held for bounded
/// in-memory mutation, never across an await point.
pub struct RosterStore {
    round: Mutex<Round>,
}

impl RosterStore {
    pub fn new(capacity: usize) -> RosterStore {
        RosterStore {
            round: Mutex::new(Round {
                capacity,
                entries: Vec::with_capacity(capacity),
                phase: Phase::Open,
                last_winner: None,
            }),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Round> {
        self.round.lock().expect("roster lock poisoned")
    }

    /// Add a participant to the end of the list.
    ///
    /// Rejections are checked in order: a full (or drawn) round wins over
    /// name validity, which wins over duplication. On success the 1-based
    /// insertion position, the canonical display name, and a snapshot of
    /// the resulting list are returned, and reaching capacity flips the
    /// round to FULL.
    pub fn add(&self, raw_name: &str, identity: &str) -> Result<Added, Error> {
        let mut round = self.lock();

        if round.entries.len() >= round.capacity {
            return Err(Error::RoundFull(round.capacity));
        }

        let name = name::normalize(raw_name)?;

        if round.entries.iter().any(|p| p.name == name) {
            return Err(Error::DuplicateName(name));
        }

        round.entries.push(Participant {
            name: name.clone(),
            identity: identity.to_owned(),
        });

        if round.entries.len() == round.capacity {
            round.phase = Phase::Full;
        }

        Ok(Added {
            position: round.entries.len(),
            name,
            phase: round.phase,
            entries: snapshot(&round),
        })
    }

    /// Remove a participant by name, preserving the order of the rest.
    ///
    /// A FULL round reverts to OPEN. A DRAWN round is frozen until the
    /// post-announcement reset, so removal is rejected. An argument the
    /// normalizer cannot accept could never be on the list, so it is
    /// reported as not found.
    pub fn remove(&self, raw_name: &str) -> Result<Removed, Error> {
        let mut round = self.lock();

        if round.phase == Phase::Drawn {
            return Err(Error::AlreadyDrawn);
        }

        let name = match name::normalize(raw_name) {
            Ok(name) => name,
            Err(_) => return Err(Error::NotFound(raw_name.trim().to_owned())),
        };

        match round.entries.iter().position(|p| p.name == name) {
            Some(pos) => {
                round.entries.remove(pos);
                if round.phase == Phase::Full {
                    round.phase = Phase::Open;
                }
                Ok(Removed {
                    name,
                    entries: snapshot(&round),
                })
            }
            None => Err(Error::NotFound(name)),
        }
    }

    /// Take a consistent snapshot of the list in insertion order.
    ///
    /// An empty roster yields `None` rather than an empty listing, so
    /// callers can render "the list is empty" instead of a blank body.
    pub fn list(&self) -> Option<Vec<RosterEntry>> {
        let round = self.lock();

        if round.entries.is_empty() {
            return None;
        }

        Some(snapshot(&round))
    }

    /// Reset the round: empty the list, return to OPEN, forget the last
    /// winner. This is the only DRAWN -> OPEN transition. Idempotent.
    pub fn clear(&self) {
        let mut round = self.lock();
        round.entries.clear();
        round.phase = Phase::Open;
        round.last_winner = None;
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    pub fn last_winner(&self) -> Option<String> {
        self.lock().last_winner.clone()
    }
}

fn snapshot(round: &Round) -> Vec<RosterEntry> {
    round
        .entries
        .iter()
        .enumerate()
        .map(|(idx, p)| RosterEntry {
            rank: idx + 1,
            name: p.name.clone(),
        })
        .collect()
}
