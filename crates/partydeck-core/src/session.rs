// In-memory game session store.
//
// Sessions live for the lifetime of the process. The map sits behind a single
// mutex; every operation takes the lock once and runs to completion.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::{validate_colors, Color, DrawnCard, GameSession};

/// A session's draw history, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct History {
    pub cards: Vec<DrawnCard>,
    pub total: usize,
}

/// Keyed collection of game sessions. Construct one at start-up and share it
/// by reference (e.g. inside an `Arc`).
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, GameSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the session map. Each operation leaves the map consistent, so
    /// a poisoned lock is still safe to use.
    fn sessions(&self) -> MutexGuard<'_, HashMap<String, GameSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a new, active session with an empty history.
    pub fn create(&self, colors: Vec<Color>) -> Result<GameSession> {
        validate_colors(&colors)?;

        let session = GameSession {
            id: Uuid::new_v4().to_string(),
            colors,
            drawn_cards: Vec::new(),
            created_at: Utc::now(),
            is_active: true,
        };

        self.sessions().insert(session.id.clone(), session.clone());
        debug!("Created session {} with {} colors", session.id, session.colors.len());
        Ok(session)
    }

    pub fn get(&self, id: &str) -> Result<GameSession> {
        self.sessions().get(id).cloned().ok_or_else(|| not_found(id))
    }

    /// Replace the session's palette. A rejected palette leaves the session
    /// untouched.
    pub fn update_colors(&self, id: &str, colors: Vec<Color>) -> Result<GameSession> {
        self.modify(id, |session| {
            validate_colors(&colors)?;
            session.colors = colors;
            Ok(())
        })
    }

    /// Append a drawn card to the end of the history. `None` models a request
    /// that carried no card.
    pub fn append_drawn_card(&self, id: &str, card: Option<DrawnCard>) -> Result<GameSession> {
        self.modify(id, |session| {
            let card = card.ok_or_else(|| Error::invalid_input("a drawn card is required"))?;
            session.drawn_cards.push(card);
            Ok(())
        })
    }

    pub fn history(&self, id: &str) -> Result<History> {
        let sessions = self.sessions();
        let session = sessions.get(id).ok_or_else(|| not_found(id))?;
        Ok(History {
            cards: session.drawn_cards.clone(),
            total: session.drawn_cards.len(),
        })
    }

    /// Source card ids of the last `n` draws, most recent first.
    pub fn recent_card_ids(&self, id: &str, n: usize) -> Result<Vec<String>> {
        let sessions = self.sessions();
        let session = sessions.get(id).ok_or_else(|| not_found(id))?;
        Ok(recent_ids(session, n).collect())
    }

    /// Draw for an active session and append the result to its history,
    /// all under one lock.
    ///
    /// `draw` receives the session's colors and the source ids of its last
    /// `recent` draws. Ended sessions fail with `InvalidInput`; a failed draw
    /// records nothing.
    pub fn record_draw<F>(&self, id: &str, recent: usize, draw: F) -> Result<DrawnCard>
    where
        F: FnOnce(&[Color], HashSet<String>) -> Result<DrawnCard>,
    {
        let mut sessions = self.sessions();
        let session = sessions.get_mut(id).ok_or_else(|| not_found(id))?;
        if !session.is_active {
            return Err(Error::invalid_input(format!("session {id} has ended")));
        }

        let exclude: HashSet<String> = recent_ids(session, recent).collect();
        let drawn = draw(&session.colors, exclude)?;
        session.drawn_cards.push(drawn.clone());
        debug!("Session {id}: recorded card {}", drawn.card.id);
        Ok(drawn)
    }

    /// Mark the session finished. Ending an ended session is a no-op.
    pub fn end(&self, id: &str) -> Result<GameSession> {
        self.modify(id, |session| {
            session.is_active = false;
            Ok(())
        })
    }

    /// Remove the session. Unknown ids fail with `NotFound` and change
    /// nothing.
    pub fn delete(&self, id: &str) -> Result<()> {
        match self.sessions().remove(id) {
            Some(_) => {
                debug!("Deleted session {id}");
                Ok(())
            }
            None => Err(not_found(id)),
        }
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions().is_empty()
    }

    /// Apply `f` to the session under the lock and return the updated copy.
    /// The not-found check runs before `f`.
    fn modify<F>(&self, id: &str, f: F) -> Result<GameSession>
    where
        F: FnOnce(&mut GameSession) -> Result<()>,
    {
        let mut sessions = self.sessions();
        let session = sessions.get_mut(id).ok_or_else(|| not_found(id))?;
        f(&mut *session)?;
        debug!("Updated session {id}");
        Ok(session.clone())
    }
}

fn recent_ids(session: &GameSession, n: usize) -> impl Iterator<Item = String> + '_ {
    session
        .drawn_cards
        .iter()
        .rev()
        .take(n)
        .map(|drawn| drawn.card.id.clone())
}

fn not_found(id: &str) -> Error {
    Error::not_found(format!("session {id} not found"))
}
