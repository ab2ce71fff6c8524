use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::plan::Plan;

#[derive(Debug, Clone, PartialEq)]
pub struct QaEntry {
    pub question: String,
    pub answer: String,
    pub asked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanPair {
    pub diet: Plan,
    pub fitness: Plan,
}

/// Per-user state: the current plans and the follow-up history.
///
/// Both plans are stored together, so `plans_generated` holds exactly when
/// both exist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionContext {
    plans: Option<PlanPair>,
    qa_history: Vec<QaEntry>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn plans_generated(&self) -> bool {
        self.plans.is_some()
    }

    pub fn plans(&self) -> Option<&PlanPair> {
        self.plans.as_ref()
    }

    pub fn diet_plan(&self) -> Option<&Plan> {
        self.plans.as_ref().map(|pair| &pair.diet)
    }

    pub fn fitness_plan(&self) -> Option<&Plan> {
        self.plans.as_ref().map(|pair| &pair.fitness)
    }

    pub fn qa_history(&self) -> &[QaEntry] {
        &self.qa_history
    }

    /// Replaces both plans wholesale and starts a fresh Q&A history.
    pub fn install_plans(&mut self, diet: Plan, fitness: Plan) {
        self.qa_history.clear();
        self.plans = Some(PlanPair { diet, fitness });
    }

    pub(crate) fn push_qa(&mut self, question: String, answer: String) -> &QaEntry {
        self.qa_history.push(QaEntry {
            question,
            answer,
            asked_at: Utc::now(),
        });
        let last = self.qa_history.len() - 1;
        &self.qa_history[last]
    }
}

/// Independent sessions keyed by id. Each value is locked for the whole of a
/// user action, so at most one action per session runs at a time.
///
/// Sessions idle for longer than `idle_ttl` are dropped on the next lookup,
/// and the store never holds more than `max_sessions` entries.
pub struct SessionStore<S> {
    sessions: Mutex<HashMap<Uuid, StoredSession<S>>>,
    idle_ttl: Duration,
    max_sessions: usize,
}

struct StoredSession<S> {
    session: Arc<tokio::sync::Mutex<S>>,
    last_used: DateTime<Utc>,
}

impl<S> SessionStore<S> {
    pub fn new(idle_ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Returns the live session for `id` and marks it as used. Unknown and
    /// expired ids yield `None` without creating anything.
    pub fn get(&self, id: Option<Uuid>) -> Option<(Uuid, Arc<tokio::sync::Mutex<S>>)> {
        self.get_at(id, Utc::now())
    }

    /// Returns the session for `id`, creating it with `init` when it is unknown,
    /// expired or `id` is `None`. The returned id is the one the caller should keep.
    pub fn get_or_create(
        &self,
        id: Option<Uuid>,
        init: impl FnOnce() -> S,
    ) -> (Uuid, Arc<tokio::sync::Mutex<S>>) {
        self.get_or_create_at(id, Utc::now(), init)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, StoredSession<S>>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn get_at(
        &self,
        id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Option<(Uuid, Arc<tokio::sync::Mutex<S>>)> {
        let mut sessions = self.lock();
        self.evict_idle(&mut *sessions, now);
        touch(&mut *sessions, id?, now)
    }

    fn get_or_create_at(
        &self,
        id: Option<Uuid>,
        now: DateTime<Utc>,
        init: impl FnOnce() -> S,
    ) -> (Uuid, Arc<tokio::sync::Mutex<S>>) {
        let mut sessions = self.lock();
        self.evict_idle(&mut *sessions, now);

        if let Some(id) = id
            && let Some(found) = touch(&mut *sessions, id, now)
        {
            return found;
        }

        while sessions.len() >= self.max_sessions {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, stored)| stored.last_used)
                .map(|(id, _)| *id)
            else {
                break;
            };
            sessions.remove(&oldest);
            warn!(
                session = %oldest,
                max_sessions = self.max_sessions,
                "session limit reached; dropped least recently used session"
            );
        }

        let id = Uuid::new_v4();
        let session = Arc::new(tokio::sync::Mutex::new(init()));
        sessions.insert(
            id,
            StoredSession {
                session: session.clone(),
                last_used: now,
            },
        );
        debug!(session = %id, sessions = sessions.len(), "session created");
        (id, session)
    }

    fn evict_idle(&self, sessions: &mut HashMap<Uuid, StoredSession<S>>, now: DateTime<Utc>) {
        let before = sessions.len();
        sessions.retain(|_, stored| now - stored.last_used <= self.idle_ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, sessions = sessions.len(), "expired idle sessions");
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }
}

fn touch<S>(
    sessions: &mut HashMap<Uuid, StoredSession<S>>,
    id: Uuid,
    now: DateTime<Utc>,
) -> Option<(Uuid, Arc<tokio::sync::Mutex<S>>)> {
    let stored = sessions.get_mut(&id)?;
    stored.last_used = now;
    Some((id, stored.session.clone()))
}
