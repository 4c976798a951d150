use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, RwLock},
    time::Instant,
};
use tracing::info;
use uuid::Uuid;

use super::slots::MealSlotStore;

pub type SharedStore = Arc<Mutex<MealSlotStore>>;

struct Draft {
    store: SharedStore,
    touched: Instant,
}

impl Draft {
    fn new(store: MealSlotStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            touched: Instant::now(),
        }
    }
}

/// Draft plan of every user currently editing, kept in process memory.
pub struct PlannerSessions {
    drafts: RwLock<HashMap<Uuid, Draft>>,
    plan_days: usize,
}

impl PlannerSessions {
    pub fn new(plan_days: usize) -> Self {
        Self {
            drafts: RwLock::new(HashMap::new()),
            plan_days,
        }
    }

    pub fn plan_days(&self) -> usize {
        self.plan_days
    }

    /// The user's draft, created empty on first access.
    pub async fn get(&self, user_id: Uuid) -> SharedStore {
        let mut drafts = self.drafts.write().await;
        let draft = drafts
            .entry(user_id)
            .or_insert_with(|| Draft::new(MealSlotStore::new(self.plan_days)));
        draft.touched = Instant::now();
        draft.store.clone()
    }

    /// Swap the user's draft for `store`, e.g. a saved plan being copied in.
    pub async fn replace(&self, user_id: Uuid, store: MealSlotStore) -> SharedStore {
        let draft = Draft::new(store);
        let shared = draft.store.clone();
        self.drafts.write().await.insert(user_id, draft);
        shared
    }

    /// Drop the draft; the next access starts from an empty plan.
    pub async fn discard(&self, user_id: Uuid) -> bool {
        self.drafts.write().await.remove(&user_id).is_some()
    }

    /// Drop drafts untouched for `max_idle`. A draft still held by a request
    /// is kept. Returns how many were dropped.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut drafts = self.drafts.write().await;
        let before = drafts.len();
        drafts.retain(|_, d| d.touched.elapsed() < max_idle || Arc::strong_count(&d.store) > 1);
        before - drafts.len()
    }

    pub async fn draft_count(&self) -> usize {
        self.drafts.read().await.len()
    }
}

/// Periodically drop idle drafts until the process exits.
pub async fn evict_idle_drafts(sessions: Arc<PlannerSessions>, max_idle: Duration) {
    let mut tick = tokio::time::interval((max_idle / 4).max(Duration::from_secs(1)));
    loop {
        tick.tick().await;
        let dropped = sessions.evict_idle(max_idle).await;
        if dropped > 0 {
            let remaining = sessions.draft_count().await;
            info!(dropped, remaining, "idle drafts evicted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::model::MealType;
    use crate::recipes::model::fixtures::recipe;

    #[tokio::test]
    async fn drafts_are_per_user_and_persist_between_calls() {
        let sessions = PlannerSessions::new(7);
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        sessions
            .get(alice)
            .await
            .lock()
            .await
            .update_meal(MealType::Lunch, Some(recipe("Soup", "lunch", 300.0)), None)
            .unwrap();

        assert_eq!(sessions.get(alice).await.lock().await.days[0].meals.lunch.len(), 1);
        assert!(sessions.get(bob).await.lock().await.days[0].meals.lunch.is_empty());
        assert_eq!(sessions.get(bob).await.lock().await.days.len(), 7);
    }

    #[tokio::test]
    async fn discard_starts_over() {
        let sessions = PlannerSessions::new(3);
        let user = Uuid::new_v4();
        sessions.get(user).await.lock().await.select_day(2).unwrap();
        assert!(sessions.discard(user).await);
        assert!(!sessions.discard(user).await);
        assert_eq!(sessions.get(user).await.lock().await.current_day, 0);
    }

    #[tokio::test]
    async fn replace_installs_the_given_store() {
        let sessions = PlannerSessions::new(7);
        let user = Uuid::new_v4();
        sessions.replace(user, MealSlotStore::new(3)).await;
        assert_eq!(sessions.get(user).await.lock().await.days.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_drafts_are_evicted() {
        let sessions = PlannerSessions::new(7);
        let idle = Uuid::new_v4();
        let active = Uuid::new_v4();
        sessions.get(idle).await.lock().await.select_day(4).unwrap();
        sessions.get(active).await;

        tokio::time::advance(Duration::from_secs(50 * 60)).await;
        sessions.get(active).await;
        tokio::time::advance(Duration::from_secs(20 * 60)).await;

        assert_eq!(sessions.evict_idle(Duration::from_secs(3600)).await, 1);
        assert_eq!(sessions.draft_count().await, 1);
        assert_eq!(sessions.get(idle).await.lock().await.current_day, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn drafts_in_use_survive_eviction() {
        let sessions = PlannerSessions::new(7);
        let user = Uuid::new_v4();
        let held = sessions.get(user).await;

        tokio::time::advance(Duration::from_secs(7200)).await;
        assert_eq!(sessions.evict_idle(Duration::from_secs(3600)).await, 0);

        drop(held);
        assert_eq!(sessions.evict_idle(Duration::from_secs(3600)).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_runs_in_the_background() {
        let sessions = Arc::new(PlannerSessions::new(7));
        sessions.get(Uuid::new_v4()).await;
        let sweeper = tokio::spawn(evict_idle_drafts(sessions.clone(), Duration::from_secs(60)));

        tokio::time::sleep(Duration::from_secs(90)).await;
        assert_eq!(sessions.draft_count().await, 0);
        sweeper.abort();
    }
}
