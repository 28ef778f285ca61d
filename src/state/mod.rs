pub mod leaderboard;
pub mod round;
pub mod state_machine;
pub mod transitions;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    dao::round_store::RoundStore,
    services::{
        content_source::ContentResolver,
        phase_timer::PhaseTimer,
        round_engine::{EngineOptions, RoundEngine},
    },
};

pub type SharedState = Arc<AppState>;

/// Central application state: the round engine and the timer driving it.
pub struct AppState {
    engine: Arc<RoundEngine>,
    timer: Arc<PhaseTimer>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(store: Arc<dyn RoundStore>, config: AppConfig) -> SharedState {
        let content = ContentResolver::from_config(&config.content);
        Self::with_content(store, content, config)
    }

    /// Same as [`AppState::new`] with an explicit content resolver.
    pub fn with_content(
        store: Arc<dyn RoundStore>,
        content: ContentResolver,
        config: AppConfig,
    ) -> SharedState {
        let engine = Arc::new(RoundEngine::new(
            store,
            content,
            EngineOptions::from(&config),
        ));
        let timer = PhaseTimer::new(Arc::clone(&engine), config.timers.clone());
        Arc::new(Self { engine, timer })
    }

    /// Round lifecycle engine backed by the configured store.
    pub fn engine(&self) -> &RoundEngine {
        &self.engine
    }

    /// Driver advancing phases when their time is up.
    pub fn timer(&self) -> &Arc<PhaseTimer> {
        &self.timer
    }
}
