//! Round lifecycle engine: phase-gated caption and vote operations, winner
//! computation and round advancement.
//!
//! Every operation re-reads the current round, computes the new value and writes it
//! back with a conditional store. A lost race re-runs the whole cycle from a fresh
//! read, up to the configured number of attempts.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    config::AppConfig,
    dao::{
        models::RoundEntity,
        round::RoundRepository,
        round_store::{ROUND_KEY, RoundStore, Versioned, WriteOutcome},
        storage::StorageError,
    },
    error::ServiceError,
    services::{content_source::ContentResolver, leaderboard_service::LeaderboardTracker},
    state::{
        round::{Caption, Round},
        state_machine::{RoundEvent, RoundPhase},
    },
};

/// Tunables of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Reject a second vote from the same user within a round.
    pub single_vote_per_user: bool,
    /// Longest accepted caption, counted in characters after trimming.
    pub max_caption_chars: usize,
    /// Conditional write attempts before an operation reports contention.
    pub max_write_attempts: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for EngineOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            single_vote_per_user: config.rules.single_vote_per_user,
            max_caption_chars: config.rules.max_caption_chars,
            max_write_attempts: config.max_write_attempts,
        }
    }
}

/// Who asked for a phase advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceTrigger {
    /// Explicit request, always applied to whatever phase is current.
    Manual,
    /// Phase timer armed for the given round and phase; ignored once stale.
    Timer { round_id: u64, phase: RoundPhase },
}

/// Result of [`RoundEngine::advance_phase`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The round moved to its next phase (or was replaced by the next round).
    Advanced(Round),
    /// Nothing changed: another transition was in flight or the trigger was stale.
    Unchanged(Round),
}

impl AdvanceOutcome {
    /// The round after the call, whether or not it changed.
    pub fn round(&self) -> &Round {
        match self {
            AdvanceOutcome::Advanced(round) | AdvanceOutcome::Unchanged(round) => round,
        }
    }

    /// Consume the outcome, keeping only the round.
    pub fn into_round(self) -> Round {
        match self {
            AdvanceOutcome::Advanced(round) | AdvanceOutcome::Unchanged(round) => round,
        }
    }
}

/// Owns the round state machine on top of an injected [`RoundStore`].
pub struct RoundEngine {
    repository: RoundRepository,
    content: ContentResolver,
    leaderboard: LeaderboardTracker,
    options: EngineOptions,
    transition_gate: Mutex<()>,
}

impl RoundEngine {
    pub fn new(store: Arc<dyn RoundStore>, content: ContentResolver, options: EngineOptions) -> Self {
        let repository = RoundRepository::new(store);
        let leaderboard = LeaderboardTracker::new(repository.clone(), options.max_write_attempts);
        Self {
            repository,
            content,
            leaderboard,
            options: EngineOptions {
                max_write_attempts: options.max_write_attempts.max(1),
                ..options
            },
            transition_gate: Mutex::new(()),
        }
    }

    pub fn leaderboard(&self) -> &LeaderboardTracker {
        &self.leaderboard
    }

    pub fn repository(&self) -> &RoundRepository {
        &self.repository
    }

    /// Return the current round, creating round `1` when the store is empty.
    pub async fn current_round(&self) -> Result<Round, ServiceError> {
        Ok(self.load_or_bootstrap().await?.value)
    }

    /// Append a caption to the current round. Only legal during submission.
    pub async fn submit_caption(&self, text: &str, user_id: &str) -> Result<Round, ServiceError> {
        let max_chars = self.options.max_caption_chars;
        let round = self
            .update_round(|round| {
                round.status.apply(RoundEvent::SubmitCaption)?;

                let text = text.trim();
                if text.is_empty() {
                    return Err(ServiceError::InvalidInput(
                        "caption text must not be empty".into(),
                    ));
                }
                if text.chars().count() > max_chars {
                    return Err(ServiceError::InvalidInput(format!(
                        "caption text must be at most {max_chars} characters"
                    )));
                }
                ensure_user(user_id)?;

                round
                    .captions
                    .push(Caption::new(text.to_string(), user_id.to_string()));
                Ok(())
            })
            .await?;

        debug!(
            round_id = round.id,
            user_id,
            captions = round.captions.len(),
            "caption submitted"
        );
        Ok(round)
    }

    /// Add one vote to `caption_id`. Only legal during voting.
    ///
    /// Repeat votes from the same user are accepted unless
    /// [`EngineOptions::single_vote_per_user`] is set.
    pub async fn vote_caption(&self, caption_id: &str, user_id: &str) -> Result<Round, ServiceError> {
        let single_vote = self.options.single_vote_per_user;
        let round = self
            .update_round(|round| {
                round.status.apply(RoundEvent::Vote)?;
                ensure_user(user_id)?;

                let index = round.caption_index(caption_id).ok_or_else(|| {
                    ServiceError::NotFound(format!("caption `{caption_id}` not found"))
                })?;

                if single_vote && round.voters.contains(user_id) {
                    return Err(ServiceError::DuplicateVote(format!(
                        "user `{user_id}` already voted in round {}",
                        round.id
                    )));
                }

                let caption = &mut round.captions[index];
                caption.votes = caption.votes.saturating_add(1);

                if single_vote {
                    round.voters.insert(user_id.to_string());
                }
                Ok(())
            })
            .await?;

        debug!(round_id = round.id, caption_id, user_id, "vote recorded");
        Ok(round)
    }

    /// Move the current round to its next phase.
    ///
    /// Entering results computes the winner and credits it on the leaderboard;
    /// leaving results replaces the round with the next one. A call made while
    /// another advance is in flight returns the current round untouched.
    pub async fn advance_phase(
        &self,
        trigger: AdvanceTrigger,
    ) -> Result<AdvanceOutcome, ServiceError> {
        let Ok(_gate) = self.transition_gate.try_lock() else {
            debug!(?trigger, "phase transition already in flight; ignoring advance");
            return Ok(AdvanceOutcome::Unchanged(self.current_round().await?));
        };

        let mut next_content: Option<String> = None;
        for attempt in 1..=self.options.max_write_attempts {
            let Versioned {
                revision,
                value: current,
            } = self.load_or_bootstrap().await?;

            if let AdvanceTrigger::Timer { round_id, phase } = trigger {
                if current.id != round_id || current.status != phase {
                    debug!(
                        round_id,
                        ?phase,
                        current_round = current.id,
                        current_phase = ?current.status,
                        "ignoring stale timer"
                    );
                    return Ok(AdvanceOutcome::Unchanged(current));
                }
            }

            let next_phase = current.status.apply(RoundEvent::Advance)?;
            let next = match current.status {
                RoundPhase::Results => {
                    let content_ref = match next_content.as_ref() {
                        Some(content_ref) => content_ref.clone(),
                        None => {
                            let resolved = self.content.resolve().await;
                            next_content = Some(resolved.clone());
                            resolved
                        }
                    };
                    current.successor(content_ref)
                }
                RoundPhase::Voting => {
                    let mut next = current.clone();
                    next.status = next_phase;
                    next.winner = current.leading_caption().cloned();
                    next
                }
                RoundPhase::Submission => {
                    let mut next = current.clone();
                    next.status = next_phase;
                    next
                }
            };

            let entity = RoundEntity::from(next.clone());
            match self.repository.store_round(Some(revision), &entity).await? {
                WriteOutcome::Stored(_) => {
                    info!(
                        round_id = next.id,
                        from = ?current.status,
                        to = ?next.status,
                        ?trigger,
                        "round phase advanced"
                    );
                    if current.status == RoundPhase::Voting {
                        self.credit_winner(&next).await?;
                    }
                    return Ok(AdvanceOutcome::Advanced(next));
                }
                WriteOutcome::Conflict => {
                    debug!(attempt, round_id = current.id, "round changed during advance; retrying");
                }
            }
        }

        Err(self.contention())
    }

    /// Results were just written: credit the winner, if any, on the leaderboard.
    async fn credit_winner(&self, round: &Round) -> Result<(), ServiceError> {
        let Some(winner) = round.winner.as_ref() else {
            info!(round_id = round.id, "round ended without captions; no winner");
            return Ok(());
        };

        info!(
            round_id = round.id,
            caption_id = %winner.id,
            user_id = %winner.user_id,
            votes = winner.votes,
            "round winner decided"
        );
        if let Err(err) = self.leaderboard.record_win(&winner.user_id).await {
            warn!(error = %err, user_id = %winner.user_id, "failed to record round win");
            return Err(err);
        }
        Ok(())
    }

    async fn load_or_bootstrap(&self) -> Result<Versioned<Round>, ServiceError> {
        for _ in 0..self.options.max_write_attempts {
            if let Some(Versioned { revision, value }) = self.repository.load_round().await? {
                return Ok(Versioned {
                    revision,
                    value: value.into(),
                });
            }

            let round = Round::bootstrap(self.content.bootstrap_ref());
            let entity = RoundEntity::from(round.clone());
            match self.repository.store_round(None, &entity).await? {
                WriteOutcome::Stored(revision) => {
                    info!(round_id = round.id, content_ref = %round.content_ref, "bootstrapped first round");
                    return Ok(Versioned {
                        revision,
                        value: round,
                    });
                }
                // Someone else bootstrapped concurrently; read theirs.
                WriteOutcome::Conflict => continue,
            }
        }

        Err(self.contention())
    }

    async fn update_round<F>(&self, mut mutate: F) -> Result<Round, ServiceError>
    where
        F: FnMut(&mut Round) -> Result<(), ServiceError>,
    {
        for attempt in 1..=self.options.max_write_attempts {
            let Versioned {
                revision,
                value: mut round,
            } = self.load_or_bootstrap().await?;

            mutate(&mut round)?;

            let entity = RoundEntity::from(round.clone());
            match self.repository.store_round(Some(revision), &entity).await? {
                WriteOutcome::Stored(_) => return Ok(round),
                WriteOutcome::Conflict => {
                    debug!(attempt, round_id = round.id, "round changed concurrently; retrying");
                }
            }
        }

        Err(self.contention())
    }

    fn contention(&self) -> ServiceError {
        StorageError::Contention {
            key: ROUND_KEY,
            attempts: self.options.max_write_attempts,
        }
        .into()
    }
}

fn ensure_user(user_id: &str) -> Result<(), ServiceError> {
    if user_id.trim().is_empty() {
        return Err(ServiceError::InvalidInput("user id must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashSet,
        sync::atomic::{AtomicU32, Ordering},
        time::Duration,
    };

    use futures::future::{BoxFuture, ready};
    use serde_json::Value;

    use super::*;
    use crate::{
        dao::{
            round_store::{Revision, memory::MemoryRoundStore},
            storage::StorageResult,
        },
        services::content_source::{ContentError, ContentSource},
    };

    const POOL: [&str; 2] = ["/memes/meme1.png", "/memes/meme2.png"];

    fn pool() -> Vec<String> {
        POOL.iter().map(|entry| entry.to_string()).collect()
    }

    fn engine_with(store: Arc<dyn RoundStore>, options: EngineOptions) -> RoundEngine {
        RoundEngine::new(store, ContentResolver::local(pool()), options)
    }

    fn engine() -> RoundEngine {
        engine_with(Arc::new(MemoryRoundStore::new()), EngineOptions::default())
    }

    async fn advance(engine: &RoundEngine) -> Round {
        match engine.advance_phase(AdvanceTrigger::Manual).await.unwrap() {
            AdvanceOutcome::Advanced(round) => round,
            other => panic!("expected an advance, got {other:?}"),
        }
    }

    async fn engine_in(phase: RoundPhase) -> RoundEngine {
        let engine = engine();
        engine.current_round().await.unwrap();
        while engine.current_round().await.unwrap().status != phase {
            advance(&engine).await;
        }
        engine
    }

    /// Delegates to a memory store but reports a conflict for the first
    /// `conflicts` conditional writes.
    struct ContendedStore {
        inner: MemoryRoundStore,
        conflicts: AtomicU32,
    }

    impl ContendedStore {
        fn new(conflicts: u32) -> Self {
            Self {
                inner: MemoryRoundStore::new(),
                conflicts: AtomicU32::new(conflicts),
            }
        }
    }

    impl RoundStore for ContendedStore {
        fn load(
            &self,
            key: &'static str,
        ) -> BoxFuture<'static, StorageResult<Option<Versioned<Value>>>> {
            self.inner.load(key)
        }

        fn compare_and_set(
            &self,
            key: &'static str,
            expected: Option<Revision>,
            value: Value,
        ) -> BoxFuture<'static, StorageResult<WriteOutcome>> {
            let remaining = self.conflicts.load(Ordering::SeqCst);
            if expected.is_some() && remaining > 0 {
                self.conflicts.store(remaining - 1, Ordering::SeqCst);
                return Box::pin(ready(Ok(WriteOutcome::Conflict)));
            }
            self.inner.compare_and_set(key, expected, value)
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.health_check()
        }
    }

    struct UnreachableStore;

    impl RoundStore for UnreachableStore {
        fn load(
            &self,
            _key: &'static str,
        ) -> BoxFuture<'static, StorageResult<Option<Versioned<Value>>>> {
            let err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
            Box::pin(ready(Err(StorageError::unavailable("store down".into(), err))))
        }

        fn compare_and_set(
            &self,
            _key: &'static str,
            _expected: Option<Revision>,
            _value: Value,
        ) -> BoxFuture<'static, StorageResult<WriteOutcome>> {
            let err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
            Box::pin(ready(Err(StorageError::unavailable("store down".into(), err))))
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(ready(Ok(())))
        }
    }

    struct SlowSource;

    impl ContentSource for SlowSource {
        fn fetch(&self) -> BoxFuture<'static, Result<String, ContentError>> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok("https://i.example/slow.png".to_string())
            })
        }
    }

    #[tokio::test]
    async fn bootstrap_creates_first_submission_round() {
        let engine = engine();
        let round = engine.current_round().await.unwrap();
        assert_eq!(round.id, 1);
        assert_eq!(round.status, RoundPhase::Submission);
        assert!(round.captions.is_empty());
        assert_eq!(round.content_ref, POOL[0]);

        // A second read returns the persisted round instead of bootstrapping again.
        assert_eq!(engine.current_round().await.unwrap(), round);
    }

    #[tokio::test]
    async fn submissions_append_captions_with_unique_ids() {
        let engine = engine();
        let mut ids = HashSet::new();
        for n in 1..=5 {
            let round = engine
                .submit_caption(&format!("caption {n}"), "u1")
                .await
                .unwrap();
            assert_eq!(round.captions.len(), n);
            let last = round.captions.last().unwrap();
            assert_eq!(last.votes, 0);
            assert_eq!(last.user_id, "u1");
            assert!(ids.insert(last.id.clone()));
        }

        let texts: Vec<_> = engine
            .current_round()
            .await
            .unwrap()
            .captions
            .into_iter()
            .map(|caption| caption.text)
            .collect();
        assert_eq!(texts[0], "caption 1");
        assert_eq!(texts[4], "caption 5");
    }

    #[tokio::test]
    async fn blank_caption_is_rejected() {
        let engine = engine();
        for text in ["", "   ", "\n\t"] {
            let err = engine.submit_caption(text, "u1").await.unwrap_err();
            assert!(matches!(err, ServiceError::InvalidInput(_)), "{err:?}");
        }
        assert!(engine.current_round().await.unwrap().captions.is_empty());
    }

    #[tokio::test]
    async fn oversized_caption_is_rejected() {
        let engine = engine_with(
            Arc::new(MemoryRoundStore::new()),
            EngineOptions {
                max_caption_chars: 5,
                ..EngineOptions::default()
            },
        );
        let err = engine.submit_caption("too long", "u1").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert_eq!(engine.submit_caption("  short  ", "u1").await.unwrap().captions[0].text, "short");
    }

    #[tokio::test]
    async fn operations_are_gated_by_phase() {
        for phase in [RoundPhase::Submission, RoundPhase::Voting, RoundPhase::Results] {
            let engine = engine_in(phase).await;

            let submitted = engine.submit_caption("lol", "u1").await;
            if phase == RoundPhase::Submission {
                assert!(submitted.is_ok());
            } else {
                assert!(
                    matches!(submitted, Err(ServiceError::InvalidPhase(_))),
                    "submit during {phase:?}: {submitted:?}"
                );
            }

            let voted = engine.vote_caption("missing", "u2").await;
            if phase == RoundPhase::Voting {
                assert!(matches!(voted, Err(ServiceError::NotFound(_))));
            } else {
                assert!(
                    matches!(voted, Err(ServiceError::InvalidPhase(_))),
                    "vote during {phase:?}: {voted:?}"
                );
            }
        }
    }

    #[tokio::test]
    async fn unknown_caption_vote_leaves_counts_untouched() {
        let engine = engine();
        engine.submit_caption("lol", "u1").await.unwrap();
        advance(&engine).await;

        let err = engine.vote_caption("nope", "u2").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        let round = engine.current_round().await.unwrap();
        assert!(round.captions.iter().all(|caption| caption.votes == 0));
    }

    #[tokio::test]
    async fn repeat_votes_are_allowed_by_default() {
        let engine = engine();
        let id = engine.submit_caption("lol", "u1").await.unwrap().captions[0].id.clone();
        advance(&engine).await;

        engine.vote_caption(&id, "u2").await.unwrap();
        let round = engine.vote_caption(&id, "u2").await.unwrap();
        assert_eq!(round.captions[0].votes, 2);
        assert!(round.voters.is_empty());
    }

    #[tokio::test]
    async fn single_vote_guard_rejects_second_vote() {
        let engine = engine_with(
            Arc::new(MemoryRoundStore::new()),
            EngineOptions {
                single_vote_per_user: true,
                ..EngineOptions::default()
            },
        );
        let round = engine.submit_caption("a", "u1").await.unwrap();
        let first = round.captions[0].id.clone();
        let round = engine.submit_caption("b", "u3").await.unwrap();
        let second = round.captions[1].id.clone();
        advance(&engine).await;

        engine.vote_caption(&first, "u2").await.unwrap();
        let err = engine.vote_caption(&second, "u2").await.unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateVote(_)));

        let round = engine.vote_caption(&second, "u4").await.unwrap();
        assert_eq!(round.captions[0].votes, 1);
        assert_eq!(round.captions[1].votes, 1);
    }

    #[tokio::test]
    async fn guarded_vote_for_unknown_caption_is_not_found() {
        let engine = engine_with(
            Arc::new(MemoryRoundStore::new()),
            EngineOptions {
                single_vote_per_user: true,
                ..EngineOptions::default()
            },
        );
        let round = engine.submit_caption("a", "u1").await.unwrap();
        let caption_id = round.captions[0].id.clone();
        advance(&engine).await;
        engine.vote_caption(&caption_id, "u2").await.unwrap();

        let err = engine.vote_caption("missing", "u2").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)), "{err:?}");
        assert_eq!(engine.current_round().await.unwrap().captions[0].votes, 1);
    }

    #[tokio::test]
    async fn tie_goes_to_earliest_caption() {
        let engine = engine();
        let mut ids = Vec::new();
        for (text, user) in [("A", "ua"), ("B", "ub"), ("C", "uc")] {
            let round = engine.submit_caption(text, user).await.unwrap();
            ids.push(round.captions.last().unwrap().id.clone());
        }
        advance(&engine).await;

        for (id, votes) in ids.iter().zip([3, 5, 5]) {
            for _ in 0..votes {
                engine.vote_caption(id, "voter").await.unwrap();
            }
        }

        let results = advance(&engine).await;
        assert_eq!(results.status, RoundPhase::Results);
        let winner = results.winner.unwrap();
        assert_eq!(winner.text, "B");
        assert_eq!(winner.votes, 5);

        let entries = engine.leaderboard().snapshot().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].user_id, "ub");
    }

    #[tokio::test]
    async fn empty_round_has_no_winner() {
        let engine = engine();
        advance(&engine).await;
        let results = advance(&engine).await;

        assert_eq!(results.status, RoundPhase::Results);
        assert!(results.winner.is_none());
        assert!(engine.leaderboard().snapshot().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn round_ids_increment_on_each_new_round() {
        let engine = engine();
        assert_eq!(engine.current_round().await.unwrap().id, 1);

        for expected in 2..=4 {
            advance(&engine).await;
            advance(&engine).await;
            let next = advance(&engine).await;
            assert_eq!(next.id, expected);
            assert_eq!(next.status, RoundPhase::Submission);
            assert!(next.captions.is_empty());
            assert!(POOL.contains(&next.content_ref.as_str()));
        }
    }

    #[tokio::test]
    async fn full_round_scenario() {
        let engine = engine();
        assert_eq!(engine.current_round().await.unwrap().id, 1);

        let round = engine.submit_caption("lol", "u1").await.unwrap();
        let caption_id = round.captions[0].id.clone();

        assert_eq!(advance(&engine).await.status, RoundPhase::Voting);
        engine.vote_caption(&caption_id, "u2").await.unwrap();

        let results = advance(&engine).await;
        assert_eq!(results.status, RoundPhase::Results);
        assert_eq!(results.winner.as_ref().map(|w| w.user_id.as_str()), Some("u1"));
        let entries = engine.leaderboard().snapshot().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].user_id, "u1");
        assert_eq!(entries[0].wins, 1);

        let next = advance(&engine).await;
        assert_eq!(next.id, 2);
        assert_eq!(next.status, RoundPhase::Submission);
        assert!(next.captions.is_empty());
        assert!(next.winner.is_none());
        assert_eq!(engine.current_round().await.unwrap(), next);
    }

    #[tokio::test]
    async fn stale_timer_trigger_is_ignored() {
        let engine = engine();
        engine.current_round().await.unwrap();
        advance(&engine).await;

        let outcome = engine
            .advance_phase(AdvanceTrigger::Timer {
                round_id: 1,
                phase: RoundPhase::Submission,
            })
            .await
            .unwrap();
        assert!(matches!(outcome, AdvanceOutcome::Unchanged(_)));
        assert_eq!(outcome.round().status, RoundPhase::Voting);

        let outcome = engine
            .advance_phase(AdvanceTrigger::Timer {
                round_id: 1,
                phase: RoundPhase::Voting,
            })
            .await
            .unwrap();
        assert!(matches!(outcome, AdvanceOutcome::Advanced(_)));
        assert_eq!(outcome.round().status, RoundPhase::Results);
    }

    #[tokio::test]
    async fn conflicting_writes_are_retried() {
        let engine = engine_with(Arc::new(ContendedStore::new(2)), EngineOptions::default());
        let round = engine.submit_caption("lol", "u1").await.unwrap();
        assert_eq!(round.captions.len(), 1);
        assert_eq!(engine.current_round().await.unwrap().captions.len(), 1);
    }

    #[tokio::test]
    async fn persistent_conflicts_surface_as_store_unavailable() {
        let engine = engine_with(Arc::new(ContendedStore::new(10)), EngineOptions::default());
        let err = engine.submit_caption("lol", "u1").await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::StoreUnavailable(StorageError::Contention { attempts: 3, .. })
        ));
        assert!(engine.current_round().await.unwrap().captions.is_empty());
    }

    #[tokio::test]
    async fn store_failures_are_propagated() {
        let engine = engine_with(Arc::new(UnreachableStore), EngineOptions::default());
        assert!(matches!(
            engine.current_round().await,
            Err(ServiceError::StoreUnavailable(StorageError::Unavailable { .. }))
        ));
        assert!(matches!(
            engine.advance_phase(AdvanceTrigger::Manual).await,
            Err(ServiceError::StoreUnavailable(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_advance_is_a_no_op() {
        let engine = Arc::new(RoundEngine::new(
            Arc::new(MemoryRoundStore::new()),
            ContentResolver::new(Some(Arc::new(SlowSource)), pool(), Duration::from_secs(2)),
            EngineOptions::default(),
        ));
        advance(&engine).await;
        advance(&engine).await;

        let background = Arc::clone(&engine);
        let first = tokio::spawn(async move {
            background.advance_phase(AdvanceTrigger::Manual).await
        });
        // Let the first advance reach the slow content lookup.
        tokio::time::sleep(Duration::from_millis(100)).await;

        let second = engine.advance_phase(AdvanceTrigger::Manual).await.unwrap();
        assert!(matches!(second, AdvanceOutcome::Unchanged(_)));
        assert_eq!(second.round().status, RoundPhase::Results);

        let first = first.await.unwrap().unwrap();
        assert_eq!(first.round().id, 2);
        assert_eq!(first.round().content_ref, "https://i.example/slow.png");
        assert_eq!(engine.current_round().await.unwrap().id, 2);
    }
}
