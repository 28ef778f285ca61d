/// Remote content lookup with a local fallback pool.
pub mod content_source;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Win tally persisted next to the round.
pub mod leaderboard_service;
/// Automatic phase advancement.
pub mod phase_timer;
/// Round lifecycle rules and conditional persistence.
pub mod round_engine;
/// Round operations exposed over HTTP.
pub mod round_service;
