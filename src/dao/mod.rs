/// Database model definitions.
pub mod models;
/// Typed access to the round and leaderboard documents.
pub mod round;
/// Versioned key-value stores holding the serialized documents.
pub mod round_store;
/// Storage abstraction layer for database operations.
pub mod storage;
