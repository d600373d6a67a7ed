//! Runtime adapters for spawning toolkit background work.

pub mod tokio_spawner;

pub use tokio_spawner::TokioSpawner;
