//! AI scheduling: creatures near the player are handed to a fixed worker pool each frame

pub mod scheduler;

pub use scheduler::{AiTask, AiWorkerPool};
