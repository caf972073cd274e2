//! Music model interfaces and implementations
//!
//! This module provides:
//! - `MusicModel` trait, the boundary to the generative model
//! - `BridgeModel`, an HTTP client for a model server
//! - `MockMusicModel` for tests and dry runs

mod bridge;
mod mock;
mod model;

pub use bridge::{BridgeModel, DEFAULT_BRIDGE_TIMEOUT_MS, DEFAULT_BRIDGE_URL};
pub use mock::{MockMusicModel, MOCK_SAMPLE_RATE};
pub use model::{GenerationParams, ModelInfo, MusicModel, MUSICGEN_SAMPLE_RATE};
