//! HTTP bridge to a music generation server
//!
//! The model runs in a separate process (typically a Python server holding a
//! MusicGen checkpoint on the GPU). We POST the prompts and sampling
//! parameters; the server writes one float WAV per prompt into a hand-off
//! directory we choose and replies with the paths. The hand-off files are
//! read back into memory and removed.
//!
//! Wire protocol:
//! - `GET  {url}/health` returns 2xx when a model is loaded
//! - `POST {url}/generate` with [`BridgeRequest`], answered by [`BridgeResponse`]

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::model::{GenerationParams, ModelInfo, MusicModel, MUSICGEN_SAMPLE_RATE};
use crate::engine::{read_waveform, Waveform};
use crate::error::{BeatloopError, Result};

/// Default bridge endpoint
pub const DEFAULT_BRIDGE_URL: &str = "http://localhost:8001";

/// Default request timeout; long generations on small GPUs take minutes
pub const DEFAULT_BRIDGE_TIMEOUT_MS: u64 = 300_000;

/// Request sent to the bridge
#[derive(Debug, Serialize)]
struct BridgeRequest<'a> {
    prompts: &'a [String],
    #[serde(flatten)]
    params: GenerationParams,
    output_dir: String,
}

/// Response from the bridge
#[derive(Debug, Deserialize)]
struct BridgeResponse {
    success: bool,
    #[serde(default)]
    output_paths: Vec<String>,
    #[serde(default)]
    sample_rate: Option<u32>,
    #[serde(default)]
    processing_time_ms: u64,
    error_message: Option<String>,
}

/// Music model served over HTTP
pub struct BridgeModel {
    info: ModelInfo,
    bridge_url: String,
    timeout_ms: u64,
    sample_rate: u32,
    params: GenerationParams,
    handoff_dir: PathBuf,
}

impl BridgeModel {
    /// Create a bridge client
    ///
    /// `sample_rate` is what the served model is expected to produce; the
    /// rate reported by each response wins if they differ.
    pub fn new(bridge_url: impl Into<String>, timeout_ms: u64, sample_rate: u32) -> Self {
        Self {
            info: ModelInfo {
                id: "musicgen-bridge".to_string(),
                name: "MusicGen (HTTP bridge)".to_string(),
                version: "1".to_string(),
                description: "Text-to-music generation via a local model server".to_string(),
                limitations: vec![
                    "Requires the bridge server to be running".to_string(),
                    "Non-deterministic output".to_string(),
                    "Long durations can exhaust GPU memory".to_string(),
                ],
            },
            bridge_url: bridge_url.into().trim_end_matches('/').to_string(),
            timeout_ms,
            sample_rate,
            params: GenerationParams::default(),
            handoff_dir: std::env::temp_dir().join("beatloop-bridge"),
        }
    }

    /// Directory the server writes its WAV files into
    pub fn with_handoff_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.handoff_dir = dir.into();
        self
    }

    pub fn bridge_url(&self) -> &str {
        &self.bridge_url
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    fn generate_url(&self) -> String {
        format!("{}/generate", self.bridge_url)
    }

    /// Check if the bridge is reachable
    #[cfg(feature = "bridge")]
    fn check_bridge_health(&self) -> bool {
        let client = match reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
        {
            Ok(client) => client,
            Err(_) => return false,
        };

        let url = format!("{}/health", self.bridge_url);
        match client.get(&url).send() {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    #[cfg(not(feature = "bridge"))]
    fn check_bridge_health(&self) -> bool {
        false
    }

    /// Send request to the bridge
    #[cfg(feature = "bridge")]
    fn send_request(&self, request: &BridgeRequest<'_>) -> Result<BridgeResponse> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .build()
            .map_err(|e| BeatloopError::ModelUnavailable {
                reason: format!("Failed to build HTTP client: {e}"),
            })?;

        let response = client
            .post(self.generate_url())
            .json(request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    BeatloopError::model(format!(
                        "Bridge did not answer within {} ms",
                        self.timeout_ms
                    ))
                } else if e.is_connect() {
                    BeatloopError::ModelUnavailable {
                        reason: format!("Cannot connect to bridge at {}: {e}", self.bridge_url),
                    }
                } else {
                    BeatloopError::ModelInvocation {
                        reason: "Bridge request failed".to_string(),
                        source: Some(Box::new(e)),
                    }
                }
            })?;

        if !response.status().is_success() {
            return Err(BeatloopError::model(format!(
                "Bridge returned error: {}",
                response.status()
            )));
        }

        response
            .json::<BridgeResponse>()
            .map_err(|e| BeatloopError::ModelInvocation {
                reason: "Invalid response from bridge".to_string(),
                source: Some(Box::new(e)),
            })
    }

    #[cfg(not(feature = "bridge"))]
    fn send_request(&self, _request: &BridgeRequest<'_>) -> Result<BridgeResponse> {
        Err(BeatloopError::ModelUnavailable {
            reason: "Bridge support not compiled. Build with --features bridge".to_string(),
        })
    }

    /// Turn a bridge response into waveforms, consuming the hand-off files
    ///
    /// Every returned path must resolve inside the hand-off directory. Paths
    /// outside it are rejected and never touched; files inside it are
    /// removed whether or not the response is usable.
    fn collect_outputs(&self, response: BridgeResponse, expected: usize) -> Result<Vec<Waveform>> {
        if !response.success {
            return Err(BeatloopError::model(
                response
                    .error_message
                    .unwrap_or_else(|| "Unknown bridge error".to_string()),
            ));
        }

        let handoff_dir = std::fs::canonicalize(&self.handoff_dir).map_err(|e| {
            BeatloopError::ModelInvocation {
                reason: format!("Hand-off directory {} unusable", self.handoff_dir.display()),
                source: Some(Box::new(e)),
            }
        })?;

        let mut owned = Vec::with_capacity(response.output_paths.len());
        let mut foreign = Vec::new();
        for path in &response.output_paths {
            match std::fs::canonicalize(path) {
                Ok(resolved) if resolved.starts_with(&handoff_dir) => owned.push(resolved),
                _ => foreign.push(path.as_str()),
            }
        }

        let result = if !foreign.is_empty() {
            warn!(?foreign, dir = %handoff_dir.display(), "bridge returned paths outside hand-off dir");
            Err(BeatloopError::model(format!(
                "Bridge returned {} output path(s) missing or outside {}",
                foreign.len(),
                handoff_dir.display()
            )))
        } else if owned.len() != expected {
            Err(BeatloopError::model(format!(
                "Bridge returned {} outputs for {} prompts",
                owned.len(),
                expected
            )))
        } else {
            owned
                .iter()
                .map(|path| self.read_output(path, response.sample_rate))
                .collect()
        };

        for path in &owned {
            remove_handoff(path);
        }
        result
    }

    fn read_output(&self, path: &Path, reported_rate: Option<u32>) -> Result<Waveform> {
        let wave = read_waveform(path).map_err(|e| BeatloopError::ModelInvocation {
            reason: format!("Unreadable model output {}", path.display()),
            source: Some(Box::new(e)),
        })?;
        if let Some(rate) = reported_rate {
            if rate != wave.sample_rate {
                warn!(reported = rate, actual = wave.sample_rate, "bridge sample rate mismatch");
            }
        }
        Ok(wave)
    }
}

fn remove_handoff(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        debug!(path = %path.display(), error = %e, "could not remove bridge output");
    }
}

impl Default for BridgeModel {
    fn default() -> Self {
        Self::new(DEFAULT_BRIDGE_URL, DEFAULT_BRIDGE_TIMEOUT_MS, MUSICGEN_SAMPLE_RATE)
    }
}

impl MusicModel for BridgeModel {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn set_generation_params(&mut self, params: GenerationParams) -> Result<()> {
        self.params = params;
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.check_bridge_health()
    }

    fn generate(&self, prompts: &[String]) -> Result<Vec<Waveform>> {
        let start = Instant::now();
        std::fs::create_dir_all(&self.handoff_dir)?;

        let request = BridgeRequest {
            prompts,
            params: self.params,
            output_dir: self.handoff_dir.to_string_lossy().to_string(),
        };
        debug!(url = %self.generate_url(), prompts = prompts.len(), "sending generation request");

        let response = self.send_request(&request)?;
        let server_ms = response.processing_time_ms;
        let waveforms = self.collect_outputs(response, prompts.len())?;

        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            server_ms, "bridge generation finished"
        );
        Ok(waveforms)
    }
}
