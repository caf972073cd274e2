//! Loop arithmetic for the background video
//!
//! The clip of length `L` is played forward then backward, forming a
//! palindrome unit of length `2L` whose end frame matches its start frame.
//! Units are repeated until they cover the audio duration `D`, then the
//! result is trimmed to exactly `D`.

use serde::Serialize;

use crate::error::{BeatloopError, Result};

/// Guards `floor(D * fps)` against values like 527.9999999
const FRAME_EPSILON: f64 = 1e-9;

/// Upper bound on palindrome units in one render
pub const MAX_UNITS: u32 = 1024;

/// How a loop clip is repeated to cover an audio track
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoopPlan {
    audio_secs: f64,
    clip_secs: f64,
    units: u32,
}

impl LoopPlan {
    /// Plan a loop for `audio_secs` of audio over a clip of `clip_secs`
    ///
    /// # Errors
    /// * `InvalidSettings` - Either duration is not a positive finite number,
    ///   or the clip is so short that more than `MAX_UNITS` units are needed
    pub fn new(audio_secs: f64, clip_secs: f64) -> Result<Self> {
        for (param, value) in [("audio_duration", audio_secs), ("clip_duration", clip_secs)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(BeatloopError::InvalidSettings {
                    param: param.to_string(),
                    value: value.to_string(),
                    expected: "a positive number of seconds".to_string(),
                });
            }
        }

        let units = (audio_secs / (2.0 * clip_secs)).ceil().max(1.0);
        if units > MAX_UNITS as f64 {
            return Err(BeatloopError::InvalidSettings {
                param: "clip_duration".to_string(),
                value: clip_secs.to_string(),
                expected: format!("a clip covering {audio_secs}s of audio in at most {MAX_UNITS} loops"),
            });
        }
        Ok(Self {
            audio_secs,
            clip_secs,
            units: units as u32,
        })
    }

    /// Number of palindrome units concatenated
    pub fn units(&self) -> u32 {
        self.units
    }

    pub fn clip_secs(&self) -> f64 {
        self.clip_secs
    }

    /// Length of one forward+reverse unit
    pub fn unit_secs(&self) -> f64 {
        2.0 * self.clip_secs
    }

    /// Length of the untrimmed concatenation, always >= the output
    pub fn covered_secs(&self) -> f64 {
        self.units as f64 * self.unit_secs()
    }

    /// Output duration: the audio duration, never rounded up
    pub fn output_secs(&self) -> f64 {
        self.audio_secs
    }

    /// Frames rendered at `fps`: `floor(D * fps)`
    pub fn frame_count(&self, fps: u32) -> u64 {
        (self.audio_secs * fps as f64 + FRAME_EPSILON).floor() as u64
    }

    /// Clip timestamp shown at output time `t`
    ///
    /// Returns `None` outside `[0, D)`. Within a unit the first half maps
    /// forward (`0..L`) and the second half backward (`L..0`), so the value
    /// is continuous across unit seams.
    pub fn source_time_at(&self, t: f64) -> Option<f64> {
        if !(0.0..self.audio_secs).contains(&t) {
            return None;
        }
        let phase = t % self.unit_secs();
        Some(if phase <= self.clip_secs {
            phase
        } else {
            self.unit_secs() - phase
        })
    }

    /// Output times where one unit ends and the next begins
    pub fn seams(&self) -> Vec<f64> {
        (1..self.units)
            .map(|k| k as f64 * self.unit_secs())
            .filter(|&t| t < self.audio_secs)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use test_case::test_case;

    #[test]
    fn test_audio_longer_than_unit() {
        let plan = LoopPlan::new(22.0, 8.0).unwrap();
        assert_eq!(plan.units(), 2);
        assert_eq!(plan.covered_secs(), 32.0);
        assert_eq!(plan.output_secs(), 22.0);
    }

    #[test]
    fn test_audio_shorter_than_clip() {
        let plan = LoopPlan::new(5.0, 8.0).unwrap();
        assert_eq!(plan.units(), 1);
        assert_eq!(plan.output_secs(), 5.0);
        assert!(plan.seams().is_empty());
    }

    #[test]
    fn test_exact_multiple_needs_no_extra_unit() {
        assert_eq!(LoopPlan::new(32.0, 8.0).unwrap().units(), 2);
        assert_eq!(LoopPlan::new(32.5, 8.0).unwrap().units(), 3);
    }

    #[test_case(30.0, 8.0, 24)]
    #[test_case(22.0, 8.0, 24)]
    #[test_case(5.0, 8.0, 24)]
    #[test_case(29.98, 3.3, 24)]
    #[test_case(119.999, 7.04, 24)]
    #[test_case(10.0 / 3.0, 1.0, 30)]
    fn test_frames_within_one_frame_of_audio(audio: f64, clip: f64, fps: u32) {
        let plan = LoopPlan::new(audio, clip).unwrap();
        let video = plan.frame_count(fps) as f64 / fps as f64;
        assert!((video - audio).abs() < 1.0 / fps as f64, "{video} vs {audio}");
        assert!(plan.covered_secs() >= audio);
    }

    #[test]
    fn test_planning_is_idempotent() {
        let a = LoopPlan::new(47.3, 8.0).unwrap();
        let b = LoopPlan::new(47.3, 8.0).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.frame_count(24), b.frame_count(24));
    }

    #[test]
    fn test_seams_are_continuous() {
        let plan = LoopPlan::new(70.0, 8.0).unwrap();
        let seams = plan.seams();
        assert_eq!(seams, vec![16.0, 32.0, 48.0, 64.0]);

        let eps = 1e-6;
        for seam in seams {
            let before = plan.source_time_at(seam - eps).unwrap();
            let at = plan.source_time_at(seam).unwrap();
            assert_abs_diff_eq!(before, at, epsilon = 1e-5);
            assert_abs_diff_eq!(at, 0.0);
        }
        // Turnaround in the middle of a unit is continuous too
        assert_abs_diff_eq!(plan.source_time_at(8.0).unwrap(), 8.0);
        assert_abs_diff_eq!(plan.source_time_at(8.0 + eps).unwrap(), 8.0, epsilon = 1e-5);
    }

    #[test]
    fn test_source_time_mirrors() {
        let plan = LoopPlan::new(30.0, 8.0).unwrap();
        assert_abs_diff_eq!(plan.source_time_at(3.0).unwrap(), 3.0);
        assert_abs_diff_eq!(plan.source_time_at(13.0).unwrap(), 3.0);
        assert_abs_diff_eq!(plan.source_time_at(19.0).unwrap(), 3.0);
        assert_eq!(plan.source_time_at(30.0), None);
        assert_eq!(plan.source_time_at(-0.1), None);
    }

    #[test_case(0.0, 8.0)]
    #[test_case(10.0, 0.0)]
    #[test_case(f64::NAN, 8.0)]
    #[test_case(10.0, f64::INFINITY)]
    fn test_rejects_bad_durations(audio: f64, clip: f64) {
        assert!(LoopPlan::new(audio, clip).is_err());
    }

    #[test]
    fn test_rejects_degenerate_clip() {
        let err = LoopPlan::new(120.0, 4e-6).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_SETTINGS");

        let limit = 120.0 / (2.0 * MAX_UNITS as f64);
        assert_eq!(LoopPlan::new(120.0, limit).unwrap().units(), MAX_UNITS);
        assert!(LoopPlan::new(120.0, limit * 0.99).is_err());
    }
}
