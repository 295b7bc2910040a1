//! Decorative heart-rate readout.
//!
//! Samples either come from the simulator (uniform 60..=100 BPM, like the chart
//! in the survey view) or are pushed by a client device. Only the most recent
//! `WINDOW` samples are kept.

use std::collections::VecDeque;
use std::ops::RangeInclusive;

use chrono::Utc;
use rand::Rng;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::HeartSample;

pub const WINDOW: usize = 30;
pub const SIMULATED_BPM: RangeInclusive<u16> = 60..=100;
pub const ACCEPTED_BPM: RangeInclusive<u16> = 30..=220;

#[derive(Default)]
pub struct HeartMonitor {
  samples: RwLock<VecDeque<HeartSample>>,
}

impl HeartMonitor {
  pub fn new() -> Self {
    Self::default()
  }

  async fn push_sample(&self, sample: HeartSample) {
    let mut samples = self.samples.write().await;
    samples.push_back(sample);
    while samples.len() > WINDOW {
      samples.pop_front();
    }
  }

  /// Generate one simulated beat and append it.
  pub async fn tick(&self) -> HeartSample {
    let bpm = rand::thread_rng().gen_range(SIMULATED_BPM);
    let sample = HeartSample { at: Utc::now(), bpm };
    self.push_sample(sample).await;
    debug!(target: "herdcheck", bpm, "Simulated heart beat");
    sample
  }

  /// Record a client-reported reading.
  pub async fn record(&self, bpm: u16) -> Result<HeartSample, String> {
    if !ACCEPTED_BPM.contains(&bpm) {
      return Err(format!(
        "bpm must be between {} and {}, got {}",
        ACCEPTED_BPM.start(),
        ACCEPTED_BPM.end(),
        bpm
      ));
    }
    let sample = HeartSample { at: Utc::now(), bpm };
    self.push_sample(sample).await;
    Ok(sample)
  }

  /// Oldest first.
  pub async fn recent(&self) -> Vec<HeartSample> {
    self.samples.read().await.iter().copied().collect()
  }
}
