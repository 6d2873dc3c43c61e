//! Angle smoothing - rolling mean over the last few frames
//!
//! Landmark positions jitter from frame to frame. The rep counter reads
//! smoothed angles so a single noisy frame cannot cross a threshold.

use std::collections::{HashMap, VecDeque};

use crate::JointFeature;

/// Bounded FIFO of raw angle samples for one joint
/// INVARIANT: `samples.len() <= window`, oldest evicted first
#[derive(Debug, Clone)]
pub struct SmoothedAngle {
    window: usize,
    samples: VecDeque<f32>,
}

impl SmoothedAngle {
    /// A window of 0 is treated as 1
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            samples: VecDeque::with_capacity(window),
        }
    }

    pub fn push(&mut self, raw: f32) {
        if self.samples.len() == self.window {
            self.samples.pop_front();
        }
        self.samples.push_back(raw);
    }

    /// Mean of the buffered samples, `None` before the first push
    pub fn value(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f32>() / self.samples.len() as f32)
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Buffered samples, oldest first
    pub fn samples(&self) -> impl Iterator<Item = f32> + '_ {
        self.samples.iter().copied()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Independent smoothing windows keyed by joint
#[derive(Debug, Clone)]
pub struct AngleSmoother {
    window: usize,
    channels: HashMap<JointFeature, SmoothedAngle>,
}

impl AngleSmoother {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            channels: HashMap::new(),
        }
    }

    pub fn push(&mut self, joint: JointFeature, raw: f32) {
        let window = self.window;
        self.channels
            .entry(joint)
            .or_insert_with(|| SmoothedAngle::new(window))
            .push(raw);
    }

    pub fn value(&self, joint: JointFeature) -> Option<f32> {
        self.channels.get(&joint).and_then(SmoothedAngle::value)
    }

    pub fn channel(&self, joint: JointFeature) -> Option<&SmoothedAngle> {
        self.channels.get(&joint)
    }

    pub fn clear(&mut self) {
        for channel in self.channels.values_mut() {
            channel.clear();
        }
    }
}
