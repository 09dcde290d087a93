// Copyright (c) James Kassemi, SC, US. All rights reserved.

use serde::{Deserialize, Serialize};

/// Declarative "load when close to the loaded edge" policy.
///
/// Building block for [`FrameSource`](crate::FrameSource) predicates:
/// fires once the distance between the requested frame's bound and the
/// loaded edge drops to `margin` or below. A margin of 0 waits until the
/// frame touches the last loaded element; a frame-sized margin keeps a
/// full extra frame prefetched.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PrefetchThreshold {
    #[serde(default = "default_margin")]
    pub margin: i64,
}

fn default_margin() -> i64 {
    2
}

impl Default for PrefetchThreshold {
    fn default() -> Self {
        Self {
            margin: default_margin(),
        }
    }
}

impl PrefetchThreshold {
    pub fn new(margin: i64) -> Self {
        Self { margin }
    }

    pub fn should_load(&self, remains_to_edge: i64) -> bool {
        remains_to_edge <= self.margin
    }
}
