// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Window controller over a virtually-indexed tape.
//!
//! A [`Framer`] owns one [`Tape`] and one requested frame. Consumers move
//! the frame; the controller clamps it against the loaded range, publishes
//! the resulting [`FrameSlice`], and — when the frame approaches a loaded
//! edge and the source's predicate agrees — fetches directional extensions
//! asynchronously, merging them without renumbering anything already
//! loaded. Three lanes (reload, left, right) each run at most one
//! operation at a time; a reload cancels both extension lanes.
//!
//! All state mutations are serialized behind one lock and observers only
//! ever receive immutable snapshots through `tokio::sync::watch` channels.

mod bounds;
mod controller;
mod lane;

pub use bounds::FrameBounds;
pub use controller::Framer;
pub use lane::{Lane, LaneState};

pub use frame_source::{FrameSource, Reload, SourceError, SourceResult};
pub use tape::{FrameSlice, Tape};
