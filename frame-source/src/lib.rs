// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Load contract between a window controller and its data source.
//!
//! A [`FrameSource`] answers three asynchronous questions — reload the
//! whole dataset, extend it leftward, extend it rightward — and two
//! synchronous ones: whether an extension in either direction is worth
//! starting. Every method has a default ("nothing more to serve"), so an
//! implementation only fills in the directions it supports.

use std::ops::Range;

use async_trait::async_trait;
use thiserror::Error;

pub mod retry;
pub mod threshold;

pub use retry::RetryPolicy;
pub use threshold::PrefetchThreshold;

/// Opaque cause carried by source failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type SourceResult<T> = Result<T, SourceError>;

#[derive(Debug, Error)]
pub enum SourceError {
    /// The operation was superseded. Not a user-visible failure; never
    /// retried.
    #[error("load canceled")]
    Canceled,
    /// The source failed for a domain reason (network error, decode
    /// error, ...).
    #[error("source failure: {source}")]
    Failure {
        #[source]
        source: BoxError,
    },
}

impl SourceError {
    pub fn failure(source: impl Into<BoxError>) -> Self {
        Self::Failure {
            source: source.into(),
        }
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }
}

/// Result of a full reload: the fresh dataset plus the frame the source
/// decided to serve. The source may re-center or resize the requested
/// frame; whatever it returns becomes authoritative.
#[derive(Debug, Clone)]
pub struct Reload<T> {
    pub elements: Vec<T>,
    pub frame: Range<i64>,
}

#[async_trait]
pub trait FrameSource: Send + Sync {
    type Item: Send + Sync;

    /// Fetches a complete fresh dataset for roughly `frame`.
    async fn load(&self, frame: Range<i64>) -> SourceResult<Reload<Self::Item>> {
        Ok(Reload {
            elements: Vec::new(),
            frame,
        })
    }

    /// Elements strictly preceding `anchor` in the domain's natural order,
    /// oldest first, contiguous with the anchor. An empty result signals
    /// that no more data exists on this side.
    async fn load_left(
        &self,
        anchor: &Self::Item,
        frame_length: i64,
    ) -> SourceResult<Vec<Self::Item>> {
        let _ = (anchor, frame_length);
        Ok(Vec::new())
    }

    /// Elements strictly following `anchor`, oldest first, contiguous with
    /// the anchor. An empty result signals exhaustion on this side.
    async fn load_right(
        &self,
        anchor: &Self::Item,
        frame_length: i64,
    ) -> SourceResult<Vec<Self::Item>> {
        let _ = (anchor, frame_length);
        Ok(Vec::new())
    }

    /// Whether a leftward load should start. `remains_to_edge` is the
    /// distance from the requested frame's low bound to the loaded edge,
    /// so a source can prefetch before the edge becomes visible.
    fn should_load_left(&self, remains_to_edge: i64, frame_length: i64) -> bool {
        let _ = (remains_to_edge, frame_length);
        false
    }

    /// Rightward counterpart of [`should_load_left`](Self::should_load_left).
    fn should_load_right(&self, remains_to_edge: i64, frame_length: i64) -> bool {
        let _ = (remains_to_edge, frame_length);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullSource;

    #[async_trait]
    impl FrameSource for NullSource {
        type Item = i64;
    }

    #[tokio::test]
    async fn defaults_serve_nothing() {
        let source = NullSource;
        let reload = source.load(3..9).await.unwrap();
        assert!(reload.elements.is_empty());
        assert_eq!(reload.frame, 3..9);
        assert!(source.load_left(&0, 5).await.unwrap().is_empty());
        assert!(source.load_right(&0, 5).await.unwrap().is_empty());
        assert!(!source.should_load_left(0, 5));
        assert!(!source.should_load_right(0, 5));
    }

    #[test]
    fn failure_wraps_and_displays_cause() {
        let err = SourceError::failure("decode truncated");
        assert!(!err.is_canceled());
        assert_eq!(err.to_string(), "source failure: decode truncated");
        assert!(SourceError::Canceled.is_canceled());
    }
}
