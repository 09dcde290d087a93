// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::ops::Range;
use std::sync::Arc;

use frame_source::{FrameSource, SourceError, SourceResult};
use log::{debug, info, warn};
use parking_lot::Mutex;
use tape::range::{moved_left, moved_right, FrameRange};
use tape::{FrameSlice, Tape};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::bounds::FrameBounds;
use crate::lane::{Flight, Lane, LaneState};

/// Window controller: owns one [`Tape`] and the requested frame, runs the
/// prefetch/reload protocol against a [`FrameSource`], and publishes slice
/// and lane-state changes through watch channels.
///
/// [`set_frame`](Self::set_frame) and the extension workers spawn onto the
/// ambient tokio runtime, so the controller must live inside one.
pub struct Framer<T> {
    inner: Arc<Shared<T>>,
}

struct Shared<T> {
    label: String,
    source: Arc<dyn FrameSource<Item = T>>,
    state: Mutex<State<T>>,
    slice_tx: watch::Sender<FrameSlice<T>>,
    lanes: LaneChannels,
}

struct LaneChannels {
    reload: watch::Sender<LaneState>,
    left: watch::Sender<LaneState>,
    right: watch::Sender<LaneState>,
}

impl LaneChannels {
    fn new() -> Self {
        Self {
            reload: watch::channel(LaneState::Inited).0,
            left: watch::channel(LaneState::Inited).0,
            right: watch::channel(LaneState::Inited).0,
        }
    }

    fn sender(&self, lane: Lane) -> &watch::Sender<LaneState> {
        match lane {
            Lane::Reload => &self.reload,
            Lane::Left => &self.left,
            Lane::Right => &self.right,
        }
    }
}

/// Everything the single-writer lock guards. Workers never touch the tape
/// or frame without holding it, and never hold it across an await.
struct State<T> {
    tape: Tape<T>,
    frame: Range<i64>,
    reload: Flight,
    left: Flight,
    right: Flight,
    /// Monotonic reload generation; a completed reload only applies its
    /// result when no newer reload has superseded it.
    reload_epoch: u64,
}

#[derive(Clone, Copy, Debug)]
enum Side {
    Left,
    Right,
}

impl Side {
    fn lane(self) -> Lane {
        match self {
            Side::Left => Lane::Left,
            Side::Right => Lane::Right,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl<T: Clone> State<T> {
    fn flight(&self, side: Side) -> &Flight {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    fn set_flight(&mut self, side: Side, flight: Flight) {
        match side {
            Side::Left => self.left = flight,
            Side::Right => self.right = flight,
        }
    }

    /// Distance from the requested frame's bound to the loaded edge on
    /// `side`. Negative when the frame already overshoots the edge.
    fn remains_to_edge(&self, side: Side) -> i64 {
        let bounds = self.tape.bounds();
        match side {
            Side::Left => self.frame.start - bounds.start,
            Side::Right => bounds.end - self.frame.end,
        }
    }

    fn anchor(&self, side: Side) -> Option<T> {
        match side {
            Side::Left => self.tape.first().cloned(),
            Side::Right => self.tape.last().cloned(),
        }
    }

    fn merge(&mut self, side: Side, elements: Vec<T>) {
        match side {
            Side::Left => self.tape.prepend(elements),
            Side::Right => self.tape.append(elements),
        }
    }

    fn cancel_all(&self) {
        self.reload.cancel();
        self.left.cancel();
        self.right.cancel();
    }
}

impl<T> Framer<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Builds a controller around a seed tape. `frame` resolves against
    /// the seed's bounds: pass `..` for the full seeded range, `..n`,
    /// `n..`, or an explicit `lo..hi`.
    pub fn new(
        tape: Tape<T>,
        source: Arc<dyn FrameSource<Item = T>>,
        frame: impl FrameBounds,
    ) -> Self {
        Self::with_label("framer", tape, source, frame)
    }

    /// Like [`new`](Self::new), with a label prefixed to log lines when
    /// several controllers share a process.
    pub fn with_label(
        label: impl Into<String>,
        tape: Tape<T>,
        source: Arc<dyn FrameSource<Item = T>>,
        frame: impl FrameBounds,
    ) -> Self {
        let frame = frame.resolve(tape.bounds());
        let slice_tx = watch::channel(tape.slice(&frame)).0;
        Self {
            inner: Arc::new(Shared {
                label: label.into(),
                source,
                state: Mutex::new(State {
                    tape,
                    frame,
                    reload: Flight::Idle,
                    left: Flight::Idle,
                    right: Flight::Idle,
                    reload_epoch: 0,
                }),
                slice_tx,
                lanes: LaneChannels::new(),
            }),
        }
    }

    /// Requested frame as last set (or adopted from a reload).
    pub fn frame(&self) -> Range<i64> {
        self.inner.state.lock().frame.clone()
    }

    /// Current published view: the frame clamped to the loaded range.
    pub fn slice(&self) -> FrameSlice<T> {
        self.inner.slice_tx.borrow().clone()
    }

    /// Valid range of the underlying tape.
    pub fn tape_bounds(&self) -> Range<i64> {
        self.inner.state.lock().tape.bounds()
    }

    pub fn lane_state(&self, lane: Lane) -> LaneState {
        self.inner.lanes.sender(lane).borrow().clone()
    }

    pub fn subscribe_slice(&self) -> watch::Receiver<FrameSlice<T>> {
        self.inner.slice_tx.subscribe()
    }

    pub fn subscribe_lane(&self, lane: Lane) -> watch::Receiver<LaneState> {
        self.inner.lanes.sender(lane).subscribe()
    }

    /// Moves the requested frame. Recomputes and publishes the clamped
    /// view when its index range changes, and evaluates the extension
    /// trigger for each direction the frame grew toward. Equal input is a
    /// no-op.
    pub fn set_frame(&self, frame: Range<i64>) {
        let inner = &self.inner;
        let mut state = inner.state.lock();
        if state.frame == frame {
            return;
        }
        let old = std::mem::replace(&mut state.frame, frame.clone());
        inner.publish_slice(&mut state, false);

        if state.tape.is_empty() {
            return;
        }
        if moved_left(&old, &frame) {
            Shared::maybe_extend(inner, &mut state, Side::Left);
        }
        if moved_right(&old, &frame) {
            Shared::maybe_extend(inner, &mut state, Side::Right);
        }
    }

    /// Replaces the whole dataset through the source. Cancels both
    /// extension lanes and any previous reload; consumers keep a stale
    /// but visible view until the fetch resolves.
    pub async fn load(&self) {
        Shared::reload(Arc::clone(&self.inner)).await;
    }
}

impl<T> Clone for Framer<T> {
    /// Cheap handle clone; both handles drive the same controller.
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Shared<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn set_lane(&self, lane: Lane, value: LaneState) {
        self.lanes.sender(lane).send_replace(value);
    }

    /// Recomputes the clamped view and publishes it when its index range
    /// differs from the last published one (or unconditionally on
    /// `force`).
    fn publish_slice(&self, state: &mut State<T>, force: bool) {
        let next = state.tape.slice(&state.frame);
        let changed = self.slice_tx.borrow().range() != next.range();
        if changed || force {
            self.slice_tx.send_replace(next);
        }
    }

    fn wants_more(&self, state: &State<T>, side: Side) -> bool {
        let frame_length = state.frame.span();
        let remains = state.remains_to_edge(side);
        match side {
            Side::Left => self.source.should_load_left(remains, frame_length),
            Side::Right => self.source.should_load_right(remains, frame_length),
        }
    }

    async fn fetch(&self, side: Side, anchor: &T, frame_length: i64) -> SourceResult<Vec<T>> {
        match side {
            Side::Left => self.source.load_left(anchor, frame_length).await,
            Side::Right => self.source.load_right(anchor, frame_length).await,
        }
    }

    /// Evaluates the extension trigger for `side` and spawns a worker when
    /// it fires. Caller holds the state lock.
    fn maybe_extend(this: &Arc<Self>, state: &mut State<T>, side: Side) {
        if state.reload.is_running() || state.flight(side).is_running() {
            return;
        }
        if state.tape.is_empty() || !this.wants_more(state, side) {
            return;
        }

        let token = CancellationToken::new();
        state.set_flight(side, Flight::Running(token.clone()));
        this.set_lane(side.lane(), LaneState::Loading);
        debug!(
            "[{}] {} extension starting; frame {:?}, tape {:?}",
            this.label,
            side.name(),
            state.frame,
            state.tape.bounds()
        );

        let worker = Arc::clone(this);
        tokio::spawn(async move { worker.extend(side, token).await });
    }

    /// Lane worker: fetches, merges, and keeps refueling while the source
    /// predicate still wants more. One terminal lane state per iteration;
    /// the flight tag stays `Running` for the whole chain.
    async fn extend(self: Arc<Self>, side: Side, token: CancellationToken) {
        let lane = side.lane();
        loop {
            let (anchor, frame_length) = {
                let mut state = self.state.lock();
                if token.is_cancelled() {
                    self.settle(&mut state, side, LaneState::Canceled);
                    return;
                }
                let Some(anchor) = state.anchor(side) else {
                    self.settle(&mut state, side, LaneState::Loaded);
                    return;
                };
                (anchor, state.frame.span())
            };

            let fetched = tokio::select! {
                _ = token.cancelled() => Err(SourceError::Canceled),
                fetched = self.fetch(side, &anchor, frame_length) => fetched,
            };

            let mut state = self.state.lock();
            // A reload may have raced the fetch; its result is stale now.
            if token.is_cancelled() {
                self.settle(&mut state, side, LaneState::Canceled);
                return;
            }
            match fetched {
                Err(SourceError::Canceled) => {
                    self.settle(&mut state, side, LaneState::Canceled);
                    return;
                }
                Err(err) => {
                    warn!("[{}] {} load failed: {}", self.label, side.name(), err);
                    self.settle(&mut state, side, LaneState::Error(Arc::new(err)));
                    return;
                }
                Ok(elements) if elements.is_empty() => {
                    debug!("[{}] {} side exhausted", self.label, side.name());
                    self.settle(&mut state, side, LaneState::Loaded);
                    return;
                }
                Ok(elements) => {
                    let merged = elements.len();
                    state.merge(side, elements);
                    self.publish_slice(&mut state, false);
                    self.set_lane(lane, LaneState::Loaded);
                    debug!(
                        "[{}] merged {} elements on the {} side; tape {:?}",
                        self.label,
                        merged,
                        side.name(),
                        state.tape.bounds()
                    );
                    if state.reload.is_running() || !self.wants_more(&state, side) {
                        state.set_flight(side, Flight::Idle);
                        return;
                    }
                    self.set_lane(lane, LaneState::Loading);
                }
            }
        }
    }

    fn settle(&self, state: &mut State<T>, side: Side, terminal: LaneState) {
        state.set_flight(side, Flight::Idle);
        self.set_lane(side.lane(), terminal);
    }

    async fn reload(this: Arc<Self>) {
        let (token, frame, epoch) = {
            let mut state = this.state.lock();
            // A wholesale replacement invalidates incremental fetches.
            state.cancel_all();
            state.reload_epoch += 1;
            let token = CancellationToken::new();
            state.reload = Flight::Running(token.clone());
            this.set_lane(Lane::Reload, LaneState::Loading);
            // Consumers keep a stale but visible view during the fetch.
            this.publish_slice(&mut state, true);
            (token, state.frame.clone(), state.reload_epoch)
        };

        info!("[{}] reload starting for frame {:?}", this.label, frame);
        let fetched = tokio::select! {
            _ = token.cancelled() => Err(SourceError::Canceled),
            fetched = this.source.load(frame) => fetched,
        };

        let mut state = this.state.lock();
        if state.reload_epoch != epoch {
            // Superseded; the newer reload owns the lane now.
            return;
        }
        state.reload = Flight::Idle;
        if token.is_cancelled() {
            this.set_lane(Lane::Reload, LaneState::Canceled);
            return;
        }
        match fetched {
            Err(SourceError::Canceled) => {
                this.set_lane(Lane::Reload, LaneState::Canceled);
            }
            Err(err) => {
                warn!("[{}] reload failed: {}", this.label, err);
                this.set_lane(Lane::Reload, LaneState::Error(Arc::new(err)));
            }
            Ok(reload) => {
                state.tape = Tape::new(reload.elements);
                state.frame = reload.frame;
                this.publish_slice(&mut state, true);
                this.set_lane(Lane::Reload, LaneState::Loaded);
                info!(
                    "[{}] reload complete; tape {:?}, frame {:?}",
                    this.label,
                    state.tape.bounds(),
                    state.frame
                );
            }
        }
    }
}
