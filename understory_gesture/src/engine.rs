// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The handler registry and its event loop.
//!
//! Everything happens inside [`GestureEngine::handle_pointer`] and
//! [`GestureEngine::advance_to`]. Each call is one *tick*:
//!
//! 1. Timers due at or before the event time fire first, each in its own tick.
//! 2. The event is routed to every handler that tracks (or adopts) the pointer.
//! 3. Transitions requested by recognizers go through the arbiter. Granted ones
//!    are committed and reported to the sink right away; denied ones are kept
//!    as deferred intents.
//! 4. At the end of the tick, deferred intents are retried in attachment
//!    order, and finished handlers are reset to `UNDETERMINED`.
//!
//! A handler with a deferred intent keeps recognizing as if the intent had
//! been granted. Once the handlers it waits for have failed, the intent is
//! committed together with every intermediate state, so observers always see
//! a path through the lifecycle graph.

use alloc::vec::Vec;

use kurbo::Point;
use smallvec::SmallVec;
use understory_pointer::{
    Pointer, PointerEvent, PointerId, PointerKind, PointerPhase, PointerTracker, VelocityEstimator,
};

use crate::arbiter::{Arbiter, Verdict};
use crate::handler::{Action, Actions, Context, Handler, Input, InputKind};
use crate::recognizers::Recognizer;
use crate::timers::TimerQueue;
use crate::{
    Composition, CompositionError, ConfigError, EngineConfig, EventSink, GestureConfig,
    GestureData, GestureEvent, GestureKind, HandlerId, HandlerState, MouseButtons, Relation,
    RelationKind, RelationSet,
};

type HandlerIds = SmallVec<[HandlerId; 8]>;

/// Registry of attached handlers driven by a pointer event stream.
///
/// The engine is single-threaded and synchronous: every method returns once
/// all resulting events have been handed to the sink.
///
/// ```rust
/// use kurbo::Point;
/// use understory_gesture::{
///     GestureConfig, GestureEngine, GestureEvent, HandlerState, TapConfig,
/// };
/// use understory_pointer::{PointerEvent, PointerId};
///
/// let mut engine = GestureEngine::new(Vec::<GestureEvent>::new());
/// let tap = engine.attach(GestureConfig::tap(TapConfig::default())).unwrap();
///
/// let finger = PointerId(0);
/// engine.handle_pointer(&PointerEvent::down(finger, Point::new(5.0, 5.0), 0));
/// assert_eq!(engine.state(tap), Some(HandlerState::Began));
/// engine.handle_pointer(&PointerEvent::up(finger, Point::new(6.0, 5.0), 80));
///
/// let path: Vec<_> = engine
///     .sink()
///     .iter()
///     .filter_map(GestureEvent::transition)
///     .map(|(_, to)| to)
///     .collect();
/// assert_eq!(
///     path,
///     [
///         HandlerState::Began,
///         HandlerState::Active,
///         HandlerState::End,
///         HandlerState::Undetermined,
///     ]
/// );
/// ```
#[derive(Debug)]
pub struct GestureEngine<S> {
    handlers: Vec<Option<Handler>>,
    relations: RelationSet,
    tracker: PointerTracker,
    estimator: VelocityEstimator,
    timers: TimerQueue,
    now: u64,
    tick: u64,
    sink: S,
}

impl<S: EventSink> GestureEngine<S> {
    /// Creates an engine with default tunables.
    pub fn new(sink: S) -> Self {
        Self::with_config(EngineConfig::default(), sink)
    }

    /// Creates an engine with the given tunables.
    pub fn with_config(config: EngineConfig, sink: S) -> Self {
        Self {
            handlers: Vec::new(),
            relations: RelationSet::new(),
            tracker: PointerTracker::with_capacity(config.history_capacity),
            estimator: VelocityEstimator::new(config.velocity),
            timers: TimerQueue::default(),
            now: 0,
            tick: 0,
            sink,
        }
    }

    /// Attaches a handler.
    ///
    /// Relations in `config` may only reference handlers that are already
    /// attached. On error nothing changes.
    pub fn attach(&mut self, config: GestureConfig) -> Result<HandlerId, ConfigError> {
        config.validate()?;
        #[allow(
            clippy::cast_possible_truncation,
            reason = "HandlerId uses 32-bit indices by design."
        )]
        let id = HandlerId(self.handlers.len() as u32);
        for target in config.relation_targets() {
            if target == id {
                return Err(ConfigError::SelfRelation(target));
            }
            if self.handler(target).is_none() {
                return Err(ConfigError::UnknownHandler(target));
            }
        }
        let recognizer = Recognizer::new(&config.kind)?;

        let declared = &config.common.relations;
        let relations = declared
            .wait_for
            .iter()
            .map(|&to| Relation::new(id, RelationKind::WaitFor, to))
            .chain(
                declared
                    .simultaneous_with
                    .iter()
                    .map(|&to| Relation::new(id, RelationKind::Simultaneous, to)),
            )
            .chain(
                declared
                    .blocks
                    .iter()
                    .map(|&to| Relation::new(id, RelationKind::Blocks, to)),
            );
        for relation in relations {
            self.relations.insert(relation);
        }

        log::debug!("{id} attached as {}", recognizer.kind());
        self.handlers
            .push(Some(Handler::new(id, config.common, recognizer)));
        Ok(id)
    }

    /// Detaches a handler and drops every relation that mentions it.
    ///
    /// A live handler is failed (or cancelled, if active) first, and the
    /// transition is reported. Returns `false` if `id` was not attached.
    pub fn detach(&mut self, id: HandlerId) -> bool {
        if self.handler(id).is_none() {
            return false;
        }
        self.tick += 1;
        self.fail(id);
        if let Some(slot) = self.handlers.get_mut(id.idx()) {
            *slot = None;
        }
        self.relations.remove_handler(id);
        log::debug!("{id} detached");
        self.settle();
        true
    }

    /// Installs the relations described by a composition tree.
    ///
    /// Every leaf must be attached. On error no relation is installed.
    pub fn install(&mut self, composition: &Composition) -> Result<(), CompositionError> {
        let relations = composition.compile()?;
        if let Some(unknown) = composition
            .leaves()
            .into_iter()
            .find(|&leaf| self.handler(leaf).is_none())
        {
            return Err(CompositionError::UnknownHandler(unknown));
        }
        log::debug!("installing {} composed relations", relations.len());
        for relation in relations {
            self.relations.insert(relation);
        }
        Ok(())
    }

    /// Feeds one pointer event.
    ///
    /// Timers due at or before the event's timestamp fire first.
    pub fn handle_pointer(&mut self, event: &PointerEvent) {
        self.advance_to(event.timestamp);
        self.tick += 1;
        log::trace!(
            "{:?} {} at ({}, {}) t={}",
            event.phase,
            event.id,
            event.position.x,
            event.position.y,
            event.timestamp
        );
        match event.phase {
            PointerPhase::Down | PointerPhase::AdditionalDown => self.pointer_down(event),
            PointerPhase::Move => self.pointer_move(event),
            PointerPhase::AdditionalUp | PointerPhase::Up => self.pointer_up(event),
            PointerPhase::Cancel => self.pointer_cancel(event),
        }
        self.settle();
    }

    /// Moves the clock forward, firing every timer due at or before `now`.
    ///
    /// The clock never goes backwards.
    pub fn advance_to(&mut self, now: u64) {
        while let Some(entry) = self.timers.pop_due(now) {
            let Some(h) = self.handler_mut(entry.handler) else {
                continue;
            };
            if h.epoch != entry.epoch {
                continue;
            }
            let mut out = Actions::new(h.logical());
            h.recognizer.on_timer(entry.timer, &mut out);
            self.now = self.now.max(entry.deadline);
            self.tick += 1;
            log::trace!(
                "{:?} fired for {} t={}",
                entry.timer,
                entry.handler,
                entry.deadline
            );
            self.apply(entry.handler, out.into_list());
            self.settle();
        }
        self.now = self.now.max(now);
        let handlers = &self.handlers;
        self.timers.prune(|entry| {
            handlers
                .get(entry.handler.idx())
                .and_then(Option::as_ref)
                .is_some_and(|h| h.epoch == entry.epoch)
        });
    }

    /// Earliest time at which [`advance_to`](Self::advance_to) may fire a timer.
    ///
    /// Adapters use this to schedule a wake-up when no input arrives.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    /// The engine clock: the latest event or timer time seen, in milliseconds.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Committed state of a handler, or `None` if it is not attached.
    pub fn state(&self, id: HandlerId) -> Option<HandlerState> {
        self.handler(id).map(|h| h.state)
    }

    /// Recognizer kind of a handler.
    pub fn kind(&self, id: HandlerId) -> Option<GestureKind> {
        self.handler(id).map(|h| h.recognizer.kind())
    }

    /// Pointers a handler currently tracks.
    pub fn tracked_pointers(&self, id: HandlerId) -> Option<&[PointerId]> {
        self.handler(id).map(|h| h.tracked.as_slice())
    }

    /// Whether `id` could move from `from` to `to` right now.
    ///
    /// `from` must be the handler's committed state and the edge must be in
    /// the lifecycle graph. Entering `BEGAN` or `ACTIVE` additionally needs the
    /// arbiter's approval; cancellations the approval would cause are not
    /// performed.
    pub fn can_transition(&self, id: HandlerId, from: HandlerState, to: HandlerState) -> bool {
        let Some(h) = self.handler(id) else {
            return false;
        };
        if h.state != from || !from.can_transition_to(to) {
            return false;
        }
        match to {
            HandlerState::Began | HandlerState::Active => {
                matches!(self.arbiter().decide(id, to), Verdict::Allow(_))
            }
            _ => true,
        }
    }

    /// Every installed relation.
    pub fn relations(&self) -> &RelationSet {
        &self.relations
    }

    /// The live pointer table.
    pub fn tracker(&self) -> &PointerTracker {
        &self.tracker
    }

    /// The event sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The event sink, mutably (for example to drain collected events).
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consumes the engine and returns its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn handler(&self, id: HandlerId) -> Option<&Handler> {
        self.handlers.get(id.idx()).and_then(Option::as_ref)
    }

    fn handler_mut(&mut self, id: HandlerId) -> Option<&mut Handler> {
        self.handlers.get_mut(id.idx()).and_then(Option::as_mut)
    }

    fn arbiter(&self) -> Arbiter<'_> {
        Arbiter {
            handlers: &self.handlers,
            relations: &self.relations,
            tick: self.tick,
        }
    }

    fn holders(&self, pointer: PointerId) -> HandlerIds {
        self.handlers
            .iter()
            .flatten()
            .filter(|h| h.tracked.contains(&pointer))
            .map(|h| h.id)
            .collect()
    }

    /// Whether handler `id` takes the pointer that just went down.
    fn adopts(&self, id: HandlerId, event: &PointerEvent) -> bool {
        let Some(h) = self.handler(id) else {
            return false;
        };
        if !h.common.enabled || h.logical().is_finished() {
            return false;
        }
        if h
            .common
            .hit_area
            .is_some_and(|area| !area.contains(event.position))
        {
            return false;
        }
        if event.kind == PointerKind::Mouse {
            let pressed = event
                .buttons
                .map_or(MouseButtons::PRIMARY, MouseButtons::from_bits_truncate);
            if !pressed.intersects(h.common.mouse_buttons) {
                return false;
            }
        }
        // Two active handlers may only share a pointer when simultaneous.
        h.state != HandlerState::Active
            || !self.handlers.iter().flatten().any(|other| {
                other.id != id
                    && other.state == HandlerState::Active
                    && other.tracked.contains(&event.id)
                    && !self.relations.is_simultaneous(id, other.id)
            })
    }

    fn pointer_down(&mut self, event: &PointerEvent) {
        if event.phase == PointerPhase::Down && !self.tracker.is_empty() {
            self.lift_stale(event.timestamp);
            // Handlers finished by the lost pointers may take the new one.
            self.settle();
        }
        if !self.tracker.add(event) {
            return;
        }
        for id in self.dispatch_order() {
            if !self.adopts(id, event) {
                continue;
            }
            let Some(h) = self.handler_mut(id) else {
                continue;
            };
            h.adopt(event.id);
            let kind = if h.tracked.len() == 1 {
                InputKind::Down
            } else {
                InputKind::Add
            };
            self.dispatch(
                id,
                Input {
                    kind,
                    id: event.id,
                    position: event.position,
                    time: event.timestamp,
                },
            );
        }
    }

    /// Attached handlers with every awaited handler ahead of its waiters,
    /// otherwise in attachment order. Wait cycles fall back to attachment order.
    fn dispatch_order(&self) -> HandlerIds {
        let mut pending: HandlerIds = self.handlers.iter().flatten().map(|h| h.id).collect();
        let mut order = HandlerIds::new();
        while !pending.is_empty() {
            let ready = pending
                .iter()
                .position(|&waiter| {
                    !pending.iter().any(|&other| {
                        other != waiter && self.relations.must_wait_for(waiter, other)
                    })
                })
                .unwrap_or(0);
            order.push(pending.remove(ready));
        }
        order
    }

    fn pointer_move(&mut self, event: &PointerEvent) {
        if !self.tracker.update(event) {
            return;
        }
        for id in self.holders(event.id) {
            let Some(h) = self.handler(id).filter(|h| h.tracked.contains(&event.id)) else {
                continue;
            };
            let left_area = h.common.cancel_when_outside
                && h.common
                    .hit_area
                    .is_some_and(|area| !area.contains(event.position));
            if left_area {
                log::debug!("{id}: {} left the hit area", event.id);
                self.fail(id);
                continue;
            }
            let was_active = h.state == HandlerState::Active;
            self.dispatch(
                id,
                Input {
                    kind: InputKind::Move,
                    id: event.id,
                    position: event.position,
                    time: event.timestamp,
                },
            );
            if was_active && self.state(id) == Some(HandlerState::Active) {
                self.emit_update(id);
            }
        }
    }

    fn pointer_up(&mut self, event: &PointerEvent) {
        if !self.tracker.contains(event.id) {
            log::warn!("{} lifted but is not down; ignoring", event.id);
            return;
        }
        self.tracker.update(event);
        self.lift(event.id, event.position, event.timestamp);
        if event.phase == PointerPhase::Up && !self.tracker.is_empty() {
            self.lift_stale(event.timestamp);
        }
    }

    fn pointer_cancel(&mut self, event: &PointerEvent) {
        for id in self.holders(event.id) {
            log::debug!("{id}: {} cancelled by the platform", event.id);
            self.fail(id);
        }
        self.tracker.remove(event.id);
    }

    /// Routes the loss of `pointer` to its holders and forgets it.
    fn lift(&mut self, pointer: PointerId, position: Point, time: u64) {
        for id in self.holders(pointer) {
            // Holders stopped earlier in this loop have already let go.
            let Some(h) = self.handler_mut(id) else {
                continue;
            };
            let Some(index) = h.tracked.iter().position(|p| *p == pointer) else {
                continue;
            };
            h.tracked.remove(index);
            let kind = if h.tracked.is_empty() {
                InputKind::Up
            } else {
                InputKind::Remove
            };
            self.dispatch(
                id,
                Input {
                    kind,
                    id: pointer,
                    position,
                    time,
                },
            );
        }
        self.tracker.remove(pointer);
    }

    /// Lifts every pointer still in the table; their up events were lost.
    fn lift_stale(&mut self, time: u64) {
        let stale: SmallVec<[PointerId; 4]> = self.tracker.ids().collect();
        for pointer in stale {
            log::debug!("{pointer} was never lifted; treating it as lifted");
            let position = self
                .tracker
                .get(pointer)
                .map_or(Point::ZERO, Pointer::position);
            self.lift(pointer, position, time);
        }
    }

    fn dispatch(&mut self, id: HandlerId, input: Input) {
        let Some(h) = self.handlers.get_mut(id.idx()).and_then(Option::as_mut) else {
            return;
        };
        let cx = Context {
            tracked: &h.tracked,
            tracker: &self.tracker,
            estimator: &self.estimator,
        };
        let mut out = Actions::new(h.logical());
        h.recognizer.on_input(&cx, &input, &mut out);
        h.focus = cx.centroid().unwrap_or(input.position);
        self.apply(id, out.into_list());
    }

    fn apply(&mut self, id: HandlerId, actions: impl IntoIterator<Item = Action>) {
        for action in actions {
            match action {
                Action::Begin => self.request(id, HandlerState::Began),
                Action::Activate => self.request(id, HandlerState::Active),
                Action::End => self.end(id),
                Action::Fail => self.fail(id),
                Action::Schedule { timer, delay_ms } => {
                    let deadline = self.now.saturating_add(delay_ms);
                    if let Some(h) = self.handlers.get(id.idx()).and_then(Option::as_ref) {
                        self.timers.schedule(deadline, id, h.epoch, timer);
                    }
                }
                Action::ClearTimers => {
                    if let Some(h) = self.handler_mut(id) {
                        h.epoch += 1;
                    }
                }
            }
            // A lost tie-break ends the cycle early; later requests are moot.
            if self.handler(id).is_none_or(|h| h.logical().is_finished()) {
                break;
            }
        }
    }

    fn request(&mut self, id: HandlerId, to: HandlerState) {
        let Some(h) = self.handler_mut(id) else {
            return;
        };
        if h.deferred.is_some() {
            h.deferred = Some(to);
            return;
        }
        match self.arbiter().decide(id, to) {
            Verdict::Allow(losers) => {
                for loser in losers {
                    self.take_over(id, loser);
                }
                self.commit(id, to);
            }
            Verdict::Wait => {
                log::debug!("{id} waits before entering {to}");
                if let Some(h) = self.handler_mut(id) {
                    h.deferred = Some(to);
                }
            }
            Verdict::Lose => {
                log::debug!("{id} lost a same-tick activation to an earlier handler");
                self.commit(id, HandlerState::Failed);
            }
        }
    }

    /// Stops `loser`. One that has only a deferred intent is reset silently.
    fn take_over(&mut self, winner: HandlerId, loser: HandlerId) {
        log::debug!("{winner} takes over from {loser}");
        self.fail(loser);
    }

    fn end(&mut self, id: HandlerId) {
        let Some(h) = self.handler_mut(id) else {
            return;
        };
        match (h.deferred, h.state) {
            (Some(_), _) => {
                h.deferred = Some(HandlerState::End);
                h.release();
            }
            (None, HandlerState::Active) => self.commit(id, HandlerState::End),
            (None, HandlerState::Began) => self.commit(id, HandlerState::Failed),
            _ => {}
        }
    }

    /// Drops the current cycle: fails, cancels or silently resets the handler
    /// depending on what observers have been told so far.
    fn fail(&mut self, id: HandlerId) {
        let Some(h) = self.handler_mut(id) else {
            return;
        };
        h.deferred = None;
        match h.state {
            HandlerState::Began => self.commit(id, HandlerState::Failed),
            HandlerState::Active => self.commit(id, HandlerState::Cancelled),
            HandlerState::Undetermined => {
                h.release();
                h.touched.clear();
                h.recognizer.reset();
            }
            _ => {}
        }
    }

    fn commit(&mut self, id: HandlerId, to: HandlerState) {
        let Some(h) = self.handlers.get_mut(id.idx()).and_then(Option::as_mut) else {
            log::warn!("transition requested for unknown {id}");
            return;
        };
        let from = h.state;
        if !from.can_transition_to(to) {
            log::warn!("{id}: illegal transition {from} -> {to} ignored");
            return;
        }
        let data = snapshot(h, &self.tracker, self.now);
        let kind = h.recognizer.kind();
        h.state = to;
        if to == HandlerState::Active {
            h.activated_tick = Some(self.tick);
        }
        if to.is_finished() {
            h.deferred = None;
            h.release();
        }
        log::debug!("{id} ({kind}): {from} -> {to}");

        let update = (to == HandlerState::Active).then(|| GestureEvent::Update {
            handler: id,
            kind,
            data: data.clone(),
        });
        self.sink.emit(GestureEvent::StateChange {
            handler: id,
            kind,
            old_state: from,
            state: to,
            data,
        });
        if let Some(update) = update {
            self.sink.emit(update);
        }
        if to == HandlerState::End {
            self.abandon_waiters(id);
        }
    }

    /// `id` succeeded, so handlers waiting on it give up their pending intent.
    fn abandon_waiters(&mut self, id: HandlerId) {
        let waiters: HandlerIds = self
            .handlers
            .iter()
            .flatten()
            .filter(|w| w.deferred.is_some() && self.relations.must_wait_for(w.id, id))
            .map(|w| w.id)
            .collect();
        for waiter in waiters {
            log::debug!("{waiter} gives up: {id} succeeded");
            self.fail(waiter);
        }
    }

    fn emit_update(&mut self, id: HandlerId) {
        let Some(h) = self.handlers.get(id.idx()).and_then(Option::as_ref) else {
            return;
        };
        let data = snapshot(h, &self.tracker, self.now);
        self.sink.emit(GestureEvent::Update {
            handler: id,
            kind: h.recognizer.kind(),
            data,
        });
    }

    /// Ends a tick: replays deferred intents until nothing changes, then
    /// resets finished handlers.
    fn settle(&mut self) {
        loop {
            let mut progressed = false;
            for idx in 0..self.handlers.len() {
                let Some(h) = self.handlers[idx].as_mut() else {
                    continue;
                };
                let Some(intent) = h.deferred else {
                    continue;
                };
                let id = h.id;
                let step = match h.state {
                    HandlerState::Undetermined => HandlerState::Began,
                    HandlerState::Began => HandlerState::Active,
                    HandlerState::Active => HandlerState::End,
                    _ => {
                        h.deferred = None;
                        continue;
                    }
                };
                if step == HandlerState::End {
                    self.commit(id, step);
                    progressed = true;
                    continue;
                }
                match self.arbiter().decide(id, step) {
                    Verdict::Wait => {}
                    Verdict::Allow(losers) => {
                        for loser in losers {
                            self.take_over(id, loser);
                        }
                        self.commit(id, step);
                        if let Some(h) = self.handler_mut(id)
                            && h.state == intent
                        {
                            h.deferred = None;
                        }
                        progressed = true;
                    }
                    Verdict::Lose => {
                        log::debug!("{id} lost a same-tick activation to an earlier handler");
                        self.commit(id, HandlerState::Failed);
                        progressed = true;
                    }
                }
            }
            if !progressed {
                break;
            }
        }

        for h in self.handlers.iter_mut().flatten() {
            if !h.state.is_finished() || h.deferred.is_some() {
                continue;
            }
            let data = snapshot(h, &self.tracker, self.now);
            let from = h.state;
            h.state = HandlerState::Undetermined;
            h.activated_tick = None;
            h.touched.clear();
            h.recognizer.reset();
            log::debug!("{}: {from} -> {}", h.id, h.state);
            self.sink.emit(GestureEvent::StateChange {
                handler: h.id,
                kind: h.recognizer.kind(),
                old_state: from,
                state: HandlerState::Undetermined,
                data,
            });
        }
    }
}

/// The payload reported for `h` at time `now`.
fn snapshot(h: &Handler, tracker: &PointerTracker, now: u64) -> GestureData {
    let absolute = tracker.centroid(&h.tracked).unwrap_or(h.focus);
    let position = match h.common.hit_area {
        Some(area) => (absolute - area.origin()).to_point(),
        None => absolute,
    };
    GestureData {
        number_of_pointers: h.tracked.len(),
        position,
        absolute,
        details: h.recognizer.details(now, absolute),
    }
}
