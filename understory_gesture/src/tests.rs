// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end scenarios: synthetic pointer streams through a [`GestureEngine`].

use alloc::vec;
use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::{Point, Rect, Vec2};
use understory_pointer::{PointerEvent, PointerId, PointerKind};

use crate::HandlerState::{Active, Began, Cancelled, End, Failed, Undetermined};
use crate::{
    Composition, CompositionError, ConfigError, FlingConfig, FnSink, GestureConfig,
    GestureDetails, GestureEngine, GestureEvent, HandlerId, HandlerState, LongPressConfig,
    MouseButtons, OffsetRange, PanProps, PinchConfig, RotationConfig, TapConfig,
};

type Engine = GestureEngine<Vec<GestureEvent>>;

const F0: PointerId = PointerId(0);
const F1: PointerId = PointerId(1);

fn engine() -> Engine {
    GestureEngine::new(Vec::new())
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

/// States entered by `id`, in order.
fn path(engine: &Engine, id: HandlerId) -> Vec<HandlerState> {
    engine
        .sink()
        .iter()
        .filter(|e| e.handler() == id)
        .filter_map(GestureEvent::transition)
        .map(|(_, to)| to)
        .collect()
}

fn reached(engine: &Engine, id: HandlerId, state: HandlerState) -> bool {
    path(engine, id).contains(&state)
}

fn last_update(engine: &Engine, id: HandlerId) -> Option<&GestureDetails> {
    engine
        .sink()
        .iter()
        .rev()
        .find(|e| e.handler() == id && e.transition().is_none())
        .map(|e| &e.data().details)
}

/// Replays the emitted events and checks that every handler walks the
/// lifecycle graph and only reports updates while active.
fn assert_legal_paths(engine: &Engine) {
    let mut current: HashMap<HandlerId, HandlerState> = HashMap::new();
    for event in engine.sink() {
        let id = event.handler();
        let before = current.get(&id).copied().unwrap_or_default();
        match event.transition() {
            Some((from, to)) => {
                assert_eq!(before, from, "{id} reported {from} while in {before}");
                assert!(from.can_transition_to(to), "{id}: {from} -> {to}");
                current.insert(id, to);
            }
            None => assert_eq!(before, Active, "{id} updated while {before}"),
        }
    }
}

/// Whether `a` and `b` were ever active at the same time.
fn ever_both_active(engine: &Engine, a: HandlerId, b: HandlerId) -> bool {
    let (mut a_on, mut b_on) = (false, false);
    for event in engine.sink() {
        let Some((_, to)) = event.transition() else {
            continue;
        };
        if event.handler() == a {
            a_on = to == Active;
        } else if event.handler() == b {
            b_on = to == Active;
        }
        if a_on && b_on {
            return true;
        }
    }
    false
}

fn tap(engine: &mut Engine, id: PointerId, at: Point, t: u64) {
    engine.handle_pointer(&PointerEvent::down(id, at, t));
    engine.handle_pointer(&PointerEvent::up(id, at, t + 50));
}

/// Moves `id` in a straight line, one sample every 10ms. Returns the end time.
fn drag(engine: &mut Engine, id: PointerId, from: Point, to: Point, t0: u64, steps: u32) -> u64 {
    let mut t = t0;
    for step in 1..=steps {
        t += 10;
        let p = from.lerp(to, f64::from(step) / f64::from(steps));
        engine.handle_pointer(&PointerEvent::moved(id, p, t));
    }
    t
}

#[test]
fn single_tap_walks_the_whole_cycle() {
    let mut engine = engine();
    let tap_id = engine
        .attach(GestureConfig::tap(TapConfig::default()).with_hit_area(Rect::new(
            10.0, 10.0, 110.0, 110.0,
        )))
        .unwrap();
    tap(&mut engine, F0, pt(30.0, 40.0), 0);

    assert_eq!(path(&engine, tap_id), [Began, Active, End, Undetermined]);
    let activation = engine
        .sink()
        .iter()
        .find(|e| e.transition() == Some((Began, Active)))
        .unwrap();
    assert_eq!(activation.data().absolute, pt(30.0, 40.0));
    assert_eq!(activation.data().position, pt(20.0, 30.0));
    assert_legal_paths(&engine);
}

#[test]
fn double_tap_needs_both_taps_in_time() {
    let mut engine = engine();
    let double = engine
        .attach(GestureConfig::tap(TapConfig {
            number_of_taps: 2,
            ..TapConfig::default()
        }))
        .unwrap();

    tap(&mut engine, F0, pt(0.0, 0.0), 0);
    assert_eq!(engine.state(double), Some(Began));
    tap(&mut engine, F0, pt(2.0, 0.0), 200);
    assert_eq!(path(&engine, double), [Began, Active, End, Undetermined]);

    // Too long a pause between the taps.
    engine.sink_mut().clear();
    tap(&mut engine, F0, pt(0.0, 0.0), 1_000);
    tap(&mut engine, F0, pt(0.0, 0.0), 1_700);
    let states = path(&engine, double);
    assert_eq!(states[..3], [Began, Failed, Undetermined]);
    assert!(!states.contains(&Active));
    assert_legal_paths(&engine);
}

#[test]
fn tap_fails_on_drift_and_on_long_press() {
    let mut engine = engine();
    let tap_id = engine
        .attach(GestureConfig::tap(TapConfig {
            max_dist: Some(10.0),
            ..TapConfig::default()
        }))
        .unwrap();

    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 0));
    engine.handle_pointer(&PointerEvent::moved(F0, pt(20.0, 0.0), 10));
    engine.handle_pointer(&PointerEvent::up(F0, pt(20.0, 0.0), 20));
    assert_eq!(path(&engine, tap_id), [Began, Failed, Undetermined]);

    // Held past max_duration_ms: the timer fires before the up is handled.
    engine.sink_mut().clear();
    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 100));
    engine.handle_pointer(&PointerEvent::up(F0, pt(0.0, 0.0), 700));
    assert_eq!(path(&engine, tap_id), [Began, Failed, Undetermined]);
    assert_legal_paths(&engine);
}

#[test]
fn tap_min_pointers_counts_simultaneous_fingers() {
    let mut engine = engine();
    let two_finger = engine
        .attach(GestureConfig::tap(TapConfig {
            min_pointers: 2,
            ..TapConfig::default()
        }))
        .unwrap();

    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 0));
    engine.handle_pointer(&PointerEvent::additional_down(F1, pt(20.0, 0.0), 10));
    engine.handle_pointer(&PointerEvent::additional_up(F0, pt(0.0, 0.0), 60));
    engine.handle_pointer(&PointerEvent::up(F1, pt(20.0, 0.0), 70));
    assert!(reached(&engine, two_finger, End));

    engine.sink_mut().clear();
    tap(&mut engine, F0, pt(0.0, 0.0), 200);
    engine.advance_to(1_000);
    assert_eq!(path(&engine, two_finger), [Began, Failed, Undetermined]);
}

#[test]
fn pan_activates_past_slop_and_keeps_translation() {
    let mut engine = engine();
    let pan = engine.attach(GestureConfig::pan(PanProps::default())).unwrap();

    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 0));
    engine.handle_pointer(&PointerEvent::moved(F0, pt(5.0, 0.0), 10));
    assert_eq!(engine.state(pan), Some(Began));
    engine.handle_pointer(&PointerEvent::moved(F0, pt(15.0, 0.0), 20));
    assert_eq!(engine.state(pan), Some(Active));
    engine.handle_pointer(&PointerEvent::moved(F0, pt(25.0, 0.0), 30));

    let Some(GestureDetails::Pan { translation, .. }) = last_update(&engine, pan) else {
        panic!("pan reported no update");
    };
    // Translation restarts at activation.
    assert!((*translation - Vec2::new(10.0, 0.0)).hypot() < 1e-9);

    engine.handle_pointer(&PointerEvent::up(F0, pt(25.0, 0.0), 40));
    assert_eq!(path(&engine, pan), [Began, Active, End, Undetermined]);
    assert_legal_paths(&engine);
}

#[test]
fn pan_translation_survives_pointer_changes() {
    let mut engine = engine();
    let pan = engine.attach(GestureConfig::pan(PanProps::default())).unwrap();

    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 0));
    engine.handle_pointer(&PointerEvent::moved(F0, pt(20.0, 0.0), 10));
    engine.handle_pointer(&PointerEvent::moved(F0, pt(30.0, 0.0), 20));
    // A second finger shifts the centroid but not the translation.
    engine.handle_pointer(&PointerEvent::additional_down(F1, pt(130.0, 0.0), 30));
    engine.handle_pointer(&PointerEvent::moved(F1, pt(140.0, 0.0), 40));

    let Some(GestureDetails::Pan { translation, .. }) = last_update(&engine, pan) else {
        panic!("pan reported no update");
    };
    // 10 from the first finger, then the centroid moved by 5.
    assert!((translation.x - 15.0).abs() < 1e-9);
    assert_eq!(engine.tracked_pointers(pan).unwrap(), [F0, F1]);
}

#[test]
fn pan_offset_windows() {
    let mut engine = engine();
    let pan = engine
        .attach(GestureConfig::pan(PanProps {
            active_offset_x: Some(OffsetRange::Range(-20.0, 20.0)),
            fail_offset_y: Some(OffsetRange::Single(5.0)),
            ..PanProps::default()
        }))
        .unwrap();

    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 0));
    engine.handle_pointer(&PointerEvent::moved(F0, pt(15.0, 0.0), 10));
    assert_eq!(engine.state(pan), Some(Began));
    engine.handle_pointer(&PointerEvent::moved(F0, pt(15.0, 6.0), 20));
    engine.handle_pointer(&PointerEvent::up(F0, pt(15.0, 6.0), 30));
    assert_eq!(path(&engine, pan), [Began, Failed, Undetermined]);

    engine.sink_mut().clear();
    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 100));
    engine.handle_pointer(&PointerEvent::moved(F0, pt(-25.0, 0.0), 110));
    assert_eq!(engine.state(pan), Some(Active));
}

#[test]
fn pan_fails_above_max_pointers() {
    let mut engine = engine();
    let pan = engine
        .attach(GestureConfig::pan(PanProps {
            max_pointers: 1,
            ..PanProps::default()
        }))
        .unwrap();
    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 0));
    engine.handle_pointer(&PointerEvent::additional_down(F1, pt(50.0, 0.0), 10));
    assert_eq!(path(&engine, pan), [Began, Failed, Undetermined]);
    assert!(engine.tracked_pointers(pan).unwrap().is_empty());
}

#[test]
fn pan_after_long_press() {
    let mut engine = engine();
    let pan = engine
        .attach(GestureConfig::pan(PanProps {
            activate_after_long_press_ms: 300,
            ..PanProps::default()
        }))
        .unwrap();
    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 0));
    engine.handle_pointer(&PointerEvent::moved(F0, pt(15.0, 0.0), 100));
    // Moving past the slop before the hold completes fails.
    assert_eq!(engine.state(pan), Some(Undetermined));
    engine.handle_pointer(&PointerEvent::up(F0, pt(15.0, 0.0), 150));

    engine.sink_mut().clear();
    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 1_000));
    engine.advance_to(1_300);
    assert_eq!(engine.state(pan), Some(Active));
}

#[test]
fn long_press_activates_then_cancels_on_drift() {
    let mut engine = engine();
    let press = engine
        .attach(GestureConfig::long_press(LongPressConfig::default()))
        .unwrap();

    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 0));
    assert_eq!(engine.next_deadline(), Some(500));
    engine.advance_to(500);
    assert_eq!(engine.state(press), Some(Active));
    assert_eq!(
        last_update(&engine, press),
        Some(&GestureDetails::LongPress { duration_ms: 500 })
    );

    engine.handle_pointer(&PointerEvent::moved(F0, pt(20.0, 0.0), 600));
    assert_eq!(path(&engine, press), [Began, Active, Cancelled, Undetermined]);

    // Released early: the press never activates.
    engine.handle_pointer(&PointerEvent::up(F0, pt(20.0, 0.0), 650));
    engine.sink_mut().clear();
    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 1_000));
    engine.handle_pointer(&PointerEvent::up(F0, pt(0.0, 0.0), 1_200));
    assert_eq!(path(&engine, press), [Began, Failed, Undetermined]);
    assert_legal_paths(&engine);
}

#[test]
fn fling_right() {
    let mut engine = engine();
    let fling = engine.attach(GestureConfig::fling(FlingConfig::default())).unwrap();

    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 0));
    let t = drag(&mut engine, F0, pt(0.0, 0.0), pt(80.0, 0.0), 0, 4);
    engine.handle_pointer(&PointerEvent::up(F0, pt(80.0, 0.0), t + 5));
    assert_eq!(path(&engine, fling), [Began, Active, End, Undetermined]);
}

#[test]
fn fling_in_a_disabled_direction_fails() {
    let mut engine = engine();
    let fling = engine.attach(GestureConfig::fling(FlingConfig::default())).unwrap();

    engine.handle_pointer(&PointerEvent::down(F0, pt(100.0, 0.0), 0));
    let t = drag(&mut engine, F0, pt(100.0, 0.0), pt(20.0, 0.0), 0, 4);
    engine.handle_pointer(&PointerEvent::up(F0, pt(20.0, 0.0), t + 5));
    assert_eq!(path(&engine, fling), [Began, Failed, Undetermined]);
}

#[test]
fn fling_expires() {
    let mut engine = engine();
    let fling = engine.attach(GestureConfig::fling(FlingConfig::default())).unwrap();
    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 0));
    engine.advance_to(900);
    assert_eq!(path(&engine, fling), [Began, Failed, Undetermined]);
}

/// Two fingers 100 apart; the second one rotates and spreads.
fn pinch_and_twist(engine: &mut Engine) {
    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 0));
    engine.handle_pointer(&PointerEvent::additional_down(F1, pt(100.0, 0.0), 10));
    engine.handle_pointer(&PointerEvent::moved(F1, pt(100.0, 20.0), 20));
    engine.handle_pointer(&PointerEvent::moved(F1, pt(150.0, 20.0), 30));
}

#[test]
fn pinch_and_rotation_run_together_when_simultaneous() {
    let mut engine = engine();
    let pinch = engine.attach(GestureConfig::pinch(PinchConfig::default())).unwrap();
    let rotation = engine
        .attach(GestureConfig::rotation(RotationConfig::default()))
        .unwrap();
    engine
        .install(&Composition::simultaneous([pinch, rotation]))
        .unwrap();

    pinch_and_twist(&mut engine);
    assert_eq!(engine.state(pinch), Some(Active));
    assert_eq!(engine.state(rotation), Some(Active));

    let Some(GestureDetails::Pinch { scale, focal, .. }) = last_update(&engine, pinch) else {
        panic!("pinch reported no update");
    };
    let expected = pt(150.0, 20.0).to_vec2().hypot() / pt(100.0, 20.0).to_vec2().hypot();
    assert!((scale - expected).abs() < 1e-9);
    assert_eq!(*focal, pt(75.0, 10.0));

    let Some(GestureDetails::Rotation {
        rotation: angle,
        anchor,
        ..
    }) = last_update(&engine, rotation)
    else {
        panic!("rotation reported no update");
    };
    assert!((angle - Vec2::new(150.0, 20.0).atan2()).abs() < 1e-9);
    assert_eq!(*anchor, pt(75.0, 10.0));

    engine.handle_pointer(&PointerEvent::additional_up(F1, pt(150.0, 20.0), 40));
    assert!(reached(&engine, pinch, End));
    assert!(reached(&engine, rotation, End));
    assert_legal_paths(&engine);
}

#[test]
fn same_tick_activation_keeps_attachment_order() {
    let mut engine = engine();
    let pinch = engine.attach(GestureConfig::pinch(PinchConfig::default())).unwrap();
    let rotation = engine
        .attach(GestureConfig::rotation(RotationConfig::default()))
        .unwrap();

    pinch_and_twist(&mut engine);
    assert_eq!(engine.state(pinch), Some(Active));
    assert_eq!(path(&engine, rotation), [Began, Failed, Undetermined]);
    assert!(!ever_both_active(&engine, pinch, rotation));
}

#[test]
fn later_activation_takes_over() {
    let mut engine = engine();
    let pan = engine.attach(GestureConfig::pan(PanProps::default())).unwrap();
    let pinch = engine.attach(GestureConfig::pinch(PinchConfig::default())).unwrap();

    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 0));
    engine.handle_pointer(&PointerEvent::moved(F0, pt(20.0, 0.0), 10));
    assert_eq!(engine.state(pan), Some(Active));
    engine.handle_pointer(&PointerEvent::additional_down(F1, pt(120.0, 0.0), 20));
    engine.handle_pointer(&PointerEvent::moved(F1, pt(160.0, 0.0), 30));

    assert_eq!(engine.state(pinch), Some(Active));
    assert_eq!(path(&engine, pan), [Began, Active, Cancelled, Undetermined]);
    assert!(!ever_both_active(&engine, pan, pinch));
    assert_legal_paths(&engine);
}

#[test]
fn shared_pointer_excludes_tap_and_pan() {
    let mut engine = engine();
    let tap_id = engine.attach(GestureConfig::tap(TapConfig::default())).unwrap();
    let pan = engine.attach(GestureConfig::pan(PanProps::default())).unwrap();

    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 0));
    assert_eq!(engine.state(tap_id), Some(Began));
    drag(&mut engine, F0, pt(0.0, 0.0), pt(40.0, 0.0), 0, 4);

    assert_eq!(path(&engine, tap_id), [Began, Failed, Undetermined]);
    assert_eq!(engine.state(pan), Some(Active));
}

#[test]
fn simultaneous_pans_both_activate() {
    let mut engine = engine();
    let a = engine.attach(GestureConfig::pan(PanProps::default())).unwrap();
    let b = engine
        .attach(GestureConfig::pan(PanProps::default()).simultaneous_with(a))
        .unwrap();

    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 0));
    drag(&mut engine, F0, pt(0.0, 0.0), pt(40.0, 0.0), 0, 4);
    assert_eq!(engine.state(a), Some(Active));
    assert_eq!(engine.state(b), Some(Active));
    assert!(ever_both_active(&engine, a, b));

    // Without the relation the later one loses the same-tick tie-break.
    let mut engine = self::engine();
    let a = engine.attach(GestureConfig::pan(PanProps::default())).unwrap();
    let b = engine.attach(GestureConfig::pan(PanProps::default())).unwrap();
    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 0));
    drag(&mut engine, F0, pt(0.0, 0.0), pt(40.0, 0.0), 0, 4);
    assert_eq!(engine.state(a), Some(Active));
    assert_eq!(path(&engine, b), [Began, Failed, Undetermined]);
}

#[test]
fn race_excludes_without_shared_pointers() {
    let mut engine = engine();
    let left = engine
        .attach(GestureConfig::pan(PanProps::default()).with_hit_area(Rect::new(
            0.0, 0.0, 100.0, 100.0,
        )))
        .unwrap();
    let right = engine
        .attach(GestureConfig::pan(PanProps::default()).with_hit_area(Rect::new(
            100.0, 0.0, 200.0, 100.0,
        )))
        .unwrap();
    engine.install(&Composition::race([left, right])).unwrap();

    engine.handle_pointer(&PointerEvent::down(F0, pt(50.0, 50.0), 0));
    engine.handle_pointer(&PointerEvent::additional_down(F1, pt(150.0, 50.0), 10));
    assert_eq!(engine.tracked_pointers(left).unwrap(), [F0]);
    assert_eq!(engine.tracked_pointers(right).unwrap(), [F1]);

    engine.handle_pointer(&PointerEvent::moved(F0, pt(70.0, 50.0), 20));
    assert_eq!(engine.state(left), Some(Active));
    assert_eq!(path(&engine, right), [Began, Failed, Undetermined]);
}

#[test]
fn waiter_stays_undetermined_until_awaited_fails() {
    let mut engine = engine();
    let press = engine
        .attach(GestureConfig::long_press(LongPressConfig::default()))
        .unwrap();
    let pan = engine
        .attach(GestureConfig::pan(PanProps::default()).wait_for(press))
        .unwrap();

    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 0));
    engine.handle_pointer(&PointerEvent::moved(F0, pt(5.0, 0.0), 10));
    assert_eq!(engine.state(press), Some(Began));
    assert_eq!(engine.state(pan), Some(Undetermined));

    // Drifting fails the long press, which releases the pan.
    engine.handle_pointer(&PointerEvent::moved(F0, pt(30.0, 0.0), 20));
    assert_eq!(engine.state(pan), Some(Active));

    // The pan only began once the long press was no longer live.
    let mut press_live = false;
    for event in engine.sink() {
        let Some((_, to)) = event.transition() else {
            continue;
        };
        if event.handler() == press {
            press_live = to.is_live();
        } else if event.handler() == pan && to == Began {
            assert!(!press_live, "pan began while the long press was live");
        }
    }
    assert_legal_paths(&engine);
}

#[test]
fn waiter_gives_up_when_awaited_succeeds() {
    let mut engine = engine();
    let press = engine
        .attach(GestureConfig::long_press(LongPressConfig::default()))
        .unwrap();
    let tap_id = engine
        .attach(GestureConfig::tap(TapConfig {
            max_duration_ms: 2_000,
            ..TapConfig::default()
        }))
        .unwrap();
    engine.install(&Composition::sequence([press, tap_id])).unwrap();

    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 0));
    engine.handle_pointer(&PointerEvent::up(F0, pt(0.0, 0.0), 700));
    assert_eq!(path(&engine, press), [Began, Active, End, Undetermined]);
    assert!(path(&engine, tap_id).is_empty());
    assert_eq!(engine.state(tap_id), Some(Undetermined));
}

#[test]
fn single_tap_fires_once_double_tap_fails() {
    let mut engine = engine();
    let single = engine.attach(GestureConfig::tap(TapConfig::default())).unwrap();
    let double = engine
        .attach(GestureConfig::tap(TapConfig {
            number_of_taps: 2,
            ..TapConfig::default()
        }))
        .unwrap();
    engine.install(&Composition::sequence([double, single])).unwrap();

    // Attached before the double tap, the single tap still waits for it.
    tap(&mut engine, F0, pt(0.0, 0.0), 0);
    assert_eq!(engine.state(double), Some(Began));
    assert_eq!(engine.state(single), Some(Undetermined));
    assert!(path(&engine, single).is_empty());

    engine.advance_to(600);
    assert_eq!(path(&engine, double), [Began, Failed, Undetermined]);
    assert_eq!(path(&engine, single), [Began, Active, End, Undetermined]);
    assert_legal_paths(&engine);
}

#[test]
fn taps_sharing_a_finger_end_once() {
    let mut engine = engine();
    let single = engine.attach(GestureConfig::tap(TapConfig::default())).unwrap();
    let double = engine
        .attach(GestureConfig::tap(TapConfig {
            number_of_taps: 2,
            ..TapConfig::default()
        }))
        .unwrap();
    let other = engine.attach(GestureConfig::tap(TapConfig::default())).unwrap();
    engine.install(&Composition::sequence([double, single])).unwrap();

    // The finger is already gone when `other` activates on its up; the
    // handlers that saw it still lose.
    tap(&mut engine, F0, pt(0.0, 0.0), 0);
    assert_eq!(path(&engine, other), [Began, Active, End, Undetermined]);
    assert_eq!(path(&engine, double), [Began, Failed, Undetermined]);
    assert!(path(&engine, single).is_empty());

    engine.advance_to(1_000);
    assert!(path(&engine, single).is_empty());
    assert_legal_paths(&engine);
}

#[test]
fn blocking_handler_attached_later_still_goes_first() {
    let mut engine = engine();
    let tap_id = engine.attach(GestureConfig::tap(TapConfig::default())).unwrap();
    let press = engine
        .attach(GestureConfig::long_press(LongPressConfig::default()).blocks(tap_id))
        .unwrap();

    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 0));
    assert_eq!(engine.state(press), Some(Began));
    assert_eq!(engine.state(tap_id), Some(Undetermined));

    engine.advance_to(500);
    assert_eq!(engine.state(press), Some(Active));
    engine.handle_pointer(&PointerEvent::up(F0, pt(0.0, 0.0), 600));
    assert_eq!(path(&engine, press), [Began, Active, End, Undetermined]);
    assert!(path(&engine, tap_id).is_empty());
    assert_legal_paths(&engine);
}

#[test]
fn sequence_orders_handlers_regardless_of_attachment() {
    let mut engine = engine();
    let second = engine.attach(GestureConfig::tap(TapConfig::default())).unwrap();
    let first = engine
        .attach(GestureConfig::long_press(LongPressConfig::default()))
        .unwrap();
    engine.install(&Composition::sequence([first, second])).unwrap();

    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 0));
    assert_eq!(engine.state(first), Some(Began));
    assert_eq!(engine.state(second), Some(Undetermined));

    // Released too early for a long press; the tap goes through.
    engine.handle_pointer(&PointerEvent::up(F0, pt(0.0, 0.0), 100));
    assert_eq!(path(&engine, first), [Began, Failed, Undetermined]);
    assert_eq!(path(&engine, second), [Began, Active, End, Undetermined]);
    assert_legal_paths(&engine);
}

#[test]
fn long_press_ends_when_any_pointer_lifts() {
    let mut engine = engine();
    let press = engine
        .attach(GestureConfig::long_press(LongPressConfig {
            number_of_pointers: 2,
            ..LongPressConfig::default()
        }))
        .unwrap();

    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 0));
    engine.handle_pointer(&PointerEvent::additional_down(F1, pt(40.0, 0.0), 10));
    engine.advance_to(600);
    assert_eq!(engine.state(press), Some(Active));

    engine.handle_pointer(&PointerEvent::additional_up(F1, pt(40.0, 0.0), 700));
    assert_eq!(path(&engine, press), [Began, Active, End, Undetermined]);
    engine.handle_pointer(&PointerEvent::up(F0, pt(0.0, 0.0), 710));
    assert_eq!(path(&engine, press).len(), 4);
}

#[test]
fn detach_releases_waiters() {
    let mut engine = engine();
    let a = engine.attach(GestureConfig::tap(TapConfig::default())).unwrap();
    let b = engine
        .attach(GestureConfig::pan(PanProps::default()).wait_for(a))
        .unwrap();

    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 0));
    assert_eq!(engine.state(b), Some(Undetermined));
    assert!(engine.detach(a));
    assert_eq!(path(&engine, a), [Began, Failed]);
    assert_eq!(engine.state(b), Some(Began));
    assert!(engine.relations().is_empty());
}

#[test]
fn platform_cancel_and_leaving_the_area_cancel() {
    let mut engine = engine();
    let pan = engine.attach(GestureConfig::pan(PanProps::default())).unwrap();
    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 0));
    engine.handle_pointer(&PointerEvent::moved(F0, pt(20.0, 0.0), 10));
    engine.handle_pointer(&PointerEvent::cancel(F0, pt(20.0, 0.0), 20));
    assert_eq!(path(&engine, pan), [Began, Active, Cancelled, Undetermined]);
    assert!(engine.tracker().is_empty());

    let mut engine = self::engine();
    let pan = engine
        .attach(
            GestureConfig::pan(PanProps::default())
                .with_hit_area(Rect::new(0.0, 0.0, 100.0, 100.0))
                .with_cancel_when_outside(true),
        )
        .unwrap();
    engine.handle_pointer(&PointerEvent::down(F0, pt(50.0, 50.0), 0));
    engine.handle_pointer(&PointerEvent::moved(F0, pt(70.0, 50.0), 10));
    engine.handle_pointer(&PointerEvent::moved(F0, pt(150.0, 50.0), 20));
    assert_eq!(path(&engine, pan), [Began, Active, Cancelled, Undetermined]);
}

#[test]
fn adoption_filters() {
    let mut engine = engine();
    let boxed = engine
        .attach(GestureConfig::tap(TapConfig::default()).with_hit_area(Rect::new(
            0.0, 0.0, 10.0, 10.0,
        )))
        .unwrap();
    let secondary = engine
        .attach(GestureConfig::tap(TapConfig::default()).with_mouse_buttons(MouseButtons::SECONDARY))
        .unwrap();
    let disabled = engine
        .attach(GestureConfig::tap(TapConfig::default()).with_enabled(false))
        .unwrap();

    let left_click = PointerEvent::down(F0, pt(50.0, 50.0), 0)
        .with_kind(PointerKind::Mouse)
        .with_buttons(0b01);
    engine.handle_pointer(&left_click);
    assert_eq!(engine.state(boxed), Some(Undetermined));
    assert_eq!(engine.state(secondary), Some(Undetermined));
    engine.handle_pointer(&PointerEvent::up(F0, pt(50.0, 50.0), 10));

    let right_click = PointerEvent::down(F0, pt(50.0, 50.0), 100)
        .with_kind(PointerKind::Mouse)
        .with_buttons(0b10);
    engine.handle_pointer(&right_click);
    assert_eq!(engine.state(secondary), Some(Began));
    engine.handle_pointer(&PointerEvent::up(F0, pt(50.0, 50.0), 110));

    // Touch is never filtered by button.
    engine.sink_mut().clear();
    tap(&mut engine, F0, pt(5.0, 5.0), 200);
    assert!(reached(&engine, boxed, End));
    assert!(reached(&engine, secondary, End) || reached(&engine, secondary, Failed));
    assert!(path(&engine, disabled).is_empty());
}

#[test]
fn lost_pointers_are_lifted_on_the_next_down() {
    let mut engine = engine();
    let pan = engine.attach(GestureConfig::pan(PanProps::default())).unwrap();
    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 0));
    engine.handle_pointer(&PointerEvent::moved(F0, pt(20.0, 0.0), 10));

    // The up for F0 never arrived.
    engine.handle_pointer(&PointerEvent::down(F1, pt(200.0, 0.0), 500));
    assert_eq!(path(&engine, pan), [Began, Active, End, Undetermined, Began]);
    assert_eq!(engine.tracker().len(), 1);
    assert_eq!(engine.tracked_pointers(pan).unwrap(), [F1]);
}

#[test]
fn config_errors_are_local_to_the_attachment() {
    let mut engine = engine();
    let err = engine
        .attach(GestureConfig::pan(PanProps {
            min_delta_x: Some(10.0),
            active_offset_x: Some(OffsetRange::Single(10.0)),
            ..PanProps::default()
        }))
        .unwrap_err();
    assert!(matches!(err, ConfigError::LegacyOffsetConflict { .. }));

    let err = engine
        .attach(GestureConfig::pan(PanProps {
            active_offset_y: Some(OffsetRange::Range(5.0, 20.0)),
            ..PanProps::default()
        }))
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidOffsetRange { .. }));

    let a = engine.attach(GestureConfig::tap(TapConfig::default())).unwrap();
    let b = engine.attach(GestureConfig::tap(TapConfig::default())).unwrap();
    let c = engine.attach(GestureConfig::tap(TapConfig::default())).unwrap();
    assert_eq!(
        engine.install(&Composition::Exclusive(vec![a.into(), b.into(), c.into()])),
        Err(CompositionError::ExclusiveArity(3))
    );
    assert_eq!(
        engine.install(&Composition::race([a, a])),
        Err(CompositionError::DuplicateHandler(a))
    );

    // Nothing was installed; the first tap takes over from the others.
    tap(&mut engine, F0, pt(0.0, 0.0), 0);
    assert!(reached(&engine, a, End));
    assert_eq!(path(&engine, b), [Began, Failed, Undetermined]);
    assert_eq!(path(&engine, c), [Began, Failed, Undetermined]);
}

#[test]
fn closures_can_be_sinks() {
    let mut changes = 0;
    let mut engine = GestureEngine::new(FnSink(|event: GestureEvent| {
        if event.transition().is_some() {
            changes += 1;
        }
    }));
    engine.attach(GestureConfig::tap(TapConfig::default())).unwrap();
    engine.handle_pointer(&PointerEvent::down(F0, pt(0.0, 0.0), 0));
    engine.handle_pointer(&PointerEvent::up(F0, pt(0.0, 0.0), 10));
    drop(engine);
    assert_eq!(changes, 4);
}

/// Small deterministic generator for the stress test.
struct Lcg(u64);

impl Lcg {
    fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    fn index(&mut self, len: usize) -> usize {
        usize::try_from(self.below(len as u64)).unwrap()
    }

    fn coord(&mut self) -> f64 {
        self.below(400) as f64
    }
}

#[test]
fn random_streams_keep_every_invariant() {
    let mut engine = engine();
    let tap_id = engine.attach(GestureConfig::tap(TapConfig::default())).unwrap();
    let double = engine
        .attach(GestureConfig::tap(TapConfig {
            number_of_taps: 2,
            ..TapConfig::default()
        }))
        .unwrap();
    let pan = engine.attach(GestureConfig::pan(PanProps::default())).unwrap();
    engine
        .attach(GestureConfig::pan(PanProps::default()).simultaneous_with(pan))
        .unwrap();
    engine
        .attach(GestureConfig::long_press(LongPressConfig::default()))
        .unwrap();
    engine.attach(GestureConfig::pinch(PinchConfig::default())).unwrap();
    engine
        .attach(GestureConfig::rotation(RotationConfig::default()))
        .unwrap();
    engine.attach(GestureConfig::fling(FlingConfig::default())).unwrap();
    engine.install(&Composition::sequence([double, tap_id])).unwrap();
    let ids: Vec<HandlerId> = (0..8).map(HandlerId).collect();

    let mut rng = Lcg(0x5eed);
    let mut down: Vec<(PointerId, Point)> = Vec::new();
    let mut next_id = 0;
    let mut t = 0;
    let mut seen = 0;
    let mut cycles: HashMap<HandlerId, Vec<PointerId>> = HashMap::new();
    let mut enders: HashMap<PointerId, Vec<HandlerId>> = HashMap::new();
    for _ in 0..2_000 {
        t += 1 + rng.below(40);
        let event = match rng.below(10) {
            _ if down.is_empty() => {
                let p = pt(rng.coord(), rng.coord());
                next_id += 1;
                down.push((PointerId(next_id), p));
                Some(PointerEvent::down(PointerId(next_id), p, t))
            }
            0 | 1 if down.len() < 3 => {
                let p = pt(rng.coord(), rng.coord());
                next_id += 1;
                down.push((PointerId(next_id), p));
                Some(PointerEvent::additional_down(PointerId(next_id), p, t))
            }
            2 => {
                let (id, p) = down.remove(rng.index(down.len()));
                Some(if down.is_empty() {
                    PointerEvent::up(id, p, t)
                } else {
                    PointerEvent::additional_up(id, p, t)
                })
            }
            3 if rng.below(20) == 0 => {
                let (id, p) = down.remove(0);
                Some(PointerEvent::cancel(id, p, t))
            }
            4 if rng.below(10) == 0 => {
                t += 600;
                None
            }
            _ => {
                let i = rng.index(down.len());
                let step = Vec2::new(rng.coord() - 200.0, rng.coord() - 200.0) / 10.0;
                down[i].1 += step;
                Some(PointerEvent::moved(down[i].0, down[i].1, t))
            }
        };
        match event {
            Some(event) => engine.handle_pointer(&event),
            None => engine.advance_to(t),
        }

        // Handlers that ended on a common pointer must be simultaneous.
        for event in &engine.sink()[seen..] {
            let Some((_, to)) = event.transition() else {
                continue;
            };
            let id = event.handler();
            if to == End {
                for &p in cycles.get(&id).into_iter().flatten() {
                    enders.entry(p).or_default().push(id);
                }
            }
            if to.is_finished() {
                cycles.remove(&id);
            }
        }
        seen = engine.sink().len();
        for &id in &ids {
            let tracked = engine.tracked_pointers(id).unwrap();
            if tracked.is_empty() && engine.state(id) == Some(Undetermined) {
                cycles.remove(&id);
                continue;
            }
            let cycle = cycles.entry(id).or_default();
            for &p in tracked {
                if !cycle.contains(&p) {
                    cycle.push(p);
                }
            }
        }

        for &a in &ids {
            for &b in &ids {
                if a >= b
                    || engine.state(a) != Some(Active)
                    || engine.state(b) != Some(Active)
                    || engine.relations().is_simultaneous(a, b)
                {
                    continue;
                }
                let pa = engine.tracked_pointers(a).unwrap();
                let pb = engine.tracked_pointers(b).unwrap();
                assert!(
                    pa.iter().all(|p| !pb.contains(p)),
                    "{a} and {b} are both active on a shared pointer at t={t}"
                );
            }
        }
    }
    for (p, list) in &enders {
        for (i, &a) in list.iter().enumerate() {
            for &b in &list[i + 1..] {
                assert!(
                    a == b || engine.relations().is_simultaneous(a, b),
                    "{a} and {b} both ended on {p}"
                );
            }
        }
    }
    assert_legal_paths(&engine);
}
