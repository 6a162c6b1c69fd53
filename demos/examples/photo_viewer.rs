// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A photo viewer's gesture setup, driven by a scripted pointer stream.
//!
//! This example shows how to combine:
//! - a pan, a pinch and a rotation that may all run together,
//! - a double tap that takes priority over a single tap,
//! - a long press that competes with the pan for the same finger,
//! - virtual time: timers fire as the clock is advanced.
//!
//! Every event the engine reports is printed as it happens.
//!
//! Run:
//! - `cargo run -p understory_demos --example photo_viewer`

use kurbo::{Point, Rect};
use understory_gesture::{
    Composition, FnSink, GestureConfig, GestureDetails, GestureEngine, GestureEvent,
    LongPressConfig, PanProps, PinchConfig, RotationConfig, TapConfig,
};
use understory_pointer::{PointerEvent, PointerId};

fn print_event(event: GestureEvent) {
    let data = event.data();
    match event.transition() {
        Some((from, to)) => println!(
            "  {} {}: {from} -> {to} ({} pointers at {:?})",
            event.kind(),
            event.handler(),
            data.number_of_pointers,
            data.position,
        ),
        None => match &data.details {
            GestureDetails::Pan { translation, .. } => {
                println!("  pan: translation {translation:?}");
            }
            GestureDetails::Pinch { scale, focal, .. } => {
                println!("  pinch: scale {scale:.3} around {focal:?}");
            }
            GestureDetails::Rotation { rotation, .. } => {
                println!("  rotation: {:.1} degrees", rotation.to_degrees());
            }
            GestureDetails::LongPress { duration_ms } => {
                println!("  long press: held for {duration_ms}ms");
            }
            other => println!("  {other:?}"),
        },
    }
}

fn main() {
    let mut engine = GestureEngine::new(FnSink(print_event));
    let photo = Rect::new(0.0, 0.0, 400.0, 300.0);
    let on_photo = |config: GestureConfig| config.with_hit_area(photo);

    let single = engine
        .attach(on_photo(GestureConfig::tap(TapConfig::default())))
        .unwrap();
    let double = engine
        .attach(on_photo(GestureConfig::tap(TapConfig {
            number_of_taps: 2,
            ..TapConfig::default()
        })))
        .unwrap();
    let press = engine
        .attach(on_photo(GestureConfig::long_press(LongPressConfig::default())))
        .unwrap();
    let pan = engine
        .attach(on_photo(GestureConfig::pan(PanProps::default())))
        .unwrap();
    let pinch = engine
        .attach(on_photo(GestureConfig::pinch(PinchConfig::default())))
        .unwrap();
    let rotation = engine
        .attach(on_photo(GestureConfig::rotation(RotationConfig::default())))
        .unwrap();

    // Zooming, rotating and panning all at once; a double tap beats a single one.
    engine
        .install(&Composition::race([
            Composition::simultaneous([pan, pinch, rotation]),
            Composition::sequence([double, single]),
            press.into(),
        ]))
        .unwrap();

    let (f0, f1) = (PointerId(0), PointerId(1));

    println!("single tap:");
    engine.handle_pointer(&PointerEvent::down(f0, Point::new(100.0, 100.0), 0));
    engine.handle_pointer(&PointerEvent::up(f0, Point::new(100.0, 100.0), 60));
    // The single tap only fires once the double tap window has run out.
    engine.advance_to(engine.next_deadline().unwrap_or(600));

    println!("double tap:");
    for (t, at) in [(1_000, 120.0), (1_200, 122.0)] {
        engine.handle_pointer(&PointerEvent::down(f0, Point::new(at, 80.0), t));
        engine.handle_pointer(&PointerEvent::up(f0, Point::new(at, 80.0), t + 50));
    }

    println!("long press:");
    engine.handle_pointer(&PointerEvent::down(f0, Point::new(200.0, 150.0), 3_000));
    engine.advance_to(3_600);
    engine.handle_pointer(&PointerEvent::up(f0, Point::new(200.0, 150.0), 3_700));

    println!("drag:");
    let mut t = 5_000;
    engine.handle_pointer(&PointerEvent::down(f0, Point::new(50.0, 50.0), t));
    for step in 1..=5 {
        t += 16;
        let x = 50.0 + 12.0 * f64::from(step);
        engine.handle_pointer(&PointerEvent::moved(f0, Point::new(x, 50.0), t));
    }
    engine.handle_pointer(&PointerEvent::up(f0, Point::new(110.0, 50.0), t + 16));

    println!("pinch and twist:");
    let mut t = 7_000;
    engine.handle_pointer(&PointerEvent::down(f0, Point::new(150.0, 150.0), t));
    engine.handle_pointer(&PointerEvent::additional_down(
        f1,
        Point::new(250.0, 150.0),
        t + 5,
    ));
    for step in 1..=6 {
        t += 16;
        let spread = 50.0 + 8.0 * f64::from(step);
        let tilt = 4.0 * f64::from(step);
        engine.handle_pointer(&PointerEvent::moved(
            f1,
            Point::new(200.0 + spread, 150.0 + tilt),
            t,
        ));
        engine.handle_pointer(&PointerEvent::moved(
            f0,
            Point::new(200.0 - spread, 150.0 - tilt),
            t + 1,
        ));
    }
    engine.handle_pointer(&PointerEvent::additional_up(f1, Point::new(298.0, 174.0), t + 16));
    engine.handle_pointer(&PointerEvent::up(f0, Point::new(102.0, 126.0), t + 20));

    println!("done at t={}", engine.now());
}
