/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */
#![allow(unused)]

use std::time::{Duration, Instant};
use odin_radar::{RadarConfig, RadarState, SituationMsg, Watchdog, LinkStatus};

/// run with "cargo test --test test_watchdog -- --nocapture"

fn connected_state (now: Instant)->RadarState {
    let state = RadarState::new( RadarConfig::default());
    let msg = SituationMsg { horizontal_accuracy: Some(5.0), latitude: Some(10.0), longitude: Some(20.0), ..Default::default() };
    state.apply_situation_msg( &msg, now, chrono::Utc::now());

    // renderer picked up everything
    state.take_situation();
    state.take_attitude();
    state.take_gmeter();
    state
}

#[test]
fn test_expiry () {
    let now0 = Instant::now();
    let state = connected_state( now0);
    let watchdog = Watchdog::new( Duration::from_secs(3));

    assert!( state.is_connected());
    assert!( !watchdog.check( &state, now0 + Duration::from_secs(2)));
    assert!( state.is_connected());
    assert!( !state.situation().changed);

    assert!( watchdog.check( &state, now0 + Duration::from_secs(4)));
    println!("disconnected after 4s silence ✅");
    assert!( !state.is_connected());
    assert!( state.situation().changed);
    assert!( state.attitude().changed);
    assert!( state.gmeter().changed);

    // only flips once
    state.take_situation();
    assert!( !watchdog.check( &state, now0 + Duration::from_secs(5)));
    assert!( !state.situation().changed);
}

#[test]
fn test_reconnect () {
    let now0 = Instant::now();
    let state = connected_state( now0);
    let watchdog = Watchdog::new( Duration::from_secs(3));

    let msg = SituationMsg::default();
    state.apply_situation_msg( &msg, now0 + Duration::from_secs(2), chrono::Utc::now());
    assert!( !watchdog.check( &state, now0 + Duration::from_secs(4)));

    assert!( watchdog.check( &state, now0 + Duration::from_secs(6)));
    state.take_attitude();

    // next message reconnects and forces a redraw of dependent screens
    state.apply_situation_msg( &msg, now0 + Duration::from_secs(7), chrono::Utc::now());
    assert!( state.is_connected());
    assert!( state.attitude().changed);
}

#[test]
fn test_never_connected () {
    let state = RadarState::new( RadarConfig::default());
    let watchdog = Watchdog::new( Duration::from_secs(3));
    assert!( !watchdog.is_expired( &state.situation(), Instant::now()));
    assert!( !watchdog.check( &state, Instant::now()));

    state.mark_disconnected(); // idempotent
    assert!( !state.is_connected());
}
