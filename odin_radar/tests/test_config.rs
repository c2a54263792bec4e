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

use std::time::Duration;
use odin_radar::{Mode, RadarConfig, load_config, parse_config};

/// run with "cargo test --test test_config -- --nocapture"

#[test]
fn test_config_file () {
    let config = load_config( concat!( env!("CARGO_MANIFEST_DIR"), "/configs/radar.ron")).unwrap();
    println!("{config:#?}");
    assert_eq!( config.host, "192.168.10.1");
    assert!( config.flight_time);
    assert_eq!( config.timing.lost_connection, Duration::from_millis(300));
    assert_eq!( config.traffic_url(), "ws://192.168.10.1/radar");
}

#[test]
fn test_partial_config () {
    let config = parse_config( r#"RadarConfig( host: "10.0.0.5", start_mode: StratuxStatus, display: ( max_pixel: 240, zero_x: 120, zero_y: 120 ) )"#).unwrap();
    assert_eq!( config.start_mode, Mode::StratuxStatus);
    assert_eq!( config.display.radius(), 120.0);
    assert_eq!( config.display.arc_exclude, None);
    assert_eq!( config.timing.watchdog, Duration::from_secs(3));
    assert_eq!( config.settings_url(), "http://10.0.0.5/setSettings");

    assert!( parse_config( "RadarConfig( display: ( max_pixel: 0 ) )").is_err());
    assert!( load_config( "does/not/exist.ron").is_err());
}
