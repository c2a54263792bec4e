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
use odin_radar::{config::DisplayGeometry, projection::*};

/// run with "cargo test --test test_projection -- --nocapture"

fn approx (a: f64, b: f64, eps: f64)->bool { (a - b).abs() <= eps }

#[test]
fn test_normalize () {
    assert_eq!( normalize_180(190.0), -170.0);
    assert_eq!( normalize_180(-180.0), 180.0);
    assert_eq!( normalize_180(180.0), 180.0);
    assert_eq!( normalize_180(-190.0), 170.0);
    assert_eq!( normalize_360(-30.0), 330.0);
    assert_eq!( normalize_360(360.0), 0.0);
    assert_eq!( normalize_360(725.0), 5.0);
}

#[test]
fn test_ground_vector () {
    let gv = ground_vector( 0.0, 0.0, 0.01, 0.0);
    println!("0.01° north: {gv:?}");
    assert!( approx( gv.distance, 0.6, 0.05));
    assert!( approx( gv.bearing, 0.0, 0.001));

    let gv = ground_vector( 0.0, 0.0, 0.0, 0.01);
    println!("0.01° east:  {gv:?}");
    assert!( approx( gv.distance, 0.6, 0.05));
    assert!( approx( gv.bearing, 90.0, 0.001));

    let gv = ground_vector( 0.0, 0.0, -0.01, 0.0);
    assert!( approx( gv.bearing, 180.0, 0.001));

    let gv = ground_vector( 0.0, 0.0, 0.0, -0.01);
    assert!( approx( gv.bearing, 270.0, 0.001));

    let gv = ground_vector( 10.0, 20.0, 10.0, 20.0);
    assert_eq!( gv.distance, 0.0);
    assert_eq!( gv.bearing, 0.0);

    // longitude distance shrinks with latitude
    let gv = ground_vector( 60.0, 20.0, 60.0, 20.01);
    println!("0.01° east at 60°N: {gv:?}");
    assert!( approx( gv.distance, 0.3, 0.01));

    // across the date line
    let gv = ground_vector( 0.0, 179.995, 0.0, -179.995);
    println!("across date line: {gv:?}");
    assert!( approx( gv.distance, 0.6, 0.05));
    assert!( approx( gv.bearing, 90.0, 0.001));
}

#[test]
fn test_screen_point () {
    let geo = DisplayGeometry::default();

    let p = screen_point( &geo, 10.0, 0.0, 5.0);
    println!("ahead 5nm: {p:?}");
    assert_eq!( p, ScreenPoint{ x: 64, y: 32 });

    let p = screen_point( &geo, 10.0, 90.0, 5.0);
    println!("right 5nm: {p:?}");
    assert_eq!( p, ScreenPoint{ x: 96, y: 64 });

    let p = screen_point( &geo, 10.0, 180.0, 10.0);
    assert_eq!( p, ScreenPoint{ x: 64, y: 128 });

    let p = screen_point( &geo, 10.0, relative_bearing( 90.0, 90.0), 5.0); // course up
    assert_eq!( p, ScreenPoint{ x: 64, y: 32 });
}

#[test]
fn test_scaled_lengths () {
    let geo = DisplayGeometry::default();
    assert_eq!( circle_radius( &geo, 5.0, 2.5), 32);
    assert_eq!( speed_vector_length( &geo, 10.0, 120.0, Duration::from_secs(60)), 13); // 2nm in 60s
    assert_eq!( speed_vector_length( &geo, 10.0, 0.0, Duration::from_secs(60)), 0);
}

#[test]
fn test_clock_position () {
    assert_eq!( clock_position(0.0), 12);
    assert_eq!( clock_position(15.0), 1);
    assert_eq!( clock_position(90.0), 3);
    assert_eq!( clock_position(100.0), 3);
    assert_eq!( clock_position(180.0), 6);
    assert_eq!( clock_position(270.0), 9);
    assert_eq!( clock_position(345.0), 12);
    assert_eq!( clock_position(-90.0), 9);
}

#[test]
fn test_arc_angles () {
    let mut a = 0;
    let mut angles = Vec::new();
    for _ in 0..4 {
        a = next_arc_angle( a, None);
        angles.push(a);
    }
    println!("arc angles: {angles:?}");
    assert_eq!( angles, vec![210, 60, 270, 120]);

    assert_eq!( next_arc_angle( 0, Some((200,220))), 60);
    assert_eq!( next_arc_angle( 210, Some((200,220))), 60);
}
