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

//! the projection engine: turning own position/course and target positions into display coordinates.
//! All functions are pure so that they can be used (and tested) without any engine state

use std::time::Duration;
use serde::{Serialize,Deserialize};
use uom::si::{f64::{Length,Velocity,Time}, length::{meter,nautical_mile}, velocity::knot, time::second};

use crate::config::DisplayGeometry;

/// mean earth radius as used by the equirectangular approximation
pub const EARTH_RADIUS_M: f64 = 6371008.8;

/// angular step between consecutively assigned arc positions of estimated targets
pub const ARC_STEP: u16 = 210;

/// normalize into (-180,180]. The input is supposed to be a difference of two normalized angles
#[inline]
pub fn normalize_180 (d: f64)->f64 {
    let x = d % 360.0;
    if x <= -180.0 { x + 360.0 }
    else if x > 180.0 { x - 360.0 }
    else { x }
}

/// normalize into [0,360)
#[inline]
pub fn normalize_360 (d: f64)->f64 {
    let x = d % 360.0;
    if x < 0.0 { x + 360.0 } else { x }
}

/// distance and true bearing of a target as seen from own position
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq)]
pub struct GroundVector {
    pub distance: f64, // nautical miles
    pub bearing: f64,  // degrees [0,360), 0 = north
}

#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq,Eq)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

/// equirectangular approximation of distance and bearing between two points given in degrees.
/// This is adequate for radar ranges below ~50nm and a lot cheaper than haversine/geodesic computation
pub fn ground_vector (own_lat: f64, own_lon: f64, lat: f64, lon: f64)->GroundVector {
    let r_nm = Length::new::<meter>(EARTH_RADIUS_M).get::<nautical_mile>();

    let avg_lat = normalize_180( (own_lat + lat) / 2.0).to_radians();
    let d_lat = normalize_180( lat - own_lat).to_radians() * r_nm;
    let d_lon = normalize_180( lon - own_lon).to_radians() * r_nm * avg_lat.cos().abs();

    let distance = (d_lat*d_lat + d_lon*d_lon).sqrt();
    let bearing = if distance > 0.0 { normalize_360( d_lon.atan2(d_lat).to_degrees()) } else { 0.0 };

    GroundVector { distance, bearing }
}

/// bearing relative to the display up direction (own course, or 0 in north-up mode)
#[inline]
pub fn relative_bearing (bearing: f64, course: f64)->f64 {
    normalize_360( bearing - course)
}

/// pixel position of a target with given relative bearing and distance for a radar range in nm.
/// Note that screen y grows downwards, i.e. targets ahead have a y smaller than the center
pub fn screen_point (geo: &DisplayGeometry, range: f64, rel_bearing: f64, distance: f64)->ScreenPoint {
    let a = rel_bearing.to_radians();
    let dx = a.sin() * distance;
    let dy = -a.cos() * distance;
    let scale = geo.radius() / range;

    ScreenPoint {
        x: (scale * dx + geo.zero_x as f64).round() as i32,
        y: (scale * dy + geo.zero_y as f64).round() as i32,
    }
}

/// radius in pixels for a distance in nm (used for estimated targets)
#[inline]
pub fn circle_radius (geo: &DisplayGeometry, range: f64, distance: f64)->i32 {
    (geo.radius() * distance / range).round() as i32
}

/// pixel length of a speed vector showing where the target will be after `look_ahead`
pub fn speed_vector_length (geo: &DisplayGeometry, range: f64, speed_kt: f64, look_ahead: Duration)->i32 {
    let speed = Velocity::new::<knot>(speed_kt);
    let t = Time::new::<second>(look_ahead.as_secs_f64());
    let dist: Length = speed * t;
    (geo.radius() * dist.get::<nautical_mile>() / range).round() as i32
}

/// the clock position (1..=12) of a relative bearing, 12 being straight ahead
pub fn clock_position (rel_bearing: f64)->u8 {
    let oclock = (normalize_360(rel_bearing) / 30.0).round() as i32;
    if oclock <= 0 { 12 } else if oclock > 12 { (oclock - 12) as u8 } else { oclock as u8 }
}

/// next arc position for a newly estimated target. We step by a fixed increment so that consecutive
/// targets end up on different sides of the display, skipping the (optional) excluded range
pub fn next_arc_angle (last: u16, exclude: Option<(u16,u16)>)->u16 {
    let next = (last + ARC_STEP) % 360;
    match exclude {
        Some((from,to)) if next >= from && next <= to => (next + ARC_STEP) % 360,
        _ => next
    }
}
