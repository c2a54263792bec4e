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
use chrono::{DateTime, TimeZone, Utc};
use odin_radar::situation::*;

/// run with "cargo test --test test_situation -- --nocapture"

const SITUATION_JSON: &str = r#"{
    "GPSLastFixSinceMidnightUTC": 57538.1,
    "GPSLatitude": 10.0,
    "GPSLongitude": 20.0,
    "GPSFixQuality": 1,
    "GPSHeightAboveEllipsoid": 1200.5,
    "GPSGeoidSep": 40.2,
    "GPSSatellites": 9,
    "GPSHorizontalAccuracy": 5.0,
    "GPSTrueCourse": 87.6,
    "GPSGroundSpeed": 95.0,
    "GPSAltitudeMSL": 1150.0,
    "GPSTime": "2021-04-18T15:58:58.1Z",
    "GPSLastFixLocalTime": "0001-01-01T00:12:31.47Z",
    "GPSLastGPSTimeStratuxTime": "0001-01-01T00:12:31.02Z",
    "BaroPressureAltitude": 1000.0,
    "BaroVerticalSpeed": 500.0,
    "BaroSourceType": 1,
    "AHRSPitch": 2.6,
    "AHRSRoll": -10.4,
    "AHRSGyroHeading": 88.2,
    "AHRSSlipSkid": 0.4,
    "AHRSStatus": 7,
    "AHRSGLoad": 1.234,
    "AHRSGLoadMax": 1.5,
    "AHRSGLoadMin": 0.8
}"#;

fn sample_msg ()->SituationMsg {
    SituationMsg::from_json( SITUATION_JSON).unwrap()
}

#[test]
fn test_decode () {
    let msg = sample_msg();
    println!("{msg:?}");
    assert_eq!( msg.latitude, Some(10.0));
    assert_eq!( msg.baro_source, Some(1));
    assert_eq!( msg.ahrs_status, Some(7));

    let msg = SituationMsg::from_json( r#"{"GPSLatitude": 47.5}"#).unwrap();
    assert_eq!( msg.latitude, Some(47.5));
    assert!( msg.longitude.is_none());

    assert!( SituationMsg::from_json( r#"{"GPSLatitude": "north"}"#).is_err());
    assert!( SituationMsg::from_json( "not json").is_err());
}

#[test]
fn test_idempotent_apply () {
    let msg = sample_msg();
    let mut sit = Situation::default();

    assert!( sit.apply( &msg, false));
    println!("{sit:?}");
    assert!( sit.gps_active);
    assert_eq!( sit.course, 88.0);
    assert_eq!( sit.own_altitude, 1000.0);
    assert_eq!( sit.gps_quality, GpsQuality::Fix3d);

    sit.changed = false;
    assert!( !sit.apply( &msg, false));
    assert!( !sit.changed);
}

#[test]
fn test_course () {
    let mut sit = Situation::default();
    let mut msg = SituationMsg { true_course: Some(359.6), ..Default::default() };
    sit.apply( &msg, false);
    assert_eq!( sit.course, 0.0);

    msg.true_course = Some(-10.2);
    sit.apply( &msg, false);
    assert_eq!( sit.course, 350.0);

    // north up never updates the course
    let mut sit = Situation::default();
    sit.apply( &sample_msg(), true);
    assert_eq!( sit.course, 0.0);
}

#[test]
fn test_gps_quality () {
    let mut sit = Situation::default();
    sit.apply( &SituationMsg { fix_quality: Some(2), horizontal_accuracy: Some(3.0), ..Default::default() }, false);
    assert_eq!( sit.gps_quality, GpsQuality::Dgnss);
    assert!( sit.gps_active);

    sit.changed = false;
    assert!( !sit.apply( &SituationMsg { fix_quality: Some(7), ..Default::default() }, false)); // unknown value skipped
    assert_eq!( sit.gps_quality, GpsQuality::Dgnss);

    sit.apply( &SituationMsg { horizontal_accuracy: Some(20000.0), ..Default::default() }, false);
    assert!( !sit.gps_active);
}

#[test]
fn test_vertical_speed () {
    let mut sit = Situation::default();
    let baro = |vs: f64, src: u8| SituationMsg { vertical_speed: Some(vs), baro_source: Some(src), ..Default::default() };

    sit.apply( &baro( 500.0, 1), false);
    println!("first baro: vs={} max={} min={}", sit.vertical_speed, sit.vertical_max, sit.vertical_min);
    assert!( sit.baro_valid);
    assert_eq!( sit.vertical_speed, 500.0);
    assert_eq!( sit.vertical_max, 0.0); // first valid baro resets trackers

    sit.apply( &baro( 700.0, 1), false);
    sit.apply( &baro( -300.0, 2), false);
    assert_eq!( sit.vertical_max, 700.0);
    assert_eq!( sit.vertical_min, -300.0);

    sit.apply( &baro( 800.0, 4), false); // ADS-B estimation is not good enough
    println!("no baro: vs={} max={} min={}", sit.vertical_speed, sit.vertical_max, sit.vertical_min);
    assert!( !sit.baro_valid);
    assert_eq!( sit.vertical_speed, 0.0);
    assert_eq!( sit.vertical_max, 0.0);
    assert_eq!( sit.vertical_min, 0.0);

    sit.changed = false;
    assert!( !sit.apply( &baro( 800.0, 0), false));
}

#[test]
fn test_attitude_and_gmeter () {
    let msg = sample_msg();
    let mut ahrs = Attitude::default();
    let mut gmeter = GMeter::default();

    assert!( !ahrs.apply( &msg));
    assert_eq!( (ahrs.pitch, ahrs.roll, ahrs.heading, ahrs.slip_skid), (3, -10, 88, 0));
    assert!( ahrs.sensor_present);

    gmeter.apply( &msg, ahrs.sensor_present);
    println!("{gmeter:?}");
    assert_eq!( gmeter.current, 1.23);
    assert_eq!( gmeter.max, 1.5);
    assert_eq!( gmeter.min, 0.8);

    let lost = SituationMsg { ahrs_status: Some(1), ..Default::default() };
    assert!( ahrs.apply( &lost)); // sensor lost
    gmeter.reset_extremes();
    assert_eq!( (gmeter.max, gmeter.min), (0.0, 0.0));

    gmeter.apply( &msg, ahrs.sensor_present); // no extremes without sensor
    assert_eq!( (gmeter.max, gmeter.min), (0.0, 0.0));
}

#[test]
fn test_connection_transition () {
    let mut sit = Situation::default();
    let now = std::time::Instant::now();
    sit.changed = false;

    assert!( sit.set_connected( now));
    assert!( sit.changed);
    assert!( !sit.set_connected( now));

    assert!( sit.set_disconnected());
    assert!( !sit.set_disconnected());
    assert!( !sit.connected);
}

#[test]
fn test_clock_correction () {
    let msg = sample_msg();
    let gps_time = Utc.with_ymd_and_hms( 2021, 4, 18, 15, 58, 58).unwrap() + chrono::TimeDelta::milliseconds(100);
    let max_offset = Duration::from_secs(10);

    let utc_now = Utc.with_ymd_and_hms( 2021, 4, 18, 16, 0, 0).unwrap();
    let correction = clock_correction( &msg, true, utc_now, max_offset);
    println!("correction: {correction:?}");
    assert_eq!( correction, Some(gps_time));

    let utc_now = Utc.with_ymd_and_hms( 2021, 4, 18, 15, 59, 0).unwrap();
    assert!( clock_correction( &msg, true, utc_now, max_offset).is_none()); // within offset

    let utc_now = Utc.with_ymd_and_hms( 2022, 1, 1, 0, 0, 0).unwrap();
    assert!( clock_correction( &msg, false, utc_now, max_offset).is_none()); // no GPS fix

    let mut stale = msg.clone();
    stale.last_gps_time_stratux_time = Some("0001-01-01T00:12:29.91Z".to_string());
    assert!( clock_correction( &stale, true, utc_now, max_offset).is_none());

    let mut no_time = msg.clone();
    no_time.gps_time = Some("0001-01-01T00:00:00Z".to_string());
    assert!( clock_correction( &no_time, true, utc_now, max_offset).is_none());

    assert!( parse_gps_time("2021-04-18T15:58:58.1Z").is_ok());
    assert!( parse_gps_time("yesterday").is_err());
}
