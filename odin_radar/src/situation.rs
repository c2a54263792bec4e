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

use std::time::{Duration, Instant};
use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use serde::{Serialize,Deserialize};
use tracing::debug;

use crate::projection::normalize_360;

/// horizontal accuracy (m) at or above which the receiver reports "no fix"
pub const NO_FIX_ACCURACY: f64 = 19999.0;

/// AHRSStatus bit indicating an attached attitude sensor
pub const AHRS_SENSOR_BIT: u32 = 0x02;

/* #region situation messages ***************************************************************************************/

/// the ownship record we get from the situation feed. The receiver sends all fields but we treat each of them
/// as optional so that partial records only update what they contain. Unknown fields are ignored
#[derive(Deserialize,Serialize,Debug,Clone,Default,PartialEq)]
pub struct SituationMsg {
    #[serde(rename="GPSLastFixLocalTime")]       pub last_fix_local_time: Option<String>,
    #[serde(rename="GPSLastGPSTimeStratuxTime")] pub last_gps_time_stratux_time: Option<String>,
    #[serde(rename="GPSTime")]                   pub gps_time: Option<String>,
    #[serde(rename="GPSLatitude")]               pub latitude: Option<f64>,
    #[serde(rename="GPSLongitude")]              pub longitude: Option<f64>,
    #[serde(rename="GPSFixQuality")]             pub fix_quality: Option<u8>,
    #[serde(rename="GPSHorizontalAccuracy")]     pub horizontal_accuracy: Option<f64>,
    #[serde(rename="GPSTrueCourse")]             pub true_course: Option<f64>,
    #[serde(rename="GPSGroundSpeed")]            pub ground_speed: Option<f64>,
    #[serde(rename="GPSAltitudeMSL")]            pub altitude_msl: Option<f64>,
    #[serde(rename="BaroPressureAltitude")]      pub pressure_altitude: Option<f64>,
    #[serde(rename="BaroVerticalSpeed")]         pub vertical_speed: Option<f64>,
    #[serde(rename="BaroSourceType")]            pub baro_source: Option<u8>,
    #[serde(rename="AHRSPitch")]                 pub pitch: Option<f64>,
    #[serde(rename="AHRSRoll")]                  pub roll: Option<f64>,
    #[serde(rename="AHRSGyroHeading")]           pub gyro_heading: Option<f64>,
    #[serde(rename="AHRSSlipSkid")]              pub slip_skid: Option<f64>,
    #[serde(rename="AHRSStatus")]                pub ahrs_status: Option<u32>,
    #[serde(rename="AHRSGLoad")]                 pub g_load: Option<f64>,
    #[serde(rename="AHRSGLoadMax")]              pub g_load_max: Option<f64>,
    #[serde(rename="AHRSGLoadMin")]              pub g_load_min: Option<f64>,
}

impl SituationMsg {
    pub fn from_json (json: &str)->crate::Result<Self> {
        Ok( serde_json::from_str(json)? )
    }
}

/// the GPSFixQuality values reported by the receiver
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq,Eq,Default)]
pub enum GpsQuality {
    #[default] None,
    Fix3d,
    Dgnss,
}

impl GpsQuality {
    pub fn from_code (code: u8)->Option<GpsQuality> {
        match code {
            0 => Some(GpsQuality::None),
            1 => Some(GpsQuality::Fix3d),
            2 => Some(GpsQuality::Dgnss),
            _ => None
        }
    }
}

/// barometric sources that provide a usable vertical speed: 1 = BMP280, 2 = OGN device, 3 = NMEA device.
/// 0 means no baro, 4 is an ADS-B based estimation which is not good enough for vertical speed
#[inline]
pub fn is_baro_source (kind: u8)->bool {
    matches!( kind, 1 | 2 | 3)
}

/* #endregion situation messages */

#[inline]
fn set_if_changed<T: PartialEq> (field: &mut T, v: T, changed: &mut bool) {
    if *field != v {
        *field = v;
        *changed = true;
    }
}

#[inline]
fn round2 (v: f64)->f64 { (v * 100.0).round() / 100.0 }

/* #region Situation ************************************************************************************************/

/// ownship state. Note that `radar_range` and `radar_limits` are display scale parameters controlled by
/// the receiver, which reports them through the traffic feed
#[derive(Debug,Clone)]
pub struct Situation {
    pub connected: bool,
    pub gps_active: bool,
    pub course: f64, // degrees [0,360)
    pub own_altitude: f64, // ft (baro)
    pub latitude: f64,
    pub longitude: f64,
    pub gps_quality: GpsQuality,
    pub gps_h_accuracy: f64, // m
    pub gps_speed: f64, // kt
    pub gps_altitude: f64, // ft MSL
    pub vertical_speed: f64, // ft/min
    pub vertical_max: f64,
    pub vertical_min: f64,
    pub baro_valid: bool,
    pub radar_range: f64, // nm
    pub radar_limits: f64, // ft

    pub last_update: Option<Instant>, // last situation message, used by the watchdog
    pub changed: bool,
}

impl Default for Situation {
    fn default()->Self {
        Situation {
            connected: false,
            gps_active: false,
            course: 0.0,
            own_altitude: -99.0,
            latitude: 0.0,
            longitude: 0.0,
            gps_quality: GpsQuality::None,
            gps_h_accuracy: 20000.0,
            gps_speed: -100.0,
            gps_altitude: -99.0,
            vertical_speed: 0.0,
            vertical_max: 0.0,
            vertical_min: 0.0,
            baro_valid: false,
            radar_range: 5.0,
            radar_limits: 10000.0,
            last_update: None,
            changed: true,
        }
    }
}

impl Situation {

    /// update from a situation message, returning true if any field changed. Idempotent, i.e. applying the
    /// same message twice does not report a change the second time
    pub fn apply (&mut self, msg: &SituationMsg, north_up: bool)->bool {
        let mut changed = false;

        if let Some(acc) = msg.horizontal_accuracy {
            set_if_changed( &mut self.gps_active, acc < NO_FIX_ACCURACY, &mut changed);
            set_if_changed( &mut self.gps_h_accuracy, acc, &mut changed);
        }
        if !north_up {
            if let Some(course) = msg.true_course {
                set_if_changed( &mut self.course, normalize_360( course.round()), &mut changed);
            }
        }
        if let Some(alt) = msg.pressure_altitude { set_if_changed( &mut self.own_altitude, alt, &mut changed) }
        if let Some(lat) = msg.latitude { set_if_changed( &mut self.latitude, lat, &mut changed) }
        if let Some(lon) = msg.longitude { set_if_changed( &mut self.longitude, lon, &mut changed) }
        if let Some(code) = msg.fix_quality {
            match GpsQuality::from_code(code) {
                Some(q) => set_if_changed( &mut self.gps_quality, q, &mut changed),
                None => debug!("ignoring unknown GPS fix quality {code}")
            }
        }
        if let Some(spd) = msg.ground_speed { set_if_changed( &mut self.gps_speed, spd, &mut changed) }
        if let Some(alt) = msg.altitude_msl { set_if_changed( &mut self.gps_altitude, alt, &mut changed) }

        if msg.baro_source.map(is_baro_source).unwrap_or(false) {
            if let Some(vs) = msg.vertical_speed {
                if self.vertical_speed != vs {
                    self.vertical_speed = vs;
                    changed = true;
                    if vs > self.vertical_max { self.vertical_max = vs }
                    if vs < self.vertical_min { self.vertical_min = vs }
                }
            }
            if !self.baro_valid { // first valid baro invalidates min/max
                self.baro_valid = true;
                self.reset_vertical_extremes();
                changed = true;
            }
        } else {
            if self.baro_valid {
                self.baro_valid = false;
                self.reset_vertical_extremes();
                changed = true;
            }
            set_if_changed( &mut self.vertical_speed, 0.0, &mut changed);
        }

        if changed { self.changed = true }
        changed
    }

    pub fn reset_vertical_extremes (&mut self) {
        self.vertical_max = 0.0;
        self.vertical_min = 0.0;
    }

    /// returns true if this was a transition, in which case all dependent aggregates have to be redrawn
    pub fn set_connected (&mut self, now: Instant)->bool {
        self.last_update = Some(now);
        if !self.connected {
            self.connected = true;
            self.changed = true;
            true
        } else {
            false
        }
    }

    /// returns true if this was a transition
    pub fn set_disconnected (&mut self)->bool {
        if self.connected {
            self.connected = false;
            self.changed = true;
            true
        } else {
            false
        }
    }

    /// update display scale. Returns true if any of the two values changed
    pub fn set_radar_scale (&mut self, range: Option<f64>, limits: Option<f64>)->bool {
        let mut changed = false;
        if let Some(range) = range {
            if range > 0.0 {
                set_if_changed( &mut self.radar_range, range, &mut changed);
            } else {
                debug!("ignoring non-positive radar range {range}");
            }
        }
        if let Some(limits) = limits { set_if_changed( &mut self.radar_limits, limits, &mut changed) }
        if changed { self.changed = true }
        changed
    }
}

/* #endregion Situation */

/* #region Attitude *************************************************************************************************/

/// AHRS data. All angles are rounded to integer degrees
#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
pub struct Attitude {
    pub pitch: i32,
    pub roll: i32,
    pub heading: i32,
    pub slip_skid: i32,
    pub gps_h_accuracy: i32,
    pub sensor_present: bool,
    pub changed: bool,
}

impl Default for Attitude {
    fn default()->Self {
        Attitude { pitch: 0, roll: 0, heading: 0, slip_skid: 0, gps_h_accuracy: 20000, sensor_present: false, changed: true }
    }
}

impl Attitude {
    /// update from situation message and return true if the sensor was lost with this message
    pub fn apply (&mut self, msg: &SituationMsg)->bool {
        let mut changed = false;
        let was_present = self.sensor_present;

        if let Some(v) = msg.pitch { set_if_changed( &mut self.pitch, v.round() as i32, &mut changed) }
        if let Some(v) = msg.roll { set_if_changed( &mut self.roll, v.round() as i32, &mut changed) }
        if let Some(v) = msg.gyro_heading { set_if_changed( &mut self.heading, v.round() as i32, &mut changed) }
        if let Some(v) = msg.slip_skid { set_if_changed( &mut self.slip_skid, v.round() as i32, &mut changed) }
        if let Some(v) = msg.horizontal_accuracy { set_if_changed( &mut self.gps_h_accuracy, v.round() as i32, &mut changed) }
        if let Some(status) = msg.ahrs_status {
            set_if_changed( &mut self.sensor_present, status & AHRS_SENSOR_BIT != 0, &mut changed);
        }

        if changed { self.changed = true }
        was_present && !self.sensor_present
    }
}

/* #endregion Attitude */

/* #region GMeter ***************************************************************************************************/

#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
pub struct GMeter {
    pub current: f64,
    pub max: f64,
    pub min: f64,
    pub changed: bool,
}

impl Default for GMeter {
    fn default()->Self {
        GMeter { current: 0.0, max: 0.0, min: 0.0, changed: true }
    }
}

impl GMeter {
    /// extremes are maintained by the receiver, we only take them over while there is a sensor
    pub fn apply (&mut self, msg: &SituationMsg, sensor_present: bool)->bool {
        let mut changed = false;

        if let Some(g) = msg.g_load { set_if_changed( &mut self.current, round2(g), &mut changed) }
        if sensor_present {
            if let Some(g) = msg.g_load_max { set_if_changed( &mut self.max, round2(g), &mut changed) }
            if let Some(g) = msg.g_load_min { set_if_changed( &mut self.min, round2(g), &mut changed) }
        }

        if changed { self.changed = true }
        changed
    }

    pub fn reset_extremes (&mut self) {
        if self.max != 0.0 || self.min != 0.0 {
            self.max = 0.0;
            self.min = 0.0;
            self.changed = true;
        }
    }
}

/* #endregion GMeter */

/* #region clock synchronization ************************************************************************************/

/// parse a receiver GPS time such as "2021-04-18T15:58:58.1Z". The receiver reports "0001-01-01T00:00:00Z"
/// if it does not have a valid time, which we treat as a parse failure
pub fn parse_gps_time (s: &str)->crate::Result<DateTime<Utc>> {
    let dt = NaiveDateTime::parse_from_str( s, "%Y-%m-%dT%H:%M:%S%.fZ")?.and_utc();
    if dt.year() < 2000 {
        Err( crate::errors::OdinRadarError::TimeParseError( format!("no valid GPS time: {s}")))
    } else {
        Ok(dt)
    }
}

#[inline]
fn whole_seconds (s: &str)->&str {
    s.split('.').next().unwrap_or(s)
}

/// check if the system clock has to be set from the GPS time of a situation message. This is only the case
/// if we have a GPS fix, the last fix time and the last GPS time update agree at second resolution (otherwise
/// the receiver might send a stale GPS time) and the clocks differ by more than `max_offset`
pub fn clock_correction (msg: &SituationMsg, gps_active: bool, utc_now: DateTime<Utc>, max_offset: Duration)->Option<DateTime<Utc>> {
    if !gps_active { return None }

    let fix_time = msg.last_fix_local_time.as_deref()?;
    let update_time = msg.last_gps_time_stratux_time.as_deref()?;
    if whole_seconds(fix_time) != whole_seconds(update_time) { return None }

    let gps_time = msg.gps_time.as_deref()?;
    match parse_gps_time( gps_time) {
        Ok(dt) => {
            let offset = (utc_now - dt).abs();
            if offset.to_std().map(|d| d > max_offset).unwrap_or(false) { Some(dt) } else { None }
        }
        Err(e) => {
            debug!("ignoring GPS time: {e}");
            None
        }
    }
}

/* #endregion clock synchronization */
