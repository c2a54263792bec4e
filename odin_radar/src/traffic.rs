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

//! the traffic registry: tracked aircraft keyed by their 24bit ICAO address. Entries are created/updated from
//! traffic messages and removed by external sweeps once their last contact is older than a configured cutoff

use std::{fmt, time::{Duration, Instant}, sync::atomic::{AtomicBool, AtomicU16, Ordering}};
use dashmap::{DashMap, mapref::entry::Entry};
use serde::{Serialize,Deserialize};
use tracing::{debug, trace};

use crate::config::DisplayGeometry;
use crate::projection::{ScreenPoint, ground_vector, relative_bearing, screen_point, circle_radius, speed_vector_length,
    clock_position, next_arc_angle, normalize_360};
use crate::situation::Situation;

/// alerts are triggered when a target comes closer than this fraction of the radar range..
pub const ALERT_RANGE_FACTOR: f64 = 0.5;
/// ..and re-armed once it was at least this fraction of the range away
pub const REARM_RANGE_FACTOR: f64 = 0.75;

const METERS_PER_NM: f64 = 1852.0;

/* #region traffic messages *****************************************************************************************/

/// a traffic record as sent by the receiver. This is either an aircraft report (with `Icao_addr`) or a
/// display scale message that only contains `RadarRange` and `RadarLimits`
#[derive(Deserialize,Serialize,Debug,Clone,Default,PartialEq)]
pub struct TrafficMsg {
    #[serde(rename="Icao_addr")]         pub icao: Option<u32>,
    #[serde(rename="Age")]               pub age: Option<f64>, // sec since last position
    #[serde(rename="AgeLastAlt")]        pub age_last_alt: Option<f64>, // sec since last altitude
    #[serde(rename="Alt")]               pub altitude: Option<f64>, // ft
    #[serde(rename="Lat")]               pub latitude: Option<f64>,
    #[serde(rename="Lng")]               pub longitude: Option<f64>,
    #[serde(rename="Position_valid")]    pub position_valid: Option<bool>,
    #[serde(rename="Speed")]             pub speed: Option<f64>, // kt
    #[serde(rename="Speed_valid")]       pub speed_valid: Option<bool>,
    #[serde(rename="Track")]             pub track: Option<f64>,
    #[serde(rename="Vvel")]              pub vertical_velocity: Option<f64>, // ft/min
    #[serde(rename="Tail")]              pub tail: Option<String>,
    #[serde(rename="DistanceEstimated")] pub distance_estimated: Option<f64>, // m
    #[serde(rename="RadarRange")]        pub radar_range: Option<f64>, // nm
    #[serde(rename="RadarLimits")]       pub radar_limits: Option<f64>, // ft
}

impl TrafficMsg {
    pub fn from_json (json: &str)->crate::Result<Self> {
        Ok( serde_json::from_str(json)? )
    }

    pub fn is_scale_msg (&self)->bool {
        self.radar_range.is_some() || self.radar_limits.is_some()
    }
}

/* #endregion traffic messages */

/* #region tracked aircraft *****************************************************************************************/

#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq,Eq)]
pub enum VerticalSpeedSign { Up, Down, Level }

impl VerticalSpeedSign {
    pub fn from_vvel (vvel: f64)->Self {
        if vvel > 0.0 { VerticalSpeedSign::Up } else if vvel < 0.0 { VerticalSpeedSign::Down } else { VerticalSpeedSign::Level }
    }
}

/// the two mutually exclusive ways we can show a target
#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
pub enum TrackPosition {
    /// GPS derived position. `screen` is `None` if the target is outside of range or altitude limits
    Precise {
        screen: Option<ScreenPoint>,
        bearing: f64, // relative to display up direction
        direction: Option<f64>, // target track relative to display up direction
        speed_vector: Option<i32>, // pixels
    },
    /// range-only target (e.g. mode-S), shown as a circle with a marker at a stable angle
    Estimated {
        circle_radius: i32, // pixels
        arc_angle: u16,
    }
}

impl TrackPosition {
    pub fn is_precise (&self)->bool { matches!(self, TrackPosition::Precise{..}) }
    pub fn is_estimated (&self)->bool { matches!(self, TrackPosition::Estimated{..}) }

    fn direction (&self)->Option<f64> {
        match self {
            TrackPosition::Precise{direction,..} => *direction,
            _ => None
        }
    }
}

#[derive(Serialize,Debug,Clone,PartialEq)]
pub struct Aircraft {
    pub icao: u32,
    #[serde(skip)]
    pub last_contact: Instant,
    pub relative_altitude: i32, // ft/100
    pub vertical_speed: VerticalSpeedSign,
    pub ground_distance: f64, // nm
    pub ground_speed: Option<f64>, // kt, last valid report
    pub tail: Option<String>,
    pub was_spoken: bool,
    pub position: TrackPosition,
}

impl Aircraft {
    // position is always set before the entry becomes visible to readers
    fn new (icao: u32, now: Instant)->Self {
        Aircraft {
            icao,
            last_contact: now,
            relative_altitude: 0,
            vertical_speed: VerticalSpeedSign::Level,
            ground_distance: 0.0,
            ground_speed: None,
            tail: None,
            was_spoken: false,
            position: TrackPosition::Estimated { circle_radius: 0, arc_angle: 0 },
        }
    }

    pub fn age (&self, now: Instant)->Duration {
        now.saturating_duration_since( self.last_contact)
    }

    /// evaluate alert hysteresis for a new distance. An alert is produced once per approach, the next one
    /// requires the target to get at least `REARM_RANGE_FACTOR * range` away first
    fn check_alert (&mut self, range: f64, clock_position: Option<u8>, eligible: bool)->Option<TrafficAlert> {
        if self.ground_distance <= range * ALERT_RANGE_FACTOR {
            if eligible && !self.was_spoken {
                self.was_spoken = true;
                return Some( TrafficAlert {
                    altitude_delta: self.relative_altitude,
                    clock_position,
                    distance: Some( self.ground_distance.round() as u32),
                })
            }
        } else if self.ground_distance >= range * REARM_RANGE_FACTOR {
            self.was_spoken = false;
        }
        None
    }
}

impl fmt::Display for Aircraft {
    fn fmt (&self, f: &mut fmt::Formatter<'_>)->fmt::Result {
        write!( f, "Aircraft( icao: {:06x}, alt: {:+}, dist: {:.2}", self.icao, self.relative_altitude, self.ground_distance)?;
        if let Some(tail) = &self.tail { write!( f, ", tail: \"{tail}\"")?; }
        match &self.position {
            TrackPosition::Precise { screen: Some(p), bearing, .. } => write!( f, ", brg: {:.0}, xy: ({},{})", bearing, p.x, p.y)?,
            TrackPosition::Precise { bearing, .. } => write!( f, ", brg: {:.0}, not in view", bearing)?,
            TrackPosition::Estimated { circle_radius, arc_angle } => write!( f, ", r: {circle_radius}, arc: {arc_angle}")?,
        }
        write!( f, ")")
    }
}

/// traffic alert for the speech collaborator. `altitude_delta` is in ft/100 (as `Aircraft::relative_altitude`),
/// `distance` in nm
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq,Eq)]
pub struct TrafficAlert {
    pub altitude_delta: i32,
    pub clock_position: Option<u8>,
    pub distance: Option<u32>,
}

impl fmt::Display for TrafficAlert {
    fn fmt (&self, f: &mut fmt::Formatter<'_>)->fmt::Result {
        write!( f, "Traffic")?;
        if let Some(oclock) = self.clock_position { write!( f, " {oclock} o'clock")?; }
        let sign = if self.altitude_delta < 0 { "minus" } else { "plus" };
        write!( f, " {sign} {} feet", self.altitude_delta.abs() * 100)?;
        if let Some(dist) = self.distance { write!( f, " {dist} miles")?; }
        Ok(())
    }
}

/* #endregion tracked aircraft */

/* #region registry *************************************************************************************************/

/// the non-situation parameters we need to project traffic
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct TrafficParams {
    pub geometry: DisplayGeometry,
    pub speed_arrow: Duration,
}

/// what happened to a traffic message
#[derive(Debug,Clone,PartialEq)]
pub enum TrafficUpdate {
    ScaleChanged, // registry was cleared
    ScaleUnchanged,
    Ignored, // no information we could use
    Tracked { icao: u32, alert: Option<TrafficAlert> },
}

/// the shared traffic store. Readers (renderer, sweeps) and the traffic channel (writer) access this
/// concurrently, hence we use a concurrent map plus atomics for the arc cursor and change flag
pub struct TrafficRegistry {
    aircraft: DashMap<u32,Aircraft>,
    last_arc_angle: AtomicU16,
    changed: AtomicBool,
}

impl Default for TrafficRegistry {
    fn default()->Self { Self::new() }
}

impl TrafficRegistry {
    pub fn new ()->Self {
        TrafficRegistry {
            aircraft: DashMap::new(),
            last_arc_angle: AtomicU16::new(0),
            changed: AtomicBool::new(true),
        }
    }

    pub fn len (&self)->usize { self.aircraft.len() }
    pub fn is_empty (&self)->bool { self.aircraft.is_empty() }
    pub fn get (&self, icao: u32)->Option<Aircraft> { self.aircraft.get(&icao).map(|e| e.value().clone()) }

    pub fn clear (&self) {
        self.aircraft.clear();
        self.changed.store( true, Ordering::Relaxed);
    }

    pub fn is_changed (&self)->bool { self.changed.load(Ordering::Relaxed) }

    /// returns the change flag and clears it
    pub fn take_changed (&self)->bool { self.changed.swap( false, Ordering::Relaxed) }

    /// snapshot of all entries, farthest first (draw order)
    pub fn far_first (&self)->Vec<Aircraft> {
        let mut list: Vec<Aircraft> = self.aircraft.iter().map(|e| e.value().clone()).collect();
        list.sort_by( |a,b| b.ground_distance.total_cmp( &a.ground_distance));
        list
    }

    /// drop all entries that had no contact within `cutoff`. Returns the number of removed entries
    pub fn remove_stale (&self, now: Instant, cutoff: Duration)->usize {
        let n_before = self.aircraft.len();
        self.aircraft.retain( |_,ac| ac.age(now) <= cutoff);
        let n_dropped = n_before.saturating_sub( self.aircraft.len());
        if n_dropped > 0 {
            debug!("dropped {n_dropped} stale aircraft");
            self.changed.store( true, Ordering::Relaxed);
        }
        n_dropped
    }

    fn next_arc_angle (&self, exclude: Option<(u16,u16)>)->u16 {
        let last = match self.last_arc_angle.fetch_update( Ordering::Relaxed, Ordering::Relaxed, |last| Some( next_arc_angle(last, exclude))) {
            Ok(last) | Err(last) => last
        };
        next_arc_angle( last, exclude)
    }

    /// process a traffic message. Scale messages update the radar range/limits of the situation and clear
    /// the registry if any of them changed. Aircraft reports are projected with respect to the current situation
    pub fn apply (&self, msg: &TrafficMsg, sit: &mut Situation, params: &TrafficParams, now: Instant)->TrafficUpdate {
        if msg.is_scale_msg() {
            return if sit.set_radar_scale( msg.radar_range, msg.radar_limits) {
                debug!("new radar scale {} nm / {} ft, clearing traffic", sit.radar_range, sit.radar_limits);
                self.clear();
                TrafficUpdate::ScaleChanged
            } else {
                TrafficUpdate::ScaleUnchanged
            }
        }

        let Some(icao) = msg.icao else {
            trace!("ignoring traffic message without aircraft");
            return TrafficUpdate::Ignored
        };

        let precise = match (msg.position_valid, msg.latitude, msg.longitude) {
            (Some(true), Some(lat), Some(lon)) if sit.gps_active => Some((lat,lon)),
            _ => None
        };
        let estimated_distance = msg.distance_estimated.unwrap_or(0.0);
        let altitude = msg.altitude.unwrap_or(0.0);
        if precise.is_none() && (estimated_distance <= 0.0 || altitude == 0.0) {
            trace!("ignoring traffic {icao:06x} without position or distance estimate");
            return TrafficUpdate::Ignored
        }

        let (mut ac, is_new) = match self.aircraft.entry(icao) {
            Entry::Occupied(e) => (e.into_ref(), false),
            Entry::Vacant(e) => (e.insert( Aircraft::new( icao, now)), true),
        };

        let age = msg.age.unwrap_or(0.0).min( msg.age_last_alt.unwrap_or(f64::MAX)).max(0.0);
        ac.last_contact = Duration::try_from_secs_f64(age).ok().and_then( |d| now.checked_sub(d)).unwrap_or(now);

        if let Some(alt) = msg.altitude {
            ac.relative_altitude = ((alt - sit.own_altitude) / 100.0).round() as i32;
        }
        if msg.speed_valid == Some(true) {
            if let Some(spd) = msg.speed { ac.ground_speed = Some(spd) }
        }
        if let Some(vvel) = msg.vertical_velocity { ac.vertical_speed = VerticalSpeedSign::from_vvel(vvel) }
        if let Some(tail) = &msg.tail {
            if !tail.is_empty() { ac.tail = Some(tail.clone()) }
        }

        let geo = &params.geometry;
        let range = sit.radar_range;

        let alert = if let Some((lat,lon)) = precise {
            let gv = ground_vector( sit.latitude, sit.longitude, lat, lon);
            let bearing = relative_bearing( gv.bearing, sit.course);
            let direction = msg.track.map( |trk| normalize_360( trk - sit.course)).or( ac.position.direction());
            let in_view = gv.distance <= range && ac.relative_altitude.abs() <= (sit.radar_limits / 100.0).round() as i32;

            let (screen, speed_vector) = if in_view {
                ( Some( screen_point( geo, range, bearing, gv.distance)),
                  ac.ground_speed.map( |spd| speed_vector_length( geo, range, spd, params.speed_arrow)) )
            } else {
                (None, None)
            };

            ac.ground_distance = gv.distance;
            ac.position = TrackPosition::Precise { screen, bearing, direction, speed_vector };
            ac.check_alert( range, Some( clock_position(bearing)), in_view)

        } else {
            let distance = estimated_distance / METERS_PER_NM;
            let arc_angle = match ac.position {
                TrackPosition::Estimated { arc_angle, .. } if !is_new => arc_angle,
                _ => self.next_arc_angle( geo.arc_exclude)
            };

            ac.ground_distance = distance;
            ac.position = TrackPosition::Estimated { circle_radius: circle_radius( geo, range, distance), arc_angle };
            ac.check_alert( range, None, true)
        };

        trace!("{}", *ac);
        drop(ac);
        self.changed.store( true, Ordering::Relaxed);

        TrafficUpdate::Tracked { icao, alert }
    }
}

/* #endregion registry */
