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

//! takeoff, landing and stop detection based on GPS ground speed. A detected stop after a landing is
//! reported as `FlightTrigger::Stopped` (which shows the flight log), the next takeoff as `FlightTrigger::TookOff`

use std::collections::VecDeque;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Serialize,Deserialize};
use tracing::{debug, info};

pub const SPEED_THRESHOLD_TAKEOFF: f64 = 30.0; // kt
pub const SPEED_THRESHOLD_LANDING: f64 = 10.0; // kt
pub const SPEED_THRESHOLD_STOPPED: f64 = 5.0;  // kt

// how long (sec) thresholds have to be met before we trigger, to compensate GPS errors
pub const TRIGGER_PERIOD_TAKEOFF: i64 = 5;
pub const TRIGGER_PERIOD_LANDING: i64 = 5;
pub const TRIGGER_PERIOD_STOP: i64 = 10;

pub const MAX_FLIGHTS: usize = 10;

#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq,Eq)]
pub enum FlightTrigger {
    TookOff,
    Stopped,
}

#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
pub struct Flight {
    pub takeoff: DateTime<Utc>,
    pub landing: Option<DateTime<Utc>>, // None while airborne
}

impl Flight {
    pub fn duration (&self)->Option<TimeDelta> {
        self.landing.map( |t| t - self.takeoff)
    }
}

/// the flight detection state machine. Flights are stored most recent first
#[derive(Debug,Clone,Default)]
pub struct FlightTimer {
    enabled: bool,
    flying: bool,
    unreported_flight: bool, // landed but stop not yet detected
    trigger_time: Option<DateTime<Utc>>, // when takeoff/landing threshold was first crossed
    stop_time: Option<DateTime<Utc>>,
    flights: VecDeque<Flight>,
    pub changed: bool,
}

impl FlightTimer {
    pub fn new (enabled: bool)->Self {
        FlightTimer { enabled, changed: true, ..Default::default() }
    }

    pub fn is_enabled (&self)->bool { self.enabled }
    pub fn is_flying (&self)->bool { self.flying }
    pub fn flights (&self)->&VecDeque<Flight> { &self.flights }

    /// the takeoff time if we are airborne
    pub fn current_takeoff (&self)->Option<DateTime<Utc>> {
        self.flights.front().filter( |f| f.landing.is_none()).map( |f| f.takeoff)
    }

    /// feed a new ground speed sample
    pub fn update (&mut self, gps_valid: bool, speed_kt: f64, now: DateTime<Utc>)->Option<FlightTrigger> {
        if !gps_valid || !self.enabled { return None }

        if self.flying {
            self.changed = true;
            self.check_landing( speed_kt, now);
            None
        } else {
            let took_off = self.check_takeoff( speed_kt, now);
            if took_off {
                Some(FlightTrigger::TookOff)
            } else if self.unreported_flight && self.check_stop( speed_kt, now) {
                Some(FlightTrigger::Stopped)
            } else {
                None
            }
        }
    }

    fn check_takeoff (&mut self, speed_kt: f64, now: DateTime<Utc>)->bool {
        if speed_kt >= SPEED_THRESHOLD_TAKEOFF {
            match self.trigger_time {
                None => {
                    debug!("takeoff threshold exceeded at {now}");
                    self.trigger_time = Some(now);
                }
                Some(t) if (now - t).num_seconds() >= TRIGGER_PERIOD_TAKEOFF => {
                    info!("takeoff detected at {now}");
                    self.push_flight( Flight { takeoff: now, landing: None });
                    self.flying = true;
                    self.trigger_time = None;
                    self.changed = true;
                    return true
                }
                _ => {}
            }
        } else if self.trigger_time.take().is_some() {
            debug!("takeoff threshold underrun at {now}, trigger reset");
        }
        false
    }

    fn check_landing (&mut self, speed_kt: f64, now: DateTime<Utc>) {
        if speed_kt < SPEED_THRESHOLD_LANDING {
            match self.trigger_time {
                None => {
                    debug!("landing threshold underrun at {now}");
                    self.trigger_time = Some(now);
                }
                Some(t) if (now - t).num_seconds() >= TRIGGER_PERIOD_LANDING => {
                    info!("landing detected at {now}");
                    if let Some(flight) = self.flights.front_mut() { flight.landing = Some(now) }
                    self.flying = false;
                    self.unreported_flight = true;
                    self.trigger_time = None;
                }
                _ => {}
            }
        } else if self.trigger_time.take().is_some() {
            debug!("landing threshold exceeded at {now}, trigger reset");
        }
    }

    fn check_stop (&mut self, speed_kt: f64, now: DateTime<Utc>)->bool {
        if speed_kt < SPEED_THRESHOLD_STOPPED {
            match self.stop_time {
                None => self.stop_time = Some(now),
                Some(t) if (now - t).num_seconds() >= TRIGGER_PERIOD_STOP => {
                    info!("stop detected at {now}");
                    self.stop_time = None;
                    self.unreported_flight = false; // only reported once
                    return true
                }
                _ => {}
            }
        } else if self.stop_time.take().is_some() {
            debug!("stop threshold exceeded at {now}, trigger reset");
        }
        false
    }

    fn push_flight (&mut self, flight: Flight) {
        self.flights.push_front(flight);
        self.flights.truncate(MAX_FLIGHTS);
    }
}
