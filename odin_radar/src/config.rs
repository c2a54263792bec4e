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

use std::{fs, path::Path, time::Duration};
use serde::{Serialize,Deserialize};

use crate::errors::{Result, config_error};
use crate::mode::Mode;

pub const DEFAULT_HOST: &str = "192.168.10.1";

/// the configuration for a radar engine instance, normally read from a RON file such as
/// `configs/radar.ron`. All fields have defaults so that config files only need to contain overrides
#[derive(Serialize,Deserialize,Debug,Clone)]
#[serde(default)]
pub struct RadarConfig {
    pub host: String, // address of the traffic receiver (stratux)
    pub north_up: bool, // if set the course is never updated from situation messages
    pub display_tail: bool,
    pub distance_warnings: bool, // include distance in traffic alerts
    pub flight_time: bool, // enable takeoff/landing detection
    pub start_mode: Mode,
    pub display: DisplayGeometry,
    pub timing: Timing,
}

impl Default for RadarConfig {
    fn default()->Self {
        RadarConfig {
            host: DEFAULT_HOST.to_string(),
            north_up: false,
            display_tail: false,
            distance_warnings: false,
            flight_time: false,
            start_mode: Mode::Radar,
            display: DisplayGeometry::default(),
            timing: Timing::default(),
        }
    }
}

impl RadarConfig {
    pub fn situation_url (&self)->String { format!("ws://{}/situation", self.host) }
    pub fn traffic_url (&self)->String { format!("ws://{}/radar", self.host) }
    pub fn status_url (&self)->String { format!("ws://{}/status", self.host) }

    pub fn settings_url (&self)->String { format!("http://{}/setSettings", self.host) }
    pub fn gmeter_reset_url (&self)->String { format!("http://{}/resetGMeter", self.host) }
    pub fn shutdown_url (&self)->String { format!("http://{}/shutdown", self.host) }
    pub fn reboot_url (&self)->String { format!("http://{}/reboot", self.host) }
}

/// the display properties the projection depends on. The display itself is not our business,
/// we only need to know its radar circle size and center
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq)]
#[serde(default)]
pub struct DisplayGeometry {
    pub max_pixel: i32, // diameter of the radar circle in pixels
    pub zero_x: i32,    // radar center
    pub zero_y: i32,
    pub arc_exclude: Option<(u16,u16)>, // angular range [from,to] where no estimated targets are placed
}

impl Default for DisplayGeometry {
    fn default()->Self {
        DisplayGeometry { max_pixel: 128, zero_x: 64, zero_y: 64, arc_exclude: None }
    }
}

impl DisplayGeometry {
    #[inline] pub fn radius (&self)->f64 { self.max_pixel as f64 / 2.0 }
}

#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq)]
#[serde(default)]
pub struct Timing {
    pub retry: Duration,            // wait before reconnecting after a connection failure
    pub lost_connection: Duration,  // wait before reconnecting after close or watchdog-detected loss
    pub check_connection: Duration, // max wait for the next message
    pub watchdog: Duration,         // max silence on the situation feed before we are disconnected
    pub cutoff: Duration,           // max age of tracked aircraft
    pub sweep_interval: Duration,   // cadence of eviction/watchdog sweeps
    pub ui_reaction: Duration,      // cadence of user input polls
    pub speed_arrow: Duration,      // look-ahead time of speed vectors
    pub max_clock_offset: Duration, // allowed difference between GPS time and system clock
}

impl Default for Timing {
    fn default()->Self {
        Timing {
            retry: Duration::from_secs(1),
            lost_connection: Duration::from_millis(300),
            check_connection: Duration::from_secs(5),
            watchdog: Duration::from_secs(3),
            cutoff: Duration::from_secs(29),
            sweep_interval: Duration::from_millis(100),
            ui_reaction: Duration::from_millis(100),
            speed_arrow: Duration::from_secs(60),
            max_clock_offset: Duration::from_secs(10),
        }
    }
}

pub fn load_config<P: AsRef<Path>> (path: P)->Result<RadarConfig> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err( config_error( format!("config file not found: {:?}", path)))
    }
    let data = fs::read_to_string(path)?;
    parse_config(&data)
}

pub fn parse_config (data: &str)->Result<RadarConfig> {
    let config: RadarConfig = ron::de::from_str(data)?;
    if config.display.max_pixel <= 0 {
        return Err( config_error("display.max_pixel has to be positive"))
    }
    Ok(config)
}
