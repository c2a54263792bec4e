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

//! ingestion engine for a traffic display that is fed by a Stratux ADS-B receiver. The engine keeps live
//! models of ownship situation, attitude and nearby traffic, projects traffic into display coordinates and
//! runs the mode state machine the (external) renderer uses to select its screen

pub mod errors;
pub use errors::{OdinRadarError, Result};

pub mod config;
pub use config::{RadarConfig, DisplayGeometry, Timing, load_config, parse_config};

pub mod projection;

pub mod situation;
pub use situation::{Situation, SituationMsg, Attitude, GMeter, GpsQuality};

pub mod traffic;
pub use traffic::{Aircraft, TrackPosition, TrafficMsg, TrafficRegistry, TrafficAlert, TrafficUpdate};

pub mod watchdog;
pub use watchdog::Watchdog;

pub mod mode;
pub use mode::{Mode, ButtonPress, Button, PressDuration, DispatcherState, DispatchAction, Tick};

pub mod flighttime;
pub mod status;

pub mod connection;
pub use connection::{ConnectionChannel, LinkStatus};

pub mod control;
pub use control::{RadarControl, StratuxControl, NoControl};

pub mod engine;
pub use engine::{RadarState, RadarEngine, InputSource, NoInput};
