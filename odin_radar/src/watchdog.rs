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
use tracing::info;

use crate::engine::RadarState;
use crate::situation::Situation;

/// declares the situation feed disconnected if there was no update within `timeout`. The watchdog has no timer
/// of its own, it is driven by the engine sweep cadence
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct Watchdog {
    pub timeout: Duration,
}

impl Watchdog {
    pub fn new (timeout: Duration)->Self { Watchdog { timeout } }

    pub fn is_expired (&self, sit: &Situation, now: Instant)->bool {
        sit.connected && sit.last_update.map( |t| now.saturating_duration_since(t) > self.timeout).unwrap_or(true)
    }

    /// returns true if this check flipped the state to disconnected
    pub fn check (&self, state: &RadarState, now: Instant)->bool {
        let flipped = state.mark_disconnected_if( |sit| self.is_expired( sit, now));
        if flipped {
            info!("watchdog: no situation update received in {:?}", self.timeout);
        }
        flipped
    }
}
