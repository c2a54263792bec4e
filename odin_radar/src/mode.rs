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

//! the mode dispatcher: a finite state machine that selects the active screen from user input and automatic
//! triggers. Transitions are pure functions of (state, tick) so that the dispatcher can be tested without
//! any engine or display

use serde::{Serialize,Deserialize};
use strum::{Display, EnumString};

use crate::flighttime::FlightTrigger;

/// radar ranges (nm) we cycle through when the user requests a range change
pub const RADAR_RANGES: [f64; 5] = [2.0, 5.0, 10.0, 20.0, 40.0];

/// max countdown (sec) that can be set on the timer
pub const MAX_COUNTDOWN: i64 = 2 * 60 * 60;

/* #region modes and input ******************************************************************************************/

/// the screens. `*Refresh` variants are transient and only signal a full panel refresh to the renderer
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq,Eq,Hash,Default,EnumString,Display)]
#[strum(ascii_case_insensitive)]
pub enum Mode {
    #[default] Radar,
    Timer,
    Shutdown,
    RadarRefresh,
    Ahrs,
    AhrsRefresh,
    Status,
    StatusRefresh,
    GMeter,
    GMeterRefresh,
    Compass,
    CompassRefresh,
    Vsi,
    VsiRefresh,
    StratuxStatus,
    StratuxStatusRefresh,
    FlightLog,
    FlightLogRefresh,
}

impl Mode {
    /// the transient refresh state for modes that have one
    pub fn refresh_pair (self)->Option<Mode> {
        use Mode::*;
        match self {
            Radar => Some(RadarRefresh),
            Ahrs => Some(AhrsRefresh),
            Status => Some(StatusRefresh),
            GMeter => Some(GMeterRefresh),
            Compass => Some(CompassRefresh),
            Vsi => Some(VsiRefresh),
            StratuxStatus => Some(StratuxStatusRefresh),
            FlightLog => Some(FlightLogRefresh),
            _ => None
        }
    }

    /// the mode a refresh state returns to
    pub fn refresh_origin (self)->Option<Mode> {
        use Mode::*;
        match self {
            RadarRefresh => Some(Radar),
            AhrsRefresh => Some(Ahrs),
            StatusRefresh => Some(Status),
            GMeterRefresh => Some(GMeter),
            CompassRefresh => Some(Compass),
            VsiRefresh => Some(Vsi),
            StratuxStatusRefresh => Some(StratuxStatus),
            FlightLogRefresh => Some(FlightLog),
            _ => None
        }
    }

    pub fn is_refresh (self)->bool { self.refresh_origin().is_some() }

    /// critical modes suspend the global button rules
    pub fn is_critical (self)->bool { self == Mode::Shutdown }

    /// instrument screens are cycled with a short middle press
    fn next_instrument (self)->Option<Mode> {
        use Mode::*;
        match self {
            Ahrs => Some(GMeter),
            GMeter => Some(Compass),
            Compass => Some(Vsi),
            Vsi => Some(Status),
            Status => Some(StratuxStatus),
            StratuxStatus => Some(Radar),
            FlightLog => Some(Radar),
            _ => None
        }
    }
}

#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq,Eq)]
pub enum PressDuration { Short, Long }

#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq,Eq)]
pub enum Button { Left, Middle, Right }

/// a classified (debounced) button press
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq,Eq)]
pub struct ButtonPress {
    pub duration: PressDuration,
    pub button: Button,
}

impl ButtonPress {
    pub fn short (button: Button)->Self { ButtonPress { duration: PressDuration::Short, button } }
    pub fn long (button: Button)->Self { ButtonPress { duration: PressDuration::Long, button } }
}

/// everything the dispatcher reacts to within one UI cycle
#[derive(Debug,Clone,Copy,PartialEq,Default)]
pub struct Tick {
    pub input: Option<ButtonPress>,
    pub refresh_requested: bool,
    pub flight: Option<FlightTrigger>,
    pub now_secs: i64, // UTC epoch seconds, used by the timer
}

/// side effects the dispatcher requests from the engine
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum DispatchAction {
    SoundChanged(bool),
    CycleRadarRange,
    ResetGMeter,
    ResetVsi,
    Shutdown,
    Reboot,
}

/// the next radar range after `current`, wrapping around to the smallest one
pub fn next_radar_range (current: f64)->f64 {
    RADAR_RANGES.iter().copied().find( |r| *r > current).unwrap_or( RADAR_RANGES[0])
}

/* #endregion modes and input */

/* #region timer ****************************************************************************************************/

#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq,Eq,Default,Display)]
pub enum LapHead {
    #[default] Laptimer,
    #[strum(to_string="Set Countdown")] SetCountdown,
    Countdown,
}

/// stopwatch, lap timer and countdown. While running `stop_time` is the (virtual) start time and `countdown`
/// the end time of the countdown, both in epoch seconds. While stopped they hold elapsed/remaining seconds
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq,Eq,Default)]
pub struct TimerState {
    pub stop_time: i64,
    pub lap_time: i64, // epoch sec of last lap, 0 if none
    pub countdown: i64,
    pub running: bool,
    pub setting_countdown: bool,
    pub lap_head: LapHead,
}

impl TimerState {
    pub fn reset (&mut self) {
        *self = TimerState::default();
    }

    /// elapsed stopwatch seconds, None if never started
    pub fn stopwatch (&self, now_secs: i64)->Option<i64> {
        if self.running { Some(now_secs - self.stop_time) }
        else if self.stop_time != 0 { Some(self.stop_time) }
        else { None }
    }

    pub fn lap (&self, now_secs: i64)->Option<i64> {
        (self.running && self.lap_time != 0).then( || now_secs - self.lap_time)
    }

    pub fn countdown_remaining (&self, now_secs: i64)->Option<i64> {
        if self.countdown <= 0 { None }
        else if self.running { Some( (self.countdown - now_secs).max(0)) }
        else { Some(self.countdown) }
    }

    /// short press handling (long presses are dispatched before we get here)
    fn on_short_press (&mut self, button: Button, now_secs: i64) {
        if self.setting_countdown {
            match button {
                Button::Middle => {
                    if self.countdown > 0 {
                        self.lap_time = 0;
                        self.lap_head = LapHead::Countdown;
                    } else {
                        self.lap_head = LapHead::Laptimer;
                    }
                    self.setting_countdown = false;
                }
                Button::Left => self.add_countdown(600),
                Button::Right => self.add_countdown(60),
            }
        } else {
            match button {
                Button::Middle => {
                    self.setting_countdown = true;
                    self.countdown = 0;
                    self.lap_head = LapHead::SetCountdown;
                }
                Button::Right => {
                    self.stop_time = now_secs - self.stop_time; // start <-> elapsed
                    if self.countdown > 0 {
                        self.countdown = if self.running { self.countdown - now_secs } else { now_secs + self.countdown };
                    }
                    self.lap_time = 0;
                    self.running = !self.running;
                }
                Button::Left => {
                    if self.running {
                        self.lap_time = now_secs;
                    } else {
                        self.stop_time = 0;
                        self.lap_time = 0;
                    }
                }
            }
        }
    }

    fn add_countdown (&mut self, secs: i64) {
        self.countdown += secs;
        if self.countdown >= MAX_COUNTDOWN { self.countdown = 0 }
    }
}

/* #endregion timer */

/* #region dispatcher ***********************************************************************************************/

#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq)]
pub struct DispatcherState {
    pub mode: Mode,
    pub timer: TimerState,
    pub sound_on: bool,
    pub switch_back: Option<Mode>, // mode to return to after an automatic flight log display
}

impl Default for DispatcherState {
    fn default()->Self { DispatcherState::new( Mode::Radar) }
}

impl DispatcherState {
    pub fn new (mode: Mode)->Self {
        DispatcherState { mode, timer: TimerState::default(), sound_on: true, switch_back: None }
    }

    /// compute the next state for a tick. User input takes precedence over automatic flight triggers within
    /// the same tick, i.e. the trigger is dropped. A refresh request only applies if the mode did not change
    pub fn step (&self, tick: &Tick)->(DispatcherState, Vec<DispatchAction>) {
        let mut next = *self;
        let mut actions = Vec::new();

        if let Some(origin) = next.mode.refresh_origin() {
            next.mode = origin;
        }
        let mode = next.mode;

        if let Some(press) = tick.input {
            next.switch_back = None;
            next.apply_input( press, tick.now_secs, &mut actions);

        } else if let Some(trigger) = tick.flight {
            match trigger {
                FlightTrigger::Stopped => {
                    if !next.mode.is_critical() && next.mode != Mode::FlightLog {
                        next.switch_back = Some(next.mode);
                        next.mode = Mode::FlightLog;
                    }
                }
                FlightTrigger::TookOff => {
                    if let Some(m) = next.switch_back.take() { next.mode = m }
                }
            }
        }

        if tick.refresh_requested && next.mode == mode {
            if let Some(refresh) = next.mode.refresh_pair() { next.mode = refresh }
        }

        (next, actions)
    }

    fn apply_input (&mut self, press: ButtonPress, now_secs: i64, actions: &mut Vec<DispatchAction>) {
        use PressDuration::*;
        use Button::*;

        match (self.mode, press.duration, press.button) {
            // shutdown menu overrides all global rules
            (Mode::Shutdown, Short, Left) => actions.push( DispatchAction::Shutdown),
            (Mode::Shutdown, Short, Right) => actions.push( DispatchAction::Reboot),
            (Mode::Shutdown, Short, Middle) => self.mode = Mode::Radar,
            (Mode::Shutdown, Long, _) => {}

            (Mode::Radar, Long, Middle) => self.mode = Mode::Ahrs,
            (Mode::Radar, Short, Middle) => self.mode = Mode::Timer,
            (Mode::Radar, Short, Left) => actions.push( DispatchAction::CycleRadarRange),
            (Mode::Radar, Short, Right) => {
                self.sound_on = !self.sound_on;
                actions.push( DispatchAction::SoundChanged(self.sound_on));
            }

            (_, Long, Middle) => self.mode = Mode::Radar,
            (_, Long, Left) => self.mode = Mode::Shutdown,
            (m, Long, Right) => if let Some(refresh) = m.refresh_pair() { self.mode = refresh },

            (Mode::Timer, Short, b) => self.timer.on_short_press( b, now_secs),
            (Mode::GMeter, Short, Right) => actions.push( DispatchAction::ResetGMeter),
            (Mode::Vsi, Short, Right) => actions.push( DispatchAction::ResetVsi),
            (m, Short, Middle) => if let Some(next) = m.next_instrument() { self.mode = next },
            (_, Short, _) => {}
        }
    }
}

/* #endregion dispatcher */
