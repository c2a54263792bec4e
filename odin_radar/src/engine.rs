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

//! the ingestion supervisor. `RadarState` is the context object shared between the engine tasks and the
//! renderer, `RadarEngine` runs the connection channels, the eviction/watchdog sweep, the UI loop and the
//! control task that executes outbound requests

use std::{sync::{Arc, Mutex, MutexGuard, atomic::{AtomicBool, Ordering}}, time::Instant};
use chrono::{DateTime, Utc};
use tokio::{select, sync::{broadcast, mpsc}, task::{JoinHandle, JoinSet}};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::RadarConfig;
use crate::connection::{ConnectionChannel, LinkStatus, pause};
use crate::control::RadarControl;
use crate::errors::{Result, op_failed};
use crate::flighttime::{Flight, FlightTimer, FlightTrigger};
use crate::mode::{ButtonPress, DispatchAction, DispatcherState, Mode, Tick, next_radar_range};
use crate::situation::{Attitude, GMeter, Situation, SituationMsg, clock_correction};
use crate::status::StratuxStatus;
use crate::traffic::{Aircraft, TrafficAlert, TrafficMsg, TrafficParams, TrafficRegistry, TrafficUpdate};
use crate::watchdog::Watchdog;

const ALERT_QUEUE_LEN: usize = 16;

#[inline]
fn lock<T> (m: &Mutex<T>)->MutexGuard<'_,T> {
    m.lock().unwrap_or_else( |e| e.into_inner())
}

/* #region RadarState ***********************************************************************************************/

/// all shared state. Each aggregate has its own lock, critical sections never span an await point. If more
/// than one lock is needed they are acquired in the order situation, attitude, gmeter
pub struct RadarState {
    config: RadarConfig,
    traffic_params: TrafficParams,

    situation: Mutex<Situation>,
    attitude: Mutex<Attitude>,
    gmeter: Mutex<GMeter>,
    status: Mutex<StratuxStatus>,
    traffic: TrafficRegistry,

    dispatcher: Mutex<DispatcherState>,
    flight_timer: Mutex<FlightTimer>,
    flight_trigger: Mutex<Option<FlightTrigger>>, // consumed by the next dispatcher tick

    refresh_requested: AtomicBool,
    sound_on: AtomicBool,
    alerts: broadcast::Sender<TrafficAlert>,
}

impl RadarState {
    pub fn new (config: RadarConfig)->Self {
        let traffic_params = TrafficParams { geometry: config.display, speed_arrow: config.timing.speed_arrow };
        let dispatcher = DispatcherState::new( config.start_mode);
        let flight_timer = FlightTimer::new( config.flight_time);
        let (alerts,_) = broadcast::channel( ALERT_QUEUE_LEN);

        RadarState {
            traffic_params,
            situation: Mutex::new( Situation::default()),
            attitude: Mutex::new( Attitude::default()),
            gmeter: Mutex::new( GMeter::default()),
            status: Mutex::new( StratuxStatus::default()),
            traffic: TrafficRegistry::new(),
            sound_on: AtomicBool::new( dispatcher.sound_on),
            dispatcher: Mutex::new( dispatcher),
            flight_timer: Mutex::new( flight_timer),
            flight_trigger: Mutex::new( None),
            refresh_requested: AtomicBool::new( false),
            alerts,
            config,
        }
    }

    pub fn config (&self)->&RadarConfig { &self.config }

    //--- the read surface for renderers

    pub fn situation (&self)->Situation { lock(&self.situation).clone() }
    pub fn attitude (&self)->Attitude { lock(&self.attitude).clone() }
    pub fn gmeter (&self)->GMeter { lock(&self.gmeter).clone() }
    pub fn status (&self)->StratuxStatus { lock(&self.status).clone() }
    pub fn traffic (&self)->&TrafficRegistry { &self.traffic }
    pub fn dispatcher (&self)->DispatcherState { *lock(&self.dispatcher) }
    pub fn mode (&self)->Mode { lock(&self.dispatcher).mode }
    pub fn flights (&self)->Vec<Flight> { lock(&self.flight_timer).flights().iter().cloned().collect() }

    /// snapshot and clear the change flag
    pub fn take_situation (&self)->Situation {
        let mut sit = lock(&self.situation);
        let snap = sit.clone();
        sit.changed = false;
        snap
    }

    pub fn take_attitude (&self)->Attitude {
        let mut ahrs = lock(&self.attitude);
        let snap = ahrs.clone();
        ahrs.changed = false;
        snap
    }

    pub fn take_gmeter (&self)->GMeter {
        let mut gmeter = lock(&self.gmeter);
        let snap = gmeter.clone();
        gmeter.changed = false;
        snap
    }

    pub fn take_status (&self)->StratuxStatus {
        let mut status = lock(&self.status);
        let snap = status.clone();
        status.changed = false;
        snap
    }

    /// traffic in draw order (farthest first)
    pub fn aircraft_far_first (&self)->Vec<Aircraft> { self.traffic.far_first() }

    /// called by renderers that need a full panel refresh
    pub fn request_refresh (&self) { self.refresh_requested.store( true, Ordering::Relaxed) }

    pub fn subscribe_alerts (&self)->broadcast::Receiver<TrafficAlert> { self.alerts.subscribe() }

    pub fn is_sound_on (&self)->bool { self.sound_on.load(Ordering::Relaxed) }

    //--- mutators used by the engine tasks

    pub fn apply_situation_json (&self, json: &str)->Option<DateTime<Utc>> {
        match SituationMsg::from_json( json) {
            Ok(msg) => self.apply_situation_msg( &msg, Instant::now(), Utc::now()),
            Err(e) => { warn!("malformed situation message: {e}"); None }
        }
    }

    /// update situation, attitude and g-meter. Returns the target time if the system clock should be corrected
    pub fn apply_situation_msg (&self, msg: &SituationMsg, now: Instant, utc_now: DateTime<Utc>)->Option<DateTime<Utc>> {
        let mut sit = lock(&self.situation);
        let reconnected = sit.set_connected( now);
        if reconnected { info!("situation feed connected") }
        sit.apply( msg, self.config.north_up);
        let gps_active = sit.gps_active;
        let gps_speed = sit.gps_speed;

        let mut ahrs = lock(&self.attitude);
        if reconnected { ahrs.changed = true }
        let sensor_lost = ahrs.apply( msg);
        let sensor_present = ahrs.sensor_present;

        let mut gmeter = lock(&self.gmeter);
        if reconnected { gmeter.changed = true }
        if sensor_lost { gmeter.reset_extremes() }
        gmeter.apply( msg, sensor_present);

        drop(gmeter);
        drop(ahrs);
        drop(sit);

        if let Some(trigger) = lock(&self.flight_timer).update( gps_active, gps_speed, utc_now) {
            *lock(&self.flight_trigger) = Some(trigger);
        }

        clock_correction( msg, gps_active, utc_now, self.config.timing.max_clock_offset)
    }

    pub fn apply_traffic_json (&self, json: &str) {
        match TrafficMsg::from_json( json) {
            Ok(msg) => { self.apply_traffic_msg( &msg, Instant::now()); }
            Err(e) => warn!("malformed traffic message: {e}")
        }
    }

    pub fn apply_traffic_msg (&self, msg: &TrafficMsg, now: Instant)->TrafficUpdate {
        let update = {
            let mut sit = lock(&self.situation);
            self.traffic.apply( msg, &mut sit, &self.traffic_params, now)
        };

        if let TrafficUpdate::Tracked{ alert: Some(alert), .. } = &update {
            self.publish_alert( *alert);
        }
        update
    }

    fn publish_alert (&self, mut alert: TrafficAlert) {
        if !self.is_sound_on() { return }
        if !self.config.distance_warnings { alert.distance = None }
        debug!("{alert}");
        let _ = self.alerts.send( alert); // no receivers is not an error
    }

    pub fn apply_status_json (&self, json: &str) {
        match StratuxStatus::from_json( json) {
            Ok(status) => *lock(&self.status) = status,
            Err(e) => warn!("malformed status message: {e}")
        }
    }

    /// atomically flip to disconnected if `pred` holds for the current situation. Returns true if we flipped
    pub fn mark_disconnected_if<F> (&self, pred: F)->bool where F: FnOnce(&Situation)->bool {
        let mut sit = lock(&self.situation);
        if pred(&sit) && sit.set_disconnected() {
            lock(&self.attitude).changed = true;
            lock(&self.gmeter).changed = true;
            true
        } else {
            false
        }
    }

    pub fn reset_vsi (&self) {
        let mut sit = lock(&self.situation);
        sit.reset_vertical_extremes();
        sit.changed = true;
    }

    pub fn reset_gmeter (&self) {
        lock(&self.gmeter).reset_extremes();
    }

    pub fn reset_timer (&self) {
        lock(&self.dispatcher).timer.reset();
    }

    /// one dispatcher cycle. Consumes pending refresh requests and flight triggers
    pub fn step_dispatcher (&self, input: Option<ButtonPress>, utc_now: DateTime<Utc>)->(DispatcherState,DispatcherState,Vec<DispatchAction>) {
        let tick = Tick {
            input,
            refresh_requested: self.refresh_requested.swap( false, Ordering::Relaxed),
            flight: lock(&self.flight_trigger).take(),
            now_secs: utc_now.timestamp(),
        };

        let mut dispatcher = lock(&self.dispatcher);
        let prev = *dispatcher;
        let (next, actions) = prev.step( &tick);
        *dispatcher = next;
        self.sound_on.store( next.sound_on, Ordering::Relaxed);

        (prev, next, actions)
    }
}

impl LinkStatus for RadarState {
    fn is_connected (&self)->bool { lock(&self.situation).connected }

    fn mark_disconnected (&self) {
        self.mark_disconnected_if( |_| true);
    }
}

/* #endregion RadarState */

/* #region user input ***********************************************************************************************/

/// source of classified button presses, polled by the UI loop
pub trait InputSource: Send {
    fn poll_input (&mut self)->Option<ButtonPress>;
}

impl InputSource for mpsc::Receiver<ButtonPress> {
    fn poll_input (&mut self)->Option<ButtonPress> { self.try_recv().ok() }
}

impl InputSource for mpsc::UnboundedReceiver<ButtonPress> {
    fn poll_input (&mut self)->Option<ButtonPress> { self.try_recv().ok() }
}

/// for headless operation
pub struct NoInput;

impl InputSource for NoInput {
    fn poll_input (&mut self)->Option<ButtonPress> { None }
}

/* #endregion user input */

/* #region RadarEngine **********************************************************************************************/

/// outbound requests. These are executed by the control task so that a slow or hanging collaborator
/// never stalls the UI loop
#[derive(Debug,Clone,Copy,PartialEq)]
enum ControlRequest {
    RadarScale { range: f64, limits: f64 },
    ResetGMeter,
    Shutdown,
    Reboot,
    SystemClock(DateTime<Utc>),
}

pub struct RadarEngine {
    state: Arc<RadarState>,
    cancel: CancellationToken,
}

impl RadarEngine {
    pub fn new (config: RadarConfig)->Self {
        RadarEngine { state: Arc::new( RadarState::new( config)), cancel: CancellationToken::new() }
    }

    pub fn state (&self)->Arc<RadarState> { self.state.clone() }

    pub fn cancel_token (&self)->CancellationToken { self.cancel.clone() }

    /// stop all tasks
    pub fn shutdown (&self) { self.cancel.cancel() }

    /// run until cancelled. If one of the engine tasks fails all others are stopped and the error is returned
    pub async fn run<I,C> (&self, input: I, control: C)->Result<()>
        where I: InputSource + 'static, C: RadarControl + 'static
    {
        let config = self.state.config();
        let timing = config.timing;
        let (clock_tx, clock_rx) = mpsc::unbounded_channel::<DateTime<Utc>>();
        let (control_tx, control_rx) = mpsc::unbounded_channel::<ControlRequest>();
        let mut tasks: JoinSet<()> = JoinSet::new();

        {
            let state = self.state.clone();
            let cancel = self.cancel.clone();
            let channel = ConnectionChannel::new( "situation", config.situation_url(), timing).marking_link();
            tasks.spawn( async move {
                channel.run( state.as_ref(), &cancel, |json| {
                    if let Some(t) = state.apply_situation_json( json) {
                        let _ = clock_tx.send( t);
                    }
                }).await
            });
        }
        {
            let state = self.state.clone();
            let cancel = self.cancel.clone();
            let channel = ConnectionChannel::new( "traffic", config.traffic_url(), timing);
            tasks.spawn( async move {
                channel.run( state.as_ref(), &cancel, |json| state.apply_traffic_json( json)).await
            });
        }

        tasks.spawn( sweep_loop( self.state.clone(), self.cancel.clone()));
        tasks.spawn( control_loop( self.state.clone(), control, control_rx, self.cancel.clone()));
        tasks.spawn( ui_loop( self.state.clone(), input, control_tx, clock_rx, self.cancel.clone()));

        info!("radar engine running for {}", config.host);
        while let Some(res) = tasks.join_next().await {
            if let Err(e) = res {
                error!("engine task failed: {e}");
                self.cancel.cancel();
                tasks.shutdown().await;
                return Err( op_failed( format!("engine task failed: {e}")))
            }
        }
        info!("radar engine terminated");
        Ok(())
    }
}

/// evict stale traffic and check the situation watchdog
async fn sweep_loop (state: Arc<RadarState>, cancel: CancellationToken) {
    let timing = state.config().timing;
    let watchdog = Watchdog::new( timing.watchdog);

    while pause( timing.sweep_interval, &cancel).await {
        let now = Instant::now();
        state.traffic().remove_stale( now, timing.cutoff);
        watchdog.check( &state, now);
    }
}

/// poll user input, step the dispatcher and hand its actions over to the control task. This also owns the
/// status feed that only runs while its screen is shown, and forwards clock corrections
async fn ui_loop<I: InputSource> (state: Arc<RadarState>, mut input: I, control_tx: mpsc::UnboundedSender<ControlRequest>,
                                  mut clock_rx: mpsc::UnboundedReceiver<DateTime<Utc>>, cancel: CancellationToken)
{
    let timing = state.config().timing;
    let mut status_feed: Option<(CancellationToken,JoinHandle<()>)> = None;

    while pause( timing.ui_reaction, &cancel).await {
        let (prev, next, actions) = state.step_dispatcher( input.poll_input(), Utc::now());
        if prev.mode != next.mode {
            debug!("mode {} -> {}", prev.mode, next.mode);
        }

        for action in actions {
            if let Some(request) = execute( &state, action) {
                request_control( &control_tx, request);
            }
        }

        let show_status = matches!( next.mode, Mode::StratuxStatus | Mode::StratuxStatusRefresh);
        if show_status && status_feed.is_none() {
            status_feed = Some( spawn_status_feed( &state, &cancel));
        } else if !show_status {
            if let Some((feed_cancel,task)) = status_feed.take() {
                feed_cancel.cancel();
                let _ = task.await;
            }
        }

        let mut correction = None;
        while let Ok(t) = clock_rx.try_recv() { correction = Some(t) }
        if let Some(t) = correction {
            request_control( &control_tx, ControlRequest::SystemClock(t));
        }
    }

    if let Some((feed_cancel,task)) = status_feed.take() {
        feed_cancel.cancel();
        let _ = task.await;
    }
    debug!("ui loop terminated");
}

fn request_control (control_tx: &mpsc::UnboundedSender<ControlRequest>, request: ControlRequest) {
    if control_tx.send( request).is_err() {
        warn!("control task not running, dropping {request:?}");
    }
}

fn spawn_status_feed (state: &Arc<RadarState>, cancel: &CancellationToken)->(CancellationToken,JoinHandle<()>) {
    let feed_cancel = cancel.child_token();
    let state = state.clone();
    let token = feed_cancel.clone();
    let channel = ConnectionChannel::new( "status", state.config().status_url(), state.config().timing);

    let task = tokio::spawn( async move {
        channel.run( state.as_ref(), &token, |json| state.apply_status_json( json)).await
    });
    (feed_cancel, task)
}

/// apply the local effects of a dispatcher action, returning the outbound request it needs (if any)
fn execute (state: &RadarState, action: DispatchAction)->Option<ControlRequest> {
    match action {
        DispatchAction::SoundChanged(on) => {
            info!("radar sound {}", if on {"on"} else {"off"});
            None
        }
        DispatchAction::CycleRadarRange => {
            let sit = state.situation();
            Some( ControlRequest::RadarScale { range: next_radar_range( sit.radar_range), limits: sit.radar_limits })
        }
        DispatchAction::ResetGMeter => {
            state.reset_gmeter();
            Some( ControlRequest::ResetGMeter)
        }
        DispatchAction::ResetVsi => {
            state.reset_vsi();
            None
        }
        DispatchAction::Shutdown => Some( ControlRequest::Shutdown),
        DispatchAction::Reboot => Some( ControlRequest::Reboot),
    }
}

/// execute outbound requests in order. Each request is abandoned as soon as the engine is cancelled
async fn control_loop<C: RadarControl> (state: Arc<RadarState>, control: C, mut control_rx: mpsc::UnboundedReceiver<ControlRequest>,
                                        cancel: CancellationToken)
{
    loop {
        let request = select! {
            _ = cancel.cancelled() => break,
            request = control_rx.recv() => match request {
                Some(request) => request,
                None => break
            }
        };

        let res = select! {
            _ = cancel.cancelled() => {
                debug!("abandoning {request:?}");
                break
            }
            res = send_request( &control, request) => res
        };

        match res {
            Ok(()) => match request {
                ControlRequest::Shutdown | ControlRequest::Reboot => cancel.cancel(),
                ControlRequest::SystemClock(_) => state.reset_timer(),
                _ => {}
            }
            Err(e) => warn!("{request:?} failed: {e}")
        }
    }
    debug!("control loop terminated");
}

async fn send_request<C: RadarControl> (control: &C, request: ControlRequest)->Result<()> {
    match request {
        ControlRequest::RadarScale { range, limits } => control.set_radar_scale( range, limits).await,
        ControlRequest::ResetGMeter => control.reset_gmeter().await,
        ControlRequest::Shutdown => control.shutdown().await,
        ControlRequest::Reboot => control.reboot().await,
        ControlRequest::SystemClock(t) => control.set_system_clock( t).await,
    }
}

/* #endregion RadarEngine */
