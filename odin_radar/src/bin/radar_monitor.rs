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

use std::{path::PathBuf, sync::Arc, time::Duration};
use anyhow::Result;
use clap::Parser;
use lazy_static::lazy_static;
use tokio::{io::{AsyncBufReadExt, BufReader}, sync::{broadcast, mpsc}};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use odin_radar::{
    RadarConfig, RadarEngine, RadarState, load_config, Mode, ButtonPress, Button, TrafficAlert,
    NoControl, StratuxControl, connection::pause,
};

/// run the radar engine against a Stratux receiver and log what a renderer would show. Button presses are
/// read from stdin: 'l', 'm', 'r' for short and 'L', 'M', 'R' for long presses
#[derive(Parser,Debug)]
#[command(about="Stratux radar engine monitor")]
struct CliOpts {
    /// Stratux address (overrides config)
    #[arg(short, long)]
    connect: Option<String>,

    /// ground mode, display is always north up
    #[arg(short, long)]
    north: bool,

    /// RON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// debug output
    #[arg(short, long)]
    verbose: bool,

    /// start mode (radar, timer, ahrs, status, gmeter, compass, vsi, stratuxstatus)
    #[arg(short='m', long)]
    start_mode: Option<Mode>,

    /// show registrations
    #[arg(short, long)]
    registration: bool,

    /// include distance in traffic alerts
    #[arg(long)]
    speakdistance: bool,

    /// enable flight time measurement
    #[arg(long)]
    flighttime: bool,

    /// send control requests (settings, shutdown, clock) to the receiver and host
    #[arg(long)]
    control: bool,

    /// seconds between state reports
    #[arg(long, default_value_t=2)]
    interval: u64,
}

lazy_static! {
    static ref ARGS: CliOpts = CliOpts::parse();
}

#[tokio::main]
async fn main()->Result<()> {
    let filter = if ARGS.verbose { EnvFilter::new("debug") } else { EnvFilter::from_default_env() };
    tracing_subscriber::fmt().with_env_filter( filter).init();

    let config = get_config()?;
    let engine = RadarEngine::new( config.clone());

    let (tx, rx) = mpsc::channel::<ButtonPress>(16);
    tokio::spawn( read_buttons( tx, engine.cancel_token()));

    let cancel = engine.cancel_token();
    tokio::spawn( async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("terminating..");
            cancel.cancel();
        }
    });

    tokio::spawn( log_alerts( engine.state().subscribe_alerts()));
    tokio::spawn( report( engine.state(), engine.cancel_token()));

    if ARGS.control {
        engine.run( rx, StratuxControl::new( &config)?).await?;
    } else {
        engine.run( rx, NoControl).await?;
    }
    Ok(())
}

fn get_config ()->Result<RadarConfig> {
    let mut config = match &ARGS.config {
        Some(path) => load_config( path)?,
        None => RadarConfig::default()
    };

    if let Some(host) = &ARGS.connect { config.host = host.clone() }
    if let Some(mode) = ARGS.start_mode { config.start_mode = mode }
    config.north_up |= ARGS.north;
    config.display_tail |= ARGS.registration;
    config.distance_warnings |= ARGS.speakdistance;
    config.flight_time |= ARGS.flighttime;

    Ok(config)
}

fn parse_button (line: &str)->Option<ButtonPress> {
    match line.trim() {
        "l" => Some( ButtonPress::short( Button::Left)),
        "m" => Some( ButtonPress::short( Button::Middle)),
        "r" => Some( ButtonPress::short( Button::Right)),
        "L" => Some( ButtonPress::long( Button::Left)),
        "M" => Some( ButtonPress::long( Button::Middle)),
        "R" => Some( ButtonPress::long( Button::Right)),
        _ => None
    }
}

async fn read_buttons (tx: mpsc::Sender<ButtonPress>, cancel: CancellationToken) {
    let mut lines = BufReader::new( tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line
        };
        match line {
            Ok(Some(line)) => match parse_button( &line) {
                Some(press) => if tx.send( press).await.is_err() { break },
                None => warn!("unknown button '{}', use l,m,r (short) or L,M,R (long)", line.trim())
            }
            Ok(None) => break, // stdin closed
            Err(e) => { warn!("error reading stdin: {e}"); break }
        }
    }
}

async fn log_alerts (mut rx: broadcast::Receiver<TrafficAlert>) {
    loop {
        match rx.recv().await {
            Ok(alert) => println!(">> {alert}"),
            Err(broadcast::error::RecvError::Lagged(n)) => warn!("missed {n} traffic alerts"),
            Err(broadcast::error::RecvError::Closed) => break
        }
    }
}

/// what a renderer would do on its own cadence: read the snapshots that changed
async fn report (state: Arc<RadarState>, cancel: CancellationToken) {
    let interval = Duration::from_secs( ARGS.interval.max(1));

    while pause( interval, &cancel).await {
        let mode = state.mode();
        let sit = state.take_situation();
        println!("--- mode: {mode}, connected: {}, gps: {}, course: {:.0}, alt: {:.0} ft, range: {} nm",
                 sit.connected, sit.gps_active, sit.course, sit.own_altitude, sit.radar_range);

        match mode {
            Mode::Ahrs => {
                let ahrs = state.take_attitude();
                println!("    pitch: {}, roll: {}, heading: {}, slip: {}, sensor: {}", ahrs.pitch, ahrs.roll, ahrs.heading, ahrs.slip_skid, ahrs.sensor_present);
            }
            Mode::GMeter => {
                let g = state.take_gmeter();
                println!("    g: {:.2} (max {:.2}, min {:.2})", g.current, g.max, g.min);
            }
            Mode::Vsi => {
                println!("    vs: {:.0} ft/min (max {:.0}, min {:.0}), baro: {}", sit.vertical_speed, sit.vertical_max, sit.vertical_min, sit.baro_valid);
            }
            Mode::StratuxStatus => {
                let status = state.take_status();
                println!("    stratux {}: 1090 {}/min, UAT {}/min, sats {}/{}", status.version, status.es_messages_last_minute,
                         status.uat_messages_last_minute, status.gps_satellites_locked, status.gps_satellites_seen);
            }
            Mode::FlightLog => {
                for flight in state.flights() {
                    println!("    {} - {:?}", flight.takeoff, flight.landing);
                }
            }
            Mode::Timer => {
                let timer = state.dispatcher().timer;
                let now = chrono::Utc::now().timestamp();
                println!("    {}: stopwatch {:?}, lap {:?}, countdown {:?}", timer.lap_head, timer.stopwatch(now), timer.lap(now), timer.countdown_remaining(now));
            }
            _ => {
                if state.traffic().take_changed() {
                    let show_tail = state.config().display_tail;
                    for ac in state.aircraft_far_first() {
                        if show_tail { println!("    {ac}") } else { println!("    {:06x} {:+}", ac.icao, ac.relative_altitude) }
                    }
                }
            }
        }
    }
}
