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

//! the outbound side: requests we send to the receiver and the host OS

use std::time::Duration;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::json;
use tokio::{process::Command, time::timeout};
use tracing::{debug, info};

use crate::config::RadarConfig;
use crate::errors::{Result, command_error};

/// max time we wait for the (non-interactive) clock command
pub const CLOCK_CMD_TIMEOUT: Duration = Duration::from_secs(5);

/// the external collaborators the engine talks to. Errors are logged by the engine and otherwise ignored
#[async_trait]
pub trait RadarControl: Send + Sync {
    /// ask the receiver to change the radar range (nm) and altitude limits (ft). The receiver acknowledges
    /// through a scale message on the traffic feed
    async fn set_radar_scale (&self, range: f64, limits: f64)->Result<()>;

    async fn reset_gmeter (&self)->Result<()>;

    async fn shutdown (&self)->Result<()>;

    async fn reboot (&self)->Result<()>;

    async fn set_system_clock (&self, time: DateTime<Utc>)->Result<()>;
}

/// control of a real Stratux receiver through its HTTP API, clock updates through `sudo -n date`
pub struct StratuxControl {
    client: Client,
    settings_url: String,
    gmeter_reset_url: String,
    shutdown_url: String,
    reboot_url: String,
}

impl StratuxControl {
    pub fn new (config: &RadarConfig)->Result<Self> {
        let client = Client::builder().timeout( Duration::from_secs(5)).build()?;
        Ok( StratuxControl {
            client,
            settings_url: config.settings_url(),
            gmeter_reset_url: config.gmeter_reset_url(),
            shutdown_url: config.shutdown_url(),
            reboot_url: config.reboot_url(),
        })
    }

    async fn post (&self, url: &str)->Result<()> {
        debug!("POST {url}");
        self.client.post( url).send().await?.error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl RadarControl for StratuxControl {
    async fn set_radar_scale (&self, range: f64, limits: f64)->Result<()> {
        let settings = json!({ "RadarRange": range, "RadarLimits": limits });
        debug!("POST {} {}", self.settings_url, settings);
        self.client.post( self.settings_url.as_str()).json( &settings).send().await?.error_for_status()?;
        Ok(())
    }

    async fn reset_gmeter (&self)->Result<()> { self.post( &self.gmeter_reset_url).await }

    async fn shutdown (&self)->Result<()> { self.post( &self.shutdown_url).await }

    async fn reboot (&self)->Result<()> { self.post( &self.reboot_url).await }

    async fn set_system_clock (&self, time: DateTime<Utc>)->Result<()> {
        info!("setting system clock to {time}");
        let secs = format!("@{}", time.timestamp());
        let mut cmd = Command::new("sudo");
        cmd.args( ["-n", "date", "--utc", "-s", secs.as_str()]).kill_on_drop(true);

        let status = timeout( CLOCK_CMD_TIMEOUT, cmd.status()).await??;
        if status.success() {
            Ok(())
        } else {
            Err( command_error( format!("setting system time failed: {status}")))
        }
    }
}

/// a control that only logs requests, for monitoring without affecting the receiver or host
#[derive(Debug,Default,Clone,Copy)]
pub struct NoControl;

#[async_trait]
impl RadarControl for NoControl {
    async fn set_radar_scale (&self, range: f64, limits: f64)->Result<()> {
        info!("radar scale request: {range} nm, {limits} ft");
        Ok(())
    }

    async fn reset_gmeter (&self)->Result<()> {
        info!("g-meter reset request");
        Ok(())
    }

    async fn shutdown (&self)->Result<()> {
        info!("shutdown request");
        Ok(())
    }

    async fn reboot (&self)->Result<()> {
        info!("reboot request");
        Ok(())
    }

    async fn set_system_clock (&self, time: DateTime<Utc>)->Result<()> {
        info!("clock correction request: {time}");
        Ok(())
    }
}
