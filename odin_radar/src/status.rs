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

use serde::{Serialize,Deserialize};

/// the receiver status record from the `/status` feed. We only keep the fields that are shown on the
/// StratuxStatus screen, missing ones get their default
#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
#[serde(default)]
pub struct StratuxStatus {
    #[serde(rename="Version")]                  pub version: String,
    #[serde(rename="Devices")]                  pub devices: u32,

    #[serde(rename="UATRadio_connected")]       pub uat_connected: bool,
    #[serde(rename="UAT_messages_last_minute")] pub uat_messages_last_minute: u32,
    #[serde(rename="UAT_messages_max")]         pub uat_messages_max: u32,

    #[serde(rename="ES_messages_last_minute")]  pub es_messages_last_minute: u32, // 1090ES
    #[serde(rename="ES_messages_max")]          pub es_messages_max: u32,

    #[serde(rename="OGN_connected")]            pub ogn_connected: bool,
    #[serde(rename="OGN_messages_last_minute")] pub ogn_messages_last_minute: u32,
    #[serde(rename="OGN_messages_max")]         pub ogn_messages_max: u32,
    #[serde(rename="OGN_noise_db")]             pub ogn_noise_db: f64,
    #[serde(rename="OGN_gain_db")]              pub ogn_gain_db: f64,

    #[serde(rename="GPS_connected")]            pub gps_connected: bool,
    #[serde(rename="GPS_satellites_locked")]    pub gps_satellites_locked: u32,
    #[serde(rename="GPS_satellites_tracked")]   pub gps_satellites_tracked: u32,
    #[serde(rename="GPS_satellites_seen")]      pub gps_satellites_seen: u32,
    #[serde(rename="GPS_position_accuracy")]    pub gps_position_accuracy: f64,

    #[serde(rename="IMUConnected", alias="IMUconnected")] pub imu_connected: bool,
    #[serde(rename="BMPConnected", alias="BMPconnected")] pub bmp_connected: bool,

    #[serde(rename="CPUTemp")]                  pub cpu_temp: f64,
    #[serde(rename="CPUTempMax")]               pub cpu_temp_max: f64,

    #[serde(skip)]
    pub changed: bool,
}

impl Default for StratuxStatus {
    fn default()->Self {
        StratuxStatus {
            version: "0.0".to_string(),
            devices: 0,
            uat_connected: false,
            uat_messages_last_minute: 0,
            uat_messages_max: 0,
            es_messages_last_minute: 0,
            es_messages_max: 0,
            ogn_connected: false,
            ogn_messages_last_minute: 0,
            ogn_messages_max: 0,
            ogn_noise_db: 0.0,
            ogn_gain_db: 0.0,
            gps_connected: false,
            gps_satellites_locked: 0,
            gps_satellites_tracked: 0,
            gps_satellites_seen: 0,
            gps_position_accuracy: 0.0,
            imu_connected: false,
            bmp_connected: false,
            cpu_temp: -300.0, // no reading
            cpu_temp_max: -300.0,
            changed: true,
        }
    }
}

impl StratuxStatus {
    /// parse a status record. Every record replaces the previous one, hence it is always changed
    pub fn from_json (json: &str)->crate::Result<Self> {
        let mut status: StratuxStatus = serde_json::from_str(json)?;
        status.changed = true;
        Ok(status)
    }

    pub fn has_cpu_temp (&self)->bool { self.cpu_temp > -300.0 }
}
