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

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OdinRadarError>;

/// odin_radar specific error type. Errors are mostly consumed by logging (the engine retries on its own),
/// hence we keep this Clone and map third party errors into opaque variants that only store the message
#[derive(Error,Debug,Clone)]
pub enum OdinRadarError {
    #[error("IO error {0}")]
    IOError(String),

    #[error("config error {0}")]
    ConfigError(String),

    #[error("JSON error {0}")]
    JsonError(String),

    #[error("http error {0}")]
    HttpError(String),

    #[error("time parse error {0}")]
    TimeParseError(String),

    #[error("command error {0}")]
    CommandError(String),

    #[error("timeout error {0}")]
    TimeoutError(String),

    /// a generic error
    #[error("operation failed {0}")]
    OpFailed(String)
}

macro_rules! map_to_opaque_error {
    ($from_error:ty => $to_error:ident :: $variant:ident) => {
        impl From<$from_error> for $to_error {
            fn from (e: $from_error)->Self { $to_error :: $variant ( e.to_string()) }
        }
    };
}

map_to_opaque_error!{ std::io::Error => OdinRadarError::IOError }
map_to_opaque_error!{ serde_json::Error => OdinRadarError::JsonError }
map_to_opaque_error!{ ron::error::SpannedError => OdinRadarError::ConfigError }
map_to_opaque_error!{ reqwest::Error => OdinRadarError::HttpError }
map_to_opaque_error!{ chrono::ParseError => OdinRadarError::TimeParseError }
map_to_opaque_error!{ tokio::time::error::Elapsed => OdinRadarError::TimeoutError }

pub fn op_failed (msg: impl ToString)->OdinRadarError {
    OdinRadarError::OpFailed(msg.to_string())
}

pub fn config_error (msg: impl ToString)->OdinRadarError {
    OdinRadarError::ConfigError(msg.to_string())
}

pub fn command_error (msg: impl ToString)->OdinRadarError {
    OdinRadarError::CommandError(msg.to_string())
}
