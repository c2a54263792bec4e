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

//! resilient websocket subscriptions. A `ConnectionChannel` never returns to its caller except on cancellation,
//! all network errors are logged and retried

use std::time::Duration;
use futures::StreamExt;
use tokio::{net::TcpStream, select, time::{sleep, timeout}};
use tokio_tungstenite::{connect_async, WebSocketStream, MaybeTlsStream, tungstenite::protocol::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::config::Timing;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// the shared connected flag. Only the watchdog and the situation channel mark the link as down, all
/// channels use it to decide if a silent connection should be re-established
pub trait LinkStatus: Send + Sync {
    fn is_connected (&self)->bool;
    fn mark_disconnected (&self);
}

/// how a connected session ended
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
enum SessionEnd {
    Cancelled,
    Closed,  // closed by server or silent while link is down
    Failed,  // protocol or IO error
}

#[derive(Debug,Clone)]
pub struct ConnectionChannel {
    pub name: String,
    pub url: String,
    pub timing: Timing,
    pub marks_link: bool, // connection failures mark the link as disconnected
}

impl ConnectionChannel {
    pub fn new (name: impl ToString, url: impl ToString, timing: Timing)->Self {
        ConnectionChannel { name: name.to_string(), url: url.to_string(), timing, marks_link: false }
    }

    pub fn marking_link (mut self)->Self {
        self.marks_link = true;
        self
    }

    /// connect and feed all text messages to `on_message` until `cancel` is triggered
    pub async fn run<L,F> (&self, link: &L, cancel: &CancellationToken, mut on_message: F)
        where L: LinkStatus + ?Sized, F: FnMut(&str)
    {
        debug!("{} waiting for {}", self.name, self.url);

        loop {
            let res = select! {
                _ = cancel.cancelled() => break,
                res = connect_async( self.url.as_str()) => res
            };

            let backoff = match res {
                Ok((ws,_)) => {
                    info!("{} connected to {}", self.name, self.url);
                    match self.listen( ws, link, cancel, &mut on_message).await {
                        SessionEnd::Cancelled => break,
                        SessionEnd::Closed => self.timing.lost_connection,
                        SessionEnd::Failed => self.connection_failed( link)
                    }
                }
                Err(e) => {
                    debug!("{} failed to connect: {e}", self.name);
                    self.connection_failed( link)
                }
            };

            trace!("{} reconnecting in {:?}", self.name, backoff);
            if !pause( backoff, cancel).await { break }
        }

        debug!("{} shutting down", self.name);
    }

    fn connection_failed<L: LinkStatus + ?Sized> (&self, link: &L)->Duration {
        if self.marks_link && link.is_connected() {
            info!("{} lost connection", self.name);
            link.mark_disconnected();
        }
        self.timing.retry
    }

    async fn listen<L,F> (&self, mut ws: WsStream, link: &L, cancel: &CancellationToken, on_message: &mut F)->SessionEnd
        where L: LinkStatus + ?Sized, F: FnMut(&str)
    {
        loop {
            let next = select! {
                _ = cancel.cancelled() => {
                    self.close( &mut ws).await;
                    return SessionEnd::Cancelled
                }
                next = timeout( self.timing.check_connection, ws.next()) => next
            };

            match next {
                Err(_) => { // a timeout alone is not a disconnect, that is the watchdog's business
                    debug!("{} timeout waiting for message", self.name);
                    if !link.is_connected() {
                        debug!("{} link is down, reconnecting", self.name);
                        self.close( &mut ws).await;
                        return SessionEnd::Closed
                    }
                }
                Ok(None) | Ok(Some(Ok(Message::Close(_)))) => {
                    debug!("{} connection closed", self.name);
                    return SessionEnd::Closed
                }
                Ok(Some(Err(e))) => {
                    debug!("{} websocket error: {e}", self.name);
                    return SessionEnd::Failed
                }
                Ok(Some(Ok(Message::Text(txt)))) => on_message( txt.as_str()),
                Ok(Some(Ok(_))) => {} // ignore binary, ping and pong
            }

            tokio::task::yield_now().await;
        }
    }

    async fn close (&self, ws: &mut WsStream) {
        if let Err(e) = timeout( self.timing.lost_connection, ws.close(None)).await {
            trace!("{} close timed out: {e}", self.name);
        }
    }
}

/// cancellable sleep, returns false if cancelled
pub async fn pause (duration: Duration, cancel: &CancellationToken)->bool {
    select! {
        _ = cancel.cancelled() => false,
        _ = sleep( duration) => true
    }
}
