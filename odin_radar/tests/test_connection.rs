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

use std::{sync::{Arc, Mutex, atomic::{AtomicBool, AtomicUsize, Ordering}}, time::{Duration, Instant}};
use futures_util::SinkExt;
use tokio::{net::TcpListener, time::{sleep, timeout}};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;

use odin_radar::{ConnectionChannel, LinkStatus, config::Timing};

/// run with "cargo test --test test_connection -- --nocapture"

struct TestLink {
    connected: AtomicBool,
}

impl TestLink {
    fn new (connected: bool)->Self { TestLink { connected: AtomicBool::new(connected) } }
}

impl LinkStatus for TestLink {
    fn is_connected (&self)->bool { self.connected.load( Ordering::Relaxed) }
    fn mark_disconnected (&self) { self.connected.store( false, Ordering::Relaxed) }
}

fn fast_timing ()->Timing {
    Timing {
        retry: Duration::from_millis(50),
        lost_connection: Duration::from_millis(50),
        check_connection: Duration::from_millis(200),
        ..Default::default()
    }
}

/// serve `n` text messages per connection, then close the connection
async fn serve (listener: TcpListener, n: usize, connections: Arc<AtomicUsize>) {
    while let Ok((stream,_)) = listener.accept().await {
        let connections = connections.clone();
        tokio::spawn( async move {
            let Ok(mut ws) = accept_async( stream).await else { return };
            let i = connections.fetch_add( 1, Ordering::Relaxed);
            for j in 0..n {
                if ws.send( Message::text( format!("{i}:{j}"))).await.is_err() { return }
            }
            let _ = ws.close( None).await;
        });
    }
}

#[tokio::test]
async fn test_ordered_delivery_and_reconnect () {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/traffic", listener.local_addr().unwrap());
    let connections = Arc::new( AtomicUsize::new(0));
    tokio::spawn( serve( listener, 3, connections.clone()));

    let link = TestLink::new( true);
    let cancel = CancellationToken::new();
    let channel = ConnectionChannel::new( "traffic", url, fast_timing());
    let received = Arc::new( Mutex::new( Vec::<String>::new()));

    {
        let cancel = cancel.clone();
        let received = received.clone();
        tokio::spawn( async move {
            for _ in 0..100 {
                sleep( Duration::from_millis(20)).await;
                if received.lock().unwrap().len() >= 6 { break }
            }
            cancel.cancel();
        });
    }

    let recv = received.clone();
    let res = timeout( Duration::from_secs(5), channel.run( &link, &cancel, |msg| recv.lock().unwrap().push( msg.to_string()))).await;
    assert!( res.is_ok(), "channel did not terminate on cancel");

    let received = received.lock().unwrap();
    println!("received: {received:?}");
    assert!( received.len() >= 6);
    assert_eq!( &received[0..6], &["0:0", "0:1", "0:2", "1:0", "1:1", "1:2"]);
    assert!( connections.load( Ordering::Relaxed) >= 2);
    assert!( link.is_connected()); // server close is not a link failure
}

#[tokio::test]
async fn test_unreachable () {
    // grab a free port and release it again
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let url = format!("ws://{addr}/situation");

    let link = TestLink::new( true);
    let cancel = CancellationToken::new();
    let timing = Timing { retry: Duration::from_secs(60), ..fast_timing() };
    let channel = ConnectionChannel::new( "situation", url, timing).marking_link();

    {
        let cancel = cancel.clone();
        tokio::spawn( async move {
            sleep( Duration::from_millis(300)).await;
            cancel.cancel();
        });
    }

    let t0 = Instant::now();
    let res = timeout( Duration::from_secs(5), channel.run( &link, &cancel, |_| {})).await;
    assert!( res.is_ok(), "cancel did not interrupt retry wait");
    println!("terminated after {:?}", t0.elapsed());
    assert!( t0.elapsed() < Duration::from_secs(5));
    assert!( !link.is_connected());
}

#[tokio::test]
async fn test_silent_link_down () {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/status", listener.local_addr().unwrap());
    let connections = Arc::new( AtomicUsize::new(0));

    { // accept but never send anything
        let connections = connections.clone();
        tokio::spawn( async move {
            while let Ok((stream,_)) = listener.accept().await {
                let connections = connections.clone();
                tokio::spawn( async move {
                    let Ok(mut ws) = accept_async( stream).await else { return };
                    connections.fetch_add( 1, Ordering::Relaxed);
                    use futures_util::StreamExt;
                    while let Some(Ok(_)) = ws.next().await {}
                });
            }
        });
    }

    let link = TestLink::new( false);
    let cancel = CancellationToken::new();
    let channel = ConnectionChannel::new( "status", url, fast_timing());
    {
        let cancel = cancel.clone();
        tokio::spawn( async move {
            sleep( Duration::from_millis(1000)).await;
            cancel.cancel();
        });
    }

    let res = timeout( Duration::from_secs(5), channel.run( &link, &cancel, |_| {})).await;
    assert!( res.is_ok());
    let n = connections.load( Ordering::Relaxed);
    println!("{n} connections while link was down");
    assert!( n >= 2); // re-established after each check timeout
}
