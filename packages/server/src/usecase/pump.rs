//! UseCase: 接続ポンプ
//!
//! Every accepted socket gets two tasks. The inbound loop reads, decodes and
//! submits to the room's session; the outbound loop is the only writer on the
//! socket and interleaves queued frames with keepalive pings. Either loop
//! ending cancels the connection's token, which stops the other one.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::mpsc,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    config::ChatConfig,
    domain::{ConnectionId, Frame, RoomId, SocketSink, SocketStream},
    infrastructure::dto::decode_message,
    shutdown::ShutdownCoordinator,
};

use super::{
    error::SessionError,
    session::{ConnectionHandle, Outbound, Session},
};

/// Register a socket with `session` and start its pump.
///
/// The history snapshot is queued before either loop runs, so it is always the
/// first frame the peer sees.
pub async fn start_connection<S, R>(
    session: Arc<Session>,
    mut sink: S,
    stream: R,
    config: &ChatConfig,
    shutdown: &ShutdownCoordinator,
) -> Result<ConnectionId, SessionError>
where
    S: SocketSink + 'static,
    R: SocketStream + 'static,
{
    if shutdown.is_shutting_down() {
        let _ = sink.close().await;
        return Err(SessionError::Cancelled);
    }

    let closer = shutdown.child_token();
    let (handle, outbox) = ConnectionHandle::new(config.outbound_queue_capacity, closer.clone());
    let id = handle.id();
    if let Err(e) = session.attach(handle).await {
        let _ = sink.close().await;
        return Err(e);
    }

    tracing::info!(
        room_id = %session.room_id(),
        connection_id = %id,
        "Connection accepted"
    );

    shutdown.spawn(outbound_loop(
        OutboundContext {
            room_id: session.room_id(),
            id,
            ping_period: config.ping_period(),
            write_timeout: config.write_timeout,
        },
        sink,
        outbox,
        closer.clone(),
    ));
    shutdown.spawn(inbound_loop(
        InboundContext {
            session,
            id,
            read_timeout: config.read_timeout,
            max_message_size: config.max_message_size,
        },
        stream,
        closer,
    ));

    Ok(id)
}

struct OutboundContext {
    room_id: RoomId,
    id: ConnectionId,
    ping_period: Duration,
    write_timeout: Duration,
}

async fn outbound_loop<S: SocketSink>(
    ctx: OutboundContext,
    mut sink: S,
    mut outbox: mpsc::Receiver<Outbound>,
    closer: CancellationToken,
) {
    let mut ping = time::interval_at(Instant::now() + ctx.ping_period, ctx.ping_period);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let frame = tokio::select! {
            biased;
            _ = closer.cancelled() => break,
            item = outbox.recv() => match item {
                Some(Outbound::Text(text)) => Frame::Text(text),
                Some(Outbound::Close) | None => break,
            },
            _ = ping.tick() => Frame::Ping,
        };

        let is_ping = frame == Frame::Ping;
        match time::timeout(ctx.write_timeout, sink.send(frame)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(
                    room_id = %ctx.room_id,
                    connection_id = %ctx.id,
                    ping = is_ping,
                    "Write failed: {}",
                    e
                );
                break;
            }
            Err(_) => {
                tracing::warn!(
                    room_id = %ctx.room_id,
                    connection_id = %ctx.id,
                    ping = is_ping,
                    "Write timed out"
                );
                break;
            }
        }
    }

    closer.cancel();
    if time::timeout(ctx.write_timeout, sink.send(Frame::Close))
        .await
        .is_err()
    {
        tracing::debug!(connection_id = %ctx.id, "Close frame timed out");
    }
    if let Ok(Err(e)) = time::timeout(ctx.write_timeout, sink.close()).await {
        tracing::debug!(connection_id = %ctx.id, "Failed to close socket: {}", e);
    }
    tracing::debug!(room_id = %ctx.room_id, connection_id = %ctx.id, "Outbound loop finished");
}

struct InboundContext {
    session: Arc<Session>,
    id: ConnectionId,
    read_timeout: Duration,
    max_message_size: usize,
}

async fn inbound_loop<R: SocketStream>(
    ctx: InboundContext,
    mut stream: R,
    closer: CancellationToken,
) {
    let room_id = ctx.session.room_id();
    let mut deadline = Instant::now() + ctx.read_timeout;

    loop {
        let frame = tokio::select! {
            biased;
            _ = closer.cancelled() => break,
            read = time::timeout_at(deadline, stream.recv()) => match read {
                Ok(Some(Ok(frame))) => frame,
                Ok(Some(Err(e))) => {
                    tracing::warn!(room_id = %room_id, connection_id = %ctx.id, "Read failed: {}", e);
                    break;
                }
                Ok(None) => {
                    tracing::debug!(room_id = %room_id, connection_id = %ctx.id, "Peer went away");
                    break;
                }
                Err(_) => {
                    tracing::info!(
                        room_id = %room_id,
                        connection_id = %ctx.id,
                        "No pong within {:?}, dropping connection",
                        ctx.read_timeout
                    );
                    break;
                }
            },
        };

        match frame {
            Frame::Pong => deadline = Instant::now() + ctx.read_timeout,
            // Answered by the transport
            Frame::Ping => {}
            Frame::Close => {
                tracing::debug!(room_id = %room_id, connection_id = %ctx.id, "Peer requested close");
                break;
            }
            Frame::Text(text) => {
                if text.len() > ctx.max_message_size {
                    tracing::warn!(
                        room_id = %room_id,
                        connection_id = %ctx.id,
                        size = text.len(),
                        limit = ctx.max_message_size,
                        "Frame exceeds size limit"
                    );
                    break;
                }

                let message = match decode_message(&text) {
                    Ok(message) => message,
                    Err(e) => {
                        tracing::debug!(
                            room_id = %room_id,
                            connection_id = %ctx.id,
                            "Dropping malformed message: {}",
                            e
                        );
                        continue;
                    }
                };

                // Blocks while the session queue is full
                let submitted = tokio::select! {
                    biased;
                    _ = closer.cancelled() => Err(SessionError::Cancelled),
                    result = ctx.session.submit(ctx.id, message) => result,
                };
                if let Err(e) = submitted {
                    tracing::debug!(room_id = %room_id, connection_id = %ctx.id, "Stop reading: {}", e);
                    break;
                }
            }
        }
    }

    ctx.session.detach(ctx.id).await;
    closer.cancel();
    tracing::debug!(room_id = %room_id, connection_id = %ctx.id, "Inbound loop finished");
}
