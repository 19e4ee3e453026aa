//! Per-connection request handling: one request in, at most one response
//! out, then the connection is closed.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use cadence_protocol::{FramedConn, JobList, ProtocolError, Request};
use cadence_scheduler::Job;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
};
use tracing::{debug, info, warn};

use crate::state::DaemonState;

/// Entry point spawned by the listener for every accepted socket.
pub async fn handle_connection(stream: TcpStream, peer: SocketAddr, state: Arc<DaemonState>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    debug!(conn_id = %conn_id, %peer, "connection accepted");
    serve(stream, &conn_id, &state).await;
    debug!(conn_id = %conn_id, "connection closed");
}

/// Read one request from `io` and act on it.
///
/// Undecodable input, a silent peer, or a peer that hangs up early is
/// logged and the connection is dropped without a reply; no job state
/// changes in any of those cases.
pub async fn serve<S>(io: S, conn_id: &str, state: &DaemonState)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let daemon = &state.config.daemon;
    let mut conn = cadence_protocol::framed(io, daemon.max_frame_bytes);

    let request = match read_request(&mut conn, daemon.read_timeout_ms).await {
        Ok(req) => req,
        Err(e) => {
            warn!(conn_id, error = %e, "failed to decode request");
            return;
        }
    };
    info!(conn_id, kind = request.kind(), "request received");

    let owner = request.owner().map(str::to_string);
    match request {
        Request::Task { task, .. } => {
            let job = Job::new(task.id, task.command, task.interval, task.repeat).with_owner(owner);
            let id = job.id.clone();
            // Fire-and-forget: the controller gets no reply either way.
            if let Err(e) = state.dispatcher.start(job).await {
                warn!(conn_id, job_id = %id, error = %e, "task rejected");
            }
        }
        Request::Stop { task_id } => {
            if let Err(e) = state.dispatcher.stop(task_id.clone()).await {
                warn!(conn_id, job_id = %task_id, error = %e, "stop ignored");
            }
        }
        Request::List { .. } => {
            let ids = state.registry.snapshot_ids(owner.as_deref());
            debug!(conn_id, count = ids.len(), owner = ?owner, "sending job list");
            if let Err(e) = cadence_protocol::send(&mut conn, &JobList(ids)).await {
                warn!(conn_id, error = %e, "failed to send task list");
            }
        }
    }
}

async fn read_request<S>(
    conn: &mut FramedConn<S>,
    timeout_ms: u64,
) -> cadence_protocol::Result<Request>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    tokio::time::timeout(
        Duration::from_millis(timeout_ms),
        cadence_protocol::recv(conn),
    )
    .await
    .map_err(|_| ProtocolError::Timeout { ms: timeout_ms })?
}
