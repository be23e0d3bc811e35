use tracing::info;

use crate::output;
use crate::runtime_setup;

/// Serves the HTTP demo (`POST /tasks/:name/schedule`, `GET
/// /tasks/:name/read`) while an in-process worker loop drains the same
/// runtime concurrently — the only way for a single demo binary to let
/// an HTTP-scheduled call actually get computed, since the in-memory
/// backend isn't shared across processes.
pub async fn run(addr: String) -> anyhow::Result<()> {
    let rt = runtime_setup::build()?;
    let app = recur_http::router(rt.recur.clone());

    let worker_queue = rt.queue.clone();
    let worker_recur = rt.recur.clone();
    let worker = tokio::spawn(async move { worker_recur.wrrrk().await });

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    output::success(format!("listening on http://{addr}"));
    output::dim("POST /tasks/:name/schedule   body: JSON args");
    output::dim("GET  /tasks/:name/read       query: ?args=<JSON>");

    let shutdown = async move {
        let _ = tokio::signal::ctrl_c().await;
        worker_queue.close();
    };
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

    match worker.await {
        Ok(Ok(())) => info!("worker loop exited cleanly"),
        Ok(Err(e)) => output::error(format!("worker loop exited with an error: {e}")),
        Err(e) => output::error(format!("worker task panicked: {e}")),
    }
    Ok(())
}
