//! Background worker performing the service requests.

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    client::ApiClient,
    form::{CheckRequest, UploadRequest},
};

/// Commands sent from the UI to the worker.
#[derive(Debug)]
pub enum WorkerCmd {
    /// Send a similarity check.
    CheckSimilarity(CheckRequest),
    /// Upload a reference image.
    UploadImage(UploadRequest),
}

/// Events emitted by the worker for UI updates.
#[derive(Clone, Debug)]
pub enum WorkerEvent {
    /// A similarity check settled. Sent exactly once per dispatched check.
    CheckFinished {
        id: Uuid,
        outcome: Result<serde_json::Value, String>,
    },
    /// An upload settled.
    UploadFinished { id: Uuid, outcome: Result<(), String> },
    /// Informational log message.
    Log(String),
}

/// Main worker loop: every command runs as its own task so an upload never
/// waits behind an outstanding check.
pub async fn run(
    mut rx: mpsc::Receiver<WorkerCmd>,
    tx: mpsc::Sender<WorkerEvent>,
    client: ApiClient,
) {
    tracing::info!("worker started");

    while let Some(cmd) = rx.recv().await {
        let client = client.clone();
        let tx = tx.clone();
        match cmd {
            WorkerCmd::CheckSimilarity(req) => {
                tokio::spawn(async move {
                    let ev = check_one(&client, &req, &tx).await;
                    let _ = tx.send(ev).await;
                });
            }
            WorkerCmd::UploadImage(req) => {
                tokio::spawn(async move {
                    let ev = upload_one(&client, &req, &tx).await;
                    let _ = tx.send(ev).await;
                });
            }
        }
    }
    tracing::info!("worker stopped");
}

/// Run one similarity check and turn its outcome into an event.
async fn check_one(
    client: &ApiClient,
    req: &CheckRequest,
    tx: &mpsc::Sender<WorkerEvent>,
) -> WorkerEvent {
    tracing::info!(
        "check start: {} product={} model={}",
        req.id,
        req.product_code,
        req.model.index()
    );
    let _ = tx
        .send(WorkerEvent::Log(format!(
            "checking {} with {}",
            req.product_code,
            req.model.label()
        )))
        .await;

    let outcome = match client.check_similarity(req).await {
        Ok(body) => {
            tracing::info!("check done: {}", req.id);
            Ok(body)
        }
        Err(e) => {
            tracing::error!("check failed: {}: {e:?}", req.id);
            Err(e.to_string())
        }
    };
    WorkerEvent::CheckFinished {
        id: req.id,
        outcome,
    }
}

/// Run one upload and turn its outcome into an event.
async fn upload_one(
    client: &ApiClient,
    req: &UploadRequest,
    tx: &mpsc::Sender<WorkerEvent>,
) -> WorkerEvent {
    tracing::info!("upload start: {} product={}", req.id, req.product_code);
    let _ = tx
        .send(WorkerEvent::Log(format!(
            "uploading {} for {}",
            req.image.display(),
            req.product_code
        )))
        .await;

    let outcome = match client.add_image(req).await {
        Ok(()) => {
            tracing::info!("upload done: {}", req.id);
            Ok(())
        }
        Err(e) => {
            tracing::error!("upload failed: {}: {e:?}", req.id);
            Err(e.to_string())
        }
    };
    WorkerEvent::UploadFinished {
        id: req.id,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::ModelChoice;
    use std::path::PathBuf;

    async fn next_finished(rx: &mut mpsc::Receiver<WorkerEvent>) -> WorkerEvent {
        loop {
            match rx.recv().await.expect("worker closed") {
                WorkerEvent::Log(_) => continue,
                ev => return ev,
            }
        }
    }

    #[tokio::test]
    async fn test_check_failure_still_reports() {
        let (tx_cmd, rx_cmd) = mpsc::channel(4);
        let (tx_ev, mut rx_ev) = mpsc::channel(16);
        tokio::spawn(run(rx_cmd, tx_ev, ApiClient::new("http://127.0.0.1:1")));

        let id = Uuid::new_v4();
        tx_cmd
            .send(WorkerCmd::CheckSimilarity(CheckRequest {
                id,
                product_code: "P-1".into(),
                image: PathBuf::from("/definitely/missing.png"),
                model: ModelChoice::MobileNet,
            }))
            .await
            .unwrap();

        match next_finished(&mut rx_ev).await {
            WorkerEvent::CheckFinished { id: got, outcome } => {
                assert_eq!(got, id);
                assert!(outcome.unwrap_err().contains("missing.png"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upload_reports_server_failure() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/add_image/")
            .with_status(500)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("x.png");
        std::fs::write(&image, b"img").unwrap();

        let (tx_cmd, rx_cmd) = mpsc::channel(4);
        let (tx_ev, mut rx_ev) = mpsc::channel(16);
        tokio::spawn(run(rx_cmd, tx_ev, ApiClient::new(server.url())));

        tx_cmd
            .send(WorkerCmd::UploadImage(UploadRequest {
                id: Uuid::new_v4(),
                product_code: "P-1".into(),
                image,
            }))
            .await
            .unwrap();

        match next_finished(&mut rx_ev).await {
            WorkerEvent::UploadFinished { outcome, .. } => {
                assert_eq!(outcome.unwrap_err(), "Failed to upload file");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
