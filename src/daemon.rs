//! Blocking HTTP client for the model-runner daemon.

use std::io::{BufRead, BufReader};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::FlowError;
use crate::model::{InstalledModel, ProgressUpdate, RunningModel};

/// Events the pull thread forwards into the foreground render loop.
/// A `Progress` record with the `success` status or a `Failed` event is
/// always the last thing sent for one pull.
#[derive(Clone, Debug)]
pub enum PullEvent {
    Progress(ProgressUpdate),
    Failed(String),
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<InstalledModel>,
}

#[derive(Deserialize)]
struct PsResponse {
    #[serde(default)]
    models: Vec<RunningModel>,
}

#[derive(Clone)]
pub struct DaemonClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl DaemonClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("modelman")
            .timeout(Duration::from_secs(30))
            .build()
            .context("build http client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    /// Cheap reachability probe, used once at startup.
    pub fn ping(&self) -> Result<()> {
        self.client
            .get(self.url("tags"))
            .timeout(Duration::from_secs(3))
            .send()
            .with_context(|| format!("daemon unreachable at {}", self.base_url))?
            .error_for_status()
            .context("daemon probe status")?;
        Ok(())
    }

    pub fn list_installed(&self) -> Result<Vec<InstalledModel>> {
        let resp: TagsResponse = self
            .client
            .get(self.url("tags"))
            .send()
            .context("list installed models")?
            .error_for_status()
            .context("list installed models status")?
            .json()
            .context("parse installed models")?;
        Ok(resp.models)
    }

    pub fn list_running(&self) -> Result<Vec<RunningModel>> {
        let resp: PsResponse = self
            .client
            .get(self.url("ps"))
            .send()
            .context("list running models")?
            .error_for_status()
            .context("list running models status")?
            .json()
            .context("parse running models")?;
        Ok(resp.models)
    }

    /// Remove a model from the daemon's disk. A 404 maps to the distinct
    /// not-found condition; other failure codes stay generic.
    pub fn delete(&self, name: &str) -> Result<()> {
        let resp = self
            .client
            .delete(self.url("delete"))
            .json(&serde_json::json!({ "name": name }))
            .send()
            .context("delete model")?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(FlowError::ModelNotFound(name.to_string()).into());
        }
        resp.error_for_status().context("delete model status")?;
        Ok(())
    }

    /// Control how long a model stays resident: negative keeps it loaded
    /// indefinitely, zero unloads it immediately.
    pub fn keep_alive(&self, name: &str, seconds: i64) -> Result<()> {
        self.client
            .post(self.url("generate"))
            .json(&serde_json::json!({
                "model": name,
                "keep_alive": seconds,
                "stream": false,
            }))
            .timeout(Duration::from_secs(120))
            .send()
            .context("keep-alive request")?
            .error_for_status()
            .context("keep-alive status")?;
        Ok(())
    }

    /// Start pulling a model on a background thread. Each stream record is
    /// forwarded over the returned channel in daemon emission order; the
    /// thread stops at the `success` record, a transport error (no retry),
    /// or once the receiver is dropped.
    pub fn start_pull(&self, name: &str) -> Receiver<PullEvent> {
        let (tx, rx) = sync_channel(64);
        let client = self.client.clone();
        let url = self.url("pull");
        let name = name.to_string();
        std::thread::spawn(move || pull_stream(client, url, name, tx));
        rx
    }
}

fn pull_stream(
    client: reqwest::blocking::Client,
    url: String,
    name: String,
    tx: SyncSender<PullEvent>,
) {
    let resp = client
        .post(url)
        .json(&serde_json::json!({ "name": name }))
        // Pulls run for as long as the download takes.
        .timeout(Duration::from_secs(6 * 60 * 60))
        .send()
        .and_then(|r| r.error_for_status());

    let resp = match resp {
        Ok(resp) => resp,
        Err(err) => {
            let _ = tx.send(PullEvent::Failed(format!("pull request: {err}")));
            return;
        }
    };

    let reader = BufReader::new(resp);
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                let _ = tx.send(PullEvent::Failed(format!("pull stream: {err}")));
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let update: ProgressUpdate = match serde_json::from_str(&line) {
            Ok(update) => update,
            Err(err) => {
                let _ = tx.send(PullEvent::Failed(format!("pull record: {err}")));
                return;
            }
        };

        let done = update.is_success();
        if tx.send(PullEvent::Progress(update)).is_err() {
            // Foreground loop went away (user quit); outcome is discarded.
            return;
        }
        if done {
            return;
        }
    }

    let _ = tx.send(PullEvent::Failed(
        "pull stream ended before success".to_string(),
    ));
}
