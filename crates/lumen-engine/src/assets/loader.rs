//! Background asset loads.
//!
//! Each request runs on its own thread and reports through one shared
//! channel. The main thread drains it with [`AssetLoader::poll`] once per
//! frame. There is no cancellation; if the loader is dropped, remaining sends
//! fail and are ignored.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

use crate::scene::EnvironmentMap;

use super::error::AssetError;
use super::gltf::{decode_glb, ModelData};
use super::hdr::decode_hdr;
use super::source::{fetch, AssetLocation, LoadProgress};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Environment,
    Model,
}

impl AssetKind {
    pub fn label(self) -> &'static str {
        match self {
            AssetKind::Environment => "environment",
            AssetKind::Model => "model",
        }
    }
}

/// Outcome notifications, in per-request order.
#[derive(Debug)]
pub enum AssetEvent {
    Progress { kind: AssetKind, progress: LoadProgress },
    EnvironmentLoaded(EnvironmentMap),
    ModelLoaded(ModelData),
    Failed { kind: AssetKind, location: String, error: AssetError },
}

pub struct AssetLoader {
    tx: Sender<AssetEvent>,
    rx: Receiver<AssetEvent>,
}

impl Default for AssetLoader {
    fn default() -> Self {
        let (tx, rx) = channel();
        Self { tx, rx }
    }
}

impl AssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts fetching and decoding an equirectangular HDR.
    pub fn load_environment(&self, location: AssetLocation) {
        self.spawn(AssetKind::Environment, location, |bytes, loc| {
            decode_hdr(bytes, loc).map(AssetEvent::EnvironmentLoaded)
        });
    }

    /// Starts fetching and decoding a binary glTF.
    pub fn load_model(&self, location: AssetLocation) {
        self.spawn(AssetKind::Model, location, |bytes, loc| {
            decode_glb(bytes, loc).map(AssetEvent::ModelLoaded)
        });
    }

    /// Sender for injecting events from elsewhere.
    pub fn sender(&self) -> Sender<AssetEvent> {
        self.tx.clone()
    }

    /// Everything received since the last poll. Never blocks.
    pub fn poll(&self) -> Vec<AssetEvent> {
        self.rx.try_iter().collect()
    }

    fn spawn<F>(&self, kind: AssetKind, location: AssetLocation, decode: F)
    where
        F: FnOnce(&[u8], &str) -> Result<AssetEvent, AssetError> + Send + 'static,
    {
        let tx = self.tx.clone();
        let name = location.to_string();
        log::info!("loading {} from {name}", kind.label());

        let job_tx = tx.clone();
        let job_name = name.clone();
        let spawned = thread::Builder::new()
            .name(format!("lumen-{}-loader", kind.label()))
            .spawn(move || {
                let event = run_load(kind, &location, &job_tx, decode).unwrap_or_else(|error| {
                    AssetEvent::Failed { kind, location: job_name, error }
                });
                let _ = job_tx.send(event);
            });

        if let Err(source) = spawned {
            let _ = tx.send(AssetEvent::Failed {
                kind,
                location: name,
                error: AssetError::Spawn { source },
            });
        }
    }
}

fn run_load<F>(
    kind: AssetKind,
    location: &AssetLocation,
    tx: &Sender<AssetEvent>,
    decode: F,
) -> Result<AssetEvent, AssetError>
where
    F: FnOnce(&[u8], &str) -> Result<AssetEvent, AssetError>,
{
    // Only whole-percent changes are forwarded.
    let mut last_percent = None;
    let bytes = fetch(location, &mut |progress| {
        let percent = progress.percent();
        if percent.is_none() || percent != last_percent {
            last_percent = percent;
            let _ = tx.send(AssetEvent::Progress { kind, progress });
        }
    })?;

    decode(&bytes, &location.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    fn wait_for<F: Fn(&AssetEvent) -> bool>(loader: &AssetLoader, done: F) -> Vec<AssetEvent> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut all = Vec::new();
        while Instant::now() < deadline {
            let batch = loader.poll();
            let finished = batch.iter().any(&done);
            all.extend(batch);
            if finished {
                return all;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("loader never finished");
    }

    #[test]
    fn missing_file_reports_failure() {
        let loader = AssetLoader::new();
        loader.load_model(AssetLocation::File(PathBuf::from("no/such/logo.glb")));

        let events = wait_for(&loader, |e| matches!(e, AssetEvent::Failed { .. }));
        let failed = events.iter().find_map(|e| match e {
            AssetEvent::Failed { kind, error, .. } => Some((*kind, error)),
            _ => None,
        });
        assert!(matches!(failed, Some((AssetKind::Model, AssetError::Read { .. }))));
    }

    #[test]
    fn poll_is_empty_without_requests() {
        assert!(AssetLoader::new().poll().is_empty());
    }

    #[test]
    fn injected_events_are_delivered_in_order() {
        let loader = AssetLoader::new();
        let tx = loader.sender();
        for loaded in [10, 20] {
            tx.send(AssetEvent::Progress {
                kind: AssetKind::Model,
                progress: LoadProgress { loaded, total: Some(20) },
            })
            .unwrap();
        }
        let got: Vec<u64> = loader
            .poll()
            .into_iter()
            .filter_map(|e| match e {
                AssetEvent::Progress { progress, .. } => Some(progress.loaded),
                _ => None,
            })
            .collect();
        assert_eq!(got, [10, 20]);
    }
}
