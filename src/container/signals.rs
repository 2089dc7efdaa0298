//! Marker files the cluster scripts drop into the shared signal directory.

use std::path::PathBuf;

use super::state::DetailedState;

const UPDATING_LOCK: &str = "updating.lock";
const MAINTENANCE_LOCK: &str = "maintenance.lock";
const UPDATE_REQUEST: &str = "update.request";

fn waiting_flag(port: u16) -> String {
    format!("waiting_{}.flag", port)
}

#[derive(Debug, Clone)]
pub struct SignalDir {
    dir: PathBuf,
}

/// Cluster-wide markers, read once per status request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClusterSignals {
    pub updating: bool,
    pub maintenance: bool,
    pub update_requested: bool,
}

impl SignalDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn exists(&self, name: &str) -> bool {
        self.dir.join(name).exists()
    }

    pub fn cluster_signals(&self) -> ClusterSignals {
        if !self.dir.exists() {
            return ClusterSignals::default();
        }
        ClusterSignals {
            updating: self.exists(UPDATING_LOCK),
            maintenance: self.exists(MAINTENANCE_LOCK),
            update_requested: self.exists(UPDATE_REQUEST),
        }
    }

    /// UPDATING > MAINTENANCE > UPDATE REQ > per-unit WAITING.
    pub fn overlay(&self, signals: ClusterSignals, port: Option<u16>) -> Option<DetailedState> {
        if signals.updating {
            Some(DetailedState::Updating)
        } else if signals.maintenance {
            Some(DetailedState::Maintenance)
        } else if signals.update_requested {
            Some(DetailedState::UpdateRequested)
        } else if port.is_some_and(|p| self.exists(&waiting_flag(p))) {
            Some(DetailedState::Waiting)
        } else {
            None
        }
    }
}
