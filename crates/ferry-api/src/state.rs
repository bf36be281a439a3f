//! Shared handler state.

use std::path::PathBuf;

use ferry_fsops::{DirectoryIndex, TransferEngine};
use ferry_telemetry::Metrics;

use crate::http::access::AccessControl;

pub(crate) struct ApiState {
    pub(crate) index: DirectoryIndex,
    pub(crate) engine: TransferEngine,
    pub(crate) access: AccessControl,
    pub(crate) telemetry: Metrics,
    pub(crate) static_dir: PathBuf,
}

impl ApiState {
    pub(crate) fn new(
        engine: TransferEngine,
        access: AccessControl,
        telemetry: Metrics,
        static_dir: PathBuf,
    ) -> Self {
        Self {
            index: engine.index().clone(),
            engine,
            access,
            telemetry,
            static_dir,
        }
    }
}
