// Copyright 2026 xfercore contributors.

//! The external execution engine interface: the core only produces and
//! submits [`crate::transfer::JobPartOrderRequest`]s; the engine
//! persists and executes them. The on-disk job-plan format, retries on
//! data-plane I/O, and block/page chunking are entirely the engine's
//! concern.

use std::sync::Mutex;

use crate::error::Result;
use crate::transfer::JobPartOrderRequest;

/// A handle to a submitted job, opaque to the core.
pub trait JobManager: Send + Sync {
    fn job_id(&self) -> &str;
}

/// The collaborator that actually moves bytes. Implemented outside this
/// crate; `xfercore` depends only on this trait.
pub trait ExecutionEngine: Send + Sync {
    fn submit_part(&self, part: JobPartOrderRequest) -> Result<()>;

    /// Resume a previously-submitted job, e.g. after a client restart.
    /// Returns whether a matching job was found.
    fn resurrect_job(&self, job_id: &str, sas: Option<&str>) -> bool;

    fn get_job_manager(&self, job_id: &str) -> Option<Box<dyn JobManager>>;
}

/// Discards every part; useful for dry runs, planning-only invocations,
/// and as the `xfer` CLI's default engine since a real worker pool is
/// out of scope for this crate.
pub struct NullExecutionEngine;

impl ExecutionEngine for NullExecutionEngine {
    fn submit_part(&self, _part: JobPartOrderRequest) -> Result<()> {
        Ok(())
    }

    fn resurrect_job(&self, _job_id: &str, _sas: Option<&str>) -> bool {
        false
    }

    fn get_job_manager(&self, _job_id: &str) -> Option<Box<dyn JobManager>> {
        None
    }
}

/// Records every submitted part in memory, so tests can assert on what
/// the enumerator planned without a real engine.
#[derive(Default)]
pub struct RecordingExecutionEngine {
    parts: Mutex<Vec<JobPartOrderRequest>>,
}

impl RecordingExecutionEngine {
    pub fn parts(&self) -> Vec<JobPartOrderRequest> {
        self.parts.lock().unwrap().clone()
    }

    pub fn transfer_count(&self) -> usize {
        self.parts.lock().unwrap().iter().map(|p| p.transfers.len()).sum()
    }
}

impl ExecutionEngine for RecordingExecutionEngine {
    fn submit_part(&self, part: JobPartOrderRequest) -> Result<()> {
        self.parts.lock().unwrap().push(part);
        Ok(())
    }

    fn resurrect_job(&self, _job_id: &str, _sas: Option<&str>) -> bool {
        false
    }

    fn get_job_manager(&self, _job_id: &str) -> Option<Box<dyn JobManager>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::CredentialInfo;
    use crate::location::{FromTo, Location};
    use crate::transfer::TransferOptions;

    fn sample_part(part_number: u32, is_final: bool) -> JobPartOrderRequest {
        JobPartOrderRequest {
            job_id: "job-1".to_string(),
            part_number,
            from_to: FromTo::new(Location::Local, Location::Blob).unwrap(),
            source_root: "/data".to_string(),
            destination_root: "https://acct.blob.core.windows.net/c".to_string(),
            credentials_src: CredentialInfo::Anonymous,
            credentials_dst: CredentialInfo::Anonymous,
            transfers: Vec::new(),
            is_final_part: is_final,
            options: TransferOptions::default(),
        }
    }

    #[test]
    fn null_engine_discards_parts() {
        let engine = NullExecutionEngine;
        engine.submit_part(sample_part(0, true)).unwrap();
    }

    #[test]
    fn recording_engine_keeps_submitted_parts() {
        let engine = RecordingExecutionEngine::default();
        engine.submit_part(sample_part(0, false)).unwrap();
        engine.submit_part(sample_part(1, true)).unwrap();
        assert_eq!(engine.parts().len(), 2);
    }
}
