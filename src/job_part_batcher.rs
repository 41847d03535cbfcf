// Copyright 2026 xfercore contributors.

//! Accumulates planned transfers into fixed-size parts and dispatches
//! them to the execution engine.

use std::sync::Arc;
use std::sync::Mutex;

use crate::credential::CredentialInfo;
use crate::engine::ExecutionEngine;
use crate::error::Result;
use crate::location::FromTo;
use crate::transfer::{CopyTransfer, JobPartOrderRequest, TransferOptions};

struct State {
    part_number: u32,
    transfers: Vec<CopyTransfer>,
}

/// All `add_transfer`/`dispatch_final_part` calls are serialized under a
/// single lock; dispatch itself may block on the engine.
pub struct JobPartBatcher {
    job_id: String,
    from_to: FromTo,
    source_root: String,
    destination_root: String,
    credentials_src: CredentialInfo,
    credentials_dst: CredentialInfo,
    options: TransferOptions,
    part_size: usize,
    engine: Arc<dyn ExecutionEngine>,
    state: Mutex<State>,
}

impl JobPartBatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        job_id: String,
        from_to: FromTo,
        source_root: String,
        destination_root: String,
        credentials_src: CredentialInfo,
        credentials_dst: CredentialInfo,
        options: TransferOptions,
        part_size: usize,
        engine: Arc<dyn ExecutionEngine>,
    ) -> Self {
        JobPartBatcher {
            job_id,
            from_to,
            source_root,
            destination_root,
            credentials_src,
            credentials_dst,
            options,
            part_size: part_size.max(1),
            engine,
            state: Mutex::new(State {
                part_number: 0,
                transfers: Vec::new(),
            }),
        }
    }

    /// Queue one transfer, dispatching the current part (not final) when
    /// it reaches `part_size`.
    pub fn add_transfer(&self, transfer: CopyTransfer) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.transfers.push(transfer);
        if state.transfers.len() >= self.part_size {
            self.dispatch_locked(&mut state, false)?;
        }
        Ok(())
    }

    /// Submit whatever is buffered as the final part, marking
    /// `is_final_part = true`. Called exactly once per job, even if the
    /// buffer is empty.
    pub fn dispatch_final_part(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        self.dispatch_locked(&mut state, true)
    }

    fn dispatch_locked(&self, state: &mut State, is_final: bool) -> Result<()> {
        let transfers = std::mem::take(&mut state.transfers);
        let part = JobPartOrderRequest {
            job_id: self.job_id.clone(),
            part_number: state.part_number,
            from_to: self.from_to,
            source_root: self.source_root.clone(),
            destination_root: self.destination_root.clone(),
            credentials_src: self.credentials_src.clone(),
            credentials_dst: self.credentials_dst.clone(),
            transfers,
            is_final_part: is_final,
            options: self.options.clone(),
        };
        state.part_number += 1;
        self.engine.submit_part(part)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RecordingExecutionEngine;
    use crate::location::Location;
    use crate::stored_object::{BlobAccessTier, BlobType, EntityType};

    fn sample_transfer(path: &str) -> CopyTransfer {
        CopyTransfer {
            source_path: path.to_string(),
            destination_path: path.to_string(),
            last_modified: None,
            source_size: 1,
            content_type: None,
            content_encoding: None,
            content_disposition: None,
            content_language: None,
            cache_control: None,
            md5: None,
            metadata: Default::default(),
            blob_type: BlobType::NA,
            access_tier: BlobAccessTier::NA,
            entity_type: EntityType::File,
        }
    }

    fn batcher(part_size: usize, engine: Arc<RecordingExecutionEngine>) -> JobPartBatcher {
        JobPartBatcher::new(
            "job-1".to_string(),
            FromTo::new(Location::Local, Location::Blob).unwrap(),
            "/data".to_string(),
            "https://acct.blob.core.windows.net/c".to_string(),
            CredentialInfo::Anonymous,
            CredentialInfo::Anonymous,
            TransferOptions::default(),
            part_size,
            engine,
        )
    }

    #[test]
    fn dispatches_when_part_is_full() {
        let engine = Arc::new(RecordingExecutionEngine::default());
        let batcher = batcher(2, engine.clone());
        batcher.add_transfer(sample_transfer("a")).unwrap();
        batcher.add_transfer(sample_transfer("b")).unwrap();
        assert_eq!(engine.parts().len(), 1);
        assert_eq!(engine.parts()[0].transfers.len(), 2);
        assert!(!engine.parts()[0].is_final_part);
    }

    #[test]
    fn final_part_flushes_remainder_even_if_empty() {
        let engine = Arc::new(RecordingExecutionEngine::default());
        let first_batcher = batcher(10, engine.clone());
        first_batcher.add_transfer(sample_transfer("a")).unwrap();
        first_batcher.dispatch_final_part().unwrap();
        assert_eq!(engine.parts().len(), 1);
        assert!(engine.parts()[0].is_final_part);

        let engine2 = Arc::new(RecordingExecutionEngine::default());
        let empty_batcher = batcher(10, engine2.clone());
        empty_batcher.dispatch_final_part().unwrap();
        assert_eq!(engine2.parts().len(), 1);
        assert!(engine2.parts()[0].transfers.is_empty());
        assert!(engine2.parts()[0].is_final_part);
    }

    #[test]
    fn part_numbers_increment() {
        let engine = Arc::new(RecordingExecutionEngine::default());
        let batcher = batcher(1, engine.clone());
        batcher.add_transfer(sample_transfer("a")).unwrap();
        batcher.add_transfer(sample_transfer("b")).unwrap();
        batcher.dispatch_final_part().unwrap();
        let parts = engine.parts();
        assert_eq!(parts[0].part_number, 0);
        assert_eq!(parts[1].part_number, 1);
        assert_eq!(parts[2].part_number, 2);
    }
}
