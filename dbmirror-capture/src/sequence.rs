//! Sequence mirroring
//!
//! Wraps the native `setval`/`nextval` primitives: the native call runs
//! first, then its result is recorded as an `s` entry. A failed log write
//! does not undo the native call (sequences are not transactional).

use crate::error::{CaptureError, CaptureResult};
use dbmirror_core::{encode_sequence, Operation, TableRef};
use dbmirror_log::{HeaderId, NewHeader, PendingLogWriter, SequencePort};
use tracing::info;

/// Records sequence updates into the pending log.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceMirror;

impl SequenceMirror {
    /// Create a mirror
    pub fn new() -> Self {
        Self
    }

    /// `setval(sequence, value)`; recorded as called.
    pub async fn setval<S>(
        &self,
        session: &mut S,
        sequence: &TableRef,
        value: i64,
    ) -> CaptureResult<i64>
    where
        S: SequencePort + PendingLogWriter + ?Sized,
    {
        let result = session
            .set_value(sequence, value)
            .await
            .map_err(CaptureError::Sequence)?;

        self.save(session, sequence, result, true).await?;
        Ok(result)
    }

    /// `setval(sequence, value, is_called)`; recorded with the given flag.
    pub async fn setval_with_called<S>(
        &self,
        session: &mut S,
        sequence: &TableRef,
        value: i64,
        is_called: bool,
    ) -> CaptureResult<i64>
    where
        S: SequencePort + PendingLogWriter + ?Sized,
    {
        let result = session
            .set_value_with_called(sequence, value, is_called)
            .await
            .map_err(CaptureError::Sequence)?;

        self.save(session, sequence, result, is_called).await?;
        Ok(result)
    }

    /// `nextval(sequence)`; the new value is recorded as called.
    pub async fn nextval<S>(&self, session: &mut S, sequence: &TableRef) -> CaptureResult<i64>
    where
        S: SequencePort + PendingLogWriter + ?Sized,
    {
        let result = session
            .next_value(sequence)
            .await
            .map_err(CaptureError::Sequence)?;

        self.save(session, sequence, result, true).await?;
        Ok(result)
    }

    async fn save<S>(
        &self,
        session: &mut S,
        sequence: &TableRef,
        value: i64,
        is_called: bool,
    ) -> CaptureResult<HeaderId>
    where
        S: PendingLogWriter + ?Sized,
    {
        let xid = session
            .transaction_id()
            .await
            .map_err(CaptureError::LogWrite)?;

        // headers carry the bare sequence name
        let header = session
            .write_header(&NewHeader::new(
                sequence.name.clone(),
                Operation::SequenceAdvance,
                xid,
            ))
            .await
            .map_err(CaptureError::LogWrite)?;

        session
            .write_payload(header, true, &encode_sequence(value, is_called))
            .await
            .map_err(CaptureError::LogWrite)?;

        info!(seq_id = %header, sequence = %sequence, value, is_called, "Sequence captured");
        Ok(header)
    }
}
