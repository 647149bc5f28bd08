//! Register-level access to a sensor on a request/response bus.

use crate::error::TransportError;
use bytes::Bytes;
use std::future::Future;

/// Register read/write primitives over the sensor bus.
///
/// Both operations occupy the bus until the transaction completes. Errors are
/// handed back as-is; retry policy belongs to the caller.
pub trait RegisterBus: Send {
    /// Write a single byte to `reg`.
    fn write(&mut self, reg: u8, value: u8) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Select `reg` and read `len` bytes back in one transaction.
    fn read_after_write(
        &mut self,
        reg: u8,
        len: usize,
    ) -> impl Future<Output = Result<Bytes, TransportError>> + Send;

    /// Read a single register byte.
    fn read_register(&mut self, reg: u8) -> impl Future<Output = Result<u8, TransportError>> + Send {
        async move {
            let bytes = self.read_after_write(reg, 1).await?;
            bytes.first().copied().ok_or(TransportError::ShortRead {
                expected: 1,
                actual: 0,
            })
        }
    }
}
