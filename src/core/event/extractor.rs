use crate::common::error::{MuxError, Result};
use crate::core::event::event::ReadinessEvent;
use crate::core::event::event_buffer::EventBuffer;
use std::os::unix::io::RawFd;

/// Copy the first `n` records of `buffer` into two parallel slices.
///
/// `masks[i]` and `fds[i]` describe the same event afterwards. Either every
/// record is copied or, on error, none is. `n == 0` always succeeds.
pub fn extract_batch(
    buffer: &EventBuffer,
    n: usize,
    masks: &mut [u32],
    fds: &mut [RawFd],
) -> Result<()> {
    if n == 0 {
        return Ok(());
    }

    if masks.len() < n || fds.len() < n {
        return Err(MuxError::invalid_argument(
            "extract_batch",
            format!(
                "output too short for {} records (masks: {}, fds: {})",
                n,
                masks.len(),
                fds.len()
            ),
        ));
    }

    let records = buffer.records();
    if n > records.len() {
        return Err(MuxError::invalid_argument(
            "extract_batch",
            format!("only {} records are populated, asked for {}", records.len(), n),
        ));
    }

    for ((record, mask), fd) in records[..n].iter().zip(masks.iter_mut()).zip(fds.iter_mut()) {
        let event = ReadinessEvent::from(record);
        *mask = event.mask;
        *fd = event.fd;
    }
    Ok(())
}

/// Reusable pair of output arrays sized for one buffer.
///
/// Each [`extract`](Self::extract) replaces the previous batch.
#[derive(Debug, Default)]
pub struct BatchExtractor {
    masks: Vec<u32>,
    fds: Vec<RawFd>,
    len: usize,
}

impl BatchExtractor {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            masks: vec![0; capacity],
            fds: vec![-1; capacity],
            len: 0,
        }
    }

    pub fn for_buffer(buffer: &EventBuffer) -> Self {
        Self::with_capacity(buffer.capacity())
    }

    pub fn capacity(&self) -> usize {
        self.masks.len()
    }

    /// Copy the first `n` records of `buffer`.
    pub fn extract(&mut self, buffer: &EventBuffer, n: usize) -> Result<usize> {
        self.len = 0;
        extract_batch(buffer, n, &mut self.masks, &mut self.fds)?;
        self.len = n;
        Ok(n)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn masks(&self) -> &[u32] {
        &self.masks[..self.len]
    }

    pub fn fds(&self) -> &[RawFd] {
        &self.fds[..self.len]
    }

    pub fn events(&self) -> impl Iterator<Item = ReadinessEvent> + '_ {
        self.masks()
            .iter()
            .zip(self.fds())
            .map(|(&mask, &fd)| ReadinessEvent::new(mask, fd))
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Drop every record of the current batch for which `keep` is false.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(ReadinessEvent) -> bool,
    {
        let mut kept = 0;
        for i in 0..self.len {
            let event = ReadinessEvent::new(self.masks[i], self.fds[i]);
            if keep(event) {
                self.masks[kept] = event.mask;
                self.fds[kept] = event.fd;
                kept += 1;
            }
        }
        self.len = kept;
    }
}
