//! Chunked image assembly.

use futures::{Stream, StreamExt};
use thiserror::Error;

use crate::context::{CallContext, ContextError};

/// Largest image accepted by default (1 MiB).
pub const MAX_IMAGE_SIZE: usize = 1 << 20;

/// The upload grew past the size ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("image is too large: {size} > {max}")]
pub struct ImageTooLarge {
    /// Size the image would have reached
    pub size: usize,
    /// The ceiling
    pub max: usize,
}

/// Errors that end an upload before its stream is exhausted.
#[derive(Debug, Error)]
pub enum CollectError<E> {
    /// The accumulated size passed the ceiling.
    #[error(transparent)]
    TooLarge(#[from] ImageTooLarge),
    /// The call was cancelled or ran out of time.
    #[error(transparent)]
    Context(#[from] ContextError),
    /// The chunk source failed.
    #[error("cannot receive chunk data: {0}")]
    Receive(E),
}

/// A fully received image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedImage {
    /// Image bytes in arrival order
    pub data: Vec<u8>,
    /// Total size in bytes
    pub size: usize,
}

/// Accumulates image chunks while enforcing a size ceiling.
#[derive(Debug)]
pub struct ImageCollector {
    data: Vec<u8>,
    max_size: usize,
}

impl Default for ImageCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageCollector {
    /// A collector with the default [`MAX_IMAGE_SIZE`] ceiling.
    pub fn new() -> Self {
        Self::with_max_size(MAX_IMAGE_SIZE)
    }

    /// A collector with a custom ceiling.
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            data: Vec::new(),
            max_size,
        }
    }

    /// Bytes collected so far.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Append a chunk.
    ///
    /// A chunk that would take the image past the ceiling is rejected and
    /// nothing of it is kept.
    pub fn push(&mut self, chunk: &[u8]) -> Result<(), ImageTooLarge> {
        let size = self.data.len() + chunk.len();
        if size > self.max_size {
            return Err(ImageTooLarge {
                size,
                max: self.max_size,
            });
        }
        self.data.extend_from_slice(chunk);
        Ok(())
    }

    /// Drain `chunks` to the end and return the assembled image.
    ///
    /// `ctx` is checked before every chunk and raced against each wait, so a
    /// stalled client cannot outlive its deadline.
    pub async fn collect<S, E>(
        mut self,
        ctx: &CallContext,
        mut chunks: S,
    ) -> Result<CollectedImage, CollectError<E>>
    where
        S: Stream<Item = Result<Vec<u8>, E>> + Unpin,
    {
        loop {
            ctx.check()?;

            tracing::debug!("waiting to receive more data");
            let next = tokio::select! {
                biased;
                err = ctx.done() => return Err(err.into()),
                next = chunks.next() => next,
            };

            let chunk = match next {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => return Err(CollectError::Receive(e)),
                None => {
                    tracing::debug!("no more data");
                    break;
                }
            };

            tracing::debug!("received a chunk with size: {}", chunk.len());
            self.push(&chunk)?;
        }

        Ok(self.finish())
    }

    /// Hand over what has been collected.
    pub fn finish(self) -> CollectedImage {
        CollectedImage {
            size: self.data.len(),
            data: self.data,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::convert::Infallible;
    use std::time::Duration;

    use futures::stream;

    use super::*;

    fn chunks(sizes: &[usize]) -> Vec<Result<Vec<u8>, Infallible>> {
        sizes
            .iter()
            .enumerate()
            .map(|(i, &n)| Ok(vec![i as u8; n]))
            .collect()
    }

    // ==================== push ====================

    #[test]
    fn test_push_up_to_ceiling() {
        let mut collector = ImageCollector::with_max_size(10);
        collector.push(&[1; 6]).unwrap();
        collector.push(&[2; 4]).unwrap();
        assert_eq!(collector.size(), 10);
    }

    #[test]
    fn test_push_past_ceiling_keeps_nothing_of_chunk() {
        let mut collector = ImageCollector::with_max_size(10);
        collector.push(&[1; 6]).unwrap();

        let err = collector.push(&[2; 5]).unwrap_err();

        assert_eq!(err, ImageTooLarge { size: 11, max: 10 });
        assert_eq!(collector.size(), 6);
    }

    // ==================== collect ====================

    #[tokio::test]
    async fn test_collect_exact_ceiling() {
        let source = stream::iter(chunks(&[512 * 1024, 256 * 1024, 256 * 1024]));

        let image = ImageCollector::new()
            .collect(&CallContext::new(), source)
            .await
            .unwrap();

        assert_eq!(image.size, MAX_IMAGE_SIZE);
        assert_eq!(image.data.len(), MAX_IMAGE_SIZE);
        assert_eq!(image.data[0], 0);
        assert_eq!(image.data[MAX_IMAGE_SIZE - 1], 2);
    }

    #[tokio::test]
    async fn test_collect_one_byte_over() {
        let source = stream::iter(chunks(&[MAX_IMAGE_SIZE, 1]));

        let err = ImageCollector::new()
            .collect(&CallContext::new(), source)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CollectError::TooLarge(ImageTooLarge { size, max }) if size == MAX_IMAGE_SIZE + 1 && max == MAX_IMAGE_SIZE
        ));
    }

    #[tokio::test]
    async fn test_collect_empty_stream() {
        let source = stream::iter(chunks(&[]));
        let image = ImageCollector::new()
            .collect(&CallContext::new(), source)
            .await
            .unwrap();
        assert_eq!(image.size, 0);
    }

    #[tokio::test]
    async fn test_collect_passes_receive_error() {
        let source = stream::iter(vec![Ok(vec![1u8; 4]), Err("connection reset")]);

        let err = ImageCollector::new()
            .collect(&CallContext::new(), source)
            .await
            .unwrap_err();

        assert!(matches!(err, CollectError::Receive("connection reset")));
    }

    #[tokio::test]
    async fn test_collect_cancelled_before_first_chunk() {
        let ctx = CallContext::new();
        ctx.cancel();

        let err = ImageCollector::new()
            .collect(&ctx, stream::iter(chunks(&[16])))
            .await
            .unwrap_err();

        assert!(matches!(err, CollectError::Context(ContextError::Canceled)));
    }

    #[tokio::test]
    async fn test_collect_stalled_source_hits_deadline() {
        let ctx = CallContext::with_timeout(Duration::from_millis(20));
        let source = stream::pending::<Result<Vec<u8>, Infallible>>();

        let err = ImageCollector::new().collect(&ctx, source).await.unwrap_err();

        assert!(matches!(
            err,
            CollectError::Context(ContextError::DeadlineExceeded)
        ));
    }
}
