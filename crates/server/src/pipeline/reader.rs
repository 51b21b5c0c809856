//! Pull-style reader over a push-style chunk channel.
//!
//! The generation worker pushes each token as soon as it arrives; the HTTP
//! body pulls bytes into buffers of whatever size it chooses. A chunk larger
//! than the caller's buffer is kept as the pending tail and handed out by the
//! following reads, so nothing is dropped or reordered.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::mpsc;

/// Sending half owned by the producer. Dropping it ends the stream.
pub type ChunkSender = mpsc::UnboundedSender<Bytes>;

/// Create a connected sender/reader pair.
pub fn channel() -> (ChunkSender, ChunkReader) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, ChunkReader::new(rx))
}

/// [`AsyncRead`] adapter over a channel of byte chunks.
///
/// A read that returns zero bytes means the producer closed the channel and
/// every chunk has been delivered.
#[derive(Debug)]
pub struct ChunkReader {
    rx: mpsc::UnboundedReceiver<Bytes>,
    pending: Bytes,
}

impl ChunkReader {
    pub fn new(rx: mpsc::UnboundedReceiver<Bytes>) -> Self {
        Self { rx, pending: Bytes::new() }
    }
}

impl AsyncRead for ChunkReader {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        if buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }

        // Empty chunks are skipped: a zero-byte read would look like end of stream.
        while this.pending.is_empty() {
            match ready!(this.rx.poll_recv(cx)) {
                Some(chunk) => this.pending = chunk,
                None => return Poll::Ready(Ok(())),
            }
        }

        let n = buf.remaining().min(this.pending.len());
        buf.put_slice(&this.pending.split_to(n));
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tokio::io::AsyncReadExt;

    async fn read_all_with(reader: &mut ChunkReader, sizes: &[usize]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut i = 0;
        loop {
            let mut buf = vec![0u8; sizes[i % sizes.len()]];
            i += 1;
            let n = reader.read(&mut buf).await.unwrap();
            if n == 0 {
                return out;
            }
            out.extend_from_slice(&buf[..n]);
        }
    }

    #[tokio::test]
    async fn test_reads_chunks_in_order() {
        let (tx, mut reader) = channel();
        for token in ["It ", "is ", "sunny."] {
            tx.send(Bytes::from(token)).unwrap();
        }
        drop(tx);

        let out = read_all_with(&mut reader, &[64]).await;
        assert_eq!(out, b"It is sunny.");
    }

    #[tokio::test]
    async fn test_small_buffer_keeps_remainder() {
        let (tx, mut reader) = channel();
        tx.send(Bytes::from_static(b"abcdefgh")).unwrap();
        tx.send(Bytes::from_static(b"ij")).unwrap();
        drop(tx);

        let mut buf = [0u8; 3];
        assert_eq!(reader.read(&mut buf).await.unwrap(), 3);
        assert_eq!(&buf, b"abc");
        assert_eq!(reader.read(&mut buf).await.unwrap(), 3);
        assert_eq!(&buf, b"def");
        // The tail of a chunk is never merged with the next chunk.
        assert_eq!(reader.read(&mut buf).await.unwrap(), 2);
        assert_eq!(&buf[..2], b"gh");
        assert_eq!(reader.read(&mut buf).await.unwrap(), 2);
        assert_eq!(&buf[..2], b"ij");
        assert_eq!(reader.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_chunks_are_not_eof() {
        let (tx, mut reader) = channel();
        tx.send(Bytes::new()).unwrap();
        tx.send(Bytes::from_static(b"x")).unwrap();
        tx.send(Bytes::new()).unwrap();
        drop(tx);

        let out = read_all_with(&mut reader, &[8]).await;
        assert_eq!(out, b"x");
    }

    #[tokio::test]
    async fn test_eof_when_closed_without_chunks() {
        let (tx, mut reader) = channel();
        drop(tx);
        let mut buf = [0u8; 4];
        assert_eq!(reader.read(&mut buf).await.unwrap(), 0);
        assert_eq!(reader.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_read_waits_for_producer() {
        let (tx, mut reader) = channel();
        let producer = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            tx.send(Bytes::from_static(b"late")).unwrap();
        });

        let mut buf = [0u8; 16];
        let n = reader.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"late");
        producer.await.unwrap();
        assert_eq!(reader.read(&mut buf).await.unwrap(), 0);
    }

    fn segment(data: &[u8], cuts: &[usize]) -> Vec<Bytes> {
        let mut points: Vec<usize> = cuts.iter().map(|c| c % (data.len() + 1)).collect();
        points.push(0);
        points.push(data.len());
        points.sort_unstable();

        points.windows(2).map(|w| Bytes::copy_from_slice(&data[w[0]..w[1]])).collect()
    }

    proptest! {
        #[test]
        fn prop_reassembles_any_segmentation(
            data in proptest::collection::vec(any::<u8>(), 0..512),
            cuts in proptest::collection::vec(any::<usize>(), 0..32),
            sizes in proptest::collection::vec(1usize..64, 1..16),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let out = runtime.block_on(async {
                let (tx, mut reader) = channel();
                for chunk in segment(&data, &cuts) {
                    tx.send(chunk).unwrap();
                }
                drop(tx);
                read_all_with(&mut reader, &sizes).await
            });
            prop_assert_eq!(out, data);
        }
    }
}
