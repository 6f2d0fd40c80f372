//! Bounded-channel frame encoding off the tick loop.
//!
//! The tick loop is single-threaded and frames are immutable once produced,
//! which makes the render→encode hand-off the one safe parallelism
//! boundary. [`ThreadedSink`] wraps any sink, moves it onto a worker thread
//! and connects the two with a bounded `sync_channel`: when the encoder
//! falls behind, `push_frame` blocks (backpressure) instead of buffering
//! unboundedly.

use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::thread::JoinHandle;

use crate::{
    encode::sink::{FrameSink, SinkConfig},
    foundation::error::{KinemaError, KinemaResult},
    render::backend::Frame,
};

enum Msg {
    Frame(Box<Frame>),
    End,
}

/// Wraps an inner [`FrameSink`], running it on a dedicated worker thread
/// behind a bounded channel.
pub struct ThreadedSink {
    inner: Option<Box<dyn FrameSink>>,
    capacity: usize,
    tx: Option<SyncSender<Msg>>,
    handle: Option<JoinHandle<KinemaResult<()>>>,
}

impl ThreadedSink {
    /// Default channel capacity (frames in flight before the producer
    /// blocks).
    pub const DEFAULT_CAPACITY: usize = 4;

    pub fn new(inner: Box<dyn FrameSink>) -> Self {
        Self::with_capacity(inner, Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(inner: Box<dyn FrameSink>, capacity: usize) -> Self {
        Self {
            inner: Some(inner),
            capacity: capacity.max(1),
            tx: None,
            handle: None,
        }
    }

    fn worker(mut sink: Box<dyn FrameSink>, rx: Receiver<Msg>) -> KinemaResult<()> {
        for msg in rx {
            match msg {
                Msg::Frame(frame) => sink.push_frame(&frame)?,
                Msg::End => break,
            }
        }
        sink.end()
    }

    fn join_worker(&mut self) -> KinemaResult<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        handle
            .join()
            .map_err(|_| KinemaError::encode("encoder worker thread panicked"))?
    }
}

impl FrameSink for ThreadedSink {
    fn begin(&mut self, cfg: SinkConfig) -> KinemaResult<()> {
        let mut inner = self
            .inner
            .take()
            .ok_or_else(|| KinemaError::encode("threaded sink cannot be restarted"))?;
        inner.begin(cfg)?;

        let (tx, rx) = sync_channel::<Msg>(self.capacity);
        let handle = std::thread::Builder::new()
            .name("kinema-encode".to_owned())
            .spawn(move || Self::worker(inner, rx))
            .map_err(|e| KinemaError::encode(format!("failed to spawn encoder thread: {e}")))?;

        self.tx = Some(tx);
        self.handle = Some(handle);
        Ok(())
    }

    fn push_frame(&mut self, frame: &Frame) -> KinemaResult<()> {
        let Some(tx) = self.tx.as_ref() else {
            return Err(KinemaError::encode("threaded sink not started"));
        };
        if tx.send(Msg::Frame(Box::new(frame.clone()))).is_err() {
            // The worker bailed out; surface its error.
            self.tx = None;
            self.join_worker()?;
            return Err(KinemaError::encode("encoder worker terminated early"));
        }
        Ok(())
    }

    fn end(&mut self) -> KinemaResult<()> {
        if let Some(tx) = self.tx.take() {
            // A send failure means the worker already stopped; its join
            // result carries the real error either way.
            let _ = tx.send(Msg::End);
        }
        self.join_worker()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::{Fps, FrameIndex};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recording {
        begun: bool,
        indices: Vec<u64>,
        ended: bool,
    }

    struct RecordingSink(Arc<Mutex<Recording>>);

    impl FrameSink for RecordingSink {
        fn begin(&mut self, _cfg: SinkConfig) -> KinemaResult<()> {
            self.0.lock().unwrap().begun = true;
            Ok(())
        }

        fn push_frame(&mut self, frame: &Frame) -> KinemaResult<()> {
            self.0.lock().unwrap().indices.push(frame.index.0);
            Ok(())
        }

        fn end(&mut self) -> KinemaResult<()> {
            self.0.lock().unwrap().ended = true;
            Ok(())
        }
    }

    fn frame(index: u64) -> Frame {
        Frame {
            width: 1,
            height: 1,
            data: vec![0; 4],
            premultiplied: true,
            index: FrameIndex(index),
            timestamp_secs: 0.0,
        }
    }

    fn cfg() -> SinkConfig {
        SinkConfig {
            width: 1,
            height: 1,
            fps: Fps::new(60, 1).unwrap(),
        }
    }

    #[test]
    fn delivers_all_frames_in_order() {
        let state = Arc::new(Mutex::new(Recording::default()));
        let mut sink = ThreadedSink::with_capacity(Box::new(RecordingSink(state.clone())), 2);
        sink.begin(cfg()).unwrap();
        for i in 0..32 {
            sink.push_frame(&frame(i)).unwrap();
        }
        sink.end().unwrap();

        let rec = state.lock().unwrap();
        assert!(rec.begun);
        assert!(rec.ended);
        assert_eq!(rec.indices, (0..32).collect::<Vec<_>>());
    }

    #[test]
    fn push_before_begin_fails() {
        let state = Arc::new(Mutex::new(Recording::default()));
        let mut sink = ThreadedSink::new(Box::new(RecordingSink(state)));
        assert!(sink.push_frame(&frame(0)).is_err());
    }

    #[test]
    fn worker_error_surfaces_at_end() {
        struct FailingSink;
        impl FrameSink for FailingSink {
            fn begin(&mut self, _cfg: SinkConfig) -> KinemaResult<()> {
                Ok(())
            }
            fn push_frame(&mut self, _frame: &Frame) -> KinemaResult<()> {
                Err(KinemaError::encode("disk full"))
            }
            fn end(&mut self) -> KinemaResult<()> {
                Ok(())
            }
        }

        let mut sink = ThreadedSink::with_capacity(Box::new(FailingSink), 1);
        sink.begin(cfg()).unwrap();
        // The failure lands either on a later push (channel closed) or at
        // end(); both must report it.
        let mut failed = false;
        for i in 0..16 {
            if sink.push_frame(&frame(i)).is_err() {
                failed = true;
                break;
            }
        }
        if !failed {
            failed = sink.end().is_err();
        }
        assert!(failed);
    }
}
