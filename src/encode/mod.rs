pub mod ffmpeg;
pub mod sink;
pub mod worker;

pub use ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use sink::{
    FrameSink, InMemorySink, PngSequenceSink, SinkConfig, flatten_premul_over_bg_to_opaque_rgba8,
};
pub use worker::ThreadedSink;
