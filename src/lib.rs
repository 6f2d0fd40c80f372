//! Kinema is a programmatic vector-scene animation and frame-rendering
//! engine.
//!
//! Authors build a tree of [`SceneObject`]s out of cubic-Bézier
//! [`Curve`]s, schedule [`Animation`]s against them on a [`Scene`], and the
//! tick loop interpolates geometry, rasterizes one [`Frame`] per tick and
//! feeds it to a [`FrameSink`]:
//!
//! - Load or construct geometry ([`geometry`], [`text`])
//! - Compose and style the object tree ([`scene`])
//! - Animate with easing and structural morphing ([`animation`], [`interp`])
//! - Drive the per-frame clock and render ([`timeline`], [`render`])
//! - Encode frames to PNG/MP4 off the tick loop ([`encode`])
#![forbid(unsafe_code)]

pub mod animation;
pub mod encode;
pub mod foundation;
pub mod geometry;
pub mod interp;
pub mod render;
pub mod scene;
pub mod text;
pub mod timeline;

pub use crate::foundation::core::{
    Affine, BezPath, Canvas, CubicBez, Fps, FrameIndex, Point, Rect, Rgba, Rgba8Premul, Vec2,
};
pub use crate::foundation::error::{KinemaError, KinemaResult};

pub use crate::animation::{AnimStatus, Animation, RateFunction};
pub use crate::encode::{
    FfmpegSink, FfmpegSinkOpts, FrameSink, InMemorySink, PngSequenceSink, SinkConfig, ThreadedSink,
};
pub use crate::geometry::{Curve, shapes};
pub use crate::interp::{AlignedPair, interpolate};
pub use crate::render::{BackendKind, Camera, CpuBackend, Frame, RenderBackend, create_backend};
pub use crate::scene::{FillRule, ObjectId, SceneObject, Style};
pub use crate::text::GlyphProvider;
pub use crate::timeline::{Intent, Scene, SceneConfig, Timeline};
