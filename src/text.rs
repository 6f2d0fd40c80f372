//! Text-to-path boundary.
//!
//! Glyph outline generation is an external collaborator: the core consumes
//! shaped text as ordinary curve geometry and ships no shaping engine. Any
//! shaper (HarfBuzz-style libraries, platform text stacks, pre-baked glyph
//! atlases) can sit behind [`GlyphProvider`].

use crate::{foundation::error::KinemaResult, geometry::Curve, scene::object::SceneObject};

/// Opaque provider turning a string into outline curves.
///
/// Coordinates are scene units with the baseline at `y = 0` and the text
/// origin at `x = 0`; `size` is the em height in scene units. One curve per
/// glyph is conventional but not required — the core treats the result as
/// plain geometry.
pub trait GlyphProvider {
    fn shape_text(&mut self, text: &str, size: f64) -> KinemaResult<Vec<Curve>>;
}

/// Shape `text` with `provider` and wrap the outlines in a scene object.
pub fn text_object(
    provider: &mut dyn GlyphProvider,
    text: &str,
    size: f64,
) -> KinemaResult<SceneObject> {
    let curves = provider.shape_text(text, size)?;
    Ok(SceneObject::from_curves(curves))
}
