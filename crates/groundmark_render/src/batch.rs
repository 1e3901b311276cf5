//! CPU staging of decal quads
//!
//! The handler issues many small `draw_quads` calls; they are copied into
//! one vertex stream and grouped into runs sharing a pass and a texture.

use groundmark_core::geometry::{DecalVertex, VERTICES_PER_QUAD};
use groundmark_core::interfaces::TextureHandle;
use groundmark_core::render::DecalPass;
use glam::Vec3;

pub const INDICES_PER_QUAD: usize = 6;

/// Contiguous quads drawn with one pipeline and one texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRun {
    pub pass: DecalPass,
    pub texture: TextureHandle,
    pub first_quad: u32,
    pub quad_count: u32,
}

impl DrawRun {
    pub fn index_range(&self) -> std::ops::Range<u32> {
        let per_quad = INDICES_PER_QUAD as u32;
        self.first_quad * per_quad..(self.first_quad + self.quad_count) * per_quad
    }
}

#[derive(Debug)]
pub struct QuadBatch {
    vertices: Vec<DecalVertex>,
    runs: Vec<DrawRun>,
    max_quads: usize,
    pass: Option<DecalPass>,
    texture: Option<TextureHandle>,
    dropped: usize,
}

impl QuadBatch {
    pub fn new(max_quads: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(max_quads * VERTICES_PER_QUAD),
            runs: Vec::new(),
            max_quads,
            pass: None,
            texture: None,
            dropped: 0,
        }
    }

    /// Start a new frame.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.runs.clear();
        self.pass = None;
        self.texture = None;
        self.dropped = 0;
    }

    /// Texture bindings do not survive a pass change.
    pub fn begin_pass(&mut self, pass: DecalPass) {
        self.pass = Some(pass);
        self.texture = None;
    }

    pub fn bind_texture(&mut self, texture: TextureHandle) {
        self.texture = Some(texture);
    }

    /// Stage whole quads from `vertices`, translated by `offset`. Returns
    /// how many quads were staged; the rest are counted as dropped.
    pub fn push_quads(&mut self, vertices: &[DecalVertex], offset: Vec3) -> usize {
        let quads = vertices.len() / VERTICES_PER_QUAD;
        let (Some(pass), Some(texture)) = (self.pass, self.texture) else {
            self.dropped += quads;
            return 0;
        };

        let take = quads.min(self.max_quads - self.quad_count());
        self.dropped += quads - take;
        if take == 0 {
            return 0;
        }

        let first_quad = self.quad_count() as u32;
        self.vertices
            .extend(vertices[..take * VERTICES_PER_QUAD].iter().map(|v| {
                let p = Vec3::from_array(v.position) + offset;
                DecalVertex {
                    position: p.to_array(),
                    ..*v
                }
            }));

        match self.runs.last_mut() {
            Some(run)
                if run.pass == pass
                    && run.texture == texture
                    && run.first_quad + run.quad_count == first_quad =>
            {
                run.quad_count += take as u32;
            }
            _ => self.runs.push(DrawRun {
                pass,
                texture,
                first_quad,
                quad_count: take as u32,
            }),
        }

        take
    }

    #[inline]
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / VERTICES_PER_QUAD
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertices(&self) -> &[DecalVertex] {
        &self.vertices
    }

    pub fn runs(&self) -> &[DrawRun] {
        &self.runs
    }

    /// Quads rejected this frame, for lack of room or of a bound texture.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn max_quads(&self) -> usize {
        self.max_quads
    }
}

/// Index list for `max_quads` quads laid out as triangle fans of four
/// vertices.
pub fn quad_indices(max_quads: usize) -> Vec<u32> {
    let mut indices = Vec::with_capacity(max_quads * INDICES_PER_QUAD);
    for quad in 0..max_quads as u32 {
        let base = quad * VERTICES_PER_QUAD as u32;
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    indices
}
