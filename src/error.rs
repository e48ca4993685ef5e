//! Error types for the visualization pipeline.
//!
//! Three classes of failure exist: geometry builds that reject malformed or
//! degenerate input, host interactions attempted while no document is active
//! (handled as silent no-ops, so they never surface here), and draw calls
//! rejected by the frame sink. Everything is caught at the render-callback
//! boundary; nothing is allowed to unwind into the host's frame loop.

use thiserror::Error;

/// Errors raised while tessellating geometry into renderable buffers.
///
/// Builders fail instead of emitting degenerate output: an empty mesh, a
/// triangle referencing a missing vertex or a zero-length tube tangent all
/// abort the build of that buffer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// The input carried no usable geometry (no vertices, no samples, ...).
    #[error("geometry has no {0}")]
    Empty(&'static str),

    /// A triangle references a vertex index outside the vertex array.
    #[error("triangle {triangle} references vertex {index}, but only {count} vertices exist")]
    IndexOutOfRange {
        /// Index of the offending triangle.
        triangle: usize,
        /// The out-of-range vertex index.
        index: u32,
        /// Number of vertices actually present.
        count: usize,
    },

    /// Two consecutive curve samples coincide, so no tangent exists there.
    #[error("samples {0} and {1} coincide and produce a zero-length tangent")]
    DegenerateTangent(usize, usize),

    /// A direction vector is too short to orient a glyph or a quad.
    #[error("direction vector is too short to orient the geometry")]
    DegenerateDirection,

    /// Every triangle of the mesh has zero area; no normal can be estimated.
    #[error("mesh has only zero-area triangles")]
    ZeroAreaMesh,
}

/// A draw call rejected by the frame sink.
///
/// Hosts surface whatever their pipeline reported; the message is carried
/// verbatim to the render-failure notification.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("frame sink rejected draw: {0}")]
pub struct DrawError(pub String);

/// Any failure caught at a server's render boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DisplayError {
    /// A buffer rebuild failed; stale or empty buffers remain in place.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// The host refused a flushed buffer.
    #[error(transparent)]
    Draw(#[from] DrawError),
}

impl DrawError {
    /// Creates a draw error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        DrawError(message.into())
    }
}
