//! # Geometry Inputs and Buffer Descriptions
//!
//! This module defines the immutable geometry inputs a visualization server
//! is constructed around, and the renderable buffer description the pure
//! builders in [`builders`] emit from them.
//!
//! ## Supported inputs
//!
//! - **Mesh**: triangle mesh with optional per-vertex normal hints
//! - **Face**: a triangulated face whose vertex order walks its outer loop
//! - **Solid**: triangulated faces plus sampled boundary edges
//! - **Curve**: an ordered point sequence sampled from a curve or edge
//! - **Box**: min/max corners with a local transform
//! - **Point**: a single position
//!
//! Inputs are owned by the caller and never mutated by a server; builders
//! read them and fill fresh [`BufferData`] on every rebuild.

pub mod builders;

use cgmath::{Matrix4, Point3, Transform, Vector3};

/// Index topology of a renderable buffer.
///
/// The host's render entry point accepts exactly these two primitive
/// topologies; everything a server flushes is one or the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    /// Every 3 indices form one triangle.
    TriangleList,
    /// Every 2 indices form one line segment.
    LineList,
}

impl Topology {
    /// Number of indices consumed per primitive.
    pub fn indices_per_primitive(&self) -> usize {
        match self {
            Topology::TriangleList => 3,
            Topology::LineList => 2,
        }
    }
}

impl Default for Topology {
    fn default() -> Self {
        Topology::TriangleList
    }
}

/// Renderable buffer description emitted by the geometry builders.
///
/// Positions and normals are parallel arrays in device order; `normals` is
/// empty for line-list buffers, which carry positions only. The data is
/// converted into the Pod vertex layout when a buffer storage ingests it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BufferData {
    /// Vertex positions (x, y, z) in device order.
    pub positions: Vec<[f32; 3]>,
    /// Per-vertex normals; empty for line buffers.
    pub normals: Vec<[f32; 3]>,
    /// Indices into `positions`, grouped per primitive.
    pub indices: Vec<u32>,
    /// How `indices` are grouped.
    pub topology: Topology,
}

impl BufferData {
    /// Creates an empty buffer description with the given topology.
    pub fn new(topology: Topology) -> Self {
        Self {
            positions: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
            topology,
        }
    }

    /// Number of vertices in this buffer.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of whole primitives described by the index array.
    pub fn primitive_count(&self) -> usize {
        self.indices.len() / self.topology.indices_per_primitive()
    }
}

/// Strategy for blending adjacent triangle normals into a vertex normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalBlend {
    /// Every adjacent triangle contributes its unit normal equally.
    #[default]
    Distributed,
    /// Triangles contribute proportionally to their area.
    AreaWeighted,
}

/// A triangle mesh: positions, per-triangle vertex indices and optional
/// per-vertex normal hints.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    /// Vertex positions.
    pub positions: Vec<Point3<f32>>,
    /// Vertex indices, three per triangle.
    pub triangles: Vec<[u32; 3]>,
    /// Optional caller-supplied normals, one per vertex. When present they
    /// take precedence over estimated normals in the plain surface builder.
    pub normal_hints: Option<Vec<Vector3<f32>>>,
}

impl MeshData {
    /// Creates a mesh from positions and triangles, without normal hints.
    pub fn new(positions: Vec<Point3<f32>>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            positions,
            triangles,
            normal_hints: None,
        }
    }

    /// Attaches per-vertex normal hints.
    pub fn with_normals(mut self, normals: Vec<Vector3<f32>>) -> Self {
        self.normal_hints = Some(normals);
        self
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

/// A triangulated face whose vertex ordering walks the outer boundary loop.
///
/// The shell builder's skirt construction is topologically correct exactly
/// for this shape, so the face server is its canonical consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceData {
    /// The face triangulation; vertex order is the outer loop order.
    pub mesh: MeshData,
}

impl FaceData {
    /// Wraps a face triangulation.
    pub fn new(mesh: MeshData) -> Self {
        Self { mesh }
    }

    /// The outer boundary loop, in order.
    pub fn outline(&self) -> &[Point3<f32>] {
        &self.mesh.positions
    }
}

/// An ordered point sequence sampled from a curve, edge or polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveData {
    /// Samples along the curve, in traversal order.
    pub samples: Vec<Point3<f32>>,
}

impl CurveData {
    /// Wraps a sample sequence.
    pub fn new(samples: Vec<Point3<f32>>) -> Self {
        Self { samples }
    }

    /// Number of samples.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

/// A solid: triangulated faces plus its sampled boundary edges.
#[derive(Debug, Clone, PartialEq)]
pub struct SolidData {
    /// One triangulation per face.
    pub faces: Vec<MeshData>,
    /// One sampled polyline per boundary edge.
    pub edges: Vec<CurveData>,
}

impl SolidData {
    /// Creates a solid from faces and edges.
    pub fn new(faces: Vec<MeshData>, edges: Vec<CurveData>) -> Self {
        Self { faces, edges }
    }
}

/// A bounding box: min/max corners plus a local transform.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxData {
    /// Minimum corner, local space.
    pub min: Point3<f32>,
    /// Maximum corner, local space.
    pub max: Point3<f32>,
    /// Transform from local into world space.
    pub transform: Matrix4<f32>,
}

impl BoxData {
    /// Creates an axis-aligned box with an identity transform.
    pub fn axis_aligned(min: Point3<f32>, max: Point3<f32>) -> Self {
        use cgmath::SquareMatrix;
        Self {
            min,
            max,
            transform: Matrix4::identity(),
        }
    }

    /// The 8 transformed corners.
    ///
    /// Corner `i` selects max.x when bit 0 of `i` is set, max.y for bit 1
    /// and max.z for bit 2; corner 0 is the minimum, corner 7 the maximum.
    pub fn corners(&self) -> [Point3<f32>; 8] {
        let mut corners = [Point3::new(0.0, 0.0, 0.0); 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            let local = Point3::new(
                if i & 1 != 0 { self.max.x } else { self.min.x },
                if i & 2 != 0 { self.max.y } else { self.min.y },
                if i & 4 != 0 { self.max.z } else { self.min.z },
            );
            *corner = self.transform.transform_point(local);
        }
        corners
    }
}

/// Axis-aligned bounding volume reported to the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3<f32>,
    /// Maximum corner.
    pub max: Point3<f32>,
}

impl Aabb {
    /// Smallest box enclosing all given points, or `None` when the iterator
    /// is empty.
    pub fn from_points<I>(points: I) -> Option<Aabb>
    where
        I: IntoIterator<Item = Point3<f32>>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut aabb = Aabb {
            min: first,
            max: first,
        };
        for p in iter {
            aabb.extend(p);
        }
        Some(aabb)
    }

    /// Grows the box to include `p`.
    pub fn extend(&mut self, p: Point3<f32>) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Smallest box enclosing both `self` and `other`.
    pub fn union(&self, other: &Aabb) -> Aabb {
        let mut merged = *self;
        merged.extend(other.min);
        merged.extend(other.max);
        merged
    }

    /// The box grown by `margin` on every side. Servers use this to cover
    /// geometry that reaches past its input points, like shell offsets and
    /// normal arrows.
    pub fn grown(&self, margin: f32) -> Aabb {
        let m = Vector3::new(margin, margin, margin);
        Aabb {
            min: self.min - m,
            max: self.max + m,
        }
    }
}
