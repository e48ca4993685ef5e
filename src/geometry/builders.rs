//! # Geometry Buffer Builders
//!
//! Pure, stateless transforms from geometry inputs to renderable buffer
//! descriptions. Each builder takes geometry plus a small set of scalar
//! parameters and fills a fresh [`BufferData`]; there is no host or server
//! state anywhere in this module, which keeps every function directly
//! testable.
//!
//! ## Builders
//!
//! - **Shell surface / grid**: a double-layer offset surface (and its
//!   wireframe) that gives zero-thickness faces visible volume
//! - **Tube surface / wireframe**: circular cross-sections swept along a
//!   sampled curve
//! - **Arrow glyph**: a line glyph for direction vectors such as mesh
//!   normals
//! - **Box edges / side**: bounding-box wireframe and axis-indicator quads
//! - **Plain surface, polyline, point marker**: direct fills for solid
//!   faces, edges and point markers

use cgmath::{InnerSpace, Point3, Vector3};

use super::{BoxData, BufferData, MeshData, NormalBlend, Topology};
use crate::error::BuildError;

/// Segment count of every tube cross-section.
pub const TUBE_SEGMENTS: usize = 8;

/// Arrow head length as a fraction of the (clamped) shaft length.
pub const ARROW_HEAD_FACTOR: f32 = 0.25;

/// Shaft length above which the arrow head stops growing.
pub const ARROW_LENGTH_WATERMARK: f32 = 1.0;

/// |z| above this counts as a near-vertical direction when picking the
/// cross-product reference axis.
const NEAR_VERTICAL: f32 = 0.9;

/// Squared length below which a vector is treated as zero.
const MIN_LENGTH_SQ: f32 = 1.0e-12;

fn validate_triangles(mesh: &MeshData) -> Result<(), BuildError> {
    if mesh.positions.is_empty() {
        return Err(BuildError::Empty("vertices"));
    }
    if mesh.triangles.is_empty() {
        return Err(BuildError::Empty("triangles"));
    }
    let count = mesh.positions.len();
    for (triangle, tri) in mesh.triangles.iter().enumerate() {
        for &index in tri {
            if index as usize >= count {
                return Err(BuildError::IndexOutOfRange {
                    triangle,
                    index,
                    count,
                });
            }
        }
    }
    Ok(())
}

/// Estimates one normal per vertex by blending the normals of adjacent
/// triangles according to `blend`.
///
/// Zero-area triangles contribute nothing; a vertex touched only by
/// zero-area triangles keeps a zero normal. A mesh with no area at all is
/// rejected.
pub fn estimate_vertex_normals(
    mesh: &MeshData,
    blend: NormalBlend,
) -> Result<Vec<Vector3<f32>>, BuildError> {
    validate_triangles(mesh)?;

    let mut normals = vec![Vector3::new(0.0, 0.0, 0.0); mesh.positions.len()];
    let mut any_area = false;

    for tri in &mesh.triangles {
        let a = mesh.positions[tri[0] as usize];
        let b = mesh.positions[tri[1] as usize];
        let c = mesh.positions[tri[2] as usize];
        let cross = (b - a).cross(c - a);
        if cross.magnitude2() <= MIN_LENGTH_SQ {
            continue;
        }
        any_area = true;
        let contribution = match blend {
            NormalBlend::AreaWeighted => cross,
            NormalBlend::Distributed => cross.normalize(),
        };
        for &index in tri {
            normals[index as usize] += contribution;
        }
    }

    if !any_area {
        return Err(BuildError::ZeroAreaMesh);
    }

    for normal in &mut normals {
        if normal.magnitude2() > MIN_LENGTH_SQ {
            *normal = normal.normalize();
        }
    }
    Ok(normals)
}

/// Builds the double-layer shell surface of a mesh.
///
/// Every vertex is duplicated along its estimated normal by `thickness`,
/// the triangle fan is emitted once per layer, and skirt triangles join
/// vertex `i` of one layer to vertices `i` and `i+1 (mod N)` of the other.
/// The skirt treats index adjacency as boundary adjacency, which is only
/// topologically sound when the vertex ordering walks a single closed
/// boundary loop (a planar face triangulation); for arbitrary meshes the
/// skirt cuts through the interior.
pub fn shell_surface(
    mesh: &MeshData,
    thickness: f32,
    blend: NormalBlend,
) -> Result<BufferData, BuildError> {
    let normals = estimate_vertex_normals(mesh, blend)?;
    let n = mesh.positions.len() as u32;

    let mut data = BufferData::new(Topology::TriangleList);
    data.positions.reserve(mesh.positions.len() * 2);
    data.normals.reserve(mesh.positions.len() * 2);
    for (p, normal) in mesh.positions.iter().zip(&normals) {
        data.positions.push((*p).into());
        data.normals.push((*normal).into());
    }
    for (p, normal) in mesh.positions.iter().zip(&normals) {
        data.positions.push((p + normal * thickness).into());
        data.normals.push((*normal).into());
    }

    data.indices.reserve(mesh.triangle_count() * 6 + mesh.vertex_count() * 6);
    for tri in &mesh.triangles {
        data.indices.extend_from_slice(tri);
    }
    for tri in &mesh.triangles {
        data.indices
            .extend_from_slice(&[n + tri[0], n + tri[1], n + tri[2]]);
    }
    for i in 0..n {
        let j = (i + 1) % n;
        data.indices.extend_from_slice(&[i, n + i, n + j]);
        data.indices.extend_from_slice(&[i, n + j, j]);
    }
    Ok(data)
}

/// Builds the wireframe grid of the same double-layer shell.
///
/// Emits the 3 edges of every triangle on both layers, one line from each
/// original vertex to its offset twin, and one line to its cyclic-next
/// original neighbor.
pub fn shell_grid(
    mesh: &MeshData,
    thickness: f32,
    blend: NormalBlend,
) -> Result<BufferData, BuildError> {
    let normals = estimate_vertex_normals(mesh, blend)?;
    let n = mesh.positions.len() as u32;

    let mut data = BufferData::new(Topology::LineList);
    data.positions.reserve(mesh.positions.len() * 2);
    for p in &mesh.positions {
        data.positions.push((*p).into());
    }
    for (p, normal) in mesh.positions.iter().zip(&normals) {
        data.positions.push((p + normal * thickness).into());
    }

    data.indices.reserve(mesh.triangle_count() * 12 + mesh.vertex_count() * 4);
    for layer in [0, n] {
        for tri in &mesh.triangles {
            let (a, b, c) = (layer + tri[0], layer + tri[1], layer + tri[2]);
            data.indices.extend_from_slice(&[a, b, b, c, c, a]);
        }
    }
    for i in 0..n {
        let j = (i + 1) % n;
        data.indices.extend_from_slice(&[i, n + i, i, j]);
    }
    Ok(data)
}

/// Picks the cross-product reference axis for a unit direction.
///
/// `+X` for near-vertical directions, `+Z` otherwise; with the 0.9
/// threshold the cross product never degenerates for any unit input.
fn reference_axis(direction: Vector3<f32>) -> Vector3<f32> {
    if direction.z.abs() > NEAR_VERTICAL {
        Vector3::unit_x()
    } else {
        Vector3::unit_z()
    }
}

/// Local tangent at sample `i`: forward difference at the first sample,
/// backward at the last, central elsewhere.
fn sample_tangent(samples: &[Point3<f32>], i: usize) -> Result<Vector3<f32>, BuildError> {
    let last = samples.len() - 1;
    let (from, to) = if i == 0 {
        (0, 1)
    } else if i == last {
        (last - 1, last)
    } else {
        (i - 1, i + 1)
    };
    let tangent = samples[to] - samples[from];
    if tangent.magnitude2() <= MIN_LENGTH_SQ {
        return Err(BuildError::DegenerateTangent(from, to));
    }
    Ok(tangent.normalize())
}

/// Generates one circular cross-section per sample, perpendicular to the
/// local tangent. Returns ring positions and their radial normals, laid
/// out ring-major (`ring * TUBE_SEGMENTS + segment`).
fn tube_rings(
    samples: &[Point3<f32>],
    diameter: f32,
) -> Result<(Vec<[f32; 3]>, Vec<[f32; 3]>), BuildError> {
    if samples.len() < 2 {
        return Err(BuildError::Empty("samples"));
    }
    let radius = diameter * 0.5;
    let mut positions = Vec::with_capacity(samples.len() * TUBE_SEGMENTS);
    let mut normals = Vec::with_capacity(samples.len() * TUBE_SEGMENTS);

    for (i, center) in samples.iter().enumerate() {
        let tangent = sample_tangent(samples, i)?;
        let side = tangent.cross(reference_axis(tangent)).normalize();
        let binormal = tangent.cross(side);
        for s in 0..TUBE_SEGMENTS {
            let theta = s as f32 * 2.0 * std::f32::consts::PI / TUBE_SEGMENTS as f32;
            let radial = side * theta.cos() + binormal * theta.sin();
            positions.push((center + radial * radius).into());
            normals.push(radial.into());
        }
    }
    Ok((positions, normals))
}

/// Sweeps a solid tube along a sampled curve.
///
/// Consecutive cross-sections are joined with quads, two triangles each.
pub fn tube_surface(samples: &[Point3<f32>], diameter: f32) -> Result<BufferData, BuildError> {
    let (positions, normals) = tube_rings(samples, diameter)?;
    let mut data = BufferData::new(Topology::TriangleList);
    data.positions = positions;
    data.normals = normals;

    let segs = TUBE_SEGMENTS as u32;
    data.indices.reserve((samples.len() - 1) * TUBE_SEGMENTS * 6);
    for ring in 0..samples.len() as u32 - 1 {
        for s in 0..segs {
            let a = ring * segs + s;
            let b = ring * segs + (s + 1) % segs;
            let c = (ring + 1) * segs + (s + 1) % segs;
            let d = (ring + 1) * segs + s;
            data.indices.extend_from_slice(&[a, b, c]);
            data.indices.extend_from_slice(&[a, c, d]);
        }
    }
    Ok(data)
}

/// Sweeps a wireframe tube along a sampled curve.
///
/// Each segment of each ring pair contributes its full 4-line quad loop.
pub fn tube_wireframe(samples: &[Point3<f32>], diameter: f32) -> Result<BufferData, BuildError> {
    let (positions, _) = tube_rings(samples, diameter)?;
    let mut data = BufferData::new(Topology::LineList);
    data.positions = positions;

    let segs = TUBE_SEGMENTS as u32;
    data.indices.reserve((samples.len() - 1) * TUBE_SEGMENTS * 8);
    for ring in 0..samples.len() as u32 - 1 {
        for s in 0..segs {
            let a = ring * segs + s;
            let b = ring * segs + (s + 1) % segs;
            let c = (ring + 1) * segs + (s + 1) % segs;
            let d = (ring + 1) * segs + s;
            data.indices.extend_from_slice(&[a, b, b, c, c, d, d, a]);
        }
    }
    Ok(data)
}

/// Builds an arrow glyph for a direction vector.
///
/// The shaft runs from `origin + direction*offset` over `length`; the head
/// scales with the shaft but stops growing at the 1-unit watermark, so
/// short vectors keep proportionate heads.
pub fn arrow_glyph(
    origin: Point3<f32>,
    direction: Vector3<f32>,
    offset: f32,
    length: f32,
) -> Result<BufferData, BuildError> {
    if direction.magnitude2() <= MIN_LENGTH_SQ {
        return Err(BuildError::DegenerateDirection);
    }
    let dir = direction.normalize();
    let start = origin + dir * offset;
    let end = start + dir * length;

    let head = length.min(ARROW_LENGTH_WATERMARK) * ARROW_HEAD_FACTOR;
    let perpendicular = dir.cross(reference_axis(dir)).normalize();
    let base = end - dir * head;
    let wing = perpendicular * (head * 0.5);

    let mut data = BufferData::new(Topology::LineList);
    data.positions = vec![
        start.into(),
        end.into(),
        (base + wing).into(),
        (base - wing).into(),
    ];
    data.indices = vec![0, 1, 1, 2, 1, 3];
    Ok(data)
}

const BOX_EDGES: [[u32; 2]; 12] = [
    [0, 1],
    [2, 3],
    [4, 5],
    [6, 7],
    [0, 2],
    [1, 3],
    [4, 6],
    [5, 7],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];

/// Builds the 12-edge wireframe of a (transformed) bounding box.
pub fn box_edges(bx: &BoxData) -> Result<BufferData, BuildError> {
    let corners = bx.corners();
    let mut data = BufferData::new(Topology::LineList);
    data.positions = corners.iter().map(|p| (*p).into()).collect();
    data.indices.reserve(BOX_EDGES.len() * 2);
    for edge in BOX_EDGES {
        data.indices.extend_from_slice(&edge);
    }
    Ok(data)
}

/// Builds a thin quad between two points for axis-indicator rendering.
///
/// The quad runs from `a` to `b` and is widened along the principal axis
/// least aligned with the `a`→`b` direction, by half the segment length in
/// total (a quarter to each side).
pub fn box_side(a: Point3<f32>, b: Point3<f32>) -> Result<BufferData, BuildError> {
    let span = b - a;
    let length = span.magnitude();
    // A NaN or infinite coordinate must fail the build, not the axis pick.
    if !length.is_finite() || length * length <= MIN_LENGTH_SQ {
        return Err(BuildError::DegenerateDirection);
    }
    let dir = span / length;

    let axes = [Vector3::unit_x(), Vector3::unit_y(), Vector3::unit_z()];
    let elongation = axes
        .into_iter()
        .min_by(|u, v| {
            dir.dot(*u)
                .abs()
                .partial_cmp(&dir.dot(*v).abs())
                .expect("axis alignment is finite")
        })
        .expect("three candidate axes");

    let half = elongation * (length * 0.25);
    let normal: [f32; 3] = dir.cross(elongation).normalize().into();

    let mut data = BufferData::new(Topology::TriangleList);
    data.positions = vec![
        (a - half).into(),
        (a + half).into(),
        (b + half).into(),
        (b - half).into(),
    ];
    data.normals = vec![normal; 4];
    data.indices = vec![0, 1, 2, 0, 2, 3];
    Ok(data)
}

/// Fills a plain triangle-list surface from an already-triangulated mesh.
///
/// Normal hints are used when they cover every vertex; otherwise normals
/// are estimated with the distributed blend.
pub fn plain_surface(mesh: &MeshData) -> Result<BufferData, BuildError> {
    let normals = match &mesh.normal_hints {
        Some(hints) if hints.len() == mesh.positions.len() => {
            validate_triangles(mesh)?;
            hints.clone()
        }
        _ => estimate_vertex_normals(mesh, NormalBlend::Distributed)?,
    };

    let mut data = BufferData::new(Topology::TriangleList);
    data.positions = mesh.positions.iter().map(|p| (*p).into()).collect();
    data.normals = normals.into_iter().map(|v| v.into()).collect();
    data.indices.reserve(mesh.triangle_count() * 3);
    for tri in &mesh.triangles {
        data.indices.extend_from_slice(tri);
    }
    Ok(data)
}

/// Builds a line-list polyline through the given points, optionally closed
/// back to the first point.
pub fn polyline(points: &[Point3<f32>], closed: bool) -> Result<BufferData, BuildError> {
    if points.len() < 2 {
        return Err(BuildError::Empty("samples"));
    }
    let mut data = BufferData::new(Topology::LineList);
    data.positions = points.iter().map(|p| (*p).into()).collect();
    data.indices.reserve(points.len() * 2);
    for i in 0..points.len() as u32 - 1 {
        data.indices.extend_from_slice(&[i, i + 1]);
    }
    if closed {
        data.indices.extend_from_slice(&[points.len() as u32 - 1, 0]);
    }
    Ok(data)
}

/// Builds the three-line cross marker for a point.
pub fn point_marker(p: Point3<f32>, size: f32) -> Result<BufferData, BuildError> {
    let half = size * 0.5;
    let mut data = BufferData::new(Topology::LineList);
    for axis in [
        Vector3::unit_x(),
        Vector3::unit_y(),
        Vector3::unit_z(),
    ] {
        data.positions.push((p - axis * half).into());
        data.positions.push((p + axis * half).into());
    }
    data.indices = vec![0, 1, 2, 3, 4, 5];
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::samples::{flat_square, unit_cube};
    use approx::assert_relative_eq;
    use cgmath::MetricSpace;

    fn vec3(p: [f32; 3]) -> Vector3<f32> {
        Vector3::new(p[0], p[1], p[2])
    }

    #[test]
    fn test_shell_surface_cube_counts() {
        let cube = unit_cube();
        let data = shell_surface(&cube, 0.0, NormalBlend::Distributed).unwrap();
        assert_eq!(data.vertex_count(), 2 * 8);
        assert_eq!(data.primitive_count(), 2 * 12 + 2 * 8);
    }

    #[test]
    fn test_shell_surface_offsets_along_normals() {
        let square = flat_square();
        let thickness = 0.75;
        let data = shell_surface(&square, thickness, NormalBlend::Distributed).unwrap();
        let n = square.vertex_count();
        for i in 0..n {
            let base = vec3(data.positions[i]);
            let offset = vec3(data.positions[n + i]);
            let normal = vec3(data.normals[i]);
            assert_relative_eq!(
                (offset - base).magnitude(),
                thickness,
                epsilon = 1.0e-5
            );
            assert_relative_eq!((offset - base).dot(normal), thickness, epsilon = 1.0e-5);
        }
    }

    #[test]
    fn test_shell_grid_line_counts() {
        let cube = unit_cube();
        let data = shell_grid(&cube, 0.1, NormalBlend::Distributed).unwrap();
        assert_eq!(data.vertex_count(), 2 * 8);
        // 3 edges per triangle on both layers, plus twin + neighbor lines.
        assert_eq!(data.primitive_count(), 2 * 12 * 3 + 2 * 8);
    }

    #[test]
    fn test_shell_rejects_empty_mesh() {
        let empty = MeshData::new(Vec::new(), Vec::new());
        assert_eq!(
            shell_surface(&empty, 0.1, NormalBlend::Distributed),
            Err(BuildError::Empty("vertices"))
        );
    }

    #[test]
    fn test_shell_rejects_out_of_range_index() {
        let mesh = MeshData::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 7]],
        );
        assert_eq!(
            shell_surface(&mesh, 0.1, NormalBlend::Distributed),
            Err(BuildError::IndexOutOfRange {
                triangle: 0,
                index: 7,
                count: 3,
            })
        );
    }

    #[test]
    fn test_zero_area_mesh_is_rejected() {
        let mesh = MeshData::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        assert_eq!(
            estimate_vertex_normals(&mesh, NormalBlend::Distributed),
            Err(BuildError::ZeroAreaMesh)
        );
    }

    #[test]
    fn test_normal_blend_modes_differ_on_uneven_fan() {
        // One small triangle in the XY plane and one large one in the XZ
        // plane share vertex 0; area weighting must pull its normal toward
        // the larger triangle.
        let mesh = MeshData::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.1, 0.0, 0.0),
                Point3::new(0.0, 0.1, 0.0),
                Point3::new(10.0, 0.0, 0.0),
                Point3::new(0.0, 0.0, -10.0),
            ],
            vec![[0, 1, 2], [0, 3, 4]],
        );
        let distributed = estimate_vertex_normals(&mesh, NormalBlend::Distributed).unwrap();
        let weighted = estimate_vertex_normals(&mesh, NormalBlend::AreaWeighted).unwrap();
        let d = distributed[0];
        let w = weighted[0];
        assert!(d.dot(w) < 0.999, "blend modes should disagree, got {:?} vs {:?}", d, w);
        // The area-weighted normal hugs the big triangle's +Y normal.
        assert!(w.y > d.y);
    }

    #[test]
    fn test_tube_cross_sections_stay_bounded() {
        let samples: Vec<Point3<f32>> = (0..12)
            .map(|i| {
                let t = i as f32 * 0.4;
                Point3::new(t.cos(), t.sin(), 0.3 * t)
            })
            .collect();
        let diameter = 0.2;
        let data = tube_surface(&samples, diameter).unwrap();
        assert_eq!(data.vertex_count(), samples.len() * TUBE_SEGMENTS);
        assert_eq!(
            data.primitive_count(),
            (samples.len() - 1) * TUBE_SEGMENTS * 2
        );

        for ring in 0..samples.len() - 1 {
            let step = samples[ring].distance(samples[ring + 1]);
            for s in 0..TUBE_SEGMENTS {
                let here = vec3(data.positions[ring * TUBE_SEGMENTS + s]);
                let next = vec3(data.positions[(ring + 1) * TUBE_SEGMENTS + s]);
                let travel = (next - here).magnitude();
                assert!(
                    travel <= step + 2.0 * diameter,
                    "ring {ring} segment {s} jumped {travel}"
                );
            }
        }
    }

    #[test]
    fn test_tube_rejects_coincident_samples() {
        let samples = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 0.0)];
        assert_eq!(
            tube_surface(&samples, 0.1),
            Err(BuildError::DegenerateTangent(0, 1))
        );
    }

    #[test]
    fn test_tube_wireframe_line_counts() {
        let samples = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.5, 0.0),
        ];
        let data = tube_wireframe(&samples, 0.1).unwrap();
        assert_eq!(data.primitive_count(), 2 * TUBE_SEGMENTS * 4);
        assert!(data.normals.is_empty());
    }

    #[test]
    fn test_arrow_wings_survive_vertical_direction() {
        let data = arrow_glyph(
            Point3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0e-4, 1.0),
            0.0,
            2.0,
        )
        .unwrap();
        let shaft_end = vec3(data.positions[1]);
        let w1 = vec3(data.positions[2]);
        let w2 = vec3(data.positions[3]);
        for w in [w1, w2] {
            assert!(w.x.is_finite() && w.y.is_finite() && w.z.is_finite());
            assert!((w - shaft_end).magnitude() > 1.0e-4);
        }
        assert!((w1 - w2).magnitude() > 1.0e-4, "wings must be distinct");
        // Non-collinear with the shaft.
        let along = (w1 - shaft_end).normalize();
        assert!(along.dot(Vector3::unit_z()).abs() < 0.999);
    }

    #[test]
    fn test_arrow_head_clamps_at_watermark() {
        let short = arrow_glyph(
            Point3::new(0.0, 0.0, 0.0),
            Vector3::unit_x(),
            0.0,
            0.4,
        )
        .unwrap();
        let long = arrow_glyph(
            Point3::new(0.0, 0.0, 0.0),
            Vector3::unit_x(),
            0.0,
            5.0,
        )
        .unwrap();
        let head_of = |data: &BufferData| {
            let end = vec3(data.positions[1]);
            let base_mid = (vec3(data.positions[2]) + vec3(data.positions[3])) / 2.0;
            (end - base_mid).magnitude()
        };
        assert_relative_eq!(head_of(&short), 0.4 * ARROW_HEAD_FACTOR, epsilon = 1.0e-5);
        assert_relative_eq!(
            head_of(&long),
            ARROW_LENGTH_WATERMARK * ARROW_HEAD_FACTOR,
            epsilon = 1.0e-5
        );
    }

    #[test]
    fn test_arrow_respects_offset() {
        let data = arrow_glyph(
            Point3::new(1.0, 0.0, 0.0),
            Vector3::unit_y(),
            0.5,
            1.0,
        )
        .unwrap();
        assert_relative_eq!(data.positions[0][1], 0.5, epsilon = 1.0e-6);
        assert_relative_eq!(data.positions[1][1], 1.5, epsilon = 1.0e-6);
    }

    #[test]
    fn test_arrow_rejects_zero_direction() {
        assert_eq!(
            arrow_glyph(
                Point3::new(0.0, 0.0, 0.0),
                Vector3::new(0.0, 0.0, 0.0),
                0.0,
                1.0
            ),
            Err(BuildError::DegenerateDirection)
        );
    }

    #[test]
    fn test_box_edges_counts_and_transform() {
        let mut bx = BoxData::axis_aligned(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
        );
        bx.transform = cgmath::Matrix4::from_translation(Vector3::new(0.0, 0.0, 5.0));
        let data = box_edges(&bx).unwrap();
        assert_eq!(data.vertex_count(), 8);
        assert_eq!(data.primitive_count(), 12);
        assert!(data.positions.iter().all(|p| p[2] >= 5.0));
    }

    #[test]
    fn test_box_side_elongates_least_aligned_axis() {
        let data = box_side(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)).unwrap();
        assert_eq!(data.vertex_count(), 4);
        assert_eq!(data.primitive_count(), 2);
        // X-aligned segment widens along Y by a quarter length each side.
        assert_relative_eq!(data.positions[0][1], -0.5, epsilon = 1.0e-6);
        assert_relative_eq!(data.positions[1][1], 0.5, epsilon = 1.0e-6);
        assert_relative_eq!(data.positions[2][0], 2.0, epsilon = 1.0e-6);
        for normal in &data.normals {
            assert_relative_eq!(normal[2].abs(), 1.0, epsilon = 1.0e-6);
        }
    }

    #[test]
    fn test_box_side_rejects_coincident_points() {
        assert_eq!(
            box_side(Point3::new(1.0, 1.0, 1.0), Point3::new(1.0, 1.0, 1.0)),
            Err(BuildError::DegenerateDirection)
        );
    }

    #[test]
    fn test_box_side_rejects_non_finite_points() {
        assert_eq!(
            box_side(Point3::new(f32::NAN, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)),
            Err(BuildError::DegenerateDirection)
        );
        assert_eq!(
            box_side(Point3::new(0.0, 0.0, 0.0), Point3::new(f32::INFINITY, 0.0, 0.0)),
            Err(BuildError::DegenerateDirection)
        );
    }

    #[test]
    fn test_plain_surface_prefers_normal_hints() {
        let hint = Vector3::new(0.0, 0.0, -1.0);
        let mesh = flat_square().with_normals(vec![hint; 4]);
        let data = plain_surface(&mesh).unwrap();
        for normal in &data.normals {
            assert_relative_eq!(normal[2], -1.0, epsilon = 1.0e-6);
        }
        assert_eq!(data.primitive_count(), 2);
    }

    #[test]
    fn test_polyline_open_and_closed() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        assert_eq!(polyline(&points, false).unwrap().primitive_count(), 2);
        assert_eq!(polyline(&points, true).unwrap().primitive_count(), 3);
        assert_eq!(
            polyline(&points[..1], false),
            Err(BuildError::Empty("samples"))
        );
    }

    #[test]
    fn test_point_marker_crosses_all_axes() {
        let data = point_marker(Point3::new(1.0, 2.0, 3.0), 0.5).unwrap();
        assert_eq!(data.primitive_count(), 3);
        assert_relative_eq!(data.positions[0][0], 0.75, epsilon = 1.0e-6);
        assert_relative_eq!(data.positions[1][0], 1.25, epsilon = 1.0e-6);
        assert_relative_eq!(data.positions[5][2], 3.25, epsilon = 1.0e-6);
    }
}
