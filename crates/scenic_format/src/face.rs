//! Face stream codec
//!
//! An embed's `faces` array is a flat run of integers. Every face starts with
//! a [`FaceFlags`] bit-field that says which index groups follow, always in
//! this order: vertices, material, face UV, face-vertex UV, face normal,
//! face-vertex normal, face color, face-vertex color. UV groups repeat once
//! per UV layer.
//!
//! The encoder reverses triangle winding (`0, 2, 1`) to go with the Z flip of
//! positions; [`FaceRecord::triangles`] undoes it.

use thiserror::Error;

/// Per-face attribute flags
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FaceFlags(u32);

impl FaceFlags {
    pub const NONE: Self = Self(0);

    /// Four vertex indices instead of three
    pub const QUAD: Self = Self(1 << 0);

    /// One material-table index
    pub const MATERIAL: Self = Self(1 << 1);

    /// One UV index per layer for the whole face
    pub const FACE_UV: Self = Self(1 << 2);

    /// One UV index per corner per layer
    pub const FACE_VERTEX_UV: Self = Self(1 << 3);

    /// One normal index for the whole face
    pub const FACE_NORMAL: Self = Self(1 << 4);

    /// One normal index per corner
    pub const FACE_VERTEX_NORMAL: Self = Self(1 << 5);

    /// One color index for the whole face
    pub const FACE_COLOR: Self = Self(1 << 6);

    /// One color index per corner
    pub const FACE_VERTEX_COLOR: Self = Self(1 << 7);

    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn set(&mut self, other: Self, value: bool) {
        if value {
            self.0 |= other.0;
        } else {
            self.0 &= !other.0;
        }
    }

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Corners per face: 4 for quads, 3 otherwise
    #[inline]
    pub const fn corners(self) -> usize {
        if self.contains(Self::QUAD) {
            4
        } else {
            3
        }
    }

    /// Integers following the bit-field for a face with these flags
    pub fn payload_len(self, uv_layers: usize) -> usize {
        let n = self.corners();
        let mut len = n;
        if self.contains(Self::MATERIAL) {
            len += 1;
        }
        if self.contains(Self::FACE_UV) {
            len += uv_layers;
        }
        if self.contains(Self::FACE_VERTEX_UV) {
            len += n * uv_layers;
        }
        if self.contains(Self::FACE_NORMAL) {
            len += 1;
        }
        if self.contains(Self::FACE_VERTEX_NORMAL) {
            len += n;
        }
        if self.contains(Self::FACE_COLOR) {
            len += 1;
        }
        if self.contains(Self::FACE_VERTEX_COLOR) {
            len += n;
        }
        len
    }
}

impl core::ops::BitOr for FaceFlags {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl core::ops::BitOrAssign for FaceFlags {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Face stream decoding failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FaceError {
    #[error("Face at offset {offset} needs {needed} integers but only {remaining} remain")]
    Truncated {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("Invalid face flags {value} at offset {offset}")]
    InvalidFlags { offset: usize, value: i64 },

    #[error("Negative index {value} at offset {offset}")]
    NegativeIndex { offset: usize, value: i64 },
}

/// Append one triangle in the exporter's layout.
///
/// `corners` index the vertex, UV and normal arrays alike. The corners are
/// written as `0, 2, 1`. A missing material is written as `-1`.
pub fn encode_triangle(out: &mut Vec<i64>, corners: [u32; 3], material: Option<u32>, with_uvs: bool) {
    let mut flags = FaceFlags::MATERIAL | FaceFlags::FACE_VERTEX_NORMAL;
    flags.set(FaceFlags::FACE_VERTEX_UV, with_uvs);

    let reversed = [corners[0], corners[2], corners[1]].map(i64::from);
    out.push(i64::from(flags.bits()));
    out.extend_from_slice(&reversed);
    out.push(material.map_or(-1, i64::from));
    if with_uvs {
        out.extend_from_slice(&reversed);
    }
    out.extend_from_slice(&reversed);
}

/// Up to four indices, one per corner
pub type Corners = [u32; 4];

/// One decoded face, indices as stored
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FaceRecord {
    pub flags: FaceFlags,
    pub vertices: Corners,
    /// Index into the document's `materials` table; negative values read as none
    pub material: Option<u32>,
    /// One entry per UV layer
    pub face_uvs: Vec<u32>,
    /// One entry per UV layer
    pub vertex_uvs: Vec<Corners>,
    pub face_normal: Option<u32>,
    pub vertex_normals: Option<Corners>,
    pub face_color: Option<u32>,
    pub vertex_colors: Option<Corners>,
}

impl FaceRecord {
    pub fn corners(&self) -> usize {
        self.flags.corners()
    }

    /// Triangles as corner positions, in source winding.
    ///
    /// Stored triangles are `0, 2, 1` of the source, so reading positions
    /// `0, 2, 1` restores the original order. Quads split along `1-3`.
    pub fn triangles(&self) -> &'static [[usize; 3]] {
        if self.flags.contains(FaceFlags::QUAD) {
            &[[0, 3, 1], [1, 3, 2]]
        } else {
            &[[0, 2, 1]]
        }
    }

    /// Vertex indices of every triangle, in source winding
    pub fn vertex_triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.triangles()
            .iter()
            .map(move |t| t.map(|corner| self.vertices[corner]))
    }
}

/// Iterates the faces of a stream.
///
/// Stops after the first error.
pub struct FaceReader<'a> {
    stream: &'a [i64],
    offset: usize,
    uv_layers: usize,
    failed: bool,
}

impl<'a> FaceReader<'a> {
    pub fn new(stream: &'a [i64], uv_layers: usize) -> Self {
        Self {
            stream,
            offset: 0,
            uv_layers,
            failed: false,
        }
    }

    /// Offset of the next face
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn index(&mut self) -> Result<u32, FaceError> {
        let at = self.offset;
        let value = self.stream[at];
        self.offset += 1;
        u32::try_from(value).map_err(|_| FaceError::NegativeIndex { offset: at, value })
    }

    fn corners(&mut self, n: usize) -> Result<Corners, FaceError> {
        let mut out = [0; 4];
        for slot in out.iter_mut().take(n) {
            *slot = self.index()?;
        }
        Ok(out)
    }

    fn read_face(&mut self) -> Result<FaceRecord, FaceError> {
        let start = self.offset;
        let raw = self.stream[start];
        let flags = u32::try_from(raw)
            .ok()
            .filter(|bits| *bits <= 0xFF)
            .map(FaceFlags::from_bits)
            .ok_or(FaceError::InvalidFlags { offset: start, value: raw })?;

        let needed = flags.payload_len(self.uv_layers);
        let remaining = self.stream.len() - start - 1;
        if needed > remaining {
            return Err(FaceError::Truncated {
                offset: start,
                needed,
                remaining,
            });
        }
        self.offset += 1;

        let n = flags.corners();
        let mut face = FaceRecord {
            flags,
            vertices: self.corners(n)?,
            ..FaceRecord::default()
        };

        if flags.contains(FaceFlags::MATERIAL) {
            let value = self.stream[self.offset];
            self.offset += 1;
            face.material = u32::try_from(value).ok();
        }
        if flags.contains(FaceFlags::FACE_UV) {
            for _ in 0..self.uv_layers {
                let uv = self.index()?;
                face.face_uvs.push(uv);
            }
        }
        if flags.contains(FaceFlags::FACE_VERTEX_UV) {
            for _ in 0..self.uv_layers {
                let uvs = self.corners(n)?;
                face.vertex_uvs.push(uvs);
            }
        }
        if flags.contains(FaceFlags::FACE_NORMAL) {
            face.face_normal = Some(self.index()?);
        }
        if flags.contains(FaceFlags::FACE_VERTEX_NORMAL) {
            face.vertex_normals = Some(self.corners(n)?);
        }
        if flags.contains(FaceFlags::FACE_COLOR) {
            face.face_color = Some(self.index()?);
        }
        if flags.contains(FaceFlags::FACE_VERTEX_COLOR) {
            face.vertex_colors = Some(self.corners(n)?);
        }
        Ok(face)
    }
}

impl Iterator for FaceReader<'_> {
    type Item = Result<FaceRecord, FaceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.stream.len() {
            return None;
        }
        let result = self.read_face();
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exporter_flags() {
        let mut out = Vec::new();
        encode_triangle(&mut out, [4, 5, 6], Some(2), true);
        assert_eq!(out, vec![42, 4, 6, 5, 2, 4, 6, 5, 4, 6, 5]);

        out.clear();
        encode_triangle(&mut out, [4, 5, 6], Some(0), false);
        assert_eq!(out, vec![34, 4, 6, 5, 0, 4, 6, 5]);
    }

    #[test]
    fn test_payload_len() {
        let flags = FaceFlags::from_bits(42);
        assert_eq!(flags.payload_len(1), 3 + 1 + 3 + 3);
        assert_eq!(FaceFlags::from_bits(34).payload_len(1), 3 + 1 + 3);
        assert_eq!(FaceFlags::QUAD.payload_len(1), 4);
        assert_eq!((FaceFlags::QUAD | FaceFlags::FACE_VERTEX_UV).payload_len(2), 4 + 8);
    }

    #[test]
    fn test_read_restores_source_winding() {
        let mut stream = Vec::new();
        encode_triangle(&mut stream, [0, 1, 2], Some(0), true);
        encode_triangle(&mut stream, [2, 3, 0], Some(1), true);

        let faces: Vec<_> = FaceReader::new(&stream, 1).collect::<Result<_, _>>().unwrap();
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[1].material, Some(1));
        let tris: Vec<_> = faces.iter().flat_map(|f| f.vertex_triangles()).collect();
        assert_eq!(tris, vec![[0, 1, 2], [2, 3, 0]]);
    }

    #[test]
    fn test_quad_with_face_uv_per_layer() {
        // quad, face uv on two layers, face normal
        let flags = (FaceFlags::QUAD | FaceFlags::FACE_UV | FaceFlags::FACE_NORMAL).bits() as i64;
        let stream = [flags, 0, 1, 2, 3, 7, 8, 9];
        let faces: Vec<_> = FaceReader::new(&stream, 2).collect::<Result<_, _>>().unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].face_uvs, vec![7, 8]);
        assert_eq!(faces[0].face_normal, Some(9));
        assert_eq!(faces[0].vertex_triangles().count(), 2);
    }

    #[test]
    fn test_missing_material_reads_as_none() {
        let stream = [34, 0, 2, 1, -1, 0, 2, 1];
        let face = FaceReader::new(&stream, 1).next().unwrap().unwrap();
        assert_eq!(face.material, None);
    }

    #[test]
    fn test_truncated_stream() {
        let stream = [42, 0, 2, 1, 0, 0, 2];
        let mut reader = FaceReader::new(&stream, 1);
        assert!(matches!(
            reader.next(),
            Some(Err(FaceError::Truncated { offset: 0, needed: 10, remaining: 6 }))
        ));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_invalid_flags() {
        let stream = [-3, 0, 1, 2];
        assert!(matches!(
            FaceReader::new(&stream, 1).next(),
            Some(Err(FaceError::InvalidFlags { .. }))
        ));
    }
}
