//! # Accessors — Typed Views Over Raw Buffers
//!
//! An accessor says "read `count` elements of shape `VEC3`, each component a
//! little-endian `f32`, starting at byte N, every `stride` bytes". This module
//! turns that description into a freshly allocated typed array.
//!
//! ## Layout
//!
//! ```text
//!  buffer: [ .......... | e0c0 e0c1 e0c2 pad | e1c0 e1c1 e1c2 pad | ... ]
//!                       ^ view.byteOffset + accessor.byteOffset
//!                       |<----- stride ----->|
//! ```
//!
//! Stride comes from the buffer view; when absent the elements are tightly
//! packed (stride = element size). Every element must lie inside its buffer
//! view, and the view inside its buffer.
//!
//! Accessors with no buffer view decode to zeros, up to
//! [`MAX_ZEROED_VALUES`]. The `sparse` substitution block is not read: a
//! sparse accessor yields its base data (or zeros) unmodified.
//!
//! ## Comparison
//!
//! - **gltf crate**: `Reader` iterators over each semantic with built-in
//!   normalization helpers.
//! - **three.js**: `BufferAttribute` wraps a typed array view, sharing the
//!   underlying `ArrayBuffer` when the data is tightly packed.
//! - **Our approach**: always copy into an owned `Vec<T>`, one element at a
//!   time, honouring stride. Simple and bounds-checked up front.

use serde::Deserialize;

use super::schema::{Document, lookup};

/// Scalar type of each component (glTF `componentType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u32")]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

impl ComponentType {
    pub fn size(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::U32 | Self::F32 => 4,
        }
    }
}

impl TryFrom<u32> for ComponentType {
    type Error = String;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            5120 => Ok(Self::I8),
            5121 => Ok(Self::U8),
            5122 => Ok(Self::I16),
            5123 => Ok(Self::U16),
            5125 => Ok(Self::U32),
            5126 => Ok(Self::F32),
            other => Err(format!("unsupported componentType {other}")),
        }
    }
}

/// Shape of each element (glTF accessor `type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ElementShape {
    #[serde(rename = "SCALAR")]
    Scalar,
    #[serde(rename = "VEC2")]
    Vec2,
    #[serde(rename = "VEC3")]
    Vec3,
    #[serde(rename = "VEC4")]
    Vec4,
    #[serde(rename = "MAT2")]
    Mat2,
    #[serde(rename = "MAT3")]
    Mat3,
    #[serde(rename = "MAT4")]
    Mat4,
}

impl ElementShape {
    /// Number of components per element.
    pub fn components(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 | Self::Mat2 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
        }
    }
}

/// Decoded accessor contents, one variant per component type.
///
/// Values are stored flat: element `i`, component `j` lives at
/// `i * shape.components() + j`.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessorData {
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    F32(Vec<f32>),
}

macro_rules! map_values {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            AccessorData::I8(values) => values.iter().map(|&$v| $body).collect(),
            AccessorData::U8(values) => values.iter().map(|&$v| $body).collect(),
            AccessorData::I16(values) => values.iter().map(|&$v| $body).collect(),
            AccessorData::U16(values) => values.iter().map(|&$v| $body).collect(),
            AccessorData::U32(values) => values.iter().map(|&$v| $body).collect(),
            AccessorData::F32(values) => values.iter().map(|&$v| $body).collect(),
        }
    };
}

impl AccessorData {
    pub fn component_type(&self) -> ComponentType {
        match self {
            Self::I8(_) => ComponentType::I8,
            Self::U8(_) => ComponentType::U8,
            Self::I16(_) => ComponentType::I16,
            Self::U16(_) => ComponentType::U16,
            Self::U32(_) => ComponentType::U32,
            Self::F32(_) => ComponentType::F32,
        }
    }

    /// Total number of scalar values (elements × components).
    pub fn len(&self) -> usize {
        match self {
            Self::I8(v) => v.len(),
            Self::U8(v) => v.len(),
            Self::I16(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
            Self::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Plain numeric conversion, no normalization.
    pub fn to_f32(&self) -> Vec<f32> {
        map_values!(self, v => v as f32)
    }

    /// Conversion used for `COLOR_0`: unsigned bytes are divided by 255 and
    /// unsigned shorts by 65535. Every other type passes through unchanged.
    pub fn to_unit_f32(&self) -> Vec<f32> {
        match self {
            Self::U8(values) => values.iter().map(|&v| v as f32 / 255.0).collect(),
            Self::U16(values) => values.iter().map(|&v| v as f32 / 65535.0).collect(),
            other => other.to_f32(),
        }
    }

    /// Conversion used for index accessors.
    pub fn to_u32(&self) -> Vec<u32> {
        map_values!(self, v => v as u32)
    }
}

/// A fixed-size little-endian component.
trait Component: Copy + Default {
    const SIZE: usize;
    fn from_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_component {
    ($($ty:ty),*) => {$(
        impl Component for $ty {
            const SIZE: usize = std::mem::size_of::<$ty>();

            fn from_le(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(&bytes[..Self::SIZE]);
                <$ty>::from_le_bytes(raw)
            }
        }
    )*};
}

impl_component!(i8, u8, i16, u16, u32, f32);

/// Where the elements of one accessor live inside its buffer.
#[derive(Debug, Clone, Copy)]
struct Layout {
    offset: usize,
    stride: usize,
    count: usize,
    components: usize,
}

fn decode<T: Component>(bytes: &[u8], layout: Layout) -> Vec<T> {
    let mut out = Vec::with_capacity(layout.count * layout.components);
    for i in 0..layout.count {
        let element = layout.offset + i * layout.stride;
        for j in 0..layout.components {
            let at = element + j * T::SIZE;
            out.push(T::from_le(&bytes[at..at + T::SIZE]));
        }
    }
    out
}

fn zeroed<T: Component>(len: usize) -> Vec<T> {
    vec![T::default(); len]
}

fn dispatch(ty: ComponentType, f: impl DecodeFn) -> AccessorData {
    match ty {
        ComponentType::I8 => AccessorData::I8(f.run()),
        ComponentType::U8 => AccessorData::U8(f.run()),
        ComponentType::I16 => AccessorData::I16(f.run()),
        ComponentType::U16 => AccessorData::U16(f.run()),
        ComponentType::U32 => AccessorData::U32(f.run()),
        ComponentType::F32 => AccessorData::F32(f.run()),
    }
}

/// Generic-over-`T` closure stand-in.
trait DecodeFn {
    fn run<T: Component>(&self) -> Vec<T>;
}

struct FromBytes<'a> {
    bytes: &'a [u8],
    layout: Layout,
}

impl DecodeFn for FromBytes<'_> {
    fn run<T: Component>(&self) -> Vec<T> {
        decode(self.bytes, self.layout)
    }
}

struct Zeroed(usize);

impl DecodeFn for Zeroed {
    fn run<T: Component>(&self) -> Vec<T> {
        zeroed(self.0)
    }
}

/// Largest zero-filled placeholder accepted, in scalar values.
pub const MAX_ZEROED_VALUES: usize = 1 << 26;

/// Decode accessor `index` from the loaded buffers.
///
/// `buffers[i]` is `None` when buffer `i` had no data (no URI in a `.gltf`,
/// or a GLB without a binary chunk). The error string names the offending
/// accessor, view or buffer.
pub fn read_accessor(
    doc: &Document,
    buffers: &[Option<Vec<u8>>],
    index: usize,
) -> Result<AccessorData, String> {
    let accessor = lookup(&doc.accessors, index, "accessors")?;
    let components = accessor.shape.components();
    let element_size = accessor.component_type.size() * components;

    let Some(view_index) = accessor.buffer_view else {
        let len = accessor
            .count
            .checked_mul(components)
            .filter(|&len| len <= MAX_ZEROED_VALUES)
            .ok_or_else(|| {
                format!(
                    "accessors[{index}]: {} placeholder elements exceed the limit of {MAX_ZEROED_VALUES} values",
                    accessor.count
                )
            })?;
        return Ok(dispatch(accessor.component_type, Zeroed(len)));
    };

    let view = lookup(&doc.buffer_views, view_index, "bufferViews")?;
    let buffer = buffers
        .get(view.buffer)
        .and_then(Option::as_deref)
        .ok_or_else(|| format!("buffer {} not loaded (bufferViews[{view_index}])", view.buffer))?;

    let view_start = view.byte_offset.unwrap_or(0);
    let view_end = view_start
        .checked_add(view.byte_length)
        .filter(|&end| end <= buffer.len())
        .ok_or_else(|| {
            format!(
                "bufferViews[{view_index}]: {} bytes at offset {view_start} overrun buffer {} of {} bytes",
                view.byte_length,
                view.buffer,
                buffer.len()
            )
        })?;

    let stride = view.byte_stride.unwrap_or(element_size);
    if stride < element_size {
        return Err(format!(
            "accessors[{index}]: byteStride {stride} is smaller than element size {element_size}"
        ));
    }

    let offset = view_start.checked_add(accessor.byte_offset.unwrap_or(0));
    let end = match (offset, accessor.count) {
        (Some(offset), 0) => Some(offset),
        (Some(offset), n) => (n - 1)
            .checked_mul(stride)
            .and_then(|span| span.checked_add(offset))
            .and_then(|last| last.checked_add(element_size)),
        (None, _) => None,
    };
    let offset = match (offset, end) {
        (Some(offset), Some(end)) if end <= view_end => offset,
        _ => {
            return Err(format!(
                "accessors[{index}]: {} elements at byteOffset {} (stride {stride}) overrun bufferViews[{view_index}] of {} bytes",
                accessor.count,
                accessor.byte_offset.unwrap_or(0),
                view.byte_length
            ));
        }
    };

    let layout = Layout {
        offset,
        stride,
        count: accessor.count,
        components,
    };
    Ok(dispatch(
        accessor.component_type,
        FromBytes {
            bytes: buffer,
            layout,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(json: &str) -> Document {
        serde_json::from_str(json).unwrap()
    }

    fn f32_bytes(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn tightly_packed_vec3() {
        let doc = doc(r#"{
            "bufferViews": [{ "buffer": 0, "byteLength": 24 }],
            "accessors": [{ "bufferView": 0, "componentType": 5126, "count": 2, "type": "VEC3" }]
        }"#);
        let buffers = vec![Some(f32_bytes(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]))];
        let data = read_accessor(&doc, &buffers, 0).unwrap();
        assert_eq!(data, AccessorData::F32(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
    }

    #[test]
    fn interleaved_stride_and_offsets() {
        // Two vertices of [pos.xyz, pad] with the view starting 4 bytes in
        // and the accessor reading the second float of each element.
        let mut bytes = vec![0xAA; 4];
        bytes.extend(f32_bytes(&[0.0, 1.0, 2.0, 9.0, 10.0, 11.0, 12.0, 9.0]));
        let doc = doc(r#"{
            "bufferViews": [{ "buffer": 0, "byteOffset": 4, "byteLength": 32, "byteStride": 16 }],
            "accessors": [{ "bufferView": 0, "byteOffset": 4, "componentType": 5126, "count": 2, "type": "VEC2" }]
        }"#);
        let data = read_accessor(&doc, &[Some(bytes)], 0).unwrap();
        assert_eq!(data.to_f32(), vec![1.0, 2.0, 11.0, 12.0]);
    }

    #[test]
    fn integer_component_types() {
        let doc = doc(r#"{
            "bufferViews": [{ "buffer": 0, "byteLength": 16 }],
            "accessors": [
                { "bufferView": 0, "componentType": 5120, "count": 2, "type": "SCALAR" },
                { "bufferView": 0, "componentType": 5121, "count": 2, "type": "SCALAR" },
                { "bufferView": 0, "componentType": 5122, "count": 2, "type": "SCALAR" },
                { "bufferView": 0, "componentType": 5123, "count": 2, "type": "SCALAR" },
                { "bufferView": 0, "componentType": 5125, "count": 2, "type": "SCALAR" }
            ]
        }"#);
        let bytes = vec![0xFF, 0x01, 0x02, 0x00, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let buffers = [Some(bytes)];
        assert_eq!(read_accessor(&doc, &buffers, 0).unwrap(), AccessorData::I8(vec![-1, 1]));
        assert_eq!(read_accessor(&doc, &buffers, 1).unwrap(), AccessorData::U8(vec![255, 1]));
        assert_eq!(read_accessor(&doc, &buffers, 2).unwrap(), AccessorData::I16(vec![0x01FF, 2]));
        assert_eq!(read_accessor(&doc, &buffers, 3).unwrap(), AccessorData::U16(vec![0x01FF, 2]));
        assert_eq!(read_accessor(&doc, &buffers, 4).unwrap(), AccessorData::U32(vec![0x0002_01FF, 0]));
    }

    #[test]
    fn missing_buffer_view_is_zero_filled() {
        let doc = doc(r#"{ "accessors": [{ "componentType": 5123, "count": 4, "type": "VEC2" }] }"#);
        let data = read_accessor(&doc, &[], 0).unwrap();
        assert_eq!(data, AccessorData::U16(vec![0; 8]));
    }

    #[test]
    fn color_normalization() {
        assert_eq!(AccessorData::U8(vec![255, 0]).to_unit_f32(), vec![1.0, 0.0]);
        assert_eq!(AccessorData::U16(vec![65535, 0]).to_unit_f32(), vec![1.0, 0.0]);
        assert_eq!(AccessorData::F32(vec![0.25, 2.0]).to_unit_f32(), vec![0.25, 2.0]);
    }

    #[test]
    fn stride_smaller_than_element_is_rejected() {
        let doc = doc(r#"{
            "bufferViews": [{ "buffer": 0, "byteLength": 24, "byteStride": 8 }],
            "accessors": [{ "bufferView": 0, "componentType": 5126, "count": 2, "type": "VEC3" }]
        }"#);
        let err = read_accessor(&doc, &[Some(vec![0; 24])], 0).unwrap_err();
        assert!(err.contains("byteStride"), "got {err}");
    }

    #[test]
    fn overrun_is_an_error_not_a_panic() {
        let doc = doc(r#"{
            "bufferViews": [{ "buffer": 0, "byteLength": 12 }],
            "accessors": [{ "bufferView": 0, "componentType": 5126, "count": 2, "type": "VEC3" }]
        }"#);
        let err = read_accessor(&doc, &[Some(vec![0; 12])], 0).unwrap_err();
        assert!(err.contains("overrun"), "got {err}");
    }

    #[test]
    fn accessor_cannot_read_into_the_next_view() {
        // One 24-byte buffer split into two 12-byte views. Two VEC3 elements
        // from the first view would silently read the second view's floats.
        let doc = doc(r#"{
            "bufferViews": [
                { "buffer": 0, "byteLength": 12 },
                { "buffer": 0, "byteOffset": 12, "byteLength": 12 }
            ],
            "accessors": [
                { "bufferView": 0, "componentType": 5126, "count": 2, "type": "VEC3" },
                { "bufferView": 1, "componentType": 5126, "count": 1, "type": "VEC3" }
            ]
        }"#);
        let buffers = [Some(f32_bytes(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]))];
        let err = read_accessor(&doc, &buffers, 0).unwrap_err();
        assert!(err.contains("overrun bufferViews[0]"), "got {err}");
        assert_eq!(read_accessor(&doc, &buffers, 1).unwrap().to_f32(), vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn view_past_buffer_end_is_rejected() {
        let doc = doc(r#"{
            "bufferViews": [{ "buffer": 0, "byteOffset": 8, "byteLength": 12 }],
            "accessors": [{ "bufferView": 0, "componentType": 5126, "count": 1, "type": "SCALAR" }]
        }"#);
        let err = read_accessor(&doc, &[Some(vec![0; 12])], 0).unwrap_err();
        assert!(err.contains("bufferViews[0]"), "got {err}");
    }

    #[test]
    fn huge_offsets_do_not_overflow() {
        let json = format!(
            r#"{{
            "bufferViews": [{{ "buffer": 0, "byteLength": 12 }}],
            "accessors": [{{ "bufferView": 0, "byteOffset": {}, "componentType": 5126, "count": 1, "type": "VEC3" }}]
        }}"#,
            usize::MAX
        );
        let err = read_accessor(&doc(&json), &[Some(vec![0; 12])], 0).unwrap_err();
        assert!(err.contains("overrun"), "got {err}");
    }

    #[test]
    fn oversized_placeholder_is_rejected() {
        let json = format!(
            r#"{{ "accessors": [{{ "componentType": 5126, "count": {}, "type": "VEC3" }}] }}"#,
            usize::MAX / 3 + 1
        );
        let err = read_accessor(&doc(&json), &[], 0).unwrap_err();
        assert!(err.contains("placeholder"), "got {err}");

        let json = format!(
            r#"{{ "accessors": [{{ "componentType": 5126, "count": {}, "type": "SCALAR" }}] }}"#,
            MAX_ZEROED_VALUES + 1
        );
        assert!(read_accessor(&doc(&json), &[], 0).is_err());
    }

    #[test]
    fn unloaded_buffer_is_reported() {
        let doc = doc(r#"{
            "bufferViews": [{ "buffer": 0, "byteLength": 12 }],
            "accessors": [{ "bufferView": 0, "componentType": 5126, "count": 1, "type": "VEC3" }]
        }"#);
        let err = read_accessor(&doc, &[None], 0).unwrap_err();
        assert!(err.contains("buffer 0 not loaded"), "got {err}");
    }

    #[test]
    fn matrix_shapes_have_full_component_counts() {
        assert_eq!(ElementShape::Mat2.components(), 4);
        assert_eq!(ElementShape::Mat3.components(), 9);
        assert_eq!(ElementShape::Mat4.components(), 16);
    }
}
