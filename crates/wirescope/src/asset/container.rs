//! Container framing: the binary GLB layout and entry-file selection.
//!
//! ```text
//!  GLB:  magic "glTF" | version 2 | total length      (12-byte header)
//!        chunk length | "JSON"    | JSON payload
//!        chunk length | "BIN\0"   | binary payload    (optional)
//! ```
//!
//! All integers are little-endian `u32`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::LoadError;

use super::NamedFile;

pub const GLB_MAGIC: u32 = 0x4654_6C67;
pub const GLB_VERSION: u32 = 2;
pub const CHUNK_JSON: u32 = 0x4E4F_534A;
pub const CHUNK_BIN: u32 = 0x004E_4942;

const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

/// How the entry file should be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Self-contained binary container.
    Glb,
    /// JSON document with inline or external buffers.
    Gltf,
}

/// The JSON and optional binary payload of a GLB.
#[derive(Debug)]
pub struct GlbChunks<'a> {
    pub json: &'a [u8],
    pub bin: Option<&'a [u8]>,
}

/// Pick the entry file out of a named-blob set: the first `.glb` or `.gltf`
/// by case-insensitive extension.
pub fn find_entry(files: &[NamedFile]) -> Result<(&NamedFile, ContainerKind), LoadError> {
    files
        .iter()
        .find_map(|file| {
            let name = file.name.to_ascii_lowercase();
            if name.ends_with(".glb") {
                Some((file, ContainerKind::Glb))
            } else if name.ends_with(".gltf") {
                Some((file, ContainerKind::Gltf))
            } else {
                None
            }
        })
        .ok_or_else(|| {
            let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
            LoadError::format(names.join(", "), "no .gltf or .glb file found")
        })
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let raw = bytes.get(at..at + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

/// Split a GLB into its chunks, validating header and chunk types.
pub fn split_glb<'a>(bytes: &'a [u8], file: &str) -> Result<GlbChunks<'a>, LoadError> {
    if bytes.len() < HEADER_LEN {
        return Err(LoadError::format(
            file,
            format!("GLB too short ({} bytes)", bytes.len()),
        ));
    }
    let magic = read_u32(bytes, 0).unwrap_or_default();
    if magic != GLB_MAGIC {
        return Err(LoadError::format(
            file,
            format!("invalid GLB magic 0x{magic:08X}"),
        ));
    }
    let version = read_u32(bytes, 4).unwrap_or_default();
    if version != GLB_VERSION {
        return Err(LoadError::format(
            file,
            format!("unsupported glTF version: {version}"),
        ));
    }

    let (json_type, json) = read_chunk(bytes, HEADER_LEN)
        .ok_or_else(|| LoadError::format(file, "truncated JSON chunk"))?;
    if json_type != CHUNK_JSON {
        return Err(LoadError::format(
            file,
            format!("first chunk is not JSON (type 0x{json_type:08X})"),
        ));
    }

    let next = HEADER_LEN + CHUNK_HEADER_LEN + json.len();
    let bin = if next < bytes.len() {
        match read_chunk(bytes, next) {
            Some((CHUNK_BIN, bin)) => {
                log::debug!("{file}: GLB binary chunk {} bytes", bin.len());
                Some(bin)
            }
            Some((other, _)) => {
                log::debug!("{file}: ignoring GLB chunk type 0x{other:08X}");
                None
            }
            None => return Err(LoadError::format(file, "truncated binary chunk")),
        }
    } else {
        None
    };

    Ok(GlbChunks { json, bin })
}

fn read_chunk(bytes: &[u8], at: usize) -> Option<(u32, &[u8])> {
    let len = read_u32(bytes, at)? as usize;
    let kind = read_u32(bytes, at + 4)?;
    let start = at + CHUNK_HEADER_LEN;
    let payload = bytes.get(start..start.checked_add(len)?)?;
    Some((kind, payload))
}

/// Build a GLB from its parts. Used by tests and by tooling that re-packs
/// `.gltf` assets.
pub fn pack_glb(json: &[u8], bin: Option<&[u8]>) -> Vec<u8> {
    fn padded(data: &[u8], pad: u8) -> Vec<u8> {
        let mut out = data.to_vec();
        while out.len() % 4 != 0 {
            out.push(pad);
        }
        out
    }

    let json = padded(json, b' ');
    let bin = bin.map(|b| padded(b, 0));
    let total = HEADER_LEN
        + CHUNK_HEADER_LEN
        + json.len()
        + bin.as_ref().map_or(0, |b| CHUNK_HEADER_LEN + b.len());

    let mut out = Vec::with_capacity(total);
    out.extend(GLB_MAGIC.to_le_bytes());
    out.extend(GLB_VERSION.to_le_bytes());
    out.extend((total as u32).to_le_bytes());
    out.extend((json.len() as u32).to_le_bytes());
    out.extend(CHUNK_JSON.to_le_bytes());
    out.extend(&json);
    if let Some(bin) = bin {
        out.extend((bin.len() as u32).to_le_bytes());
        out.extend(CHUNK_BIN.to_le_bytes());
        out.extend(&bin);
    }
    out
}

/// Payload of a `data:` URI.
#[derive(Debug, PartialEq)]
pub struct DataUri<'a> {
    pub mime_type: Option<&'a str>,
    pub bytes: Vec<u8>,
}

/// Decode a base64 `data:[<mime>][;base64],<payload>` URI. Returns `None` when
/// `uri` is not a data URI at all.
pub fn decode_data_uri(uri: &str) -> Option<Result<DataUri<'_>, String>> {
    let rest = uri.strip_prefix("data:")?;
    let Some((meta, payload)) = rest.split_once(',') else {
        return Some(Err("data URI without ',' separator".into()));
    };
    let Some(mime) = meta.strip_suffix(";base64") else {
        return Some(Err(format!("data URI is not base64 ({meta})")));
    };
    let mime_type = (!mime.is_empty()).then_some(mime);
    Some(
        STANDARD
            .decode(payload.trim())
            .map(|bytes| DataUri { mime_type, bytes })
            .map_err(|e| format!("invalid base64 in data URI: {e}")),
    )
}

/// Find a companion file for a relative URI. Only the last path segment is
/// compared, ignoring ASCII case, so `textures/Wood.PNG` matches `wood.png`.
pub fn find_companion<'a>(files: &'a [NamedFile], uri: &str) -> Option<&'a NamedFile> {
    let wanted = uri.rsplit('/').next().unwrap_or(uri);
    files.iter().find(|f| f.name.eq_ignore_ascii_case(wanted))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> NamedFile {
        NamedFile::new(name, Vec::new())
    }

    #[test]
    fn entry_is_first_gltf_or_glb() {
        let files = [named("scene.bin"), named("Model.GLTF"), named("other.glb")];
        let (entry, kind) = find_entry(&files).unwrap();
        assert_eq!(entry.name, "Model.GLTF");
        assert_eq!(kind, ContainerKind::Gltf);
    }

    #[test]
    fn no_entry_is_a_format_error() {
        let files = [named("a.bin"), named("b.png")];
        let err = find_entry(&files).unwrap_err();
        assert!(matches!(err, LoadError::Format { .. }));
        assert!(err.to_string().contains("no .gltf or .glb"));
    }

    #[test]
    fn data_uri_decodes_base64() {
        let uri = format!("data:application/octet-stream;base64,{}", STANDARD.encode([1u8, 2, 3]));
        let data = decode_data_uri(&uri).unwrap().unwrap();
        assert_eq!(data.mime_type, Some("application/octet-stream"));
        assert_eq!(data.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn data_uri_errors_and_non_data_uris() {
        assert!(decode_data_uri("scene.bin").is_none());
        assert!(decode_data_uri("data:;base64,@@@").unwrap().is_err());
        assert!(decode_data_uri("data:text/plain,hello").unwrap().is_err());
    }

    #[test]
    fn companion_lookup_uses_last_segment_case_insensitively() {
        let files = [named("scene.gltf"), named("wood.png")];
        let found = find_companion(&files, "textures/Wood.PNG").unwrap();
        assert_eq!(found.name, "wood.png");
        assert!(find_companion(&files, "stone.png").is_none());
    }

    #[test]
    fn split_round_trips_chunks() {
        let glb = pack_glb(br#"{"asset":{}}"#, Some(&[1, 2, 3]));
        let chunks = split_glb(&glb, "t.glb").unwrap();
        assert!(chunks.json.starts_with(br#"{"asset":{}}"#));
        // Binary chunk is padded to a 4-byte boundary.
        assert_eq!(chunks.bin, Some(&[1u8, 2, 3, 0][..]));
    }

    #[test]
    fn json_only_glb_has_no_bin() {
        let glb = pack_glb(b"{}", None);
        assert!(split_glb(&glb, "t.glb").unwrap().bin.is_none());
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut glb = pack_glb(b"{}", None);
        glb[0] = b'x';
        let err = split_glb(&glb, "t.glb").unwrap_err();
        assert!(err.to_string().contains("magic"), "got {err}");
    }

    #[test]
    fn wrong_version_is_rejected() {
        let mut glb = pack_glb(b"{}", None);
        glb[4] = 1;
        let err = split_glb(&glb, "t.glb").unwrap_err();
        assert!(err.to_string().contains("version: 1"), "got {err}");
    }

    #[test]
    fn first_chunk_must_be_json() {
        let mut glb = pack_glb(b"{}", None);
        glb[16..20].copy_from_slice(&CHUNK_BIN.to_le_bytes());
        let err = split_glb(&glb, "t.glb").unwrap_err();
        assert!(err.to_string().contains("not JSON"), "got {err}");
    }

    #[test]
    fn truncated_json_chunk_is_rejected() {
        let mut glb = pack_glb(b"{}", None);
        glb[12..16].copy_from_slice(&1000u32.to_le_bytes());
        assert!(split_glb(&glb, "t.glb").is_err());
        assert!(split_glb(&glb[..8], "t.glb").is_err());
    }
}
