//! Image resolution and decoding.
//!
//! An image comes from a buffer-view slice, an inline data URI, or a
//! companion file. Every failure on this path is non-fatal: the image slot
//! becomes `None` and the texture that referenced it falls back to its
//! default.

use image::ImageFormat;

use super::NamedFile;
use super::container::{decode_data_uri, find_companion};
use super::schema::{Document, Image};

/// Decoded RGBA8 pixels, ready for upload.
#[derive(Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

/// Decode an encoded image (PNG or JPEG). `mime_type` is a hint; if it is
/// missing or unrecognised the format is sniffed from the bytes.
pub fn decode_image(bytes: &[u8], mime_type: Option<&str>) -> Result<DecodedImage, String> {
    let decoded = match mime_type.and_then(ImageFormat::from_mime_type) {
        Some(format) => image::load_from_memory_with_format(bytes, format),
        None => image::load_from_memory(bytes),
    }
    .map_err(|e| e.to_string())?;
    let rgba = decoded.to_rgba8();
    Ok(DecodedImage {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    })
}

/// Locate the encoded bytes of one image definition.
fn image_bytes<'a>(
    doc: &Document,
    buffers: &'a [Option<Vec<u8>>],
    files: &'a [NamedFile],
    image: &Image,
) -> Result<(std::borrow::Cow<'a, [u8]>, Option<String>), String> {
    use std::borrow::Cow;

    if let Some(view_index) = image.buffer_view {
        let view = doc
            .buffer_views
            .get(view_index)
            .ok_or_else(|| format!("bufferViews[{view_index}] out of range"))?;
        let buffer = buffers
            .get(view.buffer)
            .and_then(Option::as_deref)
            .ok_or_else(|| format!("buffer {} not loaded", view.buffer))?;
        let start = view.byte_offset.unwrap_or(0);
        let slice = start
            .checked_add(view.byte_length)
            .and_then(|end| buffer.get(start..end))
            .ok_or_else(|| {
                format!(
                    "bufferViews[{view_index}] ({start}+{}) overruns buffer of {} bytes",
                    view.byte_length,
                    buffer.len()
                )
            })?;
        let mime = image.mime_type.clone().unwrap_or_else(|| "image/png".into());
        return Ok((Cow::Borrowed(slice), Some(mime)));
    }

    let uri = image.uri.as_deref().ok_or("image has neither bufferView nor uri")?;
    if let Some(data) = decode_data_uri(uri) {
        let data = data?;
        let mime = image
            .mime_type
            .clone()
            .or_else(|| data.mime_type.map(str::to_owned));
        return Ok((Cow::Owned(data.bytes), mime));
    }

    let file = find_companion(files, uri).ok_or_else(|| format!("external image not found: {uri}"))?;
    Ok((Cow::Borrowed(file.bytes.as_slice()), image.mime_type.clone()))
}

/// Resolve and decode every image in the document. The result has one slot
/// per `images[i]`; failed slots are `None`.
pub fn load_images(
    doc: &Document,
    buffers: &[Option<Vec<u8>>],
    files: &[NamedFile],
) -> Vec<Option<DecodedImage>> {
    doc.images
        .iter()
        .enumerate()
        .map(|(i, image)| {
            let decoded = image_bytes(doc, buffers, files, image)
                .and_then(|(bytes, mime)| decode_image(&bytes, mime.as_deref()));
            match decoded {
                Ok(img) => {
                    log::debug!("image {i}: {}x{}", img.width, img.height);
                    Some(img)
                }
                Err(reason) => {
                    log::warn!("image {i} skipped: {reason}");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use image::{ImageBuffer, Rgba};

    fn png_2x1() -> Vec<u8> {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_raw(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 128]).unwrap();
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn doc(json: &str) -> Document {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn decodes_png_to_rgba() {
        let img = decode_image(&png_2x1(), Some("image/png")).unwrap();
        assert_eq!((img.width, img.height), (2, 1));
        assert_eq!(img.rgba, vec![255, 0, 0, 255, 0, 0, 255, 128]);
    }

    #[test]
    fn embedded_buffer_view_slice() {
        let png = png_2x1();
        let json = format!(
            r#"{{ "bufferViews": [{{ "buffer": 0, "byteOffset": 3, "byteLength": {} }}],
                 "images": [{{ "bufferView": 0 }}] }}"#,
            png.len()
        );
        let mut buffer = vec![9, 9, 9];
        buffer.extend(&png);
        let images = load_images(&doc(&json), &[Some(buffer)], &[]);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].as_ref().map(|i| i.width), Some(2));
    }

    #[test]
    fn data_uri_and_external_file() {
        let png = png_2x1();
        let json = format!(
            r#"{{ "images": [
                {{ "uri": "data:image/png;base64,{}" }},
                {{ "uri": "tex/Color.png" }}
            ] }}"#,
            STANDARD.encode(&png)
        );
        let files = [NamedFile::new("color.PNG", png)];
        let images = load_images(&doc(&json), &[], &files);
        assert!(images[0].is_some());
        assert!(images[1].is_some());
    }

    #[test]
    fn failures_are_absent_not_errors() {
        let json = r#"{
            "bufferViews": [{ "buffer": 0, "byteLength": 4 }],
            "images": [
                { "bufferView": 0 },
                { "uri": "missing.png" },
                { "uri": "data:image/png;base64,AAAA" }
            ]
        }"#;
        let images = load_images(&doc(json), &[Some(vec![1, 2, 3, 4])], &[]);
        assert_eq!(images, vec![None, None, None]);
    }
}
