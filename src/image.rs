use crate::gemini::GeminiInlineData;
use anyhow::Context;
use base64::Engine;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// An image held in memory for exactly one conversion attempt. Never written
/// back to disk.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImagePayload {
    /// Load from a file path. The MIME type comes from the extension with an
    /// image/jpeg fallback; no image filter is applied on this route, the
    /// server rejects junk on its own.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("could not read image file {}", path.display()))?;
        let mime_type = mime_from_extension(path)
            .unwrap_or("image/jpeg")
            .to_string();
        debug!("Loaded {} bytes from {} as {}", bytes.len(), path.display(), mime_type);
        Ok(Self { bytes, mime_type })
    }

    /// Load from piped stdin. Unlike the file route, piped data is sniffed
    /// and anything that is not an image is rejected up front.
    pub fn from_reader(reader: &mut impl Read) -> anyhow::Result<Self> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .context("could not read image data from stdin")?;
        let mime_type = match sniff_image_mime(&bytes) {
            Some(mime) => mime.to_string(),
            None => anyhow::bail!("piped data is not an image (JPG, PNG and WEBP are supported)"),
        };
        Ok(Self { bytes, mime_type })
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_inline_data(&self) -> GeminiInlineData {
        GeminiInlineData {
            mime_type: self.mime_type.clone(),
            data: base64::engine::general_purpose::STANDARD.encode(&self.bytes),
        }
    }
}

fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// Magic-byte sniff for the formats the endpoint accepts.
fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(b"\xff\xd8\xff") {
        Some("image/jpeg")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else {
        None
    }
}
