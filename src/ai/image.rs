use base64::Engine;

/// Raw image bytes with the format recognized from their header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImagePayload<'a> {
    pub mime_type: &'static str,
    pub bytes: &'a [u8],
}

impl<'a> ImagePayload<'a> {
    /// Recognize the image format from its magic bytes.
    pub fn decode(bytes: &'a [u8]) -> anyhow::Result<Self> {
        let mime_type = sniff_mime(bytes)
            .ok_or_else(|| anyhow::anyhow!("Unrecognized image data ({} bytes)", bytes.len()))?;
        Ok(Self { mime_type, bytes })
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.bytes)
    }
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        return Some("image/png");
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    // ISO-BMFF: size(4) "ftyp" brand(4)
    if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
        return match &bytes[8..12] {
            b"heic" | b"heix" | b"hevc" | b"heim" | b"heis" => Some("image/heic"),
            b"mif1" | b"msf1" => Some("image/heif"),
            _ => None,
        };
    }
    None
}
