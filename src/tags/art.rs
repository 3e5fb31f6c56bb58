//! Cover art helpers: image type detection by magic bytes.

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8];
const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// MIME type for an image buffer, or `""` when it is neither JPEG nor PNG.
pub(crate) fn mime_type(data: &[u8]) -> &'static str {
    if data.starts_with(JPEG_MAGIC) {
        "image/jpeg"
    } else if data.starts_with(PNG_MAGIC) {
        "image/png"
    } else {
        ""
    }
}
