//! Decoding of `data:image/...;base64,` URLs embedded in QR options.

use base64::Engine as _;

/// Largest decoded image accepted for upload.
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/webp", "webp"),
    ("image/svg+xml", "svg"),
    ("image/gif", "gif"),
];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("Image must be a base64 data URL")]
    Malformed,

    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("Image data is not valid base64")]
    InvalidBase64,

    #[error("Image exceeds {MAX_IMAGE_BYTES} bytes")]
    TooLarge,
}

/// A decoded image ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub content_type: String,
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

/// Returns true when `value` looks like an inline image rather than a URL.
pub fn is_image_data_url(value: &str) -> bool {
    value.starts_with("data:image/")
}

/// Decodes `data:<type>;base64,<payload>`.
///
/// # Errors
///
/// Fails for non-base64 data URLs, content types outside png, jpeg, webp,
/// svg and gif, undecodable payloads and images over [`MAX_IMAGE_BYTES`].
pub fn decode_image(value: &str) -> Result<DecodedImage, DataUrlError> {
    let rest = value.strip_prefix("data:").ok_or(DataUrlError::Malformed)?;
    let (meta, payload) = rest.split_once(',').ok_or(DataUrlError::Malformed)?;
    let content_type = meta
        .strip_suffix(";base64")
        .ok_or(DataUrlError::Malformed)?
        .to_ascii_lowercase();

    let extension = ALLOWED_TYPES
        .iter()
        .find(|(ty, _)| *ty == content_type)
        .map(|(_, ext)| *ext)
        .ok_or_else(|| DataUrlError::UnsupportedType(content_type.clone()))?;

    // Base64 inflates by 4/3; reject oversized payloads before decoding.
    if payload.len() > MAX_IMAGE_BYTES / 3 * 4 + 4 {
        return Err(DataUrlError::TooLarge);
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|_| DataUrlError::InvalidBase64)?;

    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(DataUrlError::TooLarge);
    }

    Ok(DecodedImage {
        content_type,
        extension,
        bytes,
    })
}
