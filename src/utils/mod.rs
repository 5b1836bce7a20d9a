//! Helpers shared across layers.
//!
//! - [`slug`] - Slug generation and custom slug validation
//! - [`url_normalizer`] - Target URL normalization
//! - [`data_url`] - Decoding of base64 image data URLs (QR logos)
//! - [`client_ip`] - Proxy-aware client address resolution

pub mod client_ip;
pub mod data_url;
pub mod slug;
pub mod url_normalizer;
