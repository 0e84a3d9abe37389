//! QR images for transfer intents.

use qrcode::QrCode;
use qrcode::render::svg;
use qrcode::types::QrError;

/// Mime type of the rendered QR images.
pub const QR_MIME_TYPE: &str = "image/svg+xml";

/// Pixel edge of the rendered QR images.
pub const QR_DIMENSION: u32 = 256;

/// Render `uri` as an SVG QR image.
pub fn transfer_qr(uri: &str) -> Result<Vec<u8>, QrError> {
    let code = QrCode::new(uri.as_bytes())?;
    let image = code
        .render::<svg::Color<'_>>()
        .min_dimensions(QR_DIMENSION, QR_DIMENSION)
        .build();
    Ok(image.into_bytes())
}
