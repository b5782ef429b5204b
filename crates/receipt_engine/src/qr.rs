//! QR rendering: plain SVG, branded SVG with a centred logo, and a
//! block-character rendering for terminals.

use std::fmt::Write as _;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use qrcode::{Color, EcLevel, QrCode};
use receipt_core::{QrImage, QrVariant};

use crate::logo::{Logo, LogoSource};
use crate::QrError;

/// Light modules around the symbol, as required by the QR spec.
const QUIET_ZONE: usize = 4;
const TERMINAL_QUIET_ZONE: usize = 2;
/// Upper bound of the logo side relative to the symbol side.
const LOGO_MAX_RATIO: f64 = 0.22;

#[async_trait::async_trait]
pub trait QrRenderer: Send + Sync {
    async fn render(&self, link: &str, variant: QrVariant) -> Result<QrImage, QrError>;
}

pub struct SvgQrRenderer {
    module_px: usize,
    logo: Option<Arc<dyn LogoSource>>,
}

impl SvgQrRenderer {
    pub fn new(module_px: usize) -> Self {
        Self {
            module_px: module_px.max(1),
            logo: None,
        }
    }

    pub fn with_logo(mut self, logo: Arc<dyn LogoSource>) -> Self {
        self.logo = Some(logo);
        self
    }
}

impl Default for SvgQrRenderer {
    fn default() -> Self {
        Self::new(8)
    }
}

#[async_trait::async_trait]
impl QrRenderer for SvgQrRenderer {
    async fn render(&self, link: &str, variant: QrVariant) -> Result<QrImage, QrError> {
        let (level, logo) = match variant {
            QrVariant::Plain => (EcLevel::M, None),
            QrVariant::Branded => {
                let source = self.logo.as_ref().ok_or(QrError::LogoMissing)?;
                (EcLevel::H, Some(source.load().await?))
            }
        };

        let matrix = Matrix::encode(link, level)?;
        let svg = matrix.to_svg(self.module_px, logo.as_ref());
        Ok(QrImage {
            link: link.to_string(),
            data_url: svg_data_url(&svg),
            terminal: matrix.to_terminal(),
            svg,
        })
    }
}

pub fn svg_data_url(svg: &str) -> String {
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg.as_bytes()))
}

/// Side of the white pad and of the logo inside it, in modules. The pad
/// is bounded by `LOGO_MAX_RATIO`; the logo keeps a one-module margin.
fn logo_geometry(width: usize) -> (usize, usize) {
    let pad_side = ((width as f64) * LOGO_MAX_RATIO).floor() as usize;
    (pad_side, pad_side.saturating_sub(2))
}

/// Dark/light modules of an encoded symbol, without quiet zone.
struct Matrix {
    width: usize,
    dark: Vec<bool>,
}

impl Matrix {
    fn encode(link: &str, level: EcLevel) -> Result<Self, QrError> {
        let code = QrCode::with_error_correction_level(link.as_bytes(), level)
            .map_err(|err| QrError::Encode(err.to_string()))?;
        let dark = code
            .to_colors()
            .into_iter()
            .map(|color| color == Color::Dark)
            .collect();
        Ok(Self {
            width: code.width(),
            dark,
        })
    }

    /// Out-of-range coordinates fall in the quiet zone and read as light.
    fn is_dark(&self, x: isize, y: isize) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        let (x, y) = (x as usize, y as usize);
        x < self.width && y < self.width && self.dark[y * self.width + x]
    }

    fn to_svg(&self, module_px: usize, logo: Option<&Logo>) -> String {
        let side = self.width + 2 * QUIET_ZONE;
        let px = side * module_px;
        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {side} {side}" width="{px}" height="{px}" shape-rendering="crispEdges">"#
        );
        svg.push_str(r##"<rect width="100%" height="100%" fill="#ffffff"/>"##);
        svg.push_str(r##"<path fill="#000000" d=""##);
        for y in 0..self.width {
            for x in 0..self.width {
                if self.dark[y * self.width + x] {
                    let _ = write!(svg, "M{} {}h1v1h-1z", x + QUIET_ZONE, y + QUIET_ZONE);
                }
            }
        }
        svg.push_str(r#""/>"#);

        if let Some(logo) = logo {
            let (pad_side, logo_side) = logo_geometry(self.width);
            if logo_side > 0 {
                let pad_offset = QUIET_ZONE + (self.width - pad_side) / 2;
                let offset = pad_offset + 1;
                let _ = write!(
                    svg,
                    r##"<rect x="{pad_offset}" y="{pad_offset}" width="{pad_side}" height="{pad_side}" rx="1" fill="#ffffff"/>"##
                );
                let _ = write!(
                    svg,
                    r#"<image href="data:{};base64,{}" x="{offset}" y="{offset}" width="{logo_side}" height="{logo_side}" preserveAspectRatio="xMidYMid meet"/>"#,
                    logo.mime,
                    STANDARD.encode(&logo.bytes)
                );
            }
        }

        svg.push_str("</svg>");
        svg
    }

    /// Half-block rendering, two module rows per text line. Light modules
    /// are drawn filled so the code scans on dark terminal backgrounds.
    fn to_terminal(&self) -> String {
        let zone = TERMINAL_QUIET_ZONE as isize;
        let end = self.width as isize + zone;
        let mut out = String::new();
        let mut y = -zone;
        while y < end {
            for x in -zone..end {
                let top = !self.is_dark(x, y);
                let bottom = y + 1 < end && !self.is_dark(x, y + 1);
                out.push(match (top, bottom) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                });
            }
            out.push('\n');
            y += 2;
        }
        out
    }
}
