//! Just enough PNG and JPEG header parsing to size and embed a cover image.

/// Container format of an image file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// Dimensions and colour layout read from an image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub kind: ImageKind,
    pub width: u32,
    pub height: u32,
    /// Colour components per pixel (1 grey, 3 RGB, 4 CMYK for JPEG).
    pub components: u8,
}

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

impl ImageInfo {
    /// Returns `None` for anything that is not a well-formed PNG or JPEG header.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.starts_with(&PNG_SIGNATURE) {
            parse_png(data)
        } else if data.starts_with(&[0xff, 0xd8]) {
            parse_jpeg(data)
        } else {
            None
        }
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

fn parse_png(data: &[u8]) -> Option<ImageInfo> {
    // Signature, then the IHDR chunk: length(4) type(4) width(4) height(4) depth(1) colour(1).
    let ihdr = data.get(8..26)?;
    if &ihdr[4..8] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(ihdr[8..12].try_into().ok()?);
    let height = u32::from_be_bytes(ihdr[12..16].try_into().ok()?);
    let components = match ihdr[17] {
        0 => 1,
        2 | 3 => 3,
        4 => 2,
        6 => 4,
        _ => return None,
    };
    (width > 0 && height > 0).then_some(ImageInfo {
        kind: ImageKind::Png,
        width,
        height,
        components,
    })
}

fn parse_jpeg(data: &[u8]) -> Option<ImageInfo> {
    let mut pos = 2;
    loop {
        // Markers may be padded with any number of 0xff bytes.
        while *data.get(pos)? == 0xff && *data.get(pos + 1)? == 0xff {
            pos += 1;
        }
        if *data.get(pos)? != 0xff {
            return None;
        }
        let marker = *data.get(pos + 1)?;
        pos += 2;
        match marker {
            // Standalone markers carry no length.
            0x01 | 0xd0..=0xd7 => continue,
            0xd9 | 0xda => return None,
            _ => {}
        }
        let len = u16::from_be_bytes([*data.get(pos)?, *data.get(pos + 1)?]) as usize;
        if len < 2 {
            return None;
        }
        let is_sof = matches!(marker, 0xc0..=0xcf) && !matches!(marker, 0xc4 | 0xc8 | 0xcc);
        if is_sof {
            let seg = data.get(pos + 2..pos + len)?;
            // precision(1) height(2) width(2) components(1)
            if seg.len() < 6 {
                return None;
            }
            let height = u16::from_be_bytes([seg[1], seg[2]]) as u32;
            let width = u16::from_be_bytes([seg[3], seg[4]]) as u32;
            let components = seg[5];
            return (width > 0 && height > 0).then_some(ImageInfo {
                kind: ImageKind::Jpeg,
                width,
                height,
                components,
            });
        }
        pos += len;
    }
}
