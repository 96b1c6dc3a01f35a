use crate::intake::CandidateFile;
use image::GenericImageView;
use thiserror::Error;

/// Longest edge of a rendered preview, in pixels.
pub const PREVIEW_MAX_EDGE: u32 = 512;

/// Decoded preview pixels, ready to be turned into a texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub width: u32,
    pub height: u32,
    /// Unpremultiplied RGBA, row-major.
    pub rgba: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("could not read {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not decode {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: image::ImageError,
    },
}

/// Read and decode the candidate, shrunk to fit [`PREVIEW_MAX_EDGE`]. Blocking;
/// meant for a worker thread.
pub fn render_preview(file: &CandidateFile) -> Result<Preview, PreviewError> {
    let bytes = file.read_content().map_err(|source| PreviewError::Read {
        name: file.name().to_string(),
        source,
    })?;
    let img = image::load_from_memory(&bytes).map_err(|source| PreviewError::Decode {
        name: file.name().to_string(),
        source,
    })?;
    let (w, h) = img.dimensions();
    let img = if w > PREVIEW_MAX_EDGE || h > PREVIEW_MAX_EDGE {
        img.thumbnail(PREVIEW_MAX_EDGE, PREVIEW_MAX_EDGE)
    } else {
        img
    };
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(Preview {
        width,
        height,
        rgba: rgba.into_raw(),
    })
}
