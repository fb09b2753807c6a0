//! Image export: PPM (`P3`) and PNG.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::ImageFormat;
use crate::renderer::ImageBuffer;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// `<dir>/<image_name>` with the extension replaced to match `format`.
pub fn output_path(dir: &Path, image_name: &str, format: ImageFormat) -> PathBuf {
    let mut path = dir.join(image_name);
    path.set_extension(format.extension());
    path
}

/// Tone map `image` and write it to `path`.
pub fn export(image: &ImageBuffer, path: &Path, format: ImageFormat) -> ExportResult<()> {
    let rgb = image.tone_map();
    match format {
        ImageFormat::Ppm => write_ppm(path, image.width, image.height, &rgb),
        ImageFormat::Png => write_png(path, image.width, image.height, &rgb),
    }?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

/// Plain-text PPM, one pixel per line.
pub fn write_ppm(path: &Path, width: u32, height: u32, rgb: &[[u8; 3]]) -> ExportResult<()> {
    let io_error = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    encode_ppm(&mut writer, width, height, rgb).map_err(io_error)?;
    writer.flush().map_err(io_error)
}

fn encode_ppm<W: Write>(
    writer: &mut W,
    width: u32,
    height: u32,
    rgb: &[[u8; 3]],
) -> std::io::Result<()> {
    writeln!(writer, "P3")?;
    writeln!(writer, "{} {}", width, height)?;
    writeln!(writer, "255")?;
    for [r, g, b] in rgb {
        writeln!(writer, "{} {} {}", r, g, b)?;
    }
    Ok(())
}

pub fn write_png(path: &Path, width: u32, height: u32, rgb: &[[u8; 3]]) -> ExportResult<()> {
    let bytes: &[u8] = bytemuck::cast_slice(rgb);
    image::save_buffer(path, bytes, width, height, image::ColorType::Rgb8)?;
    Ok(())
}
