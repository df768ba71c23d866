use std::{
    io::Write,
    path::{Path, PathBuf},
};

use image::{buffer::ConvertBuffer, RgbImage, RgbaImage};

use crate::error::{Error, Result};

/// Receives every rendered frame
pub trait FrameOutput: Send {
    fn commit(&mut self, frame: &RgbaImage) -> Result<()>;
}

/// Binary PPM (`P6`) encoding of `frame`, alpha dropped
pub fn encode_ppm(frame: &RgbaImage) -> Vec<u8> {
    let rgb: RgbImage = frame.convert();
    let header = format!("P6\n{} {}\n255\n", rgb.width(), rgb.height());

    let mut out = Vec::with_capacity(header.len() + rgb.as_raw().len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(rgb.as_raw());
    out
}

/// Writes frames as PPM files
pub struct PpmOutput {
    path: PathBuf,
    numbered: bool,
    frame_index: usize,
}

impl PpmOutput {
    /// Every frame overwrites `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            numbered: false,
            frame_index: 0,
        }
    }

    /// Frame `i` goes to `<stem>_<i>.ppm` next to `path`
    pub fn numbered(path: impl Into<PathBuf>) -> Self {
        Self {
            numbered: true,
            ..Self::new(path)
        }
    }

    fn frame_path(&self) -> PathBuf {
        if !self.numbered {
            return self.path.clone();
        }
        let stem = self
            .path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "render".to_owned());
        self.path
            .with_file_name(format!("{stem}_{:04}.ppm", self.frame_index))
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(path)?;
    file.write_all(bytes)?;
    file.flush()
}

impl FrameOutput for PpmOutput {
    fn commit(&mut self, frame: &RgbaImage) -> Result<()> {
        let path = self.frame_path();
        write_file(&path, &encode_ppm(frame)).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        log::info!("Saved {}", path.display());
        self.frame_index += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::{encode_ppm, FrameOutput, PpmOutput};
    use crate::error::Error;

    fn two_by_one() -> RgbaImage {
        let mut frame = RgbaImage::new(2, 1);
        frame.put_pixel(0, 0, Rgba([255, 0, 10, 255]));
        frame.put_pixel(1, 0, Rgba([1, 2, 3, 0]));
        frame
    }

    #[test]
    fn ppm_drops_alpha() {
        let mut expected = b"P6\n2 1\n255\n".to_vec();
        expected.extend_from_slice(&[255, 0, 10, 1, 2, 3]);
        assert_eq!(encode_ppm(&two_by_one()), expected);
    }

    #[test]
    fn ppm_is_row_major() {
        let mut frame = RgbaImage::new(1, 2);
        frame.put_pixel(0, 0, Rgba([7, 7, 7, 255]));
        frame.put_pixel(0, 1, Rgba([9, 9, 9, 255]));
        assert_eq!(&encode_ppm(&frame)[b"P6\n1 2\n255\n".len()..], &[7, 7, 7, 9, 9, 9]);
    }

    #[test]
    fn writes_numbered_frames() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        let mut output = PpmOutput::numbered(nested.join("render.ppm"));
        output.commit(&two_by_one()).unwrap();
        output.commit(&two_by_one()).unwrap();

        let first = std::fs::read(nested.join("render_0000.ppm")).unwrap();
        assert_eq!(first, encode_ppm(&two_by_one()));
        assert!(nested.join("render_0001.ppm").is_file());
    }

    #[test]
    fn unwritable_destination() {
        let dir = tempfile::tempdir().unwrap();

        // A directory cannot be opened as a file
        let mut output = PpmOutput::new(dir.path());
        match output.commit(&two_by_one()) {
            Err(Error::Io { path, .. }) => assert_eq!(path, dir.path()),
            other => panic!("expected an Io error, got {other:?}"),
        }
    }
}
