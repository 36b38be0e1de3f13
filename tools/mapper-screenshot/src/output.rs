//! PNG output

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{GrayImage, Luma};
use mapper_display::Framebuffer;

const LIT: Luma<u8> = Luma([255]);

/// e.g. `20250614_093012`
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Lit pixels white on black
pub fn to_image(framebuffer: &Framebuffer) -> GrayImage {
    let width = u32::from(framebuffer.width());
    GrayImage::from_fn(width, u32::from(framebuffer.height()), |x, y| {
        if framebuffer.pixel(x as u16, y as u16) {
            LIT
        } else {
            Luma([0])
        }
    })
}

/// Local time as it appears in file names
pub fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// `<stem>_<timestamp>[_<n>].<ext>`, first name that does not exist yet
pub fn output_path(base: &Path, timestamp: &str) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "screenshot".to_string());
    let ext = base
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());

    let candidate =
        |suffix: &str| base.with_file_name(format!("{stem}_{timestamp}{suffix}.{ext}"));

    let mut path = candidate("");
    let mut n = 1;
    while path.exists() {
        path = candidate(&format!("_{n}"));
        n += 1;
    }
    path
}

/// Save the framebuffer next to `base` and return where it went
pub fn save(framebuffer: &Framebuffer, base: &Path, timestamp: &str) -> Result<PathBuf> {
    let path = output_path(base, timestamp);
    to_image(framebuffer)
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapper_display::Geometry;

    #[test]
    fn test_image_colors() {
        let mut fb = Framebuffer::new(Geometry::W64H32);
        fb.set_pixel(3, 5, true);
        let img = to_image(&fb);
        assert_eq!(img.dimensions(), (64, 32));
        assert_eq!(img.get_pixel(3, 5), &Luma([255]));
        assert_eq!(img.get_pixel(4, 5), &Luma([0]));
    }

    #[test]
    fn test_output_path_naming() {
        let base = Path::new("/nonexistent-dir/shots/screen.png");
        assert_eq!(
            output_path(base, "20250614_093012"),
            PathBuf::from("/nonexistent-dir/shots/screen_20250614_093012.png")
        );

        let bare = Path::new("capture");
        assert_eq!(
            output_path(bare, "20250614_093012"),
            PathBuf::from("capture_20250614_093012.png")
        );
    }

    #[test]
    fn test_timestamp_shape() {
        let stamp = timestamp();
        assert_eq!(stamp.len(), 15);
        assert_eq!(stamp.as_bytes()[8], b'_');
        assert!(stamp
            .bytes()
            .enumerate()
            .all(|(i, b)| i == 8 || b.is_ascii_digit()));
    }

    #[test]
    fn test_save_does_not_overwrite() {
        let dir = std::env::temp_dir().join(format!("mapper-screenshot-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let base = dir.join("shot.png");
        let fb = Framebuffer::new(Geometry::W96H16);

        let first = save(&fb, &base, "20250614_093012").unwrap();
        let second = save(&fb, &base, "20250614_093012").unwrap();
        assert_eq!(first, dir.join("shot_20250614_093012.png"));
        assert_eq!(second, dir.join("shot_20250614_093012_1.png"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
