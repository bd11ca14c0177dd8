//! Wallpaper luminance sampling and text-color selection
//!
//! Home-screen labels draw straight over the wallpaper, so the text
//! color must adapt: dark text over a light wallpaper, light text over
//! a dark one. Luminance is estimated from a sparse grid of pixels in
//! the centered region where the favorites list sits, using the
//! standard relative-luminance formula over linearized sRGB.

use std::path::PathBuf;

use image::{Rgba, RgbaImage};

/// Text color for dark wallpapers, RGBA in 0.0-1.0
pub const LIGHT_TEXT: [f32; 4] = [0.96, 0.96, 0.96, 1.0];
/// Text color for light wallpapers, RGBA in 0.0-1.0
pub const DARK_TEXT: [f32; 4] = [0.10, 0.10, 0.10, 1.0];

/// Luminance above which a wallpaper counts as light
const LUMINANCE_THRESHOLD: f64 = 0.5;

/// Provider of the current wallpaper bitmap
///
/// Change notification (and re-sampling on change) is wired up by the
/// embedding shell; the core only consumes snapshots.
pub trait WallpaperSource: Send + Sync {
    fn current_wallpaper(&self) -> Option<RgbaImage>;
}

/// Wallpaper read from an image file on disk
pub struct FileWallpaper {
    path: PathBuf,
}

impl FileWallpaper {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl WallpaperSource for FileWallpaper {
    fn current_wallpaper(&self) -> Option<RgbaImage> {
        match image::open(&self.path) {
            Ok(img) => Some(img.to_rgba8()),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Could not decode wallpaper: {e}");
                None
            }
        }
    }
}

/// Picks one of two fixed text colors from wallpaper luminance
#[derive(Debug, Clone)]
pub struct ContrastSampler {
    pub light_text: [f32; 4],
    pub dark_text: [f32; 4],
}

impl Default for ContrastSampler {
    fn default() -> Self {
        Self {
            light_text: LIGHT_TEXT,
            dark_text: DARK_TEXT,
        }
    }
}

impl ContrastSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the text color for a wallpaper, light text when in doubt
    ///
    /// A missing bitmap (or one too small to sample) is treated as a
    /// dark background.
    pub fn text_color_for(&self, wallpaper: Option<&RgbaImage>) -> [f32; 4] {
        match wallpaper {
            Some(bitmap) => {
                let luminance = self.sample_luminance(bitmap);
                tracing::debug!(luminance, "Sampled wallpaper");
                if luminance > LUMINANCE_THRESHOLD {
                    self.dark_text
                } else {
                    self.light_text
                }
            }
            None => {
                tracing::debug!("No wallpaper available, using light text");
                self.light_text
            }
        }
    }

    /// Fetch from a source and select; decode failure means light text
    pub fn text_color_from(&self, source: &dyn WallpaperSource) -> [f32; 4] {
        self.text_color_for(source.current_wallpaper().as_ref())
    }

    /// Average luminance over a sparse grid in the centered region
    ///
    /// The region is a square of half the shorter dimension; the stride
    /// keeps the sample count around a hundred regardless of wallpaper
    /// resolution.
    pub fn sample_luminance(&self, bitmap: &RgbaImage) -> f64 {
        let (width, height) = bitmap.dimensions();
        let center_x = width as i64 / 2;
        let center_y = height as i64 / 2;
        let sample_radius = width.min(height) as i64 / 4;
        let step = (sample_radius / 10).max(1);

        let mut total_luminance = 0.0;
        let mut sample_count = 0u32;

        let mut x = center_x - sample_radius;
        while x < center_x + sample_radius {
            let mut y = center_y - sample_radius;
            while y < center_y + sample_radius {
                if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
                    total_luminance += pixel_luminance(bitmap.get_pixel(x as u32, y as u32));
                    sample_count += 1;
                }
                y += step;
            }
            x += step;
        }

        if sample_count > 0 {
            total_luminance / sample_count as f64
        } else {
            0.0
        }
    }
}

/// Relative luminance of one pixel, ITU-R BT.709 coefficients
pub fn pixel_luminance(pixel: &Rgba<u8>) -> f64 {
    let r = srgb_to_linear(pixel[0] as f64 / 255.0);
    let g = srgb_to_linear(pixel[1] as f64 / 255.0);
    let b = srgb_to_linear(pixel[2] as f64 / 255.0);
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

/// Piecewise sRGB gamma expansion
fn srgb_to_linear(channel: f64) -> f64 {
    if channel <= 0.03928 {
        channel / 12.92
    } else {
        ((channel + 0.055) / 1.055).powf(2.4)
    }
}
