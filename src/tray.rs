//! Tray icon rendering for the menubar.

use crate::models::{Mode, Theme};
use image::{Rgba, RgbaImage};
use thiserror::Error;
use tray_icon::Icon;

/// Standard macOS tray icon size.
const ICON_SIZE: u32 = 22;

#[derive(Error, Debug)]
pub enum TrayError {
    #[error("Failed to load icon: {0}")]
    IconLoad(#[from] tray_icon::BadIcon),
}

/// Body colour for a mode: tomato for work, green and blue for breaks.
fn mode_color(mode: Mode, theme: Theme) -> [u8; 3] {
    match (mode, theme) {
        (Mode::Work, Theme::Light) => [220, 50, 47],
        (Mode::Work, Theme::Dark) => [240, 98, 86],
        (Mode::ShortBreak, Theme::Light) => [56, 142, 60],
        (Mode::ShortBreak, Theme::Dark) => [102, 187, 106],
        (Mode::LongBreak, Theme::Light) => [30, 110, 200],
        (Mode::LongBreak, Theme::Dark) => [100, 160, 235],
    }
}

fn stem_color(theme: Theme) -> [u8; 3] {
    match theme {
        Theme::Light => [76, 153, 0],
        Theme::Dark => [140, 200, 80],
    }
}

/// Draws the tomato for a mode and theme.
pub fn render_icon(mode: Mode, theme: Theme) -> RgbaImage {
    let [r, g, b] = mode_color(mode, theme);
    let center = ICON_SIZE as f32 / 2.0;
    let radius = center - 2.0;

    let mut img = RgbaImage::from_fn(ICON_SIZE, ICON_SIZE, |x, y| {
        let dx = x as f32 - center;
        let dy = y as f32 - center;
        let distance = (dx * dx + dy * dy).sqrt();

        if distance <= radius {
            Rgba([r, g, b, 255])
        } else if distance <= radius + 1.0 {
            // Anti-aliased edge
            let alpha = ((radius + 1.0 - distance) * 255.0) as u8;
            Rgba([r, g, b, alpha])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });

    // Small stem at the top
    let [sr, sg, sb] = stem_color(theme);
    let stem_center = ICON_SIZE / 2;
    for y in 2..5 {
        for x in (stem_center - 1)..=(stem_center + 1) {
            img.put_pixel(x, y, Rgba([sr, sg, sb, 255]));
        }
    }

    img
}

/// Builds the tray icon for a mode and theme.
pub fn load_icon(mode: Mode, theme: Theme) -> Result<Icon, TrayError> {
    let img = render_icon(mode, theme);
    let (width, height) = img.dimensions();
    Icon::from_rgba(img.into_raw(), width, height).map_err(TrayError::IconLoad)
}
