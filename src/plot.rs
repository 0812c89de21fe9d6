//! PNG output for generated samples and loss curves.

use crate::error::Result;
use crate::math::Matrix;
use crate::models::IMAGE_SIDE;
use image::{GrayImage, Luma, Rgb, RgbImage};
use std::path::Path;

/// Pixels between neighbouring tiles in a sample grid.
const TILE_GAP: u32 = 2;

/// Write the first `grid * grid` rows of `images` as a square mosaic.
///
/// Values are expected in `[0, 1]` and are drawn with an inverted gray map,
/// so ink is dark on a white background.
pub fn save_sample_grid<P: AsRef<Path>>(images: &Matrix, grid: usize, path: P) -> Result<()> {
    let side = IMAGE_SIDE as u32;
    let grid = grid as u32;
    let extent = grid * side + grid.saturating_sub(1) * TILE_GAP;
    let mut canvas = GrayImage::from_pixel(extent, extent, Luma([255]));
    let tiles = images.rows.min((grid * grid) as usize);
    for i in 0..tiles {
        let (gy, gx) = (i as u32 / grid, i as u32 % grid);
        let (ox, oy) = (gx * (side + TILE_GAP), gy * (side + TILE_GAP));
        for (p, &v) in images.row(i).iter().enumerate() {
            let (y, x) = (p as u32 / side, p as u32 % side);
            let ink = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            canvas.put_pixel(ox + x, oy + y, Luma([255 - ink]));
        }
    }
    ensure_parent(path.as_ref())?;
    canvas.save(path)?;
    Ok(())
}

const WIDTH: u32 = 640;
const PANEL_HEIGHT: u32 = 240;
const MARGIN: u32 = 20;
const D_REAL: Rgb<u8> = Rgb([31, 119, 180]);
const D_FAKE: Rgb<u8> = Rgb([255, 127, 14]);
const G_LOSS: Rgb<u8> = Rgb([44, 160, 44]);
const AXIS: Rgb<u8> = Rgb([0, 0, 0]);

/// Two stacked line charts: discriminator losses on top, generator below.
pub fn plot_history<P: AsRef<Path>>(d1: &[f32], d2: &[f32], g: &[f32], path: P) -> Result<()> {
    let mut img = RgbImage::from_pixel(WIDTH, 2 * PANEL_HEIGHT, Rgb([255, 255, 255]));
    draw_panel(&mut img, 0, &[(d1, D_REAL), (d2, D_FAKE)]);
    draw_panel(&mut img, PANEL_HEIGHT, &[(g, G_LOSS)]);
    ensure_parent(path.as_ref())?;
    img.save(path)?;
    Ok(())
}

fn draw_panel(img: &mut RgbImage, top: u32, series: &[(&[f32], Rgb<u8>)]) {
    let (x0, x1) = (MARGIN, WIDTH - MARGIN);
    let (y0, y1) = (top + MARGIN, top + PANEL_HEIGHT - MARGIN);
    draw_line(img, (x0 as i64, y1 as i64), (x1 as i64, y1 as i64), AXIS);
    draw_line(img, (x0 as i64, y0 as i64), (x0 as i64, y1 as i64), AXIS);

    let values = series.iter().flat_map(|(s, _)| s.iter().copied());
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f32::MAX, f32::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo > hi {
        return;
    }
    let span = if hi - lo > f32::EPSILON { hi - lo } else { 1.0 };

    for &(s, colour) in series {
        let steps = s.len().saturating_sub(1).max(1) as f32;
        let points: Vec<(i64, i64)> = s
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, &v)| {
                let x = x0 as f32 + (x1 - x0) as f32 * i as f32 / steps;
                let y = y1 as f32 - (y1 - y0) as f32 * (v - lo) / span;
                (x.round() as i64, y.round() as i64)
            })
            .collect();
        if let [only] = points.as_slice() {
            put(img, only.0, only.1, colour);
        }
        for w in points.windows(2) {
            draw_line(img, w[0], w[1], colour);
        }
    }
}

// Bresenham.
fn draw_line(img: &mut RgbImage, from: (i64, i64), to: (i64, i64), colour: Rgb<u8>) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put(img, x, y, colour);
        if (x, y) == to {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn put(img: &mut RgbImage, x: i64, y: i64, colour: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, colour);
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_has_expected_extent() {
        let dir = std::env::temp_dir().join("doodlegan_plot_test");
        let path = dir.join("grid.png");
        let images = Matrix::from_vec(4, 784, vec![1.0; 4 * 784]);
        save_sample_grid(&images, 2, &path).unwrap();
        let img = image::open(&path).unwrap().to_luma8();
        assert_eq!(img.dimensions(), (58, 58));
        // Full-intensity ink is drawn black; the gap stays white.
        assert_eq!(img.get_pixel(0, 0)[0], 0);
        assert_eq!(img.get_pixel(28, 0)[0], 255);
    }

    #[test]
    fn history_plot_is_written() {
        let dir = std::env::temp_dir().join("doodlegan_plot_test");
        let path = dir.join("loss.png");
        let d1 = [0.7, 0.6, 0.5];
        let d2 = [0.8, 0.65, 0.55];
        let g = [1.2, 1.0, 0.9];
        plot_history(&d1, &d2, &g, &path).unwrap();
        let img = image::open(&path).unwrap();
        assert_eq!(img.width(), WIDTH);
        assert_eq!(img.height(), 2 * PANEL_HEIGHT);
    }
}
