//! Minimal bar-chart rasteriser for report images.
//!
//! Charts carry no text; the report prints labels and counts in a table
//! under each image.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};

use crate::error::{ExportError, Result};

pub const WIDTH: u32 = 720;
pub const HEIGHT: u32 = 360;
const MARGIN: u32 = 24;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([90, 90, 90]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);
const PALETTE: [Rgb<u8>; 4] = [
    Rgb([31, 119, 180]),
    Rgb([102, 194, 165]),
    Rgb([252, 141, 98]),
    Rgb([141, 160, 203]),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarChart {
    pub title: String,
    pub bars: Vec<(String, usize)>,
}

impl BarChart {
    pub fn new(title: impl Into<String>, bars: Vec<(String, usize)>) -> Self {
        Self {
            title: title.into(),
            bars,
        }
    }

    /// One bar per map entry, in key order, labelled with the key's Display.
    pub fn from_map<K: Display>(title: impl Into<String>, map: &BTreeMap<K, usize>) -> Self {
        Self::new(
            title,
            map.iter().map(|(k, n)| (k.to_string(), *n)).collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Rasterise as PNG. Fails with [`ExportError::EmptyChart`] when there
    /// are no bars; bars that are all zero still render (axes only).
    pub fn render_png(&self) -> Result<Vec<u8>> {
        if self.is_empty() {
            return Err(ExportError::EmptyChart {
                chart: self.title.clone(),
            });
        }

        let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);
        let plot_w = WIDTH - 2 * MARGIN;
        let plot_h = HEIGHT - 2 * MARGIN;
        let baseline = HEIGHT - MARGIN;

        for step in 1..=4 {
            let y = baseline - plot_h * step / 4;
            hline(&mut img, MARGIN, WIDTH - MARGIN, y, GRID);
        }

        let max = self.bars.iter().map(|(_, n)| *n).max().unwrap_or(0);
        let n = self.bars.len() as u32;
        let slot = (plot_w / n).max(1);
        let bar_w = (slot * 7 / 10).max(1);

        for (i, (_, count)) in self.bars.iter().enumerate() {
            if max == 0 || *count == 0 {
                continue;
            }
            let h = ((*count as u64 * u64::from(plot_h)) / max as u64) as u32;
            let x0 = MARGIN + i as u32 * slot + (slot - bar_w) / 2;
            let color = PALETTE[i % PALETTE.len()];
            fill_rect(&mut img, x0, baseline - h, bar_w, h, color);
        }

        hline(&mut img, MARGIN, WIDTH - MARGIN, baseline, AXIS);
        fill_rect(&mut img, MARGIN, MARGIN, 1, plot_h, AXIS);

        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png)
            .map_err(|e| ExportError::Render(format!("chart '{}': {e}", self.title)))?;
        Ok(out.into_inner())
    }
}

fn hline(img: &mut RgbImage, x0: u32, x1: u32, y: u32, color: Rgb<u8>) {
    for x in x0..=x1.min(img.width() - 1) {
        img.put_pixel(x, y.min(img.height() - 1), color);
    }
}

fn fill_rect(img: &mut RgbImage, x0: u32, y0: u32, w: u32, h: u32, color: Rgb<u8>) {
    let x1 = (x0 + w).min(img.width());
    let y1 = (y0 + h).min(img.height());
    for y in y0..y1 {
        for x in x0..x1 {
            img.put_pixel(x, y, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

    #[test]
    fn renders_png() {
        let chart = BarChart::new(
            "Visits",
            vec![("09:00-10:00".into(), 3), ("10:00-11:00".into(), 1)],
        );
        let png = chart.render_png().unwrap();
        assert!(png.starts_with(PNG_MAGIC));
    }

    #[test]
    fn all_zero_bars_still_render() {
        let chart = BarChart::new("Workload", vec![("N. Ali".into(), 0)]);
        assert!(chart.render_png().is_ok());
    }

    #[test]
    fn from_map_keeps_key_order() {
        let map = BTreeMap::from([(2, 5usize), (1, 3)]);
        let chart = BarChart::from_map("x", &map);
        assert_eq!(chart.bars, vec![("1".into(), 3), ("2".into(), 5)]);
    }
}
