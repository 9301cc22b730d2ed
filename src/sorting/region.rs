//! Candidate regions where a page number may be printed.
//!
//! Every trial describes a column anchored at the right edge of the page, cut
//! into horizontal bands stacked from the bottom up. Trials run from a fine
//! scan of the classic footer position to the whole lower half of the page.

use image::RgbImage;

/// One family of bottom-right anchored bands.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrialConfig {
    /// Fraction of the page width, measured from the right edge
    pub width_ratio: f64,
    /// Fraction of the page height covered by one band
    pub height_ratio: f64,
    /// Number of bands, bottom band first
    pub max_chunks: usize,
}

/// Trials in priority order.
pub const TRIALS: [TrialConfig; 4] = [
    TrialConfig {
        width_ratio: 0.35,
        height_ratio: 0.06,
        max_chunks: 12,
    },
    TrialConfig {
        width_ratio: 0.50,
        height_ratio: 0.10,
        max_chunks: 6,
    },
    TrialConfig {
        width_ratio: 1.00,
        height_ratio: 0.20,
        max_chunks: 3,
    },
    TrialConfig {
        width_ratio: 1.00,
        height_ratio: 0.50,
        max_chunks: 1,
    },
];

/// A pixel rectangle inside a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A region tagged with its position in the search order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub trial: usize,
    pub chunk: usize,
    pub region: Region,
}

/// Band `chunk` of `trial` on a `width` x `height` page.
///
/// Band 0 ends at the bottom edge, band `i` spans the page fraction
/// `[1 - (i+1)*h, 1 - i*h)`. Returns None for a chunk outside the trial or a
/// band that rounds to zero pixels.
pub fn chunk_region(width: u32, height: u32, trial: &TrialConfig, chunk: usize) -> Option<Region> {
    if chunk >= trial.max_chunks {
        return None;
    }

    let w = width as f64;
    let h = height as f64;
    let y0 = (h * (1.0 - (chunk + 1) as f64 * trial.height_ratio)).max(0.0) as u32;
    let y1 = ((h * (1.0 - chunk as f64 * trial.height_ratio)).max(0.0) as u32).min(height);
    let x0 = ((w * (1.0 - trial.width_ratio)).max(0.0) as u32).min(width);

    if y1 <= y0 || x0 >= width {
        return None;
    }

    Some(Region {
        x: x0,
        y: y0,
        width: width - x0,
        height: y1 - y0,
    })
}

/// All non-empty candidate regions of a page, in search order: trials in
/// priority order, bands bottom-up within each trial.
pub fn regions_for(width: u32, height: u32) -> impl Iterator<Item = Candidate> {
    let trials: &'static [TrialConfig] = &TRIALS;
    trials.iter().enumerate().flat_map(move |(trial_idx, trial)| {
        (0..trial.max_chunks).filter_map(move |chunk| {
            chunk_region(width, height, trial, chunk).map(|region| Candidate {
                trial: trial_idx,
                chunk,
                region,
            })
        })
    })
}

/// Copies a region out of a page image.
pub fn crop_chunk(img: &RgbImage, region: &Region) -> RgbImage {
    image::imageops::crop_imm(img, region.x, region.y, region.width, region.height).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_bands_stack_from_the_bottom() {
        let trial = &TRIALS[0];
        let bottom = chunk_region(1000, 2000, trial, 0).unwrap();
        assert_eq!(bottom.y + bottom.height, 2000);
        assert_eq!(bottom.x + bottom.width, 1000);

        for chunk in 1..trial.max_chunks {
            let lower = chunk_region(1000, 2000, trial, chunk - 1).unwrap();
            let upper = chunk_region(1000, 2000, trial, chunk).unwrap();
            assert_eq!(upper.y + upper.height, lower.y, "bands must be contiguous");
            assert_eq!(upper.x, lower.x);
        }
    }

    #[test]
    fn test_band_size_follows_ratios() {
        let region = chunk_region(1000, 2000, &TRIALS[0], 0).unwrap();
        assert!((349..=351).contains(&region.width));
        assert!((119..=121).contains(&region.height));
    }

    #[test]
    fn test_last_trial_is_lower_half() {
        let region = chunk_region(1000, 2000, &TRIALS[3], 0).unwrap();
        assert_eq!(
            region,
            Region {
                x: 0,
                y: 1000,
                width: 1000,
                height: 1000
            }
        );
    }

    #[test]
    fn test_chunk_outside_trial() {
        assert_eq!(chunk_region(1000, 2000, &TRIALS[3], 1), None);
    }

    #[test]
    fn test_empty_bands_are_skipped() {
        // A 1-pixel-high page only has room for the bottom band
        let candidates: Vec<Candidate> = regions_for(10, 1).collect();
        assert!(candidates.iter().all(|c| c.region.height == 1));
        assert!(candidates.iter().all(|c| c.chunk == 0));
    }

    #[test]
    fn test_search_order() {
        let candidates: Vec<Candidate> = regions_for(1000, 2000).collect();
        let total: usize = TRIALS.iter().map(|t| t.max_chunks).sum();
        assert_eq!(candidates.len(), total);

        let order: Vec<(usize, usize)> = candidates.iter().map(|c| (c.trial, c.chunk)).collect();
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(order, sorted);
        assert_eq!(order[0], (0, 0));
        assert_eq!(*order.last().unwrap(), (3, 0));
    }

    #[test]
    fn test_crop_chunk() {
        let img = RgbImage::from_fn(100, 200, |x, y| Rgb([x as u8, y as u8, 0]));
        let region = Region {
            x: 65,
            y: 188,
            width: 35,
            height: 12,
        };

        let cropped = crop_chunk(&img, &region);

        assert_eq!(cropped.dimensions(), (35, 12));
        assert_eq!(cropped.get_pixel(0, 0)[0], 65);
        assert_eq!(cropped.get_pixel(0, 0)[1], 188);
    }
}
