// Color bounding-box detection over one captured scan window.
//
// Both scans stop at the first *row* holding a match, so the corners are the
// leftmost match of the first matching row and the rightmost match of the
// last matching row. That is not the true bounding box of a non-rectangular
// blob; it is the intended (cheap) approximation.

use crate::types::{BoundingBox, PixelBuffer, Point};

/// Channel thresholds for the target color (strictly red by default).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPredicate {
    pub red_above: u8,
    pub green_below: u8,
    pub blue_below: u8,
}

impl ColorPredicate {
    pub const RED: Self = Self { red_above: 250, green_below: 13, blue_below: 13 };

    #[inline]
    pub fn matches(&self, [r, g, b]: [u8; 3]) -> bool {
        r > self.red_above && g < self.green_below && b < self.blue_below
    }
}

/// Outcome of one detection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// Forward scan found nothing: tracking is lost.
    NoTarget,
    /// Forward scan matched but the reverse scan did not. Should be
    /// unreachable for a pure predicate; treated as "no target" without
    /// touching the scan window.
    Partial { top_left: Point },
    Found(BoundingBox),
}

/// Forward raster scan (top→bottom, left→right).
fn first_match(buf: &PixelBuffer, pred: &ColorPredicate) -> Option<Point> {
    for y in 0..buf.height() {
        for x in 0..buf.width() {
            if pred.matches(buf.rgb(x, y)) {
                return Some(Point::new(x as i32, y as i32));
            }
        }
    }
    None
}

/// Reverse raster scan (bottom→top, right→left).
fn last_match(buf: &PixelBuffer, pred: &ColorPredicate) -> Option<Point> {
    for y in (0..buf.height()).rev() {
        for x in (0..buf.width()).rev() {
            if pred.matches(buf.rgb(x, y)) {
                return Some(Point::new(x as i32, y as i32));
            }
        }
    }
    None
}

/// Locate the target box in `buf`. The buffer is only read.
pub fn detect(buf: &PixelBuffer, pred: &ColorPredicate) -> Detection {
    let Some(top_left) = first_match(buf, pred) else {
        return Detection::NoTarget;
    };
    match last_match(buf, pred) {
        Some(bottom_right) => Detection::Found(BoundingBox { top_left, bottom_right }),
        None => Detection::Partial { top_left },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    const HIT: Rgb<u8> = Rgb([255, 0, 0]);

    fn buffer(size: u32, hits: &[(u32, u32)]) -> PixelBuffer {
        let mut img = RgbImage::from_pixel(size, size, Rgb([40, 90, 40]));
        for &(x, y) in hits {
            img.put_pixel(x, y, HIT);
        }
        PixelBuffer::from_image(img)
    }

    #[test]
    fn predicate_thresholds_are_strict() {
        let p = ColorPredicate::RED;
        assert!(p.matches([251, 12, 12]));
        assert!(!p.matches([250, 0, 0]));
        assert!(!p.matches([255, 13, 0]));
        assert!(!p.matches([255, 0, 13]));
    }

    #[test]
    fn empty_buffer_has_no_target() {
        assert_eq!(detect(&buffer(200, &[]), &ColorPredicate::RED), Detection::NoTarget);
    }

    #[test]
    fn single_pixel_gives_zero_area_box() {
        for &(x, y) in &[(0, 0), (11, 0), (0, 11), (5, 7), (11, 11)] {
            let det = detect(&buffer(12, &[(x, y)]), &ColorPredicate::RED);
            let p = Point::new(x as i32, y as i32);
            assert_eq!(det, Detection::Found(BoundingBox { top_left: p, bottom_right: p }));
        }
    }

    #[test]
    fn filled_square_is_bounded_by_its_corners() {
        let mut hits = Vec::new();
        for y in 90..=110 {
            for x in 90..=110 {
                hits.push((x, y));
            }
        }
        let det = detect(&buffer(200, &hits), &ColorPredicate::RED);
        assert_eq!(
            det,
            Detection::Found(BoundingBox {
                top_left: Point::new(90, 90),
                bottom_right: Point::new(110, 110),
            })
        );
    }

    #[test]
    fn corners_come_from_first_and_last_matching_rows() {
        // A diagonal: the row-level break picks the first row's leftmost hit
        // and the last row's rightmost hit, not the global extremes.
        let hits = [(30, 10), (50, 10), (5, 20), (60, 40), (20, 40)];
        let det = detect(&buffer(64, &hits), &ColorPredicate::RED);
        assert_eq!(
            det,
            Detection::Found(BoundingBox {
                top_left: Point::new(30, 10),
                bottom_right: Point::new(60, 40),
            })
        );
    }
}
