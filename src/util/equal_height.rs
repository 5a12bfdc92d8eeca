//! Equal-height leveling for column containers.
//!
//! An empty column collapses to zero height and stops being a drop target.
//! Giving every column the tallest column's height as its minimum keeps all
//! of them droppable.

#[cfg(test)]
#[path = "equal_height_test.rs"]
mod equal_height_test;

use crate::dom::Page;

/// Box metrics of one rendered column.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ColumnBox {
    /// Computed `box-sizing` is `border-box`.
    pub border_box: bool,
    /// Content plus padding plus border.
    pub offset_height: f64,
    /// Content plus padding.
    pub client_height: f64,
    pub padding_top: f64,
    pub padding_bottom: f64,
}

impl ColumnBox {
    /// The height measured in the same box `min-height` applies to, so that
    /// feeding it back as a minimum leaves the column's size unchanged.
    #[must_use]
    pub fn min_height_basis(&self) -> f64 {
        if self.border_box {
            self.offset_height
        } else {
            (self.client_height - self.padding_top - self.padding_bottom).max(0.0)
        }
    }
}

/// Parse a computed CSS length such as `"12.5px"`. Anything else reads as 0.
#[must_use]
pub fn css_px(value: &str) -> f64 {
    value
        .trim()
        .strip_suffix("px")
        .and_then(|n| n.trim().parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

/// Tallest of `heights`, or `None` when there is nothing to level.
pub fn uniform_min_height(heights: &[(String, f64)]) -> Option<f64> {
    heights
        .iter()
        .map(|(_, h)| *h)
        .filter(|h| h.is_finite())
        .fold(None, |max, h| Some(max.map_or(h, |m: f64| m.max(h))))
}

/// Apply the tallest matched column's height as every column's minimum.
/// Returns the height applied.
pub fn equalize_heights<P: Page + ?Sized>(page: &mut P, selector: &str) -> Option<f64> {
    let heights = page.column_heights(selector);
    let target = uniform_min_height(&heights)?;
    for (column, _) in &heights {
        page.set_min_height(column, target);
    }
    Some(target)
}
