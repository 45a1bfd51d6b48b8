//! Figure geometry: where every panel of a mutation profile goes.
//!
//! The figure has three outer columns (y label, profile, legend) and one row per
//! structure row. Every group panel has a title cell, a bar cell and, when key
//! lineages are present, a heatmap cell. Coordinates are canvas pixels with the
//! origin at the top left.

#[cfg(test)]
mod tests;

use crate::aggregate::ProfileData;
use crate::layout::Structure;
use color_eyre::eyre::{eyre, Report, Result};
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

/// Relative widths of the y label, profile and legend columns.
pub const COLUMN_RATIOS: [f32; 3] = [0.5, 21.0, 1.0];
/// Relative heights of the title and bar cells.
pub const HEIGHT_RATIOS: [f32; 2] = [1.0, 8.5];
/// Relative heights of the title, bar and heatmap cells.
pub const HEIGHT_RATIOS_KEYS: [f32; 3] = [1.0, 7.0, 1.5];
/// Number of y ticks before rounding and dropping zero.
pub const NUM_YTICKS: usize = 5;

// ----------------------------------------------------------------------------
// Options
// ----------------------------------------------------------------------------

/// Figure dimensions in pixels.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct GridOptions {
    /// Canvas width.
    pub width: f32,
    /// Height of one structure row, tick labels included.
    pub row_height: f32,
    /// White space around the figure.
    pub margin: f32,
    /// Space left of the first panel for y ticks and key labels.
    pub axis_width: f32,
    /// Space below each row for x tick labels.
    pub xticks_height: f32,
    /// Space between panels and between cells.
    pub gap: f32,
    /// Extra legend width beyond its column.
    pub legend_width: f32,
}

impl Default for GridOptions {
    fn default() -> Self {
        GridOptions {
            width: 1800.,
            row_height: 420.,
            margin: 20.,
            axis_width: 70.,
            xticks_height: 80.,
            gap: 8.,
            legend_width: 160.,
        }
    }
}

// ----------------------------------------------------------------------------
// Geometry
// ----------------------------------------------------------------------------

/// Axis-aligned rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2., self.y + self.height / 2.)
    }

    /// Split horizontally into cells proportional to `ratios`, separated by `gap`.
    ///
    /// ```rust
    /// use vargram::grid::Rect;
    ///
    /// let cells = Rect::new(0., 0., 110., 10.).split_columns(&[1., 1.], 10.);
    /// assert_eq!(cells, [Rect::new(0., 0., 50., 10.), Rect::new(60., 0., 50., 10.)]);
    /// ```
    pub fn split_columns(&self, ratios: &[f32], gap: f32) -> Vec<Rect> {
        split(self.x, self.width, ratios, gap)
            .into_iter()
            .map(|(x, width)| Rect::new(x, self.y, width, self.height))
            .collect()
    }

    /// Split vertically into cells proportional to `ratios`, separated by `gap`.
    pub fn split_rows(&self, ratios: &[f32], gap: f32) -> Vec<Rect> {
        split(self.y, self.height, ratios, gap)
            .into_iter()
            .map(|(y, height)| Rect::new(self.x, y, self.width, height))
            .collect()
    }
}

fn split(start: f32, length: f32, ratios: &[f32], gap: f32) -> Vec<(f32, f32)> {
    let total: f32 = ratios.iter().sum();
    let gaps = gap * ratios.len().saturating_sub(1) as f32;
    let usable = (length - gaps).max(0.);
    let mut offset = start;
    ratios
        .iter()
        .map(|ratio| {
            let size = if total > 0. { usable * ratio / total } else { 0. };
            let cell = (offset, size);
            offset += size + gap;
            cell
        })
        .collect()
}

/// One group of the profile.
#[derive(Clone, Debug, PartialEq)]
pub struct Panel {
    pub group: String,
    /// Number of bars.
    pub count: usize,
    pub title: Rect,
    pub bars: Rect,
    pub heatmap: Option<Rect>,
    /// First panel of its row, which carries the y axis and key labels.
    pub first: bool,
}

impl Panel {
    /// Horizontal slot of the `i`-th bar.
    pub fn slot(&self, i: usize) -> (f32, f32) {
        let width = self.bars.width / self.count.max(1) as f32;
        (self.bars.x + width * i as f32, width)
    }
}

/// One figure row.
#[derive(Clone, Debug, PartialEq)]
pub struct GridRow {
    pub panels: Vec<Panel>,
    /// Space padding a row narrower than the widest row.
    pub filler: Option<Rect>,
    /// Highest stacked bar in the row.
    pub ymax: f64,
    /// Upper y limit shared by the row.
    pub ylim: f64,
    pub yticks: Vec<f64>,
}

/// The whole figure.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    pub width: f32,
    pub height: f32,
    pub label: Rect,
    pub profile: Rect,
    pub legend: Rect,
    pub rows: Vec<GridRow>,
}

// ----------------------------------------------------------------------------
// Y Axis
// ----------------------------------------------------------------------------

/// Upper y limit: one above the highest bar, or 1 for an empty row.
pub fn ylim(ymax: f64) -> f64 {
    if ymax > 0. {
        ymax + 1.
    } else {
        1.
    }
}

/// Evenly spaced ticks from 0 to `ymax`, rounded to integers, without zero.
///
/// ```rust
/// use vargram::grid::yticks;
///
/// assert_eq!(yticks(100.), [25., 50., 75., 100.]);
/// assert_eq!(yticks(2.), [1., 2.]);
/// assert!(yticks(0.).is_empty());
/// ```
pub fn yticks(ymax: f64) -> Vec<f64> {
    let step = ymax / (NUM_YTICKS - 1) as f64;
    let mut ticks = (0..NUM_YTICKS).map(|i| (step * i as f64).round_ties_even()).filter(|t| *t != 0.).collect_vec();
    ticks.dedup();
    ticks
}

// ----------------------------------------------------------------------------
// Grid
// ----------------------------------------------------------------------------

impl Grid {
    /// Lay out the figure for `structure`.
    ///
    /// Panel widths are proportional to the number of bars in each group, scaled so the
    /// widest row fills the profile column.
    pub fn new(data: &ProfileData, structure: &Structure, options: &GridOptions) -> Result<Grid, Report> {
        if structure.is_empty() {
            return Err(eyre!("Cannot lay out a figure without groups."));
        }
        let counts = data.group_counts();
        let count_of = |group: &str| {
            counts
                .iter()
                .find(|c| c.group == group)
                .map(|c| c.count)
                .ok_or_else(|| eyre!("Group {group} has no data to plot."))
        };
        let row_counts: Vec<Vec<usize>> = structure
            .iter()
            .map(|row| row.iter().map(|g| count_of(g.as_str())).collect::<Result<_, _>>())
            .collect::<Result<_, _>>()?;
        let widest = row_counts.iter().map(|r| r.iter().sum::<usize>()).max().unwrap_or(0).max(1);

        let height = options.margin * 2. + options.row_height * structure.len() as f32;
        let inner = Rect::new(
            options.margin,
            options.margin,
            options.width - options.margin * 2. - options.legend_width,
            height - options.margin * 2.,
        );
        let columns = inner.split_columns(&COLUMN_RATIOS, options.gap);
        let (label, profile, mut legend) = (columns[0], columns[1], columns[2]);
        legend.width += options.legend_width;

        let has_keys = !data.keys.is_empty();
        let height_ratios: &[f32] = if has_keys { &HEIGHT_RATIOS_KEYS } else { &HEIGHT_RATIOS };

        let mut rows = Vec::new();
        for (row_i, (groups, counts)) in structure.iter().zip(row_counts).enumerate() {
            let row_rect = Rect::new(
                profile.x + options.axis_width,
                profile.y + options.row_height * row_i as f32,
                profile.width - options.axis_width,
                options.row_height - options.xticks_height,
            );

            let total: usize = counts.iter().sum();
            let mut ratios = counts.iter().map(|c| *c as f32).collect_vec();
            if total < widest {
                ratios.push((widest - total) as f32);
            }
            let cells = row_rect.split_columns(&ratios, options.gap);

            let panels = groups
                .iter()
                .zip(counts.iter())
                .zip(cells.iter())
                .enumerate()
                .map(|(i, ((group, count), cell))| {
                    let parts = cell.split_rows(height_ratios, options.gap);
                    Panel {
                        group: group.clone(),
                        count: *count,
                        title: parts[0],
                        bars: parts[1],
                        heatmap: parts.get(2).copied(),
                        first: i == 0,
                    }
                })
                .collect_vec();
            let filler = (total < widest).then(|| cells[cells.len() - 1]);

            let ymax = groups.iter().map(|g| data.max_sum(g)).fold(0., f64::max);
            rows.push(GridRow { panels, filler, ymax, ylim: ylim(ymax), yticks: yticks(ymax) });
        }

        debug!("Laid out {} rows on a {} x {height} canvas.", rows.len(), options.width);
        Ok(Grid { width: options.width, height, label, profile, legend, rows })
    }

    /// All panels in structure order.
    pub fn panels(&self) -> impl Iterator<Item = (&GridRow, &Panel)> {
        self.rows.iter().flat_map(|row| row.panels.iter().map(move |panel| (row, panel)))
    }
}
