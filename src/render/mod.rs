//! Draw a mutation profile to a PNG.

pub mod constants;
pub mod text;


use crate::aggregate::{format_value, ProfileData, ProfileRow};
use crate::grid::{Grid, GridOptions, GridRow, Panel, Rect};
use crate::key::DEFAULT_KEY_COLOR;
use crate::layout::Structure;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use itertools::Itertools;
use log::{debug, info};
use raqote::{DrawOptions, DrawTarget, PathBuilder, PathOp, Point, SolidSource, Source, StrokeStyle, Winding};
use rusttype::Font;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use text::{TextBuffer, TextProps};

// ----------------------------------------------------------------------------
// Aesthetics
// ----------------------------------------------------------------------------

/// Figure aesthetics. Font sizes are in points.
///
/// Empty labels and colors are filled in from the data by [`Aes::complete`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Aes {
    pub xticks_fontsize: f32,
    /// Rotation of the x tick labels in degrees, 0 or 90.
    pub xticks_rotation: f32,
    pub yticks_fontsize: f32,
    /// Defaults to the y type ("Weights" or "Counts").
    pub ylabel: String,
    pub ylabel_fontsize: f32,
    pub key_fontsize: f32,
    /// Heatmap row labels, one per key lineage.
    pub key_label: Vec<String>,
    /// Heatmap hex colors, one per key lineage.
    pub key_color: Vec<String>,
    pub group_fontsize: f32,
    /// Title of the legend listing renamed group titles.
    pub group_title: String,
    /// Legend labels, one per stack.
    pub stack_label: Vec<String>,
    pub stack_fontsize: f32,
    /// Bar hex colors, one per stack. Defaults to viridis.
    pub stack_color: Vec<String>,
    pub stack_title: String,
    /// TrueType font. Defaults to a system font.
    pub font: Option<PathBuf>,
    /// Figure dimensions.
    pub figure: GridOptions,
}

impl Default for Aes {
    fn default() -> Self {
        Aes {
            xticks_fontsize: 6.,
            xticks_rotation: 90.,
            yticks_fontsize: 7.,
            ylabel: String::new(),
            ylabel_fontsize: 10.,
            key_fontsize: 8.,
            key_label: Vec::new(),
            key_color: Vec::new(),
            group_fontsize: 8.,
            group_title: "Gene".to_string(),
            stack_label: Vec::new(),
            stack_fontsize: 10.,
            stack_color: Vec::new(),
            stack_title: "Batch".to_string(),
            font: None,
            figure: GridOptions::default(),
        }
    }
}

impl Aes {
    /// Fill in labels and colors missing from the aesthetics.
    ///
    /// `key_colors` are the colors given with the key lineages.
    ///
    /// ```rust
    /// use vargram::aggregate::{ProfileData, YType};
    /// use vargram::render::Aes;
    ///
    /// let data = ProfileData {
    ///     stacks: vec!["week_1".into(), "week_2".into()],
    ///     ytype: Some(YType::Weights),
    ///     ..Default::default()
    /// };
    /// let aes = Aes::default().complete(&data, &[])?;
    /// assert_eq!(aes.ylabel, "Weights");
    /// assert_eq!(aes.stack_label, ["week_1", "week_2"]);
    /// assert_eq!(aes.stack_color, ["#440154", "#FDE725"]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn complete(&self, data: &ProfileData, key_colors: &[String]) -> Result<Aes, Report> {
        let mut aes = self.clone();
        if aes.ylabel.is_empty() {
            aes.ylabel = data.ytype.map(|y| title_case(&y.to_string())).unwrap_or_default();
        }
        if aes.stack_label.is_empty() {
            aes.stack_label = data.stacks.clone();
        }
        if aes.stack_color.is_empty() {
            aes.stack_color = viridis(data.stacks.len()).into_iter().map(to_hex).collect();
        }
        if aes.key_label.is_empty() {
            aes.key_label = data.keys.clone();
        }
        if aes.key_color.is_empty() {
            aes.key_color = (0..data.keys.len())
                .map(|i| key_colors.get(i).cloned().unwrap_or_else(|| DEFAULT_KEY_COLOR.to_string()))
                .collect();
        }

        let lengths = [
            ("stack_label", aes.stack_label.len(), data.stacks.len()),
            ("stack_color", aes.stack_color.len(), data.stacks.len()),
            ("key_label", aes.key_label.len(), data.keys.len()),
            ("key_color", aes.key_color.len(), data.keys.len()),
        ];
        for (name, observed, expected) in lengths {
            if observed != expected {
                return Err(eyre!("Aesthetic {name} has {observed} values, expected {expected}.")
                    .suggestion("Give one value per stack or key lineage."));
            }
        }
        for color in aes.stack_color.iter().chain(aes.key_color.iter()) {
            parse_color(color)?;
        }
        Ok(aes)
    }
}

fn title_case(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ----------------------------------------------------------------------------
// Colors
// ----------------------------------------------------------------------------

/// Parse `#RRGGBB` or `#RRGGBBAA` to RGBA.
///
/// ```rust
/// use vargram::render::parse_color;
///
/// assert_eq!(parse_color("#5E5E5E")?, [0x5E, 0x5E, 0x5E, 0xFF]);
/// assert_eq!(parse_color("ff000080")?, [255, 0, 0, 128]);
/// assert!(parse_color("red").is_err());
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn parse_color(color: &str) -> Result<[u8; 4], Report> {
    let hex = color.trim().trim_start_matches('#');
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        return Err(eyre!("Invalid color: {color:?}").suggestion("Colors are hex codes, such as #5E5E5E."));
    }
    let mut rgba = [255_u8; 4];
    for (i, channel) in rgba.iter_mut().enumerate().take(hex.len() / 2) {
        *channel = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).wrap_err_with(|| format!("Invalid color: {color:?}"))?;
    }
    Ok(rgba)
}

/// Format RGBA as `#RRGGBB`.
pub fn to_hex(rgba: [u8; 4]) -> String {
    let [r, g, b, _] = rgba;
    format!("#{r:02X}{g:02X}{b:02X}")
}

/// Linear blend from `low` (t = 0) to `high` (t = 1).
pub fn interpolate(low: [u8; 4], high: [u8; 4], t: f64) -> [u8; 4] {
    let t = t.clamp(0., 1.);
    let mut rgba = [0_u8; 4];
    for (i, channel) in rgba.iter_mut().enumerate() {
        *channel = (low[i] as f64 + (high[i] as f64 - low[i] as f64) * t).round() as u8;
    }
    rgba
}

/// `n` colors evenly sampled from viridis, dark to light.
///
/// ```rust
/// use vargram::render::{to_hex, viridis};
///
/// let colors = viridis(3).into_iter().map(to_hex).collect::<Vec<_>>();
/// assert_eq!(colors, ["#440154", "#21918C", "#FDE725"]);
/// ```
pub fn viridis(n: usize) -> Vec<[u8; 4]> {
    let stops = constants::VIRIDIS.map(|[r, g, b]| [r, g, b, 255]);
    let last = (stops.len() - 1) as f64;
    (0..n)
        .map(|i| {
            let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 0. };
            let position = t * last;
            let lower = position.floor() as usize;
            let upper = (lower + 1).min(stops.len() - 1);
            interpolate(stops[lower], stops[upper], position - lower as f64)
        })
        .collect()
}

pub fn solid(rgba: [u8; 4]) -> Source<'static> {
    let [r, g, b, a] = rgba;
    Source::Solid(SolidSource::from_unpremultiplied_argb(a, r, g, b))
}

// ----------------------------------------------------------------------------
// Primitives
// ----------------------------------------------------------------------------

pub fn draw_polygon(
    canvas: &mut DrawTarget,
    x_coords: &[f32],
    y_coords: &[f32],
    fill: &Source,
    stroke: &Source,
    stroke_style: &StrokeStyle,
) {
    let mut ops = x_coords
        .iter()
        .zip(y_coords.iter())
        .enumerate()
        .map(|(i, (x, y))| match i {
            0 => PathOp::MoveTo(Point::new(*x, *y)),
            _ => PathOp::LineTo(Point::new(*x, *y)),
        })
        .collect_vec();
    ops.push(PathOp::Close);
    let path = raqote::Path { ops, winding: Winding::EvenOdd };

    canvas.fill(&path, fill, &DrawOptions::new());
    if stroke_style.width > 0. {
        canvas.stroke(&path, stroke, stroke_style, &DrawOptions::new());
    }
}

pub fn draw_rect(canvas: &mut DrawTarget, rect: &Rect, fill: &Source, stroke: &Source, stroke_style: &StrokeStyle) {
    let (x1, y1, x2, y2) = (rect.x, rect.y, rect.right(), rect.bottom());
    draw_polygon(canvas, &[x1, x1, x2, x2], &[y1, y2, y2, y1], fill, stroke, stroke_style);
}

pub fn draw_line(canvas: &mut DrawTarget, from: (f32, f32), to: (f32, f32), color: &Source, width: f32) {
    let mut path = PathBuilder::new();
    path.move_to(from.0, from.1);
    path.line_to(to.0, to.1);
    let style = StrokeStyle { width, ..constants::BASIC_STROKE_STYLE };
    canvas.stroke(&path.finish(), color, &style, &DrawOptions::new());
}

fn no_stroke() -> StrokeStyle {
    StrokeStyle { width: 0., ..constants::BASIC_STROKE_STYLE }
}

// ----------------------------------------------------------------------------
// Painter
// ----------------------------------------------------------------------------

/// Where text sits relative to its anchor.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Anchor {
    Start,
    Center,
    End,
}

fn offset(length: i32, anchor: Anchor) -> f32 {
    match anchor {
        Anchor::Start => 0.,
        Anchor::Center => length as f32 / 2.,
        Anchor::End => length as f32,
    }
}

/// A canvas and the font to label it with.
struct Painter<'f> {
    canvas: DrawTarget,
    font: Option<&'f Font<'static>>,
}

impl Painter<'_> {
    fn text(&self, text: &str, size: f32) -> Option<TextBuffer> {
        let props = TextProps { text: text.to_string(), size };
        self.font.map(|font| text::text(font, &props, constants::TEXT_COLOR))
    }

    /// Draw a text buffer anchored at (x, y).
    fn place(&mut self, buffer: &TextBuffer, x: f32, y: f32, h: Anchor, v: Anchor) {
        let point = Point::new(x - offset(buffer.width, h), y - offset(buffer.height, v));
        buffer.render(&mut self.canvas, point);
    }

    fn background(&mut self) {
        let (width, height) = (self.canvas.width() as f32, self.canvas.height() as f32);
        let mut background = PathBuilder::new();
        background.rect(0., 0., width, height);
        self.canvas.fill(&background.finish(), &constants::WHITE, &DrawOptions::new());
    }

    /// Boxed group title. Titles wider than the box become a number listed in `renamed`.
    fn title(&mut self, panel: &Panel, aes: &Aes, renamed: &mut Vec<String>) {
        let style = StrokeStyle { width: constants::SPINE_WIDTH, ..constants::BASIC_STROKE_STYLE };
        draw_rect(&mut self.canvas, &panel.title, &constants::TRANSPARENT, &constants::BLACK, &style);

        let Some(mut buffer) = self.text(&panel.group, aes.group_fontsize) else {
            return;
        };
        if buffer.width as f32 > panel.title.width {
            renamed.push(panel.group.clone());
            debug!("Group title {} is too wide, shown as {}.", panel.group, renamed.len());
            match self.text(&renamed.len().to_string(), aes.group_fontsize) {
                Some(number) => buffer = number,
                None => return,
            }
        }
        let (x, y) = panel.title.center();
        self.place(&buffer, x, y, Anchor::Center, Anchor::Center);
    }

    /// Stacked bars, one segment per stack.
    fn bars(&mut self, panel: &Panel, row: &GridRow, bars: &[&ProfileRow], colors: &[[u8; 4]]) {
        let to_y = |value: f64| panel.bars.bottom() - (value / row.ylim) as f32 * panel.bars.height;
        let edge = StrokeStyle { width: constants::BAR_EDGE_WIDTH, ..constants::BASIC_STROKE_STYLE };

        for (i, bar) in bars.iter().enumerate() {
            let (slot_x, slot_width) = panel.slot(i);
            let width = slot_width * constants::BAR_WIDTH;
            let x = slot_x + (slot_width - width) / 2.;
            let mut floor = 0.;
            for (value, color) in bar.values.iter().zip(colors) {
                if *value <= 0. {
                    continue;
                }
                let (top, bottom) = (to_y(floor + value), to_y(floor));
                let rect = Rect::new(x, top, width, bottom - top);
                draw_rect(&mut self.canvas, &rect, &solid(*color), &constants::BLACK, &edge);
                floor += value;
            }
        }

        let bottom = panel.bars.bottom();
        draw_line(&mut self.canvas, (panel.bars.x, bottom), (panel.bars.right(), bottom), &constants::BLACK, constants::SPINE_WIDTH);
    }

    /// Left spine, ticks and tick labels of the first panel in a row.
    fn y_axis(&mut self, panel: &Panel, row: &GridRow, aes: &Aes) {
        let x = panel.bars.x;
        draw_line(&mut self.canvas, (x, panel.bars.y), (x, panel.bars.bottom()), &constants::BLACK, constants::SPINE_WIDTH);
        for tick in &row.yticks {
            let y = panel.bars.bottom() - (tick / row.ylim) as f32 * panel.bars.height;
            draw_line(&mut self.canvas, (x - constants::TICK_LENGTH, y), (x, y), &constants::BLACK, constants::SPINE_WIDTH);
            if let Some(buffer) = self.text(&format_value(*tick), aes.yticks_fontsize) {
                let label_x = x - constants::TICK_LENGTH - constants::TEXT_PAD;
                self.place(&buffer, label_x, y, Anchor::End, Anchor::Center);
            }
        }
    }

    /// Key lineage rows, first key on top.
    fn heatmap(&mut self, panel: &Panel, cell: &Rect, bars: &[&ProfileRow], colors: &[[u8; 4]]) {
        let nkeys = colors.len().max(1);
        let height = cell.height / nkeys as f32;

        for (k, color) in colors.iter().enumerate() {
            let y = cell.y + height * k as f32;
            for (i, bar) in bars.iter().enumerate() {
                let (x, width) = panel.slot(i);
                let value = bar.keys.get(k).copied().unwrap_or(0.);
                let fill = solid(interpolate(constants::HEATMAP_LOW, *color, value));
                draw_rect(&mut self.canvas, &Rect::new(x, y, width, height), &fill, &constants::TRANSPARENT, &no_stroke());
            }
        }

        // white partitions between mutations
        for i in 1..bars.len() {
            let (x, _) = panel.slot(i);
            draw_line(&mut self.canvas, (x, cell.y), (x, cell.bottom()), &constants::WHITE, constants::PARTITION_WIDTH);
        }
        // black borders around each key row
        for x in [cell.x, cell.right()] {
            draw_line(&mut self.canvas, (x, cell.y), (x, cell.bottom()), &constants::BLACK, constants::BORDER_WIDTH);
        }
        for k in 0..=colors.len() {
            let y = cell.y + height * k as f32;
            draw_line(&mut self.canvas, (cell.x, y), (cell.right(), y), &constants::BLACK, constants::BORDER_WIDTH);
        }
    }

    fn key_labels(&mut self, cell: &Rect, aes: &Aes) {
        let height = cell.height / aes.key_label.len().max(1) as f32;
        for (k, label) in aes.key_label.iter().enumerate() {
            if let Some(buffer) = self.text(label, aes.key_fontsize) {
                let y = cell.y + height * (k as f32 + 0.5);
                self.place(&buffer, cell.x - constants::TEXT_PAD * 2., y, Anchor::End, Anchor::Center);
            }
        }
    }

    /// X tick labels hanging below `cell`.
    fn x_labels(&mut self, panel: &Panel, cell: &Rect, bars: &[&ProfileRow], aes: &Aes) {
        let vertical = aes.xticks_rotation.rem_euclid(180.) != 0.;
        for (i, bar) in bars.iter().enumerate() {
            let Some(buffer) = self.text(&bar.x, aes.xticks_fontsize) else {
                return;
            };
            let (x, width) = panel.slot(i);
            let center = x + width / 2.;
            let top = cell.bottom() + constants::TEXT_PAD;
            if vertical {
                self.place(&buffer.rotate(), center, top, Anchor::Center, Anchor::Start);
            } else {
                self.place(&buffer, center, top, Anchor::Center, Anchor::Start);
            }
        }
    }

    fn y_label(&mut self, cell: &Rect, aes: &Aes) {
        if let Some(buffer) = self.text(&aes.ylabel, aes.ylabel_fontsize) {
            let (x, y) = cell.center();
            self.place(&buffer.rotate(), x, y, Anchor::Center, Anchor::Center);
        }
    }

    /// Stack legend, and the legend of renamed group titles below it.
    fn legend(&mut self, cell: &Rect, aes: &Aes, colors: &[[u8; 4]], renamed: &[String]) {
        let Some(title) = self.text(&aes.stack_title, aes.stack_fontsize) else {
            return;
        };
        let line = title.height as f32 * 1.4;
        let stack_height = line * (aes.stack_label.len() + 1) as f32;
        let x = cell.x + constants::TEXT_PAD;

        // centered alone, otherwise sitting on the middle of the column
        let mut y = if renamed.is_empty() {
            cell.center().1 - stack_height / 2.
        } else {
            cell.center().1 - stack_height - line / 2.
        };
        self.place(&title, x, y, Anchor::Start, Anchor::Start);
        y += line;

        let patch = title.height as f32 * 0.8;
        for (label, color) in aes.stack_label.iter().zip(colors) {
            let rect = Rect::new(x, y + (line - patch) / 2., patch, patch);
            draw_rect(&mut self.canvas, &rect, &solid(*color), &constants::TRANSPARENT, &no_stroke());
            if let Some(buffer) = self.text(label, aes.stack_fontsize) {
                self.place(&buffer, x + patch + constants::TEXT_PAD * 2., y + line / 2., Anchor::Start, Anchor::Center);
            }
            y += line;
        }

        if renamed.is_empty() {
            return;
        }
        y = cell.center().1 + line / 2.;
        if let Some(buffer) = self.text(&aes.group_title, aes.group_fontsize) {
            self.place(&buffer, x, y, Anchor::Start, Anchor::Start);
        }
        y += line;
        let boxed = StrokeStyle { width: constants::BAR_EDGE_WIDTH, ..constants::BASIC_STROKE_STYLE };
        for (i, group) in renamed.iter().enumerate() {
            let (Some(number), Some(label)) = (self.text(&(i + 1).to_string(), aes.group_fontsize), self.text(group, aes.group_fontsize))
            else {
                continue;
            };
            let size = number.height.max(number.width) as f32 + constants::TEXT_PAD;
            let rect = Rect::new(x, y + (line - size) / 2., size, size);
            draw_rect(&mut self.canvas, &rect, &constants::TRANSPARENT, &constants::BLACK, &boxed);
            let (cx, cy) = rect.center();
            self.place(&number, cx, cy, Anchor::Center, Anchor::Center);
            self.place(&label, rect.right() + constants::TEXT_PAD * 2., cy, Anchor::Start, Anchor::Center);
            y += line;
        }
    }
}

// ----------------------------------------------------------------------------
// Figure
// ----------------------------------------------------------------------------

/// Draw the profile onto a new canvas. `aes` should already be completed.
///
/// Without a font, the figure is drawn without text.
pub fn draw(data: &ProfileData, structure: &Structure, aes: &Aes, font: Option<&Font<'static>>) -> Result<DrawTarget, Report> {
    let grid = Grid::new(data, structure, &aes.figure)?;
    let stack_colors = aes.stack_color.iter().map(|c| parse_color(c)).collect::<Result<Vec<_>, _>>()?;
    let key_colors = aes.key_color.iter().map(|c| parse_color(c)).collect::<Result<Vec<_>, _>>()?;

    debug!("Creating canvas: {} x {}", grid.width, grid.height);
    let canvas = DrawTarget::new(grid.width.ceil() as i32, grid.height.ceil() as i32);
    let mut painter = Painter { canvas, font };
    painter.background();

    let mut renamed = Vec::new();
    for (row, panel) in grid.panels() {
        let bars = data.rows_of(&panel.group).collect_vec();
        painter.title(panel, aes, &mut renamed);
        painter.bars(panel, row, &bars, &stack_colors);
        if panel.first && row.ymax > 0. {
            painter.y_axis(panel, row, aes);
        }
        match &panel.heatmap {
            Some(cell) => {
                painter.heatmap(panel, cell, &bars, &key_colors);
                if panel.first {
                    painter.key_labels(cell, aes);
                }
                painter.x_labels(panel, cell, &bars, aes);
            }
            None => painter.x_labels(panel, &panel.bars, &bars, aes),
        }
    }

    painter.y_label(&grid.label, aes);
    painter.legend(&grid.legend, aes, &stack_colors, &renamed);
    Ok(painter.canvas)
}

pub fn write_png(canvas: &DrawTarget, path: &Path) -> Result<(), Report> {
    canvas.write_png(path).map_err(|e| eyre!("Failed to write figure {path:?}: {e}"))
}

/// Draw the profile and write it to a PNG.
pub fn plot(data: &ProfileData, structure: &Structure, aes: &Aes, output: &Path) -> Result<(), Report> {
    let font = text::load_font(aes.font.as_deref())?;
    let canvas = draw(data, structure, aes, font.as_ref())?;
    write_png(&canvas, output)?;
    info!("Wrote mutation profile: {output:?}");
    Ok(())
}
