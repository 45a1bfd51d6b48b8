use raqote::{LineCap, LineJoin, SolidSource, Source, StrokeStyle};

pub const WHITE: Source = Source::Solid(SolidSource { r: 255, g: 255, b: 255, a: 255 });
pub const BLACK: Source = Source::Solid(SolidSource { r: 0, g: 0, b: 0, a: 255 });
pub const TRANSPARENT: Source = Source::Solid(SolidSource { r: 0, g: 0, b: 0, a: 0 });

pub const TEXT_COLOR: [u8; 4] = [0, 0, 0, 255];

/// Heatmap color of a key value of 0 (#D5D5D5).
pub const HEATMAP_LOW: [u8; 4] = [0xD5, 0xD5, 0xD5, 0xFF];

/// Evenly spaced stops of the viridis colormap.
pub const VIRIDIS: [[u8; 3]; 11] = [
    [0x44, 0x01, 0x54],
    [0x48, 0x24, 0x75],
    [0x41, 0x44, 0x87],
    [0x35, 0x5F, 0x8D],
    [0x2A, 0x78, 0x8E],
    [0x21, 0x91, 0x8C],
    [0x22, 0xA8, 0x84],
    [0x44, 0xBF, 0x70],
    [0x7A, 0xD1, 0x51],
    [0xBD, 0xDF, 0x26],
    [0xFD, 0xE7, 0x25],
];

/// Canvas pixels per font point.
pub const PX_PER_PT: f32 = 2.5;

/// Bar width as a fraction of its slot.
pub const BAR_WIDTH: f32 = 0.75;

pub const BAR_EDGE_WIDTH: f32 = 1.5;
pub const SPINE_WIDTH: f32 = 2.5;
pub const PARTITION_WIDTH: f32 = 2.5;
pub const BORDER_WIDTH: f32 = 4.;
pub const TICK_LENGTH: f32 = 6.;
pub const TEXT_PAD: f32 = 4.;

pub const BASIC_STROKE_STYLE: StrokeStyle = StrokeStyle {
    cap: LineCap::Square,
    join: LineJoin::Miter,
    width: BAR_EDGE_WIDTH,
    miter_limit: 2.,
    dash_array: Vec::new(),
    dash_offset: 0.,
};

/// Fonts tried in order when none is configured.
pub const FONT_PATHS: [&str; 8] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];
