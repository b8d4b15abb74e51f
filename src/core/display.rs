//! Pure derivation of the status scene from channel state.
//!
//! The panel is split into one row per channel, each with four columns:
//! channel number, moisture bar with the reference marker, numeric readings
//! and the attempt counter. Nothing here draws pixels; the composed scene is
//! handed to a `DisplayRenderer` for the actual refresh.

use core::fmt::Write as _;

use heapless::String;

use super::channel::{Channel, MAX_CHANNELS};

/// Column layout of the reference 200x200 panel.
const CHANNEL_LABEL_X_OFFSET: i32 = 0;
const BAR_X_OFFSET: i32 = 12;
const LEVEL_TEXT_X_OFFSET: i32 = 150;
const ATTEMPTS_X_INSET: i32 = 6;

/// Color tag of a scene element.
///
/// `Warning` maps to the tricolor panel's red, `Normal` to black.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Ink {
    Normal,
    Warning,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TextSize {
    Small,
    Large,
}

/// A positioned piece of text with its color tag.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TextRun {
    pub x: i32,
    pub y: i32,
    pub size: TextSize,
    pub ink: Ink,
    pub text: String<12>,
}

/// A filled horizontal bar.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Bar {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub ink: Ink,
}

/// A filled triangle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Triangle {
    pub vertices: [(i32, i32); 3],
    pub ink: Ink,
}

/// A straight line segment.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Line {
    pub from: (i32, i32),
    pub to: (i32, i32),
    pub ink: Ink,
}

/// The target indicator: two triangles pointing at the bar from above and
/// below, joined by a stem. Always normal ink; it marks a target, not a
/// status.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReferenceMarker {
    pub upper: Triangle,
    pub lower: Triangle,
    pub stem: Line,
}

/// Everything rendered for one channel.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChannelRow {
    pub label: TextRun,
    pub bar: Bar,
    pub marker: ReferenceMarker,
    pub level: TextRun,
    pub raw: TextRun,
    pub attempts: TextRun,
}

/// A full display refresh worth of content.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Scene {
    pub rows: heapless::Vec<ChannelRow, MAX_CHANNELS>,
    pub footer: TextRun,
}

/// Pixel dimensions of the panel.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Geometry {
    pub width: i32,
    pub height: i32,
}

impl Geometry {
    /// Horizontal pixels available to the moisture bar.
    const fn bar_span(self) -> i32 {
        LEVEL_TEXT_X_OFFSET - BAR_X_OFFSET
    }

    /// Map a percent level onto the bar field.
    fn bar_pixels(self, percent: u8) -> i32 {
        i32::from(percent) * self.bar_span() / 100
    }
}

impl Default for Geometry {
    /// The reference 1.54" tricolor panel.
    fn default() -> Self {
        Self {
            width: 200,
            height: 200,
        }
    }
}

impl Scene {
    /// Derive the scene for the given channels.
    ///
    /// Reflects the states as passed in; the scheduler composes the scene
    /// before running pumps, so attempt counts lag the cycle's own runs by
    /// one refresh.
    pub fn compose(channels: &[Channel], geometry: Geometry) -> Self {
        let mut rows = heapless::Vec::new();
        if !channels.is_empty() {
            let row_height = geometry.height / channels.len() as i32;
            for (i, channel) in channels.iter().enumerate() {
                let y = i as i32 * row_height;
                // Scene capacity matches MAX_CHANNELS; extra rows cannot fit
                // on the panel and are dropped.
                if rows.push(Self::compose_row(channel, y, geometry)).is_err() {
                    break;
                }
            }
        }
        Self {
            rows,
            footer: Self::compose_footer(geometry),
        }
    }

    fn compose_row(channel: &Channel, y: i32, geometry: Geometry) -> ChannelRow {
        let state = &channel.state;
        let config = &channel.config;
        let dry = !state.recovered();
        let status_ink = if dry { Ink::Warning } else { Ink::Normal };

        let mut label = String::new();
        let _ = write!(label, "{}", config.id.display_number());

        let mut level = String::new();
        let _ = write!(level, "{}%", state.moisture_level.to_percent());

        let mut raw = String::new();
        let _ = write!(raw, "{}", state.moisture_level_raw.to_counts());

        let mut attempts = String::new();
        let _ = write!(attempts, "{}", state.pump_attempts);
        let attempts_ink = if state.pump_attempts >= config.max_pump_attempts {
            Ink::Warning
        } else {
            Ink::Normal
        };

        let marker_x = BAR_X_OFFSET
            + geometry.bar_pixels(state.moisture_reference_level.to_percent());

        ChannelRow {
            label: TextRun {
                x: CHANNEL_LABEL_X_OFFSET,
                y: y + 15,
                size: TextSize::Large,
                ink: Ink::Normal,
                text: label,
            },
            bar: Bar {
                x: BAR_X_OFFSET,
                y: y + 8,
                width: geometry.bar_pixels(state.moisture_level.to_percent()),
                height: 34,
                ink: status_ink,
            },
            marker: ReferenceMarker {
                upper: Triangle {
                    vertices: [(marker_x - 3, y + 4), (marker_x + 3, y + 4), (marker_x, y + 8)],
                    ink: Ink::Normal,
                },
                lower: Triangle {
                    vertices: [(marker_x, y + 43), (marker_x + 3, y + 47), (marker_x - 3, y + 47)],
                    ink: Ink::Normal,
                },
                stem: Line {
                    from: (marker_x, y + 8),
                    to: (marker_x, y + 43),
                    ink: Ink::Normal,
                },
            },
            level: TextRun {
                x: LEVEL_TEXT_X_OFFSET,
                y: y + 15,
                size: TextSize::Large,
                ink: status_ink,
                text: level,
            },
            raw: TextRun {
                x: LEVEL_TEXT_X_OFFSET,
                y: y + 35,
                size: TextSize::Small,
                ink: Ink::Normal,
                text: raw,
            },
            attempts: TextRun {
                x: geometry.width - ATTEMPTS_X_INSET,
                y: y + 20,
                size: TextSize::Small,
                ink: attempts_ink,
                text: attempts,
            },
        }
    }

    fn compose_footer(geometry: Geometry) -> TextRun {
        let mut text: String<12> = String::new();
        let _ = write!(text, "v{}", env!("CARGO_PKG_VERSION"));
        TextRun {
            x: geometry.width - text.len() as i32 * 6,
            y: geometry.height - 8,
            size: TextSize::Small,
            ink: Ink::Normal,
            text,
        }
    }
}
