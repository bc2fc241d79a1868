use crate::controller::Frame;
use crate::session::{Cell, CellStatus, GridSnapshot, MetricsSeries};
use crate::util::Color;

#[cfg(target_arch = "wasm32")]
pub mod canvas;

const ALIVE_COLOR: Color = Color::rgb(0, 255, 0);
const BURNING_COLOR: Color = Color::rgb(255, 0, 0);
const BURNT_COLOR: Color = Color::rgb(50, 50, 50);

/// Geometry of the square grid canvas, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasLayout {
    pub canvas_size: f64,
    /// Distance between the origins of neighboring cells
    pub cell_pitch: f64,
    /// Drawn size of one glyph; larger than the pitch so trees overlap
    pub glyph_size: f64,
}

impl Default for CanvasLayout {
    fn default() -> Self {
        Self {
            canvas_size: 500.0,
            cell_pitch: 12.0,
            glyph_size: 15.0,
        }
    }
}

impl CanvasLayout {
    /// Margin that centers `grid_dimension` cells on the canvas.
    pub fn offset(&self, grid_dimension: u32) -> f64 {
        (self.canvas_size - grid_dimension as f64 * self.cell_pitch) / 2.0
    }

    /// Top-left pixel of a cell. Grid positions are 1-indexed.
    pub fn cell_position(&self, cell: &Cell, grid_width: u32, grid_height: u32) -> (f64, f64) {
        let x = self.offset(grid_width) + self.cell_pitch * (cell.column() as f64 - 1.0);
        let y = self.offset(grid_height) + self.cell_pitch * (cell.row() as f64 - 1.0);
        (x, y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Glyph {
    Alive,
    Burning,
    Burnt,
}

impl From<CellStatus> for Glyph {
    fn from(status: CellStatus) -> Self {
        match status {
            CellStatus::Green => Glyph::Alive,
            CellStatus::Burning => Glyph::Burning,
            CellStatus::Burnt => Glyph::Burnt,
        }
    }
}

impl Glyph {
    pub fn asset(&self) -> &'static str {
        match self {
            Glyph::Alive => "./greentree.svg",
            Glyph::Burning => "./burningtree.svg",
            Glyph::Burnt => "./burnttree.svg",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Glyph::Alive => ALIVE_COLOR,
            Glyph::Burning => BURNING_COLOR,
            Glyph::Burnt => BURNT_COLOR,
        }
    }
}

/// A glyph placed on the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sprite {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub glyph: Glyph,
}

pub fn layout_frame(
    snapshot: &GridSnapshot,
    grid_width: u32,
    grid_height: u32,
    layout: &CanvasLayout,
) -> Vec<Sprite> {
    snapshot
        .cells()
        .iter()
        .map(|cell| {
            let (x, y) = layout.cell_position(cell, grid_width, grid_height);
            Sprite {
                id: cell.id,
                x,
                y,
                size: layout.glyph_size,
                glyph: cell.status.into(),
            }
        })
        .collect()
}

/// Polyline for the burnt-fraction chart. Samples spread evenly across the
/// width; the vertical axis is fixed to `[0, 1]` with 0 at the bottom.
pub fn chart_points(series: &MetricsSeries, width: f64, height: f64) -> Vec<(f64, f64)> {
    let samples = series.as_slice();
    let step_x = if samples.len() > 1 {
        width / (samples.len() - 1) as f64
    } else {
        0.0
    };
    samples
        .iter()
        .enumerate()
        .map(|(i, &v)| (i as f64 * step_x, height - v.clamp(0.0, 1.0) * height))
        .collect()
}

pub trait RenderSurface {
    type Error;

    fn draw_grid(&mut self, sprites: &[Sprite]) -> Result<(), Self::Error>;
    fn draw_chart(&mut self, series: &MetricsSeries) -> Result<(), Self::Error>;
}

/// Draw one frame. The chart is only drawn once the run is over.
pub fn present<S: RenderSurface>(
    surface: &mut S,
    frame: &Frame,
    layout: &CanvasLayout,
) -> Result<(), S::Error> {
    let sprites = match (&frame.snapshot, frame.dimensions) {
        (Some(snapshot), Some((w, h))) => layout_frame(snapshot, w, h, layout),
        _ => Vec::new(),
    };
    surface.draw_grid(&sprites)?;
    if frame.stop_reason.is_some() {
        surface.draw_chart(&frame.metrics)?;
    }
    Ok(())
}
