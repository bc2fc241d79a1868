//! `RenderSurface` on two HTML canvases: the grid and the burnt-fraction chart.

use anyhow::{Context, anyhow};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use super::{Glyph, RenderSurface, Sprite, chart_points};
use crate::session::MetricsSeries;
use crate::util::Color;

const BACKGROUND_COLOR: Color = Color::rgb(255, 255, 255);
const CHART_LINE_COLOR: Color = Color::rgb(128, 202, 246);
const CHART_GRID_COLOR: Color = Color::rgb(220, 220, 220);

struct Canvas {
    element: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl Canvas {
    fn find(id: &str) -> anyhow::Result<Self> {
        let element: HtmlCanvasElement = web_sys::window()
            .context("no window")?
            .document()
            .context("no document")?
            .get_element_by_id(id)
            .with_context(|| format!("no element with id `{id}`"))?
            .dyn_into()
            .map_err(|_| anyhow!("`{id}` is not a canvas"))?;
        let ctx = element
            .get_context("2d")
            .map_err(|e| anyhow!("get_context threw: {e:?}"))?
            .context("canvas has no 2d context")?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| anyhow!("context is not 2d"))?;
        Ok(Self { element, ctx })
    }

    fn size(&self) -> (f64, f64) {
        (self.element.width() as f64, self.element.height() as f64)
    }

    fn clear(&self) {
        let (w, h) = self.size();
        self.ctx.set_fill_style_str(&BACKGROUND_COLOR.css());
        self.ctx.fill_rect(0.0, 0.0, w, h);
    }
}

/// Tree images, loaded in the background when the surface is created.
struct GlyphImages {
    alive: HtmlImageElement,
    burning: HtmlImageElement,
    burnt: HtmlImageElement,
}

impl GlyphImages {
    fn load() -> anyhow::Result<Self> {
        let load = |glyph: Glyph| -> anyhow::Result<HtmlImageElement> {
            let image = HtmlImageElement::new()
                .map_err(|e| anyhow!("could not create image element: {e:?}"))?;
            image.set_src(glyph.asset());
            Ok(image)
        };
        Ok(Self {
            alive: load(Glyph::Alive)?,
            burning: load(Glyph::Burning)?,
            burnt: load(Glyph::Burnt)?,
        })
    }

    /// The image for `glyph`, once it has finished loading.
    fn ready(&self, glyph: Glyph) -> Option<&HtmlImageElement> {
        let image = match glyph {
            Glyph::Alive => &self.alive,
            Glyph::Burning => &self.burning,
            Glyph::Burnt => &self.burnt,
        };
        (image.complete() && image.natural_width() > 0).then_some(image)
    }
}

pub struct CanvasSurface {
    grid: Canvas,
    chart: Canvas,
    images: GlyphImages,
}

impl CanvasSurface {
    pub fn new(grid_canvas_id: &str, chart_canvas_id: &str) -> anyhow::Result<Self> {
        Ok(Self {
            grid: Canvas::find(grid_canvas_id)?,
            chart: Canvas::find(chart_canvas_id)?,
            images: GlyphImages::load()?,
        })
    }
}

impl RenderSurface for CanvasSurface {
    type Error = JsValue;

    fn draw_grid(&mut self, sprites: &[Sprite]) -> Result<(), JsValue> {
        self.grid.clear();
        let ctx = &self.grid.ctx;
        for sprite in sprites {
            // plain colour blocks until the tree images arrive
            match self.images.ready(sprite.glyph) {
                Some(image) => ctx.draw_image_with_html_image_element_and_dw_and_dh(
                    image,
                    sprite.x,
                    sprite.y,
                    sprite.size,
                    sprite.size,
                )?,
                None => {
                    ctx.set_fill_style_str(&sprite.glyph.color().css());
                    ctx.fill_rect(sprite.x, sprite.y, sprite.size, sprite.size);
                }
            }
        }
        Ok(())
    }

    fn draw_chart(&mut self, series: &MetricsSeries) -> Result<(), JsValue> {
        let (w, h) = self.chart.size();
        let ctx = &self.chart.ctx;
        self.chart.clear();

        ctx.set_stroke_style_str(&CHART_GRID_COLOR.css());
        ctx.set_line_width(0.5);
        for i in 1..5 {
            let y = h * i as f64 / 5.0;
            ctx.begin_path();
            ctx.move_to(0.0, y);
            ctx.line_to(w, y);
            ctx.stroke();
        }

        let points = chart_points(series, w, h);
        let Some(&(x0, y0)) = points.first() else {
            return Ok(());
        };
        ctx.set_stroke_style_str(&CHART_LINE_COLOR.css());
        ctx.set_line_width(2.0);
        ctx.begin_path();
        ctx.move_to(x0, y0);
        for &(x, y) in &points[1..] {
            ctx.line_to(x, y);
        }
        ctx.stroke();
        Ok(())
    }
}
