use crate::geometry::{Point, Rect, point};
use crate::renderer::draw_sink::{DrawCommand, DrawList};

/// 8-bit coverage image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[y * self.width + x])
    }

    /// Adds `value` to a pixel, saturating at 255. Out-of-bounds writes are
    /// ignored.
    pub fn accumulate(&mut self, x: usize, y: usize, value: u8) {
        if x >= self.width || y >= self.height {
            return;
        }
        let pixel = &mut self.data[y * self.width + x];
        *pixel = pixel.saturating_add(value);
    }

    /// Number of pixels with any coverage.
    pub fn covered(&self) -> usize {
        self.data.iter().filter(|&&v| v > 0).count()
    }
}

/// Rasterises a recorded draw list into a coverage bitmap.
///
/// Colors contribute their alpha only. Quads fill their axis-aligned bounds
/// and ignore textures; lines become rectangles `thickness` wide. Good enough
/// to check where things land, not how they look.
pub fn render_draw_list_to_bitmap(list: &DrawList, image_size: [usize; 2]) -> Bitmap {
    let [width, height] = image_size;

    if width == 0 || height == 0 {
        return Bitmap::new(0, 0);
    }

    let mut bitmap = Bitmap::new(width, height);

    for command in &list.commands {
        match *command {
            DrawCommand::FilledRect { rect, color } => fill(&mut bitmap, rect, color.a()),
            DrawCommand::QuadUv { corners, color, .. } => {
                fill(&mut bitmap, bounds_of(&corners), color.a())
            }
            DrawCommand::Line {
                from,
                to,
                color,
                thickness,
            } => {
                let half = thickness.max(1.0) / 2.0;
                let rect = Rect::new(
                    point(from.x.min(to.x) - half, from.y.min(to.y) - half),
                    point(from.x.max(to.x) + half, from.y.max(to.y) + half),
                );
                fill(&mut bitmap, rect, color.a());
            }
            DrawCommand::SwitchChannel(_)
            | DrawCommand::PushTexture(_)
            | DrawCommand::PopTexture => {}
        }
    }

    bitmap
}

fn bounds_of(corners: &[Point; 4]) -> Rect {
    let (min, max) = corners[1..]
        .iter()
        .fold((corners[0], corners[0]), |(min, max), p| (min.min(*p), max.max(*p)));
    Rect::new(min, max)
}

/// Fills the pixels whose centers fall inside `rect`.
fn fill(bitmap: &mut Bitmap, rect: Rect, alpha: u8) {
    if alpha == 0 {
        return;
    }

    let x0 = (rect.min.x - 0.5).ceil().max(0.0) as usize;
    let y0 = (rect.min.y - 0.5).ceil().max(0.0) as usize;
    let x1 = (rect.max.x - 0.5).ceil().max(0.0) as usize;
    let y1 = (rect.max.y - 0.5).ceil().max(0.0) as usize;

    for y in y0..y1.min(bitmap.height) {
        for x in x0..x1.min(bitmap.width) {
            bitmap.accumulate(x, y, alpha);
        }
    }
}
