use crate::font::{FontInfo, RenderContext, TextureRef};
use crate::geometry::{Point, Rect, RectExt, Size, Vector, point, vector};
use crate::record::{Payload, Record, RecordType};
use crate::renderer::{ChannelSplitter, DrawSink, RenderChannel};
use crate::spannable::Children;
use crate::style::{TextDecoration, TextDecorationStyle, TextStyle};
use crate::text::control_chars;
use crate::text::data::DataView;
use crate::text::layout::Options;
use crate::text::measured_line::{LastThing, MeasuredLine};

/// An icon or texture scaled to the font size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct InlineImage {
    pub texture: TextureRef,
    pub width: f32,
    pub uv0: Point,
    pub uv1: Point,
}

impl InlineImage {
    fn scaled(
        texture: TextureRef,
        natural: Size,
        font_size: f32,
        uv0: Point,
        uv1: Point,
    ) -> Option<Self> {
        if !(natural.width > 0.0 && natural.height > 0.0) {
            return None;
        }
        Some(Self {
            texture,
            width: (font_size * natural.width / natural.height).ceil(),
            uv0,
            uv1,
        })
    }
}

pub(crate) fn resolve_icon(ctx: RenderContext<'_>, font_size: f32, id: u32) -> Option<InlineImage> {
    let entry = ctx.assets.resolve_icon(id, font_size)?;
    InlineImage::scaled(entry.texture, entry.size, font_size, entry.uv0, entry.uv1)
}

/// Resolves a texture from the side table. The aspect ratio is taken from
/// the `uv0..uv1` region of the texture.
pub(crate) fn resolve_texture(
    ctx: RenderContext<'_>,
    data: &DataView,
    font_size: f32,
    index: u32,
    uv0: Point,
    uv1: Point,
) -> Option<InlineImage> {
    let handle = data.texture_at(index as usize)?;
    let info = ctx.assets.resolve_texture(handle)?;
    let region = Size::new(
        info.size.width * (uv1.x - uv0.x).abs(),
        info.size.height * (uv1.y - uv0.y).abs(),
    );
    InlineImage::scaled(info.texture, region, font_size, uv0, uv1)
}

/// One positioned unit, relative to the pen.
struct Quad {
    xy0: Point,
    xy1: Point,
    advance: f32,
    uv0: Point,
    uv1: Point,
    texture: TextureRef,
    skew: f32,
    visible: bool,
}

/// Walks units on a line, advancing the pen and returning each unit's
/// bounds.
///
/// The measure pass runs without a sink and only collects bounds; the draw
/// pass replays the same lines into a [`ChannelSplitter`]. Positions are
/// local to the measurement; `origin` is added only to emitted primitives.
pub(crate) struct CharRenderer<'a> {
    ctx: RenderContext<'a>,
    data: &'a DataView,
    options: &'a Options,
    sink: Option<&'a mut ChannelSplitter>,
    origin: Vector,

    pub pen: Point,
    pub style: TextStyle,
    font: FontInfo,
    control_font: Option<FontInfo>,
    last_rendered: LastThing,

    line_bbox_vertical: [f32; 2],
    horizontal_offset: f32,
    translation: Vector,
}

impl<'a> CharRenderer<'a> {
    pub fn new(
        ctx: RenderContext<'a>,
        data: &'a DataView,
        options: &'a Options,
        sink: Option<&'a mut ChannelSplitter>,
        origin: Vector,
        pen: Point,
    ) -> Self {
        let style = options.style;
        let font = FontInfo::resolve(ctx, &style, options.tab_width);
        let control_font = options.display_control_characters.then(|| {
            FontInfo::resolve(ctx, &options.control_characters_style, options.tab_width)
        });

        Self {
            ctx,
            data,
            options,
            sink,
            origin,
            pen,
            style,
            font,
            control_font,
            last_rendered: LastThing::None,
            line_bbox_vertical: font.bbox_vertical,
            horizontal_offset: 0.0,
            translation: vector(font.horizontal_offset, 0.0),
        }
    }

    pub fn font(&self) -> &FontInfo {
        &self.font
    }

    pub fn control_font(&self) -> Option<&FontInfo> {
        self.control_font.as_ref()
    }

    /// Offset applied to every unit of the line from style and alignment.
    pub fn translation(&self) -> Vector {
        self.translation
    }

    /// Starts a line. Horizontal alignment is fixed from the style in effect
    /// here.
    pub fn set_line(&mut self, line: &MeasuredLine) {
        let [top, bottom] = line.bbox_vertical;
        self.line_bbox_vertical = if top <= bottom {
            line.bbox_vertical
        } else {
            self.font.bbox_vertical
        };
        self.last_rendered = LastThing::None;

        let width = self.options.max_size.width;
        let alignment = self.style.horizontal_alignment;
        self.horizontal_offset = if !width.is_finite() || alignment <= 0.0 {
            0.0
        } else if alignment >= 1.0 {
            width - line.width()
        } else {
            ((width - line.width()) * alignment).round()
        };

        self.update_translation();
    }

    fn update_translation(&mut self) {
        let font = &self.font;
        let [line_top, line_bottom] = self.line_bbox_vertical;
        let free = line_bottom - line_top - font.size;
        let alignment = self.style.vertical_alignment;

        let mut v = font.line_height * self.style.vertical_offset;
        if alignment < 0.0 {
            // baseline
            v -= line_top + font.ascent;
        } else if alignment >= 1.0 {
            v += free;
        } else {
            v += free * alignment;
        }

        self.translation = vector(font.horizontal_offset + self.horizontal_offset, v.round());
    }

    /// Folds a record into the style and renders it if it is an inline
    /// object.
    ///
    /// Returns the bounds of the object and, for spannables, the child's
    /// origin in measurement coordinates.
    pub fn handle_record(
        &mut self,
        record_index: usize,
        record: &Record,
        bytes: &[u8],
        children: &Children,
    ) -> (Rect, Option<Vector>) {
        let update = self.style.update_from(
            record,
            record_index,
            bytes,
            &self.options.style,
            self.data.font_sets(),
        );
        if update.font {
            self.font = FontInfo::resolve(self.ctx, &self.style, self.options.tab_width);
            self.update_translation();
        }

        if record.is_revert || !record.ty.is_object() {
            return (Rect::inverted(), None);
        }

        let result = self.render_object(record_index, record.ty, bytes, children);
        self.last_rendered = LastThing::Record(record_index);
        result.unwrap_or((Rect::inverted(), None))
    }

    fn render_object(
        &mut self,
        record_index: usize,
        ty: RecordType,
        bytes: &[u8],
        children: &Children,
    ) -> Option<(Rect, Option<Vector>)> {
        let size = self.font.size;
        let image_quad = |image: InlineImage, skew: f32| Quad {
            xy0: point(0.0, 0.0),
            xy1: point(image.width, size),
            advance: image.width,
            uv0: image.uv0,
            uv1: image.uv1,
            texture: image.texture,
            skew,
            visible: true,
        };
        let skew = self.font.top_skew(0.0);

        match Payload::decode(ty, bytes)? {
            Payload::ObjectIcon(id) => {
                let image = resolve_icon(self.ctx, size, id)?;
                Some((self.render_quad(image_quad(image, skew)), None))
            }
            Payload::ObjectTexture { index, uv0, uv1 } => {
                let image = resolve_texture(self.ctx, self.data, size, index, uv0, uv1)?;
                Some((self.render_quad(image_quad(image, skew)), None))
            }
            Payload::ObjectSpannable(_) => {
                let boundary = children.get(&record_index)?.boundary();
                if !boundary.is_valid() {
                    return None;
                }

                let mut shift = 0.0;
                let height = boundary.valid_height();
                if (height - size).abs() > f32::EPSILON {
                    shift = (size - height) * self.style.vertical_alignment.clamp(0.0, 1.0);
                }

                let placement = self.pen.to_vector() + self.translation + vector(0.0, shift);
                let bounds = self.render_quad(Quad {
                    xy0: point(boundary.min.x, boundary.min.y + shift),
                    xy1: point(boundary.max.x, boundary.max.y + shift),
                    advance: boundary.max.x,
                    uv0: point(0.0, 0.0),
                    uv1: point(0.0, 0.0),
                    texture: TextureRef::None,
                    skew: 0.0,
                    visible: false,
                });
                Some((bounds, Some(placement)))
            }
            _ => None,
        }
    }

    /// Renders one codepoint, preceded by its control character label when
    /// those are displayed.
    pub fn render_char(&mut self, c: char) -> Rect {
        let mut bounds = Rect::inverted();
        if let (Some(_), Some(name)) = (self.control_font, control_chars::short_name(c)) {
            bounds = self.render_label(name);
        }

        let unit = self.render_unit(c);
        self.last_rendered = LastThing::Codepoint(c);
        bounds.union_valid(&unit)
    }

    /// Draws `name` with the control character style on the current line.
    fn render_label(&mut self, name: &str) -> Rect {
        let Some(control_font) = self.control_font else {
            return Rect::inverted();
        };

        let style = std::mem::replace(&mut self.style, self.options.control_characters_style);
        let font = std::mem::replace(&mut self.font, control_font);

        let mut bounds = Rect::inverted();
        for c in name.chars() {
            self.last_rendered = LastThing::None;
            bounds = bounds.union_valid(&self.render_unit(c));
        }
        self.last_rendered = LastThing::None;

        self.style = style;
        self.font = font;
        bounds
    }

    fn render_unit(&mut self, c: char) -> Rect {
        match c {
            '\r' | '\n' | '\u{AD}' => {
                let origin = self.pen + self.translation;
                return Rect::from_origin_and_size(origin, Size::new(0.0, self.font.size));
            }
            '\t' if self.font.tab_width > 0.0 => {
                let tab = self.font.tab_width;
                let next = ((self.pen.x + tab) / tab).floor() * tab;
                let advance = next - self.pen.x;
                let quad = Quad {
                    xy0: point(0.0, 0.0),
                    xy1: point(advance, self.font.size),
                    advance,
                    uv0: point(0.0, 0.0),
                    uv1: point(0.0, 0.0),
                    texture: TextureRef::None,
                    skew: 0.0,
                    visible: false,
                };
                return self.render_quad(quad);
            }
            _ => {}
        }

        if let LastThing::Codepoint(last) = self.last_rendered {
            self.pen.x += self.font.kerning(self.ctx, last, c);
        }

        let glyph = self.font.glyph(self.ctx, c);
        self.render_quad(Quad {
            xy0: glyph.xy0,
            xy1: glyph.xy1,
            advance: glyph.advance,
            uv0: glyph.uv0,
            uv1: glyph.uv1,
            texture: glyph.texture,
            skew: self.font.top_skew(glyph.xy0.y),
            visible: glyph.visible && c != ' ' && c != '\t',
        })
    }

    /// Renders the hyphen that replaces a soft hyphen at a wrap.
    pub fn render_hyphen(&mut self) -> Rect {
        self.render_char('-')
    }

    /// Reserves room for an object drawn by someone else, such as a wrap
    /// marker, and returns where its origin goes.
    pub fn place_object(&mut self, boundary: &Rect) -> Vector {
        let placement = self.pen.to_vector() + self.translation;
        self.pen.x += boundary.max.x;
        self.last_rendered = LastThing::None;
        placement
    }

    pub fn add_line_break(&mut self, height: f32) {
        self.pen = point(0.0, (self.pen.y + height).round());
    }

    fn render_quad(&mut self, quad: Quad) -> Rect {
        let xy0 = quad.xy0 + self.translation;
        let xy1 = quad.xy1 + self.translation;
        let advance = quad.advance.round();
        let bold = self.font.bold_extra;

        let bounds = Rect::new(
            self.pen + xy0.to_vector(),
            point(self.pen.x + xy1.x + quad.skew + bold, self.pen.y + xy1.y),
        );

        if self.sink.is_some() {
            self.emit(&quad, xy0, xy1, advance);
        }

        self.pen.x += advance;
        bounds
    }

    fn emit(&mut self, quad: &Quad, xy0: Point, xy1: Point, advance: f32) {
        let style = self.style;
        let font = self.font;
        let pen = self.pen.to_vector() + self.origin;
        let translation = self.translation;
        let Some(sink) = self.sink.as_deref_mut() else {
            return;
        };

        let bold = font.bold_extra as i32;
        let cell = Rect::from_origin_and_size(
            pen.to_point() + translation,
            Size::new(advance + font.bold_extra, font.size),
        );

        if style.back_color.is_visible() {
            sink.switch_channel(RenderChannel::Back);
            sink.add_filled_rect(cell, style.back_color);
        }

        let corners = {
            let lt = pen.to_point() + xy0.to_vector();
            let rb = pen.to_point() + xy1.to_vector();
            [
                point(lt.x + quad.skew, lt.y),
                point(rb.x + quad.skew, lt.y),
                rb,
                point(lt.x, rb.y),
            ]
        };
        let uvs = [
            quad.uv0,
            point(quad.uv1.x, quad.uv0.y),
            quad.uv1,
            point(quad.uv0.x, quad.uv1.y),
        ];

        let use_border = style.edge_color.is_visible() && style.edge_width >= 1.0;
        let range = if use_border {
            style.edge_width.max(0.0) as i32
        } else {
            0
        };

        if quad.visible
            && style.shadow_color.is_visible()
            && style.shadow_offset != vector(0.0, 0.0)
        {
            sink.switch_channel(RenderChannel::Shadow);
            sink.push_texture(quad.texture);
            for h in 0..=bold {
                for x in -range..=range {
                    for y in -range..=range {
                        let v = style.shadow_offset + vector((x + h) as f32, y as f32);
                        sink.add_quad_uv(corners.map(|p| p + v), uvs, style.shadow_color);
                    }
                }
            }
            sink.pop_texture();
        }

        if quad.visible && use_border {
            sink.switch_channel(RenderChannel::Border);
            sink.push_texture(quad.texture);
            for h in 0..=bold {
                for x in -range..=range {
                    for y in -range..=range {
                        if x == 0 && y == 0 {
                            continue;
                        }
                        let v = vector((x + h) as f32, y as f32);
                        sink.add_quad_uv(corners.map(|p| p + v), uvs, style.edge_color);
                    }
                }
            }
            sink.pop_texture();
        }

        if !style.text_decoration.is_empty()
            && style.text_decoration_color.is_visible()
            && font.decoration_thickness > 0.0
        {
            let skew = font.top_skew(0.0);
            let left = cell.min.x;
            let right = cell.max.x;
            let top = cell.min.y;
            let baseline = top + font.ascent;
            let bottom = cell.max.y;
            let decoration = Decoration {
                thickness: font.decoration_thickness,
                style: style.text_decoration_style,
                color: style.text_decoration_color,
            };

            if style
                .text_decoration
                .intersects(TextDecoration::OVERLINE | TextDecoration::UNDERLINE)
            {
                sink.switch_channel(RenderChannel::DecorationOverUnder);
                if style.text_decoration.contains(TextDecoration::OVERLINE) {
                    decoration.draw(
                        sink,
                        point(left + skew, top),
                        point(right + skew, top),
                        Side::Above,
                    );
                }
                if style.text_decoration.contains(TextDecoration::UNDERLINE) {
                    decoration.draw(
                        sink,
                        point(left, baseline),
                        point(right, baseline),
                        Side::Below,
                    );
                }
            }

            if style.text_decoration.contains(TextDecoration::LINE_THROUGH) {
                sink.switch_channel(RenderChannel::DecorationThrough);
                let middle = (top + bottom) / 2.0;
                let half_skew = skew / 2.0;
                decoration.draw(
                    sink,
                    point(left + half_skew, middle),
                    point(right + half_skew, middle),
                    Side::Center,
                );
            }
        }

        if quad.visible && style.fore_color.is_visible() {
            sink.switch_channel(RenderChannel::Fore);
            sink.push_texture(quad.texture);
            for h in 0..=bold {
                let v = vector(h as f32, 0.0);
                let [lt, rt, rb, lb] = corners;
                sink.add_quad_uv([lt, rt + v, rb + v, lb], uvs, style.fore_color);
            }
            sink.pop_texture();
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Above,
    Center,
    Below,
}

struct Decoration {
    thickness: f32,
    style: TextDecorationStyle,
    color: crate::style::Rgba32,
}

impl Decoration {
    /// Draws one decoration line. Double lines grow away from the glyph for
    /// overlines and underlines and straddle the middle for strike-through.
    fn draw(&self, sink: &mut dyn DrawSink, mut from: Point, mut to: Point, side: Side) {
        match self.style {
            TextDecorationStyle::Solid => sink.add_line(from, to, self.color, self.thickness),
            TextDecorationStyle::Double => {
                let d = vector(0.0, self.thickness);
                let (up, down, nudge) = match side {
                    Side::Above => (d * -2.0, vector(0.0, 0.0), -0.5),
                    Side::Center => (-d, d, 0.5),
                    Side::Below => (vector(0.0, 0.0), d * 2.0, 0.5),
                };
                from.y += nudge;
                to.y += nudge;
                sink.add_line(from + up, to + up, self.color, self.thickness);
                sink.add_line(from + down, to + down, self.color, self.thickness);
            }
        }
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::monospace::MonospaceFont;
    use crate::font::{AssetProvider, IconEntry, TextureInfo};
    use crate::renderer::{DrawCommand, DrawList};
    use crate::style::Rgba32;
    use crate::text::builder::TextBuilder;
    use crate::text::data::CompositeOffset;

    struct Assets;

    impl AssetProvider for Assets {
        fn resolve_icon(&self, id: u32, _font_size: f32) -> Option<IconEntry> {
            (id == 1).then(|| IconEntry {
                texture: TextureRef::Handle(9),
                size: Size::new(20.0, 10.0),
                uv0: point(0.0, 0.0),
                uv1: point(1.0, 1.0),
            })
        }

        fn resolve_texture(&self, handle: u64) -> Option<TextureInfo> {
            (handle == 5).then(|| TextureInfo {
                texture: TextureRef::Handle(5),
                size: Size::new(30.0, 10.0),
            })
        }
    }

    fn line_for(font: &FontInfo) -> MeasuredLine {
        let mut line = MeasuredLine::empty(CompositeOffset::default());
        line.union_bbox_vertical(font.bbox_vertical);
        line
    }

    #[test]
    fn test_inline_image_width_follows_aspect() {
        let font = MonospaceFont::new(10.0);
        let ctx = RenderContext::new(&font).with_assets(&Assets);
        assert_eq!(resolve_icon(ctx, 10.0, 1).unwrap().width, 20.0);
        assert!(resolve_icon(ctx, 10.0, 2).is_none());

        let data = TextBuilder::new().compile().with_textures(vec![5]);
        let image = resolve_texture(ctx, &data, 7.0, 0, point(0.0, 0.0), point(0.5, 1.0)).unwrap();
        // 15x10 region at 7px: ceil(10.5)
        assert_eq!(image.width, 11.0);
        assert!(resolve_texture(ctx, &data, 7.0, 1, point(0.0, 0.0), point(1.0, 1.0)).is_none());
    }

    #[test]
    fn test_measure_pass_advances_pen() {
        let font = MonospaceFont::new(10.0);
        let ctx = RenderContext::new(&font);
        let data = DataView::default();
        let options = Options::default();
        let mut renderer = CharRenderer::new(
            ctx,
            &data,
            &options,
            None,
            vector(0.0, 0.0),
            point(0.0, 0.0),
        );
        let line = line_for(renderer.font());
        renderer.set_line(&line);

        let a = renderer.render_char('a');
        let b = renderer.render_char('b');
        assert_eq!(a, Rect::new(point(0.0, 0.0), point(10.0, 10.0)));
        assert_eq!(b.min.x, 10.0);
        assert_eq!(renderer.pen.x, 20.0);

        let newline = renderer.render_char('\n');
        assert_eq!(newline.valid_width(), 0.0);
        assert_eq!(renderer.pen.x, 20.0);

        renderer.add_line_break(10.0);
        assert_eq!(renderer.pen, point(0.0, 10.0));
    }

    #[test]
    fn test_draw_emits_channels_in_use() {
        let font = MonospaceFont::new(10.0);
        let ctx = RenderContext::new(&font);
        let data = DataView::default();
        let options = Options {
            style: TextStyle {
                back_color: Rgba32::BLACK,
                shadow_color: Rgba32::BLACK,
                shadow_offset: vector(1.0, 1.0),
                edge_color: Rgba32::BLACK,
                edge_width: 1.0,
                text_decoration: TextDecoration::UNDERLINE | TextDecoration::LINE_THROUGH,
                ..TextStyle::default()
            },
            ..Options::default()
        };

        let mut splitter = ChannelSplitter::new();
        {
            let mut renderer = CharRenderer::new(
                ctx,
                &data,
                &options,
                Some(&mut splitter),
                vector(100.0, 0.0),
                point(0.0, 0.0),
            );
            let line = line_for(renderer.font());
            renderer.set_line(&line);
            renderer.render_char('a');
            // spaces have no ink, only the background
            renderer.render_char(' ');
        }

        let quads = |channel| {
            splitter
                .channel(channel)
                .iter()
                .filter(|c| matches!(c, DrawCommand::QuadUv { .. }))
                .count()
        };
        assert_eq!(splitter.channel(RenderChannel::Back).len(), 2);
        assert_eq!(quads(RenderChannel::Shadow), 9);
        assert_eq!(quads(RenderChannel::Border), 8);
        assert_eq!(quads(RenderChannel::Fore), 1);
        assert_eq!(splitter.channel(RenderChannel::DecorationOverUnder).len(), 2);
        assert_eq!(splitter.channel(RenderChannel::DecorationThrough).len(), 2);

        let mut list = DrawList::new();
        splitter.merge_into(&mut list);
        let Some(DrawCommand::FilledRect { rect, .. }) =
            list.commands_in(RenderChannel::Back).next()
        else {
            panic!("missing background");
        };
        assert_eq!(rect.min, point(100.0, 0.0));
    }

    #[test]
    fn test_double_decoration_draws_two_lines() {
        let mut list = DrawList::new();
        let decoration = Decoration {
            thickness: 1.0,
            style: TextDecorationStyle::Double,
            color: Rgba32::WHITE,
        };
        decoration.draw(&mut list, point(0.0, 8.0), point(10.0, 8.0), Side::Below);
        assert_eq!(list.commands.len(), 2);
        let DrawCommand::Line { from, .. } = list.commands[1] else {
            panic!("expected a line");
        };
        assert_eq!(from.y, 10.5);
    }

    #[test]
    fn test_control_label_precedes_character() {
        let font = MonospaceFont::new(10.0);
        let ctx = RenderContext::new(&font);
        let data = DataView::default();
        let options = Options {
            display_control_characters: true,
            ..Options::default()
        };
        let mut renderer = CharRenderer::new(
            ctx,
            &data,
            &options,
            None,
            vector(0.0, 0.0),
            point(0.0, 0.0),
        );
        let line = line_for(renderer.font());
        renderer.set_line(&line);

        let bounds = renderer.render_char('\n');
        // "LF" label, then the zero-width newline
        assert_eq!(renderer.pen.x, 20.0);
        assert_eq!(bounds.max.x, 20.0);
    }

    #[test]
    fn test_centered_line() {
        let font = MonospaceFont::new(10.0);
        let ctx = RenderContext::new(&font);
        let data = DataView::default();
        let options = Options {
            max_size: Size::new(100.0, f32::INFINITY),
            style: TextStyle {
                horizontal_alignment: 0.5,
                ..TextStyle::default()
            },
            ..Options::default()
        };
        let mut renderer = CharRenderer::new(
            ctx,
            &data,
            &options,
            None,
            vector(0.0, 0.0),
            point(0.0, 0.0),
        );
        let mut line = line_for(renderer.font());
        line.union_bbox_horizontal(0.0, 30.0);
        renderer.set_line(&line);
        assert_eq!(renderer.translation().x, 35.0);
    }
}
