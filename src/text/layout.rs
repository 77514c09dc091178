//! Line layout over a compiled token stream.
//!
//! [`Measurement`] splits a [`DataView`] into [`MeasuredLine`]s, collects the
//! overall boundary and one rectangle per link run, and places nested
//! spannables. Drawing replays the cached lines through the same
//! [`CharRenderer`] with a [`ChannelSplitter`] attached.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::font::RenderContext;
use crate::geometry::{Point, Rect, RectExt, Size, Vector, point, vector};
use crate::link::{LinkBoundary, LinkEvent, LinkState, LinkTracker, Pointer};
use crate::pool::Reset;
use crate::record::RecordType;
use crate::renderer::{ChannelSplitter, DrawSink, RenderChannel};
use crate::spannable::{Child, Children, Spannable, SpannableMeasurement};
use crate::style::{Rgba32, TextStyle};
use crate::text::builder::NewLineType;
use crate::text::char_renderer::CharRenderer;
use crate::text::data::{CompositeOffset, DataView, decode_char, decode_char_before};
use crate::text::measured_line::{LastThing, MeasuredLine};
use crate::text::word_breaker::{Unit, WordBreaker};

/// Where a line may wrap when it runs out of width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WordBreak {
    /// At whitespace and CJK boundaries. A word wider than the line is kept
    /// whole and the line breaks after it.
    #[default]
    Normal,
    /// Between any two units.
    BreakAll,
    /// Like `Normal`, but a word that does not fit on its own is split.
    BreakWord,
    /// Never wraps.
    KeepAll,
}

/// Layout configuration shared by every line of a measurement.
#[derive(Clone, Debug)]
pub struct Options {
    /// Prefix control characters with their short names.
    pub display_control_characters: bool,
    pub word_break: WordBreak,
    pub accepted_new_lines: NewLineType,
    /// Tab stop distance. Positive values are pixels, negative values count
    /// space widths, and `0` measures a tab like any other character.
    pub tab_width: f32,
    /// Position of the whole text inside `max_size.height`, in `[0, 1]`.
    pub vertical_alignment: f32,
    pub control_characters_style: TextStyle,
    /// Style in effect at the start of the stream.
    pub style: TextStyle,
    /// Drawn at the end of every wrapped line.
    pub wrap_marker: Option<Arc<dyn Spannable>>,
    pub max_size: Size,
    pub link_hover_color: Rgba32,
    pub link_active_color: Rgba32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            display_control_characters: false,
            word_break: WordBreak::Normal,
            accepted_new_lines: NewLineType::ALL,
            tab_width: -4.0,
            vertical_alignment: 0.0,
            control_characters_style: TextStyle {
                back_color: Rgba32::from_rgba(0x44, 0x44, 0x44, 0xFF),
                ..TextStyle::default()
            },
            style: TextStyle::default(),
            wrap_marker: None,
            max_size: Size::new(f32::INFINITY, f32::INFINITY),
            link_hover_color: Rgba32::from_rgba(0xFF, 0xFF, 0xFF, 0x30),
            link_active_color: Rgba32::from_rgba(0xFF, 0xFF, 0xFF, 0x60),
        }
    }
}

impl PartialEq for Options {
    fn eq(&self, other: &Self) -> bool {
        let same_marker = match (&self.wrap_marker, &other.wrap_marker) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };

        same_marker
            && self.display_control_characters == other.display_control_characters
            && self.word_break == other.word_break
            && self.accepted_new_lines == other.accepted_new_lines
            && self.tab_width == other.tab_width
            && self.vertical_alignment == other.vertical_alignment
            && self.control_characters_style == other.control_characters_style
            && self.style == other.style
            && self.max_size == other.max_size
            && self.link_hover_color == other.link_hover_color
            && self.link_active_color == other.link_active_color
    }
}

/// Layout state of one data view under one set of options.
///
/// `measure` is a no-op until the data, the options or the maximum size
/// change. `draw` and `handle_pointer` use the cached result.
#[derive(Debug)]
pub struct Measurement {
    data: Arc<DataView>,
    options: Options,

    lines: Vec<MeasuredLine>,
    links: LinkTracker,
    children: Children,
    wrap_marker: Option<Child>,
    boundary: Rect,
    /// Vertical shift from `Options::vertical_alignment`.
    shift: f32,
    valid: bool,
}

impl Measurement {
    pub fn new(data: Arc<DataView>, options: Options) -> Self {
        Self {
            data,
            options,
            lines: Vec::new(),
            links: LinkTracker::new(),
            children: Children::default(),
            wrap_marker: None,
            boundary: Rect::zero(),
            shift: 0.0,
            valid: false,
        }
    }

    pub fn data(&self) -> &Arc<DataView> {
        &self.data
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Replaces the token stream. Nested measurements and link state are
    /// dropped since record indices no longer mean the same thing.
    pub fn set_data(&mut self, data: Arc<DataView>) {
        self.data = data;
        self.children.clear();
        self.links.reset();
        self.valid = false;
    }

    pub fn set_options(&mut self, options: Options) {
        if self.options == options {
            return;
        }
        let marker_changed = match (&self.options.wrap_marker, &options.wrap_marker) {
            (Some(a), Some(b)) => !Arc::ptr_eq(a, b),
            (None, None) => false,
            _ => true,
        };
        if marker_changed {
            self.wrap_marker = None;
        }
        self.options = options;
        self.valid = false;
    }

    /// Edits the options in place; invalidates only if something changed.
    pub fn update_options(&mut self, f: impl FnOnce(&mut Options)) {
        let mut options = self.options.clone();
        f(&mut options);
        self.set_options(options);
    }

    pub fn set_max_size(&mut self, max_size: Size) {
        if self.options.max_size != max_size {
            self.options.max_size = max_size;
            self.valid = false;
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn lines(&self) -> &[MeasuredLine] {
        &self.lines
    }

    pub fn links(&self) -> &LinkTracker {
        &self.links
    }

    /// Extent of the laid out text, including the vertical alignment shift.
    /// A zero rectangle when nothing was laid out.
    pub fn boundary(&self) -> Rect {
        self.boundary
    }

    /// Lays out the text. Returns `false` when the previous result is still
    /// valid.
    pub fn measure(&mut self, ctx: RenderContext<'_>) -> bool {
        if self.valid {
            return false;
        }

        let data = Arc::clone(&self.data);
        let data = &*data;
        let options = self.options.clone();

        if self.wrap_marker.is_none() {
            self.wrap_marker = options.wrap_marker.as_ref().map(Child::rent);
        }
        let marker_boundary = self.wrap_marker.as_mut().and_then(|marker| {
            let boundary = marker.measure(ctx, Size::new(f32::INFINITY, f32::INFINITY));
            if !boundary.is_valid() {
                log::warn!("Wrap marker measured to an invalid boundary; ignoring it.");
                return None;
            }
            Some(boundary)
        });

        let mut children = std::mem::take(&mut self.children);
        let mut lines = Vec::new();
        let mut out = PassOutput::new();
        let mut renderer = CharRenderer::new(
            ctx,
            data,
            &options,
            None,
            vector(0.0, 0.0),
            point(0.0, 0.0),
        );
        let control_font = renderer.control_font().copied();

        let end = data.end_offset();
        let mut start = CompositeOffset::default();
        loop {
            let mut breaker = WordBreaker::new(
                ctx,
                data,
                &options,
                control_font.as_ref(),
                marker_boundary.map(|b| b.max.x),
                renderer.style,
                *renderer.font(),
                start,
            );
            let mut line = find_line_end(
                &mut breaker,
                data,
                &options,
                start,
                &mut children,
                renderer.pen.y,
            );
            line.first_offset = start;
            line.omit_offset = if line.is_wrapped {
                omit_offset(data, &line)
            } else {
                line.offset
            };
            lines.push(line);

            lay_out_line(
                &mut renderer,
                data,
                &line,
                &children,
                &options,
                marker_boundary.as_ref(),
                &mut out,
            );

            if line.offset >= end {
                break;
            }
            if line.offset <= start {
                log::warn!("Line at {start:?} made no progress; stopping layout.");
                break;
            }
            start = line.offset;
        }

        let mut boundary = out.finish(renderer.pen.y);
        let max_height = options.max_size.height;
        let shift = if options.vertical_alignment > 0.0 && max_height.is_finite() {
            let alignment = options.vertical_alignment.clamp(0.0, 1.0);
            ((max_height - boundary.valid_height()) * alignment).round()
        } else {
            0.0
        };
        let shift_by = vector(0.0, shift);
        boundary = boundary.translate(shift_by);

        self.links.clear_boundaries();
        for link in out.links {
            self.links.push(link);
        }
        self.links.translate(shift_by);

        for child in children.values_mut() {
            child.offset = None;
        }
        for (index, offset) in out.child_offsets {
            if let Some(child) = children.get_mut(&index) {
                child.offset = Some(offset + shift_by);
            }
        }

        self.children = children;
        self.lines = lines;
        self.boundary = boundary;
        self.shift = shift;
        self.valid = true;
        true
    }

    /// Draws the measured text with its origin at `origin` and returns the
    /// boundary in sink coordinates.
    pub fn draw(
        &self,
        ctx: RenderContext<'_>,
        sink: &mut dyn DrawSink,
        origin: Point,
    ) -> Result<Rect> {
        if !self.valid {
            return Err(Error::NotMeasured);
        }

        let data = &*self.data;
        let options = &self.options;
        let origin = origin.to_vector();
        let marker_boundary = self
            .wrap_marker
            .as_ref()
            .map(Child::boundary)
            .filter(RectExt::is_valid);

        let mut splitter = ChannelSplitter::new();
        let mut out = PassOutput::new();
        let pen_y = {
            let mut renderer = CharRenderer::new(
                ctx,
                data,
                options,
                Some(&mut splitter),
                origin,
                point(0.0, self.shift),
            );
            for line in &self.lines {
                lay_out_line(
                    &mut renderer,
                    data,
                    line,
                    &self.children,
                    options,
                    marker_boundary.as_ref(),
                    &mut out,
                );
            }
            renderer.pen.y
        };

        let highlight = match self.links.state() {
            LinkState::Hovered => Some(options.link_hover_color),
            LinkState::Active => Some(options.link_active_color),
            _ => None,
        };
        if let (Some(color), Some(interacted)) = (highlight, self.links.interacted()) {
            splitter.switch_channel(RenderChannel::Back);
            for link in self.links.boundaries() {
                if link.record_index == interacted {
                    splitter.add_filled_rect(link.rect.translate(origin), color);
                }
            }
        }

        splitter.merge_into(sink);
        let boundary = out.finish(pen_y).translate(origin);

        let mut placed = std::mem::take(&mut out.child_offsets);
        placed.sort_by_key(|&(index, _)| index);
        for (index, offset) in placed {
            if let Some(child) = self.children.get(&index) {
                child.draw(ctx, sink, origin.to_point() + offset)?;
            }
        }
        if let Some(marker) = &self.wrap_marker {
            for offset in &out.wrap_markers {
                marker.draw(ctx, sink, origin.to_point() + *offset)?;
            }
        }

        Ok(boundary)
    }

    /// Feeds one pointer sample, in measurement coordinates, to nested
    /// spannables and then to this measurement's links.
    ///
    /// `on_event` receives each link event with the link target. Returns
    /// `true` while any link is hovered or pressed.
    pub fn handle_pointer(
        &mut self,
        pointer: &Pointer,
        on_event: &mut dyn FnMut(LinkEvent, &[u8]),
    ) -> bool {
        let mut interacted = false;
        for child in self.children.values_mut() {
            interacted |= child.handle_pointer(pointer, on_event);
        }

        let data = &self.data;
        interacted |= self.links.handle_pointer(pointer, &mut |event| {
            on_event(event, data.link_at(event.record_index()).unwrap_or(&[]));
        });
        interacted
    }
}

impl SpannableMeasurement for Measurement {
    fn measure(&mut self, ctx: RenderContext<'_>, max_size: Size) -> bool {
        self.set_max_size(max_size);
        Measurement::measure(self, ctx)
    }

    fn boundary(&self) -> Rect {
        if self.valid {
            self.boundary
        } else {
            Rect::inverted()
        }
    }

    fn draw(&self, ctx: RenderContext<'_>, sink: &mut dyn DrawSink, origin: Point) -> Result<Rect> {
        Measurement::draw(self, ctx, sink, origin)
    }

    fn handle_pointer(
        &mut self,
        pointer: &Pointer,
        on_event: &mut dyn FnMut(LinkEvent, &[u8]),
    ) -> bool {
        Measurement::handle_pointer(self, pointer, on_event)
    }
}

impl Reset for Measurement {
    /// Forgets the layout; data and options stay.
    fn reset(&mut self) {
        self.lines.clear();
        self.links.reset();
        self.children.clear();
        self.wrap_marker = None;
        self.boundary = Rect::zero();
        self.shift = 0.0;
        self.valid = false;
    }

    fn is_reset(&self) -> bool {
        self.lines.is_empty()
            && self.links.is_reset()
            && self.children.is_empty()
            && self.wrap_marker.is_none()
            && !self.valid
    }
}

/// What one pass over the lines produces.
struct PassOutput {
    boundary: Rect,
    links: Vec<LinkBoundary>,
    child_offsets: Vec<(usize, Vector)>,
    wrap_markers: Vec<Vector>,
    current_link: Option<usize>,
    /// Bounds since the last flush.
    accumulated: Rect,
}

impl PassOutput {
    fn new() -> Self {
        Self {
            boundary: Rect::inverted(),
            links: Vec::new(),
            child_offsets: Vec::new(),
            wrap_markers: Vec::new(),
            current_link: None,
            accumulated: Rect::inverted(),
        }
    }

    fn add(&mut self, bounds: &Rect) {
        self.accumulated = self.accumulated.union_valid(bounds);
    }

    /// Commits the accumulated bounds to the boundary and, inside a link, to
    /// a new link rectangle.
    fn flush(&mut self) {
        let accumulated = std::mem::replace(&mut self.accumulated, Rect::inverted());
        if !accumulated.is_valid() {
            return;
        }
        self.boundary = self.boundary.union_valid(&accumulated);
        if let Some(record_index) = self.current_link {
            self.links.push(LinkBoundary {
                record_index,
                rect: accumulated,
            });
        }
    }

    fn extend_downward(&mut self, y: f32) {
        if self.boundary.is_valid() {
            self.boundary.max.y = self.boundary.max.y.max(y);
        }
    }

    /// Final boundary once the pen rests at `pen_y`.
    fn finish(&mut self, pen_y: f32) -> Rect {
        self.flush();
        self.extend_downward(pen_y);
        if !self.boundary.is_valid() {
            return Rect::zero();
        }
        let mut boundary = self.boundary;
        boundary.max.x += 1.0;
        boundary
    }
}

/// Feeds units from `start` into `breaker` until it ends a line.
fn find_line_end(
    breaker: &mut WordBreaker<'_>,
    data: &DataView,
    options: &Options,
    start: CompositeOffset,
    children: &mut Children,
    pen_y: f32,
) -> MeasuredLine {
    let accepted = options.accepted_new_lines;
    let mut segment = data.segment_at(start);

    while let Some(seg) = segment {
        if let Some((index, record, bytes)) = seg.record() {
            let after = CompositeOffset::new(seg.offset().text, index + 1);
            if let Some(line) = breaker.handle_span(index, record, bytes, after, children, pen_y) {
                return line;
            }
        } else {
            let text = seg.raw_text();
            let CompositeOffset { text: base, record } = seg.offset();
            let mut i = 0;
            while i < text.len() {
                let (c, n) = decode_char(&text[i..]);
                let after = CompositeOffset::new(base + i + n, record);
                let unit = match c {
                    '\r' if accepted.contains(NewLineType::CR_LF)
                        && text.get(i + 1) == Some(&b'\n') =>
                    {
                        let after = CompositeOffset::new(base + i + 2, record);
                        return breaker.finish_with_new_line("\r\n", after);
                    }
                    '\r' if accepted.contains(NewLineType::CR) => {
                        return breaker.finish_with_new_line("\r", after);
                    }
                    '\n' if accepted.contains(NewLineType::LF) => {
                        return breaker.finish_with_new_line("\n", after);
                    }
                    '\r' | '\n' => Unit::Opaque(c),
                    _ => Unit::Char(c),
                };
                if let Some(line) = breaker.add_codepoint_and_measure(unit, after) {
                    return line;
                }
                i += n;
            }
        }
        segment = seg.next();
    }

    breaker.last(data.end_offset())
}

/// Start of the whitespace run that ends a wrapped line.
///
/// The scan stays within the line and never crosses an inline object.
fn omit_offset(data: &DataView, line: &MeasuredLine) -> CompositeOffset {
    let records = data.records();
    let from = line.first_offset.record.min(records.len());
    let to = line.offset.record.min(records.len());
    let floor = records[from..to.max(from)]
        .iter()
        .rev()
        .find(|r| r.ty.is_object())
        .map_or(0, |r| r.text_start as usize)
        .max(line.first_offset.text);

    let text = data.text();
    let mut end = line.offset.text.min(text.len());
    while let Some((c, n)) = decode_char_before(text, end, floor) {
        if !c.is_whitespace() {
            break;
        }
        end -= n;
    }
    CompositeOffset::new(end, line.offset.record)
}

/// Renders one line and runs the end-of-line step. Shared by the measure and
/// draw passes so both agree on every position.
fn lay_out_line(
    renderer: &mut CharRenderer<'_>,
    data: &DataView,
    line: &MeasuredLine,
    children: &Children,
    options: &Options,
    marker_boundary: Option<&Rect>,
    out: &mut PassOutput,
) {
    let line_top = renderer.pen.y;
    renderer.set_line(line);

    let mut segment = data.segment_at(line.first_offset);
    while let Some(seg) = segment {
        if seg.offset() >= line.offset {
            break;
        }

        if let Some((index, record, bytes)) = seg.record() {
            let is_link = record.ty == RecordType::Link;
            if is_link {
                out.flush();
            }
            let (bounds, placement) = renderer.handle_record(index, record, bytes, children);
            if is_link {
                out.current_link = renderer.style.link;
            }
            out.add(&bounds);
            if let Some(offset) = placement {
                out.child_offsets.push((index, offset));
            }
        } else {
            let text = seg.raw_text();
            let base = seg.offset().text;
            let mut i = 0;
            while i < text.len() && base + i < line.omit_offset.text {
                let (c, n) = decode_char(&text[i..]);
                let bounds = renderer.render_char(c);
                out.add(&bounds);
                i += n;
            }
        }
        segment = seg.next();
    }

    if line.is_wrapped {
        if line.last_thing == LastThing::Codepoint('\u{AD}')
            && options.word_break != WordBreak::KeepAll
        {
            let bounds = renderer.render_hyphen();
            out.add(&bounds);
        }
        if let Some(boundary) = marker_boundary {
            let offset = renderer.place_object(boundary);
            out.add(&boundary.translate(offset));
            out.wrap_markers.push(offset);
        }
    }
    out.flush();

    let font = renderer.font();
    let line_box = font.bbox_vertical[1] - font.bbox_vertical[0];
    out.extend_downward(line_top + line_box);

    if line.has_new_line_at_end || (line.is_wrapped && options.word_break != WordBreak::KeepAll) {
        renderer.add_line_break(line.height());
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::monospace::MonospaceFont;
    use crate::link::MouseButtons;
    use crate::renderer::{DrawCommand, DrawList};
    use crate::spannable::TextSpannable;
    use crate::text::builder::TextBuilder;

    fn measurement(build: impl FnOnce(&mut TextBuilder), options: Options) -> Measurement {
        let mut builder = TextBuilder::new();
        build(&mut builder);
        Measurement::new(Arc::new(builder.compile()), options)
    }

    fn width(w: f32) -> Options {
        Options {
            max_size: Size::new(w, f32::INFINITY),
            ..Options::default()
        }
    }

    #[test]
    fn test_single_line() {
        let font = MonospaceFont::new(10.0);
        let ctx = RenderContext::new(&font);
        let mut m = measurement(
            |b| {
                b.append_str("abc");
            },
            Options::default(),
        );

        assert!(m.measure(ctx));
        assert!(!m.measure(ctx));
        assert_eq!(m.lines().len(), 1);
        assert_eq!(m.boundary(), Rect::new(point(0.0, 0.0), point(31.0, 10.0)));
    }

    #[test]
    fn test_empty_stream() {
        let font = MonospaceFont::new(10.0);
        let ctx = RenderContext::new(&font);
        let mut m = measurement(|_| {}, Options::default());
        m.measure(ctx);
        assert_eq!(m.lines().len(), 1);
        assert_eq!(m.boundary(), Rect::zero());
    }

    #[test]
    fn test_wrapped_line_omits_trailing_space() {
        let font = MonospaceFont::new(10.0);
        let ctx = RenderContext::new(&font);
        let mut m = measurement(
            |b| {
                b.append_str("Hello world");
            },
            width(45.0),
        );
        m.measure(ctx);

        let lines = m.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].offset, CompositeOffset::new(6, 0));
        assert_eq!(lines[0].omit_offset, CompositeOffset::new(5, 0));
        assert_eq!(lines[1].first_offset, CompositeOffset::new(6, 0));
        assert_eq!(m.boundary().max.y, 20.0);
    }

    #[test]
    fn test_newlines_and_accepted_types() {
        let font = MonospaceFont::new(10.0);
        let ctx = RenderContext::new(&font);
        let mut m = measurement(
            |b| {
                b.append_str("a\r\nb\nc");
            },
            Options::default(),
        );
        m.measure(ctx);
        assert_eq!(m.lines().len(), 3);
        assert!(m.lines()[0].has_new_line_at_end);
        assert_eq!(m.lines()[1].first_offset, CompositeOffset::new(3, 0));

        let mut options = Options::default();
        options.accepted_new_lines = NewLineType::MANUAL;
        let mut m = measurement(
            |b| {
                b.append_str("a\nb");
            },
            options,
        );
        m.measure(ctx);
        assert_eq!(m.lines().len(), 1);
    }

    #[test]
    fn test_manual_new_line_record() {
        let font = MonospaceFont::new(10.0);
        let ctx = RenderContext::new(&font);
        let mut m = measurement(
            |b| {
                b.append_str("ab").append_line(NewLineType::MANUAL).append_str("c");
            },
            Options::default(),
        );
        m.measure(ctx);
        assert_eq!(m.lines().len(), 2);
        assert_eq!(m.boundary().max.y, 20.0);
    }

    #[test]
    fn test_options_change_invalidates() {
        let font = MonospaceFont::new(10.0);
        let ctx = RenderContext::new(&font);
        let mut m = measurement(
            |b| {
                b.append_str("abc");
            },
            Options::default(),
        );
        m.measure(ctx);

        m.update_options(|_| {});
        assert!(m.is_valid());
        m.update_options(|o| o.word_break = WordBreak::BreakAll);
        assert!(!m.is_valid());
        m.measure(ctx);
        m.set_max_size(Size::new(f32::INFINITY, f32::INFINITY));
        assert!(m.is_valid());
        m.set_max_size(Size::new(15.0, f32::INFINITY));
        assert!(!m.is_valid());
        m.measure(ctx);
        assert_eq!(m.lines().len(), 3);
    }

    #[test]
    fn test_draw_requires_measure() {
        let font = MonospaceFont::new(10.0);
        let ctx = RenderContext::new(&font);
        let m = measurement(
            |b| {
                b.append_str("abc");
            },
            Options::default(),
        );
        let mut list = DrawList::new();
        assert!(matches!(
            m.draw(ctx, &mut list, point(0.0, 0.0)),
            Err(Error::NotMeasured)
        ));
    }

    #[test]
    fn test_draw_matches_measure() {
        let font = MonospaceFont::new(10.0);
        let ctx = RenderContext::new(&font);
        let mut m = measurement(
            |b| {
                b.append_str("lorem ipsum dolor");
            },
            width(60.0),
        );
        m.measure(ctx);

        let mut list = DrawList::new();
        let drawn = m.draw(ctx, &mut list, point(5.0, 7.0)).unwrap();
        assert_eq!(drawn, m.boundary().translate(vector(5.0, 7.0)));
        assert!(list.commands_in(RenderChannel::Fore).count() > 0);
    }

    #[test]
    fn test_vertical_alignment_shifts_everything() {
        let font = MonospaceFont::new(10.0);
        let ctx = RenderContext::new(&font);
        let mut m = measurement(
            |b| {
                b.push_link(b"x").append_str("ab").pop_link();
            },
            Options {
                vertical_alignment: 1.0,
                max_size: Size::new(100.0, 50.0),
                ..Options::default()
            },
        );
        m.measure(ctx);
        assert_eq!(m.boundary().min.y, 40.0);
        assert_eq!(m.links().boundaries()[0].rect.min.y, 40.0);
    }

    #[test]
    fn test_soft_hyphen_rendered_at_break() {
        let font = MonospaceFont::new(10.0);
        let ctx = RenderContext::new(&font);
        let options = Options {
            word_break: WordBreak::BreakWord,
            ..width(45.0)
        };
        let mut m = measurement(
            |b| {
                b.append_str("ab\u{AD}cdef");
            },
            options,
        );
        m.measure(ctx);
        assert_eq!(m.lines().len(), 2);

        let mut list = DrawList::new();
        m.draw(ctx, &mut list, point(0.0, 0.0)).unwrap();
        // a, b, the hyphen, then c..f on the next line
        let quads = list
            .commands_in(RenderChannel::Fore)
            .filter(|c| matches!(c, DrawCommand::QuadUv { .. }))
            .count();
        assert_eq!(quads, 7);
    }

    #[test]
    fn test_wrap_marker_drawn_per_wrap() {
        let font = MonospaceFont::new(10.0);
        let ctx = RenderContext::new(&font);
        let mut marker = TextBuilder::new();
        marker.append_str(">");
        let marker: Arc<dyn Spannable> = Arc::new(TextSpannable::new(
            Arc::new(marker.compile()),
            Options::default(),
        ));
        let options = Options {
            word_break: WordBreak::BreakAll,
            wrap_marker: Some(marker),
            ..width(45.0)
        };
        let mut m = measurement(
            |b| {
                b.append_str("abcdefgh");
            },
            options,
        );
        m.measure(ctx);
        // "abc" + marker, "def" + marker, "gh"
        assert_eq!(m.lines().len(), 3);
        assert!(m.boundary().max.x <= 46.0);
    }

    #[test]
    fn test_link_events_carry_target() {
        let font = MonospaceFont::new(10.0);
        let ctx = RenderContext::new(&font);
        let mut m = measurement(
            |b| {
                b.append_str("go ").push_link(b"target").append_str("here").pop_link();
            },
            Options::default(),
        );
        m.measure(ctx);
        assert_eq!(m.links().boundaries().len(), 1);

        let mut seen = vec![];
        let hovering = m.handle_pointer(
            &Pointer::new(point(35.0, 5.0), MouseButtons::empty()),
            &mut |event: LinkEvent, target: &[u8]| seen.push((event, target.to_vec())),
        );
        assert!(hovering);
        assert_eq!(seen, vec![(LinkEvent::Enter(0), b"target".to_vec())]);

        let mut list = DrawList::new();
        m.draw(ctx, &mut list, point(0.0, 0.0)).unwrap();
        let highlighted = list.commands_in(RenderChannel::Back).any(|c| {
            matches!(
                c,
                DrawCommand::FilledRect { color, .. }
                    if *color == Options::default().link_hover_color
            )
        });
        assert!(highlighted);
    }

    #[test]
    fn test_reset_keeps_data() {
        let font = MonospaceFont::new(10.0);
        let ctx = RenderContext::new(&font);
        let mut m = measurement(
            |b| {
                b.append_str("abc");
            },
            Options::default(),
        );
        m.measure(ctx);
        m.reset();
        assert!(m.is_reset());
        assert_eq!(m.data().text(), b"abc");
        assert!(m.measure(ctx));
    }
}
