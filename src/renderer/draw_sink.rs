use crate::font::TextureRef;
use crate::geometry::{Point, Rect};
use crate::style::Rgba32;

/// Compositing layers, drawn in declaration order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderChannel {
    #[default]
    Back,
    Shadow,
    Border,
    /// Overlines and underlines.
    DecorationOverUnder,
    Fore,
    /// Line-through, drawn over the glyphs.
    DecorationThrough,
}

impl RenderChannel {
    pub const COUNT: usize = 6;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Back,
        Self::Shadow,
        Self::Border,
        Self::DecorationOverUnder,
        Self::Fore,
        Self::DecorationThrough,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Immediate-mode draw target.
///
/// Quads list their corners clockwise from the top left. A quad samples the
/// texture pushed most recently; [`TextureRef::None`] means a solid fill.
pub trait DrawSink {
    /// Subsequent primitives belong to `channel`. Sinks without layering may
    /// ignore this.
    fn switch_channel(&mut self, _channel: RenderChannel) {}

    fn push_texture(&mut self, texture: TextureRef);

    fn pop_texture(&mut self);

    fn add_filled_rect(&mut self, rect: Rect, color: Rgba32);

    fn add_line(&mut self, from: Point, to: Point, color: Rgba32, thickness: f32);

    fn add_quad_uv(&mut self, corners: [Point; 4], uvs: [Point; 4], color: Rgba32);
}

/// A recorded [`DrawSink`] call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawCommand {
    SwitchChannel(RenderChannel),
    PushTexture(TextureRef),
    PopTexture,
    FilledRect {
        rect: Rect,
        color: Rgba32,
    },
    Line {
        from: Point,
        to: Point,
        color: Rgba32,
        thickness: f32,
    },
    QuadUv {
        corners: [Point; 4],
        uvs: [Point; 4],
        color: Rgba32,
    },
}

impl DrawCommand {
    /// Replays this command into `sink`.
    pub fn apply(&self, sink: &mut dyn DrawSink) {
        match *self {
            Self::SwitchChannel(channel) => sink.switch_channel(channel),
            Self::PushTexture(texture) => sink.push_texture(texture),
            Self::PopTexture => sink.pop_texture(),
            Self::FilledRect { rect, color } => sink.add_filled_rect(rect, color),
            Self::Line {
                from,
                to,
                color,
                thickness,
            } => sink.add_line(from, to, color, thickness),
            Self::QuadUv {
                corners,
                uvs,
                color,
            } => sink.add_quad_uv(corners, uvs, color),
        }
    }
}

/// Sink that records every call in order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawList {
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Commands emitted while `channel` was active.
    pub fn commands_in(&self, channel: RenderChannel) -> impl Iterator<Item = &DrawCommand> {
        let mut active = RenderChannel::Back;
        self.commands.iter().filter(move |cmd| {
            if let DrawCommand::SwitchChannel(c) = cmd {
                active = *c;
                return false;
            }
            active == channel
        })
    }
}

impl DrawSink for DrawList {
    fn switch_channel(&mut self, channel: RenderChannel) {
        self.commands.push(DrawCommand::SwitchChannel(channel));
    }

    fn push_texture(&mut self, texture: TextureRef) {
        self.commands.push(DrawCommand::PushTexture(texture));
    }

    fn pop_texture(&mut self) {
        self.commands.push(DrawCommand::PopTexture);
    }

    fn add_filled_rect(&mut self, rect: Rect, color: Rgba32) {
        self.commands.push(DrawCommand::FilledRect { rect, color });
    }

    fn add_line(&mut self, from: Point, to: Point, color: Rgba32, thickness: f32) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            color,
            thickness,
        });
    }

    fn add_quad_uv(&mut self, corners: [Point; 4], uvs: [Point; 4], color: Rgba32) {
        self.commands.push(DrawCommand::QuadUv {
            corners,
            uvs,
            color,
        });
    }
}
