use crate::font::TextureRef;
use crate::geometry::{Point, Rect};
use crate::renderer::draw_sink::{DrawCommand, DrawSink, RenderChannel};
use crate::style::Rgba32;

/// Buffers primitives per [`RenderChannel`] and commits them in channel
/// order, so a glyph's shadow never covers the glyph before it.
#[derive(Clone, Debug, Default)]
pub struct ChannelSplitter {
    current: RenderChannel,
    channels: [Vec<DrawCommand>; RenderChannel::COUNT],
}

impl ChannelSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.iter().all(Vec::is_empty)
    }

    pub fn channel(&self, channel: RenderChannel) -> &[DrawCommand] {
        &self.channels[channel.index()]
    }

    /// Replays every buffered channel into `sink` and empties the buffers.
    pub fn merge_into(&mut self, sink: &mut dyn DrawSink) {
        for channel in RenderChannel::ALL {
            let commands = &mut self.channels[channel.index()];
            if commands.is_empty() {
                continue;
            }
            sink.switch_channel(channel);
            for command in commands.drain(..) {
                command.apply(sink);
            }
        }
        self.current = RenderChannel::Back;
    }

    fn push(&mut self, command: DrawCommand) {
        self.channels[self.current.index()].push(command);
    }
}

impl DrawSink for ChannelSplitter {
    fn switch_channel(&mut self, channel: RenderChannel) {
        self.current = channel;
    }

    fn push_texture(&mut self, texture: TextureRef) {
        self.push(DrawCommand::PushTexture(texture));
    }

    fn pop_texture(&mut self) {
        self.push(DrawCommand::PopTexture);
    }

    fn add_filled_rect(&mut self, rect: Rect, color: Rgba32) {
        self.push(DrawCommand::FilledRect { rect, color });
    }

    fn add_line(&mut self, from: Point, to: Point, color: Rgba32, thickness: f32) {
        self.push(DrawCommand::Line {
            from,
            to,
            color,
            thickness,
        });
    }

    fn add_quad_uv(&mut self, corners: [Point; 4], uvs: [Point; 4], color: Rgba32) {
        self.push(DrawCommand::QuadUv {
            corners,
            uvs,
            color,
        });
    }
}
