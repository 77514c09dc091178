pub mod channels;
pub mod debug_renderer;
pub mod draw_sink;

pub use channels::ChannelSplitter;
pub use debug_renderer::{Bitmap, render_draw_list_to_bitmap};
pub use draw_sink::{DrawCommand, DrawList, DrawSink, RenderChannel};
