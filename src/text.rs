//! Token stream construction, traversal and layout.

/// Building token streams with nested style changes.
pub mod builder;
mod char_renderer;
mod control_chars;
/// Compiled token streams and the segment cursor.
pub mod data;
/// Line layout, drawing and link interaction.
pub mod layout;
pub mod measured_line;
mod word_breaker;

pub use builder::{NewLineType, TextBuilder};
pub use data::{CompositeOffset, DataView, Segment};
pub use layout::{Measurement, Options, WordBreak};
pub use measured_line::{LastThing, MeasuredLine};
