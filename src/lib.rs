//! # Kasane
//!
//! Rich-text layout over a compact, append-only record stream.
//!
//! ## Overview
//!
//! Styled text is built with a [`TextBuilder`], which serialises appended text,
//! style changes, links, inline objects and child spannables into a single
//! byte buffer. A [`DataView`] decodes that buffer into records and
//! [`Measurement`] lays them out: word breaking, line wrapping with an optional
//! wrap marker, alignment, and per-channel glyph emission into any
//! [`DrawSink`]. Link regions found during layout are tracked by a
//! [`LinkTracker`] that turns pointer input into hover and click events.
//!
//! Glyphs come from a [`FontProvider`]. [`FontSystem`] is the `fontdb` and
//! `fontdue` backed one; [`MonospaceFont`] is a synthetic one that needs no
//! font files.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use kasane::style::BoolOrToggle;
//! use kasane::{DrawList, FontSystem, Measurement, Options, RenderContext, TextBuilder};
//!
//! // 1. Create a FontSystem
//! let font_system = FontSystem::new();
//! font_system.load_system_fonts();
//!
//! // 2. Build the record stream
//! let mut builder = TextBuilder::new();
//! builder
//!     .push_bold(BoolOrToggle::On)
//!     .append_str("Hello")
//!     .pop_bold()
//!     .append_str(", world");
//!
//! // 3. Measure with a width constraint
//! let options = Options {
//!     max_size: kasane::geometry::Size::new(200.0, f32::INFINITY),
//!     ..Options::default()
//! };
//! let mut measurement = Measurement::new(Arc::new(builder.compile()), options);
//! let ctx = RenderContext::new(&font_system);
//! measurement.measure(ctx);
//!
//! // 4. Draw into a sink
//! let mut list = DrawList::default();
//! measurement.draw(ctx, &mut list, kasane::geometry::point(0.0, 0.0)).unwrap();
//! ```
//!
//! ## Features
//!
//! *   **Compact Storage**: Varint-encoded records with reversible style pushes.
//! *   **Line Breaking**: Normal, break-all, break-word and keep-all policies, soft hyphens
//!     and wrap markers.
//! *   **Layered Output**: Back, shadow, border, fore and decoration channels drawn in a
//!     fixed order.
//! *   **Thread Safety**: Font systems use internal locking for shared use across measurements.

pub mod error;
pub mod font;
pub mod font_storage;
pub mod font_system;
pub mod geometry;
pub mod glyph_id;
pub mod link;
pub mod pool;
pub mod record;
pub mod renderer;
pub mod spannable;
pub mod style;
pub mod text;

// common re-exports
pub use error::{Error, Result};
pub use font::monospace::MonospaceFont;
pub use font::{AssetProvider, FontProvider, NoAssets, RenderContext};
pub use font_storage::FontStorage;
pub use font_system::FontSystem;
pub use glyph_id::GlyphId;
pub use link::{LinkEvent, LinkState, LinkTracker, MouseButtons, Pointer};
pub use pool::{Pool, Reset};
pub use renderer::{DrawCommand, DrawList, DrawSink, RenderChannel};
pub use spannable::{Spannable, SpannableMeasurement, TextSpannable};
pub use style::{FontId, FontSet, Rgba32, TextStyle};
pub use text::{DataView, Measurement, Options, TextBuilder, WordBreak};

// re-export dependencies
pub use fontdb;
pub use fontdue;
pub use parking_lot;
