//! Objects that measure and draw themselves inside a text flow.
//!
//! A [`Spannable`] is the shareable template (for text, a compiled
//! [`DataView`] plus [`Options`]); a [`SpannableMeasurement`] is the
//! per-use state rented from it. Inline objects and wrap markers are both
//! spannables, and [`Measurement`] is itself a spannable measurement, so text
//! nests inside text.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::font::RenderContext;
use crate::geometry::{Point, Rect, RectExt, Size, Vector};
use crate::link::{LinkEvent, Pointer};
use crate::pool::{Pool, Reset};
use crate::renderer::DrawSink;
use crate::text::data::DataView;
use crate::text::layout::{Measurement, Options};

/// Template that hands out measurements.
pub trait Spannable: Send + Sync + fmt::Debug {
    fn rent_measurement(&self) -> Box<dyn SpannableMeasurement>;

    /// Takes back a measurement obtained from [`Spannable::rent_measurement`].
    fn return_measurement(&self, measurement: Box<dyn SpannableMeasurement>) {
        drop(measurement);
    }
}

/// Layout state of one placed spannable.
pub trait SpannableMeasurement: Reset + Send {
    /// Lays out within `max_size`. Returns `false` when the previous result
    /// was still valid.
    fn measure(&mut self, ctx: RenderContext<'_>, max_size: Size) -> bool;

    /// Extent of the last measurement, relative to its own origin.
    fn boundary(&self) -> Rect;

    /// Draws with the measurement's origin at `origin` and returns the
    /// boundary in sink coordinates.
    fn draw(&self, ctx: RenderContext<'_>, sink: &mut dyn DrawSink, origin: Point) -> Result<Rect>;

    /// Feeds one pointer sample in the measurement's own coordinates.
    ///
    /// `on_event` receives every link event together with the link target.
    fn handle_pointer(
        &mut self,
        pointer: &Pointer,
        on_event: &mut dyn FnMut(LinkEvent, &[u8]),
    ) -> bool;
}

/// Compiled text that can be embedded in other text or used as a wrap
/// marker.
///
/// Measurements are pooled; returning one resets it while keeping its data,
/// options and allocations.
pub struct TextSpannable {
    data: Arc<DataView>,
    options: Options,
    pool: Mutex<Pool<Box<dyn SpannableMeasurement>>>,
}

impl TextSpannable {
    pub fn new(data: Arc<DataView>, options: Options) -> Self {
        Self {
            data,
            options,
            pool: Mutex::new(Pool::new()),
        }
    }

    pub fn data(&self) -> &Arc<DataView> {
        &self.data
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Number of measurements waiting in the pool.
    pub fn idle_measurements(&self) -> usize {
        self.pool.lock().len()
    }
}

impl fmt::Debug for TextSpannable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextSpannable")
            .field("data", &self.data)
            .field("options", &self.options)
            .field("idle_measurements", &self.idle_measurements())
            .finish()
    }
}

impl Spannable for TextSpannable {
    fn rent_measurement(&self) -> Box<dyn SpannableMeasurement> {
        self.pool.lock().rent_or_else(|| {
            Box::new(Measurement::new(
                Arc::clone(&self.data),
                self.options.clone(),
            ))
        })
    }

    fn return_measurement(&self, measurement: Box<dyn SpannableMeasurement>) {
        self.pool.lock().give_back(measurement);
    }
}

/// A rented measurement owned by its parent, returned to the spannable on
/// drop.
pub(crate) struct Child {
    spannable: Arc<dyn Spannable>,
    measurement: Option<Box<dyn SpannableMeasurement>>,
    /// Where the parent placed the child's origin, in parent coordinates.
    pub offset: Option<Vector>,
}

/// Children of a measurement keyed by the index of the record that placed
/// them.
pub(crate) type Children = HashMap<usize, Child, fxhash::FxBuildHasher>;

impl Child {
    pub fn rent(spannable: &Arc<dyn Spannable>) -> Self {
        Self {
            measurement: Some(spannable.rent_measurement()),
            spannable: Arc::clone(spannable),
            offset: None,
        }
    }

    pub fn measure(&mut self, ctx: RenderContext<'_>, max_size: Size) -> Rect {
        match &mut self.measurement {
            Some(measurement) => {
                measurement.measure(ctx, max_size);
                measurement.boundary()
            }
            None => Rect::inverted(),
        }
    }

    pub fn boundary(&self) -> Rect {
        self.measurement
            .as_ref()
            .map_or_else(Rect::inverted, |m| m.boundary())
    }

    pub fn draw(
        &self,
        ctx: RenderContext<'_>,
        sink: &mut dyn DrawSink,
        origin: Point,
    ) -> Result<Rect> {
        match &self.measurement {
            Some(measurement) => measurement.draw(ctx, sink, origin),
            None => Ok(Rect::inverted()),
        }
    }

    /// Forwards `pointer` translated into the child's coordinates. Children
    /// that were never placed ignore it.
    pub fn handle_pointer(
        &mut self,
        pointer: &Pointer,
        on_event: &mut dyn FnMut(LinkEvent, &[u8]),
    ) -> bool {
        match (&mut self.measurement, self.offset) {
            (Some(measurement), Some(offset)) => {
                measurement.handle_pointer(&pointer.translated(-offset), on_event)
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Child {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Child")
            .field("spannable", &self.spannable)
            .field("offset", &self.offset)
            .finish()
    }
}

impl Drop for Child {
    fn drop(&mut self) {
        if let Some(measurement) = self.measurement.take() {
            self.spannable.return_measurement(measurement);
        }
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::monospace::MonospaceFont;
    use crate::text::builder::TextBuilder;

    fn spannable(text: &str) -> Arc<dyn Spannable> {
        let mut builder = TextBuilder::new();
        builder.append_str(text);
        Arc::new(TextSpannable::new(
            Arc::new(builder.compile()),
            Options::default(),
        ))
    }

    #[test]
    fn test_child_measures_text() {
        let font = MonospaceFont::new(10.0);
        let ctx = RenderContext::new(&font);
        let mut child = Child::rent(&spannable("abc"));

        let boundary = child.measure(ctx, Size::new(f32::INFINITY, f32::INFINITY));
        assert!(boundary.is_valid());
        assert_eq!(boundary.max.x, 31.0);
        assert_eq!(child.boundary(), boundary);
    }

    #[test]
    fn test_measurement_returns_to_pool_on_drop() {
        let font = MonospaceFont::new(10.0);
        let ctx = RenderContext::new(&font);
        let template = Arc::new(TextSpannable::new(
            Arc::new(TextBuilder::new().append_str("x").compile()),
            Options::default(),
        ));
        let shared: Arc<dyn Spannable> = template.clone();

        let mut child = Child::rent(&shared);
        child.measure(ctx, Size::new(100.0, 100.0));
        assert_eq!(template.idle_measurements(), 0);
        drop(child);
        assert_eq!(template.idle_measurements(), 1);

        // the pooled measurement comes back reset and still usable
        let mut child = Child::rent(&shared);
        assert_eq!(template.idle_measurements(), 0);
        assert!(child.measure(ctx, Size::new(100.0, 100.0)).is_valid());
    }

    #[test]
    fn test_unplaced_child_ignores_pointer() {
        let mut child = Child::rent(&spannable("abc"));
        let pointer = Pointer::new(crate::geometry::point(1.0, 1.0), Default::default());
        assert!(!child.handle_pointer(&pointer, &mut |_, _| {}));
    }
}
