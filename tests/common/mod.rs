#![allow(dead_code)]

use std::sync::Arc;

use kasane::geometry::Size;
use kasane::{MonospaceFont, Measurement, Options, TextBuilder};

/// Every printable character is a 10x10 cell.
pub fn font() -> MonospaceFont {
    MonospaceFont::new(10.0)
}

pub fn build(f: impl FnOnce(&mut TextBuilder)) -> TextBuilder {
    let mut builder = TextBuilder::new();
    f(&mut builder);
    builder
}

pub fn measurement(f: impl FnOnce(&mut TextBuilder), options: Options) -> Measurement {
    Measurement::new(Arc::new(build(f).compile()), options)
}

pub fn width(w: f32) -> Options {
    Options {
        max_size: Size::new(w, f32::INFINITY),
        ..Options::default()
    }
}
