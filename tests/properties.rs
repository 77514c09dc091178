//! Property-based tests for the record codec, the builder stacks and line
//! breaking.

mod common;

use std::sync::Arc;

use common::{font, width};
use kasane::geometry::{point, vector};
use kasane::record::codec::{decode_varint, encode_varint, encoded_len};
use kasane::style::{BoolOrToggle, TextDecoration};
use kasane::text::DataView;
use kasane::{
    DrawList, Measurement, Options, RenderContext, Rgba32, TextBuilder, TextStyle, WordBreak,
};
use proptest::prelude::*;

fn words() -> impl Strategy<Value = String> {
    "[a-z ]{0,40}"
}

fn sizes() -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec((1u8..64).prop_map(f32::from), 1..8)
}

fn policy() -> impl Strategy<Value = WordBreak> {
    prop::sample::select(vec![
        WordBreak::Normal,
        WordBreak::BreakAll,
        WordBreak::BreakWord,
        WordBreak::KeepAll,
    ])
}

/// One push on some style axis.
#[derive(Clone, Debug)]
enum Push {
    FontSize(f32),
    ForeColor(Rgba32),
    BackColor(Rgba32),
    ShadowOffset(f32, f32),
    Decoration(TextDecoration),
    EdgeWidth(f32),
    Link(Vec<u8>),
    Bold(BoolOrToggle),
}

fn push() -> impl Strategy<Value = Push> {
    prop_oneof![
        (1u8..64).prop_map(|v| Push::FontSize(f32::from(v))),
        any::<u32>().prop_map(|v| Push::ForeColor(Rgba32(v))),
        any::<u32>().prop_map(|v| Push::BackColor(Rgba32(v))),
        (-4i8..4, -4i8..4).prop_map(|(x, y)| Push::ShadowOffset(f32::from(x), f32::from(y))),
        (0u8..8).prop_map(|v| Push::Decoration(TextDecoration::from_bits_truncate(v))),
        (0u8..4).prop_map(|v| Push::EdgeWidth(f32::from(v))),
        prop::collection::vec(b'a'..=b'z', 0..4).prop_map(Push::Link),
        prop::sample::select(vec![
            BoolOrToggle::NoChange,
            BoolOrToggle::On,
            BoolOrToggle::Off,
            BoolOrToggle::Change,
        ])
        .prop_map(Push::Bold),
    ]
}

impl Push {
    fn apply(&self, b: &mut TextBuilder) {
        match self {
            Self::FontSize(v) => b.push_font_size(*v),
            Self::ForeColor(v) => b.push_fore_color(*v),
            Self::BackColor(v) => b.push_back_color(*v),
            Self::ShadowOffset(x, y) => b.push_shadow_offset(vector(*x, *y)),
            Self::Decoration(v) => b.push_text_decoration(*v),
            Self::EdgeWidth(v) => b.push_edge_width(*v),
            Self::Link(target) => b.push_link(target),
            Self::Bold(v) => b.push_bold(*v),
        };
    }

    fn pop(&self, b: &mut TextBuilder) {
        match self {
            Self::FontSize(_) => b.pop_font_size(),
            Self::ForeColor(_) => b.pop_fore_color(),
            Self::BackColor(_) => b.pop_back_color(),
            Self::ShadowOffset(..) => b.pop_shadow_offset(),
            Self::Decoration(_) => b.pop_text_decoration(),
            Self::EdgeWidth(_) => b.pop_edge_width(),
            Self::Link(_) => b.pop_link(),
            Self::Bold(_) => b.pop_bold(),
        };
    }
}

/// Style after folding every record written so far, with the link reduced
/// to its target since re-asserted links open under a new record index.
fn folded(builder: &TextBuilder) -> (TextStyle, Option<Vec<u8>>) {
    let view = builder.compile();
    let initial = TextStyle::default();
    let mut style = initial;
    for (index, record) in view.records().iter().enumerate() {
        style.update_from(record, index, view.record_data(record), &initial, view.font_sets());
    }
    let target = style
        .link
        .and_then(|index| view.link_at(index))
        .map(<[u8]>::to_vec);
    (TextStyle { link: None, ..style }, target)
}

/// One run of text, optionally inside a link.
fn runs() -> impl Strategy<Value = Vec<(String, Option<u8>)>> {
    prop::collection::vec(("[a-z ]{1,8}", prop::option::of(0u8..4)), 1..8)
}

proptest! {
    /// Every u32 survives the varint codec and reports its own length.
    #[test]
    fn varint_round_trips(value in any::<u32>()) {
        let mut buf = Vec::new();
        let written = encode_varint(&mut buf, value);
        prop_assert_eq!(written, buf.len());
        prop_assert_eq!(written, encoded_len(value));
        prop_assert_eq!(decode_varint(&buf), Some((value, written)));
    }

    /// A compiled stream rebuilt from its encoded record table is identical.
    #[test]
    fn encoded_records_rebuild_the_view(text in words(), sizes in sizes()) {
        let mut builder = TextBuilder::new();
        for size in &sizes {
            builder.push_font_size(*size).append_str(&text);
        }
        for _ in &sizes {
            builder.pop_font_size();
        }

        let view = builder.compile();
        let rebuilt = DataView::from_encoded(
            view.text().to_vec(),
            view.data().to_vec(),
            &view.encoded_records(),
        );
        prop_assert_eq!(rebuilt.records(), view.records());
    }

    /// Popping back to depth `d` restores the payload pushed at depth `d`,
    /// and popping everything writes a revert.
    #[test]
    fn pops_restore_the_enclosing_value(sizes in sizes(), pops in 1usize..8) {
        let pops = pops.min(sizes.len());
        let mut builder = TextBuilder::new();
        let mut pushed = Vec::new();
        for size in &sizes {
            builder.push_font_size(*size);
            pushed.push(builder.records().len() - 1);
        }
        for _ in 0..pops {
            builder.pop_font_size();
        }

        let records = builder.records();
        let last = records[records.len() - 1];
        let depth = sizes.len() - pops;
        if depth == 0 {
            prop_assert!(last.is_revert);
        } else {
            let restored = records[pushed[depth - 1]];
            prop_assert!(!last.is_revert);
            prop_assert_eq!(last.data_range(), restored.data_range());
        }
    }

    /// Break-all and break-word never exceed the width when every unit fits,
    /// and the lines tile the text without gaps.
    #[test]
    fn wrapped_lines_fit_and_tile(
        text in words(),
        max_width in 10.0f32..120.0,
        break_word in any::<bool>(),
    ) {
        let font = font();
        let ctx = RenderContext::new(&font);
        let mut builder = TextBuilder::new();
        builder.append_str(&text);
        let data = Arc::new(builder.compile());
        let options = Options {
            word_break: if break_word { WordBreak::BreakWord } else { WordBreak::BreakAll },
            ..width(max_width)
        };
        let end = data.end_offset();
        let mut m = Measurement::new(data, options);
        m.measure(ctx);

        let lines = m.lines();
        prop_assert!(!lines.is_empty());
        prop_assert!(lines.len() <= text.len() + 1);
        for line in lines {
            prop_assert!(line.width() <= max_width, "{} > {}", line.width(), max_width);
        }
        for pair in lines.windows(2) {
            prop_assert_eq!(pair[1].first_offset, pair[0].offset);
        }
        prop_assert_eq!(lines[lines.len() - 1].offset, end);
    }

    /// Any mix of axes pushed and then popped in reverse restores, after
    /// each pop, exactly the style that was in effect before its push.
    #[test]
    fn pops_restore_the_style_on_every_axis(pushes in prop::collection::vec(push(), 1..10)) {
        let mut builder = TextBuilder::new();
        let mut before = Vec::new();
        for p in &pushes {
            before.push(folded(&builder));
            p.apply(&mut builder);
            builder.append_str("x");
        }
        for p in pushes.iter().rev() {
            p.pop(&mut builder);
            let expected = before.pop();
            prop_assert_eq!(Some(folded(&builder)), expected);
        }
        prop_assert_eq!(folded(&builder), (TextStyle::default(), None));
    }

    /// Rectangles of different links never overlap, however the runs wrap.
    #[test]
    fn link_rectangles_are_disjoint(
        runs in runs(),
        max_width in 10.0f32..120.0,
        word_break in policy(),
    ) {
        let font = font();
        let ctx = RenderContext::new(&font);
        let mut builder = TextBuilder::new();
        for (text, link) in &runs {
            match link {
                Some(id) => {
                    builder.push_link(&[b'a' + id]).append_str(text).pop_link();
                }
                None => {
                    builder.append_str(text);
                }
            }
        }
        let options = Options {
            word_break,
            ..width(max_width)
        };
        let mut m = Measurement::new(Arc::new(builder.compile()), options);
        m.measure(ctx);

        let links = m.links().boundaries();
        for (i, a) in links.iter().enumerate() {
            for b in &links[i + 1..] {
                if a.record_index != b.record_index {
                    prop_assert!(!a.rect.intersects(&b.rect), "{:?} overlaps {:?}", a, b);
                }
            }
        }
    }

    /// The draw pass reports the boundary the measure pass found.
    #[test]
    fn draw_matches_measure(
        text in "[a-z \\n\\x{AD}]{0,40}",
        max_width in 10.0f32..120.0,
        word_break in policy(),
        x in -50i16..50,
        y in -50i16..50,
    ) {
        let font = font();
        let ctx = RenderContext::new(&font);
        let mut builder = TextBuilder::new();
        builder.append_str(&text);
        let options = Options {
            word_break,
            ..width(max_width)
        };
        let mut m = Measurement::new(Arc::new(builder.compile()), options);
        m.measure(ctx);

        let origin = point(f32::from(x), f32::from(y));
        let mut list = DrawList::new();
        let drawn = m.draw(ctx, &mut list, origin).unwrap();
        prop_assert_eq!(drawn, m.boundary().translate(origin.to_vector()));
    }
}
