mod common;

use std::sync::Arc;

use common::{build, font, measurement};
use kasane::geometry::point;
use kasane::{
    LinkEvent, LinkState, Measurement, MouseButtons, Options, Pointer, RenderContext, Spannable,
    TextSpannable,
};

type Seen = Vec<(LinkEvent, Vec<u8>)>;

fn step(m: &mut Measurement, x: f32, buttons: MouseButtons) -> Seen {
    let mut seen = Seen::new();
    m.handle_pointer(
        &Pointer::new(point(x, 5.0), buttons),
        &mut |event: LinkEvent, target: &[u8]| seen.push((event, target.to_vec())),
    );
    seen
}

fn nested() -> Measurement {
    let inner = build(|b| {
        b.push_link(b"inner").append_str("ab").pop_link();
    });
    let child: Arc<dyn Spannable> = Arc::new(TextSpannable::new(
        Arc::new(inner.compile()),
        Options::default(),
    ));

    // "go " [child "ab"] " " [outer "here"]
    measurement(
        |b| {
            b.append_str("go ");
            b.append_spannable(child);
            b.append_str(" ")
                .push_link(b"outer")
                .append_str("here")
                .pop_link();
        },
        Options::default(),
    )
}

#[test]
fn test_click_on_nested_link() {
    let font = font();
    let ctx = RenderContext::new(&font);
    let mut m = nested();
    m.measure(ctx);
    assert_eq!(m.links().boundaries().len(), 1);
    assert_eq!(m.links().boundaries()[0].rect.min.x, 61.0);

    assert_eq!(
        step(&mut m, 35.0, MouseButtons::empty()),
        vec![(LinkEvent::Enter(0), b"inner".to_vec())]
    );
    assert_eq!(
        step(&mut m, 35.0, MouseButtons::LEFT),
        vec![(LinkEvent::Down(0), b"inner".to_vec())]
    );
    assert_eq!(
        step(&mut m, 36.0, MouseButtons::empty()),
        vec![
            (LinkEvent::Up(0), b"inner".to_vec()),
            (LinkEvent::Click(0), b"inner".to_vec()),
        ]
    );

    // leaving the child and entering the outer link in one move
    assert_eq!(
        step(&mut m, 70.0, MouseButtons::empty()),
        vec![
            (LinkEvent::Leave(0), b"inner".to_vec()),
            (LinkEvent::Enter(1), b"outer".to_vec()),
        ]
    );
    assert_eq!(m.links().state(), LinkState::Hovered);
}

#[test]
fn test_drag_off_cancels_click() {
    let font = font();
    let ctx = RenderContext::new(&font);
    let mut m = nested();
    m.measure(ctx);

    step(&mut m, 70.0, MouseButtons::empty());
    assert_eq!(
        step(&mut m, 70.0, MouseButtons::LEFT),
        vec![(LinkEvent::Down(1), b"outer".to_vec())]
    );
    assert!(step(&mut m, 5.0, MouseButtons::LEFT).is_empty());
    assert_eq!(m.links().state(), LinkState::ActiveNotHovered);

    assert_eq!(
        step(&mut m, 5.0, MouseButtons::empty()),
        vec![
            (LinkEvent::Up(1), b"outer".to_vec()),
            (LinkEvent::Leave(1), b"outer".to_vec()),
        ]
    );
    assert_eq!(m.links().state(), LinkState::Clear);
}

#[test]
fn test_press_outside_then_slide_in_does_not_enter() {
    let font = font();
    let ctx = RenderContext::new(&font);
    let mut m = nested();
    m.measure(ctx);

    assert!(step(&mut m, 5.0, MouseButtons::LEFT).is_empty());
    assert!(step(&mut m, 70.0, MouseButtons::LEFT).is_empty());
    assert_eq!(
        step(&mut m, 70.0, MouseButtons::empty()),
        vec![(LinkEvent::Enter(1), b"outer".to_vec())]
    );
}
