use spectral_viz::canvas::PixelCanvas;
use spectral_viz::{DrawError, DrawList, DrawSurface, Point, Rgba};

fn rgb(px: Option<[u8; 4]>) -> [u8; 3] {
    let px = px.expect("pixel in bounds");
    [px[0], px[1], px[2]]
}

#[test]
fn new_canvas_is_opaque_black() {
    let c = PixelCanvas::new(8, 4);
    assert_eq!(c.pixels().len(), 8 * 4 * 4);
    assert!(c.pixels().chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
    assert_eq!(c.pixel(8, 0), None);
}

#[test]
fn clear_and_rect_fill_expected_pixels() {
    let mut c = PixelCanvas::new(10, 10);
    let mut list = DrawList::new();
    list.clear(Rgba::rgb(10, 20, 30));
    list.rect(2.0, 2.0, 3.0, 3.0, Rgba::rgb(200, 0, 0));
    c.execute_all(&list).unwrap();
    assert_eq!(rgb(c.pixel(0, 0)), [10, 20, 30]);
    assert_eq!(rgb(c.pixel(3, 3)), [200, 0, 0]);
    assert_eq!(rgb(c.pixel(5, 5)), [10, 20, 30]);
}

#[test]
fn alpha_blends_over_existing_pixels() {
    let mut c = PixelCanvas::new(4, 4);
    let mut list = DrawList::new();
    list.clear(Rgba::BLACK);
    list.rect(0.0, 0.0, 4.0, 4.0, Rgba::WHITE.with_alpha(0.5));
    c.execute_all(&list).unwrap();
    let [r, g, b] = rgb(c.pixel(1, 1));
    assert!((120..=135).contains(&r), "r={r}");
    assert_eq!((r, g), (g, b));
}

#[test]
fn shapes_are_clipped_to_the_surface() {
    let mut c = PixelCanvas::new(16, 16);
    let mut list = DrawList::new();
    list.rect(-100.0, -100.0, 1000.0, 1000.0, Rgba::WHITE);
    list.line(Point::new(-50.0, 8.0), Point::new(80.0, 8.0), 3.0, Rgba::WHITE);
    list.circle(Point::new(100.0, 100.0), 500.0, Rgba::WHITE);
    list.ring(Point::new(8.0, 8.0), 40.0, 2.0, Rgba::WHITE);
    list.text(Point::new(14.0, 14.0), "overflowing text", 12.0, Rgba::WHITE);
    c.execute_all(&list).unwrap();
    assert_eq!(rgb(c.pixel(15, 15)), [255, 255, 255]);
}

#[test]
fn circle_covers_its_center() {
    let mut c = PixelCanvas::new(20, 20);
    let mut list = DrawList::new();
    list.circle(Point::new(10.0, 10.0), 4.0, Rgba::rgb(0, 255, 0));
    c.execute_all(&list).unwrap();
    assert_eq!(rgb(c.pixel(10, 10)), [0, 255, 0]);
    assert_eq!(rgb(c.pixel(0, 0)), [0, 0, 0]);
}

#[test]
fn gradient_runs_top_to_bottom() {
    let mut c = PixelCanvas::new(4, 10);
    let mut list = DrawList::new();
    list.gradient(0.0, 0.0, 4.0, 10.0, Rgba::rgb(0, 0, 0), Rgba::rgb(0, 0, 250));
    c.execute_all(&list).unwrap();
    let top = rgb(c.pixel(0, 0))[2];
    let bottom = rgb(c.pixel(0, 9))[2];
    assert!(top < bottom, "top={top} bottom={bottom}");
}

#[test]
fn non_finite_coordinates_are_rejected() {
    let mut c = PixelCanvas::new(8, 8);
    let mut list = DrawList::new();
    list.line(Point::new(f32::NAN, 0.0), Point::new(4.0, 4.0), 1.0, Rgba::WHITE);
    assert_eq!(c.execute_all(&list), Err(DrawError::NonFinite("line")));

    let mut list = DrawList::new();
    list.circle(Point::new(4.0, 4.0), f32::INFINITY, Rgba::WHITE);
    assert!(matches!(c.execute_all(&list), Err(DrawError::NonFinite(_))));
}

#[test]
fn polyline_needs_two_points() {
    let mut list = DrawList::new();
    list.polyline(vec![Point::new(1.0, 1.0)], false, 1.0, Rgba::WHITE);
    assert!(list.is_empty());
    list.polyline(vec![Point::new(1.0, 1.0), Point::new(3.0, 3.0)], true, 1.0, Rgba::WHITE);
    assert_eq!(list.len(), 1);
}

#[test]
fn blit_scales_to_the_surface() {
    let mut c = PixelCanvas::new(8, 8);
    let mut src = vec![0u8; 2 * 2 * 4];
    for (i, px) in src.chunks_exact_mut(4).enumerate() {
        px[0] = (i as u8 + 1) * 50;
        px[3] = 255;
    }
    c.blit_rgba(&src, 2, 2).unwrap();
    assert_eq!(rgb(c.pixel(0, 0))[0], 50);
    assert_eq!(rgb(c.pixel(7, 0))[0], 100);
    assert_eq!(rgb(c.pixel(0, 7))[0], 150);
    assert_eq!(rgb(c.pixel(7, 7))[0], 200);
}

#[test]
fn blit_rejects_short_sources() {
    let mut c = PixelCanvas::new(8, 8);
    let err = c.blit_rgba(&[0u8; 12], 2, 2).unwrap_err();
    assert_eq!(err, DrawError::BufferSize { need: 16, got: 12 });
}

#[test]
fn resize_reallocates_only_on_change() {
    let mut c = PixelCanvas::new(4, 4);
    let mut list = DrawList::new();
    list.clear(Rgba::WHITE);
    c.execute_all(&list).unwrap();
    c.resize(4, 4);
    assert_eq!(rgb(c.pixel(0, 0)), [255, 255, 255]);
    c.resize(6, 3);
    assert_eq!((c.width(), c.height()), (6, 3));
    assert_eq!(rgb(c.pixel(0, 0)), [0, 0, 0]);
}
