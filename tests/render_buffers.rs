use tilesession::core::prelude::*;

fn tile_params(x: i32, y: i32, w: i32, h: i32) -> BufferParams {
    let mut params = BufferParams::new(64, 64);
    params.full_x = x;
    params.full_y = y;
    params.width = w;
    params.height = h;
    params.final_width = w;
    params.final_height = h;
    params
}

#[test]
fn reset_is_idempotent() {
    let mut params = tile_params(16, 8, 16, 8);
    params.add_pass(PassType::Depth);

    let mut once = RenderBuffers::new(0);
    once.reset(&params);

    let mut twice = RenderBuffers::new(0);
    twice.reset(&params);
    for v in twice.buffer.iter_mut() {
        *v = 1.0;
    }
    twice.reset(&params);

    assert_eq!(once.params, twice.params);
    assert_eq!(once.buffer, twice.buffer);
    assert_eq!(once.rng_state, twice.rng_state);
    assert!(twice.buffer.iter().all(|v| *v == 0.0));
}

#[test]
fn reset_reallocates_on_new_shape() {
    let mut buffers = RenderBuffers::new(1);
    buffers.reset(&tile_params(0, 0, 8, 8));
    assert_eq!(buffers.buffer.len(), 8 * 8 * 4);

    let mut params = tile_params(0, 0, 4, 2);
    params.add_pass(PassType::Normal);
    buffers.reset(&params);
    assert_eq!(buffers.buffer.len(), 4 * 2 * 8);
    assert_eq!(buffers.rng_state.len(), 8);
    assert_eq!(buffers.device, 1);
}

#[test]
fn rng_state_follows_absolute_pixels() {
    // the same pixel gets the same seed whatever buffer it lives in
    let mut frame = RenderBuffers::new(0);
    frame.reset(&tile_params(0, 0, 64, 64));
    let mut tile = RenderBuffers::new(0);
    tile.reset(&tile_params(16, 32, 16, 16));

    let (offset, stride) = tile.params.offset_stride();
    let (frame_offset, frame_stride) = frame.params.offset_stride();
    for (x, y) in [(16, 32), (31, 47), (20, 40)] {
        let a = tile.rng_state[(offset + x + y * stride) as usize];
        let b = frame.rng_state[(frame_offset + x + y * frame_stride) as usize];
        assert_eq!(a, b);
        assert_eq!(a, hash_int_2d(x, y));
    }
}

#[test]
fn pass_rect_in_image_coordinates() {
    let mut params = tile_params(8, 8, 4, 4);
    params.add_pass(PassType::Depth);
    let mut buffers = RenderBuffers::new(0);
    buffers.reset(&params);
    let pass_stride = params.passes_size();

    // pixel (9, 10) of the image
    let index = (1 + 2 * 4) * pass_stride;
    buffers.buffer[index..(index + 5)].copy_from_slice(&[4.0, 8.0, 12.0, 4.0, 12.0]);

    let rect = Bounds2i::from_xywh(9, 10, 1, 1);
    let rgb = buffers
        .get_pass_rect(PassType::Combined, 1.0, 4, 3, &rect)
        .unwrap();
    assert_eq!(rgb, vec![1.0, 2.0, 3.0]);

    let depth = buffers
        .get_pass_rect(PassType::Depth, 1.0, 4, 1, &Bounds2i::from_xywh(8, 10, 2, 1))
        .unwrap();
    assert_eq!(depth, vec![DEPTH_NO_HIT, 3.0]);

    assert!(buffers
        .get_pass_rect(PassType::Emission, 1.0, 4, 3, &rect)
        .is_none());
}

#[test]
fn pass_rect_outside_buffer_is_none() {
    let params = tile_params(8, 8, 4, 4);
    let mut buffers = RenderBuffers::new(0);
    buffers.reset(&params);

    // left of the tile origin
    let before = Bounds2i::from_xywh(7, 8, 2, 1);
    assert!(buffers
        .get_pass_rect(PassType::Combined, 1.0, 1, 4, &before)
        .is_none());
    // runs past the bottom right corner
    let past = Bounds2i::from_xywh(10, 10, 4, 4);
    assert!(buffers
        .get_pass_rect(PassType::Combined, 1.0, 1, 4, &past)
        .is_none());
    let inside = Bounds2i::from_xywh(8, 8, 4, 4);
    let rgba = buffers
        .get_pass_rect(PassType::Combined, 1.0, 1, 4, &inside)
        .unwrap();
    assert_eq!(rgba.len(), 4 * 4 * 4);
}

#[test]
fn display_buffer_writes_png() {
    let params = BufferParams::new(4, 2);
    let mut display = DisplayBuffer::new(true);
    display.reset(&params);
    {
        let mut rgba = display.rgba.write().unwrap();
        for px in rgba.rgba_float.chunks_exact_mut(4) {
            px.copy_from_slice(&[1.0, 0.0, 0.0, 1.0]);
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("display.png");

    // nothing tonemapped yet
    display.write(&path).unwrap();
    assert!(!path.exists());

    display.draw_set(4, 2);
    display.write(&path).unwrap();
    let img = image::open(&path).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (4, 2));
    assert_eq!(img.get_pixel(3, 1).0, [255, 0, 0, 255]);
}
