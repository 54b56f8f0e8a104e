use super::*;

fn solid(w: u32, h: u32, rgb: [u8; 3]) -> image::RgbaImage {
    image::RgbaImage::from_pixel(w, h, image::Rgba([rgb[0], rgb[1], rgb[2], 255]))
}

fn fill_rect(img: &mut image::RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32, rgb: [u8; 3]) {
    for y in y0..y1 {
        for x in x0..x1 {
            img.put_pixel(x, y, image::Rgba([rgb[0], rgb[1], rgb[2], 255]));
        }
    }
}

#[test]
fn white_background_black_part_is_split_cleanly() {
    let mut img = solid(30, 30, [255, 255, 255]);
    fill_rect(&mut img, 10, 10, 20, 20, [0, 0, 0]);

    strip_background(&mut img, &RemovalParams::default()).unwrap();

    for (x, y, px) in img.enumerate_pixels() {
        let inside = (10..20).contains(&x) && (10..20).contains(&y);
        if inside {
            assert_eq!(px[3], 255, "black pixel ({x},{y}) must be opaque");
        } else {
            assert_eq!(px[3], 0, "white pixel ({x},{y}) must be transparent");
        }
    }
}

#[test]
fn background_estimate_averages_all_four_corners() {
    let mut img = solid(40, 40, [0, 0, 0]);
    fill_rect(&mut img, 0, 0, 10, 10, [200, 0, 0]);
    fill_rect(&mut img, 30, 0, 40, 10, [0, 200, 0]);
    fill_rect(&mut img, 0, 30, 10, 40, [0, 0, 200]);
    fill_rect(&mut img, 30, 30, 40, 40, [200, 200, 200]);

    assert_eq!(estimate_background(&img, CORNER_SAMPLE), Rgb8::new(100, 100, 100));
}

#[test]
fn background_estimate_rounds_to_nearest() {
    let mut img = solid(20, 20, [10, 10, 10]);
    // One of 400 sampled pixels is 211 brighter on red: mean 10.5275 -> 11.
    img.put_pixel(0, 0, image::Rgba([221, 10, 10, 255]));
    assert_eq!(estimate_background(&img, CORNER_SAMPLE), Rgb8::new(11, 10, 10));
}

#[test]
fn background_estimate_clips_blocks_on_tiny_images() {
    let img = solid(3, 2, [7, 8, 9]);
    assert_eq!(estimate_background(&img, CORNER_SAMPLE), Rgb8::new(7, 8, 9));
}

#[test]
fn distance_alpha_thresholds_and_ramp() {
    let p = RemovalParams::default();
    assert_eq!(distance_alpha(0.0, &p), 0);
    assert_eq!(distance_alpha(29.999, &p), 0);
    assert_eq!(distance_alpha(30.0, &p), 0);
    assert_eq!(distance_alpha(31.0, &p), 12);
    assert_eq!(distance_alpha(40.0, &p), 127);
    assert_eq!(distance_alpha(49.99, &p), 254);
    assert_eq!(distance_alpha(50.0, &p), 255);
    assert_eq!(distance_alpha(441.0, &p), 255);
}

#[test]
fn sobel_marks_vertical_step_and_skips_border() {
    let mut img = solid(6, 5, [0, 0, 0]);
    fill_rect(&mut img, 3, 0, 6, 5, [255, 255, 255]);
    let edges = sobel_edges(&img, EDGE_THRESHOLD);
    let at = |x: usize, y: usize| edges[y * 6 + x];

    for y in 1..4 {
        assert!(at(2, y) && at(3, y), "step columns fire at row {y}");
        assert!(!at(1, y) && !at(4, y), "flat columns stay quiet at row {y}");
    }
    for x in 0..6 {
        assert!(!at(x, 0) && !at(x, 4), "border row never fires");
    }
}

#[test]
fn sobel_reads_red_channel_only() {
    let mut img = solid(5, 5, [0, 0, 0]);
    fill_rect(&mut img, 2, 0, 5, 5, [0, 255, 255]);
    assert!(sobel_edges(&img, EDGE_THRESHOLD).iter().all(|e| !e));
}

#[test]
fn opening_removes_single_pixel_speckle() {
    let (w, h) = (5u32, 5u32);
    let mut mask = vec![0u8; 25];
    mask[12] = 255;
    let opened = dilate3x3(&erode3x3(&mask, w, h), w, h);
    assert!(opened.iter().all(|&a| a == 0));
}

#[test]
fn opening_preserves_solid_block() {
    let (w, h) = (7u32, 7u32);
    let mut mask = vec![0u8; 49];
    for y in 2..5 {
        for x in 2..5 {
            mask[y * 7 + x] = 255;
        }
    }
    let opened = dilate3x3(&erode3x3(&mask, w, h), w, h);
    assert_eq!(opened, mask);
}

#[test]
fn edges_override_distance_mask() {
    // AABB stripes of two close greys: every interior column sits on a step, while both greys
    // are within the transparent distance of the averaged background.
    let mut img = solid(9, 9, [200, 200, 200]);
    for x in [2, 3, 6, 7] {
        fill_rect(&mut img, x, 0, x + 1, 9, [180, 180, 180]);
    }
    strip_background(&mut img, &RemovalParams::default()).unwrap();

    assert_eq!(img.get_pixel(4, 4)[3], 255);
    assert_eq!(img.get_pixel(0, 4)[3], 0, "border is never an edge");
}

#[test]
fn near_white_wins_over_edges() {
    let mut img = solid(9, 9, [250, 250, 250]);
    fill_rect(&mut img, 4, 0, 9, 9, [0, 0, 0]);
    strip_background(&mut img, &RemovalParams::default()).unwrap();

    assert_eq!(img.get_pixel(3, 4)[3], 0);
    assert_eq!(img.get_pixel(6, 4)[3], 255);
}

#[test]
fn empty_image_is_rejected() {
    let mut img = image::RgbaImage::new(0, 0);
    assert!(strip_background(&mut img, &RemovalParams::default()).is_err());
}
