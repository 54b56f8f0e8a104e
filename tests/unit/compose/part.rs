use super::*;
use crate::catalog::model::{Minifig, MinifigPart, PartColor, PartInfo};

fn part(processed: Option<ProcessedImage>) -> PlacedPart {
    let minifig = Minifig {
        set_num: "fig-000001".to_string(),
        name: "Pilot".to_string(),
        num_parts: 4,
        set_img_url: None,
        set_url: None,
        last_modified_dt: None,
    };
    let part = MinifigPart {
        id: None,
        part: PartInfo {
            part_num: "3626".to_string(),
            name: "Head".to_string(),
            part_img_url: Some("parts/head.png".to_string()),
        },
        color: PartColor {
            id: 14,
            name: "Yellow".to_string(),
            rgb: "F2CD37".to_string(),
            is_trans: false,
        },
        quantity: 1,
        is_spare: false,
    };
    PlacedPart {
        id: "3626-14-1".to_string(),
        source: SelectedPart {
            id: "3626-14-1".to_string(),
            part,
            source_minifig: minifig,
            position: None,
        },
        processed,
        layer: 0,
        position: Point::new(100.0, 50.0),
        scale: 2.0,
        rotation: 90.0,
    }
}

#[test]
fn clamp_scale_bounds() {
    assert_eq!(clamp_scale(5.0), MAX_SCALE);
    assert_eq!(clamp_scale(0.0), MIN_SCALE);
    assert_eq!(clamp_scale(-3.0), MIN_SCALE);
    assert_eq!(clamp_scale(1.5), 1.5);
    assert_eq!(clamp_scale(f64::NAN), 1.0);
}

#[test]
fn pending_part_draws_catalog_image() {
    let p = part(None);
    assert!(p.is_pending());
    assert_eq!(p.display_url(ViewMode::Processed), "parts/head.png");
    assert_eq!(p.display_url(ViewMode::Original), "parts/head.png");
}

#[test]
fn processed_part_respects_view_mode() {
    let p = part(Some(ProcessedImage {
        original_url: "parts/head.png".to_string(),
        processed_url: "data:image/png;base64,AAAA".to_string(),
        is_processed: true,
    }));
    assert_eq!(
        p.display_url(ViewMode::Processed),
        "data:image/png;base64,AAAA"
    );
    assert_eq!(p.display_url(ViewMode::Original), "parts/head.png");
}

#[test]
fn failed_removal_draws_original() {
    let p = part(Some(ProcessedImage::unprocessed("parts/head.png")));
    assert_eq!(p.display_url(ViewMode::Processed), "parts/head.png");
}

#[test]
fn transform_scales_rotates_then_translates() {
    let p = part(None);
    let mapped = p.transform() * Point::new(10.0, 0.0);
    // (10,0) scaled by 2 -> (20,0), rotated 90deg -> (0,20), translated -> (100,70)
    assert!((mapped.x - 100.0).abs() < 1e-9, "{mapped:?}");
    assert!((mapped.y - 70.0).abs() < 1e-9, "{mapped:?}");
}
