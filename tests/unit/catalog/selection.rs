use super::*;
use crate::catalog::model::{PartColor, PartInfo};

fn minifig(set_num: &str) -> Minifig {
    Minifig {
        set_num: set_num.to_string(),
        name: format!("Minifig {set_num}"),
        num_parts: 4,
        set_img_url: None,
        set_url: None,
        last_modified_dt: None,
    }
}

fn part(part_num: &str, color: i64) -> MinifigPart {
    MinifigPart {
        id: None,
        part: PartInfo {
            part_num: part_num.to_string(),
            name: format!("Part {part_num}"),
            part_img_url: Some(format!("https://cdn.rebrickable.com/media/{part_num}.jpg")),
        },
        color: PartColor {
            id: color,
            name: "Black".to_string(),
            rgb: "05131D".to_string(),
            is_trans: false,
        },
        quantity: 1,
        is_spare: false,
    }
}

#[test]
fn same_part_can_be_selected_twice_with_distinct_ids() {
    let mut sel = Selection::new();
    let a = sel.add_part(part("3626c", 0), minifig("fig-1"));
    let b = sel.add_part(part("3626c", 0), minifig("fig-1"));
    assert_ne!(a, b);
    assert!(a.starts_with("3626c-0-"));
    assert_eq!(sel.parts().len(), 2);
    assert_eq!(sel.source_minifigs().len(), 1, "source registered once");
}

#[test]
fn remove_and_position_updates() {
    let mut sel = Selection::new();
    let a = sel.add_part(part("973", 1), minifig("fig-1"));
    sel.update_part_position(&a, Point::new(10.0, 20.0));
    assert_eq!(sel.parts()[0].position, Some(Point::new(10.0, 20.0)));

    sel.update_part_position("missing", Point::new(1.0, 1.0));
    assert!(!sel.remove_part("missing"));
    assert!(sel.remove_part(&a));
    assert!(sel.parts().is_empty());
}

#[test]
fn removing_a_source_minifig_drops_its_parts() {
    let mut sel = Selection::new();
    sel.add_part(part("973", 1), minifig("fig-1"));
    let keep = sel.add_part(part("970", 1), minifig("fig-2"));
    assert!(!sel.add_source_minifig(minifig("fig-2")));

    sel.remove_source_minifig("fig-1");
    assert_eq!(sel.source_minifigs().len(), 1);
    assert_eq!(sel.parts().len(), 1);
    assert_eq!(sel.parts()[0].id, keep);
}

#[test]
fn clear_source_minifigs_resets_everything() {
    let mut sel = Selection::new();
    sel.add_part(part("973", 1), minifig("fig-1"));
    sel.set_current_minifig(Some(minifig("fig-1")));
    sel.clear_source_minifigs();
    assert!(sel.parts().is_empty());
    assert!(sel.source_minifigs().is_empty());
    assert!(sel.current_minifig().is_none());
}

#[test]
fn ids_stay_unique_after_loading_a_collection() {
    let mut donor = Selection::new();
    let saved_id = donor.add_part(part("973", 1), minifig("fig-1"));

    let collection = Collection {
        id: "c1".to_string(),
        title: "t".to_string(),
        source_minifigs: donor.source_minifigs().to_vec(),
        parts: donor.parts().to_vec(),
        created_at_ms: 0,
        updated_at_ms: 0,
    };
    let mut sel = Selection::new();
    sel.load_collection(&collection);
    assert_eq!(sel.current_minifig().map(|m| m.set_num.as_str()), Some("fig-1"));

    let fresh = sel.add_part(part("973", 1), minifig("fig-1"));
    assert_ne!(fresh, saved_id);
}

#[test]
fn selected_part_json_uses_camel_case_and_optional_position() {
    let mut sel = Selection::new();
    let id = sel.add_part(part("973", 1), minifig("fig-1"));
    let json = serde_json::to_value(&sel.parts()[0]).unwrap();
    assert!(json.get("sourceMinifig").is_some());
    assert!(json.get("position").is_none());

    sel.update_part_position(&id, Point::new(5.0, 6.0));
    let json = serde_json::to_value(&sel.parts()[0]).unwrap();
    assert_eq!(json["position"]["x"], 5.0);

    let back: SelectedPart = serde_json::from_value(json).unwrap();
    assert_eq!(back.position, Some(Point::new(5.0, 6.0)));
}
