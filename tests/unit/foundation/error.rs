use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        FigError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(FigError::fetch("x").to_string().contains("fetch error:"));
    assert!(FigError::decode("x").to_string().contains("decode error:"));
    assert!(FigError::render("x").to_string().contains("render error:"));
    assert!(
        FigError::persistence("x")
            .to_string()
            .contains("persistence error:")
    );
    assert!(
        FigError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = FigError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn serde_json_errors_map_to_serde_variant() {
    let err: FigError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(err, FigError::Serde(_)));
}
