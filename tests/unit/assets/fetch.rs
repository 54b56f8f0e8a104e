use super::*;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "figcomp_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

#[test]
fn proxy_url_percent_encodes_like_encode_uri_component() {
    let url = "https://cdn.rebrickable.com/media/parts/elements/6.jpg?x=1&y=a b";
    assert_eq!(
        proxy_url("/api/proxy-image", url),
        "/api/proxy-image?url=https%3A%2F%2Fcdn.rebrickable.com%2Fmedia%2Fparts%2Felements%2F6.jpg%3Fx%3D1%26y%3Da%20b"
    );
    assert_eq!(
        proxy_url("http://localhost:3000/api/proxy-image?v=2", "a"),
        "http://localhost:3000/api/proxy-image?v=2&url=a"
    );
}

#[test]
fn host_matching_ignores_path_port_and_case() {
    assert!(is_host("https://cdn.rebrickable.com/x.png", "cdn.rebrickable.com"));
    assert!(is_host("http://CDN.Rebrickable.com:8080/x", "cdn.rebrickable.com"));
    assert!(!is_host("https://evil.com/cdn.rebrickable.com/x", "cdn.rebrickable.com"));
    assert!(!is_host("cdn.rebrickable.com/x.png", "cdn.rebrickable.com"));
}

#[test]
fn routed_url_only_rewrites_catalog_host_when_proxy_configured() {
    let cfg = FetchConfig {
        proxy_base: Some("http://proxy.local/api/proxy-image".to_string()),
        ..FetchConfig::default()
    };
    let fetcher = RoutedFetcher::from_config(&cfg);
    assert!(
        fetcher
            .routed_url("https://cdn.rebrickable.com/a.png")
            .starts_with("http://proxy.local/api/proxy-image?url=https%3A")
    );
    assert_eq!(
        fetcher.routed_url("https://example.com/a.png"),
        "https://example.com/a.png"
    );

    let direct = RoutedFetcher::from_config(&FetchConfig::default());
    assert_eq!(
        direct.routed_url("https://cdn.rebrickable.com/a.png"),
        "https://cdn.rebrickable.com/a.png"
    );
}

#[test]
fn routed_fetcher_sends_proxied_url_to_network() {
    let cfg = FetchConfig {
        proxy_base: Some("proxy".to_string()),
        ..FetchConfig::default()
    };
    let net = MemoryFetcher::new().with(
        "proxy?url=https%3A%2F%2Fcdn.rebrickable.com%2Fa.png",
        vec![1, 2, 3],
    );
    let fetcher = RoutedFetcher::from_config(&cfg).with_network(Box::new(net));
    assert_eq!(
        fetcher.fetch("https://cdn.rebrickable.com/a.png").unwrap(),
        vec![1, 2, 3]
    );
}

#[test]
fn routed_fetcher_decodes_data_urls_and_reads_files() {
    let dir = temp_dir("routed_fs");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("a.bin"), [9u8, 8, 7]).unwrap();

    let cfg = FetchConfig {
        assets_root: dir.clone(),
        ..FetchConfig::default()
    };
    let fetcher = RoutedFetcher::from_config(&cfg);
    assert_eq!(fetcher.fetch("a.bin").unwrap(), vec![9, 8, 7]);
    let abs = format!("file://{}", dir.join("a.bin").display());
    assert_eq!(fetcher.fetch(&abs).unwrap(), vec![9, 8, 7]);
    assert!(fetcher.fetch("missing.bin").is_err());

    let url = decode::png_data_url(&[1, 2, 3]);
    assert_eq!(fetcher.fetch(&url).unwrap(), vec![1, 2, 3]);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn fs_fetcher_refuses_http() {
    let err = FsFetcher::new(".").fetch("https://example.com/a.png").unwrap_err();
    assert!(matches!(err, FigError::Fetch(_)));
}

#[test]
fn memory_fetcher_counts_attempts() {
    let f = MemoryFetcher::new().with("a", vec![1]);
    f.fetch("a").unwrap();
    f.fetch("a").unwrap();
    assert!(f.fetch("b").is_err());
    assert_eq!(f.fetch_count("a"), 2);
    assert_eq!(f.fetch_count("b"), 1);
    assert_eq!(f.total_fetches(), 3);
}

#[test]
fn load_rgba_rejects_empty_url() {
    let f = MemoryFetcher::new();
    assert!(matches!(
        load_rgba(&f, "").unwrap_err(),
        FigError::Validation(_)
    ));
}

#[test]
fn load_rgba_decodes_data_urls_inline() {
    let img = image::RgbaImage::from_pixel(2, 3, image::Rgba([1, 2, 3, 4]));
    let url = decode::png_data_url(&decode::encode_png(&img).unwrap());
    let f = MemoryFetcher::new();
    let back = load_rgba(&f, &url).unwrap();
    assert_eq!(back, img);
    assert_eq!(f.total_fetches(), 0);
}
