use super::*;
use crate::assets::fetch::MemoryFetcher;

fn part_png() -> Vec<u8> {
    let mut img = image::RgbaImage::from_pixel(30, 30, image::Rgba([255, 255, 255, 255]));
    for y in 10..20 {
        for x in 10..20 {
            img.put_pixel(x, y, image::Rgba([0, 0, 0, 255]));
        }
    }
    decode::encode_png(&img).unwrap()
}

fn remover_with(fetcher: MemoryFetcher) -> (Arc<MemoryFetcher>, BackgroundRemover) {
    let fetcher = Arc::new(fetcher);
    let remover = BackgroundRemover::new(fetcher.clone());
    (fetcher, remover)
}

#[test]
fn success_produces_png_data_url_with_transparent_background() {
    let (_, remover) = remover_with(MemoryFetcher::new().with("part.png", part_png()));
    let out = remover.remove_background("part.png");

    assert!(out.is_processed);
    assert_eq!(out.original_url, "part.png");
    assert!(out.processed_url.starts_with(decode::PNG_DATA_URL_PREFIX));

    let bytes = decode::parse_data_url(&out.processed_url).unwrap();
    let img = decode::decode_rgba(&bytes).unwrap();
    assert_eq!(img.get_pixel(0, 0)[3], 0);
    assert_eq!(img.get_pixel(15, 15)[3], 255);
}

#[test]
fn second_call_is_served_from_cache() {
    let (fetcher, remover) = remover_with(MemoryFetcher::new().with("part.png", part_png()));
    let a = remover.remove_background("part.png");
    let b = remover.remove_background("part.png");

    assert_eq!(a, b);
    assert_eq!(remover.pixel_runs(), 1);
    assert_eq!(remover.attempts(), 1);
    assert_eq!(fetcher.fetch_count("part.png"), 1);
    assert_eq!(remover.cached("part.png"), Some(a));
    assert_eq!(remover.len(), 1);
}

#[test]
fn load_failure_falls_back_and_is_not_retried() {
    let (fetcher, remover) = remover_with(MemoryFetcher::new());
    let out = remover.remove_background("https://cdn.rebrickable.com/missing.jpg");

    assert!(!out.is_processed);
    assert_eq!(out.processed_url, out.original_url);
    assert_eq!(out, ProcessedImage::unprocessed("https://cdn.rebrickable.com/missing.jpg"));

    remover.remove_background("https://cdn.rebrickable.com/missing.jpg");
    assert_eq!(fetcher.fetch_count("https://cdn.rebrickable.com/missing.jpg"), 1);
    assert_eq!(remover.pixel_runs(), 0);
}

#[test]
fn decode_failure_falls_back() {
    let (_, remover) = remover_with(MemoryFetcher::new().with("bad.png", b"nope".to_vec()));
    let out = remover.remove_background("bad.png");
    assert!(!out.is_processed);
    assert_eq!(out.processed_url, "bad.png");
    assert_eq!(remover.pixel_runs(), 0);
}

#[test]
fn distinct_urls_are_processed_independently() {
    let (_, remover) = remover_with(
        MemoryFetcher::new()
            .with("a.png", part_png())
            .with("b.png", part_png()),
    );
    remover.remove_background("a.png");
    remover.remove_background("b.png");
    remover.remove_background("a.png");
    assert_eq!(remover.pixel_runs(), 2);
}

#[test]
fn concurrent_callers_share_one_pipeline_run() {
    let (fetcher, remover) = remover_with(MemoryFetcher::new().with("part.png", part_png()));
    let remover = Arc::new(remover);

    let results: Vec<ProcessedImage> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let remover = Arc::clone(&remover);
                s.spawn(move || remover.remove_background("part.png"))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(remover.pixel_runs(), 1);
    assert_eq!(fetcher.fetch_count("part.png"), 1);
}

#[test]
fn processed_image_serializes_camel_case() {
    let json = serde_json::to_value(ProcessedImage::unprocessed("u")).unwrap();
    assert_eq!(json["originalUrl"], "u");
    assert_eq!(json["processedUrl"], "u");
    assert_eq!(json["isProcessed"], false);
}
