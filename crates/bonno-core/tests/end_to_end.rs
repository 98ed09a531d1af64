#![allow(clippy::unwrap_used)]

mod support;

use std::rc::Rc;

use base64::Engine as _;
use bonno_core::{
    Ack, Action, BindingStore, CacheKey, Controller, Engine, EngineConfig, Mode, RasterRenderer, ResampleFilter,
    Size, WeakBindingStore,
};
use image::ImageEncoder;
use support::{FakePage, engine, engine_with, loaded};

/// The page from the walkthrough: one photo, one hero banner and one
/// embedded video.
fn walkthrough_page() -> (FakePage, support::Node, support::Node, support::Node) {
    let page = FakePage::new();
    let img = page.image("https://example.com/photo.jpg", 300, 300);
    let hero = page.styled(r#"url("https://example.com/hero.jpg")"#, 500.0, 300.0);
    let video = page.frame(400, 300);
    (page, img, hero, video)
}

#[test]
fn walkthrough_round_trip() {
    let (page, img, hero, video) = walkthrough_page();
    let mut engine = engine();

    let mut toggled = engine.toggle(&page);
    assert_eq!(toggled.mode, Mode::Placeholder);
    assert_eq!(toggled.pending.len(), 3);
    assert_eq!(img.src().as_deref(), Some("fill:300x300"));
    assert_eq!(hero.background().as_deref(), Some(r#"url("fill:500x300")"#));
    assert_eq!(page.overlays.borrow().len(), 1);
    assert!(engine.cache().has(&CacheKey::provisional(Size::new(300, 300))));
    assert!(engine.cache().has(&CacheKey::provisional(Size::new(500, 300))));
    assert!(engine.cache().has(&CacheKey::provisional(Size::new(400, 300))));

    for request in toggled.pending.drain(..) {
        engine.complete_final(&page, request, loaded(b"photo"));
    }
    assert_eq!(img.src().as_deref(), Some("final:photo:300x300"));
    assert_eq!(
        hero.background().as_deref(),
        Some(r#"url("final:photo:500x300")"#)
    );
    let overlay = Rc::clone(&page.overlays.borrow()[0]);
    assert_eq!(*overlay.background.borrow(), "final:photo:400x300");

    let keys = [
        CacheKey::final_for(Size::new(300, 300)),
        CacheKey::final_for(Size::new(500, 300)),
        CacheKey::frame_final(Size::new(400, 300)),
    ];
    assert_eq!(
        keys.iter().map(ToString::to_string).collect::<Vec<_>>(),
        ["actual_300x300", "actual_500x300", "iframe_actual_400x300"]
    );
    assert!(keys.iter().all(|k| engine.cache().has(k)));

    let restored = engine.toggle(&page);
    assert_eq!(restored.mode, Mode::Original);
    assert_eq!(img.src().as_deref(), Some("https://example.com/photo.jpg"));
    assert_eq!(
        hero.background().as_deref(),
        Some(r#"url("https://example.com/hero.jpg")"#)
    );
    assert!(!overlay.visible.get());
    assert!(engine.bindings().get(&video).is_some());
}

#[test]
fn small_cache_evicts_least_recently_used() {
    let (page, _img, _hero, _video) = walkthrough_page();
    let mut engine = engine_with(EngineConfig {
        cache_capacity: 2,
        ..EngineConfig::default()
    });

    engine.toggle(&page);
    assert_eq!(engine.cache().len(), 2);
    assert!(!engine.cache().has(&CacheKey::provisional(Size::new(300, 300))));
    assert!(engine.cache().has(&CacheKey::provisional(Size::new(400, 300))));
}

#[test]
fn controller_handles_inbound_actions() {
    let (page, img, _hero, _video) = walkthrough_page();
    let mut controller = Controller::new(engine());

    let enabled = controller.handle(&page, Action::ToggleFeature { is_enabled: true });
    assert!(controller.enabled());
    assert_eq!(enabled.ack, Ack::done(Mode::Original));
    assert!(enabled.pending.is_empty());

    let shown = controller.handle(&page, Action::ToggleImages);
    assert_eq!(shown.ack, Ack::done(Mode::Placeholder));
    assert_eq!(shown.pending.len(), 3);
    assert_eq!(img.src().as_deref(), Some("fill:300x300"));

    let disabled = controller.handle(&page, Action::ToggleFeature { is_enabled: false });
    assert!(!controller.enabled());
    assert_eq!(disabled.ack, Ack::done(Mode::Original));
    assert_eq!(img.src().as_deref(), Some("https://example.com/photo.jpg"));
}

#[test]
fn disabling_in_original_mode_changes_nothing() {
    let (page, img, _hero, _video) = walkthrough_page();
    let mut controller = Controller::new(engine());

    let handled = controller.set_enabled(&page, false);
    assert_eq!(handled.ack.mode, Some(Mode::Original));
    assert_eq!(img.src().as_deref(), Some("https://example.com/photo.jpg"));
    assert!(controller.engine().bindings().is_empty());
}

#[test]
fn action_json_drives_controller() {
    let (page, _img, _hero, _video) = walkthrough_page();
    let mut controller = Controller::new(engine());

    let action: Action = serde_json::from_str(r#"{"action":"toggleImages"}"#).unwrap();
    let handled = controller.handle(&page, action);
    assert_eq!(
        serde_json::to_value(handled.ack).unwrap(),
        serde_json::json!({"success": true, "mode": "placeholder", "isBlackMode": true})
    );
}

/// Solid-color PNG asset.
fn solid_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let [r, g, b] = rgb;
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([r, g, b, 255]));
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
    buf
}

fn decode_data_url(value: &str) -> image::RgbaImage {
    let payload = value.strip_prefix("data:image/png;base64,").unwrap();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .unwrap();
    image::load_from_memory(&bytes).unwrap().to_rgba8()
}

#[test]
fn raster_pipeline_produces_sized_images() {
    let page = FakePage::new();
    let img = page.image("https://example.com/photo.jpg", 60, 40);
    let mut engine = Engine::with_seed(
        EngineConfig::default(),
        WeakBindingStore::new(),
        RasterRenderer::new([0xa9, 0xa9, 0xa9], ResampleFilter::Nearest),
        3,
    )
    .unwrap();

    let mut toggled = engine.toggle(&page);
    let provisional = decode_data_url(&img.src().unwrap());
    assert_eq!(provisional.dimensions(), (60, 40));
    assert!(provisional.pixels().all(|p| p.0 == [0xa9, 0xa9, 0xa9, 255]));

    let asset = solid_png(90, 90, [10, 200, 30]);
    let request = toggled.pending.remove(0);
    engine.complete_final(&page, request, loaded(&asset));

    let upgraded = decode_data_url(&img.src().unwrap());
    assert_eq!(upgraded.dimensions(), (60, 40));
    assert!(upgraded.pixels().all(|p| p.0 == [10, 200, 30, 255]));
}
