//! End-to-end tests: deck and theme files through to rasterized slides

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fontdb::Database;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, GenericImageView, ImageEncoder, Rgb, RgbImage};

use carousel_studio::layout::ElementRole;
use carousel_studio::{
    CarouselComposer, ComposerConfig, Deck, DeckError, RasterConfig, SlideId, Theme,
};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("carousel-studio-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_png(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_pixel(width, height, Rgb([200, 30, 30]));
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    fs::write(path, buf).unwrap();
}

fn composer_for(deck: Deck, theme: Theme) -> CarouselComposer {
    let config = ComposerConfig::new()
        .with_theme(theme)
        .with_raster(RasterConfig::default().with_system_fonts(false));
    CarouselComposer::with_store(config, Arc::new(Database::new()), deck.into_store().unwrap())
}

#[tokio::test]
async fn test_deck_with_images_exports_every_slide() {
    let dir = scratch_dir("images");
    write_png(&dir.join("avatar.png"), 64, 64);
    write_png(&dir.join("wide.png"), 2000, 500);
    let deck_path = dir.join("deck.toml");
    fs::write(
        &deck_path,
        r#"
[header]
name = "Ada Lovelace"
handle = "@ada"
profile_image = "avatar.png"

[[slides]]
text = "Notes on the analytical engine"
image = "wide.png"
cta = "Read more"

[[slides]]
text = "Second slide"
alignment = "center"
"#,
    )
    .unwrap();

    let deck = Deck::from_file(&deck_path).unwrap();
    let composer = composer_for(deck, Theme::default());

    let layout = composer.preview(0).unwrap();
    let image = layout.find(ElementRole::SlideImage).unwrap();
    assert_eq!(image.bounds.width, 1000.0);
    assert_eq!(image.bounds.height, 250.0);
    assert!(layout.find(ElementRole::Avatar).is_some());

    let scene = composer.scene(0).unwrap();
    assert_eq!(scene.matches("data:image/png;base64,").count(), 2);

    let batch = composer.export_all().await;
    assert_eq!(batch.ids(), vec![SlideId(1), SlideId(2)]);
    let links = batch.downloads();
    assert_eq!(links.len(), 2);
    assert_eq!(links[1].label, "Download Slide 2");

    let decoded = image::load_from_memory(links[0].artifact.bytes()).unwrap();
    assert_eq!(decoded.dimensions(), (1080, 1080));

    fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_theme_colors_reach_the_pixels() {
    let theme = Theme::from_str(
        r##"
[colors]
background = "#0000ff"
matte = "#00ff00"
"##,
    )
    .unwrap();
    let deck = Deck::from_str("[[slides]]\n", Path::new(".")).unwrap();
    let composer = composer_for(deck, theme);

    let batch = composer.export_all().await;
    let artifact = batch.artifacts().next().unwrap();
    let decoded = image::load_from_memory(artifact.bytes()).unwrap().to_rgb8();

    let corner = decoded.get_pixel(0, 0);
    assert!(corner[1] > 200 && corner[0] < 50 && corner[2] < 50);

    let center = decoded.get_pixel(540, 540);
    assert!(center[2] > 200 && center[0] < 50 && center[1] < 50);
}

#[test]
fn test_deck_rejects_bad_alignment() {
    let err = Deck::from_str("[header]\nalignment = \"middle\"\n", Path::new(".")).unwrap_err();
    assert!(matches!(err, DeckError::ParseError(_)));
}
