use crate::aggregator::{aggregate, Aggregation};
use crate::catalog::CatalogTree;
use crate::city_index::CityCoordinates;
use crate::config::{Config, GeocodeArgs};
use crate::csv_loader::{load_city_rows, load_records, open_city_appender};
use crate::geocoder::{geocode_missing, GeocodeSummary, Geocoder, NominatimGeocoder};
use crate::image_index::ImageIndex;
use crate::unused::{render_report, unused_images};
use tracing::info;

/// 生成 beercaps.json
pub fn import(config: &Config) -> anyhow::Result<Aggregation> {
    // 1. 构建两个只读查找表
    let city_rows = load_city_rows(&config.cities_csv, config.delimiter)?;
    let coords = CityCoordinates::from_rows(&city_rows);
    info!(
        "Loaded {} cities ({} without usable coordinates)",
        coords.len(),
        coords.unresolved_count()
    );

    let images = ImageIndex::from_dir(&config.images_dir)?;
    info!(
        "Indexed {} cap images in {}",
        images.image_count(),
        config.images_dir.display()
    );

    // 2. 聚合
    let records = load_records(&config.raw_csv, config.delimiter)?;
    let result = aggregate(&records, &coords, &images);

    // 3. 写出
    result.tree.write_json(&config.catalog_json)?;
    info!(
        "Import complete: {} records, {} countries, {} caps, {} unresolved cities, {} missing images -> {}",
        result.records,
        result.tree.countries.len(),
        result.tree.total_caps(),
        result.unresolved_cities,
        result.unresolved_images,
        config.catalog_json.display()
    );
    Ok(result)
}

/// 为新城市查询坐标并追加到 cities.csv
pub fn geocode(config: &Config, args: &GeocodeArgs) -> anyhow::Result<GeocodeSummary> {
    let geocoder = NominatimGeocoder::new(&args.nominatim())?;
    geocode_with(config, &geocoder, args)
}

fn geocode_with<G: Geocoder + ?Sized>(
    config: &Config,
    geocoder: &G,
    args: &GeocodeArgs,
) -> anyhow::Result<GeocodeSummary> {
    let mut known = if config.cities_csv.exists() {
        CityCoordinates::from_rows(&load_city_rows(&config.cities_csv, config.delimiter)?)
    } else {
        CityCoordinates::default()
    };
    let records = load_records(&config.raw_csv, config.delimiter)?;

    let mut sink = open_city_appender(&config.cities_csv, config.delimiter)?;
    let summary = geocode_missing(&records, &mut known, geocoder, &mut sink, args.delay())?;
    sink.flush()?;

    info!(
        "Geocoding finished: {} attempted, {} geocoded, {} not found, {} failed, {} already known",
        summary.attempted, summary.geocoded, summary.not_found, summary.failed, summary.skipped
    );
    Ok(summary)
}

/// 打印未使用的图片
pub fn unused(config: &Config) -> anyhow::Result<Vec<String>> {
    let tree = CatalogTree::read_json(&config.catalog_json)?;
    let images = ImageIndex::from_dir(&config.images_dir)?;
    let unused = unused_images(images.files(), &tree);
    print!("{}", render_report(&unused));
    Ok(unused)
}
