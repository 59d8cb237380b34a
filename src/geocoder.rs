//! 为 raw.csv 中尚未地理编码的城市补全 cities.csv
//!
//! 请求严格串行，每次请求后固定等待。失败只记录日志并继续下一个城市，同一次运行内不重试

use crate::city_index::CityCoordinates;
use crate::csv_loader::RawRecord;
use crate::geometry::LatLon;
use indexmap::IndexSet;
use serde::Deserialize;
use std::io::Write;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("geocoder returned an invalid coordinate {value:?}")]
    InvalidCoordinate { value: String },
}

/// 查询单个地点，`Ok(None)` 表示服务没有匹配结果
pub trait Geocoder {
    fn geocode(&self, city: &str, country: &str) -> Result<Option<LatLon>, GeocodeError>;
}

#[derive(Debug, Clone)]
pub struct NominatimConfig {
    /// 服务根地址，请求时追加 `/search`
    pub endpoint: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "bierdopjes_city_geocoder".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Nominatim 返回的坐标是字符串
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

#[derive(Debug)]
pub struct NominatimGeocoder {
    client: reqwest::blocking::Client,
    search_url: String,
}

impl NominatimGeocoder {
    pub fn new(config: &NominatimConfig) -> Result<Self, GeocodeError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            search_url: format!("{}/search", config.endpoint.trim_end_matches('/')),
        })
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&self, city: &str, country: &str) -> Result<Option<LatLon>, GeocodeError> {
        let query = format!("{city}, {country}");
        let places: Vec<Place> = self
            .client
            .get(&self.search_url)
            .query(&[("q", query.as_str()), ("format", "json"), ("limit", "1")])
            .send()?
            .error_for_status()?
            .json()?;

        places.first().map(Place::to_lat_lon).transpose()
    }
}

impl Place {
    fn to_lat_lon(&self) -> Result<LatLon, GeocodeError> {
        let parse = |value: &str| {
            value
                .trim()
                .parse::<f64>()
                .map_err(|_| GeocodeError::InvalidCoordinate {
                    value: value.to_string(),
                })
        };
        Ok(LatLon::new(parse(&self.lat)?, parse(&self.lon)?))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeocodeSummary {
    pub attempted: usize,
    pub geocoded: usize,
    pub not_found: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// 去空白后去重的 `(city, country)`，保持首次出现顺序
pub fn unique_places(records: &[RawRecord]) -> IndexSet<(String, String)> {
    records
        .iter()
        .map(|r| (r.city.trim().to_string(), r.country.trim().to_string()))
        .collect()
}

/// 对 `known` 中没有的城市逐个地理编码，成功结果写入 `sink`
///
/// 成功后更新 `known`，同名城市出现在多个国家时，首次成功后不再查询
pub fn geocode_missing<G, W>(
    records: &[RawRecord],
    known: &mut CityCoordinates,
    geocoder: &G,
    sink: &mut csv::Writer<W>,
    delay: Duration,
) -> anyhow::Result<GeocodeSummary>
where
    G: Geocoder + ?Sized,
    W: Write,
{
    let mut summary = GeocodeSummary::default();

    for (city, country) in unique_places(records) {
        if known.is_known(&city) {
            summary.skipped += 1;
            continue;
        }

        summary.attempted += 1;
        match geocoder.geocode(&city, &country) {
            Ok(Some(point)) => {
                let wkt = point.to_wkt();
                sink.write_record([city.as_str(), wkt.as_str()])?;
                sink.flush()?;
                info!("Geocoded {}, {} -> {}", city, country, wkt);
                known.insert(&city, Some(point));
                summary.geocoded += 1;
            }
            Ok(None) => {
                warn!("Failed to geocode: {}, {}", city, country);
                summary.not_found += 1;
            }
            Err(e) => {
                warn!("Error geocoding {}, {}: {}", city, country, e);
                summary.failed += 1;
            }
        }

        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }

    Ok(summary)
}
