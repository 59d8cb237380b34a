//! 城市表中 WKT 点的解析与格式化

use thiserror::Error;

/// 纬度在前的坐标，与前端使用的顺序一致
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// WKT 中 x 为经度，y 为纬度
    pub fn to_wkt(&self) -> String {
        format!("POINT ({} {})", self.lon, self.lat)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("geometry is not a POINT: {0:?}")]
    NotAPoint(String),

    #[error("POINT must have exactly two coordinates, got {count} in {wkt:?}")]
    Dimensions { count: usize, wkt: String },

    #[error("invalid coordinate {value:?} in {wkt:?}")]
    InvalidNumber { value: String, wkt: String },
}

/// 把 `POINT (lon lat)` 解析为纬度在前的坐标
pub fn parse_wkt_point(wkt: &str) -> Result<LatLon, GeometryError> {
    let trimmed = wkt.trim();
    let not_a_point = || GeometryError::NotAPoint(wkt.to_string());

    let keyword = trimmed.get(..5).ok_or_else(not_a_point)?;
    if !keyword.eq_ignore_ascii_case("POINT") {
        return Err(not_a_point());
    }
    let body = trimmed[5..]
        .trim_start()
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(not_a_point)?;

    let parts: Vec<&str> = body.split_whitespace().collect();
    if parts.len() != 2 {
        return Err(GeometryError::Dimensions {
            count: parts.len(),
            wkt: wkt.to_string(),
        });
    }

    let number = |value: &str| {
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| GeometryError::InvalidNumber {
                value: value.to_string(),
                wkt: wkt.to_string(),
            })
    };
    let lon = number(parts[0])?;
    let lat = number(parts[1])?;
    Ok(LatLon { lat, lon })
}
