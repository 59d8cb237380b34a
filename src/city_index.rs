use crate::csv_loader::CityRow;
use crate::geometry::{parse_wkt_point, LatLon};
use std::collections::HashMap;
use tracing::warn;

/// 按城市名查询坐标的能力
pub trait CoordinateLookup {
    /// 返回已解析的坐标；未知城市和解析失败的城市都返回 None
    fn coordinates(&self, city: &str) -> Option<LatLon>;
}

/// 城市坐标表，城市名区分大小写并已去除空白
///
/// 值为 `None` 表示城市已登记但几何无法解析，与从未地理编码的城市区分开
#[derive(Debug, Clone, Default)]
pub struct CityCoordinates {
    entries: HashMap<String, Option<LatLon>>,
}

impl CityCoordinates {
    /// 从 cities.csv 的行构建坐标表，同名城市以后出现的行为准
    pub fn from_rows(rows: &[CityRow]) -> Self {
        let mut entries = HashMap::with_capacity(rows.len());
        for row in rows {
            let city = row.city.trim();
            let point = match parse_wkt_point(&row.geometry) {
                Ok(point) => Some(point),
                Err(e) => {
                    warn!("Error parsing WKT for city '{}': {}", city, e);
                    None
                }
            };
            entries.insert(city.to_string(), point);
        }
        Self { entries }
    }

    pub fn insert(&mut self, city: &str, point: Option<LatLon>) {
        self.entries.insert(city.trim().to_string(), point);
    }

    /// 城市是否出现在表中（无论坐标是否可用）
    pub fn is_known(&self, city: &str) -> bool {
        self.entries.contains_key(city)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn unresolved_count(&self) -> usize {
        self.entries.values().filter(|p| p.is_none()).count()
    }
}

impl CoordinateLookup for CityCoordinates {
    fn coordinates(&self, city: &str) -> Option<LatLon> {
        self.entries.get(city).copied().flatten()
    }
}
