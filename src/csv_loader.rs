use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::path::Path;

/// 原始瓶盖记录，对应 raw.csv 的一行
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RawRecord {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Brewery")]
    pub brewery: String,
    #[serde(rename = "Crowncap")]
    pub cap_label: String,
}

impl RawRecord {
    pub fn new(country: &str, city: &str, brewery: &str, cap_label: &str) -> Self {
        Self {
            country: country.to_string(),
            city: city.to_string(),
            brewery: brewery.to_string(),
            cap_label: cap_label.to_string(),
        }
    }

    /// 去掉所有字段两端的空白
    pub fn trimmed(&self) -> Self {
        Self::new(
            self.country.trim(),
            self.city.trim(),
            self.brewery.trim(),
            self.cap_label.trim(),
        )
    }
}

/// cities.csv 的一行：城市名与 WKT 点
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct CityRow {
    pub city: String,
    // 旧表把 WKT 放在名为 "lat" 的列里
    #[serde(alias = "lat")]
    pub geometry: String,
}

pub const CITY_HEADERS: [&str; 2] = ["city", "geometry"];

fn reader_builder(delimiter: u8) -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    // 行尾多出的分隔符产生的额外字段直接忽略，缺列仍由 serde 报错
    builder
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .flexible(true);
    builder
}

pub fn load_records<P: AsRef<Path>>(path: P, delimiter: u8) -> anyhow::Result<Vec<RawRecord>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut rdr = reader_builder(delimiter).from_reader(file);
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: RawRecord = result.with_context(|| format!("reading {}", path.display()))?;
        records.push(record);
    }
    Ok(records)
}

pub fn load_city_rows<P: AsRef<Path>>(path: P, delimiter: u8) -> anyhow::Result<Vec<CityRow>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut rdr = reader_builder(delimiter).from_reader(file);
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: CityRow = result.with_context(|| format!("reading {}", path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}

/// 以追加模式打开 cities.csv；文件新建或为空时先写表头
pub fn open_city_appender<P: AsRef<Path>>(
    path: P,
    delimiter: u8,
) -> anyhow::Result<csv::Writer<File>> {
    let path = path.as_ref();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening {} for append", path.display()))?;
    let is_empty = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_writer(file);
    if is_empty {
        writer.write_record(CITY_HEADERS)?;
        writer.flush()?;
    }
    Ok(writer)
}
