use crate::geocoder::NominatimConfig;
use anyhow::bail;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// 瓶盖目录数据准备工具
#[derive(Debug, Parser)]
#[command(name = "capcatalog", version)]
pub struct Cli {
    /// 数据目录，其余路径默认都在这里
    #[arg(long, env = "CAPCATALOG_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// raw.csv 路径
    #[arg(long, env = "CAPCATALOG_RAW_CSV")]
    pub raw_csv: Option<PathBuf>,

    /// cities.csv 路径
    #[arg(long, env = "CAPCATALOG_CITIES_CSV")]
    pub cities_csv: Option<PathBuf>,

    /// beercaps.json 路径
    #[arg(long, env = "CAPCATALOG_CATALOG_JSON")]
    pub catalog_json: Option<PathBuf>,

    /// 瓶盖图片目录
    #[arg(long, env = "CAPCATALOG_IMAGES_DIR")]
    pub images_dir: Option<PathBuf>,

    /// CSV 分隔符
    #[arg(long, default_value = ";")]
    pub delimiter: char,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// 聚合 raw.csv、城市坐标和图片，生成 beercaps.json
    Import,
    /// 为尚未编码的城市查询坐标并追加到 cities.csv
    Geocode(GeocodeArgs),
    /// 列出未被 beercaps.json 引用的图片
    Unused,
}

#[derive(Debug, Clone, Args)]
pub struct GeocodeArgs {
    /// Nominatim 服务地址
    #[arg(
        long,
        env = "CAPCATALOG_GEOCODER_URL",
        default_value = "https://nominatim.openstreetmap.org"
    )]
    pub endpoint: String,

    /// 请求使用的 User-Agent
    #[arg(long, default_value = "bierdopjes_city_geocoder")]
    pub user_agent: String,

    /// 两次请求之间的间隔（毫秒）
    #[arg(long, default_value = "1000")]
    pub delay_ms: u64,

    /// 单次请求超时（秒）
    #[arg(long, default_value = "10")]
    pub timeout_secs: u64,
}

impl GeocodeArgs {
    pub fn nominatim(&self) -> NominatimConfig {
        NominatimConfig {
            endpoint: self.endpoint.clone(),
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// 解析后的路径与格式配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub raw_csv: PathBuf,
    pub cities_csv: PathBuf,
    pub catalog_json: PathBuf,
    pub images_dir: PathBuf,
    pub delimiter: u8,
}

impl Config {
    /// 以数据目录为根的默认布局
    pub fn in_dir(data_dir: PathBuf) -> Self {
        Self {
            raw_csv: data_dir.join("raw.csv"),
            cities_csv: data_dir.join("cities.csv"),
            catalog_json: data_dir.join("beercaps.json"),
            images_dir: data_dir.join("images"),
            delimiter: b';',
        }
    }
}

impl Cli {
    pub fn config(&self) -> anyhow::Result<Config> {
        if !self.delimiter.is_ascii() {
            bail!("delimiter must be a single ASCII character, got {:?}", self.delimiter);
        }
        let defaults = Config::in_dir(self.data_dir.clone());
        Ok(Config {
            raw_csv: self.raw_csv.clone().unwrap_or(defaults.raw_csv),
            cities_csv: self.cities_csv.clone().unwrap_or(defaults.cities_csv),
            catalog_json: self.catalog_json.clone().unwrap_or(defaults.catalog_json),
            images_dir: self.images_dir.clone().unwrap_or(defaults.images_dir),
            delimiter: self.delimiter as u8,
        })
    }
}
