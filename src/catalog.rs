//! 前端地图读取的 国家 → 城市 → 酒厂 → 瓶盖 嵌套文档

use anyhow::Context;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogTree {
    pub countries: IndexMap<String, Country>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Country {
    /// 该国家的全部原始行数，包括后续因缺坐标被丢弃的行
    pub count: u64,
    pub cities: IndexMap<String, City>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub lat: f64,
    pub lon: f64,
    pub breweries: Vec<Brewery>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brewery {
    pub name: String,
    pub caps: Vec<String>,
}

impl City {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            breweries: Vec::new(),
        }
    }

    /// 按名称精确查找酒厂，不存在时先追加
    pub fn brewery_mut(&mut self, name: &str) -> &mut Brewery {
        let pos = match self.breweries.iter().position(|b| b.name == name) {
            Some(pos) => pos,
            None => {
                self.breweries.push(Brewery::new(name));
                self.breweries.len() - 1
            }
        };
        &mut self.breweries[pos]
    }
}

impl Brewery {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            caps: Vec::new(),
        }
    }

    /// 文件名不存在时追加，返回是否新增
    pub fn add_cap(&mut self, filename: &str) -> bool {
        if self.caps.iter().any(|c| c == filename) {
            return false;
        }
        self.caps.push(filename.to_string());
        true
    }
}

impl CatalogTree {
    pub fn country_mut(&mut self, name: &str) -> &mut Country {
        self.countries.entry(name.to_string()).or_default()
    }

    /// 树中引用到的全部瓶盖文件名
    pub fn cap_filenames(&self) -> IndexSet<&str> {
        self.countries
            .values()
            .flat_map(|country| country.cities.values())
            .flat_map(|city| city.breweries.iter())
            .flat_map(|brewery| brewery.caps.iter().map(String::as_str))
            .collect()
    }

    pub fn total_caps(&self) -> usize {
        self.countries
            .values()
            .flat_map(|country| country.cities.values())
            .flat_map(|city| city.breweries.iter())
            .map(|brewery| brewery.caps.len())
            .sum()
    }

    /// 两空格缩进的 JSON，非 ASCII 字符原样输出
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    pub fn read_json<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let tree = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(tree)
    }
}
