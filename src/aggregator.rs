use crate::catalog::{CatalogTree, City};
use crate::city_index::CoordinateLookup;
use crate::csv_loader::RawRecord;
use crate::image_index::ImageLookup;
use tracing::warn;

/// 聚合结果：目录树加上诊断计数（计数不写入 JSON）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    pub tree: CatalogTree,
    pub records: usize,
    pub unresolved_cities: usize,
    pub unresolved_images: usize,
}

/// 把原始记录逐条折叠进目录树
///
/// 两个查找表在构建后只读；目录树归聚合器所有，`finish` 时交出
pub struct Aggregator<'a, C: ?Sized, I: ?Sized> {
    coords: &'a C,
    images: &'a I,
    acc: Aggregation,
}

impl<'a, C, I> Aggregator<'a, C, I>
where
    C: CoordinateLookup + ?Sized,
    I: ImageLookup + ?Sized,
{
    pub fn new(coords: &'a C, images: &'a I) -> Self {
        Self {
            coords,
            images,
            acc: Aggregation::default(),
        }
    }

    pub fn push(&mut self, record: &RawRecord) {
        // 1. 去除空白
        let record = record.trimmed();
        self.acc.records += 1;

        // 2. 国家计数先于坐标检查递增，被跳过的记录同样计入
        let country = self.acc.tree.country_mut(&record.country);
        country.count += 1;

        // 3. 城市首次出现时查询坐标
        if !country.cities.contains_key(&record.city) {
            let Some(point) = self.coords.coordinates(&record.city) else {
                warn!(
                    "Coordinates for city '{}' not found. Skipping.",
                    record.city
                );
                self.acc.unresolved_cities += 1;
                return;
            };
            country
                .cities
                .insert(record.city.clone(), City::new(point.lat, point.lon));
        }
        let Some(city) = country.cities.get_mut(&record.city) else {
            return;
        };

        // 4. 酒厂按名称精确匹配
        let brewery = city.brewery_mut(&record.brewery);

        // 5. 解析瓶盖图片，已存在的文件名不重复添加
        match self.images.resolve(&record.cap_label) {
            Some(filename) => {
                brewery.add_cap(filename);
            }
            None => {
                warn!(
                    "Image for '{}' not found (.jpeg/.jpg).",
                    record.cap_label
                );
                self.acc.unresolved_images += 1;
            }
        }
    }

    pub fn finish(self) -> Aggregation {
        self.acc
    }
}

/// 聚合全部记录
pub fn aggregate<C, I>(records: &[RawRecord], coords: &C, images: &I) -> Aggregation
where
    C: CoordinateLookup + ?Sized,
    I: ImageLookup + ?Sized,
{
    let mut aggregator = Aggregator::new(coords, images);
    for record in records {
        aggregator.push(record);
    }
    aggregator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city_index::CityCoordinates;
    use crate::geometry::LatLon;
    use crate::image_index::ImageIndex;

    fn rec(country: &str, city: &str, brewery: &str, cap: &str) -> RawRecord {
        RawRecord::new(country, city, brewery, cap)
    }

    fn gent_coords() -> CityCoordinates {
        let mut coords = CityCoordinates::default();
        coords.insert("Gent", Some(LatLon::new(51.05, 3.72)));
        coords
    }

    #[test]
    fn groups_and_deduplicates_caps() {
        let records = vec![
            rec("BE", "Gent", "BreweryA", "cap1"),
            rec("BE", "Gent", "BreweryA", "cap1"),
            rec("BE", "Gent", "BreweryB", "cap2"),
        ];
        let images = ImageIndex::from_filenames(["cap1.jpg", "cap2.jpeg"]);

        let result = aggregate(&records, &gent_coords(), &images);

        let json = serde_json::to_value(&result.tree).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "BE": {
                    "count": 3,
                    "cities": {
                        "Gent": {
                            "lat": 51.05,
                            "lon": 3.72,
                            "breweries": [
                                {"name": "BreweryA", "caps": ["cap1.jpg"]},
                                {"name": "BreweryB", "caps": ["cap2.jpeg"]}
                            ]
                        }
                    }
                }
            })
        );
        assert_eq!(result.records, 3);
        assert_eq!(result.unresolved_cities, 0);
        assert_eq!(result.unresolved_images, 0);
    }

    #[test]
    fn unknown_city_is_counted_but_not_added() {
        let records = vec![
            rec("BE", "Gent", "BreweryA", "cap1"),
            rec("BE", "Nowhere", "BreweryX", "cap1"),
        ];
        let images = ImageIndex::from_filenames(["cap1.jpg"]);

        let result = aggregate(&records, &gent_coords(), &images);

        let be = result.tree.countries.get("BE").unwrap();
        assert_eq!(be.count, 2);
        assert!(be.cities.contains_key("Gent"));
        assert!(!be.cities.contains_key("Nowhere"));
        assert_eq!(result.unresolved_cities, 1);
    }

    #[test]
    fn country_with_only_unresolved_cities_still_appears() {
        let coords = CityCoordinates::default();
        let images = ImageIndex::default();
        let result = aggregate(&[rec("NL", "Ghost", "B", "c")], &coords, &images);

        let nl = result.tree.countries.get("NL").unwrap();
        assert_eq!(nl.count, 1);
        assert!(nl.cities.is_empty());
    }

    #[test]
    fn known_but_unparseable_city_is_skipped() {
        let mut coords = gent_coords();
        coords.insert("Brugge", None);
        let images = ImageIndex::from_filenames(["zot.jpg"]);

        let result = aggregate(&[rec("BE", "Brugge", "Halve Maan", "zot")], &coords, &images);

        assert_eq!(result.tree.countries.get("BE").unwrap().count, 1);
        assert!(result.tree.countries.get("BE").unwrap().cities.is_empty());
        assert_eq!(result.unresolved_cities, 1);
    }

    #[test]
    fn missing_image_leaves_brewery_with_empty_caps() {
        let images = ImageIndex::from_filenames(["other.jpg"]);
        let result = aggregate(&[rec("BE", "Gent", "Gruut", "gruut")], &gent_coords(), &images);

        let gent = &result.tree.countries.get("BE").unwrap().cities["Gent"];
        assert_eq!(gent.breweries.len(), 1);
        assert_eq!(gent.breweries[0].name, "Gruut");
        assert!(gent.breweries[0].caps.is_empty());
        assert_eq!(result.unresolved_images, 1);
    }

    #[test]
    fn records_are_trimmed_before_grouping() {
        let records = vec![
            rec(" BE", "Gent ", " Gruut ", " Duvel "),
            rec("BE", "Gent", "Gruut", "duvel"),
        ];
        let images = ImageIndex::from_filenames(["duvel.JPG"]);

        let result = aggregate(&records, &gent_coords(), &images);

        assert_eq!(result.tree.countries.len(), 1);
        let gent = &result.tree.countries.get("BE").unwrap().cities["Gent"];
        assert_eq!(gent.breweries.len(), 1);
        assert_eq!(gent.breweries[0].caps, vec!["duvel.JPG"]);
    }

    #[test]
    fn preserves_first_seen_order() {
        let mut coords = gent_coords();
        coords.insert("Brugge", Some(LatLon::new(51.2, 3.22)));
        coords.insert("Wien", Some(LatLon::new(48.2, 16.37)));
        let images = ImageIndex::from_filenames(["z.jpg", "a.jpg", "m.jpg"]);
        let records = vec![
            rec("BE", "Gent", "Zeta", "z"),
            rec("AT", "Wien", "Ottakringer", "m"),
            rec("BE", "Brugge", "Alpha", "a"),
            rec("BE", "Gent", "Alpha", "m"),
            rec("BE", "Gent", "Zeta", "a"),
        ];

        let tree = aggregate(&records, &coords, &images).tree;

        let countries: Vec<&String> = tree.countries.keys().collect();
        assert_eq!(countries, ["BE", "AT"]);
        let be = tree.countries.get("BE").unwrap();
        let cities: Vec<&String> = be.cities.keys().collect();
        assert_eq!(cities, ["Gent", "Brugge"]);
        let gent = &be.cities["Gent"];
        let names: Vec<&str> = gent.breweries.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["Zeta", "Alpha"]);
        assert_eq!(gent.breweries[0].caps, vec!["z.jpg", "a.jpg"]);
    }

    #[test]
    fn same_city_name_in_two_countries_is_separate() {
        let images = ImageIndex::from_filenames(["x.jpg"]);
        let records = vec![
            rec("BE", "Gent", "A", "x"),
            rec("NL", "Gent", "A", "x"),
        ];
        let tree = aggregate(&records, &gent_coords(), &images).tree;
        assert!(tree.countries.get("BE").unwrap().cities.contains_key("Gent"));
        assert!(tree.countries.get("NL").unwrap().cities.contains_key("Gent"));
    }

    #[test]
    fn output_is_deterministic() {
        let records = vec![
            rec("BE", "Gent", "A", "cap1"),
            rec("FR", "Lille", "B", "cap2"),
            rec("BE", "Gent", "C", "missing"),
        ];
        let images = ImageIndex::from_filenames(["cap1.jpg", "cap2.jpeg"]);
        let coords = gent_coords();

        let first = aggregate(&records, &coords, &images).tree.to_json().unwrap();
        let second = aggregate(&records, &coords, &images).tree.to_json().unwrap();
        assert_eq!(first, second);
    }

    struct FixedImages;

    impl ImageLookup for FixedImages {
        fn resolve(&self, cap_label: &str) -> Option<&str> {
            (cap_label == "only").then_some("ONLY.jpg")
        }
    }

    #[test]
    fn accepts_any_lookup_implementation() {
        let lookup: &dyn ImageLookup = &FixedImages;
        let records = vec![rec("BE", "Gent", "A", "only"), rec("BE", "Gent", "A", "other")];
        let result = aggregate(&records, &gent_coords(), lookup);
        assert_eq!(
            result.tree.countries.get("BE").unwrap().cities["Gent"].breweries[0].caps,
            vec!["ONLY.jpg"]
        );
        assert_eq!(result.unresolved_images, 1);
    }
}
