//! Named regions and the bounding boxes that scenarios are evaluated over.
//!
//! Region identifiers supplied by callers are normalised (lowercased, with
//! everything except letters and digits removed) before lookup, so
//! `"Tamil Nadu"`, `"tamil-nadu"` and `"tamilnadu"` all resolve to the same entry.

use crate::errors::{AltEarthError, AltEarthResult};
use crate::FloatValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Length of one degree of latitude
/// unit: km
pub const KM_PER_DEGREE: FloatValue = 111.0;

/// Axis-aligned geographic extent in decimal degrees.
///
/// Serialised as `[west, south, east, north]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[FloatValue; 4]", into = "[FloatValue; 4]")]
pub struct BoundingBox {
    pub west: FloatValue,
    pub south: FloatValue,
    pub east: FloatValue,
    pub north: FloatValue,
}

impl From<[FloatValue; 4]> for BoundingBox {
    fn from([west, south, east, north]: [FloatValue; 4]) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }
}

impl From<BoundingBox> for [FloatValue; 4] {
    fn from(bbox: BoundingBox) -> Self {
        [bbox.west, bbox.south, bbox.east, bbox.north]
    }
}

impl BoundingBox {
    /// Centre of the box as (longitude, latitude)
    pub fn centre(&self) -> (FloatValue, FloatValue) {
        (
            (self.west + self.east) / 2.0,
            (self.south + self.north) / 2.0,
        )
    }

    /// Approximate surface area of the box.
    ///
    /// Flat-earth approximation: the east-west extent is scaled by the cosine
    /// of the mid latitude.
    /// unit: km^2
    pub fn area_km2(&self) -> FloatValue {
        let (_, mid_lat) = self.centre();
        let width_km =
            (self.east - self.west).abs() * KM_PER_DEGREE * mid_lat.to_radians().cos().abs();
        let height_km = (self.north - self.south).abs() * KM_PER_DEGREE;
        width_km * height_km
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Normalised identifier
    pub id: String,
    /// Display name
    pub name: String,
    pub bbox: BoundingBox,
    pub description: String,
}

impl Region {
    pub fn new(name: &str, bbox: BoundingBox, description: &str) -> Self {
        Self {
            id: normalize_region_id(name),
            name: name.to_string(),
            bbox,
            description: description.to_string(),
        }
    }

    pub fn area_km2(&self) -> FloatValue {
        self.bbox.area_km2()
    }
}

/// Lowercase and strip everything but letters and digits
pub fn normalize_region_id(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Lookup table from normalised region identifiers to regions
#[derive(Debug, Clone)]
pub struct RegionCatalog {
    regions: Vec<Region>,
    index: HashMap<String, usize>,
}

impl Default for RegionCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RegionCatalog {
    /// The catalog of regions bundled with the crate
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        for (name, bbox, description) in BUILTIN_REGIONS {
            catalog.insert(Region::new(name, BoundingBox::from(*bbox), description));
        }
        catalog
    }

    pub fn empty() -> Self {
        Self {
            regions: vec![],
            index: HashMap::new(),
        }
    }

    /// Build a catalog from a list of regions.
    ///
    /// Fails if two regions share a normalised identifier.
    pub fn from_regions<I>(regions: I) -> AltEarthResult<Self>
    where
        I: IntoIterator<Item = Region>,
    {
        let mut catalog = Self::empty();
        for region in regions {
            let id = region.id.clone();
            if !catalog.insert(region) {
                return Err(AltEarthError::Config(format!(
                    "duplicate region identifier '{}'",
                    id
                )));
            }
        }
        Ok(catalog)
    }

    /// Add a region, returning false if its identifier is already taken
    fn insert(&mut self, region: Region) -> bool {
        if self.index.contains_key(&region.id) {
            return false;
        }
        self.index.insert(region.id.clone(), self.regions.len());
        self.regions.push(region);
        true
    }

    /// Resolve a caller-supplied identifier or display name
    pub fn resolve(&self, raw: &str) -> AltEarthResult<&Region> {
        self.get(&normalize_region_id(raw))
            .ok_or_else(|| AltEarthError::UnknownRegion(raw.to_string()))
    }

    /// Look up an already normalised identifier
    pub fn get(&self, id: &str) -> Option<&Region> {
        self.index.get(id).map(|i| &self.regions[*i])
    }

    /// Regions in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// (display name, [west, south, east, north], description)
const BUILTIN_REGIONS: &[(&str, [FloatValue; 4], &str)] = &[
    ("Andhra Pradesh", [76.8, 12.6, 84.8, 19.9], "Andhra Pradesh state, India"),
    ("Arunachal Pradesh", [91.6, 26.6, 97.4, 29.5], "Arunachal Pradesh state, India"),
    ("Assam", [89.7, 24.1, 96.0, 28.0], "Assam state, India"),
    ("Bihar", [83.3, 24.3, 88.3, 27.5], "Bihar state, India"),
    ("Chhattisgarh", [80.3, 17.8, 84.4, 24.1], "Chhattisgarh state, India"),
    ("Goa", [73.7, 14.9, 74.4, 15.8], "Goa state, India"),
    ("Gujarat", [68.2, 20.1, 74.5, 24.7], "Gujarat state, India"),
    ("Haryana", [74.5, 27.7, 77.6, 30.9], "Haryana state, India"),
    ("Himachal Pradesh", [75.6, 30.4, 79.0, 33.2], "Himachal Pradesh state, India"),
    ("Jharkhand", [83.3, 21.9, 87.6, 25.3], "Jharkhand state, India"),
    ("Karnataka", [74.0, 11.5, 78.5, 18.5], "Karnataka state, India"),
    ("Kerala", [74.8, 8.2, 77.4, 12.8], "Kerala state, India"),
    ("Madhya Pradesh", [74.0, 21.1, 82.8, 26.9], "Madhya Pradesh state, India"),
    ("Maharashtra", [72.6, 15.6, 80.9, 22.0], "Maharashtra state, India"),
    ("Manipur", [93.0, 23.8, 94.8, 25.7], "Manipur state, India"),
    ("Meghalaya", [89.8, 25.0, 92.8, 26.1], "Meghalaya state, India"),
    ("Mizoram", [92.2, 21.9, 93.5, 24.5], "Mizoram state, India"),
    ("Nagaland", [93.3, 25.2, 95.2, 27.0], "Nagaland state, India"),
    ("Odisha", [81.4, 17.8, 87.5, 22.6], "Odisha state, India"),
    ("Punjab", [73.9, 29.5, 76.9, 32.6], "Punjab state, India"),
    ("Rajasthan", [69.5, 23.0, 78.3, 30.2], "Rajasthan state, India"),
    ("Sikkim", [87.9, 27.1, 88.9, 28.1], "Sikkim state, India"),
    ("Tamil Nadu", [77.0, 8.0, 80.5, 13.5], "Tamil Nadu state, India"),
    ("Telangana", [77.2, 15.8, 81.3, 19.9], "Telangana state, India"),
    ("Tripura", [91.0, 22.9, 92.5, 24.5], "Tripura state, India"),
    ("Uttar Pradesh", [77.1, 23.9, 84.6, 30.4], "Uttar Pradesh state, India"),
    ("Uttarakhand", [77.6, 28.7, 81.0, 31.5], "Uttarakhand state, India"),
    ("West Bengal", [85.8, 21.5, 89.9, 27.2], "West Bengal state, India"),
    ("India", [68.0, 6.0, 97.0, 36.0], "India (full country)"),
    ("California", [-124.4, 32.5, -114.1, 42.0], "California state, USA"),
    ("Texas", [-106.6, 25.8, -93.5, 36.5], "Texas state, USA"),
    ("Florida", [-87.6, 24.5, -80.0, 31.0], "Florida state, USA"),
    ("New York", [-79.8, 40.5, -71.9, 45.0], "New York state, USA"),
    ("Pennsylvania", [-80.5, 39.7, -74.7, 42.3], "Pennsylvania state, USA"),
    ("Illinois", [-91.5, 36.9, -87.5, 42.5], "Illinois state, USA"),
    ("Ohio", [-84.8, 38.4, -80.5, 42.3], "Ohio state, USA"),
    ("Georgia", [-85.6, 30.4, -80.8, 35.0], "Georgia state, USA"),
    ("North Carolina", [-84.3, 33.8, -75.5, 36.6], "North Carolina state, USA"),
    ("Michigan", [-90.4, 41.7, -82.4, 48.2], "Michigan state, USA"),
    ("United States", [-125.0, 24.5, -66.9, 49.4], "United States (contiguous)"),
    ("Guangdong", [109.7, 20.2, 117.2, 25.5], "Guangdong province, China"),
    ("Shandong", [114.8, 34.4, 122.7, 38.4], "Shandong province, China"),
    ("Henan", [110.4, 31.4, 116.6, 36.4], "Henan province, China"),
    ("Sichuan", [97.3, 26.0, 108.5, 34.3], "Sichuan province, China"),
    ("Jiangsu", [116.4, 30.7, 121.9, 35.1], "Jiangsu province, China"),
    ("Hebei", [113.5, 36.0, 119.8, 42.6], "Hebei province, China"),
    ("Hunan", [108.8, 24.6, 114.3, 30.1], "Hunan province, China"),
    ("Anhui", [114.9, 29.4, 119.7, 34.7], "Anhui province, China"),
    ("Hubei", [108.4, 29.0, 116.1, 33.3], "Hubei province, China"),
    ("Zhejiang", [118.0, 27.0, 123.0, 31.2], "Zhejiang province, China"),
    ("China", [73.5, 18.2, 135.0, 53.6], "China (full country)"),
    ("São Paulo", [-53.1, -25.3, -44.2, -19.8], "São Paulo state, Brazil"),
    ("Minas Gerais", [-51.0, -22.9, -39.9, -14.2], "Minas Gerais state, Brazil"),
    ("Bahia", [-46.6, -18.3, -37.3, -8.5], "Bahia state, Brazil"),
    ("Rio de Janeiro", [-44.9, -23.4, -40.9, -20.8], "Rio de Janeiro state, Brazil"),
    ("Paraná", [-54.6, -26.7, -48.0, -22.5], "Paraná state, Brazil"),
    ("Rio Grande do Sul", [-57.6, -33.8, -49.7, -27.1], "Rio Grande do Sul state, Brazil"),
    ("Pará", [-58.9, -9.8, -46.0, -2.5], "Pará state, Brazil"),
    ("Amazonas", [-73.8, -9.8, -56.1, -2.1], "Amazonas state, Brazil"),
    ("Brazil", [-73.9, -33.8, -34.8, 5.3], "Brazil (full country)"),
    ("New South Wales", [141.0, -37.5, 153.6, -28.2], "New South Wales state, Australia"),
    ("Queensland", [138.0, -29.2, 153.6, -10.7], "Queensland state, Australia"),
    ("Victoria", [141.0, -39.2, 149.9, -34.0], "Victoria state, Australia"),
    ("Western Australia", [113.0, -35.1, 129.0, -13.7], "Western Australia state, Australia"),
    ("South Australia", [129.0, -38.1, 141.0, -26.0], "South Australia state, Australia"),
    ("Australia", [113.0, -43.6, 153.6, -10.7], "Australia (full country)"),
    ("United Kingdom", [-8.6, 49.9, 1.8, 60.8], "United Kingdom (full country)"),
    ("France", [-5.1, 41.3, 9.6, 51.1], "France (full country)"),
    ("Germany", [5.9, 47.3, 15.0, 55.1], "Germany (full country)"),
    ("Italy", [6.6, 36.6, 18.5, 47.1], "Italy (full country)"),
    ("Spain", [-9.3, 35.9, 4.3, 43.8], "Spain (full country)"),
    ("Nigeria", [2.7, 4.3, 14.7, 13.9], "Nigeria (full country)"),
    ("South Africa", [16.5, -34.8, 32.9, -22.1], "South Africa (full country)"),
    ("Kenya", [33.9, -4.7, 41.9, 5.5], "Kenya (full country)"),
    ("Egypt", [24.7, 22.0, 36.9, 31.7], "Egypt (full country)"),
    ("Argentina", [-73.6, -55.1, -53.6, -21.8], "Argentina (full country)"),
    ("Colombia", [-79.0, -4.2, -66.9, 12.5], "Colombia (full country)"),
    ("Indonesia", [95.0, -11.0, 141.0, 6.0], "Indonesia (full country)"),
    ("Thailand", [97.3, 5.6, 105.6, 20.5], "Thailand (full country)"),
    ("Vietnam", [102.1, 8.6, 109.5, 23.4], "Vietnam (full country)"),
    ("Philippines", [116.9, 4.6, 126.6, 21.1], "Philippines (full country)"),
    ("Japan", [129.4, 30.9, 145.8, 45.5], "Japan (full country)"),
    ("Ontario", [-95.2, 41.7, -74.3, 56.9], "Ontario province, Canada"),
    ("Quebec", [-79.8, 45.0, -57.1, 62.6], "Quebec province, Canada"),
    ("British Columbia", [-139.1, 48.3, -114.0, 60.0], "British Columbia province, Canada"),
    ("Canada", [-141.0, 41.7, -52.6, 83.1], "Canada (full country)"),
    ("Mexico", [-118.4, 14.5, -86.7, 32.7], "Mexico (full country)"),
    ("test", [78.46, 20.09, 79.46, 21.09], "Test region (central India, ~100km x 100km)"),
];
