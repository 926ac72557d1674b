//! County, scenario, city-comparison and demographic rollups over the reference table.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::{CityComparison, ScenarioConfig};
use crate::model::ReferenceRecord;
use crate::normalize::normalize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountyRollup {
    pub county: String,
    pub population: u64,
    pub area_sq_miles: f64,
    pub municipalities: usize,
    pub population_density: f64,
}

/// Group target-region municipalities by county. Sorted by county name.
pub fn county_rollup<'a>(
    records: impl IntoIterator<Item = &'a ReferenceRecord>,
) -> Vec<CountyRollup> {
    let mut groups: BTreeMap<String, (String, u64, f64, usize)> = BTreeMap::new();

    for r in records.into_iter().filter(|r| r.in_target_region) {
        let entry = groups
            .entry(normalize(&r.county_name))
            .or_insert_with(|| (r.county_name.clone(), 0, 0.0, 0));
        entry.1 += r.population;
        entry.2 += r.area_sq_miles;
        entry.3 += 1;
    }

    groups
        .into_values()
        .map(|(county, population, area_sq_miles, municipalities)| CountyRollup {
            county,
            population,
            area_sq_miles,
            municipalities,
            population_density: population as f64 / area_sq_miles,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioRollup {
    pub id: String,
    pub name: String,
    pub description: String,
    pub counties: Vec<String>,
    pub population: u64,
    pub area_sq_miles: f64,
    pub municipalities: usize,
    pub population_density: f64,
}

/// Totals for each configured consolidation scenario.
pub fn scenario_rollup(
    scenarios: &BTreeMap<String, ScenarioConfig>,
    counties: &[CountyRollup],
) -> Vec<ScenarioRollup> {
    scenarios
        .iter()
        .map(|(id, scenario)| {
            let wanted: Vec<String> = scenario.counties.iter().map(|c| normalize(c)).collect();
            let members = counties.iter().filter(|c| wanted.contains(&normalize(&c.county)));

            let (population, area_sq_miles, municipalities) =
                members.fold((0u64, 0.0f64, 0usize), |acc, c| {
                    (acc.0 + c.population, acc.1 + c.area_sq_miles, acc.2 + c.municipalities)
                });

            ScenarioRollup {
                id: id.clone(),
                name: scenario.name.clone(),
                description: scenario.description.clone(),
                counties: scenario.counties.clone(),
                population,
                area_sq_miles,
                municipalities,
                population_density: if area_sq_miles > 0.0 {
                    population as f64 / area_sq_miles
                } else {
                    0.0
                },
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub rank: usize,
    pub city: String,
    pub population: u64,
    /// True for rows describing a consolidation scenario.
    pub consolidated: bool,
}

/// Rank scenarios among the configured comparison cities by population.
///
/// Ties keep cities ahead of scenarios, then configuration order.
pub fn comparisons(cities: &[CityComparison], scenarios: &[ScenarioRollup]) -> Vec<ComparisonRow> {
    let mut rows: Vec<ComparisonRow> = cities
        .iter()
        .map(|c| ComparisonRow {
            rank: 0,
            city: c.city.clone(),
            population: c.population,
            consolidated: false,
        })
        .chain(scenarios.iter().map(|s| ComparisonRow {
            rank: 0,
            city: s.name.clone(),
            population: s.population,
            consolidated: true,
        }))
        .collect();

    rows.sort_by(|a, b| b.population.cmp(&a.population).then(a.consolidated.cmp(&b.consolidated)));
    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = i + 1;
    }
    rows
}

// ---------------------------------------------------------------------------
// Demographics
// ---------------------------------------------------------------------------

/// One municipality singled out by a demographic extreme.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MunicipalityStat {
    pub municipality: String,
    pub county: String,
    pub population: u64,
    pub population_density: f64,
}

impl From<&ReferenceRecord> for MunicipalityStat {
    fn from(r: &ReferenceRecord) -> Self {
        Self {
            municipality: r.municipality_name.clone(),
            county: r.county_name.clone(),
            population: r.population,
            population_density: r.population_density,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeClass {
    /// Up to 10,000 residents.
    Small,
    /// 10,001 to 50,000.
    Medium,
    /// 50,001 to 100,000.
    Large,
    /// Over 100,000.
    VeryLarge,
}

impl SizeClass {
    pub const ALL: [SizeClass; 4] =
        [SizeClass::Small, SizeClass::Medium, SizeClass::Large, SizeClass::VeryLarge];

    /// Buckets are closed on the right. An empty municipality has no class.
    pub fn of(population: u64) -> Option<Self> {
        match population {
            0 => None,
            1..=10_000 => Some(SizeClass::Small),
            10_001..=50_000 => Some(SizeClass::Medium),
            50_001..=100_000 => Some(SizeClass::Large),
            _ => Some(SizeClass::VeryLarge),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SizeClass::Small => "Small (<10k)",
            SizeClass::Medium => "Medium (10k-50k)",
            SizeClass::Large => "Large (50k-100k)",
            SizeClass::VeryLarge => "Very Large (100k+)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeBucket {
    pub class: SizeClass,
    pub label: &'static str,
    pub municipalities: usize,
}

/// Population and density profile of the target region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Demographics {
    pub total_municipalities: usize,
    pub target_region_municipalities: usize,
    pub total_population: u64,
    pub target_region_population: u64,
    pub largest: Option<MunicipalityStat>,
    pub smallest: Option<MunicipalityStat>,
    pub average_population: f64,
    pub median_population: f64,
    pub highest_density: Option<MunicipalityStat>,
    pub lowest_density: Option<MunicipalityStat>,
    pub average_density: f64,
    /// Sample standard deviation; zero with fewer than two municipalities.
    pub density_std: f64,
    /// Every size class in ascending order, including empty ones.
    pub size_distribution: Vec<SizeBucket>,
}

/// Summarize the target-region municipalities. Extremes keep the first row
/// on ties.
pub fn demographics<'a>(records: impl IntoIterator<Item = &'a ReferenceRecord>) -> Demographics {
    let all: Vec<&ReferenceRecord> = records.into_iter().collect();
    let region: Vec<&ReferenceRecord> =
        all.iter().copied().filter(|r| r.in_target_region).collect();

    let pick = |better: fn(&ReferenceRecord, &ReferenceRecord) -> bool| {
        region
            .iter()
            .copied()
            .reduce(|best, r| if better(r, best) { r } else { best })
            .map(MunicipalityStat::from)
    };

    let populations: Vec<f64> = region.iter().map(|r| r.population as f64).collect();
    let densities: Vec<f64> = region.iter().map(|r| r.population_density).collect();

    let mut counts: BTreeMap<SizeClass, usize> = BTreeMap::new();
    for class in region.iter().filter_map(|r| SizeClass::of(r.population)) {
        *counts.entry(class).or_insert(0) += 1;
    }

    Demographics {
        total_municipalities: all.len(),
        target_region_municipalities: region.len(),
        total_population: all.iter().map(|r| r.population).sum(),
        target_region_population: region.iter().map(|r| r.population).sum(),
        largest: pick(|a, b| a.population > b.population),
        smallest: pick(|a, b| a.population < b.population),
        average_population: mean(&populations),
        median_population: median(&populations),
        highest_density: pick(|a, b| a.population_density > b.population_density),
        lowest_density: pick(|a, b| a.population_density < b.population_density),
        average_density: mean(&densities),
        density_std: sample_std(&densities),
        size_distribution: SizeClass::ALL
            .iter()
            .map(|&class| SizeBucket {
                class,
                label: class.label(),
                municipalities: counts.get(&class).copied().unwrap_or(0),
            })
            .collect(),
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    match sorted.len() {
        0 => 0.0,
        n if n % 2 == 1 => sorted[n / 2],
        n => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}
