//! Reference attribute table: canonical municipality rows keyed by (name, county).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::model::ReferenceRecord;
use crate::normalize::{normalize, NameKey};

pub const COL_MUNICIPALITY: &str = "municipality";
pub const COL_COUNTY: &str = "county";
pub const COL_POPULATION: &str = "population_2020";
pub const COL_AREA: &str = "area_sq_miles";

/// What to do when a row repeats an existing (municipality, county) key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail the whole load.
    #[default]
    Reject,
    /// Keep the first row and report the rest.
    Skip,
}

/// A row dropped under `DuplicatePolicy::Skip`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadWarning {
    pub line: u64,
    pub municipality: String,
    pub county: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    records: Vec<ReferenceRecord>,
    by_key: HashMap<NameKey, usize>,
    by_name: HashMap<String, Vec<usize>>,
}

impl ReferenceTable {
    /// Build from already-constructed records.
    pub fn from_records(
        records: Vec<ReferenceRecord>,
        policy: DuplicatePolicy,
    ) -> Result<(Self, Vec<LoadWarning>), ReconError> {
        let mut table = Self::default();
        let mut warnings = Vec::new();
        for (i, record) in records.into_iter().enumerate() {
            // Line numbers are 1-based data rows here.
            table.push(record, i as u64 + 1, policy, &mut warnings)?;
        }
        Ok((table, warnings))
    }

    /// Parse a reference CSV with columns
    /// `municipality, county, population_2020, area_sq_miles`.
    ///
    /// Extra columns are ignored; density and target-region membership are
    /// recomputed against `target_counties`.
    pub fn from_csv(
        csv_data: &str,
        target_counties: &[String],
        policy: DuplicatePolicy,
    ) -> Result<(Self, Vec<LoadWarning>), ReconError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(csv_data.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| ReconError::Io(e.to_string()))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let idx = |name: &str| -> Result<usize, ReconError> {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| ReconError::MissingColumn { column: name.into() })
        };

        let name_idx = idx(COL_MUNICIPALITY)?;
        let county_idx = idx(COL_COUNTY)?;
        let population_idx = idx(COL_POPULATION)?;
        let area_idx = idx(COL_AREA)?;

        let mut table = Self::default();
        let mut warnings = Vec::new();

        for record in reader.records() {
            let record = record.map_err(|e| ReconError::Io(e.to_string()))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let name = record.get(name_idx).unwrap_or("");
            let county = record.get(county_idx).unwrap_or("");
            if name.is_empty() || county.is_empty() {
                let (column, value) = if name.is_empty() {
                    (COL_MUNICIPALITY, name)
                } else {
                    (COL_COUNTY, county)
                };
                return Err(ReconError::InvalidValue {
                    line,
                    column: column.into(),
                    value: value.into(),
                });
            }

            let population_str = record.get(population_idx).unwrap_or("");
            let population =
                parse_population(population_str).ok_or_else(|| ReconError::InvalidValue {
                    line,
                    column: COL_POPULATION.into(),
                    value: population_str.into(),
                })?;

            let area_str = record.get(area_idx).unwrap_or("");
            let area = area_str.parse::<f64>().map_err(|_| ReconError::InvalidValue {
                line,
                column: COL_AREA.into(),
                value: area_str.into(),
            })?;

            let row = ReferenceRecord::new(name, county, population, area, target_counties);
            table.push(row, line, policy, &mut warnings)?;
        }

        log::info!(
            "loaded {} reference municipalities ({} duplicate rows skipped)",
            table.len(),
            warnings.len()
        );
        Ok((table, warnings))
    }

    fn push(
        &mut self,
        record: ReferenceRecord,
        line: u64,
        policy: DuplicatePolicy,
        warnings: &mut Vec<LoadWarning>,
    ) -> Result<(), ReconError> {
        // Density divides by area, so both must come out finite.
        let area = record.area_sq_miles;
        if !(area.is_finite() && area > 0.0 && record.population_density.is_finite()) {
            return Err(ReconError::InvalidValue {
                line,
                column: COL_AREA.into(),
                value: area.to_string(),
            });
        }

        let key = NameKey::new(&record.municipality_name, &record.county_name);
        if self.by_key.contains_key(&key) {
            return match policy {
                DuplicatePolicy::Reject => Err(ReconError::DuplicateKey {
                    municipality: record.municipality_name,
                    county: record.county_name,
                    line,
                }),
                DuplicatePolicy::Skip => {
                    log::warn!(
                        "skipping duplicate reference row {line}: {} ({})",
                        record.municipality_name,
                        record.county_name
                    );
                    warnings.push(LoadWarning {
                        line,
                        municipality: record.municipality_name,
                        county: record.county_name,
                    });
                    Ok(())
                }
            };
        }

        let index = self.records.len();
        self.by_name.entry(key.name.clone()).or_default().push(index);
        self.by_key.insert(key, index);
        self.records.push(record);
        Ok(())
    }

    /// Exact lookup on the normalized (name, county) pair.
    pub fn get(&self, municipality: &str, county: &str) -> Option<&ReferenceRecord> {
        self.position(municipality, county).map(|i| &self.records[i])
    }

    pub fn position(&self, municipality: &str, county: &str) -> Option<usize> {
        self.by_key.get(&NameKey::new(municipality, county)).copied()
    }

    /// Indices of every row carrying `municipality`, across all counties.
    pub fn candidates_by_name(&self, municipality: &str) -> &[usize] {
        self.by_name
            .get(&normalize(municipality))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn record(&self, index: usize) -> Option<&ReferenceRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[ReferenceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Non-negative integer; accepts `311549.0` as written by spreadsheet exports.
fn parse_population(value: &str) -> Option<u64> {
    if let Ok(n) = value.parse::<u64>() {
        return Some(n);
    }
    let f = value.parse::<f64>().ok()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets() -> Vec<String> {
        ["Bergen", "Essex", "Hudson", "Passaic", "Union"].iter().map(|s| s.to_string()).collect()
    }

    fn load(
        csv: &str,
        policy: DuplicatePolicy,
    ) -> Result<(ReferenceTable, Vec<LoadWarning>), ReconError> {
        ReferenceTable::from_csv(csv, &targets(), policy)
    }

    const CSV: &str = "\
municipality,county,population_2020,area_sq_miles,population_density
Newark,Essex,311549,26.1,0
Jersey City,Hudson,292449,14.8,0
Washington_Union,Union,6000,1.8,0
Princeton,Mercer,30681,18.4,0
";

    #[test]
    fn loads_and_derives() {
        let (table, warnings) = load(CSV, DuplicatePolicy::Reject).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(table.len(), 4);

        let newark = table.get("newark", "ESSEX").unwrap();
        assert_eq!(newark.population, 311549);
        assert!((newark.population_density - 311549.0 / 26.1).abs() < 1e-9);
        assert!(newark.in_target_region);

        let princeton = table.get("Princeton", "Mercer").unwrap();
        assert!(!princeton.in_target_region);
    }

    #[test]
    fn duplicate_rejected() {
        let csv = "municipality,county,population_2020,area_sq_miles\n\
North Arlington,Bergen,16000,2.9\n\
North Arlington,Bergen,16000,2.9\n";
        let err = load(csv, DuplicatePolicy::Reject).unwrap_err();
        match err {
            ReconError::DuplicateKey { municipality, line, .. } => {
                assert_eq!(municipality, "North Arlington");
                assert_eq!(line, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_skipped_keeps_first() {
        let csv = "municipality,county,population_2020,area_sq_miles\n\
Palisades Park,Bergen,20000,1.2\n\
Palisades Park,Bergen,99999,9.9\n\
Teterboro,Bergen,100,1.2\n";
        let (table, warnings) = load(csv, DuplicatePolicy::Skip).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("Palisades Park", "Bergen").unwrap().population, 20000);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].line, 3);
    }

    #[test]
    fn same_name_different_county_is_not_duplicate() {
        let csv = "municipality,county,population_2020,area_sq_miles\n\
Washington,Bergen,9000,2.0\n\
Washington,Union,6000,1.8\n";
        let (table, _) = load(csv, DuplicatePolicy::Reject).unwrap();
        assert_eq!(table.candidates_by_name("Washington").len(), 2);
        assert!(table.candidates_by_name("Hoboken").is_empty());
    }

    #[test]
    fn missing_column_reported() {
        let csv = "municipality,county,population_2020\nA,B,1\n";
        let err = load(csv, DuplicatePolicy::Reject).unwrap_err();
        assert!(err.to_string().contains("area_sq_miles"));
    }

    #[test]
    fn rejects_non_positive_area_and_negative_population() {
        let zero_area = "municipality,county,population_2020,area_sq_miles\nA,Essex,10,0\n";
        let err = load(zero_area, DuplicatePolicy::Reject).unwrap_err();
        assert!(err.to_string().contains("area_sq_miles"));

        let negative = "municipality,county,population_2020,area_sq_miles\nA,Essex,-10,1.0\n";
        let err = load(negative, DuplicatePolicy::Reject).unwrap_err();
        assert!(err.to_string().contains("population_2020"));
    }

    #[test]
    fn from_records_rejects_zero_area() {
        let records = vec![
            ReferenceRecord::new("Newark", "Essex", 311549, 26.1, &targets()),
            ReferenceRecord::new("Nowhere", "Essex", 10, 0.0, &targets()),
        ];
        let err = ReferenceTable::from_records(records, DuplicatePolicy::Reject).unwrap_err();
        match err {
            ReconError::InvalidValue { line, column, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, COL_AREA);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unparseable_area_reports_raw_value() {
        let csv = "municipality,county,population_2020,area_sq_miles\nA,Essex,10,wide\n";
        let err = load(csv, DuplicatePolicy::Reject).unwrap_err();
        assert!(err.to_string().contains("wide"));
    }

    #[test]
    fn float_population_accepted() {
        let csv = "municipality,county,population_2020,area_sq_miles\nA,Essex,311549.0,1.0\n";
        let (table, _) = load(csv, DuplicatePolicy::Reject).unwrap();
        assert_eq!(table.get("A", "Essex").unwrap().population, 311549);
    }
}
