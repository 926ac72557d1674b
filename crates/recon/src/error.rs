use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad FIPS code, unknown county, etc.).
    ConfigValidation(String),
    /// A boundary chain entry names a source or layer that is not configured.
    UnknownSource(String),
    /// One FIPS code mapped to two different county names.
    FipsConflict { fips: String, existing: String, conflicting: String },
    /// Missing required column in the reference table.
    MissingColumn { column: String },
    /// Unparseable or out-of-range value in the reference table.
    InvalidValue { line: u64, column: String, value: String },
    /// Reference row repeats an existing (municipality, county) key.
    DuplicateKey { municipality: String, county: String, line: u64 },
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::UnknownSource(msg) => write!(f, "unknown source: {msg}"),
            Self::FipsConflict { fips, existing, conflicting } => write!(
                f,
                "FIPS code '{fips}' maps to both '{existing}' and '{conflicting}'"
            ),
            Self::MissingColumn { column } => {
                write!(f, "reference table: missing column '{column}'")
            }
            Self::InvalidValue { line, column, value } => {
                write!(f, "reference table line {line}: invalid {column} '{value}'")
            }
            Self::DuplicateKey { municipality, county, line } => write!(
                f,
                "reference table line {line}: duplicate key ('{municipality}', '{county}')"
            ),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
