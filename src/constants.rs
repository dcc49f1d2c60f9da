//! Application constants for the load/weather processor
//!
//! Default paths, source column names, canonical column names and the
//! fixed parsing priorities used throughout the pipeline.

// =============================================================================
// Default Paths
// =============================================================================

/// Monthly hourly load exports from ENTSO-E Power Statistics
pub const DEFAULT_LOAD_GLOB: &str = "data/raw/entsoe/monthly_hourly_load_values_*.csv";

/// Cached Open-Meteo archive response
pub const DEFAULT_WEATHER_SOURCE: &str = "data/raw/openmeteo/openmeteo_bucharest_hourly.json";

/// Canonical intermediate artifacts
pub const DEFAULT_HOURLY_LOAD_PATH: &str = "data/processed/entsoe_ro_hourly.parquet";
pub const DEFAULT_HOURLY_WEATHER_PATH: &str = "data/raw/openmeteo/openmeteo_bucharest_hourly.parquet";

/// Final dataset prefix; `.parquet` and `.csv` are appended
pub const DEFAULT_DATASET_PREFIX: &str = "data/final/dataset_daily";

/// Region filter applied to the load exports
pub const DEFAULT_COUNTRY_CODE: &str = "RO";

// =============================================================================
// Source Columns
// =============================================================================

pub mod source_columns {
    pub const COUNTRY_CODE: &str = "CountryCode";
    pub const TIMESTAMP: &str = "DateUTC";
    pub const VALUE: &str = "Value";
}

// =============================================================================
// Canonical Columns
// =============================================================================

pub mod columns {
    pub const TIME: &str = "time";
    pub const LOAD_MW: &str = "load_mw";
    pub const TEMP_C: &str = "temp_c";
    pub const PRECIP_MM: &str = "precip_mm";
    pub const WIND_MS: &str = "wind_ms";
    pub const RH_PCT: &str = "rh_pct";

    pub const DATE: &str = "date";
    pub const LOAD_MW_DAILY_MEAN: &str = "load_mw_daily_mean";
    pub const TEMP_C_MEAN: &str = "temp_c_mean";
    pub const TEMP_C_MIN: &str = "temp_c_min";
    pub const TEMP_C_MAX: &str = "temp_c_max";
    pub const PRECIP_MM_SUM: &str = "precip_mm_sum";
    pub const WIND_MS_MEAN: &str = "wind_ms_mean";
    pub const RH_PCT_MEAN: &str = "rh_pct_mean";
    pub const WEEKDAY: &str = "weekday";
    pub const MONTH: &str = "month";
    pub const YEAR: &str = "year";
    pub const IS_WEEKEND: &str = "is_weekend";

    /// Hourly weather measurement columns
    pub const WEATHER_MEASUREMENTS: [&str; 4] = [TEMP_C, PRECIP_MM, WIND_MS, RH_PCT];

    /// Daily dataset column order
    pub const DAILY_DATASET: [&str; 12] = [
        DATE,
        LOAD_MW_DAILY_MEAN,
        TEMP_C_MEAN,
        TEMP_C_MIN,
        TEMP_C_MAX,
        PRECIP_MM_SUM,
        WIND_MS_MEAN,
        RH_PCT_MEAN,
        WEEKDAY,
        MONTH,
        YEAR,
        IS_WEEKEND,
    ];
}

// =============================================================================
// Parsing
// =============================================================================

/// Delimiter candidates, tried in this order
pub const DELIMITER_CANDIDATES: [u8; 3] = [b'\t', b';', b','];

/// Delimiter assumed when nothing is specified
pub const DEFAULT_DELIMITER: u8 = b',';

/// Delimiter the fallback looks for inside a collapsed single-column header
pub const FALLBACK_DELIMITER: u8 = b';';

/// Load timestamp formats: day-month-year with dash, then slash separators
pub const LOAD_TIMESTAMP_DASH: &str = "%d-%m-%Y %H:%M";
pub const LOAD_TIMESTAMP_SLASH: &str = "%d/%m/%Y %H:%M";

/// Open-Meteo hourly timestamp format
pub const WEATHER_TIMESTAMP: &str = "%Y-%m-%dT%H:%M";

/// Number of unparseable rows quoted in diagnostics
pub const DIAGNOSTIC_SAMPLE_SIZE: usize = 5;

/// Weekday index from which a day counts as weekend (Saturday)
pub const FIRST_WEEKEND_DAY: u32 = 5;
