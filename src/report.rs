//! Coverage report for the published daily dataset.

use crate::constants::{DIAGNOSTIC_SAMPLE_SIZE, columns};
use crate::models::DailyFeatureRow;
use chrono::NaiveDate;
use colored::*;
use std::collections::BTreeMap;

/// Null counts, per-year coverage and calendar gaps of a daily dataset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageReport {
    pub rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub null_counts: BTreeMap<&'static str, usize>,
    pub days_per_year: BTreeMap<i32, usize>,
    /// Dates whose `load_mw_daily_mean` is null, in file order
    pub missing_target_dates: Vec<NaiveDate>,
    pub missing_target_per_year: BTreeMap<i32, usize>,
    /// Dates with at least one missing weather feature
    pub incomplete_dates: Vec<NaiveDate>,
    /// Calendar days between first and last date with no row
    pub missing_dates: Vec<NaiveDate>,
}

impl CoverageReport {
    pub fn from_rows(rows: &[DailyFeatureRow]) -> Self {
        let mut null_counts: BTreeMap<&'static str, usize> = [
            columns::LOAD_MW_DAILY_MEAN,
            columns::TEMP_C_MEAN,
            columns::TEMP_C_MIN,
            columns::TEMP_C_MAX,
            columns::WIND_MS_MEAN,
            columns::RH_PCT_MEAN,
        ]
        .into_iter()
        .map(|name| (name, 0))
        .collect();
        let mut days_per_year = BTreeMap::new();
        let mut incomplete_dates = Vec::new();
        let mut missing_target_dates = Vec::new();
        let mut missing_target_per_year = BTreeMap::new();

        for row in rows {
            *days_per_year.entry(row.year).or_insert(0) += 1;

            if row.load_mw_daily_mean.is_none() {
                *null_counts.entry(columns::LOAD_MW_DAILY_MEAN).or_insert(0) += 1;
                *missing_target_per_year.entry(row.year).or_insert(0) += 1;
                missing_target_dates.push(row.date);
            }

            let optional = [
                (columns::TEMP_C_MEAN, row.temp_c_mean),
                (columns::TEMP_C_MIN, row.temp_c_min),
                (columns::TEMP_C_MAX, row.temp_c_max),
                (columns::WIND_MS_MEAN, row.wind_ms_mean),
                (columns::RH_PCT_MEAN, row.rh_pct_mean),
            ];
            let mut complete = true;
            for (name, value) in optional {
                if value.is_none() {
                    complete = false;
                    *null_counts.entry(name).or_insert(0) += 1;
                }
            }
            if !complete {
                incomplete_dates.push(row.date);
            }
        }

        let first_date = rows.iter().map(|row| row.date).min();
        let last_date = rows.iter().map(|row| row.date).max();
        let missing_dates = match (first_date, last_date) {
            (Some(first), Some(last)) => calendar_gaps(rows, first, last),
            _ => Vec::new(),
        };

        Self {
            rows: rows.len(),
            first_date,
            last_date,
            null_counts,
            days_per_year,
            missing_target_dates,
            missing_target_per_year,
            incomplete_dates,
            missing_dates,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.missing_target_dates.is_empty()
            && self.incomplete_dates.is_empty()
            && self.missing_dates.is_empty()
    }

    /// Print the report for the operator
    pub fn print(&self) {
        println!("\n{}", "Dataset Coverage".bright_green().bold());
        println!(
            "  {} {}",
            "Rows:".bright_cyan(),
            self.rows.to_string().bright_white().bold()
        );
        if let (Some(first), Some(last)) = (self.first_date, self.last_date) {
            println!("  {} {} to {}", "Date range:".bright_cyan(), first, last);
        }

        println!("  {}", "Days per year:".bright_cyan());
        for (year, days) in &self.days_per_year {
            println!("    {}: {}", year, days.to_string().bright_white());
        }

        println!("  {}", "Null values:".bright_cyan());
        for (column, nulls) in &self.null_counts {
            let count = if *nulls > 0 {
                nulls.to_string().bright_yellow()
            } else {
                nulls.to_string().bright_white()
            };
            println!("    {}: {}", column, count);
        }

        if let (Some(first), Some(last)) = (
            self.missing_target_dates.iter().min(),
            self.missing_target_dates.iter().max(),
        ) {
            println!(
                "  {} {} (first: {}, last: {})",
                "Missing target:".bright_red(),
                self.missing_target_dates.len().to_string().bright_red().bold(),
                first,
                last
            );
            for (year, count) in &self.missing_target_per_year {
                println!("    {}: {}", year, count.to_string().bright_yellow());
            }
        }
        if !self.incomplete_dates.is_empty() {
            println!(
                "  {} {} (first: {})",
                "Incomplete days:".bright_yellow(),
                self.incomplete_dates.len(),
                format_sample(&self.incomplete_dates)
            );
        }
        if !self.missing_dates.is_empty() {
            println!(
                "  {} {} (first: {})",
                "Missing days:".bright_red(),
                self.missing_dates.len().to_string().bright_red().bold(),
                format_sample(&self.missing_dates)
            );
        }
        if self.is_complete() {
            println!("  {}", "No gaps or missing values".bright_green());
        }
    }
}

fn calendar_gaps(rows: &[DailyFeatureRow], first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    let present: std::collections::BTreeSet<NaiveDate> = rows.iter().map(|row| row.date).collect();
    first
        .iter_days()
        .take_while(|day| *day <= last)
        .filter(|day| !present.contains(day))
        .collect()
}

fn format_sample(dates: &[NaiveDate]) -> String {
    dates
        .iter()
        .take(DIAGNOSTIC_SAMPLE_SIZE)
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::CalendarFeatures;

    fn row(y: i32, m: u32, d: u32, temp: Option<f64>) -> DailyFeatureRow {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        let calendar = CalendarFeatures::from_date(date);
        DailyFeatureRow {
            date,
            load_mw_daily_mean: Some(6000.0),
            temp_c_mean: temp,
            temp_c_min: temp,
            temp_c_max: temp,
            precip_mm_sum: 0.0,
            wind_ms_mean: Some(2.0),
            rh_pct_mean: Some(80.0),
            weekday: calendar.weekday,
            month: calendar.month,
            year: calendar.year,
            is_weekend: calendar.is_weekend,
        }
    }

    #[test]
    fn test_complete_dataset() {
        let rows = vec![
            row(2019, 12, 31, Some(1.0)),
            row(2020, 1, 1, Some(2.0)),
            row(2020, 1, 2, Some(3.0)),
        ];
        let report = CoverageReport::from_rows(&rows);

        assert_eq!(report.rows, 3);
        assert!(report.is_complete());
        assert_eq!(report.days_per_year.get(&2019), Some(&1));
        assert_eq!(report.days_per_year.get(&2020), Some(&2));
        assert_eq!(report.null_counts.get(columns::TEMP_C_MEAN), Some(&0));
        assert_eq!(report.null_counts.get(columns::LOAD_MW_DAILY_MEAN), Some(&0));
        assert_eq!(report.first_date, NaiveDate::from_ymd_opt(2019, 12, 31));
        assert_eq!(report.last_date, NaiveDate::from_ymd_opt(2020, 1, 2));
    }

    #[test]
    fn test_nulls_and_gaps() {
        let rows = vec![
            row(2019, 1, 1, Some(1.0)),
            row(2019, 1, 2, None),
            row(2019, 1, 5, Some(1.0)),
        ];
        let report = CoverageReport::from_rows(&rows);

        assert!(!report.is_complete());
        assert_eq!(report.null_counts.get(columns::TEMP_C_MAX), Some(&1));
        assert_eq!(report.null_counts.get(columns::RH_PCT_MEAN), Some(&0));
        assert_eq!(
            report.incomplete_dates,
            vec![NaiveDate::from_ymd_opt(2019, 1, 2).unwrap()]
        );
        assert_eq!(
            report.missing_dates,
            vec![
                NaiveDate::from_ymd_opt(2019, 1, 3).unwrap(),
                NaiveDate::from_ymd_opt(2019, 1, 4).unwrap(),
            ]
        );
    }

    #[test]
    fn test_missing_target_is_counted_per_year() {
        let mut rows = vec![
            row(2019, 12, 30, Some(1.0)),
            row(2019, 12, 31, Some(1.0)),
            row(2020, 1, 1, Some(1.0)),
            row(2020, 1, 2, Some(1.0)),
        ];
        rows[1].load_mw_daily_mean = None;
        rows[3].load_mw_daily_mean = None;
        let report = CoverageReport::from_rows(&rows);

        assert_eq!(report.rows, 4);
        assert_eq!(report.null_counts.get(columns::LOAD_MW_DAILY_MEAN), Some(&2));
        assert_eq!(
            report.missing_target_dates,
            vec![
                NaiveDate::from_ymd_opt(2019, 12, 31).unwrap(),
                NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(),
            ]
        );
        assert_eq!(report.missing_target_per_year.get(&2019), Some(&1));
        assert_eq!(report.missing_target_per_year.get(&2020), Some(&1));
        assert!(report.incomplete_dates.is_empty());
        assert!(report.missing_dates.is_empty());
        assert!(!report.is_complete());
    }

    #[test]
    fn test_empty_dataset() {
        let report = CoverageReport::from_rows(&[]);
        assert_eq!(report.rows, 0);
        assert!(report.first_date.is_none());
        assert!(report.missing_dates.is_empty());
        assert!(report.is_complete());
    }
}
