//! Feature table export for downstream model training.
//!
//! One row per bar: `timestamp`, `close`, `volume`, then one column per
//! indicator in name order. Warmup values are absent (`None`), which the CSV
//! writer renders as empty cells and JSON as `null`.

use std::io::Write;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crosslevel_core::domain::Bar;
use crosslevel_core::indicators::{precompute, Indicator};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    pub timestamps: Vec<NaiveDateTime>,
    pub close: Vec<f64>,
    pub volume: Vec<u64>,
    pub columns: Vec<FeatureColumn>,
}

impl FeatureTable {
    pub fn from_bars(bars: &[Bar], indicators: &[Box<dyn Indicator>]) -> Self {
        let values = precompute(bars, indicators);
        let columns = values
            .names()
            .filter_map(|name| {
                let series = values.get_series(name)?;
                Some(FeatureColumn {
                    name: name.to_string(),
                    values: series
                        .iter()
                        .map(|v| Some(*v).filter(|v| !v.is_nan()))
                        .collect(),
                })
            })
            .collect();

        Self {
            timestamps: bars.iter().map(|b| b.timestamp).collect(),
            close: bars.iter().map(|b| b.close).collect(),
            volume: bars.iter().map(|b| b.volume).collect(),
            columns,
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Column names in output order, fixed columns first.
    pub fn header(&self) -> Vec<String> {
        ["timestamp", "close", "volume"]
            .into_iter()
            .map(str::to_string)
            .chain(self.columns.iter().map(|c| c.name.clone()))
            .collect()
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.header())?;

        for row in 0..self.len() {
            let mut record = Vec::with_capacity(3 + self.columns.len());
            record.push(self.timestamps[row].format(TIMESTAMP_FORMAT).to_string());
            record.push(self.close[row].to_string());
            record.push(self.volume[row].to_string());
            for column in &self.columns {
                record.push(column.values[row].map(|v| v.to_string()).unwrap_or_default());
            }
            wtr.write_record(&record)?;
        }

        wtr.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String, csv::Error> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crosslevel_core::indicators::{Ema, Rsi, Sma};

    fn bars(closes: &[f64]) -> Vec<Bar> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                timestamp: base + chrono::Duration::days(i as i64),
                open: c,
                high: c + 1.0,
                low: c - 1.0,
                close: c,
                volume: 1000 + i as u64,
            })
            .collect()
    }

    fn indicators() -> Vec<Box<dyn Indicator>> {
        vec![
            Box::new(Sma::new(3)),
            Box::new(Ema::new(2)),
            Box::new(Rsi::new(2)),
        ]
    }

    #[test]
    fn columns_follow_name_order() {
        let table = FeatureTable::from_bars(&bars(&[10.0, 11.0, 12.0, 11.0]), &indicators());
        assert_eq!(
            table.header(),
            vec!["timestamp", "close", "volume", "ema_2", "rsi_2", "sma_3"]
        );
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn warmup_values_are_absent() {
        let table = FeatureTable::from_bars(&bars(&[10.0, 11.0, 12.0, 11.0]), &indicators());
        let sma = table.column("sma_3").unwrap();
        assert_eq!(sma[0], None);
        assert_eq!(sma[1], None);
        assert_eq!(sma[2], Some(11.0));
        assert_eq!(table.column("ema_2").unwrap()[0], Some(10.0));
    }

    #[test]
    fn csv_round_trip_preserves_column_order() {
        let table = FeatureTable::from_bars(&bars(&[10.0, 11.0, 12.0, 11.0]), &indicators());
        let text = table.to_csv_string().unwrap();

        let mut rdr = csv::Reader::from_reader(text.as_bytes());
        let headers: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, table.header());

        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(&rows[0][0], "2024-01-02 00:00:00");
        assert_eq!(&rows[0][2], "1000");
        // sma_3 is the last column and empty during warmup.
        assert_eq!(&rows[0][5], "");
        assert_eq!(rows[2][5].parse::<f64>().unwrap(), 11.0);
    }

    #[test]
    fn json_uses_null_for_absent_values() {
        let sma: Vec<Box<dyn Indicator>> = vec![Box::new(Sma::new(2))];
        let table = FeatureTable::from_bars(&bars(&[10.0, 11.0]), &sma);
        let json = serde_json::to_string(&table).unwrap();
        assert!(json.contains("null"));
        let back: FeatureTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn empty_bars_yield_header_only() {
        let table = FeatureTable::from_bars(&[], &indicators());
        assert!(table.is_empty());
        let text = table.to_csv_string().unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
