//! Feature extraction from uploaded CSV / JSON files.
//!
//! Only the first row is classified. Columns other than the eight KOI
//! features are ignored; numeric strings are accepted.

use prismiq_common::{ApiError, Feature, KoiFeatures, KOI_FEATURES};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Only CSV/JSON supported")]
    UnsupportedFormat,

    #[error("uploaded file contains no rows")]
    Empty,

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON rows must be objects")]
    NotAnObject,

    #[error("missing feature '{0}'")]
    MissingFeature(&'static str),

    #[error("feature '{feature}' is not a finite number: {value}")]
    NotNumeric { feature: &'static str, value: String },
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Csv,
    Json,
}

impl UploadFormat {
    pub fn from_filename(name: &str) -> Result<Self, UploadError> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".csv") {
            Ok(UploadFormat::Csv)
        } else if lower.ends_with(".json") {
            Ok(UploadFormat::Json)
        } else {
            Err(UploadError::UnsupportedFormat)
        }
    }
}

pub fn parse_upload(filename: &str, bytes: &[u8]) -> Result<KoiFeatures, UploadError> {
    match UploadFormat::from_filename(filename)? {
        UploadFormat::Csv => parse_csv(bytes),
        UploadFormat::Json => parse_json(bytes),
    }
}

/// First data row of a headed CSV file.
pub fn parse_csv(bytes: &[u8]) -> Result<KoiFeatures, UploadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    let record = reader.records().next().ok_or(UploadError::Empty)??;

    build_features(|key| {
        headers
            .iter()
            .position(|h| h == key)
            .and_then(|i| record.get(i))
            .filter(|v| !v.is_empty())
            .map(|v| Value::String(v.to_string()))
    })
}

/// A single object, or the first element of an array of objects.
pub fn parse_json(bytes: &[u8]) -> Result<KoiFeatures, UploadError> {
    let value: Value = serde_json::from_slice(bytes)?;
    let row: Map<String, Value> = match value {
        Value::Object(obj) => obj,
        Value::Array(rows) => match rows.into_iter().next() {
            Some(Value::Object(obj)) => obj,
            Some(_) => return Err(UploadError::NotAnObject),
            None => return Err(UploadError::Empty),
        },
        _ => return Err(UploadError::NotAnObject),
    };

    build_features(|key| row.get(key).filter(|v| !v.is_null()).cloned())
}

fn numeric(feature: Feature, value: &Value) -> Result<f64, UploadError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).ok_or_else(|| UploadError::NotNumeric {
        feature: feature.key(),
        value: value.to_string(),
    })
}

fn build_features(lookup: impl Fn(&str) -> Option<Value>) -> Result<KoiFeatures, UploadError> {
    let mut values = [0.0; 8];
    for (slot, feature) in values.iter_mut().zip(KOI_FEATURES) {
        let raw = lookup(feature.key()).ok_or(UploadError::MissingFeature(feature.key()))?;
        *slot = numeric(feature, &raw)?;
    }
    let [koi_period, koi_duration, koi_depth, koi_prad, koi_sma, koi_incl, koi_teq, koi_model_snr] =
        values;
    Ok(KoiFeatures {
        koi_period,
        koi_duration,
        koi_depth,
        koi_prad,
        koi_sma,
        koi_incl,
        koi_teq,
        koi_model_snr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HEADER: &str =
        "kepid,koi_period,koi_duration,koi_depth,koi_prad,koi_sma,koi_incl,koi_teq,koi_model_snr";

    fn expected() -> KoiFeatures {
        KoiFeatures {
            koi_period: 3.5,
            koi_duration: 2.9,
            koi_depth: 1200.0,
            koi_prad: 1.9,
            koi_sma: 0.04,
            koi_incl: 89.0,
            koi_teq: 700.0,
            koi_model_snr: 25.0,
        }
    }

    #[test]
    fn test_csv_first_row() {
        let csv = format!("{HEADER}\n10797460,3.5,2.9,1200,1.9,0.04,89,700,25\n1,9,9,9,9,9,9,9,9\n");
        assert_eq!(parse_upload("koi.csv", csv.as_bytes()).unwrap(), expected());
    }

    #[test]
    fn test_csv_missing_column() {
        let csv = "koi_period,koi_duration\n3.5,2.9\n";
        let err = parse_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, UploadError::MissingFeature("koi_depth")));
    }

    #[test]
    fn test_csv_non_numeric() {
        let csv = format!("{HEADER}\n1,abc,2.9,1200,1.9,0.04,89,700,25\n");
        match parse_csv(csv.as_bytes()).unwrap_err() {
            UploadError::NotNumeric { feature, .. } => assert_eq!(feature, "koi_period"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_csv_header_only() {
        let err = parse_csv(format!("{HEADER}\n").as_bytes()).unwrap_err();
        assert!(matches!(err, UploadError::Empty));
    }

    #[test]
    fn test_json_array_and_object() {
        let obj = serde_json::to_string(&expected()).unwrap();
        let arr = format!("[{obj}, {obj}]");
        assert_eq!(parse_upload("row.json", obj.as_bytes()).unwrap(), expected());
        assert_eq!(parse_upload("rows.JSON", arr.as_bytes()).unwrap(), expected());
    }

    #[test]
    fn test_json_numeric_strings_accepted() {
        let mut value = serde_json::to_value(expected()).unwrap();
        value["koi_teq"] = Value::String("700".to_string());
        let bytes = serde_json::to_vec(&value).unwrap();
        assert_eq!(parse_json(&bytes).unwrap(), expected());
    }

    #[test]
    fn test_json_null_is_missing() {
        let mut value = serde_json::to_value(expected()).unwrap();
        value["koi_sma"] = Value::Null;
        let err = parse_json(&serde_json::to_vec(&value).unwrap()).unwrap_err();
        assert!(matches!(err, UploadError::MissingFeature("koi_sma")));
    }

    #[test]
    fn test_json_empty_array() {
        assert!(matches!(parse_json(b"[]").unwrap_err(), UploadError::Empty));
        assert!(matches!(parse_json(b"[1]").unwrap_err(), UploadError::NotAnObject));
    }

    #[test]
    fn test_non_finite_string_rejected() {
        let mut value = serde_json::to_value(expected()).unwrap();
        value["koi_depth"] = Value::String("NaN".to_string());
        let err = parse_json(&serde_json::to_vec(&value).unwrap()).unwrap_err();
        assert!(matches!(err, UploadError::NotNumeric { feature: "koi_depth", .. }));
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            parse_upload("koi.xlsx", b"").unwrap_err(),
            UploadError::UnsupportedFormat
        ));
    }
}
