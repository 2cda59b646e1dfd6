//! Bulk load of the assessor spreadsheet export into the record store.
//!
//! Each CSV row becomes one atomic property creation carrying every dependent section.
//! Rows that cannot be parsed or stored are logged and counted; the import continues.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use tracing::{info, warn};

use crate::records::{
    AssessmentFields, ClassificationFields, FeatureFields, MiscInfoFields, PropertyAddress,
    PropertyRepository, PropertyService, PropertySubmission, SalesAppealFields,
};

#[derive(Debug)]
pub enum ImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Io(err) => write!(f, "failed to read assessor export: {}", err),
            ImportError::Csv(err) => write!(f, "invalid assessor CSV data: {}", err),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Io(err) => Some(err),
            ImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// A cell that could not be converted to its column's type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("column {column}: {value:?} is not a valid {expected}")]
pub struct CellError {
    pub column: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// Row counts reported once the file has been consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub failed: usize,
}

pub async fn import_csv_path<R>(
    service: &PropertyService<R>,
    path: impl AsRef<Path>,
) -> Result<ImportSummary, ImportError>
where
    R: PropertyRepository + 'static,
{
    let path = path.as_ref();
    let file = File::open(path)?;
    info!(path = %path.display(), "importing assessor export");
    import_csv(service, file).await
}

/// Creates one property per row. Only unreadable input aborts the import.
pub async fn import_csv<R, Rd>(
    service: &PropertyService<R>,
    reader: Rd,
) -> Result<ImportSummary, ImportError>
where
    R: PropertyRepository + 'static,
    Rd: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut record = csv::StringRecord::new();
    let mut summary = ImportSummary::default();

    loop {
        match csv_reader.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                warn!(error = %err, "skipping unreadable csv row");
                summary.failed += 1;
                continue;
            }
        }

        let line = record.position().map(csv::Position::line);
        let parsed: Result<AssessorRow, csv::Error> = record.deserialize(Some(&headers));
        let submission = match parsed
            .map_err(|err| err.to_string())
            .and_then(|row| row.into_submission().map_err(|err| err.to_string()))
        {
            Ok(submission) => submission,
            Err(error) => {
                warn!(?line, %error, "skipping malformed csv row");
                summary.failed += 1;
                continue;
            }
        };

        match service.create(submission).await {
            Ok(_) => summary.imported += 1,
            Err(error) => {
                warn!(?line, %error, "csv row rejected by property store");
                summary.failed += 1;
            }
        }
    }

    info!(
        imported = summary.imported,
        failed = summary.failed,
        "assessor import finished"
    );
    Ok(summary)
}

/// One spreadsheet row; columns without a counterpart here are ignored.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct AssessorRow {
    #[serde(rename = "HOUSENO", default, deserialize_with = "blank_as_none")]
    house_no: Option<String>,
    #[serde(rename = "DIR", default, deserialize_with = "blank_as_none")]
    dir: Option<String>,
    #[serde(rename = "STREET", default, deserialize_with = "blank_as_none")]
    street: Option<String>,
    #[serde(rename = "SUFFIX", default, deserialize_with = "blank_as_none")]
    suffix: Option<String>,
    #[serde(rename = "APT", default, deserialize_with = "blank_as_none")]
    apt: Option<String>,
    #[serde(rename = "CITY", default, deserialize_with = "blank_as_none")]
    city: Option<String>,
    #[serde(rename = "Zip", default, deserialize_with = "blank_as_none")]
    zip: Option<String>,
    #[serde(rename = "Longitude", default, deserialize_with = "blank_as_none")]
    longitude: Option<String>,
    #[serde(rename = "Latitude", default, deserialize_with = "blank_as_none")]
    latitude: Option<String>,

    #[serde(rename = "OVACLS", default, deserialize_with = "blank_as_none")]
    ovacls: Option<String>,
    #[serde(rename = "CLASS_DESCRIPTION", default, deserialize_with = "blank_as_none")]
    class_description: Option<String>,
    #[serde(rename = "RES_TYPE", default, deserialize_with = "blank_as_none")]
    res_type: Option<String>,
    #[serde(rename = "BLDG_USE", default, deserialize_with = "blank_as_none")]
    bldg_use: Option<String>,
    #[serde(rename = "APT_DESC", default, deserialize_with = "blank_as_none")]
    apt_desc: Option<String>,

    #[serde(rename = "CURRENT_LAND", default, deserialize_with = "blank_as_none")]
    current_land: Option<String>,
    #[serde(rename = "CURRENT_BUILDING", default, deserialize_with = "blank_as_none")]
    current_building: Option<String>,
    #[serde(rename = "CURRENT_TOTAL", default, deserialize_with = "blank_as_none")]
    current_total: Option<String>,
    #[serde(
        rename = "ESTIMATED_MARKET_VALUE",
        default,
        deserialize_with = "blank_as_none"
    )]
    estimated_market_value: Option<String>,
    #[serde(rename = "PRIOR_LAND", default, deserialize_with = "blank_as_none")]
    prior_land: Option<String>,
    #[serde(rename = "PRIOR_BUILDING", default, deserialize_with = "blank_as_none")]
    prior_building: Option<String>,
    #[serde(rename = "PRIOR_TOTAL", default, deserialize_with = "blank_as_none")]
    prior_total: Option<String>,

    #[serde(rename = "MULTI_SALE", default, deserialize_with = "blank_as_none")]
    multi_sale: Option<String>,
    #[serde(rename = "DEED_TYPE", default, deserialize_with = "blank_as_none")]
    deed_type: Option<String>,
    #[serde(rename = "SALE_DATE", default, deserialize_with = "blank_as_none")]
    sale_date: Option<String>,
    #[serde(rename = "SALE_AMOUNT", default, deserialize_with = "blank_as_none")]
    sale_amount: Option<String>,

    #[serde(rename = "COMM_UNITS", default, deserialize_with = "blank_as_none")]
    comm_units: Option<String>,
    #[serde(rename = "EXT_DESC", default, deserialize_with = "blank_as_none")]
    ext_desc: Option<String>,
    #[serde(rename = "FULL_BATH", default, deserialize_with = "blank_as_none")]
    full_bath: Option<String>,
    #[serde(rename = "HALF_BATH", default, deserialize_with = "blank_as_none")]
    half_bath: Option<String>,
    #[serde(rename = "BSMT_DESC", default, deserialize_with = "blank_as_none")]
    bsmt_desc: Option<String>,
    #[serde(rename = "ATTIC_DESC", default, deserialize_with = "blank_as_none")]
    attic_desc: Option<String>,
    #[serde(rename = "AC", default, deserialize_with = "blank_as_none")]
    ac: Option<String>,
    #[serde(rename = "FIREPLACE", default, deserialize_with = "blank_as_none")]
    fireplace: Option<String>,
    #[serde(rename = "GAR_DESC", default, deserialize_with = "blank_as_none")]
    gar_desc: Option<String>,
    #[serde(rename = "AGE", default, deserialize_with = "blank_as_none")]
    age: Option<String>,
    #[serde(rename = "BUILDING_SQ_FT", default, deserialize_with = "blank_as_none")]
    building_sq_ft: Option<String>,
    #[serde(rename = "LAND_SQ_FT", default, deserialize_with = "blank_as_none")]
    land_sq_ft: Option<String>,

    #[serde(rename = "REC_TYPE", default, deserialize_with = "blank_as_none")]
    rec_type: Option<String>,
    #[serde(rename = "PIN", default, deserialize_with = "blank_as_none")]
    pin: Option<String>,
    #[serde(rename = "TOWN", default, deserialize_with = "blank_as_none")]
    town: Option<String>,
    #[serde(rename = "VOLUME", default, deserialize_with = "blank_as_none")]
    volume: Option<String>,
    #[serde(rename = "LOC", default, deserialize_with = "blank_as_none")]
    loc: Option<String>,
    #[serde(rename = "TAX_CODE", default, deserialize_with = "blank_as_none")]
    tax_code: Option<String>,
    #[serde(rename = "NEIGHBORHOOD", default, deserialize_with = "blank_as_none")]
    neighborhood: Option<String>,
}

impl AssessorRow {
    pub(crate) fn into_submission(self) -> Result<PropertySubmission, CellError> {
        let address = PropertyAddress {
            longitude: parse_float("Longitude", self.longitude)?,
            latitude: parse_float("Latitude", self.latitude)?,
            zip: self.zip,
            house_no: self.house_no.unwrap_or_default(),
            dir: self.dir,
            street: self.street.unwrap_or_default(),
            suffix: self.suffix,
            apt: self.apt,
            city: self.city.unwrap_or_default(),
        };

        Ok(PropertySubmission {
            address,
            classification: Some(ClassificationFields {
                ovacls: parse_integer("OVACLS", self.ovacls)?,
                class_description: self.class_description,
                res_type: self.res_type,
                bldg_use: self.bldg_use,
                apt_desc: self.apt_desc,
            }),
            assessment: Some(AssessmentFields {
                current_land: parse_integer("CURRENT_LAND", self.current_land)?,
                current_building: parse_integer("CURRENT_BUILDING", self.current_building)?,
                current_total: parse_integer("CURRENT_TOTAL", self.current_total)?,
                estimated_market_value: parse_integer(
                    "ESTIMATED_MARKET_VALUE",
                    self.estimated_market_value,
                )?,
                prior_land: parse_integer("PRIOR_LAND", self.prior_land)?,
                prior_building: parse_integer("PRIOR_BUILDING", self.prior_building)?,
                prior_total: parse_integer("PRIOR_TOTAL", self.prior_total)?,
            }),
            sales_appeal: Some(SalesAppealFields {
                multi_sale: parse_flag("MULTI_SALE", self.multi_sale)?,
                deed_type: parse_integer("DEED_TYPE", self.deed_type)?,
                sale_date: parse_date("SALE_DATE", self.sale_date)?,
                sale_amount: parse_integer("SALE_AMOUNT", self.sale_amount)?,
            }),
            feature: Some(FeatureFields {
                comm_units: parse_integer("COMM_UNITS", self.comm_units)?,
                ext_desc: self.ext_desc,
                full_bath: parse_integer("FULL_BATH", self.full_bath)?,
                half_bath: parse_integer("HALF_BATH", self.half_bath)?,
                bsmt_desc: self.bsmt_desc,
                attic_desc: self.attic_desc,
                ac: parse_integer("AC", self.ac)?,
                fireplace: parse_integer("FIREPLACE", self.fireplace)?,
                gar_desc: self.gar_desc,
                age: parse_integer("AGE", self.age)?,
                building_sq_ft: parse_integer("BUILDING_SQ_FT", self.building_sq_ft)?,
                land_sq_ft: parse_integer("LAND_SQ_FT", self.land_sq_ft)?,
            }),
            misc_info: Some(MiscInfoFields {
                rec_type: self.rec_type,
                pin: parse_integer("PIN", self.pin)?,
                town: parse_integer("TOWN", self.town)?,
                volume: parse_integer("VOLUME", self.volume)?,
                loc: self.loc,
                tax_code: parse_integer("TAX_CODE", self.tax_code)?,
                neighborhood: parse_integer("NEIGHBORHOOD", self.neighborhood)?,
            }),
        })
    }
}

/// Empty cells and spreadsheet `nan` placeholders both read as missing.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| {
        let trimmed = value.trim();
        !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case("nan")
    }))
}

fn invalid(column: &'static str, value: &str, expected: &'static str) -> CellError {
    CellError {
        column,
        value: value.to_string(),
        expected,
    }
}

/// Accepts thousands separators, a leading `$`, and whole-valued decimals such as `1500.0`.
fn parse_integer(column: &'static str, value: Option<String>) -> Result<Option<i64>, CellError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, ',' | '$'))
        .collect();

    if let Ok(number) = cleaned.parse::<i64>() {
        return Ok(Some(number));
    }
    match cleaned.parse::<f64>() {
        Ok(number)
            if number.is_finite()
                && number.fract() == 0.0
                && number.abs() < i64::MAX as f64 =>
        {
            Ok(Some(number as i64))
        }
        _ => Err(invalid(column, &raw, "integer")),
    }
}

fn parse_float(column: &'static str, value: Option<String>) -> Result<Option<f64>, CellError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    match raw.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(Some(number)),
        _ => Err(invalid(column, &raw, "number")),
    }
}

fn parse_flag(column: &'static str, value: Option<String>) -> Result<Option<bool>, CellError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" | "1" | "1.0" => Ok(Some(true)),
        "n" | "no" | "false" | "0" | "0.0" => Ok(Some(false)),
        _ => Err(invalid(column, &raw, "yes/no flag")),
    }
}

fn parse_date(column: &'static str, value: Option<String>) -> Result<Option<NaiveDate>, CellError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let trimmed = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(Some(dt.date_naive()));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Ok(Some(dt.date()));
    }
    for format in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(Some(date));
        }
    }

    Err(invalid(column, &raw, "date"))
}
