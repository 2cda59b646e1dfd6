use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Identifier wrapper for stored properties.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct PropertyId(pub i64);

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parcel address record every dependent row hangs off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Property {
    pub id: PropertyId,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub address: PropertyAddress,
}

/// Address and coordinates supplied when a property is created.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PropertyAddress {
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub zip: Option<String>,
    pub house_no: String,
    #[serde(default)]
    pub dir: Option<String>,
    pub street: String,
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(default)]
    pub apt: Option<String>,
    pub city: String,
}

impl PropertyAddress {
    /// Non-empty address components joined by single spaces.
    pub fn full_address(&self) -> String {
        join_address([
            Some(self.house_no.as_str()),
            self.dir.as_deref(),
            Some(self.street.as_str()),
            self.suffix.as_deref(),
            self.apt.as_deref(),
            Some(self.city.as_str()),
        ])
    }
}

pub(crate) fn join_address<'a>(parts: impl IntoIterator<Item = Option<&'a str>>) -> String {
    parts
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Creation payload: the address plus any dependent sections written alongside it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertySubmission {
    #[serde(flatten)]
    pub address: PropertyAddress,
    #[serde(default)]
    pub classification: Option<ClassificationFields>,
    #[serde(default)]
    pub assessment: Option<AssessmentFields>,
    #[serde(default)]
    pub sales_appeal: Option<SalesAppealFields>,
    #[serde(default)]
    pub feature: Option<FeatureFields>,
    #[serde(default)]
    pub misc_info: Option<MiscInfoFields>,
}

impl PropertySubmission {
    pub fn new(address: PropertyAddress) -> Self {
        Self {
            address,
            ..Self::default()
        }
    }

    /// Rejects submissions whose required address parts are blank.
    pub fn validate(&self) -> Result<(), SubmissionError> {
        for (field, value) in [
            ("house_no", &self.address.house_no),
            ("street", &self.address.street),
            ("city", &self.address.city),
        ] {
            if value.trim().is_empty() {
                return Err(SubmissionError::BlankField(field));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("{0} must not be blank")]
    BlankField(&'static str),
}

/// Assessor use/type coding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct ClassificationFields {
    pub ovacls: Option<i64>,
    pub class_description: Option<String>,
    pub res_type: Option<String>,
    pub bldg_use: Option<String>,
    pub apt_desc: Option<String>,
}

/// Valuation figures for the current and prior assessment years.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct AssessmentFields {
    pub current_land: Option<i64>,
    pub current_building: Option<i64>,
    pub current_total: Option<i64>,
    pub estimated_market_value: Option<i64>,
    pub prior_land: Option<i64>,
    pub prior_building: Option<i64>,
    pub prior_total: Option<i64>,
}

/// Most recent sale and appeal data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct SalesAppealFields {
    pub multi_sale: Option<bool>,
    pub deed_type: Option<i64>,
    pub sale_date: Option<NaiveDate>,
    pub sale_amount: Option<i64>,
}

/// Physical characteristics of the parcel and building.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct FeatureFields {
    pub comm_units: Option<i64>,
    pub ext_desc: Option<String>,
    pub full_bath: Option<i64>,
    pub half_bath: Option<i64>,
    pub bsmt_desc: Option<String>,
    pub attic_desc: Option<String>,
    pub ac: Option<i64>,
    pub fireplace: Option<i64>,
    pub gar_desc: Option<String>,
    pub age: Option<i64>,
    pub building_sq_ft: Option<i64>,
    pub land_sq_ft: Option<i64>,
}

/// Tax and parcel bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct MiscInfoFields {
    pub rec_type: Option<String>,
    pub pin: Option<i64>,
    pub town: Option<i64>,
    pub volume: Option<i64>,
    pub loc: Option<String>,
    pub tax_code: Option<i64>,
    pub neighborhood: Option<i64>,
}

macro_rules! dependent_record {
    ($(#[$meta:meta])* $name:ident, $fields:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
        pub struct $name {
            pub id: i64,
            pub property_id: PropertyId,
            #[sqlx(flatten)]
            #[serde(flatten)]
            pub fields: $fields,
        }
    };
}

dependent_record!(
    /// Stored classification row.
    Classification,
    ClassificationFields
);
dependent_record!(
    /// Stored assessment row.
    Assessment,
    AssessmentFields
);
dependent_record!(
    /// Stored sales/appeal row.
    SalesAppeal,
    SalesAppealFields
);
dependent_record!(
    /// Stored feature row.
    Feature,
    FeatureFields
);
dependent_record!(
    /// Stored misc-info row.
    MiscInfo,
    MiscInfoFields
);

/// A dependent section to attach to an existing property.
#[derive(Debug, Clone, PartialEq)]
pub enum NewDependent {
    Classification(ClassificationFields),
    Assessment(AssessmentFields),
    SalesAppeal(SalesAppealFields),
    Feature(FeatureFields),
    MiscInfo(MiscInfoFields),
}

impl NewDependent {
    pub const fn kind(&self) -> &'static str {
        match self {
            NewDependent::Classification(_) => "classification",
            NewDependent::Assessment(_) => "assessment",
            NewDependent::SalesAppeal(_) => "sales_appeal",
            NewDependent::Feature(_) => "feature",
            NewDependent::MiscInfo(_) => "misc_info",
        }
    }
}

impl From<ClassificationFields> for NewDependent {
    fn from(value: ClassificationFields) -> Self {
        Self::Classification(value)
    }
}

impl From<AssessmentFields> for NewDependent {
    fn from(value: AssessmentFields) -> Self {
        Self::Assessment(value)
    }
}

impl From<SalesAppealFields> for NewDependent {
    fn from(value: SalesAppealFields) -> Self {
        Self::SalesAppeal(value)
    }
}

impl From<FeatureFields> for NewDependent {
    fn from(value: FeatureFields) -> Self {
        Self::Feature(value)
    }
}

impl From<MiscInfoFields> for NewDependent {
    fn from(value: MiscInfoFields) -> Self {
        Self::MiscInfo(value)
    }
}

/// A stored dependent row, serialized as the row itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Dependent {
    Classification(Classification),
    Assessment(Assessment),
    SalesAppeal(SalesAppeal),
    Feature(Feature),
    MiscInfo(MiscInfo),
}

/// A property with whichever dependent sections exist for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyDetail {
    pub property: Property,
    pub classification: Option<Classification>,
    pub assessment: Option<Assessment>,
    pub sales_appeal: Option<SalesAppeal>,
    pub feature: Option<Feature>,
    pub misc_info: Option<MiscInfo>,
}

/// One row of the filtered listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyListing {
    pub id: PropertyId,
    pub full_address: String,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub class_description: Option<String>,
    pub estimated_market_value: Option<i64>,
    pub building_sq_ft: Option<i64>,
    pub bldg_use: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> PropertyAddress {
        PropertyAddress {
            longitude: Some(-87.62),
            latitude: Some(41.88),
            zip: Some("60601".to_string()),
            house_no: "123".to_string(),
            dir: Some("N".to_string()),
            street: "Main".to_string(),
            suffix: Some("St".to_string()),
            apt: None,
            city: "Chicago".to_string(),
        }
    }

    #[test]
    fn full_address_skips_missing_components() {
        assert_eq!(address().full_address(), "123 N Main St Chicago");

        let mut sparse = address();
        sparse.dir = Some("  ".to_string());
        sparse.suffix = None;
        sparse.apt = Some("2B".to_string());
        assert_eq!(sparse.full_address(), "123 Main 2B Chicago");
    }

    #[test]
    fn validate_rejects_blank_street() {
        let mut submission = PropertySubmission::new(address());
        assert!(submission.validate().is_ok());

        submission.address.street = "   ".to_string();
        assert_eq!(
            submission.validate(),
            Err(SubmissionError::BlankField("street"))
        );
    }

    #[test]
    fn submission_deserializes_flat_address_with_nested_sections() {
        let payload = serde_json::json!({
            "house_no": "123",
            "street": "Main",
            "city": "Chicago",
            "assessment": { "estimated_market_value": 250000 },
            "sales_appeal": { "sale_date": "2021-06-30", "multi_sale": false }
        });

        let submission: PropertySubmission =
            serde_json::from_value(payload).expect("submission parses");
        assert_eq!(submission.address.house_no, "123");
        assert!(submission.address.zip.is_none());
        assert_eq!(
            submission
                .assessment
                .as_ref()
                .and_then(|a| a.estimated_market_value),
            Some(250_000)
        );
        assert_eq!(
            submission.sales_appeal.and_then(|s| s.sale_date),
            NaiveDate::from_ymd_opt(2021, 6, 30)
        );
        assert!(submission.classification.is_none());
    }

    #[test]
    fn dependent_serializes_as_flat_row() {
        let dependent = Dependent::Feature(Feature {
            id: 7,
            property_id: PropertyId(3),
            fields: FeatureFields {
                building_sq_ft: Some(1500),
                ..FeatureFields::default()
            },
        });

        let value = serde_json::to_value(&dependent).expect("serializes");
        assert_eq!(value["id"], 7);
        assert_eq!(value["property_id"], 3);
        assert_eq!(value["building_sq_ft"], 1500);
    }
}
