//! SQLite-backed [`PropertyRepository`] built on an sqlx connection pool.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tracing::{debug, info};

use super::domain::{
    join_address, Assessment, AssessmentFields, Classification, ClassificationFields, Dependent,
    Feature, FeatureFields, MiscInfo, MiscInfoFields, NewDependent, Property, PropertyAddress,
    PropertyDetail, PropertyId, PropertyListing, PropertySubmission, SalesAppeal,
    SalesAppealFields,
};
use super::pagination::PageRequest;
use super::query::{listing_query, Predicate};
use super::ranges::AggregateBounds;
use super::repository::{PropertyRepository, RepositoryError};
use crate::config::DatabaseConfig;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS properties (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        longitude REAL,
        latitude REAL,
        zip TEXT,
        house_no TEXT NOT NULL,
        dir TEXT,
        street TEXT NOT NULL,
        suffix TEXT,
        apt TEXT,
        city TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS property_classifications (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        property_id INTEGER NOT NULL REFERENCES properties(id),
        ovacls INTEGER,
        class_description TEXT,
        res_type TEXT,
        bldg_use TEXT,
        apt_desc TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS assessments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        property_id INTEGER NOT NULL REFERENCES properties(id),
        current_land INTEGER,
        current_building INTEGER,
        current_total INTEGER,
        estimated_market_value INTEGER,
        prior_land INTEGER,
        prior_building INTEGER,
        prior_total INTEGER
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sales_appeals (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        property_id INTEGER NOT NULL REFERENCES properties(id),
        multi_sale BOOLEAN,
        deed_type INTEGER,
        sale_date DATE,
        sale_amount INTEGER
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS property_features (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        property_id INTEGER NOT NULL REFERENCES properties(id),
        comm_units INTEGER,
        ext_desc TEXT,
        full_bath INTEGER,
        half_bath INTEGER,
        bsmt_desc TEXT,
        attic_desc TEXT,
        ac INTEGER,
        fireplace INTEGER,
        gar_desc TEXT,
        age INTEGER,
        building_sq_ft INTEGER,
        land_sq_ft INTEGER
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS misc_info (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        property_id INTEGER NOT NULL REFERENCES properties(id),
        rec_type TEXT,
        pin INTEGER,
        town INTEGER,
        volume INTEGER,
        loc TEXT,
        tax_code INTEGER,
        neighborhood INTEGER
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_classifications_property ON property_classifications(property_id)",
    "CREATE INDEX IF NOT EXISTS idx_assessments_property ON assessments(property_id)",
    "CREATE INDEX IF NOT EXISTS idx_sales_appeals_property ON sales_appeals(property_id)",
    "CREATE INDEX IF NOT EXISTS idx_features_property ON property_features(property_id)",
    "CREATE INDEX IF NOT EXISTS idx_misc_info_property ON misc_info(property_id)",
];

/// Record store over a pooled SQLite database.
#[derive(Debug, Clone)]
pub struct SqlitePropertyRepository {
    pool: SqlitePool,
}

impl SqlitePropertyRepository {
    /// Connects to the configured database and creates any missing tables.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await?;

        info!(url = %config.url, "connected to property store");
        Self::with_pool(pool).await
    }

    /// A private in-memory database held on a single long-lived connection.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::new()
            .in_memory(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        let repository = Self { pool };
        repository.create_schema().await?;
        Ok(repository)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn create_schema(&self) -> Result<(), sqlx::Error> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!(statements = SCHEMA.len(), "property schema ensured");
        Ok(())
    }

    async fn bounds(&self, sql: &'static str) -> Result<AggregateBounds, RepositoryError> {
        let (min, max): (Option<i64>, Option<i64>) =
            sqlx::query_as(sql).fetch_one(&self.pool).await?;
        Ok(AggregateBounds { min, max })
    }
}

#[async_trait]
impl PropertyRepository for SqlitePropertyRepository {
    async fn insert(&self, submission: PropertySubmission) -> Result<Property, RepositoryError> {
        let PropertySubmission {
            address,
            classification,
            assessment,
            sales_appeal,
            feature,
            misc_info,
        } = submission;

        let mut tx = self.pool.begin().await?;
        let property = insert_property(&mut *tx, address).await?;

        let sections = [
            classification.map(NewDependent::from),
            assessment.map(NewDependent::from),
            sales_appeal.map(NewDependent::from),
            feature.map(NewDependent::from),
            misc_info.map(NewDependent::from),
        ];
        for dependent in sections.into_iter().flatten() {
            insert_dependent_row(&mut *tx, property.id, dependent).await?;
        }

        tx.commit().await?;
        Ok(property)
    }

    async fn insert_dependent(
        &self,
        property_id: PropertyId,
        dependent: NewDependent,
    ) -> Result<Dependent, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        if fetch_property(&mut *tx, property_id).await?.is_none() {
            return Err(RepositoryError::MissingProperty(property_id));
        }
        let stored = insert_dependent_row(&mut *tx, property_id, dependent).await?;
        tx.commit().await?;
        Ok(stored)
    }

    async fn fetch(&self, id: PropertyId) -> Result<Option<PropertyDetail>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let Some(property) = fetch_property(&mut *conn, id).await? else {
            return Ok(None);
        };

        Ok(Some(PropertyDetail {
            property,
            classification: fetch_dependent(&mut *conn, "property_classifications", id).await?,
            assessment: fetch_dependent(&mut *conn, "assessments", id).await?,
            sales_appeal: fetch_dependent(&mut *conn, "sales_appeals", id).await?,
            feature: fetch_dependent(&mut *conn, "property_features", id).await?,
            misc_info: fetch_dependent(&mut *conn, "misc_info", id).await?,
        }))
    }

    async fn listings(
        &self,
        predicates: &[Predicate],
        page: PageRequest,
    ) -> Result<Vec<PropertyListing>, RepositoryError> {
        let mut builder = listing_query(predicates, page);
        let rows = builder
            .build_query_as::<ListingRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(PropertyListing::from).collect())
    }

    async fn market_value_bounds(&self) -> Result<AggregateBounds, RepositoryError> {
        self.bounds(
            "SELECT MIN(estimated_market_value), MAX(estimated_market_value) FROM assessments",
        )
        .await
    }

    async fn square_footage_bounds(&self) -> Result<AggregateBounds, RepositoryError> {
        self.bounds("SELECT MIN(building_sq_ft), MAX(building_sq_ft) FROM property_features")
            .await
    }
}

#[derive(Debug, FromRow)]
struct ListingRow {
    id: PropertyId,
    house_no: Option<String>,
    dir: Option<String>,
    street: Option<String>,
    suffix: Option<String>,
    apt: Option<String>,
    city: Option<String>,
    longitude: Option<f64>,
    latitude: Option<f64>,
    class_description: Option<String>,
    bldg_use: Option<String>,
    estimated_market_value: Option<i64>,
    building_sq_ft: Option<i64>,
}

impl From<ListingRow> for PropertyListing {
    fn from(row: ListingRow) -> Self {
        let full_address = join_address([
            row.house_no.as_deref(),
            row.dir.as_deref(),
            row.street.as_deref(),
            row.suffix.as_deref(),
            row.apt.as_deref(),
            row.city.as_deref(),
        ]);
        Self {
            id: row.id,
            full_address,
            longitude: row.longitude,
            latitude: row.latitude,
            class_description: row.class_description,
            estimated_market_value: row.estimated_market_value,
            building_sq_ft: row.building_sq_ft,
            bldg_use: row.bldg_use,
        }
    }
}

async fn insert_property(
    conn: &mut SqliteConnection,
    address: PropertyAddress,
) -> Result<Property, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO properties (longitude, latitude, zip, house_no, dir, street, suffix, apt, city)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(address.longitude)
    .bind(address.latitude)
    .bind(&address.zip)
    .bind(&address.house_no)
    .bind(&address.dir)
    .bind(&address.street)
    .bind(&address.suffix)
    .bind(&address.apt)
    .bind(&address.city)
    .execute(&mut *conn)
    .await?;

    Ok(Property {
        id: PropertyId(result.last_insert_rowid()),
        address,
    })
}

async fn fetch_property(
    conn: &mut SqliteConnection,
    id: PropertyId,
) -> Result<Option<Property>, sqlx::Error> {
    sqlx::query_as::<_, Property>(
        "SELECT id, longitude, latitude, zip, house_no, dir, street, suffix, apt, city \
         FROM properties WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
}

/// First row of a dependent table for the property, if any.
async fn fetch_dependent<T>(
    conn: &mut SqliteConnection,
    table: &'static str,
    property_id: PropertyId,
) -> Result<Option<T>, sqlx::Error>
where
    T: for<'r> FromRow<'r, sqlx::sqlite::SqliteRow> + Send + Unpin,
{
    let sql = format!("SELECT * FROM {table} WHERE property_id = ? ORDER BY id LIMIT 1");
    sqlx::query_as::<_, T>(&sql)
        .bind(property_id)
        .fetch_optional(&mut *conn)
        .await
}

async fn insert_dependent_row(
    conn: &mut SqliteConnection,
    property_id: PropertyId,
    dependent: NewDependent,
) -> Result<Dependent, sqlx::Error> {
    let kind = dependent.kind();
    let stored = match dependent {
        NewDependent::Classification(fields) => {
            Dependent::Classification(insert_classification(conn, property_id, fields).await?)
        }
        NewDependent::Assessment(fields) => {
            Dependent::Assessment(insert_assessment(conn, property_id, fields).await?)
        }
        NewDependent::SalesAppeal(fields) => {
            Dependent::SalesAppeal(insert_sales_appeal(conn, property_id, fields).await?)
        }
        NewDependent::Feature(fields) => {
            Dependent::Feature(insert_feature(conn, property_id, fields).await?)
        }
        NewDependent::MiscInfo(fields) => {
            Dependent::MiscInfo(insert_misc_info(conn, property_id, fields).await?)
        }
    };
    debug!(%property_id, kind, "dependent row written");
    Ok(stored)
}

async fn insert_classification(
    conn: &mut SqliteConnection,
    property_id: PropertyId,
    fields: ClassificationFields,
) -> Result<Classification, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO property_classifications
            (property_id, ovacls, class_description, res_type, bldg_use, apt_desc)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(property_id)
    .bind(fields.ovacls)
    .bind(&fields.class_description)
    .bind(&fields.res_type)
    .bind(&fields.bldg_use)
    .bind(&fields.apt_desc)
    .execute(&mut *conn)
    .await?;

    Ok(Classification {
        id: result.last_insert_rowid(),
        property_id,
        fields,
    })
}

async fn insert_assessment(
    conn: &mut SqliteConnection,
    property_id: PropertyId,
    fields: AssessmentFields,
) -> Result<Assessment, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO assessments
            (property_id, current_land, current_building, current_total,
             estimated_market_value, prior_land, prior_building, prior_total)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(property_id)
    .bind(fields.current_land)
    .bind(fields.current_building)
    .bind(fields.current_total)
    .bind(fields.estimated_market_value)
    .bind(fields.prior_land)
    .bind(fields.prior_building)
    .bind(fields.prior_total)
    .execute(&mut *conn)
    .await?;

    Ok(Assessment {
        id: result.last_insert_rowid(),
        property_id,
        fields,
    })
}

async fn insert_sales_appeal(
    conn: &mut SqliteConnection,
    property_id: PropertyId,
    fields: SalesAppealFields,
) -> Result<SalesAppeal, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO sales_appeals (property_id, multi_sale, deed_type, sale_date, sale_amount)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(property_id)
    .bind(fields.multi_sale)
    .bind(fields.deed_type)
    .bind(fields.sale_date)
    .bind(fields.sale_amount)
    .execute(&mut *conn)
    .await?;

    Ok(SalesAppeal {
        id: result.last_insert_rowid(),
        property_id,
        fields,
    })
}

async fn insert_feature(
    conn: &mut SqliteConnection,
    property_id: PropertyId,
    fields: FeatureFields,
) -> Result<Feature, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO property_features
            (property_id, comm_units, ext_desc, full_bath, half_bath, bsmt_desc, attic_desc,
             ac, fireplace, gar_desc, age, building_sq_ft, land_sq_ft)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(property_id)
    .bind(fields.comm_units)
    .bind(&fields.ext_desc)
    .bind(fields.full_bath)
    .bind(fields.half_bath)
    .bind(&fields.bsmt_desc)
    .bind(&fields.attic_desc)
    .bind(fields.ac)
    .bind(fields.fireplace)
    .bind(&fields.gar_desc)
    .bind(fields.age)
    .bind(fields.building_sq_ft)
    .bind(fields.land_sq_ft)
    .execute(&mut *conn)
    .await?;

    Ok(Feature {
        id: result.last_insert_rowid(),
        property_id,
        fields,
    })
}

async fn insert_misc_info(
    conn: &mut SqliteConnection,
    property_id: PropertyId,
    fields: MiscInfoFields,
) -> Result<MiscInfo, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO misc_info
            (property_id, rec_type, pin, town, volume, loc, tax_code, neighborhood)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(property_id)
    .bind(&fields.rec_type)
    .bind(fields.pin)
    .bind(fields.town)
    .bind(fields.volume)
    .bind(&fields.loc)
    .bind(fields.tax_code)
    .bind(fields.neighborhood)
    .execute(&mut *conn)
    .await?;

    Ok(MiscInfo {
        id: result.last_insert_rowid(),
        property_id,
        fields,
    })
}
