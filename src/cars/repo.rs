use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Rental state, stored as the `car_status` enum in Postgres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "car_status")]
pub enum CarStatus {
    Available,
    Rented,
    Maintenance,
}

/// Car record. Serializes with the field names the SPA binds to, so
/// `car_type` goes over the wire as `type` and timestamps as RFC 3339.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: Uuid,
    pub model: String,
    #[serde(rename = "type")]
    pub car_type: String,
    pub year: i32,
    pub daily_rate: f64,
    pub status: CarStatus,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated input for an insert.
#[derive(Debug)]
pub struct NewCar {
    pub model: String,
    pub car_type: String,
    pub year: i32,
    pub daily_rate: f64,
    pub status: CarStatus,
    pub description: String,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct CarChanges {
    pub model: Option<String>,
    pub car_type: Option<String>,
    pub year: Option<i32>,
    pub daily_rate: Option<f64>,
    pub status: Option<CarStatus>,
    pub description: Option<String>,
}

impl Car {
    pub async fn list(db: &PgPool) -> sqlx::Result<Vec<Car>> {
        sqlx::query_as::<_, Car>(
            r#"
            SELECT id, model, car_type, year, daily_rate, status, description,
                   created_at, updated_at
            FROM cars
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(db)
        .await
    }

    pub async fn list_available(db: &PgPool) -> sqlx::Result<Vec<Car>> {
        sqlx::query_as::<_, Car>(
            r#"
            SELECT id, model, car_type, year, daily_rate, status, description,
                   created_at, updated_at
            FROM cars
            WHERE status = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(CarStatus::Available)
        .fetch_all(db)
        .await
    }

    pub async fn get(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Car>> {
        sqlx::query_as::<_, Car>(
            r#"
            SELECT id, model, car_type, year, daily_rate, status, description,
                   created_at, updated_at
            FROM cars
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn insert(db: &PgPool, new: &NewCar) -> sqlx::Result<Car> {
        sqlx::query_as::<_, Car>(
            r#"
            INSERT INTO cars (model, car_type, year, daily_rate, status, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, model, car_type, year, daily_rate, status, description,
                      created_at, updated_at
            "#,
        )
        .bind(&new.model)
        .bind(&new.car_type)
        .bind(new.year)
        .bind(new.daily_rate)
        .bind(new.status)
        .bind(&new.description)
        .fetch_one(db)
        .await
    }

    /// Returns the updated row, or `None` when the id does not exist.
    pub async fn update(db: &PgPool, id: Uuid, changes: &CarChanges) -> sqlx::Result<Option<Car>> {
        sqlx::query_as::<_, Car>(
            r#"
            UPDATE cars
            SET model = COALESCE($2, model),
                car_type = COALESCE($3, car_type),
                year = COALESCE($4, year),
                daily_rate = COALESCE($5, daily_rate),
                status = COALESCE($6, status),
                description = COALESCE($7, description),
                updated_at = now()
            WHERE id = $1
            RETURNING id, model, car_type, year, daily_rate, status, description,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&changes.model)
        .bind(&changes.car_type)
        .bind(changes.year)
        .bind(changes.daily_rate)
        .bind(changes.status)
        .bind(&changes.description)
        .fetch_optional(db)
        .await
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM cars WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn car_serializes_with_spa_field_names() {
        let car = Car {
            id: Uuid::new_v4(),
            model: "Civic".into(),
            car_type: "Sedan".into(),
            year: 2022,
            daily_rate: 40.0,
            status: CarStatus::Available,
            description: String::new(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };

        let value = serde_json::to_value(&car).expect("serialize");
        assert_eq!(value["type"], "Sedan");
        assert_eq!(value["dailyRate"], 40.0);
        assert_eq!(value["status"], "Available");
        assert_eq!(value["createdAt"], "1970-01-01T00:00:00Z");
        assert!(value.get("car_type").is_none());
    }

    #[test]
    fn status_rejects_unknown_values() {
        let err = serde_json::from_str::<CarStatus>("\"Scrapped\"");
        assert!(err.is_err());
    }
}
