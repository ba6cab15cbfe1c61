use serde::Deserialize;

use crate::cars::repo::{CarChanges, CarStatus, NewCar};
use crate::error::ApiError;

/// Create body. Every field is optional so absent, empty and zero values
/// all land on the same missing-fields answer, matching what the SPA sends
/// for cleared inputs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCarRequest {
    pub model: Option<String>,
    #[serde(rename = "type")]
    pub car_type: Option<String>,
    pub year: Option<i32>,
    pub daily_rate: Option<f64>,
    pub status: Option<CarStatus>,
    pub description: Option<String>,
}

impl CreateCarRequest {
    pub fn into_new_car(self) -> Result<NewCar, ApiError> {
        let model = self.model.filter(|v| !v.is_empty());
        let car_type = self.car_type.filter(|v| !v.is_empty());
        let year = self.year.filter(|v| *v != 0);
        let daily_rate = self.daily_rate.filter(|v| *v != 0.0);

        let (Some(model), Some(car_type), Some(year), Some(daily_rate), Some(status)) =
            (model, car_type, year, daily_rate, self.status)
        else {
            return Err(ApiError::Validation("Missing required car fields".into()));
        };

        Ok(NewCar {
            model,
            car_type,
            year,
            daily_rate,
            status,
            description: self.description.unwrap_or_default(),
        })
    }
}

/// Update body. Omitted fields keep their stored values; `model` and `type`
/// may not be blanked because the schema requires them.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCarRequest {
    pub model: Option<String>,
    #[serde(rename = "type")]
    pub car_type: Option<String>,
    pub year: Option<i32>,
    pub daily_rate: Option<f64>,
    pub status: Option<CarStatus>,
    pub description: Option<String>,
}

impl UpdateCarRequest {
    pub fn into_changes(self) -> Result<CarChanges, ApiError> {
        if matches!(self.model.as_deref(), Some(""))
            || matches!(self.car_type.as_deref(), Some(""))
        {
            return Err(ApiError::Validation("Car validation failed".into()));
        }
        Ok(CarChanges {
            model: self.model,
            car_type: self.car_type,
            year: self.year,
            daily_rate: self.daily_rate,
            status: self.status,
            description: self.description,
        })
    }
}
