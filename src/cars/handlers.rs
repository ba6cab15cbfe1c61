use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    cars::dto::{CreateCarRequest, UpdateCarRequest},
    cars::repo::Car,
    error::{ApiError, ApiJson},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/cars", get(list_cars))
        .route("/cars/available", get(list_available_cars))
        .route("/cars/:id", get(get_car))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/cars", post(create_car))
        .route("/cars/:id", put(update_car).delete(delete_car))
}

fn car_not_found() -> ApiError {
    ApiError::NotFound("Car not found".into())
}

#[instrument(skip(state))]
pub async fn list_cars(State(state): State<AppState>) -> Result<Json<Vec<Car>>, ApiError> {
    let cars = Car::list(&state.db).await?;
    Ok(Json(cars))
}

#[instrument(skip(state))]
pub async fn list_available_cars(
    State(state): State<AppState>,
) -> Result<Json<Vec<Car>>, ApiError> {
    let cars = Car::list_available(&state.db).await?;
    Ok(Json(cars))
}

#[instrument(skip(state))]
pub async fn get_car(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Car>, ApiError> {
    let car = Car::get(&state.db, id).await?.ok_or_else(car_not_found)?;
    Ok(Json(car))
}

#[instrument(skip(state, user, payload))]
pub async fn create_car(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateCarRequest>,
) -> Result<(StatusCode, Json<Car>), ApiError> {
    let new_car = payload.into_new_car()?;
    let car = Car::insert(&state.db, &new_car).await?;
    info!(car_id = %car.id, user_id = %user.user_id, "car created");
    Ok((StatusCode::CREATED, Json(car)))
}

#[instrument(skip(state, user, payload))]
pub async fn update_car(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<UpdateCarRequest>,
) -> Result<Json<Car>, ApiError> {
    let changes = payload.into_changes()?;
    let car = Car::update(&state.db, id, &changes)
        .await?
        .ok_or_else(car_not_found)?;
    info!(car_id = %car.id, user_id = %user.user_id, "car updated");
    Ok(Json(car))
}

#[instrument(skip(state, user))]
pub async fn delete_car(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !Car::delete(&state.db, id).await? {
        return Err(car_not_found());
    }
    info!(car_id = %id, user_id = %user.user_id, "car deleted");
    Ok(Json(json!({ "message": "Car deleted successfully" })))
}
