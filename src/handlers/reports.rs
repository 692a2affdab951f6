//! Report handlers: name listings for students and teachers.

use crate::error::AppError;
use crate::handlers::resource::parse_id;
use crate::query::QueryMap;
use crate::response::success_one_ok;
use crate::service::{Rank, ReportService};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use std::collections::HashMap;

pub async fn top_students_by_subject_mark(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let q = QueryMap::from_pairs(params);
    let subject_id = q
        .parse::<i64>("SubjectId")?
        .ok_or_else(|| AppError::BadRequest("SubjectId is required".into()))?;
    let names = ReportService::top_students_by_subject_mark(state.store.as_ref(), subject_id).await?;
    Ok(success_one_ok(names))
}

pub async fn student_subjects(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let names = ReportService::subjects_of_student(state.store.as_ref(), id).await?;
    Ok(success_one_ok(names))
}

pub async fn teacher_subjects(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let names = ReportService::subjects_of_teacher(state.store.as_ref(), id).await?;
    Ok(success_one_ok(names))
}

pub async fn teachers_of_top_students(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let names = ReportService::teachers_of_ranked_students(state.store.as_ref(), Rank::Highest).await?;
    Ok(success_one_ok(names))
}

pub async fn teachers_of_bottom_students(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let names = ReportService::teachers_of_ranked_students(state.store.as_ref(), Rank::Lowest).await?;
    Ok(success_one_ok(names))
}
