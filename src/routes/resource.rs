//! Resource and report routes under `/api`.

use crate::handlers::reports::{
    student_subjects, teacher_subjects, teachers_of_bottom_students, teachers_of_top_students,
    top_students_by_subject_mark,
};
use crate::handlers::resource::{create, delete, list, read, update};
use crate::resources::{City, Department, Resource, Student, StudentSubject, Subject, Teacher, TeacherSubject};
use crate::state::AppState;
use axum::{routing::get, Router};

pub const API_PREFIX: &str = "/api";

/// List/create at `base`, read/update/delete at `base/:id`.
fn with_resource<R: Resource>(router: Router<AppState>, base: &str) -> Router<AppState> {
    let base = format!("{}{}", API_PREFIX, base);
    router
        .route(&base, get(list::<R>).post(create::<R>))
        .route(
            &format!("{}/:id", base),
            get(read::<R>).put(update::<R>).delete(delete::<R>),
        )
}

pub fn resource_routes(state: AppState) -> Router {
    let router = Router::new();
    let router = with_resource::<City>(router, "/cities");
    let router = with_resource::<Department>(router, "/departments");
    let router = with_resource::<Student>(router, "/students");
    let router = with_resource::<Teacher>(router, "/teachers");
    let router = with_resource::<Subject>(router, "/subjects");
    let router = with_resource::<StudentSubject>(router, "/studentsubjects");
    let router = with_resource::<TeacherSubject>(router, "/teachersubjects");
    router
        .route("/api/students/top10bysubjectmark", get(top_students_by_subject_mark))
        .route("/api/students/:id/subjects", get(student_subjects))
        .route("/api/teachers/:id/subjects", get(teacher_subjects))
        .route("/api/teachers/top5highestmarks", get(teachers_of_top_students))
        .route("/api/teachers/top5lowestmarks", get(teachers_of_bottom_students))
        .with_state(state)
}
