//! OpenAPI document for the resource models and envelopes.

use crate::error::ErrorBody;
use crate::query::PageMeta;
use crate::resources::{City, Department, Gender, Student, StudentSubject, Subject, Teacher, TeacherSubject};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "School API",
        description = "Cities, departments, students, teachers, subjects and their enrollments."
    ),
    components(schemas(
        City,
        Department,
        Student,
        Teacher,
        Subject,
        StudentSubject,
        TeacherSubject,
        Gender,
        PageMeta,
        ErrorBody
    ))
)]
pub struct ApiDoc;
