//! Response envelopes.

use crate::query::Page;
use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct SuccessOne<T> {
    pub data: T,
}

/// A page of items with its paging metadata alongside.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResponse<T> {
    pub data: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_pages: u64,
    pub total_count: u64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl<T> From<Page<T>> for PagedResponse<T> {
    fn from(page: Page<T>) -> Self {
        let meta = page.meta;
        PagedResponse {
            data: page.items,
            page_number: meta.page_number,
            page_size: meta.page_size,
            total_pages: meta.total_pages,
            total_count: meta.total_count,
            has_previous_page: meta.has_previous,
            has_next_page: meta.has_next,
        }
    }
}

pub fn success_one<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (StatusCode::CREATED, Json(SuccessOne { data }))
}

pub fn success_one_ok<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (StatusCode::OK, Json(SuccessOne { data }))
}

pub fn success_page<T: Serialize>(page: Page<T>) -> (StatusCode, Json<PagedResponse<T>>) {
    (StatusCode::OK, Json(PagedResponse::from(page)))
}
