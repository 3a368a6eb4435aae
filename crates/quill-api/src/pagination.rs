use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};

use quill_types::api::PageQuery;

use crate::error::ApiError;

pub const PAGE_SIZE: u32 = 10;

/// A 1-based page number from `?page=`, defaulting to the first page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
}

impl Pagination {
    pub fn new(page: Option<u32>) -> Result<Self, ApiError> {
        match page.unwrap_or(1) {
            0 => Err(ApiError::Validation("page must be at least 1".into())),
            page => Ok(Self { page }),
        }
    }

    pub fn first() -> Self {
        Self { page: 1 }
    }

    pub fn limit(&self) -> i64 {
        PAGE_SIZE as i64
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * PAGE_SIZE as i64
    }
}

impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<PageQuery>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::Validation(e.body_text()))?;
        Self::new(query.page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_arithmetic() {
        let first = Pagination::new(None).unwrap();
        assert_eq!(first, Pagination::first());
        assert_eq!((first.limit(), first.offset()), (10, 0));

        let third = Pagination::new(Some(3)).unwrap();
        assert_eq!(third.offset(), 20);

        let last = Pagination::new(Some(u32::MAX)).unwrap();
        assert!(last.offset() > 0);
    }

    #[test]
    fn page_zero_is_rejected() {
        assert!(matches!(Pagination::new(Some(0)), Err(ApiError::Validation(_))));
    }
}
