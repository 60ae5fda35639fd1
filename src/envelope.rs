//! Response wrappers shared by every endpoint.
//!
//! Single-entity operations answer with an [`Envelope`]; list endpoints answer
//! with a [`PaginatedList`]. The success literal keeps its historical spelling
//! so existing clients keep matching on it.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ServiceError;

pub const STATUS_SUCCESS: &str = "Sucess";
pub const STATUS_ERROR: &str = "Error";

pub const DEFAULT_PAGE_NUMBER: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Status envelope: `{status, message, data, totalData}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub status: String,
    pub message: Option<Vec<String>>,
    pub data: Option<T>,
    pub total_data: u64,
}

impl<T> Envelope<T> {
    /// Single entity payload, `totalData = 1`
    pub fn success(data: T) -> Self {
        Self::success_with_total(data, 1)
    }

    pub fn success_with_total(data: T, total_data: u64) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            message: None,
            data: Some(data),
            total_data,
        }
    }

    /// Success without payload (deletes)
    pub fn success_empty() -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            message: None,
            data: None,
            total_data: 0,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message
            .get_or_insert_with(Vec::new)
            .push(message.into());
        self
    }

    pub fn error(messages: Vec<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            message: Some(messages),
            data: None,
            total_data: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

/// Page parameters carried inside every list filter.
///
/// A key missing from the filter JSON takes the default (page 1, size 10);
/// an explicit `null` on both keys disables paging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    #[serde(default = "default_page_number")]
    pub page_number: Option<u64>,
    #[serde(default = "default_page_size")]
    pub page_size: Option<u64>,
}

impl PageParams {
    pub fn new(page_number: Option<u64>, page_size: Option<u64>) -> Self {
        Self {
            page_number,
            page_size,
        }
    }

    /// Returns every item in a single unpaged list.
    pub fn unpaged() -> Self {
        Self::new(None, None)
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self::new(default_page_number(), default_page_size())
    }
}

fn default_page_number() -> Option<u64> {
    Some(DEFAULT_PAGE_NUMBER)
}

fn default_page_size() -> Option<u64> {
    Some(DEFAULT_PAGE_SIZE)
}

/// Paginated envelope: `{pageIndex, totalPage, totalData, data}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedList<T> {
    pub page_index: Option<u64>,
    pub total_page: Option<u64>,
    pub total_data: Option<u64>,
    pub has_previous_page: bool,
    pub has_next_page: bool,
    pub data: Vec<T>,
}

/// Slices an already filtered candidate set.
///
/// Both page parameters absent returns everything with `pageIndex`/`totalPage`
/// unset. Otherwise both must be present and positive.
pub fn paginate<T>(items: Vec<T>, page: PageParams) -> Result<PaginatedList<T>, ServiceError> {
    let count = items.len() as u64;

    match (page.page_number, page.page_size) {
        (None, None) => Ok(PaginatedList {
            page_index: None,
            total_page: None,
            total_data: Some(count),
            has_previous_page: false,
            has_next_page: false,
            data: items,
        }),
        (Some(number), Some(size)) => {
            if number == 0 || size == 0 {
                return Err(ServiceError::validation(
                    "pageNumber and pageSize must be greater than zero",
                ));
            }
            let total_page = count.div_ceil(size);
            let skip = usize::try_from((number - 1).saturating_mul(size)).unwrap_or(usize::MAX);
            let take = usize::try_from(size).unwrap_or(usize::MAX);
            let data = items.into_iter().skip(skip).take(take).collect();

            Ok(PaginatedList {
                page_index: Some(number),
                total_page: Some(total_page),
                total_data: Some(count),
                has_previous_page: number > 1,
                has_next_page: number < total_page,
                data,
            })
        }
        _ => Err(ServiceError::validation(
            "pageSize and pageNumber must be provided together",
        )),
    }
}
