use serde::{Deserialize, Serialize};

use crate::request::PaginationRequest;

pub const DEFAULT_PER_PAGE: u64 = 10;

/// Offset/limit window derived from the raw `start`/`length` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based, informational.
    pub page: u64,
    /// `None` when the client asked for all rows (`length < 0`).
    pub per_page: Option<u64>,
    pub offset: u64,
}

impl Pagination {
    /// `start` is snapped down to a page boundary:
    /// `page = start / per_page + 1`, `offset = (page - 1) * per_page`.
    pub fn from_request(req: &PaginationRequest, default_per_page: u64) -> Self {
        let default_per_page = default_per_page.max(1);
        let per_page = match req.length {
            Some(len) if len < 0 => None,
            Some(len) if len > 0 => Some(len.unsigned_abs()),
            _ => Some(default_per_page),
        };
        let start = req.start.filter(|s| *s > 0).map_or(0, i64::unsigned_abs);

        match per_page {
            Some(per_page) => {
                let page = start / per_page + 1;
                Self {
                    page,
                    per_page: Some(per_page),
                    offset: (page - 1) * per_page,
                }
            }
            None => Self::all(),
        }
    }

    /// No window: every row on a single page.
    pub fn all() -> Self {
        Self {
            page: 1,
            per_page: None,
            offset: 0,
        }
    }

    pub fn limit(&self) -> Option<u64> {
        self.per_page
    }

    pub fn is_windowed(&self) -> bool {
        self.per_page.is_some()
    }
}

/// Response envelope in DataTables wire form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPage<T> {
    pub draw: u64,
    pub records_total: u64,
    pub records_filtered: u64,
    pub data: Vec<T>,
}

impl<T> ResultPage<T> {
    pub fn new(draw: u64, records_total: u64, records_filtered: u64, data: Vec<T>) -> Self {
        Self {
            draw,
            records_total,
            records_filtered,
            data,
        }
    }

    /// Map rows while keeping the counts (model -> presentation row).
    pub fn map_items<U>(self, f: impl FnMut(T) -> U) -> ResultPage<U> {
        ResultPage {
            draw: self.draw,
            records_total: self.records_total,
            records_filtered: self.records_filtered,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(start: Option<i64>, length: Option<i64>) -> Pagination {
        Pagination::from_request(&PaginationRequest { start, length }, DEFAULT_PER_PAGE)
    }

    #[test]
    fn defaults_to_first_page_of_ten() {
        let p = window(None, None);
        assert_eq!(p.offset, 0);
        assert_eq!(p.per_page, Some(10));
        assert_eq!(p.page, 1);
    }

    #[test]
    fn start_snaps_to_page_boundary() {
        let p = window(Some(11), None);
        assert_eq!(p.offset, 10);
        assert_eq!(p.page, 2);

        let p = window(Some(20), Some(20));
        assert_eq!(p.offset, 20);
        assert_eq!(p.page, 2);
    }

    #[test]
    fn length_sets_per_page() {
        assert_eq!(window(Some(0), Some(20)).per_page, Some(20));
        assert_eq!(window(Some(0), Some(0)).per_page, Some(10));
    }

    #[test]
    fn negative_length_means_everything() {
        let p = window(Some(30), Some(-1));
        assert_eq!(p, Pagination::all());
        assert!(!p.is_windowed());
    }

    #[test]
    fn negative_start_is_zero() {
        assert_eq!(window(Some(-5), Some(10)).offset, 0);
    }

    #[test]
    fn envelope_uses_datatables_field_names() {
        let page = ResultPage::new(3, 50, 2, vec!["a", "b"]).map_items(str::to_uppercase);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "draw": 3,
                "recordsTotal": 50,
                "recordsFiltered": 2,
                "data": ["A", "B"],
            })
        );
    }
}
