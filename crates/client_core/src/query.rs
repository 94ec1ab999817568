//! Query parameters of the client list and the paging arithmetic around them.

use shared::{
    domain::{ClientStatus, PaymentStatus, SortColumn, SortDirection},
    protocol::ListClientsParams,
};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Active query of the list view. Every setter that changes the shape of the
/// result set moves back to page 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub text: String,
    pub status: Option<ClientStatus>,
    pub payment: Option<PaymentStatus>,
    pub course: String,
    pub sort: SortColumn,
    pub order: SortDirection,
    pub page: u32,
    pub page_size: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl ListQuery {
    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            text: String::new(),
            status: None,
            payment: None,
            course: String::new(),
            sort: SortColumn::default(),
            order: SortDirection::default(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Commits search text. Returns whether the active text changed.
    pub fn set_text(&mut self, text: &str) -> bool {
        let text = text.trim();
        if self.text == text {
            return false;
        }
        self.text = text.to_string();
        self.page = 1;
        true
    }

    pub fn set_status(&mut self, status: Option<ClientStatus>) {
        self.status = status;
        self.page = 1;
    }

    pub fn set_payment(&mut self, payment: Option<PaymentStatus>) {
        self.payment = payment;
        self.page = 1;
    }

    pub fn set_course(&mut self, course: &str) {
        self.course = course.to_string();
        self.page = 1;
    }

    pub fn set_sort(&mut self, sort: SortColumn) {
        self.sort = sort;
        self.page = 1;
    }

    pub fn set_order(&mut self, order: SortDirection) {
        self.order = order;
        self.page = 1;
    }

    /// Header-click behaviour: the active column flips direction, another
    /// column becomes active with its own default direction.
    pub fn toggle_sort(&mut self, column: SortColumn) {
        if self.sort == column {
            self.order = self.order.flipped();
        } else {
            self.sort = column;
            self.order = column.default_direction();
        }
        self.page = 1;
    }

    pub fn set_page_size(&mut self, page_size: u32) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn reset(&mut self) {
        *self = Self::with_page_size(self.page_size);
    }

    pub fn to_params(&self) -> ListClientsParams {
        ListClientsParams {
            page: Some(self.page),
            limit: Some(self.page_size),
            ..self.export_params()
        }
    }

    /// Same filters and ordering as the list request, without paging.
    pub fn export_params(&self) -> ListClientsParams {
        ListClientsParams {
            q: non_blank(&self.text),
            status: self.status,
            payment_status: self.payment,
            course: non_blank(&self.course),
            page: None,
            limit: None,
            sort: self.sort,
            order: self.order,
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

pub fn page_count(total: u64, page_size: u32) -> u32 {
    let page_size = u64::from(page_size.max(1));
    let pages = total.div_ceil(page_size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// `"start–end"` of the rows shown on `page`, `"0–0"` for an empty result.
pub fn range_text(page: u32, page_size: u32, total: u64) -> String {
    if total == 0 {
        return "0–0".to_string();
    }
    let page = u64::from(page.max(1));
    let page_size = u64::from(page_size.max(1));
    let start = (page - 1) * page_size + 1;
    let end = (page * page_size).min(total);
    format!("{start}–{end}")
}

#[cfg(test)]
#[path = "tests/query_tests.rs"]
mod tests;
