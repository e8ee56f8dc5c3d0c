use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based.
    pub number: i64,
    pub num_pages: i64,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn previous_number(&self) -> i64 {
        self.number - 1
    }

    pub fn next_number(&self) -> i64 {
        self.number + 1
    }

    pub fn is_paginated(&self) -> bool {
        self.num_pages > 1
    }
}

/// Page window over `total` records, validated against the requested page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: i64,
    pub num_pages: i64,
    pub limit: i64,
    pub offset: i64,
}

impl PageWindow {
    /// `requested` is the raw `?page=` value. Page 1 of an empty listing is
    /// valid; anything else outside `1..=num_pages`, or unparsable, is
    /// not-found.
    pub fn resolve(requested: Option<&str>, total: i64, per_page: i64) -> Result<Self, AppError> {
        let num_pages = ((total + per_page - 1) / per_page).max(1);

        let number = match requested.map(str::trim) {
            None | Some("") => 1,
            Some("last") => num_pages,
            Some(raw) => raw.parse::<i64>().map_err(|_| AppError::NotFound)?,
        };

        if number < 1 || number > num_pages {
            return Err(AppError::NotFound);
        }

        Ok(Self {
            number,
            num_pages,
            limit: per_page,
            offset: (number - 1) * per_page,
        })
    }

    pub fn into_page<T>(self, items: Vec<T>, total: i64) -> Page<T> {
        Page {
            items,
            number: self.number,
            num_pages: self.num_pages,
            total,
        }
    }
}
