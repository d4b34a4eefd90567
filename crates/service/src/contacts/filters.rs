//! List filters for contacts, kept free of storage code so both repository
//! implementations share the same semantics.

use chrono::{Datelike, NaiveDate};

use models::contact;

/// Days after "today" covered by the upcoming-birthdays filter.
pub const UPCOMING_BIRTHDAY_DAYS: u32 = 7;

/// Inclusive, year-independent window of birthdays `[start, start + days]`.
///
/// The window is built from real calendar dates, so it wraps across month and
/// year ends (Dec 28 + 7 days covers Dec 28..=Dec 31 and Jan 1..=Jan 4).
/// In a non-leap year a window touching Feb 28 also admits Feb 29 birthdays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BirthdayWindow {
    start: NaiveDate,
    days: u32,
}

impl BirthdayWindow {
    pub fn new(start: NaiveDate, days: u32) -> Self {
        Self { start, days }
    }

    pub fn upcoming(today: NaiveDate) -> Self {
        Self::new(today, UPCOMING_BIRTHDAY_DAYS)
    }

    /// Every (month, day) pair the window admits, in calendar order.
    pub fn month_days(&self) -> Vec<(u32, u32)> {
        let mut out = Vec::with_capacity(self.days as usize + 2);
        for date in self.start.iter_days().take(self.days as usize + 1) {
            let md = (date.month(), date.day());
            if !out.contains(&md) {
                out.push(md);
            }
            if md == (2, 28) && !is_leap_year(date.year()) && !out.contains(&(2, 29)) {
                out.push((2, 29));
            }
        }
        out
    }

    pub fn contains(&self, month: u32, day: u32) -> bool {
        self.month_days().contains(&(month, day))
    }

    pub fn contains_date(&self, birth_date: NaiveDate) -> bool {
        self.contains(birth_date.month(), birth_date.day())
    }
}

fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

/// `true` when (month, day) falls within `window_days` days after `today`,
/// both ends inclusive.
pub fn in_birthday_window(today: NaiveDate, window_days: u32, month: u32, day: u32) -> bool {
    BirthdayWindow::new(today, window_days).contains(month, day)
}

/// Conjunction of optional list filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFilter {
    /// Lowercased needle; `None` when no search was requested.
    search: Option<String>,
    birthdays: Option<BirthdayWindow>,
}

impl ContactFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank text disables the search filter.
    pub fn with_search(mut self, text: Option<&str>) -> Self {
        self.search = text
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);
        self
    }

    pub fn with_birthdays(mut self, window: Option<BirthdayWindow>) -> Self {
        self.birthdays = window;
        self
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn birthdays(&self) -> Option<&BirthdayWindow> {
        self.birthdays.as_ref()
    }

    pub fn matches(&self, c: &contact::Model) -> bool {
        let search_ok = self.search.as_deref().map_or(true, |needle| matches_search(c, needle));
        let birthday_ok = self.birthdays.map_or(true, |w| w.contains_date(c.birth_date));
        search_ok && birthday_ok
    }
}

/// Case-insensitive substring match on first name, last name or email.
/// `needle` must already be lowercase.
pub fn matches_search(c: &contact::Model, needle: &str) -> bool {
    [&c.first_name, &c.last_name, &c.email]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Escape `%`, `_` and `\` so user text is matched literally by `LIKE`.
pub fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
