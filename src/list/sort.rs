//! Client-side column sorting for the currently loaded page
//!
//! Sorting never asks the server for a different order. Clicking the same
//! column cycles ascending, descending, then back to server order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Debug;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// A comparable cell value
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue<'a> {
    /// Compared with locale-aware text ordering; missing sorts as empty
    Text(Option<&'a str>),
    /// Compared chronologically; missing sorts first
    Date(Option<DateTime<Utc>>),
    /// Compared numerically; missing sorts first
    Number(Option<f64>),
}

/// A record that exposes sortable columns
pub trait Sortable {
    /// Column identifier
    type Column: Copy + PartialEq + Debug + Send + Sync + 'static;

    /// Value of `column` for this record
    fn sort_value(&self, column: Self::Column) -> SortValue<'_>;
}

/// Tri-state sort selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState<C> {
    column: Option<C>,
    direction: Option<SortDirection>,
}

impl<C> Default for SortState<C> {
    fn default() -> Self {
        Self {
            column: None,
            direction: None,
        }
    }
}

impl<C: Copy + PartialEq> SortState<C> {
    /// Register a header click on `column`
    pub fn toggle(&mut self, column: C) {
        let direction = if self.column == Some(column) {
            match self.direction {
                Some(SortDirection::Ascending) => Some(SortDirection::Descending),
                Some(SortDirection::Descending) => None,
                None => Some(SortDirection::Ascending),
            }
        } else {
            Some(SortDirection::Ascending)
        };
        self.column = Some(column);
        self.direction = direction;
    }

    /// Active column and direction, `None` when showing server order
    pub fn active(&self) -> Option<(C, SortDirection)> {
        match (self.column, self.direction) {
            (Some(column), Some(direction)) => Some((column, direction)),
            _ => None,
        }
    }

    /// Clear back to server order
    pub fn clear(&mut self) {
        self.column = None;
        self.direction = None;
    }
}

/// Return `items` in display order for `state` (stable; server order when unsorted)
pub fn sorted<'a, R>(items: impl IntoIterator<Item = &'a R>, state: &SortState<R::Column>) -> Vec<&'a R>
where
    R: Sortable + 'a,
{
    let mut view: Vec<&R> = items.into_iter().collect();
    if let Some((column, direction)) = state.active() {
        view.sort_by(|a, b| {
            let ord = compare_values(&a.sort_value(column), &b.sort_value(column));
            match direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });
    }
    view
}

/// Compare two cell values of the same column
pub fn compare_values(a: &SortValue<'_>, b: &SortValue<'_>) -> Ordering {
    match (a, b) {
        (SortValue::Text(a), SortValue::Text(b)) => {
            compare_text(a.unwrap_or_default(), b.unwrap_or_default())
        }
        (SortValue::Date(a), SortValue::Date(b)) => a.cmp(b),
        (SortValue::Number(a), SortValue::Number(b)) => match (a, b) {
            (Some(a), Some(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        _ => Ordering::Equal,
    }
}

/// Locale-aware text ordering.
///
/// Primary comparison ignores case and diacritics ("Émile" sorts with
/// "emile", "Łukasz" with "lukasz"), then lowercase sorts before uppercase,
/// then raw code points.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    let primary = fold_text(a).cmp(&fold_text(b));
    if primary != Ordering::Equal {
        return primary;
    }

    let case = a
        .chars()
        .map(|c| c.is_uppercase())
        .cmp(b.chars().map(|c| c.is_uppercase()));
    if case != Ordering::Equal {
        return case;
    }

    a.cmp(b)
}

/// Canonical decomposition with combining marks stripped, then lowercased
fn fold_text(s: &str) -> String {
    let mut folded = String::with_capacity(s.len());
    for c in s.nfd().filter(|c| !is_combining_mark(*c)) {
        match c {
            // letters with no canonical decomposition
            'ł' | 'Ł' => folded.push('l'),
            'ø' | 'Ø' => folded.push('o'),
            'đ' | 'Đ' | 'ð' | 'Ð' => folded.push('d'),
            'ħ' | 'Ħ' => folded.push('h'),
            'ı' => folded.push('i'),
            'ß' | 'ẞ' => folded.push_str("ss"),
            'æ' | 'Æ' => folded.push_str("ae"),
            'œ' | 'Œ' => folded.push_str("oe"),
            'þ' | 'Þ' => folded.push_str("th"),
            other => folded.extend(other.to_lowercase()),
        }
    }
    folded
}
