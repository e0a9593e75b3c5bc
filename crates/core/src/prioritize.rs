//! Display ordering and derived urgency fields for the quote board.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::quote::{Quote, QuoteStatus};
use crate::timefmt::{time_until_expiry, ExpiryInfo};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteFilter {
    /// Only quotes still inside their follow-up window.
    Active,
    All,
}

/// A quote plus the per-render fields the board derives from `now`.
/// Never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct QuoteView {
    pub quote: Quote,
    pub effective_status: QuoteStatus,
    pub is_overdue: bool,
    pub expiry: ExpiryInfo,
    pub show_expiry_warning: bool,
}

/// Filters and orders quotes for display.
///
/// Flagged quotes come first. Among equally-flagged quotes, those
/// with a scheduled next follow-up sort soonest-first; when either
/// side of a comparison has no date there is no preference and the
/// incoming order is preserved.
pub fn prioritize(quotes: Vec<Quote>, filter: QuoteFilter, now: DateTime<Utc>) -> Vec<QuoteView> {
    let mut views: Vec<QuoteView> = quotes
        .into_iter()
        .map(|quote| view_of(quote, now))
        .filter(|view| match filter {
            QuoteFilter::Active => !view.effective_status.is_terminal(),
            QuoteFilter::All => true,
        })
        .collect();

    stable_preference_sort(&mut views, |a, b| compare_priority(&a.quote, &b.quote));
    views
}

fn view_of(quote: Quote, now: DateTime<Utc>) -> QuoteView {
    let effective_status = quote.effective_status(now);
    let active = !effective_status.is_terminal();
    let is_overdue = active && quote.next_follow_up.is_some_and(|due| due < now);
    let expiry = time_until_expiry(now, quote.expires_at);
    let show_expiry_warning = active && expiry.urgent;
    QuoteView { quote, effective_status, is_overdue, expiry, show_expiry_warning }
}

/// Pairwise display preference. Deliberately not a total order: a
/// missing `next_follow_up` on either side means "no preference", so
/// undated quotes hold their incoming position.
pub fn compare_priority(a: &Quote, b: &Quote) -> Ordering {
    match (a.is_flagged, b.is_flagged) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }
    match (a.next_follow_up, b.next_follow_up) {
        (Some(a_due), Some(b_due)) => a_due.cmp(&b_due),
        _ => Ordering::Equal,
    }
}

/// Stable insertion sort. The preference comparator above is not
/// transitive, which the standard sort is allowed to reject; an
/// element here only moves left past neighbours strictly preferred
/// after it, so "no preference" pairs keep their relative order.
fn stable_preference_sort<T, F>(items: &mut [T], mut prefer: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && prefer(&items[j - 1], &items[j]) == Ordering::Greater {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
}
