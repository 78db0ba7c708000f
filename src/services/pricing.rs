//! Line and basket arithmetic shared by carts and orders. Amounts are minor
//! units, and nothing here is ever persisted: totals are recomputed from the
//! current product price on every read.

use crate::error::{AppError, AppResult};

pub fn line_subtotal(unit_price: i64, quantity: i32) -> AppResult<i64> {
    unit_price
        .checked_mul(i64::from(quantity))
        .ok_or_else(|| overflow("line subtotal"))
}

pub fn total(subtotals: impl IntoIterator<Item = i64>) -> AppResult<i64> {
    subtotals
        .into_iter()
        .try_fold(0i64, |acc, subtotal| acc.checked_add(subtotal))
        .ok_or_else(|| overflow("total"))
}

fn overflow(what: &str) -> AppError {
    tracing::error!(what, "amount out of range");
    AppError::Internal(anyhow::anyhow!("{what} does not fit in minor units"))
}
