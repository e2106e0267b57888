// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Stateless field validators shared by entities and services.

use crate::error::ValidationError;
use rust_decimal::Decimal;

/// Highest age rating a game can carry.
pub const MAX_AGE_RATING: u8 = 18;

/// Highest age accepted for a customer.
pub const MAX_CUSTOMER_AGE: u8 = 150;

pub fn require_non_blank(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank { field });
    }
    Ok(())
}

/// Basic shape check: `local@domain.tld`.
///
/// The `@` must not be the first character, must come before the last `.`,
/// and the address must not end with `.`.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    require_non_blank("email", email)?;
    let invalid = || ValidationError::InvalidEmail(email.to_string());

    let at = email.find('@').ok_or_else(invalid)?;
    let dot = email.rfind('.').ok_or_else(invalid)?;
    if at == 0 || at > dot || dot == email.len() - 1 {
        return Err(invalid());
    }
    Ok(())
}

pub fn validate_price(price: Decimal) -> Result<(), ValidationError> {
    if price < Decimal::ZERO {
        return Err(ValidationError::NegativePrice(price));
    }
    Ok(())
}

pub fn validate_balance(balance: Decimal) -> Result<(), ValidationError> {
    if balance < Decimal::ZERO {
        return Err(ValidationError::NegativeBalance(balance));
    }
    Ok(())
}

pub fn validate_positive_amount(amount: Decimal) -> Result<(), ValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount(amount));
    }
    Ok(())
}

/// Sum of `amounts`, or [`ValidationError::AmountOverflow`] if it leaves the
/// range of [`Decimal`].
pub fn checked_sum(
    amounts: impl IntoIterator<Item = Decimal>,
) -> Result<Decimal, ValidationError> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount))
        .ok_or(ValidationError::AmountOverflow)
}

pub fn validate_age_rating(age_rating: u8) -> Result<(), ValidationError> {
    if age_rating > MAX_AGE_RATING {
        return Err(ValidationError::AgeRatingOutOfRange(age_rating));
    }
    Ok(())
}

pub fn validate_age(age: u8) -> Result<(), ValidationError> {
    if age > MAX_CUSTOMER_AGE {
        return Err(ValidationError::AgeOutOfRange(age));
    }
    Ok(())
}
