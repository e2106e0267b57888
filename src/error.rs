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

//! Error types for the store.
//!
//! Two layers: [`ValidationError`] for malformed field values rejected at the
//! entity boundary, and [`StoreError`] for hard failures of a store operation
//! (lookups, uniqueness, balance arithmetic). Business-rule rejections of a
//! purchase are not errors; see [`Violation`](crate::Violation).

use crate::base::{CustomerId, Email, GameId, GameTitle};
use rust_decimal::Decimal;
use thiserror::Error;

/// Field-level validation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty or whitespace
    #[error("{field} cannot be empty")]
    Blank { field: &'static str },

    #[error("invalid email format: '{0}'")]
    InvalidEmail(String),

    #[error("price cannot be negative: {0}")]
    NegativePrice(Decimal),

    #[error("balance cannot be negative: {0}")]
    NegativeBalance(Decimal),

    /// Credit or debit amount is out of range
    #[error("amount must be positive: {0}")]
    NonPositiveAmount(Decimal),

    #[error("age rating must be between 0 and 18: {0}")]
    AgeRatingOutOfRange(u8),

    #[error("age must be between 0 and 150: {0}")]
    AgeOutOfRange(u8),

    #[error("quantity must be positive")]
    ZeroQuantity,

    /// Money arithmetic left the range of [`Decimal`]
    #[error("amount out of range")]
    AmountOverflow,

    #[error("quantity out of range")]
    QuantityOverflow,

    #[error("min price cannot be greater than max price")]
    InvertedPriceRange,

    #[error("invalid age range")]
    InvertedAgeRange,
}

/// Store operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("game not found with ID: {0}")]
    GameNotFound(GameId),

    #[error("game not found with name: '{0}'")]
    GameTitleNotFound(GameTitle),

    #[error("customer not found with ID: {0}")]
    CustomerNotFound(CustomerId),

    #[error("customer not found with email: '{0}'")]
    CustomerEmailNotFound(Email),

    #[error("game with name '{0}' already exists")]
    DuplicateGame(GameTitle),

    #[error("customer with email '{0}' already exists")]
    DuplicateCustomer(Email),

    /// Cart was checked out by someone other than its owner
    #[error("cart belongs to customer {owner}, not {customer}")]
    CartOwnerMismatch {
        owner: CustomerId,
        customer: CustomerId,
    },

    /// Entity has no storage id yet (never saved)
    #[error("entity has not been saved")]
    Unsaved,

    /// Debit would take the balance below zero
    #[error("insufficient balance")]
    InsufficientFunds,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
