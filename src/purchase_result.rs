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

//! Outcome of a purchase attempt.

use crate::eligibility::{self, Violation};
use crate::game::Game;
use rust_decimal::Decimal;
use std::fmt;

/// Immutable record returned by every purchase operation.
///
/// Business-rule rejections come back as a result with `success == false`
/// rather than as an error, so callers can show [`message`](Self::message)
/// directly.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseResult {
    success: bool,
    message: String,
    total: Decimal,
    games: Vec<Game>,
}

impl PurchaseResult {
    pub(crate) fn succeeded(message: impl Into<String>, total: Decimal, games: Vec<Game>) -> Self {
        Self {
            success: true,
            message: message.into(),
            total,
            games,
        }
    }

    pub(crate) fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            total: Decimal::ZERO,
            games: Vec::new(),
        }
    }

    pub(crate) fn rejected(violations: &[Violation]) -> Self {
        Self::failed(eligibility::describe(violations))
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Amount charged; zero for failed purchases.
    pub fn total(&self) -> Decimal {
        self.total
    }

    /// Games acquired in this transaction; empty for failed purchases.
    pub fn games(&self) -> &[Game] {
        &self.games
    }
}

impl fmt::Display for PurchaseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "ok" } else { "rejected" };
        write!(
            f,
            "{status}: {} (total {}, {} games)",
            self.message,
            self.total,
            self.games.len()
        )
    }
}
