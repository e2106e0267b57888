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

//! Purchase eligibility rules.
//!
//! Every rule is evaluated on its own and all failures are collected, so a
//! rejected purchase can report each reason at once:
//!
//! 1. the game must be available;
//! 2. the customer must be at least as old as the age rating;
//! 3. the customer must not already own the game;
//! 4. the balance must cover the price, except free games are always affordable.

use crate::base::GameTitle;
use crate::customer::Customer;
use crate::game::Game;
use rust_decimal::Decimal;
use std::fmt;

/// A business rule that blocks a purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    Unavailable(GameTitle),
    AgeRestricted {
        title: GameTitle,
        age_rating: u8,
        customer_age: u8,
    },
    AlreadyOwned(GameTitle),
    InsufficientBalance {
        required: Decimal,
        available: Decimal,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Unavailable(title) => write!(f, "game '{title}' is not available"),
            Violation::AgeRestricted {
                title,
                age_rating,
                customer_age,
            } => write!(
                f,
                "game '{title}' is not appropriate for age {customer_age} (rated {age_rating})"
            ),
            Violation::AlreadyOwned(title) => write!(f, "customer already owns game '{title}'"),
            Violation::InsufficientBalance {
                required,
                available,
            } => write!(
                f,
                "insufficient balance (required {required}, available {available})"
            ),
        }
    }
}

/// Affordability with the free-game exemption.
pub fn can_afford(customer: &Customer, amount: Decimal) -> bool {
    amount.is_zero() || customer.has_sufficient_balance(amount)
}

/// Availability, age, and ownership. Balance is left out so callers that
/// budget incrementally can apply it themselves.
pub fn catalog_violations(customer: &Customer, game: &Game) -> Vec<Violation> {
    let mut violations = Vec::new();

    if !game.is_available() {
        violations.push(Violation::Unavailable(game.title().clone()));
    }
    if !game.is_age_appropriate(customer.age()) {
        violations.push(Violation::AgeRestricted {
            title: game.title().clone(),
            age_rating: game.age_rating(),
            customer_age: customer.age(),
        });
    }
    if customer.owns_game(game) {
        violations.push(Violation::AlreadyOwned(game.title().clone()));
    }

    violations
}

/// All rules for buying a single game.
pub fn check_game(customer: &Customer, game: &Game) -> Vec<Violation> {
    let mut violations = catalog_violations(customer, game);
    if !can_afford(customer, game.price()) {
        violations.push(Violation::InsufficientBalance {
            required: game.price(),
            available: customer.balance(),
        });
    }
    violations
}

/// All rules for checking out a cart: balance against the cart total, the
/// remaining rules per game.
///
/// `games` are the cart's games as currently stored in the catalog; `total`
/// is the cart value at the unit prices captured when the lines were added.
pub fn check_cart(customer: &Customer, games: &[Game], total: Decimal) -> Vec<Violation> {
    let mut violations = Vec::new();

    if !can_afford(customer, total) {
        violations.push(Violation::InsufficientBalance {
            required: total,
            available: customer.balance(),
        });
    }
    for game in games {
        violations.extend(catalog_violations(customer, game));
    }

    violations
}

/// Joins violation messages with `"; "`.
pub fn describe(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
