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

//! Customer accounts.
//!
//! A customer carries a spendable balance and the set of games they own.
//! Balance changes go through [`Customer::deduct_balance`] and
//! [`Customer::add_balance`], which keep the balance non-negative.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use game_store_rs::Customer;
//!
//! let mut customer = Customer::new("Ana", "ana@store.com", dec!(10.00), 30).unwrap();
//! customer.deduct_balance(dec!(0)).unwrap();
//! assert_eq!(customer.balance(), dec!(10.00));
//! ```

use crate::base::{CustomerId, Email, GameTitle};
use crate::error::{StoreError, ValidationError};
use crate::game::Game;
use crate::validation;
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// Registered customer.
///
/// Equality and hashing use the [`Email`] only.
#[derive(Debug, Clone)]
pub struct Customer {
    id: Option<CustomerId>,
    name: String,
    email: Email,
    balance: Decimal,
    age: u8,
    /// Owned games keyed by title; a title appears at most once.
    owned: BTreeMap<GameTitle, Game>,
}

impl Customer {
    const DECIMAL_PRECISION: u32 = 2;

    pub fn new(
        name: &str,
        email: &str,
        initial_balance: Decimal,
        age: u8,
    ) -> Result<Self, ValidationError> {
        validation::require_non_blank("name", name)?;
        let email = Email::parse(email)?;
        validation::validate_balance(initial_balance)?;
        validation::validate_age(age)?;

        Ok(Self {
            id: None,
            name: name.to_string(),
            email,
            balance: initial_balance,
            age,
            owned: BTreeMap::new(),
        })
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.balance >= Decimal::ZERO,
            "Invariant violated: balance went negative: {}",
            self.balance
        );
    }

    pub fn id(&self) -> Option<CustomerId> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn age(&self) -> u8 {
        self.age
    }

    pub(crate) fn assign_id(&mut self, id: CustomerId) {
        self.id = Some(id);
    }

    pub fn set_name(&mut self, name: &str) -> Result<(), ValidationError> {
        validation::require_non_blank("name", name)?;
        self.name = name.to_string();
        Ok(())
    }

    pub fn set_email(&mut self, email: &str) -> Result<(), ValidationError> {
        self.email = Email::parse(email)?;
        Ok(())
    }

    pub fn set_balance(&mut self, balance: Decimal) -> Result<(), ValidationError> {
        validation::validate_balance(balance)?;
        self.balance = balance;
        Ok(())
    }

    pub fn set_age(&mut self, age: u8) -> Result<(), ValidationError> {
        validation::validate_age(age)?;
        self.age = age;
        Ok(())
    }

    pub fn has_sufficient_balance(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }

    /// Decreases the balance.
    ///
    /// A zero amount is a no-op and skips the sufficiency check, so free games
    /// never fail on balance.
    pub fn deduct_balance(&mut self, amount: Decimal) -> Result<(), StoreError> {
        if amount < Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount(amount).into());
        }
        if amount.is_zero() {
            return Ok(());
        }
        if !self.has_sufficient_balance(amount) {
            return Err(StoreError::InsufficientFunds);
        }
        self.balance -= amount;
        self.assert_invariants();
        Ok(())
    }

    /// Increases the balance. The balance is unchanged on error.
    pub fn add_balance(&mut self, amount: Decimal) -> Result<(), StoreError> {
        validation::validate_positive_amount(amount)?;
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(ValidationError::AmountOverflow)?;
        self.assert_invariants();
        Ok(())
    }

    /// Adds a game to the owned set. Returns `false` if it was already owned.
    pub fn add_owned_game(&mut self, game: Game) -> bool {
        if self.owned.contains_key(game.title()) {
            return false;
        }
        self.owned.insert(game.title().clone(), game);
        true
    }

    pub fn owns_game(&self, game: &Game) -> bool {
        self.owns_title(game.title())
    }

    pub fn owns_title(&self, title: &GameTitle) -> bool {
        self.owned.contains_key(title)
    }

    /// Owned games in title order.
    pub fn owned_games(&self) -> impl Iterator<Item = &Game> {
        self.owned.values()
    }

    pub fn owned_count(&self) -> usize {
        self.owned.len()
    }

    /// Sum of the current list prices of every owned game.
    pub fn total_spent(&self) -> Result<Decimal, ValidationError> {
        validation::checked_sum(self.owned.values().map(Game::price))
    }
}

impl PartialEq for Customer {
    fn eq(&self, other: &Self) -> bool {
        self.email == other.email
    }
}

impl Eq for Customer {}

impl Hash for Customer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.email.hash(state);
    }
}

impl Serialize for Customer {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let owned = self
            .owned
            .keys()
            .map(GameTitle::as_str)
            .collect::<Vec<_>>()
            .join(";");

        let mut state = serializer.serialize_struct("Customer", 6)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("email", &self.email)?;
        state.serialize_field(
            "balance",
            &self.balance.round_dp(Customer::DECIMAL_PRECISION),
        )?;
        state.serialize_field("age", &self.age)?;
        state.serialize_field("owned", &owned)?;
        state.end()
    }
}
