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

//! Persistence seams for games and customers.
//!
//! The purchase engine and the services only talk to these traits. Filter
//! queries have default implementations on top of `find_all`, so a backend
//! only has to provide keyed access and writes.
//!
//! List results are ordered by storage id. Titles and emails are unique keys:
//! implementations reject a write that would give two records the same one.

mod memory;

pub use memory::{InMemoryCustomerRepository, InMemoryGameRepository};

use crate::base::{CustomerId, Email, GameId, GameTitle};
use crate::customer::Customer;
use crate::error::StoreError;
use crate::game::Game;
use rust_decimal::Decimal;

pub trait GameRepository: Send + Sync {
    /// Stores `game`, assigning a fresh [`GameId`] if it has none.
    ///
    /// # Errors
    ///
    /// [`StoreError::DuplicateGame`] if another record holds the same title.
    fn save(&self, game: Game) -> Result<Game, StoreError>;

    fn find_by_id(&self, id: GameId) -> Option<Game>;

    fn find_all(&self) -> Vec<Game>;

    /// Replaces an existing record.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Unsaved`] if `game` has no id.
    /// - [`StoreError::GameNotFound`] if no record has that id.
    /// - [`StoreError::DuplicateGame`] if another record holds the new title.
    fn update(&self, game: Game) -> Result<Game, StoreError>;

    /// Returns `false` if nothing was stored under `id`.
    fn delete_by_id(&self, id: GameId) -> bool;

    fn count(&self) -> usize;

    fn find_by_title(&self, title: &GameTitle) -> Option<Game> {
        self.find_all()
            .into_iter()
            .find(|game| game.title() == title)
    }

    fn exists_by_title(&self, title: &GameTitle) -> bool {
        self.find_by_title(title).is_some()
    }

    fn find_by_category(&self, category: &str) -> Vec<Game> {
        self.find_all()
            .into_iter()
            .filter(|game| game.category() == category)
            .collect()
    }

    /// Inclusive on both ends.
    fn find_by_price_range(&self, min: Decimal, max: Decimal) -> Vec<Game> {
        self.find_all()
            .into_iter()
            .filter(|game| game.price() >= min && game.price() <= max)
            .collect()
    }

    /// Games rated at most `max_age`.
    fn find_by_age_rating(&self, max_age: u8) -> Vec<Game> {
        self.find_all()
            .into_iter()
            .filter(|game| game.age_rating() <= max_age)
            .collect()
    }

    fn find_available(&self) -> Vec<Game> {
        self.find_all()
            .into_iter()
            .filter(Game::is_available)
            .collect()
    }

    fn find_free(&self) -> Vec<Game> {
        self.find_all().into_iter().filter(Game::is_free).collect()
    }
}

pub trait CustomerRepository: Send + Sync {
    /// Stores `customer`, assigning a fresh [`CustomerId`] if it has none.
    ///
    /// # Errors
    ///
    /// [`StoreError::DuplicateCustomer`] if another record holds the same email.
    fn save(&self, customer: Customer) -> Result<Customer, StoreError>;

    fn find_by_id(&self, id: CustomerId) -> Option<Customer>;

    fn find_all(&self) -> Vec<Customer>;

    /// Replaces an existing record.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Unsaved`] if `customer` has no id.
    /// - [`StoreError::CustomerNotFound`] if no record has that id.
    /// - [`StoreError::DuplicateCustomer`] if another record holds the new email.
    fn update(&self, customer: Customer) -> Result<Customer, StoreError>;

    fn delete_by_id(&self, id: CustomerId) -> bool;

    fn count(&self) -> usize;

    fn find_by_email(&self, email: &Email) -> Option<Customer> {
        self.find_all()
            .into_iter()
            .find(|customer| customer.email() == email)
    }

    fn exists_by_email(&self, email: &Email) -> bool {
        self.find_by_email(email).is_some()
    }

    /// Case-insensitive substring match. A blank needle matches nothing.
    fn find_by_name_containing(&self, name: &str) -> Vec<Customer> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.find_all()
            .into_iter()
            .filter(|customer| customer.name().to_lowercase().contains(&needle))
            .collect()
    }

    /// Inclusive on both ends.
    fn find_by_age_range(&self, min_age: u8, max_age: u8) -> Vec<Customer> {
        self.find_all()
            .into_iter()
            .filter(|customer| (min_age..=max_age).contains(&customer.age()))
            .collect()
    }

    fn find_by_min_balance(&self, min_balance: Decimal) -> Vec<Customer> {
        self.find_all()
            .into_iter()
            .filter(|customer| customer.balance() >= min_balance)
            .collect()
    }
}
