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

//! Catalog games.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use game_store_rs::Game;
//!
//! let mut game = Game::new("Celeste", dec!(36.90), "Platformer", 10).unwrap();
//! assert!(game.set_age_rating(21).is_err());
//! assert_eq!(game.age_rating(), 10);
//! ```

use crate::base::{GameId, GameTitle};
use crate::error::ValidationError;
use crate::validation;
use rust_decimal::Decimal;
use serde::Serialize;
use std::hash::{Hash, Hasher};

/// A game in the catalog.
///
/// Equality and hashing use the [`GameTitle`] only; two records with the same
/// title are the same game regardless of price or storage id.
#[derive(Debug, Clone, Serialize)]
pub struct Game {
    id: Option<GameId>,
    title: GameTitle,
    price: Decimal,
    category: String,
    age_rating: u8,
    description: String,
    available: bool,
}

impl Game {
    /// Creates an unsaved, available game with an empty description.
    pub fn new(
        title: &str,
        price: Decimal,
        category: &str,
        age_rating: u8,
    ) -> Result<Self, ValidationError> {
        let title = GameTitle::new(title)?;
        validation::validate_price(price)?;
        validation::require_non_blank("category", category)?;
        validation::validate_age_rating(age_rating)?;

        Ok(Self {
            id: None,
            title,
            price,
            category: category.to_string(),
            age_rating,
            description: String::new(),
            available: true,
        })
    }

    pub fn id(&self) -> Option<GameId> {
        self.id
    }

    pub fn title(&self) -> &GameTitle {
        &self.title
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn age_rating(&self) -> u8 {
        self.age_rating
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn is_free(&self) -> bool {
        self.price.is_zero()
    }

    /// Exact boundary age qualifies.
    pub fn is_age_appropriate(&self, customer_age: u8) -> bool {
        customer_age >= self.age_rating
    }

    pub(crate) fn assign_id(&mut self, id: GameId) {
        self.id = Some(id);
    }

    pub fn set_title(&mut self, title: &str) -> Result<(), ValidationError> {
        self.title = GameTitle::new(title)?;
        Ok(())
    }

    pub fn set_price(&mut self, price: Decimal) -> Result<(), ValidationError> {
        validation::validate_price(price)?;
        self.price = price;
        Ok(())
    }

    pub fn set_category(&mut self, category: &str) -> Result<(), ValidationError> {
        validation::require_non_blank("category", category)?;
        self.category = category.to_string();
        Ok(())
    }

    pub fn set_age_rating(&mut self, age_rating: u8) -> Result<(), ValidationError> {
        validation::validate_age_rating(age_rating)?;
        self.age_rating = age_rating;
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Builder-style variant of [`set_available`](Self::set_available).
    pub fn with_availability(mut self, available: bool) -> Self {
        self.available = available;
        self
    }
}

impl PartialEq for Game {
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title
    }
}

impl Eq for Game {}

impl Hash for Game {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.title.hash(state);
    }
}
