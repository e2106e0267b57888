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

//! Catalog service: creating, finding, filtering and editing games.

use crate::base::{GameId, GameTitle};
use crate::error::{StoreError, ValidationError};
use crate::game::Game;
use crate::repository::GameRepository;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::info;

/// Upper bound used when a price filter has no maximum.
pub const DEFAULT_MAX_PRICE: Decimal = dec!(9999.99);

/// Partial update for [`Catalog::update_game`]. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct GameUpdate {
    pub title: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub age_rating: Option<u8>,
}

pub struct Catalog {
    games: Arc<dyn GameRepository>,
}

impl Catalog {
    pub fn new(games: Arc<dyn GameRepository>) -> Self {
        Self { games }
    }

    /// Validates and stores a new game.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Validation`] - a field is out of range.
    /// - [`StoreError::DuplicateGame`] - the title is taken.
    pub fn create_game(
        &self,
        title: &str,
        price: Decimal,
        category: &str,
        age_rating: u8,
    ) -> Result<Game, StoreError> {
        let game = Game::new(title, price, category, age_rating)?;
        let game = self.games.save(game)?;
        info!(game_id = ?game.id(), title = %game.title(), %price, "game created");
        Ok(game)
    }

    pub fn find_game(&self, id: GameId) -> Result<Game, StoreError> {
        self.games.find_by_id(id).ok_or(StoreError::GameNotFound(id))
    }

    pub fn find_by_title(&self, title: &str) -> Option<Game> {
        let title = GameTitle::new(title).ok()?;
        self.games.find_by_title(&title)
    }

    pub fn list_all(&self) -> Vec<Game> {
        self.games.find_all()
    }

    pub fn list_available(&self) -> Vec<Game> {
        self.games.find_available()
    }

    /// Available games sorted by price; ties keep id order.
    pub fn list_sorted_by_price(&self, ascending: bool) -> Vec<Game> {
        let mut games = self.games.find_available();
        if ascending {
            games.sort_by(|a, b| a.price().cmp(&b.price()));
        } else {
            games.sort_by(|a, b| b.price().cmp(&a.price()));
        }
        games
    }

    /// Games in `category`. A blank category lists every available game.
    pub fn filter_by_category(&self, category: &str) -> Vec<Game> {
        if category.trim().is_empty() {
            return self.list_available();
        }
        self.games.find_by_category(category)
    }

    /// Games priced within `[min, max]`. Missing bounds default to zero and
    /// [`DEFAULT_MAX_PRICE`].
    pub fn filter_by_price_range(
        &self,
        min: Option<Decimal>,
        max: Option<Decimal>,
    ) -> Result<Vec<Game>, StoreError> {
        let min = min.unwrap_or(Decimal::ZERO);
        let max = max.unwrap_or(DEFAULT_MAX_PRICE);
        if min > max {
            return Err(ValidationError::InvertedPriceRange.into());
        }
        Ok(self.games.find_by_price_range(min, max))
    }

    /// Games rated for `customer_age` or younger.
    pub fn filter_for_age(&self, customer_age: u8) -> Vec<Game> {
        self.games.find_by_age_rating(customer_age)
    }

    pub fn list_free(&self) -> Vec<Game> {
        self.games.find_free()
    }

    /// Applies `update` to a stored game.
    ///
    /// Blank title or category strings are ignored. The first invalid field
    /// aborts the update and nothing is written.
    ///
    /// # Errors
    ///
    /// - [`StoreError::GameNotFound`] - unknown id.
    /// - [`StoreError::DuplicateGame`] - renaming onto an existing title.
    /// - [`StoreError::Validation`] - a field is out of range.
    pub fn update_game(&self, id: GameId, update: GameUpdate) -> Result<Game, StoreError> {
        let mut game = self.find_game(id)?;

        if let Some(title) = update.title.as_deref().filter(|t| !t.trim().is_empty()) {
            game.set_title(title)?;
        }
        if let Some(price) = update.price {
            game.set_price(price)?;
        }
        if let Some(category) = update.category.as_deref().filter(|c| !c.trim().is_empty()) {
            game.set_category(category)?;
        }
        if let Some(age_rating) = update.age_rating {
            game.set_age_rating(age_rating)?;
        }

        let game = self.games.update(game)?;
        info!(game_id = %id, title = %game.title(), "game updated");
        Ok(game)
    }

    /// Toggles whether a game can be bought.
    pub fn set_availability(&self, id: GameId, available: bool) -> Result<Game, StoreError> {
        let mut game = self.find_game(id)?;
        game.set_available(available);
        self.games.update(game)
    }

    /// # Errors
    ///
    /// [`StoreError::GameNotFound`] if nothing is stored under `id`.
    pub fn delete_game(&self, id: GameId) -> Result<(), StoreError> {
        if !self.games.delete_by_id(id) {
            return Err(StoreError::GameNotFound(id));
        }
        info!(game_id = %id, "game deleted");
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.games.count()
    }

    /// Availability and age only; ownership and balance are the engine's concern.
    pub fn can_customer_buy(&self, game: &Game, customer_age: u8) -> bool {
        game.is_available() && game.is_age_appropriate(customer_age)
    }

    /// Stores the sample catalog, skipping titles that already exist.
    /// Returns the number of games added.
    pub fn seed_sample_catalog(&self) -> Result<usize, StoreError> {
        let mut added = 0;
        for (title, price, category, age_rating) in SAMPLE_CATALOG {
            match self.create_game(title, *price, category, *age_rating) {
                Ok(_) => added += 1,
                Err(StoreError::DuplicateGame(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(added)
    }
}

const SAMPLE_CATALOG: &[(&str, Decimal, &str, u8)] = &[
    ("Minecraft", dec!(89.90), "Adventure", 10),
    ("FIFA 2023", dec!(199.90), "Sports", 0),
    ("The Sims 4", dec!(129.90), "Simulation", 12),
    ("Grand Theft Auto V", dec!(149.90), "Action", 18),
    ("Fortnite", dec!(0), "Battle Royale", 12),
    ("Hades", dec!(79.90), "Roguelike", 14),
    ("Stardew Valley", dec!(24.99), "Simulation", 0),
    ("Celeste", dec!(36.90), "Platformer", 10),
    ("Among Us", dec!(19.99), "Party", 7),
    ("Cyberpunk 2077", dec!(149.99), "RPG", 18),
    ("Valorant", dec!(0), "FPS", 14),
    ("Rocket League", dec!(39.99), "Sports", 3),
];
