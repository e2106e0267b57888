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

//! Shopping carts.
//!
//! A cart belongs to one customer and holds at most one line per game. Each
//! line captures the unit price at the moment the game was added.
//!
//! [`Cart::add_item`] refuses a line whose total, or a cart whose total,
//! would leave the range of [`Decimal`], so the totals below never overflow.

use crate::base::{CustomerId, GameTitle};
use crate::error::ValidationError;
use crate::game::Game;
use crate::validation;
use rust_decimal::Decimal;
use serde::Serialize;

/// One cart line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartItem {
    game: Game,
    quantity: u32,
    unit_price: Decimal,
}

impl CartItem {
    fn new(game: Game, quantity: u32) -> Self {
        let unit_price = game.price();
        Self {
            game,
            quantity,
            unit_price,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// `unit_price * quantity`.
    pub fn line_total(&self) -> Decimal {
        line_total(self.unit_price, self.quantity).unwrap_or(Decimal::MAX)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    customer_id: CustomerId,
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new(customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            items: Vec::new(),
        }
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Adds `quantity` copies of `game`, merging with an existing line.
    ///
    /// The cart is unchanged on error.
    pub fn add_item(&mut self, game: Game, quantity: u32) -> Result<(), ValidationError> {
        if quantity == 0 {
            return Err(ValidationError::ZeroQuantity);
        }
        let index = self.position(game.title());
        let (unit_price, merged) = match index {
            Some(index) => {
                let item = &self.items[index];
                let merged = item
                    .quantity
                    .checked_add(quantity)
                    .ok_or(ValidationError::QuantityOverflow)?;
                (item.unit_price, merged)
            }
            None => (game.price(), quantity),
        };
        self.total_items()
            .checked_add(quantity)
            .ok_or(ValidationError::QuantityOverflow)?;
        let line = line_total(unit_price, merged).ok_or(ValidationError::AmountOverflow)?;
        let others = self
            .items
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != index)
            .map(|(_, item)| item.line_total());
        validation::checked_sum(others.chain(std::iter::once(line)))?;

        match index {
            Some(index) => self.items[index].quantity = merged,
            None => self.items.push(CartItem::new(game, merged)),
        }
        Ok(())
    }

    /// Drops the whole line for `title`. Returns `false` if there was none.
    pub fn remove_item(&mut self, title: &GameTitle) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.game.title() != title);
        self.items.len() != before
    }

    /// Removes up to `quantity` copies; the line disappears when it reaches zero.
    pub fn remove_quantity(
        &mut self,
        title: &GameTitle,
        quantity: u32,
    ) -> Result<(), ValidationError> {
        if quantity == 0 {
            return Err(ValidationError::ZeroQuantity);
        }
        if let Some(index) = self.position(title) {
            let item = &mut self.items[index];
            item.quantity = item.quantity.saturating_sub(quantity);
            if item.quantity == 0 {
                self.items.remove(index);
            }
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_value(&self) -> Decimal {
        validation::checked_sum(self.items.iter().map(CartItem::line_total))
            .unwrap_or(Decimal::MAX)
    }

    /// Number of copies across all lines.
    pub fn total_items(&self) -> u32 {
        self.items.iter().map(CartItem::quantity).sum()
    }

    fn position(&self, title: &GameTitle) -> Option<usize> {
        self.items.iter().position(|item| item.game.title() == title)
    }
}

fn line_total(unit_price: Decimal, quantity: u32) -> Option<Decimal> {
    unit_price.checked_mul(Decimal::from(quantity))
}
