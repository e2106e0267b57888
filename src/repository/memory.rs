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

//! Concurrent in-memory repositories.
//!
//! Records live in a [`DashMap`] keyed by storage id; ids come from an
//! [`AtomicU64`] starting at 1. Reads hand out clones, so callers never hold
//! a map shard lock across their own work.
//!
//! Business keys (game title, customer email) are claimed in a second map
//! through its entry API before a record is written, so two writers racing
//! for the same key cannot both win. The key map is never locked together
//! with the record map.

use super::{CustomerRepository, GameRepository};
use crate::base::{CustomerId, Email, GameId, GameTitle};
use crate::customer::Customer;
use crate::error::StoreError;
use crate::game::Game;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

#[derive(Debug)]
pub struct InMemoryGameRepository {
    games: DashMap<GameId, Game>,
    titles: DashMap<GameTitle, GameId>,
    next_id: AtomicU64,
}

impl InMemoryGameRepository {
    pub fn new() -> Self {
        Self {
            games: DashMap::new(),
            titles: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Removes every game and restarts id assignment at 1.
    pub fn clear(&self) {
        self.games.clear();
        self.titles.clear();
        self.next_id.store(1, Ordering::SeqCst);
    }

    fn claim_title(&self, title: &GameTitle, id: GameId) -> Result<(), StoreError> {
        let owner = *self.titles.entry(title.clone()).or_insert(id);
        if owner != id {
            return Err(StoreError::DuplicateGame(title.clone()));
        }
        Ok(())
    }

    fn release_title(&self, title: &GameTitle, id: GameId) {
        self.titles.remove_if(title, |_, owner| *owner == id);
    }
}

impl Default for InMemoryGameRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl GameRepository for InMemoryGameRepository {
    fn save(&self, mut game: Game) -> Result<Game, StoreError> {
        // Ids are drawn only once the title is free.
        let id = match self.titles.entry(game.title().clone()) {
            Entry::Occupied(owner) => match game.id() {
                Some(id) if id == *owner.get() => id,
                _ => return Err(StoreError::DuplicateGame(game.title().clone())),
            },
            Entry::Vacant(slot) => {
                let id = game
                    .id()
                    .unwrap_or_else(|| GameId(self.next_id.fetch_add(1, Ordering::SeqCst)));
                slot.insert(id);
                id
            }
        };
        game.assign_id(id);
        trace!(game_id = %id, title = %game.title(), "saving game");

        if let Some(previous) = self.games.insert(id, game.clone()) {
            if previous.title() != game.title() {
                self.release_title(previous.title(), id);
            }
        }
        Ok(game)
    }

    fn find_by_id(&self, id: GameId) -> Option<Game> {
        self.games.get(&id).map(|entry| entry.value().clone())
    }

    fn find_all(&self) -> Vec<Game> {
        let mut games: Vec<Game> = self
            .games
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        games.sort_by_key(|game| game.id());
        games
    }

    fn update(&self, game: Game) -> Result<Game, StoreError> {
        let id = game.id().ok_or(StoreError::Unsaved)?;
        let previous = self
            .games
            .get(&id)
            .map(|entry| entry.title().clone())
            .ok_or(StoreError::GameNotFound(id))?;
        let renamed = &previous != game.title();
        if renamed {
            self.claim_title(game.title(), id)?;
        }

        match self.games.get_mut(&id) {
            Some(mut slot) => *slot = game.clone(),
            None => {
                if renamed {
                    self.release_title(game.title(), id);
                }
                return Err(StoreError::GameNotFound(id));
            }
        }
        if renamed {
            self.release_title(&previous, id);
        }
        Ok(game)
    }

    fn delete_by_id(&self, id: GameId) -> bool {
        match self.games.remove(&id) {
            Some((_, game)) => {
                self.release_title(game.title(), id);
                true
            }
            None => false,
        }
    }

    fn count(&self) -> usize {
        self.games.len()
    }

    fn find_by_title(&self, title: &GameTitle) -> Option<Game> {
        let id = *self.titles.get(title)?;
        self.find_by_id(id)
    }

    fn exists_by_title(&self, title: &GameTitle) -> bool {
        self.titles.contains_key(title)
    }
}

#[derive(Debug)]
pub struct InMemoryCustomerRepository {
    customers: DashMap<CustomerId, Customer>,
    emails: DashMap<Email, CustomerId>,
    next_id: AtomicU64,
}

impl InMemoryCustomerRepository {
    pub fn new() -> Self {
        Self {
            customers: DashMap::new(),
            emails: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn clear(&self) {
        self.customers.clear();
        self.emails.clear();
        self.next_id.store(1, Ordering::SeqCst);
    }

    fn claim_email(&self, email: &Email, id: CustomerId) -> Result<(), StoreError> {
        let owner = *self.emails.entry(email.clone()).or_insert(id);
        if owner != id {
            return Err(StoreError::DuplicateCustomer(email.clone()));
        }
        Ok(())
    }

    fn release_email(&self, email: &Email, id: CustomerId) {
        self.emails.remove_if(email, |_, owner| *owner == id);
    }
}

impl Default for InMemoryCustomerRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomerRepository for InMemoryCustomerRepository {
    fn save(&self, mut customer: Customer) -> Result<Customer, StoreError> {
        let id = match self.emails.entry(customer.email().clone()) {
            Entry::Occupied(owner) => match customer.id() {
                Some(id) if id == *owner.get() => id,
                _ => return Err(StoreError::DuplicateCustomer(customer.email().clone())),
            },
            Entry::Vacant(slot) => {
                let id = customer
                    .id()
                    .unwrap_or_else(|| CustomerId(self.next_id.fetch_add(1, Ordering::SeqCst)));
                slot.insert(id);
                id
            }
        };
        customer.assign_id(id);
        trace!(customer_id = %id, email = %customer.email(), "saving customer");

        if let Some(previous) = self.customers.insert(id, customer.clone()) {
            if previous.email() != customer.email() {
                self.release_email(previous.email(), id);
            }
        }
        Ok(customer)
    }

    fn find_by_id(&self, id: CustomerId) -> Option<Customer> {
        self.customers.get(&id).map(|entry| entry.value().clone())
    }

    fn find_all(&self) -> Vec<Customer> {
        let mut customers: Vec<Customer> = self
            .customers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        customers.sort_by_key(|customer| customer.id());
        customers
    }

    fn update(&self, customer: Customer) -> Result<Customer, StoreError> {
        let id = customer.id().ok_or(StoreError::Unsaved)?;
        let previous = self
            .customers
            .get(&id)
            .map(|entry| entry.email().clone())
            .ok_or(StoreError::CustomerNotFound(id))?;
        let rekeyed = &previous != customer.email();
        if rekeyed {
            self.claim_email(customer.email(), id)?;
        }

        match self.customers.get_mut(&id) {
            Some(mut slot) => *slot = customer.clone(),
            None => {
                if rekeyed {
                    self.release_email(customer.email(), id);
                }
                return Err(StoreError::CustomerNotFound(id));
            }
        }
        if rekeyed {
            self.release_email(&previous, id);
        }
        Ok(customer)
    }

    fn delete_by_id(&self, id: CustomerId) -> bool {
        match self.customers.remove(&id) {
            Some((_, customer)) => {
                self.release_email(customer.email(), id);
                true
            }
            None => false,
        }
    }

    fn count(&self) -> usize {
        self.customers.len()
    }

    fn find_by_email(&self, email: &Email) -> Option<Customer> {
        let id = *self.emails.get(email)?;
        self.find_by_id(id)
    }

    fn exists_by_email(&self, email: &Email) -> bool {
        self.emails.contains_key(email)
    }
}
