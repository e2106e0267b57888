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

//! Wiring of repositories, services and the purchase engine.

use crate::accounts::Accounts;
use crate::catalog::Catalog;
use crate::engine::Engine;
use crate::locks::CustomerLocks;
use crate::repository::{
    CustomerRepository, GameRepository, InMemoryCustomerRepository, InMemoryGameRepository,
};
use std::sync::Arc;

/// A catalog, the customer accounts and an engine sharing one pair of
/// repositories and one customer lock table.
pub struct Store {
    catalog: Catalog,
    accounts: Accounts,
    engine: Engine,
}

impl Store {
    pub fn new(games: Arc<dyn GameRepository>, customers: Arc<dyn CustomerRepository>) -> Self {
        let locks = Arc::new(CustomerLocks::new());
        Store {
            catalog: Catalog::new(Arc::clone(&games)),
            accounts: Accounts::with_locks(Arc::clone(&customers), Arc::clone(&locks)),
            engine: Engine::with_locks(games, customers, locks),
        }
    }

    /// A store backed by empty in-memory repositories.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryGameRepository::new()),
            Arc::new(InMemoryCustomerRepository::new()),
        )
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn accounts(&self) -> &Accounts {
        &self.accounts
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::in_memory()
    }
}
