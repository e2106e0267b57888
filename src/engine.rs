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

//! Purchase engine.
//!
//! The [`Engine`] turns purchase requests into committed changes to a
//! customer's balance and owned games. It supports three paths:
//!
//! - **Single**: one game by id.
//! - **Cart**: every line of a [`Cart`], charged at the cart total.
//! - **Greedy**: as many games as the balance allows from a candidate pool,
//!   cheapest first.
//!
//! # Transactions
//!
//! Every path works on a copy of the stored customer. The debit, the owned
//! game additions and the repository update either all take effect or none
//! do: the copy only becomes visible when `update` succeeds.
//!
//! # Thread Safety
//!
//! Purchases for the same customer are serialized by that customer's lock in
//! a [`CustomerLocks`] table, held from the first read to the final update.
//! Different customers proceed in parallel. Share the table with
//! [`Accounts`](crate::Accounts) so balance top-ups are serialized too.

use crate::base::{CustomerId, GameId};
use crate::cart::Cart;
use crate::customer::Customer;
use crate::eligibility;
use crate::error::StoreError;
use crate::game::Game;
use crate::locks::CustomerLocks;
use crate::purchase_log::{PurchaseKind, PurchaseLog};
use crate::purchase_result::PurchaseResult;
use crate::repository::{CustomerRepository, GameRepository};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Purchase allocator over a game and a customer repository.
///
/// # Invariants
///
/// - A customer's balance never goes negative.
/// - A game appears at most once in a customer's owned set.
/// - Rejected or failed purchases leave the stored customer untouched.
pub struct Engine {
    games: Arc<dyn GameRepository>,
    customers: Arc<dyn CustomerRepository>,
    locks: Arc<CustomerLocks>,
    log: PurchaseLog,
}

impl Engine {
    pub fn new(games: Arc<dyn GameRepository>, customers: Arc<dyn CustomerRepository>) -> Self {
        Self::with_locks(games, customers, Arc::new(CustomerLocks::new()))
    }

    /// An engine that serializes purchases through a shared lock table.
    pub fn with_locks(
        games: Arc<dyn GameRepository>,
        customers: Arc<dyn CustomerRepository>,
        locks: Arc<CustomerLocks>,
    ) -> Self {
        Engine {
            games,
            customers,
            locks,
            log: PurchaseLog::new(),
        }
    }

    /// Committed purchases, in commit order.
    pub fn log(&self) -> &PurchaseLog {
        &self.log
    }

    /// Buys a single game.
    ///
    /// # Errors
    ///
    /// - [`StoreError::CustomerNotFound`] - unknown customer id.
    /// - [`StoreError::GameNotFound`] - unknown game id.
    ///
    /// Eligibility failures are reported through the returned
    /// [`PurchaseResult`], with every violated rule in the message.
    pub fn purchase_game(
        &self,
        customer_id: CustomerId,
        game_id: GameId,
    ) -> Result<PurchaseResult, StoreError> {
        self.locks.with_lock(customer_id, || {
            let customer = self.load_customer(customer_id)?;
            let game = self
                .games
                .find_by_id(game_id)
                .ok_or(StoreError::GameNotFound(game_id))?;

            let violations = eligibility::check_game(&customer, &game);
            if !violations.is_empty() {
                debug!(%customer_id, %game_id, ?violations, "purchase rejected");
                return Ok(PurchaseResult::rejected(&violations));
            }

            let price = game.price();
            Ok(self.commit(
                customer,
                PurchaseKind::Single,
                vec![game],
                price,
                "purchase completed successfully".to_string(),
            ))
        })
    }

    /// Checks out a cart, clearing it on success.
    ///
    /// The balance is checked against the cart total; availability, age and
    /// ownership are checked against each game as currently stored in the
    /// catalog.
    ///
    /// # Errors
    ///
    /// - [`StoreError::CustomerNotFound`] - unknown customer id.
    /// - [`StoreError::CartOwnerMismatch`] - the cart belongs to someone else.
    /// - [`StoreError::GameTitleNotFound`] - a line's game is no longer in the catalog.
    pub fn purchase_cart(
        &self,
        customer_id: CustomerId,
        cart: &mut Cart,
    ) -> Result<PurchaseResult, StoreError> {
        self.locks.with_lock(customer_id, || {
            let customer = self.load_customer(customer_id)?;
            if cart.customer_id() != customer_id {
                return Err(StoreError::CartOwnerMismatch {
                    owner: cart.customer_id(),
                    customer: customer_id,
                });
            }
            if cart.is_empty() {
                return Ok(PurchaseResult::failed("cart is empty"));
            }

            let games = cart
                .items()
                .iter()
                .map(|item| {
                    let title = item.game().title();
                    self.games
                        .find_by_title(title)
                        .ok_or_else(|| StoreError::GameTitleNotFound(title.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            let total = cart.total_value();

            let violations = eligibility::check_cart(&customer, &games, total);
            if !violations.is_empty() {
                debug!(%customer_id, ?violations, "cart purchase rejected");
                return Ok(PurchaseResult::rejected(&violations));
            }

            let result = self.commit(
                customer,
                PurchaseKind::Cart,
                games,
                total,
                "cart purchase completed successfully".to_string(),
            );
            if result.is_success() {
                cart.clear();
            }
            Ok(result)
        })
    }

    /// Buys as many games from `candidates` as the balance allows.
    ///
    /// Candidates that are unavailable, age-inappropriate or already owned are
    /// dropped; the rest are walked in ascending price order (ties keep their
    /// input order) and each one that still fits the remaining balance is
    /// bought. Unaffordable candidates are skipped, not treated as the end of
    /// the walk. A title repeated in the pool is bought once.
    ///
    /// # Errors
    ///
    /// - [`StoreError::CustomerNotFound`] - unknown customer id.
    pub fn purchase_maximum(
        &self,
        customer_id: CustomerId,
        candidates: &[Game],
    ) -> Result<PurchaseResult, StoreError> {
        self.locks.with_lock(customer_id, || {
            let mut working = self.load_customer(customer_id)?;
            if candidates.is_empty() {
                return Ok(PurchaseResult::failed("no games available"));
            }

            let mut suitable: Vec<&Game> = candidates
                .iter()
                .filter(|game| eligibility::catalog_violations(&working, game).is_empty())
                .collect();
            // `sort_by` is stable: equal prices keep input order.
            suitable.sort_by(|a, b| a.price().cmp(&b.price()));

            let mut remaining = working.balance();
            let mut spent = Decimal::ZERO;
            let mut acquired = Vec::new();

            for game in suitable {
                let price = game.price();
                if working.owns_game(game) || remaining < price {
                    continue;
                }
                if let Err(error) = working.deduct_balance(price) {
                    warn!(%customer_id, %error, "greedy purchase aborted");
                    return Ok(PurchaseResult::failed(format!(
                        "failed to process purchase: {error}"
                    )));
                }
                remaining -= price;
                spent += price;
                working.add_owned_game(game.clone());
                acquired.push(game.clone());
            }

            if acquired.is_empty() {
                debug!(
                    %customer_id,
                    balance = %remaining,
                    "greedy purchase found nothing affordable"
                );
                return Ok(PurchaseResult::failed(
                    "no game could be purchased with the available balance",
                ));
            }

            let message = format!("purchased {} games successfully", acquired.len());
            Ok(self.persist(working, PurchaseKind::Greedy, acquired, spent, message))
        })
    }

    fn load_customer(&self, customer_id: CustomerId) -> Result<Customer, StoreError> {
        self.customers
            .find_by_id(customer_id)
            .ok_or(StoreError::CustomerNotFound(customer_id))
    }

    /// Debits `total`, grants `games`, then persists.
    fn commit(
        &self,
        mut working: Customer,
        kind: PurchaseKind,
        games: Vec<Game>,
        total: Decimal,
        message: String,
    ) -> PurchaseResult {
        if let Err(error) = working.deduct_balance(total) {
            warn!(customer = %working.email(), %error, "purchase aborted before commit");
            return PurchaseResult::failed(format!("failed to process purchase: {error}"));
        }
        for game in &games {
            working.add_owned_game(game.clone());
        }
        self.persist(working, kind, games, total, message)
    }

    /// Writes the working copy back. Nothing is visible unless this succeeds.
    fn persist(
        &self,
        working: Customer,
        kind: PurchaseKind,
        games: Vec<Game>,
        total: Decimal,
        message: String,
    ) -> PurchaseResult {
        let stored = match self.customers.update(working) {
            Ok(stored) => stored,
            Err(error) => {
                warn!(%kind, %error, "purchase rolled back");
                return PurchaseResult::failed(format!("failed to save customer: {error}"));
            }
        };

        // Only saved customers can be loaded, so the id is always present.
        if let Some(customer_id) = stored.id() {
            let titles = games.iter().map(|game| game.title().clone()).collect();
            let receipt = self.log.record(customer_id, kind, titles, total);
            info!(%customer_id, %receipt, %kind, %total, games = games.len(), "purchase committed");
        }

        PurchaseResult::succeeded(message, total, games)
    }
}
