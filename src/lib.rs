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

//! # Game Store
//!
//! This library provides a game storefront engine: a catalog of games,
//! customer accounts with balances and owned libraries, shopping carts, and a
//! purchase engine that buys a single game, checks out a cart, or buys as many
//! games as a budget allows.
//!
//! ## Core Components
//!
//! - [`Engine`]: Purchase allocator enforcing eligibility and committing purchases
//! - [`Catalog`]: Game creation, lookup, filtering and editing
//! - [`Accounts`]: Customer registration, lookup and balance top-ups
//! - [`Cart`]: Per-customer list of games to check out together
//! - [`PurchaseResult`]: Outcome of every purchase attempt
//! - [`StoreError`]: Error types for lookups, duplicates and invalid input
//!
//! ## Example
//!
//! ```
//! use game_store_rs::Store;
//! use rust_decimal_macros::dec;
//!
//! let store = Store::in_memory();
//! let hades = store.catalog().create_game("Hades", dec!(79.90), "Roguelike", 14).unwrap();
//! let ana = store.accounts().register("Ana", "ana@example.com", dec!(100.00), 20).unwrap();
//!
//! // Buy a single game
//! let result = store
//!     .engine()
//!     .purchase_game(ana.id().unwrap(), hades.id().unwrap())
//!     .unwrap();
//! assert!(result.is_success());
//!
//! // Check the remaining balance
//! let ana = store.accounts().find_customer(ana.id().unwrap()).unwrap();
//! assert_eq!(ana.balance(), dec!(20.10));
//! ```
//!
//! ## Thread Safety
//!
//! Repositories are concurrent maps. The engine and the customer service
//! serialize changes per customer through a shared [`CustomerLocks`] table,
//! so purchases for different customers run in parallel.

pub mod accounts;
mod base;
pub mod cart;
pub mod catalog;
pub mod customer;
pub mod eligibility;
mod engine;
pub mod error;
pub mod game;
mod locks;
mod purchase_log;
mod purchase_result;
pub mod repository;
mod store;
pub mod validation;

pub use accounts::{Accounts, CustomerUpdate};
pub use base::{CustomerId, Email, GameId, GameTitle, ReceiptId};
pub use cart::{Cart, CartItem};
pub use catalog::{Catalog, GameUpdate};
pub use customer::Customer;
pub use eligibility::Violation;
pub use engine::Engine;
pub use error::{StoreError, ValidationError};
pub use game::Game;
pub use locks::CustomerLocks;
pub use purchase_log::{PurchaseKind, PurchaseLog, Receipt};
pub use purchase_result::PurchaseResult;
pub use repository::{
    CustomerRepository, GameRepository, InMemoryCustomerRepository, InMemoryGameRepository,
};
pub use store::Store;
