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

//! Concurrency tests for the purchase engine and customer service.
//!
//! These tests hammer a single store from many threads and check that no
//! purchase is lost or double-charged. A background thread runs
//! parking_lot's deadlock detector (`deadlock_detection` feature) over the
//! per-customer locks.

use game_store_rs::{
    Cart, CustomerId, CustomerLocks, Engine, Game, GameId, GameRepository,
    InMemoryCustomerRepository, InMemoryGameRepository, Store, StoreError,
};
use parking_lot::deadlock;
use rayon::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

const NUM_THREADS: usize = 16;

// =============================================================================
// Helpers
// =============================================================================

/// Starts a background deadlock detector. Dropping the returned guard stops it.
struct DeadlockDetector {
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl DeadlockDetector {
    fn start() -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();

        let handle = thread::spawn(move || {
            while flag.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(50));
                let deadlocks = deadlock::check_deadlock();
                if !deadlocks.is_empty() {
                    for (i, threads) in deadlocks.iter().enumerate() {
                        eprintln!("Deadlock #{}", i + 1);
                        for t in threads {
                            eprintln!("Thread ID: {:?}\n{:#?}", t.thread_id(), t.backtrace());
                        }
                    }
                    panic!("Deadlock detected! See output above for details.");
                }
            }
        });

        Self {
            running,
            handle: Some(handle),
        }
    }
}

impl Drop for DeadlockDetector {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn store_with_games(count: usize, price: Decimal) -> (Arc<Store>, Vec<Game>) {
    let store = Store::in_memory();
    let games = (0..count)
        .map(|i| {
            store
                .catalog()
                .create_game(&format!("Game {i}"), price, "Action", 0)
                .unwrap()
        })
        .collect();
    (Arc::new(store), games)
}

fn register(store: &Store, email: &str, balance: Decimal) -> CustomerId {
    store
        .accounts()
        .register("Customer", email, balance, 30)
        .unwrap()
        .id()
        .unwrap()
}

// =============================================================================
// Same Customer
// =============================================================================

#[test]
fn concurrent_purchases_never_overspend() {
    let _detector = DeadlockDetector::start();
    let (store, games) = store_with_games(NUM_THREADS * 2, dec!(10.00));
    let id = register(&store, "ana@test.com", dec!(100.00));
    let successes = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = games
        .chunks(2)
        .map(|pair| {
            let store = Arc::clone(&store);
            let successes = Arc::clone(&successes);
            let ids: Vec<GameId> = pair.iter().filter_map(Game::id).collect();
            thread::spawn(move || {
                for game_id in ids {
                    if store.engine().purchase_game(id, game_id).unwrap().is_success() {
                        successes.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let customer = store.accounts().find_customer(id).unwrap();
    assert_eq!(successes.load(Ordering::SeqCst), 10);
    assert_eq!(customer.owned_count(), 10);
    assert_eq!(customer.balance(), Decimal::ZERO);
    assert_eq!(store.engine().log().len(), 10);
}

#[test]
fn same_game_is_bought_once() {
    let _detector = DeadlockDetector::start();
    let (store, games) = store_with_games(1, dec!(10.00));
    let id = register(&store, "ana@test.com", dec!(100.00));
    let game_id = games[0].id().unwrap();

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || store.engine().purchase_game(id, game_id).unwrap())
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_success()).count(), 1);
    assert_eq!(
        store.accounts().find_customer(id).unwrap().balance(),
        dec!(90.00)
    );
}

#[test]
fn top_ups_and_purchases_do_not_lose_updates() {
    let _detector = DeadlockDetector::start();
    let (store, games) = store_with_games(NUM_THREADS, dec!(5.00));
    let id = register(&store, "ana@test.com", dec!(1000.00));

    let handles: Vec<_> = games
        .into_iter()
        .map(|game| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                store.accounts().add_balance(id, dec!(1.00)).unwrap();
                let mut cart = Cart::new(id);
                cart.add_item(game, 1).unwrap();
                assert!(store.engine().purchase_cart(id, &mut cart).unwrap().is_success());
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // 1000 + 16 * 1.00 - 16 * 5.00
    let customer = store.accounts().find_customer(id).unwrap();
    assert_eq!(customer.balance(), dec!(936.00));
    assert_eq!(customer.owned_count(), NUM_THREADS);
}

// =============================================================================
// Many Customers
// =============================================================================

#[test]
fn customers_buy_in_parallel() {
    let _detector = DeadlockDetector::start();
    let (store, games) = store_with_games(8, dec!(12.50));
    let ids: Vec<CustomerId> = (0..100)
        .map(|i| register(&store, &format!("c{i}@test.com"), dec!(50.00)))
        .collect();

    let results: Vec<_> = ids
        .par_iter()
        .map(|id| store.engine().purchase_maximum(*id, &games).unwrap())
        .collect();

    assert!(results.iter().all(|r| r.is_success() && r.games().len() == 4));
    assert!(
        store
            .accounts()
            .list_all()
            .iter()
            .all(|c| c.balance() == Decimal::ZERO && c.owned_count() == 4)
    );

    let mut receipt_ids: Vec<_> = store.engine().log().drain().iter().map(|r| r.id).collect();
    receipt_ids.sort();
    receipt_ids.dedup();
    assert_eq!(receipt_ids.len(), 100);
}

// =============================================================================
// Unique Keys and Lock Table
// =============================================================================

#[test]
fn racing_registrations_keep_email_unique() {
    let _detector = DeadlockDetector::start();
    let store = Arc::new(Store::in_memory());

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                store
                    .accounts()
                    .register(&format!("Ana {i}"), "ana@test.com", dec!(10.00), 20)
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, StoreError::DuplicateCustomer(_)))
    );
    assert_eq!(store.accounts().count(), 1);
}

#[test]
fn racing_game_creation_keeps_title_unique() {
    let _detector = DeadlockDetector::start();
    let store = Arc::new(Store::in_memory());

    let created: usize = (0..NUM_THREADS)
        .into_par_iter()
        .filter(|_| {
            store
                .catalog()
                .create_game("Hades", dec!(79.90), "Roguelike", 14)
                .is_ok()
        })
        .count();

    assert_eq!(created, 1);
    assert_eq!(store.catalog().count(), 1);
}

#[test]
fn unknown_customer_contention_leaves_no_locks() {
    let _detector = DeadlockDetector::start();
    let games = Arc::new(InMemoryGameRepository::new());
    let locks = Arc::new(CustomerLocks::new());
    let engine = Arc::new(Engine::with_locks(
        games.clone(),
        Arc::new(InMemoryCustomerRepository::new()),
        Arc::clone(&locks),
    ));
    let hades = games
        .save(Game::new("Hades", dec!(79.90), "Roguelike", 14).unwrap())
        .unwrap()
        .id()
        .unwrap();

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for n in 0..100 {
                    let id = CustomerId(n % 4);
                    assert!(engine.purchase_game(id, hades).is_err());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(locks.is_empty());
}
