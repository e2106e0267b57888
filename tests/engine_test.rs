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

//! Purchase engine integration tests.

use game_store_rs::{
    Cart, Customer, CustomerId, CustomerLocks, CustomerRepository, Engine, Game, GameId,
    GameRepository, InMemoryCustomerRepository, InMemoryGameRepository, PurchaseKind, Store,
    StoreError,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

fn add_game(store: &Store, title: &str, price: Decimal, age_rating: u8) -> Game {
    store
        .catalog()
        .create_game(title, price, "Action", age_rating)
        .unwrap()
}

fn add_customer(store: &Store, email: &str, balance: Decimal, age: u8) -> CustomerId {
    store
        .accounts()
        .register("Customer", email, balance, age)
        .unwrap()
        .id()
        .unwrap()
}

fn customer(store: &Store, id: CustomerId) -> Customer {
    store.accounts().find_customer(id).unwrap()
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn free_game_purchase_keeps_balance() {
    let store = Store::in_memory();
    let fortnite = add_game(&store, "Fortnite", Decimal::ZERO, 12);
    let id = add_customer(&store, "ana@test.com", dec!(100.00), 20);

    let result = store
        .engine()
        .purchase_game(id, fortnite.id().unwrap())
        .unwrap();

    assert!(result.is_success());
    assert_eq!(result.total(), Decimal::ZERO);
    assert_eq!(customer(&store, id).balance(), dec!(100.00));
    assert!(customer(&store, id).owns_game(&fortnite));
}

#[test]
fn greedy_with_small_balance_takes_only_free_game() {
    let store = Store::in_memory();
    let free = add_game(&store, "Fortnite", Decimal::ZERO, 12);
    let paid = add_game(&store, "FIFA 2023", dec!(199.90), 0);
    let id = add_customer(&store, "ana@test.com", dec!(50.00), 20);

    let result = store
        .engine()
        .purchase_maximum(id, &[free.clone(), paid])
        .unwrap();

    assert!(result.is_success());
    assert_eq!(result.games(), &[free]);
    assert_eq!(result.total(), Decimal::ZERO);
    assert_eq!(customer(&store, id).balance(), dec!(50.00));
}

#[test]
fn greedy_with_large_balance_takes_both() {
    let store = Store::in_memory();
    let free = add_game(&store, "Fortnite", Decimal::ZERO, 12);
    let paid = add_game(&store, "FIFA 2023", dec!(199.90), 0);
    let id = add_customer(&store, "ana@test.com", dec!(500.00), 20);

    let result = store
        .engine()
        .purchase_maximum(id, &[paid, free])
        .unwrap();

    assert!(result.is_success());
    assert_eq!(result.games().len(), 2);
    assert_eq!(result.total(), dec!(199.90));
    assert_eq!(customer(&store, id).balance(), dec!(300.10));
}

#[test]
fn underage_purchase_is_rejected() {
    let store = Store::in_memory();
    let valorant = add_game(&store, "Valorant", Decimal::ZERO, 16);
    let id = add_customer(&store, "bia@test.com", dec!(80.00), 15);

    let result = store
        .engine()
        .purchase_game(id, valorant.id().unwrap())
        .unwrap();

    assert!(!result.is_success());
    assert!(result.message().contains("not appropriate for age 15"));
    let bia = customer(&store, id);
    assert_eq!(bia.balance(), dec!(80.00));
    assert_eq!(bia.owned_count(), 0);
}

#[test]
fn deleting_unknown_game_reports_not_found() {
    let store = Store::in_memory();
    add_game(&store, "Hades", dec!(79.90), 14);

    let err = store.catalog().delete_game(GameId(999)).unwrap_err();

    assert_eq!(err, StoreError::GameNotFound(GameId(999)));
    assert_eq!(store.catalog().count(), 1);
}

// =============================================================================
// Single Purchase
// =============================================================================

#[test]
fn free_game_needs_no_balance() {
    let store = Store::in_memory();
    let fortnite = add_game(&store, "Fortnite", Decimal::ZERO, 12);
    let id = add_customer(&store, "ana@test.com", Decimal::ZERO, 20);

    let result = store
        .engine()
        .purchase_game(id, fortnite.id().unwrap())
        .unwrap();

    assert!(result.is_success());
}

#[test]
fn repurchase_is_rejected_without_charge() {
    let store = Store::in_memory();
    let hades = add_game(&store, "Hades", dec!(79.90), 14);
    let id = add_customer(&store, "ana@test.com", dec!(200.00), 20);
    let engine = store.engine();

    assert!(engine.purchase_game(id, hades.id().unwrap()).unwrap().is_success());
    let again = engine.purchase_game(id, hades.id().unwrap()).unwrap();

    assert!(!again.is_success());
    assert!(again.message().contains("already owns"));
    assert_eq!(customer(&store, id).balance(), dec!(120.10));
}

#[test]
fn exact_balance_is_enough() {
    let store = Store::in_memory();
    let hades = add_game(&store, "Hades", dec!(79.90), 14);
    let id = add_customer(&store, "ana@test.com", dec!(79.90), 20);

    let result = store.engine().purchase_game(id, hades.id().unwrap()).unwrap();

    assert!(result.is_success());
    assert_eq!(customer(&store, id).balance(), Decimal::ZERO);
}

#[test]
fn unavailable_game_is_rejected() {
    let store = Store::in_memory();
    let hades = add_game(&store, "Hades", dec!(79.90), 14);
    store
        .catalog()
        .set_availability(hades.id().unwrap(), false)
        .unwrap();
    let id = add_customer(&store, "ana@test.com", dec!(100.00), 20);

    let result = store.engine().purchase_game(id, hades.id().unwrap()).unwrap();

    assert!(!result.is_success());
    assert!(result.message().contains("not available"));
}

#[test]
fn unknown_ids_are_hard_errors() {
    let store = Store::in_memory();
    let hades = add_game(&store, "Hades", dec!(79.90), 14);
    let id = add_customer(&store, "ana@test.com", dec!(100.00), 20);
    let engine = store.engine();

    assert_eq!(
        engine.purchase_game(CustomerId(42), hades.id().unwrap()),
        Err(StoreError::CustomerNotFound(CustomerId(42)))
    );
    assert_eq!(
        engine.purchase_game(id, GameId(42)),
        Err(StoreError::GameNotFound(GameId(42)))
    );
    assert!(engine.log().is_empty());
}

#[test]
fn every_violation_is_reported() {
    let store = Store::in_memory();
    let gta = add_game(&store, "Grand Theft Auto V", dec!(149.90), 18);
    store
        .catalog()
        .set_availability(gta.id().unwrap(), false)
        .unwrap();
    let id = add_customer(&store, "kid@test.com", dec!(10.00), 12);

    let result = store.engine().purchase_game(id, gta.id().unwrap()).unwrap();

    assert!(!result.is_success());
    let message = result.message();
    assert!(message.contains("not available"));
    assert!(message.contains("not appropriate"));
    assert!(message.contains("insufficient balance"));
}

// =============================================================================
// Cart Purchase
// =============================================================================

#[test]
fn cart_checkout_charges_total_and_clears_cart() {
    let store = Store::in_memory();
    let among_us = add_game(&store, "Among Us", dec!(19.99), 7);
    let celeste = add_game(&store, "Celeste", dec!(36.90), 10);
    let id = add_customer(&store, "ana@test.com", dec!(100.00), 20);

    let mut cart = Cart::new(id);
    cart.add_item(among_us.clone(), 1).unwrap();
    cart.add_item(celeste.clone(), 1).unwrap();

    let result = store.engine().purchase_cart(id, &mut cart).unwrap();

    assert!(result.is_success());
    assert_eq!(result.total(), dec!(56.89));
    assert!(cart.is_empty());
    let ana = customer(&store, id);
    assert_eq!(ana.balance(), dec!(43.11));
    assert!(ana.owns_game(&among_us) && ana.owns_game(&celeste));
}

#[test]
fn cart_over_budget_is_rejected_and_kept() {
    let store = Store::in_memory();
    let gta = add_game(&store, "Grand Theft Auto V", dec!(149.90), 18);
    let id = add_customer(&store, "ana@test.com", dec!(100.00), 20);

    let mut cart = Cart::new(id);
    cart.add_item(gta, 1).unwrap();

    let result = store.engine().purchase_cart(id, &mut cart).unwrap();

    assert!(!result.is_success());
    assert!(result.message().contains("insufficient balance"));
    assert_eq!(cart.total_items(), 1);
    assert_eq!(customer(&store, id).balance(), dec!(100.00));
}

#[test]
fn cart_with_owned_game_is_rejected() {
    let store = Store::in_memory();
    let hades = add_game(&store, "Hades", dec!(79.90), 14);
    let celeste = add_game(&store, "Celeste", dec!(36.90), 10);
    let id = add_customer(&store, "ana@test.com", dec!(200.00), 20);
    store.engine().purchase_game(id, hades.id().unwrap()).unwrap();

    let mut cart = Cart::new(id);
    cart.add_item(hades, 1).unwrap();
    cart.add_item(celeste.clone(), 1).unwrap();

    let result = store.engine().purchase_cart(id, &mut cart).unwrap();

    assert!(!result.is_success());
    assert!(result.message().contains("already owns game 'Hades'"));
    assert!(!customer(&store, id).owns_game(&celeste));
}

#[test]
fn empty_cart_fails() {
    let store = Store::in_memory();
    let id = add_customer(&store, "ana@test.com", dec!(100.00), 20);
    let mut cart = Cart::new(id);

    let result = store.engine().purchase_cart(id, &mut cart).unwrap();

    assert!(!result.is_success());
    assert_eq!(result.message(), "cart is empty");
}

#[test]
fn cart_of_another_customer_is_an_error() {
    let store = Store::in_memory();
    let hades = add_game(&store, "Hades", dec!(79.90), 14);
    let ana = add_customer(&store, "ana@test.com", dec!(100.00), 20);
    let bia = add_customer(&store, "bia@test.com", dec!(100.00), 20);

    let mut cart = Cart::new(ana);
    cart.add_item(hades, 1).unwrap();

    let err = store.engine().purchase_cart(bia, &mut cart).unwrap_err();

    assert_eq!(
        err,
        StoreError::CartOwnerMismatch {
            owner: ana,
            customer: bia
        }
    );
    assert_eq!(cart.total_items(), 1);
}

#[test]
fn unknown_customer_is_reported_before_cart_owner() {
    let store = Store::in_memory();
    let hades = add_game(&store, "Hades", dec!(79.90), 14);
    let ana = add_customer(&store, "ana@test.com", dec!(100.00), 20);

    let mut cart = Cart::new(ana);
    cart.add_item(hades, 1).unwrap();

    let err = store
        .engine()
        .purchase_cart(CustomerId(99), &mut cart)
        .unwrap_err();

    assert_eq!(err, StoreError::CustomerNotFound(CustomerId(99)));
    assert_eq!(cart.total_items(), 1);
}

#[test]
fn unknown_customers_do_not_grow_lock_table() {
    let games = Arc::new(InMemoryGameRepository::new());
    let customers = Arc::new(InMemoryCustomerRepository::new());
    let locks = Arc::new(CustomerLocks::new());
    let engine = Engine::with_locks(games.clone(), customers, Arc::clone(&locks));
    let hades = games
        .save(Game::new("Hades", dec!(79.90), "Roguelike", 14).unwrap())
        .unwrap();
    let before = locks.len();

    for n in 1000..2000 {
        let err = engine
            .purchase_game(CustomerId(n), hades.id().unwrap())
            .unwrap_err();
        assert_eq!(err, StoreError::CustomerNotFound(CustomerId(n)));
    }

    assert_eq!(locks.len(), before);
}

#[test]
fn cart_sees_catalog_changes_after_insertion() {
    let store = Store::in_memory();
    let hades = add_game(&store, "Hades", dec!(79.90), 14);
    let id = add_customer(&store, "ana@test.com", dec!(100.00), 20);

    let mut cart = Cart::new(id);
    cart.add_item(hades.clone(), 1).unwrap();
    store
        .catalog()
        .set_availability(hades.id().unwrap(), false)
        .unwrap();

    let result = store.engine().purchase_cart(id, &mut cart).unwrap();

    assert!(!result.is_success());
    assert!(result.message().contains("not available"));
}

// =============================================================================
// Greedy Purchase
// =============================================================================

#[test]
fn greedy_skips_unaffordable_and_continues() {
    let store = Store::in_memory();
    let cheap = add_game(&store, "Among Us", dec!(19.99), 7);
    let mid = add_game(&store, "Celeste", dec!(36.90), 10);
    let pricey = add_game(&store, "Rocket League", dec!(39.99), 3);
    let id = add_customer(&store, "ana@test.com", dec!(60.00), 20);

    let result = store
        .engine()
        .purchase_maximum(id, &[pricey, mid.clone(), cheap.clone()])
        .unwrap();

    assert_eq!(result.games(), &[cheap, mid]);
    assert_eq!(result.total(), dec!(56.89));
    assert_eq!(customer(&store, id).balance(), dec!(3.11));
}

#[test]
fn greedy_filters_ineligible_candidates() {
    let store = Store::in_memory();
    let adult = add_game(&store, "Cyberpunk 2077", dec!(149.99), 18);
    let off = add_game(&store, "Hades", dec!(79.90), 14);
    store.catalog().set_availability(off.id().unwrap(), false).unwrap();
    let off = store.catalog().find_game(off.id().unwrap()).unwrap();
    let ok = add_game(&store, "Stardew Valley", dec!(24.99), 0);
    let id = add_customer(&store, "kid@test.com", dec!(500.00), 15);

    let result = store
        .engine()
        .purchase_maximum(id, &[adult, off, ok.clone()])
        .unwrap();

    assert_eq!(result.games(), &[ok]);
}

#[test]
fn greedy_with_nothing_affordable_fails() {
    let store = Store::in_memory();
    let gta = add_game(&store, "Grand Theft Auto V", dec!(149.90), 18);
    let id = add_customer(&store, "ana@test.com", dec!(10.00), 20);

    let result = store.engine().purchase_maximum(id, &[gta]).unwrap();

    assert!(!result.is_success());
    assert_eq!(
        result.message(),
        "no game could be purchased with the available balance"
    );
    assert!(store.engine().log().is_empty());
}

#[test]
fn greedy_with_empty_pool_fails() {
    let store = Store::in_memory();
    let id = add_customer(&store, "ana@test.com", dec!(10.00), 20);

    let result = store.engine().purchase_maximum(id, &[]).unwrap();

    assert!(!result.is_success());
    assert_eq!(result.message(), "no games available");
}

#[test]
fn greedy_equal_prices_keep_input_order() {
    let store = Store::in_memory();
    let a = add_game(&store, "Celeste", dec!(30.00), 10);
    let b = add_game(&store, "Hades", dec!(30.00), 14);
    let id = add_customer(&store, "ana@test.com", dec!(30.00), 20);

    let result = store
        .engine()
        .purchase_maximum(id, &[b.clone(), a])
        .unwrap();

    assert_eq!(result.games(), &[b]);
}

// =============================================================================
// Commit and Rollback
// =============================================================================

/// Customer repository whose updates can be made to fail.
struct FlakyCustomers {
    inner: InMemoryCustomerRepository,
    fail_updates: AtomicBool,
}

impl CustomerRepository for FlakyCustomers {
    fn save(&self, customer: Customer) -> Result<Customer, StoreError> {
        self.inner.save(customer)
    }

    fn find_by_id(&self, id: CustomerId) -> Option<Customer> {
        self.inner.find_by_id(id)
    }

    fn find_all(&self) -> Vec<Customer> {
        self.inner.find_all()
    }

    fn update(&self, customer: Customer) -> Result<Customer, StoreError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Unsaved);
        }
        self.inner.update(customer)
    }

    fn delete_by_id(&self, id: CustomerId) -> bool {
        self.inner.delete_by_id(id)
    }

    fn count(&self) -> usize {
        self.inner.count()
    }
}

#[test]
fn failed_save_rolls_back_everything() {
    let games = Arc::new(InMemoryGameRepository::new());
    let customers = Arc::new(FlakyCustomers {
        inner: InMemoryCustomerRepository::new(),
        fail_updates: AtomicBool::new(true),
    });
    let hades = games
        .save(Game::new("Hades", dec!(79.90), "Roguelike", 14).unwrap())
        .unwrap();
    let id = customers
        .save(Customer::new("Ana", "ana@test.com", dec!(100.00), 20).unwrap())
        .unwrap()
        .id()
        .unwrap();
    let engine = Engine::new(games, customers.clone());

    let result = engine.purchase_game(id, hades.id().unwrap()).unwrap();

    assert!(!result.is_success());
    assert!(result.message().starts_with("failed to save customer"));
    assert_eq!(result.total(), Decimal::ZERO);
    let stored = customers.find_by_id(id).unwrap();
    assert_eq!(stored.balance(), dec!(100.00));
    assert!(!stored.owns_game(&hades));
    assert!(engine.log().is_empty());

    customers.fail_updates.store(false, Ordering::SeqCst);
    assert!(engine.purchase_game(id, hades.id().unwrap()).unwrap().is_success());
}

#[test]
fn log_records_each_kind_in_commit_order() {
    let store = Store::in_memory();
    let hades = add_game(&store, "Hades", dec!(79.90), 14);
    let celeste = add_game(&store, "Celeste", dec!(36.90), 10);
    let free = add_game(&store, "Fortnite", Decimal::ZERO, 12);
    let id = add_customer(&store, "ana@test.com", dec!(200.00), 20);
    let engine = store.engine();

    engine.purchase_game(id, hades.id().unwrap()).unwrap();
    let mut cart = Cart::new(id);
    cart.add_item(celeste, 1).unwrap();
    engine.purchase_cart(id, &mut cart).unwrap();
    engine.purchase_maximum(id, &[free]).unwrap();

    let kinds: Vec<PurchaseKind> = engine.log().drain().iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![PurchaseKind::Single, PurchaseKind::Cart, PurchaseKind::Greedy]
    );
}
