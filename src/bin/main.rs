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

use clap::{Parser, ValueEnum};
use csv::{ReaderBuilder, Trim, Writer};
use game_store_rs::{
    Cart, Customer, CustomerId, Email, Engine, Game, PurchaseResult, Store, StoreError,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Game Store - Replay purchase orders against a catalog and customer list
///
/// Loads customers (and optionally a catalog) from CSV, processes an order
/// file through the purchase engine and writes a report to stdout.
#[derive(Parser, Debug)]
#[command(name = "game-store-rs")]
#[command(about = "A game store that processes purchase order CSVs", long_about = None)]
struct Args {
    /// Catalog CSV: name,price,category,age_rating[,available]
    ///
    /// The sample catalog is used when omitted.
    #[arg(long, value_name = "FILE")]
    catalog: Option<PathBuf>,

    /// Customers CSV: name,email,balance,age
    #[arg(long, value_name = "FILE")]
    customers: PathBuf,

    /// Report written to stdout after all orders are processed
    #[arg(long, value_enum, default_value_t = Report::Customers)]
    report: Report,

    /// Orders CSV: kind,customer,games
    ///
    /// Example: cargo run -- --customers customers.csv orders.csv > report.csv
    #[arg(value_name = "ORDERS")]
    orders: PathBuf,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Report {
    /// One row per customer with balance and owned games
    Customers,
    /// One row per committed purchase, in commit order
    Receipts,
}

fn main() {
    init_tracing();
    let args = Args::parse();
    let store = Store::in_memory();

    let loaded = match &args.catalog {
        Some(path) => open(path).and_then(|file| load_catalog(&store, file)),
        None => store.catalog().seed_sample_catalog().map_err(|e| e.to_string()),
    };
    match loaded {
        Ok(count) => info!(games = count, "catalog loaded"),
        Err(e) => exit_with("Error loading catalog", e),
    }

    match open(&args.customers).and_then(|file| load_customers(&store, file)) {
        Ok(count) => info!(customers = count, "customers loaded"),
        Err(e) => exit_with("Error loading customers", e),
    }

    match open(&args.orders).and_then(|file| process_orders(&store, file)) {
        Ok(committed) => info!(committed, "orders processed"),
        Err(e) => exit_with("Error processing orders", e),
    }

    let written = match args.report {
        Report::Customers => write_customers(&store, std::io::stdout()),
        Report::Receipts => write_receipts(&store, std::io::stdout()),
    };
    if let Err(e) = written {
        exit_with("Error writing output", e.to_string());
    }
}

/// Logs go to stderr so the report on stdout stays clean.
///
/// Defaults to `info`; override with `RUST_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open(path: &Path) -> Result<BufReader<File>, String> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| format!("'{}': {}", path.display(), e))
}

fn exit_with(context: &str, message: String) -> ! {
    error!("{context}: {message}");
    process::exit(1);
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader)
}

/// Fields: `name, price, category, age_rating, available`
#[derive(Debug, Deserialize)]
struct CatalogRecord {
    name: String,
    price: Decimal,
    category: String,
    age_rating: u8,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    available: Option<bool>,
}

/// Fields: `name, email, balance, age`
#[derive(Debug, Deserialize)]
struct CustomerRecord {
    name: String,
    email: String,
    balance: Decimal,
    age: u8,
}

/// Fields: `kind, customer, games`
#[derive(Debug, Deserialize)]
struct OrderRecord {
    kind: String,
    customer: String,
    #[serde(default)]
    games: String,
}

impl OrderRecord {
    /// `;`-separated titles, blanks dropped.
    fn titles(&self) -> Vec<&str> {
        self.games
            .split(';')
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .collect()
    }
}

/// Loads games into the catalog. Malformed rows, invalid games and duplicate
/// titles are skipped.
///
/// Returns the number of games added.
fn load_catalog<R: Read>(store: &Store, reader: R) -> Result<usize, String> {
    let mut added = 0;
    for result in csv_reader(reader).deserialize::<CatalogRecord>() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "skipping malformed catalog row");
                continue;
            }
        };

        let created = store.catalog().create_game(
            &record.name,
            record.price,
            &record.category,
            record.age_rating,
        );
        let game = match created {
            Ok(game) => game,
            Err(e) => {
                warn!(name = %record.name, error = %e, "skipping game");
                continue;
            }
        };
        if let (Some(false), Some(id)) = (record.available, game.id()) {
            store
                .catalog()
                .set_availability(id, false)
                .map_err(|e| e.to_string())?;
        }
        added += 1;
    }
    Ok(added)
}

/// Registers customers. Malformed rows, invalid customers and duplicate
/// emails are skipped.
///
/// Returns the number of customers registered.
fn load_customers<R: Read>(store: &Store, reader: R) -> Result<usize, String> {
    let mut added = 0;
    for result in csv_reader(reader).deserialize::<CustomerRecord>() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "skipping malformed customer row");
                continue;
            }
        };

        match store
            .accounts()
            .register(&record.name, &record.email, record.balance, record.age)
        {
            Ok(_) => added += 1,
            Err(e) => warn!(email = %record.email, error = %e, "skipping customer"),
        }
    }
    Ok(added)
}

/// Replays orders through the purchase engine, in file order.
///
/// - `buy`: each listed title is bought on its own.
/// - `cart`: the listed titles are checked out together.
/// - `max`: as many listed titles as the balance allows; an empty list means
///   every available game.
///
/// Malformed rows and orders that fail with an error are skipped. Rejected
/// purchases are logged and leave the customer untouched.
///
/// Returns the number of committed purchases.
fn process_orders<R: Read>(store: &Store, reader: R) -> Result<usize, String> {
    let mut committed = 0;
    for result in csv_reader(reader).deserialize::<OrderRecord>() {
        let order = match result {
            Ok(order) => order,
            Err(e) => {
                warn!(error = %e, "skipping malformed order row");
                continue;
            }
        };

        match process_order(store, &order) {
            Ok(count) => committed += count,
            Err(e) => warn!(kind = %order.kind, customer = %order.customer, error = %e, "skipping order"),
        }
    }
    Ok(committed)
}

fn process_order(store: &Store, order: &OrderRecord) -> Result<usize, StoreError> {
    let email = Email::parse(order.customer.as_str())?;
    let customer = store
        .accounts()
        .find_by_email(email.as_str())
        .ok_or(StoreError::CustomerEmailNotFound(email))?;
    let customer_id = customer.id().ok_or(StoreError::Unsaved)?;
    let games = resolve_games(store, &order.titles());
    let engine = store.engine();

    let results = match order.kind.to_lowercase().as_str() {
        "buy" => buy_each(engine, customer_id, &games),
        "cart" => {
            let mut cart = Cart::new(customer_id);
            for game in games {
                cart.add_item(game, 1)?;
            }
            vec![engine.purchase_cart(customer_id, &mut cart)?]
        }
        "max" => {
            let candidates = if order.titles().is_empty() {
                store.catalog().list_available()
            } else {
                games
            };
            vec![engine.purchase_maximum(customer_id, &candidates)?]
        }
        other => {
            warn!(kind = other, "skipping order of unknown kind");
            return Ok(0);
        }
    };

    let mut committed = 0;
    for result in results {
        if result.is_success() {
            committed += 1;
        } else {
            info!(customer = %order.customer, reason = result.message(), "purchase rejected");
        }
    }
    Ok(committed)
}

/// Buys each game on its own. A purchase that fails with an error is logged
/// and does not stop the others.
fn buy_each(engine: &Engine, customer_id: CustomerId, games: &[Game]) -> Vec<PurchaseResult> {
    let mut results = Vec::with_capacity(games.len());
    for game in games {
        let purchase = game
            .id()
            .ok_or(StoreError::Unsaved)
            .and_then(|game_id| engine.purchase_game(customer_id, game_id));
        match purchase {
            Ok(result) => results.push(result),
            Err(e) => warn!(%customer_id, title = %game.title(), error = %e, "skipping purchase"),
        }
    }
    results
}

/// Looks up titles in the catalog, dropping unknown ones.
fn resolve_games(store: &Store, titles: &[&str]) -> Vec<Game> {
    titles
        .iter()
        .filter_map(|title| {
            let game = store.catalog().find_by_title(title);
            if game.is_none() {
                debug!(title = *title, "unknown title in order");
            }
            game
        })
        .collect()
}

/// Writes every customer as CSV.
///
/// # CSV Format
///
/// Columns: `id, name, email, balance, age, owned`
///
/// ```csv
/// id,name,email,balance,age,owned
/// 1,Ana,ana@example.com,20.10,20,Hades
/// ```
fn write_customers<W: Write>(store: &Store, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    let customers: Vec<Customer> = store.accounts().list_all();
    for customer in &customers {
        wtr.serialize(customer)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes committed purchases as CSV, in commit order.
///
/// # CSV Format
///
/// Columns: `receipt, customer, kind, games, total`
fn write_receipts<W: Write>(store: &Store, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    for receipt in store.engine().log().drain() {
        wtr.serialize(receipt.as_ref())?;
    }
    wtr.flush()?;
    Ok(())
}
