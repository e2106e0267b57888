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

//! Customer service: registration, lookups, top-ups and profile edits.

use crate::base::{CustomerId, Email};
use crate::customer::Customer;
use crate::eligibility;
use crate::error::{StoreError, ValidationError};
use crate::locks::CustomerLocks;
use crate::repository::CustomerRepository;
use crate::validation;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

/// Partial update for [`Accounts::update_customer`]. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<u8>,
}

pub struct Accounts {
    customers: Arc<dyn CustomerRepository>,
    locks: Arc<CustomerLocks>,
}

impl Accounts {
    pub fn new(customers: Arc<dyn CustomerRepository>) -> Self {
        Self::with_locks(customers, Arc::new(CustomerLocks::new()))
    }

    /// Accounts whose edits share a lock table with an [`Engine`](crate::Engine).
    pub fn with_locks(customers: Arc<dyn CustomerRepository>, locks: Arc<CustomerLocks>) -> Self {
        Self { customers, locks }
    }

    /// Validates and stores a new customer.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Validation`] - blank name, malformed email, negative
    ///   balance or age out of range.
    /// - [`StoreError::DuplicateCustomer`] - the email is taken.
    pub fn register(
        &self,
        name: &str,
        email: &str,
        initial_balance: Decimal,
        age: u8,
    ) -> Result<Customer, StoreError> {
        let customer = Customer::new(name, email, initial_balance, age)?;
        let customer = self.customers.save(customer)?;
        info!(customer_id = ?customer.id(), email = %customer.email(), "customer registered");
        Ok(customer)
    }

    pub fn find_customer(&self, id: CustomerId) -> Result<Customer, StoreError> {
        self.customers
            .find_by_id(id)
            .ok_or(StoreError::CustomerNotFound(id))
    }

    pub fn find_by_email(&self, email: &str) -> Option<Customer> {
        let email = Email::parse(email).ok()?;
        self.customers.find_by_email(&email)
    }

    pub fn list_all(&self) -> Vec<Customer> {
        self.customers.find_all()
    }

    /// Case-insensitive name search. A blank query lists everyone.
    pub fn search_by_name(&self, name: &str) -> Vec<Customer> {
        if name.trim().is_empty() {
            return self.list_all();
        }
        self.customers.find_by_name_containing(name)
    }

    /// Credits `amount` to the customer's balance.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Validation`] - `amount` is not positive, or the new
    ///   balance would be out of range.
    /// - [`StoreError::CustomerNotFound`] - unknown id.
    pub fn add_balance(&self, id: CustomerId, amount: Decimal) -> Result<Customer, StoreError> {
        validation::validate_positive_amount(amount)?;
        self.locks.with_lock(id, || {
            let mut customer = self.find_customer(id)?;
            customer.add_balance(amount)?;
            let customer = self.customers.update(customer)?;
            info!(customer_id = %id, %amount, balance = %customer.balance(), "balance added");
            Ok(customer)
        })
    }

    /// Applies `update` to a stored customer.
    ///
    /// Blank name or email strings are ignored. The first invalid field
    /// aborts the update and nothing is written.
    ///
    /// # Errors
    ///
    /// - [`StoreError::CustomerNotFound`] - unknown id.
    /// - [`StoreError::DuplicateCustomer`] - changing to an email already in use.
    /// - [`StoreError::Validation`] - a field is invalid.
    pub fn update_customer(
        &self,
        id: CustomerId,
        update: CustomerUpdate,
    ) -> Result<Customer, StoreError> {
        self.locks.with_lock(id, || {
            let mut customer = self.find_customer(id)?;

            if let Some(name) = update.name.as_deref().filter(|n| !n.trim().is_empty()) {
                customer.set_name(name)?;
            }
            if let Some(email) = update.email.as_deref().filter(|e| !e.trim().is_empty()) {
                customer.set_email(email)?;
            }
            if let Some(age) = update.age {
                customer.set_age(age)?;
            }

            self.customers.update(customer)
        })
    }

    /// # Errors
    ///
    /// [`StoreError::CustomerNotFound`] if nothing is stored under `id`.
    pub fn delete_customer(&self, id: CustomerId) -> Result<(), StoreError> {
        if !self.locks.with_lock(id, || self.customers.delete_by_id(id)) {
            return Err(StoreError::CustomerNotFound(id));
        }
        info!(customer_id = %id, "customer deleted");
        Ok(())
    }

    /// Customers aged within `[min_age, max_age]`.
    pub fn by_age_range(&self, min_age: u8, max_age: u8) -> Result<Vec<Customer>, StoreError> {
        if min_age > max_age {
            return Err(ValidationError::InvertedAgeRange.into());
        }
        Ok(self.customers.find_by_age_range(min_age, max_age))
    }

    pub fn with_min_balance(&self, min_balance: Decimal) -> Result<Vec<Customer>, StoreError> {
        if min_balance < Decimal::ZERO {
            return Err(ValidationError::NegativeBalance(min_balance).into());
        }
        Ok(self.customers.find_by_min_balance(min_balance))
    }

    pub fn count(&self) -> usize {
        self.customers.count()
    }

    /// Sum of every customer's balance.
    pub fn total_balance(&self) -> Result<Decimal, StoreError> {
        let balances = self.customers.find_all().into_iter().map(|c| c.balance());
        Ok(validation::checked_sum(balances)?)
    }

    /// Balance and age check for a prospective purchase.
    pub fn can_afford(
        &self,
        id: CustomerId,
        price: Decimal,
        age_rating: u8,
    ) -> Result<bool, StoreError> {
        let customer = self.find_customer(id)?;
        Ok(eligibility::can_afford(&customer, price) && customer.age() >= age_rating)
    }
}
