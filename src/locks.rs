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

//! Per-customer mutual exclusion.

use crate::base::CustomerId;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// One mutex per customer, created on demand.
///
/// Every read-modify-write of a stored customer runs inside
/// [`with_lock`](Self::with_lock) from the read to the final update. Services
/// that share a table cannot lose each other's writes.
///
/// An entry lives only while some caller holds or waits for it, so ids that
/// were never stored or have been deleted do not accumulate.
#[derive(Debug, Default)]
pub struct CustomerLocks {
    locks: DashMap<CustomerId, Arc<Mutex<()>>>,
}

impl CustomerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` holding the lock for `customer_id`, then drops the entry if
    /// no other caller is using it.
    pub fn with_lock<T>(&self, customer_id: CustomerId, f: impl FnOnce() -> T) -> T {
        let result = {
            let lock = self.get(customer_id);
            let _guard = lock.lock();
            f()
        };
        // Only the map still holds the mutex. `get` needs this shard too, so
        // nobody can pick it up while it is removed.
        self.locks
            .remove_if(&customer_id, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    /// Number of customers currently locked or waited on.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    fn get(&self, customer_id: CustomerId) -> Arc<Mutex<()>> {
        // Clone the Arc out so the map shard is released before locking.
        Arc::clone(self.locks.entry(customer_id).or_default().value())
    }
}
