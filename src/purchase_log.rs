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

//! Thread-safe log of committed purchases.
//!
//! Receipts are stored for O(1) lookup and their ids queued in commit order,
//! so a report can drain them back out in the order purchases happened.

use crate::base::{CustomerId, GameTitle, ReceiptId};
use crossbeam::queue::SegQueue;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Which allocator path produced a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseKind {
    Single,
    Cart,
    Greedy,
}

impl fmt::Display for PurchaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            PurchaseKind::Single => "single",
            PurchaseKind::Cart => "cart",
            PurchaseKind::Greedy => "greedy",
        };
        f.write_str(kind)
    }
}

/// Record of one committed purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub id: ReceiptId,
    pub customer_id: CustomerId,
    pub kind: PurchaseKind,
    pub titles: Vec<GameTitle>,
    pub total: Decimal,
}

impl Serialize for Receipt {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let titles = self
            .titles
            .iter()
            .map(GameTitle::as_str)
            .collect::<Vec<_>>()
            .join(";");

        let mut state = serializer.serialize_struct("Receipt", 5)?;
        state.serialize_field("receipt", &self.id)?;
        state.serialize_field("customer", &self.customer_id)?;
        state.serialize_field("kind", &self.kind)?;
        state.serialize_field("games", &titles)?;
        state.serialize_field("total", &self.total)?;
        state.end()
    }
}

/// Lock-free purchase log.
///
/// Combines a [`DashMap`] for lookup by id with a [`SegQueue`] that preserves
/// commit order.
#[derive(Debug)]
pub struct PurchaseLog {
    receipts: DashMap<ReceiptId, Arc<Receipt>>,
    order: SegQueue<ReceiptId>,
    next_id: AtomicU64,
}

impl PurchaseLog {
    pub fn new() -> Self {
        Self {
            receipts: DashMap::new(),
            order: SegQueue::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Appends a receipt and returns its id.
    pub fn record(
        &self,
        customer_id: CustomerId,
        kind: PurchaseKind,
        titles: Vec<GameTitle>,
        total: Decimal,
    ) -> ReceiptId {
        let id = ReceiptId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let receipt = Arc::new(Receipt {
            id,
            customer_id,
            kind,
            titles,
            total,
        });

        // A receipt is enqueued only if it was inserted.
        if let Entry::Vacant(entry) = self.receipts.entry(id) {
            entry.insert(receipt);
            self.order.push(id);
        }
        id
    }

    pub fn get(&self, id: ReceiptId) -> Option<Arc<Receipt>> {
        self.receipts.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.receipts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receipts.is_empty()
    }

    /// Removes and returns every receipt in commit order.
    pub fn drain(&self) -> Vec<Arc<Receipt>> {
        let mut drained = Vec::with_capacity(self.order.len());
        while let Some(id) = self.order.pop() {
            if let Some((_, receipt)) = self.receipts.remove(&id) {
                drained.push(receipt);
            }
        }
        drained
    }
}

impl Default for PurchaseLog {
    fn default() -> Self {
        Self::new()
    }
}
