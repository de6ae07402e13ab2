/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Per-cell lock-service contract.
//!
//! The engine declines work for cells undergoing bulk deletion and keeps
//! the service's per-cell reference count balanced across every exit path.

use async_trait::async_trait;

/// Cell processing status as reported by the lock service.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CellStatus {
    Normal,
    BulkDeletion,
}

/// External per-cell lock service.
#[async_trait]
pub trait CellLockManager: Send + Sync {
    async fn status(&self, cell_id: &str) -> CellStatus;

    async fn inc_ref(&self, cell_id: &str);

    async fn dec_ref(&self, cell_id: &str);
}
