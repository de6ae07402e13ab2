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

//! Persistent-store contract and the entity shapes the engine reads.
//!
//! The engine never writes to the store; its index is a derived cache of
//! the rule entities the store owns.

use async_trait::async_trait;
use entity_key::EntityKey;
use thiserror::Error;

/// Key-component name of an entity's primary name.
pub const FIELD_NAME: &str = "Name";
/// Key-component name of the box a rule is linked to.
pub const FIELD_BOX_NAME: &str = "_Box.Name";

// Property names of the rule and box entity sets, as they appear in the
// store schema and in the engine's debug snapshot.
pub const FIELD_EXTERNAL: &str = "EventExternal";
pub const FIELD_SUBJECT: &str = "EventSubject";
pub const FIELD_TYPE: &str = "EventType";
pub const FIELD_OBJECT: &str = "EventObject";
pub const FIELD_INFO: &str = "EventInfo";
pub const FIELD_ACTION: &str = "Action";
pub const FIELD_TARGET_URL: &str = "TargetUrl";
pub const FIELD_SCHEMA: &str = "Schema";

/// Reads the rule name out of a parsed key: the named component when the
/// key is complex, otherwise the bare single value.
pub fn rule_name_of(key: &EntityKey) -> Option<&str> {
    key.complex_value(FIELD_NAME).or_else(|| key.single_value())
}

/// Reads the box name out of a parsed key; absent for single keys and for
/// keys carrying the dummy placeholder.
pub fn box_name_of(key: &EntityKey) -> Option<&str> {
    key.complex_value(FIELD_BOX_NAME)
}

/// One cell (tenant namespace).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Cell {
    pub id: String,
    pub name: String,
    /// Absolute URL of the cell root, with trailing slash.
    pub url: String,
    /// Absolute URL of the owning unit, with trailing slash.
    pub unit_url: String,
}

/// Store-shape of one rule row, before registration normalizes it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RuleEntity {
    pub name: String,
    pub external: Option<bool>,
    pub subject: Option<String>,
    pub event_type: Option<String>,
    pub object: Option<String>,
    pub info: Option<String>,
    pub action: Option<String>,
    pub service: Option<String>,
    pub box_name: Option<String>,
}

/// Store-shape of one box row.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BoxEntity {
    pub id: String,
    pub name: String,
    pub schema: Option<String>,
}

/// Store read failures.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum StoreError {
    #[error("entity not found: {0}")]
    NotFound(String),
    #[error("store read failed: {0}")]
    Backend(String),
}

/// Read-only view of the persistent store.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Resolves a cell by id; `None` when the cell does not exist.
    async fn get_cell(&self, cell_id: &str) -> Option<Cell>;

    /// Enumerates every cell of the unit.
    async fn list_cells(&self) -> Result<Vec<Cell>, StoreError>;

    /// Enumerates every rule of one cell.
    async fn list_rules(&self, cell: &Cell) -> Result<Vec<RuleEntity>, StoreError>;

    /// Reads one rule by compound key.
    async fn read_rule(&self, cell: &Cell, key: &EntityKey) -> Result<RuleEntity, StoreError>;

    /// Resolves a box by name within one cell.
    async fn find_box_by_name(
        &self,
        cell: &Cell,
        box_name: &str,
    ) -> Result<Option<BoxEntity>, StoreError>;
}
