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

//! Outbound-broker contract: the only cross-process channel the engine uses.

use crate::event::Event;
use async_trait::async_trait;
use thiserror::Error;

/// Broker send failures.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum BrokerError {
    #[error("broker send failed: {0}")]
    Send(String),
}

/// Publishing side of the control topic.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes one event. Failures are the caller's to log; they must not
    /// stop further dispatch.
    async fn send(&self, event: &Event) -> Result<(), BrokerError>;

    /// Closes the publisher handle. Called once at shutdown.
    async fn close(&self);
}

/// Consuming side of the control topic.
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    /// Pulls the next control event; `None` once the stream has ended.
    async fn recv(&self) -> Option<Event>;
}
