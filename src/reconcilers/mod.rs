// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Reconcilers driving secret state across target namespaces.

pub mod secret;

pub use secret::SecretReconciler;
