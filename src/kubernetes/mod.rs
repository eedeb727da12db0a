// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for client creation, namespace resolution, and secret access.

pub mod client;
pub mod namespaces;
pub mod secrets;

pub use client::{client_source, ClientSource};
pub use namespaces::{parse_namespace_list, resolve_targets, KubeNamespaceLister, NamespaceLister};
pub use secrets::{KubeSecretStore, SecretStore};
