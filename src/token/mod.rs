// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! OAuth2 client-credentials token acquisition.

pub mod client;
pub mod request;

pub use client::TokenClient;
pub use request::{read_client_secret, TokenRequest, TokenResponse};
