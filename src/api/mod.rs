//
//  pampu
//  api/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # API Client Layer
//!
//! This module provides the HTTP client for Bamboo's REST API
//! (`<bamboo-url>/rest/api/latest`).
//!
//! ## Architecture
//!
//! - [`client`]: Core HTTP client with authentication and request handling
//! - [`bamboo`]: Typed resources (projects, plans, results, deployments)
//! - [`common`]: Shared types (errors, list envelopes)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pampu::api::BambooClient;
//! use pampu::auth::AuthCredential;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = BambooClient::new("https://bamboo.example.com")?
//!     .with_auth(AuthCredential::PersonalAccessToken { token: "your-pat".into() });
//!
//! for project in client.list_projects().await? {
//!     println!("{}  {}", project.key, project.name);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! API errors are returned as [`ApiError`] variants:
//!
//! - `Transport`: the request never got an answer
//! - `Status`: non-2xx answer, with Bamboo's message and the raw body
//! - `Decode`: the answer did not have the expected shape

/// Core HTTP client wrapper for Bamboo.
pub mod client;

/// Typed Bamboo REST resources.
pub mod bamboo;

/// Common types shared by all resources.
pub mod common;

/// Re-export of the Bamboo API client.
pub use client::BambooClient;

/// Re-export of the API error type.
pub use common::ApiError;
