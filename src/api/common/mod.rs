//
//  pampu
//  api/common/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Common API Types for the Bamboo REST API
//!
//! This module provides the error type and list envelopes shared by every
//! Bamboo resource module.
//!
//! # Overview
//!
//! - [`ApiError`] - Unified error type for all API operations
//! - [`ListPage`] - The `{size, start-index, max-result, <item>: [...]}` list
//!   wrapper Bamboo uses for collections (re-exported from [`pagination`])
//!
//! # Example
//!
//! ```rust
//! use pampu::api::common::ApiError;
//!
//! fn describe(result: Result<(), ApiError>) -> String {
//!     match result {
//!         Ok(()) => "ok".to_string(),
//!         Err(ApiError::Status { status: 404, .. }) => "not found".to_string(),
//!         Err(e) => e.to_string(),
//!     }
//! }
//! ```
//!
//! # Notes
//!
//! - Every error is recoverable per call; nothing here panics
//! - A response that parses as JSON but not as the expected shape is a
//!   [`ApiError::Decode`], never a transport failure

use thiserror::Error;

mod pagination;

pub use pagination::*;

/// Unified error type for all Bamboo API operations.
///
/// # Variants
///
/// | Variant | Description |
/// |---------|-------------|
/// | `Transport` | Connection, DNS, TLS or timeout failure |
/// | `Status` | Bamboo answered with a non-2xx status |
/// | `Decode` | The body did not match the expected schema |
///
/// # Notes
///
/// - The `Transport` variant automatically converts from `reqwest::Error`
/// - `Status` keeps the raw body so `--json` users can inspect it
#[derive(Error, Debug)]
pub enum ApiError {
    /// A network-level error occurred during the request.
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Bamboo returned a non-success status code.
    ///
    /// `message` is the `message` field of Bamboo's error document when one
    /// was present, otherwise the canonical reason phrase.
    #[error("Bamboo API error ({status}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Human readable message
        message: String,
        /// Raw response body
        body: String,
    },

    /// The response body could not be deserialized.
    #[error("Unexpected response from Bamboo: {0}")]
    Decode(String),
}

impl ApiError {
    /// Returns the HTTP status for [`ApiError::Status`], `None` otherwise.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` when Bamboo answered 404.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}
