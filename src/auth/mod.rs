//
//  pampu
//  auth/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Authentication Module
//!
//! Bamboo Server/Data Center authenticates REST calls with personal access
//! tokens sent as bearer tokens.
//!
//! ## Module Structure
//!
//! - [`credentials`]: Resolving the Bamboo URL and token from environment
//!   variables or the credentials file, and saving that file
//!
//! ## Getting a Token
//!
//! 1. Go to your Bamboo instance
//! 2. Click your avatar (top-right) and open **Profile**
//! 3. Select the **Personal access tokens** tab
//! 4. Click **Create token**
//!
//! ## Example
//!
//! ```rust,no_run
//! use pampu::auth::Credentials;
//! use pampu::api::BambooClient;
//!
//! let credentials = Credentials::resolve()?;
//! let client = BambooClient::new(&credentials.url)?.with_auth(credentials.auth());
//! # Ok::<(), anyhow::Error>(())
//! ```

mod credentials;

pub use credentials::*;

use reqwest::RequestBuilder;

/// Authentication credential applied to outgoing requests.
#[derive(Clone)]
pub enum AuthCredential {
    /// Personal access token, sent as `Authorization: Bearer <token>`
    PersonalAccessToken { token: String },
}

impl std::fmt::Debug for AuthCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PersonalAccessToken { .. } => f
                .debug_struct("PersonalAccessToken")
                .field("token", &"***")
                .finish(),
        }
    }
}

impl AuthCredential {
    pub fn apply_to_request(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Self::PersonalAccessToken { token } => request.bearer_auth(token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_secrets() {
        let pat = AuthCredential::PersonalAccessToken {
            token: "super-secret".to_string(),
        };
        assert!(!format!("{:?}", pat).contains("super-secret"));
    }
}
