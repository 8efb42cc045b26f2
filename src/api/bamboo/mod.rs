//
//  pampu
//  api/bamboo/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Bamboo REST API resources.
//!
//! Each submodule holds the payload types of one resource family together
//! with the [`BambooClient`](crate::api::BambooClient) methods that fetch
//! them:
//!
//! - [`projects`] - Build projects
//! - [`plans`] - Plans and plan branches
//! - [`results`] - Build results, job results and logs
//! - [`deploy`] - Deployment projects, versions, environments and results
//!
//! # Notes
//!
//! - Payload structs only declare the fields the CLI uses; unknown fields are
//!   ignored
//! - Almost every field is optional because Bamboo omits fields depending on
//!   the `expand` parameter

pub mod deploy;
pub mod plans;
pub mod projects;
pub mod results;

pub use deploy::*;
pub use plans::*;
pub use projects::*;
pub use results::*;
