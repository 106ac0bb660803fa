//! EDSM access.
//!
//! The aggregator only talks to EDSM through [`SystemsApi`], so tests can
//! substitute an in-memory implementation.

pub mod client;

pub use client::EdsmClient;

use crate::error::EdsmError;
use crate::models::{Coordinates, SystemRecord};

/// A radius query around a point.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereQuery<'a> {
    /// Anchor name, used for logging only.
    pub label: &'a str,
    pub center: Coordinates,
    pub radius_ly: f64,
    pub limit: u32,
}

/// The two EDSM lookups the aggregator needs.
#[allow(async_fn_in_trait)]
pub trait SystemsApi {
    /// Resolve a system name to coordinates.
    async fn get_coords(&self, system_name: &str) -> Result<Coordinates, EdsmError>;

    /// All systems within `query.radius_ly` of `query.center`.
    ///
    /// Empty or unparseable responses yield an empty list rather than an error.
    async fn sphere_systems(&self, query: &SphereQuery<'_>)
        -> Result<Vec<SystemRecord>, EdsmError>;
}
