//! Pan aggregation
//!
//! Resolves every requested pan and sums their areas. The first pan that fails to
//! resolve aborts the whole request; there is no partial result.

use tracing::debug;

use crate::pans::{resolve_pan, Pans, RawPan};
use crate::Result;

/// Resolve all pans in request order and compute the total area
///
/// An empty request succeeds with a total area of zero; rejecting it is left to
/// the balancer, which needs a positive total.
pub fn total_pans_area(request: &[RawPan]) -> Result<Pans> {
    let pans = request.iter().map(resolve_pan).collect::<Result<Vec<_>>>()?;
    let total_area = pans.iter().map(|p| p.area).sum();

    debug!(pan_count = pans.len(), total_area, "Resolved pans");

    Ok(Pans { pans, total_area })
}
