//! Result export port trait.

use crate::domain::error::VolsqueezeError;
use crate::domain::simulator::{EquityPoint, Trade};
use std::path::Path;

/// Port for persisting trade logs and equity curves.
pub trait ReportPort {
    fn write_trades(&self, trades: &[Trade], path: &Path) -> Result<(), VolsqueezeError>;

    fn write_equity(&self, curve: &[EquityPoint], path: &Path) -> Result<(), VolsqueezeError>;
}
