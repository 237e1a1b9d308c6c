//! Chart rendering port trait.

use crate::domain::analytics::ChartSnapshot;
use crate::domain::error::TraderError;

/// Consumer of derived chart data; called after every state change.
pub trait RenderPort {
    fn render(&mut self, snapshot: &ChartSnapshot) -> Result<(), TraderError>;
}
