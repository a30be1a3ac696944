//! Renko brick: one fixed-size directional price move.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Brick {
    Up,
    Down,
}
