//! Renko bricks: fixed-size directional moves of the close price.
//!
//! The anchor starts at the first close. For every close `p`:
//! - `diff = p - anchor`, `n = floor(diff / size)`
//! - `diff >= 0`: emit `n` up bricks
//! - `diff < 0`: emit `floor(|diff| / size)` down bricks
//! - `anchor += n * size`
//!
//! `n` is a floored quotient, so on a down move with a partial remainder the
//! anchor travels one brick further than the number of bricks emitted
//! (diff -25 with size 20 emits one down brick and moves the anchor by -40).
//! Bricks are append-only: later closes never rewrite earlier bricks.

use super::IndicatorError;
use crate::domain::Brick;

/// Incremental Renko state.
#[derive(Debug, Clone)]
pub struct RenkoBuilder {
    brick_size: f64,
    anchor: Option<f64>,
    bricks: Vec<Brick>,
    consumed: usize,
}

impl RenkoBuilder {
    pub fn new(brick_size: f64) -> Result<Self, IndicatorError> {
        if !brick_size.is_finite() || brick_size <= 0.0 {
            return Err(IndicatorError::InvalidBrickSize(brick_size));
        }
        Ok(Self {
            brick_size,
            anchor: None,
            bricks: Vec::new(),
            consumed: 0,
        })
    }

    pub fn brick_size(&self) -> f64 {
        self.brick_size
    }

    /// Current anchor price (`None` until the first close is pushed).
    pub fn anchor(&self) -> Option<f64> {
        self.anchor
    }

    pub fn bricks(&self) -> &[Brick] {
        &self.bricks
    }

    pub fn into_bricks(self) -> Vec<Brick> {
        self.bricks
    }

    /// Consume one close; returns the bricks it emitted.
    pub fn push(&mut self, close: f64) -> Result<&[Brick], IndicatorError> {
        if !close.is_finite() {
            return Err(IndicatorError::NonFiniteInput {
                index: self.consumed,
                value: close,
            });
        }

        let anchor = *self.anchor.get_or_insert(close);
        let diff = close - anchor;
        let whole = diff.div_euclid(self.brick_size);
        let start = self.bricks.len();

        if diff >= 0.0 {
            let count = whole as usize;
            self.bricks.extend(std::iter::repeat(Brick::Up).take(count));
        } else {
            let count = diff.abs().div_euclid(self.brick_size) as usize;
            self.bricks.extend(std::iter::repeat(Brick::Down).take(count));
        }

        self.anchor = Some(anchor + whole * self.brick_size);
        self.consumed += 1;
        Ok(&self.bricks[start..])
    }
}

/// Build the full brick sequence for a close series.
pub fn build_bricks(closes: &[f64], brick_size: f64) -> Result<Vec<Brick>, IndicatorError> {
    let mut builder = RenkoBuilder::new(brick_size)?;
    for &close in closes {
        builder.push(close)?;
    }
    Ok(builder.into_bricks())
}
