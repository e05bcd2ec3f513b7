//! Numeric domain - fixed-point zig-zag walk bounded by precision/scale.

use super::{zigzag, ValueDomain};
use crate::error::DomainError;

/// Largest precision the domain represents exactly
const MAX_PRECISION: u32 = 38;

/// Step and bound used when a column declares no precision
const DEFAULT_STEP: f64 = 0.5;
const DEFAULT_TOP: f64 = 100.0;

/// Enumerates `0, step, -step, 2*step, ...` while the magnitude stays within `top`.
///
/// Values are kept as integer multiples of `10^-scale` so rendering is exact.
#[derive(Debug, Clone)]
pub struct NumericDomain {
    scale: u32,
    unit: i128,
    top_units: i128,
    index: u64,
    current: Option<i128>,
}

impl NumericDomain {
    /// Domain with an explicit step and magnitude bound
    pub fn new(step: f64, top: f64) -> Self {
        let scale = decimal_places(step).max(decimal_places(top));
        let factor = 10f64.powi(scale as i32);
        let unit = ((step.abs() * factor).round() as i128).max(1);
        let top_units = (top.abs() * factor).round() as i128;
        Self {
            scale,
            unit,
            top_units,
            index: 0,
            current: None,
        }
    }

    /// Domain covering exactly the range representable by `numeric(precision, scale)`.
    ///
    /// With scale 0 the bound is `10^p - 1` in steps of 1; otherwise it is
    /// `10^(p-s) - 10^-s` in steps of `10^-s`.
    pub fn for_precision(precision: Option<u32>, scale: Option<u32>) -> Self {
        let Some(precision) = precision else {
            return Self::new(DEFAULT_STEP, DEFAULT_TOP);
        };
        let precision = precision.min(MAX_PRECISION);
        let scale = scale.unwrap_or(0).min(MAX_PRECISION);
        Self {
            scale,
            unit: 1,
            // Both cases reduce to 10^p - 1 units of 10^-s
            top_units: 10i128.pow(precision) - 1,
            index: 0,
            current: None,
        }
    }

    fn render(&self, units: i128) -> String {
        if self.scale == 0 {
            return units.to_string();
        }
        let divisor = 10u128.pow(self.scale);
        let magnitude = units.unsigned_abs();
        let whole = magnitude / divisor;
        let frac = format!(
            "{:0width$}",
            magnitude % divisor,
            width = self.scale as usize
        );
        let frac = frac.trim_end_matches('0');
        let sign = if units < 0 { "-" } else { "" };
        if frac.is_empty() {
            format!("{sign}{whole}")
        } else {
            format!("{sign}{whole}.{frac}")
        }
    }
}

/// Number of decimal places needed to write `v` exactly (capped at 12)
fn decimal_places(v: f64) -> u32 {
    let mut places = 0;
    let mut scaled = v.abs();
    while places < 12 && (scaled - scaled.round()).abs() > 1e-9 {
        scaled *= 10.0;
        places += 1;
    }
    places
}

impl ValueDomain for NumericDomain {
    fn reset(&mut self) -> Result<(), DomainError> {
        self.index = 0;
        self.current = None;
        Ok(())
    }

    fn next(&mut self) -> Result<bool, DomainError> {
        let units = zigzag(self.index) as i128 * self.unit;
        if units.unsigned_abs() > self.top_units.unsigned_abs() {
            self.current = None;
            return Ok(false);
        }
        self.current = Some(units);
        self.index += 1;
        Ok(true)
    }

    fn value(&mut self) -> Result<String, DomainError> {
        Ok(self.current.map(|u| self.render(u)).unwrap_or_default())
    }

    fn is_unbounded(&self) -> bool {
        false
    }
}
