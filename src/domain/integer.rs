//! Integer domain - zig-zag walk around zero.

use super::{zigzag, ValueDomain};
use crate::error::DomainError;

/// Enumerates `0, 1, -1, 2, -2, ...` until the magnitude exceeds `top`.
#[derive(Debug, Clone)]
pub struct IntegerDomain {
    top: i64,
    index: u64,
    current: Option<i64>,
}

impl IntegerDomain {
    pub fn new(top: i64) -> Self {
        Self {
            top,
            index: 0,
            current: None,
        }
    }

    pub fn top(&self) -> i64 {
        self.top
    }
}

impl ValueDomain for IntegerDomain {
    fn reset(&mut self) -> Result<(), DomainError> {
        self.index = 0;
        self.current = None;
        Ok(())
    }

    fn next(&mut self) -> Result<bool, DomainError> {
        let candidate = zigzag(self.index);
        if self.top < 0 || candidate.unsigned_abs() > self.top as u64 {
            self.current = None;
            return Ok(false);
        }
        self.current = Some(candidate);
        self.index += 1;
        Ok(true)
    }

    fn value(&mut self) -> Result<String, DomainError> {
        Ok(self.current.map(|v| v.to_string()).unwrap_or_default())
    }

    fn is_unbounded(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enumerate;

    #[test]
    fn test_zero_top_yields_only_zero() {
        let mut domain = IntegerDomain::new(0);
        assert_eq!(enumerate(&mut domain, 10).unwrap(), vec!["0"]);
    }

    #[test]
    fn test_stays_exhausted() {
        let mut domain = IntegerDomain::new(1);
        assert_eq!(enumerate(&mut domain, 10).unwrap().len(), 3);
        assert!(!domain.next().unwrap());
        assert!(!domain.next().unwrap());
    }
}
