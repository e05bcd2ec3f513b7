//! Enumeration domain - walks a fixed list of labels once per reset.

use super::ValueDomain;
use crate::error::DomainError;

#[derive(Debug, Clone)]
pub struct EnumDomain {
    values: Vec<String>,
    position: usize,
    current: Option<usize>,
}

impl EnumDomain {
    pub fn new(values: Vec<String>) -> Self {
        Self {
            values,
            position: 0,
            current: None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ValueDomain for EnumDomain {
    fn reset(&mut self) -> Result<(), DomainError> {
        self.position = 0;
        self.current = None;
        Ok(())
    }

    fn next(&mut self) -> Result<bool, DomainError> {
        if self.position >= self.values.len() {
            self.current = None;
            return Ok(false);
        }
        self.current = Some(self.position);
        self.position += 1;
        Ok(true)
    }

    fn value(&mut self) -> Result<String, DomainError> {
        Ok(self
            .current
            .and_then(|i| self.values.get(i).cloned())
            .unwrap_or_default())
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
    fn test_walks_once_per_reset() {
        let mut domain = EnumDomain::new(vec!["True".into(), "False".into()]);
        assert_eq!(enumerate(&mut domain, 10).unwrap(), vec!["True", "False"]);
        assert!(!domain.next().unwrap());
        assert_eq!(enumerate(&mut domain, 10).unwrap(), vec!["True", "False"]);
    }

    #[test]
    fn test_empty_is_exhausted() {
        let mut domain = EnumDomain::new(Vec::new());
        assert!(!domain.next().unwrap());
    }
}
