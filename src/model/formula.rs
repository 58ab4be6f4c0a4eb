// Model formulas: `mpg ~ term + term + ...`
//
// Terms are stored in canonical table order so that two formulas naming
// the same terms compare equal and render identically.

use crate::dataset::Column;
use crate::error::{AnalysisError, Result};
use serde::{Serialize, Serializer};

/// Response is always mpg
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Formula {
    terms: Vec<Column>,
}

impl Formula {
    pub fn new(terms: impl IntoIterator<Item = Column>) -> Self {
        let mut terms: Vec<Column> = terms.into_iter().collect();
        terms.sort();
        terms.dedup();
        Self { terms }
    }

    /// mpg ~ am
    pub fn baseline() -> Self {
        Self::new([Column::Am])
    }

    /// mpg ~ every other column
    pub fn full() -> Self {
        Self::new(Column::REGRESSORS)
    }

    /// Parse `mpg ~ a + b + c`
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = |reason: &str| AnalysisError::InvalidFormula {
            formula: text.to_string(),
            reason: reason.to_string(),
        };

        let (response, rhs) = text
            .split_once('~')
            .ok_or_else(|| invalid("missing '~'"))?;
        if response.trim() != Column::Mpg.name() {
            return Err(invalid("response must be mpg"));
        }

        let mut terms = Vec::new();
        for token in rhs.split('+').map(str::trim) {
            if token.is_empty() {
                return Err(invalid("empty term"));
            }
            let column = Column::from_name(token)
                .ok_or_else(|| invalid(&format!("unknown term '{}'", token)))?;
            if column == Column::Mpg {
                return Err(invalid("the response cannot be a regressor"));
            }
            terms.push(column);
        }

        Ok(Self::new(terms))
    }

    pub fn terms(&self) -> &[Column] {
        &self.terms
    }

    pub fn contains(&self, term: Column) -> bool {
        self.terms.contains(&term)
    }

    /// Copy with `term` added
    pub fn with(&self, term: Column) -> Self {
        Self::new(self.terms.iter().copied().chain([term]))
    }

    /// Copy with `term` removed
    pub fn without(&self, term: Column) -> Self {
        Self::new(self.terms.iter().copied().filter(|t| *t != term))
    }
}

impl std::fmt::Display for Formula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rhs: Vec<&str> = self.terms.iter().map(|t| t.name()).collect();
        if rhs.is_empty() {
            write!(f, "{} ~ 1", Column::Mpg.name())
        } else {
            write!(f, "{} ~ {}", Column::Mpg.name(), rhs.join(" + "))
        }
    }
}

impl Serialize for Formula {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
