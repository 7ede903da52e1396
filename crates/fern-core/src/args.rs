use std::fmt;

use crate::error::FernError;
use crate::value::TypeTag;

/// Argument-signature descriptor: an ordered list of parameter type tags
/// plus a flag marking the last parameter as variadic.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArgDefs {
    defs: Vec<TypeTag>,
    vararg: bool,
}

impl ArgDefs {
    pub fn fixed(defs: &[TypeTag]) -> Self {
        ArgDefs {
            defs: defs.to_vec(),
            vararg: false,
        }
    }

    pub fn variadic(defs: &[TypeTag]) -> Self {
        ArgDefs {
            defs: defs.to_vec(),
            vararg: true,
        }
    }

    pub fn size(&self) -> usize {
        self.defs.len()
    }

    pub fn is_vararg(&self) -> bool {
        self.vararg
    }

    pub fn get(&self, i: usize) -> Result<TypeTag, FernError> {
        self.defs.get(i).copied().ok_or_else(|| {
            FernError::out_of_bounds(format!("arg def {} of {}", i, self.defs.len()))
        })
    }

    /// Compact rendering for diagnostics and unique ids: `"Int, Str*"`.
    pub fn moniker(&self) -> String {
        if self.defs.is_empty() {
            return String::new();
        }
        let mut out = self
            .defs
            .iter()
            .map(|tag| tag.name())
            .collect::<Vec<_>>()
            .join(", ");
        if self.vararg {
            out.push('*');
        }
        out
    }

    /// Tail sub-signature starting at `idx`, used by currying.
    ///
    /// Slicing past a variadic tail collapses to a single-variadic-parameter
    /// signature, so a partially-applied variadic function stays variadic.
    pub fn from(&self, idx: usize) -> Result<ArgDefs, FernError> {
        if !self.vararg && idx > self.defs.len() {
            return Err(FernError::out_of_bounds(format!(
                "sub-signature from {} of {}",
                idx,
                self.defs.len()
            )));
        }
        if self.vararg && idx >= self.defs.len() {
            let tail = self.defs.last().copied().map(|t| vec![t]).unwrap_or_default();
            return Ok(ArgDefs {
                defs: tail,
                vararg: true,
            });
        }
        Ok(ArgDefs {
            defs: self.defs[idx..].to_vec(),
            vararg: self.vararg,
        })
    }
}

impl fmt::Display for ArgDefs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tag) in self.defs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "${} {}", i + 1, tag)?;
        }
        if self.vararg && !self.defs.is_empty() {
            write!(f, "*")?;
        }
        Ok(())
    }
}
