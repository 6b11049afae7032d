use derive_more::Constructor;
use std::fmt::{self, Display};

/// 1-based line and column of a token or diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Constructor)]
pub struct Loc {
    line: usize,
    col: usize,
}

impl Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, col {}", self.line, self.col)
    }
}

#[derive(Debug, Clone, PartialEq, Constructor)]
pub struct Located<T> {
    loc: Loc,
    val: T,
}

impl<T> Located<T> {
    pub fn with_loc(loc: Loc, val: T) -> Self {
        Located::new(loc, val)
    }

    pub fn loc(&self) -> Loc {
        self.loc
    }

    pub fn value(&self) -> &T {
        &self.val
    }

    pub fn into_value(self) -> T {
        self.val
    }

    pub fn map<S>(self, f: impl FnOnce(T) -> S) -> Located<S> {
        Located {
            loc: self.loc,
            val: f(self.val),
        }
    }
}

impl<T: Display> Display for Located<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.val, self.loc)
    }
}
