// vim: tw=80
//! Argument matchers

use std::fmt;

use predicates::prelude::{Predicate, predicate};
use predicates_tree::CaseTreeExt;

/// Decides whether a call's arguments satisfy a declared pattern.
///
/// Any [`Predicate`] over the method's argument tuple can serve as a pattern.
/// Matching must be free of side effects, because the same call may be
/// evaluated against several stubbings.
pub struct Matcher<I>(Box<dyn Predicate<I> + Send>);

impl<I> Matcher<I> {
    pub fn new<P: Predicate<I> + Send + 'static>(p: P) -> Self {
        Matcher(Box::new(p))
    }

    /// Match any arguments at all.
    pub fn any() -> Self {
        Matcher::new(predicate::always())
    }

    /// Match arguments equal to `args`.
    pub fn eq(args: I) -> Self
        where I: PartialEq + fmt::Debug + Send + 'static
    {
        Matcher::new(predicate::eq(args))
    }

    /// Match with an arbitrary function of the arguments.
    pub fn from_fn<F>(f: F) -> Self
        where F: Fn(&I) -> bool + Send + 'static, I: Send + 'static
    {
        Matcher::new(predicate::function(f))
    }

    pub fn matches(&self, i: &I) -> bool {
        self.0.eval(i)
    }

    /// Explain why `i` fails to match, or `None` if it matches.
    pub fn explain(&self, i: &I) -> Option<String> {
        self.0.find_case(false, i)
            .map(|case| case.tree().to_string())
    }
}

impl<I> Default for Matcher<I> {
    fn default() -> Self {
        Matcher::any()
    }
}

impl<I> fmt::Display for Matcher<I> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl<I> fmt::Debug for Matcher<I> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Matcher({})", self.0)
    }
}
