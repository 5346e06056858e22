// vim: tw=80
//! Failures reported by the engine

use std::{fmt, slice};

use thiserror::Error;

/// Everything that can go wrong while mocking.
///
/// None of these are recovered internally.  They are returned to the caller,
/// which is normally a hand-written mock method or the test itself.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A stubbed method was called with arguments that match none of its
    /// stubbings.  Raised at the call site, before any value is returned.
    #[error("potential stubbing problem: {mock}.{invocation} matches none of \
        the stubbings of that method:\n{stubbings}")]
    StubbingMismatch {
        mock: String,
        invocation: String,
        stubbings: Listing,
    },
    /// One or more stubbings were never used during the session.
    #[error("unnecessary stubbings detected in {session}:\n{stubbings}")]
    UnnecessaryStubbing {
        session: String,
        stubbings: Listing,
    },
    /// A mock has calls that were neither stubbed nor explicitly verified.
    #[error("no interactions wanted on {mock}, but found:\n{invocations}")]
    UnexpectedInteraction {
        mock: String,
        invocations: Listing,
    },
    /// A call pattern was observed a different number of times than expected.
    #[error("{mock}.{wanted} was expected {expected} but was called \
        {actual} time(s)")]
    VerificationCountMismatch {
        mock: String,
        wanted: String,
        expected: String,
        actual: usize,
    },
    /// A call pattern happened, but not after the previously verified calls.
    #[error("{mock}.{wanted} was expected {expected} after the previously \
        verified call, but only {actual} such call(s) happened in that order")]
    VerificationOrder {
        mock: String,
        wanted: String,
        expected: String,
        actual: usize,
    },
    /// A `return_once` stubbing was matched a second time.
    #[error("{mock}.{stubbing} can only answer once, but was called again")]
    AnswerExhausted {
        mock: String,
        stubbing: String,
    },
    /// The session has already been finished.
    #[error("mocking session {session} is already finished")]
    SessionClosed {
        session: String,
    },
    /// A mock was used with a session or verifier that does not own it.
    #[error("mock {mock} does not belong to {scope}")]
    ForeignMock {
        mock: String,
        scope: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// An ordered list of offending items, one per line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Listing(Vec<String>);

impl Listing {
    pub fn items(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for Listing {
    fn from(items: Vec<String>) -> Self {
        Listing(items)
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {}. {}", i + 1, item)?;
        }
        Ok(())
    }
}

/// One reason why a test failed.
#[derive(Debug, Error)]
pub enum Failure {
    /// The test body returned an error of its own.
    #[error("{0}")]
    Test(Box<dyn std::error::Error + Send + Sync>),
    /// The test body panicked.
    #[error("test panicked: {0}")]
    Panic(String),
    /// The mocking engine detected a problem.
    #[error(transparent)]
    Mocking(#[from] Error),
}

impl Failure {
    /// Wrap any error raised by the test body itself.
    pub fn test<E>(e: E) -> Self
        where E: Into<Box<dyn std::error::Error + Send + Sync>>
    {
        Failure::Test(e.into())
    }

    pub fn as_mocking(&self) -> Option<&Error> {
        match self {
            Failure::Mocking(e) => Some(e),
            _ => None
        }
    }
}

impl From<String> for Failure {
    fn from(msg: String) -> Self {
        Failure::test(msg)
    }
}

impl From<&str> for Failure {
    fn from(msg: &str) -> Self {
        Failure::test(msg)
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for Failure {
    fn from(e: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Failure::Test(e)
    }
}

/// All of the failures of a single test, in the order they were detected.
///
/// A session-level failure never replaces the test's own failure; both are
/// kept side by side.
#[derive(Debug, Default)]
pub struct Failures(Vec<Failure>);

impl Failures {
    pub(crate) fn push(&mut self, failure: Failure) {
        self.0.push(failure);
    }

    pub fn iter(&self) -> slice::Iter<'_, Failure> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<Failure> {
        self.0
    }

    /// Report the failures the way the standard test harness expects: by
    /// panicking with every one of them in the message.
    pub fn into_panic(self) -> ! {
        panic!("{}", self)
    }
}

impl fmt::Display for Failures {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} failure(s)", self.0.len())?;
        for (i, failure) in self.0.iter().enumerate() {
            write!(f, "\n[{}] {}", i + 1, failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for Failures {}

impl<'a> IntoIterator for &'a Failures {
    type Item = &'a Failure;
    type IntoIter = slice::Iter<'a, Failure>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
