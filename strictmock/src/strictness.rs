// vim: tw=80
use std::fmt;

/// How strictly a session, or a single mock, polices its stubbings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Strictness {
    /// Never complain about stubbings.
    Lenient,
    /// Log stubbing problems, but never fail because of them.
    Warn,
    /// Fail immediately on argument mismatches with an unused stubbing, and
    /// fail at the end of the session if any stubbing went unused.
    #[default]
    StrictStubs,
}

impl Strictness {
    /// Should an argument mismatch fail the call?
    pub fn fails_on_mismatch(self) -> bool {
        self == Strictness::StrictStubs
    }

    /// Should unused stubbings fail the session?
    pub fn fails_on_unused(self) -> bool {
        self == Strictness::StrictStubs
    }

    /// Should problems at least be logged?
    pub fn reports(self) -> bool {
        self != Strictness::Lenient
    }
}

impl fmt::Display for Strictness {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Strictness::Lenient => "lenient",
            Strictness::Warn => "warn",
            Strictness::StrictStubs => "strict stubs",
        };
        f.write_str(s)
    }
}
