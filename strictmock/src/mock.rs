// vim: tw=80
use std::{fmt, sync::Arc};

use crate::{
    invocation::InvocationLog,
    strictness::Strictness,
    stubbing::StubbingRegistry
};

/// Identifies a mock within its session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MockId(pub(crate) usize);

/// Handle to one test double.
///
/// A `Mock` is cheap to clone.  It carries no state of its own: its calls and
/// stubbings live in the [`Session`](crate::Session) that created it, and are
/// discarded together with that session.
#[derive(Clone, Debug)]
pub struct Mock {
    pub(crate) id: MockId,
    pub(crate) session: u64,
    name: Arc<str>,
}

impl Mock {
    pub(crate) fn new(id: MockId, session: u64, name: Arc<str>) -> Self {
        Mock{id, session, name}
    }

    pub fn id(&self) -> MockId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Mock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Everything a session knows about one of its mocks.
pub(crate) struct MockState {
    pub(crate) name: Arc<str>,
    /// Overrides the session's strictness, if set
    pub(crate) strictness: Option<Strictness>,
    pub(crate) log: InvocationLog,
    pub(crate) registry: StubbingRegistry,
}

impl MockState {
    pub(crate) fn new(session: u64,
                      id: MockId,
                      name: Arc<str>,
                      strictness: Option<Strictness>) -> Self
    {
        MockState {
            name,
            strictness,
            log: InvocationLog::default(),
            registry: StubbingRegistry::new(session, id)
        }
    }

    pub(crate) fn strictness(&self, session: Strictness) -> Strictness {
        self.strictness.unwrap_or(session)
    }
}
