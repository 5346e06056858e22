// vim: tw=80
//! The per-mock record of observed calls

use std::{fmt, sync::Arc};

use downcast::*;

use crate::{
    matcher::Matcher,
    method::{Method, Signature}
};

/// Argument values of any type, as stored in the log.
pub(crate) trait AnyArgs: Any + fmt::Debug + Send + Sync {}
downcast!(dyn AnyArgs);

impl<T: fmt::Debug + Send + Sync + 'static> AnyArgs for T {}

/// One observed call.
pub(crate) struct Invocation {
    /// Position in the session-wide order of calls
    pub(crate) seq: u64,
    pub(crate) signature: Signature,
    pub(crate) args: Arc<dyn AnyArgs>,
    pub(crate) matched_stubbing: bool,
    pub(crate) explicitly_verified: bool,
}

impl Invocation {
    fn args<I: AnyArgs>(&self) -> Option<&I> {
        let erased: &dyn AnyArgs = &*self.args;
        let args: Option<&I> = erased.downcast_ref().ok();
        args
    }

    /// Neither stubbed nor verified
    fn is_unaccounted(&self) -> bool {
        !self.matched_stubbing && !self.explicitly_verified
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({:?})", self.signature.name(), self.args)
    }
}

/// Append-only list of the calls made on one mock.
#[derive(Default)]
pub(crate) struct InvocationLog(Vec<Invocation>);

impl InvocationLog {
    pub(crate) fn record(&mut self,
                         seq: u64,
                         signature: Signature,
                         args: Arc<dyn AnyArgs>,
                         matched_stubbing: bool)
    {
        self.0.push(Invocation {
            seq,
            signature,
            args,
            matched_stubbing,
            explicitly_verified: false
        });
    }

    /// Indices of the calls to `method` whose arguments satisfy `matcher`,
    /// restricted to calls made after sequence number `after`.
    pub(crate) fn matching<I, O>(&self,
                                 method: &Method<I, O>,
                                 matcher: &Matcher<I>,
                                 after: Option<u64>) -> Vec<usize>
        where I: AnyArgs, O: 'static
    {
        let signature = method.signature();
        self.0.iter()
            .enumerate()
            .filter(|(_, inv)| inv.signature == signature)
            .filter(|(_, inv)| after.map_or(true, |seq| inv.seq > seq))
            .filter(|(_, inv)| inv.args::<I>().is_some_and(|a| matcher.matches(a)))
            .map(|(i, _)| i)
            .collect()
    }

    pub(crate) fn mark_verified(&mut self, indices: &[usize]) {
        for &i in indices {
            if let Some(inv) = self.0.get_mut(i) {
                inv.explicitly_verified = true;
            }
        }
    }

    pub(crate) fn get(&self, i: usize) -> Option<&Invocation> {
        self.0.get(i)
    }

    /// Calls that were neither bound to a stubbing nor explicitly verified.
    pub(crate) fn unaccounted(&self) -> impl Iterator<Item=&Invocation> {
        self.0.iter().filter(|inv| inv.is_unaccounted())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item=&Invocation> {
        self.0.iter()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }
}
