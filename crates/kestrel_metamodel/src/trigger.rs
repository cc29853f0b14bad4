//! Why a specification was introspected.
//!
//! Triggers exist for diagnosis only: when boot takes a surprising path
//! through the class model, the trigger log shows which type pulled in
//! which. Nothing branches on them.

use core::fmt;
use std::collections::VecDeque;

use crate::ident::ClassName;

/// What caused a specification to be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerCause {
    /// Eager introspection at boot.
    Boot,
    /// An explicit `load_specification` call.
    Request,
    /// Superclass of the triggering class.
    Superclass,
    /// Interface of the triggering class.
    Interface,
    /// Type of a member or parameter of the triggering class.
    MemberType,
    /// Mixin scan on behalf of the triggering class.
    Mixin,
    /// Hot reload.
    Reload,
    /// Lookup by logical type name.
    LogicalTypeLookup,
}

/// A cause and, when there is one, the class whose introspection caused it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntrospectionTrigger {
    /// The cause.
    pub cause: TriggerCause,
    /// The triggering class.
    pub class: Option<ClassName>,
}

impl IntrospectionTrigger {
    /// A trigger without a triggering class.
    #[must_use]
    pub fn new(cause: TriggerCause) -> Self {
        Self { cause, class: None }
    }

    /// A trigger caused by another class.
    #[must_use]
    pub fn from_class(cause: TriggerCause, class: &ClassName) -> Self {
        Self {
            cause,
            class: Some(class.clone()),
        }
    }
}

impl fmt::Display for IntrospectionTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.class {
            Some(class) => write!(f, "{:?} from {class}", self.cause),
            None => write!(f, "{:?}", self.cause),
        }
    }
}

/// One entry of the trigger log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerRecord {
    /// The class whose specification was created.
    pub class: ClassName,
    /// Why.
    pub trigger: IntrospectionTrigger,
}

/// Bounded log of the most recent triggers.
#[derive(Debug)]
pub(crate) struct TriggerLog {
    records: VecDeque<TriggerRecord>,
    capacity: usize,
}

impl TriggerLog {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub(crate) fn push(&mut self, record: TriggerRecord) {
        if self.capacity == 0 {
            return;
        }
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub(crate) fn records(&self) -> Vec<TriggerRecord> {
        self.records.iter().cloned().collect()
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }
}
