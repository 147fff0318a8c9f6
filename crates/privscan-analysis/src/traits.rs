//! The privatization trait lattice.
//!
//! A trait value summarizes how a loop touches one piece of memory. Values only ever move down
//! the lattice while a loop is being classified: every new observation is combined with
//! [`TraitSet::meet`], so a location that looks private along one path and carries a dependence
//! along another ends up as a dependence.
//!
//! The lattice is the product of three independent components:
//!
//! * the copy discipline of written memory ([`PrivateKind`]),
//! * whether reads make the initial value observable, and whether accesses are safe to share,
//! * whether the address escapes the loop body.
//!
//! [`TraitSet::DEPENDENCY`] sits below every access combination and only keeps the address
//! component.

use serde::Serialize;
use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign};

/// Named points of the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TraitId {
    NoAccess,
    Readonly,
    Shared,
    Private,
    FirstPrivate,
    SecondToLastPrivate,
    LastPrivate,
    DynamicPrivate,
    Dependency,
    AddressAccess,
}

impl TraitId {
    pub const ALL: [TraitId; 10] = [
        TraitId::NoAccess,
        TraitId::Readonly,
        TraitId::Shared,
        TraitId::Private,
        TraitId::FirstPrivate,
        TraitId::SecondToLastPrivate,
        TraitId::LastPrivate,
        TraitId::DynamicPrivate,
        TraitId::Dependency,
        TraitId::AddressAccess,
    ];
}

/// Which value of a written location survives the loop.
///
/// The order of declaration is the lattice order from top to bottom, except that
/// `SecondToLast` and `Last` are incomparable; their meet is `Dynamic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PrivateKind {
    /// Not written.
    None,
    /// Written, dead after the loop.
    Private,
    /// The value of the penultimate iteration escapes.
    SecondToLast,
    /// The value of the last iteration escapes.
    Last,
    /// Some iteration's value escapes, which one is only known at run time.
    Dynamic,
}

impl PrivateKind {
    const COUNT: usize = 5;

    fn index(self) -> usize {
        self as usize
    }

    pub fn meet(self, other: PrivateKind) -> PrivateKind {
        use PrivateKind::*;
        const MEET: [[PrivateKind; PrivateKind::COUNT]; PrivateKind::COUNT] = [
            [None, Private, SecondToLast, Last, Dynamic],
            [Private, Private, SecondToLast, Last, Dynamic],
            [SecondToLast, SecondToLast, SecondToLast, Dynamic, Dynamic],
            [Last, Last, Dynamic, Last, Dynamic],
            [Dynamic, Dynamic, Dynamic, Dynamic, Dynamic],
        ];
        MEET[self.index()][other.index()]
    }

    pub fn join(self, other: PrivateKind) -> PrivateKind {
        use PrivateKind::*;
        const JOIN: [[PrivateKind; PrivateKind::COUNT]; PrivateKind::COUNT] = [
            [None, None, None, None, None],
            [None, Private, Private, Private, Private],
            [None, Private, SecondToLast, Private, SecondToLast],
            [None, Private, Private, Last, Last],
            [None, Private, SecondToLast, Last, Dynamic],
        ];
        JOIN[self.index()][other.index()]
    }
}

/// Everything except the address component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Access {
    /// Loop-carried dependence; nothing finer can be said.
    Dependency,
    Independent {
        private: PrivateKind,
        /// The value from before the loop may be read.
        read: bool,
        /// All iterations may use the single original copy.
        shared: bool,
    },
}

/// One element of the trait lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TraitSet {
    access: Access,
    address_access: bool,
}

const fn independent(private: PrivateKind, read: bool, shared: bool) -> TraitSet {
    TraitSet {
        access: Access::Independent {
            private,
            read,
            shared,
        },
        address_access: false,
    }
}

impl TraitSet {
    /// Top of the lattice and identity of [`TraitSet::meet`].
    pub const NO_ACCESS: TraitSet = independent(PrivateKind::None, false, false);
    pub const READONLY: TraitSet = independent(PrivateKind::None, true, false);
    pub const SHARED: TraitSet = independent(PrivateKind::None, true, true);
    /// The shared component alone. Not a named point: it marks memory free of loop-carried
    /// dependences without claiming its initial value is read.
    pub const SHAREABLE: TraitSet = independent(PrivateKind::None, false, true);
    pub const PRIVATE: TraitSet = independent(PrivateKind::Private, false, false);
    pub const FIRST_PRIVATE: TraitSet = independent(PrivateKind::Private, true, false);
    pub const SECOND_TO_LAST_PRIVATE: TraitSet =
        independent(PrivateKind::SecondToLast, false, false);
    pub const LAST_PRIVATE: TraitSet = independent(PrivateKind::Last, false, false);
    pub const DYNAMIC_PRIVATE: TraitSet = independent(PrivateKind::Dynamic, false, false);
    pub const DEPENDENCY: TraitSet = TraitSet {
        access: Access::Dependency,
        address_access: false,
    };
    pub const ADDRESS_ACCESS: TraitSet = TraitSet {
        access: Access::Independent {
            private: PrivateKind::None,
            read: false,
            shared: false,
        },
        address_access: true,
    };
    /// Bottom of the lattice.
    pub const BOTTOM: TraitSet = TraitSet {
        access: Access::Dependency,
        address_access: true,
    };

    pub const fn from_id(id: TraitId) -> TraitSet {
        match id {
            TraitId::NoAccess => Self::NO_ACCESS,
            TraitId::Readonly => Self::READONLY,
            TraitId::Shared => Self::SHARED,
            TraitId::Private => Self::PRIVATE,
            TraitId::FirstPrivate => Self::FIRST_PRIVATE,
            TraitId::SecondToLastPrivate => Self::SECOND_TO_LAST_PRIVATE,
            TraitId::LastPrivate => Self::LAST_PRIVATE,
            TraitId::DynamicPrivate => Self::DYNAMIC_PRIVATE,
            TraitId::Dependency => Self::DEPENDENCY,
            TraitId::AddressAccess => Self::ADDRESS_ACCESS,
        }
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn has_address_access(&self) -> bool {
        self.address_access
    }

    pub fn is_dependency(&self) -> bool {
        matches!(self.access, Access::Dependency)
    }

    /// The same value with the address component cleared.
    pub fn without_address(self) -> TraitSet {
        TraitSet {
            access: self.access,
            address_access: false,
        }
    }

    /// Exact comparison with a named point, ignoring the address component. `AddressAccess`
    /// asks for the address component alone.
    pub fn is(&self, id: TraitId) -> bool {
        match id {
            TraitId::AddressAccess => self.address_access,
            _ => self.without_address() == TraitSet::from_id(id),
        }
    }

    /// Greatest lower bound: everything either side says about the memory holds.
    pub fn meet(self, other: TraitSet) -> TraitSet {
        let access = match (self.access, other.access) {
            (Access::Dependency, _) | (_, Access::Dependency) => Access::Dependency,
            (
                Access::Independent {
                    private: p1,
                    read: r1,
                    shared: s1,
                },
                Access::Independent {
                    private: p2,
                    read: r2,
                    shared: s2,
                },
            ) => Access::Independent {
                private: p1.meet(p2),
                read: r1 || r2,
                shared: s1 || s2,
            },
        };
        TraitSet {
            access,
            address_access: self.address_access || other.address_access,
        }
    }

    /// Least upper bound: only what both sides agree on.
    pub fn join(self, other: TraitSet) -> TraitSet {
        let access = match (self.access, other.access) {
            (Access::Dependency, access) | (access, Access::Dependency) => access,
            (
                Access::Independent {
                    private: p1,
                    read: r1,
                    shared: s1,
                },
                Access::Independent {
                    private: p2,
                    read: r2,
                    shared: s2,
                },
            ) => Access::Independent {
                private: p1.join(p2),
                read: r1 && r2,
                shared: s1 && s2,
            },
        };
        TraitSet {
            access,
            address_access: self.address_access && other.address_access,
        }
    }

    /// Lattice order: `self` says at least as much as `other`.
    pub fn is_below(&self, other: &TraitSet) -> bool {
        self.meet(*other) == *self
    }

    /// The named point this value equals once the address component is dropped, if any.
    pub fn named(&self) -> Option<TraitId> {
        TraitId::ALL
            .iter()
            .copied()
            .filter(|id| *id != TraitId::AddressAccess)
            .find(|id| self.is(*id))
    }
}

impl Default for TraitSet {
    fn default() -> Self {
        Self::NO_ACCESS
    }
}

impl From<TraitId> for TraitSet {
    fn from(id: TraitId) -> Self {
        TraitSet::from_id(id)
    }
}

impl BitAnd for TraitSet {
    type Output = TraitSet;

    fn bitand(self, rhs: TraitSet) -> TraitSet {
        self.meet(rhs)
    }
}

impl BitAndAssign for TraitSet {
    fn bitand_assign(&mut self, rhs: TraitSet) {
        *self = self.meet(rhs);
    }
}

impl BitOr for TraitSet {
    type Output = TraitSet;

    fn bitor(self, rhs: TraitSet) -> TraitSet {
        self.join(rhs)
    }
}

impl BitOrAssign for TraitSet {
    fn bitor_assign(&mut self, rhs: TraitSet) {
        *self = self.join(rhs);
    }
}

impl fmt::Display for TraitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.access {
            Access::Dependency => write!(f, "dependency")?,
            Access::Independent {
                private,
                read,
                shared,
            } => {
                let mut parts = Vec::new();
                match private {
                    PrivateKind::None if read => parts.push("read only"),
                    PrivateKind::None => parts.push("no access"),
                    PrivateKind::Private => parts.push("private"),
                    PrivateKind::SecondToLast => parts.push("second to last private"),
                    PrivateKind::Last => parts.push("last private"),
                    PrivateKind::Dynamic => parts.push("dynamic private"),
                }
                if read && private != PrivateKind::None {
                    parts.push("first private");
                }
                if shared {
                    parts.push("shared");
                }
                write!(f, "{}", parts.join(" & "))?;
            }
        }
        if self.address_access {
            write!(f, " & address access")?;
        }
        Ok(())
    }
}
