use serde::Serialize;
use std::ops::AddAssign;

/// How many pieces of memory fell into each category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub readonly: usize,
    pub shared: usize,
    pub private: usize,
    pub first_private: usize,
    pub last_private: usize,
    pub second_to_last_private: usize,
    pub dynamic_private: usize,
    pub dependency: usize,
    pub address_access: usize,
}

impl Statistics {
    pub fn total(&self) -> usize {
        self.readonly
            + self.shared
            + self.private
            + self.first_private
            + self.last_private
            + self.second_to_last_private
            + self.dynamic_private
            + self.dependency
    }

    pub fn entries(&self) -> [(&'static str, usize); 9] {
        [
            ("read only", self.readonly),
            ("shared", self.shared),
            ("private", self.private),
            ("first private", self.first_private),
            ("last private", self.last_private),
            ("second to last private", self.second_to_last_private),
            ("dynamic private", self.dynamic_private),
            ("dependency", self.dependency),
            ("address access", self.address_access),
        ]
    }
}

impl AddAssign for Statistics {
    fn add_assign(&mut self, other: Statistics) {
        self.readonly += other.readonly;
        self.shared += other.shared;
        self.private += other.private;
        self.first_private += other.first_private;
        self.last_private += other.last_private;
        self.second_to_last_private += other.second_to_last_private;
        self.dynamic_private += other.dynamic_private;
        self.dependency += other.dependency;
        self.address_access += other.address_access;
    }
}
