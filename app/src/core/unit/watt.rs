use derive_more::derive::AsRef;
use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Neg},
};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsRef)]
pub struct Watt(pub f64);

impl Watt {
    pub fn is_negative(&self) -> bool {
        self.0 < 0.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0.0
    }
}

impl Display for Watt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} W", self.0)
    }
}

impl From<&Watt> for f64 {
    fn from(value: &Watt) -> Self {
        value.0
    }
}

impl From<f64> for Watt {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl Add for Watt {
    type Output = Watt;

    fn add(self, rhs: Self) -> Self::Output {
        Watt(self.0 + rhs.0)
    }
}

impl Neg for Watt {
    type Output = Watt;

    fn neg(self) -> Self::Output {
        Watt(-self.0)
    }
}

impl Sum for Watt {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Watt(0.0), |acc, w| acc + w)
    }
}
