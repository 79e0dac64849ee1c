//! Evaluation value (Value)
//!
//! The scale keeps the region around `Value::MATE` reserved for mate scores.
//! Ordinary evaluations live in `(-MATE_IN_MAX_PLY, MATE_IN_MAX_PLY)`.

/// Maximum search ply
pub const MAX_PLY: i32 = 246;

/// Evaluation value
///
/// Ordinary scores and mate distances (`mate_in` / `mated_in`) share one
/// integer scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Value(i32);

impl Value {
    pub const ZERO: Value = Value(0);
    pub const DRAW: Value = Value(0);
    /// Mate (best score for the mating side)
    pub const MATE: Value = Value(32000);
    pub const INFINITE: Value = Value(32001);
    pub const NONE: Value = Value(32002);

    /// Mate found within the maximum search ply
    pub const MATE_IN_MAX_PLY: Value = Value(Self::MATE.0 - 2 * MAX_PLY);
    pub const MATED_IN_MAX_PLY: Value = Value(-Self::MATE_IN_MAX_PLY.0);

    /// Endgame pawn value, the unit behind one displayed pawn
    pub const PAWN_VALUE_EG: i32 = 213;

    #[inline]
    pub const fn new(v: i32) -> Value {
        Value(v)
    }

    /// Score for giving mate in `ply` plies
    #[inline]
    pub const fn mate_in(ply: i32) -> Value {
        Value(Self::MATE.0 - ply)
    }

    /// Score for being mated in `ply` plies
    #[inline]
    pub const fn mated_in(ply: i32) -> Value {
        Value(-Self::MATE.0 + ply)
    }

    #[inline]
    pub const fn is_win(self) -> bool {
        self.0 >= Self::MATE_IN_MAX_PLY.0
    }

    #[inline]
    pub const fn is_loss(self) -> bool {
        self.0 <= Self::MATED_IN_MAX_PLY.0
    }

    #[inline]
    pub const fn is_mate_score(self) -> bool {
        self.is_win() || self.is_loss()
    }

    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Value in pawns, for human-readable traces
    #[inline]
    pub fn to_pawns(self) -> f64 {
        f64::from(self.0) / f64::from(Self::PAWN_VALUE_EG)
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::ZERO
    }
}

impl std::ops::Neg for Value {
    type Output = Value;

    #[inline]
    fn neg(self) -> Value {
        Value(-self.0)
    }
}

impl std::ops::Add for Value {
    type Output = Value;

    #[inline]
    fn add(self, rhs: Value) -> Value {
        Value(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Value {
    type Output = Value;

    #[inline]
    fn sub(self, rhs: Value) -> Value {
        Value(self.0 - rhs.0)
    }
}

impl std::ops::Add<i32> for Value {
    type Output = Value;

    #[inline]
    fn add(self, rhs: i32) -> Value {
        Value(self.0 + rhs)
    }
}

impl std::ops::Sub<i32> for Value {
    type Output = Value;

    #[inline]
    fn sub(self, rhs: i32) -> Value {
        Value(self.0 - rhs)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Value {
        Value(v)
    }
}

impl From<Value> for i32 {
    fn from(v: Value) -> i32 {
        v.0
    }
}

/// Bound type of a stored search score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Bound {
    None = 0,
    Upper = 1,
    Lower = 2,
    Exact = 3,
}

impl Bound {
    #[inline]
    pub const fn from_bits(bits: u8) -> Bound {
        match bits & 3 {
            1 => Bound::Upper,
            2 => Bound::Lower,
            3 => Bound::Exact,
            _ => Bound::None,
        }
    }

    #[inline]
    pub const fn includes_lower(self) -> bool {
        (self as u8) & (Bound::Lower as u8) != 0
    }

    #[inline]
    pub const fn includes_upper(self) -> bool {
        (self as u8) & (Bound::Upper as u8) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_constants() {
        assert_eq!(Value::MATE.raw(), 32000);
        assert_eq!(Value::INFINITE.raw(), 32001);
        assert_eq!(Value::MATE_IN_MAX_PLY.raw(), 32000 - 492);
    }

    #[test]
    fn test_value_mate_in_and_mated_in() {
        let v = Value::mate_in(5);
        assert!(v.is_win());
        assert!(v.is_mate_score());
        let v = Value::mated_in(3);
        assert!(v.is_loss());
        assert!(!Value::ZERO.is_mate_score());
    }

    #[test]
    fn test_value_ordering() {
        assert!(Value::mate_in(1) > Value::mate_in(10));
        assert!(Value::mated_in(10) > Value::mated_in(1));
        assert_eq!(-Value::new(100), Value::new(-100));
    }

    #[test]
    fn test_bound_bits() {
        assert!(Bound::Exact.includes_lower());
        assert!(Bound::Exact.includes_upper());
        assert!(!Bound::Upper.includes_lower());
        assert_eq!(Bound::from_bits(2), Bound::Lower);
    }
}
