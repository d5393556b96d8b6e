
use serde::Serialize;

/// The closed set of breakpoint orientation signatures.
/// Declaration order is the canonical iteration order for every per-class collection.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
    strum_macros::AsRefStr, strum_macros::Display, strum_macros::EnumIter, strum_macros::EnumString)]
pub enum OrientationClass {
    /// Left end keeps the segment ending at the break, right end keeps the segment starting at it
    #[strum(serialize = "+-")]
    PlusMinus,
    /// Both ends keep the segment ending at the break
    #[strum(serialize = "++")]
    PlusPlus,
    /// Left end keeps the segment starting at the break, right end keeps the segment ending at it
    #[strum(serialize = "-+")]
    MinusPlus,
    /// Both ends keep the segment starting at the break
    #[strum(serialize = "--")]
    MinusMinus,
    /// Inserted sequence at a single site
    #[strum(serialize = "<INS>")]
    Insertion
}

/// Which side of a breakend the retained sequence sits on
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BreakendSide {
    /// Retained sequence ends at the breakend; i.e. the read is clipped to the right
    Plus,
    /// Retained sequence starts at the breakend; i.e. the read is clipped to the left
    Minus
}

impl BreakendSide {
    pub fn symbol(&self) -> char {
        match self {
            BreakendSide::Plus => '+',
            BreakendSide::Minus => '-'
        }
    }
}

impl OrientationClass {
    /// Builds the paired class from the two sides of a breakend pair
    pub fn from_sides(first: BreakendSide, second: BreakendSide) -> Self {
        match (first, second) {
            (BreakendSide::Plus, BreakendSide::Minus) => OrientationClass::PlusMinus,
            (BreakendSide::Plus, BreakendSide::Plus) => OrientationClass::PlusPlus,
            (BreakendSide::Minus, BreakendSide::Plus) => OrientationClass::MinusPlus,
            (BreakendSide::Minus, BreakendSide::Minus) => OrientationClass::MinusMinus
        }
    }

    /// Returns the sides of a paired class, `None` for insertions
    pub fn sides(&self) -> Option<(BreakendSide, BreakendSide)> {
        match self {
            OrientationClass::PlusMinus => Some((BreakendSide::Plus, BreakendSide::Minus)),
            OrientationClass::PlusPlus => Some((BreakendSide::Plus, BreakendSide::Plus)),
            OrientationClass::MinusPlus => Some((BreakendSide::Minus, BreakendSide::Plus)),
            OrientationClass::MinusMinus => Some((BreakendSide::Minus, BreakendSide::Minus)),
            OrientationClass::Insertion => None
        }
    }

    /// Short identifier that is safe for file names and cluster ids
    pub fn code(&self) -> &'static str {
        match self {
            OrientationClass::PlusMinus => "PM",
            OrientationClass::PlusPlus => "PP",
            OrientationClass::MinusPlus => "MP",
            OrientationClass::MinusMinus => "MM",
            OrientationClass::Insertion => "INS"
        }
    }

    pub fn is_insertion(&self) -> bool {
        matches!(self, OrientationClass::Insertion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_canonical_order() {
        let tags: Vec<String> = OrientationClass::iter().map(|c| c.to_string()).collect();
        assert_eq!(tags, vec!["+-", "++", "-+", "--", "<INS>"]);
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(OrientationClass::from_str("-+").unwrap(), OrientationClass::MinusPlus);
        assert_eq!(OrientationClass::from_str("<INS>").unwrap(), OrientationClass::Insertion);
        assert!(OrientationClass::from_str("+").is_err());
    }
}
