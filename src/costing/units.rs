//! Units of measure accepted by the catalog and by recipe measurements.

use std::fmt;
use std::str::FromStr;

/// Inventory prices are quoted per `Kg`, `Liter` or `Pcs`; recipes may use the
/// matching small unit (`G`, `Ml`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    G,
    Kg,
    Ml,
    Liter,
    Pcs,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid unit: {0}")]
pub struct UnknownUnit(pub String);

impl Unit {
    pub const ALL: [Unit; 5] = [Unit::G, Unit::Kg, Unit::Ml, Unit::Liter, Unit::Pcs];

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::G => "g",
            Unit::Kg => "kg",
            Unit::Ml => "ml",
            Unit::Liter => "liter",
            Unit::Pcs => "pcs",
        }
    }
}

impl FromStr for Unit {
    type Err = UnknownUnit;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_lowercase();
        Unit::ALL
            .into_iter()
            .find(|unit| unit.as_str() == normalized)
            .ok_or_else(|| UnknownUnit(raw.to_string()))
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_units_case_insensitively() {
        assert_eq!("g".parse::<Unit>(), Ok(Unit::G));
        assert_eq!("KG".parse::<Unit>(), Ok(Unit::Kg));
        assert_eq!("Ml".parse::<Unit>(), Ok(Unit::Ml));
        assert_eq!(" Liter ".parse::<Unit>(), Ok(Unit::Liter));
        assert_eq!("PCS".parse::<Unit>(), Ok(Unit::Pcs));
    }

    #[test]
    fn rejects_everything_else() {
        for raw in ["", "gram", "l", "litre", "pc", "invalid"] {
            assert_eq!(raw.parse::<Unit>(), Err(UnknownUnit(raw.to_string())), "{raw}");
        }
    }

    #[test]
    fn display_round_trips() {
        for unit in Unit::ALL {
            assert_eq!(unit.to_string().parse::<Unit>(), Ok(unit));
        }
    }
}
