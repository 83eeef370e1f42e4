//! Per-cell flow regime flags.

/// Friction regime of a cell after the last step.
///
/// The numeric values are part of the diagnostic contract:
/// 0 = stopped, 1 = Coulomb, 2 = Voellmy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum FlowRegime {
    /// No motion: thickness below threshold or friction consumed all
    /// momentum this step.
    #[default]
    Stopped = 0,
    /// Dry Coulomb friction governed the momentum update.
    Coulomb = 1,
    /// Turbulent Voellmy friction governed the momentum update.
    Voellmy = 2,
}

impl FlowRegime {
    /// Whether the cell carried momentum out of the last step.
    #[inline]
    pub fn is_moving(self) -> bool {
        self != FlowRegime::Stopped
    }

    /// Numeric flag value (0, 1 or 2).
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_values() {
        assert_eq!(FlowRegime::Stopped.as_u8(), 0);
        assert_eq!(FlowRegime::Coulomb.as_u8(), 1);
        assert_eq!(FlowRegime::Voellmy.as_u8(), 2);
    }

    #[test]
    fn test_is_moving() {
        assert!(!FlowRegime::Stopped.is_moving());
        assert!(FlowRegime::Coulomb.is_moving());
        assert!(FlowRegime::Voellmy.is_moving());
    }

    #[test]
    fn test_default_is_stopped() {
        assert_eq!(FlowRegime::default(), FlowRegime::Stopped);
    }
}
