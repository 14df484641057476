use serde::{Deserialize, Serialize};

/// The six behavioural dimensions a player accumulates. Values are unbounded
/// and may go negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitVector {
    pub empathy: i64,
    pub responsibility: i64,
    pub courage: i64,
    pub fear: i64,
    pub selfishness: i64,
    pub dishonesty: i64,
}

/// A partial vector: the effect of one gameplay decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitDelta {
    #[serde(default)]
    pub empathy: Option<i64>,
    #[serde(default)]
    pub responsibility: Option<i64>,
    #[serde(default)]
    pub courage: Option<i64>,
    #[serde(default)]
    pub fear: Option<i64>,
    #[serde(default)]
    pub selfishness: Option<i64>,
    #[serde(default)]
    pub dishonesty: Option<i64>,
}

impl TraitVector {
    pub const ZERO: TraitVector = TraitVector {
        empathy: 0,
        responsibility: 0,
        courage: 0,
        fear: 0,
        selfishness: 0,
        dishonesty: 0,
    };

    /// Adds every field present in `delta`; absent fields are left alone.
    pub fn apply(&mut self, delta: &TraitDelta) {
        fn add(slot: &mut i64, d: Option<i64>) {
            if let Some(d) = d {
                *slot = slot.saturating_add(d);
            }
        }
        add(&mut self.empathy, delta.empathy);
        add(&mut self.responsibility, delta.responsibility);
        add(&mut self.courage, delta.courage);
        add(&mut self.fear, delta.fear);
        add(&mut self.selfishness, delta.selfishness);
        add(&mut self.dishonesty, delta.dishonesty);
    }

    /// Virtue points shown to the player.
    ///
    /// Helpful traits earn 5 each, fear costs 3, selfishness and dishonesty
    /// cost 5. Pure and saturating, so recomputing after a reload always
    /// yields the same number.
    pub fn virtue_points(&self) -> i64 {
        let good = self
            .empathy
            .saturating_add(self.responsibility)
            .saturating_add(self.courage);
        let bad = self.selfishness.saturating_add(self.dishonesty);
        good.saturating_mul(5)
            .saturating_sub(self.fear.saturating_mul(3))
            .saturating_sub(bad.saturating_mul(5))
    }
}

impl From<TraitDelta> for TraitVector {
    /// Unspecified fields default to 0.
    fn from(d: TraitDelta) -> Self {
        let mut v = TraitVector::ZERO;
        v.apply(&d);
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_only_touches_supplied_fields() {
        let mut v = TraitVector {
            empathy: 4,
            fear: 1,
            ..TraitVector::ZERO
        };
        v.apply(&TraitDelta {
            empathy: Some(-2),
            selfishness: Some(2),
            ..Default::default()
        });
        assert_eq!(v.empathy, 2);
        assert_eq!(v.selfishness, 2);
        assert_eq!(v.fear, 1);
        assert_eq!(v.courage, 0);
    }

    #[test]
    fn virtue_points_weights() {
        let v = TraitVector {
            empathy: 3,
            responsibility: 2,
            courage: 1,
            fear: 2,
            selfishness: 1,
            dishonesty: 1,
        };
        assert_eq!(v.virtue_points(), 30 - 6 - 10);
        assert_eq!(TraitVector::ZERO.virtue_points(), 0);
    }

    #[test]
    fn virtue_points_saturates() {
        let v = TraitVector {
            empathy: i64::MAX,
            courage: i64::MAX,
            ..TraitVector::ZERO
        };
        assert_eq!(v.virtue_points(), i64::MAX);
    }

    #[test]
    fn partial_json_defaults_to_zero() {
        let d: TraitDelta = serde_json::from_str(r#"{"courage":3}"#).unwrap();
        let v = TraitVector::from(d);
        assert_eq!(
            v,
            TraitVector {
                courage: 3,
                ..TraitVector::ZERO
            }
        );
    }
}
