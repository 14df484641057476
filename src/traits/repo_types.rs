use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use super::model::TraitVector;

/// Row of `user_traits`.
#[derive(Debug, Clone, FromRow)]
pub struct TraitRow {
    pub user_id: i64,
    pub empathy: i64,
    pub responsibility: i64,
    pub courage: i64,
    pub fear: i64,
    pub selfishness: i64,
    pub dishonesty: i64,
    pub updated_at: i64, // unix micros
}

/// `user_traits` joined with the owning username.
#[derive(Debug, Clone, FromRow)]
pub struct LeaderboardRow {
    pub username: String,
    pub empathy: i64,
    pub responsibility: i64,
    pub courage: i64,
    pub fear: i64,
    pub selfishness: i64,
    pub dishonesty: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub username: String,
    #[serde(flatten)]
    pub traits: TraitVector,
    pub virtue_points: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TraitRow {
    pub fn vector(&self) -> TraitVector {
        TraitVector {
            empathy: self.empathy,
            responsibility: self.responsibility,
            courage: self.courage,
            fear: self.fear,
            selfishness: self.selfishness,
            dishonesty: self.dishonesty,
        }
    }
}

impl TryFrom<LeaderboardRow> for LeaderboardEntry {
    type Error = anyhow::Error;

    fn try_from(r: LeaderboardRow) -> Result<Self, Self::Error> {
        let traits = TraitVector {
            empathy: r.empathy,
            responsibility: r.responsibility,
            courage: r.courage,
            fear: r.fear,
            selfishness: r.selfishness,
            dishonesty: r.dishonesty,
        };
        Ok(Self {
            username: r.username,
            virtue_points: traits.virtue_points(),
            traits,
            updated_at: crate::db::from_micros(r.updated_at)?,
        })
    }
}
