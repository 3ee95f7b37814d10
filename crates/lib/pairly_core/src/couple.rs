//! Couple (relationship) lookups consumed by session issuance.
//!
//! This subsystem reads couples, it never creates or mutates them.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

/// Active relationship summary for one user.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CoupleSummary {
    pub id: Uuid,
    pub a_id: Uuid,
    pub b_id: Uuid,
    pub anniversary: Option<NaiveDate>,
}

/// Profile fields of the other member of a couple.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PartnerProfile {
    pub id: Uuid,
    pub nickname: String,
    pub profile_url: Option<String>,
    pub birthday: Option<NaiveDate>,
}

/// Pick the other member's id out of a couple.
pub fn partner_id(couple: &CoupleSummary, user_id: Uuid) -> Uuid {
    if couple.a_id == user_id {
        couple.b_id
    } else {
        couple.a_id
    }
}

/// Find the active couple a user belongs to, if any.
pub async fn find_for(pool: &PgPool, user_id: Uuid) -> Result<Option<CoupleSummary>, sqlx::Error> {
    sqlx::query_as::<_, CoupleSummary>(
        "SELECT id, a_id, b_id, anniversary FROM couples WHERE a_id = $1 OR b_id = $1 LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Fetch the partner's profile view.
pub async fn find_partner_profile(
    pool: &PgPool,
    partner: Uuid,
) -> Result<Option<PartnerProfile>, sqlx::Error> {
    sqlx::query_as::<_, PartnerProfile>(
        "SELECT id, nickname, profile_url, birthday FROM users WHERE id = $1",
    )
    .bind(partner)
    .fetch_optional(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partner_id_picks_the_other_member() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let couple = CoupleSummary {
            id: Uuid::new_v4(),
            a_id: a,
            b_id: b,
            anniversary: None,
        };
        assert_eq!(partner_id(&couple, a), b);
        assert_eq!(partner_id(&couple, b), a);
    }
}
