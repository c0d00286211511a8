use std::collections::HashSet;
use std::time::Duration;

use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::core::ActionOutcome;
use crate::error::MatchError;
use crate::models::{
    Embedding, Match, MatchAction, MatchStatus, PairKey, Preferences, Profile, ProfileAnalysis,
};
use crate::services::storage::{ProfileFilter, Storage};

const PROFILE_COLUMNS: &str = "user_id, bio, age, gender, location, latitude, longitude, \
     preferences, analysis, embedding, photo_urls, is_complete, is_active, updated_at";

const MATCH_COLUMNS: &str = "id, initiator_id, candidate_id, score, explanation, \
     initiator_liked, candidate_liked, status, created_at, updated_at";

/// PostgreSQL-backed [`Storage`]
///
/// Pair uniqueness is a unique index on `(user_low, user_high)`; like/pass
/// transitions run under a row lock.
pub struct PostgresStore {
    pool: PgPool,
    dimensions: usize,
}

impl PostgresStore {
    /// Connect, then run pending migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
        dimensions: usize,
    ) -> Result<Self, MatchError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool, dimensions })
    }

    /// Create a store from settings, falling back to pool defaults
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
        dimensions: usize,
    ) -> Result<Self, MatchError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
            dimensions,
        )
        .await
    }

    fn profile_from_row(&self, row: &PgRow) -> Result<Profile, MatchError> {
        let embedding: Option<String> = row.try_get("embedding")?;
        let embedding = embedding
            .map(|text| Embedding::parse_wire(&text, self.dimensions))
            .transpose()
            .map_err(|e| MatchError::Storage(format!("corrupt embedding: {}", e)))?;

        let age: i16 = row.try_get("age")?;
        let preferences: Json<Preferences> = row.try_get("preferences")?;
        let analysis: Option<Json<ProfileAnalysis>> = row.try_get("analysis")?;

        Ok(Profile {
            user_id: row.try_get("user_id")?,
            bio: row.try_get("bio")?,
            age: u8::try_from(age)
                .map_err(|_| MatchError::Storage(format!("age out of range: {}", age)))?,
            gender: row.try_get("gender")?,
            location: row.try_get("location")?,
            latitude: row.try_get("latitude")?,
            longitude: row.try_get("longitude")?,
            preferences: preferences.0,
            analysis: analysis.map(|a| a.0),
            embedding,
            photo_urls: row.try_get("photo_urls")?,
            is_complete: row.try_get("is_complete")?,
            is_active: row.try_get("is_active")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

fn match_from_row(row: &PgRow) -> Result<Match, MatchError> {
    let score: i16 = row.try_get("score")?;

    Ok(Match {
        id: row.try_get("id")?,
        initiator_id: row.try_get("initiator_id")?,
        candidate_id: row.try_get("candidate_id")?,
        score: u8::try_from(score)
            .map_err(|_| MatchError::Storage(format!("score out of range: {}", score)))?,
        explanation: row.try_get("explanation")?,
        initiator_liked: row.try_get("initiator_liked")?,
        candidate_liked: row.try_get("candidate_liked")?,
        status: row.try_get("status")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait::async_trait]
impl Storage for PostgresStore {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, MatchError> {
        let query = format!("SELECT {} FROM profiles WHERE user_id = $1", PROFILE_COLUMNS);

        let row = sqlx::query(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| self.profile_from_row(&r)).transpose()
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<Profile, MatchError> {
        // is_active is left out of the update list: only set_active writes it
        let query = format!(
            r#"
            INSERT INTO profiles (user_id, bio, age, gender, location, latitude, longitude,
                                  preferences, analysis, embedding, photo_urls,
                                  is_complete, is_active, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (user_id)
            DO UPDATE SET
                bio = EXCLUDED.bio,
                age = EXCLUDED.age,
                gender = EXCLUDED.gender,
                location = EXCLUDED.location,
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                preferences = EXCLUDED.preferences,
                analysis = EXCLUDED.analysis,
                embedding = EXCLUDED.embedding,
                photo_urls = EXCLUDED.photo_urls,
                is_complete = EXCLUDED.is_complete,
                updated_at = EXCLUDED.updated_at
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(&profile.user_id)
            .bind(&profile.bio)
            .bind(i16::from(profile.age))
            .bind(&profile.gender)
            .bind(&profile.location)
            .bind(profile.latitude)
            .bind(profile.longitude)
            .bind(Json(&profile.preferences))
            .bind(profile.analysis.as_ref().map(Json))
            .bind(profile.embedding.as_ref().map(Embedding::to_wire))
            .bind(&profile.photo_urls)
            .bind(profile.is_complete)
            .bind(profile.is_active)
            .bind(profile.updated_at)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!("Upserted profile {}", profile.user_id);
        self.profile_from_row(&row)
    }

    async fn set_active(&self, user_id: &str, active: bool) -> Result<Option<Profile>, MatchError> {
        let query = format!(
            r#"
            UPDATE profiles
            SET is_active = $2,
                updated_at = CASE WHEN is_active = $2 THEN updated_at ELSE NOW() END
            WHERE user_id = $1
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(user_id)
            .bind(active)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| self.profile_from_row(&r)).transpose()
    }

    async fn query_profiles(&self, filter: &ProfileFilter) -> Result<Vec<Profile>, MatchError> {
        let query = format!(
            r#"
            SELECT {}
            FROM profiles
            WHERE ($1 = FALSE OR is_complete)
              AND ($2 = FALSE OR is_active)
              AND ($3 = FALSE OR embedding IS NOT NULL)
              AND NOT (user_id = ANY($4))
            "#,
            PROFILE_COLUMNS
        );
        let excluded: Vec<String> = filter.exclude_user_ids.iter().cloned().collect();

        let rows = sqlx::query(&query)
            .bind(filter.require_complete)
            .bind(filter.require_active)
            .bind(filter.require_embedding)
            .bind(&excluded)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(|row| self.profile_from_row(row)).collect()
    }

    async fn get_match(&self, id: Uuid) -> Result<Option<Match>, MatchError> {
        let query = format!("SELECT {} FROM matches WHERE id = $1", MATCH_COLUMNS);

        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(match_from_row).transpose()
    }

    async fn find_match_between(&self, a: &str, b: &str) -> Result<Option<Match>, MatchError> {
        let key = PairKey::new(a, b);
        let query = format!(
            "SELECT {} FROM matches WHERE user_low = $1 AND user_high = $2",
            MATCH_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(&key.low)
            .bind(&key.high)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(match_from_row).transpose()
    }

    async fn matched_user_ids(&self, user_id: &str) -> Result<HashSet<String>, MatchError> {
        let query = r#"
            SELECT CASE WHEN user_low = $1 THEN user_high ELSE user_low END AS other_id
            FROM matches
            WHERE user_low = $1 OR user_high = $1
        "#;

        let rows = sqlx::query(query).bind(user_id).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("other_id").map_err(MatchError::from))
            .collect()
    }

    async fn insert_match(&self, record: &Match) -> Result<(), MatchError> {
        let key = record.pair_key();
        let query = r#"
            INSERT INTO matches (id, initiator_id, candidate_id, user_low, user_high, score,
                                 explanation, initiator_liked, candidate_liked, status,
                                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#;

        let result = sqlx::query(query)
            .bind(record.id)
            .bind(&record.initiator_id)
            .bind(&record.candidate_id)
            .bind(&key.low)
            .bind(&key.high)
            .bind(i16::from(record.score))
            .bind(&record.explanation)
            .bind(record.initiator_liked)
            .bind(record.candidate_liked)
            .bind(record.status)
            .bind(record.created_at)
            .bind(record.updated_at)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(MatchError::DuplicatePair(
                record.initiator_id.clone(),
                record.candidate_id.clone(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn apply_action(
        &self,
        id: Uuid,
        action: MatchAction,
        user_id: &str,
    ) -> Result<ActionOutcome, MatchError> {
        let mut tx = self.pool.begin().await?;

        let query = format!("SELECT {} FROM matches WHERE id = $1 FOR UPDATE", MATCH_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(MatchError::MatchNotFound(id))?;

        let mut record = match_from_row(&row)?;
        // Dropping the transaction on a rejected transition rolls it back
        let became_mutual = record.apply(action, user_id)?;

        sqlx::query(
            r#"
            UPDATE matches
            SET initiator_liked = $2, candidate_liked = $3, status = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(record.id)
        .bind(record.initiator_liked)
        .bind(record.candidate_liked)
        .bind(record.status)
        .bind(record.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ActionOutcome {
            record,
            became_mutual,
        })
    }

    async fn list_matches(
        &self,
        user_id: &str,
        statuses: &[MatchStatus],
    ) -> Result<Vec<Match>, MatchError> {
        let query = format!(
            r#"
            SELECT {}
            FROM matches
            WHERE (initiator_id = $1 OR candidate_id = $1)
              AND status::text = ANY($2)
            "#,
            MATCH_COLUMNS
        );
        let statuses: Vec<&str> = statuses.iter().map(MatchStatus::as_str).collect();

        let rows = sqlx::query(&query)
            .bind(user_id)
            .bind(&statuses)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(match_from_row).collect()
    }

    async fn health_check(&self) -> Result<bool, MatchError> {
        let result: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await?;
        Ok(result == 1)
    }
}
