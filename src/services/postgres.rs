use crate::config::DatabaseSettings;
use crate::core::filters::{
    MealFilter, HIGH_CARB_MIN_G, HIGH_COST_MIN, HIGH_PROTEIN_MIN_G, LOW_CARB_MAX_G, LOW_COST_MAX,
    LOW_PROTEIN_MAX_G,
};
use crate::models::{parse_tags, Meal, PerMealTarget, User, UserProfile};
use crate::services::repository::{MealRepository, RepositoryError};
use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::time::Duration;

const MEAL_COLUMNS: &str = "meal_id, name, location, price, calories, protein, carbs, fat, tags";
const USER_COLUMNS: &str =
    "user_id, name, height_cm, weight_kg, age, gender, activity_level, goal";

/// PostgreSQL client for users and the meal catalogue
///
/// Serves the meal repository read shapes and the user records the
/// recommendation endpoint looks up.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
        run_migrations: bool,
    ) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        if run_migrations {
            sqlx::migrate!("./migrations").run(&pool).await?;
        }

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(settings: &DatabaseSettings) -> Result<Self, RepositoryError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            &settings.url,
            settings.max_connections,
            settings.min_connections,
            Duration::from_secs(settings.acquire_timeout_secs),
            Duration::from_secs(settings.idle_timeout_secs),
            settings.run_migrations,
        )
        .await
    }

    /// Insert a user and return the stored row
    pub async fn create_user(
        &self,
        name: &str,
        profile: &UserProfile,
    ) -> Result<User, RepositoryError> {
        let query = format!(
            r#"
            INSERT INTO users (name, height_cm, weight_kg, age, gender, activity_level, goal)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(name)
            .bind(profile.height_cm)
            .bind(profile.weight_kg)
            .bind(profile.age)
            .bind(profile.gender.as_str())
            .bind(profile.activity_level.as_str())
            .bind(profile.goal.as_str())
            .fetch_one(&self.pool)
            .await?;

        let user = user_from_row(&row)?;
        tracing::info!("Created user {} ({})", user.user_id, user.name);

        Ok(user)
    }

    /// Look up a user by id
    pub async fn get_user(&self, user_id: i32) -> Result<Option<User>, RepositoryError> {
        let query = format!("SELECT {} FROM users WHERE user_id = $1", USER_COLUMNS);

        let row = sqlx::query(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Current database server time, used by the connectivity check
    pub async fn server_time(&self) -> Result<chrono::DateTime<chrono::Utc>, RepositoryError> {
        let row = sqlx::query("SELECT NOW() AS now")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get("now")?)
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, RepositoryError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[async_trait]
impl MealRepository for PostgresClient {
    async fn nearest_meals(
        &self,
        target: &PerMealTarget,
        filters: &[MealFilter],
        limit: usize,
    ) -> Result<Vec<Meal>, RepositoryError> {
        let mut builder = nearest_meals_query(target, filters, limit);

        tracing::debug!("Nearest meals query: {}", builder.sql());

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(meal_from_row).collect()
    }

    async fn sample_meals(&self, n: usize) -> Result<Vec<Meal>, RepositoryError> {
        let query = format!("SELECT {} FROM meals ORDER BY RANDOM() LIMIT $1", MEAL_COLUMNS);

        let rows = sqlx::query(&query)
            .bind(n as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(meal_from_row).collect()
    }

    async fn meals_by_calorie_distance(
        &self,
        target_calories: f64,
        limit: usize,
    ) -> Result<Vec<Meal>, RepositoryError> {
        let query = format!(
            "SELECT {} FROM meals ORDER BY ABS(calories - $1) ASC, meal_id ASC LIMIT $2",
            MEAL_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(target_calories)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(meal_from_row).collect()
    }
}

/// Build the filtered squared-distance query
fn nearest_meals_query<'a>(
    target: &PerMealTarget,
    filters: &[MealFilter],
    limit: usize,
) -> QueryBuilder<'a, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {}, (POWER(calories - ", MEAL_COLUMNS));
    builder
        .push_bind(target.calories)
        .push(", 2) + POWER(carbs - ")
        .push_bind(target.carbs_g)
        .push(", 2) + POWER(protein - ")
        .push_bind(target.protein_g)
        .push(", 2) + POWER(fat - ")
        .push_bind(target.fat_g)
        .push(", 2)) AS distance FROM meals");

    for (i, filter) in filters.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        push_filter(&mut builder, *filter);
    }

    builder
        .push(" ORDER BY distance ASC, meal_id ASC LIMIT ")
        .push_bind(limit as i64);

    builder
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: MealFilter) {
    match filter {
        MealFilter::HighProtein => builder.push("protein >= ").push_bind(HIGH_PROTEIN_MIN_G),
        MealFilter::LowProtein => builder.push("protein <= ").push_bind(LOW_PROTEIN_MAX_G),
        MealFilter::LowCarb => builder.push("carbs <= ").push_bind(LOW_CARB_MAX_G),
        MealFilter::HighCarb => builder.push("carbs >= ").push_bind(HIGH_CARB_MIN_G),
        MealFilter::LowCost => builder.push("price <= ").push_bind(LOW_COST_MAX),
        MealFilter::HighCost => builder.push("price >= ").push_bind(HIGH_COST_MIN),
        MealFilter::Vegetarian | MealFilter::Vegan => {
            let tag = filter.tag().unwrap_or_default();
            builder.push("tags ILIKE ").push_bind(format!("%{}%", tag))
        }
    };
}

fn meal_from_row(row: &PgRow) -> Result<Meal, RepositoryError> {
    let tags: Option<String> = row.try_get("tags")?;

    Ok(Meal {
        meal_id: row.try_get("meal_id")?,
        name: row.try_get("name")?,
        location: row.try_get("location")?,
        price: row.try_get("price")?,
        calories: row.try_get("calories")?,
        protein_g: row.try_get("protein")?,
        carbs_g: row.try_get("carbs")?,
        fat_g: row.try_get("fat")?,
        tags: tags.as_deref().map(parse_tags).unwrap_or_default(),
    })
}

fn user_from_row(row: &PgRow) -> Result<User, RepositoryError> {
    Ok(User {
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        height_cm: row.try_get("height_cm")?,
        weight_kg: row.try_get("weight_kg")?,
        age: row.try_get("age")?,
        gender: row.try_get("gender")?,
        activity_level: row.try_get("activity_level")?,
        goal: row.try_get("goal")?,
    })
}
