use aurelia_content::testimonials::{Testimonial, TestimonialSource};
use sqlx::PgPool;
use uuid::Uuid;

type RepoError = Box<dyn std::error::Error + Send + Sync>;

pub struct TestimonialRepository {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct TestimonialRow {
    id: Uuid,
    author_name: String,
    body: String,
    rating: i16,
    source: String,
    is_approved: bool,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TestimonialRow {
    fn into_testimonial(self) -> Result<Testimonial, RepoError> {
        let source = TestimonialSource::parse(&self.source)
            .ok_or_else(|| format!("unknown testimonial source {}", self.source))?;

        Ok(Testimonial {
            id: self.id,
            author_name: self.author_name,
            body: self.body,
            rating: self.rating,
            source,
            is_approved: self.is_approved,
            created_at: self.created_at,
        })
    }
}

impl TestimonialRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, testimonial: &Testimonial) -> Result<Uuid, RepoError> {
        sqlx::query(
            "INSERT INTO testimonials (id, author_name, body, rating, source, is_approved, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(testimonial.id)
        .bind(&testimonial.author_name)
        .bind(&testimonial.body)
        .bind(testimonial.rating)
        .bind(testimonial.source.as_str())
        .bind(testimonial.is_approved)
        .bind(testimonial.created_at)
        .execute(&self.pool)
        .await?;

        Ok(testimonial.id)
    }

    /// Public storefront listing: approved only, newest first.
    pub async fn list_approved(&self) -> Result<Vec<Testimonial>, RepoError> {
        let rows: Vec<TestimonialRow> = sqlx::query_as(
            "SELECT id, author_name, body, rating, source, is_approved, created_at \
             FROM testimonials WHERE is_approved ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TestimonialRow::into_testimonial).collect()
    }

    pub async fn list_all(&self) -> Result<Vec<Testimonial>, RepoError> {
        let rows: Vec<TestimonialRow> = sqlx::query_as(
            "SELECT id, author_name, body, rating, source, is_approved, created_at \
             FROM testimonials ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TestimonialRow::into_testimonial).collect()
    }

    pub async fn set_approval(&self, id: Uuid, approved: bool) -> Result<(), RepoError> {
        sqlx::query("UPDATE testimonials SET is_approved = $1 WHERE id = $2")
            .bind(approved)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM testimonials WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
