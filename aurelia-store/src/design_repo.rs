use aurelia_catalog::designs::{CommentAuthor, CustomDesignRequest, DesignComment, DesignStatus};
use aurelia_shared::pii::Masked;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

type RepoError = Box<dyn std::error::Error + Send + Sync>;

pub struct DesignRepository {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct DesignRow {
    id: Uuid,
    customer_name: String,
    email: String,
    phone: Option<String>,
    description: String,
    reference_image_urls: Value,
    budget_min_paise: Option<i64>,
    budget_max_paise: Option<i64>,
    status: String,
    quoted_amount_paise: Option<i64>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl DesignRow {
    fn into_request(self) -> Result<CustomDesignRequest, RepoError> {
        let status = DesignStatus::parse(&self.status)
            .ok_or_else(|| format!("unknown design status {}", self.status))?;

        Ok(CustomDesignRequest {
            id: self.id,
            customer_name: self.customer_name,
            email: Masked(self.email),
            phone: self.phone.map(Masked),
            description: self.description,
            reference_image_urls: serde_json::from_value(self.reference_image_urls)?,
            budget_min_paise: self.budget_min_paise,
            budget_max_paise: self.budget_max_paise,
            status,
            quoted_amount_paise: self.quoted_amount_paise,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    request_id: Uuid,
    author: String,
    body: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl DesignRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_request(&self, request: &CustomDesignRequest) -> Result<Uuid, RepoError> {
        sqlx::query(
            r#"
            INSERT INTO custom_design_requests
                (id, customer_name, email, phone, description, reference_image_urls,
                 budget_min_paise, budget_max_paise, status, quoted_amount_paise, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(request.id)
        .bind(&request.customer_name)
        .bind(&request.email.0)
        .bind(request.phone.as_ref().map(|p| p.0.clone()))
        .bind(&request.description)
        .bind(serde_json::to_value(&request.reference_image_urls)?)
        .bind(request.budget_min_paise)
        .bind(request.budget_max_paise)
        .bind(request.status.as_str())
        .bind(request.quoted_amount_paise)
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(request.id)
    }

    pub async fn get_request(&self, id: Uuid) -> Result<Option<CustomDesignRequest>, RepoError> {
        let row: Option<DesignRow> = sqlx::query_as(
            "SELECT id, customer_name, email, phone, description, reference_image_urls, \
             budget_min_paise, budget_max_paise, status, quoted_amount_paise, created_at, updated_at \
             FROM custom_design_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(DesignRow::into_request).transpose()
    }

    pub async fn list_requests(
        &self,
        status: Option<DesignStatus>,
    ) -> Result<Vec<CustomDesignRequest>, RepoError> {
        let rows: Vec<DesignRow> = if let Some(status) = status {
            sqlx::query_as(
                "SELECT id, customer_name, email, phone, description, reference_image_urls, \
                 budget_min_paise, budget_max_paise, status, quoted_amount_paise, created_at, updated_at \
                 FROM custom_design_requests WHERE status = $1 ORDER BY created_at DESC",
            )
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as(
                "SELECT id, customer_name, email, phone, description, reference_image_urls, \
                 budget_min_paise, budget_max_paise, status, quoted_amount_paise, created_at, updated_at \
                 FROM custom_design_requests ORDER BY created_at DESC",
            )
            .fetch_all(&self.pool)
            .await?
        };

        rows.into_iter().map(DesignRow::into_request).collect()
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        status: DesignStatus,
        quoted_amount_paise: Option<i64>,
    ) -> Result<(), RepoError> {
        sqlx::query(
            "UPDATE custom_design_requests \
             SET status = $1, quoted_amount_paise = COALESCE($2, quoted_amount_paise), updated_at = NOW() \
             WHERE id = $3",
        )
        .bind(status.as_str())
        .bind(quoted_amount_paise)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn add_comment(&self, comment: &DesignComment) -> Result<Uuid, RepoError> {
        let author = match comment.author {
            CommentAuthor::Customer => "CUSTOMER",
            CommentAuthor::Admin => "ADMIN",
        };

        sqlx::query(
            "INSERT INTO design_comments (id, request_id, author, body, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(comment.id)
        .bind(comment.request_id)
        .bind(author)
        .bind(&comment.body)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(comment.id)
    }

    pub async fn list_comments(&self, request_id: Uuid) -> Result<Vec<DesignComment>, RepoError> {
        let rows: Vec<CommentRow> = sqlx::query_as(
            "SELECT id, request_id, author, body, created_at \
             FROM design_comments WHERE request_id = $1 ORDER BY created_at",
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let author = match row.author.as_str() {
                    "CUSTOMER" => CommentAuthor::Customer,
                    "ADMIN" => CommentAuthor::Admin,
                    other => return Err(format!("unknown comment author {}", other).into()),
                };
                Ok(DesignComment {
                    id: row.id,
                    request_id: row.request_id,
                    author,
                    body: row.body,
                    created_at: row.created_at,
                })
            })
            .collect()
    }
}
