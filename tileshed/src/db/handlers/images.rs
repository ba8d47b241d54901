use crate::db::{
    errors::Result,
    handlers::repository::Repository,
    models::images::{Image, ImageCreateDBRequest},
};
use crate::types::ImageId;
use chrono::NaiveDate;
use sqlx::PgConnection;

/// Filter for listing image records
#[derive(Debug, Clone)]
pub struct ImageFilter {
    pub camera_type: Option<String>,
    pub taken_on: Option<NaiveDate>,
    pub limit: i64,
    pub order_desc: bool,
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self {
            camera_type: None,
            taken_on: None,
            limit: 100,
            order_desc: true, // Newest first
        }
    }
}

impl ImageFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn camera_type(mut self, camera_type: impl Into<String>) -> Self {
        self.camera_type = Some(camera_type.into());
        self
    }

    pub fn taken_on(mut self, date: NaiveDate) -> Self {
        self.taken_on = Some(date);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn order_desc(mut self, desc: bool) -> Self {
        self.order_desc = desc;
        self
    }
}

/// Repository for image metadata records
pub struct Images<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Images<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Look up a record by its tileset display name
    pub async fn get_by_tileset_name(&mut self, tileset_name: &str) -> Result<Option<Image>> {
        let image = sqlx::query_as::<_, Image>("SELECT * FROM images WHERE tileset_name = $1")
            .bind(tileset_name)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(image)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Images<'c> {
    type CreateRequest = ImageCreateDBRequest;
    type Response = Image;
    type Id = ImageId;
    type Filter = ImageFilter;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let image = sqlx::query_as::<_, Image>(
            r#"
            INSERT INTO images (tileset_name, description, camera_type, date_taken)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&request.tileset_name)
        .bind(&request.description)
        .bind(&request.camera_type)
        .bind(request.date_taken)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(image)
    }

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let image = sqlx::query_as::<_, Image>("SELECT * FROM images WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(image)
    }

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = sqlx::QueryBuilder::new("SELECT * FROM images WHERE 1=1");

        if let Some(camera_type) = &filter.camera_type {
            query.push(" AND camera_type = ");
            query.push_bind(camera_type);
        }

        if let Some(taken_on) = filter.taken_on {
            query.push(" AND date_taken = ");
            query.push_bind(taken_on);
        }

        query.push(" ORDER BY created_at ");
        if filter.order_desc {
            query.push("DESC");
        } else {
            query.push("ASC");
        }

        query.push(" LIMIT ");
        query.push_bind(filter.limit);

        let images = query.build_query_as::<Image>().fetch_all(&mut *self.db).await?;

        Ok(images)
    }

    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM images WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::DbError;
    use sqlx::PgPool;

    fn fatma_image() -> ImageCreateDBRequest {
        ImageCreateDBRequest {
            tileset_name: "Fatma image".to_string(),
            description: Some("This is an image".to_string()),
            camera_type: Some("Canon Camera".to_string()),
            date_taken: "2016-12-02".parse().ok(),
        }
    }

    #[sqlx::test]
    async fn test_create_and_get_image(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Images::new(&mut conn);

        let created = repo.create(&fatma_image()).await.unwrap();
        assert_eq!(created.tileset_name, "Fatma image");
        assert_eq!(created.description.as_deref(), Some("This is an image"));
        assert_eq!(created.camera_type.as_deref(), Some("Canon Camera"));
        assert_eq!(created.date_taken, "2016-12-02".parse().ok());

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.tileset_name, created.tileset_name);

        let by_name = repo.get_by_tileset_name("Fatma image").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);
    }

    #[sqlx::test]
    async fn test_duplicate_tileset_name_is_a_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Images::new(&mut conn);

        repo.create(&fatma_image()).await.unwrap();
        let err = repo.create(&fatma_image()).await.unwrap_err();

        match &err {
            DbError::UniqueViolation { constraint, .. } => {
                assert_eq!(constraint.as_deref(), Some("images_tileset_name_unique"));
            }
            other => panic!("expected unique violation, got {other:?}"),
        }
        assert_eq!(err.validation_messages(), vec!["Tileset name has already been taken".to_string()]);
    }

    #[sqlx::test]
    async fn test_list_images_with_filter(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Images::new(&mut conn);

        for i in 0..3 {
            let request = ImageCreateDBRequest {
                tileset_name: format!("survey-{i}"),
                description: None,
                camera_type: Some(if i % 2 == 0 { "Canon Camera" } else { "Drone" }.to_string()),
                date_taken: "2016-12-02".parse().ok(),
            };
            repo.create(&request).await.unwrap();
        }

        let all = repo.list(&ImageFilter::new()).await.unwrap();
        assert_eq!(all.len(), 3);
        // Newest first by default
        for pair in all.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }

        let canon = repo.list(&ImageFilter::new().camera_type("Canon Camera")).await.unwrap();
        assert_eq!(canon.len(), 2);

        let on_date = repo
            .list(&ImageFilter::new().taken_on("2016-12-02".parse().unwrap()))
            .await
            .unwrap();
        assert_eq!(on_date.len(), 3);

        let limited = repo.list(&ImageFilter::new().limit(2)).await.unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[sqlx::test]
    async fn test_delete_image(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Images::new(&mut conn);

        let created = repo.create(&fatma_image()).await.unwrap();
        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
        assert!(!repo.delete(created.id).await.unwrap());
    }
}
