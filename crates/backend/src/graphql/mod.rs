use std::sync::Arc;

use async_graphql::{Context, Json, Object, SimpleObject};
use rolemap_shared::feature::Record;

use crate::dataset::Dataset;

// Pages larger than this are clamped; the frontend pages in far
// smaller steps anyway.
const MAX_PAGE_SIZE: usize = 500;
const DEFAULT_PAGE_SIZE: usize = 100;

// GraphQL output types

#[derive(SimpleObject)]
pub struct GqlRoleColor {
    pub role: String,
    pub color: String,
}

/// One record as an opaque field map. Columns vary by dataset, so the
/// record body is passed through as JSON rather than typed per field.
#[derive(SimpleObject)]
pub struct GqlRecord {
    pub fields: Json<Record>,
}

#[derive(SimpleObject)]
pub struct GqlRecordPage {
    pub total: i32,
    pub offset: i32,
    pub records: Vec<GqlRecord>,
}

// Query root

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn records(
        &self,
        ctx: &Context<'_>,
        offset: Option<i32>,
        limit: Option<i32>,
    ) -> GqlRecordPage {
        let dataset = ctx.data::<Arc<Dataset>>().unwrap();
        let offset = offset.unwrap_or(0).max(0) as usize;
        let limit = limit
            .map(|l| l.max(0) as usize)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);

        GqlRecordPage {
            total: dataset.total() as i32,
            offset: offset as i32,
            records: dataset
                .page(offset, limit)
                .iter()
                .map(|r| GqlRecord {
                    fields: Json(r.clone()),
                })
                .collect(),
        }
    }

    async fn role_colors(&self, ctx: &Context<'_>) -> Vec<GqlRoleColor> {
        let dataset = ctx.data::<Arc<Dataset>>().unwrap();
        dataset
            .role_colors()
            .iter()
            .map(|rc| GqlRoleColor {
                role: rc.role.clone(),
                color: rc.color.clone(),
            })
            .collect()
    }

    async fn regions(&self, ctx: &Context<'_>) -> Vec<String> {
        let dataset = ctx.data::<Arc<Dataset>>().unwrap();
        dataset.regions()
    }
}

pub type Schema = async_graphql::Schema<
    QueryRoot,
    async_graphql::EmptyMutation,
    async_graphql::EmptySubscription,
>;

pub fn build_schema(dataset: Arc<Dataset>) -> Schema {
    async_graphql::Schema::build(
        QueryRoot,
        async_graphql::EmptyMutation,
        async_graphql::EmptySubscription,
    )
    .data(dataset)
    .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_schema() -> Schema {
        let dir = tempfile::tempdir().unwrap();
        let entities = json!([
            {"Entity Name": "Alpha", "Region": "North", "Latitude": "1.0", "Longitude": "2.0"},
            {"Entity Name": "Beta", "Region": "South", "Latitude": "3.0", "Longitude": "4.0"},
            {"Entity Name": "Gamma", "Region": "North", "Latitude": "5.0", "Longitude": "6.0"}
        ]);
        let colors = json!([
            {"role": "Funder", "color": "#ff0000"},
            {"role": "Research", "color": "#00ff00"}
        ]);
        std::fs::write(dir.path().join("entities.json"), entities.to_string()).unwrap();
        std::fs::write(dir.path().join("role_colors.json"), colors.to_string()).unwrap();
        let dataset = Arc::new(Dataset::load(dir.path()).unwrap());
        build_schema(dataset)
    }

    #[tokio::test]
    async fn test_records_query_pages() {
        let schema = test_schema();
        let resp = schema
            .execute("{ records(offset: 1, limit: 1) { total offset records { fields } } }")
            .await;
        assert!(resp.errors.is_empty(), "{:?}", resp.errors);

        let data = resp.data.into_json().unwrap();
        assert_eq!(data["records"]["total"], 3);
        assert_eq!(data["records"]["offset"], 1);
        let records = data["records"]["records"].as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["fields"]["Entity Name"], "Beta");
    }

    #[tokio::test]
    async fn test_records_query_past_end_is_empty() {
        let schema = test_schema();
        let resp = schema
            .execute("{ records(offset: 50, limit: 10) { total records { fields } } }")
            .await;
        assert!(resp.errors.is_empty());

        let data = resp.data.into_json().unwrap();
        assert_eq!(data["records"]["total"], 3);
        assert!(data["records"]["records"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_role_colors_query() {
        let schema = test_schema();
        let resp = schema.execute("{ roleColors { role color } }").await;
        assert!(resp.errors.is_empty());

        let data = resp.data.into_json().unwrap();
        let colors = data["roleColors"].as_array().unwrap();
        assert_eq!(colors.len(), 2);
        assert_eq!(colors[0]["role"], "Funder");
        assert_eq!(colors[0]["color"], "#ff0000");
    }

    #[tokio::test]
    async fn test_regions_query() {
        let schema = test_schema();
        let resp = schema.execute("{ regions }").await;
        assert!(resp.errors.is_empty());

        let data = resp.data.into_json().unwrap();
        assert_eq!(data["regions"], json!(["North", "South"]));
    }
}
