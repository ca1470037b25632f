use rolemap_shared::feature::Record;
use serde::{Deserialize, Serialize};

/// Number of records requested per page while loading the map.
pub const PAGE_SIZE: usize = 100;

/// Build the variables JSON for a records page query.
pub fn build_records_variables(offset: usize, limit: usize) -> serde_json::Value {
    serde_json::json!({ "offset": offset as i64, "limit": limit as i64 })
}

/// Build a shareable region URL from origin and region name.
pub fn build_region_url(origin: &str, region: &str) -> String {
    format!("{}/region/{}", origin, urlencoding_encode(region))
}

/// Percent-encode a path segment. Only the characters that actually
/// occur in region names (spaces, slashes) need escaping.
fn urlencoding_encode(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for b in segment.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphQLRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLError {
    pub message: String,
}

fn api_url() -> String {
    // In production, same origin. In dev, might be different.
    let window = web_sys::window().unwrap();
    let origin = window.location().origin().unwrap();
    format!("{}/graphql", origin)
}

async fn query<T: for<'de> Deserialize<'de>>(
    query_str: &str,
    variables: Option<serde_json::Value>,
) -> Result<T, String> {
    let req = GraphQLRequest {
        query: query_str.to_string(),
        variables,
    };

    let resp = reqwest::Client::new()
        .post(api_url())
        .json(&req)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let gql_resp: GraphQLResponse<T> = resp.json().await.map_err(|e| e.to_string())?;

    if let Some(errors) = gql_resp.errors {
        if !errors.is_empty() {
            return Err(errors[0].message.clone());
        }
    }

    gql_resp.data.ok_or_else(|| "No data returned".to_string())
}

// Types mirroring the GraphQL schema

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecordData {
    pub fields: Record,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecordPageData {
    pub total: i32,
    pub offset: i32,
    pub records: Vec<RecordData>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RoleColorData {
    pub role: String,
    pub color: String,
}

// API functions

#[derive(Deserialize)]
pub struct RecordsResponse {
    pub records: RecordPageData,
}

pub async fn fetch_record_page(offset: usize, limit: usize) -> Result<RecordPageData, String> {
    let variables = build_records_variables(offset, limit);
    let resp: RecordsResponse = query(
        r#"query Records($offset: Int!, $limit: Int!) {
            records(offset: $offset, limit: $limit) { total offset records { fields } }
        }"#,
        Some(variables),
    )
    .await?;
    Ok(resp.records)
}

#[derive(Deserialize)]
pub struct RoleColorsResponse {
    #[serde(rename = "roleColors")]
    pub role_colors: Vec<RoleColorData>,
}

pub async fn fetch_role_colors() -> Result<Vec<RoleColorData>, String> {
    let resp: RoleColorsResponse = query(r#"query { roleColors { role color } }"#, None).await?;
    Ok(resp.role_colors)
}

#[derive(Deserialize)]
pub struct RegionsResponse {
    pub regions: Vec<String>,
}

pub async fn fetch_regions() -> Result<Vec<String>, String> {
    let resp: RegionsResponse = query(r#"query { regions }"#, None).await?;
    Ok(resp.regions)
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- GraphQL request serialization ---

    #[test]
    fn test_graphql_request_serializes_with_variables() {
        let req = GraphQLRequest {
            query: "query { regions }".to_string(),
            variables: Some(serde_json::json!({"offset": 0})),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["query"], "query { regions }");
        assert_eq!(json["variables"]["offset"], 0);
    }

    #[test]
    fn test_graphql_request_omits_null_variables() {
        let req = GraphQLRequest {
            query: "query { regions }".to_string(),
            variables: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("variables").is_none());
    }

    // --- Response deserialization ---

    #[test]
    fn test_record_page_deserializes() {
        let json = r#"{"records":{"total":120,"offset":100,"records":[{"fields":{"Entity Name":"Alpha","Latitude":"37.76","Longitude":"-122.39"}}]}}"#;
        let resp: RecordsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.records.total, 120);
        assert_eq!(resp.records.offset, 100);
        assert_eq!(resp.records.records.len(), 1);
        assert_eq!(resp.records.records[0].fields["Entity Name"], "Alpha");
    }

    #[test]
    fn test_record_page_deserializes_empty() {
        let json = r#"{"records":{"total":0,"offset":0,"records":[]}}"#;
        let resp: RecordsResponse = serde_json::from_str(json).unwrap();
        assert!(resp.records.records.is_empty());
    }

    #[test]
    fn test_role_colors_deserialize() {
        let json = r##"{"roleColors":[{"role":"Funder","color":"#ff0000"},{"role":"Research","color":"#00ff00"}]}"##;
        let resp: RoleColorsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.role_colors.len(), 2);
        assert_eq!(resp.role_colors[0].role, "Funder");
        assert_eq!(resp.role_colors[1].color, "#00ff00");
    }

    #[test]
    fn test_regions_deserialize() {
        let json = r#"{"regions":["East Bay","North Bay"]}"#;
        let resp: RegionsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.regions, vec!["East Bay", "North Bay"]);
    }

    #[test]
    fn test_graphql_error_response() {
        let json = r#"{"data":null,"errors":[{"message":"Unknown field"}]}"#;
        let resp: GraphQLResponse<RegionsResponse> = serde_json::from_str(json).unwrap();
        assert!(resp.data.is_none());
        assert_eq!(resp.errors.unwrap()[0].message, "Unknown field");
    }

    // --- Variable builders ---

    #[test]
    fn test_build_records_variables() {
        let vars = build_records_variables(200, 100);
        assert_eq!(vars["offset"], 200);
        assert_eq!(vars["limit"], 100);
    }

    // --- URL builder ---

    #[test]
    fn test_build_region_url() {
        assert_eq!(
            build_region_url("http://localhost:8080", "North Bay"),
            "http://localhost:8080/region/North%20Bay"
        );
    }

    #[test]
    fn test_build_region_url_plain_name() {
        assert_eq!(
            build_region_url("https://map.example.com", "Peninsula"),
            "https://map.example.com/region/Peninsula"
        );
    }
}
