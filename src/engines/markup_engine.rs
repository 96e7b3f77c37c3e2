// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::place::{FetchResult, SearchConstraints, SearchQuery};
use crate::domain::models::review::{ReviewItem, ReviewPage, ReviewPageRequest};
use crate::engines::traits::{build_http_client, AcquisitionTier, TierContext, TierError};
use crate::utils::number_format::LooseNumber;
use crate::utils::state_blob::extract_state;
use async_trait::async_trait;
use serde::de::{Deserializer, Error as DeError, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use tracing::debug;

/// 默认的状态对象标记
pub const DEFAULT_STATE_MARKER: &str = "window.__APOLLO_STATE__";

const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// 页面内嵌状态提取层
///
/// 获取同一数据的 HTML 渲染结果，从中提取内嵌的 JSON 状态对象
pub struct MarkupTier {
    /// 页面基础地址
    base_url: String,
    /// 状态对象标记
    marker: String,
}

impl MarkupTier {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            marker: DEFAULT_STATE_MARKER.to_string(),
        }
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    async fn fetch_document(
        &self,
        ctx: &TierContext,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<String, TierError> {
        let client = build_http_client(ctx, DESKTOP_USER_AGENT)?;

        ctx.pace().await;
        let response = client.get(url).query(params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TierError::from_status(status));
        }
        Ok(response.text().await?)
    }

    fn parse_state(&self, document: &str) -> Result<ApolloState, TierError> {
        extract_state::<ApolloState>(document, &self.marker)
            .map_err(|e| TierError::Parse(e.to_string()))
    }
}

/// 从页面中解析地点列表（按状态对象中的出现顺序排名）
pub fn places_from_document(
    document: &str,
    marker: &str,
    query: &SearchQuery,
) -> Result<Vec<FetchResult>, TierError> {
    let state: ApolloState =
        extract_state(document, marker).map_err(|e| TierError::Parse(e.to_string()))?;
    Ok(state.places(query))
}

#[async_trait]
impl AcquisitionTier for MarkupTier {
    async fn search(
        &self,
        query: &SearchQuery,
        constraints: &SearchConstraints,
        ctx: &TierContext,
    ) -> Result<Vec<FetchResult>, TierError> {
        let url = format!("{}/search", self.base_url);
        let document = self
            .fetch_document(ctx, &url, &[("query", query.keyword.clone())])
            .await?;

        let mut results = self.parse_state(&document)?.places(query);
        debug!(count = results.len(), "markup state parsed");
        if results.is_empty() {
            return Err(TierError::Empty);
        }
        results.truncate(constraints.limit);
        Ok(results)
    }

    async fn fetch_reviews(
        &self,
        request: &ReviewPageRequest,
        ctx: &TierContext,
    ) -> Result<ReviewPage, TierError> {
        // The rendered document only embeds the first page
        if request.after.is_some() {
            return Err(TierError::Unsupported);
        }

        let url = format!("{}/place/{}/review/visitor", self.base_url, request.place_id);
        let document = self.fetch_document(ctx, &url, &[]).await?;
        let state = self.parse_state(&document)?;

        Ok(ReviewPage {
            items: state.reviews(),
            cursor: state.cursor(),
        })
    }

    fn name(&self) -> &'static str {
        "markup"
    }
}

/// 状态对象中的条目，按 `__typename` 区分
#[derive(Deserialize, Debug)]
#[serde(tag = "__typename")]
enum ApolloEntry {
    #[serde(rename = "PlaceSummary")]
    Place(MarkupPlace),
    #[serde(rename = "VisitorReview")]
    Review(MarkupReview),
    #[serde(rename = "VisitorReviewsResult")]
    ReviewsResult(MarkupReviewsResult),
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct MarkupPlace {
    id: String,
    name: String,
    category: Option<String>,
    #[serde(default)]
    visitor_review_count: Option<LooseNumber>,
    #[serde(default)]
    blog_cafe_review_count: Option<LooseNumber>,
    #[serde(default)]
    visitor_review_score: Option<LooseNumber>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct MarkupReview {
    id: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    rating: Option<LooseNumber>,
    #[serde(default)]
    created: String,
    #[serde(default)]
    author_name: Option<String>,
    #[serde(default)]
    reply_body: Option<String>,
}

#[derive(Deserialize, Debug)]
struct MarkupReviewsResult {
    cursor: Option<String>,
}

/// 保留键顺序的状态对象
#[derive(Debug, Default)]
struct ApolloState {
    entries: Vec<(String, ApolloEntry)>,
}

impl ApolloState {
    fn places(&self, query: &SearchQuery) -> Vec<FetchResult> {
        self.entries
            .iter()
            .filter_map(|(_, entry)| match entry {
                ApolloEntry::Place(place) => Some(place),
                _ => None,
            })
            .enumerate()
            .map(|(index, place)| FetchResult {
                id: place.id.clone(),
                name: place.name.clone(),
                category: place.category.clone().filter(|c| !c.is_empty()),
                rank: index as u32 + 1,
                visitor_review_count: place.visitor_review_count.as_ref().map_or(0, LooseNumber::as_count),
                blog_review_count: place.blog_cafe_review_count.as_ref().map_or(0, LooseNumber::as_count),
                rating: place.visitor_review_score.as_ref().and_then(LooseNumber::as_rating),
                is_target: query.is_target(&place.id),
            })
            .collect()
    }

    fn reviews(&self) -> Vec<ReviewItem> {
        self.entries
            .iter()
            .filter_map(|(_, entry)| match entry {
                ApolloEntry::Review(review) => Some(ReviewItem {
                    id: review.id.clone(),
                    author: review.author_name.clone(),
                    body: review.body.clone(),
                    rating: review.rating.as_ref().and_then(LooseNumber::as_rating),
                    raw_date: review.created.clone(),
                    date: None,
                    has_reply: review
                        .reply_body
                        .as_deref()
                        .is_some_and(|b| !b.trim().is_empty()),
                }),
                _ => None,
            })
            .collect()
    }

    fn cursor(&self) -> Option<String> {
        self.entries.iter().find_map(|(_, entry)| match entry {
            ApolloEntry::ReviewsResult(result) => result.cursor.clone().filter(|c| !c.is_empty()),
            _ => None,
        })
    }
}

impl<'de> Deserialize<'de> for ApolloState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct StateVisitor;

        impl<'de> Visitor<'de> for StateVisitor {
            type Value = ApolloState;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an apollo state object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::new();
                while let Some(key) = map.next_key::<String>()? {
                    // Non-object values and untyped objects are skipped
                    let value: serde_json::Value = map.next_value()?;
                    let typename = match value.get("__typename").and_then(|t| t.as_str()) {
                        Some(typename) => typename.to_string(),
                        None => continue,
                    };
                    // A typed entry that fails to decode would shift every later rank
                    let entry = ApolloEntry::deserialize(value).map_err(|e| {
                        A::Error::custom(format!("malformed {} entry {}: {}", typename, key, e))
                    })?;
                    entries.push((key, entry));
                }
                Ok(ApolloState { entries })
            }
        }

        deserializer.deserialize_map(StateVisitor)
    }
}
