// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::place::{FetchResult, SearchConstraints, SearchQuery};
use crate::domain::models::review::{ReviewItem, ReviewPage, ReviewPageRequest};
use crate::engines::traits::{build_http_client, AcquisitionTier, TierContext, TierError};
use crate::utils::number_format::LooseNumber;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, ORIGIN, REFERER};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// 外部服务单页大小的硬上限，超过后会静默返回空结果
pub const MAX_PAGE_SIZE: usize = 100;

const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";

const PLACES_QUERY: &str = "query getPlacesList($input: PlacesInput) { places(input: $input) { total items { id name category visitorReviewCount blogCafeReviewCount visitorReviewScore } } }";

const REVIEWS_QUERY: &str = "query getVisitorReviews($input: VisitorReviewsInput) { visitorReviews(input: $input) { cursor items { id body rating created author { nickname } reply { body } } } }";

/// 结构化 API 层
///
/// 模拟移动客户端调用外部服务的内部查询接口
pub struct StructuredApiTier {
    /// 查询接口地址
    endpoint: String,
    /// 请求来源页
    referer: String,
}

impl StructuredApiTier {
    pub fn new(endpoint: impl Into<String>, referer: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            referer: referer.into(),
        }
    }

    /// 实际使用的页大小，永远不超过硬上限
    pub fn effective_page_size(requested: usize) -> usize {
        requested.clamp(1, MAX_PAGE_SIZE)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ko-KR,ko;q=0.9"));
        if let Ok(referer) = HeaderValue::from_str(&self.referer) {
            headers.insert(REFERER, referer.clone());
            headers.insert(ORIGIN, referer);
        }
        headers.insert("x-client-platform", HeaderValue::from_static("mobile-web"));
        headers
    }

    async fn post_operation<T>(&self, ctx: &TierContext, body: Value) -> Result<T, TierError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let client = build_http_client(ctx, MOBILE_USER_AGENT)?;

        ctx.pace().await;
        let response = client
            .post(&self.endpoint)
            .headers(self.headers())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TierError::from_status(status));
        }

        let text = response.text().await?;
        let envelope: OneOrMany<GraphqlEnvelope<T>> =
            serde_json::from_str(&text).map_err(|e| TierError::Parse(e.to_string()))?;
        envelope
            .into_first()
            .and_then(|e| e.data)
            .ok_or_else(|| TierError::Parse("response has no data".to_string()))
    }
}

#[async_trait]
impl AcquisitionTier for StructuredApiTier {
    async fn search(
        &self,
        query: &SearchQuery,
        constraints: &SearchConstraints,
        ctx: &TierContext,
    ) -> Result<Vec<FetchResult>, TierError> {
        let page_size = Self::effective_page_size(constraints.page_size);
        let mut results: Vec<FetchResult> = Vec::new();

        for page in 0..constraints.max_pages.max(1) {
            let start = page as usize * page_size + 1;
            let body = json!([{
                "operationName": "getPlacesList",
                "variables": {
                    "input": {
                        "query": query.keyword,
                        "start": start,
                        "display": page_size,
                        "x": query.longitude.map(|x| x.to_string()),
                        "y": query.latitude.map(|y| y.to_string()),
                    }
                },
                "query": PLACES_QUERY,
            }]);

            let data: PlacesData = match self.post_operation(ctx, body).await {
                Ok(data) => data,
                Err(e) if page == 0 => return Err(e),
                Err(e) => {
                    // Later pages only extend what was already ranked
                    warn!(page, error = %e, kept = results.len(), "structured api page failed, keeping earlier pages");
                    break;
                }
            };
            let items = data.places.items;
            debug!(page, count = items.len(), "structured api page");

            if items.is_empty() {
                if page == 0 {
                    return Err(TierError::Empty);
                }
                break;
            }

            let short_page = items.len() < page_size;
            for item in items {
                let rank = results.len() as u32 + 1;
                results.push(item.normalize(rank, query));
            }

            if short_page || results.len() >= constraints.limit {
                break;
            }
        }

        results.truncate(constraints.limit);
        Ok(results)
    }

    async fn fetch_reviews(
        &self,
        request: &ReviewPageRequest,
        ctx: &TierContext,
    ) -> Result<ReviewPage, TierError> {
        let body = json!([{
            "operationName": "getVisitorReviews",
            "variables": {
                "input": {
                    "businessId": request.place_id,
                    "size": Self::effective_page_size(request.page_size),
                    "after": request.after,
                    "sort": "recent",
                }
            },
            "query": REVIEWS_QUERY,
        }]);

        let data: ReviewsData = self.post_operation(ctx, body).await?;
        let page = data.visitor_reviews;
        Ok(ReviewPage {
            items: page.items.into_iter().map(ApiReview::normalize).collect(),
            cursor: page.cursor.filter(|c| !c.is_empty()),
        })
    }

    fn name(&self) -> &'static str {
        "structured_api"
    }
}

/// 接口可能返回单个对象或批量数组
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_first(self) -> Option<T> {
        match self {
            OneOrMany::Many(items) => items.into_iter().next(),
            OneOrMany::One(item) => Some(item),
        }
    }
}

#[derive(Deserialize)]
struct GraphqlEnvelope<T> {
    data: Option<T>,
}

#[derive(Deserialize)]
struct PlacesData {
    places: PlacesList,
}

#[derive(Deserialize)]
struct PlacesList {
    #[serde(default)]
    items: Vec<ApiPlace>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ApiPlace {
    id: String,
    name: String,
    category: Option<String>,
    visitor_review_count: Option<LooseNumber>,
    blog_cafe_review_count: Option<LooseNumber>,
    visitor_review_score: Option<LooseNumber>,
}

impl ApiPlace {
    fn normalize(self, rank: u32, query: &SearchQuery) -> FetchResult {
        FetchResult {
            is_target: query.is_target(&self.id),
            id: self.id,
            name: self.name,
            category: self.category.filter(|c| !c.is_empty()),
            rank,
            visitor_review_count: self.visitor_review_count.map_or(0, |n| n.as_count()),
            blog_review_count: self.blog_cafe_review_count.map_or(0, |n| n.as_count()),
            rating: self.visitor_review_score.and_then(|n| n.as_rating()),
        }
    }
}

#[derive(Deserialize)]
struct ReviewsData {
    #[serde(rename = "visitorReviews")]
    visitor_reviews: ReviewList,
}

#[derive(Deserialize)]
struct ReviewList {
    #[serde(default)]
    items: Vec<ApiReview>,
    cursor: Option<String>,
}

#[derive(Deserialize)]
struct ApiAuthor {
    nickname: Option<String>,
}

#[derive(Deserialize)]
struct ApiReply {
    body: Option<String>,
}

#[derive(Deserialize)]
struct ApiReview {
    id: String,
    #[serde(default)]
    body: String,
    rating: Option<LooseNumber>,
    #[serde(default)]
    created: String,
    author: Option<ApiAuthor>,
    reply: Option<ApiReply>,
}

impl ApiReview {
    fn normalize(self) -> ReviewItem {
        ReviewItem {
            id: self.id,
            author: self.author.and_then(|a| a.nickname),
            body: self.body,
            rating: self.rating.and_then(|r| r.as_rating()),
            raw_date: self.created,
            date: None,
            has_reply: self
                .reply
                .and_then(|r| r.body)
                .is_some_and(|b| !b.trim().is_empty()),
        }
    }
}

#[cfg(test)]
#[path = "structured_api_test.rs"]
mod tests;
