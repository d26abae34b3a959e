//! Microsoft identity platform + Graph API access.
//!
//! The token exchange is fatal on failure. Calendar and task fetches are
//! not: a failing source is recorded in [`DayFetch::failures`] and the run
//! continues with whatever the other sources returned.

use anyhow::{Context, Result};
use chrono::{Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;
use worklog_core::pipeline::DayInput;
use worklog_core::record::{ProviderDateTime, RawEvent, RawTask};

use crate::config::GraphConfig;

const CALENDAR_PAGE_SIZE: &str = "50";
/// Event times are requested in UTC and shifted by the schedule offset, so
/// one setting decides both the query window and the rendered times.
const CALENDAR_PREFER: &str = "outlook.timezone=\"UTC\"";
const COMPLETED_FILTER: &str = "status eq 'completed'";
/// Upper bound on `@odata.nextLink` hops for a single collection.
const MAX_PAGES: usize = 20;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Exchange the long-lived refresh token for a short-lived access token.
pub async fn acquire_token(http: &reqwest::Client, graph: &GraphConfig) -> Result<String> {
    let token_url = format!(
        "{}/{}/oauth2/v2.0/token",
        graph.authority_url.trim_end_matches('/'),
        graph.tenant_id
    );

    let refresh_token = graph.refresh_token.as_deref().unwrap_or_default();
    let mut form = vec![
        ("client_id", graph.client_id.as_str()),
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
        ("scope", graph.scopes.as_str()),
    ];
    if let Some(secret) = graph.client_secret.as_deref() {
        form.push(("client_secret", secret));
    }

    let response = http
        .post(&token_url)
        .form(&form)
        .send()
        .await
        .context("Failed to send token request")?;

    let status = response.status();
    let body: TokenResponse = response
        .json()
        .await
        .with_context(|| format!("Failed to parse token response ({status})"))?;

    match body.access_token {
        Some(token) if status.is_success() && !token.is_empty() => Ok(token),
        _ => anyhow::bail!(
            "Token Error: {} {}",
            body.error.as_deref().unwrap_or("unknown_error"),
            body.error_description.as_deref().unwrap_or_default()
        ),
    }
}

/// A task list as returned by the To Do API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
}

/// A source that could not be fetched.
#[derive(Debug, Clone)]
pub struct SourceFailure {
    pub source: String,
    pub error: String,
}

/// Records fetched for one day, plus the sources that failed.
#[derive(Debug, Default)]
pub struct DayFetch {
    pub input: DayInput,
    pub failures: Vec<SourceFailure>,
}

#[derive(Deserialize)]
struct Page {
    #[serde(default)]
    value: Vec<serde_json::Value>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

pub struct GraphClient {
    http: reqwest::Client,
    api_base: Url,
    access_token: String,
}

impl GraphClient {
    pub fn new(http: reqwest::Client, graph: &GraphConfig, access_token: String) -> Result<Self> {
        let api_base = Url::parse(&graph.api_base_url)
            .with_context(|| format!("Invalid graph.api_base_url '{}'", graph.api_base_url))?;

        Ok(GraphClient {
            http,
            api_base,
            access_token,
        })
    }

    /// Fetch everything for `date`, one source after another.
    pub async fn fetch_day(&self, date: NaiveDate, offset: FixedOffset) -> DayFetch {
        let mut fetch = DayFetch::default();

        match self.fetch_events(date, offset).await {
            Ok(events) => {
                tracing::info!(count = events.len(), "Fetched calendar events");
                fetch.input.events = events;
            }
            Err(e) => fetch.fail("calendar", e),
        }

        let lists = match self.fetch_task_lists().await {
            Ok(lists) => lists,
            Err(e) => {
                fetch.fail("task lists", e);
                Vec::new()
            }
        };

        for list in &lists {
            match self.fetch_completed_tasks(list).await {
                Ok(tasks) => {
                    tracing::info!(list = %list.id, count = tasks.len(), "Fetched completed tasks");
                    fetch.input.tasks.extend(tasks);
                }
                Err(e) => fetch.fail(&format!("task list {}", list.id), e),
            }
        }

        fetch
    }

    /// Events overlapping the local day `[date 00:00, date+1 00:00)` in
    /// `offset`, with start times as wall-clock time in `offset`.
    pub async fn fetch_events(&self, date: NaiveDate, offset: FixedOffset) -> Result<Vec<RawEvent>> {
        let (start, end) = day_window(date, offset)?;
        let url = self.endpoint(&["me", "calendarView"])?;

        let mut events: Vec<RawEvent> = self
            .get_collection(
                url,
                &[
                    ("startDateTime", start),
                    ("endDateTime", end),
                    ("$top", CALENDAR_PAGE_SIZE.to_string()),
                ],
                Some(CALENDAR_PREFER),
                "calendar",
            )
            .await?;

        for event in &mut events {
            shift_to_offset(&mut event.start, offset);
        }

        Ok(events)
    }

    pub async fn fetch_task_lists(&self) -> Result<Vec<TaskList>> {
        let url = self.endpoint(&["me", "todo", "lists"])?;
        self.get_collection(url, &[], None, "task lists").await
    }

    /// Completed tasks of one list, tagged with the list's display name.
    pub async fn fetch_completed_tasks(&self, list: &TaskList) -> Result<Vec<RawTask>> {
        let url = self.endpoint(&["me", "todo", "lists", &list.id, "tasks"])?;

        let mut tasks: Vec<RawTask> = self
            .get_collection(
                url,
                &[("$filter", COMPLETED_FILTER.to_string())],
                None,
                "tasks",
            )
            .await?;

        for task in &mut tasks {
            task.list_name = list.display_name.clone();
        }

        Ok(tasks)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("graph.api_base_url cannot be a base URL"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET a paged collection and decode each element on its own, so one
    /// odd record doesn't cost the whole source.
    async fn get_collection<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
        prefer: Option<&str>,
        source: &str,
    ) -> Result<Vec<T>> {
        let mut records = Vec::new();
        let mut next = Some(url);
        let mut first = true;

        for _ in 0..MAX_PAGES {
            let Some(url) = next.take() else { break };

            let mut request = self.http.get(url).bearer_auth(&self.access_token);
            if first {
                request = request.query(query);
                first = false;
            }
            if let Some(prefer) = prefer {
                request = request.header("Prefer", prefer);
            }

            let response = request
                .send()
                .await
                .with_context(|| format!("{source} request failed"))?;

            let status = response.status();
            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();
                anyhow::bail!("{source} API error ({status}): {error_text}");
            }

            let page: Page = response
                .json()
                .await
                .with_context(|| format!("Failed to parse {source} response"))?;

            for (index, value) in page.value.into_iter().enumerate() {
                match serde_json::from_value::<T>(value) {
                    Ok(record) => records.push(record),
                    // The decode error can quote field values, keep it out of the log
                    Err(_) => tracing::warn!(source, index, "Skipping undecodable record"),
                }
            }

            next = page
                .next_link
                .map(|link| Url::parse(&link))
                .transpose()
                .with_context(|| format!("Invalid {source} next link"))?;
        }

        if next.is_some() {
            tracing::warn!(source, pages = MAX_PAGES, "Stopped following next links");
        }

        Ok(records)
    }
}

impl DayFetch {
    fn fail(&mut self, source: &str, error: anyhow::Error) {
        tracing::warn!(source, error = %format!("{error:#}"), "Source fetch failed, continuing without it");
        self.failures.push(SourceFailure {
            source: source.to_string(),
            error: format!("{error:#}"),
        });
    }
}

/// Rewrite a UTC provider time as wall-clock time in `offset`. Values that
/// don't parse are left alone for the classifier to reject.
fn shift_to_offset(time: &mut ProviderDateTime, offset: FixedOffset) {
    if let Some(naive) = time.to_naive() {
        let local = Utc.from_utc_datetime(&naive).with_timezone(&offset);
        time.date_time = local.format("%Y-%m-%dT%H:%M:%S").to_string();
        time.time_zone = Some(offset.to_string());
    }
}

/// RFC 3339 bounds of the local day, start inclusive and end exclusive.
fn day_window(date: NaiveDate, offset: FixedOffset) -> Result<(String, String)> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .context("Invalid target date")?;
    let start = offset
        .from_local_datetime(&midnight)
        .single()
        .context("Ambiguous local midnight")?;
    let end = start + Duration::days(1);

    Ok((start.to_rfc3339(), end.to_rfc3339()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn graph_config(server: &MockServer) -> GraphConfig {
        GraphConfig {
            tenant_id: "tenant-1".to_string(),
            client_id: "app-123".to_string(),
            client_secret: Some("cs-secret".to_string()),
            refresh_token: Some("rt-secret".to_string()),
            authority_url: server.uri(),
            api_base_url: server.uri(),
            ..GraphConfig::default()
        }
    }

    fn offset() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
    }

    fn client(server: &MockServer) -> GraphClient {
        GraphClient::new(reqwest::Client::new(), &graph_config(server), "access-xyz".to_string())
            .unwrap()
    }

    #[test]
    fn test_day_window_uses_offset() {
        let (start, end) = day_window(day(), offset()).unwrap();

        assert_eq!(start, "2024-03-02T00:00:00+08:00");
        assert_eq!(end, "2024-03-03T00:00:00+08:00");
    }

    #[test]
    fn test_shift_to_offset_follows_schedule_offset() {
        let mut time = ProviderDateTime::new("2024-03-01T23:50:00.0000000");

        shift_to_offset(&mut time, FixedOffset::west_opt(5 * 3600).unwrap());

        assert_eq!(time.date_time, "2024-03-01T18:50:00");
        assert_eq!(time.time_zone.as_deref(), Some("-05:00"));

        let mut garbage = ProviderDateTime::new("garbage");
        shift_to_offset(&mut garbage, offset());
        assert_eq!(garbage.date_time, "garbage");
    }

    #[tokio::test]
    async fn test_acquire_token_posts_refresh_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=rt-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "access-xyz",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = acquire_token(&reqwest::Client::new(), &graph_config(&server))
            .await
            .unwrap();

        assert_eq!(token, "access-xyz");
    }

    #[tokio::test]
    async fn test_acquire_token_surfaces_error_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "AADSTS70000: refresh token expired"
            })))
            .mount(&server)
            .await;

        let err = acquire_token(&reqwest::Client::new(), &graph_config(&server))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("invalid_grant"));
    }

    #[tokio::test]
    async fn test_fetch_events_requests_local_window() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me/calendarView"))
            .and(query_param("startDateTime", "2024-03-02T00:00:00+08:00"))
            .and(query_param("endDateTime", "2024-03-03T00:00:00+08:00"))
            .and(header("Prefer", "outlook.timezone=\"UTC\""))
            .and(header("Authorization", "Bearer access-xyz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [
                    {
                        "subject": "Standup",
                        "isCancelled": false,
                        "sensitivity": "normal",
                        "showAs": "busy",
                        "start": { "dateTime": "2024-03-02T01:00:00.0000000", "timeZone": "UTC" }
                    },
                    {
                        "subject": "Late call",
                        "start": { "dateTime": "2024-03-02T15:30:00.0000000", "timeZone": "UTC" }
                    },
                    { "subject": "no start field" }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let events = client(&server).fetch_events(day(), offset()).await.unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].subject.as_deref(), Some("Standup"));
        assert_eq!(events[0].start.date_time, "2024-03-02T09:00:00");
        assert_eq!(events[0].start.time_zone.as_deref(), Some("+08:00"));
        assert_eq!(events[1].start.date_time, "2024-03-02T23:30:00");
    }

    #[tokio::test]
    async fn test_fetch_day_degrades_per_source() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me/calendarView"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/me/todo/lists"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [
                    { "id": "broken", "displayName": "Broken" },
                    { "id": "work", "displayName": "Work" }
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/me/todo/lists/broken/tasks"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/me/todo/lists/work/tasks"))
            .and(query_param("$filter", "status eq 'completed'"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [
                    { "title": "Ship it", "completedDateTime": { "dateTime": "2024-03-02T01:00:00.0000000", "timeZone": "UTC" } }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let fetch = client(&server).fetch_day(day(), offset()).await;

        assert!(fetch.input.events.is_empty());
        assert_eq!(fetch.input.tasks.len(), 1);
        assert_eq!(fetch.input.tasks[0].list_name, "Work");
        let failed: Vec<&str> = fetch.failures.iter().map(|f| f.source.as_str()).collect();
        assert_eq!(failed, vec!["calendar", "task list broken"]);
    }

    #[tokio::test]
    async fn test_collection_follows_next_link() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me/todo/lists"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{ "id": "a", "displayName": "A" }],
                "@odata.nextLink": format!("{}/page2", server.uri())
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/page2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{ "id": "b", "displayName": "B" }]
            })))
            .mount(&server)
            .await;

        let lists = client(&server).fetch_task_lists().await.unwrap();

        assert_eq!(lists.iter().map(|l| l.id.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
