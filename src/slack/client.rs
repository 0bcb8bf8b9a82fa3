use crate::config::{ApiConfig, SlackConfig};
use crate::error::{Result, SlackMigrateError};
use crate::logging::Timer;
use crate::models::{ChannelId, ChannelRecord, EmojiRecord, UserRecord};
use crate::slack::api::SlackApi;
use crate::slack::api_types::{
    ApiChannel, ApiUser, ConversationsInfoResponse, ConversationsListResponse, EmojiListResponse,
    Paginated, UsersListResponse,
};
use crate::slack::types::{Actor, ChannelInfo};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::header::RETRY_AFTER;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use std::time::Duration;

/// Slack `error` codes that mean the token itself is unusable
const AUTH_ERRORS: &[&str] = &[
    "not_authed",
    "invalid_auth",
    "account_inactive",
    "token_revoked",
    "token_expired",
];

/// Used when a 429 response carries no usable `Retry-After`
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// Slack Web API client.
///
/// Reads use the bot token; renames use the user (admin) token when one is
/// configured. HTTP 429 responses are retried up to `max_retries` times,
/// sleeping for the server's `Retry-After`.
pub struct SlackApiClient {
    http: reqwest::Client,
    base_url: String,
    bot_token: String,
    user_token: Option<String>,
    page_size: u16,
    max_retries: u32,
}

impl SlackApiClient {
    pub fn new(slack: &SlackConfig, api: &ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(api.timeout)
            .user_agent(concat!("slack-migrate/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            bot_token: slack.bot_token.clone(),
            user_token: slack.user_token.clone(),
            page_size: api.page_size,
            max_retries: api.max_retries,
        })
    }

    fn token(&self, actor: Actor) -> &str {
        match actor {
            Actor::Bot => &self.bot_token,
            Actor::Admin => self.user_token.as_deref().unwrap_or(&self.bot_token),
        }
    }

    /// Public channels, one page per stream item, fetched as the stream is polled
    pub fn channel_pages(&self) -> BoxStream<'_, Result<Vec<ChannelRecord>>> {
        self.paginate::<ConversationsListResponse>(
            "conversations.list",
            vec![
                ("types", "public_channel".to_string()),
                ("exclude_archived", "false".to_string()),
            ],
        )
        .map_ok(|page| page.into_iter().map(ApiChannel::into_record).collect::<Vec<_>>())
        .boxed()
    }

    /// Workspace members, one page per stream item
    pub fn user_pages(&self) -> BoxStream<'_, Result<Vec<UserRecord>>> {
        self.paginate::<UsersListResponse>("users.list", Vec::new())
            .map_ok(|page| page.into_iter().map(ApiUser::into_record).collect::<Vec<_>>())
            .boxed()
    }

    /// Follow `response_metadata.next_cursor` until Slack returns an empty one
    fn paginate<R>(
        &self,
        method: &'static str,
        params: Vec<(&'static str, String)>,
    ) -> BoxStream<'_, Result<Vec<R::Item>>>
    where
        R: Paginated + DeserializeOwned + Send + 'static,
        R::Item: Send + 'static,
    {
        // Outer None: done; inner None: first page
        stream::try_unfold(Some(None::<String>), move |state| {
            let mut query = params.clone();
            async move {
                let Some(cursor) = state else {
                    return Ok(None);
                };

                query.push(("limit", self.page_size.to_string()));
                if let Some(cursor) = cursor {
                    query.push(("cursor", cursor));
                }

                let page: R = self.get(method, &query, Actor::Bot).await?;
                let (items, next_cursor) = page.into_page();
                tracing::debug!(
                    method = %method,
                    items = items.len(),
                    has_more = next_cursor.is_some(),
                    "Fetched page"
                );

                Ok(Some((items, next_cursor.map(Some))))
            }
        })
        .boxed()
    }

    async fn get<R>(&self, method: &str, query: &[(&str, String)], actor: Actor) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);
        let token = self.token(actor);
        self.send(method, || self.http.get(&url).bearer_auth(token).query(query))
            .await
    }

    async fn post<R>(&self, method: &str, form: &[(&str, &str)], actor: Actor) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);
        let token = self.token(actor);
        self.send(method, || self.http.post(&url).bearer_auth(token).form(form))
            .await
    }

    /// Issue a request, retrying on HTTP 429, and unwrap Slack's `ok`/`error`
    /// envelope.
    async fn send<R, F>(&self, method: &str, build: F) -> Result<R>
    where
        R: DeserializeOwned,
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let mut attempt: u32 = 0;

        loop {
            let response = build().send().await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = retry_after_secs(&response);
                if attempt >= self.max_retries {
                    return Err(SlackMigrateError::RateLimited {
                        method: method.to_string(),
                        retry_after_secs,
                    });
                }

                attempt += 1;
                tracing::warn!(
                    method = %method,
                    attempt = attempt,
                    retry_after_secs = retry_after_secs,
                    "Rate limited by Slack, backing off"
                );
                tokio::time::sleep(Duration::from_secs(retry_after_secs)).await;
                continue;
            }

            if status == StatusCode::UNAUTHORIZED {
                return Err(SlackMigrateError::Auth(format!("{method}: HTTP {status}")));
            }
            if !status.is_success() {
                return Err(SlackMigrateError::api(method, format!("HTTP {status}")));
            }

            let body: serde_json::Value = response.json().await?;
            check_envelope(method, &body)?;
            return Ok(serde_json::from_value(body)?);
        }
    }
}

fn retry_after_secs(response: &Response) -> u64 {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

/// Map `{"ok": false, "error": ...}` onto the error taxonomy
fn check_envelope(method: &str, body: &serde_json::Value) -> Result<()> {
    if body.get("ok").and_then(|ok| ok.as_bool()).unwrap_or(false) {
        return Ok(());
    }

    let code = body
        .get("error")
        .and_then(|e| e.as_str())
        .unwrap_or("unknown_error");

    if AUTH_ERRORS.contains(&code) {
        return Err(SlackMigrateError::Auth(code.to_string()));
    }
    if code == "ratelimited" {
        return Err(SlackMigrateError::RateLimited {
            method: method.to_string(),
            retry_after_secs: DEFAULT_RETRY_AFTER_SECS,
        });
    }
    Err(SlackMigrateError::api(method, code))
}

#[async_trait]
impl SlackApi for SlackApiClient {
    async fn list_channels(&self) -> Result<Vec<ChannelRecord>> {
        let _timer = Timer::new("conversations.list");
        let channels: Vec<ChannelRecord> = self.channel_pages().try_concat().await?;
        tracing::info!(count = channels.len(), "Fetched channels from Slack");
        Ok(channels)
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>> {
        let _timer = Timer::new("users.list");
        let users: Vec<UserRecord> = self.user_pages().try_concat().await?;
        tracing::info!(count = users.len(), "Fetched users from Slack");
        Ok(users)
    }

    async fn list_emoji(&self) -> Result<Vec<EmojiRecord>> {
        let _timer = Timer::new("emoji.list");
        let response: EmojiListResponse = self.get("emoji.list", &[], Actor::Bot).await?;
        let emoji: Vec<EmojiRecord> = response
            .emoji
            .iter()
            .map(|(name, value)| EmojiRecord::from_listing(name.as_str(), value))
            .collect();
        tracing::info!(count = emoji.len(), "Fetched emoji from Slack");
        Ok(emoji)
    }

    async fn channel_info(&self, channel: &ChannelId, actor: Actor) -> Result<ChannelInfo> {
        let response: ConversationsInfoResponse = self
            .get(
                "conversations.info",
                &[("channel", channel.as_str().to_string())],
                actor,
            )
            .await?;
        Ok(response.channel.into_info())
    }

    async fn join_channel(&self, channel: &ChannelId, actor: Actor) -> Result<()> {
        tracing::debug!(channel_id = %channel, actor = ?actor, "Joining channel");
        let _: IgnoredAny = self
            .post("conversations.join", &[("channel", channel.as_str())], actor)
            .await?;
        Ok(())
    }

    async fn archive_channel(&self, channel: &ChannelId) -> Result<()> {
        let _: IgnoredAny = self
            .post(
                "conversations.archive",
                &[("channel", channel.as_str())],
                Actor::Bot,
            )
            .await?;
        Ok(())
    }

    async fn rename_channel(&self, channel: &ChannelId, new_name: &str) -> Result<()> {
        let _: IgnoredAny = self
            .post(
                "conversations.rename",
                &[("channel", channel.as_str()), ("name", new_name)],
                Actor::Admin,
            )
            .await?;
        Ok(())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}
