//! HTTP client for the host platform's REST API, implementing both
//! collaborator traits. The base URL is overridable so tests can point
//! it at a local mock server.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::anchor::{Anchor, Embed, EmbedField};
use crate::platform::schedule::{ScheduleError, ScheduledActivity, SchedulingFacility};
use crate::platform::store::{MessageStore, StoreError};

const DEFAULT_BASE_URL: &str = "https://discord.com/api/v10";

// Guild scheduled-event constants: voice-channel entity, guild-only
// privacy (the only privacy level the platform accepts).
const ENTITY_TYPE_VOICE: u8 = 2;
const PRIVACY_GUILD_ONLY: u8 = 2;

#[derive(Debug, Default, Serialize, Deserialize)]
struct AuthorDto {
    #[serde(default)]
    bot: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct MessageDto {
    id: String,
    #[serde(default)]
    author: AuthorDto,
    #[serde(default)]
    embeds: Vec<EmbedDto>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EmbedDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<u32>,
    #[serde(default)]
    fields: Vec<FieldDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<FooterDto>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FieldDto {
    name: String,
    value: String,
    #[serde(default)]
    inline: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct FooterDto {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ChannelDto {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ThreadCreatedDto {
    id: String,
    #[serde(default)]
    name: String,
    message: Option<MessageDto>,
}

#[derive(Debug, Serialize)]
struct ThreadCreateBody<'a> {
    name: &'a str,
    message: MessagePayload,
}

#[derive(Debug, Serialize)]
struct MessagePayload {
    content: String,
    embeds: Vec<EmbedDto>,
}

#[derive(Debug, Serialize)]
struct MessageEditBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    embeds: Vec<EmbedDto>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ScheduledEventDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    scheduled_start_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scheduled_end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entity_type: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    privacy_level: Option<u8>,
}

fn embed_to_dto(embed: &Embed) -> EmbedDto {
    EmbedDto {
        title: Some(embed.title.clone()),
        description: Some(embed.description.clone()),
        color: Some(embed.color),
        fields: embed
            .fields
            .iter()
            .map(|field| FieldDto {
                name: field.name.clone(),
                value: field.value.clone(),
                inline: field.inline,
            })
            .collect(),
        footer: embed.footer.clone().map(|text| FooterDto { text }),
    }
}

fn embed_from_dto(dto: EmbedDto) -> Embed {
    Embed {
        title: dto.title.unwrap_or_default(),
        description: dto.description.unwrap_or_default(),
        color: dto.color.unwrap_or_default(),
        fields: dto
            .fields
            .into_iter()
            .map(|field| EmbedField {
                name: field.name,
                value: field.value,
                inline: field.inline,
            })
            .collect(),
        footer: dto.footer.map(|footer| footer.text),
    }
}

fn anchor_from_message(message: MessageDto, thread_id: &str, thread_name: String) -> Anchor {
    Anchor {
        message_id: message.id,
        thread_id: thread_id.to_string(),
        thread_name,
        system_authored: message.author.bot,
        embed: message
            .embeds
            .into_iter()
            .next()
            .map(embed_from_dto)
            .unwrap_or_default(),
    }
}

fn activity_from_dto(dto: ScheduledEventDto) -> Result<ScheduledActivity, ScheduleError> {
    let id = dto
        .id
        .ok_or_else(|| ScheduleError::ParseError("Missing scheduled event id".to_string()))?;
    let start = DateTime::parse_from_rfc3339(&dto.scheduled_start_time)
        .map_err(|e| ScheduleError::ParseError(format!("Invalid start time: {e}")))?
        .with_timezone(&Utc);
    let end = match dto.scheduled_end_time {
        Some(end) => DateTime::parse_from_rfc3339(&end)
            .map_err(|e| ScheduleError::ParseError(format!("Invalid end time: {e}")))?
            .with_timezone(&Utc),
        None => start,
    };
    Ok(ScheduledActivity {
        id,
        name: dto.name,
        start,
        end,
        location_id: dto.channel_id.unwrap_or_default(),
    })
}

#[derive(Clone)]
pub struct RestClient {
    base_url: String,
    token: String,
    guild_id: String,
    client: reqwest::Client,
}

impl RestClient {
    pub fn new(token: String, guild_id: String) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token,
            guild_id,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// Pushes the slash-command schema for this guild. Run once at
    /// deploy time; existing registrations are replaced wholesale.
    pub async fn register_commands(
        &self,
        application_id: &str,
        commands: &serde_json::Value,
    ) -> Result<(), StoreError> {
        let url = format!(
            "{}/applications/{}/guilds/{}/commands",
            self.base_url, application_id, self.guild_id
        );

        tracing::info!("Registering command schema for guild {}", self.guild_id);

        let response = self
            .client
            .put(&url)
            .header("Authorization", self.auth_header())
            .json(commands)
            .send()
            .await?;

        let status = response.status();
        if status == 401 || status == 403 {
            tracing::error!("Authentication failed when registering commands");
            return Err(StoreError::AuthenticationFailed);
        }
        if !status.is_success() {
            let body = response.text().await?;
            tracing::error!("Failed to register commands. Status: {}, Body: {}", status, body);
            return Err(StoreError::RequestError(format!("Status {status}: {body}")));
        }

        tracing::info!("Command schema registered");
        Ok(())
    }
}

#[async_trait]
impl MessageStore for RestClient {
    async fn fetch_first_message(&self, thread_id: &str) -> Result<Anchor, StoreError> {
        let url = format!("{}/channels/{}/messages", self.base_url, thread_id);

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .query(&[("after", "0"), ("limit", "1")])
            .send()
            .await?;

        let status = response.status();
        if status == 401 || status == 403 {
            tracing::error!("Authentication failed when fetching thread {}", thread_id);
            return Err(StoreError::AuthenticationFailed);
        }
        if status == 404 {
            return Err(StoreError::NotFound(thread_id.to_string()));
        }
        if status == 429 {
            tracing::warn!("Rate limit exceeded");
            return Err(StoreError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await?;
            tracing::error!("Failed to fetch thread {}. Status: {}, Body: {}", thread_id, status, body);
            return Err(StoreError::RequestError(format!("Status {status}: {body}")));
        }

        let mut messages: Vec<MessageDto> = response.json().await?;
        if messages.is_empty() {
            return Err(StoreError::NotFound(thread_id.to_string()));
        }
        let first = messages.remove(0);

        // The thread's own channel object carries its name, which is
        // what scheduled activities are matched against.
        let channel_url = format!("{}/channels/{}", self.base_url, thread_id);
        let channel: ChannelDto = self
            .client
            .get(&channel_url)
            .header("Authorization", self.auth_header())
            .send()
            .await?
            .json()
            .await?;

        Ok(anchor_from_message(first, &channel.id, channel.name))
    }

    async fn create_event_thread(
        &self,
        channel_id: &str,
        name: &str,
        content: &str,
        embed: &Embed,
    ) -> Result<Anchor, StoreError> {
        let url = format!("{}/channels/{}/threads", self.base_url, channel_id);
        let body = ThreadCreateBody {
            name,
            message: MessagePayload {
                content: content.to_string(),
                embeds: vec![embed_to_dto(embed)],
            },
        };

        tracing::info!("Creating event thread {:?} in channel {}", name, channel_id);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == 401 || status == 403 {
            tracing::error!("Authentication failed when creating thread");
            return Err(StoreError::AuthenticationFailed);
        }
        if status == 429 {
            tracing::warn!("Rate limit exceeded");
            return Err(StoreError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await?;
            tracing::error!("Failed to create thread. Status: {}, Body: {}", status, body);
            return Err(StoreError::RequestError(format!("Status {status}: {body}")));
        }

        let thread: ThreadCreatedDto = response.json().await?;
        // On forum channels the starting message id equals the thread
        // id; fall back to that when the response omits the message.
        let message_id = thread
            .message
            .map(|message| message.id)
            .unwrap_or_else(|| thread.id.clone());

        tracing::info!("Created thread {} with anchor {}", thread.id, message_id);

        Ok(Anchor {
            message_id,
            thread_id: thread.id,
            thread_name: thread.name,
            system_authored: true,
            embed: embed.clone(),
        })
    }

    async fn edit_message(
        &self,
        thread_id: &str,
        message_id: &str,
        content: Option<&str>,
        embed: &Embed,
    ) -> Result<(), StoreError> {
        let url = format!(
            "{}/channels/{}/messages/{}",
            self.base_url, thread_id, message_id
        );
        let body = MessageEditBody {
            content: content.map(str::to_string),
            embeds: vec![embed_to_dto(embed)],
        };

        let response = self
            .client
            .patch(&url)
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == 401 || status == 403 {
            tracing::error!("Authentication failed when editing message {}", message_id);
            return Err(StoreError::AuthenticationFailed);
        }
        if status == 404 {
            return Err(StoreError::NotFound(thread_id.to_string()));
        }
        if status == 429 {
            tracing::warn!("Rate limit exceeded");
            return Err(StoreError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await?;
            tracing::error!("Failed to edit message {}. Status: {}, Body: {}", message_id, status, body);
            return Err(StoreError::RequestError(format!("Status {status}: {body}")));
        }

        Ok(())
    }
}

#[async_trait]
impl SchedulingFacility for RestClient {
    async fn create_scheduled_activity(
        &self,
        name: &str,
        description: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        location_id: &str,
    ) -> Result<ScheduledActivity, ScheduleError> {
        let url = format!("{}/guilds/{}/scheduled-events", self.base_url, self.guild_id);
        let body = ScheduledEventDto {
            id: None,
            name: name.to_string(),
            description: Some(description.to_string()),
            scheduled_start_time: start.to_rfc3339(),
            scheduled_end_time: Some(end.to_rfc3339()),
            channel_id: Some(location_id.to_string()),
            entity_type: Some(ENTITY_TYPE_VOICE),
            privacy_level: Some(PRIVACY_GUILD_ONLY),
        };

        tracing::info!("Creating scheduled activity {:?} at {}", name, start);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == 401 || status == 403 {
            tracing::error!("Authentication failed when creating scheduled activity");
            return Err(ScheduleError::AuthenticationFailed);
        }
        if status == 429 {
            tracing::warn!("Rate limit exceeded");
            return Err(ScheduleError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await?;
            tracing::error!("Failed to create scheduled activity. Status: {}, Body: {}", status, body);
            return Err(ScheduleError::RequestError(format!("Status {status}: {body}")));
        }

        let created: ScheduledEventDto = response.json().await?;
        activity_from_dto(created)
    }

    async fn list_scheduled_activities(&self) -> Result<Vec<ScheduledActivity>, ScheduleError> {
        let url = format!("{}/guilds/{}/scheduled-events", self.base_url, self.guild_id);

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        let status = response.status();
        if status == 401 || status == 403 {
            tracing::error!("Authentication failed when listing scheduled activities");
            return Err(ScheduleError::AuthenticationFailed);
        }
        if status == 429 {
            tracing::warn!("Rate limit exceeded");
            return Err(ScheduleError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await?;
            tracing::error!("Failed to list scheduled activities. Status: {}, Body: {}", status, body);
            return Err(ScheduleError::RequestError(format!("Status {status}: {body}")));
        }

        let listed: Vec<ScheduledEventDto> = response.json().await?;
        listed.into_iter().map(activity_from_dto).collect()
    }

    async fn edit_scheduled_activity(
        &self,
        id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        location_id: &str,
    ) -> Result<(), ScheduleError> {
        let url = format!(
            "{}/guilds/{}/scheduled-events/{}",
            self.base_url, self.guild_id, id
        );
        let body = serde_json::json!({
            "scheduled_start_time": start.to_rfc3339(),
            "scheduled_end_time": end.to_rfc3339(),
            "channel_id": location_id,
        });

        tracing::info!("Editing scheduled activity {}", id);

        let response = self
            .client
            .patch(&url)
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == 401 || status == 403 {
            tracing::error!("Authentication failed when editing scheduled activity {}", id);
            return Err(ScheduleError::AuthenticationFailed);
        }
        if status == 404 {
            return Err(ScheduleError::NotFound(id.to_string()));
        }
        if status == 429 {
            tracing::warn!("Rate limit exceeded");
            return Err(ScheduleError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await?;
            tracing::error!("Failed to edit scheduled activity {}. Status: {}, Body: {}", id, status, body);
            return Err(ScheduleError::RequestError(format!("Status {status}: {body}")));
        }

        Ok(())
    }
}
