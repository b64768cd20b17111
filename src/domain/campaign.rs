use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::EnumString, serde::Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Scheduled,
    Sending,
    Completed,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub subject: String,
    pub content: String,
    pub status: CampaignStatus,
    pub created_at: DateTime<Utc>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub sent_date: Option<DateTime<Utc>>,
}

impl Campaign {
    /// Substitutes the `{{name}}` and `{{unsubscribe_url}}` placeholders for one recipient.
    /// The name is HTML escaped since campaign content is HTML.
    pub fn personalize(&self, subscriber_name: &str, unsubscribe_url: &str) -> String {
        self.content
            .replace("{{name}}", &htmlescape::encode_minimal(subscriber_name))
            .replace("{{unsubscribe_url}}", unsubscribe_url)
    }

    /// Plain-text rendition of [`Campaign::personalize`] for text-only mail clients.
    pub fn personalize_text(&self, subscriber_name: &str, unsubscribe_url: &str) -> String {
        strip_html(&self.personalize(subscriber_name, unsubscribe_url))
    }
}

const BLOCK_TAGS: [&str; 11] = [
    "br", "p", "div", "li", "tr", "h1", "h2", "h3", "h4", "h5", "h6",
];

// Drops tags, breaks lines at block elements and decodes entities.
fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(start) = rest.find('<') {
        text.push_str(&rest[..start]);
        let Some(end) = rest[start..].find('>') else {
            rest = &rest[start..];
            break;
        };
        let tag = rest[start + 1..start + end]
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        if BLOCK_TAGS.contains(&tag.as_str()) {
            text.push('\n');
        }
        rest = &rest[start + end + 1..];
    }
    text.push_str(rest);

    let text = htmlescape::decode_html(&text).unwrap_or(text);
    let mut lines: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() && lines.last().map_or(true, |last| last.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    lines.join("\n").trim().to_string()
}

/// One send attempt of a campaign to a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignTracking {
    pub campaign_id: Uuid,
    pub subscriber_id: Uuid,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub name: String,
    pub subject: String,
    pub content: String,
    pub scheduled_for: Option<DateTime<Utc>>,
}

impl NewCampaign {
    pub fn parse(
        name: String,
        subject: String,
        content: String,
        scheduled_date: Option<String>,
        scheduled_time: Option<String>,
    ) -> Result<Self, String> {
        for (field, label) in [(&name, "Campaign name"), (&subject, "Subject"), (&content, "Content")] {
            if field.trim().is_empty() {
                return Err(format!("{} is required", label));
            }
        }

        let scheduled_date = scheduled_date.filter(|s| !s.trim().is_empty());
        let scheduled_time = scheduled_time.filter(|s| !s.trim().is_empty());
        let scheduled_for = match (scheduled_date, scheduled_time) {
            (None, None) => None,
            (Some(date), Some(time)) => Some(parse_schedule(&date, &time)?),
            _ => return Err("Both schedule date and time are required to schedule a campaign".into()),
        };

        Ok(Self {
            name: name.trim().to_string(),
            subject: subject.trim().to_string(),
            content,
            scheduled_for,
        })
    }

    /// Campaigns without a schedule are saved as drafts.
    pub fn initial_status(&self) -> CampaignStatus {
        match self.scheduled_for {
            Some(_) => CampaignStatus::Scheduled,
            None => CampaignStatus::Draft,
        }
    }
}

fn parse_schedule(date: &str, time: &str) -> Result<DateTime<Utc>, String> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| format!("{} is not a valid date (YYYY-MM-DD)", date))?;
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .map_err(|_| format!("{} is not a valid time (HH:MM)", time))?;
    Ok(Utc.from_utc_datetime(&date.and_time(time)))
}
