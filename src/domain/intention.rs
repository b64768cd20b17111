use std::str::FromStr;
use validator::validate_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::EnumString, serde::Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Intention {
    Investor,
    Rider,
    Customer,
    Curious,
}

impl Intention {
    pub fn parse(intention: &str) -> Result<Self, String> {
        Self::from_str(intention.trim()).map_err(|_| format!("{} is not a valid intention", intention))
    }

    /// Human readable label used in emails.
    pub fn label(&self) -> &'static str {
        match self {
            Intention::Investor => "Potential Investor",
            Intention::Rider => "Rider",
            Intention::Customer => "Customer",
            Intention::Curious => "Just Curious",
        }
    }

    pub fn requires_linkedin(&self) -> bool {
        matches!(self, Intention::Investor)
    }
}

#[derive(Debug, Clone)]
pub struct LinkedinUrl(String);

impl LinkedinUrl {
    pub fn parse(url: String) -> Result<Self, String> {
        let url = url.trim().to_string();
        match validate_url(&url) {
            true => Ok(Self(url)),
            false => Err("Please provide a valid LinkedIn profile URL".into()),
        }
    }

    /// Only investor profiles are checked. Anything else is stored trimmed but unvalidated.
    pub fn as_given(url: String) -> Self {
        Self(url.trim().to_string())
    }
}

impl AsRef<str> for LinkedinUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
