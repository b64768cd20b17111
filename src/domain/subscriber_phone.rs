#[derive(Debug, Clone)]
pub struct SubscriberPhone(String);

impl SubscriberPhone {
    pub fn parse(phone: String) -> Result<Self, String> {
        let phone = phone.trim().to_string();
        if phone.is_empty() {
            return Err("All fields are required".into());
        }

        Ok(Self(phone))
    }
}

impl AsRef<str> for SubscriberPhone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
