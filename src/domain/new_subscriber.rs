use crate::domain::{Intention, LinkedinUrl, SubscriberEmail, SubscriberName, SubscriberPhone};

/// A validated subscribe request.
#[derive(Debug, Clone)]
pub struct NewSubscriber {
    pub name: SubscriberName,
    pub email: SubscriberEmail,
    pub phone: SubscriberPhone,
    pub intention: Intention,
    pub linkedin: Option<LinkedinUrl>,
}

/// Raw fields as they arrive from the subscribe form.
#[derive(Debug, Default, serde::Deserialize)]
pub struct SubscribeForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub intention: String,
    pub linkedin: Option<String>,
}

impl TryFrom<SubscribeForm> for NewSubscriber {
    type Error = String;

    fn try_from(form: SubscribeForm) -> Result<Self, Self::Error> {
        let required = [&form.name, &form.email, &form.phone, &form.intention];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err("All fields are required".into());
        }

        let email = SubscriberEmail::parse(form.email)?;
        let intention = Intention::parse(&form.intention)?;
        let linkedin = match form.linkedin.filter(|url| !url.trim().is_empty()) {
            Some(url) if intention.requires_linkedin() => Some(LinkedinUrl::parse(url)?),
            Some(url) => Some(LinkedinUrl::as_given(url)),
            None if intention.requires_linkedin() => {
                return Err("Please provide a valid LinkedIn profile URL".into())
            }
            None => None,
        };

        Ok(Self {
            name: SubscriberName::parse(form.name)?,
            email,
            phone: SubscriberPhone::parse(form.phone)?,
            intention,
            linkedin,
        })
    }
}
