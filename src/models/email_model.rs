use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    #[serde(
        serialize_with = "serialize_base64",
        deserialize_with = "deserialize_base64"
    )]
    pub data: Vec<u8>,
}

fn serialize_base64<S>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&base64::encode(data))
}

fn deserialize_base64<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    base64::decode(&s).map_err(serde::de::Error::custom)
}

/// Parsea una lista "a@x.com, b@x.com" quitando vacíos y duplicados,
/// respetando el orden de aparición.
pub fn parse_email_list(raw: &str) -> Vec<String> {
    let mut emails: Vec<String> = Vec::new();
    for email in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        if !emails.iter().any(|e| e == email) {
            emails.push(email.to_string());
        }
    }
    emails
}
