// src/models.rs
use crate::errors::TimeMachineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EraId {
    #[serde(rename = "Modern (2020s)")]
    Modern,
    #[serde(rename = "Instagram Era (2010s)")]
    Instagram,
    #[serde(rename = "Y2K Digital (2000s)")]
    Y2k,
    #[serde(rename = "Retro Grunge (1990s)")]
    RetroGrunge,
    #[serde(rename = "Neon & Grain (1980s)")]
    NeonGrain,
}

impl EraId {
    pub const ALL: [EraId; 5] = [
        EraId::Modern,
        EraId::Instagram,
        EraId::Y2k,
        EraId::RetroGrunge,
        EraId::NeonGrain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EraId::Modern => "Modern (2020s)",
            EraId::Instagram => "Instagram Era (2010s)",
            EraId::Y2k => "Y2K Digital (2000s)",
            EraId::RetroGrunge => "Retro Grunge (1990s)",
            EraId::NeonGrain => "Neon & Grain (1980s)",
        }
    }

    /// First word of the identifier, used for compact badges.
    pub fn short_label(&self) -> &'static str {
        let full = self.as_str();
        full.split(' ').next().unwrap_or(full)
    }
}

impl fmt::Display for EraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EraId {
    type Err = TimeMachineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EraId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| TimeMachineError::UnknownEra(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EraStyle {
    pub id: EraId,
    pub year: u16,
    pub description: &'static str,
    pub prompt: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
}

/// Image bytes carried inline as a base64 `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct EmbeddedImage {
    pub media_type: String,
    pub data: String,
}

impl EmbeddedImage {
    pub fn new(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            data: data.into(),
        }
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }

    pub fn from_data_url(url: &str) -> Result<Self, TimeMachineError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| TimeMachineError::InvalidEmbeddedImage("missing data: scheme".into()))?;
        let (media_type, data) = rest.split_once(";base64,").ok_or_else(|| {
            TimeMachineError::InvalidEmbeddedImage("expected a base64 data URL".into())
        })?;
        if media_type.is_empty() {
            return Err(TimeMachineError::InvalidEmbeddedImage(
                "missing media type".into(),
            ));
        }
        Ok(Self::new(media_type, data))
    }
}

impl From<EmbeddedImage> for String {
    fn from(image: EmbeddedImage) -> Self {
        image.to_data_url()
    }
}

impl TryFrom<String> for EmbeddedImage {
    type Error = TimeMachineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        EmbeddedImage::from_data_url(&value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformedImage {
    pub era: EraId,
    pub image: EmbeddedImage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub era: EraId,
    pub image_url: EmbeddedImage,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub version: u64,
    pub source_image: Option<EmbeddedImage>,
    pub transformed_image: Option<TransformedImage>,
    pub selected_era: EraStyle,
    pub busy: bool,
    pub loading_message: Option<&'static str>,
    pub error: Option<String>,
    pub history: Vec<HistoryEntry>,
    pub can_reset: bool,
    pub action_label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPayload {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}
