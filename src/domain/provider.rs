use serde::{Deserialize, Serialize};
use std::fmt;

/// Ad platform a record originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    GoogleAds,
    MetaAds,
    TikTokAds,
    AmazonAds,
    Custom,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Provider::GoogleAds => "google_ads",
            Provider::MetaAds => "meta_ads",
            Provider::TikTokAds => "tiktok_ads",
            Provider::AmazonAds => "amazon_ads",
            Provider::Custom => "custom",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google_ads" => Ok(Provider::GoogleAds),
            "meta_ads" => Ok(Provider::MetaAds),
            "tiktok_ads" => Ok(Provider::TikTokAds),
            "amazon_ads" => Ok(Provider::AmazonAds),
            "custom" => Ok(Provider::Custom),
            other => Err(format!("unknown provider '{other}'")),
        }
    }
}
