use serde::{Deserialize, Serialize};

use magesync_core::{ChannelId, ConnectorError, ConnectorResult, Entity, PriceListId, UomId};
use magesync_magento::{ApiConnector, Credentials, MagentoApi};

/// Where a channel's orders and catalog come from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelSource {
    Magento,
    /// Any channel type handled outside this connector (e.g. "manual", "pos").
    ///
    /// `"magento"` is reserved: it always means [`ChannelSource::Magento`].
    /// Build sources through `From<String>` to keep that normalized.
    #[serde(untagged)]
    Other(String),
}

impl ChannelSource {
    pub fn is_magento(&self) -> bool {
        matches!(self, ChannelSource::Magento)
    }
}

impl From<String> for ChannelSource {
    fn from(source: String) -> Self {
        if source == "magento" {
            ChannelSource::Magento
        } else {
            ChannelSource::Other(source)
        }
    }
}

impl From<&str> for ChannelSource {
    fn from(source: &str) -> Self {
        source.to_string().into()
    }
}

/// The remote website a channel is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteWebsite {
    pub id: i64,
    pub name: String,
    pub code: String,
}

/// The remote store (view) a channel is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteStore {
    pub id: i64,
    pub name: String,
}

/// A sale channel.
///
/// Only channels with [`ChannelSource::Magento`] carry remote credentials and
/// website/store bindings; the wizard fills the bindings in.
#[derive(Debug, Clone)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    pub source: ChannelSource,
    pub credentials: Option<Credentials>,
    pub website: Option<RemoteWebsite>,
    pub store: Option<RemoteStore>,
    pub default_uom: UomId,
    pub price_list: Option<PriceListId>,
}

impl Channel {
    /// A new Magento channel without website or store bindings.
    pub fn magento(name: impl Into<String>, credentials: Credentials, default_uom: UomId) -> Self {
        Self {
            id: ChannelId::new(),
            name: name.into(),
            source: ChannelSource::Magento,
            credentials: Some(credentials),
            website: None,
            store: None,
            default_uom,
            price_list: None,
        }
    }

    /// A channel handled by some other integration.
    ///
    /// A `source` of `"magento"` yields a Magento channel without credentials,
    /// which [`Channel::validate_magento_channel`] rejects.
    pub fn other(name: impl Into<String>, source: impl Into<String>, default_uom: UomId) -> Self {
        Self {
            id: ChannelId::new(),
            name: name.into(),
            source: ChannelSource::from(source.into()),
            credentials: None,
            website: None,
            store: None,
            default_uom,
            price_list: None,
        }
    }

    pub fn is_magento(&self) -> bool {
        self.source.is_magento()
    }

    /// Fails unless this is a Magento channel with credentials.
    pub fn validate_magento_channel(&self) -> ConnectorResult<()> {
        if !self.is_magento() {
            return Err(ConnectorError::user(format!(
                "channel \"{}\" is not a Magento channel",
                self.name
            )));
        }
        if self.credentials.is_none() {
            return Err(ConnectorError::user(format!(
                "channel \"{}\" has no Magento credentials",
                self.name
            )));
        }
        Ok(())
    }

    pub fn credentials(&self) -> ConnectorResult<&Credentials> {
        self.credentials.as_ref().ok_or_else(|| {
            ConnectorError::user(format!("channel \"{}\" has no Magento credentials", self.name))
        })
    }

    /// Whether both the website and the store have been configured.
    pub fn is_bound(&self) -> bool {
        self.website.is_some() && self.store.is_some()
    }

    /// Open a remote session with this channel's credentials.
    pub fn connect<C: ApiConnector>(&self, connector: &C) -> ConnectorResult<C::Session> {
        let credentials = self.credentials()?;
        Ok(connector.connect(credentials)?)
    }

    /// Open a session and list websites to prove the credentials work.
    pub fn test_magento_connection<C: ApiConnector>(&self, connector: &C) -> ConnectorResult<()> {
        self.validate_magento_channel()?;
        let session = self.connect(connector)?;
        let websites = session.websites()?;
        tracing::info!(
            channel = %self.id,
            websites = websites.len(),
            "magento connection ok"
        );
        Ok(())
    }
}

impl Entity for Channel {
    type Id = ChannelId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
