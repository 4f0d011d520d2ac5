//! Connection and store configuration for a Magento channel.
//!
//! ```text
//! Start ──next──> ImportWebsite ──select_website──> ImportStore ──select_store──> Success ──finish──> End
//!   │
//!   ├──next (bound, website still exists)──> End
//!   └──next (bound, website gone)──> Failure ──finish──> End
//! ```

use magesync_channels::{Channel, ChannelRepository, RemoteStore, RemoteWebsite};
use magesync_core::{ChannelId, ConnectorError};
use magesync_magento::{ApiConnector, MagentoApi};

use crate::error::{WizardError, WizardResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigureState {
    /// Connection tested.
    Start,
    ImportWebsite {
        websites: Vec<RemoteWebsite>,
    },
    ImportStore {
        website: RemoteWebsite,
        stores: Vec<RemoteStore>,
    },
    /// Website and store were written to the channel.
    Success,
    /// The channel's configured website no longer exists remotely.
    Failure,
    End,
}

impl ConfigureState {
    pub fn name(&self) -> &'static str {
        match self {
            ConfigureState::Start => "start",
            ConfigureState::ImportWebsite { .. } => "import_website",
            ConfigureState::ImportStore { .. } => "import_store",
            ConfigureState::Success => "success",
            ConfigureState::Failure => "failure",
            ConfigureState::End => "end",
        }
    }
}

pub struct ConfigureMagento<'a, C: ApiConnector> {
    connector: &'a C,
    channels: &'a dyn ChannelRepository,
    channel: Channel,
    state: ConfigureState,
}

impl<'a, C: ApiConnector> ConfigureMagento<'a, C> {
    /// Open the wizard for a channel. Fails unless it is a Magento channel
    /// whose credentials work.
    pub fn start(
        connector: &'a C,
        channels: &'a dyn ChannelRepository,
        channel_id: ChannelId,
    ) -> WizardResult<Self> {
        let channel = channels.require(channel_id)?;
        channel.test_magento_connection(connector)?;
        Ok(Self {
            connector,
            channels,
            channel,
            state: ConfigureState::Start,
        })
    }

    pub fn state(&self) -> &ConfigureState {
        &self.state
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Leave the start page.
    pub fn next(&mut self) -> WizardResult<&ConfigureState> {
        if self.state != ConfigureState::Start {
            return Err(WizardError::transition("continue", self.state.name()));
        }

        let websites = self.websites()?;
        self.state = if !self.channel.is_bound() {
            ConfigureState::ImportWebsite { websites }
        } else if self.website_still_exists(&websites) {
            ConfigureState::End
        } else {
            tracing::warn!(channel = %self.channel.id, "configured magento website not found remotely");
            ConfigureState::Failure
        };
        Ok(&self.state)
    }

    pub fn select_website(&mut self, website_id: i64) -> WizardResult<&ConfigureState> {
        let ConfigureState::ImportWebsite { websites } = &self.state else {
            return Err(WizardError::transition("select a website", self.state.name()));
        };
        let website = websites
            .iter()
            .find(|w| w.id == website_id)
            .cloned()
            .ok_or_else(|| WizardError::InvalidChoice(format!("website {website_id}")))?;

        let session = self.channel.connect(self.connector)?;
        let stores = session
            .stores(website.id)
            .map_err(ConnectorError::from)?
            .into_iter()
            .map(|s| RemoteStore {
                id: s.default_store_id,
                name: s.name,
            })
            .collect();

        self.state = ConfigureState::ImportStore { website, stores };
        Ok(&self.state)
    }

    /// Bind the chosen website and store to the channel and persist it.
    pub fn select_store(&mut self, store_id: i64) -> WizardResult<&ConfigureState> {
        let ConfigureState::ImportStore { website, stores } = &self.state else {
            return Err(WizardError::transition("select a store", self.state.name()));
        };
        let store = stores
            .iter()
            .find(|s| s.id == store_id)
            .cloned()
            .ok_or_else(|| WizardError::InvalidChoice(format!("store {store_id}")))?;

        self.channel.website = Some(website.clone());
        self.channel.store = Some(store);
        self.channels.save(self.channel.clone());
        tracing::info!(channel = %self.channel.id, website = website.id, store = store_id, "magento channel configured");

        self.state = ConfigureState::Success;
        Ok(&self.state)
    }

    /// Acknowledge the outcome page.
    pub fn finish(&mut self) -> WizardResult<&ConfigureState> {
        match self.state {
            ConfigureState::Success | ConfigureState::Failure => {
                self.state = ConfigureState::End;
                Ok(&self.state)
            }
            _ => Err(WizardError::transition("finish", self.state.name())),
        }
    }

    /// Abandon the wizard. Nothing chosen so far is saved.
    pub fn cancel(&mut self) {
        self.state = ConfigureState::End;
    }

    fn websites(&self) -> WizardResult<Vec<RemoteWebsite>> {
        let session = self.channel.connect(self.connector)?;
        let websites = session
            .websites()
            .map_err(ConnectorError::from)?;
        Ok(websites
            .into_iter()
            .map(|w| RemoteWebsite {
                id: w.website_id,
                name: w.name,
                code: w.code,
            })
            .collect())
    }

    fn website_still_exists(&self, websites: &[RemoteWebsite]) -> bool {
        match &self.channel.website {
            Some(configured) => websites.contains(configured),
            None => false,
        }
    }
}
