//! Export local products to a channel.
//!
//! Magento channels need a configure step first (an attribute set and a
//! mapped category). Other channels export straight away through the
//! exporter's default path.

use magesync_catalog::CategoryRepository;
use magesync_channels::Channel;
use magesync_core::{CategoryId, ChannelId, ConnectorError, ConnectorResult, ProductId};
use magesync_magento::{ApiConnector, AttributeSet, MagentoApi};

use crate::error::{WizardError, WizardResult};

/// Choices made on the configure step of a Magento export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDataContext {
    pub channel: ChannelId,
    pub attribute_set: i64,
    pub category: CategoryId,
}

/// Creates local products on a channel.
pub trait CatalogExporter: Send + Sync {
    fn export_to_magento(
        &self,
        channel: &Channel,
        ctx: &ExportDataContext,
    ) -> ConnectorResult<Vec<ProductId>>;

    /// Export for channels this connector does not own.
    fn export_default(&self, channel: &Channel) -> ConnectorResult<Vec<ProductId>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportDataState {
    Start,
    Configure { attribute_sets: Vec<AttributeSet> },
    Done { products: Vec<ProductId> },
}

impl ExportDataState {
    fn name(&self) -> &'static str {
        match self {
            ExportDataState::Start => "start",
            ExportDataState::Configure { .. } => "configure",
            ExportDataState::Done { .. } => "done",
        }
    }
}

pub struct ExportData<'a, C: ApiConnector> {
    connector: &'a C,
    categories: &'a dyn CategoryRepository,
    exporter: &'a dyn CatalogExporter,
    channel: Channel,
    state: ExportDataState,
}

impl<'a, C: ApiConnector> ExportData<'a, C> {
    pub fn new(
        connector: &'a C,
        categories: &'a dyn CategoryRepository,
        exporter: &'a dyn CatalogExporter,
        channel: Channel,
    ) -> Self {
        Self {
            connector,
            categories,
            exporter,
            channel,
            state: ExportDataState::Start,
        }
    }

    pub fn state(&self) -> &ExportDataState {
        &self.state
    }

    /// Magento channels move to the configure step with the remote attribute
    /// sets on offer; anything else is exported immediately.
    pub fn next(&mut self) -> WizardResult<&ExportDataState> {
        if self.state != ExportDataState::Start {
            return Err(WizardError::transition("continue", self.state.name()));
        }

        self.state = if self.channel.is_magento() {
            self.channel.validate_magento_channel()?;
            let session = self.channel.connect(self.connector)?;
            let attribute_sets = session.attribute_sets().map_err(ConnectorError::from)?;
            ExportDataState::Configure { attribute_sets }
        } else {
            ExportDataState::Done {
                products: self.exporter.export_default(&self.channel)?,
            }
        };
        Ok(&self.state)
    }

    /// Export with the chosen attribute set under `category`, which must be
    /// mapped to a Magento category on this channel.
    pub fn export(&mut self, category: CategoryId, attribute_set: i64) -> WizardResult<&ExportDataState> {
        let ExportDataState::Configure { attribute_sets } = &self.state else {
            return Err(WizardError::transition("export", self.state.name()));
        };
        if !attribute_sets.iter().any(|s| s.set_id == attribute_set) {
            return Err(WizardError::InvalidChoice(format!("attribute set {attribute_set}")));
        }
        let mapped = self
            .categories
            .mappings_for(category)
            .iter()
            .any(|m| m.channel == self.channel.id);
        if !mapped {
            return Err(WizardError::InvalidChoice(format!(
                "category {category} (no magento category on this channel)"
            )));
        }

        let ctx = ExportDataContext {
            channel: self.channel.id,
            attribute_set,
            category,
        };
        let products = self.exporter.export_to_magento(&self.channel, &ctx)?;
        tracing::info!(channel = %self.channel.id, count = products.len(), "exported products to magento");
        self.state = ExportDataState::Done { products };
        Ok(&self.state)
    }
}
