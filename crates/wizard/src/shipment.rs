use chrono::{DateTime, Utc};

use magesync_channels::Channel;
use magesync_core::{ConnectorResult, SaleId};

use crate::error::WizardResult;

pub const SHIPMENT_EXPORT_MESSAGE: &str = "This wizard will export shipment status for all the \
shipments related to this store view. To export tracking information also for these shipments \
please check the checkbox for Export Tracking Information on Store View.";

/// Pushes shipment status of a channel's sales to Magento. Owned by the
/// sales side of the application.
pub trait ShipmentStatusExporter: Send + Sync {
    /// Returns the sales whose shipments were exported.
    fn export_shipment_status(&self, channel: &Channel) -> ConnectorResult<Vec<SaleId>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentExport {
    pub sales: Vec<SaleId>,
    pub exported_at: DateTime<Utc>,
}

pub struct ExportShipmentStatus<'a> {
    channel: &'a Channel,
    exporter: &'a dyn ShipmentStatusExporter,
}

impl<'a> ExportShipmentStatus<'a> {
    pub fn start(
        channel: &'a Channel,
        exporter: &'a dyn ShipmentStatusExporter,
    ) -> WizardResult<Self> {
        channel.validate_magento_channel()?;
        Ok(Self { channel, exporter })
    }

    /// Text shown on the start page.
    pub fn message(&self) -> &'static str {
        SHIPMENT_EXPORT_MESSAGE
    }

    pub fn export(self) -> WizardResult<ShipmentExport> {
        self.channel.validate_magento_channel()?;
        let sales = self.exporter.export_shipment_status(self.channel)?;
        tracing::info!(channel = %self.channel.id, sales = sales.len(), "exported shipment status");
        Ok(ShipmentExport {
            sales,
            exported_at: Utc::now(),
        })
    }
}
