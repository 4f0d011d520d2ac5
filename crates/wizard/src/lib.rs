//! Interactive channel workflows, modelled as explicit state machines.
//!
//! Each wizard owns the channel it runs for and moves between states only
//! through its methods; calling a method in the wrong state is an error, not
//! a silent no-op.

pub mod configure;
pub mod error;
pub mod export_data;
pub mod shipment;
pub mod update_catalog;

pub use configure::{ConfigureMagento, ConfigureState};
pub use error::{WizardError, WizardResult};
pub use export_data::{CatalogExporter, ExportData, ExportDataContext, ExportDataState};
pub use shipment::{
    ExportShipmentStatus, SHIPMENT_EXPORT_MESSAGE, ShipmentExport, ShipmentStatusExporter,
};
pub use update_catalog::UpdateMagentoCatalog;
