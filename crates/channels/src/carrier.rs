//! Carrier mapping used when shipments are reported to the storefront.

use serde::{Deserialize, Serialize};

use magesync_core::ChannelId;

/// A carrier configured on a sale channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleChannelCarrier {
    pub channel: ChannelId,
    pub code: String,
    pub title: String,
}

/// How a carrier is announced to Magento.
///
/// Integrations with carrier-specific codes override `magento_mapping`.
pub trait MagentoCarrierMapping {
    fn code(&self) -> &str;
    fn title(&self) -> &str;

    /// `(code, title)` as expected by the shipment tracking API.
    fn magento_mapping(&self) -> (String, String) {
        (self.code().to_string(), self.title().to_string())
    }
}

impl MagentoCarrierMapping for SaleChannelCarrier {
    fn code(&self) -> &str {
        &self.code
    }

    fn title(&self) -> &str {
        &self.title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dhl;

    impl MagentoCarrierMapping for Dhl {
        fn code(&self) -> &str {
            "dhl_express"
        }

        fn title(&self) -> &str {
            "DHL Express"
        }

        fn magento_mapping(&self) -> (String, String) {
            ("dhlint".to_string(), self.title().to_string())
        }
    }

    #[test]
    fn default_mapping_is_code_and_title() {
        let carrier = SaleChannelCarrier {
            channel: ChannelId::new(),
            code: "ups".into(),
            title: "UPS".into(),
        };
        assert_eq!(carrier.magento_mapping(), ("ups".to_string(), "UPS".to_string()));
    }

    #[test]
    fn mapping_can_be_overridden() {
        assert_eq!(Dhl.magento_mapping().0, "dhlint");
    }
}
