use serde::{Deserialize, Serialize};

/// One extracted listing, ready for map plotting.
///
/// A `Property` is only ever built from a detail page that yielded a usable
/// coordinate pair; pages without coordinates produce no record at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    pub title: String,
    pub price: String,
    #[serde(rename = "priceValue")]
    pub price_value: f64,
    pub image: String,
    pub link: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Terminal output of one scrape run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapingReport {
    pub success: bool,
    pub properties: Vec<Property>,
    pub total: usize,
    pub errors: Vec<String>,
}

/// Errors recorded per failed detail page are surfaced up to this many.
pub const MAX_REPORTED_ERRORS: usize = 10;

impl ScrapingReport {
    /// Assemble the final report from the orchestrator's raw collections.
    ///
    /// `success` means at least one property was produced; `total` always
    /// mirrors the property count, and the error list is truncated to the
    /// first [`MAX_REPORTED_ERRORS`] entries.
    pub fn from_parts(properties: Vec<Property>, mut errors: Vec<String>) -> Self {
        errors.truncate(MAX_REPORTED_ERRORS);
        Self {
            success: !properties.is_empty(),
            total: properties.len(),
            properties,
            errors,
        }
    }

    /// A report describing a run that produced nothing, with one explanation.
    pub fn empty_with_error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            properties: Vec::new(),
            total: 0,
            errors: vec![message.into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_property() -> Property {
        Property {
            id: "123-casa-lago-sul".to_string(),
            title: "Casa no Lago Sul".to_string(),
            price: "R$ 1.250,00".to_string(),
            price_value: 1250.0,
            image: "https://www.dfimoveis.com.br/fotos/1.jpg".to_string(),
            link: "https://www.dfimoveis.com.br/imovel/123-casa-lago-sul".to_string(),
            latitude: -15.8705378,
            longitude: -47.9686399,
        }
    }

    #[test]
    fn report_total_tracks_property_count() {
        let report = ScrapingReport::from_parts(vec![sample_property(); 3], Vec::new());
        assert!(report.success);
        assert_eq!(report.total, 3);
        assert_eq!(report.total, report.properties.len());
    }

    #[test]
    fn report_caps_errors_at_ten() {
        let errors: Vec<String> = (0..25).map(|i| format!("url-{i}: failed")).collect();
        let report = ScrapingReport::from_parts(Vec::new(), errors);
        assert!(!report.success);
        assert_eq!(report.errors.len(), MAX_REPORTED_ERRORS);
        assert_eq!(report.errors[0], "url-0: failed");
    }

    #[test]
    fn report_without_properties_is_not_success() {
        let report = ScrapingReport::from_parts(Vec::new(), vec!["x: failed".to_string()]);
        assert!(!report.success);
        assert_eq!(report.total, 0);
    }

    #[test]
    fn property_serializes_with_camel_case_price_value() {
        let json = serde_json::to_value(sample_property()).unwrap();
        assert!(json.get("priceValue").is_some());
        assert!(json.get("price_value").is_none());
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 8);
    }
}
