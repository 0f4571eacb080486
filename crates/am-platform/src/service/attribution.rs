//! Affiliate code attribution
//!
//! Finds the affiliate code an order was placed under. Cart attributes set
//! by the storefront script win; the landing page query string is the
//! fallback for orders whose cart never saw the script.

use am_common::ShopifyOrder;

/// Note attribute names that carry an affiliate code
pub const NOTE_ATTRIBUTE_KEYS: [&str; 2] = ["affiliate_code", "ref"];

/// Landing site query parameters, in priority order
pub const LANDING_SITE_KEYS: [&str; 2] = ["ref", "affiliate"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributionSource {
    NoteAttribute,
    LandingSite,
}

impl AttributionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributionSource::NoteAttribute => "note_attribute",
            AttributionSource::LandingSite => "landing_site",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AffiliateAttribution {
    pub affiliate_code: Option<String>,
    pub source: Option<AttributionSource>,
}

impl AffiliateAttribution {
    fn found(code: String, source: AttributionSource) -> Self {
        Self {
            affiliate_code: Some(code),
            source: Some(source),
        }
    }

    pub fn code(&self) -> Option<&str> {
        self.affiliate_code.as_deref()
    }
}

pub fn extract(order: &ShopifyOrder) -> AffiliateAttribution {
    if let Some(code) = from_note_attributes(order) {
        return AffiliateAttribution::found(code, AttributionSource::NoteAttribute);
    }
    if let Some(code) = order.landing_site.as_deref().and_then(from_landing_site) {
        return AffiliateAttribution::found(code, AttributionSource::LandingSite);
    }
    AffiliateAttribution::default()
}

/// First matching attribute in list order, skipping empty values
fn from_note_attributes(order: &ShopifyOrder) -> Option<String> {
    order
        .note_attributes()
        .iter()
        .filter(|attr| NOTE_ATTRIBUTE_KEYS.contains(&attr.name.as_str()))
        .filter_map(|attr| attr.value.as_deref())
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn from_landing_site(landing_site: &str) -> Option<String> {
    let params = query_params(landing_site);
    LANDING_SITE_KEYS.iter().find_map(|key| {
        params
            .iter()
            .find(|(name, value)| name.as_str() == *key && !value.is_empty())
            .map(|(_, value)| value.clone())
    })
}

/// Decoded `name=value` pairs from the text after the first `?`, with any
/// fragment removed. Pairs that fail to decode are dropped.
pub(crate) fn query_params(url: &str) -> Vec<(String, String)> {
    let query = match url.split_once('?') {
        Some((_, rest)) => rest,
        None => return Vec::new(),
    };
    let query = query.split_once('#').map_or(query, |(q, _)| q);

    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            Some((decode_component(name)?, decode_component(value)?))
        })
        .collect()
}

fn decode_component(raw: &str) -> Option<String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).ok().map(|s| s.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use am_common::NoteAttribute;

    fn order(note_attributes: Vec<NoteAttribute>, landing_site: Option<&str>) -> ShopifyOrder {
        ShopifyOrder {
            id: "1001".to_string(),
            total_price: None,
            financial_status: None,
            note_attributes: Some(note_attributes),
            landing_site: landing_site.map(str::to_string),
            currency: None,
        }
    }

    #[test]
    fn test_note_attribute_beats_landing_site() {
        let order = order(
            vec![NoteAttribute::new("affiliate_code", "CREATOR1")],
            Some("https://shop.example/?ref=OTHER"),
        );

        let attribution = extract(&order);
        assert_eq!(attribution.code(), Some("CREATOR1"));
        assert_eq!(attribution.source, Some(AttributionSource::NoteAttribute));
    }

    #[test]
    fn test_ref_note_attribute() {
        let order = order(vec![NoteAttribute::new("ref", "REF42")], None);
        assert_eq!(extract(&order).code(), Some("REF42"));
    }

    #[test]
    fn test_list_order_governs_between_note_keys() {
        let order = order(
            vec![
                NoteAttribute::new("ref", "FIRST"),
                NoteAttribute::new("affiliate_code", "SECOND"),
            ],
            None,
        );
        assert_eq!(extract(&order).code(), Some("FIRST"));
    }

    #[test]
    fn test_empty_note_value_is_skipped() {
        let order = order(
            vec![
                NoteAttribute::new("affiliate_code", ""),
                NoteAttribute {
                    name: "ref".to_string(),
                    value: None,
                },
                NoteAttribute::new("gift_wrap", "yes"),
            ],
            Some("https://shop.example/products/mug?ref=FALLBACK"),
        );

        let attribution = extract(&order);
        assert_eq!(attribution.code(), Some("FALLBACK"));
        assert_eq!(attribution.source, Some(AttributionSource::LandingSite));
    }

    #[test]
    fn test_landing_site_ref() {
        let order = order(vec![], Some("https://shop.example/?ref=ABC123"));
        assert_eq!(extract(&order).code(), Some("ABC123"));
    }

    #[test]
    fn test_landing_site_affiliate_fallback() {
        let order = order(vec![], Some("/products/mug?utm_source=ig&affiliate=XYZ#reviews"));
        assert_eq!(extract(&order).code(), Some("XYZ"));
    }

    #[test]
    fn test_landing_site_ref_preferred_over_affiliate() {
        let order = order(vec![], Some("/?affiliate=SECOND&ref=FIRST"));
        assert_eq!(extract(&order).code(), Some("FIRST"));
    }

    #[test]
    fn test_landing_site_decoding() {
        let encoded = order(vec![], Some("/?ref=SPRING%20SALE&x=1"));
        assert_eq!(extract(&encoded).code(), Some("SPRING SALE"));

        let plus = order(vec![], Some("/?ref=SPRING+SALE"));
        assert_eq!(extract(&plus).code(), Some("SPRING SALE"));
    }

    #[test]
    fn test_empty_landing_site_value_is_absent() {
        let order = order(vec![], Some("/?ref=&affiliate="));
        assert_eq!(extract(&order), AffiliateAttribution::default());
    }

    #[test]
    fn test_no_source_is_absent() {
        let order = order(vec![], Some("https://shop.example/products/mug"));
        let attribution = extract(&order);
        assert!(attribution.affiliate_code.is_none());
        assert!(attribution.source.is_none());
    }

    #[test]
    fn test_fragment_is_not_part_of_value() {
        assert_eq!(
            query_params("/p?ref=ABC#ref=DEF"),
            vec![("ref".to_string(), "ABC".to_string())]
        );
    }
}
