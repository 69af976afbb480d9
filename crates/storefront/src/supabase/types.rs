//! Row shapes returned by PostgREST.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use floa_core::ProductId;

/// A row of the `product` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRow {
    pub product_id: ProductId,
    pub name: String,
    pub price_usd: Decimal,
    #[serde(default)]
    pub hero_image: Option<String>,
}

/// The embedded colour of a `product_colour` row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColourName {
    #[serde(default)]
    pub name: Option<String>,
}

/// A `product_colour` row with its colour embedded.
///
/// PostgREST renders a to-one embed as an object, but older views return an
/// array and a dangling foreign key gives `null`; all three are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductColourRow {
    pub product_id: ProductId,
    #[serde(default, deserialize_with = "one_or_many")]
    pub colour: Vec<ColourName>,
}

/// A row of the `profiles` table, as selected for the admin lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ProfileRow {
    #[serde(default)]
    pub is_admin: Option<bool>,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<ColourName>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<ColourName>),
        One(ColourName),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::Many(colours)) => colours,
        Some(OneOrMany::One(colour)) => vec![colour],
        None => Vec::new(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_row() {
        let row: ProductRow = serde_json::from_str(
            r#"{"product_id":3,"name":"Petal Runner Women","price_usd":129.9,"hero_image":"https://cdn.floa.shop/3.jpg","created_at":"2025-01-01"}"#,
        )
        .unwrap();
        assert_eq!(row.product_id, ProductId::new(3));
        assert_eq!(row.price_usd, Decimal::new(1299, 1));

        let bare: ProductRow =
            serde_json::from_str(r#"{"product_id":4,"name":"Bloom","price_usd":"89.00"}"#).unwrap();
        assert_eq!(bare.hero_image, None);
    }

    #[test]
    fn test_colour_embed_shapes() {
        let rows: Vec<ProductColourRow> = serde_json::from_str(
            r#"[
                {"product_id":1,"colour":{"name":"Rose"}},
                {"product_id":1,"colour":[{"name":"Sage"},{"name":null}]},
                {"product_id":2,"colour":null},
                {"product_id":3}
            ]"#,
        )
        .unwrap();

        assert_eq!(rows[0].colour.len(), 1);
        assert_eq!(rows[0].colour[0].name.as_deref(), Some("Rose"));
        assert_eq!(rows[1].colour.len(), 2);
        assert_eq!(rows[1].colour[1].name, None);
        assert!(rows[2].colour.is_empty());
        assert!(rows[3].colour.is_empty());
    }
}
