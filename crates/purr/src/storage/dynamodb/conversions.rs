//! DynamoDB attribute conversion functions.
//!
//! Pure functions between the store-neutral [`AttrValue`] and the SDK's
//! `AttributeValue`. Numbers travel as their exact decimal text. Sets and
//! binaries, which the API never writes, read back as lists and base64
//! strings.

use std::collections::HashMap;
use std::str::FromStr;

use aws_sdk_dynamodb::types::AttributeValue;
use base64::{engine::general_purpose, Engine as _};
use rust_decimal::Decimal;

use purr_core::codec::{AttrValue, Item};
use purr_core::storage::RepositoryError;

pub type DynamoItem = HashMap<String, AttributeValue>;

/// Convert a value to its DynamoDB attribute.
pub fn to_attribute(value: &AttrValue) -> AttributeValue {
    match value {
        AttrValue::Null => AttributeValue::Null(true),
        AttrValue::Bool(b) => AttributeValue::Bool(*b),
        AttrValue::Number(n) => AttributeValue::N(n.normalize().to_string()),
        AttrValue::String(s) => AttributeValue::S(s.clone()),
        AttrValue::List(values) => AttributeValue::L(values.iter().map(to_attribute).collect()),
        AttrValue::Map(item) => AttributeValue::M(to_item(item)),
    }
}

/// Convert an item to a DynamoDB item.
pub fn to_item(item: &Item) -> DynamoItem {
    item.iter()
        .map(|(k, v)| (k.clone(), to_attribute(v)))
        .collect()
}

/// Convert a DynamoDB attribute back to a value.
pub fn from_attribute(attribute: &AttributeValue) -> Result<AttrValue, RepositoryError> {
    Ok(match attribute {
        AttributeValue::Null(_) => AttrValue::Null,
        AttributeValue::Bool(b) => AttrValue::Bool(*b),
        AttributeValue::N(n) => AttrValue::Number(parse_number(n)?),
        AttributeValue::S(s) => AttrValue::String(s.clone()),
        AttributeValue::L(values) => {
            AttrValue::List(values.iter().map(from_attribute).collect::<Result<_, _>>()?)
        }
        AttributeValue::M(map) => AttrValue::Map(from_item(map)?),
        AttributeValue::Ss(values) => {
            AttrValue::List(values.iter().cloned().map(AttrValue::String).collect())
        }
        AttributeValue::Ns(values) => AttrValue::List(
            values
                .iter()
                .map(|n| parse_number(n).map(AttrValue::Number))
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::B(blob) => {
            AttrValue::String(general_purpose::STANDARD.encode(blob.as_ref()))
        }
        AttributeValue::Bs(blobs) => AttrValue::List(
            blobs
                .iter()
                .map(|blob| AttrValue::String(general_purpose::STANDARD.encode(blob.as_ref())))
                .collect(),
        ),
        other => {
            return Err(RepositoryError::InvalidData(format!(
                "unsupported attribute type: {other:?}"
            )))
        }
    })
}

/// Convert a DynamoDB item back to an item.
pub fn from_item(item: &DynamoItem) -> Result<Item, RepositoryError> {
    item.iter()
        .map(|(k, v)| Ok((k.clone(), from_attribute(v)?)))
        .collect()
}

/// Optional SDK map to an optional item; an empty map counts as absent.
pub fn from_optional_item(item: Option<DynamoItem>) -> Result<Option<Item>, RepositoryError> {
    item.filter(|map| !map.is_empty())
        .map(|map| from_item(&map))
        .transpose()
}

fn parse_number(text: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| RepositoryError::InvalidData(format!("number out of range: {text}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::primitives::Blob;

    #[test]
    fn test_numbers_keep_exact_text() {
        assert_eq!(
            to_attribute(&AttrValue::Number(Decimal::new(15, 1))),
            AttributeValue::N("1.5".to_string())
        );
        assert_eq!(
            from_attribute(&AttributeValue::N("0.1".to_string())).unwrap(),
            AttrValue::Number(Decimal::from_str("0.1").unwrap())
        );
    }

    #[test]
    fn test_trailing_zeros_are_dropped() {
        let value = AttrValue::Number(Decimal::from_str("2.50").unwrap());
        assert_eq!(to_attribute(&value), AttributeValue::N("2.5".to_string()));
    }

    #[test]
    fn test_item_round_trip() {
        let item = Item::from([
            ("pk".to_string(), AttrValue::from("RASTER")),
            ("depth".to_string(), AttrValue::from(1200_i64)),
            ("gaps".to_string(), AttrValue::Null),
            (
                "tags".to_string(),
                AttrValue::List(vec![AttrValue::from("gr"), AttrValue::Bool(true)]),
            ),
            (
                "conn".to_string(),
                AttrValue::Map(Item::from([("port".to_string(), AttrValue::from(5432_i64))])),
            ),
        ]);

        assert_eq!(from_item(&to_item(&item)).unwrap(), item);
    }

    #[test]
    fn test_sets_read_back_as_lists() {
        let strings = AttributeValue::Ss(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(
            from_attribute(&strings).unwrap(),
            AttrValue::List(vec![AttrValue::from("a"), AttrValue::from("b")])
        );

        let numbers = AttributeValue::Ns(vec!["1".to_string()]);
        assert_eq!(
            from_attribute(&numbers).unwrap(),
            AttrValue::List(vec![AttrValue::from(1_i64)])
        );
    }

    #[test]
    fn test_binary_reads_back_as_base64() {
        let blob = AttributeValue::B(Blob::new(b"purr".to_vec()));
        assert_eq!(from_attribute(&blob).unwrap(), AttrValue::from("cHVycg=="));
    }

    #[test]
    fn test_unparseable_number_is_invalid_data() {
        let result = from_attribute(&AttributeValue::N("1e400".to_string()));
        assert!(matches!(result, Err(RepositoryError::InvalidData(_))));
    }

    #[test]
    fn test_empty_optional_item_is_absent() {
        assert_eq!(from_optional_item(Some(DynamoItem::new())).unwrap(), None);
        assert_eq!(from_optional_item(None).unwrap(), None);
    }
}
