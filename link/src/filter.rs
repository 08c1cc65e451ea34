//! Scanner filter trees and their wire encoding.
//!
//! Filters are evaluated by the region servers; the client only has to ship
//! them as JSON with every operand base64-encoded. Operands whose sibling
//! `type` is `RegexStringComparator` or `PageFilter` are plain text on the wire
//! and are passed through untouched.
//!
//! # Example
//!
//! ```rust
//! use hbase_link::filter::{CompareOp, ComparatorKind, FilterKind, FilterLeaf, FilterNode};
//!
//! // Rows starting with "my_key_" whose value is "here you are"
//! let filter = FilterNode::all(vec![
//!     FilterLeaf::new(FilterKind::RowFilter)
//!         .with_op(CompareOp::Equal)
//!         .with_comparator(ComparatorKind::RegexStringComparator, "my_key_.+")
//!         .into(),
//!     FilterLeaf::new(FilterKind::ValueFilter)
//!         .with_op(CompareOp::Equal)
//!         .with_comparator(ComparatorKind::BinaryComparator, "here you are")
//!         .into(),
//! ]);
//! ```

use crate::codec::{Value, ValueCodec};
use crate::error::{HBaseLinkError, Result};
use serde_json::{Map, Value as JsonValue};

const VALUE_FIELD: &str = "value";
const TYPE_FIELD: &str = "type";
const FILTER_LIST_TYPE: &str = "FilterList";

/// Type tags whose sibling `value` is sent without encoding.
const RAW_VALUE_TYPES: [&str; 2] = ["RegexStringComparator", "PageFilter"];

fn is_raw_type(type_name: Option<&str>) -> bool {
    type_name.is_some_and(|t| RAW_VALUE_TYPES.contains(&t))
}

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            /// A type the client has no dedicated variant for.
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Other(name) => name.as_str(),
                }
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                match name {
                    $($wire => Self::$variant,)+
                    other => Self::Other(other.to_string()),
                }
            }
        }
    };
}

wire_enum!(
    /// Server-side filter class.
    FilterKind {
        RowFilter => "RowFilter",
        FamilyFilter => "FamilyFilter",
        QualifierFilter => "QualifierFilter",
        ValueFilter => "ValueFilter",
        DependentColumnFilter => "DependentColumnFilter",
        SingleColumnValueFilter => "SingleColumnValueFilter",
        SingleColumnValueExcludeFilter => "SingleColumnValueExcludeFilter",
        PrefixFilter => "PrefixFilter",
        ColumnPrefixFilter => "ColumnPrefixFilter",
        MultipleColumnPrefixFilter => "MultipleColumnPrefixFilter",
        ColumnRangeFilter => "ColumnRangeFilter",
        ColumnCountGetFilter => "ColumnCountGetFilter",
        ColumnPaginationFilter => "ColumnPaginationFilter",
        InclusiveStopFilter => "InclusiveStopFilter",
        PageFilter => "PageFilter",
        FirstKeyOnlyFilter => "FirstKeyOnlyFilter",
        KeyOnlyFilter => "KeyOnlyFilter",
        RandomRowFilter => "RandomRowFilter",
        TimestampsFilter => "TimestampsFilter",
        SkipFilter => "SkipFilter",
        WhileMatchFilter => "WhileMatchFilter",
    }
);

wire_enum!(
    /// Comparator class attached to a compare filter.
    ComparatorKind {
        BinaryComparator => "BinaryComparator",
        BinaryPrefixComparator => "BinaryPrefixComparator",
        BitComparator => "BitComparator",
        NullComparator => "NullComparator",
        RegexStringComparator => "RegexStringComparator",
        SubstringComparator => "SubstringComparator",
    }
);

wire_enum!(
    /// Comparison operator of a compare filter.
    CompareOp {
        Less => "LESS",
        LessOrEqual => "LESS_OR_EQUAL",
        Equal => "EQUAL",
        NotEqual => "NOT_EQUAL",
        GreaterOrEqual => "GREATER_OR_EQUAL",
        Greater => "GREATER",
        NoOp => "NO_OP",
    }
);

wire_enum!(
    /// Combination operator of a filter list.
    ListOperator {
        MustPassAll => "MUST_PASS_ALL",
        MustPassOne => "MUST_PASS_ONE",
    }
);

/// Comparator of a compare filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparator {
    pub kind: ComparatorKind,
    pub value: Option<Value>,
}

/// A single filter.
///
/// `extra` carries the remaining wire fields (`family`, `qualifier`, `limit`,
/// nested `filters` of wrapper filters, ...). Nested objects inside `extra`
/// follow the same `value` encoding rule as the typed fields.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterLeaf {
    pub kind: FilterKind,
    pub op: Option<CompareOp>,
    pub comparator: Option<Comparator>,
    pub value: Option<Value>,
    pub extra: Map<String, JsonValue>,
}

impl FilterLeaf {
    pub fn new(kind: FilterKind) -> Self {
        Self {
            kind,
            op: None,
            comparator: None,
            value: None,
            extra: Map::new(),
        }
    }

    pub fn with_op(mut self, op: CompareOp) -> Self {
        self.op = Some(op);
        self
    }

    pub fn with_comparator(mut self, kind: ComparatorKind, value: impl Into<Value>) -> Self {
        self.comparator = Some(Comparator {
            kind,
            value: Some(value.into()),
        });
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// A filter tree: either a filter list or a single filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    List {
        op: ListOperator,
        filters: Vec<FilterNode>,
    },
    Leaf(FilterLeaf),
}

impl From<FilterLeaf> for FilterNode {
    fn from(leaf: FilterLeaf) -> Self {
        FilterNode::Leaf(leaf)
    }
}

impl FilterNode {
    /// `MUST_PASS_ALL` filter list.
    pub fn all(filters: Vec<FilterNode>) -> Self {
        FilterNode::List {
            op: ListOperator::MustPassAll,
            filters,
        }
    }

    /// `MUST_PASS_ONE` filter list.
    pub fn any(filters: Vec<FilterNode>) -> Self {
        FilterNode::List {
            op: ListOperator::MustPassOne,
            filters,
        }
    }

    pub fn prefix(prefix: impl Into<Value>) -> Self {
        FilterLeaf::new(FilterKind::PrefixFilter).with_value(prefix).into()
    }

    pub fn page(page_size: u64) -> Self {
        FilterLeaf::new(FilterKind::PageFilter)
            .with_value(page_size.to_string())
            .into()
    }

    /// Parse an untyped filter tree in the gateway's JSON shape.
    pub fn from_json(json: &JsonValue) -> Result<Self> {
        let obj = json.as_object().ok_or_else(|| {
            HBaseLinkError::InvalidFilter(format!("filter must be a JSON object, got {}", json))
        })?;

        let type_name = obj
            .get(TYPE_FIELD)
            .and_then(JsonValue::as_str)
            .ok_or_else(|| HBaseLinkError::InvalidFilter("filter is missing \"type\"".into()))?;

        if type_name == FILTER_LIST_TYPE {
            let op = obj
                .get("op")
                .and_then(JsonValue::as_str)
                .map(ListOperator::from)
                .unwrap_or(ListOperator::MustPassAll);
            let filters = match obj.get("filters") {
                Some(JsonValue::Array(items)) => {
                    items.iter().map(FilterNode::from_json).collect::<Result<Vec<_>>>()?
                },
                Some(other) => {
                    return Err(HBaseLinkError::InvalidFilter(format!(
                        "\"filters\" must be an array, got {}",
                        other
                    )))
                },
                None => Vec::new(),
            };
            return Ok(FilterNode::List { op, filters });
        }

        let mut leaf = FilterLeaf::new(FilterKind::from(type_name));
        for (key, field) in obj {
            match key.as_str() {
                TYPE_FIELD => {},
                "op" => {
                    let op = field.as_str().ok_or_else(|| {
                        HBaseLinkError::InvalidFilter(format!("\"op\" must be a string, got {}", field))
                    })?;
                    leaf.op = Some(CompareOp::from(op));
                },
                "comparator" => leaf.comparator = Some(parse_comparator(field)?),
                VALUE_FIELD => leaf.value = Some(parse_operand(type_name, field)?),
                _ => {
                    leaf.extra.insert(key.clone(), field.clone());
                },
            }
        }
        Ok(FilterNode::Leaf(leaf))
    }

    /// Encode the tree into its wire JSON, base64-encoding every operand that
    /// is not exempt.
    pub fn encode(&self, codec: &ValueCodec) -> Result<JsonValue> {
        match self {
            FilterNode::List { op, filters } => {
                let mut obj = Map::new();
                obj.insert(TYPE_FIELD.into(), JsonValue::from(FILTER_LIST_TYPE));
                obj.insert("op".into(), JsonValue::from(op.as_str()));
                let encoded = filters
                    .iter()
                    .map(|f| f.encode(codec))
                    .collect::<Result<Vec<_>>>()?;
                obj.insert("filters".into(), JsonValue::Array(encoded));
                Ok(JsonValue::Object(obj))
            },
            FilterNode::Leaf(leaf) => encode_leaf(leaf, codec),
        }
    }

    /// Encode and serialize the tree to the JSON text carried by the scanner
    /// request.
    pub fn to_wire_string(&self, codec: &ValueCodec) -> Result<String> {
        Ok(serde_json::to_string(&self.encode(codec)?)?)
    }
}

fn parse_comparator(field: &JsonValue) -> Result<Comparator> {
    let obj = field.as_object().ok_or_else(|| {
        HBaseLinkError::InvalidFilter(format!("comparator must be an object, got {}", field))
    })?;
    let type_name = obj
        .get(TYPE_FIELD)
        .and_then(JsonValue::as_str)
        .ok_or_else(|| HBaseLinkError::InvalidFilter("comparator is missing \"type\"".into()))?;
    let value = match obj.get(VALUE_FIELD) {
        Some(v) => Some(parse_operand(type_name, v)?),
        None => None,
    };
    Ok(Comparator {
        kind: ComparatorKind::from(type_name),
        value,
    })
}

fn parse_operand(type_name: &str, field: &JsonValue) -> Result<Value> {
    match field {
        JsonValue::String(s) => Ok(Value::Text(s.clone())),
        // Page sizes are sent verbatim, so a bare number is fine there.
        JsonValue::Number(n) if is_raw_type(Some(type_name)) => Ok(Value::Text(n.to_string())),
        other => Err(HBaseLinkError::InvalidFilter(format!(
            "{} value must be a string, got {}",
            type_name, other
        ))),
    }
}

fn encode_leaf(leaf: &FilterLeaf, codec: &ValueCodec) -> Result<JsonValue> {
    let mut obj = Map::new();
    for (key, field) in &leaf.extra {
        let mut field = field.clone();
        encode_json_in_place(&mut field, codec)?;
        obj.insert(key.clone(), field);
    }

    let kind = leaf.kind.as_str();
    obj.insert(TYPE_FIELD.into(), JsonValue::from(kind));
    if let Some(op) = &leaf.op {
        obj.insert("op".into(), JsonValue::from(op.as_str()));
    }
    if let Some(comparator) = &leaf.comparator {
        let mut cmp = Map::new();
        let cmp_kind = comparator.kind.as_str();
        cmp.insert(TYPE_FIELD.into(), JsonValue::from(cmp_kind));
        if let Some(value) = &comparator.value {
            cmp.insert(VALUE_FIELD.into(), encode_operand(cmp_kind, value, codec)?);
        }
        obj.insert("comparator".into(), JsonValue::Object(cmp));
    }
    if let Some(value) = &leaf.value {
        obj.insert(VALUE_FIELD.into(), encode_operand(kind, value, codec)?);
    }
    Ok(JsonValue::Object(obj))
}

fn encode_operand(type_name: &str, value: &Value, codec: &ValueCodec) -> Result<JsonValue> {
    if is_raw_type(Some(type_name)) {
        return match value {
            Value::Text(text) => Ok(JsonValue::from(text.as_str())),
            Value::Bytes(bytes) => String::from_utf8(bytes.clone())
                .map(JsonValue::from)
                .map_err(|_| {
                    HBaseLinkError::InvalidFilter(format!("{} value must be valid UTF-8", type_name))
                }),
        };
    }
    codec
        .encode(value)
        .map(JsonValue::from)
        .map_err(|e| HBaseLinkError::InvalidFilter(format!("{} value: {}", type_name, e)))
}

/// Untyped walk used for pass-through fields: every `value` key whose sibling
/// `type` is not exempt gets encoded, nested objects and arrays are visited.
fn encode_json_in_place(json: &mut JsonValue, codec: &ValueCodec) -> Result<()> {
    match json {
        JsonValue::Object(obj) => {
            let type_name = obj.get(TYPE_FIELD).and_then(JsonValue::as_str).map(str::to_owned);
            let raw = is_raw_type(type_name.as_deref());
            for (key, field) in obj.iter_mut() {
                if key == VALUE_FIELD && !raw {
                    let text = field.as_str().ok_or_else(|| {
                        HBaseLinkError::InvalidFilter(format!("value must be a string, got {}", field))
                    })?;
                    let encoded = codec
                        .encode(&Value::from(text))
                        .map_err(|e| HBaseLinkError::InvalidFilter(e.to_string()))?;
                    *field = JsonValue::from(encoded);
                } else {
                    encode_json_in_place(field, codec)?;
                }
            }
            Ok(())
        },
        JsonValue::Array(items) => items.iter_mut().try_for_each(|item| encode_json_in_place(item, codec)),
        _ => Ok(()),
    }
}
