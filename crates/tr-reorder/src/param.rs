use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ReorderError, Result};

/// Which reorder transform a layer runs.
///
/// Accepted as a raw wire code (`0`, `1`) or by name. Anything else is an
/// error; there is no default variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "OrderRepr", into = "String")]
pub enum StorageOrder {
    /// Interleaved (channel-innermost) input to planar output.
    ChannelHeightWidth,
    /// Spatial gather replicated across channels.
    ChannelOnly,
}

impl StorageOrder {
    pub fn code(&self) -> i32 {
        match self {
            StorageOrder::ChannelHeightWidth => 0,
            StorageOrder::ChannelOnly => 1,
        }
    }
}

impl TryFrom<i32> for StorageOrder {
    type Error = ReorderError;

    fn try_from(code: i32) -> Result<Self> {
        match code {
            0 => Ok(StorageOrder::ChannelHeightWidth),
            1 => Ok(StorageOrder::ChannelOnly),
            other => Err(ReorderError::UnknownOrder(other.to_string())),
        }
    }
}

impl FromStr for StorageOrder {
    type Err = ReorderError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            // "ChannelHeightWeight" is the legacy spelling found in older model files.
            "channel_height_width" | "ChannelHeightWidth" | "ChannelHeightWeight" => {
                Ok(StorageOrder::ChannelHeightWidth)
            }
            "channel_only" | "ChannelOnly" => Ok(StorageOrder::ChannelOnly),
            other => Err(ReorderError::UnknownOrder(other.to_string())),
        }
    }
}

impl fmt::Display for StorageOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageOrder::ChannelHeightWidth => write!(f, "channel_height_width"),
            StorageOrder::ChannelOnly => write!(f, "channel_only"),
        }
    }
}

impl From<StorageOrder> for String {
    fn from(order: StorageOrder) -> Self {
        order.to_string()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OrderRepr {
    Code(i32),
    Name(String),
}

impl TryFrom<OrderRepr> for StorageOrder {
    type Error = ReorderError;

    fn try_from(repr: OrderRepr) -> Result<Self> {
        match repr {
            OrderRepr::Code(code) => StorageOrder::try_from(code),
            OrderRepr::Name(name) => name.parse(),
        }
    }
}

/// Configuration of a reorder layer.
///
/// For [`StorageOrder::ChannelOnly`] exactly one of `position` or the
/// `row`/`col` pair must be filled. For [`StorageOrder::ChannelHeightWidth`]
/// all of `channels`, `height` and `width` are required. Values are signed so
/// that negative entries from a config file reach validation instead of
/// failing to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderParam {
    pub order: StorageOrder,
    #[serde(default)]
    pub position: Vec<i64>,
    #[serde(default)]
    pub row: Vec<i64>,
    #[serde(default)]
    pub col: Vec<i64>,
    #[serde(default)]
    pub channels: Option<usize>,
    #[serde(default)]
    pub height: Option<usize>,
    #[serde(default)]
    pub width: Option<usize>,
}

impl ReorderParam {
    /// An otherwise empty parameter for `order`.
    pub fn new(order: StorageOrder) -> Self {
        ReorderParam {
            order,
            position: Vec::new(),
            row: Vec::new(),
            col: Vec::new(),
            channels: None,
            height: None,
            width: None,
        }
    }

    /// Channel-only gather addressed by flat spatial positions.
    pub fn channel_only_positions(positions: impl Into<Vec<i64>>) -> Self {
        ReorderParam {
            position: positions.into(),
            ..Self::new(StorageOrder::ChannelOnly)
        }
    }

    /// Channel-only gather addressed by `(row, col)` pairs.
    pub fn channel_only_row_col(pairs: &[(i64, i64)]) -> Self {
        let (row, col) = pairs.iter().copied().unzip();
        ReorderParam {
            row,
            col,
            ..Self::new(StorageOrder::ChannelOnly)
        }
    }

    /// Interleaved-to-planar transpose over explicit dimensions.
    pub fn channel_height_width(channels: usize, height: usize, width: usize) -> Self {
        ReorderParam {
            channels: Some(channels),
            height: Some(height),
            width: Some(width),
            ..Self::new(StorageOrder::ChannelHeightWidth)
        }
    }

    /// Parse a parameter from JSON, e.g.
    /// `{"order": "channel_only", "position": [1, 2, 3, 4, 5, 0]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
