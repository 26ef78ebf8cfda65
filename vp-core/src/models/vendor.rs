//! Vendor feed identification.
//!
//! None of the vendors announce themselves: a pricing cycle arrives as a
//! pile of spreadsheet attachments with arbitrary file names, and several
//! of them bury their real header row a few rows into the sheet. Files
//! are identified by scoring candidate header rows against per-vendor
//! token signatures: a vendor matches a row only when every one of its
//! required tokens appears and none of its forbidden tokens do. The
//! forbidden lists keep the signatures mutually exclusive (e.g. `UPC#`
//! is KEHE's spelling, so its presence rules out ECRS).

use serde::{Deserialize, Serialize};

/// The feed sources known to the pricing cycle.
///
/// [`Vendor::Ecrs`] is not a wholesale vendor but the point-of-sale
/// system; its movement report is the baseline every cost list is
/// matched against.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    schemars::JsonSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Vendor {
    /// Point-of-sale movement report (the match baseline)
    Ecrs,
    /// HANA wholesale cost list
    Hana,
    /// KEHE distributor cost list
    Kehe,
    /// OSA wholesale cost list
    Osa,
    /// UNFI distributor cost list (CSV)
    Unfi,
    /// Rainforest distributor dashboard workbook
    Rainforest,
}

impl Vendor {
    /// Every known vendor, in signature-evaluation order.
    pub const ALL: [Vendor; 6] = [
        Vendor::Hana,
        Vendor::Kehe,
        Vendor::Osa,
        Vendor::Unfi,
        Vendor::Ecrs,
        Vendor::Rainforest,
    ];

    /// The uppercase wire/database spelling of the vendor.
    pub fn as_str(&self) -> &'static str {
        match self {
            Vendor::Ecrs => "ECRS",
            Vendor::Hana => "HANA",
            Vendor::Kehe => "KEHE",
            Vendor::Osa => "OSA",
            Vendor::Unfi => "UNFI",
            Vendor::Rainforest => "RAINFOREST",
        }
    }

    /// Header token signature, or `None` for vendors detected by a
    /// dedicated rule ([`detect_rainforest`]).
    fn signature(&self) -> Option<Signature> {
        let signature = match self {
            Vendor::Hana => Signature {
                required: &["HANA ID", "UPC UNIT", "UNIT PRICE"],
                forbidden: &["ITEM #", "AUGUST", "ECRS", "CUST NBR"],
            },
            Vendor::Kehe => Signature {
                required: &["UPC#", "AUGUST UNIT COST"],
                forbidden: &["HANA ID", "ECRS", "CUST NBR", "MANUFACTURER NAME"],
            },
            Vendor::Osa => Signature {
                required: &["UPRICE", "UNIT UPC", "CASE UPC"],
                forbidden: &["AUGUST", "HANA ID", "ITEM NO.", "CUST NBR"],
            },
            Vendor::Unfi => Signature {
                required: &["CUST NBR", "ZONE", "UNIT COST"],
                forbidden: &["UPC#", "AUGUST", "HANA ID", "MANUFACTURER NAME"],
            },
            Vendor::Ecrs => Signature {
                required: &["UPC", "DEPT", "SUBDEPT", "AVG PRICE"],
                forbidden: &["UPC#", "AUGUST", "HANA ID", "CUST NBR", "MANUFACTURER NAME"],
            },
            Vendor::Rainforest => return None,
        };
        Some(signature)
    }

    /// Fixed column layout of this vendor's feed.
    pub fn columns(&self) -> ColumnMap {
        match self {
            Vendor::Ecrs => ColumnMap {
                upc: 0,
                cost: None,
                category: Some(3),
                brand: Some(4),
                item: Some(5),
                price: Some(20),
                sheet: None,
            },
            Vendor::Hana => ColumnMap {
                upc: 3,
                cost: Some(6),
                ..ColumnMap::costs_only()
            },
            Vendor::Kehe => ColumnMap {
                upc: 0,
                cost: Some(8),
                ..ColumnMap::costs_only()
            },
            Vendor::Osa => ColumnMap {
                upc: 6,
                cost: Some(4),
                ..ColumnMap::costs_only()
            },
            Vendor::Unfi => ColumnMap {
                upc: 20,
                cost: Some(27),
                ..ColumnMap::costs_only()
            },
            Vendor::Rainforest => ColumnMap {
                upc: 2,
                cost: Some(12),
                sheet: Some("Full Price List"),
                ..ColumnMap::costs_only()
            },
        }
    }
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Vendor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Vendor::ALL
            .iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("unknown vendor {s:?}"))
    }
}

/// Zero-based column positions of the fields a feed carries.
///
/// Only the columns are fixed per vendor; the header row they sit
/// under is located at runtime by detection (see [`Detection`]).
#[derive(Debug, Clone, Copy)]
pub struct ColumnMap {
    /// Column holding the product code
    pub upc: usize,
    /// Column holding the unit cost (absent for the ECRS baseline)
    pub cost: Option<usize>,
    /// Category column (ECRS only)
    pub category: Option<usize>,
    /// Brand column (ECRS only)
    pub brand: Option<usize>,
    /// Item description column (ECRS only)
    pub item: Option<usize>,
    /// Average retail price column (ECRS only)
    pub price: Option<usize>,
    /// Worksheet name, when the feed lives on a specific sheet
    pub sheet: Option<&'static str>,
}

impl ColumnMap {
    const fn costs_only() -> Self {
        ColumnMap {
            upc: 0,
            cost: None,
            category: None,
            brand: None,
            item: None,
            price: None,
            sheet: None,
        }
    }
}

struct Signature {
    required: &'static [&'static str],
    forbidden: &'static [&'static str],
}

/// A successful feed identification: which vendor, and on which row the
/// real headers were found (data extraction starts on the next row).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    /// The identified feed source
    pub vendor: Vendor,
    /// Row index the matched header row was found on
    pub header_row: usize,
}

fn join_upper(cells: &[String]) -> String {
    let mut text = String::new();
    for cell in cells {
        let cell = cell.trim();
        if cell.is_empty() {
            continue;
        }
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(&cell.to_ascii_uppercase());
    }
    text
}

/// Test one candidate header row against every signature.
fn score_row(cells: &[String]) -> Option<Vendor> {
    let text = join_upper(cells);
    if text.is_empty() {
        return None;
    }

    Vendor::ALL.iter().copied().find(|vendor| {
        vendor.signature().is_some_and(|sig| {
            sig.required.iter().all(|token| text.contains(token))
                && !sig.forbidden.iter().any(|token| text.contains(token))
        })
    })
}

/// Identify a feed from its first rows.
///
/// `rows` should be the first handful of raw rows of the file (eight or
/// so is plenty). Every row is treated as a candidate header row, since
/// UNFI and others ship their headers below a preamble.
pub fn detect_vendor(rows: &[Vec<String>]) -> Option<Detection> {
    rows.iter().enumerate().find_map(|(index, row)| {
        score_row(row).map(|vendor| Detection {
            vendor,
            header_row: index,
        })
    })
}

/// Identify a Rainforest `Full Price List` sheet from its first rows.
///
/// Rainforest workbooks carry several sheets and a cover block above the
/// headers, so they get their own rule: a row counts as the header when
/// at least three of `ITEM NO`, `MANUFACTURER NAME`, `UNIT COST` and a
/// bare `UPC` (not KEHE's `UPC#`) are present.
pub fn detect_rainforest(rows: &[Vec<String>]) -> Option<Detection> {
    rows.iter().enumerate().find_map(|(index, row)| {
        let text = join_upper(row);
        if text.is_empty() {
            return None;
        }

        let mut score = 0;
        for token in ["ITEM NO", "MANUFACTURER NAME", "UNIT COST"] {
            if text.contains(token) {
                score += 1;
            }
        }
        if text.contains("UPC") && !text.contains("UPC#") {
            score += 1;
        }

        (score >= 3).then_some(Detection {
            vendor: Vendor::Rainforest,
            header_row: index,
        })
    })
}
