//! Catalog data model.
//!
//! Catalog entries are owned by the external document store. The resolver only
//! reads them: it never creates, edits, or persists an entry. The in-memory
//! backend in [`crate::storage`] is the one place entries are written.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Identity of a catalog entry as assigned by the store.
///
/// Document stores hand out opaque string keys, so this wraps a `String`
/// rather than a UUID. `Ord` is lexicographic and drives the deterministic
/// tie-break between equally scored candidates.
///
/// # Examples
///
/// ```
/// use catalog_resolve::EntryId;
///
/// let id = EntryId::new("entry-7");
/// assert_eq!(id.as_str(), "entry-7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// Wraps an existing store identity.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a fresh random identity (UUID v4 text).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntryId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Indexed catalog field a lookup key targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// `productName`
    Name,
    /// `productCode`
    Code,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Code => write!(f, "code"),
        }
    }
}

/// Stock shape of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialType {
    /// Hexagonal bar stock
    Hexa,
    /// Round bar stock
    Round,
}

impl fmt::Display for MaterialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hexa => write!(f, "hexa"),
            Self::Round => write!(f, "round"),
        }
    }
}

impl FromStr for MaterialType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hexa" | "hex" => Ok(Self::Hexa),
            "round" => Ok(Self::Round),
            other => Err(ValidationError::UnknownMaterialType {
                value: other.to_string(),
            }),
        }
    }
}

/// A material size, always rendered with exactly two fractional digits.
///
/// Stored internally as hundredths so `"6"`, `"6.0"` and `"6.00"` compare
/// equal. Extra fractional digits are rounded half-up.
///
/// # Examples
///
/// ```
/// use catalog_resolve::Size;
///
/// let size: Size = "6".parse().unwrap();
/// assert_eq!(size.to_string(), "6.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Size {
    hundredths: u64,
}

impl Size {
    /// Creates a size from a count of hundredths (`600` is `6.00`).
    #[must_use]
    pub const fn from_hundredths(hundredths: u64) -> Self {
        Self { hundredths }
    }

    /// Returns the size in hundredths.
    #[must_use]
    pub const fn hundredths(&self) -> u64 {
        self.hundredths
    }
}

impl FromStr for Size {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidSize {
            value: s.to_string(),
        };

        let trimmed = s.trim();
        let (int_part, frac_part) = match trimmed.split_once('.') {
            Some((i, f)) => (i, f),
            None => (trimmed, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole: u64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid())?
        };

        let digits: Vec<u64> = frac_part.bytes().map(|b| u64::from(b - b'0')).collect();
        let tenths = digits.first().copied().unwrap_or(0);
        let hundredths = digits.get(1).copied().unwrap_or(0);
        let round_up = u64::from(digits.get(2).copied().unwrap_or(0) >= 5);

        whole
            .checked_mul(100)
            .and_then(|v| v.checked_add(tenths * 10 + hundredths + round_up))
            .map(Self::from_hundredths)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.hundredths / 100, self.hundredths % 100)
    }
}

impl TryFrom<String> for Size {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Size> for String {
    fn from(size: Size) -> Self {
        size.to_string()
    }
}

/// One material option recorded for a product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialSpec {
    pub material_type: MaterialType,
    pub size: Size,
}

impl MaterialSpec {
    /// Creates a material spec.
    #[must_use]
    pub const fn new(material_type: MaterialType, size: Size) -> Self {
        Self {
            material_type,
            size,
        }
    }

    /// Parses the size string and builds a material spec.
    pub fn parse(material_type: MaterialType, size: &str) -> Result<Self, ValidationError> {
        Ok(Self::new(material_type, size.parse()?))
    }
}

/// A persisted product record: canonical name, code, and its materials.
///
/// `(product_name, product_code)` is not unique across the catalog. Only
/// `id` identifies an entry.
///
/// # Examples
///
/// ```
/// use catalog_resolve::{CatalogEntry, MaterialSpec, MaterialType};
///
/// let entry = CatalogEntry::new("gmc", "gmc-06-06r")
///     .with_material(MaterialSpec::parse(MaterialType::Hexa, "6").unwrap());
/// assert_eq!(entry.product_code, "GMC-06-06R");
/// assert_eq!(entry.materials.len(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: EntryId,

    pub product_name: String,

    pub product_code: String,

    /// Ordered material options; empty means "no size info yet".
    #[serde(default)]
    pub materials: Vec<MaterialSpec>,
}

impl CatalogEntry {
    /// Creates an entry with a generated id. Name and code are upper-cased.
    #[must_use]
    pub fn new(product_name: impl Into<String>, product_code: impl Into<String>) -> Self {
        Self::with_id(EntryId::generate(), product_name, product_code)
    }

    /// Creates an entry with a specific id. Name and code are upper-cased.
    #[must_use]
    pub fn with_id(
        id: impl Into<EntryId>,
        product_name: impl Into<String>,
        product_code: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            product_name: crate::normalize::upper(&product_name.into()),
            product_code: crate::normalize::upper(&product_code.into()),
            materials: Vec::new(),
        }
    }

    /// Appends a material option.
    #[must_use]
    pub fn with_material(mut self, material: MaterialSpec) -> Self {
        self.materials.push(material);
        self
    }

    /// Returns the indexed value for `field`.
    #[must_use]
    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.product_name,
            Field::Code => &self.product_code,
        }
    }

    /// Checks that the entry can be indexed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.as_str().trim().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "id".to_string(),
            });
        }
        if self.product_name.trim().is_empty() && self.product_code.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "product_name or product_code".to_string(),
            });
        }
        Ok(())
    }
}

impl PartialEq for CatalogEntry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CatalogEntry {}

impl std::hash::Hash for CatalogEntry {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
