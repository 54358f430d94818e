//! Laptop record model.
//!
//! The types are plain owned values deriving `prost::Message` (protobuf wire
//! format) and serde (JSON). `Clone` is the deep copy used whenever a record
//! crosses the store boundary.
//!
//! Enum fields are held as `i32` like every prost enumeration. In JSON they
//! are written by name (`"GIGABYTE"`) and read back from either the name or
//! the number.

use serde::{Deserialize, Serialize};

/// A laptop record held by the catalog.
#[derive(Clone, PartialEq, Serialize, Deserialize, prost::Message)]
#[serde(default)]
pub struct Laptop {
    /// Record identifier (UUID text). Empty means "assign one on save".
    #[prost(string, tag = "1")]
    pub id: String,
    /// Manufacturer brand
    #[prost(string, tag = "2")]
    pub brand: String,
    /// Model name
    #[prost(string, tag = "3")]
    pub name: String,
    /// Processor
    #[prost(message, optional, tag = "4")]
    pub cpu: Option<Cpu>,
    /// Installed memory
    #[prost(message, optional, tag = "5")]
    pub ram: Option<Memory>,
    /// Graphics cards
    #[prost(message, repeated, tag = "6")]
    pub gpus: Vec<Gpu>,
    /// Storage devices
    #[prost(message, repeated, tag = "7")]
    pub storages: Vec<Storage>,
    /// Display
    #[prost(message, optional, tag = "8")]
    pub screen: Option<Screen>,
    /// Keyboard
    #[prost(message, optional, tag = "9")]
    pub keyboard: Option<Keyboard>,
    /// Weight, in either kilograms or pounds
    #[prost(oneof = "laptop::Weight", tags = "10, 11")]
    pub weight: Option<laptop::Weight>,
    /// Price in US dollars
    #[prost(double, tag = "12")]
    pub price_usd: f64,
    /// Year of release
    #[prost(uint32, tag = "13")]
    pub release_year: u32,
}

/// Nested types for [`Laptop`].
pub mod laptop {
    use serde::{Deserialize, Serialize};

    /// Laptop weight with its unit.
    #[derive(Clone, PartialEq, Serialize, Deserialize, prost::Oneof)]
    #[serde(rename_all = "snake_case")]
    pub enum Weight {
        /// Kilograms
        #[prost(double, tag = "10")]
        WeightKg(f64),
        /// Pounds
        #[prost(double, tag = "11")]
        WeightLb(f64),
    }
}

/// Processor description.
#[derive(Clone, PartialEq, Serialize, Deserialize, prost::Message)]
#[serde(default)]
pub struct Cpu {
    /// Manufacturer brand
    #[prost(string, tag = "1")]
    pub brand: String,
    /// Model name
    #[prost(string, tag = "2")]
    pub name: String,
    /// Physical core count, at least 1
    #[prost(uint32, tag = "3")]
    pub number_cores: u32,
    /// Hardware thread count
    #[prost(uint32, tag = "4")]
    pub number_threads: u32,
    /// Base frequency in GHz
    #[prost(double, tag = "5")]
    pub min_ghz: f64,
    /// Boost frequency in GHz, never below `min_ghz`
    #[prost(double, tag = "6")]
    pub max_ghz: f64,
}

/// Graphics card description.
#[derive(Clone, PartialEq, Serialize, Deserialize, prost::Message)]
#[serde(default)]
pub struct Gpu {
    /// Manufacturer brand
    #[prost(string, tag = "1")]
    pub brand: String,
    /// Model name
    #[prost(string, tag = "2")]
    pub name: String,
    /// Base frequency in GHz
    #[prost(double, tag = "3")]
    pub min_ghz: f64,
    /// Boost frequency in GHz
    #[prost(double, tag = "4")]
    pub max_ghz: f64,
    /// Video memory
    #[prost(message, optional, tag = "5")]
    pub memory: Option<Memory>,
}

/// An amount of memory with its unit.
#[derive(Clone, PartialEq, Serialize, Deserialize, prost::Message)]
#[serde(default)]
pub struct Memory {
    /// Amount, in `unit`s
    #[prost(uint64, tag = "1")]
    pub value: u64,
    /// Unit of `value`
    #[serde(
        serialize_with = "enum_name::serialize::<memory::Unit, _>",
        deserialize_with = "enum_name::deserialize::<memory::Unit, _>"
    )]
    #[prost(enumeration = "memory::Unit", tag = "2")]
    pub unit: i32,
}

impl Memory {
    /// Create a memory amount.
    pub fn new(value: u64, unit: memory::Unit) -> Self {
        Self {
            value,
            unit: unit as i32,
        }
    }
}

/// Nested types for [`Memory`].
pub mod memory {
    /// Memory units, each 1024 times the previous one (bit to byte is 8).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
    #[repr(i32)]
    pub enum Unit {
        /// Unset or unrecognised
        Unknown = 0,
        /// Bits
        Bit = 1,
        /// Bytes
        Byte = 2,
        /// Kilobytes
        Kilobyte = 3,
        /// Megabytes
        Megabyte = 4,
        /// Gigabytes
        Gigabyte = 5,
        /// Terabytes
        Terabyte = 6,
    }
}

/// Storage device description.
#[derive(Clone, PartialEq, Serialize, Deserialize, prost::Message)]
#[serde(default)]
pub struct Storage {
    /// Drive technology
    #[serde(
        serialize_with = "enum_name::serialize::<storage::Driver, _>",
        deserialize_with = "enum_name::deserialize::<storage::Driver, _>"
    )]
    #[prost(enumeration = "storage::Driver", tag = "1")]
    pub driver: i32,
    /// Capacity
    #[prost(message, optional, tag = "2")]
    pub memory: Option<Memory>,
}

/// Nested types for [`Storage`].
pub mod storage {
    /// Drive technology.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
    #[repr(i32)]
    pub enum Driver {
        /// Unset or unrecognised
        Unknown = 0,
        /// Spinning disk
        Hdd = 1,
        /// Solid-state drive
        Ssd = 2,
    }
}

/// Display description.
#[derive(Clone, PartialEq, Serialize, Deserialize, prost::Message)]
#[serde(default)]
pub struct Screen {
    /// Diagonal in inches
    #[prost(float, tag = "1")]
    pub size_inch: f32,
    /// Native resolution
    #[prost(message, optional, tag = "2")]
    pub resolution: Option<Resolution>,
    /// Panel technology
    #[serde(
        serialize_with = "enum_name::serialize::<screen::Panel, _>",
        deserialize_with = "enum_name::deserialize::<screen::Panel, _>"
    )]
    #[prost(enumeration = "screen::Panel", tag = "3")]
    pub panel: i32,
    /// Whether the screen accepts touch input
    #[prost(bool, tag = "4")]
    pub multitouch: bool,
}

/// Screen resolution in pixels.
#[derive(Clone, PartialEq, Serialize, Deserialize, prost::Message)]
#[serde(default)]
pub struct Resolution {
    /// Horizontal pixels
    #[prost(uint32, tag = "1")]
    pub width: u32,
    /// Vertical pixels
    #[prost(uint32, tag = "2")]
    pub height: u32,
}

/// Nested types for [`Screen`].
pub mod screen {
    /// Panel technology.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
    #[repr(i32)]
    pub enum Panel {
        /// Unset or unrecognised
        Unknown = 0,
        /// In-plane switching
        Ips = 1,
        /// Organic LED
        Oled = 2,
    }
}

/// Keyboard description.
#[derive(Clone, PartialEq, Serialize, Deserialize, prost::Message)]
#[serde(default)]
pub struct Keyboard {
    /// Key layout
    #[serde(
        serialize_with = "enum_name::serialize::<keyboard::Layout, _>",
        deserialize_with = "enum_name::deserialize::<keyboard::Layout, _>"
    )]
    #[prost(enumeration = "keyboard::Layout", tag = "1")]
    pub layout: i32,
    /// Whether the keys are backlit
    #[prost(bool, tag = "2")]
    pub backlit: bool,
}

/// Nested types for [`Keyboard`].
pub mod keyboard {
    /// Key layout.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
    #[repr(i32)]
    pub enum Layout {
        /// Unset or unrecognised
        Unknown = 0,
        /// QWERTY
        Qwerty = 1,
        /// QWERTZ
        Qwertz = 2,
        /// AZERTY
        Azerty = 3,
    }
}

mod enum_name {
    use serde::{Deserialize, Deserializer, Serializer, de};

    /// Names of an enumeration's values, indexed by number.
    pub(super) trait EnumNames {
        const NAMES: &'static [&'static str];
    }

    impl EnumNames for super::memory::Unit {
        const NAMES: &'static [&'static str] = &[
            "UNKNOWN",
            "BIT",
            "BYTE",
            "KILOBYTE",
            "MEGABYTE",
            "GIGABYTE",
            "TERABYTE",
        ];
    }

    impl EnumNames for super::storage::Driver {
        const NAMES: &'static [&'static str] = &["UNKNOWN", "HDD", "SSD"];
    }

    impl EnumNames for super::screen::Panel {
        const NAMES: &'static [&'static str] = &["UNKNOWN", "IPS", "OLED"];
    }

    impl EnumNames for super::keyboard::Layout {
        const NAMES: &'static [&'static str] = &["UNKNOWN", "QWERTY", "QWERTZ", "AZERTY"];
    }

    // Numbers without a name are written as numbers.
    pub(super) fn serialize<E: EnumNames, S: Serializer>(
        value: &i32,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match usize::try_from(*value).ok().and_then(|i| E::NAMES.get(i)) {
            Some(name) => serializer.serialize_str(name),
            None => serializer.serialize_i32(*value),
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(i32),
        Name(String),
    }

    pub(super) fn deserialize<'de, E: EnumNames, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<i32, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Name(name) => E::NAMES
                .iter()
                .position(|n| *n == name)
                .and_then(|i| i32::try_from(i).ok())
                .ok_or_else(|| de::Error::unknown_variant(&name, E::NAMES)),
        }
    }
}

/// Search thresholds. A laptop matches when it meets all of them.
#[derive(Clone, PartialEq, Serialize, Deserialize, prost::Message)]
#[serde(default)]
pub struct Filter {
    /// Highest acceptable price
    #[prost(double, tag = "1")]
    pub max_price_usd: f64,
    /// Fewest acceptable CPU cores
    #[prost(uint32, tag = "2")]
    pub min_cpu_cores: u32,
    /// Lowest acceptable base CPU frequency
    #[prost(double, tag = "3")]
    pub min_cpu_ghz: f64,
    /// Smallest acceptable RAM
    #[prost(message, optional, tag = "4")]
    pub min_ram: Option<Memory>,
}
