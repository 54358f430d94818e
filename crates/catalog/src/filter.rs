//! Search predicate.

use crate::model::{Filter, Laptop, Memory, memory::Unit};

/// Whether `laptop` meets every threshold in `filter`.
///
/// Missing CPU or RAM on the laptop reads as zero, and a filter without
/// `min_ram` accepts any amount.
pub fn is_qualified(filter: &Filter, laptop: &Laptop) -> bool {
    let (cores, min_ghz) = laptop
        .cpu
        .as_ref()
        .map_or((0, 0.0), |cpu| (cpu.number_cores, cpu.min_ghz));

    laptop.price_usd <= filter.max_price_usd
        && cores >= filter.min_cpu_cores
        && min_ghz >= filter.min_cpu_ghz
        && to_bits(laptop.ram.as_ref()) >= to_bits(filter.min_ram.as_ref())
}

/// Normalize a memory amount to bits.
///
/// Each unit is a fixed left shift (bit 0, byte 3, then +10 per step up to
/// terabyte 43). Unknown units and missing memory are 0; amounts that do not
/// fit in 64 bits saturate.
pub fn to_bits(memory: Option<&Memory>) -> u64 {
    let Some(memory) = memory else {
        return 0;
    };
    let shift = match memory.unit() {
        Unit::Bit => 0,
        Unit::Byte => 3,
        Unit::Kilobyte => 13,
        Unit::Megabyte => 23,
        Unit::Gigabyte => 33,
        Unit::Terabyte => 43,
        Unit::Unknown => return 0,
    };
    memory.value.saturating_mul(1u64 << shift)
}
